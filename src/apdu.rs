//! APDU dissection: extracts the 10-bit application-control field from
//! a TPDU payload and resolves it to a human-readable opcode label.

use crate::opcodes::{self, APCI_OPCODES};
use crate::types::Octet;

const USER_MSG_BASE: u16 = 0x02CA;
const USER_MSG_LAST: u16 = 0x02F7;
const MANUFACTURER_USER_MSG_BASE: u16 = 0x02F8;
const MANUFACTURER_USER_MSG_LAST: u16 = 0x02FE;

/// Mask isolating the 4-bit APCI opcode field (bits 9-6) from the
/// 6-bit data field (bits 5-0) that `A_GroupValue_Read`/`_Response`/
/// `_Write` carry inline when their payload is small enough to fit
/// (the "6-bit connectionless" telegram). These three opcodes are the
/// only ones in [`crate::opcodes::APCI_OPCODES`] whose low 6 bits
/// aren't part of the opcode itself.
const GROUP_VALUE_OPCODE_MASK: u16 = 0x03C0;

/// Result of dissecting an APDU.
#[derive(Debug, Clone)]
pub struct ApduInfo {
    /// Application-layer label, e.g. `"A_GroupValue_Write"`.
    pub label: String,
    /// `false` when `actrl` matched no known opcode and no parametric
    /// range; `label` is then `"Invalid"`.
    pub valid: bool,
}

/// Combine the first two APDU octets into the 10-bit APCI field: bits
/// 1-0 of the first octet become bits 9-8, the second octet is bits
/// 7-0 verbatim.
#[must_use]
pub fn actrl(tpdu: &[Octet]) -> u16 {
    let b0 = u16::from(tpdu.first().map_or(0, |o| o.value));
    let b1 = u16::from(tpdu.get(1).map_or(0, |o| o.value));
    ((b0 << 8) & 0x0300) | b1
}

/// Dissect an APDU given the TPDU octets it was carried in.
///
/// `tpdu[0..2]` hold the APCI field (shared with the TPCI byte
/// [`crate::tpdu`] already classified); any further octets are the
/// application payload, used for the parametric `A_UserMsg*` opcodes.
#[must_use]
pub fn dissect(tpdu: &[Octet]) -> ApduInfo {
    let ctrl = actrl(tpdu);
    let data = &tpdu[tpdu.len().min(2)..];

    if (USER_MSG_BASE..=USER_MSG_LAST).contains(&ctrl) {
        let template = opcodes::lookup(APCI_OPCODES, USER_MSG_BASE).unwrap();
        let no = ctrl - USER_MSG_BASE;
        return ApduInfo {
            label: opcodes::format_user_msg(template, no, &format_data(data)),
            valid: true,
        };
    }
    if (MANUFACTURER_USER_MSG_BASE..=MANUFACTURER_USER_MSG_LAST).contains(&ctrl) {
        let template = opcodes::lookup(APCI_OPCODES, MANUFACTURER_USER_MSG_BASE).unwrap();
        let no = ctrl - MANUFACTURER_USER_MSG_BASE;
        return ApduInfo {
            label: opcodes::format_user_msg(template, no, &format_data(data)),
            valid: true,
        };
    }

    // A_GroupValue_Read/_Response/_Write carry up to 6 bits of data in
    // the low bits of actrl rather than leaving them zero, so only the
    // opcode field (bits 9-6) takes part in the lookup for them.
    let masked = ctrl & GROUP_VALUE_OPCODE_MASK;
    if matches!(masked, 0x0000 | 0x0040 | 0x0080) {
        let template = opcodes::lookup(APCI_OPCODES, masked).unwrap();
        return ApduInfo {
            label: template.to_string(),
            valid: true,
        };
    }

    match opcodes::lookup(APCI_OPCODES, ctrl) {
        Some(template) => ApduInfo {
            label: template.to_string(),
            valid: true,
        },
        None => ApduInfo {
            label: "Invalid".to_string(),
            valid: false,
        },
    }
}

fn format_data(data: &[Octet]) -> String {
    data.iter()
        .map(|o| format!("{:02X}", o.value))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SampleRange;

    fn octet(value: u8) -> Octet {
        Octet {
            value,
            range: SampleRange::new(0, 1),
        }
    }

    #[test]
    fn group_value_write() {
        let info = dissect(&[octet(0x00), octet(0x80)]);
        assert_eq!(info.label, "A_GroupValue_Write");
        assert!(info.valid);
    }

    #[test]
    fn group_value_response_with_seqno_byte() {
        // S5: tpdu bytes 0x54 0x41 -> actrl 0x041, masks to 0x040.
        let info = dissect(&[octet(0x54), octet(0x41)]);
        assert_eq!(info.label, "A_GroupValue_Response");
        assert!(info.valid);
    }

    #[test]
    fn group_value_write_with_inline_data_bits() {
        // actrl = 0x081: low 6 bits carry a 1-bit data value, not part
        // of the opcode, so this must still resolve to GroupValue_Write.
        let info = dissect(&[octet(0x00), octet(0x81)]);
        assert_eq!(info.label, "A_GroupValue_Write");
        assert!(info.valid);
    }

    #[test]
    fn user_msg_range_formats_number_and_data() {
        let info = dissect(&[octet(0x02), octet(0xCB), octet(0xAB), octet(0xCD)]);
        assert_eq!(info.label, "A_UserMsg1 Data:AB CD");
    }

    #[test]
    fn unknown_opcode_is_invalid() {
        let info = dissect(&[octet(0x03), octet(0xFF)]);
        assert!(!info.valid);
        assert_eq!(info.label, "Invalid");
    }
}
