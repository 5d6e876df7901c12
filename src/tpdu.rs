//! TPDU dissection: classifies the transport-control field of a link
//! frame's payload and, for data-carrying opcodes, hands the remainder
//! off to [`crate::apdu`].

use crate::opcodes::{self, TRANSPORT_OPCODES};
use crate::types::Octet;

/// Result of dissecting a TPDU.
#[derive(Debug, Clone)]
pub struct TpduInfo {
    /// Transport-layer label, e.g. `"T_Data_Connected SeqNo:3"`.
    pub label: String,
    /// Sequence number, for numbered transport opcodes.
    pub seqno: Option<u8>,
    /// The APDU payload, present for opcodes that carry one
    /// (`T_Data_*`), absent for connection-control opcodes.
    pub apdu: Option<Vec<Octet>>,
}

/// Classify the first two TPDU octets into a transport opcode key and,
/// for numbered packets, a sequence number.
///
/// `tpdu[0]`'s top two bits select the transport class: `0x80` clear
/// picks data (UDP unnumbered, or NDP numbered when `0x40` is also
/// set); `0x80` set picks control (UCD connect/disconnect, or NCD
/// ack/nak when `0x40` is also set). A numbered packet's sequence
/// number lives in `tpdu[0]` bits 2-5. Unnumbered data frames carry no
/// addressing information of their own — `at_flag`, from the link
/// frame's AT/hop/length octet, is what distinguishes broadcast/group
/// delivery (pseudo-bit `0x8000`) from individual delivery.
#[must_use]
fn classify(b0: u8, b1: u8, at_flag: bool) -> (u16, Option<u8>) {
    if b0 & 0x80 == 0 {
        if b0 & 0x40 != 0 {
            (0x0040, Some((b0 >> 2) & 0x0F))
        } else if at_flag {
            let key = if b0 & 0x01 != 0 { 0x8001 } else { 0x8000 };
            (key, None)
        } else {
            (0x0000, None)
        }
    } else if b0 & 0x40 != 0 {
        let seqno = (b0 >> 2) & 0x0F;
        if b0 & 0x03 == 0x03 {
            (0x00C3, Some(seqno))
        } else {
            (0x00C2, Some(seqno))
        }
    } else if b1 == 0x81 {
        (0x0081, None)
    } else {
        (0x0080, None)
    }
}

/// Opcodes that carry an APDU payload in the remaining TPDU octets.
fn carries_apdu(key: u16) -> bool {
    matches!(key, 0x8000 | 0x8001 | 0x0000 | 0x0040)
}

/// Dissect a frame's TPDU payload, given the link frame's `at_flag`.
#[must_use]
pub fn dissect(tpdu: &[Octet], at_flag: bool) -> TpduInfo {
    let b0 = tpdu.first().map_or(0, |o| o.value);
    let b1 = tpdu.get(1).map_or(0, |o| o.value);
    let (key, seqno) = classify(b0, b1, at_flag);

    let label = match opcodes::lookup(TRANSPORT_OPCODES, key) {
        Some(template) => match seqno {
            Some(n) => opcodes::format_seqno(template, n),
            None => template.to_string(),
        },
        None => "Invalid".to_string(),
    };

    let apdu = if carries_apdu(key) {
        Some(tpdu.to_vec())
    } else {
        None
    };

    TpduInfo {
        label,
        seqno,
        apdu,
    }
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
    fn group_write_is_data_group() {
        let info = dissect(&[octet(0x00), octet(0x00)], true);
        assert_eq!(info.label, "T_Data_Broadcast/T_Data_Group");
        assert!(info.apdu.is_some());
    }

    #[test]
    fn connected_data_carries_seqno() {
        let info = dissect(&[octet(0x40), octet(0x00)], false);
        assert_eq!(info.label, "T_Data_Connected SeqNo:0");
    }

    #[test]
    fn ack_has_no_apdu() {
        let info = dissect(&[octet(0xC4), octet(0x00)], false);
        assert_eq!(info.label, "T_ACK SeqNo:1");
        assert!(info.apdu.is_none());
    }

    #[test]
    fn connect_disconnect() {
        assert_eq!(
            dissect(&[octet(0x80), octet(0x80)], false).label,
            "T_Connect"
        );
        assert_eq!(
            dissect(&[octet(0x80), octet(0x81)], false).label,
            "T_Disconnect"
        );
    }

    #[test]
    fn individual_connect_scenario() {
        // S4: tpdu=[0x80,0x00], at_flag=0 -> T_Connect, no APDU.
        let info = dissect(&[octet(0x80), octet(0x00)], false);
        assert_eq!(info.label, "T_Connect");
        assert!(info.apdu.is_none());
    }

    #[test]
    fn connected_data_with_application_scenario() {
        // S5: tpdu first two bytes 0x54 0x41 -> SeqNo 5, A_GroupValue_Response.
        let info = dissect(&[octet(0x54), octet(0x41)], false);
        assert_eq!(info.label, "T_Data_Connected SeqNo:5");
        assert!(info.apdu.is_some());
    }
}
