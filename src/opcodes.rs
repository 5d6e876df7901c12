//! Static opcode dictionaries for the transport and application layers.
//!
//! Keyed by integer opcode, values are label templates with
//! `{seqno}`/`{no}`/`{data}` placeholders, substituted positionally at
//! lookup time by [`tpdu`][crate::tpdu] and [`apdu`][crate::apdu]. There
//! are only ever one or two placeholders per template, so a full
//! templating engine would be solving a problem this table doesn't
//! have.

/// One opcode table entry: an exact key and its label template.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeEntry {
    /// Exact key this entry matches.
    pub key: u16,
    /// Label, with `{seqno}`/`{no}`/`{data}` placeholders where it
    /// needs formatting.
    pub template: &'static str,
}

/// Transport-control opcodes (TPCI), keyed by the normalized `ctrl`
/// value computed in [`crate::tpdu`].
pub static TRANSPORT_OPCODES: &[OpcodeEntry] = &[
    OpcodeEntry {
        key: 0x8000,
        template: "T_Data_Broadcast/T_Data_Group",
    },
    OpcodeEntry {
        key: 0x8001,
        template: "T_Data_Tag_Group",
    },
    OpcodeEntry {
        key: 0x0000,
        template: "T_Data_Individual",
    },
    OpcodeEntry {
        key: 0x0040,
        template: "T_Data_Connected SeqNo:{seqno}",
    },
    OpcodeEntry {
        key: 0x0080,
        template: "T_Connect",
    },
    OpcodeEntry {
        key: 0x0081,
        template: "T_Disconnect",
    },
    OpcodeEntry {
        key: 0x00C2,
        template: "T_ACK SeqNo:{seqno}",
    },
    OpcodeEntry {
        key: 0x00C3,
        template: "T_NAK SeqNo:{seqno}",
    },
];

/// Application-control opcodes (APCI), keyed by the 10-bit `actrl`
/// value computed in [`crate::apdu`].
///
/// `0x02CA` and `0x02F8` are the anchors for the parametric
/// `A_UserMsg{no}` / `A_ManufacturerUserMsg{no}` ranges; callers resolve
/// the whole range to one of those two keys before looking up here.
pub static APCI_OPCODES: &[OpcodeEntry] = &[
    OpcodeEntry {
        key: 0x0000,
        template: "A_GroupValue_Read",
    },
    OpcodeEntry {
        key: 0x0040,
        template: "A_GroupValue_Response",
    },
    OpcodeEntry {
        key: 0x0080,
        template: "A_GroupValue_Write",
    },
    OpcodeEntry {
        key: 0x00C0,
        template: "A_IndividualAddress_Write",
    },
    OpcodeEntry {
        key: 0x0100,
        template: "A_IndividualAddress_Read",
    },
    OpcodeEntry {
        key: 0x0140,
        template: "A_IndividualAddress_Response",
    },
    OpcodeEntry {
        key: 0x0180,
        template: "A_ADC_Read",
    },
    OpcodeEntry {
        key: 0x01C0,
        template: "A_ADC_Response",
    },
    OpcodeEntry {
        key: 0x01C8,
        template: "A_SystemNetworkParameter_Read",
    },
    OpcodeEntry {
        key: 0x01C9,
        template: "A_SystemNetworkParameter_Response",
    },
    OpcodeEntry {
        key: 0x01CA,
        template: "A_SystemNetworkParameter_Write",
    },
    OpcodeEntry {
        key: 0x0200,
        template: "A_Memory_Read",
    },
    OpcodeEntry {
        key: 0x0240,
        template: "A_Memory_Response",
    },
    OpcodeEntry {
        key: 0x0280,
        template: "A_Memory_Write",
    },
    OpcodeEntry {
        key: 0x02C0,
        template: "A_UserMemory_Read",
    },
    OpcodeEntry {
        key: 0x02C1,
        template: "A_UserMemory_Response",
    },
    OpcodeEntry {
        key: 0x02C2,
        template: "A_UserMemory_Write",
    },
    OpcodeEntry {
        key: 0x02C4,
        template: "A_UserMemoryBit_Write",
    },
    OpcodeEntry {
        key: 0x02C5,
        template: "A_UserManufacturerInfo_Read",
    },
    OpcodeEntry {
        key: 0x02C6,
        template: "A_UserManufacturerInfo_Response",
    },
    OpcodeEntry {
        key: 0x02C7,
        template: "A_FunctionPropertyCommand",
    },
    OpcodeEntry {
        key: 0x02C8,
        template: "A_FunctionPropertyState_Read",
    },
    OpcodeEntry {
        key: 0x02C9,
        template: "A_FunctionPropertyState_Response",
    },
    OpcodeEntry {
        key: 0x02CA,
        template: "A_UserMsg{no} Data:{data}",
    },
    OpcodeEntry {
        key: 0x02F8,
        template: "A_ManufacturerUserMsg{no} Data:{data}",
    },
    OpcodeEntry {
        key: 0x0300,
        template: "A_DeviceDescriptor_Read",
    },
    OpcodeEntry {
        key: 0x0340,
        template: "A_DeviceDescriptor_Response",
    },
    OpcodeEntry {
        key: 0x0380,
        template: "A_Restart",
    },
    OpcodeEntry {
        key: 0x03D5,
        template: "A_PropertyValue_Read",
    },
    OpcodeEntry {
        key: 0x03D6,
        template: "A_PropertyValue_Response",
    },
    OpcodeEntry {
        key: 0x03D7,
        template: "A_PropertyValue_Write",
    },
    OpcodeEntry {
        key: 0x03D8,
        template: "A_PropertyDescription_Read",
    },
    OpcodeEntry {
        key: 0x03D9,
        template: "A_PropertyDescription_Response",
    },
    OpcodeEntry {
        key: 0x03DA,
        template: "A_NetworkParameter_Read",
    },
    OpcodeEntry {
        key: 0x03DB,
        template: "A_NetworkParameter_Response",
    },
    OpcodeEntry {
        key: 0x03DC,
        template: "A_IndividualAddressSerialNumber_Read",
    },
    OpcodeEntry {
        key: 0x03DD,
        template: "A_IndividualAddressSerialNumber_Response",
    },
    OpcodeEntry {
        key: 0x03DE,
        template: "A_IndividualAddressSerialNumber_Write",
    },
];

/// Find an entry by exact key.
#[must_use]
pub fn lookup(table: &'static [OpcodeEntry], key: u16) -> Option<&'static str> {
    table.iter().find(|e| e.key == key).map(|e| e.template)
}

/// Substitute `{seqno}` with a decimal sequence number.
#[must_use]
pub fn format_seqno(template: &str, seqno: u8) -> String {
    template.replace("{seqno}", &seqno.to_string())
}

/// Substitute `{no}` and `{data}` for the parametric UserMsg ranges.
#[must_use]
pub fn format_user_msg(template: &str, no: u16, data: &str) -> String {
    template
        .replace("{no}", &no.to_string())
        .replace("{data}", data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_seqno_template() {
        let t = lookup(TRANSPORT_OPCODES, 0x0040).unwrap();
        assert_eq!(format_seqno(t, 5), "T_Data_Connected SeqNo:5");
    }

    #[test]
    fn apci_user_msg_template() {
        let t = lookup(APCI_OPCODES, 0x02CA).unwrap();
        assert_eq!(format_user_msg(t, 3, "01 02"), "A_UserMsg3 Data:01 02");
    }

    #[test]
    fn unknown_apci_key() {
        assert!(lookup(APCI_OPCODES, 0x07FF).is_none());
    }
}
