//! Shared data model: the entities that flow between the bit sampler,
//! UART framer, and link framer.

/// A half-open interval `[ss, se)` of sample indices.
///
/// Every annotation the decoder emits carries one of these. `ss < se`
/// always holds for a well-formed range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRange {
    /// Start sample, inclusive.
    pub ss: u64,
    /// End sample, exclusive.
    pub se: u64,
}

impl SampleRange {
    /// Create a new range. Panics if `ss >= se`, since every caller in
    /// this crate computes both ends before constructing one.
    pub fn new(ss: u64, se: u64) -> Self {
        debug_assert!(ss < se, "empty or inverted sample range {ss}..{se}");
        Self { ss, se }
    }

    /// Range spanning from `self.ss` to `other.se`.
    #[must_use]
    pub fn to(&self, other: SampleRange) -> SampleRange {
        SampleRange::new(self.ss, other.se)
    }
}

/// One logical bit, recovered from six oversampled sub-samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bit {
    /// Recovered logical value.
    pub value: u8,
    /// Sample range spanned by the bit cell.
    pub range: SampleRange,
}

/// An 8-bit value reconstructed LSB-first from eight data [`Bit`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Octet {
    /// The reconstructed byte.
    pub value: u8,
    /// Sample range spanning the whole character (start through second
    /// stop bit).
    pub range: SampleRange,
}

/// Even-parity check result over the eight data bits of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParityStatus {
    /// XOR of the eight data bits and the parity bit is zero.
    Ok,
    /// XOR is nonzero: a bit was flipped on the wire.
    Err,
}

/// Priority field of a DATA_STANDARD control octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// `0x00`
    System,
    /// `0x08`
    Urgent,
    /// `0x04`
    Normal,
    /// `0x0C`
    Low,
}

impl Priority {
    /// Decode from the `bits3..2` priority field of a CTRL octet.
    #[must_use]
    pub fn from_ctrl(ctrl: u8) -> Priority {
        match ctrl & 0x0C {
            0x00 => Priority::System,
            0x08 => Priority::Urgent,
            0x04 => Priority::Normal,
            0x0C => Priority::Low,
            _ => unreachable!("a 2-bit field masked to 4 values"),
        }
    }

    /// Human label, matching the source's naming.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Priority::System => "System",
            Priority::Urgent => "Urgent",
            Priority::Normal => "Normal",
            Priority::Low => "Low",
        }
    }
}

/// Subtype of an ACK-class frame, or the fact that the octet claimed
/// the ACK bit pattern without matching a known subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckKind {
    /// `0xCC`
    Ack,
    /// `0x0C`
    Nack,
    /// `0xC0`
    Busy,
    /// `0x00`
    NackBusy,
    /// `octet & 0x33 == 0` but no exact match.
    Invalid,
}

impl AckKind {
    /// Human label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            AckKind::Ack => "ACK",
            AckKind::Nack => "NACK",
            AckKind::Busy => "BUSY",
            AckKind::NackBusy => "NACK+BUSY",
            AckKind::Invalid => "Invalid",
        }
    }
}

/// Classification of a link frame's first octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameClass {
    /// `octet & 0x33 == 0`.
    Ack(AckKind),
    /// `octet == 0xF0`.
    Poll,
    /// `octet & 0x80 != 0`.
    DataStandard {
        /// `(octet & 0x20) == 0`.
        repeated: bool,
        /// `octet & 0x0C`.
        priority: Priority,
    },
    /// Neither ACK, POLL, nor DATA_STANDARD.
    DataExtended,
}

impl FrameClass {
    /// Classify the first octet of a frame, per the wire layout in §6.
    #[must_use]
    pub fn classify(octet: u8) -> FrameClass {
        if octet & 0x33 == 0 {
            let kind = match octet {
                0xCC => AckKind::Ack,
                0x0C => AckKind::Nack,
                0xC0 => AckKind::Busy,
                0x00 => AckKind::NackBusy,
                _ => AckKind::Invalid,
            };
            return FrameClass::Ack(kind);
        }
        if octet == 0xF0 {
            return FrameClass::Poll;
        }
        if octet & 0x80 != 0 {
            return FrameClass::DataStandard {
                repeated: octet & 0x20 == 0,
                priority: Priority::from_ctrl(octet),
            };
        }
        FrameClass::DataExtended
    }
}

/// A fully assembled DATA_STANDARD link frame, built incrementally by
/// the link framer and materialized once its FCS octet arrives.
#[derive(Debug, Clone)]
pub struct LinkFrame {
    /// CTRL octet (position 0).
    pub ctrl: u8,
    /// Sample range of the CTRL octet.
    pub ctrl_range: SampleRange,
    /// Source address (octets 1..2, big-endian).
    pub src_addr: u16,
    /// Destination address (octets 3..4, big-endian).
    pub dst_addr: u16,
    /// `true` = group address, `false` = individual.
    pub at_flag: bool,
    /// Hop count, 3 bits.
    pub hop_count: u8,
    /// Payload length in TPDU octets, minus one (`octet5 & 0x0F`).
    pub length: u8,
    /// The `(length + 1)`-octet transport payload.
    pub tpdu: Vec<Octet>,
    /// FCS octet as received.
    pub fcs: u8,
    /// Sample range of the FCS octet.
    pub fcs_range: SampleRange,
}

impl LinkFrame {
    /// Render a 16-bit address as `A/B/C`, the convention used uniformly
    /// for both group and individual addresses.
    #[must_use]
    pub fn render_address(addr: u16) -> String {
        let a = addr >> 12;
        let b = (addr >> 8) & 0xF;
        let c = addr & 0xFF;
        format!("{a}/{b}/{c}")
    }
}
