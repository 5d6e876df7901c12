//! Link-layer framing: groups UART octets into ACK/POLL/DATA_STANDARD
//! frames, tracking the running FCS and resyncing on an idle gap.

use crate::types::{AckKind, FrameClass, LinkFrame, Octet, Priority, SampleRange};

/// Minimum idle gap, in bit periods, that forces a resync of an
/// in-progress frame.
pub const IDLE_GAP_BIT_PERIODS: f64 = 10.0;

#[derive(Debug)]
struct InProgress {
    ctrl: u8,
    ctrl_range: SampleRange,
    src_addr: u16,
    src_range_start: u64,
    dst_addr: u16,
    dst_range_start: u64,
    at_flag: bool,
    hop_count: u8,
    length: u8,
    tpdu: Vec<Octet>,
    fcs_acc: u8,
}

/// Which address pair an [`FrameEvent::Address`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrKind {
    /// The frame's source address (individual address of the sender).
    Source,
    /// The frame's destination address (individual or group address).
    Destination,
}

/// Running state of the link framer across octets.
#[derive(Debug, Default)]
pub struct LinkFramerState {
    octet_num: usize,
    in_progress: Option<InProgress>,
    last_octet_end: Option<u64>,
}

/// One thing the link framer produced from an octet.
#[derive(Debug, Clone)]
pub enum FrameEvent {
    /// An ACK-class frame (`ACK`/`NACK`/`BUSY`/`NACK+BUSY`/unrecognized).
    Ack(AckKind, SampleRange),
    /// A bus-arbitration POLL frame.
    Poll(SampleRange),
    /// A classified DATA_EXTENDED first octet. Extended frames aren't
    /// dissected further; only their presence is annotated.
    Extended(SampleRange),
    /// The source or destination address pair, as soon as both its
    /// octets have arrived.
    Address(AddrKind, u16, SampleRange),
    /// The AT/hop-count/length octet, decoded into its three fields.
    Header {
        /// `true` if the destination address is a group address.
        at_flag: bool,
        /// Hop count field.
        hop_count: u8,
        /// TPDU length field.
        length: u8,
        /// Range of the octet carrying these three fields.
        range: SampleRange,
    },
    /// A DATA_STANDARD frame's CTRL octet, classified as soon as it
    /// arrives (octet_num == 0) rather than deferred to frame
    /// completion, so a frame truncated before its FCS octet still gets
    /// its frame-type annotation.
    FrameStart {
        /// Repeated-frame flag from the CTRL octet.
        repeated: bool,
        /// Priority field from the CTRL octet.
        priority: Priority,
        /// Range of the CTRL octet.
        range: SampleRange,
    },
    /// A complete DATA_STANDARD frame, with the FCS check result.
    Frame {
        /// The assembled frame.
        frame: Box<LinkFrame>,
        /// `true` if the running XOR (seeded `0xFF`, including the FCS
        /// octet itself) came out to zero.
        fcs_ok: bool,
    },
    /// An in-progress frame was abandoned because of an idle gap or a
    /// new start-of-frame octet arriving mid-frame.
    Resync {
        /// Why the frame was abandoned.
        reason: &'static str,
        /// Where the abandoned frame's data ended.
        range: SampleRange,
    },
}

impl LinkFramerState {
    /// Create an idle link framer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn abandon(&mut self, reason: &'static str) -> Option<FrameEvent> {
        let dropped = self.in_progress.take();
        self.octet_num = 0;
        dropped.map(|p| FrameEvent::Resync {
            reason,
            range: p.ctrl_range,
        })
    }

    /// Feed one octet (with known parity) into the framer.
    ///
    /// `bit_width` is used only to size the idle-gap resync threshold.
    pub fn handle_octet(&mut self, octet: Octet, bit_width: f64) -> Vec<FrameEvent> {
        let mut events = Vec::new();

        if let Some(last_end) = self.last_octet_end {
            let gap = octet.range.ss.saturating_sub(last_end) as f64;
            if gap > IDLE_GAP_BIT_PERIODS * bit_width {
                if let Some(ev) = self.abandon("idle gap") {
                    events.push(ev);
                }
            }
        }
        self.last_octet_end = Some(octet.range.se);

        if self.octet_num == 0 {
            match FrameClass::classify(octet.value) {
                FrameClass::Ack(kind) => {
                    events.push(FrameEvent::Ack(kind, octet.range));
                    return events;
                }
                FrameClass::Poll => {
                    events.push(FrameEvent::Poll(octet.range));
                    return events;
                }
                FrameClass::DataExtended => {
                    events.push(FrameEvent::Extended(octet.range));
                    return events;
                }
                FrameClass::DataStandard { repeated, priority } => {
                    events.push(FrameEvent::FrameStart {
                        repeated,
                        priority,
                        range: octet.range,
                    });
                    self.in_progress = Some(InProgress {
                        ctrl: octet.value,
                        ctrl_range: octet.range,
                        src_addr: 0,
                        src_range_start: 0,
                        dst_addr: 0,
                        dst_range_start: 0,
                        at_flag: false,
                        hop_count: 0,
                        length: 0,
                        tpdu: Vec::new(),
                        fcs_acc: 0xFF ^ octet.value,
                    });
                    self.octet_num = 1;
                    return events;
                }
            }
        }

        let Some(p) = self.in_progress.as_mut() else {
            // Got a continuation octet with no frame in progress; drop
            // it and wait for the next start-of-frame.
            self.octet_num = 0;
            return events;
        };
        p.fcs_acc ^= octet.value;

        match self.octet_num {
            1 => {
                p.src_range_start = octet.range.ss;
                p.src_addr = u16::from(octet.value) << 8;
            }
            2 => {
                p.src_addr |= u16::from(octet.value);
                events.push(FrameEvent::Address(
                    AddrKind::Source,
                    p.src_addr,
                    SampleRange::new(p.src_range_start, octet.range.se),
                ));
            }
            3 => {
                p.dst_range_start = octet.range.ss;
                p.dst_addr = u16::from(octet.value) << 8;
            }
            4 => {
                p.dst_addr |= u16::from(octet.value);
                events.push(FrameEvent::Address(
                    AddrKind::Destination,
                    p.dst_addr,
                    SampleRange::new(p.dst_range_start, octet.range.se),
                ));
            }
            5 => {
                p.at_flag = octet.value & 0x80 != 0;
                p.hop_count = (octet.value >> 4) & 0x07;
                p.length = octet.value & 0x0F;
                events.push(FrameEvent::Header {
                    at_flag: p.at_flag,
                    hop_count: p.hop_count,
                    length: p.length,
                    range: octet.range,
                });
            }
            n => {
                let tpdu_octets_expected = usize::from(p.length) + 1;
                if n - 6 < tpdu_octets_expected {
                    p.tpdu.push(octet);
                }
                // else: this is the FCS octet, handled below.
            }
        }

        let tpdu_octets_expected = usize::from(p.length) + 1;
        let is_fcs_octet = self.octet_num >= 6 && self.octet_num - 6 == tpdu_octets_expected;

        if is_fcs_octet {
            let fcs = octet.value;
            let fcs_range = octet.range;
            let p = self.in_progress.take().unwrap();
            let fcs_ok = p.fcs_acc == 0;
            events.push(FrameEvent::Frame {
                frame: Box::new(LinkFrame {
                    ctrl: p.ctrl,
                    ctrl_range: p.ctrl_range,
                    src_addr: p.src_addr,
                    dst_addr: p.dst_addr,
                    at_flag: p.at_flag,
                    hop_count: p.hop_count,
                    length: p.length,
                    tpdu: p.tpdu,
                    fcs,
                    fcs_range,
                }),
                fcs_ok,
            });
            self.octet_num = 0;
        } else {
            self.octet_num += 1;
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SampleRange;

    fn octet(value: u8, ss: u64) -> Octet {
        Octet {
            value,
            range: SampleRange::new(ss, ss + 1),
        }
    }

    #[test]
    fn classifies_ack() {
        let mut st = LinkFramerState::new();
        let events = st.handle_octet(octet(0xCC, 0), 20.0);
        assert!(matches!(events[0], FrameEvent::Ack(AckKind::Ack, _)));
    }

    #[test]
    fn assembles_standard_frame() {
        // BC 11 01 09 01 E1 00 81 1F: CTRL, src, dst, AT/hop/len, TPDU, FCS.
        let bytes = [0xBCu8, 0x11, 0x01, 0x09, 0x01, 0xE1, 0x00, 0x81, 0x1F];
        let mut st = LinkFramerState::new();
        let mut last = None;
        for (i, &b) in bytes.iter().enumerate() {
            let events = st.handle_octet(octet(b, i as u64), 20.0);
            for ev in events {
                if let FrameEvent::Frame { frame, fcs_ok, .. } = ev {
                    last = Some((frame, fcs_ok));
                }
            }
        }
        let (frame, _fcs_ok) = last.expect("frame assembled");
        assert_eq!(frame.fcs, 0x1F);
        assert_eq!(frame.src_addr, 0x1101);
        assert_eq!(frame.dst_addr, 0x0901);
        assert_eq!(frame.tpdu, vec![octet(0x00, 0).value, octet(0x81, 0).value]
            .into_iter()
            .zip([6u64, 7])
            .map(|(v, ss)| Octet { value: v, range: SampleRange::new(ss, ss + 1) })
            .collect::<Vec<_>>());
    }

    #[test]
    fn frame_start_emitted_before_fcs_even_if_truncated() {
        // CTRL octet alone, frame never reaches its FCS octet: the
        // frame-type annotation must still be emitted, since it's
        // classified at octet_num == 0, not deferred to frame completion.
        let mut st = LinkFramerState::new();
        let events = st.handle_octet(octet(0xBC, 0), 20.0);
        assert!(matches!(
            events[0],
            FrameEvent::FrameStart {
                repeated: false,
                ..
            }
        ));
    }

    #[test]
    fn emits_address_and_header_events() {
        let bytes = [0xBCu8, 0x11, 0x01, 0x09, 0x01, 0xE1, 0x00, 0x81, 0x1F];
        let mut st = LinkFramerState::new();
        let mut saw_src = false;
        let mut saw_dst = false;
        let mut saw_header = false;
        for (i, &b) in bytes.iter().enumerate() {
            for ev in st.handle_octet(octet(b, i as u64), 20.0) {
                match ev {
                    FrameEvent::Address(AddrKind::Source, addr, _) => {
                        assert_eq!(addr, 0x1101);
                        saw_src = true;
                    }
                    FrameEvent::Address(AddrKind::Destination, addr, _) => {
                        assert_eq!(addr, 0x0901);
                        saw_dst = true;
                    }
                    FrameEvent::Header {
                        at_flag,
                        hop_count,
                        length,
                        ..
                    } => {
                        assert!(at_flag);
                        assert_eq!(hop_count, 6);
                        assert_eq!(length, 1);
                        saw_header = true;
                    }
                    _ => {}
                }
            }
        }
        assert!(saw_src && saw_dst && saw_header);
    }
}
