//! UART character framing: turns a raw sample stream into a sequence of
//! octets, using the bit sampler for each of a character's 12 bit
//! cells (start, 8 data bits LSB-first, parity, 2 stop bits).

use crate::annotation::{Annotation, AnnotationTag};
use crate::bit_sampler;
use crate::config::Polarity;
use crate::types::{Octet, ParityStatus, SampleRange};

/// One decoded UART character, or a framing violation that resyncs the
/// hunt for the next start bit.
#[derive(Debug, Clone)]
pub enum CharResult {
    /// A full character: 8 data bits and an even-parity check.
    Char {
        /// The reconstructed octet.
        octet: Octet,
        /// Parity check result over the 8 data bits.
        parity: ParityStatus,
    },
    /// A stop bit sampled low, or a start bit that failed to read low
    /// at its center. Per the error-handling design, this is reported
    /// as an annotation, not treated as fatal: sampling resumes one
    /// sample past the violating start-bit candidate.
    FramingError {
        /// Range covering the cell(s) that violated framing.
        range: SampleRange,
    },
}

const BITS_PER_CHAR: u32 = 12;

/// Scan `samples` end to end, decoding every UART character found.
///
/// Idle is assumed high (mark). A `0` sample preceded by a `1` (or at
/// position 0) is a start-bit candidate; if the bit sampler doesn't
/// confirm it reads low at its center, it's skipped as noise and the
/// hunt resumes at the next sample.
///
/// Alongside the character results, returns the per-bit annotations
/// (start/data/parity-ok/parity-err/stop-ok/stop-err) for every cell
/// sampled, in the order they were read.
#[must_use]
pub fn decode_chars(
    samples: &[u8],
    bit_width: f64,
    polarity: Polarity,
) -> (Vec<CharResult>, Vec<Annotation>) {
    let mut out = Vec::new();
    let mut bits = Vec::new();
    let mut pos = 0usize;
    // A full character spans 12 bit cells, and the bit sampler looks a
    // further ~2 bit-widths past the 12th cell's start for its last
    // sub-sample, so require some margin past 12 bit-widths.
    let char_span = (bit_width * (f64::from(BITS_PER_CHAR) + 2.0)).ceil() as usize;

    while pos < samples.len() {
        let level = match polarity {
            Polarity::Normal => samples[pos],
            Polarity::Inverted => samples[pos] ^ 1,
        };
        let prev_idle = pos == 0
            || match polarity {
                Polarity::Normal => samples[pos - 1] != 0,
                Polarity::Inverted => samples[pos - 1] ^ 1 != 0,
            };
        if level != 0 || !prev_idle {
            pos += 1;
            continue;
        }

        if pos + char_span > samples.len() {
            break;
        }

        let Some(start_bit) = bit_sampler::sample(samples, pos, bit_width, polarity) else {
            break;
        };
        if start_bit.value != 0 {
            pos += 1;
            continue;
        }

        let cell_start = |k: u32| -> usize {
            pos + ((bit_width * f64::from(k)).round() as usize)
        };

        let mut data = 0u8;
        let mut data_bits = Vec::with_capacity(8);
        let mut data_bits_ok = true;
        for k in 0..8u32 {
            let Some(bit) = bit_sampler::sample(samples, cell_start(k + 1), bit_width, polarity)
            else {
                data_bits_ok = false;
                break;
            };
            data |= bit.value << k;
            data_bits.push(bit);
        }
        if !data_bits_ok {
            break;
        }

        let Some(parity_bit) = bit_sampler::sample(samples, cell_start(9), bit_width, polarity)
        else {
            break;
        };
        let Some(stop1) = bit_sampler::sample(samples, cell_start(10), bit_width, polarity) else {
            break;
        };
        let Some(stop2) = bit_sampler::sample(samples, cell_start(11), bit_width, polarity) else {
            break;
        };

        let char_end = stop2.range.se;
        let char_range = start_bit.range.to(SampleRange::new(stop2.range.ss, char_end));

        bits.push(Annotation::new(start_bit.range, AnnotationTag::Start, "start"));
        for bit in &data_bits {
            bits.push(Annotation::new(
                bit.range,
                AnnotationTag::Data,
                bit.value.to_string(),
            ));
        }

        if stop1.value == 0 || stop2.value == 0 {
            for (stop, ok) in [(stop1, stop1.value != 0), (stop2, stop2.value != 0)] {
                bits.push(if ok {
                    Annotation::new(stop.range, AnnotationTag::StopOk, "stop")
                } else {
                    Annotation::new(stop.range, AnnotationTag::StopErr, "stop error")
                });
            }
            out.push(CharResult::FramingError { range: char_range });
            pos += 1;
            continue;
        }

        let parity = if (data.count_ones() % 2) as u8 == parity_bit.value {
            ParityStatus::Ok
        } else {
            ParityStatus::Err
        };
        bits.push(if parity == ParityStatus::Ok {
            Annotation::new(parity_bit.range, AnnotationTag::ParityOk, "parity ok")
        } else {
            Annotation::new(parity_bit.range, AnnotationTag::ParityErr, "parity error")
        });
        bits.push(Annotation::new(stop1.range, AnnotationTag::StopOk, "stop"));
        bits.push(Annotation::new(stop2.range, AnnotationTag::StopOk, "stop"));
        bits.push(Annotation::new(
            char_range,
            AnnotationTag::Raw,
            format!("{data:02X}"),
        ));

        out.push(CharResult::Char {
            octet: Octet {
                value: data,
                range: char_range,
            },
            parity,
        });

        pos += (bit_width * f64::from(BITS_PER_CHAR)).round() as usize;
    }

    (out, bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_char(bit_width: usize, bits: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        for &b in bits {
            out.extend(std::iter::repeat(b).take(bit_width));
        }
        out
    }

    fn encode_char(bit_width: usize, value: u8) -> Vec<u8> {
        let mut bits = vec![0u8]; // start bit
        for k in 0..8 {
            bits.push((value >> k) & 1);
        }
        let parity = value.count_ones() % 2;
        bits.push(parity as u8);
        bits.push(1); // stop
        bits.push(1); // stop
        make_char(bit_width, &bits)
    }

    #[test]
    fn decodes_single_character() {
        let mut samples = vec![1u8; 40]; // idle preamble
        samples.extend(encode_char(20, 0xA5));
        samples.extend(vec![1u8; 40]); // trailing idle
        let (chars, bits) = decode_chars(&samples, 20.0, Polarity::Normal);
        assert_eq!(chars.len(), 1);
        match &chars[0] {
            CharResult::Char { octet, parity } => {
                assert_eq!(octet.value, 0xA5);
                assert_eq!(*parity, ParityStatus::Ok);
            }
            CharResult::FramingError { .. } => panic!("expected a character"),
        }
        assert!(bits.iter().any(|a| a.tag == AnnotationTag::Start));
        assert!(bits
            .iter()
            .any(|a| a.tag == AnnotationTag::Raw && a.text[0] == "A5"));
        assert_eq!(
            bits.iter().filter(|a| a.tag == AnnotationTag::Data).count(),
            8
        );
    }

    #[test]
    fn back_to_back_characters() {
        let mut samples = vec![1u8; 20];
        samples.extend(encode_char(20, 0x00));
        samples.extend(encode_char(20, 0xFF));
        samples.extend(vec![1u8; 60]);
        let (chars, _bits) = decode_chars(&samples, 20.0, Polarity::Normal);
        assert_eq!(chars.len(), 2);
    }

    #[test]
    fn bad_stop_bit_reports_framing_error() {
        let bits = vec![0u8, 1, 0, 1, 0, 1, 0, 1, 0, 0, 0, 1]; // stop1 low
        let mut samples = vec![1u8; 20];
        samples.extend(make_char(20, &bits));
        samples.extend(vec![1u8; 40]);
        let (chars, annotations) = decode_chars(&samples, 20.0, Polarity::Normal);
        assert!(matches!(chars[0], CharResult::FramingError { .. }));
        assert!(annotations
            .iter()
            .any(|a| a.tag == AnnotationTag::StopErr));
    }
}
