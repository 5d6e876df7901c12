//! Bit-level sampling: recovers one logical bit from a bit cell in the
//! raw sample stream using 6x oversampling.

use crate::config::Polarity;
use crate::types::{Bit, SampleRange};

/// Offset, in samples, of the `k`-th of six sub-samples within a bit
/// cell that starts at sample 0.
///
/// `round(bit_width/12) + k*(bit_width/6)`: the first sub-sample sits a
/// twelfth of a bit period in (clear of the edge), the rest are spaced
/// a sixth of a bit period apart.
#[must_use]
pub fn target_offset(bit_width: f64, k: u32) -> i64 {
    ((bit_width / 12.0).round() + f64::from(k) * (bit_width / 6.0)).round() as i64
}

/// Sample one bit cell starting at `frame_start`.
///
/// Sub-sample 0 sits closest to the cell's leading edge and is the
/// least reliable, so the `0x3E` mask excludes it: a bit reads `1` only
/// when all five of the remaining sub-samples are high, and `0`
/// otherwise. Returns `None` if any sub-sample would fall past the end
/// of `samples`.
#[must_use]
pub fn sample_bit(
    samples: &[u8],
    frame_start: usize,
    bit_width: f64,
    polarity: Polarity,
) -> Option<(u8, SampleRange)> {
    let mut reg: u8 = 0;
    let mut first_idx = None;
    let mut last_idx = frame_start;
    for k in 0..6u32 {
        let offset = target_offset(bit_width, k);
        let idx = frame_start as i64 + offset;
        if idx < 0 {
            return None;
        }
        let idx = idx as usize;
        let raw = *samples.get(idx)?;
        let level = match polarity {
            Polarity::Normal => raw,
            Polarity::Inverted => raw ^ 1,
        };
        if level != 0 {
            reg |= 1 << k;
        }
        first_idx.get_or_insert(idx);
        last_idx = idx;
    }
    let value = u8::from(reg & 0x3E == 0x3E);
    let range = SampleRange::new(first_idx.unwrap() as u64, last_idx as u64 + 1);
    Some((value, range))
}

/// Sample a bit cell and package it as a [`Bit`].
#[must_use]
pub fn sample(
    samples: &[u8],
    frame_start: usize,
    bit_width: f64,
    polarity: Polarity,
) -> Option<Bit> {
    let (value, range) = sample_bit(samples, frame_start, bit_width, polarity)?;
    Some(Bit { value, range })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_high_reads_one() {
        let samples = vec![1u8; 32];
        let bit = sample(&samples, 0, 20.0, Polarity::Normal).unwrap();
        assert_eq!(bit.value, 1);
    }

    #[test]
    fn all_low_reads_zero() {
        let samples = vec![0u8; 32];
        let bit = sample(&samples, 0, 20.0, Polarity::Normal).unwrap();
        assert_eq!(bit.value, 0);
    }

    #[test]
    fn inverted_polarity_flips_reading() {
        let samples = vec![1u8; 32];
        let bit = sample(&samples, 0, 20.0, Polarity::Inverted).unwrap();
        assert_eq!(bit.value, 0);
    }

    #[test]
    fn out_of_range_returns_none() {
        let samples = vec![1u8; 4];
        assert!(sample(&samples, 0, 20.0, Polarity::Normal).is_none());
    }
}
