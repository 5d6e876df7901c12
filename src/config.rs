//! Decoder configuration: the host-supplied `polarity` option and
//! sample rate, immutable for the lifetime of a decoding session.

use crate::Error;

/// Bus polarity, selectable as a host option; default `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    /// Idle high, start bit low. The usual TP1 wiring.
    #[default]
    Normal,
    /// Idle low, start bit high. Every sub-sample is XOR-ed with 1
    /// before quorum voting.
    Inverted,
}

/// Immutable configuration for one decoding session.
///
/// `samplerate` mirrors the host's `metadata(SAMPLERATE, ...)` callback:
/// it must be known before decoding starts, so construction itself is
/// where the fatal "configuration error" from the error taxonomy is
/// raised, rather than deep inside the bit sampler.
#[derive(Debug, Clone, Copy)]
pub struct DecoderConfig {
    samplerate: u32,
    polarity: Polarity,
}

impl DecoderConfig {
    /// Build a configuration. `samplerate` of `0` stands for "not
    /// supplied" and is rejected, matching the fatal configuration
    /// error required by the error taxonomy.
    pub fn new(samplerate: u32, polarity: Polarity) -> Result<Self, Error> {
        if samplerate == 0 {
            return Err(Error::new(
                "configuration error: samplerate not provided before decode()",
            ));
        }
        Ok(Self {
            samplerate,
            polarity,
        })
    }

    /// Configured sample rate, in Hz.
    #[must_use]
    pub fn samplerate(&self) -> u32 {
        self.samplerate
    }

    /// Configured polarity.
    #[must_use]
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// `samplerate / 9600`, as a real quantity: samples per bit period.
    #[must_use]
    pub fn bit_width(&self) -> f64 {
        f64::from(self.samplerate) / 9600.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_samplerate() {
        assert!(DecoderConfig::new(0, Polarity::Normal).is_err());
    }

    #[test]
    fn bit_width_is_samplerate_over_baud() {
        let cfg = DecoderConfig::new(192_000, Polarity::Normal).unwrap();
        assert_eq!(cfg.bit_width(), 20.0);
    }
}
