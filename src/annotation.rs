//! Annotation model: the decoder's sole output format, an ahead-of-time
//! tag enum paired with a sample range and display text.
//!
//! Tag ids are fixed at compile time rather than looked up by name at
//! run time, so emitting an annotation never touches a string table.

use crate::types::SampleRange;

/// Kind of thing an annotation describes, and the display row it
/// belongs on. Ids and groupings are fixed by the wire-level annotation
/// table: `bits` covers ids 0-5, `raw-data` is the whole recovered
/// octet, and `layers` covers the link/transport/application write-ups
/// built on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationTag {
    /// Start bit sampled low (row: bits, id 0).
    Start,
    /// One recovered data bit (row: bits, id 1).
    Data,
    /// Even-parity check passed (row: bits, id 2).
    ParityOk,
    /// Even-parity check failed (row: bits, id 3).
    ParityErr,
    /// Both stop bits read high (row: bits, id 4).
    StopOk,
    /// A stop bit read low: a framing violation (row: bits, id 5).
    StopErr,
    /// The whole recovered octet (row: raw-data, id 6).
    Raw,
    /// Link-layer framing: ACK/POLL/frame header/address/FCS/resync
    /// (row: layers, id 7).
    Link,
    /// Transport-layer opcode label (row: layers, id 8).
    Transport,
    /// Application-layer opcode label (row: layers, id 9).
    Application,
}

impl AnnotationTag {
    /// Numeric id, stable across releases: this is what would be
    /// registered with a host framework's annotation-class table.
    #[must_use]
    pub fn id(self) -> u8 {
        match self {
            AnnotationTag::Start => 0,
            AnnotationTag::Data => 1,
            AnnotationTag::ParityOk => 2,
            AnnotationTag::ParityErr => 3,
            AnnotationTag::StopOk => 4,
            AnnotationTag::StopErr => 5,
            AnnotationTag::Raw => 6,
            AnnotationTag::Link => 7,
            AnnotationTag::Transport => 8,
            AnnotationTag::Application => 9,
        }
    }

    /// Display row this tag's annotations are grouped under.
    #[must_use]
    pub fn row(self) -> &'static str {
        match self {
            AnnotationTag::Start
            | AnnotationTag::Data
            | AnnotationTag::ParityOk
            | AnnotationTag::ParityErr
            | AnnotationTag::StopOk
            | AnnotationTag::StopErr => "bits",
            AnnotationTag::Raw => "raw-data",
            AnnotationTag::Link | AnnotationTag::Transport | AnnotationTag::Application => {
                "layers"
            }
        }
    }
}

/// One emitted annotation: a sample range, its tag, and one or more
/// alternative-length renderings of its text (long form first).
#[derive(Debug, Clone)]
pub struct Annotation {
    /// Sample range the annotation covers.
    pub range: SampleRange,
    /// Tag classifying this annotation.
    pub tag: AnnotationTag,
    /// Text alternatives, longest first, matching the host convention
    /// of picking whichever fits the available pixel width.
    pub text: Vec<String>,
}

impl Annotation {
    /// Build an annotation with a single text form.
    #[must_use]
    pub fn new(range: SampleRange, tag: AnnotationTag, text: impl Into<String>) -> Self {
        Self {
            range,
            tag,
            text: vec![text.into()],
        }
    }

    /// Build an annotation with long and short text forms.
    #[must_use]
    pub fn with_alternatives(
        range: SampleRange,
        tag: AnnotationTag,
        alternatives: Vec<String>,
    ) -> Self {
        Self {
            range,
            tag,
            text: alternatives,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_ids_are_stable() {
        assert_eq!(AnnotationTag::Start.id(), 0);
        assert_eq!(AnnotationTag::Raw.id(), 6);
        assert_eq!(AnnotationTag::Link.id(), 7);
        assert_eq!(AnnotationTag::Application.id(), 9);
    }

    #[test]
    fn rows_match_the_three_groups() {
        assert_eq!(AnnotationTag::ParityErr.row(), "bits");
        assert_eq!(AnnotationTag::Raw.row(), "raw-data");
        assert_eq!(AnnotationTag::Transport.row(), "layers");
    }

    #[test]
    fn annotation_carries_text_alternatives() {
        let a = Annotation::with_alternatives(
            SampleRange::new(0, 1),
            AnnotationTag::Link,
            vec!["Invalid".to_string(), "Inv".to_string()],
        );
        assert_eq!(a.text.len(), 2);
    }
}
