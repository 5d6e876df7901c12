#![warn(missing_docs)]
/*! This crate decodes the KNX TP1 fieldbus, from a raw bus-level sample
stream down to link/transport/application frames.

It's built on the block/stream architecture familiar from software
defined radio frameworks: small units of work ([`block::Block`])
connected by typed streams, scheduled by a [`graph::Graph`] until every
source is exhausted.

# Architecture overview

A decoding run consists of blocks connected by unidirectional streams.
Each block has zero or more input streams and zero or more output
streams. Data flows from "sources" (blocks without inputs, such as
[`blocks::FileSource`]) through decoding stages to "sinks".

```text
 [ FileSource<u8> ]            levels, one sample per byte
        ↓
 [ KnxTp1Decoder  ]  →  NCWriteStream<Annotation>  (bits/octets/frames)
        ↓
  WriteStream<u8>     (reconstructed octet values, the `rxtx` stream)
```

The bit sampler, UART framer, link framer, and TPDU/APDU dissectors
that make up [`KnxTp1Decoder`][decoder::KnxTp1Decoder] are internal
collaborators rather than separate blocks: they share one running
[`link_framer::LinkFramerState`] and are driven synchronously from one
`work()` call, the way the protocol's original host-framework decoder
drove them from one `decode()` coroutine.

# Example

```
use knx_tp1::graph::{Graph, GraphRunner};
use knx_tp1::blocks::{FileSource, KnxTp1Decoder};
use knx_tp1::config::{DecoderConfig, Polarity};
# fn main() -> anyhow::Result<()> {
let (src, src_out) = FileSource::new("/dev/null", false)?;
let cfg = DecoderConfig::new(9600 * 20, Polarity::Normal)?;
let (dec, _annotations) = KnxTp1Decoder::new(src_out, cfg);
let mut g = Graph::new();
g.add(Box::new(src));
g.add(Box::new(dec));
g.run()?;
# Ok(())
# }
```
*/
use std::sync::atomic::AtomicUsize;

pub mod annotation;
pub mod apdu;
pub mod bit_sampler;
pub mod block;
pub mod blocks;
pub mod circular_buffer;
pub mod config;
pub mod decoder;
pub mod file_source;
pub mod graph;
pub mod link_framer;
pub mod opcodes;
pub mod stream;
pub mod tpdu;
pub mod types;
pub mod uart_framer;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Monotonically increasing id, shared by every stream's read and write
/// side so that e.g. log messages can refer to "stream 3" consistently.
pub(crate) static NEXT_STREAM_ID: AtomicUsize = AtomicUsize::new(0);

/// Crate-wide error type.
///
/// Kept as a single string-carrying type, in the style of small
/// single-binary tools: there is exactly one thing a caller can do with
/// a decode error (log it and move on, or abort if it's the fatal
/// configuration error from [`config`]), so a typed hierarchy of
/// variants would not earn its keep.
#[derive(Debug, Clone)]
pub struct Error {
    msg: String,
}

impl Error {
    /// Create an error with a fixed message.
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }

    /// Create an error, same as [`Error::new`].
    ///
    /// Kept as a separate name because both spellings are idiomatic at
    /// different call sites: `msg` reads better with `format!(...)`.
    pub fn msg(msg: impl Into<String>) -> Self {
        Self::new(msg)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "knx_tp1 error: {}", self.msg)
    }
}

impl std::error::Error for Error {}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Error {
        Error::new(format!("{e}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::new(format!("IO error: {e}"))
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(e: std::sync::PoisonError<T>) -> Error {
        Error::new(format!("poisoned lock: {e}"))
    }
}

/// Trivial trait for types that have `.len()`.
///
/// Lets generic stream code bound on "has a length" without requiring
/// full `ExactSizeIterator` machinery.
#[allow(clippy::len_without_is_empty)]
pub trait Len {
    /// Number of elements.
    fn len(&self) -> usize;
}

impl<T> Len for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }
}
