//! Convenient module collecting the decoder's blocks for import.
pub use crate::decoder::KnxTp1Decoder;
pub use crate::file_source::FileSource;
