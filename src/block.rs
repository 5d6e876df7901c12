/*! Block implementation.

Blocks are the main building blocks of the decoder. Each one does one
thing, and is connected to others with streams to process the data.
*/
use crate::Error;

/// Return type for all blocks.
///
/// Tells the [`crate::graph::Graph`] scheduler whether more data could
/// come out of this block, or whether it should stop bothering to call
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRet {
    /// At least one item was produced or consumed. Call again soon;
    /// more may follow immediately.
    Ok,

    /// Like [`BlockRet::Ok`], but specifically "there is probably more
    /// work queued up right now" — call again before yielding to other
    /// blocks.
    Again,

    /// Nothing to do right now, but the block isn't done: a background
    /// process (e.g. an idle timeout) may cause it to produce later.
    Pending,

    /// Produced nothing because an input stream didn't have enough
    /// queued yet.
    Noop,

    /// Shorthand for [`BlockRet::Noop`] that additionally names how
    /// many items the block was waiting for. Purely informational; the
    /// scheduler treats it the same as `Noop`.
    WaitForStream(usize),

    /// This block will never produce more output.
    ///
    /// When every block in a graph reports either `EOF` or has no
    /// remaining input and reports `Noop`, the graph is done.
    EOF,
}

/// Name of a block, for logging and stats.
pub trait BlockName {
    /// Name of the block type. Not the name of this particular
    /// instance, though it may include the instantiated type, e.g.
    /// `FileSource<u8>`.
    fn block_name(&self) -> &str;
}

/// End-of-file status of a block.
pub trait BlockEOF {
    /// True once this block will never produce more output.
    ///
    /// Takes `&mut self` because reporting EOF may need to propagate it
    /// to output streams.
    fn eof(&mut self) -> bool {
        false
    }
}

/// Trait every block must implement.
pub trait Block: BlockName + BlockEOF {
    /// Do a bounded amount of work: read what's available from input
    /// streams, write what fits in output streams.
    fn work(&mut self) -> Result<BlockRet, Error>;
}
