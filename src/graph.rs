/*! Graphs contain blocks connected by streams, and run them.
*/
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace};

use crate::block::{Block, BlockRet};
use crate::Result;

/// Token used to ask a running graph to stop between work passes.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a new, not-yet-canceled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once [`Self::cancel`] has been called.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Common interface for flowgraph runners.
///
/// The decoder only ever needs [`Graph`]'s single-threaded scheduler,
/// but the trait keeps call sites (and tests) agnostic of that.
pub trait GraphRunner {
    /// Add a block to the flowgraph.
    fn add(&mut self, b: Box<dyn Block>);

    /// Run the graph until every block is done.
    fn run(&mut self) -> Result<()>;

    /// Token that can be used to cancel a running graph, e.g. from a
    /// Ctrl-C handler.
    fn cancel_token(&self) -> CancellationToken;
}

/// A graph runs blocks connected by streams, one work pass at a time,
/// on the calling thread.
///
/// Unlike the multithreaded scheduler this framework's SDR heritage
/// favors, decoding one KNX capture has no real-time deadline and no
/// benefit from spreading blocks across OS threads, so this is a plain
/// cooperative loop: each pass calls `work()` on every block in order.
pub struct Graph {
    blocks: Vec<Box<dyn Block>>,
    cancel_token: CancellationToken,
}

impl Graph {
    /// Create a new, empty flowgraph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            cancel_token: CancellationToken::new(),
        }
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphRunner for Graph {
    fn add(&mut self, b: Box<dyn Block>) {
        self.blocks.push(b);
    }

    fn run(&mut self) -> Result<()> {
        let idle_sleep = Duration::from_millis(1);
        loop {
            if self.cancel_token.is_canceled() {
                debug!("Graph: canceled");
                return Ok(());
            }
            let mut progressed = false;
            let mut all_done = true;
            for b in &mut self.blocks {
                let ret = b.work()?;
                trace!("{}: {:?}", b.block_name(), ret);
                match ret {
                    BlockRet::Ok | BlockRet::Again => {
                        progressed = true;
                        all_done = false;
                    }
                    BlockRet::EOF => {}
                    BlockRet::Pending | BlockRet::Noop | BlockRet::WaitForStream(_) => {
                        all_done = false;
                    }
                }
            }
            if all_done {
                debug!("Graph: all blocks done");
                return Ok(());
            }
            if !progressed {
                std::thread::sleep(idle_sleep);
            }
        }
    }

    fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockEOF;

    struct CountTo(usize, usize);
    impl crate::block::BlockName for CountTo {
        fn block_name(&self) -> &str {
            "CountTo"
        }
    }
    impl BlockEOF for CountTo {
        fn eof(&mut self) -> bool {
            self.0 >= self.1
        }
    }
    impl Block for CountTo {
        fn work(&mut self) -> Result<BlockRet> {
            if self.0 >= self.1 {
                return Ok(BlockRet::EOF);
            }
            self.0 += 1;
            Ok(BlockRet::Ok)
        }
    }

    #[test]
    fn runs_to_eof() -> Result<()> {
        let mut g = Graph::new();
        g.add(Box::new(CountTo(0, 5)));
        g.run()?;
        Ok(())
    }
}
