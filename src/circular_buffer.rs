//! Buffer backing the read and write sides of a [`crate::stream`].
//!
//! Upstream SDR pipelines favor a double-mapped mmap ring buffer here,
//! so that multi-megasample blocks can hand contiguous slices across
//! threads without copying. This decoder processes one finite capture
//! at a time on one thread, so a plain mutex-guarded queue gives the
//! same interface at a fraction of the complexity, with no unsafe code.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::stream::Tag;
use crate::{Error, Result};

static NEXT_BUFFER_ID: AtomicUsize = AtomicUsize::new(0);

struct Inner<T> {
    data: VecDeque<T>,
    tags: Vec<Tag>,
    capacity: usize,
}

/// Shared buffer between one [`crate::stream::WriteStream`] and its
/// paired [`crate::stream::ReadStream`].
pub struct Buffer<T> {
    id: usize,
    inner: Mutex<Inner<T>>,
}

impl<T> Buffer<T> {
    /// Create a new buffer with the given soft capacity, used only to
    /// report [`Buffer::free`]; the queue itself still grows as needed.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            id: NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed),
            inner: Mutex::new(Inner {
                data: VecDeque::new(),
                tags: Vec::new(),
                capacity,
            }),
        })
    }

    /// Id shared by both stream halves.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Configured soft capacity.
    pub fn total_size(&self) -> Result<usize> {
        Ok(self.inner.lock()?.capacity)
    }

    /// Soft capacity minus samples currently queued.
    pub fn free(&self) -> Result<usize> {
        let inner = self.inner.lock()?;
        Ok(inner.capacity.saturating_sub(inner.data.len()))
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.inner.lock()?.data.is_empty())
    }

    /// Samples currently available to read.
    pub fn wait_for_read(&self, _need: usize) -> Result<usize> {
        Ok(self.inner.lock()?.data.len())
    }

    /// Free space currently available to write.
    pub fn wait_for_write(&self, _need: usize) -> Result<usize> {
        self.free()
    }
}

impl<T: Copy> Buffer<T> {
    /// Borrow the current read window.
    pub fn read_buf(self: Arc<Self>) -> Result<(BufferReader<T>, Vec<Tag>)> {
        let tags = self.inner.lock()?.tags.clone();
        Ok((BufferReader { buf: self }, tags))
    }
}

impl<T: Copy + Default> Buffer<T> {
    /// Borrow a window to write into.
    pub fn write_buf(self: Arc<Self>) -> Result<BufferWriter<T>> {
        let scratch_len = self.inner.lock()?.capacity.max(1);
        Ok(BufferWriter {
            buf: self,
            scratch: vec![T::default(); scratch_len],
        })
    }
}

/// A readable window into a [`Buffer`].
pub struct BufferReader<T> {
    buf: Arc<Buffer<T>>,
}

impl<T: Copy> BufferReader<T> {
    /// Snapshot of everything currently queued.
    pub fn slice(&self) -> Result<Vec<T>> {
        Ok(self.buf.inner.lock()?.data.iter().copied().collect())
    }

    /// Number of samples queued.
    pub fn len(&self) -> Result<usize> {
        Ok(self.buf.inner.lock()?.data.len())
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Drop the first `n` samples, and rebase tag positions accordingly.
    pub fn consume(&self, n: usize) -> Result<()> {
        let mut inner = self.buf.inner.lock()?;
        let n = n.min(inner.data.len());
        inner.data.drain(..n);
        inner.tags.retain_mut(|t| {
            if t.pos() < n {
                false
            } else {
                t.set_pos(t.pos() - n);
                true
            }
        });
        Ok(())
    }
}

/// A writable scratch window for a [`Buffer`].
pub struct BufferWriter<T> {
    buf: Arc<Buffer<T>>,
    scratch: Vec<T>,
}

impl<T: Copy> BufferWriter<T> {
    /// Mutable scratch space to fill before calling [`Self::produce`].
    pub fn slice(&mut self) -> &mut [T] {
        &mut self.scratch
    }

    /// Capacity of the scratch space.
    pub fn len(&self) -> usize {
        self.scratch.len()
    }

    /// True if the scratch space has zero capacity.
    pub fn is_empty(&self) -> bool {
        self.scratch.is_empty()
    }

    /// Copy `data` into the start of the scratch space.
    pub fn fill_from_slice(&mut self, data: &[T]) {
        self.scratch[..data.len()].copy_from_slice(data);
    }

    /// Commit the first `n` scratch samples, tagging them with `tags`
    /// (positions relative to the start of this batch).
    pub fn produce(&mut self, n: usize, tags: &[Tag]) -> Result<()> {
        let mut inner = self.buf.inner.lock()?;
        let base = inner.data.len();
        inner.data.extend(self.scratch[..n].iter().copied());
        for t in tags {
            inner.tags.push(Tag::new(base + t.pos(), t.key(), t.val().clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_write_roundtrip() -> Result<()> {
        let buf: Arc<Buffer<u8>> = Arc::new(Buffer::new(16)?);
        {
            let mut w = buf.clone().write_buf()?;
            w.fill_from_slice(&[1, 2, 3]);
            w.produce(3, &[Tag::new(1, "x", crate::stream::TagValue::Bool(true))])?;
        }
        let (r, tags) = buf.clone().read_buf()?;
        assert_eq!(r.slice()?, vec![1, 2, 3]);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].pos(), 1);
        r.consume(2)?;
        let (r, tags) = buf.clone().read_buf()?;
        assert_eq!(r.slice()?, vec![3]);
        assert_eq!(tags[0].pos(), 0);
        Ok(())
    }
}
