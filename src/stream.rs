/*! Streams connecting blocks.

Blocks are connected with streams. A block can have zero or more input
streams, and write to zero or more output streams.
*/
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::circular_buffer;
use crate::{Error, Result};

/// Tag position in the current stream window.
pub type TagPos = usize;

/// Value carried by a [`Tag`].
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub enum TagValue {
    /// String value.
    String(String),

    /// Unsigned 64-bit value. Used for sample indices that don't fit a
    /// window-relative `usize`, and for general-purpose counters.
    U64(u64),

    /// Signed 64-bit value.
    I64(i64),

    /// Boolean value.
    Bool(bool),
}

impl std::fmt::Display for TagValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagValue::String(s) => write!(f, "String:{s}"),
            TagValue::U64(s) => write!(f, "U64:{s}"),
            TagValue::I64(s) => write!(f, "I64:{s}"),
            TagValue::Bool(s) => write!(f, "Bool:{s}"),
        }
    }
}

/// Metadata attached to a position within a stream.
#[derive(Debug, PartialEq, Clone, PartialOrd)]
pub struct Tag {
    pos: TagPos,
    key: String,
    val: TagValue,
}

impl Tag {
    /// Create a new tag.
    #[must_use]
    pub fn new<T: Into<String>>(pos: TagPos, key: T, val: TagValue) -> Self {
        Self {
            pos,
            key: key.into(),
            val,
        }
    }

    /// Position, relative to the current window.
    #[must_use]
    pub fn pos(&self) -> TagPos {
        self.pos
    }

    /// Set the position.
    pub fn set_pos(&mut self, pos: TagPos) {
        self.pos = pos;
    }

    /// Tag key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Tag value.
    #[must_use]
    pub fn val(&self) -> &TagValue {
        &self.val
    }
}

/// Default soft capacity for a Copy-type stream.
///
/// The decoder works sample-by-sample and octet-by-octet rather than in
/// large SDR-style batches, so this is sized for "a lot of individual
/// pushes", not for amortizing huge block transfers.
pub(crate) const DEFAULT_STREAM_SIZE: usize = 4096;

const DEFAULT_NOCOPY_CAPACITY: usize = 1024;

/// Common interface for checking whether a stream side is closed or has
/// enough data/space queued.
pub trait StreamWait {
    /// Id shared between the read and write side.
    #[must_use]
    fn id(&self) -> usize;

    /// True if `need` items are available now (reads) or free now
    /// (writes).
    fn ready(&self, need: usize) -> Result<bool>;

    /// True if the other end of this stream has been dropped.
    #[must_use]
    fn closed(&self) -> bool;
}

impl<T: Copy> StreamWait for ReadStream<T> {
    fn id(&self) -> usize {
        self.circ.id()
    }
    fn ready(&self, need: usize) -> Result<bool> {
        Ok(self.circ.wait_for_read(need)? >= need)
    }
    fn closed(&self) -> bool {
        self.refcount() == 1
    }
}

impl<T: Copy + Default> StreamWait for WriteStream<T> {
    fn id(&self) -> usize {
        self.circ.id()
    }
    fn ready(&self, need: usize) -> Result<bool> {
        Ok(self.circ.wait_for_write(need)? >= need)
    }
    fn closed(&self) -> bool {
        self.refcount() == 1
    }
}

/// The reading side of a stream.
///
/// From the `ReadStream` you get windows into the queued data by
/// calling [`ReadStream::read_buf`].
#[derive(Clone)]
pub struct ReadStream<T> {
    circ: Arc<circular_buffer::Buffer<T>>,
}

impl<T: Copy> ReadStream<T> {
    /// Create a stream pre-loaded with `data`, for tests.
    #[cfg(test)]
    #[must_use]
    pub fn from_slice(data: &[T]) -> Self
    where
        T: Default,
    {
        let circ = Arc::new(circular_buffer::Buffer::new(data.len().max(1)).unwrap());
        let mut wb = circ.clone().write_buf().unwrap();
        wb.fill_from_slice(data);
        wb.produce(data.len(), &[]).unwrap();
        Self { circ }
    }

    /// Borrow the current read window and its tags.
    pub fn read_buf(&self) -> Result<(circular_buffer::BufferReader<T>, Vec<Tag>)> {
        Arc::clone(&self.circ).read_buf()
    }
}

impl<T> ReadStream<T> {
    /// True if there is nothing more ever to read.
    #[must_use]
    pub fn eof(&self) -> bool {
        if Arc::strong_count(&self.circ) != 1 {
            return false;
        }
        self.circ.is_empty().unwrap_or(true)
    }

    #[must_use]
    pub(crate) fn refcount(&self) -> usize {
        Arc::strong_count(&self.circ)
    }
}

/// The writing side of a stream.
pub struct WriteStream<T> {
    circ: Arc<circular_buffer::Buffer<T>>,
}

impl<T> Clone for WriteStream<T> {
    fn clone(&self) -> Self {
        Self {
            circ: self.circ.clone(),
        }
    }
}

impl<T: Default> WriteStream<T> {
    /// Create a new Copy-type stream, returning both halves.
    #[must_use]
    pub fn new() -> (WriteStream<T>, ReadStream<T>) {
        new_stream()
    }
}

impl<T> StreamReadSide for WriteStream<T> {
    type ReadSide = ReadStream<T>;
}

impl<T: Copy + Default> WriteStream<T> {
    /// Free space, in samples.
    pub fn free(&self) -> Result<usize> {
        self.circ.free()
    }

    /// Borrow a scratch window to write into.
    pub fn write_buf(&self) -> Result<circular_buffer::BufferWriter<T>> {
        Arc::clone(&self.circ).write_buf()
    }

    #[must_use]
    pub(crate) fn refcount(&self) -> usize {
        Arc::strong_count(&self.circ)
    }
}

/// Create a new stream for `Copy` payloads: samples, bits, octet
/// values. Anything that would be a GNU Radio "stream", not a
/// "message".
#[must_use]
pub fn new_stream<T: Default>() -> (WriteStream<T>, ReadStream<T>) {
    let circ = Arc::new(circular_buffer::Buffer::new(DEFAULT_STREAM_SIZE).unwrap());
    (WriteStream { circ: circ.clone() }, ReadStream { circ })
}

struct NCEntry<T> {
    val: T,
    tags: Vec<Tag>,
}

struct NCInner<T> {
    queue: Mutex<VecDeque<NCEntry<T>>>,
    capacity: usize,
}

/// A stream of non-`Copy` payloads: annotations, assembled packets.
pub struct NCReadStream<T> {
    id: usize,
    inner: Arc<NCInner<T>>,
}

impl<T> StreamWait for NCReadStream<T> {
    fn id(&self) -> usize {
        self.id
    }
    fn ready(&self, need: usize) -> Result<bool> {
        Ok(self.inner.queue.lock()?.len() >= need)
    }
    fn closed(&self) -> bool {
        Arc::strong_count(&self.inner) == 1
    }
}

impl<T> StreamWait for NCWriteStream<T> {
    fn id(&self) -> usize {
        self.id
    }
    fn ready(&self, _need: usize) -> Result<bool> {
        Ok(true)
    }
    fn closed(&self) -> bool {
        Arc::strong_count(&self.inner) == 1
    }
}

/// The writing side of a non-`Copy` stream.
pub struct NCWriteStream<T> {
    id: usize,
    inner: Arc<NCInner<T>>,
}

impl<T> Clone for NCWriteStream<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: self.inner.clone(),
        }
    }
}

/// Create a new stream for non-`Copy` payloads, returning both halves.
#[must_use]
pub fn new_nocopy_stream<T>() -> (NCWriteStream<T>, NCReadStream<T>) {
    let inner = Arc::new(NCInner {
        queue: Mutex::new(VecDeque::new()),
        capacity: DEFAULT_NOCOPY_CAPACITY,
    });
    let id = crate::NEXT_STREAM_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    (
        NCWriteStream {
            id,
            inner: inner.clone(),
        },
        NCReadStream { id, inner },
    )
}

impl<T> NCReadStream<T> {
    /// Pop one item, if any is queued.
    #[must_use]
    pub fn pop(&self) -> Option<(T, Vec<Tag>)> {
        self.inner
            .queue
            .lock()
            .ok()?
            .pop_front()
            .map(|e| (e.val, e.tags))
    }

    /// True if there is nothing more ever to read.
    #[must_use]
    pub fn eof(&self) -> bool {
        if !self.is_empty() {
            return false;
        }
        Arc::strong_count(&self.inner) == 1
    }

    /// True if empty right now.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner
            .queue
            .lock()
            .map(|q| q.is_empty())
            .unwrap_or(true)
    }
}

/// Maps a `WriteStream<T>` to its corresponding `ReadStream<T>` type, so
/// generic block-construction helpers don't need to spell it out.
pub trait StreamReadSide {
    /// The matching read-side type.
    type ReadSide;
}

impl<T> StreamReadSide for NCWriteStream<T> {
    type ReadSide = NCReadStream<T>;
}

impl<T> NCWriteStream<T> {
    /// Create a new non-`Copy` stream, returning both halves.
    #[must_use]
    pub fn new() -> (NCWriteStream<T>, NCReadStream<T>) {
        new_nocopy_stream()
    }

    /// Push one item, handing off ownership.
    ///
    /// Doesn't enforce capacity; check [`Self::remaining`] first if
    /// overflow is a concern.
    pub fn push<Tags: Into<Vec<Tag>>>(&self, val: T, tags: Tags) {
        if let Ok(mut q) = self.inner.queue.lock() {
            q.push_back(NCEntry {
                val,
                tags: tags.into(),
            });
        }
    }

    /// Remaining capacity before [`Self::push`] would overflow the soft
    /// limit.
    #[must_use]
    pub fn remaining(&self) -> usize {
        let has = self.inner.queue.lock().map(|q| q.len()).unwrap_or(0);
        self.inner.capacity.saturating_sub(has)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_stream_roundtrip() -> Result<()> {
        let (w, r): (WriteStream<u8>, ReadStream<u8>) = WriteStream::new();
        {
            let mut b = w.write_buf()?;
            b.fill_from_slice(&[1, 2, 3]);
            b.produce(3, &[])?;
        }
        let (buf, _tags) = r.read_buf()?;
        assert_eq!(buf.slice()?, vec![1, 2, 3]);
        buf.consume(3)?;
        drop(w);
        assert!(r.eof());
        Ok(())
    }

    #[test]
    fn nocopy_stream_roundtrip() {
        let (w, r): (NCWriteStream<Vec<u8>>, NCReadStream<Vec<u8>>) = NCWriteStream::new();
        w.push(vec![1, 2, 3], vec![Tag::new(0, "k", TagValue::Bool(true))]);
        let (val, tags) = r.pop().unwrap();
        assert_eq!(val, vec![1, 2, 3]);
        assert_eq!(tags.len(), 1);
        assert!(r.pop().is_none());
        drop(w);
        assert!(r.eof());
    }
}
