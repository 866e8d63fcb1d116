use bytes::Bytes;
use msgqprims_transport::WaitMode;

/// A complete logical message: a type tag and a payload of any length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The type tag shared by every frame of the message.
    pub mtype: i64,
    /// The reassembled payload.
    pub payload: Bytes,
}

impl Message {
    /// Create a new message.
    pub fn new(mtype: i64, payload: impl Into<Bytes>) -> Self {
        Self {
            mtype,
            payload: payload.into(),
        }
    }

    /// Split into `(type, payload)`.
    pub fn into_parts(self) -> (i64, Bytes) {
        (self.mtype, self.payload)
    }
}

/// Configuration for message writers and readers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FragmentConfig {
    /// Wait mode applied to every frame of a message. Default: block.
    pub wait: WaitMode,
}

impl FragmentConfig {
    /// Fail fast instead of waiting for space or frames.
    pub fn nonblocking() -> Self {
        Self {
            wait: WaitMode::NoWait,
        }
    }
}

/// Number of frames a payload of `len` bytes occupies on the wire.
///
/// Empty payloads still take one frame.
pub fn frame_count(len: usize, capacity: usize) -> usize {
    if len == 0 {
        1
    } else {
        len.div_ceil(capacity)
    }
}

/// One frame's worth of a message being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Whether more chunks follow.
    pub continuation: bool,
    /// At most `capacity` bytes of the message.
    pub payload: &'a [u8],
}

/// Splits a payload into capacity-sized chunks, the last one possibly shorter.
///
/// Always yields at least one chunk; only the last has `continuation` unset.
#[derive(Debug, Clone)]
pub struct Fragments<'a> {
    remaining: &'a [u8],
    capacity: usize,
    done: bool,
}

impl<'a> Fragments<'a> {
    /// Split `payload` into chunks of at most `capacity` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(payload: &'a [u8], capacity: usize) -> Self {
        assert!(capacity > 0, "frame capacity must be non-zero");
        Self {
            remaining: payload,
            capacity,
            done: false,
        }
    }
}

impl<'a> Iterator for Fragments<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let take = self.capacity.min(self.remaining.len());
        let (head, tail) = self.remaining.split_at(take);
        self.remaining = tail;
        let continuation = !tail.is_empty();
        self.done = !continuation;

        Some(Chunk {
            continuation,
            payload: head,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = if self.done {
            0
        } else {
            frame_count(self.remaining.len(), self.capacity)
        };
        (left, Some(left))
    }
}

impl ExactSizeIterator for Fragments<'_> {}
