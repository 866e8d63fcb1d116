use bytes::Bytes;

use crate::error::{Result, TransportError};
use crate::key::ChannelKey;

/// Maximum payload carried by a single frame.
///
/// Both peers of a channel must be built with the same value; it is not
/// negotiated on the wire.
pub const FRAME_CAPACITY: usize = 8192;

/// Size of the continuation marker that precedes each frame payload.
pub const CONTINUATION_SIZE: usize = 1;

/// Continuation marker: more frames follow for this message.
pub const MORE: u8 = 1;

/// Continuation marker: last frame of the message.
pub const LAST: u8 = 0;

/// Kernel-assigned identifier of an open channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub i32);

impl ChannelId {
    /// The raw host identifier.
    pub fn raw(self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One atomic unit of transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Selection tag, always > 0.
    pub mtype: i64,
    /// Whether more frames follow for the same message.
    pub continuation: bool,
    /// Frame payload, at most [`FRAME_CAPACITY`] bytes.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(mtype: i64, continuation: bool, payload: impl Into<Bytes>) -> Self {
        Self {
            mtype,
            continuation,
            payload: payload.into(),
        }
    }

    /// Host message size of this frame (marker + payload).
    pub fn wire_size(&self) -> usize {
        CONTINUATION_SIZE + self.payload.len()
    }
}

/// Whether an operation may suspend the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WaitMode {
    /// Wait for space (send) or a matching frame (receive).
    #[default]
    Block,
    /// Fail with [`TransportError::WouldBlock`] instead of waiting.
    NoWait,
}

/// How a channel is looked up when opening it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OpenMode {
    /// Open an existing channel; fail with `NotFound` if absent.
    Open,
    /// Open the channel, creating it if absent.
    #[default]
    Create,
    /// Create the channel; fail with `AlreadyExists` if present.
    CreateExclusive,
}

/// Flags applied when opening a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFlags {
    /// Lookup/creation behavior.
    pub mode: OpenMode,
    /// Permission bits for a newly created channel (only the low 9 bits are used).
    pub permissions: u32,
}

impl OpenFlags {
    /// Default permission bits for created channels.
    pub const DEFAULT_PERMISSIONS: u32 = 0o600;

    /// Open an existing channel only.
    pub fn open() -> Self {
        Self {
            mode: OpenMode::Open,
            ..Self::default()
        }
    }

    /// Open or create with the given permission bits.
    pub fn create(permissions: u32) -> Self {
        Self {
            mode: OpenMode::Create,
            permissions,
        }
    }
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self {
            mode: OpenMode::Create,
            permissions: Self::DEFAULT_PERMISSIONS,
        }
    }
}

/// Snapshot of a channel's pending state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStat {
    /// Number of frames currently queued.
    pub frames: u64,
    /// Bytes currently queued, if the host reports it.
    pub bytes: Option<u64>,
    /// Maximum number of bytes the channel may hold.
    pub max_bytes: u64,
}

/// The raw bounded-frame primitive.
///
/// Implementations perform exactly one atomic host operation per call and
/// know nothing about multi-frame messages.
pub trait FrameTransport {
    /// Maximum payload of one frame.
    fn frame_capacity(&self) -> usize {
        FRAME_CAPACITY
    }

    /// Look up or create the channel for `key`.
    fn open(&self, key: ChannelKey, flags: OpenFlags) -> Result<ChannelId>;

    /// Remove the channel and discard any pending frames.
    fn remove(&self, channel: ChannelId) -> Result<()>;

    /// Atomically enqueue one frame.
    fn send_frame(
        &self,
        channel: ChannelId,
        mtype: i64,
        continuation: bool,
        payload: &[u8],
        wait: WaitMode,
    ) -> Result<()>;

    /// Dequeue the oldest pending frame whose type is exactly `mtype`.
    fn receive_frame(&self, channel: ChannelId, mtype: i64, wait: WaitMode) -> Result<Frame>;

    /// Report the channel's pending state.
    fn stat(&self, channel: ChannelId) -> Result<QueueStat>;
}

impl<T: FrameTransport + ?Sized> FrameTransport for &T {
    fn frame_capacity(&self) -> usize {
        (**self).frame_capacity()
    }

    fn open(&self, key: ChannelKey, flags: OpenFlags) -> Result<ChannelId> {
        (**self).open(key, flags)
    }

    fn remove(&self, channel: ChannelId) -> Result<()> {
        (**self).remove(channel)
    }

    fn send_frame(
        &self,
        channel: ChannelId,
        mtype: i64,
        continuation: bool,
        payload: &[u8],
        wait: WaitMode,
    ) -> Result<()> {
        (**self).send_frame(channel, mtype, continuation, payload, wait)
    }

    fn receive_frame(&self, channel: ChannelId, mtype: i64, wait: WaitMode) -> Result<Frame> {
        (**self).receive_frame(channel, mtype, wait)
    }

    fn stat(&self, channel: ChannelId) -> Result<QueueStat> {
        (**self).stat(channel)
    }
}

/// Reject non-positive frame types.
pub fn check_type(mtype: i64) -> Result<()> {
    if mtype <= 0 {
        return Err(TransportError::InvalidType(mtype));
    }
    Ok(())
}

/// Reject payloads larger than `capacity`.
pub fn check_payload(payload: &[u8], capacity: usize) -> Result<()> {
    if payload.len() > capacity {
        return Err(TransportError::PayloadTooLarge {
            size: payload.len(),
            max: capacity,
        });
    }
    Ok(())
}

/// Decode a continuation marker byte.
pub fn decode_continuation(marker: u8) -> Result<bool> {
    match marker {
        MORE => Ok(true),
        LAST => Ok(false),
        other => Err(TransportError::MalformedFrame(format!(
            "continuation marker {other:#04x}"
        ))),
    }
}
