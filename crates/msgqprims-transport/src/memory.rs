//! In-process implementation of the frame primitive.
//!
//! Follows the host queue contract closely enough to drive the fragmentation
//! layer deterministically in tests: exact-type FIFO selection, blocking and
//! non-blocking modes, a byte limit per channel, owner read/write permission
//! checks, and hard failure of blocked callers when a channel is removed.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tracing::trace;

use crate::error::{Result, TransportError};
use crate::key::ChannelKey;
use crate::traits::{
    check_payload, check_type, ChannelId, Frame, FrameTransport, OpenFlags, OpenMode, QueueStat,
    WaitMode, CONTINUATION_SIZE, FRAME_CAPACITY,
};

const OWNER_READ: u32 = 0o400;
const OWNER_WRITE: u32 = 0o200;

/// Shared in-memory queue host. Clones refer to the same set of channels.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<State>,
    changed: Condvar,
    queue_limit: usize,
}

#[derive(Debug, Default)]
struct State {
    next_id: i32,
    keys: HashMap<ChannelKey, i32>,
    queues: HashMap<i32, Queue>,
}

#[derive(Debug)]
struct Queue {
    key: ChannelKey,
    permissions: u32,
    frames: VecDeque<Frame>,
    bytes: usize,
}

impl MemoryTransport {
    /// Create a host whose channels have no byte limit.
    pub fn new() -> Self {
        Self::with_queue_limit(usize::MAX)
    }

    /// Create a host whose channels hold at most `bytes` queued bytes.
    ///
    /// Queued bytes are counted the way the kernel counts them: the
    /// continuation marker plus the payload of each frame.
    pub fn with_queue_limit(bytes: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    next_id: 1,
                    ..State::default()
                }),
                changed: Condvar::new(),
                queue_limit: bytes,
            }),
        }
    }

    /// Snapshot of the frames queued on `channel`, oldest first.
    pub fn pending(&self, channel: ChannelId) -> Result<Vec<Frame>> {
        let state = self.shared.lock();
        let queue = state
            .queues
            .get(&channel.0)
            .ok_or(TransportError::InvalidHandle(channel.0))?;
        Ok(queue.frames.iter().cloned().collect())
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, State>) -> MutexGuard<'a, State> {
        self.changed
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl State {
    fn create(&mut self, key: ChannelKey, permissions: u32) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        self.queues.insert(
            id,
            Queue {
                key,
                permissions: permissions & 0o777,
                frames: VecDeque::new(),
                bytes: 0,
            },
        );
        if !key.is_private() {
            self.keys.insert(key, id);
        }
        id
    }
}

impl Queue {
    fn require(&self, bit: u32) -> Result<()> {
        if self.permissions & bit == 0 {
            return Err(TransportError::AccessDenied);
        }
        Ok(())
    }
}

impl FrameTransport for MemoryTransport {
    fn open(&self, key: ChannelKey, flags: OpenFlags) -> Result<ChannelId> {
        let mut state = self.shared.lock();

        if key.is_private() {
            return Ok(ChannelId(state.create(key, flags.permissions)));
        }

        match (state.keys.get(&key).copied(), flags.mode) {
            (Some(_), OpenMode::CreateExclusive) => Err(TransportError::AlreadyExists),
            (Some(id), _) => Ok(ChannelId(id)),
            (None, OpenMode::Open) => Err(TransportError::NotFound),
            (None, _) => Ok(ChannelId(state.create(key, flags.permissions))),
        }
    }

    fn remove(&self, channel: ChannelId) -> Result<()> {
        let mut state = self.shared.lock();
        let queue = state
            .queues
            .remove(&channel.0)
            .ok_or(TransportError::InvalidHandle(channel.0))?;
        if state.keys.get(&queue.key) == Some(&channel.0) {
            state.keys.remove(&queue.key);
        }
        drop(state);
        self.shared.changed.notify_all();
        Ok(())
    }

    fn send_frame(
        &self,
        channel: ChannelId,
        mtype: i64,
        continuation: bool,
        payload: &[u8],
        wait: WaitMode,
    ) -> Result<()> {
        check_type(mtype)?;
        check_payload(payload, FRAME_CAPACITY)?;

        let size = CONTINUATION_SIZE + payload.len();
        let limit = self.shared.queue_limit;
        if size > limit {
            return Err(TransportError::PayloadTooLarge { size, max: limit });
        }

        let mut state = self.shared.lock();
        loop {
            let queue = state
                .queues
                .get_mut(&channel.0)
                .ok_or(TransportError::InvalidHandle(channel.0))?;
            queue.require(OWNER_WRITE)?;

            if queue.bytes + size <= limit {
                queue
                    .frames
                    .push_back(Frame::new(mtype, continuation, Bytes::copy_from_slice(payload)));
                queue.bytes += size;
                trace!(channel = %channel, mtype, continuation, size, "queued frame");
                drop(state);
                self.shared.changed.notify_all();
                return Ok(());
            }

            if wait == WaitMode::NoWait {
                return Err(TransportError::WouldBlock);
            }
            state = self.shared.wait(state);
        }
    }

    fn receive_frame(&self, channel: ChannelId, mtype: i64, wait: WaitMode) -> Result<Frame> {
        check_type(mtype)?;

        let mut state = self.shared.lock();
        loop {
            let queue = state
                .queues
                .get_mut(&channel.0)
                .ok_or(TransportError::InvalidHandle(channel.0))?;
            queue.require(OWNER_READ)?;

            let position = queue.frames.iter().position(|frame| frame.mtype == mtype);
            if let Some(frame) = position.and_then(|index| queue.frames.remove(index)) {
                queue.bytes -= frame.wire_size();
                trace!(channel = %channel, mtype, continuation = frame.continuation, "dequeued frame");
                drop(state);
                self.shared.changed.notify_all();
                return Ok(frame);
            }

            if wait == WaitMode::NoWait {
                return Err(TransportError::WouldBlock);
            }
            state = self.shared.wait(state);
        }
    }

    fn stat(&self, channel: ChannelId) -> Result<QueueStat> {
        let state = self.shared.lock();
        let queue = state
            .queues
            .get(&channel.0)
            .ok_or(TransportError::InvalidHandle(channel.0))?;
        Ok(QueueStat {
            frames: queue.frames.len() as u64,
            bytes: Some(queue.bytes as u64),
            max_bytes: u64::try_from(self.shared.queue_limit).unwrap_or(u64::MAX),
        })
    }
}
