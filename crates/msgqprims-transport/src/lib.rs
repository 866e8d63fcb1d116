//! Bounded-frame message queue transport.
//!
//! Exposes the host's atomic single-frame primitive behind the
//! [`FrameTransport`] trait:
//! - System V message queues (Linux), via [`SysvTransport`]
//! - An in-process fake with the same contract, via [`MemoryTransport`]
//!
//! This is the lowest layer of msgqprims. Every frame carries a positive
//! type tag, a one-byte continuation marker, and at most
//! [`FRAME_CAPACITY`] bytes of payload. Multi-frame messages are built on
//! top of this by `msgqprims-fragment`.

pub mod channel;
pub mod error;
pub mod key;
pub mod memory;
pub mod traits;

#[cfg(target_os = "linux")]
pub mod sysv;

pub use channel::Channel;
pub use error::{Result, TransportError};
pub use key::ChannelKey;
pub use memory::MemoryTransport;
pub use traits::{
    ChannelId, Frame, FrameTransport, OpenFlags, OpenMode, QueueStat, WaitMode, FRAME_CAPACITY,
};

#[cfg(target_os = "linux")]
pub use sysv::SysvTransport;
