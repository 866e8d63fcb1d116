//! Fragmentation and reassembly of arbitrary-length messages.
//!
//! The host queue only moves frames of at most
//! [`FRAME_CAPACITY`](msgqprims_transport::FRAME_CAPACITY) bytes. This crate
//! sends a message of any length as a run of frames sharing one type tag:
//! - every frame but the last is full and has the continuation marker set
//! - the last frame carries the remainder (possibly empty) with the marker clear
//!
//! A receiver asks for one type and concatenates frames until the marker is
//! clear. No state survives between calls.
//!
//! Senders must not interleave two multi-frame messages of the same type on
//! one channel; frames of different types never mix.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{frame_count, Chunk, FragmentConfig, Fragments, Message};
pub use error::{FragmentError, Result};
pub use reader::{receive, MessageReader};
pub use writer::{send, MessageWriter};
