//! Arbitrary-length messages over System V message queues.
//!
//! The host queue moves tagged frames of bounded size; msgqprims layers
//! fragmentation on top so callers can send and receive messages of any
//! length under the same type tag.
//!
//! # Crate Structure
//!
//! - [`transport`] - Channel keys and handles, the raw frame primitive
//!   (System V queues on Linux, an in-memory fake everywhere)
//! - [`fragment`] - Splitting messages into frames and reassembling them
//!
//! ```no_run
//! # #[cfg(target_os = "linux")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use msgqprims::fragment::{receive, send};
//! use msgqprims::transport::{Channel, ChannelKey, OpenFlags, SysvTransport};
//!
//! let key = ChannelKey::from_path("/tmp", 0x22)?;
//! let channel = Channel::open_or_create(SysvTransport, key, OpenFlags::default())?;
//! send(&channel, 1, &vec![b'1'; 8193])?;
//! let message = receive(&channel, 1)?;
//! assert_eq!(message.payload.len(), 8193);
//! channel.destroy()?;
//! # Ok(())
//! # }
//! # #[cfg(not(target_os = "linux"))]
//! # fn main() {}
//! ```

/// Re-export transport types.
pub mod transport {
    pub use msgqprims_transport::*;
}

/// Re-export fragmentation types.
pub mod fragment {
    pub use msgqprims_fragment::*;
}
