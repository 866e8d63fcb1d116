use tracing::debug;

use crate::error::Result;
use crate::key::ChannelKey;
use crate::traits::{ChannelId, FrameTransport, OpenFlags, QueueStat};

/// Owner of an open channel identifier.
///
/// All frame I/O goes through the wrapped [`FrameTransport`]. Dropping a
/// `Channel` does not remove the host queue; call [`Channel::destroy`].
#[derive(Debug)]
pub struct Channel<T> {
    transport: T,
    id: ChannelId,
    key: ChannelKey,
}

impl<T: FrameTransport> Channel<T> {
    /// Look up or create the channel for `key` on `transport`.
    pub fn open_or_create(transport: T, key: ChannelKey, flags: OpenFlags) -> Result<Self> {
        let id = transport.open(key, flags)?;
        debug!(key = %key, channel = %id, mode = ?flags.mode, "opened channel");
        Ok(Self { transport, id, key })
    }

    /// Wrap an identifier obtained elsewhere (e.g. passed by another process).
    pub fn from_id(transport: T, id: ChannelId) -> Self {
        Self {
            transport,
            id,
            key: ChannelKey::PRIVATE,
        }
    }

    /// Remove the channel, discarding any pending frames.
    ///
    /// Receivers blocked on this channel in other threads or processes fail
    /// with `InvalidHandle`.
    pub fn destroy(self) -> Result<()> {
        self.transport.remove(self.id)?;
        debug!(channel = %self.id, "destroyed channel");
        Ok(())
    }

    /// Current pending state of the channel.
    pub fn stat(&self) -> Result<QueueStat> {
        self.transport.stat(self.id)
    }

    /// The channel identifier.
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// The key this channel was opened with (`PRIVATE` for [`Channel::from_id`]).
    pub fn key(&self) -> ChannelKey {
        self.key
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::memory::MemoryTransport;
    use crate::traits::WaitMode;

    #[test]
    fn open_existing_requires_create() {
        let host = MemoryTransport::new();
        let result = Channel::open_or_create(host.clone(), ChannelKey(0x10), OpenFlags::open());
        assert!(matches!(result, Err(TransportError::NotFound)));

        let created =
            Channel::open_or_create(host.clone(), ChannelKey(0x10), OpenFlags::default()).unwrap();
        let opened = Channel::open_or_create(host, ChannelKey(0x10), OpenFlags::open()).unwrap();
        assert_eq!(created.id(), opened.id());
        assert_eq!(opened.key(), ChannelKey(0x10));
    }

    #[test]
    fn destroy_invalidates_id() {
        let host = MemoryTransport::new();
        let channel =
            Channel::open_or_create(host.clone(), ChannelKey(0x11), OpenFlags::default()).unwrap();
        let id = channel.id();
        channel.destroy().unwrap();

        let err = host.send_frame(id, 1, false, b"x", WaitMode::Block).unwrap_err();
        assert!(matches!(err, TransportError::InvalidHandle(_)));

        let again = Channel::from_id(host, id);
        assert!(matches!(again.destroy(), Err(TransportError::InvalidHandle(_))));
    }

    #[test]
    fn stat_counts_pending_frames() {
        let host = MemoryTransport::new();
        let channel = Channel::open_or_create(&host, ChannelKey::PRIVATE, OpenFlags::default())
            .unwrap();
        host.send_frame(channel.id(), 1, true, b"ab", WaitMode::Block)
            .unwrap();
        host.send_frame(channel.id(), 1, false, b"c", WaitMode::Block)
            .unwrap();

        let stat = channel.stat().unwrap();
        assert_eq!(stat.frames, 2);
        assert_eq!(stat.bytes, Some(5));
    }
}
