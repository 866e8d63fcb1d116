use msgqprims_transport::traits::check_type;
use msgqprims_transport::{Channel, FrameTransport, TransportError, WaitMode};
use tracing::{debug, warn};

use crate::codec::{frame_count, FragmentConfig, Fragments, Message};
use crate::error::{FragmentError, Result};

/// Splits messages into frames and enqueues them on a channel.
///
/// Each frame is sent atomically, but the sequence is not: if a frame fails,
/// the frames already sent stay in the channel and the error is returned.
pub struct MessageWriter<'a, T> {
    channel: &'a Channel<T>,
    config: FragmentConfig,
}

impl<'a, T: FrameTransport> MessageWriter<'a, T> {
    /// Create a new message writer with default configuration.
    pub fn new(channel: &'a Channel<T>) -> Self {
        Self::with_config(channel, FragmentConfig::default())
    }

    /// Create a new message writer with explicit configuration.
    pub fn with_config(channel: &'a Channel<T>, config: FragmentConfig) -> Self {
        Self { channel, config }
    }

    /// Send a complete message.
    pub fn write_message(&self, message: &Message) -> Result<()> {
        self.send(message.mtype, message.payload.as_ref())
    }

    /// Fragment `payload` and send every frame with type `mtype`.
    pub fn send(&self, mtype: i64, payload: &[u8]) -> Result<()> {
        check_type(mtype)?;

        let transport = self.channel.transport();
        let capacity = transport.frame_capacity();
        if capacity == 0 {
            return Err(TransportError::ZeroCapacity.into());
        }
        let total = frame_count(payload.len(), capacity);

        for (sent, chunk) in Fragments::new(payload, capacity).enumerate() {
            if let Err(err) = transport.send_frame(
                self.channel.id(),
                mtype,
                chunk.continuation,
                chunk.payload,
                self.config.wait,
            ) {
                if sent > 0 {
                    warn!(
                        channel = %self.channel.id(),
                        mtype,
                        sent,
                        total,
                        error = %err,
                        "send aborted mid-message; unterminated frames left in channel"
                    );
                }
                return Err(FragmentError::after(sent, err));
            }
        }

        debug!(channel = %self.channel.id(), mtype, size = payload.len(), frames = total, "sent message");
        Ok(())
    }

    /// Borrow the channel.
    pub fn channel(&self) -> &Channel<T> {
        self.channel
    }

    /// Update the wait mode for subsequent sends.
    pub fn set_wait_mode(&mut self, wait: WaitMode) {
        self.config.wait = wait;
    }

    /// Current message writer configuration.
    pub fn config(&self) -> &FragmentConfig {
        &self.config
    }
}

/// Send one message on `channel` in blocking mode.
pub fn send<T: FrameTransport>(channel: &Channel<T>, mtype: i64, payload: &[u8]) -> Result<()> {
    MessageWriter::new(channel).send(mtype, payload)
}

#[cfg(test)]
mod tests {
    use msgqprims_transport::{
        ChannelId, ChannelKey, Frame, MemoryTransport, OpenFlags, QueueStat, FRAME_CAPACITY,
    };

    use super::*;

    fn channel(host: &MemoryTransport) -> Channel<MemoryTransport> {
        Channel::open_or_create(host.clone(), ChannelKey::PRIVATE, OpenFlags::default()).unwrap()
    }

    #[test]
    fn one_byte_over_capacity_makes_two_frames() {
        let host = MemoryTransport::new();
        let channel = channel(&host);
        let payload = vec![b'1'; FRAME_CAPACITY + 1];

        send(&channel, 1, &payload).unwrap();

        let frames = host.pending(channel.id()).unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].continuation);
        assert_eq!(frames[0].payload.len(), FRAME_CAPACITY);
        assert!(!frames[1].continuation);
        assert_eq!(frames[1].payload.as_ref(), b"1");
    }

    #[test]
    fn empty_message_is_one_empty_final_frame() {
        let host = MemoryTransport::new();
        let channel = channel(&host);

        send(&channel, 1, b"").unwrap();

        let frames = host.pending(channel.id()).unwrap();
        assert_eq!(frames.len(), 1);
        assert!(!frames[0].continuation);
        assert!(frames[0].payload.is_empty());
    }

    #[test]
    fn frame_count_and_continuation_flags() {
        let host = MemoryTransport::new();
        let channel = channel(&host);
        let c = FRAME_CAPACITY;

        for (i, len) in [1, c - 1, c, c + 1, 3 * c, 3 * c + 7].into_iter().enumerate() {
            let mtype = i as i64 + 1;
            send(&channel, mtype, &vec![0x5a; len]).unwrap();

            let frames: Vec<_> = host
                .pending(channel.id())
                .unwrap()
                .into_iter()
                .filter(|f| f.mtype == mtype)
                .collect();
            assert_eq!(frames.len(), frame_count(len, c), "len {len}");
            let (last, rest) = frames.split_last().unwrap();
            assert!(rest.iter().all(|f| f.continuation && f.payload.len() == c));
            assert!(!last.continuation);
        }
    }

    #[test]
    fn invalid_type_touches_nothing() {
        let host = MemoryTransport::new();
        let channel = channel(&host);

        let err = send(&channel, 0, b"x").unwrap_err();
        assert!(matches!(
            err,
            FragmentError::Transport(TransportError::InvalidType(0))
        ));
        assert!(host.pending(channel.id()).unwrap().is_empty());
    }

    #[test]
    fn full_channel_mid_message_leaves_prefix() {
        let host = MemoryTransport::with_queue_limit(FRAME_CAPACITY + 1);
        let channel = channel(&host);
        let writer = MessageWriter::with_config(&channel, FragmentConfig::nonblocking());

        let err = writer.send(1, &vec![0u8; FRAME_CAPACITY * 2]).unwrap_err();
        assert!(matches!(
            err,
            FragmentError::PartialTransfer {
                frames: 1,
                source: TransportError::WouldBlock
            }
        ));

        let frames = host.pending(channel.id()).unwrap();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].continuation);
    }

    #[test]
    fn send_after_destroy_is_invalid_handle() {
        let host = MemoryTransport::new();
        let id = channel(&host).id();
        Channel::from_id(host.clone(), id).destroy().unwrap();

        let stale = Channel::from_id(host, id);
        let err = send(&stale, 1, b"late").unwrap_err();
        assert!(err.is_invalid_handle());
        assert_eq!(err.frames_transferred(), 0);
    }

    #[test]
    fn write_message_and_wait_mode() {
        let host = MemoryTransport::new();
        let channel = channel(&host);
        let mut writer = MessageWriter::new(&channel);
        assert_eq!(writer.config().wait, WaitMode::Block);

        writer.set_wait_mode(WaitMode::NoWait);
        writer.write_message(&Message::new(4, "abc")).unwrap();

        assert_eq!(writer.channel().id(), channel.id());
        assert_eq!(host.pending(channel.id()).unwrap()[0].mtype, 4);
    }

    /// Memory transport that claims it cannot carry any payload.
    struct NoRoom(MemoryTransport);

    impl FrameTransport for NoRoom {
        fn frame_capacity(&self) -> usize {
            0
        }

        fn open(&self, key: ChannelKey, flags: OpenFlags) -> msgqprims_transport::Result<ChannelId> {
            self.0.open(key, flags)
        }

        fn remove(&self, channel: ChannelId) -> msgqprims_transport::Result<()> {
            self.0.remove(channel)
        }

        fn send_frame(
            &self,
            channel: ChannelId,
            mtype: i64,
            continuation: bool,
            payload: &[u8],
            wait: WaitMode,
        ) -> msgqprims_transport::Result<()> {
            self.0.send_frame(channel, mtype, continuation, payload, wait)
        }

        fn receive_frame(
            &self,
            channel: ChannelId,
            mtype: i64,
            wait: WaitMode,
        ) -> msgqprims_transport::Result<Frame> {
            self.0.receive_frame(channel, mtype, wait)
        }

        fn stat(&self, channel: ChannelId) -> msgqprims_transport::Result<QueueStat> {
            self.0.stat(channel)
        }
    }

    #[test]
    fn zero_capacity_transport_is_an_error() {
        let host = MemoryTransport::new();
        let channel =
            Channel::open_or_create(NoRoom(host.clone()), ChannelKey::PRIVATE, OpenFlags::default())
                .unwrap();

        for payload in [&b""[..], b"data"] {
            let err = send(&channel, 1, payload).unwrap_err();
            assert!(matches!(
                err,
                FragmentError::Transport(TransportError::ZeroCapacity)
            ));
        }
        assert!(host.pending(channel.id()).unwrap().is_empty());
    }
}
