use bytes::BytesMut;
use msgqprims_transport::traits::check_type;
use msgqprims_transport::{Channel, FrameTransport, WaitMode};
use tracing::{debug, warn};

use crate::codec::{FragmentConfig, Message};
use crate::error::{FragmentError, Result};

/// Reassembles complete messages from frames of one type.
///
/// Assumes at most one multi-frame message of a given type is in flight on
/// the channel at a time. Two senders interleaving frames of the same type
/// produce a corrupted message; this is not detected.
pub struct MessageReader<'a, T> {
    channel: &'a Channel<T>,
    config: FragmentConfig,
}

impl<'a, T: FrameTransport> MessageReader<'a, T> {
    /// Create a new message reader with default configuration.
    pub fn new(channel: &'a Channel<T>) -> Self {
        Self::with_config(channel, FragmentConfig::default())
    }

    /// Create a new message reader with explicit configuration.
    pub fn with_config(channel: &'a Channel<T>, config: FragmentConfig) -> Self {
        Self { channel, config }
    }

    /// Receive the next complete message of type `mtype`.
    ///
    /// The configured wait mode applies to every frame, so a non-blocking
    /// read can fail with a partial transfer if the sender is mid-message.
    pub fn recv(&self, mtype: i64) -> Result<Message> {
        check_type(mtype)?;

        let transport = self.channel.transport();
        let mut payload = BytesMut::new();
        let mut frames = 0usize;

        loop {
            let frame = match transport.receive_frame(self.channel.id(), mtype, self.config.wait)
            {
                Ok(frame) => frame,
                Err(err) => {
                    if frames > 0 {
                        warn!(
                            channel = %self.channel.id(),
                            mtype,
                            frames,
                            discarded = payload.len(),
                            error = %err,
                            "receive aborted mid-message"
                        );
                    }
                    return Err(FragmentError::after(frames, err));
                }
            };
            frames += 1;

            if frames == 1 && !frame.continuation {
                debug!(channel = %self.channel.id(), mtype, size = frame.payload.len(), frames, "received message");
                return Ok(Message::new(mtype, frame.payload));
            }

            payload.extend_from_slice(&frame.payload);
            if !frame.continuation {
                break;
            }
        }

        debug!(channel = %self.channel.id(), mtype, size = payload.len(), frames, "received message");
        Ok(Message::new(mtype, payload.freeze()))
    }

    /// Borrow the channel.
    pub fn channel(&self) -> &Channel<T> {
        self.channel
    }

    /// Update the wait mode for subsequent receives.
    pub fn set_wait_mode(&mut self, wait: WaitMode) {
        self.config.wait = wait;
    }

    /// Current message reader configuration.
    pub fn config(&self) -> &FragmentConfig {
        &self.config
    }
}

/// Receive one message of type `mtype` from `channel` in blocking mode.
pub fn receive<T: FrameTransport>(channel: &Channel<T>, mtype: i64) -> Result<Message> {
    MessageReader::new(channel).recv(mtype)
}
