use msgqprims_transport::TransportError;

/// Errors that can occur while sending or receiving a message.
#[derive(Debug, thiserror::Error)]
pub enum FragmentError {
    /// The first frame of the transfer failed; nothing was exchanged.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The transfer stopped after some frames were already exchanged.
    ///
    /// On send, the channel holds an unterminated prefix that will corrupt the
    /// next receive of the same type unless drained. On receive, the frames
    /// already consumed are lost.
    #[error("transfer interrupted after {frames} frame(s): {source}")]
    PartialTransfer {
        frames: usize,
        #[source]
        source: TransportError,
    },
}

impl FragmentError {
    /// Wrap a transport failure that happened after `frames` frames succeeded.
    pub(crate) fn after(frames: usize, source: TransportError) -> Self {
        if frames == 0 {
            Self::Transport(source)
        } else {
            Self::PartialTransfer { frames, source }
        }
    }

    /// The transport error that stopped the transfer.
    pub fn transport_error(&self) -> &TransportError {
        match self {
            Self::Transport(err) | Self::PartialTransfer { source: err, .. } => err,
        }
    }

    /// Number of frames exchanged before the failure.
    pub fn frames_transferred(&self) -> usize {
        match self {
            Self::Transport(_) => 0,
            Self::PartialTransfer { frames, .. } => *frames,
        }
    }

    /// Whether the transfer failed because non-blocking mode found no space or frame.
    pub fn is_would_block(&self) -> bool {
        matches!(self.transport_error(), TransportError::WouldBlock)
    }

    /// Whether the channel no longer exists.
    pub fn is_invalid_handle(&self) -> bool {
        matches!(self.transport_error(), TransportError::InvalidHandle(_))
    }
}

pub type Result<T> = std::result::Result<T, FragmentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_failure_is_plain_transport_error() {
        let err = FragmentError::after(0, TransportError::WouldBlock);
        assert!(matches!(err, FragmentError::Transport(TransportError::WouldBlock)));
        assert_eq!(err.frames_transferred(), 0);
        assert!(err.is_would_block());
    }

    #[test]
    fn later_failure_is_partial() {
        let err = FragmentError::after(2, TransportError::InvalidHandle(4));
        assert!(matches!(err, FragmentError::PartialTransfer { frames: 2, .. }));
        assert!(err.is_invalid_handle());
        assert!(err.to_string().contains("after 2 frame(s)"));
    }
}
