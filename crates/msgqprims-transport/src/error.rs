use std::path::PathBuf;

/// Errors that can occur in queue transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to derive a channel key from the given path.
    #[error("failed to derive key from {path}: {source}")]
    KeyPath {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The channel does not exist or was destroyed.
    #[error("invalid channel handle {0}")]
    InvalidHandle(i32),

    /// A frame payload exceeds the frame capacity.
    #[error("frame payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The transport cannot carry any payload bytes per frame.
    #[error("frame capacity is zero")]
    ZeroCapacity,

    /// Frame types must be strictly positive.
    #[error("invalid frame type {0} (must be > 0)")]
    InvalidType(i64),

    /// Non-blocking mode was requested and no space or frame is available.
    #[error("operation would block")]
    WouldBlock,

    /// The caller lacks permission on the channel.
    #[error("access denied")]
    AccessDenied,

    /// No channel exists for the key and creation was not requested.
    #[error("channel not found")]
    NotFound,

    /// Exclusive creation was requested but the channel already exists.
    #[error("channel already exists")]
    AlreadyExists,

    /// A host limit on channels or queued bytes was reached.
    #[error("host resource limit reached")]
    ResourceLimit,

    /// A received frame did not carry a valid continuation marker.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Any other host I/O error.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Map a host `errno` from a queue syscall to a transport error.
    ///
    /// `EINTR` is handled by the callers (the syscall is restarted) and is
    /// only passed through here as a plain I/O error. `EINVAL` is read as a
    /// stale id; `msgsnd` callers rule out an oversized message first.
    #[cfg(target_os = "linux")]
    pub(crate) fn from_errno(channel: i32, err: std::io::Error) -> Self {
        match err.raw_os_error() {
            Some(libc::EACCES) | Some(libc::EPERM) => Self::AccessDenied,
            Some(libc::ENOENT) => Self::NotFound,
            Some(libc::EEXIST) => Self::AlreadyExists,
            Some(libc::ENOSPC) | Some(libc::ENOMEM) => Self::ResourceLimit,
            Some(libc::EINVAL) | Some(libc::EIDRM) => Self::InvalidHandle(channel),
            Some(libc::EAGAIN) | Some(libc::ENOMSG) => Self::WouldBlock,
            _ => Self::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
