use std::fmt;
use std::io;

use msgqprims_fragment::FragmentError;
use msgqprims_transport::TransportError;

// Process exit codes. 124 mirrors timeout(1) for "nothing available".
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

fn transport_code(err: &TransportError) -> i32 {
    match err {
        TransportError::AccessDenied => PERMISSION_DENIED,
        TransportError::WouldBlock => TIMEOUT,
        TransportError::NotFound | TransportError::AlreadyExists => FAILURE,
        TransportError::InvalidType(_) => USAGE,
        TransportError::PayloadTooLarge { .. } | TransportError::MalformedFrame(_) => DATA_INVALID,
        TransportError::ZeroCapacity => INTERNAL,
        TransportError::InvalidHandle(_) | TransportError::ResourceLimit => TRANSPORT_ERROR,
        TransportError::KeyPath { .. } => FAILURE,
        TransportError::Io(_) => INTERNAL,
    }
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) => io_error(context, source),
        other => CliError::new(transport_code(&other), format!("{context}: {other}")),
    }
}

pub fn fragment_error(context: &str, err: FragmentError) -> CliError {
    match err {
        FragmentError::Transport(err) => transport_error(context, err),
        partial @ FragmentError::PartialTransfer { .. } => CliError::new(
            transport_code(partial.transport_error()),
            format!("{context}: {partial}"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_map_to_codes() {
        assert_eq!(
            transport_error("x", TransportError::AccessDenied).code,
            PERMISSION_DENIED
        );
        assert_eq!(transport_error("x", TransportError::WouldBlock).code, TIMEOUT);
        assert_eq!(
            transport_error("x", TransportError::InvalidHandle(3)).code,
            TRANSPORT_ERROR
        );
        assert_eq!(transport_error("x", TransportError::NotFound).code, FAILURE);
    }

    #[test]
    fn partial_transfer_keeps_underlying_code() {
        let err = FragmentError::PartialTransfer {
            frames: 2,
            source: TransportError::WouldBlock,
        };
        let cli = fragment_error("receive failed", err);
        assert_eq!(cli.code, TIMEOUT);
        assert!(cli.message.starts_with("receive failed: transfer interrupted"));
    }
}
