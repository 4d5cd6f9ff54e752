use std::fmt;
use std::io;

use satlink_frame::FrameError;
use satlink_ingest::IngestError;
use satlink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
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
        io::ErrorKind::AddrInUse | io::ErrorKind::AddrNotAvailable => TRANSPORT_ERROR,
        io::ErrorKind::ConnectionRefused => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { addr, source } => {
            io_error(&format!("{context}: cannot bind {addr}"), source)
        }
        TransportError::Send { source, .. } | TransportError::Io(source) => {
            io_error(context, source)
        }
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn ingest_error(context: &str, err: IngestError) -> CliError {
    match err {
        IngestError::Transport(err) => transport_error(context, err),
        IngestError::Spawn(source) => io_error(context, source),
        other => CliError::new(FAILURE, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_in_use_maps_to_transport_code() {
        let err = TransportError::Bind {
            addr: "127.0.0.1:5005".parse().unwrap(),
            source: io::Error::from(io::ErrorKind::AddrInUse),
        };
        let cli = ingest_error("listen failed", IngestError::Transport(err));
        assert_eq!(cli.code, TRANSPORT_ERROR);
        assert!(cli.message.contains("127.0.0.1:5005"));
    }

    #[test]
    fn decode_failures_are_data_invalid() {
        let cli = frame_error("decode failed", FrameError::EmptyInput);
        assert_eq!(cli.code, DATA_INVALID);
        assert_eq!(cli.message, "decode failed: empty packet string");
    }
}
