//! Error taxonomy for the responder

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResponderError {
    /// The listening socket could not be bound. Fatal.
    #[error("failed to bind {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The strategy document could not be encoded. Fatal at startup.
    #[error("failed to render sampling strategy: {0}")]
    Render(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// Per-connection I/O failure; recovered by dropping the connection.
    #[error("connection i/o: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ResponderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_names_address() {
        let err = ResponderError::Bind {
            addr: "127.0.0.1:5778".parse().unwrap(),
            source: io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
        };
        assert_eq!(err.to_string(), "failed to bind 127.0.0.1:5778");
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("address in use"));
    }

    #[test]
    fn test_io_error_converts() {
        let err: ResponderError = io::Error::from(io::ErrorKind::BrokenPipe).into();
        assert!(matches!(err, ResponderError::Io(_)));
    }
}
