//! Network error types.

use thiserror::Error;

/// Network error type.
#[derive(Error, Debug)]
pub enum NetError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(#[from] getit_protocol::ProtocolError),
}

/// Result type alias using NetError.
pub type NetResult<T> = Result<T, NetError>;
