//! Protocol error types.

use thiserror::Error;

/// Protocol error type.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed wire payload
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// Unknown verb byte
    #[error("Unknown verb byte: {0:#04x}")]
    UnknownVerb(u8),

    /// Unknown status byte
    #[error("Unknown status byte: {0:#04x}")]
    UnknownStatus(u8),

    /// Frame payload exceeds the u16 length prefix
    #[error("Frame too large: {0} bytes")]
    FrameTooLarge(usize),

    /// Invalid client command arguments
    #[error("Error parsing request; {0}")]
    Parse(String),
}

/// Result type alias using ProtocolError.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
