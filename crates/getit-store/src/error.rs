//! Engine error types and their wire status mapping.

use getit_protocol::Status;
use thiserror::Error;

/// Engine error type. The dispatcher maps these onto wire statuses.
#[derive(Error, Debug)]
pub enum EngineError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Slot or header decoding failure
    #[error("Error decoding file; {0}")]
    Decode(String),

    /// Probe budget exhausted without finding the key or an empty slot
    #[error("Maximum search depth exceeded")]
    ProbeExhausted,

    /// A probe landed on an offset at or past the end of the file
    #[error("Index outside of file: {0}")]
    OutsideFile(u64),

    /// Arithmetic result does not fit in an i32
    #[error("Arithmetic overflow")]
    Overflow,

    /// Arithmetic on a string value
    #[error("Arithmetic on a non-integer value")]
    TypeMismatch,

    /// The key does not exist
    #[error("Key not found")]
    NotFound,

    /// Resize target rejected
    #[error("Resize rejected: {0}")]
    ResizeRejected(String),

    /// Semantically invalid request arguments
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl EngineError {
    /// The wire status for this error.
    pub fn status(&self) -> Status {
        match self {
            EngineError::NotFound => Status::NotFound,
            EngineError::Overflow
            | EngineError::TypeMismatch
            | EngineError::ResizeRejected(_)
            | EngineError::BadRequest(_) => Status::InvalidRequest,
            EngineError::Io(_)
            | EngineError::Decode(_)
            | EngineError::ProbeExhausted
            | EngineError::OutsideFile(_) => Status::ServerError,
        }
    }
}

/// Result type alias using EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(EngineError::NotFound.status(), Status::NotFound);
        assert_eq!(EngineError::Overflow.status(), Status::InvalidRequest);
        assert_eq!(EngineError::TypeMismatch.status(), Status::InvalidRequest);
        assert_eq!(
            EngineError::ResizeRejected("x".to_string()).status(),
            Status::InvalidRequest
        );
        assert_eq!(EngineError::ProbeExhausted.status(), Status::ServerError);
        assert_eq!(EngineError::OutsideFile(9).status(), Status::ServerError);
        assert_eq!(
            EngineError::Decode("bad".to_string()).status(),
            Status::ServerError
        );
    }
}
