//! Response construction and wire codecs.

use crate::{ProtocolResult, Status, Value};

/// A response to a single request, or one frame of a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Correlation id for logs (not on the wire).
    pub id: u8,
    /// Response status.
    pub status: Status,
    /// Data payload, present on Ok responses to data-producing verbs.
    pub value: Option<Value>,
}

impl Response {
    /// Create an Ok response with an optional data payload.
    pub fn ok(id: u8, value: Option<Value>) -> Self {
        Self {
            id,
            status: Status::Ok,
            value,
        }
    }

    /// Create a data-free response with the given status.
    pub fn with_status(id: u8, status: Status) -> Self {
        Self {
            id,
            status,
            value: None,
        }
    }

    /// Whether this is the terminal frame of a stream.
    pub fn is_stream_done(&self) -> bool {
        self.status == Status::StreamDone
    }

    /// Encode the response payload (excluding the frame length prefix).
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![self.status.to_byte()];
        if self.status == Status::Ok {
            if let Some(value) = &self.value {
                value.encode_trailing(&mut buf);
            }
        }
        buf
    }

    /// Decode a response payload.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        let status_byte = *bytes.first().ok_or_else(|| {
            crate::ProtocolError::Malformed("empty response".to_string())
        })?;
        let status = Status::from_byte(status_byte)?;
        let value = if status == Status::Ok && bytes.len() > 1 {
            Some(Value::decode_trailing(&bytes[1..])?)
        } else {
            None
        };
        Ok(Self {
            id: 0,
            status,
            value,
        })
    }

    /// The printable data payload. NotFound deliberately prints as the
    /// empty string (an impossible stored value).
    pub fn data_payload(&self) -> String {
        match &self.value {
            Some(value) => value.to_string(),
            None => String::new(),
        }
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(value) => write!(f, "Response({})<{},{}>", self.id, self.status, value),
            None => write!(f, "Response({})<{}>", self.id, self.status),
        }
    }
}
