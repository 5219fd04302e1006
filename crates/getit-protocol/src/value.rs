//! The tagged value type and its payload codecs.

use crate::{ProtocolError, ProtocolResult};

/// Maximum key length in bytes.
pub const MAX_KEY_LEN: usize = 31;

/// Maximum string value length in bytes.
pub const MAX_STRING_LEN: usize = 31;

/// Type byte for an int32 payload.
pub const TYPE_INT: u8 = 0;

/// Type byte for a string payload.
pub const TYPE_STR: u8 = 1;

/// A stored value: a 32-bit signed integer or a short string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i32),
    Str(String),
}

impl Value {
    /// The wire/file type byte for this value.
    pub fn type_byte(&self) -> u8 {
        match self {
            Value::Int(_) => TYPE_INT,
            Value::Str(_) => TYPE_STR,
        }
    }

    /// Encode as `type ‖ payload` with a length-prefixed string payload
    /// (request bodies and on-disk slots).
    pub fn encode_prefixed(&self, buf: &mut Vec<u8>) {
        match self {
            Value::Int(i) => {
                buf.push(TYPE_INT);
                buf.extend_from_slice(&i.to_be_bytes());
            }
            Value::Str(s) => {
                buf.push(TYPE_STR);
                buf.push(s.len() as u8);
                buf.extend_from_slice(s.as_bytes());
            }
        }
    }

    /// Decode a `type ‖ payload` value with a length-prefixed string
    /// payload, returning the value and the number of bytes consumed.
    pub fn decode_prefixed(bytes: &[u8]) -> ProtocolResult<(Self, usize)> {
        let type_byte = *bytes
            .first()
            .ok_or_else(|| ProtocolError::Malformed("missing value type".to_string()))?;
        match type_byte {
            TYPE_INT => {
                let raw: [u8; 4] = bytes
                    .get(1..5)
                    .and_then(|b| b.try_into().ok())
                    .ok_or_else(|| ProtocolError::Malformed("short int payload".to_string()))?;
                Ok((Value::Int(i32::from_be_bytes(raw)), 5))
            }
            TYPE_STR => {
                let len = *bytes
                    .get(1)
                    .ok_or_else(|| ProtocolError::Malformed("missing string length".to_string()))?
                    as usize;
                if len > MAX_STRING_LEN {
                    return Err(ProtocolError::Malformed(format!(
                        "string length {len} exceeds {MAX_STRING_LEN}"
                    )));
                }
                let raw = bytes
                    .get(2..2 + len)
                    .ok_or_else(|| ProtocolError::Malformed("short string payload".to_string()))?;
                let s = std::str::from_utf8(raw)
                    .map_err(|_| ProtocolError::Malformed("string payload not UTF-8".to_string()))?;
                Ok((Value::Str(s.to_string()), 2 + len))
            }
            other => Err(ProtocolError::Malformed(format!(
                "unknown value type byte: {other:#04x}"
            ))),
        }
    }

    /// Encode as `type ‖ payload` where a string payload runs to the end of
    /// the frame (response bodies).
    pub fn encode_trailing(&self, buf: &mut Vec<u8>) {
        match self {
            Value::Int(i) => {
                buf.push(TYPE_INT);
                buf.extend_from_slice(&i.to_be_bytes());
            }
            Value::Str(s) => {
                buf.push(TYPE_STR);
                buf.extend_from_slice(s.as_bytes());
            }
        }
    }

    /// Decode a `type ‖ payload` value that consumes the rest of the frame.
    pub fn decode_trailing(bytes: &[u8]) -> ProtocolResult<Self> {
        let type_byte = *bytes
            .first()
            .ok_or_else(|| ProtocolError::Malformed("missing value type".to_string()))?;
        match type_byte {
            TYPE_INT => {
                let raw: [u8; 4] = bytes
                    .get(1..5)
                    .and_then(|b| b.try_into().ok())
                    .ok_or_else(|| ProtocolError::Malformed("short int payload".to_string()))?;
                Ok(Value::Int(i32::from_be_bytes(raw)))
            }
            TYPE_STR => {
                let s = std::str::from_utf8(&bytes[1..])
                    .map_err(|_| ProtocolError::Malformed("string payload not UTF-8".to_string()))?;
                Ok(Value::Str(s.to_string()))
            }
            other => Err(ProtocolError::Malformed(format!(
                "unknown value type byte: {other:#04x}"
            ))),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_prefixed_roundtrip() {
        for i in [i32::MIN, -1, 0, 1, 42, i32::MAX] {
            let mut buf = Vec::new();
            Value::Int(i).encode_prefixed(&mut buf);
            assert_eq!(buf.len(), 5);

            let (value, consumed) = Value::decode_prefixed(&buf).unwrap();
            assert_eq!(value, Value::Int(i));
            assert_eq!(consumed, 5);
        }
    }

    #[test]
    fn test_str_prefixed_roundtrip() {
        let mut buf = Vec::new();
        Value::Str("hello".to_string()).encode_prefixed(&mut buf);
        assert_eq!(buf, vec![TYPE_STR, 5, b'h', b'e', b'l', b'l', b'o']);

        let (value, consumed) = Value::decode_prefixed(&buf).unwrap();
        assert_eq!(value, Value::Str("hello".to_string()));
        assert_eq!(consumed, 7);
    }

    #[test]
    fn test_trailing_str_consumes_rest() {
        let mut buf = Vec::new();
        Value::Str("abc".to_string()).encode_trailing(&mut buf);
        assert_eq!(buf, vec![TYPE_STR, b'a', b'b', b'c']);

        let value = Value::decode_trailing(&buf).unwrap();
        assert_eq!(value, Value::Str("abc".to_string()));
    }

    #[test]
    fn test_trailing_int_roundtrip() {
        let mut buf = Vec::new();
        Value::Int(-5).encode_trailing(&mut buf);

        let value = Value::decode_trailing(&buf).unwrap();
        assert_eq!(value, Value::Int(-5));
    }

    #[test]
    fn test_decode_prefixed_errors() {
        assert!(Value::decode_prefixed(&[]).is_err());
        assert!(Value::decode_prefixed(&[TYPE_INT, 0, 0]).is_err());
        assert!(Value::decode_prefixed(&[TYPE_STR]).is_err());
        assert!(Value::decode_prefixed(&[TYPE_STR, 4, b'a']).is_err());
        assert!(Value::decode_prefixed(&[7, 0]).is_err());
    }

    #[test]
    fn test_decode_prefixed_rejects_oversized_string() {
        let mut buf = vec![TYPE_STR, 32];
        buf.extend_from_slice(&[b'x'; 32]);
        assert!(Value::decode_prefixed(&buf).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(-12).to_string(), "-12");
        assert_eq!(Value::Str("abc".to_string()).to_string(), "abc");
    }
}
