//! Request construction, parsing and wire codecs.

use crate::{ProtocolError, ProtocolResult, Value, Verb, MAX_KEY_LEN, MAX_STRING_LEN};
use std::sync::atomic::{AtomicU8, Ordering};

static REQUEST_COUNTER: AtomicU8 = AtomicU8::new(0);

/// Produce the next request id. Ids are 8-bit, wrap around, and are used
/// only for log correlation.
pub fn next_request_id() -> u8 {
    REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A decoded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Correlation id for logs.
    pub id: u8,
    /// The request verb.
    pub verb: Verb,
    /// Key argument, for verbs that carry one.
    pub key: Option<String>,
    /// Value argument, for verbs that carry one.
    pub value: Option<Value>,
}

impl Request {
    /// Create a bare request.
    pub fn new(verb: Verb) -> Self {
        Self {
            id: next_request_id(),
            verb,
            key: None,
            value: None,
        }
    }

    /// Create a request with a key.
    pub fn with_key(verb: Verb, key: &str) -> Self {
        Self {
            key: Some(key.to_string()),
            ..Self::new(verb)
        }
    }

    /// Create a request with a key and a value.
    pub fn with_key_value(verb: Verb, key: &str, value: Value) -> Self {
        Self {
            key: Some(key.to_string()),
            value: Some(value),
            ..Self::new(verb)
        }
    }

    /// Create a request with a value only (Resize).
    pub fn with_value(verb: Verb, value: Value) -> Self {
        Self {
            value: Some(value),
            ..Self::new(verb)
        }
    }

    /// Whether this request produces a multi-frame response stream.
    pub fn is_stream(&self) -> bool {
        self.verb.is_stream()
    }

    /// The key argument, or an empty string.
    pub fn key(&self) -> &str {
        self.key.as_deref().unwrap_or("")
    }

    /// Encode the request payload (excluding the frame length prefix).
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.push(self.verb.to_byte());
        match self.verb {
            Verb::Store | Verb::Add | Verb::Sub => {
                encode_key(&mut buf, self.key());
                if let Some(value) = &self.value {
                    value.encode_prefixed(&mut buf);
                }
            }
            Verb::Load | Verb::Clear | Verb::Space => {
                encode_key(&mut buf, self.key());
            }
            Verb::Resize => {
                if let Some(value) = &self.value {
                    value.encode_prefixed(&mut buf);
                }
            }
            _ => {}
        }
        buf
    }

    /// Decode a request payload, assigning a fresh correlation id.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        let verb_byte = *bytes
            .first()
            .ok_or_else(|| ProtocolError::Malformed("empty request".to_string()))?;
        let verb = Verb::from_byte(verb_byte)?;
        let body = &bytes[1..];

        let (key, value) = match verb {
            Verb::Store | Verb::Add | Verb::Sub => {
                let (key, consumed) = decode_key(body)?;
                let (value, _) = Value::decode_prefixed(&body[consumed..])?;
                (Some(key), Some(value))
            }
            Verb::Load | Verb::Clear | Verb::Space => {
                let (key, _) = decode_key(body)?;
                (Some(key), None)
            }
            Verb::Resize => {
                let (value, _) = Value::decode_prefixed(body)?;
                if !matches!(value, Value::Int(_)) {
                    return Err(ProtocolError::Malformed(
                        "resize requires an integer target".to_string(),
                    ));
                }
                (None, Some(value))
            }
            _ => (None, None),
        };

        Ok(Self {
            id: next_request_id(),
            verb,
            key,
            value,
        })
    }

    /// Build a request from client command words.
    ///
    /// `store k v` infers an int value when `v` parses as an in-range i32;
    /// `clear` with no key degrades to `clearall`; `space` defaults to
    /// `current` and also accepts the short forms `c` and `e`.
    pub fn from_args(args: &[String]) -> ProtocolResult<Self> {
        if args.is_empty() {
            return Err(ProtocolError::Parse("enter a command".to_string()));
        }
        let verb = Verb::parse(&args[0])?;
        match verb {
            Verb::Store => {
                if args.len() < 3 {
                    return Err(ProtocolError::Parse("need 3 args for store".to_string()));
                }
                let key = validate_key(&args[1])?;
                let value = parse_value(&args[2])?;
                Ok(Self::with_key_value(verb, key, value))
            }
            Verb::Add | Verb::Sub => {
                if args.len() < 3 {
                    return Err(ProtocolError::Parse(format!(
                        "need 3 args for {}",
                        verb.as_str().to_lowercase()
                    )));
                }
                let key = validate_key(&args[1])?;
                let delta = parse_int(&args[2], verb)?;
                Ok(Self::with_key_value(verb, key, Value::Int(delta)))
            }
            Verb::Resize => {
                if args.len() < 2 {
                    return Err(ProtocolError::Parse("need 2 args for resize".to_string()));
                }
                let target = parse_int(&args[1], verb)?;
                Ok(Self::with_value(verb, Value::Int(target)))
            }
            Verb::Load => {
                if args.len() < 2 {
                    return Err(ProtocolError::Parse("need 2 args for load".to_string()));
                }
                let key = validate_key(&args[1])?;
                Ok(Self::with_key(verb, key))
            }
            Verb::Clear => {
                if args.len() < 2 {
                    return Ok(Self::new(Verb::ClearAll));
                }
                let key = validate_key(&args[1])?;
                Ok(Self::with_key(verb, key))
            }
            Verb::Space => {
                if args.len() < 2 {
                    return Ok(Self::with_key(verb, "current"));
                }
                match args[1].to_lowercase().as_str() {
                    "c" | "current" => Ok(Self::with_key(verb, "current")),
                    "e" | "empty" => Ok(Self::with_key(verb, "empty")),
                    _ => Err(ProtocolError::Parse(
                        "space argument must be 'current' or 'empty'".to_string(),
                    )),
                }
            }
            _ => Ok(Self::new(verb)),
        }
    }
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let body = match self.verb {
            Verb::Store | Verb::Add | Verb::Sub => match &self.value {
                Some(Value::Str(s)) => format!("{}[{}:'{}']", self.verb, self.key(), s),
                Some(Value::Int(i)) => format!("{}[{}:{}]", self.verb, self.key(), i),
                None => format!("{}[{}]", self.verb, self.key()),
            },
            Verb::Resize => match &self.value {
                Some(v) => format!("{}[{}]", self.verb, v),
                None => self.verb.to_string(),
            },
            Verb::Load | Verb::Clear | Verb::Space => format!("{}[{}]", self.verb, self.key()),
            _ => self.verb.to_string(),
        };
        write!(f, "Request({})<{}>", self.id, body)
    }
}

fn encode_key(buf: &mut Vec<u8>, key: &str) {
    buf.push(key.len() as u8);
    buf.extend_from_slice(key.as_bytes());
}

fn decode_key(bytes: &[u8]) -> ProtocolResult<(String, usize)> {
    let len = *bytes
        .first()
        .ok_or_else(|| ProtocolError::Malformed("missing key length".to_string()))? as usize;
    if len > MAX_KEY_LEN {
        return Err(ProtocolError::Malformed(format!(
            "key length {len} exceeds {MAX_KEY_LEN}"
        )));
    }
    let raw = bytes
        .get(1..1 + len)
        .ok_or_else(|| ProtocolError::Malformed("short key payload".to_string()))?;
    let key = std::str::from_utf8(raw)
        .map_err(|_| ProtocolError::Malformed("key not UTF-8".to_string()))?;
    Ok((key.to_string(), 1 + len))
}

fn validate_key(key: &str) -> ProtocolResult<&str> {
    if key.len() > MAX_KEY_LEN {
        return Err(ProtocolError::Parse(format!(
            "key must be at most {MAX_KEY_LEN} characters"
        )));
    }
    Ok(key)
}

fn parse_value(data: &str) -> ProtocolResult<Value> {
    if let Ok(i) = data.parse::<i64>() {
        let i = i32::try_from(i).map_err(|_| {
            ProtocolError::Parse(format!(
                "invalid int data (must be {}-{})",
                i32::MIN,
                i32::MAX
            ))
        })?;
        return Ok(Value::Int(i));
    }
    if data.len() > MAX_STRING_LEN {
        return Err(ProtocolError::Parse(format!(
            "data must be at most {MAX_STRING_LEN} characters"
        )));
    }
    Ok(Value::Str(data.to_string()))
}

fn parse_int(data: &str, verb: Verb) -> ProtocolResult<i32> {
    let i = data.parse::<i64>().map_err(|_| {
        ProtocolError::Parse(format!(
            "data for {} must be an integer",
            verb.as_str().to_lowercase()
        ))
    })?;
    i32::try_from(i).map_err(|_| {
        ProtocolError::Parse(format!(
            "invalid int data (must be {}-{})",
            i32::MIN,
            i32::MAX
        ))
    })
}
