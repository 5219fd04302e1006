//! Request verbs and response statuses.

use crate::{ProtocolError, ProtocolResult};

/// Request verbs. The discriminant is the wire byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Verb {
    Store = 0,
    Add = 1,
    Sub = 2,
    Load = 3,
    Clear = 4,
    ClearAll = 5,
    Keys = 6,
    Values = 7,
    Items = 8,
    Resize = 9,
    Count = 10,
    Size = 11,
    Space = 12,
    Exit = 13,
}

impl Verb {
    /// Convert from wire format byte.
    pub fn from_byte(byte: u8) -> ProtocolResult<Self> {
        match byte {
            0 => Ok(Verb::Store),
            1 => Ok(Verb::Add),
            2 => Ok(Verb::Sub),
            3 => Ok(Verb::Load),
            4 => Ok(Verb::Clear),
            5 => Ok(Verb::ClearAll),
            6 => Ok(Verb::Keys),
            7 => Ok(Verb::Values),
            8 => Ok(Verb::Items),
            9 => Ok(Verb::Resize),
            10 => Ok(Verb::Count),
            11 => Ok(Verb::Size),
            12 => Ok(Verb::Space),
            13 => Ok(Verb::Exit),
            other => Err(ProtocolError::UnknownVerb(other)),
        }
    }

    /// Convert to wire format byte.
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Parse a command word (case-insensitive).
    pub fn parse(s: &str) -> ProtocolResult<Self> {
        match s.to_lowercase().as_str() {
            "" => Err(ProtocolError::Parse("invalid action: <empty>".to_string())),
            "store" => Ok(Verb::Store),
            "add" => Ok(Verb::Add),
            "sub" => Ok(Verb::Sub),
            "load" => Ok(Verb::Load),
            "clear" => Ok(Verb::Clear),
            "clearall" => Ok(Verb::ClearAll),
            "keys" => Ok(Verb::Keys),
            "values" => Ok(Verb::Values),
            "items" => Ok(Verb::Items),
            "resize" => Ok(Verb::Resize),
            "count" => Ok(Verb::Count),
            "size" => Ok(Verb::Size),
            "space" => Ok(Verb::Space),
            "exit" => Ok(Verb::Exit),
            other => Err(ProtocolError::Parse(format!("invalid action: {other}"))),
        }
    }

    /// Whether the verb produces a multi-frame response stream.
    pub fn is_stream(self) -> bool {
        matches!(self, Verb::Keys | Verb::Values | Verb::Items)
    }

    /// Whether an Ok response to this verb carries a data payload.
    pub fn produces_data(self) -> bool {
        matches!(
            self,
            Verb::Store
                | Verb::Add
                | Verb::Sub
                | Verb::Load
                | Verb::Keys
                | Verb::Values
                | Verb::Items
                | Verb::Count
                | Verb::Size
                | Verb::Space
        )
    }

    /// Verb name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Store => "Store",
            Verb::Add => "Add",
            Verb::Sub => "Sub",
            Verb::Load => "Load",
            Verb::Clear => "Clear",
            Verb::ClearAll => "ClearAll",
            Verb::Keys => "Keys",
            Verb::Values => "Values",
            Verb::Items => "Items",
            Verb::Resize => "Resize",
            Verb::Count => "Count",
            Verb::Size => "Size",
            Verb::Space => "Space",
            Verb::Exit => "Exit",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response statuses. The discriminant is the wire byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0,
    NotFound = 1,
    StreamDone = 2,
    ServerError = 3,
    InvalidRequest = 4,
}

impl Status {
    /// Convert from wire format byte.
    pub fn from_byte(byte: u8) -> ProtocolResult<Self> {
        match byte {
            0 => Ok(Status::Ok),
            1 => Ok(Status::NotFound),
            2 => Ok(Status::StreamDone),
            3 => Ok(Status::ServerError),
            4 => Ok(Status::InvalidRequest),
            other => Err(ProtocolError::UnknownStatus(other)),
        }
    }

    /// Convert to wire format byte.
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Status name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "Ok",
            Status::NotFound => "NotFound",
            Status::StreamDone => "StreamDone",
            Status::ServerError => "ServerError",
            Status::InvalidRequest => "InvalidRequest",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_byte_roundtrip() {
        for byte in 0..=13u8 {
            let verb = Verb::from_byte(byte).unwrap();
            assert_eq!(verb.to_byte(), byte);
        }
    }

    #[test]
    fn test_verb_unknown_byte() {
        assert!(Verb::from_byte(14).is_err());
        assert!(Verb::from_byte(255).is_err());
    }

    #[test]
    fn test_verb_parse_case_insensitive() {
        assert_eq!(Verb::parse("store").unwrap(), Verb::Store);
        assert_eq!(Verb::parse("STORE").unwrap(), Verb::Store);
        assert_eq!(Verb::parse("ClearAll").unwrap(), Verb::ClearAll);
        assert_eq!(Verb::parse("keys").unwrap(), Verb::Keys);
    }

    #[test]
    fn test_verb_parse_invalid() {
        assert!(Verb::parse("").is_err());
        assert!(Verb::parse("fetch").is_err());
    }

    #[test]
    fn test_stream_verbs() {
        assert!(Verb::Keys.is_stream());
        assert!(Verb::Values.is_stream());
        assert!(Verb::Items.is_stream());
        assert!(!Verb::Load.is_stream());
        assert!(!Verb::Exit.is_stream());
    }

    #[test]
    fn test_data_verbs() {
        assert!(Verb::Store.produces_data());
        assert!(Verb::Load.produces_data());
        assert!(Verb::Count.produces_data());
        assert!(!Verb::Clear.produces_data());
        assert!(!Verb::Resize.produces_data());
        assert!(!Verb::Exit.produces_data());
    }

    #[test]
    fn test_status_byte_roundtrip() {
        for byte in 0..=4u8 {
            let status = Status::from_byte(byte).unwrap();
            assert_eq!(status.to_byte(), byte);
        }
        assert!(Status::from_byte(5).is_err());
    }
}
