//! The fixed-width on-disk slot codec.
//!
//! Each slot is 66 bytes:
//!
//! ```text
//! [0]      set flag (0 = empty, 1 = occupied)
//! [1]      key length K (0..=31)
//! [2..33]  key bytes, zero padded to a 32-byte key region
//! [33]     value type (0 = int32, 1 = string)
//! [34..66] value payload, zero padded
//! ```
//!
//! An int payload is a big-endian i32 followed by 28 padding bytes; a string
//! payload is a length byte, the content, and padding. Decoding tolerates
//! non-zero padding; only the length fields determine validity. Slot 0 is
//! the header: its first 4 bytes hold the big-endian occupied count.

use crate::{EngineError, EngineResult};
use getit_protocol::{Value, MAX_KEY_LEN, MAX_STRING_LEN, TYPE_INT, TYPE_STR};

/// Width of one slot (and of the header) in bytes.
pub const SLOT_SIZE: usize = 66;

/// Offset of the value type byte within a slot.
pub(crate) const VALUE_TYPE_OFFSET: usize = 33;

/// Width of the value region (type byte plus payload).
pub(crate) const VALUE_REGION_LEN: usize = SLOT_SIZE - VALUE_TYPE_OFFSET;

/// The file offset of a slot index (slot 0 is the header).
pub fn slot_offset(index: u64) -> u64 {
    index * SLOT_SIZE as u64
}

/// The file size for a table of the given capacity (header included).
pub fn file_size(capacity: u64) -> u64 {
    (capacity + 1) * SLOT_SIZE as u64
}

/// A decoded occupied slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotEntry {
    pub key: String,
    pub value: Value,
}

/// Encode an occupied slot.
pub(crate) fn encode_slot(key: &str, value: &Value) -> [u8; SLOT_SIZE] {
    let mut buf = [0u8; SLOT_SIZE];
    buf[0] = 1;
    buf[1] = key.len() as u8;
    buf[2..2 + key.len()].copy_from_slice(key.as_bytes());
    buf[VALUE_TYPE_OFFSET..].copy_from_slice(&encode_value_region(value));
    buf
}

/// Encode the value region alone (type byte plus padded payload).
pub(crate) fn encode_value_region(value: &Value) -> [u8; VALUE_REGION_LEN] {
    let mut buf = [0u8; VALUE_REGION_LEN];
    match value {
        Value::Int(i) => {
            buf[0] = TYPE_INT;
            buf[1..5].copy_from_slice(&i.to_be_bytes());
        }
        Value::Str(s) => {
            buf[0] = TYPE_STR;
            buf[1] = s.len() as u8;
            buf[2..2 + s.len()].copy_from_slice(s.as_bytes());
        }
    }
    buf
}

/// Decode a slot. Returns None for an empty slot.
pub(crate) fn decode_slot(buf: &[u8; SLOT_SIZE]) -> EngineResult<Option<SlotEntry>> {
    if buf[0] == 0 {
        return Ok(None);
    }

    let key_len = buf[1] as usize;
    if key_len > MAX_KEY_LEN {
        return Err(EngineError::Decode(format!("key length {key_len}")));
    }
    let key = std::str::from_utf8(&buf[2..2 + key_len])
        .map_err(|_| EngineError::Decode("key not UTF-8".to_string()))?
        .to_string();

    let value = match buf[VALUE_TYPE_OFFSET] {
        TYPE_INT => {
            let raw = [buf[34], buf[35], buf[36], buf[37]];
            Value::Int(i32::from_be_bytes(raw))
        }
        TYPE_STR => {
            let len = buf[34] as usize;
            if len > MAX_STRING_LEN {
                return Err(EngineError::Decode(format!("string length {len}")));
            }
            let s = std::str::from_utf8(&buf[35..35 + len])
                .map_err(|_| EngineError::Decode("string value not UTF-8".to_string()))?;
            Value::Str(s.to_string())
        }
        other => {
            return Err(EngineError::Decode(format!("value type byte {other:#04x}")));
        }
    };

    Ok(Some(SlotEntry { key, value }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_slot_literal_bytes() {
        let buf = encode_slot("foo", &Value::Int(42));

        let mut expected = [0u8; SLOT_SIZE];
        expected[0] = 1;
        expected[1] = 3;
        expected[2..5].copy_from_slice(b"foo");
        // key padding [5..33] stays zero, type byte at 33 is TYPE_INT (0)
        expected[34..38].copy_from_slice(&[0x00, 0x00, 0x00, 0x2A]);
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_int_slot_roundtrip() {
        for i in [i32::MIN, -1, 0, 1, i32::MAX] {
            let buf = encode_slot("k", &Value::Int(i));
            let entry = decode_slot(&buf).unwrap().unwrap();
            assert_eq!(entry.key, "k");
            assert_eq!(entry.value, Value::Int(i));
        }
    }

    #[test]
    fn test_string_slot_roundtrip() {
        for len in [0usize, 1, 15, 31] {
            let s = "s".repeat(len);
            let buf = encode_slot("key", &Value::Str(s.clone()));
            let entry = decode_slot(&buf).unwrap().unwrap();
            assert_eq!(entry.value, Value::Str(s));
        }
    }

    #[test]
    fn test_empty_slot_decodes_to_none() {
        let buf = [0u8; SLOT_SIZE];
        assert_eq!(decode_slot(&buf).unwrap(), None);
    }

    #[test]
    fn test_decode_tolerates_dirty_padding() {
        let mut buf = encode_slot("k", &Value::Str("ab".to_string()));
        // residue past the string payload must be ignored
        for b in buf[40..].iter_mut() {
            *b = 0xFF;
        }
        for b in buf[10..30].iter_mut() {
            *b = 0xEE;
        }
        let entry = decode_slot(&buf).unwrap().unwrap();
        assert_eq!(entry.key, "k");
        assert_eq!(entry.value, Value::Str("ab".to_string()));
    }

    #[test]
    fn test_decode_rejects_bad_lengths() {
        let mut buf = encode_slot("k", &Value::Int(1));
        buf[1] = 32;
        assert!(decode_slot(&buf).is_err());

        let mut buf = encode_slot("k", &Value::Str("v".to_string()));
        buf[34] = 32;
        assert!(decode_slot(&buf).is_err());
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let mut buf = encode_slot("k", &Value::Int(1));
        buf[VALUE_TYPE_OFFSET] = 9;
        assert!(decode_slot(&buf).is_err());
    }

    #[test]
    fn test_value_region_overwrite_preserves_key() {
        let mut buf = encode_slot("counter", &Value::Int(10));
        buf[VALUE_TYPE_OFFSET..].copy_from_slice(&encode_value_region(&Value::Int(15)));

        let entry = decode_slot(&buf).unwrap().unwrap();
        assert_eq!(entry.key, "counter");
        assert_eq!(entry.value, Value::Int(15));
    }

    #[test]
    fn test_offsets() {
        assert_eq!(slot_offset(0), 0);
        assert_eq!(slot_offset(1), 66);
        assert_eq!(slot_offset(10), 660);
        assert_eq!(file_size(64), 65 * 66);
    }
}
