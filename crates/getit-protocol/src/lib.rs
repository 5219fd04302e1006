//! Wire protocol for the getit key/value store.
//!
//! This crate provides:
//! - Request verbs and response statuses with their wire bytes
//! - The tagged `Value` type (int32 or short string)
//! - Request/response payload codecs
//! - Length-prefixed framing over the TCP boundary

mod error;
mod framing;
mod request;
mod response;
mod value;
mod verb;

pub use error::{ProtocolError, ProtocolResult};
pub use framing::{read_frame, write_frame, MAX_FRAME_LEN};
pub use request::{next_request_id, Request};
pub use response::Response;
pub use value::{Value, MAX_KEY_LEN, MAX_STRING_LEN, TYPE_INT, TYPE_STR};
pub use verb::{Status, Verb};
