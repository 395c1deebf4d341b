//! Method codecs
//!
//! A [`MethodCodec`] turns [`Invocation`]s and [`Reply`]s into the bytes a
//! [`BinaryMessenger`](crate::messenger::BinaryMessenger) carries. Two wire
//! formats are provided:
//!
//! - [`StandardMethodCodec`]: Flutter's standard binary format, used by any
//!   `MethodChannel` the application layer creates without naming a codec
//! - [`JsonMethodCodec`]: the JSON format of Flutter's `JSONMethodCodec`
//!
//! Both encode "not implemented" as an absent reply.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::invocation::{Invocation, Reply};

mod json;
mod standard;

pub use json::JsonMethodCodec;
pub use standard::StandardMethodCodec;

/// Encodes method calls and reply envelopes for one wire format.
pub trait MethodCodec: Send + Sync {
    /// Encode a method call.
    fn encode_method_call(&self, call: &Invocation) -> Result<Vec<u8>>;

    /// Decode a method call. Fails with [`BridgeError::MalformedCall`](crate::BridgeError::MalformedCall).
    fn decode_method_call(&self, bytes: &[u8]) -> Result<Invocation>;

    /// Encode a reply. Returns `None` for [`Reply::NotImplemented`].
    fn encode_reply(&self, reply: &Reply) -> Result<Option<Vec<u8>>>;

    /// Decode a reply. Absent or empty bytes decode to [`Reply::NotImplemented`].
    fn decode_reply(&self, bytes: Option<&[u8]>) -> Result<Reply>;
}

/// Wire format selector, as named in `selene.toml`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecKind {
    #[default]
    Standard,
    Json,
}

impl CodecKind {
    pub const fn name(self) -> &'static str {
        match self {
            CodecKind::Standard => "standard",
            CodecKind::Json => "json",
        }
    }

    /// Create the codec for this wire format.
    pub fn codec(self) -> Arc<dyn MethodCodec> {
        match self {
            CodecKind::Standard => Arc::new(StandardMethodCodec),
            CodecKind::Json => Arc::new(JsonMethodCodec),
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
