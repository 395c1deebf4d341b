//! JSON method codec
//!
//! Wire shapes:
//!
//! - method call: `{"method": "isAndroidTv", "args": null}`
//! - success envelope: `[value]`
//! - error envelope: `[code, message, details]`
//! - not implemented: no reply bytes at all

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::MethodCodec;
use crate::error::{BridgeError, Result};
use crate::invocation::{Invocation, Reply};

#[derive(Serialize, Deserialize)]
struct MethodCallFrame<'a> {
    #[serde(borrow)]
    method: std::borrow::Cow<'a, str>,
    #[serde(default)]
    args: Value,
}

/// Encodes invocations and replies as JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonMethodCodec;

impl MethodCodec for JsonMethodCodec {
    fn encode_method_call(&self, call: &Invocation) -> Result<Vec<u8>> {
        let frame = MethodCallFrame {
            method: call.method().into(),
            args: call.arguments().cloned().unwrap_or(Value::Null),
        };
        Ok(serde_json::to_vec(&frame)?)
    }

    fn decode_method_call(&self, bytes: &[u8]) -> Result<Invocation> {
        let frame: MethodCallFrame<'_> = serde_json::from_slice(bytes)
            .map_err(|e| BridgeError::MalformedCall(e.to_string()))?;

        if frame.method.is_empty() {
            return Err(BridgeError::MalformedCall("empty method name".to_string()));
        }

        Ok(match frame.args {
            Value::Null => Invocation::new(frame.method),
            args => Invocation::with_arguments(frame.method, args),
        })
    }

    fn encode_reply(&self, reply: &Reply) -> Result<Option<Vec<u8>>> {
        let envelope = match reply {
            Reply::Success(value) => Value::Array(vec![value.clone()]),
            Reply::Error {
                code,
                message,
                details,
            } => Value::Array(vec![
                Value::String(code.clone()),
                message.clone().map(Value::String).unwrap_or(Value::Null),
                details.clone().unwrap_or(Value::Null),
            ]),
            Reply::NotImplemented => return Ok(None),
        };
        Ok(Some(serde_json::to_vec(&envelope)?))
    }

    fn decode_reply(&self, bytes: Option<&[u8]>) -> Result<Reply> {
        let Some(bytes) = bytes.filter(|b| !b.is_empty()) else {
            return Ok(Reply::NotImplemented);
        };

        let envelope: Value = serde_json::from_slice(bytes)
            .map_err(|e| BridgeError::MalformedEnvelope(e.to_string()))?;
        let Value::Array(mut items) = envelope else {
            return Err(BridgeError::MalformedEnvelope(
                "envelope is not an array".to_string(),
            ));
        };

        match items.len() {
            1 => Ok(Reply::Success(items.remove(0))),
            3 => {
                let details = items.pop().filter(|v| !v.is_null());
                let message = match items.pop() {
                    Some(Value::String(s)) => Some(s),
                    Some(Value::Null) | None => None,
                    Some(other) => {
                        return Err(BridgeError::MalformedEnvelope(format!(
                            "error message must be a string, got {}",
                            other
                        )))
                    }
                };
                let code = match items.pop() {
                    Some(Value::String(s)) => s,
                    _ => {
                        return Err(BridgeError::MalformedEnvelope(
                            "error code must be a string".to_string(),
                        ))
                    }
                };
                Ok(Reply::Error {
                    code,
                    message,
                    details,
                })
            }
            n => Err(BridgeError::MalformedEnvelope(format!(
                "unexpected envelope length {}",
                n
            ))),
        }
    }
}
