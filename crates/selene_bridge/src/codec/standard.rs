//! Flutter standard method codec
//!
//! Values are a type byte followed by a payload. Sizes use one byte below
//! 254, `254` + u16 up to 0xffff, and `255` + u32 beyond. Multi-byte numbers
//! are little-endian; doubles and typed arrays are aligned to their element
//! size relative to the start of the message.
//!
//! - method call: `<method string><arguments>`
//! - success envelope: `0x00 <value>`
//! - error envelope: `0x01 <code> <message|null> <details|null>`, optionally
//!   followed by a stacktrace string
//! - not implemented: no reply bytes at all
//!
//! Values map onto [`serde_json::Value`]. Typed arrays decode as lists of
//! numbers, large integers as their hex string, and map keys must be strings.

use serde_json::{Map, Number, Value};

use super::MethodCodec;
use crate::error::{BridgeError, Result};
use crate::invocation::{Invocation, Reply};

const NULL: u8 = 0;
const TRUE: u8 = 1;
const FALSE: u8 = 2;
const INT32: u8 = 3;
const INT64: u8 = 4;
const LARGE_INT: u8 = 5;
const FLOAT64: u8 = 6;
const STRING: u8 = 7;
const UINT8_LIST: u8 = 8;
const INT32_LIST: u8 = 9;
const INT64_LIST: u8 = 10;
const FLOAT64_LIST: u8 = 11;
const LIST: u8 = 12;
const MAP: u8 = 13;
const FLOAT32_LIST: u8 = 14;

const ENVELOPE_SUCCESS: u8 = 0;
const ENVELOPE_ERROR: u8 = 1;

/// Nesting limit for lists and maps
const MAX_DEPTH: usize = 64;

/// Encodes invocations and replies in Flutter's standard binary format.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardMethodCodec;

impl MethodCodec for StandardMethodCodec {
    fn encode_method_call(&self, call: &Invocation) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        write_string(&mut buf, call.method())?;
        write_value(&mut buf, call.arguments().unwrap_or(&Value::Null))?;
        Ok(buf)
    }

    fn decode_method_call(&self, bytes: &[u8]) -> Result<Invocation> {
        let mut reader = Reader::new(bytes);

        let method = match reader.read_value().map_err(BridgeError::MalformedCall)? {
            Value::String(method) if !method.is_empty() => method,
            Value::String(_) => {
                return Err(BridgeError::MalformedCall("empty method name".to_string()))
            }
            other => {
                return Err(BridgeError::MalformedCall(format!(
                    "method name must be a string, got {}",
                    other
                )))
            }
        };
        let arguments = reader.read_value().map_err(BridgeError::MalformedCall)?;
        reader.finish().map_err(BridgeError::MalformedCall)?;

        Ok(match arguments {
            Value::Null => Invocation::new(method),
            args => Invocation::with_arguments(method, args),
        })
    }

    fn encode_reply(&self, reply: &Reply) -> Result<Option<Vec<u8>>> {
        let mut buf = Vec::new();
        match reply {
            Reply::Success(value) => {
                buf.push(ENVELOPE_SUCCESS);
                write_value(&mut buf, value)?;
            }
            Reply::Error {
                code,
                message,
                details,
            } => {
                buf.push(ENVELOPE_ERROR);
                write_string(&mut buf, code)?;
                match message {
                    Some(message) => write_string(&mut buf, message)?,
                    None => buf.push(NULL),
                }
                write_value(&mut buf, details.as_ref().unwrap_or(&Value::Null))?;
            }
            Reply::NotImplemented => return Ok(None),
        }
        Ok(Some(buf))
    }

    fn decode_reply(&self, bytes: Option<&[u8]>) -> Result<Reply> {
        let Some(bytes) = bytes.filter(|b| !b.is_empty()) else {
            return Ok(Reply::NotImplemented);
        };

        decode_envelope(bytes).map_err(BridgeError::MalformedEnvelope)
    }
}

fn decode_envelope(bytes: &[u8]) -> std::result::Result<Reply, String> {
    let mut reader = Reader::new(bytes);

    match reader.read_u8()? {
        ENVELOPE_SUCCESS => {
            let value = reader.read_value()?;
            reader.finish()?;
            Ok(Reply::Success(value))
        }
        ENVELOPE_ERROR => {
            let code = match reader.read_value()? {
                Value::String(code) => code,
                other => return Err(format!("error code must be a string, got {}", other)),
            };
            let message = match reader.read_value()? {
                Value::String(message) => Some(message),
                Value::Null => None,
                other => return Err(format!("error message must be a string, got {}", other)),
            };
            let details = Some(reader.read_value()?).filter(|v| !v.is_null());
            if reader.has_remaining() {
                // Android hosts append a stacktrace string
                match reader.read_value()? {
                    Value::String(_) | Value::Null => {}
                    other => return Err(format!("stacktrace must be a string, got {}", other)),
                }
            }
            reader.finish()?;
            Ok(Reply::Error {
                code,
                message,
                details,
            })
        }
        other => Err(format!("unknown envelope tag {}", other)),
    }
}

fn write_size(buf: &mut Vec<u8>, size: usize) -> Result<()> {
    if size < 254 {
        buf.push(size as u8);
    } else if let Ok(size) = u16::try_from(size) {
        buf.push(254);
        buf.extend_from_slice(&size.to_le_bytes());
    } else {
        let size = u32::try_from(size).map_err(|_| {
            BridgeError::Unencodable(format!("{} elements exceed the size limit", size))
        })?;
        buf.push(255);
        buf.extend_from_slice(&size.to_le_bytes());
    }
    Ok(())
}

fn write_alignment(buf: &mut Vec<u8>, alignment: usize) {
    let rem = buf.len() % alignment;
    if rem != 0 {
        buf.resize(buf.len() + alignment - rem, 0);
    }
}

fn write_string(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    buf.push(STRING);
    write_size(buf, s.len())?;
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

fn write_value(buf: &mut Vec<u8>, value: &Value) -> Result<()> {
    match value {
        Value::Null => buf.push(NULL),
        Value::Bool(true) => buf.push(TRUE),
        Value::Bool(false) => buf.push(FALSE),
        Value::Number(n) => write_number(buf, n)?,
        Value::String(s) => write_string(buf, s)?,
        Value::Array(items) => {
            buf.push(LIST);
            write_size(buf, items.len())?;
            for item in items {
                write_value(buf, item)?;
            }
        }
        Value::Object(entries) => {
            buf.push(MAP);
            write_size(buf, entries.len())?;
            for (key, value) in entries {
                write_string(buf, key)?;
                write_value(buf, value)?;
            }
        }
    }
    Ok(())
}

fn write_number(buf: &mut Vec<u8>, n: &Number) -> Result<()> {
    if let Some(i) = n.as_i64() {
        match i32::try_from(i) {
            Ok(small) => {
                buf.push(INT32);
                buf.extend_from_slice(&small.to_le_bytes());
            }
            Err(_) => {
                buf.push(INT64);
                buf.extend_from_slice(&i.to_le_bytes());
            }
        }
    } else if let Some(f) = n.as_f64().filter(|_| n.is_f64()) {
        buf.push(FLOAT64);
        write_alignment(buf, 8);
        buf.extend_from_slice(&f.to_le_bytes());
    } else {
        return Err(BridgeError::Unencodable(format!(
            "{} does not fit in a signed 64-bit integer",
            n
        )));
    }
    Ok(())
}

/// Cursor over an encoded message
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

type Decoded<T> = std::result::Result<T, String>;

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    fn finish(&self) -> Decoded<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(format!("{} trailing bytes", n)),
        }
    }

    fn take(&mut self, len: usize) -> Decoded<&'a [u8]> {
        if len > self.remaining() {
            return Err(format!(
                "message truncated at byte {}: need {} more, have {}",
                self.pos,
                len,
                self.remaining()
            ));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Decoded<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_u8(&mut self) -> Decoded<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_size(&mut self) -> Decoded<usize> {
        Ok(match self.read_u8()? {
            254 => u16::from_le_bytes(self.read_array()?) as usize,
            255 => u32::from_le_bytes(self.read_array()?) as usize,
            n => n as usize,
        })
    }

    fn read_alignment(&mut self, alignment: usize) -> Decoded<()> {
        let rem = self.pos % alignment;
        if rem != 0 {
            self.take(alignment - rem)?;
        }
        Ok(())
    }

    fn read_str(&mut self) -> Decoded<String> {
        let len = self.read_size()?;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| format!("invalid UTF-8 string: {}", e))
    }

    /// Read `count` fixed-width elements of `width` bytes each, aligned to `width`.
    fn read_typed_list(
        &mut self,
        width: usize,
        element: impl Fn(&[u8]) -> Value,
    ) -> Decoded<Value> {
        let count = self.read_size()?;
        self.read_alignment(width)?;
        let len = count
            .checked_mul(width)
            .ok_or_else(|| format!("typed list of {} elements is too large", count))?;
        let bytes = self.take(len)?;
        Ok(Value::Array(bytes.chunks_exact(width).map(element).collect()))
    }

    fn read_value(&mut self) -> Decoded<Value> {
        self.read_nested(0)
    }

    fn read_nested(&mut self, depth: usize) -> Decoded<Value> {
        if depth > MAX_DEPTH {
            return Err(format!("values nested deeper than {}", MAX_DEPTH));
        }

        Ok(match self.read_u8()? {
            NULL => Value::Null,
            TRUE => Value::Bool(true),
            FALSE => Value::Bool(false),
            INT32 => Value::from(i32::from_le_bytes(self.read_array()?)),
            INT64 => Value::from(i64::from_le_bytes(self.read_array()?)),
            LARGE_INT => Value::String(self.read_str()?),
            FLOAT64 => {
                self.read_alignment(8)?;
                float(f64::from_le_bytes(self.read_array()?))
            }
            STRING => Value::String(self.read_str()?),
            UINT8_LIST => {
                let len = self.read_size()?;
                Value::Array(self.take(len)?.iter().map(|b| Value::from(*b)).collect())
            }
            INT32_LIST => self.read_typed_list(4, |c| {
                Value::from(i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            })?,
            INT64_LIST => self.read_typed_list(8, |c| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(c);
                Value::from(i64::from_le_bytes(raw))
            })?,
            FLOAT32_LIST => self.read_typed_list(4, |c| {
                float(f32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f64)
            })?,
            FLOAT64_LIST => self.read_typed_list(8, |c| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(c);
                float(f64::from_le_bytes(raw))
            })?,
            LIST => {
                let len = self.read_size()?;
                let mut items = Vec::with_capacity(len.min(self.remaining()));
                for _ in 0..len {
                    items.push(self.read_nested(depth + 1)?);
                }
                Value::Array(items)
            }
            MAP => {
                let len = self.read_size()?;
                let mut entries = Map::new();
                for _ in 0..len {
                    let key = match self.read_nested(depth + 1)? {
                        Value::String(key) => key,
                        other => return Err(format!("map key must be a string, got {}", other)),
                    };
                    let value = self.read_nested(depth + 1)?;
                    entries.insert(key, value);
                }
                Value::Object(entries)
            }
            other => return Err(format!("unknown value type {}", other)),
        })
    }
}

/// Non-finite doubles have no JSON form and decode as null.
fn float(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    /// `MethodChannel("selene/device").invokeMethod("isAndroidTv")` as sent by the app
    fn is_android_tv_call() -> Vec<u8> {
        let mut bytes = vec![STRING, 11];
        bytes.extend_from_slice(b"isAndroidTv");
        bytes.push(NULL);
        bytes
    }

    #[test]
    fn test_decode_app_method_call() {
        let call = StandardMethodCodec
            .decode_method_call(&is_android_tv_call())
            .unwrap();

        assert_eq!(call, Invocation::new("isAndroidTv"));
    }

    #[test]
    fn test_encode_method_call_matches_app_bytes() {
        assert_eq!(
            StandardMethodCodec
                .encode_method_call(&Invocation::new("isAndroidTv"))
                .unwrap(),
            is_android_tv_call()
        );
    }

    #[test]
    fn test_boolean_success_envelopes() {
        let codec = StandardMethodCodec;

        assert_eq!(
            codec.encode_reply(&Reply::Success(json!(true))).unwrap(),
            Some(vec![0x00, 0x01])
        );
        assert_eq!(
            codec.encode_reply(&Reply::Success(json!(false))).unwrap(),
            Some(vec![0x00, 0x02])
        );
        assert_eq!(codec.encode_reply(&Reply::NotImplemented).unwrap(), None);
    }

    #[test]
    fn test_error_envelope_bytes() {
        let bytes = StandardMethodCodec
            .encode_reply(&Reply::error("e", Some("m".to_string()), None))
            .unwrap()
            .unwrap();

        assert_eq!(bytes, vec![0x01, STRING, 1, b'e', STRING, 1, b'm', NULL]);
    }

    #[test]
    fn test_decode_error_envelope_with_stacktrace() {
        let mut bytes = vec![ENVELOPE_ERROR, STRING, 4];
        bytes.extend_from_slice(b"code");
        bytes.push(NULL);
        bytes.extend_from_slice(&[MAP, 1, STRING, 1, b'k', INT32, 7, 0, 0, 0]);
        bytes.extend_from_slice(&[STRING, 2, b'a', b't']);

        assert_eq!(
            StandardMethodCodec.decode_reply(Some(&bytes)).unwrap(),
            Reply::error("code", None, Some(json!({"k": 7})))
        );
    }

    #[test]
    fn test_nested_arguments() {
        let codec = StandardMethodCodec;
        let args = json!({
            "volume": 3,
            "serial": 1_i64 << 40,
            "ratio": 0.5,
            "tags": ["tv", null, false],
        });
        let call = Invocation::with_arguments("configure", args.clone());

        let bytes = codec.encode_method_call(&call).unwrap();
        assert_eq!(codec.decode_method_call(&bytes).unwrap(), call);
    }

    #[test]
    fn test_double_is_aligned_to_eight_bytes() {
        let bytes = StandardMethodCodec
            .encode_reply(&Reply::Success(json!(1.5)))
            .unwrap()
            .unwrap();

        // tag, type, 6 bytes padding, 8 bytes payload
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..2], &[ENVELOPE_SUCCESS, FLOAT64]);
        assert_eq!(&bytes[2..8], &[0; 6]);
        assert_eq!(&bytes[8..], &1.5f64.to_le_bytes());
    }

    #[test]
    fn test_long_string_uses_two_byte_size() {
        let method = "m".repeat(300);
        let bytes = StandardMethodCodec
            .encode_method_call(&Invocation::new(method.as_str()))
            .unwrap();

        assert_eq!(&bytes[..4], &[STRING, 254, 0x2c, 0x01]);
        assert_eq!(
            StandardMethodCodec.decode_method_call(&bytes).unwrap().method(),
            method
        );
    }

    #[test]
    fn test_typed_lists_decode_as_numbers() {
        let codec = StandardMethodCodec;

        let bytes = [ENVELOPE_SUCCESS, UINT8_LIST, 3, 1, 2, 255];
        assert_eq!(
            codec.decode_reply(Some(&bytes)).unwrap(),
            Reply::Success(json!([1, 2, 255]))
        );

        // tag, type, size, 1 byte padding to a 4-byte boundary
        let bytes = [ENVELOPE_SUCCESS, INT32_LIST, 2, 0, 1, 0, 0, 0, 0xff, 0xff, 0xff, 0xff];
        assert_eq!(
            codec.decode_reply(Some(&bytes)).unwrap(),
            Reply::Success(json!([1, -1]))
        );
    }

    #[test]
    fn test_decode_method_call_rejects_garbage() {
        let codec = StandardMethodCodec;
        let mut trailing = is_android_tv_call();
        trailing.push(NULL);

        for bad in [
            &b""[..],
            &[NULL, NULL][..],
            &[STRING, 0, NULL][..],
            &[STRING, 20, b'i', b's'][..],
            &[STRING, 1, b'x'][..],
            &trailing[..],
            &[STRING, 1, b'x', 99][..],
            &[STRING, 1, b'x', MAP, 1, INT32, 0, 0, 0, 0, NULL][..],
        ] {
            assert!(
                matches!(codec.decode_method_call(bad), Err(BridgeError::MalformedCall(_))),
                "expected malformed call for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_decode_reply_rejects_bad_envelopes() {
        let codec = StandardMethodCodec;

        assert_eq!(codec.decode_reply(None).unwrap(), Reply::NotImplemented);
        assert_eq!(codec.decode_reply(Some(&[])).unwrap(), Reply::NotImplemented);

        for bad in [
            &[0x02, NULL][..],
            &[ENVELOPE_SUCCESS][..],
            &[ENVELOPE_SUCCESS, TRUE, TRUE][..],
            &[ENVELOPE_ERROR, NULL, NULL, NULL][..],
            &[ENVELOPE_ERROR, STRING, 1, b'c', TRUE, NULL][..],
        ] {
            assert!(
                matches!(codec.decode_reply(Some(bad)), Err(BridgeError::MalformedEnvelope(_))),
                "expected malformed envelope for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let mut bytes = vec![ENVELOPE_SUCCESS];
        bytes.extend(std::iter::repeat([LIST, 1]).take(MAX_DEPTH + 2).flatten());
        bytes.push(NULL);

        assert!(matches!(
            StandardMethodCodec.decode_reply(Some(&bytes)),
            Err(BridgeError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_unsigned_overflow_is_unencodable() {
        let err = StandardMethodCodec
            .encode_reply(&Reply::Success(json!(u64::MAX)))
            .unwrap_err();

        assert!(matches!(err, BridgeError::Unencodable(_)));
    }
}
