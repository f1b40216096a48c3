//! Extension dispatcher (C6): maps reserved and user extension type tags to
//! typed [`Value`] variants, or passes them through opaquely (§4.6).
//!
//! Reserved tag assignment (§4.3/§9): Timestamp = −1, Date = −2,
//! DateTime = −3, BigInt = −4, VectorFloat = −5, VectorDouble = −6. Tag −10
//! is the tabular extension (C5) and is dispatched by the decoder before it
//! reaches this module.

use crate::error::CodecError;
use crate::value::Value;

/// Timestamp: signed seconds since the Unix epoch.
pub const TAG_TIMESTAMP: i8 = -1;
/// Date: signed milliseconds.
pub const TAG_DATE: i8 = -2;
/// DateTime: signed nanoseconds.
pub const TAG_DATETIME: i8 = -3;
/// BigInt: opaque big-endian two's-complement bytes.
pub const TAG_BIGINT: i8 = -4;
/// VectorFloat: `N` big-endian IEEE-754 binary32 floats.
pub const TAG_VECTOR_FLOAT: i8 = -5;
/// VectorDouble: `N` big-endian IEEE-754 binary64 floats.
pub const TAG_VECTOR_DOUBLE: i8 = -6;
/// Tabular arrays-of-maps (C5). Handled by [`crate::tabular`], listed here
/// only so the full reserved range is documented in one place.
pub const TAG_TABULAR: i8 = -10;

/// Interpret an extension body given its type tag. `offset` is the body's
/// start offset, used only for error reporting.
pub fn decode_body(tag: i8, body: &[u8]) -> Result<Value, CodecError> {
    match tag {
        TAG_TIMESTAMP => Ok(Value::Timestamp(read_i64(tag, body)?)),
        TAG_DATE => Ok(Value::Date(read_i64(tag, body)?)),
        TAG_DATETIME => Ok(Value::DateTime(read_i64(tag, body)?)),
        TAG_BIGINT => {
            if body.is_empty() {
                return Err(CodecError::InvalidExtensionLength { tag, len: 0 });
            }
            Ok(Value::BigInt(body.to_vec()))
        }
        TAG_VECTOR_FLOAT => {
            if body.len() % 4 != 0 {
                return Err(CodecError::InvalidExtensionLength {
                    tag,
                    len: body.len(),
                });
            }
            Ok(Value::VectorFloat(
                body.chunks_exact(4)
                    .map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ))
        }
        TAG_VECTOR_DOUBLE => {
            if body.len() % 8 != 0 {
                return Err(CodecError::InvalidExtensionLength {
                    tag,
                    len: body.len(),
                });
            }
            Ok(Value::VectorDouble(
                body.chunks_exact(8)
                    .map(|c| {
                        let mut raw = [0u8; 8];
                        raw.copy_from_slice(c);
                        f64::from_be_bytes(raw)
                    })
                    .collect(),
            ))
        }
        // Reserved-but-unknown ([-128,-11]) and user ([0,127]) tags round-trip
        // through the opaque variant without interpretation.
        _ => Ok(Value::Extension(tag, body.to_vec())),
    }
}

fn read_i64(tag: i8, body: &[u8]) -> Result<i64, CodecError> {
    if body.len() != 8 {
        return Err(CodecError::InvalidExtensionLength {
            tag,
            len: body.len(),
        });
    }
    let mut raw = [0u8; 8];
    raw.copy_from_slice(body);
    Ok(i64::from_be_bytes(raw))
}

/// Produce `(type_tag, body)` for a typed or opaque extension value.
/// Returns `None` for values that are not extension-shaped (the base
/// encoder handles those directly).
#[must_use]
pub fn encode_body(value: &Value) -> Option<(i8, Vec<u8>)> {
    match value {
        Value::Timestamp(seconds) => Some((TAG_TIMESTAMP, seconds.to_be_bytes().to_vec())),
        Value::Date(millis) => Some((TAG_DATE, millis.to_be_bytes().to_vec())),
        Value::DateTime(nanos) => Some((TAG_DATETIME, nanos.to_be_bytes().to_vec())),
        Value::BigInt(bytes) => Some((TAG_BIGINT, bytes.clone())),
        Value::VectorFloat(vals) => {
            let mut body = Vec::with_capacity(vals.len() * 4);
            for v in vals {
                body.extend_from_slice(&v.to_be_bytes());
            }
            Some((TAG_VECTOR_FLOAT, body))
        }
        Value::VectorDouble(vals) => {
            let mut body = Vec::with_capacity(vals.len() * 8);
            for v in vals {
                body.extend_from_slice(&v.to_be_bytes());
            }
            Some((TAG_VECTOR_DOUBLE, body))
        }
        Value::Extension(tag, bytes) => Some((*tag, bytes.clone())),
        _ => None,
    }
}
