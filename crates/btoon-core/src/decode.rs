//! Base decoder (C4): consumes markers from a bounds-checked cursor,
//! enforcing the depth/size limits of §4.4 on every length prefix before any
//! allocation is attempted.

use std::borrow::Cow;
use std::collections::HashSet;

use crate::error::CodecError;
use crate::ext;
use crate::io::Reader;
use crate::tabular;
use crate::value::Value;
use crate::{compress, DEFAULT_MAX_COMPRESSION_RATIO};

/// Options controlling how bytes are turned into a [`Value`] (§6).
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Detect the compression frame magic and transparently unwrap it.
    pub auto_decompress: bool,
    /// Reject duplicate map keys, invalid UTF-8, and other recoverable
    /// defects. When `false`, invalid UTF-8 is lossily repaired and
    /// duplicate map keys are kept rather than rejected.
    pub strict: bool,
    /// Maximum recursion depth (arrays, maps, and tabular extension bodies
    /// all count).
    pub max_depth: usize,
    /// Maximum string length in bytes.
    pub max_string_len: u64,
    /// Maximum binary length in bytes.
    pub max_binary_len: u64,
    /// Maximum array element count.
    pub max_array_len: u64,
    /// Maximum map entry count.
    pub max_map_len: u64,
    /// Maximum cumulative decoded-value size (an allocation-bomb defense:
    /// every length prefix read contributes to this running total).
    pub max_total_size: u64,
    /// Maximum `uncompressed / compressed` ratio accepted when unwrapping a
    /// compression frame (§4.2's decompression-bomb defense).
    pub max_compression_ratio: u64,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            auto_decompress: true,
            strict: true,
            max_depth: 128,
            max_string_len: 10 * 1024 * 1024,
            max_binary_len: 100 * 1024 * 1024,
            max_array_len: 1_000_000,
            max_map_len: 100_000,
            max_total_size: 1024 * 1024 * 1024,
            max_compression_ratio: DEFAULT_MAX_COMPRESSION_RATIO,
        }
    }
}

impl DecodeOptions {
    /// Enable or disable transparent decompression of framed payloads.
    #[must_use]
    pub fn with_auto_decompress(mut self, auto: bool) -> Self {
        self.auto_decompress = auto;
        self
    }

    /// Enable or disable strict-mode recovery behavior.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the maximum recursion depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Shared decode state threaded through every recursive call, including
/// calls that cross into a tabular extension's own sub-buffer (§4.5) — the
/// reader changes per buffer, but depth and the cumulative size budget are
/// global to one top-level `decode` call.
pub(crate) struct DecodeCtx<'o> {
    pub(crate) options: &'o DecodeOptions,
    pub(crate) depth: usize,
    pub(crate) total_size: u64,
}

impl<'o> DecodeCtx<'o> {
    fn enter(&mut self, offset: usize) -> Result<(), CodecError> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(CodecError::DepthExceeded {
                offset,
                limit: self.options.max_depth,
            });
        }
        Ok(())
    }

    fn exit(&mut self) {
        self.depth -= 1;
    }

    fn charge(&mut self, offset: usize, kind: &'static str, len: u64, limit: u64) -> Result<(), CodecError> {
        if len > limit {
            return Err(CodecError::SizeExceeded {
                offset,
                kind,
                len,
                limit,
            });
        }
        self.total_size += len;
        if self.total_size > self.options.max_total_size {
            return Err(CodecError::SizeExceeded {
                offset,
                kind: "total",
                len: self.total_size,
                limit: self.options.max_total_size,
            });
        }
        Ok(())
    }
}

/// Decode `bytes` into a [`Value`] under `options`.
pub fn decode(bytes: &[u8], options: &DecodeOptions) -> Result<Value, CodecError> {
    let raw: Cow<'_, [u8]> = if options.auto_decompress && compress::looks_like_frame(bytes) {
        Cow::Owned(compress::decode_frame(bytes, options)?)
    } else {
        Cow::Borrowed(bytes)
    };
    let mut reader = Reader::new(&raw);
    let mut ctx = DecodeCtx {
        options,
        depth: 0,
        total_size: 0,
    };
    decode_value(&mut reader, &mut ctx)
}

pub(crate) fn decode_value(reader: &mut Reader<'_>, ctx: &mut DecodeCtx<'_>) -> Result<Value, CodecError> {
    let offset = reader.offset();
    let marker = reader.read_u8()?;
    match marker {
        0x00..=0x7f => Ok(Value::UnsignedInt(u64::from(marker))),
        0xe0..=0xff => Ok(Value::SignedInt(i64::from(marker as i8))),
        0x80..=0x8f => decode_map(reader, ctx, u64::from(marker & 0x0f), offset),
        0x90..=0x9f => decode_array(reader, ctx, u64::from(marker & 0x0f), offset),
        0xa0..=0xbf => {
            let string = decode_str_bytes(reader, ctx, u64::from(marker & 0x1f), offset)?;
            Ok(Value::String(string))
        }
        0xc0 => Ok(Value::Nil),
        0xc1 => Err(CodecError::InvalidMarker { offset, marker }),
        0xc2 => Ok(Value::Bool(false)),
        0xc3 => Ok(Value::Bool(true)),
        0xc4 => {
            let len = u64::from(reader.read_u8()?);
            decode_bin(reader, ctx, len, offset)
        }
        0xc5 => {
            let len = u64::from(reader.read_u16()?);
            decode_bin(reader, ctx, len, offset)
        }
        0xc6 => {
            let len = u64::from(reader.read_u32()?);
            decode_bin(reader, ctx, len, offset)
        }
        0xc7 => {
            let len = u64::from(reader.read_u8()?);
            decode_ext(reader, ctx, len, offset)
        }
        0xc8 => {
            let len = u64::from(reader.read_u16()?);
            decode_ext(reader, ctx, len, offset)
        }
        0xc9 => {
            let len = u64::from(reader.read_u32()?);
            decode_ext(reader, ctx, len, offset)
        }
        0xca => Ok(Value::Float(f64::from(reader.read_f32()?))),
        0xcb => Ok(Value::Float(reader.read_f64()?)),
        0xcc => Ok(Value::UnsignedInt(u64::from(reader.read_u8()?))),
        0xcd => Ok(Value::UnsignedInt(u64::from(reader.read_u16()?))),
        0xce => Ok(Value::UnsignedInt(u64::from(reader.read_u32()?))),
        0xcf => Ok(Value::UnsignedInt(reader.read_u64()?)),
        0xd0 => Ok(Value::SignedInt(i64::from(reader.read_i8()?))),
        0xd1 => Ok(Value::SignedInt(i64::from(reader.read_i16()?))),
        0xd2 => Ok(Value::SignedInt(i64::from(reader.read_i32()?))),
        0xd3 => Ok(Value::SignedInt(reader.read_i64()?)),
        0xd4 => decode_ext(reader, ctx, 1, offset),
        0xd5 => decode_ext(reader, ctx, 2, offset),
        0xd6 => decode_ext(reader, ctx, 4, offset),
        0xd7 => decode_ext(reader, ctx, 8, offset),
        0xd8 => decode_ext(reader, ctx, 16, offset),
        0xd9 => {
            let len = u64::from(reader.read_u8()?);
            let string = decode_str_bytes(reader, ctx, len, offset)?;
            Ok(Value::String(string))
        }
        0xda => {
            let len = u64::from(reader.read_u16()?);
            let string = decode_str_bytes(reader, ctx, len, offset)?;
            Ok(Value::String(string))
        }
        0xdb => {
            let len = u64::from(reader.read_u32()?);
            let string = decode_str_bytes(reader, ctx, len, offset)?;
            Ok(Value::String(string))
        }
        0xdc => {
            let len = u64::from(reader.read_u16()?);
            decode_array(reader, ctx, len, offset)
        }
        0xdd => {
            let len = u64::from(reader.read_u32()?);
            decode_array(reader, ctx, len, offset)
        }
        0xde => {
            let len = u64::from(reader.read_u16()?);
            decode_map(reader, ctx, len, offset)
        }
        0xdf => {
            let len = u64::from(reader.read_u32()?);
            decode_map(reader, ctx, len, offset)
        }
    }
}

fn decode_str_bytes(
    reader: &mut Reader<'_>,
    ctx: &mut DecodeCtx<'_>,
    len: u64,
    offset: usize,
) -> Result<String, CodecError> {
    ctx.charge(offset, "string", len, ctx.options.max_string_len)?;
    let len = usize::try_from(len).map_err(|_| CodecError::SizeExceeded {
        offset,
        kind: "string",
        len,
        limit: ctx.options.max_string_len,
    })?;
    if ctx.options.strict {
        let s = reader.read_str(len)?;
        Ok(s.to_string())
    } else {
        let bytes = reader.take(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

fn decode_bin(
    reader: &mut Reader<'_>,
    ctx: &mut DecodeCtx<'_>,
    len: u64,
    offset: usize,
) -> Result<Value, CodecError> {
    ctx.charge(offset, "binary", len, ctx.options.max_binary_len)?;
    let len = usize::try_from(len).map_err(|_| CodecError::SizeExceeded {
        offset,
        kind: "binary",
        len,
        limit: ctx.options.max_binary_len,
    })?;
    let bytes = reader.take(len)?;
    Ok(Value::Binary(bytes.to_vec()))
}

fn decode_array(
    reader: &mut Reader<'_>,
    ctx: &mut DecodeCtx<'_>,
    count: u64,
    offset: usize,
) -> Result<Value, CodecError> {
    ctx.charge(offset, "array", count, ctx.options.max_array_len)?;
    ctx.enter(offset)?;
    let count = usize::try_from(count).map_err(|_| CodecError::SizeExceeded {
        offset,
        kind: "array",
        len: count,
        limit: ctx.options.max_array_len,
    })?;
    let mut items = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        items.push(decode_value(reader, ctx)?);
    }
    ctx.exit();
    Ok(Value::Array(items))
}

fn decode_map(
    reader: &mut Reader<'_>,
    ctx: &mut DecodeCtx<'_>,
    count: u64,
    offset: usize,
) -> Result<Value, CodecError> {
    ctx.charge(offset, "map", count, ctx.options.max_map_len)?;
    ctx.enter(offset)?;
    let count = usize::try_from(count).map_err(|_| CodecError::SizeExceeded {
        offset,
        kind: "map",
        len: count,
        limit: ctx.options.max_map_len,
    })?;
    let mut entries = Vec::with_capacity(count.min(4096));
    let mut seen: HashSet<String> = HashSet::with_capacity(count.min(4096));
    for _ in 0..count {
        let key_offset = reader.offset();
        let key = decode_map_key(reader, ctx)?;
        if ctx.options.strict && !seen.insert(key.clone()) {
            return Err(CodecError::DuplicateKey {
                offset: key_offset,
                key,
            });
        }
        let value = decode_value(reader, ctx)?;
        entries.push((key, value));
    }
    ctx.exit();
    Ok(Value::Map(entries))
}

fn decode_map_key(reader: &mut Reader<'_>, ctx: &mut DecodeCtx<'_>) -> Result<String, CodecError> {
    let offset = reader.offset();
    let marker = reader.read_u8()?;
    let len = match marker {
        0xa0..=0xbf => u64::from(marker & 0x1f),
        0xd9 => u64::from(reader.read_u8()?),
        0xda => u64::from(reader.read_u16()?),
        0xdb => u64::from(reader.read_u32()?),
        _ => return Err(CodecError::InvalidMarker { offset, marker }),
    };
    decode_str_bytes(reader, ctx, len, offset)
}

fn decode_ext(
    reader: &mut Reader<'_>,
    ctx: &mut DecodeCtx<'_>,
    len: u64,
    offset: usize,
) -> Result<Value, CodecError> {
    // Extension bodies are charged against the binary limit: they are, at
    // the wire level, length-prefixed opaque byte runs like `Binary`.
    ctx.charge(offset, "binary", len, ctx.options.max_binary_len)?;
    let len = usize::try_from(len).map_err(|_| CodecError::SizeExceeded {
        offset,
        kind: "binary",
        len,
        limit: ctx.options.max_binary_len,
    })?;
    let tag = reader.read_i8()?;
    let body = reader.take(len)?;
    if tag == ext::TAG_TABULAR {
        ctx.enter(offset)?;
        let value = tabular::decode_tabular(body, ctx);
        ctx.exit();
        return value;
    }
    ext::decode_body(tag, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{encode, EncodeOptions};

    fn roundtrip(v: &Value) -> Value {
        let bytes = encode(v, &EncodeOptions::default().with_auto_tabular(false)).unwrap();
        decode(&bytes, &DecodeOptions::default()).unwrap()
    }

    #[test]
    fn nil_roundtrips() {
        assert_eq!(roundtrip(&Value::Nil), Value::Nil);
    }

    #[test]
    fn rejects_marker_0xc1() {
        let err = decode(&[0xc1], &DecodeOptions::default()).unwrap_err();
        assert_eq!(
            err,
            CodecError::InvalidMarker {
                offset: 0,
                marker: 0xc1
            }
        );
    }

    #[test]
    fn rejects_duplicate_map_keys_in_strict_mode() {
        // fixmap(2) { "a": 1, "a": 2 }
        let bytes = vec![0x82, 0xa1, b'a', 0x01, 0xa1, b'a', 0x02];
        let err = decode(&bytes, &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, CodecError::DuplicateKey { .. }));
    }

    #[test]
    fn allows_duplicate_map_keys_when_not_strict() {
        let bytes = vec![0x82, 0xa1, b'a', 0x01, 0xa1, b'a', 0x02];
        let opts = DecodeOptions::default().with_strict(false);
        let v = decode(&bytes, &opts).unwrap();
        assert_eq!(v.as_map().unwrap().len(), 2);
    }

    #[test]
    fn depth_limit_is_enforced() {
        // A chain of single-element fixarrays nested deeper than max_depth.
        let mut bytes = Vec::new();
        for _ in 0..200 {
            bytes.push(0x91);
        }
        bytes.push(0xc0);
        let opts = DecodeOptions::default().with_max_depth(16);
        let err = decode(&bytes, &opts).unwrap_err();
        assert!(matches!(err, CodecError::DepthExceeded { .. }));
    }

    #[test]
    fn truncated_input_never_panics() {
        for marker in [0xdb_u8, 0xc6, 0xc9] {
            let err = decode(&[marker, 0xff, 0xff, 0xff, 0xff], &DecodeOptions::default())
                .unwrap_err();
            assert!(matches!(
                err,
                CodecError::TruncatedInput { .. } | CodecError::SizeExceeded { .. }
            ));
        }
    }
}
