//! Base encoder (C3): produces the smallest legal encoding for each value.
//!
//! Integer variant/wire-class binding. The Value model keeps `SignedInt`
//! and `UnsignedInt` as distinct variants so that decode can report which
//! wire class produced a number (§3, §4.4). For `decode(encode(v)) == v`
//! (§8) to hold for every well-formed value — not just non-negative ones —
//! the encoder binds each variant to its wire-class family: `UnsignedInt`
//! only ever uses the unsigned ladder (positive fixint, uint8/16/32/64);
//! `SignedInt` only ever uses the signed ladder (negative fixint,
//! int8/16/32/64), even for values in `0..=127` that would fit a fixint —
//! there is no one-byte signed-class encoding for small non-negative
//! numbers, so `SignedInt(42)` costs two bytes where `UnsignedInt(42)`
//! costs one. Within each family, minimality (§4.3) still picks the
//! narrowest width. This is documented as a deliberate resolution in
//! `DESIGN.md`.

use crate::compress::{self, Algorithm};
use crate::error::CodecError;
use crate::ext;
use crate::io::Writer;
use crate::tabular;
use crate::value::Value;

/// Options controlling how a [`Value`] is turned into bytes (§6).
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Wrap the encoded payload in a compression frame (§4.2).
    pub compress: bool,
    /// Algorithm to use when `compress` is set.
    pub compression_algorithm: Algorithm,
    /// Algorithm-specific compression level; `0` means "library default".
    pub compression_level: i32,
    /// Skip compression for payloads smaller than this, even if `compress`
    /// is set — the frame is still skipped consistently (the wrapper never
    /// emits a frame for a payload it decided was too small).
    pub min_compression_size: usize,
    /// Emit the columnar tabular extension (C5) for eligible arrays instead
    /// of a generic array.
    pub auto_tabular: bool,
    /// Sample the payload and pick the smallest-output algorithm instead of
    /// `compression_algorithm`. Only consults algorithms compiled in.
    pub adaptive_compression: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            compress: false,
            compression_algorithm: Algorithm::Zlib,
            compression_level: 0,
            min_compression_size: 256,
            auto_tabular: true,
            adaptive_compression: false,
        }
    }
}

impl EncodeOptions {
    /// Enable or disable whole-payload compression.
    #[must_use]
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Select the compression algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.compression_algorithm = algorithm;
        self
    }

    /// Set the algorithm-specific compression level.
    #[must_use]
    pub fn with_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    /// Set the minimum payload size eligible for compression.
    #[must_use]
    pub fn with_min_compression_size(mut self, min: usize) -> Self {
        self.min_compression_size = min;
        self
    }

    /// Enable or disable the tabular extension for eligible arrays.
    #[must_use]
    pub fn with_auto_tabular(mut self, auto_tabular: bool) -> Self {
        self.auto_tabular = auto_tabular;
        self
    }

    /// Enable or disable adaptive algorithm selection.
    #[must_use]
    pub fn with_adaptive_compression(mut self, adaptive: bool) -> Self {
        self.adaptive_compression = adaptive;
        self
    }
}

/// Encode `value` to bytes under `options`.
pub fn encode(value: &Value, options: &EncodeOptions) -> Result<Vec<u8>, CodecError> {
    let mut writer = Writer::default();
    encode_value(value, &mut writer, options)?;
    let raw = writer.into_vec();
    if options.compress {
        compress::encode_frame(&raw, options)
    } else {
        Ok(raw)
    }
}

pub(crate) fn encode_value(
    value: &Value,
    w: &mut Writer,
    options: &EncodeOptions,
) -> Result<(), CodecError> {
    match value {
        Value::Nil => w.write_u8(0xc0),
        Value::Bool(b) => w.write_u8(if *b { 0xc3 } else { 0xc2 }),
        Value::UnsignedInt(n) => encode_unsigned(*n, w),
        Value::SignedInt(n) => encode_signed(*n, w),
        Value::Float(f) => {
            w.write_u8(0xcb);
            w.write_f64(*f);
        }
        Value::String(s) => {
            write_str_header(s.len(), w)?;
            w.write_bytes(s.as_bytes());
        }
        Value::Binary(b) => {
            write_bin_header(b.len(), w)?;
            w.write_bytes(b);
        }
        Value::Array(items) => {
            if options.auto_tabular && tabular::is_tabular(items) {
                let (tag, body) = tabular::encode_tabular(items, options)?;
                write_ext(tag, &body, w)?;
            } else {
                write_array_header(items.len(), w)?;
                for item in items {
                    encode_value(item, w, options)?;
                }
            }
        }
        Value::Map(entries) => {
            write_map_header(entries.len(), w)?;
            for (key, val) in entries {
                write_str_header(key.len(), w)?;
                w.write_bytes(key.as_bytes());
                encode_value(val, w, options)?;
            }
        }
        Value::Timestamp(_)
        | Value::Date(_)
        | Value::DateTime(_)
        | Value::BigInt(_)
        | Value::VectorFloat(_)
        | Value::VectorDouble(_)
        | Value::Extension(_, _) => {
            let (tag, body) = ext::encode_body(value).ok_or(CodecError::Unencodable {
                type_name: value.type_name(),
                reason: "not an extension-shaped value",
            })?;
            write_ext(tag, &body, w)?;
        }
    }
    Ok(())
}

fn encode_unsigned(n: u64, w: &mut Writer) {
    match n {
        0..=0x7f => w.write_u8(n as u8),
        0x80..=0xff => {
            w.write_u8(0xcc);
            w.write_u8(n as u8);
        }
        0x100..=0xffff => {
            w.write_u8(0xcd);
            w.write_u16(n as u16);
        }
        0x1_0000..=0xffff_ffff => {
            w.write_u8(0xce);
            w.write_u32(n as u32);
        }
        _ => {
            w.write_u8(0xcf);
            w.write_u64(n);
        }
    }
}

fn encode_signed(n: i64, w: &mut Writer) {
    if (-32..0).contains(&n) {
        w.write_i8(n as i8);
        return;
    }
    if let Ok(v) = i8::try_from(n) {
        w.write_u8(0xd0);
        w.write_i8(v);
    } else if let Ok(v) = i16::try_from(n) {
        w.write_u8(0xd1);
        w.write_u16(v as u16);
    } else if let Ok(v) = i32::try_from(n) {
        w.write_u8(0xd2);
        w.write_u32(v as u32);
    } else {
        w.write_u8(0xd3);
        w.write_u64(n as u64);
    }
}

fn write_str_header(len: usize, w: &mut Writer) -> Result<(), CodecError> {
    if len <= 0x1f {
        w.write_u8(0xa0 | len as u8);
    } else if len <= 0xff {
        w.write_u8(0xd9);
        w.write_u8(len as u8);
    } else if len <= 0xffff {
        w.write_u8(0xda);
        w.write_u16(len as u16);
    } else {
        let len = u32::try_from(len).map_err(|_| too_long("string"))?;
        w.write_u8(0xdb);
        w.write_u32(len);
    }
    Ok(())
}

fn write_bin_header(len: usize, w: &mut Writer) -> Result<(), CodecError> {
    if len <= 0xff {
        w.write_u8(0xc4);
        w.write_u8(len as u8);
    } else if len <= 0xffff {
        w.write_u8(0xc5);
        w.write_u16(len as u16);
    } else {
        let len = u32::try_from(len).map_err(|_| too_long("binary"))?;
        w.write_u8(0xc6);
        w.write_u32(len);
    }
    Ok(())
}

fn write_array_header(len: usize, w: &mut Writer) -> Result<(), CodecError> {
    if len <= 0xf {
        w.write_u8(0x90 | len as u8);
    } else if len <= 0xffff {
        w.write_u8(0xdc);
        w.write_u16(len as u16);
    } else {
        let len = u32::try_from(len).map_err(|_| too_long("array"))?;
        w.write_u8(0xdd);
        w.write_u32(len);
    }
    Ok(())
}

fn write_map_header(len: usize, w: &mut Writer) -> Result<(), CodecError> {
    if len <= 0xf {
        w.write_u8(0x80 | len as u8);
    } else if len <= 0xffff {
        w.write_u8(0xde);
        w.write_u16(len as u16);
    } else {
        let len = u32::try_from(len).map_err(|_| too_long("map"))?;
        w.write_u8(0xdf);
        w.write_u32(len);
    }
    Ok(())
}

pub(crate) fn write_ext(tag: i8, body: &[u8], w: &mut Writer) -> Result<(), CodecError> {
    match body.len() {
        1 => {
            w.write_u8(0xd4);
            w.write_i8(tag);
        }
        2 => {
            w.write_u8(0xd5);
            w.write_i8(tag);
        }
        4 => {
            w.write_u8(0xd6);
            w.write_i8(tag);
        }
        8 => {
            w.write_u8(0xd7);
            w.write_i8(tag);
        }
        16 => {
            w.write_u8(0xd8);
            w.write_i8(tag);
        }
        n if n <= 0xff => {
            w.write_u8(0xc7);
            w.write_u8(n as u8);
            w.write_i8(tag);
        }
        n if n <= 0xffff => {
            w.write_u8(0xc8);
            w.write_u16(n as u16);
            w.write_i8(tag);
        }
        n => {
            let n = u32::try_from(n).map_err(|_| too_long("extension"))?;
            w.write_u8(0xc9);
            w.write_u32(n);
            w.write_i8(tag);
        }
    }
    w.write_bytes(body);
    Ok(())
}

fn too_long(kind: &'static str) -> CodecError {
    CodecError::Unencodable {
        type_name: kind,
        reason: "length exceeds u32::MAX",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn encode_default(v: &Value) -> Vec<u8> {
        encode(v, &EncodeOptions::default()).unwrap()
    }

    #[test]
    fn nil_encodes_to_c0() {
        assert_eq!(encode_default(&Value::Nil), vec![0xc0]);
    }

    #[test]
    fn small_positive_uint_is_one_byte_fixint() {
        assert_eq!(encode_default(&Value::UnsignedInt(42)), vec![0x2a]);
    }

    #[test]
    fn small_negative_int_is_one_byte_negative_fixint() {
        assert_eq!(encode_default(&Value::SignedInt(-12)), vec![0xf4]);
    }

    #[test]
    fn short_ascii_string_matches_golden_bytes() {
        let bytes = encode_default(&Value::String("Hello, BTOON!".into()));
        let expected: Vec<u8> = vec![
            0xad, 0x48, 0x65, 0x6c, 0x6c, 0x6f, 0x2c, 0x20, 0x42, 0x54, 0x4f, 0x4f, 0x4e, 0x21,
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn homogeneous_small_array_matches_golden_bytes() {
        let v = Value::Array(vec![
            Value::UnsignedInt(1),
            Value::UnsignedInt(2),
            Value::UnsignedInt(3),
        ]);
        let opts = EncodeOptions::default().with_auto_tabular(false);
        assert_eq!(encode(&v, &opts).unwrap(), vec![0x93, 0x01, 0x02, 0x03]);
    }

    #[test]
    fn two_field_map_matches_golden_bytes() {
        let v = Value::Map(vec![
            ("name".into(), Value::String("Alice".into())),
            ("age".into(), Value::UnsignedInt(30)),
        ]);
        let expected: Vec<u8> = vec![
            0x82, 0xa4, 0x6e, 0x61, 0x6d, 0x65, 0xa5, 0x41, 0x6c, 0x69, 0x63, 0x65, 0xa3, 0x61,
            0x67, 0x65, 0x1e,
        ];
        assert_eq!(encode_default(&v), expected);
    }

    #[test]
    fn encoder_never_widens_unsigned_narrow_fit() {
        // 200 fits in one unsigned byte; must not be promoted to a wider class.
        assert_eq!(encode_default(&Value::UnsignedInt(200)), vec![0xcc, 200]);
    }

    #[test]
    fn signed_small_nonnegative_uses_int8_not_fixint() {
        // SignedInt never uses the unsigned fixint class, even for small values.
        assert_eq!(encode_default(&Value::SignedInt(42)), vec![0xd0, 0x2a]);
    }
}
