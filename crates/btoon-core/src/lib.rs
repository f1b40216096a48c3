//! BTOON: a MessagePack-compatible binary serialization format with a
//! columnar tabular extension for homogeneous arrays of maps and an
//! optional compression framing layer.
//!
//! The wire format is big-endian throughout and uses the smallest legal
//! encoding for every value (§4.3), subject to the variant/wire-class
//! binding documented on [`encode`]. [`Value`] is the in-memory model;
//! [`encode()`] and [`decode()`] are the two public entry points.

#![forbid(unsafe_code)]

pub mod compress;
pub mod decode;
pub mod encode;
pub mod error;
mod ext;
mod io;
mod tabular;
pub mod value;

pub use compress::Algorithm;
pub use decode::{decode, DecodeOptions};
pub use encode::{encode, EncodeOptions};
pub use error::CodecError;
pub use tabular::is_tabular;
pub use value::Value;

/// Cumulative decoded-size budget default and compression-ratio cap share
/// the same constant (§4.2, §4.4): both exist to bound how much memory a
/// small input can force the decoder to allocate.
pub(crate) const DEFAULT_MAX_COMPRESSION_RATIO: u64 = 1000;

/// The crate's semantic version, as recorded in `Cargo.toml`.
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_compression_and_tabular_encoding() {
        let rows = Value::Array(vec![
            Value::Map(vec![
                ("id".into(), Value::UnsignedInt(1)),
                ("label".into(), Value::String("first".into())),
            ]),
            Value::Map(vec![
                ("id".into(), Value::UnsignedInt(2)),
                ("label".into(), Value::String("second".into())),
            ]),
        ]);
        let options = EncodeOptions::default()
            .with_compress(true)
            .with_min_compression_size(0);
        let bytes = encode(&rows, &options).unwrap();
        let decoded = decode(&bytes, &DecodeOptions::default()).unwrap();
        assert_eq!(decoded, rows);
    }

    #[test]
    fn version_matches_cargo_manifest() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }
}
