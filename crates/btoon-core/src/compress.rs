//! Compression frame (C2): a 16-byte big-endian header wrapping an
//! algorithm-compressed payload (§4.2).
//!
//! ```text
//! magic: u32 = 0x4254_4F4E ("BTON")
//! version: u8 = 1
//! algorithm: u8
//! reserved: u16 = 0
//! compressed: u32
//! uncompressed: u32
//! ```
//!
//! Open question 5: the LZ4 path treats `uncompressed` as authoritative and
//! pre-allocates exactly that many bytes rather than growing a buffer, since
//! LZ4 blocks (unlike zstd frames) carry no trailer the decompressor could
//! cross-check against.

use std::io::Write as _;

use flate2::write::{ZlibDecoder, ZlibEncoder};
use flate2::Compression;

use crate::decode::DecodeOptions;
use crate::encode::EncodeOptions;
use crate::error::CodecError;
use crate::io::{Reader, Writer};

const MAGIC: u32 = 0x4254_4F4E;
const FRAME_VERSION: u8 = 1;
const HEADER_LEN: usize = 16;

/// Compression algorithm used by a frame's `algorithm` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// DEFLATE via `flate2`. Always available.
    Zlib,
    /// LZ4 block compression via `lz4_flex`. Requires the `lz4` feature.
    Lz4,
    /// Zstandard via `zstd`. Requires the `zstd` feature.
    Zstd,
}

impl Algorithm {
    fn to_u8(self) -> u8 {
        match self {
            Algorithm::Zlib => 0,
            Algorithm::Lz4 => 1,
            Algorithm::Zstd => 2,
        }
    }

    fn from_u8(id: u8) -> Result<Self, CodecError> {
        match id {
            0 => Ok(Algorithm::Zlib),
            1 => Ok(Algorithm::Lz4),
            2 => Ok(Algorithm::Zstd),
            _ => Err(CodecError::UnsupportedAlgorithm { id }),
        }
    }
}

/// Whether `bytes` starts with a recognizable frame header. Used by
/// [`crate::decode`] to decide whether to unwrap before parsing markers.
#[must_use]
pub fn looks_like_frame(bytes: &[u8]) -> bool {
    bytes.len() >= HEADER_LEN && bytes[0..4] == MAGIC.to_be_bytes()
}

/// Wrap `raw` in a compression frame under `options`. Payloads shorter than
/// `options.min_compression_size` are returned unframed.
pub fn encode_frame(raw: &[u8], options: &EncodeOptions) -> Result<Vec<u8>, CodecError> {
    if raw.len() < options.min_compression_size {
        return Ok(raw.to_vec());
    }

    let algorithm = if options.adaptive_compression {
        pick_smallest(raw, options.compression_level)?
    } else {
        (
            options.compression_algorithm,
            compress_with(options.compression_algorithm, raw, options.compression_level)?,
        )
    };
    let (algorithm, compressed) = algorithm;

    let compressed_len =
        u32::try_from(compressed.len()).map_err(|_| too_long("compressed frame"))?;
    let uncompressed_len = u32::try_from(raw.len()).map_err(|_| too_long("frame payload"))?;

    let mut w = Writer::with_capacity(HEADER_LEN + compressed.len());
    w.write_u32(MAGIC);
    w.write_u8(FRAME_VERSION);
    w.write_u8(algorithm.to_u8());
    w.write_u16(0);
    w.write_u32(compressed_len);
    w.write_u32(uncompressed_len);
    w.write_bytes(&compressed);
    Ok(w.into_vec())
}

/// Unwrap a compression frame, enforcing the configured decompression-bomb
/// cap and verifying the decompressed size against the header.
pub fn decode_frame(bytes: &[u8], options: &DecodeOptions) -> Result<Vec<u8>, CodecError> {
    let mut reader = Reader::new(bytes);
    let magic = reader.read_u32()?;
    if magic != MAGIC {
        return Err(CodecError::InvalidFrame { reason: "bad magic" });
    }
    let version = reader.read_u8()?;
    if version != FRAME_VERSION {
        return Err(CodecError::InvalidFrame {
            reason: "unsupported frame version",
        });
    }
    let algorithm = Algorithm::from_u8(reader.read_u8()?)?;
    let reserved = reader.read_u16()?;
    if reserved != 0 {
        return Err(CodecError::InvalidFrame {
            reason: "non-zero reserved bytes",
        });
    }
    let compressed_len = reader.read_u32()?;
    let uncompressed_len = reader.read_u32()?;

    let ratio = if compressed_len == 0 {
        u64::from(uncompressed_len).max(1) * options.max_compression_ratio
    } else {
        u64::from(uncompressed_len) / u64::from(compressed_len)
    };
    if ratio > options.max_compression_ratio {
        return Err(CodecError::RatioExceeded {
            ratio,
            cap: options.max_compression_ratio,
        });
    }

    let body = reader.take(compressed_len as usize)?;
    let out = decompress_with(algorithm, body, uncompressed_len as usize)?;
    if out.len() != uncompressed_len as usize {
        return Err(CodecError::SizeMismatch {
            expected: uncompressed_len,
            actual: out.len(),
        });
    }
    Ok(out)
}

fn pick_smallest(raw: &[u8], level: i32) -> Result<(Algorithm, Vec<u8>), CodecError> {
    let mut candidates = vec![(
        Algorithm::Zlib,
        compress_with(Algorithm::Zlib, raw, level)?,
    )];
    #[cfg(feature = "lz4")]
    candidates.push((Algorithm::Lz4, compress_with(Algorithm::Lz4, raw, level)?));
    #[cfg(feature = "zstd")]
    candidates.push((Algorithm::Zstd, compress_with(Algorithm::Zstd, raw, level)?));

    candidates
        .into_iter()
        .min_by_key(|(_, bytes)| bytes.len())
        .ok_or(CodecError::InvalidFrame {
            reason: "no compression algorithm compiled in",
        })
}

fn compress_with(algorithm: Algorithm, raw: &[u8], level: i32) -> Result<Vec<u8>, CodecError> {
    match algorithm {
        Algorithm::Zlib => {
            let compression = if level <= 0 {
                Compression::default()
            } else {
                Compression::new(level.clamp(0, 9) as u32)
            };
            let mut encoder = ZlibEncoder::new(Vec::new(), compression);
            encoder
                .write_all(raw)
                .map_err(|_| CodecError::InvalidFrame {
                    reason: "zlib compression failed",
                })?;
            encoder.finish().map_err(|_| CodecError::InvalidFrame {
                reason: "zlib compression failed",
            })
        }
        Algorithm::Lz4 => lz4_compress(raw),
        Algorithm::Zstd => zstd_compress(raw, level),
    }
}

fn decompress_with(
    algorithm: Algorithm,
    body: &[u8],
    uncompressed_len: usize,
) -> Result<Vec<u8>, CodecError> {
    match algorithm {
        Algorithm::Zlib => {
            let mut decoder = ZlibDecoder::new(Vec::with_capacity(uncompressed_len));
            decoder
                .write_all(body)
                .map_err(|_| CodecError::InvalidFrame {
                    reason: "zlib decompression failed",
                })?;
            decoder.finish().map_err(|_| CodecError::InvalidFrame {
                reason: "zlib decompression failed",
            })
        }
        Algorithm::Lz4 => lz4_decompress(body, uncompressed_len),
        Algorithm::Zstd => zstd_decompress(body, uncompressed_len),
    }
}

#[cfg(feature = "lz4")]
fn lz4_compress(raw: &[u8]) -> Result<Vec<u8>, CodecError> {
    Ok(lz4_flex::block::compress(raw))
}

#[cfg(not(feature = "lz4"))]
fn lz4_compress(_raw: &[u8]) -> Result<Vec<u8>, CodecError> {
    Err(CodecError::UnsupportedAlgorithm { id: 1 })
}

#[cfg(feature = "lz4")]
fn lz4_decompress(body: &[u8], uncompressed_len: usize) -> Result<Vec<u8>, CodecError> {
    lz4_flex::block::decompress(body, uncompressed_len).map_err(|_| CodecError::InvalidFrame {
        reason: "lz4 decompression failed",
    })
}

#[cfg(not(feature = "lz4"))]
fn lz4_decompress(_body: &[u8], _uncompressed_len: usize) -> Result<Vec<u8>, CodecError> {
    Err(CodecError::UnsupportedAlgorithm { id: 1 })
}

#[cfg(feature = "zstd")]
fn zstd_compress(raw: &[u8], level: i32) -> Result<Vec<u8>, CodecError> {
    let level = if level <= 0 { 3 } else { level };
    zstd::stream::encode_all(raw, level).map_err(|_| CodecError::InvalidFrame {
        reason: "zstd compression failed",
    })
}

#[cfg(not(feature = "zstd"))]
fn zstd_compress(_raw: &[u8], _level: i32) -> Result<Vec<u8>, CodecError> {
    Err(CodecError::UnsupportedAlgorithm { id: 2 })
}

#[cfg(feature = "zstd")]
fn zstd_decompress(body: &[u8], uncompressed_len: usize) -> Result<Vec<u8>, CodecError> {
    let out = zstd::stream::decode_all(body).map_err(|_| CodecError::InvalidFrame {
        reason: "zstd decompression failed",
    })?;
    if out.len() > uncompressed_len {
        return Err(CodecError::SizeMismatch {
            expected: uncompressed_len as u32,
            actual: out.len(),
        });
    }
    Ok(out)
}

#[cfg(not(feature = "zstd"))]
fn zstd_decompress(_body: &[u8], _uncompressed_len: usize) -> Result<Vec<u8>, CodecError> {
    Err(CodecError::UnsupportedAlgorithm { id: 2 })
}

fn too_long(kind: &'static str) -> CodecError {
    CodecError::Unencodable {
        type_name: kind,
        reason: "length exceeds u32::MAX",
    }
}
