//! Error kinds raised by the codec (§7 of the BTOON specification).

/// All failure modes the codec can report. Decoding fails fast on the first
/// fatal condition; encoding fails fast on the first unsupported input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// A read would have advanced the cursor past the end of the buffer.
    #[error("truncated input at offset {offset}: need {needed} byte(s), {available} available")]
    TruncatedInput {
        /// Cursor position where the read was attempted.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Bytes actually remaining in the buffer.
        available: usize,
    },

    /// Marker byte `0xC1` or another undefined marker was encountered.
    #[error("invalid marker 0x{marker:02x} at offset {offset}")]
    InvalidMarker {
        /// Offset of the marker byte.
        offset: usize,
        /// The offending marker byte.
        marker: u8,
    },

    /// A string body failed strict UTF-8 validation.
    #[error("invalid utf-8 in string starting at offset {offset}")]
    InvalidUtf8 {
        /// Offset of the string body.
        offset: usize,
    },

    /// Recursion depth exceeded the configured cap.
    #[error("maximum decode depth {limit} exceeded at offset {offset}")]
    DepthExceeded {
        /// Offset at which the limit was hit.
        offset: usize,
        /// The configured depth cap.
        limit: usize,
    },

    /// A length prefix exceeded the configured cap for its type.
    #[error("{kind} length {len} exceeds limit {limit} at offset {offset}")]
    SizeExceeded {
        /// Offset of the length prefix.
        offset: usize,
        /// Which limit was violated (`"string"`, `"binary"`, `"array"`, `"map"`, `"total"`).
        kind: &'static str,
        /// The length that was read.
        len: u64,
        /// The configured limit.
        limit: u64,
    },

    /// The compression frame header was malformed.
    #[error("invalid compression frame: {reason}")]
    InvalidFrame {
        /// Human-readable reason (bad magic, non-zero reserved bytes, …).
        reason: &'static str,
    },

    /// The frame declared a compression algorithm ID this build does not support.
    #[error("unsupported compression algorithm id {id}")]
    UnsupportedAlgorithm {
        /// The raw algorithm ID from the frame header.
        id: u8,
    },

    /// Decompressed size disagreed with the frame header, or the compression
    /// ratio exceeded the configured bomb-defense cap.
    #[error("decompressed size mismatch: frame declared {expected}, got {actual}")]
    SizeMismatch {
        /// Size declared in the frame header.
        expected: u32,
        /// Size actually produced by the decompressor.
        actual: usize,
    },

    /// A decompression ratio exceeded the configured cap.
    #[error("compression ratio {ratio} exceeds cap {cap}")]
    RatioExceeded {
        /// Observed `uncompressed / compressed` ratio.
        ratio: u64,
        /// Configured cap.
        cap: u64,
    },

    /// Two entries in one Map shared the same key (strict mode).
    #[error("duplicate map key {key:?} at offset {offset}")]
    DuplicateKey {
        /// Offset of the second occurrence's key.
        offset: usize,
        /// The duplicated key.
        key: String,
    },

    /// A reserved extension's body had the wrong length for its type.
    #[error("extension type {tag} has invalid body length {len}")]
    InvalidExtensionLength {
        /// The extension's signed type tag.
        tag: i8,
        /// The body length actually present.
        len: usize,
    },

    /// The encoder was asked to encode a value it cannot represent on the wire
    /// (e.g. a non-string map key, which this Value model forbids structurally).
    #[error("cannot encode value of type {type_name}: {reason}")]
    Unencodable {
        /// Name of the offending type.
        type_name: &'static str,
        /// Why it could not be encoded.
        reason: &'static str,
    },
}
