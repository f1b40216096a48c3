//! Error kinds raised by the schema layer (§7's `SchemaViolation`, plus the
//! schema-specific failure modes the codec's error type has no room for).

/// Failure modes the schema layer can report. Validation itself is
/// exhaustive and returns its errors inside [`crate::validate::ValidationResult`]
/// rather than through this type; `SchemaError` covers the operations that
/// fail fast.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// A `Value` did not have the shape required of an encoded Schema
    /// (§6's wire layout).
    #[error("value at {path} is not a valid schema: {reason}")]
    InvalidSchemaValue {
        /// Path within the schema Value where the defect was found, e.g. `"fields[2].type"`.
        path: String,
        /// Human-readable reason.
        reason: String,
    },

    /// A field's `pattern` constraint failed to compile as a regular expression.
    #[error("field {field} has an invalid pattern constraint: {reason}")]
    InvalidPattern {
        /// Name of the offending field.
        field: String,
        /// The regex engine's error message.
        reason: String,
    },

    /// `validate(value, schema)` found at least one error; this variant is
    /// used by call sites that want a `Result` instead of inspecting
    /// `ValidationResult::valid` themselves.
    #[error("schema violation: {0:?}")]
    SchemaViolation(Vec<String>),
}
