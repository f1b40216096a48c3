//! Schema model, validator, inferrer, and registry layered on top of
//! `btoon-core`'s `Value` (§4.7–§4.9). A Schema is itself encodable as a
//! `Value`, so schemas travel over the same wire as the data they describe.

#![forbid(unsafe_code)]

pub mod error;
pub mod infer;
pub mod model;
pub mod registry;
pub mod validate;

pub use error::SchemaError;
pub use infer::{infer, infer_one, merge, InferOptions};
pub use model::{Constraints, EvolutionStrategy, Field, Schema, Version};
pub use registry::{MigrationFn, MigrationOutcome, Registry};
pub use validate::{is_compatible_with, validate, Statistics, ValidationResult};
