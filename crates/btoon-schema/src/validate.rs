//! Schema validator (C8, validator half): the five-step algorithm of §4.7
//! plus the evolution-strategy compatibility check.

use regex::Regex;

use btoon_core::Value;

use crate::model::{EvolutionStrategy, Field, Schema};

/// Summary counters attached to a successful validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Number of declared fields checked.
    pub fields_checked: usize,
    /// Number of absent-but-required fields filled from their declared default.
    pub defaults_applied: usize,
    /// Number of keys present in the value but not declared in the schema.
    pub extra_keys: usize,
}

/// Result of validating one value against one schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether the value is valid under the schema.
    pub valid: bool,
    /// All accumulated errors (validation does not fail fast, per §7).
    pub errors: Vec<String>,
    /// Non-fatal warnings (currently unused by the built-in rules; reserved
    /// for callers composing their own checks on top of this result).
    pub warnings: Vec<String>,
    /// Counters describing the run, present only when validation reached step 5.
    pub statistics: Option<Statistics>,
}

impl ValidationResult {
    fn failed(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
            warnings: Vec::new(),
            statistics: None,
        }
    }
}

/// Validate `value` against `schema` (§4.7).
#[must_use]
pub fn validate(value: &Value, schema: &Schema) -> ValidationResult {
    let Some(entries) = value.as_map() else {
        return ValidationResult::failed(vec!["value must be a map".to_string()]);
    };

    let mut errors = Vec::new();
    let mut stats = Statistics::default();

    for field in &schema.fields {
        stats.fields_checked += 1;
        let present = entries.iter().find(|(k, _)| k == &field.name).map(|(_, v)| v);
        let effective = match present {
            Some(v) => Some(v.clone()),
            None if field.required && field.default.is_some() => {
                stats.defaults_applied += 1;
                field.default.clone()
            }
            None if field.required => {
                errors.push(format!("missing required field {}", field.name));
                None
            }
            None => None,
        };

        let Some(effective) = effective else { continue };
        check_field(field, &effective, &mut errors);
    }

    if schema.evolution_strategy == EvolutionStrategy::Strict {
        for (key, _) in entries {
            if schema.field(key).is_none() {
                stats.extra_keys += 1;
                errors.push(format!("unexpected field {key}"));
            }
        }
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
        warnings: Vec::new(),
        statistics: Some(stats),
    }
}

fn check_field(field: &Field, value: &Value, errors: &mut Vec<String>) {
    if !value.matches_type_name(&field.type_name) {
        errors.push(format!(
            "field {} expected type {}, got {}",
            field.name,
            field.type_name,
            value.type_name()
        ));
        return;
    }

    let Some(constraints) = &field.constraints else {
        return;
    };

    let numeric = match value {
        Value::SignedInt(n) => Some(*n as f64),
        Value::UnsignedInt(n) => Some(*n as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    };
    if let (Some(min), Some(n)) = (constraints.min, numeric) {
        if n < min {
            errors.push(format!("field {} value {n} is below minimum {min}", field.name));
        }
    }
    if let (Some(max), Some(n)) = (constraints.max, numeric) {
        if n > max {
            errors.push(format!("field {} value {n} exceeds maximum {max}", field.name));
        }
    }

    let length = match value {
        Value::String(s) => Some(s.chars().count() as u64),
        Value::Binary(b) => Some(b.len() as u64),
        _ => None,
    };
    if let (Some(min_length), Some(len)) = (constraints.min_length, length) {
        if len < min_length {
            errors.push(format!(
                "field {} length {len} is below minimum length {min_length}",
                field.name
            ));
        }
    }
    if let (Some(max_length), Some(len)) = (constraints.max_length, length) {
        if len > max_length {
            errors.push(format!(
                "field {} length {len} exceeds maximum length {max_length}",
                field.name
            ));
        }
    }

    if let Some(pattern) = &constraints.pattern {
        match (value, Regex::new(pattern)) {
            (Value::String(s), Ok(re)) => {
                if !re.is_match(s) {
                    errors.push(format!("field {} does not match pattern {pattern}", field.name));
                }
            }
            (Value::String(_), Err(e)) => {
                errors.push(format!("field {} has invalid pattern: {e}", field.name));
            }
            _ => {}
        }
    }

    if let Some(enum_values) = &constraints.enum_values {
        if !enum_values.iter().any(|v| v == value) {
            errors.push(format!("field {} is not one of the allowed values", field.name));
        }
    }
}

/// Evolution-strategy compatibility check (§4.7's table): whether every
/// value valid under `a` is also valid under `b`.
#[must_use]
pub fn is_compatible_with(a: &Schema, b: &Schema) -> bool {
    match a.evolution_strategy {
        EvolutionStrategy::Strict => a == b,
        EvolutionStrategy::Additive => a.fields.iter().all(|f| {
            !f.required
                || b.field(&f.name)
                    .is_some_and(|bf| bf.type_name == f.type_name)
        }),
        EvolutionStrategy::BackwardCompatible => a
            .fields
            .iter()
            .filter(|f| f.required && f.default.is_none())
            .all(|f| b.field(&f.name).is_some()),
        EvolutionStrategy::Flexible => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Constraints, Version};

    fn person_schema() -> Schema {
        Schema::new("Person")
            .with_field(Field::new("name", "string"))
            .with_field(
                Field::new("age", "uint").with_constraints(Constraints {
                    min: Some(0.0),
                    max: Some(150.0),
                    ..Default::default()
                }),
            )
    }

    #[test]
    fn rejects_non_map_value() {
        let result = validate(&Value::Nil, &person_schema());
        assert!(!result.valid);
    }

    #[test]
    fn rejects_missing_required_field() {
        let value = Value::Map(vec![("name".into(), Value::String("Alice".into()))]);
        let result = validate(&value, &person_schema());
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.contains("age")));
    }

    #[test]
    fn rejects_out_of_range_constraint() {
        let value = Value::Map(vec![
            ("name".into(), Value::String("Alice".into())),
            ("age".into(), Value::UnsignedInt(200)),
        ]);
        let result = validate(&value, &person_schema());
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.contains("maximum")));
    }

    #[test]
    fn accepts_well_formed_value() {
        let value = Value::Map(vec![
            ("name".into(), Value::String("Alice".into())),
            ("age".into(), Value::UnsignedInt(30)),
        ]);
        let result = validate(&value, &person_schema());
        assert!(result.valid, "{:?}", result.errors);
    }

    #[test]
    fn strict_schema_rejects_unknown_keys() {
        let schema = person_schema().with_evolution_strategy(EvolutionStrategy::Strict);
        let value = Value::Map(vec![
            ("name".into(), Value::String("Alice".into())),
            ("age".into(), Value::UnsignedInt(30)),
            ("extra".into(), Value::Nil),
        ]);
        let result = validate(&value, &schema);
        assert!(!result.valid);
    }

    #[test]
    fn additive_compatibility_requires_matching_required_fields() {
        let a = person_schema().with_evolution_strategy(EvolutionStrategy::Additive);
        let b = a.clone().with_version(Version::new(1, 1, 0)).with_field(
            Field::new("nickname", "string").optional(),
        );
        assert!(is_compatible_with(&a, &b));
    }
}
