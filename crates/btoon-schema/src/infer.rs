//! Schema inferrer (C9): derive a `Schema` from one or many sample values
//! (§4.8).

use btoon_core::Value;

use crate::model::{Constraints, Field, Schema};

/// Options controlling schema inference.
#[derive(Debug, Clone)]
pub struct InferOptions {
    /// Fraction of samples a key must appear in to be inferred required
    /// (with a default substituted for the samples that lacked it).
    pub required_threshold: f64,
    /// Collapse a mix of `SignedInt`/`UnsignedInt`/`Float` observations to `"number"`.
    pub merge_numeric_types: bool,
    /// When `false`, a non-numeric type mismatch across samples is reported as `"any"`.
    pub strict_types: bool,
    /// Derive min/max, length, and enum constraints from the observed values.
    pub infer_constraints: bool,
    /// Maximum number of distinct values before a field stops being enum-eligible.
    pub max_enum_values: usize,
    /// Schema name; defaults to `"InferredSchema"`.
    pub name: Option<String>,
}

impl Default for InferOptions {
    fn default() -> Self {
        Self {
            required_threshold: 0.95,
            merge_numeric_types: true,
            strict_types: true,
            infer_constraints: true,
            max_enum_values: 10,
            name: None,
        }
    }
}

impl InferOptions {
    /// Set the required-field observation threshold.
    #[must_use]
    pub fn with_required_threshold(mut self, threshold: f64) -> Self {
        self.required_threshold = threshold;
        self
    }

    /// Enable or disable numeric-type merging.
    #[must_use]
    pub fn with_merge_numeric_types(mut self, merge: bool) -> Self {
        self.merge_numeric_types = merge;
        self
    }

    /// Enable or disable strict-type fallback to `"any"`.
    #[must_use]
    pub fn with_strict_types(mut self, strict: bool) -> Self {
        self.strict_types = strict;
        self
    }

    /// Enable or disable constraint inference.
    #[must_use]
    pub fn with_infer_constraints(mut self, infer: bool) -> Self {
        self.infer_constraints = infer;
        self
    }

    /// Set the maximum distinct-value count for enum promotion.
    #[must_use]
    pub fn with_max_enum_values(mut self, max: usize) -> Self {
        self.max_enum_values = max;
        self
    }

    /// Set the inferred schema's name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

struct Observations<'a> {
    key: String,
    present_in: usize,
    values: Vec<&'a Value>,
}

fn collect_observations(samples: &[Value]) -> Vec<Observations<'_>> {
    let mut order: Vec<String> = Vec::new();
    let mut by_key: Vec<(String, usize, Vec<&Value>)> = Vec::new();

    for sample in samples {
        let Some(entries) = sample.as_map() else { continue };
        for (key, value) in entries {
            match by_key.iter_mut().find(|(k, _, _)| k == key) {
                Some((_, present_in, values)) => {
                    *present_in += 1;
                    values.push(value);
                }
                None => {
                    order.push(key.clone());
                    by_key.push((key.clone(), 1, vec![value]));
                }
            }
        }
    }

    by_key
        .into_iter()
        .map(|(key, present_in, values)| Observations {
            key,
            present_in,
            values,
        })
        .collect()
}

fn merged_type_name(type_names: &[&str], options: &InferOptions) -> String {
    let mut distinct: Vec<&str> = Vec::new();
    for &t in type_names {
        if !distinct.contains(&t) {
            distinct.push(t);
        }
    }
    if distinct.len() == 1 {
        return distinct[0].to_string();
    }
    let all_numeric = distinct.iter().all(|t| matches!(*t, "int" | "uint" | "float"));
    if options.merge_numeric_types && all_numeric {
        return "number".to_string();
    }
    "any".to_string()
}

fn distinct_values(values: &[&Value], limit: usize) -> Option<Vec<Value>> {
    let mut distinct: Vec<Value> = Vec::new();
    for value in values {
        if !distinct.iter().any(|v| v == *value) {
            distinct.push((*value).clone());
            if distinct.len() > limit {
                return None;
            }
        }
    }
    Some(distinct)
}

fn most_common(values: &[&Value]) -> Value {
    let mut best: Option<(Value, usize)> = None;
    for value in values {
        let count = values.iter().filter(|v| *v == value).count();
        if best.as_ref().is_none_or(|(_, c)| count > *c) {
            best = Some(((*value).clone(), count));
        }
    }
    best.map(|(v, _)| v).unwrap_or(Value::Nil)
}

fn infer_constraints(type_name: &str, values: &[&Value], options: &InferOptions) -> Option<Constraints> {
    if !options.infer_constraints {
        return None;
    }
    let mut constraints = Constraints::default();
    let mut populated = false;

    if matches!(type_name, "int" | "uint" | "float" | "number") {
        let numeric: Vec<f64> = values
            .iter()
            .filter_map(|v| match v {
                Value::SignedInt(n) => Some(*n as f64),
                Value::UnsignedInt(n) => Some(*n as f64),
                Value::Float(f) => Some(*f),
                _ => None,
            })
            .collect();
        if let (Some(min), Some(max)) = (
            numeric.iter().copied().fold(None, fold_min),
            numeric.iter().copied().fold(None, fold_max),
        ) {
            constraints.min = Some(min);
            constraints.max = Some(max);
            populated = true;
        }
    }

    if type_name == "string" {
        let lengths: Vec<u64> = values
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.chars().count() as u64),
                _ => None,
            })
            .collect();
        if let (Some(min), Some(max)) = (
            lengths.iter().copied().min(),
            lengths.iter().copied().max(),
        ) {
            constraints.min_length = Some(min);
            constraints.max_length = Some(max);
            populated = true;
        }
    }

    if matches!(type_name, "string" | "int" | "uint" | "float" | "bool") {
        if let Some(distinct) = distinct_values(values, options.max_enum_values) {
            constraints.enum_values = Some(distinct);
            populated = true;
        }
    }

    populated.then_some(constraints)
}

fn fold_min(acc: Option<f64>, x: f64) -> Option<f64> {
    Some(acc.map_or(x, |a| a.min(x)))
}

fn fold_max(acc: Option<f64>, x: f64) -> Option<f64> {
    Some(acc.map_or(x, |a| a.max(x)))
}

/// Infer a schema from one sample value.
#[must_use]
pub fn infer_one(value: &Value, options: &InferOptions) -> Schema {
    infer(std::slice::from_ref(value), options)
}

/// Infer a schema from a sequence of sample values (§4.8).
#[must_use]
pub fn infer(samples: &[Value], options: &InferOptions) -> Schema {
    let name = options.name.clone().unwrap_or_else(|| "InferredSchema".to_string());
    let mut schema = Schema::new(name);
    if samples.is_empty() {
        return schema;
    }

    let total = samples.len();
    for obs in collect_observations(samples) {
        let fraction = obs.present_in as f64 / total as f64;
        let type_names: Vec<&'static str> = obs.values.iter().map(|v| v.type_name()).collect();
        let type_name = merged_type_name(&type_names, options);
        let constraints = infer_constraints(&type_name, &obs.values, options);

        let mut field = Field::new(obs.key, type_name);
        if obs.present_in < total {
            if fraction >= options.required_threshold {
                field = field.with_default(most_common(&obs.values));
            } else {
                field = field.optional();
            }
        }
        if let Some(constraints) = constraints {
            field = field.with_constraints(constraints);
        }
        schema = schema.with_field(field);
    }

    schema
}

/// Union the field sets of several schemas into one (§4.8's `merge`).
#[must_use]
pub fn merge(schemas: &[Schema], name: impl Into<String>) -> Schema {
    let mut merged = Schema::new(name);
    let mut order: Vec<String> = Vec::new();

    for schema in schemas {
        for field in &schema.fields {
            if !order.contains(&field.name) {
                order.push(field.name.clone());
            }
        }
    }

    for field_name in order {
        let declarations: Vec<&Field> = schemas
            .iter()
            .filter_map(|s| s.field(&field_name))
            .collect();
        let required = schemas.len() == declarations.len() && declarations.iter().all(|f| f.required);
        let type_names: Vec<&str> = declarations.iter().map(|f| f.type_name.as_str()).collect();
        let type_name = merged_type_name(&type_names, &InferOptions::default());

        let mut field = Field::new(field_name, type_name);
        if !required {
            field = field.optional();
        }
        merged = merged.with_field(field);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_required_and_optional_fields() {
        let samples = vec![
            Value::Map(vec![
                ("id".into(), Value::UnsignedInt(1)),
                ("nickname".into(), Value::String("a".into())),
            ]),
            Value::Map(vec![("id".into(), Value::UnsignedInt(2))]),
        ];
        let schema = infer(&samples, &InferOptions::default().with_required_threshold(0.99));
        assert!(schema.field("id").unwrap().required);
        assert!(!schema.field("nickname").unwrap().required);
    }

    #[test]
    fn merges_numeric_types_to_number() {
        let samples = vec![
            Value::Map(vec![("x".into(), Value::UnsignedInt(1))]),
            Value::Map(vec![("x".into(), Value::Float(1.5))]),
        ];
        let schema = infer(&samples, &InferOptions::default());
        assert_eq!(schema.field("x").unwrap().type_name, "number");
    }

    #[test]
    fn infers_min_max_constraints() {
        let samples = vec![
            Value::Map(vec![("x".into(), Value::UnsignedInt(1))]),
            Value::Map(vec![("x".into(), Value::UnsignedInt(9))]),
        ];
        let schema = infer(&samples, &InferOptions::default());
        let constraints = schema.field("x").unwrap().constraints.clone().unwrap();
        assert_eq!(constraints.min, Some(1.0));
        assert_eq!(constraints.max, Some(9.0));
    }
}
