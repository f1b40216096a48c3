//! Schema data model (C8, model half): `Schema`, `Field`, `Constraints`, and
//! `Version`, plus the `Value` conversion that makes a Schema itself
//! round-trip through the codec (§6).

use std::fmt;
use std::str::FromStr;

use btoon_core::Value;

use crate::error::SchemaError;

/// A three-component version, ordered lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// Major component.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
    /// Patch component.
    pub patch: u64,
}

impl Version {
    /// Construct a version directly from its three components.
    #[must_use]
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { major, minor, patch }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(invalid("version", s, "expected MAJOR.MINOR.PATCH"));
        };
        let parse = |field: &str, name: &'static str| {
            field
                .parse::<u64>()
                .map_err(|_| invalid(name, s, "component is not a non-negative integer"))
        };
        Ok(Self {
            major: parse(major, "version")?,
            minor: parse(minor, "version")?,
            patch: parse(patch, "version")?,
        })
    }
}

/// Schema evolution policy (§4.7's compatibility table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvolutionStrategy {
    /// No deviation from the declared schema is tolerated.
    Strict,
    /// New optional fields may be added; existing required fields are fixed.
    Additive,
    /// Required fields without defaults must persist; everything else may change.
    BackwardCompatible,
    /// Always considered compatible.
    Flexible,
}

impl EvolutionStrategy {
    /// The wire string used in a Schema's `evolution_strategy` field (§6).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EvolutionStrategy::Strict => "strict",
            EvolutionStrategy::Additive => "additive",
            EvolutionStrategy::BackwardCompatible => "backward_compatible",
            EvolutionStrategy::Flexible => "flexible",
        }
    }
}

impl FromStr for EvolutionStrategy {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(EvolutionStrategy::Strict),
            "additive" => Ok(EvolutionStrategy::Additive),
            "backward_compatible" => Ok(EvolutionStrategy::BackwardCompatible),
            "flexible" => Ok(EvolutionStrategy::Flexible),
            other => Err(invalid(
                "evolution_strategy",
                other,
                "expected strict|additive|backward_compatible|flexible",
            )),
        }
    }
}

/// Per-field constraints (§4.7 step 4), evaluated in the order: min, max,
/// `min_length`, `max_length`, pattern, enum.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    /// Inclusive minimum for numeric fields.
    pub min: Option<f64>,
    /// Inclusive maximum for numeric fields.
    pub max: Option<f64>,
    /// Minimum length for string/binary fields.
    pub min_length: Option<u64>,
    /// Maximum length for string/binary fields.
    pub max_length: Option<u64>,
    /// Regular expression a string field's value must match.
    pub pattern: Option<String>,
    /// Finite set of values a field may take, compared by structural equality.
    pub enum_values: Option<Vec<Value>>,
}

impl Constraints {
    fn to_value(&self) -> Value {
        let mut entries = Vec::new();
        if let Some(min) = self.min {
            entries.push(("min".to_string(), Value::Float(min)));
        }
        if let Some(max) = self.max {
            entries.push(("max".to_string(), Value::Float(max)));
        }
        if let Some(min_length) = self.min_length {
            entries.push(("minLength".to_string(), Value::UnsignedInt(min_length)));
        }
        if let Some(max_length) = self.max_length {
            entries.push(("maxLength".to_string(), Value::UnsignedInt(max_length)));
        }
        if let Some(pattern) = &self.pattern {
            entries.push(("pattern".to_string(), Value::String(pattern.clone())));
        }
        if let Some(values) = &self.enum_values {
            entries.push(("enum".to_string(), Value::Array(values.clone())));
        }
        Value::Map(entries)
    }

    fn from_value(value: &Value, field: &str) -> Result<Self, SchemaError> {
        let Some(entries) = value.as_map() else {
            return Err(invalid(field, "constraints", "expected a map"));
        };
        let mut constraints = Constraints::default();
        for (key, v) in entries {
            match key.as_str() {
                "min" => constraints.min = Some(as_f64(v, field, "min")?),
                "max" => constraints.max = Some(as_f64(v, field, "max")?),
                "minLength" => constraints.min_length = Some(as_u64(v, field, "minLength")?),
                "maxLength" => constraints.max_length = Some(as_u64(v, field, "maxLength")?),
                "pattern" => match v {
                    Value::String(s) => constraints.pattern = Some(s.clone()),
                    _ => return Err(invalid(field, "pattern", "expected a string")),
                },
                "enum" => match v {
                    Value::Array(items) => constraints.enum_values = Some(items.clone()),
                    _ => return Err(invalid(field, "enum", "expected an array")),
                },
                _ => {}
            }
        }
        Ok(constraints)
    }
}

fn as_f64(value: &Value, field: &str, constraint: &str) -> Result<f64, SchemaError> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::SignedInt(n) => Ok(*n as f64),
        Value::UnsignedInt(n) => Ok(*n as f64),
        _ => Err(invalid(field, constraint, "expected a number")),
    }
}

fn as_u64(value: &Value, field: &str, constraint: &str) -> Result<u64, SchemaError> {
    match value {
        Value::UnsignedInt(n) => Ok(*n),
        Value::SignedInt(n) if *n >= 0 => Ok(*n as u64),
        _ => Err(invalid(field, constraint, "expected a non-negative integer")),
    }
}

/// One declared field of a Schema (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name, matched against Map keys during validation.
    pub name: String,
    /// Declared type name, drawn from §3's type-name set.
    pub type_name: String,
    /// Whether the field must be present.
    pub required: bool,
    /// Default value substituted when absent and required.
    pub default: Option<Value>,
    /// Human-readable description.
    pub description: Option<String>,
    /// Constraints evaluated against the field's value.
    pub constraints: Option<Constraints>,
}

impl Field {
    /// Construct a required field with no default, description, or constraints.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            required: true,
            default: None,
            description: None,
            constraints: None,
        }
    }

    /// Mark the field optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Attach a default value, substituted when the field is absent.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Attach a human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach constraints.
    #[must_use]
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    fn to_value(&self) -> Value {
        let mut entries = vec![
            ("name".to_string(), Value::String(self.name.clone())),
            ("type".to_string(), Value::String(self.type_name.clone())),
            ("required".to_string(), Value::Bool(self.required)),
        ];
        if let Some(default) = &self.default {
            entries.push(("default".to_string(), default.clone()));
        }
        if let Some(description) = &self.description {
            entries.push(("description".to_string(), Value::String(description.clone())));
        }
        if let Some(constraints) = &self.constraints {
            entries.push(("constraints".to_string(), constraints.to_value()));
        }
        Value::Map(entries)
    }

    fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let Some(entries) = value.as_map() else {
            return Err(invalid("fields[]", "field", "expected a map"));
        };
        let name = match value.get("name") {
            Some(Value::String(s)) => s.clone(),
            _ => return Err(invalid("fields[]", "name", "expected a string")),
        };
        let type_name = match value.get("type") {
            Some(Value::String(s)) => s.clone(),
            _ => return Err(invalid(&name, "type", "expected a string")),
        };
        let required = match value.get("required") {
            Some(Value::Bool(b)) => *b,
            None => true,
            _ => return Err(invalid(&name, "required", "expected a bool")),
        };
        let default = value.get("default").cloned();
        let description = match value.get("description") {
            Some(Value::String(s)) => Some(s.clone()),
            None => None,
            _ => return Err(invalid(&name, "description", "expected a string")),
        };
        let constraints = match entries.iter().find(|(k, _)| k == "constraints") {
            Some((_, v)) => Some(Constraints::from_value(v, &name)?),
            None => None,
        };
        Ok(Self {
            name,
            type_name,
            required,
            default,
            description,
            constraints,
        })
    }
}

/// A named, versioned schema: fields, evolution policy, and metadata (§3).
///
/// Migration functions themselves are not part of the model — they are not
/// values that can round-trip through the codec — and live in
/// [`crate::registry::Registry`] instead, keyed by `(name, from, to)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// Schema name.
    pub name: String,
    /// Schema version.
    pub version: Version,
    /// Human-readable description.
    pub description: Option<String>,
    /// Evolution policy used by `validate` and `is_compatible_with`.
    pub evolution_strategy: EvolutionStrategy,
    /// Declared fields, in declaration order.
    pub fields: Vec<Field>,
    /// Free-form metadata, not interpreted by the validator.
    pub metadata: Vec<(String, Value)>,
}

impl Schema {
    /// Start building a schema with default version `1.0.0`, FLEXIBLE
    /// evolution, no fields, and no metadata.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: Version::default(),
            description: None,
            evolution_strategy: EvolutionStrategy::Flexible,
            fields: Vec::new(),
            metadata: Vec::new(),
        }
    }

    /// Set the version.
    #[must_use]
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the evolution strategy.
    #[must_use]
    pub fn with_evolution_strategy(mut self, strategy: EvolutionStrategy) -> Self {
        self.evolution_strategy = strategy;
        self
    }

    /// Append a field.
    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.push((key.into(), value));
        self
    }

    /// Look up a declared field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Encode this schema as the `Value` layout of §6.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut entries = vec![
            ("name".to_string(), Value::String(self.name.clone())),
            ("version".to_string(), Value::String(self.version.to_string())),
            (
                "evolution_strategy".to_string(),
                Value::String(self.evolution_strategy.as_str().to_string()),
            ),
            (
                "fields".to_string(),
                Value::Array(self.fields.iter().map(Field::to_value).collect()),
            ),
            ("metadata".to_string(), Value::Map(self.metadata.clone())),
        ];
        if let Some(description) = &self.description {
            entries.push(("description".to_string(), Value::String(description.clone())));
        }
        Value::Map(entries)
    }

    /// Parse a schema back out of its `Value` encoding. Round-tripping
    /// `to_value` through this must be the identity (§6).
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        if value.as_map().is_none() {
            return Err(invalid("$", "schema", "expected a map"));
        }
        let name = match value.get("name") {
            Some(Value::String(s)) => s.clone(),
            _ => return Err(invalid("$", "name", "expected a string")),
        };
        let version = match value.get("version") {
            Some(Value::String(s)) => s.parse()?,
            _ => return Err(invalid(&name, "version", "expected a string")),
        };
        let evolution_strategy = match value.get("evolution_strategy") {
            Some(Value::String(s)) => s.parse()?,
            None => EvolutionStrategy::Flexible,
            _ => return Err(invalid(&name, "evolution_strategy", "expected a string")),
        };
        let fields = match value.get("fields") {
            Some(Value::Array(items)) => items
                .iter()
                .map(Field::from_value)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
            _ => return Err(invalid(&name, "fields", "expected an array")),
        };
        let metadata = match value.get("metadata") {
            Some(Value::Map(entries)) => entries.clone(),
            None => Vec::new(),
            _ => return Err(invalid(&name, "metadata", "expected a map")),
        };
        let description = match value.get("description") {
            Some(Value::String(s)) => Some(s.clone()),
            None => None,
            _ => return Err(invalid(&name, "description", "expected a string")),
        };
        Ok(Self {
            name,
            version,
            description,
            evolution_strategy,
            fields,
            metadata,
        })
    }
}

fn invalid(path: &str, field: &str, reason: &str) -> SchemaError {
    SchemaError::InvalidSchemaValue {
        path: format!("{path}.{field}"),
        reason: reason.to_string(),
    }
}
