//! Registry + migrations (C10): named, versioned schema storage and
//! direct-edge migration functions (§4.9).

use std::collections::{BTreeMap, HashMap};

use btoon_core::Value;

use crate::model::{Schema, Version};
use crate::validate::validate;

/// A registered value-to-value migration function.
pub type MigrationFn = Box<dyn Fn(&Value) -> Value + Send + Sync>;

/// Outcome of a [`Registry::migrate`] call.
pub enum MigrationOutcome {
    /// The value was already at the target version.
    Unchanged(Value),
    /// A registered migration ran and produced a new value.
    Migrated(Value),
    /// No migration edge is registered for the requested (from, to) pair.
    NoPath,
}

/// Holds every version of every named schema, plus the direct-edge
/// migration functions registered between them. Reads are safe to share
/// across threads; writes (`register`, `remove`, `clear`,
/// `register_migration`) require exclusive access (§5).
#[derive(Default)]
pub struct Registry {
    schemas: BTreeMap<String, BTreeMap<Version, Schema>>,
    migrations: HashMap<(String, Version, Version), MigrationFn>,
}

impl Registry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema version. Replaces any existing schema with the
    /// same name and version.
    pub fn register(&mut self, schema: Schema) {
        self.schemas
            .entry(schema.name.clone())
            .or_default()
            .insert(schema.version, schema);
    }

    /// Remove one schema version. Returns it if it was present.
    pub fn remove(&mut self, name: &str, version: &Version) -> Option<Schema> {
        let versions = self.schemas.get_mut(name)?;
        let removed = versions.remove(version);
        if versions.is_empty() {
            self.schemas.remove(name);
        }
        removed
    }

    /// Remove every registered schema and migration.
    pub fn clear(&mut self) {
        self.schemas.clear();
        self.migrations.clear();
    }

    /// Look up an exact (name, version) pair.
    #[must_use]
    pub fn get(&self, name: &str, version: &Version) -> Option<&Schema> {
        self.schemas.get(name)?.get(version)
    }

    /// Look up the highest registered version for `name`.
    #[must_use]
    pub fn get_latest(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)?.values().next_back()
    }

    /// Whether `value` validates against at least one registered schema.
    /// A `$schema` string key on the value is consulted first as a hint
    /// naming which schema to try; if that schema is absent or does not
    /// validate, every registered schema is tried in turn.
    #[must_use]
    pub fn validate(&self, value: &Value) -> bool {
        if let Some(Value::String(hint)) = value.get("$schema") {
            if let Some(schema) = self.get_latest(hint) {
                if validate(value, schema).valid {
                    return true;
                }
            }
        }
        self.schemas
            .values()
            .flat_map(BTreeMap::values)
            .any(|schema| validate(value, schema).valid)
    }

    /// Register a migration function for the direct edge `(from, to)`.
    pub fn register_migration(
        &mut self,
        name: impl Into<String>,
        from: Version,
        to: Version,
        f: impl Fn(&Value) -> Value + Send + Sync + 'static,
    ) {
        self.migrations.insert((name.into(), from, to), Box::new(f));
    }

    /// Migrate `value` from `from` to `to` under the schema named `name`.
    #[must_use]
    pub fn migrate(&self, value: &Value, name: &str, from: &Version, to: &Version) -> MigrationOutcome {
        if from == to {
            return MigrationOutcome::Unchanged(value.clone());
        }
        match self
            .migrations
            .get(&(name.to_string(), *from, *to))
        {
            Some(f) => MigrationOutcome::Migrated(f(value)),
            None => MigrationOutcome::NoPath,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Field;

    #[test]
    fn registers_and_looks_up_latest() {
        let mut registry = Registry::new();
        registry.register(Schema::new("Person").with_version(Version::new(1, 0, 0)));
        registry.register(Schema::new("Person").with_version(Version::new(2, 0, 0)));
        assert_eq!(registry.get_latest("Person").unwrap().version, Version::new(2, 0, 0));
    }

    #[test]
    fn validate_uses_schema_hint_first() {
        let mut registry = Registry::new();
        registry.register(Schema::new("Person").with_field(Field::new("name", "string")));
        let value = Value::Map(vec![
            ("$schema".into(), Value::String("Person".into())),
            ("name".into(), Value::String("Alice".into())),
        ]);
        assert!(registry.validate(&value));
    }

    #[test]
    fn migrate_reports_no_path_when_unregistered() {
        let registry = Registry::new();
        let outcome = registry.migrate(
            &Value::Nil,
            "Person",
            &Version::new(1, 0, 0),
            &Version::new(2, 0, 0),
        );
        assert!(matches!(outcome, MigrationOutcome::NoPath));
    }

    #[test]
    fn migrate_runs_registered_edge() {
        let mut registry = Registry::new();
        registry.register_migration("Person", Version::new(1, 0, 0), Version::new(2, 0, 0), |v| {
            let mut entries = v.as_map().unwrap().to_vec();
            entries.push(("migrated".into(), Value::Bool(true)));
            Value::Map(entries)
        });
        let outcome = registry.migrate(
            &Value::Map(vec![]),
            "Person",
            &Version::new(1, 0, 0),
            &Version::new(2, 0, 0),
        );
        match outcome {
            MigrationOutcome::Migrated(v) => assert_eq!(v.get("migrated"), Some(&Value::Bool(true))),
            _ => panic!("expected Migrated"),
        }
    }
}
