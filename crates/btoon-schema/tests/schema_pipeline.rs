//! End-to-end exercise of inference, validation, compatibility, and
//! migration together (§8's schema properties).

use btoon_core::Value;
use btoon_schema::{infer, is_compatible_with, validate, EvolutionStrategy, InferOptions, Registry, Version};

fn sample_users() -> Vec<Value> {
    vec![
        Value::Map(vec![
            ("id".to_string(), Value::UnsignedInt(1)),
            ("email".to_string(), Value::String("a@example.com".to_string())),
        ]),
        Value::Map(vec![
            ("id".to_string(), Value::UnsignedInt(2)),
            ("email".to_string(), Value::String("b@example.com".to_string())),
        ]),
        Value::Map(vec![
            ("id".to_string(), Value::UnsignedInt(3)),
            ("email".to_string(), Value::String("c@example.com".to_string())),
        ]),
    ]
}

#[test]
fn inferred_schema_validates_every_sample_it_was_built_from() {
    let samples = sample_users();
    let schema = infer(&samples, &InferOptions::default().with_name("User"));
    for sample in &samples {
        let result = validate(sample, &schema);
        assert!(result.valid, "{:?}", result.errors);
    }
}

#[test]
fn additive_compatible_schema_still_accepts_values_valid_under_the_original() {
    let samples = sample_users();
    let base = infer(&samples, &InferOptions::default().with_name("User"))
        .with_evolution_strategy(EvolutionStrategy::Additive);

    let evolved = base.clone().with_field(btoon_schema::Field::new("nickname", "string").optional());
    assert!(is_compatible_with(&base, &evolved));

    for sample in &samples {
        assert!(validate(sample, &evolved).valid);
    }
}

#[test]
fn schema_round_trips_through_the_codec_it_describes() {
    let schema = infer(&sample_users(), &InferOptions::default().with_name("User"));
    let as_value = schema.to_value();
    let bytes = btoon_core::encode(&as_value, &btoon_core::EncodeOptions::default()).unwrap();
    let decoded = btoon_core::decode(&bytes, &btoon_core::DecodeOptions::default()).unwrap();
    let parsed = btoon_schema::Schema::from_value(&decoded).unwrap();
    assert_eq!(parsed, schema);
}

#[test]
fn migrated_value_is_valid_under_the_target_schema() {
    let v1 = btoon_schema::Schema::new("User")
        .with_version(Version::new(1, 0, 0))
        .with_field(btoon_schema::Field::new("id", "uint"));
    let v2 = btoon_schema::Schema::new("User")
        .with_version(Version::new(2, 0, 0))
        .with_field(btoon_schema::Field::new("id", "uint"))
        .with_field(btoon_schema::Field::new("active", "bool").with_default(Value::Bool(true)));

    let mut registry = Registry::new();
    registry.register(v1.clone());
    registry.register(v2.clone());
    registry.register_migration("User", Version::new(1, 0, 0), Version::new(2, 0, 0), |value| {
        let mut entries = value.as_map().unwrap().to_vec();
        entries.push(("active".to_string(), Value::Bool(true)));
        Value::Map(entries)
    });

    let old_value = Value::Map(vec![("id".to_string(), Value::UnsignedInt(7))]);
    let outcome = registry.migrate(&old_value, "User", &Version::new(1, 0, 0), &Version::new(2, 0, 0));
    let migrated = match outcome {
        btoon_schema::MigrationOutcome::Migrated(v) => v,
        _ => panic!("expected a migration to run"),
    };
    assert!(validate(&migrated, &v2).valid);
}
