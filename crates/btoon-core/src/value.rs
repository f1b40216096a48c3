//! The in-memory value model (C7): a recursive sum type plus structural
//! equality and type-name introspection (§3).

/// A decoded or to-be-encoded BTOON value.
///
/// `Array` and `Map` own their elements transitively; `Extension` and
/// `Binary` own their byte payloads. There is no cyclic representation at
/// this layer — the format is a tree.
#[derive(Debug, Clone)]
pub enum Value {
    /// The absence of a value.
    Nil,
    /// A boolean.
    Bool(bool),
    /// A signed 64-bit integer, as read off a signed wire marker.
    SignedInt(i64),
    /// An unsigned 64-bit integer, as read off an unsigned wire marker.
    UnsignedInt(u64),
    /// An IEEE-754 binary64 float.
    Float(f64),
    /// A well-formed UTF-8 string.
    String(String),
    /// Arbitrary bytes.
    Binary(Vec<u8>),
    /// An ordered sequence of values.
    Array(Vec<Value>),
    /// An ordered sequence of string-keyed entries. Keys are unique within
    /// one Map (enforced on decode in strict mode); order is not
    /// semantically significant (see `PartialEq`).
    Map(Vec<(String, Value)>),
    /// Signed seconds since the Unix epoch.
    Timestamp(i64),
    /// Signed milliseconds.
    Date(i64),
    /// Signed nanoseconds.
    DateTime(i64),
    /// An opaque big-endian two's-complement integer of arbitrary width.
    BigInt(Vec<u8>),
    /// A vector of IEEE-754 binary32 floats.
    VectorFloat(Vec<f32>),
    /// A vector of IEEE-754 binary64 floats.
    VectorDouble(Vec<f64>),
    /// An extension with a user or unrecognized-reserved type tag and an
    /// opaque byte payload.
    Extension(i8, Vec<u8>),
}

impl Value {
    /// The type name used by the schema layer's "type" field and by
    /// `Constraints`/type-check error messages. Matches the names in §3's
    /// Field `type-name` enumeration where one exists; container and
    /// extension-typed variants get a descriptive name of their own.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::SignedInt(_) => "int",
            Value::UnsignedInt(_) => "uint",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Timestamp(_) => "timestamp",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::BigInt(_) => "bigint",
            Value::VectorFloat(_) => "vector_float",
            Value::VectorDouble(_) => "vector_double",
            Value::Extension(_, _) => "extension",
        }
    }

    /// Whether this value matches the schema type name `name` (§4.7 step 3).
    /// `"any"` matches unconditionally; `"number"` matches any of the three
    /// numeric variants.
    #[must_use]
    pub fn matches_type_name(&self, name: &str) -> bool {
        match name {
            "any" => true,
            "number" => matches!(
                self,
                Value::SignedInt(_) | Value::UnsignedInt(_) | Value::Float(_)
            ),
            other => self.type_name() == other,
        }
    }

    /// Borrow the map entries if this is a `Map`.
    #[must_use]
    pub fn as_map(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Borrow the array elements if this is an `Array`.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a key in a `Map` value. Returns `None` for non-maps too.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

/// Structural equality. `Map` compares as a key-set plus value mapping,
/// independent of entry order (§5's ordering guarantee: two encodings that
/// differ only in map-entry order must decode to equal values). Floats
/// compare by bit pattern, so a round-tripped NaN equals itself.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::SignedInt(a), Value::SignedInt(b)) => a == b,
            (Value::UnsignedInt(a), Value::UnsignedInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.iter().any(|(k2, v2)| k == k2 && v == v2))
            }
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::VectorFloat(a), Value::VectorFloat(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (Value::VectorDouble(a), Value::VectorDouble(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (Value::Extension(ta, ba), Value::Extension(tb, bb)) => ta == tb && ba == bb,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::SignedInt(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::UnsignedInt(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_equality_ignores_entry_order() {
        let a = Value::Map(vec![
            ("name".into(), Value::String("Alice".into())),
            ("age".into(), Value::UnsignedInt(30)),
        ]);
        let b = Value::Map(vec![
            ("age".into(), Value::UnsignedInt(30)),
            ("name".into(), Value::String("Alice".into())),
        ]);
        assert_eq!(a, b);
    }

    #[test]
    fn number_type_name_matches_all_numeric_variants() {
        assert!(Value::SignedInt(-1).matches_type_name("number"));
        assert!(Value::UnsignedInt(1).matches_type_name("number"));
        assert!(Value::Float(1.5).matches_type_name("number"));
        assert!(!Value::String("x".into()).matches_type_name("number"));
    }
}
