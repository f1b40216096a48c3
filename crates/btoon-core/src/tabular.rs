//! Columnar tabular extension (C5): encodes a homogeneous array of maps as
//! ext tag `-10` with a column-major body instead of row-major generic
//! array/map nesting (§4.5).
//!
//! Eligibility (open questions 3/4): at least two elements, every element a
//! `Map`, every map sharing the same key set, every cell a primitive
//! (`Nil`/`Bool`/`SignedInt`/`UnsignedInt`/`Float`/`String`). An empty array
//! is never tabular-eligible — there is no row to derive a column list from.

use std::collections::BTreeSet;

use crate::decode::{decode_value, DecodeCtx};
use crate::encode::{encode_value, EncodeOptions};
use crate::error::CodecError;
use crate::ext::TAG_TABULAR;
use crate::io::{Reader, Writer};
use crate::value::Value;

const BODY_VERSION: u32 = 1;

fn is_primitive_cell(value: &Value) -> bool {
    matches!(
        value,
        Value::Nil
            | Value::Bool(_)
            | Value::SignedInt(_)
            | Value::UnsignedInt(_)
            | Value::Float(_)
            | Value::String(_)
    )
}

fn cell_type_tag(value: &Value) -> u8 {
    match value {
        Value::Nil => 0,
        Value::Bool(_) => 1,
        Value::SignedInt(_) => 2,
        Value::UnsignedInt(_) => 3,
        Value::Float(_) => 4,
        Value::String(_) => 5,
        _ => 0,
    }
}

/// Whether `items` qualifies for columnar tabular encoding.
#[must_use]
pub fn is_tabular(items: &[Value]) -> bool {
    if items.len() < 2 {
        return false;
    }
    let mut first_keys: Option<BTreeSet<&str>> = None;
    for item in items {
        let Value::Map(entries) = item else {
            return false;
        };
        if !entries.iter().all(|(_, v)| is_primitive_cell(v)) {
            return false;
        }
        let keys: BTreeSet<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        if keys.len() != entries.len() {
            // A duplicate key within one row's map; not well-formed enough
            // to treat as a table column set.
            return false;
        }
        match &first_keys {
            None => first_keys = Some(keys),
            Some(expected) if expected == &keys => {}
            Some(_) => return false,
        }
    }
    true
}

/// Encode a tabular-eligible array, returning the extension `(tag, body)`.
pub(crate) fn encode_tabular(
    items: &[Value],
    options: &EncodeOptions,
) -> Result<(i8, Vec<u8>), CodecError> {
    let columns: Vec<&str> = match &items[0] {
        Value::Map(entries) => entries.iter().map(|(k, _)| k.as_str()).collect(),
        Value::Nil
        | Value::Bool(_)
        | Value::SignedInt(_)
        | Value::UnsignedInt(_)
        | Value::Float(_)
        | Value::String(_)
        | Value::Binary(_)
        | Value::Array(_)
        | Value::Timestamp(_)
        | Value::Date(_)
        | Value::DateTime(_)
        | Value::BigInt(_)
        | Value::VectorFloat(_)
        | Value::VectorDouble(_)
        | Value::Extension(_, _) => {
            return Err(CodecError::Unencodable {
                type_name: "tabular",
                reason: "first element is not a map",
            })
        }
    };

    let mut w = Writer::default();
    w.write_u32(BODY_VERSION);
    w.write_u32(u32::try_from(columns.len()).map_err(|_| too_many("columns", columns.len()))?);
    for name in &columns {
        w.write_u32(u32::try_from(name.len()).map_err(|_| too_many("column name", name.len()))?);
        w.write_bytes(name.as_bytes());
    }
    let first_row = match &items[0] {
        Value::Map(entries) => entries,
        _ => unreachable!("checked above"),
    };
    for name in &columns {
        let cell = first_row
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
            .unwrap_or(&Value::Nil);
        w.write_u8(cell_type_tag(cell));
    }
    w.write_u32(u32::try_from(items.len()).map_err(|_| too_many("rows", items.len()))?);
    for row in items {
        let Value::Map(entries) = row else {
            return Err(CodecError::Unencodable {
                type_name: "tabular",
                reason: "row is not a map",
            });
        };
        for name in &columns {
            let cell = entries
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v)
                .unwrap_or(&Value::Nil);
            encode_value(cell, &mut w, options)?;
        }
    }
    Ok((TAG_TABULAR, w.into_vec()))
}

fn too_many(kind: &'static str, len: usize) -> CodecError {
    CodecError::SizeExceeded {
        offset: 0,
        kind,
        len: len as u64,
        limit: u64::from(u32::MAX),
    }
}

/// Decode a tabular extension body back into an `Array` of `Map`s.
///
/// Cells are stored with their own full markers (open question 1), so a
/// column's declared `type_tag` is metadata only; decoding trusts the cell's
/// own marker, not the header.
pub(crate) fn decode_tabular(body: &[u8], ctx: &mut DecodeCtx<'_>) -> Result<Value, CodecError> {
    let mut reader = Reader::new(body);
    let version = reader.read_u32()?;
    if version != BODY_VERSION {
        return Err(CodecError::InvalidFrame {
            reason: "unsupported tabular body version",
        });
    }
    let num_columns = reader.read_u32()? as usize;
    let mut columns = Vec::with_capacity(num_columns.min(4096));
    for _ in 0..num_columns {
        let name_len = reader.read_u32()? as usize;
        let name = reader.read_str(name_len)?.to_string();
        columns.push(name);
    }
    // Column type tags are read and discarded: the cells below carry their
    // own markers, which is what decoding actually relies on.
    for _ in 0..num_columns {
        reader.read_u8()?;
    }
    let num_rows = reader.read_u32()? as usize;
    let mut rows = Vec::with_capacity(num_rows.min(4096));
    for _ in 0..num_rows {
        let mut entries = Vec::with_capacity(num_columns);
        for name in &columns {
            let value = decode_value(&mut reader, ctx)?;
            entries.push((name.clone(), value));
        }
        rows.push(Value::Map(entries));
    }
    Ok(Value::Array(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DecodeOptions;

    fn sample() -> Vec<Value> {
        vec![
            Value::Map(vec![
                ("id".into(), Value::UnsignedInt(1)),
                ("name".into(), Value::String("a".into())),
            ]),
            Value::Map(vec![
                ("id".into(), Value::UnsignedInt(2)),
                ("name".into(), Value::String("b".into())),
            ]),
        ]
    }

    #[test]
    fn single_element_array_is_not_tabular() {
        assert!(!is_tabular(&sample()[..1]));
    }

    #[test]
    fn mismatched_key_sets_are_not_tabular() {
        let items = vec![
            Value::Map(vec![("a".into(), Value::Nil)]),
            Value::Map(vec![("b".into(), Value::Nil)]),
        ];
        assert!(!is_tabular(&items));
    }

    #[test]
    fn nested_container_cell_is_not_tabular() {
        let items = vec![
            Value::Map(vec![("a".into(), Value::Array(vec![]))]),
            Value::Map(vec![("a".into(), Value::Array(vec![]))]),
        ];
        assert!(!is_tabular(&items));
    }

    #[test]
    fn eligible_array_round_trips_through_tabular_body() {
        let items = sample();
        assert!(is_tabular(&items));
        let options = EncodeOptions::default();
        let (tag, body) = encode_tabular(&items, &options).unwrap();
        assert_eq!(tag, TAG_TABULAR);

        let decode_options = DecodeOptions::default();
        let mut ctx = DecodeCtx {
            options: &decode_options,
            depth: 0,
            total_size: 0,
        };
        let decoded = decode_tabular(&body, &mut ctx).unwrap();
        assert_eq!(decoded, Value::Array(items));
    }
}
