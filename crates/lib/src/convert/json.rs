//! JSON and NDJSON to CSV.
//!
//! JSON input is a top-level array of objects, or a `key`-selected array
//! inside a top-level object. NDJSON is one object per line. In both cases
//! the output header is the union of keys in first-seen order; missing
//! values become empty fields.

use serde_json::Value;
use tabcast_helpers::IndexSet;
use tabcast_lib_core::errors::{Result, TabError};

use crate::writer::write_row;

pub fn convert_json(bytes: &[u8], key: Option<&str>) -> Result<Vec<u8>> {
    let root: Value = serde_json::from_slice(bytes)
        .map_err(|e| TabError::Format(format!("invalid JSON: {e}")))?;

    let array = match key {
        Some(key) => match &root {
            Value::Object(map) => match map.get(key) {
                Some(Value::Array(items)) => items.clone(),
                Some(_) => {
                    return Err(TabError::Format(format!(
                        "the value under key {key:?} is not an array"
                    )))
                }
                None => {
                    return Err(TabError::Format(format!(
                        "no top-level key {key:?} in the JSON input"
                    )))
                }
            },
            _ => {
                return Err(TabError::Format(
                    "a --key selection needs a top-level JSON object".into(),
                ))
            }
        },
        None => match root {
            Value::Array(items) => items,
            // a single object converts as a one-row table
            Value::Object(_) => vec![root],
            _ => {
                return Err(TabError::Format(
                    "the top level of the JSON input must be an array of objects".into(),
                ))
            }
        },
    };

    objects_to_csv(&array)
}

pub fn convert_ndjson(text: &str) -> Result<Vec<u8>> {
    let mut items = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).map_err(|e| {
            TabError::Format(format!("invalid JSON on line {}: {e}", i + 1))
        })?;
        items.push(value);
    }
    objects_to_csv(&items)
}

fn objects_to_csv(items: &[Value]) -> Result<Vec<u8>> {
    let mut header: IndexSet<String> = IndexSet::default();
    for item in items {
        let Value::Object(map) = item else {
            return Err(TabError::Format(
                "every element must be a JSON object".into(),
            ));
        };
        for key in map.keys() {
            header.insert(key.clone());
        }
    }

    let mut out = Vec::new();
    write_row(&mut out, header.iter())?;
    for item in items {
        let map = item.as_object().expect("checked above");
        let fields: Vec<String> = header
            .iter()
            .map(|key| map.get(key).map(scalar_text).unwrap_or_default())
            .collect();
        write_row(&mut out, fields.iter())?;
    }
    Ok(out)
}

/// Scalar JSON values become plain cell text; nested values carry their raw
/// JSON rendering.
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "True".into(),
        Value::Bool(false) => "False".into(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        nested => nested.to_string(),
    }
}
