//! Block input assembled from command-line flags.

use serde_json::{Map, Value};

use crate::error::InputError;

/// Merge a `--json` object with `--field key=value` overrides.
///
/// Field values are parsed as JSON when possible and kept as strings
/// otherwise, so `limit=20` is a number and `key=my-flag` a string.
pub fn build_input(json: Option<&str>, fields: &[String]) -> Result<Value, InputError> {
    let mut input = match json {
        Some(text) => match serde_json::from_str(text).map_err(InputError::InvalidJson)? {
            Value::Object(map) => map,
            _ => return Err(InputError::NotObject),
        },
        None => Map::new(),
    };

    for field in fields {
        let (key, val) = field
            .split_once('=')
            .ok_or_else(|| InputError::InvalidFieldFormat {
                field: field.clone(),
            })?;
        let value = serde_json::from_str(val).unwrap_or_else(|_| Value::String(val.to_string()));
        input.insert(key.to_string(), value);
    }

    Ok(Value::Object(input))
}
