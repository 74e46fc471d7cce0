use std::collections::BTreeMap;
use std::iter::FromIterator;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::errors::{ErrorInfo, SxqError};

fn serde_error(code: &str, err: impl ToString) -> SxqError {
    SxqError::Serde(ErrorInfo::new(code, err.to_string()))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let ordered = map
                .into_iter()
                .map(|(key, value)| (key, canonicalize(value)))
                .collect::<BTreeMap<_, _>>();
            Value::Object(Map::from_iter(ordered))
        }
        Value::Array(values) => Value::Array(values.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Serializes a value into JSON bytes with keys sorted at every level.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, SxqError> {
    let value = serde_json::to_value(value).map_err(|err| serde_error("json_serialize", err))?;
    let mut bytes = Vec::new();
    serde_json::to_writer(&mut bytes, &canonicalize(value))
        .map_err(|err| serde_error("json_write", err))?;
    Ok(bytes)
}

/// Serializes a value into a canonical single-line JSON string.
pub fn to_canonical_json_string<T: Serialize>(value: &T) -> Result<String, SxqError> {
    let bytes = to_canonical_json_bytes(value)?;
    String::from_utf8(bytes).map_err(|err| serde_error("json_utf8", err))
}

/// Deserializes a value from JSON bytes.
pub fn from_json_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, SxqError> {
    serde_json::from_slice(data).map_err(|err| serde_error("json_deserialize", err))
}

/// Serializes a value into YAML.
pub fn to_yaml_string<T: Serialize>(value: &T) -> Result<String, SxqError> {
    serde_yaml::to_string(value).map_err(|err| serde_error("yaml_serialize", err))
}

/// Deserializes a YAML payload into the requested type.
pub fn from_yaml_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, SxqError> {
    serde_yaml::from_slice(data).map_err(|err| serde_error("yaml_deserialize", err))
}
