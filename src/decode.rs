// Response decoding.
//
// Stable list endpoints (terms, groups, assignments) decode straight into
// typed records. The context endpoints have shapes that shift between portal
// releases, so they decode into an open map and individual fields are pulled
// out with typed, path-addressed lookups.

use crate::error::{Result, WhapiError};
use crate::model::Id;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Decode a JSON array of records.
pub fn decode_list<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>> {
    let value: Value = serde_json::from_slice(bytes)?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(WhapiError::decode(
                None,
                format!("expected a JSON array, got {}", kind(&other)),
            ))
        }
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item)
                .map_err(|e| WhapiError::decode(Some(format!("[{}]", i)), e.to_string()))
        })
        .collect()
}

/// Decode a JSON object into a [`ContextMap`].
pub fn decode_map(bytes: &[u8]) -> Result<ContextMap> {
    match serde_json::from_slice::<Value>(bytes)? {
        Value::Object(map) => Ok(ContextMap(map)),
        other => Err(WhapiError::decode(
            None,
            format!("expected a JSON object, got {}", kind(&other)),
        )),
    }
}

/// A loosely shaped JSON object with required-field accessors.
///
/// Paths use dots for keys and `[n]` for array indices, e.g.
/// `Personas[0].Id`. A path that doesn't resolve is a
/// `ContextExtractionFailed`; a path that resolves to the wrong JSON type is a
/// `Decode` error naming the path.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMap(Map<String, Value>);

impl ContextMap {
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = parse_path(path)?.into_iter();
        let first = match segments.next()? {
            Segment::Key(k) => self.0.get(k)?,
            Segment::Index(_) => return None,
        };
        segments.try_fold(first, |value, seg| match seg {
            Segment::Key(k) => value.as_object()?.get(k),
            Segment::Index(i) => value.as_array()?.get(i),
        })
    }

    fn required(&self, path: &str) -> Result<&Value> {
        match self.get(path) {
            Some(Value::Null) | None => Err(WhapiError::missing_field(path)),
            Some(v) => Ok(v),
        }
    }

    pub fn required_str(&self, path: &str) -> Result<String> {
        match self.required(path)? {
            Value::String(s) => Ok(s.clone()),
            other => Err(WhapiError::decode(
                Some(path.to_string()),
                format!("expected string, got {}", kind(other)),
            )),
        }
    }

    pub fn required_id(&self, path: &str) -> Result<Id> {
        let value = self.required(path)?;
        Id::from_json(value).ok_or_else(|| {
            WhapiError::decode(
                Some(path.to_string()),
                format!("expected numeric identifier, got {}", value),
            )
        })
    }
}

enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

fn parse_path(path: &str) -> Option<Vec<Segment<'_>>> {
    let mut out = Vec::new();
    for part in path.split('.') {
        let (key, rest) = match part.find('[') {
            Some(pos) => part.split_at(pos),
            None => (part, ""),
        };
        if !key.is_empty() {
            out.push(Segment::Key(key));
        }
        for idx in rest.split('[').filter(|s| !s.is_empty()) {
            let i = idx.strip_suffix(']')?.parse().ok()?;
            out.push(Segment::Index(i));
        }
    }
    Some(out)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
