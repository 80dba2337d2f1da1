//! Dotted-path access into records (`"address.city"`, `"tags.0"`).

use crate::error::ModelError;
use serde_json::{Map, Value};

fn segments(path: &str) -> Result<Vec<&str>, ModelError> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|part| part.is_empty()) {
        return Err(ModelError::InvalidPath {
            path: path.to_string(),
            reason: "empty segment".to_string(),
        });
    }
    Ok(parts)
}

fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn child_mut<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
        _ => None,
    }
}

/// Reads the value at `path`; `None` when any segment is missing.
pub fn get<'a>(root: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = root.get(parts.next()?)?;
    for segment in parts {
        current = child(current, segment)?;
    }
    Some(current)
}

/// Writes `value` at `path`, creating intermediate objects as needed.
///
/// Fails when a segment is empty or an intermediate value is a scalar.
pub fn set(root: &mut Map<String, Value>, path: &str, value: Value) -> Result<(), ModelError> {
    let parts = segments(path)?;
    let Some((last, parents)) = parts.split_last() else {
        return Err(invalid(path, "empty path"));
    };
    let Some((first, rest)) = parents.split_first() else {
        root.insert((*last).to_string(), value);
        return Ok(());
    };

    let mut current = root
        .entry((*first).to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    for segment in rest {
        current = descend(current, segment, path)?;
    }

    match current {
        Value::Object(map) => {
            map.insert((*last).to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let slot = last
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get_mut(i))
                .ok_or_else(|| invalid(path, &format!("index \"{last}\" out of bounds")))?;
            *slot = value;
            Ok(())
        }
        _ => Err(invalid(path, "parent is not an object")),
    }
}

fn descend<'a>(value: &'a mut Value, segment: &str, path: &str) -> Result<&'a mut Value, ModelError> {
    match value {
        Value::Object(map) => Ok(map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()))),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get_mut(i))
            .ok_or_else(|| invalid(path, &format!("index \"{segment}\" out of bounds"))),
        _ => Err(invalid(path, &format!("\"{segment}\" is not addressable"))),
    }
}

/// Removes and returns the value at `path`.
pub fn unset(root: &mut Map<String, Value>, path: &str) -> Option<Value> {
    let (parent, last) = match path.rsplit_once('.') {
        Some((parent, last)) => (Some(parent), last),
        None => (None, path),
    };
    let Some(parent) = parent else {
        return root.remove(last);
    };

    let mut parts = parent.split('.');
    let mut current = root.get_mut(parts.next()?)?;
    for segment in parts {
        current = child_mut(current, segment)?;
    }
    match current {
        Value::Object(map) => map.remove(last),
        _ => None,
    }
}

fn invalid(path: &str, reason: &str) -> ModelError {
    ModelError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}
