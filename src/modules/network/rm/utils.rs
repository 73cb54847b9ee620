//! Path access and merge helpers over fact trees
//!
//! Fact trees are plain `serde_json::Value`s. Attributes are addressed with
//! dotted paths (`"ip.domain_name"`, `"send_community.extended"`).

use serde_json::{Map, Value};

/// Fetch the value at a dotted path. `null` is treated as absent.
pub fn get_from_dict<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = data;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Fetch the value at a dotted path, yielding `null` when absent.
pub fn get_or_null<'a>(data: &'a Value, path: &str) -> &'a Value {
    static NULL: Value = Value::Null;
    get_from_dict(data, path).unwrap_or(&NULL)
}

/// Set the value at a dotted path, creating intermediate mappings.
///
/// Non-mapping intermediates are replaced.
pub fn set_in_dict(data: &mut Value, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = data;
    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            unreachable!("replaced with an object above");
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

/// Remove the value at a dotted path, returning it.
pub fn remove_from_dict(data: &mut Value, path: &str) -> Option<Value> {
    let (parent, leaf) = match path.rsplit_once('.') {
        Some((parent, leaf)) => (Some(parent), leaf),
        None => (None, path),
    };
    let container = match parent {
        Some(parent) => {
            let mut current = data;
            for segment in parent.split('.') {
                current = current.as_object_mut()?.get_mut(segment)?;
            }
            current
        }
        None => data,
    };
    container.as_object_mut()?.shift_remove(leaf)
}

/// Whether a value carries no configuration: `null`, `""`, `[]` or `{}`.
///
/// `false` and `0` are configuration and are not empty.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Recursively drop empty values from mappings and lists.
pub fn remove_empties(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), remove_empties(v)))
                .filter(|(_, v)| !is_empty(v))
                .collect();
            Value::Object(cleaned)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(remove_empties)
                .filter(|v| !is_empty(v))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Merge `other` into `base` in place.
///
/// Policy:
/// - scalars in `other` overwrite scalars in `base`; `null` never overwrites
/// - mappings merge recursively
/// - lists append: elements of `other` not already present in `base` are
///   pushed in order, so an attribute that recurs across many lines grows
///   one element per line
pub fn merge_into(base: &mut Value, other: Value) {
    match (base, other) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(other_map)) => {
            for (key, value) in other_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        if !value.is_null() {
                            base_map.insert(key, value);
                        }
                    }
                }
            }
        }
        (Value::Array(base_items), Value::Array(other_items)) => {
            for item in other_items {
                if !base_items.contains(&item) {
                    base_items.push(item);
                }
            }
        }
        (base, other) => *base = other,
    }
}

/// Non-destructive form of [`merge_into`]: `other` layered over `base`.
///
/// Used for the merged state, where want is laid over have.
pub fn dict_merge(base: &Value, other: &Value) -> Value {
    let mut merged = base.clone();
    merge_into(&mut merged, other.clone());
    merged
}

/// Render a scalar as the string used in synthetic keys and templates.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Store a numeric `field` as a string. Attributes the device reports as
/// free text (`mtu`, AS numbers) may be written as integers in want.
pub fn stringify_field(entry: &mut Value, field: &str) {
    if let Some(slot) = entry.get_mut(field) {
        if let Some(n) = slot.as_number().map(|n| n.to_string()) {
            *slot = Value::String(n);
        }
    }
}

/// Store a digit-only string `value` as an integer.
pub fn integer_value(value: &mut Value) {
    if let Some(n) = value.as_str().and_then(|s| s.trim().parse::<u64>().ok()) {
        *value = Value::from(n);
    }
}

/// [`integer_value`] applied to `field` of `entry`.
pub fn integer_field(entry: &mut Value, field: &str) {
    if let Some(slot) = entry.get_mut(field) {
        integer_value(slot);
    }
}
