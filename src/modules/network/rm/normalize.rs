//! Tree normalizer
//!
//! Lists in user configuration are compared by identity, not by position.
//! Normalising converts every list the resource declares into a mapping
//! keyed by each element's natural key, recursively. Normalising an already
//! normalised tree returns it unchanged.

use super::utils::{get_from_dict, scalar_to_string, set_in_dict};
use super::{RmError, RmResult};
use serde_json::{Map, Value};
use tracing::warn;

/// How the elements of a list are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySpec {
    /// One identifying field
    Field(&'static str),
    /// Several identifying fields, joined as `f1=v1|f2=v2` over the fields
    /// present in the element
    Composite(&'static [&'static str]),
    /// Scalar elements are their own key
    Value,
}

impl KeySpec {
    /// Compute the key for one list element.
    pub fn key_for(&self, item: &Value, path: &str) -> RmResult<String> {
        match self {
            KeySpec::Value => scalar_to_string(item).ok_or_else(|| {
                RmError::schema(path, format!("expected a scalar list element, found {}", item))
            }),
            KeySpec::Field(field) => {
                ensure_mapping(item, path)?;
                get_from_dict(item, field)
                    .and_then(scalar_to_string)
                    .ok_or_else(|| RmError::schema(path, format!("element is missing key '{}'", field)))
            }
            KeySpec::Composite(fields) => {
                ensure_mapping(item, path)?;
                let parts: Vec<String> = fields
                    .iter()
                    .filter_map(|field| {
                        get_from_dict(item, field)
                            .and_then(scalar_to_string)
                            .map(|v| format!("{}={}", field, v))
                    })
                    .collect();
                if parts.is_empty() {
                    return Err(RmError::schema(
                        path,
                        format!("element has none of the key fields {}", fields.join(", ")),
                    ));
                }
                Ok(parts.join("|"))
            }
        }
    }
}

fn ensure_mapping(item: &Value, path: &str) -> RmResult<()> {
    if item.is_object() {
        Ok(())
    } else {
        Err(RmError::schema(path, format!("expected a mapping, found {}", item)))
    }
}

/// A list-valued attribute of an entry.
#[derive(Debug, Clone, Copy)]
pub struct ListSpec {
    /// Dotted path of the list within its entry
    pub field: &'static str,
    pub key: KeySpec,
    /// Lists nested inside each element
    pub children: &'static [ListSpec],
}

impl ListSpec {
    pub const fn new(field: &'static str, key: KeySpec) -> Self {
        Self {
            field,
            key,
            children: &[],
        }
    }

    pub const fn with_children(mut self, children: &'static [ListSpec]) -> Self {
        self.children = children;
        self
    }
}

/// Normalisation plan for one resource.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    /// Key of top-level entries; `None` for single-entry resources
    root: Option<KeySpec>,
    lists: &'static [ListSpec],
}

impl Normalizer {
    /// A resource configured as a list of entries.
    pub const fn keyed(root: KeySpec, lists: &'static [ListSpec]) -> Self {
        Self {
            root: Some(root),
            lists,
        }
    }

    /// A resource configured as one mapping.
    pub const fn single(lists: &'static [ListSpec]) -> Self {
        Self { root: None, lists }
    }

    pub fn is_keyed(&self) -> bool {
        self.root.is_some()
    }

    /// Convert schema form into keyed form.
    pub fn normalize(&self, config: &Value) -> RmResult<Value> {
        match self.root {
            Some(key) => {
                let mut entries = keyed_map(config, key, "config")?;
                for (name, entry) in entries.iter_mut() {
                    normalize_entry(entry, self.lists, &format!("config.{}", name))?;
                }
                Ok(Value::Object(entries))
            }
            None => match config {
                Value::Null => Ok(Value::Object(Map::new())),
                Value::Object(_) => {
                    let mut entry = config.clone();
                    normalize_entry(&mut entry, self.lists, "config")?;
                    Ok(entry)
                }
                other => Err(RmError::schema(
                    "config",
                    format!("expected a mapping, found {}", other),
                )),
            },
        }
    }

    /// Convert keyed form back into schema form.
    pub fn denormalize(&self, config: &Value) -> Value {
        match (self.root, config) {
            (Some(_), Value::Object(entries)) => Value::Array(
                entries
                    .values()
                    .map(|entry| denormalize_entry(entry, self.lists))
                    .collect(),
            ),
            (Some(_), Value::Array(_)) => config.clone(),
            (Some(_), _) => Value::Array(Vec::new()),
            (None, entry) => denormalize_entry(entry, self.lists),
        }
    }
}

/// Key a list (or accept an already keyed mapping).
fn keyed_map(value: &Value, key: KeySpec, path: &str) -> RmResult<Map<String, Value>> {
    match value {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map.clone()),
        Value::Array(items) => {
            let mut map = Map::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{}[{}]", path, i);
                let k = key.key_for(item, &item_path)?;
                if map.insert(k.clone(), item.clone()).is_some() {
                    warn!(path = %item_path, key = %k, "Duplicate list key; later element wins");
                }
            }
            Ok(map)
        }
        other => Err(RmError::schema(
            path,
            format!("expected a list or mapping, found {}", other),
        )),
    }
}

fn normalize_entry(entry: &mut Value, lists: &[ListSpec], path: &str) -> RmResult<()> {
    if !entry.is_object() {
        return Err(RmError::schema(path, format!("expected a mapping, found {}", entry)));
    }
    for spec in lists {
        let Some(value) = get_from_dict(entry, spec.field) else {
            continue;
        };
        let field_path = format!("{}.{}", path, spec.field);
        let mut keyed = keyed_map(value, spec.key, &field_path)?;
        if !spec.children.is_empty() {
            for (k, child) in keyed.iter_mut() {
                normalize_entry(child, spec.children, &format!("{}.{}", field_path, k))?;
            }
        }
        set_in_dict(entry, spec.field, Value::Object(keyed));
    }
    Ok(())
}

fn denormalize_entry(entry: &Value, lists: &[ListSpec]) -> Value {
    let mut out = entry.clone();
    for spec in lists {
        let Some(Value::Object(keyed)) = get_from_dict(entry, spec.field) else {
            continue;
        };
        let items = keyed
            .values()
            .map(|child| {
                if spec.children.is_empty() {
                    child.clone()
                } else {
                    denormalize_entry(child, spec.children)
                }
            })
            .collect();
        set_in_dict(&mut out, spec.field, Value::Array(items));
    }
    out
}
