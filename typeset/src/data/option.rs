//! Value typesets: the typed description of persisted option values.
//!
//! Where input typesets describe how a field renders, value typesets describe
//! what a stored value looks like: its accepted cast types in priority order,
//! its default, nested casts and the sanitize chain per cast type.
//!
//! ```json
//! {
//!     "title_length": {
//!         "type": ["int", "string"],
//!         "value": 60,
//!         "sanitize": { "int": [["absint"]] }
//!     },
//!     "post_types": {
//!         "type": "cast_dynamic",
//!         "items": { "post": "Posts", "page": "Pages" },
//!         "cast_dynamic": { "enable": { "type": "bool", "value": true } }
//!     }
//! }
//! ```

use std::fmt;

use indexmap::IndexMap;
use log::debug;
use serde_json::{Map, Value};

use crate::{
    data::callback::CallbackRef,
    error::{Result, TypesetError},
};

/// Shapes a raw value can be cast into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastType {
    /// Nested map cast with the `cast` typesets.
    Cast,
    /// Map of item keys, each cast with the `cast_dynamic` typesets.
    CastDynamic,
    Object,
    Array,
    StringList,
    IntList,
    BoolList,
    Int,
    Bool,
    Float,
    String,
    /// Drop the field from the output.
    Unset,
}

impl CastType {
    /// Parse a cast type name, resolving aliases.
    pub fn parse(name: &str) -> Option<Self> {
        let ty = match name {
            "cast" => CastType::Cast,
            "cast_dynamic" => CastType::CastDynamic,
            "object" => CastType::Object,
            "array" => CastType::Array,
            "string[]" => CastType::StringList,
            "int[]" => CastType::IntList,
            "bool[]" => CastType::BoolList,
            "int" | "integer" => CastType::Int,
            "bool" | "boolean" => CastType::Bool,
            "double" | "float" | "real" => CastType::Float,
            "string" => CastType::String,
            "unset" => CastType::Unset,
            _ => return None,
        };
        Some(ty)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CastType::Cast => "cast",
            CastType::CastDynamic => "cast_dynamic",
            CastType::Object => "object",
            CastType::Array => "array",
            CastType::StringList => "string[]",
            CastType::IntList => "int[]",
            CastType::BoolList => "bool[]",
            CastType::Int => "int",
            CastType::Bool => "bool",
            CastType::Float => "float",
            CastType::String => "string",
            CastType::Unset => "unset",
        }
    }
}

impl fmt::Display for CastType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value typeset node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueTypeset {
    pub slug: String,
    /// Accepted cast types, tried in order.
    pub types: Vec<CastType>,
    /// Static default; `Null` on pure containers.
    pub value: Value,
    pub cast: IndexMap<String, ValueTypeset>,
    pub cast_dynamic: IndexMap<String, ValueTypeset>,
    pub items: IndexMap<String, String>,
    /// Sanitize chain per cast type.
    pub sanitize: IndexMap<CastType, Vec<CallbackRef>>,
}

impl ValueTypeset {
    /// A leaf with a single cast type and default.
    pub fn leaf(slug: impl Into<String>, ty: CastType, value: Value) -> Self {
        ValueTypeset {
            slug: slug.into(),
            types: vec![ty],
            value,
            ..Default::default()
        }
    }

    /// Whether the node nests other value typesets.
    pub fn is_container(&self) -> bool {
        self.container_type().is_some()
    }

    /// The first declared container cast type, if any.
    pub fn container_type(&self) -> Option<CastType> {
        self.types
            .iter()
            .copied()
            .find(|t| matches!(t, CastType::Cast | CastType::CastDynamic))
    }

    fn from_value(path: &str, key: &str, raw: &Value) -> Result<Self> {
        let Value::Object(map) = raw else {
            return Err(TypesetError::TypeMismatch {
                path: path.to_string(),
                expected: "map".to_string(),
                actual: raw.to_string(),
            });
        };

        let cast = match map.get("cast") {
            Some(children) => parse_children(&format!("{path}.cast"), children)?,
            None => IndexMap::new(),
        };
        let cast_dynamic = match map.get("cast_dynamic") {
            Some(children) => parse_children(&format!("{path}.cast_dynamic"), children)?,
            None => IndexMap::new(),
        };

        let types = match map.get("type") {
            Some(raw_types) => parse_types(path, raw_types)?,
            None if map.contains_key("cast") => vec![CastType::Cast],
            None if map.contains_key("cast_dynamic") => vec![CastType::CastDynamic],
            None => {
                return Err(TypesetError::TypeMismatch {
                    path: path.to_string(),
                    expected: "a `type` or a `cast`/`cast_dynamic` map".to_string(),
                    actual: "nothing".to_string(),
                });
            }
        };

        let items = match map.get("items") {
            Some(Value::Object(items)) => items
                .iter()
                .map(|(k, v)| {
                    let label = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                    (k.clone(), label)
                })
                .collect(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(|k| (k.to_string(), k.to_string()))
                .collect(),
            _ => IndexMap::new(),
        };

        let sanitize = match map.get("sanitize") {
            Some(Value::Object(chains)) => parse_sanitize(path, chains),
            _ => IndexMap::new(),
        };

        let slug = map
            .get("slug")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(key)
            .to_string();

        Ok(ValueTypeset {
            slug,
            types,
            value: map.get("value").cloned().unwrap_or(Value::Null),
            cast,
            cast_dynamic,
            items,
            sanitize,
        })
    }
}

fn parse_types(path: &str, raw: &Value) -> Result<Vec<CastType>> {
    let names: Vec<&Value> = match raw {
        Value::Array(list) => list.iter().collect(),
        single => vec![single],
    };
    names
        .into_iter()
        .map(|name| {
            let name = name.as_str().ok_or_else(|| TypesetError::TypeMismatch {
                path: format!("{path}.type"),
                expected: "string".to_string(),
                actual: name.to_string(),
            })?;
            CastType::parse(name).ok_or_else(|| TypesetError::UnknownCastType {
                path: format!("{path}.type"),
                name: name.to_string(),
            })
        })
        .collect()
}

fn parse_sanitize(
    path: &str,
    chains: &Map<String, Value>,
) -> IndexMap<CastType, Vec<CallbackRef>> {
    let mut out = IndexMap::new();
    for (name, chain) in chains {
        let Some(ty) = CastType::parse(name) else {
            debug!("{path}: sanitize chain for unknown cast type `{name}` dropped");
            continue;
        };
        let callbacks = CallbackRef::parse_list(chain);
        if !callbacks.is_empty() {
            out.insert(ty, callbacks);
        }
    }
    out
}

fn parse_children(path: &str, raw: &Value) -> Result<IndexMap<String, ValueTypeset>> {
    let Value::Object(map) = raw else {
        return Err(TypesetError::TypeMismatch {
            path: path.to_string(),
            expected: "map of value typesets".to_string(),
            actual: raw.to_string(),
        });
    };
    map.iter()
        .map(|(key, child)| {
            let typeset = ValueTypeset::from_value(&format!("{path}.{key}"), key, child)?;
            Ok((key.clone(), typeset))
        })
        .collect()
}

/// Parse a raw map of value typesets.
///
/// # Errors
///
/// Fails on typesets no caller could have meant: unknown cast type names,
/// non-map nodes or containers, nodes without any type.
pub fn parse_value_typesets(raw: &Value) -> Result<IndexMap<String, ValueTypeset>> {
    let Value::Object(map) = raw else {
        return Err(TypesetError::TypeMismatch {
            path: String::new(),
            expected: "map of value typesets".to_string(),
            actual: raw.to_string(),
        });
    };
    map.iter()
        .map(|(key, child)| Ok((key.clone(), ValueTypeset::from_value(key, key, child)?)))
        .collect()
}
