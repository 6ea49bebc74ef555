//! Casting raw submitted values into clean value trees.
//!
//! Every declared field is resolved independently: its cast types are tried
//! in order against the raw value's shape and the first one that matches
//! wins. Fields with no matching type fall back to their defaults, so the
//! output always has the shape the typesets describe. Undeclared keys are
//! dropped.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::{
    coerce,
    data::option::{CastType, ValueTypeset},
    defaults::{DefaultsMode, default_value, get_defaults},
    sanitize::SanitizeRegistry,
};

/// Casts value trees, running sanitize chains through an injected registry.
#[derive(Debug, Clone, Copy)]
pub struct Caster<'a> {
    sanitizers: &'a SanitizeRegistry,
}

/// View a JSON map or list as a keyed map.
fn as_map(raw: &Value) -> Option<Map<String, Value>> {
    match raw {
        Value::Object(map) => Some(map.clone()),
        Value::Array(list) => Some(
            list.iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v.clone()))
                .collect(),
        ),
        _ => None,
    }
}

/// Map every element of a list or map, keeping keys.
fn map_elements(raw: &Value, f: impl Fn(&Value) -> Value) -> Option<Value> {
    match raw {
        Value::Array(list) => Some(Value::Array(list.iter().map(&f).collect())),
        Value::Object(map) => Some(Value::Object(
            map.iter().map(|(k, v)| (k.clone(), f(v))).collect(),
        )),
        _ => None,
    }
}

impl<'a> Caster<'a> {
    pub fn new(sanitizers: &'a SanitizeRegistry) -> Self {
        Caster { sanitizers }
    }

    /// Cast a raw values map against a map of value typesets.
    pub fn cast_values(
        &self,
        raw: &Map<String, Value>,
        typesets: &IndexMap<String, ValueTypeset>,
    ) -> Map<String, Value> {
        let mut input = raw.clone();
        let mut out = Map::new();
        for (key, typeset) in typesets {
            if let Some(value) = self.cast_field(&mut input, key, typeset) {
                out.insert(key.clone(), value);
            }
        }
        out
    }

    /// Resolve one field; `None` means the field is unset.
    fn cast_field(
        &self,
        input: &mut Map<String, Value>,
        key: &str,
        typeset: &ValueTypeset,
    ) -> Option<Value> {
        for ty in &typeset.types {
            if *ty == CastType::Unset {
                if input.remove(key).is_some() {
                    return None;
                }
                continue;
            }
            let Some(raw) = input.get(key) else {
                continue;
            };
            if let Some(value) = self.try_cast(*ty, raw, typeset) {
                let chain = typeset.sanitize.get(ty).map(Vec::as_slice).unwrap_or_default();
                return Some(self.sanitizers.apply(value, chain));
            }
        }
        Some(self.fallback(typeset))
    }

    fn try_cast(&self, ty: CastType, raw: &Value, typeset: &ValueTypeset) -> Option<Value> {
        match ty {
            CastType::Cast => {
                let map = as_map(raw)?;
                Some(Value::Object(self.cast_values(&map, &typeset.cast)))
            }
            CastType::CastDynamic => {
                let map = as_map(raw)?;
                Some(Value::Object(self.cast_dynamic(&map, typeset)))
            }
            CastType::Object | CastType::Array => {
                matches!(raw, Value::Array(_) | Value::Object(_)).then(|| raw.clone())
            }
            CastType::StringList => map_elements(raw, |v| Value::String(coerce::to_string(v))),
            CastType::IntList => map_elements(raw, |v| Value::from(coerce::to_int(v))),
            CastType::BoolList => map_elements(raw, |v| Value::Bool(coerce::to_bool(v))),
            CastType::Int => coerce::is_numeric(raw).then(|| Value::from(coerce::to_int(raw))),
            CastType::Bool => raw.is_boolean().then(|| raw.clone()),
            CastType::Float => {
                coerce::is_numeric(raw).then(|| coerce::float_value(coerce::to_float(raw)))
            }
            CastType::String => raw.is_string().then(|| raw.clone()),
            CastType::Unset => None,
        }
    }

    /// Cast every submitted item, then fill registered items nobody submitted.
    fn cast_dynamic(&self, raw: &Map<String, Value>, typeset: &ValueTypeset) -> Map<String, Value> {
        let mut out: Map<String, Value> = raw
            .iter()
            .map(|(item, value)| {
                let value = as_map(value).unwrap_or_default();
                let cast = self.cast_values(&value, &typeset.cast_dynamic);
                (item.clone(), Value::Object(cast))
            })
            .collect();

        let missing: Vec<&String> = typeset
            .items
            .keys()
            .filter(|item| !out.contains_key(item.as_str()))
            .collect();
        if !missing.is_empty() {
            let filled = default_value(typeset, DefaultsMode::Fill);
            for item in missing {
                let value = filled.get(item).and_then(as_map).unwrap_or_else(|| {
                    get_defaults(&typeset.cast_dynamic, DefaultsMode::Fill)
                });
                let cast = self.cast_values(&value, &typeset.cast_dynamic);
                out.insert(item.clone(), Value::Object(cast));
            }
        }
        out
    }

    fn fallback(&self, typeset: &ValueTypeset) -> Value {
        match typeset.container_type() {
            Some(ty) => {
                let defaults = default_value(typeset, DefaultsMode::Fill);
                self.try_cast(ty, &defaults, typeset).unwrap_or(defaults)
            }
            None => typeset.value.clone(),
        }
    }
}
