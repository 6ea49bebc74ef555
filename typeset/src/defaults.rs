//! Default value trees generated from value typesets.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::{
    data::option::{CastType, ValueTypeset},
    merge::deep_override,
};

/// How dynamic containers are expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultsMode {
    /// A blank configuration: `cast_dynamic` fields keep their static value.
    #[default]
    Default,
    /// Expand `cast_dynamic` fields per registered item, keeping any data
    /// already present in their static value.
    Fill,
}

/// Default value tree for a map of value typesets.
pub fn get_defaults(
    typesets: &IndexMap<String, ValueTypeset>,
    mode: DefaultsMode,
) -> Map<String, Value> {
    typesets
        .iter()
        .map(|(key, typeset)| (key.clone(), default_value(typeset, mode)))
        .collect()
}

/// Default value of a single typeset.
pub fn default_value(typeset: &ValueTypeset, mode: DefaultsMode) -> Value {
    match (typeset.container_type(), mode) {
        (Some(CastType::Cast), _) => Value::Object(get_defaults(&typeset.cast, mode)),
        (Some(CastType::CastDynamic), DefaultsMode::Fill) => fill_dynamic(typeset),
        _ => typeset.value.clone(),
    }
}

fn fill_dynamic(typeset: &ValueTypeset) -> Value {
    let existing = typeset.value.as_object();
    let out = typeset
        .items
        .keys()
        .map(|item| {
            let generated = Value::Object(get_defaults(&typeset.cast_dynamic, DefaultsMode::Fill));
            let value = match existing.and_then(|m| m.get(item)) {
                Some(current) => deep_override(&generated, current),
                None => generated,
            };
            (item.clone(), value)
        })
        .collect();
    Value::Object(out)
}
