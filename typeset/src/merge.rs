//! Pure merges over JSON value trees.
//!
//! Every call site in the crate picks one of these explicitly:
//!
//! - [`deep_override`]: recursive, the override wins at every leaf. Used where
//!   stored or partial data is laid over generated defaults.
//! - [`shallow_override`]: top-level keys only, last write wins. Used where
//!   whole entries are replaced, e.g. screen extenders adding typesets.

use serde_json::{Map, Value};

/// Recursively lay `over` onto `base`.
///
/// Maps merge key by key; any other pair resolves to `over`. Keys present
/// only in `base` are kept.
pub fn deep_override(base: &Value, over: &Value) -> Value {
    match (base, over) {
        (Value::Object(base), Value::Object(over)) => Value::Object(deep_override_map(base, over)),
        (_, over) => over.clone(),
    }
}

/// [`deep_override`] on maps.
pub fn deep_override_map(
    base: &Map<String, Value>,
    over: &Map<String, Value>,
) -> Map<String, Value> {
    let mut out = base.clone();
    for (key, value) in over {
        let merged = match out.get(key) {
            Some(existing) => deep_override(existing, value),
            None => value.clone(),
        };
        out.insert(key.clone(), merged);
    }
    out
}

/// Replace top-level entries of `base` with those of `over`.
pub fn shallow_override(
    base: &Map<String, Value>,
    over: &Map<String, Value>,
) -> Map<String, Value> {
    let mut out = base.clone();
    for (key, value) in over {
        out.insert(key.clone(), value.clone());
    }
    out
}
