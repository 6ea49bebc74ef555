//! Input typesets: the declarative description of admin form inputs.
//!
//! Raw typesets come from screen registration as loosely shaped maps and may
//! use shorthand keys (`input_type`, `dynamic`, `cond`, …). Validation
//! canonicalizes them into [`InputTypeset`] trees and drops every node that
//! could not render. Nothing here returns an error: partial configuration
//! still renders what it can.

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::data::{
    callback::CallbackRef,
    condition::{ConditionSet, validate_condition_set},
    types::{InputType, Layout},
};

/// A validated input typeset node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputTypeset {
    /// Field identifier, defaults to the key in the parent map.
    pub slug: String,
    #[serde(rename = "type")]
    pub input_type: InputType,
    /// Statically enumerated children.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub wrap: IndexMap<String, InputTypeset>,
    /// Child template repeated for every key of `items`.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub wrap_dynamic: IndexMap<String, InputTypeset>,
    /// Choice key to label.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub items: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<ConditionSet>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub item_conditions: IndexMap<String, ConditionSet>,
    pub layout: Layout,
    pub attrs: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub esc: Vec<CallbackRef>,
    /// Keys the engine does not interpret (`title`, `description`, …).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InputTypeset {
    /// Raw canonical form, accepted again by [`validate_typeset`].
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// This node and every descendant, depth first.
    pub fn walk(&self) -> Vec<&InputTypeset> {
        let mut out = vec![self];
        for child in self.wrap.values().chain(self.wrap_dynamic.values()) {
            out.extend(child.walk());
        }
        out
    }
}

const KEY_ALIASES: &[(&str, &str)] = &[
    ("input_type", "type"),
    ("dynamic", "wrap_dynamic"),
    ("attr", "attrs"),
    ("input_items", "items"),
    ("condition", "conditions"),
    ("cond", "conditions"),
    ("conds", "conditions"),
    ("item_condition", "item_conditions"),
];

const KNOWN_KEYS: &[&str] = &[
    "slug",
    "type",
    "wrap",
    "wrap_dynamic",
    "items",
    "value",
    "conditions",
    "item_conditions",
    "layout",
    "attrs",
    "esc",
];

fn resolve_key_aliases(raw: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in raw {
        let canonical = KEY_ALIASES
            .iter()
            .find(|(alias, _)| alias == key)
            .map(|(_, canonical)| *canonical);
        match canonical {
            Some(canonical) if raw.contains_key(canonical) => {}
            Some(canonical) => {
                out.insert(canonical.to_string(), value.clone());
            }
            None => {
                out.insert(key.clone(), value.clone());
            }
        }
    }
    out
}

fn parse_items(raw: Option<&Value>) -> IndexMap<String, String> {
    let label = |v: &Value| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    match raw {
        Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), label(v))).collect(),
        Some(Value::Array(list)) => list
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), label(v)))
            .collect(),
        _ => IndexMap::new(),
    }
}

fn validate_item_conditions(raw: Option<&Value>) -> IndexMap<String, ConditionSet> {
    let Some(Value::Object(map)) = raw else {
        return IndexMap::new();
    };
    map.iter()
        .filter_map(|(item, set)| {
            let set = validate_condition_set(set);
            if set.is_none() {
                debug!("item condition `{item}` dropped: empty");
            }
            set.map(|s| (item.clone(), s))
        })
        .collect()
}

/// Validate a single raw typeset keyed by `key` in its parent map.
///
/// Returns `None` when the node (and with it its subtree) must be dropped.
pub fn validate_typeset(key: &str, raw: &Value) -> Option<InputTypeset> {
    let Some(raw) = raw.as_object() else {
        debug!("typeset `{key}` dropped: not a map");
        return None;
    };
    let mut map = resolve_key_aliases(raw);

    let input_type = match map.get("type") {
        Some(Value::String(name)) => InputType::parse(name),
        Some(_) => {
            debug!("typeset `{key}` dropped: type is not a string");
            return None;
        }
        None if map.contains_key("wrap") => InputType::Wrap,
        None if map.contains_key("wrap_dynamic") => InputType::WrapDynamic,
        None => {
            debug!("typeset `{key}` dropped: no type");
            return None;
        }
    };

    let wrap = map.get("wrap").map(validate_typesets).unwrap_or_default();
    let wrap_dynamic = map
        .get("wrap_dynamic")
        .map(validate_typesets)
        .unwrap_or_default();

    if input_type.requires_wrap() && wrap.is_empty() {
        // TODO: surface structural drops to the admin notice collaborator.
        debug!("typeset `{key}` dropped: `{input_type}` needs a non-empty wrap");
        return None;
    }
    if input_type.requires_wrap_dynamic() && wrap_dynamic.is_empty() {
        debug!("typeset `{key}` dropped: `{input_type}` needs a non-empty wrap_dynamic");
        return None;
    }

    let items = parse_items(map.get("items"));
    if input_type.requires_items() && items.is_empty() {
        debug!("typeset `{key}` dropped: `{input_type}` needs items");
        return None;
    }

    let conditions = map.get("conditions").and_then(validate_condition_set);
    let item_conditions = validate_item_conditions(map.get("item_conditions"));

    let layout = map
        .get("layout")
        .and_then(Value::as_str)
        .map(Layout::parse)
        .unwrap_or_default();

    let attrs = match map.get("attrs") {
        Some(Value::Object(attrs)) => attrs.clone(),
        _ => Map::new(),
    };

    let esc = map.get("esc").map(CallbackRef::parse_list).unwrap_or_default();

    let slug = match map.get("slug") {
        Some(Value::String(slug)) if !slug.is_empty() => slug.clone(),
        _ => key.to_string(),
    };

    let value = map.get("value").cloned();
    map.retain(|k, _| !KNOWN_KEYS.contains(&k.as_str()));

    Some(InputTypeset {
        slug,
        input_type,
        wrap,
        wrap_dynamic,
        items,
        value,
        conditions,
        item_conditions,
        layout,
        attrs,
        esc,
        extra: map,
    })
}

/// Validate a raw map (or list) of typesets, dropping invalid entries.
pub fn validate_typesets(raw: &Value) -> IndexMap<String, InputTypeset> {
    let entries: Vec<(String, &Value)> = match raw {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(list) => list
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => return IndexMap::new(),
    };

    entries
        .into_iter()
        .filter_map(|(key, value)| validate_typeset(&key, value).map(|t| (key, t)))
        .collect()
}

/// Raw canonical form of a validated typeset map.
pub fn typesets_to_value(typesets: &IndexMap<String, InputTypeset>) -> Value {
    Value::Object(
        typesets
            .iter()
            .map(|(k, t)| (k.clone(), t.to_value()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "site_title": {
                "input_type": "text",
                "attr": { "placeholder": "My site" },
                "title": "Site title",
            },
            "social": {
                "wrap": {
                    "enable_og": { "type": "checkbox", "value": true },
                    "og_type": {
                        "type": "select",
                        "input_items": { "website": "Website", "article": "Article" },
                        "cond": {
                            "enable_og": { "op": "==", "value": true },
                        },
                    },
                },
            },
            "post_types": {
                "type": "dynamic",
                "items": { "post": "Posts", "page": "Pages" },
                "dynamic": {
                    "enable": { "type": "checkbox" },
                },
                "item_condition": {
                    "page": { "enable_pages": { "operator": "TRUE", "right_value": true } },
                    "post": { "relation": "OR" },
                },
            },
        })
    }

    #[test]
    fn test_aliases_and_defaults() {
        let typesets = validate_typesets(&sample());
        let title = &typesets["site_title"];
        assert_eq!(title.slug, "site_title");
        assert_eq!(title.input_type, InputType::Text);
        assert_eq!(title.layout, Layout::LabelInputRow);
        assert_eq!(title.attrs["placeholder"], json!("My site"));
        assert_eq!(title.extra["title"], json!("Site title"));

        let social = &typesets["social"];
        assert_eq!(social.input_type, InputType::Wrap);
        let og_type = &social.wrap["og_type"];
        assert_eq!(og_type.items.len(), 2);
        assert!(og_type.conditions.is_some());
        assert!(og_type.attrs.is_empty());

        let post_types = &typesets["post_types"];
        assert_eq!(post_types.input_type, InputType::WrapDynamic);
        assert!(post_types.wrap_dynamic.contains_key("enable"));
        assert_eq!(post_types.item_conditions.len(), 1);
        assert!(post_types.item_conditions.contains_key("page"));
    }

    #[test]
    fn test_idempotent() {
        let once = validate_typesets(&sample());
        let twice = validate_typesets(&typesets_to_value(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_container_without_children_dropped() {
        for ty in ["wrap", "tabs", "tab", "add-field-robots-txt", "table-form-table"] {
            let typesets = validate_typesets(&json!({
                "empty": { "type": ty, "wrap": {} },
                "missing": { "type": ty },
                "keep": { "type": "text" },
            }));
            assert!(!typesets.contains_key("empty"), "{ty}");
            assert!(!typesets.contains_key("missing"), "{ty}");
            assert!(typesets.contains_key("keep"));
        }
    }

    #[test]
    fn test_dynamic_container_without_template_dropped() {
        for ty in ["wrap_dynamic", "dynamic", "add-field-list", "list-table"] {
            let typesets = validate_typesets(&json!({
                "empty": { "type": ty, "items": { "a": "A" }, "wrap_dynamic": {} },
                "missing": { "type": ty, "items": { "a": "A" } },
                "invalid": {
                    "type": ty,
                    "items": { "a": "A" },
                    "wrap_dynamic": { "bad": { "title": "no type" } },
                },
                "only_wrap": { "type": ty, "items": { "a": "A" }, "wrap": { "x": { "type": "text" } } },
                "keep": { "type": "text" },
            }));
            assert_eq!(typesets.keys().collect::<Vec<_>>(), vec!["keep"], "{ty}");
        }
    }

    #[test]
    fn test_container_with_only_invalid_children_dropped() {
        let typesets = validate_typesets(&json!({
            "group": { "wrap": { "bad": { "title": "no type" } } },
        }));
        assert!(typesets.is_empty());
    }

    #[test]
    fn test_dynamic_and_choice_need_items() {
        let typesets = validate_typesets(&json!({
            "list": { "type": "add-field-list", "wrap_dynamic": { "x": { "type": "text" } } },
            "table": { "type": "list-table", "wrap_dynamic": { "x": { "type": "text" } } },
            "radio": { "type": "radio" },
            "checks": { "type": "checkboxes", "items": ["a", "b"] },
        }));
        assert!(typesets.contains_key("list"));
        assert!(!typesets.contains_key("table"));
        assert!(!typesets.contains_key("radio"));
        let checks = &typesets["checks"];
        assert_eq!(checks.input_type, InputType::MultiCheckbox);
        assert_eq!(checks.items["1"], "b");
    }

    #[test]
    fn test_untyped_leaf_dropped() {
        assert!(validate_typeset("x", &json!({ "value": 3 })).is_none());
        assert!(validate_typeset("x", &json!("text")).is_none());
    }

    #[test]
    fn test_esc_filtering() {
        let t = validate_typeset(
            "x",
            &json!({
                "type": "text",
                "esc": [["esc_attr"], [["Class", "method"], 1], [5], "not-a-list?"],
            }),
        )
        .unwrap();
        assert_eq!(t.esc.len(), 2);
        assert_eq!(t.esc[1].args, vec![json!(1)]);
    }

    #[test]
    fn test_explicit_slug_kept() {
        let t = validate_typeset("key", &json!({ "type": "text", "slug": "other" })).unwrap();
        assert_eq!(t.slug, "other");
    }
}
