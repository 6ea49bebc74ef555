//! Condition sets controlling the visibility and enablement of inputs.
//!
//! A raw condition set is a flat map: the reserved `relation` and `action`
//! keys, plus one entry per comparison keyed by the compared field slug.
//!
//! ```json
//! {
//!     "relation": "OR",
//!     "action": "show",
//!     "enable_og": { "operator": "==", "right_value": true },
//!     "0": { "left_var": "site_type", "op": "!=", "value": "person" }
//! }
//! ```

use std::fmt;

use indexmap::IndexMap;
use log::debug;
use serde::{
    Serialize, Serializer,
    ser::SerializeMap,
};
use serde_json::{Map, Value};

/// How multiple comparisons of a set combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Relation {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl Relation {
    fn parse(raw: Option<&Value>) -> Self {
        match raw.and_then(Value::as_str).map(str::to_uppercase).as_deref() {
            Some("OR") => Relation::Or,
            _ => Relation::And,
        }
    }
}

/// What happens to the target field when the set evaluates true.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Show,
    Hide,
    Enable,
    Disable,
    Readonly,
}

impl Action {
    fn parse(raw: Option<&Value>) -> Self {
        match raw.and_then(Value::as_str).map(str::to_lowercase).as_deref() {
            Some("hide") => Action::Hide,
            Some("enable") => Action::Enable,
            Some("disable") => Action::Disable,
            Some("readonly") => Action::Readonly,
            _ => Action::Show,
        }
    }
}

/// Comparison operators accepted in a condition entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    Identical,
    NotEqual,
    NotIdentical,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
    True,
    False,
    And,
    Or,
    Regex,
    Match,
    InArray,
    Checked,
    Selected,
}

impl Operator {
    /// Parse an operator symbol; `None` when outside the vocabulary.
    pub fn parse(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "==" => Operator::Equal,
            "===" => Operator::Identical,
            "!=" => Operator::NotEqual,
            "!==" => Operator::NotIdentical,
            "<" => Operator::Less,
            ">" => Operator::Greater,
            "<=" => Operator::LessOrEqual,
            ">=" => Operator::GreaterOrEqual,
            "TRUE" => Operator::True,
            "FALSE" => Operator::False,
            "AND" => Operator::And,
            "OR" => Operator::Or,
            "regex" => Operator::Regex,
            "match" => Operator::Match,
            "inArray" => Operator::InArray,
            "checked" => Operator::Checked,
            "selected" => Operator::Selected,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::Identical => "===",
            Operator::NotEqual => "!=",
            Operator::NotIdentical => "!==",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::LessOrEqual => "<=",
            Operator::GreaterOrEqual => ">=",
            Operator::True => "TRUE",
            Operator::False => "FALSE",
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Regex => "regex",
            Operator::Match => "match",
            Operator::InArray => "inArray",
            Operator::Checked => "checked",
            Operator::Selected => "selected",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One comparison of a condition set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    /// Slug of the field providing the left operand.
    pub left_var: String,
    pub operator: Operator,
    /// Slug of a field providing the right operand.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_var: Option<String>,
    /// Literal right operand.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_value: Option<Value>,
}

/// A validated, non-empty condition set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionSet {
    pub relation: Relation,
    pub action: Action,
    /// Comparisons keyed by their `left_var`.
    pub conditions: IndexMap<String, Condition>,
}

impl ConditionSet {
    /// Raw form of the set, accepted again by [`validate_condition_set`].
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

impl Serialize for ConditionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.conditions.len() + 2))?;
        map.serialize_entry("relation", &self.relation)?;
        map.serialize_entry("action", &self.action)?;
        for (key, condition) in &self.conditions {
            map.serialize_entry(key, condition)?;
        }
        map.end()
    }
}

const CONDITION_KEY_ALIASES: &[(&str, &str)] = &[
    ("left", "left_var"),
    ("op", "operator"),
    ("right", "right_var"),
    ("value", "right_value"),
    ("right_val", "right_value"),
];

/// Set-level keys that can never name a compared field.
const RESERVED_KEYS: &[&str] = &["relation", "action"];

/// Whether `key` is a list index: an optional `-` followed by digits, with no
/// leading zero.
fn is_integer_key(key: &str) -> bool {
    let digits = key.strip_prefix('-').unwrap_or(key);
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'))
        && key != "-0"
}

/// Rename shorthand keys, keeping a canonical key when both are present.
fn resolve_entry_aliases(entry: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in entry {
        let canonical = CONDITION_KEY_ALIASES
            .iter()
            .find(|(alias, _)| alias == key)
            .map(|(_, canonical)| *canonical);
        match canonical {
            Some(canonical) if entry.contains_key(canonical) => {}
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

fn validate_condition(key: &str, raw: &Value) -> Option<Condition> {
    let Some(entry) = raw.as_object() else {
        debug!("condition `{key}` dropped: not a map");
        return None;
    };
    let entry = resolve_entry_aliases(entry);

    let left_var = match entry.get("left_var") {
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            debug!("condition `{key}` dropped: left_var is not a string");
            return None;
        }
        None if is_integer_key(key) => {
            debug!("condition `{key}` dropped: numeric key without left_var");
            return None;
        }
        None => key.to_string(),
    };
    if RESERVED_KEYS.contains(&left_var.as_str()) {
        debug!("condition `{key}` dropped: left_var `{left_var}` is a reserved key");
        return None;
    }

    let Some(operator) = entry
        .get("operator")
        .and_then(Value::as_str)
        .and_then(Operator::parse)
    else {
        debug!("condition `{key}` dropped: missing or unknown operator");
        return None;
    };

    let right_var = entry
        .get("right_var")
        .and_then(Value::as_str)
        .map(str::to_string);
    let right_value = entry.get("right_value").filter(|v| !v.is_null()).cloned();
    if right_var.is_none() && right_value.is_none() {
        debug!("condition `{key}` dropped: no right operand");
        return None;
    }

    Some(Condition {
        left_var,
        operator,
        right_var,
        right_value,
    })
}

/// Normalize a raw condition set.
///
/// Returns `None` when no comparison survives validation, which callers
/// treat as "no condition".
pub fn validate_condition_set(raw: &Value) -> Option<ConditionSet> {
    let map = raw.as_object()?;

    let mut set = ConditionSet {
        relation: Relation::parse(map.get("relation")),
        action: Action::parse(map.get("action")),
        conditions: IndexMap::new(),
    };

    for (key, entry) in map {
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }
        if let Some(condition) = validate_condition(key, entry) {
            set.conditions.insert(condition.left_var.clone(), condition);
        }
    }

    if set.conditions.is_empty() {
        return None;
    }
    Some(set)
}
