//! Evaluation of condition sets against live field values.
//!
//! A set evaluates its comparisons with the set's relation: `OR` is true on
//! the first satisfied comparison (false when empty), `AND` is false on the
//! first unsatisfied one (true when empty). The boolean then selects the
//! set's action or its inverse.
//!
//! Right operands are re-read on every evaluation: a `right_var` takes
//! precedence over a literal `right_value`. When the left value is a
//! collection (a checkbox group, a multi-select), a comparison is true if any
//! left element compares true against any right element.

use std::cmp::Ordering;

use indexmap::IndexMap;
use log::debug;
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};

use crate::{
    coerce,
    data::{
        condition::{Action, Condition, ConditionSet, Operator, Relation},
        typeset::InputTypeset,
    },
};

/// Accessor for the current value of a form field.
pub trait FieldValues {
    /// Current value of `name`, `None` when the field does not exist.
    fn get_value(&self, name: &str) -> Option<Value>;
}

/// Slug lookup in a value tree.
///
/// `a.b` walks a path. A bare slug is looked up at the top level first, then
/// depth-first in nested maps, since conditions name siblings by slug.
impl FieldValues for Map<String, Value> {
    fn get_value(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.get(name) {
            return Some(value.clone());
        }
        if name.contains('.') {
            let mut current = self.get(name.split('.').next()?)?;
            for part in name.split('.').skip(1) {
                current = current.get(part)?;
            }
            return Some(current.clone());
        }
        self.values()
            .filter_map(Value::as_object)
            .find_map(|nested| nested.get_value(name))
    }
}

impl FieldValues for Value {
    fn get_value(&self, name: &str) -> Option<Value> {
        self.as_object()?.get_value(name)
    }
}

/// Adapts a closure into a [`FieldValues`] accessor.
pub struct FnValues<F>(pub F);

impl<F> FieldValues for FnValues<F>
where
    F: Fn(&str) -> Option<Value>,
{
    fn get_value(&self, name: &str) -> Option<Value> {
        (self.0)(name)
    }
}

/// Concrete state applied to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    Show,
    Hide,
    Enable,
    Disable,
    Readonly,
    /// Inverse of [`Effect::Readonly`].
    Editable,
}

impl Action {
    /// The action when `applies`, its inverse otherwise.
    pub fn effect(self, applies: bool) -> Effect {
        match (self, applies) {
            (Action::Show, true) | (Action::Hide, false) => Effect::Show,
            (Action::Show, false) | (Action::Hide, true) => Effect::Hide,
            (Action::Enable, true) | (Action::Disable, false) => Effect::Enable,
            (Action::Enable, false) | (Action::Disable, true) => Effect::Disable,
            (Action::Readonly, true) => Effect::Readonly,
            (Action::Readonly, false) => Effect::Editable,
        }
    }
}

/// Evaluate a condition set.
pub fn evaluate(set: &ConditionSet, values: &impl FieldValues) -> bool {
    let mut results = set
        .conditions
        .values()
        .map(|condition| evaluate_condition(condition, values));
    match set.relation {
        Relation::Or => results.any(|r| r),
        Relation::And => results.all(|r| r),
    }
}

/// Evaluate a condition set and resolve the effect to apply.
pub fn resolve(set: &ConditionSet, values: &impl FieldValues) -> Effect {
    set.action.effect(evaluate(set, values))
}

/// Effect resolved for one field, or one item of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEffect {
    /// Slug path of the field, joined with `.`.
    pub path: String,
    /// Item key for `item_conditions`.
    pub item: Option<String>,
    pub effect: Effect,
}

/// Field lookup scoped to one level of the value tree.
///
/// Siblings at the current level win; anything else falls back to the
/// lookup over the whole tree.
struct Scoped<'a> {
    local: &'a Map<String, Value>,
    root: &'a Map<String, Value>,
}

impl FieldValues for Scoped<'_> {
    fn get_value(&self, name: &str) -> Option<Value> {
        self.local
            .get(name)
            .cloned()
            .or_else(|| self.root.get_value(name))
    }
}

/// Resolve every condition and item condition in a typeset tree.
///
/// Each field is evaluated against its siblings in `values`: a `wrap` whose
/// slug holds a map in the current level scopes its children to that map,
/// and `wrap_dynamic` children are resolved once per item against
/// `values[field][item]`, with the item key appended to their path.
pub fn resolve_typesets(
    typesets: &IndexMap<String, InputTypeset>,
    values: &Map<String, Value>,
) -> Vec<FieldEffect> {
    let mut out = Vec::new();
    resolve_into(&mut out, "", typesets, values, values);
    out
}

fn resolve_into(
    out: &mut Vec<FieldEffect>,
    prefix: &str,
    typesets: &IndexMap<String, InputTypeset>,
    local: &Map<String, Value>,
    root: &Map<String, Value>,
) {
    let scope = Scoped { local, root };
    let empty = Map::new();
    for typeset in typesets.values() {
        let path = if prefix.is_empty() {
            typeset.slug.clone()
        } else {
            format!("{prefix}.{}", typeset.slug)
        };
        if let Some(set) = &typeset.conditions {
            out.push(FieldEffect {
                path: path.clone(),
                item: None,
                effect: resolve(set, &scope),
            });
        }
        for (item, set) in &typeset.item_conditions {
            out.push(FieldEffect {
                path: path.clone(),
                item: Some(item.clone()),
                effect: resolve(set, &scope),
            });
        }

        let own = local.get(&typeset.slug).and_then(Value::as_object);
        if !typeset.wrap.is_empty() {
            resolve_into(out, &path, &typeset.wrap, own.unwrap_or(local), root);
        }
        if !typeset.wrap_dynamic.is_empty() {
            let items: Vec<&String> = if typeset.items.is_empty() {
                own.map(|m| m.keys().collect()).unwrap_or_default()
            } else {
                typeset.items.keys().collect()
            };
            for item in items {
                let item_values = own
                    .and_then(|m| m.get(item))
                    .and_then(Value::as_object)
                    .unwrap_or(&empty);
                let item_path = format!("{path}.{item}");
                resolve_into(out, &item_path, &typeset.wrap_dynamic, item_values, root);
            }
        }
    }
}

fn evaluate_condition(condition: &Condition, values: &impl FieldValues) -> bool {
    let left = values.get_value(&condition.left_var).unwrap_or(Value::Null);
    let right = match &condition.right_var {
        Some(var) => values.get_value(var).unwrap_or(Value::Null),
        None => condition.right_value.clone().unwrap_or(Value::Null),
    };

    match condition.operator {
        Operator::InArray => any_pair(&elements(&left), &elements(&right), loose_eq),
        Operator::Selected => any_pair(&chosen(&left), &elements(&right), loose_eq),
        Operator::Checked if is_collection(&left) => {
            any_pair(&chosen(&left), &elements(&right), loose_eq)
        }
        Operator::Checked => coerce::to_bool(&left) == coerce::to_bool(&right),
        op if is_collection(&left) => {
            any_pair(&elements(&left), &elements(&right), |l, r| compare(op, l, r))
        }
        op => compare(op, &left, &right),
    }
}

fn is_collection(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

/// Elements of a collection, or the value itself.
fn elements(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(list) => list.clone(),
        Value::Object(map) => map.values().cloned().collect(),
        other => vec![other.clone()],
    }
}

/// Chosen entries of a choice input.
///
/// Lists hold the chosen keys; maps hold `key => checked` pairs.
fn chosen(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(list) => list.clone(),
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| coerce::to_bool(v))
            .map(|(k, _)| Value::String(k.clone()))
            .collect(),
        Value::Null => Vec::new(),
        other => vec![other.clone()],
    }
}

fn any_pair(lefts: &[Value], rights: &[Value], f: impl Fn(&Value, &Value) -> bool) -> bool {
    lefts.iter().any(|l| rights.iter().any(|r| f(l, r)))
}

fn compare(op: Operator, left: &Value, right: &Value) -> bool {
    match op {
        Operator::Equal => loose_eq(left, right),
        Operator::NotEqual => !loose_eq(left, right),
        Operator::Identical => left == right,
        Operator::NotIdentical => left != right,
        Operator::Less => order(left, right) == Some(Ordering::Less),
        Operator::Greater => order(left, right) == Some(Ordering::Greater),
        Operator::LessOrEqual => {
            matches!(order(left, right), Some(Ordering::Less | Ordering::Equal))
        }
        Operator::GreaterOrEqual => {
            matches!(order(left, right), Some(Ordering::Greater | Ordering::Equal))
        }
        Operator::True => coerce::to_bool(left),
        Operator::False => !coerce::to_bool(left),
        Operator::And => coerce::to_bool(left) && coerce::to_bool(right),
        Operator::Or => coerce::to_bool(left) || coerce::to_bool(right),
        Operator::Regex => pattern_matches(left, right, false),
        Operator::Match => pattern_matches(left, right, true),
        Operator::InArray | Operator::Checked | Operator::Selected => {
            any_pair(&[left.clone()], &elements(right), loose_eq)
        }
    }
}

/// Equality across the loose types form inputs produce.
fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, other) | (other, Value::Null) => !coerce::to_bool(other),
        (Value::Bool(b), other) | (other, Value::Bool(b)) => *b == coerce::to_bool(other),
        (Value::String(l), Value::String(r)) if l == r => true,
        (l, r) if coerce::is_numeric(l) && coerce::is_numeric(r) => {
            coerce::as_f64(l) == coerce::as_f64(r)
        }
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            n.to_string() == *s
        }
        (l, r) => l == r,
    }
}

fn order(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(l), Some(r)) = (coerce::as_f64(left), coerce::as_f64(right)) {
        return l.partial_cmp(&r);
    }
    match (left, right) {
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

/// Build a regex from `pattern` or `/pattern/flags`.
fn build_regex(pattern: &str, anchored: bool) -> Option<Regex> {
    let (body, flags) = match pattern.strip_prefix('/').and_then(|p| p.rsplit_once('/')) {
        Some((body, flags)) => (body, flags),
        None => (pattern, ""),
    };
    let body = if anchored {
        format!("^(?:{body})$")
    } else {
        body.to_string()
    };
    let mut builder = RegexBuilder::new(&body);
    builder
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'));
    match builder.build() {
        Ok(re) => Some(re),
        Err(err) => {
            debug!("invalid condition pattern `{pattern}`: {err}");
            None
        }
    }
}

fn pattern_matches(left: &Value, right: &Value, anchored: bool) -> bool {
    let Some(pattern) = right.as_str() else {
        return false;
    };
    build_regex(pattern, anchored).is_some_and(|re| re.is_match(&coerce::to_string(left)))
}
