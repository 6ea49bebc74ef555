use std::fmt;

use serde::{Serialize, Serializer, ser::SerializeSeq};
use serde_json::Value;

/// Reference to a callable registered by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Callable {
    /// Plain function name, e.g. `sanitize_text_field`.
    Function(String),
    /// Two-element method reference, e.g. `["Gofer_SEO_Options", "absint"]`.
    Method(String, String),
}

impl Callable {
    fn parse(raw: &Value) -> Option<Self> {
        match raw {
            Value::String(name) if !name.is_empty() => Some(Callable::Function(name.clone())),
            Value::Array(parts) => match parts.as_slice() {
                [Value::String(class), Value::String(method)] => {
                    Some(Callable::Method(class.clone(), method.clone()))
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Callable::Function(name) => Value::String(name.clone()),
            Callable::Method(class, method) => Value::Array(vec![
                Value::String(class.clone()),
                Value::String(method.clone()),
            ]),
        }
    }
}

impl fmt::Display for Callable {
    /// Registry name: `function` or `Class::method`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Function(name) => f.write_str(name),
            Callable::Method(class, method) => write!(f, "{class}::{method}"),
        }
    }
}

/// A `[callableRef, ...args]` entry used by `esc` and `sanitize` lists.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackRef {
    pub callable: Callable,
    /// Extra arguments passed after the current value.
    pub args: Vec<Value>,
}

impl CallbackRef {
    /// Parse one `[callableRef, ...args]` entry.
    ///
    /// Anything but a list with a valid reference first, including a bare
    /// string, yields `None`.
    pub fn parse(raw: &Value) -> Option<Self> {
        let (first, rest) = raw.as_array()?.split_first()?;
        Some(CallbackRef {
            callable: Callable::parse(first)?,
            args: rest.to_vec(),
        })
    }

    /// Parse a list (or keyed map) of entries, silently skipping bad ones.
    pub fn parse_list(raw: &Value) -> Vec<Self> {
        match raw {
            Value::Array(entries) => entries.iter().filter_map(Self::parse).collect(),
            Value::Object(entries) => entries.values().filter_map(Self::parse).collect(),
            _ => Vec::new(),
        }
    }
}

impl Serialize for CallbackRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.args.len() + 1))?;
        seq.serialize_element(&self.callable.to_value())?;
        for arg in &self.args {
            seq.serialize_element(arg)?;
        }
        seq.end()
    }
}
