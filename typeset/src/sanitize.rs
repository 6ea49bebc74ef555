//! Sanitize callbacks resolved by name.
//!
//! Value typesets reference sanitizers as `[callableRef, ...args]`. The
//! registry maps the rendered reference (`name` or `Class::method`) to a
//! closure; references nothing registered are skipped with a warning.

use std::{collections::HashMap, sync::Arc};

use log::warn;
use serde_json::Value;

use crate::{coerce, data::callback::CallbackRef};

/// Sanitizer invoked with the current value and the reference's extra args.
pub type SanitizeFn = Arc<dyn Fn(Value, &[Value]) -> Value + Send + Sync>;

/// Named sanitizers available to the caster.
#[derive(Clone, Default)]
pub struct SanitizeRegistry {
    callbacks: HashMap<String, SanitizeFn>,
}

impl std::fmt::Debug for SanitizeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.callbacks.keys().collect();
        names.sort();
        f.debug_struct("SanitizeRegistry").field("callbacks", &names).finish()
    }
}

impl SanitizeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the built-in sanitizers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register("trim", |v, args| map_str(v, |s| trim_chars(s, args.first())))
            .register("strtolower", |v, _| map_str(v, |s| s.to_lowercase()))
            .register("sanitize_key", |v, _| map_str(v, |s| sanitize_key(&s)))
            .register("sanitize_text_field", |v, _| {
                map_str(v, |s| sanitize_text_field(&s))
            })
            .register("wp_strip_all_tags", |v, _| {
                map_str(v, |s| strip_tags(&s).trim().to_string())
            })
            .register("esc_url_raw", |v, _| map_str(v, |s| esc_url_raw(&s)))
            .register("intval", |v, _| Value::from(coerce::to_int(&v)))
            .register("absint", |v, _| Value::from(coerce::to_int(&v).unsigned_abs()))
            .register("floatval", |v, _| coerce::float_value(coerce::to_float(&v)));
        registry
    }

    /// Register (or replace) a sanitizer.
    pub fn register<F>(&mut self, name: impl Into<String>, callback: F) -> &mut Self
    where
        F: Fn(Value, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.callbacks.insert(name.into(), Arc::new(callback));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.callbacks.contains_key(name)
    }

    /// Run a sanitize chain in order.
    pub fn apply(&self, value: Value, chain: &[CallbackRef]) -> Value {
        chain.iter().fold(value, |value, callback| {
            let name = callback.callable.to_string();
            match self.callbacks.get(&name) {
                Some(f) => f(value, &callback.args),
                None => {
                    warn!("sanitize callback `{name}` is not registered, skipped");
                    value
                }
            }
        })
    }
}

fn map_str(value: Value, f: impl FnOnce(String) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(s)),
        other => other,
    }
}

fn trim_chars(s: String, chars: Option<&Value>) -> String {
    match chars.and_then(Value::as_str) {
        Some(chars) => s.trim_matches(|c: char| chars.contains(c)).to_string(),
        None => s.trim().to_string(),
    }
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn sanitize_text_field(s: &str) -> String {
    strip_tags(s).split_whitespace().collect::<Vec<_>>().join(" ")
}

fn sanitize_key(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

fn esc_url_raw(s: &str) -> String {
    let s = s.trim();
    let allowed = ["http://", "https://", "/", "#", "?"];
    if allowed.iter().any(|prefix| s.starts_with(prefix)) && !s.contains(char::is_whitespace) {
        s.to_string()
    } else {
        String::new()
    }
}
