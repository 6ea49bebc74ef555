//! Registry of admin screens contributing typesets.
//!
//! Each screen is built by a factory registered under a stable slug, so the
//! set of screens is closed and enumerable. Extenders registered for a slug
//! run on every build and may add or replace typesets before validation.

use std::{collections::HashMap, sync::Arc};

use indexmap::IndexMap;
use log::debug;
use serde_json::{Map, Value};

use crate::{
    data::{
        option::{ValueTypeset, parse_value_typesets},
        typeset::{InputTypeset, validate_typesets},
    },
    error::{Result, TypesetError},
    merge::shallow_override,
};

/// Raw registration data of one screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Screen {
    pub slug: String,
    pub title: String,
    /// Raw input typesets.
    pub inputs: Map<String, Value>,
    /// Raw value typesets.
    pub options: Map<String, Value>,
}

impl Screen {
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Screen {
            slug: slug.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Add raw input typesets; entries with an existing key replace it.
    pub fn with_inputs(mut self, inputs: &Value) -> Self {
        self.add_inputs(inputs);
        self
    }

    /// Add raw value typesets; entries with an existing key replace it.
    pub fn with_options(mut self, options: &Value) -> Self {
        self.add_options(options);
        self
    }

    pub fn add_inputs(&mut self, inputs: &Value) {
        if let Some(inputs) = inputs.as_object() {
            self.inputs = shallow_override(&self.inputs, inputs);
        }
    }

    pub fn add_options(&mut self, options: &Value) {
        if let Some(options) = options.as_object() {
            self.options = shallow_override(&self.options, options);
        }
    }

    /// Validated input typesets; invalid entries are dropped.
    pub fn input_typesets(&self) -> IndexMap<String, InputTypeset> {
        validate_typesets(&Value::Object(self.inputs.clone()))
    }

    /// Parsed value typesets.
    pub fn value_typesets(&self) -> Result<IndexMap<String, ValueTypeset>> {
        parse_value_typesets(&Value::Object(self.options.clone()))
    }
}

/// Builds a fresh screen on every request.
pub type ScreenFactory = Arc<dyn Fn() -> Screen + Send + Sync>;

/// Extends a screen after its factory ran.
pub type ScreenExtender = Arc<dyn Fn(&mut Screen) + Send + Sync>;

/// Closed set of screens keyed by slug.
#[derive(Clone, Default)]
pub struct ScreenRegistry {
    factories: IndexMap<String, ScreenFactory>,
    extenders: HashMap<String, Vec<ScreenExtender>>,
}

impl ScreenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a screen factory under `slug`.
    ///
    /// # Errors
    ///
    /// Returns [`TypesetError::MissingSlug`] when `slug` is empty.
    pub fn register<F>(&mut self, slug: impl Into<String>, factory: F) -> Result<&mut Self>
    where
        F: Fn() -> Screen + Send + Sync + 'static,
    {
        let slug = slug.into();
        if slug.trim().is_empty() {
            return Err(TypesetError::MissingSlug);
        }
        debug!("screen `{slug}` registered");
        self.factories.insert(slug, Arc::new(factory));
        Ok(self)
    }

    /// Register an extender for the screen `slug`.
    ///
    /// Extenders run in registration order.
    pub fn extend<F>(&mut self, slug: impl Into<String>, extender: F) -> &mut Self
    where
        F: Fn(&mut Screen) + Send + Sync + 'static,
    {
        self.extenders
            .entry(slug.into())
            .or_default()
            .push(Arc::new(extender));
        self
    }

    /// Registered slugs in registration order.
    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.factories.contains_key(slug)
    }

    /// Build the screen `slug` and run its extenders.
    ///
    /// # Errors
    ///
    /// Returns [`TypesetError::UnknownScreen`] for unregistered slugs and
    /// [`TypesetError::MissingSlug`] when the factory produced an empty slug.
    pub fn build(&self, slug: &str) -> Result<Screen> {
        let factory = self
            .factories
            .get(slug)
            .ok_or_else(|| TypesetError::UnknownScreen(slug.to_string()))?;
        let mut screen = factory();
        if screen.slug.trim().is_empty() {
            return Err(TypesetError::MissingSlug);
        }
        for extender in self.extenders.get(slug).into_iter().flatten() {
            extender(&mut screen);
        }
        Ok(screen)
    }
}
