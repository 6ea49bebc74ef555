//! # typeset
//!
//! A declarative engine for admin forms.
//!
//! Screens register nested maps of *typesets* describing their inputs and the
//! values those inputs persist. The engine normalizes the typesets, derives
//! default value trees, casts and sanitizes submitted values, and evaluates
//! the conditions that show, hide, enable or disable inputs.
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use typeset::{Caster, SanitizeRegistry, parse_value_typesets};
//!
//! let typesets = parse_value_typesets(&json!({
//!     "title_length": { "type": ["int", "string"], "value": 60 },
//! }))
//! .unwrap();
//!
//! let registry = SanitizeRegistry::with_builtins();
//! let raw = json!({ "title_length": "70" });
//! let values = Caster::new(&registry).cast_values(raw.as_object().unwrap(), &typesets);
//! assert_eq!(values["title_length"], json!(70));
//! ```
//!
//! ## Modules
//!
//! - [`data`] - Typeset, condition and form data structures
//! - [`cast`] - Casting raw values into clean value trees
//! - [`defaults`] - Default value generation
//! - [`eval`] - Condition evaluation
//! - [`sanitize`] - Named sanitize callbacks
//! - [`screen`] - Screen registry
//! - [`merge`] - Pure value tree merges

/// Casting raw submitted values into clean value trees.
pub mod cast;

/// Scalar coercions of submitted values.
pub mod coerce;

/// Typeset, condition and form data structures.
pub mod data;

/// Default value trees.
pub mod defaults;

/// Error types.
pub mod error;

/// Condition evaluation against live field values.
pub mod eval;

/// Pure merges over value trees.
pub mod merge;

/// Sanitize callbacks resolved by name.
pub mod sanitize;

/// Registry of admin screens.
pub mod screen;

pub use cast::Caster;
pub use data::{
    FormData,
    condition::{ConditionSet, validate_condition_set},
    option::{CastType, ValueTypeset, parse_value_typesets},
    typeset::{InputTypeset, validate_typeset, validate_typesets},
};
pub use defaults::{DefaultsMode, get_defaults};
pub use error::{Result, TypesetError};
pub use eval::{Effect, FieldValues, evaluate, resolve};
pub use sanitize::SanitizeRegistry;
pub use screen::{Screen, ScreenRegistry};
pub use serde_json::Value;
