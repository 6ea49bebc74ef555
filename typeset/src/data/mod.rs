//! Typeset data structures.
//!
//! - [`typeset`] - Input typesets and their validation
//! - [`condition`] - Condition sets and their validation
//! - [`option`] - Value typesets driving casts and defaults
//! - [`callback`] - `[callableRef, ...args]` references
//! - [`types`] - Input type and layout vocabularies
//! - [`form`] - Per-request form state bound to a values file

/// Callback references used by `esc` and `sanitize` lists.
pub mod callback;

/// Condition sets controlling visibility and enablement.
pub mod condition;

/// Form state bound to a values file.
pub mod form;

/// Value typesets describing persisted values.
pub mod option;

/// Input typesets describing admin form inputs.
pub mod typeset;

/// Input type and layout vocabularies.
pub mod types;

pub use form::FormData;
