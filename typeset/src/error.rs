//! Error types for the typeset engine.
//!
//! Data-shape problems in registered typesets or submitted values are never
//! reported through these types: offending nodes are dropped and logged.
//! [`TypesetError`] covers construction-time misuse only.

use thiserror::Error;

/// Hard errors raised while building typed trees or registries.
#[derive(Debug, Error)]
pub enum TypesetError {
    /// A value in a typeset had an unexpected JSON shape.
    #[error("type mismatch at `{path}`: expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// A cast type name is not part of the cast vocabulary.
    #[error("unknown cast type `{name}` at `{path}`")]
    UnknownCastType { path: String, name: String },

    /// A screen was registered without an identifying slug.
    #[error("screen registered without a slug")]
    MissingSlug,

    /// A screen slug was requested that nothing registered.
    #[error("no screen registered under `{0}`")]
    UnknownScreen(String),

    /// A values file used an extension other than `json` or `toml`.
    #[error("unsupported values file extension: {0:?}")]
    UnsupportedExtension(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, TypesetError>;
