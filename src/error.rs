//! Error types. The parser itself never fails (see [`crate::diagnostics`]);
//! `thiserror` is reserved for genuinely fallible entry points such as
//! configuration construction.

use thiserror::Error;

/// Raised when a [`crate::config::Configuration`] is built with
/// self-contradictory options.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("allow_schemes must not be empty")]
    EmptySchemeSet,
    #[error("scheme {0:?} was given in two conflicting cases")]
    ConflictingScheme(String),
}

/// Raised by fallible heading-level conversions.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("heading level {0} is out of the supported range 1..=6")]
pub struct HeadingLevelError(pub u8);
