//! Error types for argument conversion and bus configuration

use thiserror::Error;

/// A published argument could not be converted into the type a handler expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("argument {index}: expected `{expected}`, found `{found}`")]
pub struct ConversionError {
    /// Zero-based argument position
    pub index: usize,

    /// Type name the handler declared for this position
    pub expected: &'static str,

    /// Type name of the value that was published
    pub found: &'static str,
}

/// Reason a handler was not invoked for a published event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("not enough arguments: expected {expected}, got {provided}")]
    InsufficientArguments { expected: usize, provided: usize },

    #[error("{} argument(s) did not match the handler signature", .0.len())]
    TypeMismatch(Vec<ConversionError>),
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Unknown mismatch policy: {0}")]
    UnknownPolicy(String),
}
