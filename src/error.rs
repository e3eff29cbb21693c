//! Error types for xmlschema-typed
//!
//! Validation failures are *values* ([`ConstraintViolation`]) handed to an
//! [`ErrorHandler`](crate::validators::handlers::ErrorHandler). The enum in
//! this module covers everything else: the terminal abort signal raised by a
//! fail-fast handler, broken schema graphs, contract violations by callers,
//! resource limits and input parsing problems.

use std::fmt;
use thiserror::Error;

use crate::validators::exceptions::{ConstraintViolation, ValidationOutcome};

/// Result type alias using the crate [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for xmlschema-typed operations
#[derive(Error, Debug)]
pub enum Error {
    /// Validation was aborted by the handler; wraps the violation that triggered it
    #[error("validation aborted: {0}")]
    Aborted(#[from] Abort),

    /// The schema graph could not be built or locked
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A programming contract was violated (unknown component, unlocked cache, ...)
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Value error (invalid literal handed to an API outside validation)
    #[error("value error: {0}")]
    Value(String),

    /// Namespace error
    #[error("namespace error: {0}")]
    Namespace(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// JSON configuration error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a [`Error::Precondition`]
    pub fn precondition(message: impl Into<String>) -> Self {
        Error::Precondition(message.into())
    }

    /// The violation wrapped by an abort, if this is one
    pub fn violation(&self) -> Option<&ConstraintViolation> {
        match self {
            Error::Aborted(abort) => Some(&abort.violation),
            _ => None,
        }
    }
}

/// Terminal signal raised by a handler that refuses to continue.
///
/// Carries the first violation it was handed, so fail-fast callers still get
/// the constraint-numbered diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abort {
    /// The violation that caused the abort
    pub violation: ConstraintViolation,
}

impl Abort {
    /// Wrap a violation
    pub fn new(violation: ConstraintViolation) -> Self {
        Self { violation }
    }
}

impl fmt::Display for Abort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.violation)
    }
}

impl std::error::Error for Abort {}

/// Error found while building or locking the component graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    /// Constraint on schema components that was broken
    pub outcome: ValidationOutcome,
    /// Error message
    pub message: String,
    /// Name of the offending component, if it has one
    pub component: Option<String>,
}

impl SchemaError {
    /// Create a new schema error
    pub fn new(outcome: ValidationOutcome, message: impl Into<String>) -> Self {
        Self {
            outcome,
            message: message.into(),
            component: None,
        }
    }

    /// Set the offending component
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.outcome, self.message)?;
        if let Some(ref component) = self.component {
            write!(f, " (component '{}')", component)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}
