//! Limits and options for instance validation
//!
//! Validation walks the instance and the particle trees recursively; these
//! limits bound that recursion and the amount of work done per value.
//! They can be loaded from JSON so deployments can tune them without code.

use serde::{Deserialize, Serialize};

use crate::atoms::casting::CastingContext;
use crate::error::{Error, Result};

/// Resource limits for a validation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum element nesting depth of the instance
    pub max_depth: usize,

    /// Maximum particle nesting depth visited by the content matcher
    pub max_model_depth: usize,

    /// Maximum number of tokens in a list value
    pub max_list_items: usize,

    /// Maximum number of violations a collecting handler keeps (None = all)
    pub max_errors: Option<usize>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 1000,
            max_model_depth: 256,
            max_list_items: 100_000,
            max_errors: None,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_depth: 100,
            max_model_depth: 32,
            max_list_items: 1000,
            max_errors: Some(100),
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_depth: 10_000,
            max_model_depth: 4096,
            max_list_items: 10_000_000,
            max_errors: None,
        }
    }

    /// Load limits from a JSON object; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check if element depth is within limits
    pub fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            Err(Error::LimitExceeded(format!(
                "element depth {} exceeds maximum {}",
                depth, self.max_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if particle nesting depth is within limits
    pub fn check_model_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_model_depth {
            Err(Error::LimitExceeded(format!(
                "content model depth {} exceeds maximum {}",
                depth, self.max_model_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if the number of list items is within limits
    pub fn check_list_items(&self, count: usize) -> Result<()> {
        if count > self.max_list_items {
            Err(Error::LimitExceeded(format!(
                "list of {} items exceeds maximum {}",
                count, self.max_list_items
            )))
        } else {
            Ok(())
        }
    }
}

/// Options for a single validation run
#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    /// Resource limits
    pub limits: Limits,
    /// Casting policy used when typed values are produced
    pub casting: CastingContext,
    /// Materialize default values of absent attributes
    pub apply_defaults: bool,
}

impl ValidationOptions {
    /// Create options with default limits, defaults applied
    pub fn new() -> Self {
        Self {
            apply_defaults: true,
            ..Self::default()
        }
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the casting context
    pub fn with_casting(mut self, casting: CastingContext) -> Self {
        self.casting = casting;
        self
    }

    /// Enable or disable default materialization
    pub fn with_defaults(mut self, apply: bool) -> Self {
        self.apply_defaults = apply;
        self
    }
}
