//! Error handlers
//!
//! Validation reports every violation to an [`ErrorHandler`]. The handler
//! decides whether validation goes on (the violation is recorded) or stops
//! (the violation is wrapped in an [`Abort`] that unwinds the call).

use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::error::Abort;

use super::exceptions::ConstraintViolation;

/// Receives violations found during validation
pub trait ErrorHandler {
    /// Report a violation; returning `Err` stops validation
    fn error(&mut self, violation: ConstraintViolation) -> Result<(), Abort>;
}

impl<H: ErrorHandler + ?Sized> ErrorHandler for &mut H {
    fn error(&mut self, violation: ConstraintViolation) -> Result<(), Abort> {
        (**self).error(violation)
    }
}

/// Aborts on the first violation
#[derive(Debug, Clone, Copy, Default)]
pub struct FailFast;

impl ErrorHandler for FailFast {
    fn error(&mut self, violation: ConstraintViolation) -> Result<(), Abort> {
        Err(Abort::new(violation))
    }
}

/// Records violations and lets validation continue.
///
/// With a cap, the violation that reaches the cap is recorded and then
/// validation is aborted.
#[derive(Debug, Clone, Default)]
pub struct Collector {
    violations: Vec<ConstraintViolation>,
    max_errors: Option<usize>,
}

impl Collector {
    /// An uncapped collector
    pub fn new() -> Self {
        Self::default()
    }

    /// A collector that aborts once `max_errors` violations were recorded
    pub fn with_cap(max_errors: Option<usize>) -> Self {
        Self {
            violations: Vec::new(),
            max_errors,
        }
    }

    /// Recorded violations
    pub fn violations(&self) -> &[ConstraintViolation] {
        &self.violations
    }

    /// Take the recorded violations
    pub fn into_violations(self) -> Vec<ConstraintViolation> {
        self.violations
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Whether the cap was reached
    pub fn is_full(&self) -> bool {
        self.max_errors.is_some_and(|max| self.violations.len() >= max)
    }
}

impl ErrorHandler for Collector {
    fn error(&mut self, violation: ConstraintViolation) -> Result<(), Abort> {
        self.violations.push(violation.clone());
        if self.is_full() {
            warn!(max_errors = self.violations.len(), "error cap reached, aborting validation");
            return Err(Abort::new(violation));
        }
        Ok(())
    }
}

/// A collector that can be cloned into parallel validations of
/// independent subtrees; all clones record into the same list.
#[derive(Debug, Clone, Default)]
pub struct SharedCollector {
    inner: Arc<Mutex<Collector>>,
}

impl SharedCollector {
    /// An uncapped shared collector
    pub fn new() -> Self {
        Self::default()
    }

    /// A shared collector with an error cap over all clones
    pub fn with_cap(max_errors: Option<usize>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Collector::with_cap(max_errors))),
        }
    }

    /// Snapshot of the recorded violations
    pub fn violations(&self) -> Vec<ConstraintViolation> {
        match self.inner.lock() {
            Ok(collector) => collector.violations.clone(),
            Err(poisoned) => poisoned.into_inner().violations.clone(),
        }
    }
}

impl ErrorHandler for SharedCollector {
    fn error(&mut self, violation: ConstraintViolation) -> Result<(), Abort> {
        match self.inner.lock() {
            Ok(mut collector) => collector.error(violation),
            Err(poisoned) => poisoned.into_inner().error(violation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::QName;
    use crate::validators::exceptions::ElementViolation;

    fn violation(name: &str) -> ConstraintViolation {
        ElementViolation::NoDeclaration {
            element: QName::local(name),
        }
        .into()
    }

    #[test]
    fn test_fail_fast_aborts() {
        let mut handler = FailFast;
        let abort = handler.error(violation("a")).unwrap_err();
        assert_eq!(abort.violation, violation("a"));
    }

    #[test]
    fn test_collector_continues() {
        let mut handler = Collector::new();
        handler.error(violation("a")).unwrap();
        handler.error(violation("b")).unwrap();
        assert_eq!(handler.violations().len(), 2);
        assert!(!handler.is_full());
    }

    #[test]
    fn test_collector_cap() {
        let mut handler = Collector::with_cap(Some(2));
        handler.error(violation("a")).unwrap();
        let abort = handler.error(violation("b")).unwrap_err();
        assert_eq!(abort.violation, violation("b"));
        assert_eq!(handler.into_violations().len(), 2);
    }

    #[test]
    fn test_shared_collector_across_threads() {
        let shared = SharedCollector::new();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let mut handler = shared.clone();
                std::thread::spawn(move || handler.error(violation(&format!("e{}", i))))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        assert_eq!(shared.violations().len(), 4);
    }
}
