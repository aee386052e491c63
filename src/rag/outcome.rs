//! Ready-or-degraded results

use serde::Serialize;
use std::fmt;

/// Why an operation fell back to its zero value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedReason {
    /// Startup failed; the system runs without retrieval
    NotInitialized,
    /// The embedding provider failed for this call
    Embedding,
    /// The vector store failed for this call
    Store,
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradedReason::NotInitialized => write!(f, "not_initialized"),
            DegradedReason::Embedding => write!(f, "embedding"),
            DegradedReason::Store => write!(f, "store"),
        }
    }
}

/// Result of an orchestrator operation.
///
/// A degraded outcome still carries a value: the operation's documented
/// zero-value shape (empty lists, zero scores, zero counts). Callers that do
/// not care can take [`Outcome::into_value`]; callers that do can inspect
/// [`Outcome::reason`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Ready { value: T },
    Degraded { reason: DegradedReason, value: T },
}

impl<T> Outcome<T> {
    pub fn ready(value: T) -> Self {
        Outcome::Ready { value }
    }

    pub fn degraded(reason: DegradedReason, value: T) -> Self {
        Outcome::Degraded { reason, value }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Outcome::Ready { .. })
    }

    pub fn is_degraded(&self) -> bool {
        !self.is_ready()
    }

    pub fn reason(&self) -> Option<DegradedReason> {
        match self {
            Outcome::Ready { .. } => None,
            Outcome::Degraded { reason, .. } => Some(*reason),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Ready { value } | Outcome::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Ready { value } | Outcome::Degraded { value, .. } => value,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Ready { value } => Outcome::Ready { value: f(value) },
            Outcome::Degraded { reason, value } => Outcome::Degraded {
                reason,
                value: f(value),
            },
        }
    }
}

impl<T: Default> Outcome<T> {
    /// Degraded outcome carrying the zero value
    pub fn empty(reason: DegradedReason) -> Self {
        Outcome::degraded(reason, T::default())
    }
}

/// Collects sub-lookup outcomes into one composite outcome.
/// The first degradation reason wins.
#[derive(Debug, Default)]
pub(crate) struct Degradation(Option<DegradedReason>);

impl Degradation {
    pub(crate) fn take<T>(&mut self, outcome: Outcome<T>) -> T {
        if let Some(reason) = outcome.reason() {
            self.0.get_or_insert(reason);
        }
        outcome.into_value()
    }

    pub(crate) fn finish<T>(self, value: T) -> Outcome<T> {
        match self.0 {
            Some(reason) => Outcome::degraded(reason, value),
            None => Outcome::ready(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degradation_first_reason_wins() {
        let mut degradation = Degradation::default();
        let a = degradation.take(Outcome::ready(1));
        let b = degradation.take(Outcome::degraded(DegradedReason::Store, 0));
        let c = degradation.take(Outcome::degraded(DegradedReason::Embedding, 0));

        let combined = degradation.finish(a + b + c);
        assert_eq!(combined, Outcome::degraded(DegradedReason::Store, 1));

        assert!(Degradation::default().finish(()).is_ready());
    }

    #[test]
    fn test_degraded_keeps_value_and_reason() {
        let outcome: Outcome<Vec<String>> = Outcome::empty(DegradedReason::Store);
        assert!(outcome.is_degraded());
        assert_eq!(outcome.reason(), Some(DegradedReason::Store));
        assert!(outcome.value().is_empty());
    }

    #[test]
    fn test_map_preserves_state() {
        let ready = Outcome::ready(2).map(|v| v * 10);
        assert_eq!(ready, Outcome::ready(20));

        let degraded = Outcome::degraded(DegradedReason::Embedding, 1).map(|v| v + 1);
        assert_eq!(degraded.reason(), Some(DegradedReason::Embedding));
        assert_eq!(degraded.into_value(), 2);
    }

    #[test]
    fn test_serializes_with_status_tag() {
        let ready = serde_json::to_value(Outcome::ready(vec!["a"])).unwrap();
        assert_eq!(ready, serde_json::json!({"status": "ready", "value": ["a"]}));

        let degraded =
            serde_json::to_value(Outcome::<Vec<String>>::empty(DegradedReason::NotInitialized))
                .unwrap();
        assert_eq!(
            degraded,
            serde_json::json!({"status": "degraded", "reason": "not_initialized", "value": []})
        );
    }
}
