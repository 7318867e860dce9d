//! Outcomes of best-effort steps.
//!
//! Non-critical work (indexing, normalization, synthesis) never fails a
//! handler. Each step resolves to an [`Outcome`] carrying either its value or
//! a substitute plus the reason it degraded, and a [`TaskLedger`] records the
//! degradations so they can be logged and surfaced in metadata.

use serde_json::{json, Value};
use std::fmt::Display;
use tracing::warn;

/// Result of a step that may fall back to a substitute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ok(T),
    Degraded { value: T, reason: String },
}

impl<T> Outcome<T> {
    /// Keep the success value, or substitute `fallback` and remember the error.
    pub fn from_result<E: Display>(result: Result<T, E>, fallback: impl FnOnce() -> T) -> Self {
        match result {
            Ok(value) => Outcome::Ok(value),
            Err(e) => Outcome::Degraded {
                value: fallback(),
                reason: e.to_string(),
            },
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Ok(value) | Outcome::Degraded { value, .. } => value,
        }
    }
}

/// Record of the best-effort steps a handler ran.
#[derive(Debug, Default)]
pub struct TaskLedger {
    entries: Vec<(String, Option<String>)>,
}

impl TaskLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a step's outcome and hand back its value.
    pub fn record<T>(&mut self, task: impl Into<String>, outcome: Outcome<T>) -> T {
        let task = task.into();
        if let Some(reason) = outcome.reason() {
            warn!(task = %task, reason = %reason, "Non-critical step degraded");
        }
        self.entries
            .push((task, outcome.reason().map(str::to_string)));
        outcome.into_value()
    }

    /// Number of degraded steps recorded so far.
    pub fn degraded_count(&self) -> usize {
        self.entries.iter().filter(|(_, r)| r.is_some()).count()
    }

    /// Metadata form: `{"<task>": "ok" | {"degraded": "<reason>"}}`.
    pub fn to_metadata(&self) -> Value {
        let map = self
            .entries
            .iter()
            .map(|(task, reason)| {
                let status = match reason {
                    None => json!("ok"),
                    Some(reason) => json!({ "degraded": reason }),
                };
                (task.clone(), status)
            })
            .collect::<serde_json::Map<_, _>>();
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_result_ok() {
        let outcome = Outcome::from_result(Ok::<_, String>(3), || 0);
        assert_eq!(outcome, Outcome::Ok(3));
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.into_value(), 3);
    }

    #[test]
    fn test_from_result_degraded() {
        let outcome = Outcome::from_result(Err::<i32, _>("boom"), || 7);
        assert!(outcome.is_degraded());
        assert_eq!(outcome.reason(), Some("boom"));
        assert_eq!(outcome.into_value(), 7);
    }

    #[test]
    fn test_ledger_metadata() {
        let mut ledger = TaskLedger::new();
        let a = ledger.record("identify", Outcome::Ok(vec!["FastAPI"]));
        let b = ledger.record(
            "synthesize",
            Outcome::Degraded {
                value: "fallback".to_string(),
                reason: "timeout".to_string(),
            },
        );

        assert_eq!(a, vec!["FastAPI"]);
        assert_eq!(b, "fallback");
        assert_eq!(ledger.degraded_count(), 1);
        assert_eq!(
            ledger.to_metadata(),
            json!({"identify": "ok", "synthesize": {"degraded": "timeout"}})
        );
    }
}
