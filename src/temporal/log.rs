//! The time-indexed fact log overlaying [`State`](crate::state::State) (§4.5, §9).
//!
//! Represented as a flat ordered vector rather than a segment tree: the
//! predecessor's own checkpoint/config structures favor simple `Vec`-backed
//! collections over specialized trees unless profiling demanded otherwise,
//! and the executor's append rate here is low enough that a linear scan per
//! query is not a bottleneck (§9: "simpler ordered vector when sizes are small").

use crate::state::State;
use serde_json::Value;

/// One recorded interval: `(predicate, subject, value, start, end)`, with
/// `end = None` meaning the effect is permanent (never ends) (§4.5).
#[derive(Clone, Debug, PartialEq)]
pub struct Interval {
    pub predicate: String,
    pub subject: String,
    pub value: Value,
    pub start: f64,
    pub end: Option<f64>,
}

/// An append-only sequence of timed fact intervals (§4.5, §9).
#[derive(Clone, Debug, Default)]
pub struct TemporalLog {
    intervals: Vec<Interval>,
}

impl TemporalLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interval. Intervals are kept in insertion order; queries
    /// scan from the most recent, so a later `record` for the same key
    /// shadows earlier ones at times it covers.
    pub fn record(&mut self, predicate: impl Into<String>, subject: impl Into<String>, value: Value, start: f64, end: Option<f64>) {
        self.intervals.push(Interval {
            predicate: predicate.into(),
            subject: subject.into(),
            value,
            start,
            end,
        });
    }

    /// The value of the latest interval for `(predicate, subject)` starting
    /// at or before `t` and not yet ended at `t` (§4.5's `get_at`).
    #[must_use]
    pub fn get_at(&self, predicate: &str, subject: &str, t: f64) -> Option<&Value> {
        self.intervals
            .iter()
            .rev()
            .filter(|iv| iv.predicate == predicate && iv.subject == subject)
            .find(|iv| iv.start <= t && iv.end.is_none_or(|e| t < e))
            .map(|iv| &iv.value)
    }

    /// Derive the canonical "current" state at `t`: for every key that has
    /// at least one interval, the value of the latest interval covering `t`,
    /// if any (§4.5's `advance_to`).
    #[must_use]
    pub fn advance_to(&self, t: f64) -> State {
        let mut keys: Vec<(&str, &str)> = self.intervals.iter().map(|iv| (iv.predicate.as_str(), iv.subject.as_str())).collect();
        keys.sort_unstable();
        keys.dedup();

        let mut state = State::new();
        for (predicate, subject) in keys {
            if let Some(value) = self.get_at(predicate, subject, t) {
                state = state.set(predicate, subject, value.clone());
            }
        }
        state
    }

    /// All recorded intervals, in insertion order.
    #[must_use]
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_at_returns_the_covering_interval() {
        let mut log = TemporalLog::new();
        log.record("loc", "me", json!("home"), 0.0, Some(5.0));
        log.record("loc", "me", json!("park"), 5.0, None);
        assert_eq!(log.get_at("loc", "me", 2.0), Some(&json!("home")));
        assert_eq!(log.get_at("loc", "me", 5.0), Some(&json!("park")));
        assert_eq!(log.get_at("loc", "me", 100.0), Some(&json!("park")));
    }

    #[test]
    fn get_at_before_any_interval_is_none() {
        let mut log = TemporalLog::new();
        log.record("loc", "me", json!("home"), 10.0, None);
        assert_eq!(log.get_at("loc", "me", 0.0), None);
    }

    #[test]
    fn advance_to_derives_a_full_state_snapshot() {
        let mut log = TemporalLog::new();
        log.record("loc", "me", json!("home"), 0.0, Some(5.0));
        log.record("loc", "me", json!("park"), 5.0, None);
        log.record("cash", "me", json!(20), 0.0, None);
        let state = log.advance_to(7.0);
        assert_eq!(state.get("loc", "me"), Some(&json!("park")));
        assert_eq!(state.get("cash", "me"), Some(&json!(20)));
    }
}
