//! The keyed fact store: a purely functional `(predicate, subject) -> value` mapping.
//!
//! Backed by [`im::HashMap`] (grounded in spec.md §9's "persistent keyed-map
//! representation so state forks share structure" design note) so that
//! `set`/`remove` are O(log n)-amortized structural updates rather than full
//! copies -- the planner forks a state at every decomposition step, so this
//! is on the hot path.

use crate::fact::{absent, FactKey};
use im::HashMap as PersistentMap;
use serde_json::Value;
use std::fmt;

/// A purely functional mapping from `(predicate, subject)` to a value.
///
/// Every mutating method returns a *new* `State`; the receiver is left
/// untouched. This is what lets the planner fork a state per sibling without
/// the siblings observing each other's effects (§3, §9).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct State {
    facts: PersistentMap<FactKey, Value>,
}

impl State {
    /// An empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new state with `(predicate, subject)` bound to `value`.
    ///
    /// Passing [`absent()`] for `value` removes the key instead of binding it
    /// to `Value::Null` (§3).
    #[must_use]
    pub fn set(&self, predicate: impl Into<String>, subject: impl Into<String>, value: Value) -> Self {
        let key = FactKey::new(predicate, subject);
        let mut facts = self.facts.clone();
        if value == absent() {
            facts.remove(&key);
        } else {
            facts.insert(key, value);
        }
        Self { facts }
    }

    /// Return a new state with `(predicate, subject)` removed, if present.
    #[must_use]
    pub fn remove(&self, predicate: impl Into<String>, subject: impl Into<String>) -> Self {
        self.set(predicate, subject, absent())
    }

    /// Look up `(predicate, subject)`. Returns `None` (the "absent" value) if unbound.
    #[must_use]
    pub fn get(&self, predicate: &str, subject: &str) -> Option<&Value> {
        self.facts.get(&FactKey::new(predicate, subject))
    }

    /// Look up `(predicate, subject)`, returning `Value::Null` for an unbound key.
    ///
    /// Convenience for call sites that want to compare against a goal value
    /// directly without matching on `Option`.
    #[must_use]
    pub fn get_or_absent(&self, predicate: &str, subject: &str) -> Value {
        self.get(predicate, subject).cloned().unwrap_or_else(absent)
    }

    /// Structural equality between two states (same bound keys, same values).
    #[must_use]
    pub fn equals(&self, other: &State) -> bool {
        self == other
    }

    /// Number of bound facts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Whether the state has no bound facts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Iterate over all bound `(key, value)` pairs, in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&FactKey, &Value)> {
        self.facts.iter()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self.facts.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        write!(f, "{{")?;
        for (i, (key, value)) in entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_then_get_roundtrips() {
        let s = State::new().set("on", "a", json!("b"));
        assert_eq!(s.get("on", "a"), Some(&json!("b")));
    }

    #[test]
    fn set_is_purely_functional() {
        let s0 = State::new();
        let s1 = s0.set("on", "a", json!("b"));
        assert!(s0.get("on", "a").is_none());
        assert_eq!(s1.get("on", "a"), Some(&json!("b")));
    }

    #[test]
    fn setting_absent_removes_key() {
        let s = State::new()
            .set("on", "a", json!("b"))
            .set("on", "a", absent());
        assert!(s.get("on", "a").is_none());
        assert!(s.is_empty());
    }

    #[test]
    fn equals_is_structural() {
        let a = State::new().set("on", "a", json!("b")).set("clear", "c", json!(true));
        let b = State::new().set("clear", "c", json!(true)).set("on", "a", json!("b"));
        assert!(a.equals(&b));
    }
}
