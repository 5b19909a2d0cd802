//! The `Fact` data model: `(predicate, subject, value)` triples.

use serde_json::Value;
use std::fmt;

/// A `(predicate, subject)` pair identifying one fact slot in a [`State`](crate::state::State).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FactKey {
    /// The predicate name, e.g. `"on"` or `"loc"`.
    pub predicate: String,
    /// The subject the predicate is about, e.g. `"a"` or `"me"`.
    pub subject: String,
}

impl FactKey {
    /// Construct a new key from borrowed string-likes.
    pub fn new(predicate: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
            subject: subject.into(),
        }
    }
}

impl fmt::Display for FactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.predicate, self.subject)
    }
}

/// A complete fact: its key plus the value currently bound to it.
#[derive(Clone, Debug, PartialEq)]
pub struct Fact {
    /// The `(predicate, subject)` key.
    pub key: FactKey,
    /// The bound value. `Value::Null` is never stored -- setting a key to
    /// `Value::Null` removes it from the [`State`](crate::state::State) instead (§3: "the absent marker").
    pub value: Value,
}

/// The sentinel written to [`State::set`](crate::state::State::set) to remove a key.
///
/// Per §3: "Setting to a designated 'absent' marker removes the key."
#[must_use]
pub fn absent() -> Value {
    Value::Null
}
