//! Task-like items: the vocabulary the planner decomposes.

use serde_json::Value;
use std::fmt;

/// One entry of a [`TaskItem::Multigoal`]: a single `(predicate, subject, value)`
/// conjunct that must hold simultaneously with its siblings.
#[derive(Clone, Debug, PartialEq)]
pub struct Unigoal {
    /// The predicate name.
    pub predicate: String,
    /// The subject the predicate is about.
    pub subject: String,
    /// The value the goal requires the fact to hold.
    pub value: Value,
}

impl Unigoal {
    /// Build a unigoal conjunct.
    pub fn new(predicate: impl Into<String>, subject: impl Into<String>, value: Value) -> Self {
        Self {
            predicate: predicate.into(),
            subject: subject.into(),
            value,
        }
    }
}

/// A task-like item: what a [`crate::tree::SolutionTree`] node's label holds (§3).
#[derive(Clone, Debug, PartialEq)]
pub enum TaskItem {
    /// `(name, args)` resolving to a registered action. Primitive, never decomposed.
    Action { name: String, args: Value },
    /// `(name, args)` resolving to one or more task methods.
    Task { name: String, args: Value },
    /// A single fact that must hold at this point in the plan.
    Unigoal(Unigoal),
    /// A set of unigoals that must hold simultaneously once the multigoal is satisfied.
    Multigoal(Vec<Unigoal>),
}

impl TaskItem {
    /// Convenience constructor for an action item.
    pub fn action(name: impl Into<String>, args: Value) -> Self {
        Self::Action { name: name.into(), args }
    }

    /// Convenience constructor for a task item.
    pub fn task(name: impl Into<String>, args: Value) -> Self {
        Self::Task { name: name.into(), args }
    }

    /// Convenience constructor for a unigoal item.
    pub fn unigoal(predicate: impl Into<String>, subject: impl Into<String>, value: Value) -> Self {
        Self::Unigoal(Unigoal::new(predicate, subject, value))
    }

    /// Convenience constructor for a multigoal item.
    pub fn multigoal(goals: Vec<Unigoal>) -> Self {
        Self::Multigoal(goals)
    }

    /// A short human-readable name for logging, independent of args.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            TaskItem::Action { name, .. } => format!("action:{name}"),
            TaskItem::Task { name, .. } => format!("task:{name}"),
            TaskItem::Unigoal(g) => format!("unigoal:{}({})", g.predicate, g.subject),
            TaskItem::Multigoal(gs) => {
                let parts: Vec<String> = gs.iter().map(|g| format!("{}({})", g.predicate, g.subject)).collect();
                format!("multigoal:[{}]", parts.join(", "))
            }
        }
    }
}

impl fmt::Display for TaskItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The outcome of evaluating an action against a state.
#[derive(Clone, Debug)]
pub enum ActionOutcome {
    /// The action succeeded, producing the new state.
    Ok(crate::state::State),
    /// The action could not be applied, with a human-readable reason.
    Fail(String),
}

/// The outcome of evaluating a task/unigoal/multigoal method.
#[derive(Clone, Debug)]
pub enum MethodOutcome {
    /// The method applies; decompose into this (possibly empty) list of sub-items.
    Ok(Vec<TaskItem>),
    /// The method does not apply, with a human-readable reason.
    Fail(String),
}

impl MethodOutcome {
    /// The outcome substituted when a user method panics instead of returning.
    ///
    /// The search loop wraps every method call in `catch_unwind` and maps a
    /// caught panic to this outcome, so a misbehaving method can never
    /// unwind through the planner (§7: "a method raising an exception is
    /// treated as `fail(reason = \"method raised\")`").
    #[must_use]
    pub fn from_panic() -> Self {
        MethodOutcome::Fail("method raised".to_string())
    }
}
