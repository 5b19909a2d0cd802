//! The domain registry: actions, task methods, unigoal methods, multigoal methods.
//!
//! A [`Domain`] is built once (via `add_*`) and then handed to the planner
//! read-only; many planner instances may share the same `Domain` across
//! threads since it never mutates after construction (§5: "re-entrant by
//! instance").

use crate::error::DomainError;
use crate::item::{ActionOutcome, MethodOutcome, TaskItem};
use crate::state::State;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A primitive action: evaluates against a state, producing a new state or a failure.
pub type ActionFn = Arc<dyn Fn(&State, &Value) -> ActionOutcome + Send + Sync>;

/// A task/unigoal/multigoal method: proposes a decomposition or fails.
pub type MethodFn = Arc<dyn Fn(&State, &Value) -> MethodOutcome + Send + Sync>;

/// The four ordered registries described in §4.2.
#[derive(Clone, Default)]
pub struct Domain {
    actions: HashMap<String, ActionFn>,
    task_methods: HashMap<String, Vec<MethodFn>>,
    unigoal_methods: HashMap<String, Vec<MethodFn>>,
    multigoal_methods: Vec<MethodFn>,
}

impl Domain {
    /// An empty domain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a primitive action under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::DuplicateAction`] if `name` is already registered.
    pub fn add_action(&mut self, name: impl Into<String>, f: ActionFn) -> Result<(), DomainError> {
        let name = name.into();
        if self.actions.contains_key(&name) {
            return Err(DomainError::DuplicateAction(name));
        }
        self.actions.insert(name, f);
        Ok(())
    }

    /// Append a task method for `name`. Methods are tried in the order appended.
    pub fn add_task_method(&mut self, name: impl Into<String>, f: MethodFn) {
        self.task_methods.entry(name.into()).or_default().push(f);
    }

    /// Append a unigoal method for `predicate`. Methods are tried in the order appended.
    pub fn add_unigoal_method(&mut self, predicate: impl Into<String>, f: MethodFn) {
        self.unigoal_methods.entry(predicate.into()).or_default().push(f);
    }

    /// Append a multigoal method, tried in the order appended for every multigoal.
    pub fn add_multigoal_method(&mut self, f: MethodFn) {
        self.multigoal_methods.push(f);
    }

    /// Look up the action registered under `name`.
    #[must_use]
    pub fn get_action(&self, name: &str) -> Option<&ActionFn> {
        self.actions.get(name)
    }

    /// The ordered list of task methods registered under `name`.
    #[must_use]
    pub fn get_task_methods(&self, name: &str) -> &[MethodFn] {
        self.task_methods.get(name).map_or(&[], Vec::as_slice)
    }

    /// The ordered list of unigoal methods registered for `predicate`.
    #[must_use]
    pub fn get_unigoal_methods(&self, predicate: &str) -> &[MethodFn] {
        self.unigoal_methods.get(predicate).map_or(&[], Vec::as_slice)
    }

    /// The ordered list of multigoal methods.
    #[must_use]
    pub fn get_multigoal_methods(&self) -> &[MethodFn] {
        &self.multigoal_methods
    }

    /// Check that `item`'s name has something registered for it at all
    /// (an action for [`TaskItem::Action`], a task method for
    /// [`TaskItem::Task`]), returning [`DomainError::UnknownSymbol`] if not.
    pub(crate) fn require_known(&self, item: &TaskItem) -> Result<(), DomainError> {
        match item {
            TaskItem::Action { name, .. } => {
                if self.actions.contains_key(name) {
                    Ok(())
                } else {
                    Err(DomainError::UnknownSymbol(name.clone()))
                }
            }
            TaskItem::Task { name, .. } => {
                if self.task_methods.contains_key(name) {
                    Ok(())
                } else {
                    Err(DomainError::UnknownSymbol(name.clone()))
                }
            }
            // Unigoal/Multigoal are always "known": an empty method list is a
            // legitimate (if unsatisfiable) domain, not a symbol error.
            TaskItem::Unigoal(_) | TaskItem::Multigoal(_) => Ok(()),
        }
    }
}
