//! The depth-first, leftmost-outermost resolution loop (§4.3).

use crate::domain::{ActionFn, Domain, MethodFn};
use crate::error::PlannerError;
use crate::item::{ActionOutcome, MethodOutcome, TaskItem};
use crate::node_id::NodeId;
use crate::planner::PlannerOptions;
use crate::state::State;
use crate::tree::{NodeKind, NodeStatus, SolutionTree};
use serde_json::{json, Value};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Call a user action, converting a panic into `Fail("method raised")` so it
/// can never unwind through the planner (§7).
pub(crate) fn call_action_safely(action: &ActionFn, state: &State, args: &Value) -> ActionOutcome {
    match catch_unwind(AssertUnwindSafe(|| action(state, args))) {
        Ok(outcome) => outcome,
        Err(_) => ActionOutcome::Fail("method raised".to_string()),
    }
}

fn call_method_safely(method: &MethodFn, state: &State, args: &Value) -> MethodOutcome {
    match catch_unwind(AssertUnwindSafe(|| method(state, args))) {
        Ok(outcome) => outcome,
        Err(_) => MethodOutcome::from_panic(),
    }
}

/// The entering state for `node_id`, deriving it from the predecessor
/// sibling's exit state (or the parent's entering state, for a first child)
/// if not already known, and caching the result on the node.
fn ensure_state_in(tree: &mut SolutionTree, node_id: NodeId) -> State {
    if let Some(state) = tree.get(node_id).and_then(|n| n.state_in.clone()) {
        return state;
    }
    let parent_id = tree.get(node_id).and_then(|n| n.parent).expect("non-root node has a parent");
    let parent = tree.get(parent_id).expect("parent present");
    let index = parent.children.iter().position(|c| *c == node_id).expect("node is parent's child");
    let state = if index == 0 {
        parent.state_in.clone().expect("parent state_in set before decomposition")
    } else {
        let prev = parent.children[index - 1];
        tree.get(prev).and_then(|n| n.state_out.clone()).expect("prior sibling resolved before this one is reached")
    };
    if let Some(node) = tree.get_mut(node_id) {
        node.state_in = Some(state.clone());
    }
    state
}

/// How many alternatives exist at `node` (methods, or the default multigoal
/// split counted as one extra virtual method, or a single pseudo-attempt for
/// an action).
fn method_count(domain: &Domain, node: &crate::tree::Node) -> usize {
    match (&node.kind, &node.label) {
        (NodeKind::Action, _) => 1,
        (NodeKind::Task, Some(TaskItem::Task { name, .. })) => domain.get_task_methods(name).len(),
        (NodeKind::Unigoal, Some(TaskItem::Unigoal(g))) => domain.get_unigoal_methods(&g.predicate).len(),
        (NodeKind::Multigoal, Some(TaskItem::Multigoal(_))) => domain.get_multigoal_methods().len() + 1,
        _ => 0,
    }
}

/// Walk from a newly-resolved `node_id` up through ancestors whose last child
/// just resolved, stamping `state_out` along the way. For a `Multigoal`
/// ancestor, re-verifies all of its constituent goals before closing; on
/// verification failure the multigoal's current attempt (whichever method,
/// including the default split) is abandoned via `advance_method` and the
/// walk stops there, leaving the multigoal `Open` for retry (§4.3).
pub(crate) fn try_close(tree: &mut SolutionTree, node_id: NodeId) {
    let mut current = node_id;
    loop {
        let Some(node) = tree.get(current) else { return };
        let candidate_state = if node.children.is_empty() {
            node.state_out.clone()
        } else {
            let last = *node.children.last().expect("non-empty");
            tree.get(last).and_then(|c| c.state_out.clone())
        };
        let Some(state_out) = candidate_state else { return };

        if node.kind == NodeKind::Multigoal
            && let Some(TaskItem::Multigoal(goals)) = node.label.clone()
        {
            let satisfied = goals.iter().all(|g| state_out.get_or_absent(&g.predicate, &g.subject) == g.value);
            if !satisfied {
                tree.advance_method(current);
                return;
            }
        }

        if let Some(node) = tree.get_mut(current) {
            node.state_out = Some(state_out);
        }

        let Some(parent_id) = tree.get(current).and_then(|n| n.parent) else { return };
        let is_last_child = tree.get(parent_id).is_some_and(|p| p.children.last() == Some(&current));
        if !is_last_child {
            return;
        }
        current = parent_id;
    }
}

/// Prune `failed_id`'s remnants and walk up advancing ancestor method
/// indices until one has an untried alternative, or the root is reached
/// (whole-plan failure) (§4.3).
fn backtrack(tree: &mut SolutionTree, domain: &Domain, failed_id: NodeId) -> Result<(), PlannerError> {
    let mut current = failed_id;
    loop {
        let Some(parent_id) = tree.get(current).and_then(|n| n.parent) else {
            return Err(PlannerError::GoalUnreachable(format!("no alternative at {current}")));
        };
        if parent_id == tree.root_id() {
            let label = tree.get(current).and_then(|n| n.label.as_ref()).map(TaskItem::label).unwrap_or_default();
            return Err(PlannerError::NoMethodApplicable(label));
        }
        let parent = tree.get(parent_id).expect("parent present").clone();
        let exhausted_after_advance = parent.method_index + 1 >= method_count(domain, &parent);
        tree.advance_method(parent_id);
        if exhausted_after_advance {
            if let Some(p) = tree.get_mut(parent_id) {
                p.status = NodeStatus::Failed;
            }
            current = parent_id;
        } else {
            return Ok(());
        }
    }
}

fn depth_of(tree: &SolutionTree, node_id: NodeId) -> usize {
    tree.path_to_root(node_id).len()
}

/// Resolve one node and return whether the overall search should keep going.
fn resolve(tree: &mut SolutionTree, domain: &Domain, node_id: NodeId, options: &PlannerOptions) -> Result<(), PlannerError> {
    let node = tree.get(node_id).expect("node present").clone();
    let label_str = node.label.as_ref().map(TaskItem::label).unwrap_or_default();
    if tree.is_blacklisted(&label_str) {
        if let Some(n) = tree.get_mut(node_id) {
            n.status = NodeStatus::Blacklisted;
        }
        return backtrack(tree, domain, node_id);
    }

    // An action/task name with nothing at all registered for it is a domain
    // error, not "no alternative applied here" -- surfacing it as
    // `NoMethodApplicable` (or a `BoundExceeded` timeout chasing it) would
    // make the two indistinguishable to a caller matching on the error kind
    // (§7). This check is unconditional on the error result: an unknown
    // symbol can never be recovered by backtracking to a sibling method.
    if let Some(label) = &node.label {
        domain.require_known(label)?;
    }

    match (&node.kind, node.label.clone()) {
        (NodeKind::Action, Some(TaskItem::Action { name, args })) => {
            let state = ensure_state_in(tree, node_id);
            let action = domain.get_action(&name).expect("require_known checked above");
            if options.verbose_level >= 2 {
                tracing::debug!(node = %node_id, action = %name, "evaluating action");
            }
            match call_action_safely(action, &state, &args) {
                ActionOutcome::Ok(new_state) => {
                    if let Some(n) = tree.get_mut(node_id) {
                        n.status = NodeStatus::Executed;
                        n.state_out = Some(new_state);
                    }
                    try_close(tree, node_id);
                    Ok(())
                }
                ActionOutcome::Fail(reason) => {
                    if options.verbose_level >= 1 {
                        tracing::info!(node = %node_id, action = %name, %reason, "action failed");
                    }
                    if let Some(n) = tree.get_mut(node_id) {
                        n.status = NodeStatus::Failed;
                    }
                    backtrack(tree, domain, node_id)
                }
            }
        }
        (NodeKind::Task, Some(TaskItem::Task { name, args })) => {
            let methods = domain.get_task_methods(&name);
            if node.method_index >= methods.len() {
                if let Some(n) = tree.get_mut(node_id) {
                    n.status = NodeStatus::Failed;
                }
                return backtrack(tree, domain, node_id);
            }
            let state = ensure_state_in(tree, node_id);
            match call_method_safely(&methods[node.method_index], &state, &args) {
                MethodOutcome::Ok(children) => {
                    let ids = tree.install_children(node_id, children);
                    if ids.is_empty() {
                        try_close(tree, node_id);
                    }
                    Ok(())
                }
                MethodOutcome::Fail(_) => {
                    tree.advance_method(node_id);
                    Ok(())
                }
            }
        }
        (NodeKind::Unigoal, Some(TaskItem::Unigoal(goal))) => {
            let state = ensure_state_in(tree, node_id);
            if state.get_or_absent(&goal.predicate, &goal.subject) == goal.value {
                tree.install_children(node_id, vec![]);
                try_close(tree, node_id);
                return Ok(());
            }
            let methods = domain.get_unigoal_methods(&goal.predicate);
            if node.method_index >= methods.len() {
                if let Some(n) = tree.get_mut(node_id) {
                    n.status = NodeStatus::Failed;
                }
                return backtrack(tree, domain, node_id);
            }
            let args = json!({ "subject": goal.subject, "value": goal.value });
            match call_method_safely(&methods[node.method_index], &state, &args) {
                MethodOutcome::Ok(children) => {
                    let ids = tree.install_children(node_id, children);
                    if ids.is_empty() {
                        try_close(tree, node_id);
                    }
                    Ok(())
                }
                MethodOutcome::Fail(_) => {
                    tree.advance_method(node_id);
                    Ok(())
                }
            }
        }
        (NodeKind::Multigoal, Some(TaskItem::Multigoal(goals))) => {
            let state = ensure_state_in(tree, node_id);
            let methods = domain.get_multigoal_methods();
            if node.method_index >= methods.len() + 1 {
                if let Some(n) = tree.get_mut(node_id) {
                    n.status = NodeStatus::Failed;
                }
                return backtrack(tree, domain, node_id);
            }
            if node.method_index < methods.len() {
                let args = Value::Null;
                match call_method_safely(&methods[node.method_index], &state, &args) {
                    MethodOutcome::Ok(children) => {
                        let ids = tree.install_children(node_id, children);
                        if ids.is_empty() {
                            try_close(tree, node_id);
                        }
                        Ok(())
                    }
                    MethodOutcome::Fail(_) => {
                        tree.advance_method(node_id);
                        Ok(())
                    }
                }
            } else {
                // The default "split" strategy (§4.3): decompose into the
                // sequence of constituent unigoals, order preserved.
                let children: Vec<TaskItem> = goals.into_iter().map(TaskItem::Unigoal).collect();
                let ids = tree.install_children(node_id, children);
                if ids.is_empty() {
                    try_close(tree, node_id);
                }
                Ok(())
            }
        }
        _ => {
            if let Some(n) = tree.get_mut(node_id) {
                n.status = NodeStatus::Failed;
            }
            backtrack(tree, domain, node_id)
        }
    }
}

/// Drive the search to completion (every node resolved) or report why it
/// cannot finish.
pub(crate) fn run(domain: &Domain, tree: &mut SolutionTree, options: &PlannerOptions) -> Result<(), PlannerError> {
    let mut attempts = 0usize;
    loop {
        let Some(node_id) = tree.find_deepest_leftmost_open() else {
            return Ok(());
        };
        attempts += 1;
        if attempts > options.max_nodes || depth_of(tree, node_id) > options.max_depth {
            return Err(PlannerError::BoundExceeded);
        }
        resolve(tree, domain, node_id, options)?;
    }
}
