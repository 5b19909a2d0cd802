//! Assertion helpers for solution trees, plans, and states.

use crate::node_id::NodeId;
use crate::state::State;
use crate::tree::SolutionTree;

/// Assert that `tree`'s leaves, read left to right, are exactly the action
/// labels in `expected` (e.g. `"pickup"`, `"stack"`). Mirrors §8 property 1's
/// "deterministic plans" contract.
///
/// # Panics
///
/// Panics if the leaf count or any individual label differs, naming the
/// index and the full sequences for diagnosis.
pub fn assert_plan_labels(tree: &SolutionTree, expected: &[&str]) {
    let actual: Vec<String> = tree
        .leaves_in_order()
        .iter()
        .filter_map(|id| tree.get(*id))
        .filter_map(|node| node.label.as_ref())
        .map(|item| match item {
            crate::item::TaskItem::Action { name, .. } => name.clone(),
            other => other.label(),
        })
        .collect();
    let expected: Vec<String> = expected.iter().map(|s| (*s).to_string()).collect();
    assert_eq!(
        actual.len(),
        expected.len(),
        "plan length mismatch:\n  expected: {expected:?}\n  actual:   {actual:?}"
    );
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert_eq!(a, e, "plan mismatch at step {i}:\n  expected: {expected:?}\n  actual:   {actual:?}");
    }
}

/// Assert that `state` satisfies `(predicate, subject, value)`.
///
/// # Panics
///
/// Panics if the key is unbound, or bound to a different value.
pub fn assert_fact(state: &State, predicate: &str, subject: &str, value: &serde_json::Value) {
    match state.get(predicate, subject) {
        Some(actual) => assert_eq!(actual, value, "{predicate}({subject}) mismatch: expected {value}, found {actual}"),
        None => panic!("{predicate}({subject}) is unbound, expected {value}"),
    }
}

/// Assert that `node_id`'s ancestor chain in `tree`, root first, equals `expected`.
///
/// Useful for checking [`crate::planner::replan`]'s "prefix preserved" contract
/// (§8 property 3) -- that a given node still descends from the same root
/// lineage after a re-entrant replan.
///
/// # Panics
///
/// Panics if the recorded path differs from `expected`.
pub fn assert_path_to_root(tree: &SolutionTree, node_id: NodeId, expected: &[NodeId]) {
    let actual = tree.path_to_root(node_id);
    assert_eq!(actual, expected, "path to root mismatch for {node_id}: expected {expected:?}, found {actual:?}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{self, PlannerOptions};
    use crate::testing::fixtures::{blocks_world_domain, blocks_world_goal, blocks_world_initial_state};

    #[test]
    fn assert_plan_labels_accepts_the_matching_plan() {
        let domain = blocks_world_domain();
        let tree = planner::plan(&domain, blocks_world_initial_state(), vec![blocks_world_goal()], PlannerOptions::default()).unwrap();
        assert_plan_labels(&tree, &["unstack", "putdown", "pickup", "stack", "pickup", "stack"]);
    }

    #[test]
    #[should_panic(expected = "plan length mismatch")]
    fn assert_plan_labels_rejects_wrong_length() {
        let domain = blocks_world_domain();
        let tree = planner::plan(&domain, blocks_world_initial_state(), vec![blocks_world_goal()], PlannerOptions::default()).unwrap();
        assert_plan_labels(&tree, &["unstack"]);
    }

    #[test]
    fn assert_fact_accepts_a_bound_matching_value() {
        let state = State::new().set("on", "a", serde_json::json!("b"));
        assert_fact(&state, "on", "a", &serde_json::json!("b"));
    }
}
