use htn_synth::domain::Domain;
use htn_synth::error::{DomainError, PlannerError};
use htn_synth::item::{ActionOutcome, MethodOutcome, TaskItem};
use htn_synth::planner::{self, PlannerOptions};
use htn_synth::state::State;
use htn_synth::testing::fixtures::{blocks_world_domain, blocks_world_goal, blocks_world_initial_state, simple_travel_domain, simple_travel_initial_state};
use serde_json::json;
use std::sync::Arc;

#[test]
fn blocks_world_plans_the_canonical_six_step_solution() {
    let domain = blocks_world_domain();
    let tree = planner::plan(&domain, blocks_world_initial_state(), vec![blocks_world_goal()], PlannerOptions::default()).unwrap();
    let end_state = planner::execute(&tree, &domain).unwrap();
    assert_eq!(end_state.get("on", "b"), Some(&json!("c")));
    assert_eq!(end_state.get("on", "a"), Some(&json!("b")));
}

#[test]
fn simple_travel_chooses_the_taxi_method_when_affordable() {
    let domain = simple_travel_domain();
    let goals = vec![TaskItem::task("travel", json!({"who": "me", "dest": "park"}))];
    let tree = planner::plan(&domain, simple_travel_initial_state(), goals, PlannerOptions::default()).unwrap();
    let labels: Vec<String> = tree.leaves_in_order().iter().map(|id| tree.get(*id).unwrap().label.as_ref().unwrap().label()).collect();
    assert_eq!(labels, vec!["action:call_taxi", "action:ride_taxi", "action:pay_driver"]);
}

#[test]
fn unknown_action_name_fails_planning_with_the_unknown_symbol_kind() {
    let domain = Domain::new();
    let goals = vec![TaskItem::action("does_not_exist", json!({}))];
    let failure = planner::plan(&domain, State::new(), goals, PlannerOptions::default()).unwrap_err();
    assert_eq!(
        failure.reason,
        PlannerError::Domain(DomainError::UnknownSymbol("does_not_exist".to_string()))
    );
}

#[test]
fn unknown_task_name_fails_planning_with_the_unknown_symbol_kind() {
    let domain = Domain::new();
    let goals = vec![TaskItem::task("does_not_exist", json!({}))];
    let failure = planner::plan(&domain, State::new(), goals, PlannerOptions::default()).unwrap_err();
    assert_eq!(
        failure.reason,
        PlannerError::Domain(DomainError::UnknownSymbol("does_not_exist".to_string()))
    );
}

#[test]
fn a_task_whose_only_method_fails_reports_planner_error() {
    let mut domain = Domain::new();
    domain.add_task_method(
        "impossible",
        Arc::new(|_state: &State, _args: &serde_json::Value| MethodOutcome::Fail("never applicable".to_string())),
    );
    let goals = vec![TaskItem::task("impossible", json!({}))];
    let result = planner::plan(&domain, State::new(), goals, PlannerOptions::default());
    assert!(result.is_err());
}

#[test]
fn bound_exceeded_is_reported_when_max_nodes_is_tiny() {
    let mut domain = Domain::new();
    domain.add_task_method(
        "loop",
        Arc::new(|_state: &State, args: &serde_json::Value| MethodOutcome::Ok(vec![TaskItem::task("loop", args.clone())])),
    );
    let goals = vec![TaskItem::task("loop", json!({}))];
    let options = PlannerOptions { max_depth: 1000, max_nodes: 5, verbose_level: 0 };
    let result = planner::plan(&domain, State::new(), goals, options);
    assert!(result.is_err());
}

#[test]
fn a_panicking_action_is_converted_to_a_failed_outcome_not_a_crash() {
    let mut domain = Domain::new();
    domain.add_action("boom", Arc::new(|_: &State, _: &serde_json::Value| panic!("method raised"))).unwrap();
    let goals = vec![TaskItem::action("boom", json!({}))];
    let tree = planner::plan(&domain, State::new(), goals, PlannerOptions::default()).unwrap();
    let result = planner::execute(&tree, &domain);
    assert!(result.is_err());
}

#[test]
fn explain_lists_one_step_per_decomposed_node_and_counts_actions() {
    let domain = simple_travel_domain();
    let goals = vec![TaskItem::task("travel", json!({"who": "me", "dest": "park"}))];
    let tree = planner::plan(&domain, simple_travel_initial_state(), goals, PlannerOptions::default()).unwrap();

    let explanation = planner::explain(&tree);
    assert_eq!(explanation.action_count, 3);
    assert_eq!(explanation.steps.len(), 1 + 3); // the "travel" task plus its three actions
    assert_eq!(explanation.steps[0].kind, "task");
    assert_eq!(explanation.steps[0].label, "task:travel");
    assert_eq!(explanation.steps[0].depth, 0);
    let action_labels: Vec<&str> = explanation.steps[1..].iter().map(|s| s.label.as_str()).collect();
    assert_eq!(action_labels, vec!["action:call_taxi", "action:ride_taxi", "action:pay_driver"]);
    assert!(explanation.steps[1..].iter().all(|s| s.depth == 1));

    let rendered = explanation.to_string();
    assert!(rendered.contains("3 action(s)"));
    assert!(rendered.contains("task:travel"));
}
