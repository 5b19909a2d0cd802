use htn_synth::domain::Domain;
use htn_synth::item::{ActionOutcome, TaskItem};
use htn_synth::planner::PlannerOptions;
use htn_synth::state::State;
use htn_synth::temporal::{temporal_plan, temporal_replan, Constraint, TemporalDomain};
use serde_json::json;
use std::sync::Arc;

fn patrol_domain() -> TemporalDomain {
    let mut domain = Domain::new();
    domain
        .add_action(
            "patrol",
            Arc::new(|state: &State, args: &serde_json::Value| {
                let dest = args["dest"].as_str().unwrap_or_default().to_string();
                ActionOutcome::Ok(state.set("loc", args["actor"].as_str().unwrap_or_default(), json!(dest)))
            }),
        )
        .unwrap();
    let mut temporal = TemporalDomain::new(domain);
    temporal.set_duration("patrol", Arc::new(|_, _| 5.0));
    temporal
}

#[test]
fn sequential_actions_for_one_actor_do_not_overlap() {
    let domain = patrol_domain();
    let goals = vec![
        TaskItem::action("patrol", json!({"actor": "drone1", "dest": "north"})),
        TaskItem::action("patrol", json!({"actor": "drone1", "dest": "south"})),
    ];
    let plan = temporal_plan(&domain, State::new(), goals, 0.0, PlannerOptions::default()).unwrap();
    assert_eq!(plan.timeline[0].start, 0.0);
    assert_eq!(plan.timeline[0].end(), 5.0);
    assert_eq!(plan.timeline[1].start, 5.0);
}

#[test]
fn a_deadline_constraint_rejects_a_schedule_that_misses_it() {
    let domain = patrol_domain();
    let goals = vec![
        TaskItem::action("patrol", json!({"actor": "drone1", "dest": "north"})),
        TaskItem::action("patrol", json!({"actor": "drone1", "dest": "south"})),
    ];
    let plan = temporal_plan(&domain, State::new(), goals, 0.0, PlannerOptions::default()).unwrap();
    let second = plan.timeline[1].node_id;
    let result = htn_synth::temporal::constraints::check_all(&[Constraint::Deadline { action: second, deadline: 3.0 }], &plan.timeline);
    assert!(result.is_err());
}

#[test]
fn independent_actors_schedule_concurrently() {
    let domain = patrol_domain();
    let goals = vec![
        TaskItem::action("patrol", json!({"actor": "drone1", "dest": "north"})),
        TaskItem::action("patrol", json!({"actor": "drone2", "dest": "south"})),
    ];
    let plan = temporal_plan(&domain, State::new(), goals, 0.0, PlannerOptions::default()).unwrap();
    assert_eq!(plan.timeline[0].start, 0.0);
    assert_eq!(plan.timeline[1].start, 0.0);
}

#[test]
fn replanning_keeps_started_actions_and_schedules_new_goals_after_now() {
    let domain = patrol_domain();
    let goals = vec![TaskItem::action("patrol", json!({"actor": "drone1", "dest": "north"}))];
    let plan = temporal_plan(&domain, State::new(), goals, 0.0, PlannerOptions::default()).unwrap();

    let new_goals = vec![TaskItem::action("patrol", json!({"actor": "drone1", "dest": "east"}))];
    let replanned = temporal_replan(&domain, State::new(), new_goals, &plan, 2.0, PlannerOptions::default()).unwrap();

    assert_eq!(replanned.timeline.len(), 2);
    assert_eq!(replanned.timeline[0].start, 0.0);
    assert!(replanned.timeline[1].start >= 2.0);
}

#[test]
fn the_schedule_log_reflects_each_patrols_recorded_location_at_its_end_time() {
    let domain = patrol_domain();
    let goals = vec![
        TaskItem::action("patrol", json!({"actor": "drone1", "dest": "north"})),
        TaskItem::action("patrol", json!({"actor": "drone1", "dest": "south"})),
    ];
    let plan = temporal_plan(&domain, State::new(), goals, 0.0, PlannerOptions::default()).unwrap();
    assert_eq!(plan.log.get_at("loc", "drone1", 5.0), Some(&json!("north")));
    assert_eq!(plan.log.get_at("loc", "drone1", 10.0), Some(&json!("south")));
}

#[test]
fn a_precondition_unmet_at_the_scheduled_start_time_fails_the_temporal_plan() {
    let mut domain = patrol_domain();
    domain.add_precondition("patrol", "cleared", "drone1", json!(true));
    let goals = vec![TaskItem::action("patrol", json!({"actor": "drone1", "dest": "north"}))];
    let failure = temporal_plan(&domain, State::new(), goals, 0.0, PlannerOptions::default()).unwrap_err();
    assert!(matches!(
        failure,
        htn_synth::error::TemporalError::Execution(htn_synth::error::ExecutionError::PreconditionViolated(_))
    ));
}

#[test]
fn a_cooldown_constraint_rejects_patrols_too_close_together() {
    let timeline_domain = patrol_domain();
    let goals = vec![
        TaskItem::action("patrol", json!({"actor": "drone1", "dest": "north"})),
        TaskItem::action("patrol", json!({"actor": "drone1", "dest": "south"})),
    ];
    let plan = temporal_plan(&timeline_domain, State::new(), goals, 0.0, PlannerOptions::default()).unwrap();
    let cooldown = Constraint::Cooldown { actor: "drone1".to_string(), action_label: "patrol".to_string(), min_gap: 100.0 };
    let result = htn_synth::temporal::constraints::check_all(&[cooldown], &plan.timeline);
    assert!(result.is_err());
}
