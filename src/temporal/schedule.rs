//! Temporal scheduling: `temporal_plan`/`temporal_replan` over a decomposed
//! solution tree (§4.5, §6).

use crate::domain::Domain;
use crate::error::{ExecutionError, TemporalError};
use crate::fact::FactKey;
use crate::item::{ActionOutcome, TaskItem};
use crate::node_id::NodeId;
use crate::planner::{self, PlannerOptions};
use crate::state::State;
use crate::temporal::constraints::{check_all, Constraint};
use crate::temporal::log::TemporalLog;
use crate::tree::SolutionTree;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// `(state, args) -> seconds`, an action's duration (§4.5).
pub type DurationFn = Arc<dyn Fn(&State, &Value) -> f64 + Send + Sync>;

/// A single timed effect an action produces: `(predicate, subject, value,
/// start, duration)`, with `duration = None` meaning the effect is
/// permanent (§4.5).
#[derive(Clone, Debug)]
pub struct TimedEffect {
    pub predicate: String,
    pub subject: String,
    pub value: Value,
    pub start: f64,
    pub duration: Option<f64>,
}

/// `(state, args, start, duration) -> timed effects`, an action's optional
/// effect schedule (§4.5).
pub type EffectsFn = Arc<dyn Fn(&State, &Value, f64, f64) -> Vec<TimedEffect> + Send + Sync>;

/// A [`Domain`] extended with per-action duration/effects/preconditions and a
/// set of declared cross-action constraints (§4.5).
#[derive(Clone)]
pub struct TemporalDomain {
    pub domain: Domain,
    durations: HashMap<String, DurationFn>,
    effects: HashMap<String, EffectsFn>,
    preconditions: HashMap<String, Vec<(String, String, Value)>>,
    constraints: Vec<Constraint>,
}

impl TemporalDomain {
    #[must_use]
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            durations: HashMap::new(),
            effects: HashMap::new(),
            preconditions: HashMap::new(),
            constraints: Vec::new(),
        }
    }

    /// Register `action_name`'s duration function. Actions with no
    /// registered duration default to zero.
    pub fn set_duration(&mut self, action_name: impl Into<String>, f: DurationFn) {
        self.durations.insert(action_name.into(), f);
    }

    /// Register `action_name`'s timed-effects function.
    pub fn set_effects(&mut self, action_name: impl Into<String>, f: EffectsFn) {
        self.effects.insert(action_name.into(), f);
    }

    /// Declare `(predicate, subject, value)` as a required precondition of `action_name` at its start time.
    pub fn add_precondition(&mut self, action_name: impl Into<String>, predicate: impl Into<String>, subject: impl Into<String>, value: Value) {
        self.preconditions.entry(action_name.into()).or_default().push((predicate.into(), subject.into(), value));
    }

    /// Declare a constraint checked against every schedule this domain produces.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    fn duration_of(&self, name: &str, state: &State, args: &Value) -> f64 {
        self.durations.get(name).map_or(0.0, |f| f(state, args))
    }

    fn effects_of(&self, name: &str) -> Option<&EffectsFn> {
        self.effects.get(name)
    }

    fn preconditions_of(&self, name: &str) -> &[(String, String, Value)] {
        self.preconditions.get(name).map_or(&[], Vec::as_slice)
    }
}

/// A scheduled action's lifecycle status (§4.5).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimedStatus {
    Scheduled,
    Started,
    Completed,
    Cancelled,
}

/// One action placed on the timeline (§4.5, §6).
#[derive(Clone, Debug, PartialEq)]
pub struct TimedAction {
    pub node_id: NodeId,
    pub actor: String,
    pub action_label: String,
    pub start: f64,
    pub duration: f64,
    pub status: TimedStatus,
}

impl TimedAction {
    #[must_use]
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// The result of [`temporal_plan`]/[`temporal_replan`]: a solution tree, its
/// timeline, and the time-indexed fact log the schedule committed effects
/// into (§4.5, §6).
#[derive(Clone, Debug)]
pub struct TemporalPlan {
    pub tree: SolutionTree,
    pub timeline: Vec<TimedAction>,
    pub log: TemporalLog,
}

fn actor_of(args: &Value) -> String {
    args.get("actor").and_then(Value::as_str).unwrap_or("default").to_string()
}

/// Record every key/value pair that differs between `before` and `after` as
/// a permanent interval starting at `at` (§4.5: "effects committed to the
/// state log at action end"). A key removed by the action (bound to
/// [`crate::fact::absent`] in `after`) is recorded the same way as any other
/// change, since `State::set` already represents "removed" as `Value::Null`.
fn diff_effects(before: &State, after: &State, at: f64, log: &mut TemporalLog) {
    let mut keys: BTreeSet<FactKey> = before.iter().map(|(k, _)| k.clone()).collect();
    keys.extend(after.iter().map(|(k, _)| k.clone()));
    for key in keys {
        let old = before.get_or_absent(&key.predicate, &key.subject);
        let new = after.get_or_absent(&key.predicate, &key.subject);
        if old != new {
            log.record(key.predicate, key.subject, new, at, None);
        }
    }
}

/// Greedily schedule `tree`'s leaves starting no earlier than `now`: each
/// action's start is the max of (its actor's cursor, `now`); actors without a
/// declared ordering relationship proceed independently (§4.5, §5).
///
/// Each leaf's preconditions (§4.5) are checked against the fact log's view
/// of the state at that leaf's start time, not a single state threaded
/// blindly forward -- this is what lets two actions on independent actors
/// that both read the same fact see the value actually in force at their own
/// start, not whichever of them happened to run first in `leaves_in_order`.
/// An action with a registered [`EffectsFn`] has its timed effects recorded
/// directly; otherwise the action function is re-applied and the resulting
/// state is diffed against the one it started from, recording each changed
/// fact at the action's end time (§4.5, §9).
///
/// # Errors
///
/// Returns [`ExecutionError::PreconditionViolated`] naming the first leaf
/// whose declared precondition does not hold at its scheduled start.
fn schedule_leaves(domain: &TemporalDomain, tree: &SolutionTree, now: f64) -> Result<(Vec<TimedAction>, TemporalLog), ExecutionError> {
    let mut actor_cursor: HashMap<String, f64> = HashMap::new();
    let mut timeline = Vec::new();
    let root = tree.get(tree.root_id()).expect("root present");
    let initial_state = root.state_in.clone().expect("root state_in always set");

    let mut log = TemporalLog::new();
    for (key, value) in initial_state.iter() {
        log.record(key.predicate.clone(), key.subject.clone(), value.clone(), f64::NEG_INFINITY, None);
    }

    for node_id in tree.leaves_in_order() {
        let node = tree.get(node_id).expect("leaf id present");
        let Some(TaskItem::Action { name, args }) = &node.label else {
            unreachable!("leaves_in_order only yields Action nodes")
        };
        let actor = actor_of(args);
        let start = actor_cursor.get(&actor).copied().unwrap_or(now).max(now);
        let state_at_start = log.advance_to(start);

        for (predicate, subject, expected) in domain.preconditions_of(name) {
            if state_at_start.get_or_absent(predicate, subject) != *expected {
                return Err(ExecutionError::PreconditionViolated(node_id));
            }
        }

        let duration = domain.duration_of(name, &state_at_start, args);
        let end = start + duration;
        actor_cursor.insert(actor.clone(), end);
        timeline.push(TimedAction {
            node_id,
            actor,
            action_label: name.clone(),
            start,
            duration,
            status: TimedStatus::Scheduled,
        });

        if let Some(effects_fn) = domain.effects_of(name) {
            for effect in effects_fn(&state_at_start, args, start, duration) {
                let end = effect.duration.map(|d| effect.start + d);
                log.record(effect.predicate, effect.subject, effect.value, effect.start, end);
            }
        } else if let Some(action) = domain.domain.get_action(name) {
            if let ActionOutcome::Ok(next) = planner::call_action_safely(action, &state_at_start, args) {
                diff_effects(&state_at_start, &next, end, &mut log);
            }
        }
    }
    Ok((timeline, log))
}

/// A bounded local repair pass: push violating actions later by the minimum
/// amount needed, re-deriving their actor's downstream cursor (§4.5's
/// "localized repair (advance start)").
fn repair(domain: &TemporalDomain, timeline: &mut Vec<TimedAction>) -> Result<(), TemporalError> {
    const MAX_PASSES: usize = 16;
    for _ in 0..MAX_PASSES {
        match check_all(&domain.constraints, timeline) {
            Ok(()) => return Ok(()),
            Err(TemporalError::ConstraintViolation(_)) => {
                // Find the first constraint requiring b to start later than scheduled and nudge it.
                if !nudge_first_violation(domain, timeline) {
                    return check_all(&domain.constraints, timeline);
                }
            }
            Err(other) => return Err(other),
        }
    }
    check_all(&domain.constraints, timeline)
}

fn nudge_first_violation(domain: &TemporalDomain, timeline: &mut [TimedAction]) -> bool {
    for constraint in &domain.constraints {
        let Constraint::Before { a, b, offset } = constraint else { continue };
        let Some(a_end) = timeline.iter().find(|t| t.node_id == *a).map(TimedAction::end) else { continue };
        let required = a_end + offset;
        if let Some(b_action) = timeline.iter_mut().find(|t| t.node_id == *b) {
            if b_action.start < required {
                b_action.start = required;
                return true;
            }
        }
    }
    false
}

/// Produce a temporal plan for `goals` from `state`, starting no earlier than `now` (§4.5, §6).
///
/// # Errors
///
/// Returns [`TemporalError::Planner`] if the underlying HTN search fails, or
/// [`TemporalError::Infeasible`] if no schedule satisfies every declared
/// constraint after repair.
pub fn temporal_plan(domain: &TemporalDomain, state: State, goals: Vec<TaskItem>, now: f64, options: PlannerOptions) -> Result<TemporalPlan, TemporalError> {
    let tree = planner::plan(&domain.domain, state, goals, options).map_err(|f| TemporalError::Planner(f.reason))?;
    let (mut timeline, log) = schedule_leaves(domain, &tree, now).map_err(TemporalError::Execution)?;
    match repair(domain, &mut timeline) {
        Ok(()) => Ok(TemporalPlan { tree, timeline, log }),
        Err(TemporalError::ConstraintViolation(reason)) => Err(TemporalError::Infeasible(reason)),
        Err(other) => Err(other),
    }
}

/// Re-entrant temporal replanning (§4.5, §6):
/// 1. Splits `old_plan`'s timeline into kept (started/completed) and cancelled (future) actions.
/// 2. Replans from `cur_state` against `new_goals`.
/// 3. Merges: kept actions retain their ids and times; new actions start at or after `now`; constraints are re-validated with repair.
///
/// # Errors
///
/// Returns [`TemporalError::Infeasible`] if no repair satisfies the declared
/// constraints, or [`TemporalError::Planner`] if replanning itself fails.
pub fn temporal_replan(domain: &TemporalDomain, cur_state: State, new_goals: Vec<TaskItem>, old_plan: &TemporalPlan, now: f64, options: PlannerOptions) -> Result<TemporalPlan, TemporalError> {
    let kept: Vec<TimedAction> = old_plan
        .timeline
        .iter()
        .filter(|t| t.start < now)
        .cloned()
        .map(|mut t| {
            t.status = if t.end() <= now { TimedStatus::Completed } else { TimedStatus::Started };
            t
        })
        .collect();

    let new_tree = planner::plan(&domain.domain, cur_state, new_goals, options).map_err(|f| TemporalError::Planner(f.reason))?;
    let (mut new_timeline, log) = schedule_leaves(domain, &new_tree, now).map_err(TemporalError::Execution)?;
    for t in &mut new_timeline {
        if t.start < now {
            t.start = now;
        }
    }

    let mut merged = kept;
    merged.extend(new_timeline);

    match repair(domain, &mut merged) {
        Ok(()) => Ok(TemporalPlan { tree: new_tree, timeline: merged, log }),
        Err(TemporalError::ConstraintViolation(reason)) => Err(TemporalError::Infeasible(reason)),
        Err(other) => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::TaskItem;
    use serde_json::json;

    fn walk_domain() -> TemporalDomain {
        let mut domain = Domain::new();
        domain
            .add_action(
                "walk",
                Arc::new(|state: &State, args: &Value| {
                    let dest = args["dest"].as_str().unwrap_or_default().to_string();
                    ActionOutcome::Ok(state.set("loc", "me", json!(dest)))
                }),
            )
            .unwrap();
        let mut temporal = TemporalDomain::new(domain);
        temporal.set_duration("walk", Arc::new(|_, _| 10.0));
        temporal
    }

    #[test]
    fn schedule_starts_sequential_same_actor_actions_back_to_back() {
        let domain = walk_domain();
        let goals = vec![TaskItem::action("walk", json!({"dest": "park"})), TaskItem::action("walk", json!({"dest": "home"}))];
        let plan = temporal_plan(&domain, State::new(), goals, 0.0, PlannerOptions::default()).unwrap();
        assert_eq!(plan.timeline.len(), 2);
        assert_eq!(plan.timeline[0].start, 0.0);
        assert_eq!(plan.timeline[1].start, 10.0);
    }

    #[test]
    fn independent_actors_do_not_block_each_other() {
        let domain = walk_domain();
        let goals = vec![
            TaskItem::action("walk", json!({"dest": "park", "actor": "alice"})),
            TaskItem::action("walk", json!({"dest": "park", "actor": "bob"})),
        ];
        let plan = temporal_plan(&domain, State::new(), goals, 0.0, PlannerOptions::default()).unwrap();
        assert_eq!(plan.timeline[0].start, 0.0);
        assert_eq!(plan.timeline[1].start, 0.0);
    }

    #[test]
    fn walking_twice_records_both_effects_in_the_log_at_their_action_end_times() {
        let domain = walk_domain();
        let goals = vec![TaskItem::action("walk", json!({"dest": "park"})), TaskItem::action("walk", json!({"dest": "home"}))];
        let plan = temporal_plan(&domain, State::new(), goals, 0.0, PlannerOptions::default()).unwrap();
        assert_eq!(plan.log.get_at("loc", "me", 5.0), Some(&json!("park")));
        assert_eq!(plan.log.get_at("loc", "me", 15.0), Some(&json!("home")));
        assert_eq!(plan.log.get_at("loc", "me", -1.0), None);
    }

    #[test]
    fn an_unmet_precondition_fails_scheduling_instead_of_silently_proceeding() {
        let mut domain = walk_domain();
        domain.add_precondition("walk", "permit", "me", json!(true));
        let goals = vec![TaskItem::action("walk", json!({"dest": "park"}))];
        let failure = temporal_plan(&domain, State::new(), goals, 0.0, PlannerOptions::default()).unwrap_err();
        assert!(matches!(failure, TemporalError::Execution(ExecutionError::PreconditionViolated(_))));
    }

    #[test]
    fn a_satisfied_precondition_lets_scheduling_proceed() {
        let mut domain = walk_domain();
        domain.add_precondition("walk", "permit", "me", json!(true));
        let state = State::new().set("permit", "me", json!(true));
        let goals = vec![TaskItem::action("walk", json!({"dest": "park"}))];
        let plan = temporal_plan(&domain, state, goals, 0.0, PlannerOptions::default()).unwrap();
        assert_eq!(plan.timeline.len(), 1);
    }
}
