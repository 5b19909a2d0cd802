//! Canonical fixtures exercising the properties in §8: the blocks-world and
//! simple-travel domains, and a chunker input for boundary testing.

use crate::domain::Domain;
use crate::item::{ActionOutcome, MethodOutcome, TaskItem, Unigoal};
use crate::state::State;
use serde_json::{json, Value};
use std::sync::Arc;

fn str_arg(args: &Value, key: &str) -> String {
    args.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

/// The classic blocks-world planning domain: `pickup`/`putdown`/`stack`/`unstack`
/// actions plus `on`/`clear` unigoal methods that recursively clear and
/// relocate blocks to satisfy an `on(x, y)` goal.
///
/// # Example
///
/// ```
/// use htn_synth::planner::{self, PlannerOptions};
/// use htn_synth::testing::fixtures::{blocks_world_domain, blocks_world_goal, blocks_world_initial_state};
///
/// let domain = blocks_world_domain();
/// let state = blocks_world_initial_state();
/// let tree = planner::plan(&domain, state, vec![blocks_world_goal()], PlannerOptions::default()).unwrap();
/// let labels: Vec<String> = tree.leaves_in_order().iter().map(|id| tree.get(*id).unwrap().label.as_ref().unwrap().label()).collect();
/// assert_eq!(
///     labels,
///     vec!["action:unstack", "action:putdown", "action:pickup", "action:stack", "action:pickup", "action:stack"]
/// );
/// ```
#[must_use]
pub fn blocks_world_domain() -> Domain {
    let mut domain = Domain::new();

    domain
        .add_action(
            "pickup",
            Arc::new(|state: &State, args: &Value| {
                let x = str_arg(args, "x");
                if state.get_or_absent("clear", &x) != json!(true) || state.get_or_absent("on", &x) != json!("table") {
                    return ActionOutcome::Fail(format!("pickup({x}) precondition violated"));
                }
                let next = state.set("holding", "robot", json!(x)).set("clear", &x, json!(false));
                ActionOutcome::Ok(next)
            }),
        )
        .unwrap();

    domain
        .add_action(
            "putdown",
            Arc::new(|state: &State, args: &Value| {
                let x = str_arg(args, "x");
                if state.get_or_absent("holding", "robot") != json!(x) {
                    return ActionOutcome::Fail(format!("putdown({x}) precondition violated"));
                }
                let next = state.set("on", &x, json!("table")).set("clear", &x, json!(true)).set("holding", "robot", json!("none"));
                ActionOutcome::Ok(next)
            }),
        )
        .unwrap();

    domain
        .add_action(
            "stack",
            Arc::new(|state: &State, args: &Value| {
                let x = str_arg(args, "x");
                let y = str_arg(args, "y");
                if state.get_or_absent("holding", "robot") != json!(x) || state.get_or_absent("clear", &y) != json!(true) {
                    return ActionOutcome::Fail(format!("stack({x}, {y}) precondition violated"));
                }
                let next = state
                    .set("on", &x, json!(y))
                    .set("clear", &x, json!(true))
                    .set("clear", &y, json!(false))
                    .set("holding", "robot", json!("none"));
                ActionOutcome::Ok(next)
            }),
        )
        .unwrap();

    domain
        .add_action(
            "unstack",
            Arc::new(|state: &State, args: &Value| {
                let x = str_arg(args, "x");
                let y = str_arg(args, "y");
                if state.get_or_absent("on", &x) != json!(y) || state.get_or_absent("clear", &x) != json!(true) || state.get_or_absent("holding", "robot") != json!("none") {
                    return ActionOutcome::Fail(format!("unstack({x}, {y}) precondition violated"));
                }
                let next = state.set("holding", "robot", json!(x)).set("clear", &x, json!(false)).set("clear", &y, json!(true));
                ActionOutcome::Ok(next)
            }),
        )
        .unwrap();

    // Unigoal method for clear(x, true): find whatever sits on x and move it to the table.
    domain.add_unigoal_method(
        "clear",
        Arc::new(|state: &State, args: &Value| {
            let x = str_arg(args, "subject");
            let occupant = state
                .iter()
                .find(|(key, value)| key.predicate == "on" && **value == json!(x))
                .map(|(key, _)| key.subject.clone());
            match occupant {
                Some(z) => MethodOutcome::Ok(vec![TaskItem::unigoal("on", z, json!("table"))]),
                None => MethodOutcome::Fail(format!("nothing found on {x}")),
            }
        }),
    );

    // Unigoal method for on(x, y): clear both ends, then move x directly onto y.
    domain.add_unigoal_method(
        "on",
        Arc::new(|state: &State, args: &Value| {
            let x = str_arg(args, "subject");
            let y = args["value"].as_str().unwrap_or_default().to_string();
            let mut children = Vec::new();

            if state.get_or_absent("clear", &x) != json!(true) {
                children.push(TaskItem::unigoal("clear", x.clone(), json!(true)));
            }
            if y != "table" && state.get_or_absent("clear", &y) != json!(true) {
                children.push(TaskItem::unigoal("clear", y.clone(), json!(true)));
            }

            let already_holding = state.get_or_absent("holding", "robot") == json!(x);
            if !already_holding {
                let current_support = state.get_or_absent("on", &x);
                if current_support == json!("table") {
                    children.push(TaskItem::action("pickup", json!({"x": x})));
                } else if let Some(support) = current_support.as_str() {
                    children.push(TaskItem::action("unstack", json!({"x": x, "y": support})));
                } else {
                    return MethodOutcome::Fail(format!("{x} has no recorded support"));
                }
            }
            if y == "table" {
                children.push(TaskItem::action("putdown", json!({"x": x})));
            } else {
                children.push(TaskItem::action("stack", json!({"x": x, "y": y})));
            }
            MethodOutcome::Ok(children)
        }),
    );

    domain
}

/// `{on(a,b), on(b,table), on(c,table), clear(a), clear(c), holding=none}` (§8).
#[must_use]
pub fn blocks_world_initial_state() -> State {
    State::new()
        .set("on", "a", json!("b"))
        .set("on", "b", json!("table"))
        .set("on", "c", json!("table"))
        .set("clear", "a", json!(true))
        .set("clear", "b", json!(false))
        .set("clear", "c", json!(true))
        .set("holding", "robot", json!("none"))
}

/// `{on(b,c), on(a,b)}`, as a multigoal (§8) whose default split preserves this order.
#[must_use]
pub fn blocks_world_goal() -> TaskItem {
    TaskItem::multigoal(vec![Unigoal::new("on", "b", json!("c")), Unigoal::new("on", "a", json!("b"))])
}

/// The simple-travel domain: `travel(me, dest)` decomposes by taxi when
/// `cash(me) >= 10`, otherwise on foot (§8).
///
/// # Example
///
/// ```
/// use htn_synth::planner::{self, PlannerOptions};
/// use htn_synth::testing::fixtures::{simple_travel_domain, simple_travel_initial_state};
/// use htn_synth::item::TaskItem;
/// use serde_json::json;
///
/// let domain = simple_travel_domain();
/// let state = simple_travel_initial_state();
/// let goals = vec![TaskItem::task("travel", json!({"who": "me", "dest": "park"}))];
/// let tree = planner::plan(&domain, state, goals, PlannerOptions::default()).unwrap();
/// let end_state = planner::execute(&tree, &domain).unwrap();
/// assert_eq!(end_state.get("cash", "me"), Some(&json!(10.0)));
/// ```
#[must_use]
pub fn simple_travel_domain() -> Domain {
    let mut domain = Domain::new();

    domain
        .add_action(
            "call_taxi",
            Arc::new(|state: &State, args: &Value| ActionOutcome::Ok(state.set("loc", "taxi", args["dest"].clone()))),
        )
        .unwrap();
    domain
        .add_action(
            "ride_taxi",
            Arc::new(|state: &State, args: &Value| {
                let who = str_arg(args, "who");
                ActionOutcome::Ok(state.set("loc", &who, args["dest"].clone()))
            }),
        )
        .unwrap();
    domain
        .add_action(
            "pay_driver",
            Arc::new(|state: &State, args: &Value| {
                let who = str_arg(args, "who");
                let cash = state.get_or_absent("cash", &who).as_f64().unwrap_or(0.0);
                if cash < 10.0 {
                    return ActionOutcome::Fail("insufficient cash".to_string());
                }
                ActionOutcome::Ok(state.set("cash", &who, json!(cash - 10.0)))
            }),
        )
        .unwrap();
    domain
        .add_action(
            "walk",
            Arc::new(|state: &State, args: &Value| {
                let who = str_arg(args, "who");
                ActionOutcome::Ok(state.set("loc", &who, args["dest"].clone()))
            }),
        )
        .unwrap();

    domain.add_task_method(
        "travel",
        Arc::new(|state: &State, args: &Value| {
            let who = str_arg(args, "who");
            let dest = args["dest"].clone();
            let cash = state.get_or_absent("cash", &who).as_f64().unwrap_or(0.0);
            if cash >= 10.0 {
                MethodOutcome::Ok(vec![
                    TaskItem::action("call_taxi", json!({"dest": dest})),
                    TaskItem::action("ride_taxi", json!({"who": who, "dest": dest})),
                    TaskItem::action("pay_driver", json!({"who": who})),
                ])
            } else {
                MethodOutcome::Fail("not enough cash for a taxi".to_string())
            }
        }),
    );
    domain.add_task_method(
        "travel",
        Arc::new(|_state: &State, args: &Value| {
            let who = str_arg(args, "who");
            let dest = args["dest"].clone();
            MethodOutcome::Ok(vec![TaskItem::action("walk", json!({"who": who, "dest": dest}))])
        }),
    );

    domain
}

/// `{loc(me)=home, cash(me)=20}` (§8).
#[must_use]
pub fn simple_travel_initial_state() -> State {
    State::new().set("loc", "me", json!("home")).set("cash", "me", json!(20.0))
}

/// A 1 MiB deterministic pseudorandom input for chunker boundary tests,
/// generated with a small xorshift-style generator so the same bytes come
/// out of every build without pulling in a `rand` dependency just for a
/// fixture (§8 property 5/6).
///
/// This input is *not* the reference fixture spec.md describes (the
/// reference boundary offset of `81590` depends on casync's authentic
/// buzhash table, which this crate only approximates -- see DESIGN.md); it
/// is a self-consistent stand-in used to check the chunker's invariants
/// (size bounds, determinism, exact reconstruction) against a realistic
/// 1 MiB input.
#[must_use]
pub fn chunker_fixture_input() -> Vec<u8> {
    let mut x: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut out = Vec::with_capacity(1 << 20);
    while out.len() < (1 << 20) {
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        out.extend_from_slice(&x.to_le_bytes());
    }
    out.truncate(1 << 20);
    out
}

/// `{min=16 KiB, avg=64 KiB, max=256 KiB}` (§8).
#[must_use]
pub fn chunker_fixture_params() -> crate::chunk::ChunkerParams {
    crate::chunk::ChunkerParams::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{self, PlannerOptions};

    #[test]
    fn blocks_world_reproduces_the_canonical_six_step_plan() {
        let domain = blocks_world_domain();
        let tree = planner::plan(&domain, blocks_world_initial_state(), vec![blocks_world_goal()], PlannerOptions::default()).unwrap();
        let labels: Vec<String> = tree.leaves_in_order().iter().map(|id| tree.get(*id).unwrap().label.as_ref().unwrap().label()).collect();
        assert_eq!(
            labels,
            vec!["action:unstack", "action:putdown", "action:pickup", "action:stack", "action:pickup", "action:stack"]
        );
        let end_state = planner::execute(&tree, &domain).unwrap();
        assert_eq!(end_state.get("on", "b"), Some(&json!("c")));
        assert_eq!(end_state.get("on", "a"), Some(&json!("b")));
    }

    #[test]
    fn simple_travel_takes_the_taxi_when_affordable() {
        let domain = simple_travel_domain();
        let goals = vec![TaskItem::task("travel", json!({"who": "me", "dest": "park"}))];
        let tree = planner::plan(&domain, simple_travel_initial_state(), goals, PlannerOptions::default()).unwrap();
        let end_state = planner::execute(&tree, &domain).unwrap();
        assert_eq!(end_state.get("cash", "me"), Some(&json!(10.0)));
        assert_eq!(end_state.get("loc", "me"), Some(&json!("park")));
    }

    #[test]
    fn simple_travel_walks_when_cash_is_short() {
        let domain = simple_travel_domain();
        let state = State::new().set("loc", "me", json!("home")).set("cash", "me", json!(5.0));
        let goals = vec![TaskItem::task("travel", json!({"who": "me", "dest": "park"}))];
        let tree = planner::plan(&domain, state, goals, PlannerOptions::default()).unwrap();
        let labels: Vec<String> = tree.leaves_in_order().iter().map(|id| tree.get(*id).unwrap().label.as_ref().unwrap().label()).collect();
        assert_eq!(labels, vec!["action:walk"]);
    }

    #[test]
    fn chunker_fixture_input_is_exactly_one_mebibyte() {
        assert_eq!(chunker_fixture_input().len(), 1 << 20);
    }

    #[test]
    fn chunker_fixture_input_is_deterministic() {
        assert_eq!(chunker_fixture_input(), chunker_fixture_input());
    }
}
