//! Declared ordering and timing constraints over a timeline (§4.5).

use crate::error::TemporalError;
use crate::node_id::NodeId;
use crate::temporal::schedule::TimedAction;

/// A declared constraint between scheduled actions, or on a single action (§4.5).
#[derive(Clone, Debug, PartialEq)]
pub enum Constraint {
    /// `a` must end at least `offset` seconds before `b` starts.
    Before { a: NodeId, b: NodeId, offset: f64 },
    /// `a` must start at least `offset` seconds after `b` ends (mirror of `Before`).
    After { a: NodeId, b: NodeId, offset: f64 },
    /// `a`'s end equals `b`'s start exactly.
    Meets { a: NodeId, b: NodeId },
    /// `a`'s interval falls strictly inside `b`'s.
    During { a: NodeId, b: NodeId },
    /// `a` starts before `b`, and `a` ends after `b` starts but before `b` ends.
    Overlaps { a: NodeId, b: NodeId },
    /// `a` and `b` start together; `a` ends no later than `b`.
    Starts { a: NodeId, b: NodeId },
    /// `a` and `b` end together; `a` starts no earlier than `b`.
    Finishes { a: NodeId, b: NodeId },
    /// `a` and `b` occupy the identical interval.
    Equals { a: NodeId, b: NodeId },
    /// `action` must end at or before `deadline`.
    Deadline { action: NodeId, deadline: f64 },
    /// Consecutive starts of `action_label` by `actor` must be separated by at least `min_gap`.
    Cooldown { actor: String, action_label: String, min_gap: f64 },
}

fn find<'a>(timeline: &'a [TimedAction], id: NodeId) -> Option<&'a TimedAction> {
    timeline.iter().find(|t| t.node_id == id)
}

/// Verify `constraint` against `timeline`.
///
/// # Errors
///
/// Returns [`TemporalError::ConstraintViolation`] describing which
/// constraint failed, or [`TemporalError::DeadlineMissed`] for a `Deadline`
/// specifically (§4.5, §8 property 10).
pub fn check(constraint: &Constraint, timeline: &[TimedAction]) -> Result<(), TemporalError> {
    let violation = |msg: String| Err(TemporalError::ConstraintViolation(msg));
    match constraint {
        Constraint::Before { a, b, offset } => {
            let (a, b) = (find(timeline, *a), find(timeline, *b));
            match (a, b) {
                (Some(a), Some(b)) if a.end() + offset <= b.start => Ok(()),
                (Some(_), Some(_)) => violation(format!("before({a:?}, {b:?}, {offset}) violated")),
                _ => Ok(()),
            }
        }
        Constraint::After { a, b, offset } => {
            let (a, b) = (find(timeline, *a), find(timeline, *b));
            match (a, b) {
                (Some(a), Some(b)) if a.start >= b.end() + offset => Ok(()),
                (Some(_), Some(_)) => violation(format!("after({a:?}, {b:?}, {offset}) violated")),
                _ => Ok(()),
            }
        }
        Constraint::Meets { a, b } => {
            let (a, b) = (find(timeline, *a), find(timeline, *b));
            match (a, b) {
                (Some(a), Some(b)) if (a.end() - b.start).abs() < f64::EPSILON => Ok(()),
                (Some(_), Some(_)) => violation(format!("meets({a:?}, {b:?}) violated")),
                _ => Ok(()),
            }
        }
        Constraint::During { a, b } => {
            let (a, b) = (find(timeline, *a), find(timeline, *b));
            match (a, b) {
                (Some(a), Some(b)) if b.start <= a.start && a.end() <= b.end() => Ok(()),
                (Some(_), Some(_)) => violation(format!("during({a:?}, {b:?}) violated")),
                _ => Ok(()),
            }
        }
        Constraint::Overlaps { a, b } => {
            let (a, b) = (find(timeline, *a), find(timeline, *b));
            match (a, b) {
                (Some(a), Some(b)) if a.start < b.start && a.end() > b.start && a.end() < b.end() => Ok(()),
                (Some(_), Some(_)) => violation(format!("overlaps({a:?}, {b:?}) violated")),
                _ => Ok(()),
            }
        }
        Constraint::Starts { a, b } => {
            let (a, b) = (find(timeline, *a), find(timeline, *b));
            match (a, b) {
                (Some(a), Some(b)) if (a.start - b.start).abs() < f64::EPSILON && a.end() <= b.end() => Ok(()),
                (Some(_), Some(_)) => violation(format!("starts({a:?}, {b:?}) violated")),
                _ => Ok(()),
            }
        }
        Constraint::Finishes { a, b } => {
            let (a, b) = (find(timeline, *a), find(timeline, *b));
            match (a, b) {
                (Some(a), Some(b)) if (a.end() - b.end()).abs() < f64::EPSILON && a.start >= b.start => Ok(()),
                (Some(_), Some(_)) => violation(format!("finishes({a:?}, {b:?}) violated")),
                _ => Ok(()),
            }
        }
        Constraint::Equals { a, b } => {
            let (a, b) = (find(timeline, *a), find(timeline, *b));
            match (a, b) {
                (Some(a), Some(b)) if (a.start - b.start).abs() < f64::EPSILON && (a.end() - b.end()).abs() < f64::EPSILON => Ok(()),
                (Some(_), Some(_)) => violation(format!("equals({a:?}, {b:?}) violated")),
                _ => Ok(()),
            }
        }
        Constraint::Deadline { action, deadline } => match find(timeline, *action) {
            Some(a) if a.end() <= *deadline => Ok(()),
            Some(_) => Err(TemporalError::DeadlineMissed(*action)),
            None => Ok(()),
        },
        Constraint::Cooldown { actor, action_label, min_gap } => {
            let mut starts: Vec<f64> = timeline
                .iter()
                .filter(|t| &t.actor == actor && &t.action_label == action_label)
                .map(|t| t.start)
                .collect();
            starts.sort_by(|a, b| a.partial_cmp(b).expect("start times are finite"));
            for pair in starts.windows(2) {
                if pair[1] - pair[0] < *min_gap {
                    return violation(format!("cooldown({actor}, {action_label}, {min_gap}) violated"));
                }
            }
            Ok(())
        }
    }
}

/// Verify every constraint in `constraints` against `timeline`, short-circuiting on the first failure.
///
/// # Errors
///
/// See [`check`].
pub fn check_all(constraints: &[Constraint], timeline: &[TimedAction]) -> Result<(), TemporalError> {
    for constraint in constraints {
        check(constraint, timeline)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::schedule::TimedStatus;

    fn action(id: u64, actor: &str, label: &str, start: f64, duration: f64) -> TimedAction {
        TimedAction {
            node_id: crate::node_id::NodeId::new(id),
            actor: actor.to_string(),
            action_label: label.to_string(),
            start,
            duration,
            status: TimedStatus::Scheduled,
        }
    }

    #[test]
    fn before_holds_when_gap_is_sufficient() {
        let timeline = vec![action(1, "bob", "walk", 0.0, 5.0), action(2, "bob", "wait", 6.0, 2.0)];
        let c = Constraint::Before { a: timeline[0].node_id, b: timeline[1].node_id, offset: 1.0 };
        assert!(check(&c, &timeline).is_ok());
    }

    #[test]
    fn before_fails_when_gap_is_too_small() {
        let timeline = vec![action(1, "bob", "walk", 0.0, 5.0), action(2, "bob", "wait", 5.5, 2.0)];
        let c = Constraint::Before { a: timeline[0].node_id, b: timeline[1].node_id, offset: 1.0 };
        assert!(check(&c, &timeline).is_err());
    }

    #[test]
    fn deadline_reports_the_specific_error_variant() {
        let timeline = vec![action(1, "bob", "rescue", 0.0, 40.0)];
        let c = Constraint::Deadline { action: timeline[0].node_id, deadline: 30.0 };
        assert!(matches!(check(&c, &timeline), Err(TemporalError::DeadlineMissed(_))));
    }

    #[test]
    fn cooldown_requires_minimum_separation() {
        let timeline = vec![action(1, "drone1", "patrol", 0.0, 1.0), action(2, "drone1", "patrol", 2.0, 1.0)];
        let c = Constraint::Cooldown { actor: "drone1".to_string(), action_label: "patrol".to_string(), min_gap: 5.0 };
        assert!(check(&c, &timeline).is_err());
    }
}
