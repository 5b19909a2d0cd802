//! The temporal layer: durations, timed effects, constraints, and scheduling
//! over the HTN planner (§4.5).

pub mod constraints;
pub mod log;
pub mod schedule;

pub use constraints::Constraint;
pub use log::TemporalLog;
pub use schedule::{temporal_plan, temporal_replan, DurationFn, EffectsFn, TemporalDomain, TemporalPlan, TimedAction, TimedEffect, TimedStatus};
