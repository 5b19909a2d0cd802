//! Canonical fixtures and assertion helpers for exercising the planner and
//! chunk store's testable properties (§8), usable by this crate's own tests
//! and by downstream callers writing their own.

pub mod assertions;
pub mod fixtures;

pub use assertions::{assert_fact, assert_path_to_root, assert_plan_labels};
