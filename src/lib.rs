//! # htn-synth
//!
//! A **re-entrant, temporal Hierarchical Task Network planner** paired with a
//! **casync/desync-compatible content-addressed chunk store**.
//!
//! These two halves share nothing but a crate boundary and a build: the
//! planner plans and executes task networks over a purely functional fact
//! store; the chunk layer splits byte streams into content-defined chunks and
//! persists them under a stable, casync-wire-compatible identity. Bring
//! either half in on its own.
//!
//! ## Quick Start: planning
//!
//! ```
//! use htn_synth::domain::Domain;
//! use htn_synth::item::{ActionOutcome, TaskItem};
//! use htn_synth::planner::{self, PlannerOptions};
//! use htn_synth::state::State;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let mut domain = Domain::new();
//! domain
//!     .add_action(
//!         "walk",
//!         Arc::new(|state: &State, args: &serde_json::Value| {
//!             let dest = args["dest"].as_str().unwrap_or_default().to_string();
//!             ActionOutcome::Ok(state.set("loc", "me", json!(dest)))
//!         }),
//!     )
//!     .unwrap();
//!
//! let goals = vec![TaskItem::action("walk", json!({"dest": "park"}))];
//! let tree = planner::plan(&domain, State::new(), goals, PlannerOptions::default()).unwrap();
//! let end_state = planner::execute(&tree, &domain).unwrap();
//! assert_eq!(end_state.get("loc", "me"), Some(&json!("park")));
//! ```
//!
//! ## Quick Start: chunking and storage
//!
//! ```
//! use htn_synth::chunk::{chunk_stream, ChunkerParams};
//! use htn_synth::chunk::{put_chunk, InMemoryChunkStore};
//!
//! let data = vec![7u8; 200_000];
//! let spans = chunk_stream(&data, &ChunkerParams::default());
//!
//! let store = InMemoryChunkStore::new();
//! for (start, end) in &spans {
//!     put_chunk(&store, &data[*start as usize..*end as usize]).unwrap();
//! }
//! ```
//!
//! ## Module overview
//!
//! - [`fact`] / [`state`] — the `Fact` data model and the persistent `State`
//!   fact store actions and methods operate over.
//! - [`item`] — `TaskItem`, `ActionOutcome`, `Unigoal`: the vocabulary the
//!   planner decomposes and the outcome an action reports.
//! - [`domain`] — the `Domain` registry of actions and methods.
//! - [`node_id`] — opaque arena identifiers shared by the solution tree.
//! - [`tree`] — the `SolutionTree` arena and its structural operations.
//! - [`planner`] — `plan`, `execute`, `replan`, `blacklist`, `explain`: the
//!   depth-first HTN search engine, its re-entrant replanning contract, and
//!   a diagnostic breakdown of a resolved tree's chosen methods.
//! - [`temporal`] — the temporal overlay: durations, timed effects, Allen-style
//!   interval constraints, and greedy-with-repair scheduling over a planned
//!   solution tree.
//! - [`chunk`] — content-defined chunking (buzhash, the chunker) and the
//!   content-addressed `ChunkStore`.
//! - [`codec`] — the casync/desync-compatible archive element stream and
//!   chunk-index binary formats.
//! - [`error`] — the stable, matchable error taxonomy shared across every
//!   subsystem above.
//! - [`testing`] — canonical fixtures and assertion helpers for exercising
//!   the properties the planner and chunk layer are expected to hold.
//!
//! ## Re-entrancy
//!
//! Both halves are built to be re-entered mid-operation rather than run
//! start-to-finish exactly once: [`planner::replan`] resumes a partially
//! executed solution tree at the node that failed, and the chunk store's
//! `put`/`get` are safe to call concurrently from multiple threads against
//! the same backing directory (publication is atomic; see [`chunk::store`]).

pub mod chunk;
pub mod codec;
pub mod domain;
pub mod error;
pub mod fact;
pub mod item;
pub mod node_id;
pub mod planner;
pub mod state;
pub mod temporal;
pub mod testing;
pub mod tree;

pub use domain::Domain;
pub use error::{ChunkError, CodecError, DomainError, ExecutionError, PlannerError, TemporalError};
pub use item::{ActionOutcome, TaskItem, Unigoal};
pub use node_id::NodeId;
pub use planner::{plan, PlannerOptions};
pub use state::State;
pub use tree::SolutionTree;
