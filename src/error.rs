//! The stable error taxonomy.
//!
//! Every subsystem returns one of these enums rather than a boxed/opaque
//! error, so callers can `match` on the kind the way the planner's own
//! replanning contract requires (an execution failure must name the failing
//! node id; a codec failure must name the byte offset).

use crate::node_id::NodeId;
use thiserror::Error;

/// Errors raised while registering actions/methods into a [`Domain`](crate::domain::Domain).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An action with this name was already registered.
    #[error("duplicate action: {0}")]
    DuplicateAction(String),
    /// No action, task method, unigoal method, or multigoal method is registered under this name.
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),
}

/// Errors raised by the planner's search.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlannerError {
    /// The configured `max_depth` or `max_nodes` bound was exceeded before a plan was found.
    #[error("planning bound exceeded (depth or node budget)")]
    BoundExceeded,
    /// Every method registered for a task/unigoal/multigoal failed.
    #[error("no method applicable for {0}")]
    NoMethodApplicable(String),
    /// The goal cannot be reached from the given state under the given domain.
    #[error("goal unreachable: {0}")]
    GoalUnreachable(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Errors surfaced while executing a solution tree's leaves.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The named action failed when applied to the state it was handed.
    #[error("action failed at node {0}")]
    ActionFailed(NodeId),
    /// A declared precondition did not hold at the time an action was due to start.
    #[error("precondition violated at node {0}")]
    PreconditionViolated(NodeId),
    /// The leaf's action name has no registered action in the domain handed to `execute`.
    #[error("unknown action: {0}")]
    UnknownAction(String),
}

/// Errors raised by the temporal layer (scheduling, constraint checking, replanning).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemporalError {
    /// A declared constraint does not hold for the computed schedule.
    #[error("constraint violated: {0}")]
    ConstraintViolation(String),
    /// An action's declared deadline could not be met.
    #[error("deadline missed for action {0}")]
    DeadlineMissed(NodeId),
    /// No schedule exists that satisfies every declared constraint.
    #[error("infeasible: {0}")]
    Infeasible(String),
    #[error(transparent)]
    Planner(#[from] PlannerError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Errors raised by the chunk store.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// The hash of the bytes returned for an identity did not match that identity.
    #[error("corrupt chunk object (hash mismatch)")]
    Corrupt,
    /// No object exists for the given identity.
    #[error("chunk not found")]
    NotFound,
    /// A chunker parameter (or a produced chunk) fell outside `[min_size, max_size]`.
    #[error("chunk size out of range: {0}")]
    SizeOutOfRange(usize),
    /// The underlying store I/O failed.
    #[error("chunk store I/O error")]
    Io(#[source] std::io::Error),
}

/// Errors raised by the archive/index binary codecs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The input ended before a complete header/record could be read.
    #[error("truncated input at offset {offset}")]
    Truncated {
        /// Byte offset at which the truncation was detected.
        offset: u64,
    },
    /// A record's declared size is inconsistent with the remaining buffer or known layout.
    #[error("malformed record at offset {offset}: {reason}")]
    Malformed {
        /// Byte offset of the start of the malformed record.
        offset: u64,
        /// Human-readable reason.
        reason: String,
    },
    /// A fixed magic number did not match what was expected.
    #[error("bad magic at offset {offset}: expected {expected:#x}, found {found:#x}")]
    BadMagic {
        /// Byte offset of the magic field.
        offset: u64,
        /// Expected constant.
        expected: u64,
        /// Constant actually read.
        found: u64,
    },
}
