//! The HTN search engine: `plan`, `execute`, `replan`, `blacklist` (§4.3, §6).

mod search;

pub(crate) use search::call_action_safely;

use crate::domain::Domain;
use crate::error::{ExecutionError, PlannerError};
use crate::item::TaskItem;
use crate::node_id::NodeId;
use crate::state::State;
use crate::tree::{NodeKind, NodeStatus, SolutionTree};
use std::fmt;

/// The closed configuration set for planning (§6).
#[derive(Clone, Copy, Debug)]
pub struct PlannerOptions {
    /// Maximum decomposition depth before `BoundExceeded`.
    pub max_depth: usize,
    /// Maximum number of node resolutions attempted before `BoundExceeded`.
    pub max_nodes: usize,
    /// 0 = silent, 1 = info, 2 = debug, 3 = trace (mapped onto `tracing` levels; §11).
    pub verbose_level: u8,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            max_depth: 200,
            max_nodes: 50_000,
            verbose_level: 0,
        }
    }
}

/// A planning failure: the reason, plus the partial tree as it stood at failure (§4.3, §7).
#[derive(Debug)]
pub struct PlanFailure {
    /// Why planning failed.
    pub reason: PlannerError,
    /// The tree as it stood when the failure was detected.
    pub tree: SolutionTree,
}

/// An execution failure: the failing node, the state observed at failure, and why (§6, §7).
#[derive(Debug)]
pub struct ExecutionFailure {
    /// The node whose action failed.
    pub node_id: NodeId,
    /// The state the executor had reached just before the failing action.
    pub state: State,
    /// Why execution failed.
    pub error: ExecutionError,
}

/// Run the depth-first HTN search over `todos`, starting from `initial_state`.
///
/// # Errors
///
/// Returns [`PlanFailure`] (carrying the partial tree) if the search bound is
/// exceeded or no method applies somewhere with no alternative left.
pub fn plan(
    domain: &Domain,
    initial_state: State,
    todos: Vec<TaskItem>,
    options: PlannerOptions,
) -> Result<SolutionTree, PlanFailure> {
    let mut tree = SolutionTree::new_root(initial_state);
    let root = tree.root_id();
    tree.install_children(root, todos);
    search::try_close(&mut tree, root);
    match search::run(domain, &mut tree, &options) {
        Ok(()) => Ok(tree),
        Err(reason) => Err(PlanFailure { reason, tree }),
    }
}

/// Execute `tree`'s leaves, in order, starting from the root's entering state.
///
/// This re-applies each action against `domain` rather than trusting the
/// states recorded at planning time, so real non-determinism in an action's
/// effect surfaces as an [`ExecutionFailure`] the caller can feed to
/// [`replan`] (§6, §7).
///
/// # Errors
///
/// Returns [`ExecutionFailure`] naming the failing node id and the state
/// reached just before it, per §7's "execution errors surface the failing
/// node id".
pub fn execute(tree: &SolutionTree, domain: &Domain) -> Result<State, ExecutionFailure> {
    let root = tree.get(tree.root_id()).expect("root always present");
    let mut state = root.state_in.clone().expect("root state_in always set");
    for node_id in tree.leaves_in_order() {
        let node = tree.get(node_id).expect("leaf id from leaves_in_order always present");
        let Some(TaskItem::Action { name, args }) = &node.label else {
            unreachable!("leaves_in_order only yields Action nodes")
        };
        let Some(action) = domain.get_action(name) else {
            return Err(ExecutionFailure {
                node_id,
                state,
                error: ExecutionError::UnknownAction(name.clone()),
            });
        };
        match search::call_action_safely(action, &state, args) {
            crate::item::ActionOutcome::Ok(new_state) => state = new_state,
            crate::item::ActionOutcome::Fail(reason) => {
                tracing::warn!(node = %node_id, %reason, "action failed during execution");
                return Err(ExecutionFailure {
                    node_id,
                    state,
                    error: ExecutionError::ActionFailed(node_id),
                });
            }
        }
    }
    Ok(state)
}

/// Re-entrant replanning rooted at `failed_node_id` (§4.3, §4.4, §6).
///
/// Walks the root-to-`failed_node_id` path and, at *every* nesting level
/// along it, preserves each sibling that precedes the next path node verbatim
/// (structure, chosen methods, recorded states, copied via
/// [`copy_node_recursive`]) and re-queues each sibling that follows it as a
/// fresh `Open` item, recursing into the path-continuation node itself
/// (carrying its already-chosen `method_index` over rather than redoing it).
/// `failed_node_id` is reopened with its entering state forced to
/// `state_override`. Nothing outside the path is ever discarded, whatever its
/// nesting depth, which is what `replan_from`'s "prefix preserved" contract
/// (§4.4, §8 property 3) actually requires.
///
/// # Errors
///
/// Returns [`PlanFailure`] under the same conditions as [`plan`].
pub fn replan(
    domain: &Domain,
    tree: &SolutionTree,
    failed_node_id: NodeId,
    state_override: State,
    options: PlannerOptions,
) -> Result<SolutionTree, PlanFailure> {
    tracing::info!(node = %failed_node_id, "replanning");
    let root = tree.root_id();
    let path = tree.path_to_root(failed_node_id);

    let mut new_tree = SolutionTree::new_root(
        tree.get(root)
            .expect("root present")
            .state_in
            .clone()
            .expect("root state_in always set"),
    );
    let new_root = new_tree.root_id();

    if path.len() <= 1 {
        // failed_node_id IS the root (nothing to replan); fall back to a
        // fresh plan of the whole original todo list.
        let todos: Vec<TaskItem> = tree
            .get(root)
            .expect("root present")
            .children
            .iter()
            .filter_map(|id| tree.get(*id).and_then(|n| n.label.clone()))
            .collect();
        return plan(domain, state_override, todos, options);
    }

    let root_children = tree.get(root).expect("root present").children.clone();
    let next_on_path = path[1];
    let pos = root_children
        .iter()
        .position(|c| *c == next_on_path)
        .expect("path continuation is one of root's children");

    for &id in &root_children[..pos] {
        copy_node_recursive(&mut new_tree, new_root, tree, id);
    }
    rebuild_for_replan(&mut new_tree, new_root, tree, next_on_path, &path, 1, &state_override);
    for &id in &root_children[pos + 1..] {
        let item = tree.get(id).and_then(|n| n.label.clone()).expect("non-root label");
        new_tree.append_child(new_root, item);
    }

    search::try_close(&mut new_tree, new_root);
    match search::run(domain, &mut new_tree, &options) {
        Ok(()) => Ok(new_tree),
        Err(reason) => Err(PlanFailure { reason, tree: new_tree }),
    }
}

/// Recursively mirror `src_id`'s subtree into `dest` under `dest_parent`,
/// following `path` (the root-to-`failed_node_id` path, `path[path_index] ==
/// src_id`). Siblings before the next path node are preserved verbatim;
/// siblings after it are re-queued as fresh `Open` nodes; the walk continues
/// into the path-continuation child until `src_id` itself is the failed leaf,
/// which is reopened with `state_override` as its entering state. Returns the
/// new node's id in `dest`.
fn rebuild_for_replan(
    dest: &mut SolutionTree,
    dest_parent: NodeId,
    src: &SolutionTree,
    src_id: NodeId,
    path: &[NodeId],
    path_index: usize,
    state_override: &State,
) -> NodeId {
    let src_node = src.get(src_id).expect("src node present").clone();
    let new_id = dest.append_child(dest_parent, src_node.label.clone().expect("non-root label"));

    if path_index + 1 >= path.len() {
        // src_id is the failed node itself: leave it Open so search resolves
        // it fresh, entering from the caller-supplied state.
        if let Some(node) = dest.get_mut(new_id) {
            node.state_in = Some(state_override.clone());
        }
        return new_id;
    }

    let next_on_path = path[path_index + 1];
    let pos = src_node
        .children
        .iter()
        .position(|c| *c == next_on_path)
        .expect("path continuation is a child of src_id");

    for &id in &src_node.children[..pos] {
        copy_node_recursive(dest, new_id, src, id);
    }
    rebuild_for_replan(dest, new_id, src, next_on_path, path, path_index + 1, state_override);
    for &id in &src_node.children[pos + 1..] {
        let item = src.get(id).and_then(|n| n.label.clone()).expect("non-root label");
        dest.append_child(new_id, item);
    }

    // This ancestor's own method choice already succeeded; it only needs to
    // be re-resolved at the point where its freshly reopened descendant
    // closes, so `state_out` is deliberately left unset.
    if let Some(node) = dest.get_mut(new_id) {
        node.status = NodeStatus::Decomposed;
        node.method_index = src_node.method_index;
        node.state_in = src_node.state_in.clone();
    }
    new_id
}

/// Recursively copy `src_id` (and its descendants) from `src` into `dest`
/// under `dest_parent`, preserving status/method_index/state. Used by
/// [`replan`] to carry the preserved prefix over verbatim.
fn copy_node_recursive(dest: &mut SolutionTree, dest_parent: NodeId, src: &SolutionTree, src_id: NodeId) {
    let src_node = src.get(src_id).expect("src node present").clone();
    let new_id = dest.append_child(dest_parent, src_node.label.clone().expect("non-root label"));
    if let Some(node) = dest.get_mut(new_id) {
        node.status = src_node.status;
        node.method_index = src_node.method_index;
        node.state_in = src_node.state_in.clone();
        node.state_out = src_node.state_out.clone();
    }
    for child in &src_node.children {
        copy_node_recursive(dest, new_id, src, *child);
    }
}

/// Mark `node_id`'s label excluded from retry for the remainder of `tree`'s
/// search, returning the updated tree (§4.4, §6).
#[must_use]
pub fn blacklist(tree: &SolutionTree, node_id: NodeId) -> SolutionTree {
    let mut tree = tree.clone();
    if let Some(label) = tree.get(node_id).and_then(|n| n.label.as_ref()).map(TaskItem::label) {
        tracing::info!(node = %node_id, %label, "blacklisting");
        tree.blacklist_label(&label);
    }
    tree
}

/// One line of a [`PlanExplanation`]: the method chosen at a single
/// decomposed or primitive node.
#[derive(Clone, Debug)]
pub struct ExplainStep {
    /// The node this line describes.
    pub node_id: NodeId,
    /// Nesting depth from the root (0 = a root-level item).
    pub depth: usize,
    /// `"action"`, `"task"`, `"unigoal"`, or `"multigoal"`.
    pub kind: &'static str,
    /// The node's label, e.g. `action:pickup` or `task:deliver`.
    pub label: String,
    /// Which applicable method (or, for an action, always 0) was chosen.
    pub method_index: usize,
}

/// A human-readable breakdown of a resolved tree: which method was chosen at
/// each decomposition point, in depth-first order (§15).
#[derive(Clone, Debug)]
pub struct PlanExplanation {
    /// One entry per decomposed or primitive node, depth-first.
    pub steps: Vec<ExplainStep>,
    /// Total number of primitive actions in the tree.
    pub action_count: usize,
    /// The deepest nesting level reached.
    pub max_depth: usize,
}

impl fmt::Display for PlanExplanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "plan: {} action(s), max depth {}", self.action_count, self.max_depth)?;
        for step in &self.steps {
            writeln!(
                f,
                "{}{} {} {} (method #{})",
                "  ".repeat(step.depth),
                step.node_id,
                step.kind,
                step.label,
                step.method_index
            )?;
        }
        Ok(())
    }
}

/// Render `tree` as a [`PlanExplanation`]: the method chosen at each
/// decomposed node (the tie-break among a task/unigoal/multigoal's
/// applicable methods, §4.3) plus every primitive action, depth-first (§15).
///
/// This is a diagnostic over an already-resolved tree; it does not plan or
/// mutate anything.
#[must_use]
pub fn explain(tree: &SolutionTree) -> PlanExplanation {
    let mut steps = Vec::new();
    let mut action_count = 0;
    let mut max_depth = 0;
    explain_node(tree, tree.root_id(), 0, &mut steps, &mut action_count, &mut max_depth);
    PlanExplanation { steps, action_count, max_depth }
}

fn explain_node(
    tree: &SolutionTree,
    node_id: NodeId,
    depth: usize,
    steps: &mut Vec<ExplainStep>,
    action_count: &mut usize,
    max_depth: &mut usize,
) {
    let Some(node) = tree.get(node_id) else { return };
    if let Some(label) = &node.label {
        *max_depth = (*max_depth).max(depth);
        let kind = match node.kind {
            NodeKind::Action => {
                *action_count += 1;
                "action"
            }
            NodeKind::Task => "task",
            NodeKind::Unigoal => "unigoal",
            NodeKind::Multigoal => "multigoal",
            NodeKind::Root => "root",
        };
        steps.push(ExplainStep {
            node_id,
            depth,
            kind,
            label: label.label(),
            method_index: node.method_index,
        });
    }
    for &child in &node.children {
        explain_node(tree, child, depth + 1, steps, action_count, max_depth);
    }
}
