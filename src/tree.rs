//! The Solution Tree: the persistent record of decompositions (§3, §4.4).
//!
//! Represented as an arena of nodes keyed by [`NodeId`] with parent/child
//! index vectors (spec.md §9's "avoid cyclic owner references" design note),
//! mirroring the `PipelineInner { next_id, nodes, edges }` shape this
//! codebase's predecessor used for its own graph.

use crate::item::TaskItem;
use crate::node_id::NodeId;
use crate::state::State;
use std::collections::{HashMap, HashSet};

/// What a tree node represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// The tree root; carries no label of its own.
    Root,
    /// A primitive action, never decomposed further.
    Action,
    /// An abstract task, decomposed via task methods.
    Task,
    /// A single-fact goal, decomposed via unigoal methods.
    Unigoal,
    /// A conjunction of unigoals, decomposed via multigoal methods (or the default split).
    Multigoal,
}

/// A node's position in the search lifecycle (§3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeStatus {
    /// Not yet attempted.
    Open,
    /// Decomposed; `children` holds the chosen method's sub-items.
    Decomposed,
    /// A primitive action that ran successfully.
    Executed,
    /// Every applicable method (or the action itself) failed here.
    Failed,
    /// Excluded from further attempts by [`SolutionTree::blacklist`].
    Blacklisted,
    /// Decomposition deferred; see §4.3 "lazy refinement-ahead mode".
    Deferred,
}

/// One node of a [`SolutionTree`].
#[derive(Clone, Debug)]
pub struct Node {
    /// This node's id.
    pub id: NodeId,
    /// What kind of item this node represents.
    pub kind: NodeKind,
    /// The task-like item this node was created for. `None` only for the root.
    pub label: Option<TaskItem>,
    /// Index into the applicable method list; enables backtracking to the next method.
    pub method_index: usize,
    /// The state entering this node, once known.
    pub state_in: Option<State>,
    /// The state leaving this node, once resolved.
    pub state_out: Option<State>,
    /// Ordered child node ids.
    pub children: Vec<NodeId>,
    /// Current lifecycle status.
    pub status: NodeStatus,
    /// This node's parent, `None` only for the root.
    pub parent: Option<NodeId>,
}

/// The persistent record of decompositions produced during planning (§3).
#[derive(Clone, Debug)]
pub struct SolutionTree {
    next_id: u64,
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    /// Labels excluded from retry for the remainder of this tree's search (§4.4).
    blacklisted_labels: HashSet<String>,
}

impl SolutionTree {
    /// Create a tree with just a root node, entering `state`.
    #[must_use]
    pub fn new_root(state: State) -> Self {
        let root_id = NodeId::new(0);
        let root = Node {
            id: root_id,
            kind: NodeKind::Root,
            label: None,
            method_index: 0,
            state_in: Some(state),
            state_out: None,
            children: Vec::new(),
            status: NodeStatus::Decomposed,
            parent: None,
        };
        let mut nodes = HashMap::new();
        nodes.insert(root_id, root);
        Self {
            next_id: 1,
            nodes,
            root: root_id,
            blacklisted_labels: HashSet::new(),
        }
    }

    /// The root node's id.
    #[must_use]
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Borrow a node by id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Mutably borrow a node by id.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    fn alloc_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create an `Open` child node for `item` under `parent_id`, appended to
    /// `parent_id`'s children.
    pub fn append_child(&mut self, parent_id: NodeId, item: TaskItem) -> NodeId {
        let kind = match &item {
            TaskItem::Action { .. } => NodeKind::Action,
            TaskItem::Task { .. } => NodeKind::Task,
            TaskItem::Unigoal(_) => NodeKind::Unigoal,
            TaskItem::Multigoal(_) => NodeKind::Multigoal,
        };
        let id = self.alloc_id();
        let node = Node {
            id,
            kind,
            label: Some(item),
            method_index: 0,
            state_in: None,
            state_out: None,
            children: Vec::new(),
            status: NodeStatus::Open,
            parent: Some(parent_id),
        };
        self.nodes.insert(id, node);
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children.push(id);
        }
        id
    }

    /// Install `items` as `parent_id`'s children (in order), marking `parent_id`
    /// `Decomposed`. Returns the new children's ids. A decomposition into zero
    /// children is a no-op: `parent_id` is closed immediately by copying its
    /// own `state_in` forward to `state_out`, since `try_close` otherwise has
    /// no child to read a closing state from.
    pub fn install_children(&mut self, parent_id: NodeId, items: Vec<TaskItem>) -> Vec<NodeId> {
        let ids: Vec<NodeId> = items.into_iter().map(|item| self.append_child(parent_id, item)).collect();
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.status = NodeStatus::Decomposed;
            if ids.is_empty() {
                parent.state_out = parent.state_in.clone();
            }
        }
        ids
    }

    /// Remove `node_id` and its entire subtree from the arena, detaching it
    /// from its parent's children list.
    pub fn prune(&mut self, node_id: NodeId) {
        let mut stack = vec![node_id];
        let mut to_remove = Vec::new();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().copied());
            }
            to_remove.push(id);
        }
        if let Some(node) = self.nodes.get(&node_id)
            && let Some(parent_id) = node.parent
            && let Some(parent) = self.nodes.get_mut(&parent_id)
        {
            parent.children.retain(|c| *c != node_id);
        }
        for id in to_remove {
            self.nodes.remove(&id);
        }
    }

    /// Discard `node_id`'s current decomposition (pruning its children) and
    /// advance its `method_index` so the next search attempt tries the next
    /// applicable method. Resets status to `Open`.
    pub fn advance_method(&mut self, node_id: NodeId) {
        let children: Vec<NodeId> = self.nodes.get(&node_id).map(|n| n.children.clone()).unwrap_or_default();
        for child in children {
            self.prune(child);
        }
        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.method_index += 1;
            node.status = NodeStatus::Open;
            node.children.clear();
        }
    }

    /// Record `item`'s label as excluded from retry for the remainder of this
    /// tree's search (§4.4). Returns the label string recorded.
    pub fn blacklist_label(&mut self, label: &str) {
        self.blacklisted_labels.insert(label.to_string());
    }

    /// Whether `label` has been blacklisted in this tree.
    #[must_use]
    pub fn is_blacklisted(&self, label: &str) -> bool {
        self.blacklisted_labels.contains(label)
    }

    /// The leftmost node still in `Open` status, found by depth-first,
    /// left-to-right traversal starting at the root (§4.3's
    /// "leftmost-outermost" rule -- an `Open` node has no children yet, so
    /// stopping the walk there is exactly "outermost").
    #[must_use]
    pub fn find_deepest_leftmost_open(&self) -> Option<NodeId> {
        self.find_open_from(self.root)
    }

    fn find_open_from(&self, id: NodeId) -> Option<NodeId> {
        let node = self.nodes.get(&id)?;
        match node.status {
            NodeStatus::Open | NodeStatus::Deferred => Some(id),
            NodeStatus::Decomposed => {
                // Fully resolved composites (state_out already stamped by
                // `try_close`) contribute nothing further to the frontier.
                if node.state_out.is_some() {
                    return None;
                }
                for child in &node.children {
                    if let Some(found) = self.find_open_from(*child) {
                        return Some(found);
                    }
                }
                None
            }
            NodeStatus::Executed | NodeStatus::Blacklisted | NodeStatus::Failed => None,
        }
    }

    /// The nearest ancestor of `node_id` (inclusive) that is not fully
    /// resolved along its whole subtree -- used by backtracking to find where
    /// to call [`SolutionTree::advance_method`].
    #[must_use]
    pub fn parent_of(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes.get(&node_id).and_then(|n| n.parent)
    }

    /// In-order leaves: the ordered sequence of `Action` nodes under `id`,
    /// the plan itself once the whole tree is resolved (§3, §8 property 1).
    #[must_use]
    pub fn leaves_in_order(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_leaves(self.root, &mut out);
        out
    }

    fn collect_leaves(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let Some(node) = self.nodes.get(&id) else { return };
        match node.kind {
            NodeKind::Action => out.push(id),
            _ => {
                for child in &node.children {
                    self.collect_leaves(*child, out);
                }
            }
        }
    }

    /// Root-to-node path (inclusive of both endpoints), used by `replan_from`.
    #[must_use]
    pub fn path_to_root(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut path = vec![node_id];
        let mut cur = node_id;
        while let Some(node) = self.nodes.get(&cur)
            && let Some(parent) = node.parent
        {
            path.push(parent);
            cur = parent;
        }
        path.reverse();
        path
    }

    /// Render the tree as an indented text block, mirroring the
    /// predecessor's `debug_print_graph`.
    #[must_use]
    pub fn debug_print(&self) -> String {
        let mut out = String::new();
        self.debug_print_node(self.root, 0, &mut out);
        out
    }

    fn debug_print_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let Some(node) = self.nodes.get(&id) else { return };
        let label = node.label.as_ref().map_or_else(|| "root".to_string(), ToString::to_string);
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("{id} [{:?}] {label} ({:?})\n", node.kind, node.status));
        for child in &node.children {
            self.debug_print_node(*child, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::TaskItem;
    use serde_json::json;

    #[test]
    fn install_children_marks_parent_decomposed() {
        let mut tree = SolutionTree::new_root(State::new());
        let root = tree.root_id();
        let ids = tree.install_children(root, vec![TaskItem::action("a", json!({}))]);
        assert_eq!(tree.get(root).unwrap().status, NodeStatus::Decomposed);
        assert_eq!(ids.len(), 1);
        assert_eq!(tree.find_deepest_leftmost_open(), Some(ids[0]));
    }

    #[test]
    fn advance_method_prunes_children_and_resets_status() {
        let mut tree = SolutionTree::new_root(State::new());
        let root = tree.root_id();
        let ids = tree.install_children(root, vec![TaskItem::task("t", json!({}))]);
        let task_id = ids[0];
        tree.install_children(task_id, vec![TaskItem::action("a", json!({}))]);
        assert_eq!(tree.get(task_id).unwrap().children.len(), 1);
        tree.advance_method(task_id);
        assert_eq!(tree.get(task_id).unwrap().children.len(), 0);
        assert_eq!(tree.get(task_id).unwrap().method_index, 1);
        assert_eq!(tree.get(task_id).unwrap().status, NodeStatus::Open);
    }

    #[test]
    fn leaves_in_order_flattens_nested_actions() {
        let mut tree = SolutionTree::new_root(State::new());
        let root = tree.root_id();
        let ids = tree.install_children(root, vec![TaskItem::task("t", json!({}))]);
        tree.install_children(
            ids[0],
            vec![TaskItem::action("a1", json!({})), TaskItem::action("a2", json!({}))],
        );
        let leaves = tree.leaves_in_order();
        assert_eq!(leaves.len(), 2);
    }
}
