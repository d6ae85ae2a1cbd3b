//! Behavior Tree Engine.
//!
//! Nodes live in an arena owned by [`BehaviorTree`] and are addressed by
//! [`NodeId`].  Trees are assembled bottom-up with [`TreeBuilder`]: create the
//! leaves first, then the composites that own them, then call
//! [`TreeBuilder::build`] with the root.
//!
//! Every node shares the tree's [`Blackboard`].  Ticks are synchronous; a
//! long-running action reports [`BehaviorStatus::Running`] and is ticked
//! again on the next [`BehaviorTree::tick`].
//!
//! # Nodes
//!
//! | Node type   | Description                                                              |
//! |-------------|--------------------------------------------------------------------------|
//! | `action`    | Runs a closure over the blackboard and returns its status.              |
//! | `condition` | Evaluates a predicate: `true` → Success, `false` → Failure.             |
//! | `sequence`  | Resumes at its cursor; fails on the first failure, succeeds when all do. |
//! | `selector`  | Resumes at its cursor; succeeds on the first success, fails when all do. |
//! | `parallel`  | Ticks every child; succeeds once enough children succeed.              |
//!
//! # Example
//!
//! ```rust
//! use usv_runtime::behavior_tree::{BehaviorStatus, TreeBuilder};
//! use usv_runtime::blackboard::Blackboard;
//!
//! let mut b = TreeBuilder::new();
//! let healthy = b.condition("healthy", |bb| !bb.get_bool("fault").unwrap_or(false));
//! let steer = b.action("steer", |_| BehaviorStatus::Running);
//! let root = b.sequence("patrol", &[healthy, steer]).unwrap();
//! let mut tree = b.build(root).unwrap();
//!
//! assert_eq!(tree.tick(), BehaviorStatus::Running);
//! let status = tree.update(Some(Blackboard::new().with("fault", true)));
//! assert_eq!(status, BehaviorStatus::Running); // the sequence resumes at `steer`
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::blackboard::Blackboard;

// ─────────────────────────────────────────────────────────────────────────────
// BehaviorStatus
// ─────────────────────────────────────────────────────────────────────────────

/// The execution status of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BehaviorStatus {
    Success,
    Failure,
    /// Started but not finished; tick again.
    Running,
    /// Not ticked since construction or the last reset.
    #[default]
    Invalid,
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BehaviorTreeError {
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    #[error("Node {child} already has parent {parent}")]
    AlreadyParented { child: NodeId, parent: NodeId },

    #[error("Root node {0} is a child of another node")]
    RootHasParent(NodeId),

    #[error("Parallel success threshold {threshold} exceeds its {children} children")]
    InvalidThreshold { threshold: usize, children: usize },
}

// ─────────────────────────────────────────────────────────────────────────────
// Nodes
// ─────────────────────────────────────────────────────────────────────────────

/// Index of a node in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type ActionFn = Box<dyn FnMut(&mut Blackboard) -> BehaviorStatus + Send>;
type ConditionFn = Box<dyn Fn(&Blackboard) -> bool + Send + Sync>;

enum NodeKind {
    Action(ActionFn),
    Condition(ConditionFn),
    Sequence {
        children: Vec<NodeId>,
        cursor: usize,
    },
    Selector {
        children: Vec<NodeId>,
        cursor: usize,
    },
    Parallel {
        children: Vec<NodeId>,
        success_threshold: usize,
    },
}

impl NodeKind {
    fn label(&self) -> &'static str {
        match self {
            NodeKind::Action(_) => "action",
            NodeKind::Condition(_) => "condition",
            NodeKind::Sequence { .. } => "sequence",
            NodeKind::Selector { .. } => "selector",
            NodeKind::Parallel { .. } => "parallel",
        }
    }
}

struct Node {
    name: String,
    kind: NodeKind,
    status: BehaviorStatus,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("kind", &self.kind.label())
            .field("status", &self.status)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TreeBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Assembles a [`BehaviorTree`] bottom-up.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
    parents: Vec<Option<NodeId>>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: impl Into<String>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.into(),
            kind,
            status: BehaviorStatus::Invalid,
        });
        self.parents.push(None);
        id
    }

    /// Add an action leaf.  `action` runs once per tick of this node.
    pub fn action(
        &mut self,
        name: impl Into<String>,
        action: impl FnMut(&mut Blackboard) -> BehaviorStatus + Send + 'static,
    ) -> NodeId {
        self.push(name, NodeKind::Action(Box::new(action)))
    }

    /// Add a condition leaf.
    pub fn condition(
        &mut self,
        name: impl Into<String>,
        condition: impl Fn(&Blackboard) -> bool + Send + Sync + 'static,
    ) -> NodeId {
        self.push(name, NodeKind::Condition(Box::new(condition)))
    }

    pub fn sequence(
        &mut self,
        name: impl Into<String>,
        children: &[NodeId],
    ) -> Result<NodeId, BehaviorTreeError> {
        let id = NodeId(self.nodes.len());
        self.adopt(id, children)?;
        Ok(self.push(
            name,
            NodeKind::Sequence {
                children: children.to_vec(),
                cursor: 0,
            },
        ))
    }

    pub fn selector(
        &mut self,
        name: impl Into<String>,
        children: &[NodeId],
    ) -> Result<NodeId, BehaviorTreeError> {
        let id = NodeId(self.nodes.len());
        self.adopt(id, children)?;
        Ok(self.push(
            name,
            NodeKind::Selector {
                children: children.to_vec(),
                cursor: 0,
            },
        ))
    }

    /// Add a parallel composite.  `success_threshold` defaults to the number
    /// of children.
    pub fn parallel(
        &mut self,
        name: impl Into<String>,
        children: &[NodeId],
        success_threshold: Option<usize>,
    ) -> Result<NodeId, BehaviorTreeError> {
        let threshold = success_threshold.unwrap_or(children.len());
        if threshold > children.len() {
            return Err(BehaviorTreeError::InvalidThreshold {
                threshold,
                children: children.len(),
            });
        }
        let id = NodeId(self.nodes.len());
        self.adopt(id, children)?;
        Ok(self.push(
            name,
            NodeKind::Parallel {
                children: children.to_vec(),
                success_threshold: threshold,
            },
        ))
    }

    /// Validate then record `parent` as the parent of every child.
    fn adopt(&mut self, parent: NodeId, children: &[NodeId]) -> Result<(), BehaviorTreeError> {
        for (i, &child) in children.iter().enumerate() {
            let Some(existing) = self.parents.get(child.0) else {
                return Err(BehaviorTreeError::UnknownNode(child));
            };
            if let Some(existing) = existing {
                return Err(BehaviorTreeError::AlreadyParented {
                    child,
                    parent: *existing,
                });
            }
            if children[..i].contains(&child) {
                return Err(BehaviorTreeError::AlreadyParented { child, parent });
            }
        }
        for &child in children {
            self.parents[child.0] = Some(parent);
        }
        Ok(())
    }

    /// Finish the tree rooted at `root`.
    pub fn build(self, root: NodeId) -> Result<BehaviorTree, BehaviorTreeError> {
        match self.parents.get(root.0) {
            None => Err(BehaviorTreeError::UnknownNode(root)),
            Some(Some(_)) => Err(BehaviorTreeError::RootHasParent(root)),
            Some(None) => {
                info!(
                    root = %self.nodes[root.0].name,
                    nodes = self.nodes.len(),
                    "Created behavior tree"
                );
                Ok(BehaviorTree {
                    nodes: self.nodes,
                    root,
                    blackboard: Blackboard::new(),
                })
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BehaviorTree
// ─────────────────────────────────────────────────────────────────────────────

/// A built behavior tree plus its blackboard.
#[derive(Debug)]
pub struct BehaviorTree {
    nodes: Vec<Node>,
    root: NodeId,
    blackboard: Blackboard,
}

impl BehaviorTree {
    /// Merge `patch` into the blackboard, then tick the root once.
    pub fn update(&mut self, patch: Option<Blackboard>) -> BehaviorStatus {
        if let Some(patch) = patch {
            self.blackboard.merge(patch);
        }
        self.tick()
    }

    /// Tick the root once and return its status.
    pub fn tick(&mut self) -> BehaviorStatus {
        self.tick_node(self.root)
    }

    /// Clear the blackboard and every node's cursor and status.
    pub fn reset(&mut self) {
        self.blackboard.clear();
        for node in &mut self.nodes {
            node.status = BehaviorStatus::Invalid;
            match &mut node.kind {
                NodeKind::Sequence { cursor, .. } | NodeKind::Selector { cursor, .. } => {
                    *cursor = 0;
                }
                _ => {}
            }
        }
        debug!("Behavior tree reset");
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Last status of `id`, or `None` for an id from another tree.
    pub fn status_of(&self, id: NodeId) -> Option<BehaviorStatus> {
        self.nodes.get(id.0).map(|n| n.status)
    }

    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id.0).map(|n| n.name.as_str())
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn tick_node(&mut self, id: NodeId) -> BehaviorStatus {
        let status = match &self.nodes[id.0].kind {
            NodeKind::Action(_) | NodeKind::Condition(_) => self.tick_leaf(id),
            NodeKind::Sequence { .. } => self.tick_ordered(id, BehaviorStatus::Success),
            NodeKind::Selector { .. } => self.tick_ordered(id, BehaviorStatus::Failure),
            NodeKind::Parallel { .. } => self.tick_parallel(id),
        };
        self.nodes[id.0].status = status;
        status
    }

    fn tick_leaf(&mut self, id: NodeId) -> BehaviorStatus {
        let node = &mut self.nodes[id.0];
        match &mut node.kind {
            NodeKind::Action(action) => match action(&mut self.blackboard) {
                BehaviorStatus::Invalid => {
                    warn!(node = %node.name, "Action returned Invalid; treating as Failure");
                    BehaviorStatus::Failure
                }
                status => status,
            },
            NodeKind::Condition(condition) => {
                if condition(&self.blackboard) {
                    BehaviorStatus::Success
                } else {
                    BehaviorStatus::Failure
                }
            }
            _ => BehaviorStatus::Failure,
        }
    }

    /// Shared driver for sequence (`advance_on` = Success) and selector
    /// (`advance_on` = Failure).
    fn tick_ordered(&mut self, id: NodeId, advance_on: BehaviorStatus) -> BehaviorStatus {
        loop {
            let (child, len) = match &self.nodes[id.0].kind {
                NodeKind::Sequence { children, cursor } | NodeKind::Selector { children, cursor } => {
                    (children.get(*cursor).copied(), children.len())
                }
                _ => return BehaviorStatus::Failure,
            };

            if len == 0 {
                let node = &self.nodes[id.0];
                warn!(node = %node.name, kind = node.kind.label(), "Composite has no children");
                return BehaviorStatus::Failure;
            }

            let Some(child) = child else {
                // Every child returned `advance_on`.
                self.set_cursor(id, 0);
                return advance_on;
            };

            match self.tick_node(child) {
                BehaviorStatus::Running => return BehaviorStatus::Running,
                status if status == advance_on => self.bump_cursor(id),
                status => {
                    self.set_cursor(id, 0);
                    return status;
                }
            }
        }
    }

    fn tick_parallel(&mut self, id: NodeId) -> BehaviorStatus {
        let (children, threshold) = match &self.nodes[id.0].kind {
            NodeKind::Parallel {
                children,
                success_threshold,
            } => (children.clone(), *success_threshold),
            _ => return BehaviorStatus::Failure,
        };

        if children.is_empty() {
            warn!(node = %self.nodes[id.0].name, kind = "parallel", "Composite has no children");
            return BehaviorStatus::Failure;
        }

        let mut succeeded = 0;
        let mut running = 0;
        for child in children {
            match self.tick_node(child) {
                BehaviorStatus::Success => succeeded += 1,
                BehaviorStatus::Running => running += 1,
                _ => {}
            }
        }

        if succeeded >= threshold {
            BehaviorStatus::Success
        } else if running > 0 {
            BehaviorStatus::Running
        } else {
            BehaviorStatus::Failure
        }
    }

    fn set_cursor(&mut self, id: NodeId, value: usize) {
        if let NodeKind::Sequence { cursor, .. } | NodeKind::Selector { cursor, .. } =
            &mut self.nodes[id.0].kind
        {
            *cursor = value;
        }
    }

    fn bump_cursor(&mut self, id: NodeId) {
        if let NodeKind::Sequence { cursor, .. } | NodeKind::Selector { cursor, .. } =
            &mut self.nodes[id.0].kind
        {
            *cursor += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fixed(b: &mut TreeBuilder, name: &str, status: BehaviorStatus) -> NodeId {
        b.action(name, move |_| status)
    }

    /// Action that returns `script[i]` on its i-th tick and counts ticks.
    fn scripted(
        b: &mut TreeBuilder,
        name: &str,
        script: Vec<BehaviorStatus>,
    ) -> (NodeId, Arc<AtomicUsize>) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let id = b.action(name, move |_| {
            let i = counter.fetch_add(1, Ordering::SeqCst);
            script[i.min(script.len() - 1)]
        });
        (id, ticks)
    }

    #[test]
    fn leaf_returns_its_status() {
        for status in [
            BehaviorStatus::Success,
            BehaviorStatus::Failure,
            BehaviorStatus::Running,
        ] {
            let mut b = TreeBuilder::new();
            let leaf = fixed(&mut b, "leaf", status);
            let mut tree = b.build(leaf).unwrap();
            assert_eq!(tree.tick(), status);
        }
    }

    #[test]
    fn invalid_action_is_failure() {
        let mut b = TreeBuilder::new();
        let leaf = fixed(&mut b, "broken", BehaviorStatus::Invalid);
        let mut tree = b.build(leaf).unwrap();
        assert_eq!(tree.tick(), BehaviorStatus::Failure);
    }

    #[test]
    fn condition_reads_blackboard() {
        let mut b = TreeBuilder::new();
        let cond = b.condition("armed", |bb| bb.get_bool("armed").unwrap_or(false));
        let mut tree = b.build(cond).unwrap();
        assert_eq!(tree.tick(), BehaviorStatus::Failure);
        assert_eq!(
            tree.update(Some(Blackboard::new().with("armed", true))),
            BehaviorStatus::Success
        );
    }

    #[test]
    fn sequence_succeeds_when_all_children_succeed() {
        let mut b = TreeBuilder::new();
        let kids: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|n| fixed(&mut b, n, BehaviorStatus::Success))
            .collect();
        let root = b.sequence("seq", &kids).unwrap();
        let mut tree = b.build(root).unwrap();
        assert_eq!(tree.tick(), BehaviorStatus::Success);
    }

    #[test]
    fn sequence_fails_on_first_failure() {
        let mut b = TreeBuilder::new();
        let a = fixed(&mut b, "a", BehaviorStatus::Success);
        let fail = fixed(&mut b, "b", BehaviorStatus::Failure);
        let (c, c_ticks) = scripted(&mut b, "c", vec![BehaviorStatus::Success]);
        let root = b.sequence("seq", &[a, fail, c]).unwrap();
        let mut tree = b.build(root).unwrap();
        assert_eq!(tree.tick(), BehaviorStatus::Failure);
        assert_eq!(c_ticks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn running_sequence_resumes_without_reticking_earlier_children() {
        let mut b = TreeBuilder::new();
        let (first, first_ticks) = scripted(&mut b, "first", vec![BehaviorStatus::Success]);
        let (second, second_ticks) = scripted(
            &mut b,
            "second",
            vec![
                BehaviorStatus::Running,
                BehaviorStatus::Running,
                BehaviorStatus::Success,
            ],
        );
        let root = b.sequence("seq", &[first, second]).unwrap();
        let mut tree = b.build(root).unwrap();

        assert_eq!(tree.tick(), BehaviorStatus::Running);
        assert_eq!(tree.tick(), BehaviorStatus::Running);
        assert_eq!(tree.tick(), BehaviorStatus::Success);
        assert_eq!(first_ticks.load(Ordering::SeqCst), 1);
        assert_eq!(second_ticks.load(Ordering::SeqCst), 3);

        // Cursor wrapped: the next pass starts from the first child again.
        tree.tick();
        assert_eq!(first_ticks.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn running_first_child_blocks_the_rest_of_the_sequence() {
        let mut b = TreeBuilder::new();
        let (busy, busy_ticks) = scripted(&mut b, "busy", vec![BehaviorStatus::Running]);
        let (next, next_ticks) = scripted(&mut b, "next", vec![BehaviorStatus::Success]);
        let root = b.sequence("seq", &[busy, next]).unwrap();
        let mut tree = b.build(root).unwrap();

        for _ in 0..5 {
            assert_eq!(tree.tick(), BehaviorStatus::Running);
        }
        assert_eq!(busy_ticks.load(Ordering::SeqCst), 5);
        assert_eq!(next_ticks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn selector_succeeds_on_first_success() {
        let mut b = TreeBuilder::new();
        let a = fixed(&mut b, "a", BehaviorStatus::Failure);
        let ok = fixed(&mut b, "b", BehaviorStatus::Success);
        let c = fixed(&mut b, "c", BehaviorStatus::Failure);
        let root = b.selector("sel", &[a, ok, c]).unwrap();
        let mut tree = b.build(root).unwrap();
        assert_eq!(tree.tick(), BehaviorStatus::Success);
        assert_eq!(tree.status_of(c), Some(BehaviorStatus::Invalid));
    }

    #[test]
    fn selector_fails_when_all_children_fail() {
        let mut b = TreeBuilder::new();
        let a = fixed(&mut b, "a", BehaviorStatus::Failure);
        let c = fixed(&mut b, "b", BehaviorStatus::Failure);
        let root = b.selector("sel", &[a, c]).unwrap();
        let mut tree = b.build(root).unwrap();
        assert_eq!(tree.tick(), BehaviorStatus::Failure);
    }

    #[test]
    fn selector_resumes_at_running_child() {
        let mut b = TreeBuilder::new();
        let (a, a_ticks) = scripted(&mut b, "a", vec![BehaviorStatus::Failure]);
        let (run, _) = scripted(
            &mut b,
            "b",
            vec![BehaviorStatus::Running, BehaviorStatus::Success],
        );
        let root = b.selector("sel", &[a, run]).unwrap();
        let mut tree = b.build(root).unwrap();

        assert_eq!(tree.tick(), BehaviorStatus::Running);
        assert_eq!(tree.tick(), BehaviorStatus::Success);
        assert_eq!(a_ticks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_composites_fail() {
        let mut b = TreeBuilder::new();
        let root = b.sequence("empty", &[]).unwrap();
        assert_eq!(b.build(root).unwrap().tick(), BehaviorStatus::Failure);

        let mut b = TreeBuilder::new();
        let root = b.selector("empty", &[]).unwrap();
        assert_eq!(b.build(root).unwrap().tick(), BehaviorStatus::Failure);

        let mut b = TreeBuilder::new();
        let root = b.parallel("empty", &[], None).unwrap();
        assert_eq!(b.build(root).unwrap().tick(), BehaviorStatus::Failure);
    }

    #[test]
    fn parallel_threshold() {
        let mut b = TreeBuilder::new();
        let ok = fixed(&mut b, "ok", BehaviorStatus::Success);
        let run = fixed(&mut b, "run", BehaviorStatus::Running);
        let fail = fixed(&mut b, "fail", BehaviorStatus::Failure);
        let one = b.parallel("one", &[ok, run, fail], Some(1)).unwrap();
        let mut tree = b.build(one).unwrap();
        assert_eq!(tree.tick(), BehaviorStatus::Success);
        // Every child is ticked regardless of the outcome.
        assert_eq!(tree.status_of(fail), Some(BehaviorStatus::Failure));

        let mut b = TreeBuilder::new();
        let ok = fixed(&mut b, "ok", BehaviorStatus::Success);
        let run = fixed(&mut b, "run", BehaviorStatus::Running);
        let all = b.parallel("all", &[ok, run], None).unwrap();
        assert_eq!(b.build(all).unwrap().tick(), BehaviorStatus::Running);

        let mut b = TreeBuilder::new();
        let ok = fixed(&mut b, "ok", BehaviorStatus::Success);
        let fail = fixed(&mut b, "fail", BehaviorStatus::Failure);
        let all = b.parallel("all", &[ok, fail], None).unwrap();
        assert_eq!(b.build(all).unwrap().tick(), BehaviorStatus::Failure);
    }

    #[test]
    fn parallel_threshold_above_child_count_is_rejected() {
        let mut b = TreeBuilder::new();
        let ok = fixed(&mut b, "ok", BehaviorStatus::Success);
        assert_eq!(
            b.parallel("p", &[ok], Some(2)),
            Err(BehaviorTreeError::InvalidThreshold {
                threshold: 2,
                children: 1
            })
        );
    }

    #[test]
    fn nested_sequence_in_selector() {
        let mut b = TreeBuilder::new();
        let a = fixed(&mut b, "a", BehaviorStatus::Success);
        let c = fixed(&mut b, "b", BehaviorStatus::Success);
        let good = b.sequence("good", &[a, c]).unwrap();
        let d = fixed(&mut b, "c", BehaviorStatus::Success);
        let e = fixed(&mut b, "d", BehaviorStatus::Failure);
        let bad = b.sequence("bad", &[d, e]).unwrap();
        let root = b.selector("root", &[bad, good]).unwrap();
        let mut tree = b.build(root).unwrap();
        assert_eq!(tree.tick(), BehaviorStatus::Success);
        assert_eq!(tree.status_of(bad), Some(BehaviorStatus::Failure));
        assert_eq!(tree.node_count(), 7);
    }

    #[test]
    fn builder_rejects_shared_and_unknown_children() {
        let mut b = TreeBuilder::new();
        let leaf = fixed(&mut b, "leaf", BehaviorStatus::Success);
        let first = b.sequence("first", &[leaf]).unwrap();
        assert_eq!(
            b.selector("second", &[leaf]),
            Err(BehaviorTreeError::AlreadyParented {
                child: leaf,
                parent: first
            })
        );
        assert_eq!(
            b.sequence("ghost", &[NodeId(42)]),
            Err(BehaviorTreeError::UnknownNode(NodeId(42)))
        );
    }

    #[test]
    fn builder_rejects_duplicate_child_in_one_list() {
        let mut b = TreeBuilder::new();
        let leaf = fixed(&mut b, "leaf", BehaviorStatus::Success);
        assert!(matches!(
            b.sequence("dup", &[leaf, leaf]),
            Err(BehaviorTreeError::AlreadyParented { .. })
        ));
        // The failed call must not have claimed the leaf.
        assert!(b.sequence("ok", &[leaf]).is_ok());
    }

    #[test]
    fn build_rejects_child_as_root() {
        let mut b = TreeBuilder::new();
        let leaf = fixed(&mut b, "leaf", BehaviorStatus::Success);
        b.sequence("seq", &[leaf]).unwrap();
        assert!(matches!(
            b.build(leaf),
            Err(BehaviorTreeError::RootHasParent(_))
        ));
    }

    #[test]
    fn reset_clears_blackboard_cursors_and_statuses() {
        let mut b = TreeBuilder::new();
        let (first, first_ticks) = scripted(&mut b, "first", vec![BehaviorStatus::Success]);
        let run = fixed(&mut b, "run", BehaviorStatus::Running);
        let root = b.sequence("seq", &[first, run]).unwrap();
        let mut tree = b.build(root).unwrap();

        tree.update(Some(Blackboard::new().with("k", 1)));
        tree.tick();
        assert_eq!(first_ticks.load(Ordering::SeqCst), 1);

        tree.reset();
        assert!(tree.blackboard().is_empty());
        assert_eq!(tree.status_of(root), Some(BehaviorStatus::Invalid));
        assert_eq!(tree.status_of(run), Some(BehaviorStatus::Invalid));

        tree.tick();
        assert_eq!(first_ticks.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn actions_can_write_the_blackboard() {
        let mut b = TreeBuilder::new();
        let count = b.action("count", |bb| {
            let n = bb.get_f64("n").unwrap_or(0.0);
            bb.set("n", n + 1.0);
            BehaviorStatus::Success
        });
        let mut tree = b.build(count).unwrap();
        tree.tick();
        tree.tick();
        assert_eq!(tree.blackboard().get_f64("n"), Some(2.0));
        assert_eq!(tree.name_of(count), Some("count"));
    }
}
