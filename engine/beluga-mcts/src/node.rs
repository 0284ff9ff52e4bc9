//! Search-tree node representation.
//!
//! Nodes live in an arena (`Vec`) and reference each other by index, so
//! the parent link needed for backpropagation never forms an ownership
//! cycle. Each node snapshots the problem state it represents; snapshots
//! are cheap because `ProblemState` shares structure between clones.

use beluga_core::{Action, ProblemState};

/// Index into the node arena. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }
}

/// A node in the search tree.
#[derive(Debug, Clone)]
pub struct SearchNode {
    /// Parent node index (NONE for the root). Used only by
    /// backpropagation, never for mutation.
    pub parent: NodeId,

    /// The action that produced this node from its parent (None at root).
    pub action: Option<Action>,

    /// Problem state after `action` was applied.
    pub state: ProblemState,

    /// Plan depth of this node (root = 0).
    pub depth: u32,

    /// Child node indices, in expansion order.
    pub children: Vec<NodeId>,

    /// Number of times this node has been visited by backpropagation.
    pub visits: u32,

    /// Sum of rewards backpropagated through this node.
    pub total_reward: f32,
}

impl SearchNode {
    pub fn new_root(state: ProblemState) -> Self {
        Self {
            parent: NodeId::NONE,
            action: None,
            state,
            depth: 0,
            children: Vec::new(),
            visits: 0,
            total_reward: 0.0,
        }
    }

    pub fn new_child(parent: NodeId, action: Action, state: ProblemState, depth: u32) -> Self {
        Self {
            parent,
            action: Some(action),
            state,
            depth,
            children: Vec::new(),
            visits: 0,
            total_reward: 0.0,
        }
    }

    /// Mean reward over all visits; 0.0 if never visited.
    #[inline]
    pub fn mean_reward(&self) -> f32 {
        if self.visits == 0 {
            0.0
        } else {
            self.total_reward / self.visits as f32
        }
    }

    /// UCT score for selection:
    /// `mean + w * sqrt(ln(parent_visits) / visits)`.
    ///
    /// Unvisited nodes score infinity so every child is tried once before
    /// any child is revisited.
    #[inline]
    pub fn uct_score(&self, parent_visits: u32, exploration: f32) -> f32 {
        if self.visits == 0 {
            return f32::INFINITY;
        }
        let explore = ((parent_visits.max(1) as f32).ln() / self.visits as f32).sqrt();
        self.mean_reward() + exploration * explore
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
