//! Arena-backed search tree.
//!
//! Nodes are stored in a contiguous `Vec` and referenced by [`NodeId`],
//! which keeps parent links cycle-free and backpropagation iterative.

use beluga_core::{Action, ActionKind, ProblemState};

use crate::node::{NodeId, SearchNode};

/// Whether search may choose any action or only parameters of a fixed
/// kind at the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Candidates everywhere come from `get_possible_actions`.
    Free,
    /// A collaborator already fixed the action kind: root candidates come
    /// from `enumerate_valid_params` for that kind. Deeper nodes behave
    /// as in [`SearchMode::Free`].
    Pinned(ActionKind),
}

/// Search tree with arena node storage.
#[derive(Debug)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
    root: NodeId,
    mode: SearchMode,
}

impl SearchTree {
    pub fn new(root_state: ProblemState, mode: SearchMode) -> Self {
        Self {
            nodes: vec![SearchNode::new_root(root_state)],
            root: NodeId(0),
            mode,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut SearchNode {
        &mut self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create a child of `parent` for `action` with the given state and
    /// register it with its parent.
    pub fn add_child(&mut self, parent: NodeId, action: Action, state: ProblemState) -> NodeId {
        let depth = self.get(parent).depth + 1;
        let id = NodeId(self.nodes.len() as u32);
        self.nodes
            .push(SearchNode::new_child(parent, action, state, depth));
        self.get_mut(parent).children.push(id);
        id
    }

    /// The candidate actions of a node under the tree's search mode.
    pub fn candidates(&self, id: NodeId) -> Vec<Action> {
        let node = self.get(id);
        match self.mode {
            SearchMode::Pinned(kind) if id == self.root => {
                node.state.enumerate_valid_params(kind)
            }
            _ => node.state.get_possible_actions(),
        }
    }

    /// Candidates of `id` that no existing child has materialised yet.
    pub fn untried_candidates(&self, id: NodeId) -> Vec<Action> {
        let node = self.get(id);
        let tried: Vec<Action> = node
            .children
            .iter()
            .filter_map(|&child| self.get(child).action)
            .collect();
        self.candidates(id)
            .into_iter()
            .filter(|action| !tried.contains(action))
            .collect()
    }

    pub fn is_fully_expanded(&self, id: NodeId) -> bool {
        self.untried_candidates(id).is_empty()
    }

    /// Child of `id` with the highest UCT score. First-encountered wins
    /// ties; `None` when the node has no children.
    pub fn best_child(&self, id: NodeId, exploration: f32) -> Option<NodeId> {
        let node = self.get(id);
        let mut best: Option<(f32, NodeId)> = None;
        for &child in &node.children {
            let score = self.get(child).uct_score(node.visits, exploration);
            let improves = match best {
                Some((best_score, _)) => score > best_score,
                None => true,
            };
            if improves {
                best = Some((score, child));
            }
        }
        best.map(|(_, id)| id)
    }

    /// Add a reward along the path from `leaf` up to and including the
    /// root.
    pub fn backpropagate(&mut self, leaf: NodeId, reward: f32) {
        let mut current = leaf;
        while current.is_some() {
            let node = self.get_mut(current);
            node.visits += 1;
            node.total_reward += reward;
            current = node.parent;
        }
    }

    /// Per-child statistics at the root, in expansion order: the material
    /// the root-parallel coordinator merges across workers.
    pub fn root_stats(&self) -> Vec<RootStat> {
        self.get(self.root)
            .children
            .iter()
            .filter_map(|&child| {
                let node = self.get(child);
                node.action.map(|action| RootStat {
                    action,
                    visits: node.visits,
                    total_reward: node.total_reward,
                })
            })
            .collect()
    }
}

/// Visit/reward totals of one root child.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootStat {
    pub action: Action,
    pub visits: u32,
    pub total_reward: f32,
}

impl RootStat {
    pub fn mean_reward(&self) -> f32 {
        if self.visits == 0 {
            0.0
        } else {
            self.total_reward / self.visits as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beluga_core::load_from_str;

    fn fixture() -> ProblemState {
        load_from_str(
            r#"{
                "trailers_beluga": [{"name": "bt1"}, {"name": "bt2"}],
                "trailers_factory": [{"name": "ft1"}],
                "hangars": ["h1"],
                "jig_types": {"typeA": {"size_empty": 4, "size_loaded": 4}},
                "jigs": {
                    "jig0001": {"type": "typeA", "empty": false},
                    "jig0002": {"type": "typeA", "empty": false}
                },
                "flights": [{"incoming": ["jig0001", "jig0002"], "outgoing": ["typeA"]}],
                "racks": [{"size": 12, "jigs": []}],
                "production_lines": [{"schedule": ["jig0001"]}]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_add_child_links_parent_and_depth() {
        let state = fixture();
        let mut tree = SearchTree::new(state.clone(), SearchMode::Free);

        let mut next = state.clone();
        assert!(next.apply_action(beluga_core::Action::UnloadBeluga));
        let child = tree.add_child(tree.root(), beluga_core::Action::UnloadBeluga, next);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get(child).parent, tree.root());
        assert_eq!(tree.get(child).depth, 1);
        assert_eq!(tree.get(tree.root()).children, vec![child]);
    }

    #[test]
    fn test_untried_shrinks_as_children_materialise() {
        let state = fixture();
        let mut tree = SearchTree::new(state, SearchMode::Free);

        let initial = tree.untried_candidates(tree.root());
        assert!(!initial.is_empty());
        assert!(!tree.is_fully_expanded(tree.root()));

        for action in initial {
            let mut next = tree.get(tree.root()).state.clone();
            assert!(next.apply_action(action));
            tree.add_child(tree.root(), action, next);
        }
        assert!(tree.is_fully_expanded(tree.root()));
    }

    #[test]
    fn test_pinned_mode_restricts_root_candidates() {
        let state = fixture();
        let tree = SearchTree::new(state, SearchMode::Pinned(ActionKind::UnloadBeluga));
        assert_eq!(
            tree.candidates(tree.root()),
            vec![beluga_core::Action::UnloadBeluga]
        );
    }

    #[test]
    fn test_backpropagate_walks_to_root() {
        let state = fixture();
        let mut tree = SearchTree::new(state.clone(), SearchMode::Free);

        let mut next = state.clone();
        assert!(next.apply_action(beluga_core::Action::UnloadBeluga));
        let child = tree.add_child(tree.root(), beluga_core::Action::UnloadBeluga, next.clone());
        assert!(next.apply_action(beluga_core::Action::UnloadBeluga));
        let grandchild = tree.add_child(child, beluga_core::Action::UnloadBeluga, next);

        tree.backpropagate(grandchild, 3.0);
        for id in [grandchild, child, tree.root()] {
            assert_eq!(tree.get(id).visits, 1);
            assert!((tree.get(id).total_reward - 3.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_best_child_prefers_unvisited_then_mean() {
        let state = fixture();
        let mut tree = SearchTree::new(state.clone(), SearchMode::Free);

        let mut a = state.clone();
        assert!(a.apply_action(beluga_core::Action::UnloadBeluga));
        let first = tree.add_child(tree.root(), beluga_core::Action::UnloadBeluga, a);
        let second = tree.add_child(
            tree.root(),
            beluga_core::Action::LeftUnstackRack { rack: 0, trailer: 0 },
            state,
        );

        tree.backpropagate(first, 5.0);
        // `second` is unvisited and must be selected next.
        assert_eq!(tree.best_child(tree.root(), 1.0), Some(second));

        tree.backpropagate(second, 1.0);
        // Both visited once: higher mean wins at weight 0.
        assert_eq!(tree.best_child(tree.root(), 0.0), Some(first));
    }

    #[test]
    fn test_root_stats_reflect_children() {
        let state = fixture();
        let mut tree = SearchTree::new(state.clone(), SearchMode::Free);
        let mut next = state;
        assert!(next.apply_action(beluga_core::Action::UnloadBeluga));
        let child = tree.add_child(tree.root(), beluga_core::Action::UnloadBeluga, next);
        tree.backpropagate(child, 2.0);
        tree.backpropagate(child, 4.0);

        let stats = tree.root_stats();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].action, beluga_core::Action::UnloadBeluga);
        assert_eq!(stats[0].visits, 2);
        assert!((stats[0].mean_reward() - 3.0).abs() < 1e-6);
    }
}
