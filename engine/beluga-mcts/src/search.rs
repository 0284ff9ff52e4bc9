//! The select / expand / rollout / backpropagate loop.
//!
//! One search call runs a fixed simulation budget over a [`SearchTree`]
//! and returns the best root action by mean reward. Discovering a
//! terminal (solved) state during expansion ends the search early: a
//! solved state dominates anything further simulation could learn.

use beluga_core::{Action, ActionKind, ProblemState};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::{debug, trace};

use crate::config::SearchConfig;
use crate::node::NodeId;
use crate::tree::{SearchMode, SearchTree};

/// The recommendation produced by a search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Best {
    pub action: Action,
    /// Mean reward of the chosen root child, the search's value estimate.
    pub value: f32,
    pub visits: u32,
}

/// Monte Carlo Tree Search over one root state.
pub struct Mcts {
    tree: SearchTree,
    config: SearchConfig,
    rng: ChaCha20Rng,
}

impl Mcts {
    /// Unconstrained search: all eight action kinds compete at the root.
    pub fn new(root: ProblemState, config: SearchConfig) -> Self {
        Self::with_mode(root, SearchMode::Free, config)
    }

    /// Parameter-only search: a collaborator fixed the action kind and
    /// only its parameter bindings compete at the root.
    pub fn pinned(root: ProblemState, kind: ActionKind, config: SearchConfig) -> Self {
        Self::with_mode(root, SearchMode::Pinned(kind), config)
    }

    pub fn with_mode(root: ProblemState, mode: SearchMode, config: SearchConfig) -> Self {
        let rng = ChaCha20Rng::seed_from_u64(config.seed);
        Self {
            tree: SearchTree::new(root, mode),
            config,
            rng,
        }
    }

    /// Run the configured simulation budget and return the best root
    /// action, or `None` when the root has no legal candidates.
    pub fn search(&mut self) -> Option<Best> {
        for sim in 0..self.config.num_simulations {
            let node = self.select();

            let at_depth_cap = self.tree.get(node).depth >= self.config.max_depth;
            let node = if self.tree.get(node).is_terminal() || at_depth_cap {
                node
            } else {
                let untried = self.tree.untried_candidates(node);
                if untried.is_empty() {
                    // Dead end: nothing to expand here and either no
                    // children exist or the depth cap is reached.
                    if self.tree.get(node).children.is_empty()
                        || self.tree.get(node).depth + 1 >= self.config.max_depth
                    {
                        debug!(sim, "no further expansion possible, stopping early");
                        break;
                    }
                    node
                } else {
                    let action = untried[self.rng.gen_range(0..untried.len())];
                    let mut state = self.tree.get(node).state.clone();
                    if !state.apply_action(action) {
                        debug!(%action, "enumerated candidate failed to apply");
                        continue;
                    }
                    let child = self.tree.add_child(node, action, state);
                    trace!(sim, %action, "expanded");

                    if self.tree.get(child).is_terminal() {
                        let depth = self.tree.get(child).depth;
                        let reward = self.tree.get(child).state.evaluate(depth, &self.config.eval);
                        self.tree.backpropagate(child, reward);
                        debug!(sim, reward, "terminal state found, ending search");
                        break;
                    }
                    child
                }
            };

            let reward = self.rollout(node);
            trace!(sim, reward, "rollout complete");
            self.tree.backpropagate(node, reward);
        }

        self.best()
    }

    /// Descend from the root along best-UCT children while nodes are
    /// non-terminal, fully expanded, and below the depth cap.
    fn select(&self) -> NodeId {
        let mut node = self.tree.root();
        while !self.tree.get(node).is_terminal()
            && self.tree.get(node).depth < self.config.max_depth
            && self.tree.is_fully_expanded(node)
        {
            match self.tree.best_child(node, self.config.exploration) {
                Some(child) => node = child,
                None => break,
            }
        }
        node
    }

    /// Play uniformly random legal actions on a scratch copy until the
    /// state is terminal, dead, or the depth cap is hit; score the result.
    fn rollout(&mut self, node: NodeId) -> f32 {
        let mut state = self.tree.get(node).state.clone();
        let mut depth = self.tree.get(node).depth;

        while !state.is_terminal() && depth < self.config.max_depth {
            let actions = state.get_possible_actions();
            if actions.is_empty() {
                break;
            }
            let action = actions[self.rng.gen_range(0..actions.len())];
            state.apply_action(action);
            depth += 1;
        }

        state.evaluate(depth, &self.config.eval)
    }

    /// Root child with the highest mean reward (exploration weight 0),
    /// ties broken by expansion order.
    fn best(&self) -> Option<Best> {
        let best = self.tree.best_child(self.tree.root(), 0.0)?;
        let node = self.tree.get(best);
        Some(Best {
            action: node.action?,
            value: node.mean_reward(),
            visits: node.visits,
        })
    }

    /// Per-action visit/reward totals at the root, for merging.
    pub fn root_stats(&self) -> Vec<crate::tree::RootStat> {
        self.tree.root_stats()
    }

    /// The underlying tree, for inspection in tests and benchmarks.
    pub fn tree(&self) -> &SearchTree {
        &self.tree
    }
}

/// Convenience wrapper: build an engine, run one search.
pub fn run_search(root: ProblemState, config: SearchConfig) -> Option<Best> {
    Mcts::new(root, config).search()
}

#[cfg(test)]
mod tests {
    use super::*;
    use beluga_core::{load_from_str, Action};

    fn solvable_fixture() -> ProblemState {
        load_from_str(
            r#"{
                "trailers_beluga": [{"name": "bt1"}, {"name": "bt2"}],
                "trailers_factory": [{"name": "ft1"}],
                "hangars": ["h1"],
                "jig_types": {"typeA": {"size_empty": 4, "size_loaded": 4}},
                "jigs": {
                    "jig0001": {"type": "typeA", "empty": false},
                    "jig0002": {"type": "typeA", "empty": true}
                },
                "flights": [{"incoming": ["jig0001"], "outgoing": ["typeA"]}],
                "racks": [{"size": 12, "jigs": ["jig0002"]}],
                "production_lines": [{"schedule": ["jig0001"]}]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_search_returns_legal_root_action() {
        let root = solvable_fixture();
        let legal = root.get_possible_actions();

        let best = run_search(root, SearchConfig::for_testing()).expect("root has actions");
        assert!(legal.contains(&best.action), "{} not legal", best.action);
        assert!(best.visits > 0);
    }

    #[test]
    fn test_search_is_reproducible_for_equal_seeds() {
        let root = solvable_fixture();
        let config = SearchConfig::for_testing().with_seed(1234);
        let a = run_search(root.clone(), config.clone()).unwrap();
        let b = run_search(root, config).unwrap();
        assert_eq!(a.action, b.action);
        assert_eq!(a.visits, b.visits);
        assert!((a.value - b.value).abs() < 1e-6);
    }

    #[test]
    fn test_search_on_dead_root_returns_none() {
        // No belugas, no lines, nothing movable: terminal root.
        let root = load_from_str(
            r#"{
                "trailers_beluga": [{}],
                "trailers_factory": [{}],
                "hangars": [],
                "jigs": {},
                "flights": [],
                "racks": [],
                "production_lines": []
            }"#,
        )
        .unwrap();
        assert!(run_search(root, SearchConfig::for_testing()).is_none());
    }

    #[test]
    fn test_pinned_search_only_returns_pinned_kind() {
        let root = solvable_fixture();
        let config = SearchConfig::for_testing();

        let mut engine = Mcts::pinned(root.clone(), ActionKind::UnloadBeluga, config.clone());
        let best = engine.search().expect("unload is legal here");
        assert_eq!(best.action, Action::UnloadBeluga);

        let mut engine = Mcts::pinned(root.clone(), ActionKind::LeftUnstackRack, config);
        let best = engine.search().expect("left unstack is legal here");
        assert_eq!(best.action.kind(), ActionKind::LeftUnstackRack);
        assert!(root
            .enumerate_valid_params(ActionKind::LeftUnstackRack)
            .contains(&best.action));
    }

    #[test]
    fn test_pinned_search_with_illegal_kind_returns_none() {
        let root = solvable_fixture();
        // Nothing is in a hangar yet.
        let best = Mcts::pinned(
            root,
            ActionKind::GetFromHangar,
            SearchConfig::for_testing(),
        )
        .search();
        assert!(best.is_none());
    }

    #[test]
    fn test_search_solves_single_step_problem() {
        // One empty typeA jig on a trailer, one beluga wanting typeA:
        // load_beluga(0) solves the puzzle in one action.
        let root = load_from_str(
            r#"{
                "trailers_beluga": [{"name": "bt1"}],
                "trailers_factory": [{"name": "ft1"}],
                "hangars": ["h1"],
                "jig_types": {"typeA": {"size_empty": 4, "size_loaded": 4}},
                "jigs": {"jig0001": {"type": "typeA", "empty": true}},
                "flights": [{"incoming": ["jig0001"], "outgoing": ["typeA"]}],
                "racks": [{"size": 12, "jigs": []}],
                "production_lines": []
            }"#,
        )
        .unwrap();
        // Get the jig out of the beluga first, then the solver should
        // discover the terminal load.
        let mut root = root;
        assert!(root.apply_action(Action::UnloadBeluga));

        let best = run_search(root, SearchConfig::for_testing().with_simulations(200))
            .expect("actions exist");
        assert_eq!(best.action, Action::LoadBeluga { trailer: 0 });
        // The chosen child saw the terminal bonus.
        assert!(best.value > 500.0);
    }

    #[test]
    fn test_depth_cap_bounds_the_tree() {
        let root = solvable_fixture();
        let mut engine = Mcts::new(
            root,
            SearchConfig::default()
                .with_max_depth(2)
                .with_simulations(500),
        );
        engine.search();
        let tree = engine.tree();
        for i in 0..tree.len() {
            assert!(tree.get(crate::node::NodeId(i as u32)).depth <= 2);
        }
    }
}
