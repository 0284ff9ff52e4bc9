//! Monte Carlo Tree Search for the Beluga planning domain.
//!
//! The engine searches the action space of a `beluga_core::ProblemState`
//! for good action sequences. Each simulation runs four phases:
//!
//! 1. **Selection**: descend from the root along UCT-best children
//! 2. **Expansion**: materialise one untried candidate action
//! 3. **Rollout**: play random legal actions on a scratch copy
//! 4. **Backpropagation**: update visit counts and reward sums on the path
//!
//! Discovering a solved state during expansion ends the search early.
//!
//! # Usage
//!
//! ```rust,ignore
//! use beluga_core::load;
//! use beluga_mcts::{run_search, SearchConfig};
//!
//! let state = load("problems/instance.json")?;
//! let config = SearchConfig::default().with_simulations(500);
//! if let Some(best) = run_search(state, config) {
//!     println!("{} (value {:.1})", best.action, best.value);
//! }
//! ```
//!
//! A caller that has already fixed the action kind (for example from a
//! learned policy) uses [`Mcts::pinned`] so only that kind's parameter
//! bindings compete at the root. [`search_root_parallel`] runs several
//! independent engines and merges their root statistics.

pub mod config;
pub mod node;
pub mod parallel;
pub mod search;
pub mod tree;

pub use config::SearchConfig;
pub use node::{NodeId, SearchNode};
pub use parallel::search_root_parallel;
pub use search::{run_search, Best, Mcts};
pub use tree::{RootStat, SearchMode, SearchTree};
