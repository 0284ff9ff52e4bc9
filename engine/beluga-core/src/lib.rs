//! Planning-domain core for the Beluga logistics puzzle.
//!
//! Jigs (manufacturing fixtures) move between incoming/outgoing carriers
//! ("belugas"), capacity-bounded storage racks, hangars, and production
//! lines until every carrier and production line has been fully processed.
//! This crate provides:
//!
//! - [`ProblemState`]: the complete puzzle state, cheap to clone via
//!   structurally shared containers
//! - [`Action`]: the eight legal operations, applied with
//!   precondition-then-effect semantics
//! - Enumeration of currently legal actions for search algorithms
//! - [`loader::load`]: problem-file parsing
//!
//! The companion `beluga-mcts` crate runs Monte Carlo Tree Search over
//! this state machine.
//!
//! # Conventions
//!
//! Jig ids are 0-based everywhere inside this crate. Problem files name
//! jigs `jigNNNN` with a 1-based sequence; the loader converts exactly
//! once at the boundary. A beluga is retired automatically by the action
//! that drains it; there is no separate completion operation.

pub mod action;
pub mod enumerate;
pub mod jig;
pub mod loader;
pub mod state;

pub use action::{Action, ActionKind};
pub use jig::{Jig, JigId, JigType, TypeId};
pub use loader::{load, load_from_str, LoadError};
pub use state::{Beluga, EvalWeights, ProblemState, ProductionLine, Rack, Subgoals};
