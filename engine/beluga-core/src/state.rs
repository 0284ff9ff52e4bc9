//! Problem state: entities, invariants, and evaluation.
//!
//! [`ProblemState`] aggregates every container a jig can reside in. Search
//! clones states at every tree node, so each collection is held behind an
//! `Arc`: `clone()` only bumps reference counts, and mutation goes through
//! `Arc::make_mut`, which copies a container the first time a clone writes
//! to it. A child state therefore costs roughly the size of the containers
//! its action touched, not the size of the whole state.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::jig::{Jig, JigId, JigType, TypeId};

/// A carrier aircraft. Incoming jigs are unloaded from the tail of the
/// manifest (LIFO); outgoing jig types are served from the head (FIFO).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beluga {
    pub incoming: Vec<JigId>,
    pub outgoing: Vec<TypeId>,
}

impl Beluga {
    pub fn new(incoming: Vec<JigId>, outgoing: Vec<TypeId>) -> Self {
        Self { incoming, outgoing }
    }

    /// A beluga may leave the active list only once both lists are drained.
    pub fn is_processed(&self) -> bool {
        self.incoming.is_empty() && self.outgoing.is_empty()
    }
}

/// Capacity-bounded storage accessed from both ends: the front faces the
/// beluga side, the back faces the factory side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rack {
    pub capacity: u32,
    pub jigs: VecDeque<JigId>,
}

impl Rack {
    pub fn new(capacity: u32, jigs: impl Into<VecDeque<JigId>>) -> Self {
        Self {
            capacity,
            jigs: jigs.into(),
        }
    }
}

/// An ordered consumption queue of jigs, served from the head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionLine {
    pub schedule: Vec<JigId>,
}

impl ProductionLine {
    pub fn new(schedule: Vec<JigId>) -> Self {
        Self { schedule }
    }
}

/// Weights for [`ProblemState::evaluate`]. Defaults mirror the reward
/// shaping the planner was tuned with.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalWeights {
    /// Per beluga whose manifest has been fully unloaded.
    pub beluga_unloaded: f32,
    /// Per beluga fully processed and retired.
    pub beluga_finished: f32,
    /// Per production line fully served.
    pub line_finished: f32,
    /// Added once when the whole problem is solved.
    pub solved_bonus: f32,
    /// Subtracted per step of plan depth, to prefer shorter plans.
    pub depth_penalty: f32,
}

impl Default for EvalWeights {
    fn default() -> Self {
        Self {
            beluga_unloaded: 15.0,
            beluga_finished: 60.0,
            line_finished: 100.0,
            solved_bonus: 1000.0,
            depth_penalty: 0.05,
        }
    }
}

/// Subgoal progress, derived from the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subgoals {
    pub belugas_unloaded: u32,
    pub belugas_finished: u32,
    pub lines_finished: u32,
    pub solved: bool,
}

/// Complete state of one Beluga puzzle instance.
///
/// Constructed once by the loader (or directly in tests), then mutated
/// only through [`ProblemState::apply_action`] or cloned wholesale for
/// search. Slot arrays keep the length fixed at construction; `None`
/// marks a free slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemState {
    jig_types: Arc<Vec<JigType>>,
    jigs: Arc<Vec<Jig>>,
    belugas: Arc<Vec<Beluga>>,
    trailers_beluga: Arc<Vec<Option<JigId>>>,
    trailers_factory: Arc<Vec<Option<JigId>>>,
    racks: Arc<Vec<Rack>>,
    production_lines: Arc<Vec<ProductionLine>>,
    hangars: Arc<Vec<Option<JigId>>>,

    /// Belugas whose manifest has been fully unloaded so far. Bumped by
    /// `unload_beluga` at the moment a manifest drains.
    belugas_unloaded: u32,
    /// Counts fixed at construction; finished totals are derived from them.
    total_belugas: usize,
    total_lines: usize,
}

impl ProblemState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        jig_types: Vec<JigType>,
        jigs: Vec<Jig>,
        belugas: Vec<Beluga>,
        trailers_beluga: Vec<Option<JigId>>,
        trailers_factory: Vec<Option<JigId>>,
        racks: Vec<Rack>,
        production_lines: Vec<ProductionLine>,
        hangars: Vec<Option<JigId>>,
    ) -> Self {
        let total_belugas = belugas.len();
        let total_lines = production_lines.len();
        Self {
            jig_types: Arc::new(jig_types),
            jigs: Arc::new(jigs),
            belugas: Arc::new(belugas),
            trailers_beluga: Arc::new(trailers_beluga),
            trailers_factory: Arc::new(trailers_factory),
            racks: Arc::new(racks),
            production_lines: Arc::new(production_lines),
            hangars: Arc::new(hangars),
            belugas_unloaded: 0,
            total_belugas,
            total_lines,
        }
    }

    // Read access -----------------------------------------------------------

    pub fn jig_types(&self) -> &[JigType] {
        &self.jig_types
    }

    pub fn jigs(&self) -> &[Jig] {
        &self.jigs
    }

    pub fn belugas(&self) -> &[Beluga] {
        &self.belugas
    }

    pub fn trailers_beluga(&self) -> &[Option<JigId>] {
        &self.trailers_beluga
    }

    pub fn trailers_factory(&self) -> &[Option<JigId>] {
        &self.trailers_factory
    }

    pub fn racks(&self) -> &[Rack] {
        &self.racks
    }

    pub fn production_lines(&self) -> &[ProductionLine] {
        &self.production_lines
    }

    pub fn hangars(&self) -> &[Option<JigId>] {
        &self.hangars
    }

    pub fn jig(&self, id: JigId) -> &Jig {
        &self.jigs[id.0]
    }

    pub fn jig_type(&self, id: TypeId) -> &JigType {
        &self.jig_types[id.0]
    }

    /// Current size of a jig, per its empty/loaded flag.
    pub fn jig_size(&self, id: JigId) -> u32 {
        let jig = self.jig(id);
        let ty = self.jig_type(jig.jig_type);
        if jig.empty {
            ty.size_empty
        } else {
            ty.size_loaded
        }
    }

    /// Remaining capacity of a rack given the current sizes of its residents.
    pub fn rack_free_space(&self, rack: usize) -> u32 {
        let rack = &self.racks[rack];
        let used: u32 = rack.jigs.iter().map(|&id| self.jig_size(id)).sum();
        rack.capacity.saturating_sub(used)
    }

    // Mutation (crate-internal; all public mutation goes through actions) ----

    pub(crate) fn jigs_mut(&mut self) -> &mut Vec<Jig> {
        Arc::make_mut(&mut self.jigs)
    }

    pub(crate) fn belugas_mut(&mut self) -> &mut Vec<Beluga> {
        Arc::make_mut(&mut self.belugas)
    }

    pub(crate) fn trailers_beluga_mut(&mut self) -> &mut Vec<Option<JigId>> {
        Arc::make_mut(&mut self.trailers_beluga)
    }

    pub(crate) fn trailers_factory_mut(&mut self) -> &mut Vec<Option<JigId>> {
        Arc::make_mut(&mut self.trailers_factory)
    }

    pub(crate) fn racks_mut(&mut self) -> &mut Vec<Rack> {
        Arc::make_mut(&mut self.racks)
    }

    pub(crate) fn production_lines_mut(&mut self) -> &mut Vec<ProductionLine> {
        Arc::make_mut(&mut self.production_lines)
    }

    pub(crate) fn hangars_mut(&mut self) -> &mut Vec<Option<JigId>> {
        Arc::make_mut(&mut self.hangars)
    }

    pub(crate) fn bump_belugas_unloaded(&mut self) {
        self.belugas_unloaded += 1;
    }

    /// Retire the serviced beluga once both of its lists are drained.
    /// Called by `load_beluga` and `unload_beluga`; never exposed.
    pub(crate) fn retire_front_beluga_if_processed(&mut self) {
        if self.belugas.first().is_some_and(|b| b.is_processed()) {
            self.belugas_mut().remove(0);
        }
    }

    // Search API -------------------------------------------------------------

    /// The puzzle is solved when every beluga and every production line has
    /// been fully processed.
    pub fn is_terminal(&self) -> bool {
        self.belugas.is_empty() && self.production_lines.is_empty()
    }

    pub fn subgoals(&self) -> Subgoals {
        Subgoals {
            belugas_unloaded: self.belugas_unloaded,
            belugas_finished: (self.total_belugas - self.belugas.len()) as u32,
            lines_finished: (self.total_lines - self.production_lines.len()) as u32,
            solved: self.is_terminal(),
        }
    }

    /// Score a state for search: weighted subgoal progress minus a depth
    /// penalty, plus a large bonus when the whole problem is solved.
    pub fn evaluate(&self, depth: u32, weights: &EvalWeights) -> f32 {
        let goals = self.subgoals();
        let mut score = goals.belugas_unloaded as f32 * weights.beluga_unloaded
            + goals.belugas_finished as f32 * weights.beluga_finished
            + goals.lines_finished as f32 * weights.line_finished;
        if goals.solved {
            score += weights.solved_bonus;
        }
        score - weights.depth_penalty * depth as f32
    }
}
