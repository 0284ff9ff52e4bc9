//! The eight operations of the planning domain.
//!
//! Every applier checks all of its preconditions before the first write,
//! returns `true` on success and `false` otherwise, and never leaves a
//! state partially modified. That guarantee is what lets the enumerator
//! trial-apply candidates on a clone without any cleanup.

use std::fmt;

use crate::jig::JigId;
use crate::state::ProblemState;

/// One concrete operation with its parameters bound.
///
/// `trailer` indexes the beluga-side trailer slots for `LoadBeluga` and
/// the `Left*` rack actions, and the factory-side slots everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    LoadBeluga { trailer: usize },
    UnloadBeluga,
    GetFromHangar { hangar: usize, trailer: usize },
    DeliverToHangar { hangar: usize, trailer: usize },
    LeftStackRack { rack: usize, trailer: usize },
    RightStackRack { rack: usize, trailer: usize },
    LeftUnstackRack { rack: usize, trailer: usize },
    RightUnstackRack { rack: usize, trailer: usize },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::LoadBeluga { .. } => ActionKind::LoadBeluga,
            Action::UnloadBeluga => ActionKind::UnloadBeluga,
            Action::GetFromHangar { .. } => ActionKind::GetFromHangar,
            Action::DeliverToHangar { .. } => ActionKind::DeliverToHangar,
            Action::LeftStackRack { .. } => ActionKind::LeftStackRack,
            Action::RightStackRack { .. } => ActionKind::RightStackRack,
            Action::LeftUnstackRack { .. } => ActionKind::LeftUnstackRack,
            Action::RightUnstackRack { .. } => ActionKind::RightUnstackRack,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::LoadBeluga { trailer } => write!(f, "load_beluga(trailer={trailer})"),
            Action::UnloadBeluga => write!(f, "unload_beluga"),
            Action::GetFromHangar { hangar, trailer } => {
                write!(f, "get_from_hangar(hangar={hangar}, trailer={trailer})")
            }
            Action::DeliverToHangar { hangar, trailer } => {
                write!(f, "deliver_to_hangar(hangar={hangar}, trailer={trailer})")
            }
            Action::LeftStackRack { rack, trailer } => {
                write!(f, "left_stack_rack(rack={rack}, trailer={trailer})")
            }
            Action::RightStackRack { rack, trailer } => {
                write!(f, "right_stack_rack(rack={rack}, trailer={trailer})")
            }
            Action::LeftUnstackRack { rack, trailer } => {
                write!(f, "left_unstack_rack(rack={rack}, trailer={trailer})")
            }
            Action::RightUnstackRack { rack, trailer } => {
                write!(f, "right_unstack_rack(rack={rack}, trailer={trailer})")
            }
        }
    }
}

/// Action discriminant, used when a caller fixes the operation but leaves
/// the parameters to search (see `enumerate_valid_params`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    LoadBeluga,
    UnloadBeluga,
    GetFromHangar,
    DeliverToHangar,
    LeftStackRack,
    RightStackRack,
    LeftUnstackRack,
    RightUnstackRack,
}

impl ActionKind {
    /// Enumeration order used by `get_possible_actions`.
    pub const ALL: [ActionKind; 8] = [
        ActionKind::UnloadBeluga,
        ActionKind::LeftStackRack,
        ActionKind::RightStackRack,
        ActionKind::LeftUnstackRack,
        ActionKind::RightUnstackRack,
        ActionKind::LoadBeluga,
        ActionKind::GetFromHangar,
        ActionKind::DeliverToHangar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::LoadBeluga => "load_beluga",
            ActionKind::UnloadBeluga => "unload_beluga",
            ActionKind::GetFromHangar => "get_from_hangar",
            ActionKind::DeliverToHangar => "deliver_to_hangar",
            ActionKind::LeftStackRack => "left_stack_rack",
            ActionKind::RightStackRack => "right_stack_rack",
            ActionKind::LeftUnstackRack => "left_unstack_rack",
            ActionKind::RightUnstackRack => "right_unstack_rack",
        }
    }

    /// Parse a collaborator-supplied kind name. Returns `None` for "none"
    /// and for anything unrecognised.
    pub fn from_name(name: &str) -> Option<ActionKind> {
        match name {
            "load_beluga" => Some(ActionKind::LoadBeluga),
            "unload_beluga" => Some(ActionKind::UnloadBeluga),
            "get_from_hangar" => Some(ActionKind::GetFromHangar),
            "deliver_to_hangar" => Some(ActionKind::DeliverToHangar),
            "left_stack_rack" => Some(ActionKind::LeftStackRack),
            "right_stack_rack" => Some(ActionKind::RightStackRack),
            "left_unstack_rack" => Some(ActionKind::LeftUnstackRack),
            "right_unstack_rack" => Some(ActionKind::RightUnstackRack),
            _ => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProblemState {
    /// Apply one action. Returns `false` (state untouched) when any
    /// precondition fails.
    pub fn apply_action(&mut self, action: Action) -> bool {
        match action {
            Action::LoadBeluga { trailer } => load_beluga(self, trailer),
            Action::UnloadBeluga => unload_beluga(self),
            Action::GetFromHangar { hangar, trailer } => get_from_hangar(self, hangar, trailer),
            Action::DeliverToHangar { hangar, trailer } => deliver_to_hangar(self, hangar, trailer),
            Action::LeftStackRack { rack, trailer } => left_stack_rack(self, rack, trailer),
            Action::RightStackRack { rack, trailer } => right_stack_rack(self, rack, trailer),
            Action::LeftUnstackRack { rack, trailer } => left_unstack_rack(self, rack, trailer),
            Action::RightUnstackRack { rack, trailer } => right_unstack_rack(self, rack, trailer),
        }
    }
}

/// Load the jig in the given beluga-side trailer slot onto the serviced
/// beluga. The jig must be empty and match the head of the outgoing list.
fn load_beluga(state: &mut ProblemState, trailer: usize) -> bool {
    let Some(&Some(jig_id)) = state.trailers_beluga().get(trailer) else {
        return false;
    };
    let Some(beluga) = state.belugas().first() else {
        return false;
    };
    let Some(&wanted) = beluga.outgoing.first() else {
        return false;
    };
    let jig = state.jig(jig_id);
    if !jig.empty || jig.jig_type != wanted {
        return false;
    }

    state.belugas_mut()[0].outgoing.remove(0);
    state.trailers_beluga_mut()[trailer] = None;
    state.retire_front_beluga_if_processed();
    true
}

/// Unload the tail of the serviced beluga's manifest into the first free
/// beluga-side trailer slot.
fn unload_beluga(state: &mut ProblemState) -> bool {
    let Some(slot) = state.trailers_beluga().iter().position(Option::is_none) else {
        return false;
    };
    let Some(beluga) = state.belugas().first() else {
        return false;
    };
    if beluga.incoming.is_empty() {
        return false;
    }

    let beluga = &mut state.belugas_mut()[0];
    let Some(jig_id) = beluga.incoming.pop() else {
        return false;
    };
    let drained = beluga.incoming.is_empty();
    state.trailers_beluga_mut()[slot] = Some(jig_id);
    if drained {
        state.bump_belugas_unloaded();
        state.retire_front_beluga_if_processed();
    }
    true
}

/// Move an empty jig from a hangar into a free factory-side trailer slot.
fn get_from_hangar(state: &mut ProblemState, hangar: usize, trailer: usize) -> bool {
    let Some(&Some(jig_id)) = state.hangars().get(hangar) else {
        return false;
    };
    let Some(&None) = state.trailers_factory().get(trailer) else {
        return false;
    };
    if !state.jig(jig_id).empty {
        return false;
    }

    state.trailers_factory_mut()[trailer] = Some(jig_id);
    state.hangars_mut()[hangar] = None;
    true
}

/// Deliver a loaded jig from a factory-side trailer slot into a free
/// hangar. The jig must head some production line's schedule; delivery
/// consumes that schedule entry and empties the jig.
fn deliver_to_hangar(state: &mut ProblemState, hangar: usize, trailer: usize) -> bool {
    let Some(&None) = state.hangars().get(hangar) else {
        return false;
    };
    let Some(&Some(jig_id)) = state.trailers_factory().get(trailer) else {
        return false;
    };
    if state.jig(jig_id).empty {
        return false;
    }
    let Some(line) = state
        .production_lines()
        .iter()
        .position(|pl| pl.schedule.first() == Some(&jig_id))
    else {
        return false;
    };

    let lines = state.production_lines_mut();
    lines[line].schedule.remove(0);
    let drained = lines[line].schedule.is_empty();
    state.hangars_mut()[hangar] = Some(jig_id);
    state.jigs_mut()[jig_id.0].empty = true;
    state.trailers_factory_mut()[trailer] = None;
    if drained {
        state.production_lines_mut().remove(line);
    }
    true
}

/// Stack the jig from a beluga-side trailer slot onto a rack's front.
fn left_stack_rack(state: &mut ProblemState, rack: usize, trailer: usize) -> bool {
    let Some(jig_id) = stackable_jig(state, rack, state.trailers_beluga(), trailer) else {
        return false;
    };
    state.trailers_beluga_mut()[trailer] = None;
    state.racks_mut()[rack].jigs.push_front(jig_id);
    true
}

/// Stack the jig from a factory-side trailer slot onto a rack's back.
fn right_stack_rack(state: &mut ProblemState, rack: usize, trailer: usize) -> bool {
    let Some(jig_id) = stackable_jig(state, rack, state.trailers_factory(), trailer) else {
        return false;
    };
    state.trailers_factory_mut()[trailer] = None;
    state.racks_mut()[rack].jigs.push_back(jig_id);
    true
}

/// Shared stack preconditions: the slot is occupied and the rack has room
/// for the jig at its current size.
fn stackable_jig(
    state: &ProblemState,
    rack: usize,
    trailers: &[Option<JigId>],
    trailer: usize,
) -> Option<JigId> {
    if rack >= state.racks().len() {
        return None;
    }
    let jig_id = (*trailers.get(trailer)?)?;
    if state.rack_free_space(rack) < state.jig_size(jig_id) {
        return None;
    }
    Some(jig_id)
}

/// Pop the rack's front jig into a free beluga-side trailer slot.
fn left_unstack_rack(state: &mut ProblemState, rack: usize, trailer: usize) -> bool {
    if rack >= state.racks().len() {
        return false;
    }
    let Some(&None) = state.trailers_beluga().get(trailer) else {
        return false;
    };
    if state.racks()[rack].jigs.is_empty() {
        return false;
    }

    let Some(jig_id) = state.racks_mut()[rack].jigs.pop_front() else {
        return false;
    };
    state.trailers_beluga_mut()[trailer] = Some(jig_id);
    true
}

/// Pop the rack's back jig into a free factory-side trailer slot.
fn right_unstack_rack(state: &mut ProblemState, rack: usize, trailer: usize) -> bool {
    if rack >= state.racks().len() {
        return false;
    }
    let Some(&None) = state.trailers_factory().get(trailer) else {
        return false;
    };
    if state.racks()[rack].jigs.is_empty() {
        return false;
    }

    let Some(jig_id) = state.racks_mut()[rack].jigs.pop_back() else {
        return false;
    };
    state.trailers_factory_mut()[trailer] = Some(jig_id);
    true
}
