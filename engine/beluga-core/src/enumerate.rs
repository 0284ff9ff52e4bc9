//! Legal-action enumeration by trial application.
//!
//! Candidate parameter grids are tiny (at most racks × trailers), so
//! legality is decided the simple way: apply the candidate to a private
//! clone and keep it if the applier succeeds. Cloning is cheap thanks to
//! the structurally shared state representation, and the appliers'
//! no-partial-mutation guarantee means a failed trial needs no cleanup.

use crate::action::{Action, ActionKind};
use crate::state::ProblemState;

impl ProblemState {
    /// Whether `action` would succeed on the current state. The state is
    /// never modified.
    pub fn check_action_valid(&self, action: Action) -> bool {
        let mut probe = self.clone();
        probe.apply_action(action)
    }

    /// All parameter bindings of `kind` that are legal right now.
    pub fn enumerate_valid_params(&self, kind: ActionKind) -> Vec<Action> {
        let candidates: Vec<Action> = match kind {
            ActionKind::UnloadBeluga => vec![Action::UnloadBeluga],
            ActionKind::LoadBeluga => (0..self.trailers_beluga().len())
                .map(|trailer| Action::LoadBeluga { trailer })
                .collect(),
            ActionKind::LeftStackRack => self
                .rack_trailer_grid(self.trailers_beluga().len(), |rack, trailer| {
                    Action::LeftStackRack { rack, trailer }
                }),
            ActionKind::RightStackRack => self
                .rack_trailer_grid(self.trailers_factory().len(), |rack, trailer| {
                    Action::RightStackRack { rack, trailer }
                }),
            ActionKind::LeftUnstackRack => self
                .rack_trailer_grid(self.trailers_beluga().len(), |rack, trailer| {
                    Action::LeftUnstackRack { rack, trailer }
                }),
            ActionKind::RightUnstackRack => self
                .rack_trailer_grid(self.trailers_factory().len(), |rack, trailer| {
                    Action::RightUnstackRack { rack, trailer }
                }),
            ActionKind::GetFromHangar => self.hangar_trailer_grid(|hangar, trailer| {
                Action::GetFromHangar { hangar, trailer }
            }),
            ActionKind::DeliverToHangar => self.hangar_trailer_grid(|hangar, trailer| {
                Action::DeliverToHangar { hangar, trailer }
            }),
        };

        candidates
            .into_iter()
            .filter(|&action| self.check_action_valid(action))
            .collect()
    }

    /// Every legal action in the current state, across all eight kinds.
    pub fn get_possible_actions(&self) -> Vec<Action> {
        let mut actions = Vec::new();
        for kind in ActionKind::ALL {
            actions.extend(self.enumerate_valid_params(kind));
        }
        actions
    }

    fn rack_trailer_grid(
        &self,
        trailers: usize,
        make: impl Fn(usize, usize) -> Action,
    ) -> Vec<Action> {
        (0..self.racks().len())
            .flat_map(|rack| (0..trailers).map(move |trailer| (rack, trailer)))
            .map(|(rack, trailer)| make(rack, trailer))
            .collect()
    }

    fn hangar_trailer_grid(&self, make: impl Fn(usize, usize) -> Action) -> Vec<Action> {
        (0..self.hangars().len())
            .flat_map(|hangar| {
                (0..self.trailers_factory().len()).map(move |trailer| (hangar, trailer))
            })
            .map(|(hangar, trailer)| make(hangar, trailer))
            .collect()
    }
}
