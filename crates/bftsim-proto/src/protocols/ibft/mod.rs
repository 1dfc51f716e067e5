//! # bftsim-proto::protocols::ibft
//!
//! The Istanbul BFT consensus state machine: `NEW_ROUND -> PREPREPARED ->
//! PREPARED -> COMMITTED`, with `ROUND_CHANGE` as the pacemaker's escape
//! hatch when a round's leader is slow or silent.

mod logic;
mod messages;
mod state;

pub use messages::Message;
pub use state::RoundState;

use crate::api::{Protocol, ValidatorSnapshot};
use crate::ctx_ext::Ctx;
use bftsim_types::id::{NodeId, TimerId};

fn round_label(round: RoundState) -> &'static str {
    match round {
        RoundState::NewRound => "NEW_ROUND",
        RoundState::PrePrepared => "PREPREPARED",
        RoundState::Prepared => "PREPARED",
        RoundState::RoundChange => "ROUND_CHANGE",
        RoundState::Committed => "COMMITTED",
    }
}

const ROUND_LABELS: [&str; 5] = [
    "NEW_ROUND",
    "PREPREPARED",
    "PREPARED",
    "ROUND_CHANGE",
    "COMMITTED",
];

/// The engine-facing IBFT validator. `base_time_limit` is the round-0
/// timeout (`T_v = baseTimeLimit * 2^v`); `state` holds all mutable
/// consensus state.
pub struct IbftProtocol {
    base_time_limit: f64,
    state: state::State,
}

impl IbftProtocol {
    pub fn new(id: NodeId, num_validators: u32, base_time_limit: f64) -> Self {
        IbftProtocol {
            base_time_limit,
            state: state::State::new(id, num_validators),
        }
    }

    /// Cumulative time spent in each round state, plus the consensus count,
    /// for the final per-validator snapshot.
    pub fn stats(&self) -> (&[f64; 5], u64) {
        (&self.state.state_time, self.state.consensus_count)
    }

    pub fn round(&self) -> RoundState {
        self.state.round
    }
}

impl Protocol<Message> for IbftProtocol {
    fn name(&self) -> &'static str {
        "ibft"
    }

    fn init(&mut self, ctx: &mut Ctx<Message>) {
        logic::enter_new_round(&mut self.state, ctx, self.base_time_limit, 0, 0);
    }

    fn on_message(&mut self, ctx: &mut Ctx<Message>, src: NodeId, msg: Message) {
        logic::on_message(&mut self.state, ctx, self.base_time_limit, src, msg);
    }

    fn on_timer(&mut self, ctx: &mut Ctx<Message>, timer: TimerId) {
        logic::on_timer(&mut self.state, ctx, self.base_time_limit, timer);
    }

    fn snapshot(&self, now: f64) -> ValidatorSnapshot {
        ValidatorSnapshot {
            current_state: round_label(self.state.round),
            state_times: ROUND_LABELS
                .iter()
                .copied()
                .zip(self.state.state_time_as_of(now))
                .collect(),
            consensus_count: self.state.consensus_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::state::State;

    #[test]
    fn leader_rotates_by_h_plus_v_mod_n() {
        let state = State::new(0, 4);
        assert_eq!(state.leader_for(0, 0), 0);
        assert_eq!(state.leader_for(0, 1), 1);
        assert_eq!(state.leader_for(1, 0), 1);
        assert_eq!(state.leader_for(5, 3), 0);
    }

    #[test]
    fn quorum_is_two_f_plus_one() {
        let state = State::new(0, 4);
        assert_eq!(state.f(), 1);
        assert_eq!(state.quorum(), 3);

        let state = State::new(0, 10);
        assert_eq!(state.f(), 3);
        assert_eq!(state.quorum(), 7);
    }
}
