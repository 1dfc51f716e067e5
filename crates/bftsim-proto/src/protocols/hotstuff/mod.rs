//! # bftsim-proto::protocols::hotstuff
//!
//! The chained HotStuff consensus state machine and its pacemaker:
//! `NEW_VIEW -> PREPARE -> PRE_COMMIT -> COMMIT -> DECIDE`, with the leader
//! rotating every view.

mod logic;
mod messages;
mod state;

pub use messages::Message;
pub use state::Phase;

use crate::api::{Protocol, ValidatorSnapshot};
use crate::ctx_ext::Ctx;
use bftsim_types::id::{NodeId, TimerId};

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::NewView => "NEW_VIEW",
        Phase::Prepare => "PREPARE",
        Phase::PreCommit => "PRE_COMMIT",
        Phase::Commit => "COMMIT",
        Phase::Decide => "DECIDE",
    }
}

const PHASE_LABELS: [&str; 5] = ["NEW_VIEW", "PREPARE", "PRE_COMMIT", "COMMIT", "DECIDE"];

pub struct HotStuffProtocol {
    base_time_limit: f64,
    state: state::State,
}

impl HotStuffProtocol {
    pub fn new(id: NodeId, num_validators: u32, base_time_limit: f64) -> Self {
        HotStuffProtocol {
            base_time_limit,
            state: state::State::new(id, num_validators),
        }
    }

    pub fn stats(&self) -> (&[f64; 5], u64) {
        (&self.state.state_time, self.state.consensus_count)
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }
}

impl Protocol<Message> for HotStuffProtocol {
    fn name(&self) -> &'static str {
        "hotstuff"
    }

    fn init(&mut self, ctx: &mut Ctx<Message>) {
        logic::enter_new_view(&mut self.state, ctx, self.base_time_limit, 0);
    }

    fn on_message(&mut self, ctx: &mut Ctx<Message>, src: NodeId, msg: Message) {
        logic::on_message(&mut self.state, ctx, self.base_time_limit, src, msg);
    }

    fn on_timer(&mut self, ctx: &mut Ctx<Message>, timer: TimerId) {
        logic::on_timer(&mut self.state, ctx, self.base_time_limit, timer);
    }

    fn snapshot(&self, now: f64) -> ValidatorSnapshot {
        ValidatorSnapshot {
            current_state: phase_label(self.state.phase),
            state_times: PHASE_LABELS
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
    fn leader_rotates_by_view_mod_n() {
        let state = State::new(0, 4);
        assert_eq!(state.leader_for(0), 0);
        assert_eq!(state.leader_for(1), 1);
        assert_eq!(state.leader_for(4), 0);
    }

    #[test]
    fn quorum_is_n_minus_f() {
        let state = State::new(0, 4);
        assert_eq!(state.f(), 1);
        assert_eq!(state.quorum(), 3);

        let state = State::new(0, 10);
        assert_eq!(state.f(), 3);
        assert_eq!(state.quorum(), 7);
    }
}
