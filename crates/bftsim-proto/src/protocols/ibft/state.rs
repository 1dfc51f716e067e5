//! Per-validator IBFT state.

use super::messages::PreparedCert;
use bftsim_types::id::{NodeId, TimerId};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    NewRound,
    PrePrepared,
    Prepared,
    RoundChange,
    Committed,
}

/// Vote tallies for the instance/view currently in progress. Reset whenever
/// the validator enters a new round (new view or new instance); stale votes
/// for a superseded round are simply dropped along with the old `Tally`.
#[derive(Debug, Default)]
pub struct Tally {
    pub prepare_votes: HashMap<u64, HashSet<NodeId>>,
    pub commit_votes: HashMap<u64, HashSet<NodeId>>,
    pub round_change_votes: HashMap<u64, HashSet<NodeId>>,
}

pub struct State {
    pub id: NodeId,
    pub num_validators: u32,
    pub current_instance: u64,
    pub current_view: u64,
    pub round: RoundState,
    pub tally: Tally,
    pub proposed_block: Option<u64>,
    pub prepared_cert: Option<PreparedCert>,
    /// The `TimerId` of the currently outstanding round timer, if any. An
    /// expiry whose id doesn't match this is stale and ignored, since
    /// advancing the round always replaces this field.
    pub active_timer: Option<TimerId>,
    /// Messages for instances ahead of `current_instance`, buffered until the
    /// validator catches up. Unbounded: the workload is finite.
    pub pending: HashMap<u64, Vec<(NodeId, super::messages::Message)>>,
    pub consensus_count: u64,
    /// Cumulative simulated time spent in each `RoundState`, keyed by a
    /// stable small index matching `RoundState`'s variant order.
    pub state_time: [f64; 5],
    pub last_transition_time: f64,
}

impl State {
    pub fn new(id: NodeId, num_validators: u32) -> Self {
        State {
            id,
            num_validators,
            current_instance: 0,
            current_view: 0,
            round: RoundState::NewRound,
            tally: Tally::default(),
            proposed_block: None,
            prepared_cert: None,
            active_timer: None,
            pending: HashMap::new(),
            consensus_count: 0,
            state_time: [0.0; 5],
            last_transition_time: 0.0,
        }
    }

    /// `f`, the maximum number of tolerated faulty validators.
    pub fn f(&self) -> u64 {
        (self.num_validators as u64 - 1) / 3
    }

    /// The quorum size, `2f+1`.
    pub fn quorum(&self) -> usize {
        (2 * self.f() + 1) as usize
    }

    /// The leader for view `v` of instance `h`: `(h + v) mod N`.
    pub fn leader_for(&self, instance: u64, view: u64) -> NodeId {
        ((instance + view) % self.num_validators as u64) as NodeId
    }

    pub fn is_leader(&self, instance: u64, view: u64) -> bool {
        self.leader_for(instance, view) == self.id
    }

    fn round_index(round: RoundState) -> usize {
        match round {
            RoundState::NewRound => 0,
            RoundState::PrePrepared => 1,
            RoundState::Prepared => 2,
            RoundState::RoundChange => 3,
            RoundState::Committed => 4,
        }
    }

    /// Charges elapsed time to the round the validator was in, then moves to
    /// `next`, resetting the per-round vote tallies.
    pub fn transition(&mut self, now: f64, next: RoundState) {
        self.state_time[Self::round_index(self.round)] += now - self.last_transition_time;
        self.last_transition_time = now;
        self.round = next;
    }

    /// `state_time`, with the open interval since `last_transition_time`
    /// charged to the current round, without mutating `self`. Used when
    /// reporting a snapshot that doesn't itself trigger a transition.
    pub fn state_time_as_of(&self, now: f64) -> [f64; 5] {
        let mut times = self.state_time;
        times[Self::round_index(self.round)] += now - self.last_transition_time;
        times
    }

    pub fn reset_round(&mut self, instance: u64, view: u64) {
        self.current_instance = instance;
        self.current_view = view;
        self.tally = Tally::default();
        self.proposed_block = None;
        self.active_timer = None;
    }
}
