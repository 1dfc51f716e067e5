//! Per-replica HotStuff state.

use super::messages::{Message, Qc};
use bftsim_types::id::{NodeId, TimerId};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NewView,
    Prepare,
    PreCommit,
    Commit,
    Decide,
}

#[derive(Debug, Default)]
pub struct Tally {
    /// Voters for the current view's `NEW_VIEW`, tracked only by the leader.
    pub new_view_voters: HashSet<NodeId>,
    pub best_prepare_qc: Option<Qc>,
    pub prepare_votes: HashMap<u64, HashSet<NodeId>>,
    pub precommit_votes: HashMap<u64, HashSet<NodeId>>,
    pub commit_votes: HashMap<u64, HashSet<NodeId>>,
}

pub struct State {
    pub id: NodeId,
    pub num_validators: u32,
    pub current_view: u64,
    pub phase: Phase,
    pub tally: Tally,
    pub proposed_block: Option<u64>,
    pub high_qc: Option<Qc>,
    pub locked_qc: Option<Qc>,
    pub active_timer: Option<TimerId>,
    pub pending: HashMap<u64, Vec<(NodeId, Message)>>,
    pub consensus_count: u64,
    pub state_time: [f64; 5],
    pub last_transition_time: f64,
}

impl State {
    pub fn new(id: NodeId, num_validators: u32) -> Self {
        State {
            id,
            num_validators,
            current_view: 0,
            phase: Phase::NewView,
            tally: Tally::default(),
            proposed_block: None,
            high_qc: None,
            locked_qc: None,
            active_timer: None,
            pending: HashMap::new(),
            consensus_count: 0,
            state_time: [0.0; 5],
            last_transition_time: 0.0,
        }
    }

    pub fn f(&self) -> u64 {
        (self.num_validators as u64 - 1) / 3
    }

    /// The quorum size, `n - f`.
    pub fn quorum(&self) -> usize {
        self.num_validators as usize - self.f() as usize
    }

    pub fn leader_for(&self, view: u64) -> NodeId {
        (view % self.num_validators as u64) as NodeId
    }

    pub fn is_leader(&self, view: u64) -> bool {
        self.leader_for(view) == self.id
    }

    fn phase_index(phase: Phase) -> usize {
        match phase {
            Phase::NewView => 0,
            Phase::Prepare => 1,
            Phase::PreCommit => 2,
            Phase::Commit => 3,
            Phase::Decide => 4,
        }
    }

    pub fn transition(&mut self, now: f64, next: Phase) {
        self.state_time[Self::phase_index(self.phase)] += now - self.last_transition_time;
        self.last_transition_time = now;
        self.phase = next;
    }

    /// `state_time`, with the open interval since `last_transition_time`
    /// charged to the current phase, without mutating `self`.
    pub fn state_time_as_of(&self, now: f64) -> [f64; 5] {
        let mut times = self.state_time;
        times[Self::phase_index(self.phase)] += now - self.last_transition_time;
        times
    }

    pub fn reset_round(&mut self, view: u64) {
        self.current_view = view;
        self.tally = Tally::default();
        self.proposed_block = None;
        self.active_timer = None;
    }
}
