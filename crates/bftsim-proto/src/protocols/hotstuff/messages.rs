//! Wire messages exchanged between HotStuff replicas.

use serde::{Deserialize, Serialize};

/// A quorum certificate: `n-f` matching votes for `block_hash` at `view`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Qc {
    pub view: u64,
    pub block_hash: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Message {
    NewView {
        view: u64,
        prepare_qc: Option<Qc>,
    },
    Prepare {
        view: u64,
        block: u64,
        high_qc: Option<Qc>,
    },
    PrepareVote {
        view: u64,
        block_hash: u64,
    },
    PreCommit {
        view: u64,
        qc: Qc,
    },
    PreCommitVote {
        view: u64,
        block_hash: u64,
    },
    Commit {
        view: u64,
        qc: Qc,
    },
    CommitVote {
        view: u64,
        block_hash: u64,
    },
    Decide {
        view: u64,
        qc: Qc,
    },
}

impl Message {
    pub fn view(&self) -> u64 {
        match self {
            Message::NewView { view, .. }
            | Message::Prepare { view, .. }
            | Message::PrepareVote { view, .. }
            | Message::PreCommit { view, .. }
            | Message::PreCommitVote { view, .. }
            | Message::Commit { view, .. }
            | Message::CommitVote { view, .. }
            | Message::Decide { view, .. } => *view,
        }
    }
}
