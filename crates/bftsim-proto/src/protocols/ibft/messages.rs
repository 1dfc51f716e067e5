//! Wire messages exchanged between IBFT validators.

use serde::{Deserialize, Serialize};

/// A validator's prepared certificate: the view and block hash it had
/// collected `2f+1` matching `PREPARE`s for, carried along in a
/// `ROUND_CHANGE` so the next leader can safely re-propose it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreparedCert {
    pub view: u64,
    pub block_hash: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Message {
    PrePrepare {
        instance: u64,
        view: u64,
        block: u64,
    },
    Prepare {
        instance: u64,
        view: u64,
        block_hash: u64,
    },
    Commit {
        instance: u64,
        view: u64,
        block_hash: u64,
    },
    RoundChange {
        instance: u64,
        view: u64,
        prepared_cert: Option<PreparedCert>,
    },
}

impl Message {
    pub fn instance(&self) -> u64 {
        match self {
            Message::PrePrepare { instance, .. }
            | Message::Prepare { instance, .. }
            | Message::Commit { instance, .. }
            | Message::RoundChange { instance, .. } => *instance,
        }
    }
}
