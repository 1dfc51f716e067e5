//! # bftsim-engine::node::runtime
//!
//! The `Node` struct unifies switches and validators behind the shared
//! ingress-queue/busy-flag discipline (spec §3/§4.4): a node is busy iff
//! exactly one `ProcessPayload` is outstanding for it, and incoming
//! payloads queue FIFO while it's busy.

use bftsim_proto::ProtocolDyn;
use bftsim_types::id::NodeId;
use bftsim_types::payload::Payload;
use rand_chacha::ChaCha20Rng;
use std::collections::VecDeque;

/// The kind-specific state a `Node` carries.
pub enum NodeKind {
    /// A switch forwards payloads via the fabric's routing table; it holds
    /// no protocol state of its own.
    Switch,
    /// A validator hosts a consensus protocol instance and has its own
    /// deterministic sub-stream for uplink selection (spec §4.4/§9).
    Validator {
        proto: Box<dyn ProtocolDyn>,
        uplink_rng: ChaCha20Rng,
    },
}

/// A single node (switch or validator) in the simulated fabric.
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub queue: VecDeque<Payload>,
    pub busy: bool,
}

impl Node {
    pub fn new_switch(id: NodeId) -> Self {
        Self {
            id,
            kind: NodeKind::Switch,
            queue: VecDeque::new(),
            busy: false,
        }
    }

    pub fn new_validator(id: NodeId, proto: Box<dyn ProtocolDyn>, uplink_rng: ChaCha20Rng) -> Self {
        Self {
            id,
            kind: NodeKind::Validator { proto, uplink_rng },
            queue: VecDeque::new(),
            busy: false,
        }
    }

    pub fn is_validator(&self) -> bool {
        matches!(self.kind, NodeKind::Validator { .. })
    }

    pub fn proto(&self) -> Option<&dyn ProtocolDyn> {
        match &self.kind {
            NodeKind::Validator { proto, .. } => Some(proto.as_ref()),
            NodeKind::Switch => None,
        }
    }

    pub fn proto_mut(&mut self) -> Option<&mut Box<dyn ProtocolDyn>> {
        match &mut self.kind {
            NodeKind::Validator { proto, .. } => Some(proto),
            NodeKind::Switch => None,
        }
    }

    /// Enqueues `payload`; if the node was idle, immediately pops it back off
    /// and returns it to begin processing at the same simulated time.
    pub fn enqueue_and_maybe_start(&mut self, payload: Payload) -> Option<Payload> {
        self.queue.push_back(payload);
        if !self.busy {
            let next = self.queue.pop_front().expect("just pushed");
            self.busy = true;
            Some(next)
        } else {
            None
        }
    }

    /// Called when `PollQueue` fires: pulls the next payload if any is
    /// waiting, otherwise marks the node idle.
    pub fn poll(&mut self) -> Option<Payload> {
        match self.queue.pop_front() {
            Some(payload) => {
                self.busy = true;
                Some(payload)
            }
            None => {
                self.busy = false;
                None
            }
        }
    }
}
