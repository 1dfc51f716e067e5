//! # bftsim-types::payload
//!
//! Defines the in-flight message envelope that travels through the fabric.

use crate::id::NodeId;
use serde::{Deserialize, Serialize};

/// An in-flight message. Immutable once created; owned by at most one node's
/// ingress queue at a time.
///
/// `message` is the opaque, protocol-serialized bytes produced by a
/// validator's consensus state machine (see `ProtocolDyn::on_message` in
/// `bftsim-proto`); the fabric never inspects it, only `last_hop` and
/// `final_destination`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payload {
    pub message: Vec<u8>,
    pub last_hop: NodeId,
    pub final_destination: NodeId,
}

impl Payload {
    pub fn new(message: Vec<u8>, last_hop: NodeId, final_destination: NodeId) -> Self {
        Payload {
            message,
            last_hop,
            final_destination,
        }
    }
}
