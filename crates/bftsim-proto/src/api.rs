//! # bftsim-proto::api
//!
//! Defines the core traits for protocol implementations. It separates the
//! user-facing typed API (`Protocol<M>`) from the engine-facing dynamic
//! trait object API (`ProtocolDyn`).

use bftsim_types::{
    id::{NodeId, TimerId},
    time::SimTime,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// An error deserializing a wire message into a protocol's typed message enum.
#[derive(Error, Debug)]
#[error("codec error: {0}")]
pub struct CodecError(pub String);

/// A validator's consensus statistics at the moment the simulation ends:
/// the state it is currently in, cumulative simulated time spent in each
/// state it has ever visited, and how many consensus instances it decided.
#[derive(Debug, Clone)]
pub struct ValidatorSnapshot {
    pub current_state: &'static str,
    pub state_times: Vec<(&'static str, f64)>,
    pub consensus_count: u64,
}

// --- Engine-Facing Trait ---

/// The dynamic, object-safe trait that the simulation engine uses to interact
/// with any protocol. It operates on raw byte slices.
pub trait ProtocolDyn: Send {
    /// Returns the static name of the protocol.
    fn name(&self) -> &'static str;

    /// Called once when the validator is initialized, before any events fire.
    fn init(&mut self, ctx: &mut dyn ProtoCtx);

    /// Called when a message is received from another validator.
    fn on_message(
        &mut self,
        ctx: &mut dyn ProtoCtx,
        src: NodeId,
        bytes: &[u8],
    ) -> Result<(), CodecError>;

    /// Called when a previously set timer fires. `tag` is the timer's version
    /// tag at the moment it was armed; implementations must discard expiries
    /// whose tag is older than their current one.
    fn on_timer(&mut self, ctx: &mut dyn ProtoCtx, timer: TimerId);

    /// A snapshot of this validator's consensus statistics, for the final
    /// per-validator report. `now` is the simulation time the snapshot is
    /// taken at; implementations charge the open interval since their last
    /// transition to whatever state they're currently in, so that
    /// `state_times` always sums to exactly `now`.
    fn snapshot(&self, now: f64) -> ValidatorSnapshot;
}

// --- Protocol-Author-Facing Trait ---

/// The ergonomic, typed trait that protocol authors should implement.
/// It is generic over the protocol's message type `M`.
pub trait Protocol<M>: Send
where
    M: DeserializeOwned + Serialize + Debug + Send + 'static,
{
    /// Returns the static name of the protocol.
    fn name(&self) -> &'static str;

    /// Called once when the validator is initialized.
    fn init(&mut self, ctx: &mut super::ctx_ext::Ctx<M>);

    /// Called when a message is received and successfully deserialized.
    fn on_message(&mut self, ctx: &mut super::ctx_ext::Ctx<M>, src: NodeId, msg: M);

    /// Called when a previously set timer fires.
    fn on_timer(&mut self, ctx: &mut super::ctx_ext::Ctx<M>, timer: TimerId);

    /// A snapshot of this validator's consensus statistics, charging the
    /// open interval since the last transition up to `now`.
    fn snapshot(&self, now: f64) -> ValidatorSnapshot;
}

// --- Adapter to bridge Protocol<M> to ProtocolDyn ---

struct ProtocolAdapter<P, M>
where
    P: Protocol<M>,
    M: DeserializeOwned + Serialize + Debug + Send + 'static,
{
    inner: P,
    _phantom: std::marker::PhantomData<M>,
}

impl<P, M> ProtocolDyn for ProtocolAdapter<P, M>
where
    P: Protocol<M> + Send,
    M: DeserializeOwned + Serialize + Debug + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn init(&mut self, ctx: &mut dyn ProtoCtx) {
        let mut wrapped_ctx = super::ctx_ext::Ctx::<M>::new(ctx);
        self.inner.init(&mut wrapped_ctx);
    }

    fn on_message(
        &mut self,
        ctx: &mut dyn ProtoCtx,
        src: NodeId,
        bytes: &[u8],
    ) -> Result<(), CodecError> {
        let msg: M = postcard::from_bytes(bytes)
            .map_err(|e| CodecError(format!("deserialization failed: {e}")))?;
        let mut wrapped_ctx = super::ctx_ext::Ctx::<M>::new(ctx);
        self.inner.on_message(&mut wrapped_ctx, src, msg);
        Ok(())
    }

    fn on_timer(&mut self, ctx: &mut dyn ProtoCtx, timer: TimerId) {
        let mut wrapped_ctx = super::ctx_ext::Ctx::<M>::new(ctx);
        self.inner.on_timer(&mut wrapped_ctx, timer);
    }

    fn snapshot(&self, now: f64) -> ValidatorSnapshot {
        self.inner.snapshot(now)
    }
}

/// Erases the concrete message type of a `Protocol<M>` implementation,
/// returning a `Box<dyn ProtocolDyn>` the engine can store in a node.
pub fn boxed_dyn<P, M>(p: P) -> Box<dyn ProtocolDyn>
where
    P: Protocol<M> + 'static,
    M: DeserializeOwned + Serialize + Debug + Send + 'static,
{
    Box::new(ProtocolAdapter {
        inner: p,
        _phantom: std::marker::PhantomData,
    })
}

// --- Engine-Provided Context Trait ---

/// The capabilities the simulation engine exposes to a validator's protocol
/// instance. This is the only channel through which a protocol can produce
/// side effects (outbound payloads, timers).
pub trait ProtoCtx {
    /// Sends raw bytes to a single destination validator.
    fn send_raw(&mut self, dst: NodeId, bytes: Vec<u8>);

    /// Broadcasts raw bytes to every other validator, in validator-id order,
    /// so that recipient-side event insertion order is reproducible.
    fn broadcast_raw(&mut self, bytes: Vec<u8>);

    /// Arms a timer to fire `after` simulation-time units from now. Returns a
    /// `TimerId` tagged with the node's current timer generation.
    fn set_timer(&mut self, after: SimTime) -> TimerId;

    /// The current simulation time.
    fn now(&self) -> SimTime;

    /// This validator's own id.
    fn node_id(&self) -> NodeId;

    /// Number of validators in the run (`N` in the quorum arithmetic).
    fn num_validators(&self) -> u32;

    /// Draws a deterministic `u64` from the simulation's master RNG stream.
    fn rng_u64(&mut self) -> u64;

    /// Attaches a key-value pair to the current diagnostic logging span.
    fn log_kv(&mut self, key: &'static str, val: &str);
}
