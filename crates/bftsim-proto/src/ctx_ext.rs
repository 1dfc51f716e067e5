//! # bftsim-proto::ctx_ext
//!
//! Defines the `Ctx<M>` struct, which is the primary, ergonomic API for
//! protocol authors. It wraps the engine's `ProtoCtx` trait object and
//! provides typed, convenient methods for common operations like sending
//! messages and setting timers.

use crate::api::{CodecError, ProtoCtx};
use bftsim_types::{
    id::{NodeId, TimerId},
    time::SimTime,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt::Debug, marker::PhantomData};

/// A typed context wrapper provided to `Protocol<M>` implementations.
pub struct Ctx<'a, M> {
    inner: &'a mut dyn ProtoCtx,
    _p: PhantomData<M>,
}

impl<'a, M> Ctx<'a, M> {
    pub(crate) fn new(inner: &'a mut dyn ProtoCtx) -> Self {
        Self {
            inner,
            _p: PhantomData,
        }
    }
}

impl<'a, M> Ctx<'a, M>
where
    M: Serialize + DeserializeOwned + Debug + Send + 'static,
{
    /// Sends a typed message to a specific destination validator. Serialized
    /// with `postcard`.
    pub fn send(&mut self, dst: NodeId, msg: &M) -> Result<(), CodecError> {
        let bytes =
            postcard::to_allocvec(msg).map_err(|e| CodecError(format!("serialization failed: {e}")))?;
        self.inner.send_raw(dst, bytes);
        Ok(())
    }

    /// Broadcasts a typed message to every other validator.
    pub fn broadcast(&mut self, msg: &M) -> Result<(), CodecError> {
        let bytes =
            postcard::to_allocvec(msg).map_err(|e| CodecError(format!("serialization failed: {e}")))?;
        self.inner.broadcast_raw(bytes);
        Ok(())
    }

    /// Arms a timer that fires after the given duration.
    pub fn set_timer(&mut self, after: SimTime) -> TimerId {
        self.inner.set_timer(after)
    }

    /// The current simulation time.
    pub fn now(&self) -> SimTime {
        self.inner.now()
    }

    /// This validator's own id.
    pub fn node_id(&self) -> NodeId {
        self.inner.node_id()
    }

    /// Number of validators in the run.
    pub fn num_validators(&self) -> u32 {
        self.inner.num_validators()
    }

    /// A deterministic `u64` drawn from the simulation's master RNG stream.
    pub fn rng_u64(&mut self) -> u64 {
        self.inner.rng_u64()
    }

    /// Attaches a key-value pair to the current logging span, e.g.
    /// `ctx.log_kv("state", "PREPARED")`.
    pub fn log_kv(&mut self, key: &'static str, val: &str) {
        self.inner.log_kv(key, val);
    }

    /// Logs a serializable value by converting it to a JSON string first.
    pub fn log_kv_json<T: Serialize>(&mut self, key: &'static str, val: &T) {
        if let Ok(json_str) = serde_json::to_string(val) {
            self.inner.log_kv(key, &json_str);
        }
    }
}
