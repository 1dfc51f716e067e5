//! # bftsim-engine::rng
//!
//! The simulation's random number discipline. A single shared `ChaCha20Rng`
//! stream drives all service-time sampling, consumed in event-dispatch order
//! so that the run's seed deterministically fixes the whole trace (spec
//! §4.2). Endpoints additionally get a per-node sub-stream, seeded
//! deterministically from their id, for the uplink-selection draw described
//! in §4.4/§9 — keeping that choice stable regardless of how many other
//! draws the shared stream has made by the time it's needed.

use bftsim_types::id::NodeId;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::collections::BTreeMap;

/// A wrapper around the master RNG to enforce recording of its usage.
pub struct RngDiscipline<'a> {
    rng: &'a mut ChaCha20Rng,
    recorder: &'a mut Recorder,
    site_label: &'static str,
}

impl<'a> RngDiscipline<'a> {
    pub fn new(rng: &'a mut ChaCha20Rng, recorder: &'a mut Recorder, site_label: &'static str) -> Self {
        Self {
            rng,
            recorder,
            site_label,
        }
    }
}

impl<'a> RngCore for RngDiscipline<'a> {
    fn next_u32(&mut self) -> u32 {
        self.recorder.record_draw(self.site_label);
        self.rng.next_u32()
    }
    fn next_u64(&mut self) -> u64 {
        self.recorder.record_draw(self.site_label);
        self.rng.next_u64()
    }
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.recorder.record_draw(self.site_label);
        self.rng.fill_bytes(dest)
    }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.recorder.record_draw(self.site_label);
        self.rng.try_fill_bytes(dest)
    }
}

/// Records how many times each labeled call site has drawn from the shared
/// stream, for diagnostic logging.
pub struct Recorder {
    seed: u64,
    rng_sites: BTreeMap<&'static str, u64>,
}

impl Recorder {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng_sites: BTreeMap::new(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn record_draw(&mut self, site_label: &'static str) {
        *self.rng_sites.entry(site_label).or_insert(0) += 1;
    }

    pub fn draw_counts(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.rng_sites.iter().map(|(k, v)| (*k, *v))
    }
}

/// Draws a service time from the exponential distribution with the given
/// `rate`, or `0.0` if `rate` is the instantaneous sentinel (`ServiceRate`
/// already resolves `-1` to `Instantaneous` upstream, so this only ever
/// receives a strictly positive rate).
pub fn sample_exponential(rng: &mut impl RngCore, rate: f64) -> f64 {
    debug_assert!(rate > 0.0, "sample_exponential requires a positive rate");
    let u: f64 = rng.gen_range(0.0..1.0);
    -(1.0 - u).ln() / rate
}

/// A deterministic sub-stream of the shared RNG, derived from an endpoint's
/// id and the trial seed. Used for the endpoint's uniform choice among its
/// uplink switches, kept independent of the shared stream's draw order.
pub fn endpoint_substream(trial_seed: u64, endpoint: NodeId) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(trial_seed ^ 0x5350_4941_4c5f ^ (endpoint as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}
