//! # bftsim-engine::ids
//!
//! Generators for the monotonic ids the engine hands out: timer ids and the
//! insertion-sequence counter that breaks ties in the event queue.

use bftsim_types::id::{EventId, TimerId};

/// A generator for the engine's id spaces.
pub struct IdGen {
    timer_id: TimerId,
    insertion_seq: EventId,
}

impl IdGen {
    pub fn new() -> Self {
        Self {
            timer_id: 0,
            insertion_seq: 0,
        }
    }

    pub fn next_timer_id(&mut self) -> TimerId {
        let id = self.timer_id;
        self.timer_id = self.timer_id.checked_add(1).expect("TimerId overflow");
        id
    }

    pub fn next_insertion_seq(&mut self) -> EventId {
        let id = self.insertion_seq;
        self.insertion_seq = self
            .insertion_seq
            .checked_add(1)
            .expect("insertion sequence overflow");
        id
    }
}

impl Default for IdGen {
    fn default() -> Self {
        Self::new()
    }
}
