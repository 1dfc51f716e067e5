//! # bftsim-engine::events
//!
//! Defines the core `Event` enum and the `Queued` wrapper used as the
//! priority-queue entry type. Ties are broken purely by insertion order:
//! there is no secondary discriminant, since reproducibility only requires
//! that events scheduled at the same simulated time dispatch in the order
//! they were scheduled.

use bftsim_types::id::{EventId, NodeId, TimerId};
use bftsim_types::payload::Payload;
use bftsim_types::time::SimTime;
use std::cmp::Ordering;

/// Represents all possible events that can be scheduled in the simulation.
#[derive(Debug, Clone)]
pub enum Event {
    /// A payload arrives at `node`'s ingress queue.
    QueueMessage { node: NodeId, payload: Payload },
    /// `node` begins processing `payload`: a service time is drawn, any
    /// outbound payloads are produced, and a `PollQueue` is scheduled for
    /// when service completes.
    ProcessPayload { node: NodeId, payload: Payload },
    /// `node` is ready to pull its next payload, if idle and non-empty.
    PollQueue { node: NodeId },
    /// A previously armed timer has fired on `node`.
    TimerExpiry { node: NodeId, timer: TimerId },
}

impl Event {
    /// A stable label for this event's variant, for metrics/logging.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Event::QueueMessage { .. } => "queue_message",
            Event::ProcessPayload { .. } => "process_payload",
            Event::PollQueue { .. } => "poll_queue",
            Event::TimerExpiry { .. } => "timer_expiry",
        }
    }
}

/// Wraps an `Event` with its scheduled time and insertion sequence, making it
/// suitable for a `BinaryHeap`-backed min-heap.
#[derive(Debug)]
pub struct Queued<T> {
    pub time: SimTime,
    /// Monotonic sequence number; the sole tie-breaker at equal `time`.
    pub insert_seq: EventId,
    pub payload: T,
}

impl<T> Queued<T> {
    pub fn new(time: SimTime, insert_seq: EventId, payload: T) -> Self {
        Self {
            time,
            insert_seq,
            payload,
        }
    }
}

impl<T> PartialEq for Queued<T> {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.insert_seq == other.insert_seq
    }
}

impl<T> Eq for Queued<T> {}

impl<T> PartialOrd for Queued<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Queued<T> {
    /// `BinaryHeap` is a max-heap; reverse both keys to make it a min-heap
    /// ordered by `(time, insert_seq)`.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.insert_seq.cmp(&self.insert_seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bftsim_types::time::st;
    use std::collections::BinaryHeap;

    #[test]
    fn equal_time_events_pop_in_insertion_order() {
        let mut heap = BinaryHeap::new();
        heap.push(Queued::new(st(5.0), 2, "second"));
        heap.push(Queued::new(st(5.0), 0, "first"));
        heap.push(Queued::new(st(5.0), 1, "middle"));

        assert_eq!(heap.pop().unwrap().payload, "first");
        assert_eq!(heap.pop().unwrap().payload, "middle");
        assert_eq!(heap.pop().unwrap().payload, "second");
    }

    #[test]
    fn earlier_time_always_pops_first() {
        let mut heap = BinaryHeap::new();
        heap.push(Queued::new(st(10.0), 0, "late"));
        heap.push(Queued::new(st(1.0), 5, "early"));

        assert_eq!(heap.pop().unwrap().payload, "early");
        assert_eq!(heap.pop().unwrap().payload, "late");
    }
}
