use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

use parking_lot::{Mutex, MutexGuard};

use crate::graph::{Dist, Vertex, DIST_INFINITY};

/// `queue_id` value of a record that is in no heap.
pub const NO_QUEUE: i32 = -1;
/// `slot` value of a record that is in no heap.
pub const INVALID_SLOT: usize = usize::MAX;

/// Shared per-vertex state. Records live in one arena for the whole run and
/// never move; heaps refer to them by vertex id.
///
/// A record is in at most one heap at a time: while `queue_id == k` the record
/// occupies heap `k` at position `slot`, and `slot` is only written by the
/// holder of that heap's lock. The claim lock serializes the `-1 -> k`
/// transition so two inserters cannot both push the same vertex.
pub struct VertexRecord {
    vertex: Vertex,
    dist: AtomicI32,
    queue_id: AtomicI32,
    slot: AtomicUsize,
    claim: Mutex<()>,
}

impl VertexRecord {
    pub fn new(vertex: Vertex) -> Self {
        Self {
            vertex,
            dist: AtomicI32::new(DIST_INFINITY),
            queue_id: AtomicI32::new(NO_QUEUE),
            slot: AtomicUsize::new(INVALID_SLOT),
            claim: Mutex::new(()),
        }
    }

    pub fn vertex(&self) -> Vertex {
        self.vertex
    }

    pub fn dist(&self) -> Dist {
        self.dist.load(Ordering::Relaxed)
    }

    pub(crate) fn store_dist(&self, new_dist: Dist) {
        self.dist.store(new_dist, Ordering::Relaxed);
    }

    /// Acquire-ordered read so that a subsequent lock of the named heap
    /// observes the membership published by the inserter.
    pub(crate) fn queue_id(&self) -> i32 {
        self.queue_id.load(Ordering::Acquire)
    }

    pub(crate) fn queue_id_relaxed(&self) -> i32 {
        self.queue_id.load(Ordering::Relaxed)
    }

    /// Release-ordered commit of a fresh heap membership.
    pub(crate) fn publish_queue_id(&self, queue_id: i32) {
        self.queue_id.store(queue_id, Ordering::Release);
    }

    /// Membership retraction; callers hold the owning heap's lock.
    pub(crate) fn clear_queue_id(&self) {
        self.queue_id.store(NO_QUEUE, Ordering::Relaxed);
    }

    pub(crate) fn slot(&self) -> usize {
        self.slot.load(Ordering::Relaxed)
    }

    pub(crate) fn set_slot(&self, slot: usize) {
        self.slot.store(slot, Ordering::Relaxed);
    }

    pub(crate) fn claim(&self) -> MutexGuard<'_, ()> {
        self.claim.lock()
    }
}

pub fn new_records(num_vertexes: usize) -> Vec<VertexRecord> {
    (0..num_vertexes).map(VertexRecord::new).collect()
}

/// Extracts the plain distance vector once all workers have joined.
pub fn take_dists(records: &[VertexRecord]) -> Vec<Dist> {
    records.iter().map(|record| record.dist()).collect()
}

pub fn counter_vec(num_vertexes: usize) -> Vec<AtomicUsize> {
    (0..num_vertexes).map(|_| AtomicUsize::new(0)).collect()
}

/// Unwraps an atomic counter vector; the counters must be quiescent.
pub fn take_counters(counters: Vec<AtomicUsize>) -> Vec<usize> {
    counters.into_iter().map(AtomicUsize::into_inner).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_record_is_unreached_and_unqueued() {
        let record = VertexRecord::new(7);
        assert_eq!(record.vertex(), 7);
        assert_eq!(record.dist(), DIST_INFINITY);
        assert_eq!(record.queue_id(), NO_QUEUE);
        assert_eq!(record.slot(), INVALID_SLOT);
    }

    #[test]
    fn counters_round_trip() {
        let counters = counter_vec(3);
        counters[1].fetch_add(5, Ordering::Relaxed);
        assert_eq!(take_counters(counters), vec![0, 5, 0]);
    }
}
