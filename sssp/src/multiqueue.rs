use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

use parking_lot::{Mutex, MutexGuard};
use rand::Rng;

use crate::binary_heap::BinaryHeap;
use crate::graph::{Dist, Vertex, DIST_INFINITY};
use crate::queue::VertexQueue;
use crate::vertex::{VertexRecord, INVALID_SLOT, NO_QUEUE};

const TRY_LOCK_ATTEMPTS: usize = 4;

struct Shard {
    heap: Mutex<BinaryHeap>,
    /// Advisory copy of the root distance, `DIST_INFINITY` when empty.
    /// Republished after every structural change; may be stale, never torn.
    top_dist: AtomicI32,
}

impl Shard {
    fn new(reserve_size: usize) -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::with_capacity(reserve_size)),
            top_dist: AtomicI32::new(DIST_INFINITY),
        }
    }

    fn publish_top(&self, heap: &BinaryHeap, records: &[VertexRecord]) {
        self.top_dist.store(heap.top_dist(records), Ordering::Relaxed);
    }
}

/// Relaxed priority queue: `num_threads * size_multiple` independently locked
/// heaps. Inserts go to a random heap; removals compare the advisory tops of
/// two random heaps and take the better one, so a pop returns an
/// approximately-smallest entry rather than the global minimum.
///
/// Each vertex occupies at most one heap at a time. An insert for a vertex
/// that is already queued turns into an in-place decrease-key on its heap; the
/// not-queued -> queued transition is serialized by the record's claim lock,
/// because the target heap is not known until after the random choice, which
/// a bare compare-and-swap on the queue id cannot express.
pub struct MultiQueue {
    shards: Vec<Shard>,
    use_try_lock: bool,
    num_pushes: AtomicUsize,
    /// Entries across all shards. Sequentially consistent because the
    /// workers' quiescence protocol depends on decrement/recheck ordering.
    pending: AtomicUsize,
}

impl MultiQueue {
    pub fn new(
        num_threads: usize,
        size_multiple: usize,
        reserve_size: usize,
        use_try_lock: bool,
    ) -> Self {
        let num_shards = (num_threads * size_multiple).max(1);
        Self {
            shards: (0..num_shards).map(|_| Shard::new(reserve_size)).collect(),
            use_try_lock,
            num_pushes: AtomicUsize::new(0),
            pending: AtomicUsize::new(0),
        }
    }

    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    /// Picks the heap for a fresh insert and locks it. With try-locking
    /// enabled, a few uncontended candidates are tried before blocking.
    fn insert_shard(&self) -> (usize, MutexGuard<'_, BinaryHeap>) {
        let num_shards = self.shards.len();
        let mut rng = rand::thread_rng();
        if self.use_try_lock {
            for _ in 0..TRY_LOCK_ATTEMPTS {
                let k = rng.gen_range(0..num_shards);
                if let Some(guard) = self.shards[k].heap.try_lock() {
                    return (k, guard);
                }
            }
        }
        let k = rng.gen_range(0..num_shards);
        (k, self.shards[k].heap.lock())
    }
}

impl VertexQueue for MultiQueue {
    fn push_singlethreaded(&mut self, records: &[VertexRecord], v: Vertex, dist: Dist) {
        records[v].store_dist(dist);
        let shard = &mut self.shards[0];
        let heap = shard.heap.get_mut();
        heap.push(records, v);
        records[v].publish_queue_id(0);
        let top_dist = heap.top_dist(records);
        shard.top_dist.store(top_dist, Ordering::Relaxed);
        *self.num_pushes.get_mut() += 1;
        *self.pending.get_mut() += 1;
    }

    fn push(&self, records: &[VertexRecord], v: Vertex, new_dist: Dist) {
        self.num_pushes.fetch_add(1, Ordering::Relaxed);
        let record = &records[v];
        loop {
            let cur = record.queue_id();
            if cur != NO_QUEUE {
                // already queued: tighten its entry in place
                let shard = &self.shards[cur as usize];
                let mut heap = shard.heap.lock();
                if record.queue_id_relaxed() != cur || record.slot() == INVALID_SLOT {
                    // popped (and possibly requeued elsewhere) before we
                    // got the lock
                    continue;
                }
                heap.decrease_key(records, v, new_dist);
                shard.publish_top(&heap, records);
                return;
            }

            let claim = record.claim();
            if record.queue_id_relaxed() != NO_QUEUE {
                // someone else inserted it while we waited for the claim
                drop(claim);
                continue;
            }
            if new_dist >= record.dist() {
                // a previous pass already tightened past this offer; the
                // claim lock keeps the distance stable, so skip the insert
                return;
            }
            let (k, mut heap) = self.insert_shard();
            record.store_dist(new_dist);
            heap.push(records, v);
            record.publish_queue_id(k as i32);
            self.pending.fetch_add(1, Ordering::SeqCst);
            self.shards[k].publish_top(&heap, records);
            return;
        }
    }

    fn pop(&self, records: &[VertexRecord]) -> Option<Vertex> {
        let num_shards = self.shards.len();
        let mut rng = rand::thread_rng();
        let i = rng.gen_range(0..num_shards);
        let j = if num_shards > 1 {
            (i + 1 + rng.gen_range(0..num_shards - 1)) % num_shards
        } else {
            i
        };
        let dist_i = self.shards[i].top_dist.load(Ordering::Relaxed);
        let dist_j = self.shards[j].top_dist.load(Ordering::Relaxed);
        if dist_i == DIST_INFINITY && dist_j == DIST_INFINITY {
            return None;
        }
        // best-effort choice; not re-verified under the lock
        let k = if dist_j < dist_i { j } else { i };

        let shard = &self.shards[k];
        let mut heap = shard.heap.lock();
        let Some(v) = heap.pop(records) else {
            shard.publish_top(&heap, records);
            return None;
        };
        records[v].clear_queue_id();
        shard.publish_top(&heap, records);
        self.pending.fetch_sub(1, Ordering::SeqCst);
        Some(v)
    }

    fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    fn num_pushes(&self) -> usize {
        self.num_pushes.load(Ordering::Relaxed)
    }

    fn max_queue_sizes(&self) -> Vec<usize> {
        self.shards
            .iter()
            .map(|shard| shard.heap.lock().max_size())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::new_records;
    use std::thread;

    fn drain(queue: &MultiQueue, records: &[VertexRecord]) -> Vec<Vertex> {
        let mut popped = Vec::new();
        loop {
            match queue.pop(records) {
                Some(v) => popped.push(v),
                None if queue.pending() == 0 => return popped,
                None => {}
            }
        }
    }

    #[test]
    fn single_shard_pops_in_order() {
        let records = new_records(4);
        let mut queue = MultiQueue::new(1, 1, 4, false);
        assert_eq!(queue.num_shards(), 1);
        queue.push_singlethreaded(&records, 0, 0);
        queue.push(&records, 2, 9);
        queue.push(&records, 1, 4);
        queue.push(&records, 3, 6);
        assert_eq!(drain(&queue, &records), vec![0, 1, 3, 2]);
    }

    #[test]
    fn repeated_push_keeps_single_membership() {
        let records = new_records(2);
        let queue = MultiQueue::new(2, 4, 4, false);
        queue.push(&records, 1, 50);
        queue.push(&records, 1, 30);
        queue.push(&records, 1, 40); // no-op, worse than the queued 30

        assert_eq!(queue.pending(), 1);
        assert_eq!(records[1].dist(), 30);
        let popped = drain(&queue, &records);
        assert_eq!(popped, vec![1]);
        assert_eq!(records[1].queue_id_relaxed(), NO_QUEUE);
        assert_eq!(records[1].slot(), INVALID_SLOT);
    }

    #[test]
    fn insert_after_pop_respects_tightened_distance() {
        let records = new_records(1);
        let queue = MultiQueue::new(1, 2, 4, false);
        queue.push(&records, 0, 10);
        let popped = drain(&queue, &records);
        assert_eq!(popped, vec![0]);
        // a late, worse offer must not resurrect the vertex or raise dist
        queue.push(&records, 0, 15);
        assert_eq!(records[0].dist(), 10);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn concurrent_pushers_of_one_vertex_insert_once() {
        for _ in 0..20 {
            let records = new_records(1);
            let queue = MultiQueue::new(4, 2, 4, false);
            thread::scope(|scope| {
                for t in 0..4u32 {
                    let queue = &queue;
                    let records = &records;
                    scope.spawn(move || {
                        queue.push(records, 0, 100 + t as Dist);
                    });
                }
            });
            assert_eq!(queue.pending(), 1);
            assert_eq!(drain(&queue, &records), vec![0]);
            assert_eq!(records[0].dist(), 100);
        }
    }

    #[test]
    fn hammer_push_pop_reaches_quiescence() {
        let records = new_records(256);
        let queue = MultiQueue::new(4, 4, 16, true);
        thread::scope(|scope| {
            for t in 0..4 {
                let queue = &queue;
                let records = &records;
                scope.spawn(move || {
                    for v in 0..records.len() {
                        queue.push(records, v, (v + t) as Dist);
                    }
                    while queue.pop(records).is_some() || queue.pending() > 0 {}
                });
            }
        });
        assert_eq!(queue.pending(), 0);
        for record in &records {
            assert_eq!(record.queue_id_relaxed(), NO_QUEUE);
            assert_eq!(record.slot(), INVALID_SLOT);
        }
        let pushes = queue.num_pushes();
        assert!(pushes >= 256, "every vertex was offered at least once");
    }
}
