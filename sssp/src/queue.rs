use std::cmp::Reverse;
use std::collections::BinaryHeap as ScalarHeap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::graph::{Dist, Vertex};
use crate::vertex::VertexRecord;

/// Common surface of the concurrent queue variants. The worker loop is
/// generic over this trait; the driver picks the implementation per run.
pub trait VertexQueue: Sync {
    /// Seeding path used before any worker exists; may skip locking.
    fn push_singlethreaded(&mut self, records: &[VertexRecord], v: Vertex, dist: Dist);

    /// Offer `v` at `new_dist`: insert it, or tighten its existing entry.
    fn push(&self, records: &[VertexRecord], v: Vertex, new_dist: Dist);

    /// Remove an approximately-smallest entry, or `None` when nothing was
    /// found (which is not proof of global emptiness).
    fn pop(&self, records: &[VertexRecord]) -> Option<Vertex>;

    /// Entries currently enqueued; drives the workers' quiescence check.
    fn pending(&self) -> usize;

    fn num_pushes(&self) -> usize;

    fn max_queue_sizes(&self) -> Vec<usize>;
}

/// Baseline: one mutex around one scalar priority queue. Entries are
/// `(dist, vertex)` pairs and duplicates are allowed; superseded pairs are
/// skipped on the way out. Run with a single worker this is also the
/// uncontended "regular queue" reference point.
pub struct BlockingQueue {
    heap: Mutex<ScalarHeap<Reverse<(Dist, Vertex)>>>,
    num_pushes: AtomicUsize,
    max_size: AtomicUsize,
}

impl BlockingQueue {
    pub fn new() -> Self {
        Self {
            heap: Mutex::new(ScalarHeap::new()),
            num_pushes: AtomicUsize::new(0),
            max_size: AtomicUsize::new(0),
        }
    }
}

impl VertexQueue for BlockingQueue {
    fn push_singlethreaded(&mut self, records: &[VertexRecord], v: Vertex, dist: Dist) {
        records[v].store_dist(dist);
        let heap = self.heap.get_mut();
        heap.push(Reverse((dist, v)));
        *self.num_pushes.get_mut() += 1;
        let max_size = self.max_size.get_mut();
        *max_size = (*max_size).max(heap.len());
    }

    fn push(&self, records: &[VertexRecord], v: Vertex, new_dist: Dist) {
        self.num_pushes.fetch_add(1, Ordering::Relaxed);
        let mut heap = self.heap.lock();
        // the single lock linearizes the check with the store, so the
        // record's distance stays monotone
        if new_dist < records[v].dist() {
            records[v].store_dist(new_dist);
            heap.push(Reverse((new_dist, v)));
            self.max_size.fetch_max(heap.len(), Ordering::Relaxed);
        }
    }

    fn pop(&self, records: &[VertexRecord]) -> Option<Vertex> {
        let mut heap = self.heap.lock();
        while let Some(Reverse((dist, v))) = heap.pop() {
            if dist > records[v].dist() {
                continue; // superseded duplicate
            }
            return Some(v);
        }
        None
    }

    fn pending(&self) -> usize {
        self.heap.lock().len()
    }

    fn num_pushes(&self) -> usize {
        self.num_pushes.load(Ordering::Relaxed)
    }

    fn max_queue_sizes(&self) -> Vec<usize> {
        vec![self.max_size.load(Ordering::Relaxed)]
    }
}
