use crate::graph::{Dist, Vertex, DIST_INFINITY};
use crate::vertex::{VertexRecord, INVALID_SLOT};

/// Min-heap on tentative distance over the shared record arena. Slots hold
/// vertex ids; every structural move rewrites the moved record's slot index
/// so `decrease_key` can sift in place. All methods except `top_dist` require
/// the owning lock to be held.
pub struct BinaryHeap {
    slots: Vec<Vertex>,
    max_size: usize,
}

impl BinaryHeap {
    pub fn with_capacity(reserve_size: usize) -> Self {
        Self {
            slots: Vec::with_capacity(reserve_size.max(1)),
            max_size: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Peak number of simultaneously held entries.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Distance at the root, or `DIST_INFINITY` when empty. Queued entries
    /// always carry a finite distance, so the sentinel is unambiguous.
    pub fn top_dist(&self, records: &[VertexRecord]) -> Dist {
        match self.slots.first() {
            Some(&v) => records[v].dist(),
            None => DIST_INFINITY,
        }
    }

    pub fn push(&mut self, records: &[VertexRecord], v: Vertex) {
        if self.slots.len() == self.slots.capacity() {
            // grow 4x to keep reallocation off the relaxation path
            self.slots.reserve(self.slots.capacity().max(1) * 3);
        }
        self.slots.push(v);
        let tail = self.slots.len() - 1;
        records[v].set_slot(tail);
        self.max_size = self.max_size.max(self.slots.len());
        self.sift_up(records, tail);
    }

    pub fn pop(&mut self, records: &[VertexRecord]) -> Option<Vertex> {
        let top = *self.slots.first()?;
        records[top].set_slot(INVALID_SLOT);
        let tail = self.slots.pop()?;
        if !self.slots.is_empty() {
            self.slots[0] = tail;
            records[tail].set_slot(0);
            self.sift_down(records, 0);
        }
        Some(top)
    }

    /// Lowers `v`'s key to `new_dist` and restores heap order from its slot.
    /// A no-op unless the new distance is strictly smaller.
    pub fn decrease_key(&mut self, records: &[VertexRecord], v: Vertex, new_dist: Dist) {
        if new_dist < records[v].dist() {
            records[v].store_dist(new_dist);
            self.sift_up(records, records[v].slot());
        }
    }

    fn dist_at(&self, records: &[VertexRecord], i: usize) -> Dist {
        records[self.slots[i]].dist()
    }

    fn swap(&mut self, records: &[VertexRecord], i: usize, j: usize) {
        self.slots.swap(i, j);
        records[self.slots[i]].set_slot(i);
        records[self.slots[j]].set_slot(j);
    }

    fn sift_up(&mut self, records: &[VertexRecord], mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.dist_at(records, i) >= self.dist_at(records, parent) {
                break;
            }
            self.swap(records, i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, records: &[VertexRecord], mut i: usize) {
        loop {
            let left = i * 2 + 1;
            if left >= self.slots.len() {
                break;
            }
            let right = left + 1;
            let smaller = if right < self.slots.len()
                && self.dist_at(records, right) < self.dist_at(records, left)
            {
                right
            } else {
                left
            };
            if self.dist_at(records, i) <= self.dist_at(records, smaller) {
                break;
            }
            self.swap(records, i, smaller);
            i = smaller;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::new_records;

    fn arena_with_dists(dists: &[Dist]) -> Vec<VertexRecord> {
        let records = new_records(dists.len());
        for (record, &dist) in records.iter().zip(dists) {
            record.store_dist(dist);
        }
        records
    }

    fn assert_slots_consistent(heap: &BinaryHeap, records: &[VertexRecord]) {
        for (i, &v) in heap.slots.iter().enumerate() {
            assert_eq!(records[v].slot(), i, "stale slot index for vertex {v}");
        }
    }

    #[test]
    fn pops_in_distance_order() {
        let records = arena_with_dists(&[9, 3, 7, 1, 5]);
        let mut heap = BinaryHeap::with_capacity(2);
        for v in 0..records.len() {
            heap.push(&records, v);
            assert_slots_consistent(&heap, &records);
        }
        assert_eq!(heap.max_size(), 5);
        let mut popped = Vec::new();
        while let Some(v) = heap.pop(&records) {
            popped.push(records[v].dist());
            assert_eq!(records[v].slot(), INVALID_SLOT);
            assert_slots_consistent(&heap, &records);
        }
        assert_eq!(popped, vec![1, 3, 5, 7, 9]);
        assert_eq!(heap.top_dist(&records), DIST_INFINITY);
    }

    #[test]
    fn decrease_key_reorders_in_place() {
        let records = arena_with_dists(&[10, 20, 30, 40]);
        let mut heap = BinaryHeap::with_capacity(4);
        for v in 0..records.len() {
            heap.push(&records, v);
        }
        heap.decrease_key(&records, 3, 5);
        assert_slots_consistent(&heap, &records);
        assert_eq!(heap.top_dist(&records), 5);
        assert_eq!(heap.pop(&records), Some(3));

        // raising is a no-op
        heap.decrease_key(&records, 0, 99);
        assert_eq!(records[0].dist(), 10);
        assert_eq!(heap.pop(&records), Some(0));
    }

    #[test]
    fn push_beyond_reserve_grows() {
        let records = arena_with_dists(&[4, 2, 8, 6, 1, 3, 9, 5, 7]);
        let mut heap = BinaryHeap::with_capacity(1);
        for v in 0..records.len() {
            heap.push(&records, v);
        }
        assert_eq!(heap.len(), 9);
        assert_eq!(heap.top_dist(&records), 1);
    }
}
