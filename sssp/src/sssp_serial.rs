use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::graph::{AdjList, Vertex, DIST_INFINITY};
use crate::sssp_parallel::SsspRunStats;

/// Reference Dijkstra over a scalar priority queue. Duplicates are left in
/// the queue and filtered by the `removed` markers. Ground truth for every
/// parallel variant.
pub fn calc_sssp_sequential(graph: &AdjList, source: Vertex) -> SsspRunStats {
    let num_vertexes = graph.len();
    let mut dists = vec![DIST_INFINITY; num_vertexes];
    let mut removed = vec![false; num_vertexes];
    let mut vertex_pulls = vec![0usize; num_vertexes];
    let mut queue: BinaryHeap<Reverse<(crate::graph::Dist, Vertex)>> = BinaryHeap::new();
    let mut num_pushes = 1usize;
    let mut max_size = 0usize;

    dists[source] = 0;
    queue.push(Reverse((0, source)));
    while let Some(Reverse((dist, from))) = queue.pop() {
        if removed[from] {
            continue;
        }
        removed[from] = true;
        vertex_pulls[from] += 1;
        for edge in &graph[from] {
            let new_dist = dist.saturating_add(edge.weight);
            if new_dist < dists[edge.to] {
                dists[edge.to] = new_dist;
                queue.push(Reverse((new_dist, edge.to)));
                num_pushes += 1;
                max_size = max_size.max(queue.len());
            }
        }
    }

    SsspRunStats {
        dists,
        vertex_pulls,
        num_pushes,
        max_queue_sizes: vec![max_size],
    }
}
