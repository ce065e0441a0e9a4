use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crate::graph::{AdjList, Dist, Vertex};
use crate::queue::VertexQueue;
use crate::vertex::{self, VertexRecord};

/// Distances plus the counters the driver reports after a run.
pub struct SsspRunStats {
    pub dists: Vec<Dist>,
    pub vertex_pulls: Vec<usize>,
    pub num_pushes: usize,
    pub max_queue_sizes: Vec<usize>,
}

/// Computes single-source shortest distances with `num_threads` workers
/// sharing `queue`. The caller keeps ownership of the queue and can inspect
/// its counters afterwards.
pub fn calc_sssp<Q: VertexQueue>(
    graph: &AdjList,
    source: Vertex,
    num_threads: usize,
    queue: &mut Q,
    pin_threads: bool,
) -> SsspRunStats {
    let num_vertexes = graph.len();
    let records = vertex::new_records(num_vertexes);
    queue.push_singlethreaded(&records, source, 0);

    let pull_counts = vertex::counter_vec(num_vertexes);
    let active = AtomicUsize::new(num_threads);
    let core_ids = if pin_threads {
        core_affinity::get_core_ids().unwrap_or_default()
    } else {
        Vec::new()
    };

    let queue: &Q = queue;
    thread::scope(|scope| {
        for thread_id in 0..num_threads {
            let core_id = core_ids.get(thread_id).copied();
            let records = &records;
            let pull_counts = &pull_counts;
            let active = &active;
            scope.spawn(move || {
                if let Some(core_id) = core_id {
                    // best effort; an unpinned worker is still correct
                    core_affinity::set_for_current(core_id);
                }
                worker(graph, queue, records, pull_counts, active);
            });
        }
    });

    SsspRunStats {
        dists: vertex::take_dists(&records),
        vertex_pulls: vertex::take_counters(pull_counts),
        num_pushes: queue.num_pushes(),
        max_queue_sizes: queue.max_queue_sizes(),
    }
}

fn worker<Q: VertexQueue>(
    graph: &AdjList,
    queue: &Q,
    records: &[VertexRecord],
    pull_counts: &[AtomicUsize],
    active: &AtomicUsize,
) {
    loop {
        let Some(v) = queue.pop(records) else {
            if wait_for_work(queue, active) {
                continue;
            }
            return;
        };
        let dist = records[v].dist();
        pull_counts[v].fetch_add(1, Ordering::Relaxed);
        for edge in &graph[v] {
            if edge.to == v {
                continue;
            }
            let new_dist = dist.saturating_add(edge.weight);
            if new_dist < records[edge.to].dist() {
                queue.push(records, edge.to, new_dist);
            }
        }
    }
}

/// Quiescence detection. An empty pop is not proof that the computation is
/// done: a worker that is still relaxing may yet push. Each idle worker
/// leaves the active set, then waits until either queued work reappears
/// (rejoin) or every worker has gone idle with nothing queued (quiescent, so
/// nobody can produce work again). Returns true to resume, false to exit.
fn wait_for_work<Q: VertexQueue>(queue: &Q, active: &AtomicUsize) -> bool {
    active.fetch_sub(1, Ordering::SeqCst);
    loop {
        if queue.pending() > 0 {
            active.fetch_add(1, Ordering::SeqCst);
            return true;
        }
        if active.load(Ordering::SeqCst) == 0 {
            return false;
        }
        std::hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{gen_layer_graph, Edge, DIST_INFINITY};
    use crate::multiqueue::MultiQueue;
    use crate::queue::BlockingQueue;
    use crate::sssp_serial::calc_sssp_sequential;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn adj_list(num_vertexes: usize, edges: &[(Vertex, Vertex, Dist)]) -> AdjList {
        let mut graph: AdjList = vec![Vec::new(); num_vertexes];
        for &(from, to, weight) in edges {
            graph[from].push(Edge { to, weight });
        }
        graph
    }

    fn run_multi(graph: &AdjList, num_threads: usize, size_multiple: usize) -> SsspRunStats {
        let mut queue = MultiQueue::new(num_threads, size_multiple, 16, false);
        calc_sssp(graph, 0, num_threads, &mut queue, false)
    }

    #[test]
    fn single_vertex() {
        let graph = adj_list(1, &[]);
        assert_eq!(run_multi(&graph, 2, 2).dists, vec![0]);
    }

    #[test]
    fn disconnected_vertex_stays_unreached() {
        let graph = adj_list(3, &[(0, 1, 5)]);
        let stats = run_multi(&graph, 2, 2);
        assert_eq!(stats.dists, vec![0, 5, DIST_INFINITY]);
        // unreached vertices are never pulled
        assert_eq!(stats.vertex_pulls[2], 0);
    }

    #[test]
    fn chain() {
        let graph = adj_list(4, &[(0, 1, 1), (1, 2, 2), (2, 3, 3)]);
        assert_eq!(run_multi(&graph, 2, 2).dists, vec![0, 1, 3, 6]);
    }

    #[test]
    fn diamond_with_tie() {
        let graph = adj_list(4, &[(0, 1, 1), (0, 2, 1), (1, 3, 2), (2, 3, 2)]);
        assert_eq!(run_multi(&graph, 4, 2).dists, vec![0, 1, 1, 3]);
    }

    #[test]
    fn self_loop_is_ignored() {
        let graph = adj_list(2, &[(0, 0, 10), (0, 1, 1)]);
        assert_eq!(run_multi(&graph, 2, 2).dists, vec![0, 1]);
    }

    #[test]
    fn layered_graph_distances() {
        let graph = gen_layer_graph(100, false, 1);
        let stats = run_multi(&graph, 4, 4);
        assert_eq!(stats.dists[0], 0);
        assert_eq!(stats.dists[101], 11);
        for layer in 0..10 {
            for v in 1 + layer * 10..1 + (layer + 1) * 10 {
                assert_eq!(stats.dists[v], layer as Dist + 1);
            }
        }
    }

    #[test]
    fn blocking_queue_agrees_on_chain() {
        let graph = adj_list(4, &[(0, 1, 1), (1, 2, 2), (2, 3, 3)]);
        let mut queue = BlockingQueue::new();
        let stats = calc_sssp(&graph, 0, 3, &mut queue, false);
        assert_eq!(stats.dists, vec![0, 1, 3, 6]);
    }

    #[test]
    fn pull_accounting_holds() {
        let graph = gen_layer_graph(100, false, 1);
        let stats = run_multi(&graph, 4, 4);
        let pulls: usize = stats.vertex_pulls.iter().sum();
        assert!(stats.num_pushes >= pulls, "pushes can only exceed pulls");
        for (v, &dist) in stats.dists.iter().enumerate() {
            if dist < DIST_INFINITY {
                assert!(stats.vertex_pulls[v] >= 1, "reached vertex {v} never pulled");
            }
        }
    }

    fn random_graph(num_vertexes: usize, num_edges: usize, seed: u64) -> AdjList {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut graph: AdjList = vec![Vec::new(); num_vertexes];
        // a backbone keeps most of the graph reachable from the source
        for v in 1..num_vertexes {
            let from = rng.gen_range(0..v);
            graph[from].push(Edge {
                to: v,
                weight: rng.gen_range(1..=100),
            });
        }
        for _ in 0..num_edges {
            let from = rng.gen_range(0..num_vertexes);
            let to = rng.gen_range(0..num_vertexes);
            graph[from].push(Edge {
                to,
                weight: rng.gen_range(1..=100),
            });
        }
        graph
    }

    #[test]
    fn random_stress_matches_sequential_reference() {
        for seed in 0..3 {
            let graph = random_graph(2000, 12_000, seed);
            let expected = calc_sssp_sequential(&graph, 0).dists;
            let stats = run_multi(&graph, 4, 4);
            assert_eq!(stats.dists, expected, "divergence with seed {seed}");
        }
    }

    #[test]
    #[ignore = "large; run with --ignored"]
    fn large_random_stress_matches_sequential_reference() {
        let graph = random_graph(100_000, 600_000, 1);
        let expected = calc_sssp_sequential(&graph, 0).dists;
        let stats = run_multi(&graph, 8, 4);
        assert_eq!(stats.dists, expected);
    }

    #[test]
    fn rerun_is_deterministic_in_result() {
        let graph = random_graph(500, 3_000, 42);
        let first = run_multi(&graph, 4, 2).dists;
        let second = run_multi(&graph, 4, 2).dists;
        assert_eq!(first, second);
    }

    #[test]
    fn try_lock_variant_matches_reference() {
        let graph = random_graph(1000, 6_000, 7);
        let expected = calc_sssp_sequential(&graph, 0).dists;
        let mut queue = MultiQueue::new(4, 2, 16, true);
        let stats = calc_sssp(&graph, 0, 4, &mut queue, false);
        assert_eq!(stats.dists, expected);
    }

    #[test]
    fn queue_is_drained_after_run() {
        let graph = gen_layer_graph(64, false, 1);
        let mut queue = MultiQueue::new(3, 2, 8, false);
        let _stats = calc_sssp(&graph, 0, 3, &mut queue, false);
        assert_eq!(queue.pending(), 0);
    }
}
