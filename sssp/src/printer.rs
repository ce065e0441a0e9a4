use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::graph::{AdjList, Dist};
use crate::sssp_parallel::SsspRunStats;

/// Per-run report of how expensive the relaxed ordering was: pull overhead
/// counts repeated settlements, useless pushes count superseded offers, edge
/// overhead weights the repeats by out-degree.
pub fn print_run(name: &str, elapsed: Duration, stats: &SsspRunStats, graph: &AdjList) {
    let num_vertexes = graph.len();
    let pulls: usize = stats.vertex_pulls.iter().sum();
    let overhead = pulls as f64 / num_vertexes.max(1) as f64;
    let useless_pushes = stats.num_pushes.saturating_sub(pulls);

    let total_edges: usize = graph.iter().map(|edges| edges.len()).sum();
    let edges_accessed: usize = stats
        .vertex_pulls
        .iter()
        .zip(graph)
        .map(|(&pulls, edges)| pulls * edges.len())
        .sum();
    let weighted_overhead = edges_accessed as f64 / total_edges.max(1) as f64;
    let max_queue_size = stats.max_queue_sizes.iter().copied().max().unwrap_or(0);

    eprintln!("{name} elapsed time: {:.6} s", elapsed.as_secs_f64());
    eprintln!("Pulls: {pulls} ({overhead:.3}x)");
    eprintln!("Pushes: {}", stats.num_pushes);
    eprintln!("Useless pushes: {useless_pushes}");
    eprintln!("Edges accessed: {edges_accessed} ({weighted_overhead:.3}x)");
    eprintln!("Max queue size: {max_queue_size}");
    eprintln!();
}

/// Cross-iteration summary for one configuration.
pub fn print_summary(name: &str, times: &[Duration]) {
    if times.is_empty() {
        return;
    }
    let secs = times.iter().map(Duration::as_secs_f64).collect::<Vec<f64>>();
    eprintln!(
        "summary: {name} {secs:<6.6?} min: {:<6.6} avg: {:<6.6} max: {:<6.6}",
        secs.iter().fold(f64::INFINITY, |a, &b| a.min(b)),
        secs.iter().sum::<f64>() / secs.len() as f64,
        secs.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b))
    );
}

/// Index of the first disagreeing vertex, if any.
pub fn mismatch_vertex(reference: &[Dist], dists: &[Dist]) -> Option<usize> {
    reference
        .iter()
        .zip(dists)
        .position(|(expected, got)| expected != got)
}

/// Writes one distance per line (the mismatch dump format).
pub fn write_answer(path: &Path, dists: &[Dist]) -> io::Result<()> {
    let mut output = BufWriter::new(File::create(path)?);
    for dist in dists {
        writeln!(output, "{dist}")?;
    }
    writeln!(output)?;
    output.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn mismatch_position() {
        assert_eq!(mismatch_vertex(&[0, 1, 2], &[0, 1, 2]), None);
        assert_eq!(mismatch_vertex(&[0, 1, 2], &[0, 9, 2]), Some(1));
    }

    #[test]
    fn answer_round_trips() {
        let dists = vec![0, 5, Dist::MAX, 42];
        let path = std::env::temp_dir().join("sssp_answer_round_trip.out0");
        write_answer(&path, &dists).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let reread = text
            .split_whitespace()
            .map(|token| token.parse::<Dist>().unwrap())
            .collect::<Vec<Dist>>();
        assert_eq!(reread, dists);
        fs::remove_file(&path).ok();
    }
}
