mod binary_heap;
mod graph;
mod multiqueue;
mod options;
mod printer;
mod queue;
mod sssp_parallel;
mod sssp_serial;
mod vertex;

use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::process;
use std::time::Instant;

use clap::{Parser, ValueEnum};

use benchmark_record::RunRecord;
use graph::{AdjList, Dist, Vertex};
use multiqueue::MultiQueue;
use options::SsspCli;
use queue::BlockingQueue;
use sssp_parallel::{calc_sssp, SsspRunStats};
use sssp_serial::calc_sssp_sequential;

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Variant {
    Sequential,
    Regular,
    Blocking,
    Multi,
}

const START_VERTEX: Vertex = 0;

fn main() {
    let cli = SsspCli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run(cli: &SsspCli) -> Result<(), Box<dyn Error>> {
    if cli.graph_file.is_none() && cli.gen_graph_size == 0 {
        return Err("either --graph-file or --gen-graph-size is required".into());
    }
    if cli.iterations == 0 {
        return Err("--iterations must be positive".into());
    }
    cli.describe();

    let graph = load_graph(cli)?;
    let params = cli.thread_params()?;
    if params.iter().any(|&(t, m)| t == 0 || m == 0) {
        return Err("num_threads and size_multiple must be positive".into());
    }
    let variants = cli
        .variants
        .clone()
        .unwrap_or_else(|| vec![Variant::Sequential, Variant::Multi]);

    let mut session = Session {
        cli,
        graph: &graph,
        reference: None,
        impl_index: 0,
        record: cli.record_file.as_ref().map(|_| {
            let mut record = RunRecord::for_current_exe();
            record.add_output("num_vertexes", graph.len());
            record
        }),
    };

    // implementation 0 is always the sequential reference
    session.run_config("Sequential", || calc_sssp_sequential(&graph, START_VERTEX));
    for variant in variants {
        match variant {
            Variant::Sequential => {} // the reference already ran
            Variant::Regular => {
                session.run_config("RegularQueue", || {
                    let mut queue = BlockingQueue::new();
                    calc_sssp(&graph, START_VERTEX, 1, &mut queue, cli.pin_threads)
                });
            }
            Variant::Blocking => {
                for &(num_threads, _) in &params {
                    let name = format!("BlockingQueue {num_threads}");
                    session.run_config(&name, || {
                        let mut queue = BlockingQueue::new();
                        calc_sssp(&graph, START_VERTEX, num_threads, &mut queue, cli.pin_threads)
                    });
                }
            }
            Variant::Multi => {
                for &(num_threads, size_multiple) in &params {
                    let name = format!("Multiqueue {num_threads} {size_multiple}");
                    session.run_config(&name, || {
                        let mut queue = MultiQueue::new(
                            num_threads,
                            size_multiple,
                            cli.reserve_size,
                            cli.use_try_lock,
                        );
                        calc_sssp(&graph, START_VERTEX, num_threads, &mut queue, cli.pin_threads)
                    });
                }
            }
        }
    }

    if let (Some(record), Some(path)) = (session.record, &cli.record_file) {
        record.append_to(path)?;
    }
    Ok(())
}

fn load_graph(cli: &SsspCli) -> Result<AdjList, Box<dyn Error>> {
    if cli.gen_graph_size > 0 {
        return Ok(graph::gen_layer_graph(
            cli.gen_graph_size,
            cli.gen_bidirected,
            cli.gen_weight,
        ));
    }
    let Some(prefix) = cli.graph_file.as_deref() else {
        return Err("no graph source given".into());
    };
    let path = format!("{prefix}.in");
    eprintln!("Reading {path}");
    let start = Instant::now();
    let input = BufReader::new(File::open(&path)?);
    let graph = if cli.adj_matrix {
        graph::read_adj_matrix(input)?
    } else {
        graph::read_edge_list(input, cli.vertex_offset)?
    };
    eprintln!("Reading elapsed time: {:.3} s", start.elapsed().as_secs_f64());
    Ok(graph)
}

struct Session<'a> {
    cli: &'a SsspCli,
    graph: &'a AdjList,
    /// Distances of implementation 0; later runs are compared against it.
    reference: Option<Vec<Dist>>,
    impl_index: usize,
    record: Option<RunRecord>,
}

impl Session<'_> {
    fn run_config<F: FnMut() -> SsspRunStats>(&mut self, name: &str, mut run: F) {
        let mut times = Vec::with_capacity(self.cli.iterations);
        for _ in 0..self.cli.iterations {
            let start = Instant::now();
            let stats = run();
            let elapsed = start.elapsed();
            times.push(elapsed);
            printer::print_run(name, elapsed, &stats, self.graph);
            if let Some(record) = &mut self.record {
                record.add_output(
                    &format!("run {} ({name}) secs", self.impl_index),
                    format!("{:.6}", elapsed.as_secs_f64()),
                );
            }
            self.check(name, &stats);
            self.impl_index += 1;
        }
        if self.cli.iterations > 1 {
            printer::print_summary(name, &times);
        }
    }

    /// The first run pins the expected answer; any later divergence is
    /// reported and dumped, and the benchmark keeps going.
    fn check(&mut self, name: &str, stats: &SsspRunStats) {
        let Some(reference) = &self.reference else {
            self.reference = Some(stats.dists.clone());
            return;
        };
        if let Some(v) = printer::mismatch_vertex(reference, &stats.dists) {
            eprintln!(
                "Mismatch in {name} at vertex {v}: {} != {}",
                stats.dists[v], reference[v]
            );
            let prefix = self.cli.graph_file.as_deref().unwrap_or("sssp");
            let path = format!("{prefix}.out{}", self.impl_index);
            match printer::write_answer(Path::new(&path), &stats.dists) {
                Ok(()) => eprintln!("Wrote diverging distances to {path}"),
                Err(err) => eprintln!("Failed to write {path}: {err}"),
            }
        }
    }
}
