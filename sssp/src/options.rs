use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Parser;

use crate::Variant;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct SsspCli {
    /// Path prefix of the input graph; `<prefix>.in` holds the edge list
    #[arg(short, long)]
    pub graph_file: Option<String>,

    /// Interpret the input file as a row-major adjacency matrix
    #[arg(long, default_value_t = false)]
    pub adj_matrix: bool,

    /// Offset applied to vertex ids in edge lists (1-based inputs use -1)
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    pub vertex_offset: i64,

    /// File of whitespace-separated (num_threads, size_multiple) pairs
    #[arg(short, long)]
    pub params_file: Option<PathBuf>,

    /// Worker thread counts; crossed with --size-multiple when no params file
    #[arg(short = 't', long, value_delimiter = ',')]
    pub num_threads: Vec<usize>,

    /// Heaps per worker thread for the multiqueue runs
    #[arg(short = 'm', long, value_delimiter = ',', default_values_t = vec![4])]
    pub size_multiple: Vec<usize>,

    /// Initial capacity reserved in each heap
    #[arg(short, long, default_value_t = 256)]
    pub reserve_size: usize,

    /// Try a few unlocked heaps before blocking on an insert
    #[arg(long, default_value_t = false)]
    pub use_try_lock: bool,

    /// Pin workers one per core (best effort)
    #[arg(long, default_value_t = false)]
    pub pin_threads: bool,

    /// Repetitions of every configuration
    #[arg(short, long, default_value_t = 1)]
    pub iterations: usize,

    /// Synthesize a layered graph of this size instead of reading a file
    #[arg(long, default_value_t = 0)]
    pub gen_graph_size: usize,

    /// Mirror every edge of the synthesized graph
    #[arg(long, default_value_t = false)]
    pub gen_bidirected: bool,

    /// Edge weight of the synthesized graph
    #[arg(long, default_value_t = 1)]
    pub gen_weight: i32,

    /// Queue variants to run; the sequential reference always runs first
    #[arg(value_enum, short, long, value_delimiter = ',')]
    pub variants: Option<Vec<Variant>>,

    /// Append a JSON-lines record of this invocation
    #[arg(long)]
    pub record_file: Option<PathBuf>,
}

impl SsspCli {
    pub fn describe(&self) {
        match &self.graph_file {
            Some(prefix) => println!("graph file: {prefix}.in"),
            None => println!("graph file: <generated>"),
        }
        println!("gen graph size: {}", self.gen_graph_size);
        println!("num threads: {:?}", self.num_threads);
        println!("size multiple: {:?}", self.size_multiple);
        println!("reserve size: {}", self.reserve_size);
        println!("use try lock: {}", self.use_try_lock);
        println!("pin threads: {}", self.pin_threads);
        println!("iterations: {}", self.iterations);
        println!("variants: {:?}", self.variants);
    }

    /// The `(num_threads, size_multiple)` pairs to benchmark: the params file
    /// verbatim when given, otherwise the cross product of the two lists
    /// (thread count defaulting to the machine's parallelism).
    pub fn thread_params(&self) -> Result<Vec<(usize, usize)>, Box<dyn Error>> {
        if let Some(path) = &self.params_file {
            let text = fs::read_to_string(path)?;
            let values = text
                .split_whitespace()
                .map(str::parse::<usize>)
                .collect::<Result<Vec<usize>, _>>()?;
            if values.is_empty() || values.len() % 2 != 0 {
                return Err("params file must hold (num_threads, size_multiple) pairs".into());
            }
            return Ok(values.chunks(2).map(|pair| (pair[0], pair[1])).collect());
        }

        let threads = if self.num_threads.is_empty() {
            vec![std::thread::available_parallelism().map_or(1, |n| n.get())]
        } else {
            self.num_threads.clone()
        };
        let mut params = Vec::new();
        for &num_threads in &threads {
            for &size_multiple in &self.size_multiple {
                params.push((num_threads, size_multiple));
            }
        }
        Ok(params)
    }
}
