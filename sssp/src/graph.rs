use std::error::Error;
use std::io::{BufRead, Read};

pub type Vertex = usize;
pub type Dist = i32;

/// Tentative distance of an unreached vertex.
pub const DIST_INFINITY: Dist = i32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub to: Vertex,
    pub weight: Dist,
}

pub type AdjList = Vec<Vec<Edge>>;

fn next_token<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Result<i64, Box<dyn Error>> {
    let token = tokens.next().ok_or("unexpected end of graph input")?;
    Ok(token.parse::<i64>()?)
}

fn checked_vertex(raw: i64, num_vertexes: usize) -> Result<Vertex, Box<dyn Error>> {
    if raw < 0 || raw as usize >= num_vertexes {
        return Err(format!("vertex id {raw} out of range (n = {num_vertexes})").into());
    }
    Ok(raw as Vertex)
}

/// Reads `V E` followed by `E` whitespace-separated `from to weight` triples.
/// `vertex_offset` translates the file's numeration (1-based inputs use -1).
/// Edges with non-positive weight are discarded.
pub fn read_edge_list<R: BufRead>(
    mut input: R,
    vertex_offset: i64,
) -> Result<AdjList, Box<dyn Error>> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    let mut tokens = text.split_whitespace();

    let num_vertexes = next_token(&mut tokens)? as usize;
    let num_edges = next_token(&mut tokens)? as usize;
    eprintln!("n = {num_vertexes}, m = {num_edges}");

    let mut adj_list: AdjList = vec![Vec::new(); num_vertexes];
    for _ in 0..num_edges {
        let from = next_token(&mut tokens)?;
        let to = next_token(&mut tokens)?;
        let weight = next_token(&mut tokens)?;
        if weight <= 0 {
            continue;
        }
        let from = checked_vertex(from + vertex_offset, num_vertexes)?;
        let to = checked_vertex(to + vertex_offset, num_vertexes)?;
        adj_list[from].push(Edge {
            to,
            weight: Dist::try_from(weight)?,
        });
    }
    Ok(adj_list)
}

/// Reads `V` followed by `V*V` row-major weights; zero entries are absent edges.
pub fn read_adj_matrix<R: BufRead>(mut input: R) -> Result<AdjList, Box<dyn Error>> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    let mut tokens = text.split_whitespace();

    let num_vertexes = next_token(&mut tokens)? as usize;
    let mut adj_list: AdjList = vec![Vec::new(); num_vertexes];
    for from in 0..num_vertexes {
        for to in 0..num_vertexes {
            let weight = next_token(&mut tokens)?;
            if weight == 0 {
                continue;
            }
            adj_list[from].push(Edge {
                to,
                weight: Dist::try_from(weight)?,
            });
        }
    }
    Ok(adj_list)
}

/// Synthesizes a layered graph: `sqrt(n)` layers of `sqrt(n)` vertices between
/// a source (vertex 0) and a sink (vertex V-1), every layer fully connected to
/// the next, all edges carrying `weight`.
pub fn gen_layer_graph(n: usize, bidirected: bool, weight: Dist) -> AdjList {
    let sqrt_n = (n as f64).sqrt() as usize;
    if sqrt_n == 0 {
        return vec![Vec::new(); 2];
    }
    let num_vertexes = sqrt_n * sqrt_n + 2;
    let source = 0;
    let sink = num_vertexes - 1;
    let mut graph: AdjList = vec![Vec::new(); num_vertexes];

    let first_layer = 1;
    for to in first_layer..first_layer + sqrt_n {
        graph[source].push(Edge { to, weight });
        if bidirected {
            graph[to].push(Edge { to: source, weight });
        }
    }
    for layer in 0..sqrt_n - 1 {
        let cur_layer = 1 + layer * sqrt_n;
        let next_layer = 1 + (layer + 1) * sqrt_n;
        for from in cur_layer..cur_layer + sqrt_n {
            for to in next_layer..next_layer + sqrt_n {
                graph[from].push(Edge { to, weight });
                if bidirected {
                    graph[to].push(Edge { to: from, weight });
                }
            }
        }
    }
    let last_layer = 1 + (sqrt_n - 1) * sqrt_n;
    for from in last_layer..last_layer + sqrt_n {
        graph[from].push(Edge { to: sink, weight });
        if bidirected {
            graph[sink].push(Edge { to: from, weight });
        }
    }
    graph
}
