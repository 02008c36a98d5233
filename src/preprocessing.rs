//! Preprocessing: one-to-all shortest paths, negative-cycle detection and
//! the critical-resource selection heuristic.
//!
//! Everything here is Bellman-Ford based so that negative arc weights are
//! handled; the relaxation sweeps run over the flat arc table.

use crate::graph::{Arc, DiGraph, VertexId};
use crate::options::Direction;

/// One-to-all Bellman-Ford distances from `origin` under `weight`.
/// With `reversed` every arc is traversed head to tail, which turns the
/// result into distances *towards* `origin`.
fn bellman_ford(
    graph: &DiGraph,
    origin: VertexId,
    reversed: bool,
    weight: impl Fn(&Arc) -> f64,
) -> Vec<f64> {
    let n = graph.num_vertices();
    let mut dist = vec![f64::INFINITY; n];
    dist[origin] = 0.0;
    for _ in 1..n.max(2) {
        let mut changed = false;
        for arc in graph.arcs() {
            let (from, to) = if reversed {
                (arc.head, arc.tail)
            } else {
                (arc.tail, arc.head)
            };
            let candidate = dist[from] + weight(arc);
            if candidate < dist[to] {
                dist[to] = candidate;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    dist
}

/// True when a negative-cost cycle is reachable from `source`.
pub(crate) fn has_negative_cycle(graph: &DiGraph, source: VertexId) -> bool {
    let dist = bellman_ford(graph, source, false, |a| a.weight);
    graph
        .arcs()
        .iter()
        .any(|a| dist[a.tail] + a.weight < dist[a.head])
}

/// Admissible completion bounds for one search direction: the cost still
/// needed to finish a path from each vertex. The forward search therefore
/// gets distances to the sink (Bellman-Ford from the sink over reversed
/// arcs) and the backward search distances from the source.
pub(crate) fn lower_bound_weights(
    graph: &DiGraph,
    direction: Direction,
    source: VertexId,
    sink: VertexId,
) -> Vec<f64> {
    match direction {
        Direction::Backward => bellman_ford(graph, source, false, |a| a.weight),
        _ => bellman_ford(graph, sink, true, |a| a.weight),
    }
}

/// Pick the resource whose worst-case consumption between source and sink
/// comes closest to its upper bound: solve a longest path per resource
/// (Bellman-Ford on negated consumptions, capped at n-1 sweeps) and take
/// the largest `|longest| - max_res[r]`.
pub(crate) fn critical_resource(
    graph: &DiGraph,
    max_res: &[f64],
    source: VertexId,
    sink: VertexId,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (r, &cap) in max_res.iter().enumerate() {
        let dist = bellman_ford(graph, source, false, |a| -a.resources[r]);
        if !dist[sink].is_finite() {
            continue;
        }
        let longest = -dist[sink];
        let score = longest.abs() - cap;
        match best {
            Some((_, incumbent)) if incumbent >= score => {}
            _ => best = Some((r, score)),
        }
    }
    best.map(|(r, _)| r)
}
