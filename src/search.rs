//! Per-direction search state.
//!
//! Each direction owns a label arena, a heap of unprocessed labels keyed by
//! the critical resource (ascending forward, descending backward), the
//! per-vertex buckets of Pareto-efficient labels, the per-vertex best-label
//! pointers and the bookkeeping counters. The bidirectional driver in
//! [`crate::engine`] owns one or two of these and alternates between them.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use crate::graph::VertexId;
use crate::label::{dominates, feasible, Label, LabelId, PathLabel};
use crate::options::Direction;
use crate::utils::VertexSet;

/// Heap entry ordered by the critical-resource key with FIFO tie-breaking.
#[derive(Debug, PartialEq, Eq)]
struct HeapEntry {
    key: OrderedFloat<f64>,
    seq: u64,
    id: LabelId,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap on the key; on ties the earlier insertion wins.
        self.key
            .cmp(&other.key)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug)]
pub(crate) struct Search {
    pub direction: Direction,
    /// Seed vertex of this direction (source forward, sink backward).
    pub origin: VertexId,
    /// Opposite terminal; reaching it completes a source-sink path.
    pub terminus: VertexId,
    arena: Vec<Label>,
    heap: BinaryHeap<HeapEntry>,
    seq: u64,
    /// Pareto bucket per vertex.
    pub efficient: Vec<Vec<LabelId>>,
    /// Least-weight globally feasible label per vertex.
    pub best: Vec<Option<LabelId>>,
    pub visited: Vec<bool>,
    pub generated: usize,
    pub processed: usize,
    pub stop: bool,
    /// Admissible completion bound per vertex (zeros unless bounds pruning
    /// filled them in).
    pub lower_bound: Vec<f64>,
    pub intermediate: Option<LabelId>,
    critical: usize,
    elementary: bool,
    max_res: Vec<f64>,
    min_res: Vec<f64>,
}

impl Search {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        direction: Direction,
        num_vertices: usize,
        origin: VertexId,
        terminus: VertexId,
        critical: usize,
        elementary: bool,
        max_res: Vec<f64>,
        min_res: Vec<f64>,
        lower_bound: Vec<f64>,
    ) -> Self {
        Self {
            direction,
            origin,
            terminus,
            arena: Vec::new(),
            heap: BinaryHeap::new(),
            seq: 0,
            efficient: vec![Vec::new(); num_vertices],
            best: vec![None; num_vertices],
            visited: vec![false; num_vertices],
            generated: 0,
            processed: 0,
            stop: false,
            lower_bound,
            intermediate: None,
            critical,
            elementary,
            max_res,
            min_res,
        }
    }

    /// Install the direction's initial label at its origin.
    pub fn seed(&mut self, resources: Vec<f64>) {
        let unreachable = self.elementary.then(|| {
            let mut set = VertexSet::with_capacity(self.visited.len());
            set.insert(self.origin);
            set
        });
        let label = Label {
            weight: 0.0,
            vertex: self.origin,
            resources,
            parent: None,
            unreachable,
        };
        let id = self.alloc(label);
        self.push_heap(id);
        self.efficient[self.origin].push(id);
        self.best[self.origin] = Some(id);
        self.visited[self.origin] = true;
    }

    #[inline]
    pub fn label(&self, id: LabelId) -> &Label {
        &self.arena[id as usize]
    }

    pub fn unprocessed(&self) -> usize {
        self.heap.len()
    }

    /// Pop the most advanced unprocessed label along the critical
    /// coordinate, or `None` when the heap is exhausted.
    pub fn pop(&mut self) -> Option<LabelId> {
        self.heap.pop().map(|e| e.id)
    }

    /// Record `vertex` as an infeasible extension of `id` (elementary mode).
    pub fn mark_unreachable(&mut self, id: LabelId, vertex: VertexId) {
        if let Some(set) = self.arena[id as usize].unreachable.as_mut() {
            set.insert(vertex);
        }
    }

    /// Vertex preceding `id`'s endpoint on its partial path, if any.
    pub fn prev_vertex(&self, id: LabelId) -> Option<VertexId> {
        self.label(id).parent.map(|p| self.label(p).vertex)
    }

    /// Reconstruct the partial path of `id`, origin first.
    pub fn path_of(&self, id: LabelId) -> Vec<VertexId> {
        let mut path = Vec::new();
        let mut cursor = Some(id);
        while let Some(cur) = cursor {
            let label = self.label(cur);
            path.push(label.vertex);
            cursor = label.parent;
        }
        path.reverse();
        path
    }

    pub fn materialize(&self, id: LabelId) -> PathLabel {
        let label = self.label(id);
        PathLabel {
            weight: label.weight,
            resources: label.resources.clone(),
            path: self.path_of(id),
            phi: f64::NAN,
        }
    }

    /// Try to admit a candidate label at its vertex: discard exact
    /// duplicates, run the dominance sweep against the bucket, apply the
    /// primal-bound filter, then enqueue and update the best pointer.
    pub fn insert_candidate(&mut self, candidate: Label, primal_bound: Option<f64>) {
        let vertex = candidate.vertex;
        if self.efficient[vertex]
            .iter()
            .any(|&id| self.labels_equal(id, &candidate))
        {
            return;
        }
        self.generated += 1;

        let mut dominated = false;
        let (direction, critical) = (self.direction, self.critical);
        let arena = &self.arena;
        self.efficient[vertex].retain(|&id| {
            if dominated {
                return true;
            }
            let other = &arena[id as usize];
            if dominates(&candidate, other, direction, critical) {
                return false;
            }
            if dominates(other, &candidate, direction, critical) {
                dominated = true;
            }
            true
        });
        if dominated {
            return;
        }
        if let Some(bound) = primal_bound {
            if candidate.weight + self.lower_bound[vertex] > bound {
                return;
            }
        }

        let id = self.alloc(candidate);
        self.efficient[vertex].push(id);
        self.push_heap(id);
        self.visited[vertex] = true;
        self.update_best(id);
    }

    /// Least weight over the best labels of all visited vertices.
    pub fn min_weight_over_visited(&self) -> f64 {
        let mut min = f64::INFINITY;
        for (v, &seen) in self.visited.iter().enumerate() {
            if !seen {
                continue;
            }
            if let Some(id) = self.best[v] {
                min = min.min(self.label(id).weight);
            }
        }
        min
    }

    fn alloc(&mut self, label: Label) -> LabelId {
        let id = self.arena.len() as LabelId;
        self.arena.push(label);
        id
    }

    fn push_heap(&mut self, id: LabelId) {
        let res = self.label(id).resources[self.critical];
        // The heap pops its maximum; negating the forward key makes the
        // lowest critical value surface first.
        let key = match self.direction {
            Direction::Backward => OrderedFloat(res),
            _ => OrderedFloat(-res),
        };
        let seq = self.seq;
        self.seq += 1;
        self.heap.push(HeapEntry { key, seq, id });
    }

    fn update_best(&mut self, id: LabelId) {
        let label = self.label(id);
        let (vertex, weight) = (label.vertex, label.weight);
        // A label closing a source-sink path only counts as best when it
        // satisfies the hard bounds.
        if vertex == self.terminus
            && !feasible(&label.resources, &self.max_res, &self.min_res)
        {
            return;
        }
        let improves = match self.best[vertex] {
            Some(incumbent) => weight < self.label(incumbent).weight,
            None => true,
        };
        if improves {
            self.best[vertex] = Some(id);
        }
    }

    fn labels_equal(&self, id: LabelId, candidate: &Label) -> bool {
        let label = self.label(id);
        if label.weight != candidate.weight || label.resources != candidate.resources {
            return false;
        }
        // Same weight and resources: compare the vertex sequences by
        // walking both parent chains.
        let mut a = Some(id);
        let mut b_vertex = candidate.vertex;
        let mut b_parent = candidate.parent;
        loop {
            let Some(a_id) = a else {
                return false;
            };
            let a_label = self.label(a_id);
            if a_label.vertex != b_vertex {
                return false;
            }
            match (a_label.parent, b_parent) {
                (None, None) => return true,
                (Some(_), None) | (None, Some(_)) => return false,
                (Some(ap), Some(bp)) => {
                    a = Some(ap);
                    let b_label = self.label(bp);
                    b_vertex = b_label.vertex;
                    b_parent = b_label.parent;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fwd_search() -> Search {
        Search::new(
            Direction::Forward,
            4,
            0,
            3,
            0,
            false,
            vec![10.0],
            vec![0.0],
            vec![0.0; 4],
        )
    }

    fn bwd_search() -> Search {
        Search::new(
            Direction::Backward,
            4,
            3,
            0,
            0,
            false,
            vec![10.0],
            vec![0.0],
            vec![0.0; 4],
        )
    }

    fn child(parent: LabelId, vertex: VertexId, weight: f64, res: f64) -> Label {
        Label {
            weight,
            vertex,
            resources: vec![res],
            parent: Some(parent),
            unreachable: None,
        }
    }

    #[test]
    fn forward_heap_pops_lowest_critical_first() {
        let mut s = fwd_search();
        s.seed(vec![0.0]);
        let seed = s.pop().unwrap();
        s.insert_candidate(child(seed, 1, 0.0, 5.0), None);
        s.insert_candidate(child(seed, 2, 7.0, 2.0), None);
        s.insert_candidate(child(seed, 3, 1.0, 5.0), None);
        let id = s.pop().unwrap();
        assert_eq!(s.label(id).resources[0], 2.0);
        // Tie on the key resolves to the earlier insertion.
        let id = s.pop().unwrap();
        assert_eq!(s.label(id).vertex, 1);
        let id = s.pop().unwrap();
        assert_eq!(s.label(id).vertex, 3);
    }

    #[test]
    fn backward_heap_pops_highest_critical_first() {
        let mut s = bwd_search();
        s.seed(vec![10.0]);
        let seed = s.pop().unwrap();
        s.insert_candidate(child(seed, 1, 0.0, 4.0), None);
        s.insert_candidate(child(seed, 2, 0.0, 9.0), None);
        let id = s.pop().unwrap();
        assert_eq!(s.label(id).resources[0], 9.0);
        let id = s.pop().unwrap();
        assert_eq!(s.label(id).resources[0], 4.0);
    }

    #[test]
    fn bucket_keeps_only_pareto_labels() {
        let mut s = fwd_search();
        s.seed(vec![0.0]);
        let seed = s.pop().unwrap();
        s.insert_candidate(child(seed, 1, 5.0, 3.0), None);
        assert_eq!(s.efficient[1].len(), 1);
        // Dominated on arrival: discarded.
        s.insert_candidate(child(seed, 1, 6.0, 4.0), None);
        assert_eq!(s.efficient[1].len(), 1);
        assert_eq!(s.generated, 2);
        // Dominates the incumbent: replaces it.
        s.insert_candidate(child(seed, 1, 4.0, 2.0), None);
        assert_eq!(s.efficient[1].len(), 1);
        assert_eq!(s.label(s.efficient[1][0]).weight, 4.0);
        // Incomparable: coexists.
        s.insert_candidate(child(seed, 1, 3.0, 9.0), None);
        assert_eq!(s.efficient[1].len(), 2);
    }

    #[test]
    fn exact_duplicates_are_discarded_before_counting() {
        let mut s = fwd_search();
        s.seed(vec![0.0]);
        let seed = s.pop().unwrap();
        s.insert_candidate(child(seed, 1, 5.0, 3.0), None);
        let generated = s.generated;
        s.insert_candidate(child(seed, 1, 5.0, 3.0), None);
        assert_eq!(s.generated, generated);
        assert_eq!(s.efficient[1].len(), 1);
    }

    #[test]
    fn primal_bound_prunes_candidates() {
        let mut s = fwd_search();
        s.lower_bound = vec![0.0, 4.0, 0.0, 0.0];
        s.seed(vec![0.0]);
        let seed = s.pop().unwrap();
        s.insert_candidate(child(seed, 1, 3.0, 1.0), Some(5.0));
        assert!(s.efficient[1].is_empty());
        s.insert_candidate(child(seed, 1, 1.0, 1.0), Some(5.0));
        assert_eq!(s.efficient[1].len(), 1);
    }

    #[test]
    fn best_pointer_tracks_least_weight_and_hard_feasibility() {
        let mut s = fwd_search();
        s.seed(vec![0.0]);
        let seed = s.pop().unwrap();
        s.insert_candidate(child(seed, 1, 5.0, 3.0), None);
        s.insert_candidate(child(seed, 1, 2.0, 9.0), None);
        assert_eq!(s.label(s.best[1].unwrap()).weight, 2.0);
        // At the terminus, an infeasible label must not become best.
        s.insert_candidate(child(seed, 3, -1.0, 12.0), None);
        assert!(s.best[3].is_none());
        s.insert_candidate(child(seed, 3, 1.0, 8.0), None);
        assert_eq!(s.label(s.best[3].unwrap()).weight, 1.0);
    }

    #[test]
    fn path_reconstruction_walks_parents() {
        let mut s = fwd_search();
        s.seed(vec![0.0]);
        let seed = s.pop().unwrap();
        s.insert_candidate(child(seed, 1, 1.0, 1.0), None);
        let a = s.efficient[1][0];
        s.insert_candidate(child(a, 2, 2.0, 2.0), None);
        let b = s.efficient[2][0];
        assert_eq!(s.path_of(b), vec![0, 1, 2]);
        assert_eq!(s.prev_vertex(b), Some(1));
        assert_eq!(s.prev_vertex(seed), None);
        let lab = s.materialize(b);
        assert_eq!(lab.path, vec![0, 1, 2]);
        assert_eq!(lab.weight, 2.0);
    }
}
