//! Bidirectional labelling driver.
//!
//! [`BiDirectional`] owns the graph, the resource bounds and one search
//! state per configured direction. `run` alternates single steps between
//! the directions: pop the most advanced label along the critical
//! resource, extend it over every incident arc, dominance-filter the
//! arrivals, track the best intermediate path and tighten the dynamic
//! halfway interval that steers the two frontiers towards each other.
//! When both directions have stopped, the join procedure stitches forward
//! and backward labels across the halfway cut into the final answer.
//!
//! The whole engine is single-threaded: the two directions are two data
//! structures driven by one loop, not two tasks.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::graph::{DiGraph, VertexId};
use crate::label::{
    feasible, full_dominates, full_dominates_paths, merge_labels, process_bwd, Label, LabelId,
    PathLabel,
};
use crate::options::{Direction, SelectionMethod, SolvingOptions};
use crate::preprocessing::{critical_resource, has_negative_cycle, lower_bound_weights};
use crate::search::Search;
use crate::traits::{additive_backward, additive_forward, RefCallback};
use crate::utils::VertexSet;

/// Bidirectional labelling solver for the resource-constrained shortest
/// path problem.
///
/// Usage mirrors the construction order of the graph: create the solver,
/// declare the vertices with [`add_nodes`](Self::add_nodes), append arcs
/// with [`add_edge`](Self::add_edge), adjust [`options`](Self::options) if
/// needed, then [`run`](Self::run) and read the result off the getters.
impl std::fmt::Debug for BiDirectional {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BiDirectional")
            .field("max_res", &self.max_res)
            .field("min_res", &self.min_res)
            .field("options", &self.options)
            .field("graph", &self.graph)
            .field("callback", &self.callback.as_ref().map(|_| "<callback>"))
            .field("searches", &self.searches)
            .field("max_res_curr", &self.max_res_curr)
            .field("min_res_curr", &self.min_res_curr)
            .field("primal_bound", &self.primal_bound)
            .field("start_time", &self.start_time)
            .field("terminated_early", &self.terminated_early)
            .field("best", &self.best)
            .field("critical", &self.critical)
            .field("elementary", &self.elementary)
            .finish()
    }
}

pub struct BiDirectional {
    /// Componentwise upper bounds for accumulated resource consumption.
    pub max_res: Vec<f64>,
    /// Componentwise lower bounds for accumulated resource consumption.
    pub min_res: Vec<f64>,
    /// Search options; read once at the start of [`run`](Self::run).
    pub options: SolvingOptions,
    graph: DiGraph,
    callback: Option<Box<dyn RefCallback>>,
    searches: Vec<Search>,
    max_res_curr: Vec<f64>,
    min_res_curr: Vec<f64>,
    primal_bound: Option<f64>,
    start_time: Instant,
    /// Index of the direction whose intermediate label triggered the
    /// threshold early exit.
    terminated_early: Option<usize>,
    best: Option<PathLabel>,
    critical: usize,
    elementary: bool,
}

impl BiDirectional {
    /// Create a solver for a graph with the given size hints, terminal
    /// user ids and resource bounds.
    pub fn new(
        number_vertices: usize,
        number_edges: usize,
        source_id: usize,
        sink_id: usize,
        max_res: Vec<f64>,
        min_res: Vec<f64>,
    ) -> Result<Self> {
        if max_res.is_empty() || max_res.len() != min_res.len() {
            return Err(Error::MalformedResourceBounds {
                max_len: max_res.len(),
                min_len: min_res.len(),
            });
        }
        let graph = DiGraph::new(
            number_vertices,
            number_edges,
            source_id,
            sink_id,
            max_res.len(),
        )?;
        Ok(Self {
            max_res,
            min_res,
            options: SolvingOptions::default(),
            graph,
            callback: None,
            searches: Vec::new(),
            max_res_curr: Vec::new(),
            min_res_curr: Vec::new(),
            primal_bound: None,
            start_time: Instant::now(),
            terminated_early: None,
            best: None,
            critical: 0,
            elementary: false,
        })
    }

    /// Declare the vertex universe; insertion order fixes the internal
    /// dense index.
    pub fn add_nodes(&mut self, ids: &[usize]) {
        self.graph.add_nodes(ids);
    }

    /// Append an arc. Parallel arcs between the same pair are allowed.
    pub fn add_edge(
        &mut self,
        tail: usize,
        head: usize,
        weight: f64,
        resource_consumption: &[f64],
    ) -> Result<()> {
        self.graph.add_edge(tail, head, weight, resource_consumption)
    }

    /// Install custom resource extension functions.
    pub fn set_ref_callback(&mut self, callback: Box<dyn RefCallback>) {
        self.callback = Some(callback);
    }

    /// Run the labelling algorithm.
    ///
    /// Fails only on configuration errors discovered late (terminals never
    /// registered, critical index out of range). An infeasible instance is
    /// a normal outcome: the call succeeds and [`path`](Self::path) comes
    /// back empty.
    pub fn run(&mut self) -> Result<()> {
        #[cfg(feature = "tracing")]
        let span = tracing::info_span!("run");
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let source = self.graph.source()?;
        let sink = self.graph.sink()?;
        if self.options.critical_res >= self.max_res.len() {
            return Err(Error::CriticalResOutOfRange {
                index: self.options.critical_res,
                n_res: self.max_res.len(),
            });
        }
        self.start_time = Instant::now();
        self.best = None;
        self.terminated_early = None;
        self.primal_bound = None;

        self.preprocess(source, sink);
        self.init_searches(source, sink);
        loop {
            let Some(idx) = self.next_direction() else {
                break;
            };
            self.advance(idx);
            if self.should_stop(idx) {
                break;
            }
        }
        self.post_process(source, sink);
        Ok(())
    }

    /// Final path as user ids, source to sink. Empty when no feasible
    /// source-sink path exists.
    pub fn path(&self) -> Vec<usize> {
        self.best
            .as_ref()
            .map(|b| b.path.iter().map(|&v| self.graph.user_id(v)).collect())
            .unwrap_or_default()
    }

    /// Total weight of the final path, or positive infinity when
    /// infeasible.
    pub fn total_cost(&self) -> f64 {
        self.best.as_ref().map_or(f64::INFINITY, |b| b.weight)
    }

    /// Resource consumption accumulated along the final path. Empty when
    /// infeasible.
    pub fn consumed_resources(&self) -> Vec<f64> {
        self.best
            .as_ref()
            .map(|b| b.resources.clone())
            .unwrap_or_default()
    }

    fn preprocess(&mut self, source: VertexId, sink: VertexId) {
        #[cfg(feature = "tracing")]
        let span = tracing::info_span!("preprocess");
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        self.critical = self.options.critical_res;
        self.elementary = self.options.elementary;
        // Without negative cycles, negative consumptions, custom REFs or
        // non-trivial minima, cycles can never improve a path and the
        // cheaper non-elementary search is exact.
        if self.elementary {
            let cycles_cannot_help = !has_negative_cycle(&self.graph, source)
                && self.graph.all_resources_positive()
                && self.callback.is_none()
                && self.min_res.iter().all(|&m| m == 0.0);
            if cycles_cannot_help {
                self.elementary = false;
            }
        }
        if self.options.find_critical_res {
            if let Some(r) = critical_resource(&self.graph, &self.max_res, source, sink) {
                self.critical = r;
            }
        }
    }

    fn init_searches(&mut self, source: VertexId, sink: VertexId) {
        let n = self.graph.num_vertices();
        self.max_res_curr = self.max_res.clone();
        // Non-trivial minima are deferred to the hard feasibility check;
        // the dynamic lower bounds start from zero.
        self.min_res_curr = if self.min_res.iter().all(|&m| m == 0.0) {
            self.min_res.clone()
        } else {
            vec![0.0; self.min_res.len()]
        };
        let directions = match self.options.direction {
            Direction::Both => vec![Direction::Forward, Direction::Backward],
            single => vec![single],
        };
        self.searches.clear();
        for direction in directions {
            let (origin, terminus) = match direction {
                Direction::Backward => (sink, source),
                _ => (source, sink),
            };
            let lower_bound = if self.options.bounds_pruning {
                lower_bound_weights(&self.graph, direction, source, sink)
            } else {
                vec![0.0; n]
            };
            let mut search = Search::new(
                direction,
                n,
                origin,
                terminus,
                self.critical,
                self.elementary,
                self.max_res.clone(),
                self.min_res.clone(),
                lower_bound,
            );
            let mut resources = self.min_res_curr.clone();
            if direction == Direction::Backward {
                resources[self.critical] = self.max_res_curr[self.critical];
            }
            search.seed(resources);
            self.searches.push(search);
        }
    }

    /// Pick the next direction to step, or `None` when every configured
    /// direction has stopped.
    fn next_direction(&self) -> Option<usize> {
        if self.searches.len() == 1 {
            return (!self.searches[0].stop).then_some(0);
        }
        match (self.searches[0].stop, self.searches[1].stop) {
            (true, true) => None,
            (false, true) => Some(0),
            (true, false) => Some(1),
            (false, false) => {
                let (fwd, bwd) = match self.options.method {
                    SelectionMethod::Unprocessed => {
                        (self.searches[0].unprocessed(), self.searches[1].unprocessed())
                    }
                    SelectionMethod::Processed => {
                        (self.searches[0].processed, self.searches[1].processed)
                    }
                    SelectionMethod::Generated => {
                        (self.searches[0].generated, self.searches[1].generated)
                    }
                };
                Some(if fwd < bwd { 0 } else { 1 })
            }
        }
    }

    /// One step of the chosen direction: pop, critical-bound check,
    /// extend, intermediate update, halfway update.
    fn advance(&mut self, idx: usize) {
        let Some(id) = self.searches[idx].pop() else {
            self.searches[idx].stop = true;
            return;
        };
        self.searches[idx].processed += 1;
        if self.bounds_exceeded(idx, id) {
            self.searches[idx].stop = true;
        } else {
            self.extend_current(idx, id);
            self.update_intermediate(idx, id);
        }
        self.update_halfway(idx, id);
    }

    /// The popped label has swept past the opposite frontier. The two
    /// frontiers only block each other once the dynamic critical interval
    /// has closed, and only when both directions are actually searching.
    fn bounds_exceeded(&self, idx: usize, id: LabelId) -> bool {
        let c = self.critical;
        let search = &self.searches[idx];
        let res = search.label(id).resources[c];
        let within = match search.direction {
            Direction::Backward => res > self.min_res_curr[c],
            _ => res <= self.max_res_curr[c],
        };
        if within || self.max_res_curr[c] != self.min_res_curr[c] {
            false
        } else {
            self.options.direction == Direction::Both
        }
    }

    fn extend_current(&mut self, idx: usize, id: LabelId) {
        let Self {
            graph,
            searches,
            callback,
            max_res_curr,
            min_res_curr,
            min_res,
            primal_bound,
            critical,
            elementary,
            options,
            ..
        } = self;
        let search = &mut searches[idx];
        let direction = search.direction;
        let vertex = search.label(id).vertex;
        let critical = *critical;
        let elementary = *elementary;
        let bound = if options.bounds_pruning {
            *primal_bound
        } else {
            None
        };
        // User-facing path, needed only by custom REFs.
        let user_path: Vec<usize> = if callback.is_some() {
            search
                .path_of(id)
                .iter()
                .map(|&v| graph.user_id(v))
                .collect()
        } else {
            Vec::new()
        };

        for &arc_id in graph.incident_arcs(vertex, direction) {
            let arc = graph.arc(arc_id);
            let to = arc.adjacent(direction);
            if elementary
                && search
                    .label(id)
                    .unreachable
                    .as_ref()
                    .is_some_and(|u| u.contains(to))
            {
                continue;
            }
            // Immediate 2-cycle `..., w, v, w`.
            if search.prev_vertex(id) == Some(to) {
                continue;
            }
            let new_res = {
                let current = search.label(id);
                match callback.as_deref() {
                    None => match direction {
                        Direction::Backward => {
                            additive_backward(&current.resources, &arc.resources, critical)
                        }
                        _ => additive_forward(&current.resources, &arc.resources),
                    },
                    Some(cb) => {
                        let tail = graph.user_id(arc.tail);
                        let head = graph.user_id(arc.head);
                        match direction {
                            Direction::Backward => cb.ref_bwd(
                                &current.resources,
                                tail,
                                head,
                                &arc.resources,
                                &user_path,
                                current.weight,
                            ),
                            _ => cb.ref_fwd(
                                &current.resources,
                                tail,
                                head,
                                &arc.resources,
                                &user_path,
                                current.weight,
                            ),
                        }
                    }
                }
            };
            if !soft_feasible(&new_res, critical, max_res_curr, min_res_curr, min_res) {
                if elementary {
                    search.mark_unreachable(id, to);
                }
                continue;
            }
            let weight = search.label(id).weight + arc.weight;
            let unreachable = if elementary {
                let mut set = search
                    .label(id)
                    .unreachable
                    .clone()
                    .unwrap_or_else(|| VertexSet::with_capacity(graph.num_vertices()));
                set.insert(to);
                Some(set)
            } else {
                None
            };
            search.insert_candidate(
                Label {
                    weight,
                    vertex: to,
                    resources: new_res,
                    parent: Some(id),
                    unreachable,
                },
                bound,
            );
        }
    }

    /// Track the direction's best candidate for a complete source-sink
    /// path, and the primal bound once one exists.
    fn update_intermediate(&mut self, idx: usize, id: LabelId) {
        let Self {
            searches,
            max_res,
            min_res,
            primal_bound,
            critical,
            ..
        } = self;
        let search = &mut searches[idx];
        let Some(inter) = search.intermediate else {
            search.intermediate = Some(id);
            return;
        };
        let current = search.label(id);
        if !feasible(&current.resources, max_res, min_res) {
            return;
        }
        let incumbent = search.label(inter);
        let replaced = if current.vertex == incumbent.vertex
            && full_dominates(current, incumbent, search.direction, *critical)
        {
            true
        } else {
            // A label that has just closed a source-sink path adopts the
            // intermediate slot as long as no complete path holds it yet.
            current.vertex == search.terminus && incumbent.vertex == search.origin
        };
        if replaced {
            let weight = current.weight;
            let complete = current.vertex == search.terminus;
            search.intermediate = Some(id);
            if complete && primal_bound.map_or(true, |p| weight < p) {
                *primal_bound = Some(weight);
            }
        }
    }

    /// Shrink the dynamic critical interval towards the meeting point.
    fn update_halfway(&mut self, idx: usize, id: LabelId) {
        let c = self.critical;
        let search = &self.searches[idx];
        let res = search.label(id).resources[c];
        match search.direction {
            Direction::Backward => {
                self.max_res_curr[c] = self.max_res_curr[c].min(res.max(self.min_res_curr[c]));
            }
            _ => {
                self.min_res_curr[c] = self.min_res_curr[c].max(res.min(self.max_res_curr[c]));
            }
        }
    }

    /// Time limit, or threshold met by a complete intermediate path.
    fn should_stop(&mut self, idx: usize) -> bool {
        if self.time_limit_reached() {
            return true;
        }
        let search = &self.searches[idx];
        if let (Some(threshold), Some(inter)) = (self.options.threshold, search.intermediate) {
            let label = search.label(inter);
            if label.vertex == search.terminus && label.weight <= threshold {
                self.terminated_early = Some(idx);
                return true;
            }
        }
        false
    }

    fn time_limit_reached(&self) -> bool {
        self.options
            .time_limit
            .is_some_and(|limit| self.start_time.elapsed().as_secs_f64() >= limit)
    }

    fn post_process(&mut self, source: VertexId, sink: VertexId) {
        if let Some(idx) = self.terminated_early {
            let search = &self.searches[idx];
            if let Some(inter) = search.intermediate {
                let label = search.materialize(inter);
                self.best = Some(self.orient(label, search.direction));
            }
        } else if self.options.direction == Direction::Both {
            self.join_labels(source, sink);
        } else {
            let search = &self.searches[0];
            if let Some(inter) = search.intermediate {
                let label = search.materialize(inter);
                if label.is_st_path(source, sink) {
                    self.best = Some(self.orient(label, search.direction));
                }
            }
        }
    }

    /// Bring a direction-local label into forward orientation.
    fn orient(&self, label: PathLabel, direction: Direction) -> PathLabel {
        match direction {
            Direction::Backward => {
                process_bwd(&label, &self.max_res, &self.min_res, self.critical, true)
            }
            _ => label,
        }
    }

    /// The join procedure: merge forward and backward labels across the
    /// final halfway point into complete source-sink paths, keeping the
    /// best merged label under phi-based duplicate suppression.
    fn join_labels(&mut self, source: VertexId, sink: VertexId) {
        #[cfg(feature = "tracing")]
        let span = tracing::info_span!("join");
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let Self {
            graph,
            searches,
            callback,
            best,
            max_res,
            min_res,
            max_res_curr,
            min_res_curr,
            critical,
            elementary,
            options,
            start_time,
            ..
        } = self;
        let (fwd_slice, bwd_slice) = searches.split_at(1);
        let (fwd, bwd) = (&fwd_slice[0], &bwd_slice[0]);
        let c = *critical;
        let elementary = *elementary;
        let halfway = max_res_curr[c].min(min_res_curr[c]);

        // Upper bound from any hard-feasible complete path found so far.
        let mut ub = f64::INFINITY;
        if let Some(id) = fwd.best[sink] {
            let label = fwd.label(id);
            if feasible(&label.resources, max_res, min_res) {
                ub = label.weight;
            }
        }
        if let Some(id) = bwd.best[source] {
            let label = bwd.label(id);
            if feasible(&label.resources, max_res, min_res) && label.weight < ub {
                ub = label.weight;
            }
        }
        let bwd_min = bwd.min_weight_over_visited();

        // Minimal phi recorded per merged physical path.
        let mut merged_seen: HashMap<Vec<VertexId>, f64> = HashMap::new();

        for n in 0..graph.num_vertices() {
            if n == sink || !fwd.visited[n] {
                continue;
            }
            let Some(best_n) = fwd.best[n] else {
                continue;
            };
            if fwd.label(best_n).weight + bwd_min > ub {
                continue;
            }
            for &lf_id in &fwd.efficient[n] {
                let lf = fwd.label(lf_id);
                if lf.resources[c] > halfway || lf.weight + bwd_min > ub {
                    continue;
                }
                let lf_path = fwd.path_of(lf_id);
                for &arc_id in graph.out_arcs(n) {
                    let arc = graph.arc(arc_id);
                    let m = arc.head;
                    if m == source || !bwd.visited[m] {
                        continue;
                    }
                    let Some(best_m) = bwd.best[m] else {
                        continue;
                    };
                    if lf.weight + arc.weight + bwd.label(best_m).weight > ub {
                        continue;
                    }
                    for &lb_id in &bwd.efficient[m] {
                        let lb = bwd.label(lb_id);
                        if lb.resources[c] < halfway
                            || lf.weight + arc.weight + lb.weight > ub
                        {
                            continue;
                        }
                        let lb_path = bwd.path_of(lb_id);
                        if elementary
                            && has_repeated_vertex(&lf_path, &lb_path, graph.num_vertices())
                        {
                            continue;
                        }
                        let fwd_label = PathLabel {
                            weight: lf.weight,
                            resources: lf.resources.clone(),
                            path: lf_path.clone(),
                            phi: f64::NAN,
                        };
                        let bwd_label = PathLabel {
                            weight: lb.weight,
                            resources: lb.resources.clone(),
                            path: lb_path,
                            phi: f64::NAN,
                        };
                        let merged = merge_labels(
                            &fwd_label,
                            &bwd_label,
                            arc,
                            graph,
                            max_res,
                            c,
                            callback.as_deref(),
                        );
                        // Reject merges whose physical path was already
                        // produced by a more balanced pairing.
                        let rejected = merged_seen
                            .get(&merged.path)
                            .is_some_and(|&prev| prev < merged.phi);
                        match merged_seen.entry(merged.path.clone()) {
                            Entry::Occupied(mut e) => {
                                if merged.phi < *e.get() {
                                    e.insert(merged.phi);
                                }
                            }
                            Entry::Vacant(e) => {
                                e.insert(merged.phi);
                            }
                        }
                        if rejected || !feasible(&merged.resources, max_res, min_res) {
                            continue;
                        }
                        let adopt = match best.as_ref() {
                            None => true,
                            Some(incumbent) => {
                                full_dominates_paths(
                                    &merged,
                                    incumbent,
                                    Direction::Forward,
                                    c,
                                    elementary,
                                    graph.num_vertices(),
                                ) || merged.weight < incumbent.weight
                            }
                        };
                        if adopt {
                            if merged.weight < ub {
                                ub = merged.weight;
                            }
                            let weight = merged.weight;
                            *best = Some(merged);
                            let time_up = options
                                .time_limit
                                .is_some_and(|limit| start_time.elapsed().as_secs_f64() >= limit);
                            let under_threshold =
                                options.threshold.is_some_and(|t| weight <= t);
                            if time_up || under_threshold {
                                return;
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Soft feasibility: every upper bound, the critical lower bound, and only
/// the non-positive minima among the non-critical coordinates. Positive
/// non-critical minima are re-checked at hard feasibility time.
fn soft_feasible(
    resources: &[f64],
    critical: usize,
    max_res_curr: &[f64],
    min_res_curr: &[f64],
    min_res: &[f64],
) -> bool {
    if resources
        .iter()
        .zip(max_res_curr)
        .any(|(r, hi)| r > hi)
    {
        return false;
    }
    if resources[critical] < min_res_curr[critical] {
        return false;
    }
    resources
        .iter()
        .zip(min_res)
        .enumerate()
        .all(|(i, (r, lo))| i == critical || *lo > 0.0 || r >= lo)
}

fn has_repeated_vertex(fwd_path: &[VertexId], bwd_path: &[VertexId], n: usize) -> bool {
    let mut seen = VertexSet::with_capacity(n);
    for &v in fwd_path.iter().chain(bwd_path) {
        if seen.contains(v) {
            return true;
        }
        seen.insert(v);
    }
    false
}
