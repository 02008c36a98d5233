//! Labels and their algebra: dominance, feasibility, backward reversal and
//! the join-time merge.
//!
//! Two representations coexist. During the search a label lives in a
//! per-direction arena as a compact node holding a parent pointer; its
//! vertex sequence is reconstructed on demand (see [`crate::search`]). Join
//! and post-processing materialise labels with an explicit path, which is
//! what [`PathLabel`] carries together with the phi value used by the
//! halfway duplicate filter.

use crate::graph::{Arc, DiGraph, VertexId};
use crate::options::Direction;
use crate::traits::{additive_forward, RefCallback};
use crate::utils::VertexSet;

/// Index into a direction's label arena.
pub(crate) type LabelId = u32;

/// Arena-resident label.
///
/// `unreachable` is present only in elementary mode and is always a
/// superset of the partial path's vertex set.
#[derive(Debug, Clone)]
pub(crate) struct Label {
    pub weight: f64,
    pub vertex: VertexId,
    pub resources: Vec<f64>,
    pub parent: Option<LabelId>,
    pub unreachable: Option<VertexSet>,
}

/// A materialised label: explicit path (dense ids, origin first) plus the
/// merge imbalance `phi` (NaN outside Join).
#[derive(Debug, Clone)]
pub(crate) struct PathLabel {
    pub weight: f64,
    pub resources: Vec<f64>,
    pub path: Vec<VertexId>,
    pub phi: f64,
}

impl PathLabel {
    pub fn is_st_path(&self, source: VertexId, sink: VertexId) -> bool {
        match (self.path.first(), self.path.last()) {
            (Some(&a), Some(&b)) => (a == source && b == sink) || (a == sink && b == source),
            _ => false,
        }
    }

    fn vertex_set(&self, num_vertices: usize) -> VertexSet {
        let mut set = VertexSet::with_capacity(num_vertices);
        for &v in &self.path {
            set.insert(v);
        }
        set
    }
}

/// Hard feasibility: every coordinate within the static bounds.
pub(crate) fn feasible(resources: &[f64], max_res: &[f64], min_res: &[f64]) -> bool {
    resources
        .iter()
        .zip(max_res.iter().zip(min_res))
        .all(|(r, (hi, lo))| *lo <= *r && *r <= *hi)
}

/// Direction-aware dominance on raw label parts.
///
/// Forward order compares every resource downwards; the backward order
/// flips the critical coordinate, which counts down from its upper bound.
/// Labels with equal weight and equal resources never dominate each other,
/// and in elementary mode the dominator's unreachable set must be a subset
/// of the dominee's.
#[allow(clippy::too_many_arguments)]
fn dominates_parts(
    a_weight: f64,
    a_res: &[f64],
    a_unreachable: Option<&VertexSet>,
    b_weight: f64,
    b_res: &[f64],
    b_unreachable: Option<&VertexSet>,
    direction: Direction,
    critical: usize,
) -> bool {
    if a_weight == b_weight && a_res == b_res {
        return false;
    }
    if a_weight > b_weight {
        return false;
    }
    let ordered = match direction {
        Direction::Backward => {
            a_res[critical] >= b_res[critical]
                && a_res
                    .iter()
                    .zip(b_res)
                    .enumerate()
                    .all(|(i, (a, b))| i == critical || a <= b)
        }
        _ => a_res.iter().zip(b_res).all(|(a, b)| a <= b),
    };
    if !ordered {
        return false;
    }
    if let (Some(au), Some(bu)) = (a_unreachable, b_unreachable) {
        if !au.is_subset(bu) {
            return false;
        }
    }
    true
}

#[allow(clippy::too_many_arguments)]
fn full_dominates_parts(
    a_weight: f64,
    a_res: &[f64],
    a_unreachable: Option<&VertexSet>,
    b_weight: f64,
    b_res: &[f64],
    b_unreachable: Option<&VertexSet>,
    direction: Direction,
    critical: usize,
) -> bool {
    if dominates_parts(
        a_weight,
        a_res,
        a_unreachable,
        b_weight,
        b_res,
        b_unreachable,
        direction,
        critical,
    ) {
        return true;
    }
    let other_dominates = dominates_parts(
        b_weight,
        b_res,
        b_unreachable,
        a_weight,
        a_res,
        a_unreachable,
        direction,
        critical,
    );
    if other_dominates {
        return false;
    }
    // Neither dominates: retry with the order flipped, then fall back to a
    // strict weight comparison.
    dominates_parts(
        a_weight,
        a_res,
        a_unreachable,
        b_weight,
        b_res,
        b_unreachable,
        direction.flip(),
        critical,
    ) || a_weight < b_weight
}

pub(crate) fn dominates(a: &Label, b: &Label, direction: Direction, critical: usize) -> bool {
    dominates_parts(
        a.weight,
        &a.resources,
        a.unreachable.as_ref(),
        b.weight,
        &b.resources,
        b.unreachable.as_ref(),
        direction,
        critical,
    )
}

pub(crate) fn full_dominates(a: &Label, b: &Label, direction: Direction, critical: usize) -> bool {
    full_dominates_parts(
        a.weight,
        &a.resources,
        a.unreachable.as_ref(),
        b.weight,
        &b.resources,
        b.unreachable.as_ref(),
        direction,
        critical,
    )
}

/// Full dominance between two materialised labels. In elementary mode the
/// unreachable sets are recovered from the paths themselves.
pub(crate) fn full_dominates_paths(
    a: &PathLabel,
    b: &PathLabel,
    direction: Direction,
    critical: usize,
    elementary: bool,
    num_vertices: usize,
) -> bool {
    let (au, bu) = if elementary {
        (
            Some(a.vertex_set(num_vertices)),
            Some(b.vertex_set(num_vertices)),
        )
    } else {
        (None, None)
    };
    full_dominates_parts(
        a.weight,
        &a.resources,
        au.as_ref(),
        b.weight,
        &b.resources,
        bu.as_ref(),
        direction,
        critical,
    )
}

/// Reverse a backward label into forward orientation: the path is
/// reversed, the critical coordinate inverted against its upper bound and
/// `cumulative` added element-wise. With `invert_min_res` the non-critical
/// coordinates keep their accumulated values instead (used when lifting a
/// whole backward path into the final answer).
pub(crate) fn process_bwd(
    label: &PathLabel,
    max_res: &[f64],
    cumulative: &[f64],
    critical: usize,
    invert_min_res: bool,
) -> PathLabel {
    let mut resources = label.resources.clone();
    resources[critical] = max_res[critical] - resources[critical];
    for (r, c) in resources.iter_mut().zip(cumulative) {
        *r += c;
    }
    if invert_min_res {
        for (i, (r, c)) in resources.iter_mut().zip(cumulative).enumerate() {
            if i != critical {
                *r -= c;
            }
        }
    }
    let mut path = label.path.clone();
    path.reverse();
    PathLabel {
        weight: label.weight,
        resources,
        path,
        phi: f64::NAN,
    }
}

/// Merge imbalance on the critical resource: how far the meeting point of
/// a forward/backward pairing deviates from symmetric.
pub(crate) fn phi_value(
    fwd_res: &[f64],
    bwd_res: &[f64],
    max_res: &[f64],
    critical: usize,
) -> f64 {
    (fwd_res[critical] - (max_res[critical] - bwd_res[critical])).abs()
}

/// Stitch a forward and a backward label across `arc` into a complete
/// source-sink label.
#[allow(clippy::too_many_arguments)]
pub(crate) fn merge_labels(
    fwd: &PathLabel,
    bwd: &PathLabel,
    arc: &Arc,
    graph: &DiGraph,
    max_res: &[f64],
    critical: usize,
    callback: Option<&dyn RefCallback>,
) -> PathLabel {
    let weight = fwd.weight + arc.weight + bwd.weight;
    let phi = phi_value(&fwd.resources, &bwd.resources, max_res, critical);
    match callback {
        None => {
            let temp = additive_forward(&fwd.resources, &arc.resources);
            let reversed = process_bwd(bwd, max_res, &temp, critical, false);
            let mut path = fwd.path.clone();
            path.extend_from_slice(&reversed.path);
            PathLabel {
                weight,
                resources: reversed.resources,
                path,
                phi,
            }
        }
        Some(cb) => {
            let mut resources = cb.ref_join(
                &fwd.resources,
                &bwd.resources,
                graph.user_id(arc.tail),
                graph.user_id(arc.head),
                &arc.resources,
            );
            // When the join REF does not account for the inverted backward
            // contribution on the critical coordinate, add it in.
            let arc_critical = if arc.resources[critical] > 0.0 {
                arc.resources[critical]
            } else {
                1.0
            };
            let inverted = max_res[critical] - bwd.resources[critical];
            let expected = fwd.resources[critical] + arc_critical + inverted;
            if (resources[critical] - expected).abs() > 1e-9 {
                resources[critical] += inverted;
            }
            let mut path = fwd.path.clone();
            path.extend(bwd.path.iter().rev());
            PathLabel {
                weight,
                resources,
                path,
                phi,
            }
        }
    }
}
