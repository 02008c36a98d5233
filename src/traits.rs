//! Resource extension functions (REFs).
//!
//! A REF maps a label's accumulated resource vector across an arc. The
//! defaults perform element-wise addition, with the critical coordinate
//! counted *downwards* in the backward direction so that backward labels
//! start at the critical upper bound and move towards the lower bound.
//! Install a custom implementation with
//! [`set_ref_callback`](crate::BiDirectional::set_ref_callback) to model
//! non-additive resources (time windows, load-dependent consumption, ...).
//!
//! # Contract
//!
//! - During the search, lower bounds on non-critical resources are only
//!   enforced when the bound is non-positive; positive minima are deferred
//!   to the final feasibility check at the terminal vertex. This is sound
//!   only for *monotone* REFs: a custom REF must never decrease a
//!   non-critical coordinate.
//! - In the backward direction, an arc contributing zero on the critical
//!   coordinate must still strictly decrease it; the default subtracts one.
//!   This keeps the backward search finite on zero-critical cycles.
//! - When any of the three functions is overridden, the engine routes every
//!   extension and join through the callback. Leaving a function at its
//!   default then falls back to the additive behaviour below.

/// Pluggable resource extension functions.
///
/// Vertex arguments are user ids, as passed to
/// [`add_nodes`](crate::BiDirectional::add_nodes).
pub trait RefCallback {
    /// Extend `cumulative` forward along the arc `tail -> head`.
    fn ref_fwd(
        &self,
        cumulative: &[f64],
        tail: usize,
        head: usize,
        arc_res: &[f64],
        partial_path: &[usize],
        accumulated_cost: f64,
    ) -> Vec<f64> {
        let _ = (tail, head, partial_path, accumulated_cost);
        additive_forward(cumulative, arc_res)
    }

    /// Extend `cumulative` backward along the arc `tail -> head`.
    ///
    /// The default decrements resource 0; a custom critical index must be
    /// handled by the implementor.
    fn ref_bwd(
        &self,
        cumulative: &[f64],
        tail: usize,
        head: usize,
        arc_res: &[f64],
        partial_path: &[usize],
        accumulated_cost: f64,
    ) -> Vec<f64> {
        let _ = (tail, head, partial_path, accumulated_cost);
        additive_backward(cumulative, arc_res, 0)
    }

    /// Combine a forward and a backward resource vector across the joining
    /// arc `tail -> head`.
    fn ref_join(
        &self,
        fwd_resources: &[f64],
        bwd_resources: &[f64],
        tail: usize,
        head: usize,
        arc_res: &[f64],
    ) -> Vec<f64> {
        let _ = (bwd_resources, tail, head);
        additive_forward(fwd_resources, arc_res)
    }
}

/// Default forward REF: element-wise addition.
pub fn additive_forward(cumulative: &[f64], arc_res: &[f64]) -> Vec<f64> {
    cumulative
        .iter()
        .zip(arc_res)
        .map(|(c, a)| c + a)
        .collect()
}

/// Default backward REF: element-wise addition, except the critical
/// coordinate which decreases by the arc contribution, or by one when the
/// arc contributes nothing on it.
pub fn additive_backward(cumulative: &[f64], arc_res: &[f64], critical: usize) -> Vec<f64> {
    let mut out = additive_forward(cumulative, arc_res);
    out[critical] = if arc_res[critical] > 0.0 {
        cumulative[critical] - arc_res[critical]
    } else {
        cumulative[critical] - 1.0
    };
    out
}
