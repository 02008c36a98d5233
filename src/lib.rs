//! Bidirectional labelling for the resource-constrained shortest path
//! problem (RCSPP).
//!
//! Given a directed multigraph whose arcs carry a scalar weight and a
//! vector of resource consumptions, the solver finds a minimum-weight
//! source-sink path whose accumulated resource vector stays within
//! per-component lower and upper bounds. The algorithm is the
//! dynamic-programming labelling procedure of Righini and Salani (2006):
//! two label frontiers, one from the source and one from the sink, advance
//! along a designated *critical* resource; dominance prunes labels that
//! cannot lead to a better completion, a dynamic halfway point steers the
//! frontiers towards each other, and a final join stitches forward and
//! backward labels across a single arc into the optimal path.
//!
//! ## Quick start
//! ```
//! use rcsp::BiDirectional;
//!
//! let mut alg = BiDirectional::new(5, 5, 0, 4, vec![4.0, 20.0], vec![0.0, 0.0]).unwrap();
//! alg.add_nodes(&[0, 1, 2, 3, 4]);
//! alg.add_edge(0, 1, -1.0, &[1.0, 2.0]).unwrap();
//! alg.add_edge(1, 2, -1.0, &[1.0, 0.3]).unwrap();
//! alg.add_edge(2, 3, -10.0, &[1.0, 3.0]).unwrap();
//! alg.add_edge(2, 4, 10.0, &[1.0, 2.0]).unwrap();
//! alg.add_edge(3, 4, -1.0, &[1.0, 10.0]).unwrap();
//! alg.run().unwrap();
//! assert_eq!(alg.path(), vec![0, 1, 2, 3, 4]);
//! assert_eq!(alg.total_cost(), -13.0);
//! ```
//!
//! ## Configuration
//! [`SolvingOptions`] selects the search topology (`forward`, `backward`
//! or `both`), the direction tie-breaker, elementary-path enforcement,
//! optional lower-bound pruning, the critical resource and the time and
//! threshold cutoffs. Custom resource extension functions plug in through
//! the [`RefCallback`] trait.
//!
//! An instance without a feasible source-sink path is not an error: the
//! run succeeds, the reported path is empty and the cost is positive
//! infinity.

pub mod engine;
pub mod error;
pub mod options;
pub mod traits;

mod graph;
mod label;
mod preprocessing;
mod search;
mod utils;

pub use crate::engine::BiDirectional;
pub use crate::error::{Error, Result};
pub use crate::options::{Direction, SelectionMethod, SolvingOptions};
pub use crate::traits::{additive_backward, additive_forward, RefCallback};
