//! Solver configuration.
//!
//! All options are plain data on [`SolvingOptions`]; they are read once at
//! the start of [`run`](crate::BiDirectional::run). The string-typed
//! settings of the reference interface map onto [`Direction`] and
//! [`SelectionMethod`], whose `FromStr` impls surface the unknown-string
//! errors.

use std::str::FromStr;

use crate::error::Error;

/// Search topology: label in one direction only, or in both and join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Forward,
    Backward,
    #[default]
    Both,
}

impl Direction {
    /// Swap forward and backward; used by the full-dominance rule.
    pub(crate) fn flip(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
            Direction::Both => Direction::Both,
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "forward" => Ok(Direction::Forward),
            "backward" => Ok(Direction::Backward),
            "both" => Ok(Direction::Both),
            other => Err(Error::UnknownDirection(other.to_string())),
        }
    }
}

/// Tie-breaker used to pick the next direction when searching both ways.
///
/// Each variant compares a per-direction counter and steps the direction
/// with the smaller value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMethod {
    /// Direction whose heap of unprocessed labels is currently smaller.
    #[default]
    Unprocessed,
    /// Direction that has processed fewer labels so far.
    Processed,
    /// Direction that has generated fewer labels so far.
    Generated,
}

impl FromStr for SelectionMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "unprocessed" => Ok(SelectionMethod::Unprocessed),
            "processed" => Ok(SelectionMethod::Processed),
            "generated" => Ok(SelectionMethod::Generated),
            other => Err(Error::UnknownMethod(other.to_string())),
        }
    }
}

/// Tunable search options.
#[derive(Debug, Clone, Default)]
pub struct SolvingOptions {
    /// Search topology. Default: `Both`.
    pub direction: Direction,
    /// Direction tie-breaker in `Both` mode. Default: `Unprocessed`.
    pub method: SelectionMethod,
    /// Wall-clock cutoff in seconds.
    pub time_limit: Option<f64>,
    /// Early exit once a complete source-sink path with total cost at or
    /// under this value is found.
    pub threshold: Option<f64>,
    /// Forbid repeated vertices on any path.
    pub elementary: bool,
    /// Prune labels against the primal bound using one-to-all shortest-path
    /// lower bounds.
    pub bounds_pruning: bool,
    /// Pick the critical resource with the longest-path heuristic,
    /// overriding `critical_res`.
    pub find_critical_res: bool,
    /// Index of the critical resource. Default: 0.
    pub critical_res: usize,
}

#[cfg(test)]
mod tests {
    use super::{Direction, SelectionMethod, SolvingOptions};
    use crate::error::Error;

    #[test]
    fn parse_directions() {
        assert_eq!("forward".parse::<Direction>().unwrap(), Direction::Forward);
        assert_eq!(
            "backward".parse::<Direction>().unwrap(),
            Direction::Backward
        );
        assert_eq!("both".parse::<Direction>().unwrap(), Direction::Both);
        assert_eq!(
            "sideways".parse::<Direction>(),
            Err(Error::UnknownDirection("sideways".to_string()))
        );
    }

    #[test]
    fn parse_methods() {
        assert_eq!(
            "unprocessed".parse::<SelectionMethod>().unwrap(),
            SelectionMethod::Unprocessed
        );
        assert_eq!(
            "processed".parse::<SelectionMethod>().unwrap(),
            SelectionMethod::Processed
        );
        assert_eq!(
            "generated".parse::<SelectionMethod>().unwrap(),
            SelectionMethod::Generated
        );
        assert_eq!(
            "random".parse::<SelectionMethod>(),
            Err(Error::UnknownMethod("random".to_string()))
        );
    }

    #[test]
    fn flip_swaps_single_directions() {
        assert_eq!(Direction::Forward.flip(), Direction::Backward);
        assert_eq!(Direction::Backward.flip(), Direction::Forward);
        assert_eq!(Direction::Both.flip(), Direction::Both);
    }

    #[test]
    fn defaults_match_reference_interface() {
        let opts = SolvingOptions::default();
        assert_eq!(opts.direction, Direction::Both);
        assert_eq!(opts.method, SelectionMethod::Unprocessed);
        assert!(opts.time_limit.is_none());
        assert!(opts.threshold.is_none());
        assert!(!opts.elementary);
        assert!(!opts.bounds_pruning);
        assert!(!opts.find_critical_res);
        assert_eq!(opts.critical_res, 0);
    }
}
