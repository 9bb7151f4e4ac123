// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod best_first;
mod error;

pub use best_first::{find_route, find_route_to_node};
pub use error::{SearchError, DEFAULT_STEP_LIMIT};

use serde::Serialize;

use crate::Coordinates;

/// Controls how the search treats nodes which were already finalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// Finalized (closed) nodes are never revisited. The straight-line distance to the
    /// goal is used as the heuristic, so on unusual graphs the search behaves like a greedy
    /// best-first search and the returned route might not be the shortest one.
    #[default]
    BestFirst,

    /// A closed node is reopened whenever a strictly shorter way to it is found,
    /// which guarantees the shortest route at the expense of extra expansions.
    ///
    /// Edge lengths and the heuristic are both great-circle distances, so the heuristic
    /// is consistent and a reopening may only be caused by floating-point rounding.
    /// Both modes then return the same routes in practice.
    Strict,
}

/// Additional controls for [find_route] and [find_route_to_node].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub mode: SearchMode,

    /// Limits how many nodes may be expanded during the search
    /// before [SearchError::StepLimitExceeded] is returned.
    pub step_limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            mode: SearchMode::default(),
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }
}

/// A short segment between an expanded node and its predecessor,
/// used to visualize the order of exploration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TraceSegment {
    pub from: Coordinates,
    pub to: Coordinates,
}

/// Result of a successful search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    /// Ids of the nodes on the route, from the start to the goal.
    pub nodes: Vec<i64>,

    /// Positions of the nodes on the route, from the start to the goal.
    pub path: Vec<Coordinates>,

    /// Every expansion of a node with a predecessor, in the order of expansion.
    /// The start node has no predecessor and never appears here.
    pub trace: Vec<TraceSegment>,

    /// Length of the route, in kilometers.
    pub distance: f64,
}
