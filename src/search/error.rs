// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Recommended number of allowed node expansions in [find_route](crate::find_route) and
/// [find_route_to_node](crate::find_route_to_node) before [SearchError::StepLimitExceeded]
/// is returned.
pub const DEFAULT_STEP_LIMIT: usize = 1_000_000;

/// Error conditions which may occur during [find_route](crate::find_route) or
/// [find_route_to_node](crate::find_route_to_node).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The start or end nodes don't exist in a graph.
    #[error("invalid node: {0}")]
    InvalidReference(i64),

    /// All nodes reachable from the start were expanded without reaching the goal.
    #[error("no path exists")]
    NoPath,

    /// Route search has exceeded its limit of steps.
    #[error("step limit exceeded")]
    StepLimitExceeded,
}
