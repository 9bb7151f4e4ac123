// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::BinaryHeap;

use super::{Route, SearchError, SearchMode, SearchOptions, TraceSegment};
use crate::{earth_distance, Coordinates, Graph, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Unvisited,
    Open,
    Closed,
}

/// State of a single node, private to a single search invocation.
#[derive(Debug, Clone, Copy)]
struct NodeState {
    distance_from_start: f64,
    distance_to_end: f64,
    parent: Option<usize>,
    status: Status,

    /// When was the node (most recently) added to the open set.
    open_seq: u64,
}

impl NodeState {
    fn total_distance(&self) -> f64 {
        self.distance_from_start + self.distance_to_end
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenItem {
    at: usize,
    cost: f64,
    score: f64,
    seq: u64,
}

impl PartialEq for OpenItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for OpenItem {}

impl PartialOrd for OpenItem {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenItem {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // NOTE: We revert the order of comparison of scores,
        // as lower scores are considered better ("higher"),
        // and Rust's BinaryHeap is a max-heap.
        // On equal scores, the node which entered the open set last wins.
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

struct Search<'g> {
    g: &'g Graph,
    options: &'g SearchOptions,
    states: Vec<NodeState>,
    queue: BinaryHeap<OpenItem>,
    trace: Vec<TraceSegment>,
    next_seq: u64,
}

impl<'g> Search<'g> {
    fn new(g: &'g Graph, target: Coordinates, options: &'g SearchOptions) -> Self {
        let states = g
            .iter()
            .map(|n| NodeState {
                distance_from_start: f64::INFINITY,
                distance_to_end: earth_distance(n.lat, n.lon, target.lat, target.lon),
                parent: None,
                status: Status::Unvisited,
                open_seq: 0,
            })
            .collect();

        Self {
            g,
            options,
            states,
            queue: BinaryHeap::default(),
            trace: Vec::default(),
            next_seq: 0,
        }
    }

    fn run<F: Fn(&Node) -> bool>(mut self, start: usize, is_goal: F) -> Result<Route, SearchError> {
        let g = self.g;
        let mut steps: usize = 0;

        self.states[start].distance_from_start = 0.0;
        self.open(start);

        while let Some(item) = self.queue.pop() {
            // Decreasing the distance of an open node pushes another item for it,
            // outdated items are skipped.
            let state = self.states[item.at];
            if state.status != Status::Open || item.cost != state.distance_from_start {
                continue;
            }

            steps += 1;
            if steps > self.options.step_limit {
                return Err(SearchError::StepLimitExceeded);
            }

            self.states[item.at].status = Status::Closed;
            let current = g.node_at(item.at);

            if let Some(parent) = state.parent {
                self.trace.push(TraceSegment {
                    from: g.node_at(parent).coordinates(),
                    to: current.coordinates(),
                });
            }

            if is_goal(current) {
                return Ok(self.into_route(item.at));
            }

            for neighbor in g.neighbor_slots(item.at) {
                self.relax(item.at, current, neighbor);
            }
        }

        Err(SearchError::NoPath)
    }

    fn relax(&mut self, from: usize, from_node: &Node, to: usize) {
        let to_state = self.states[to];
        if to_state.status == Status::Closed && self.options.mode == SearchMode::BestFirst {
            return;
        }

        let to_node = self.g.node_at(to);
        let cost = self.states[from].distance_from_start
            + earth_distance(to_node.lat, to_node.lon, from_node.lat, from_node.lon);
        let is_shorter = cost < to_state.distance_from_start;

        match to_state.status {
            Status::Unvisited => {
                self.set_parent(to, from, cost);
                self.open(to);
            }

            Status::Open if is_shorter => {
                // Keep the original place among equally good candidates
                self.set_parent(to, from, cost);
                self.push(to);
            }

            Status::Closed if is_shorter => {
                self.set_parent(to, from, cost);
                self.open(to);
            }

            _ => {}
        }
    }

    fn set_parent(&mut self, at: usize, parent: usize, cost: f64) {
        let state = &mut self.states[at];
        state.distance_from_start = cost;
        state.parent = Some(parent);
    }

    /// Adds a node to the open set.
    fn open(&mut self, at: usize) {
        let state = &mut self.states[at];
        state.status = Status::Open;
        state.open_seq = self.next_seq;
        self.next_seq += 1;
        self.push(at);
    }

    fn push(&mut self, at: usize) {
        let state = &self.states[at];
        self.queue.push(OpenItem {
            at,
            cost: state.distance_from_start,
            score: state.total_distance(),
            seq: state.open_seq,
        });
    }

    fn into_route(self, goal: usize) -> Route {
        let mut slots = vec![goal];
        let mut last = goal;

        while let Some(parent) = self.states[last].parent {
            slots.push(parent);
            last = parent;
        }

        slots.reverse();

        let nodes: Vec<Node> = slots.iter().map(|&slot| *self.g.node_at(slot)).collect();
        Route {
            nodes: nodes.iter().map(|n| n.id).collect(),
            path: nodes.iter().map(|n| n.coordinates()).collect(),
            trace: self.trace,
            distance: self.states[goal].distance_from_start,
        }
    }
}

/// Runs a best-first (A*-like) search from a node with the given id to the node located
/// exactly at `to`. The destination must have been snapped to an existing node
/// (see [Graph::find_nearest_node]), as positions are compared with exact floating-point equality.
///
/// Every expanded node is scored with `distance_from_start + distance_to(to)`, and the
/// node with the lowest score is expanded first. If multiple nodes have the same score,
/// the one which entered the open set most recently is preferred.
///
/// Returns [SearchError::NoPath] if the destination is not reachable from the start,
/// and [SearchError::InvalidReference] if the start node doesn't exist.
pub fn find_route(
    g: &Graph,
    from_id: i64,
    to: Coordinates,
    options: &SearchOptions,
) -> Result<Route, SearchError> {
    let start = g.slot(from_id).ok_or(SearchError::InvalidReference(from_id))?;
    log::debug!(
        "searching from {} to ({}, {}) over {} nodes",
        from_id,
        to.lat,
        to.lon,
        g.len()
    );

    let result = Search::new(g, to, options).run(start, |n| n.lat == to.lat && n.lon == to.lon);
    log_result(&result);
    result
}

/// Like [find_route], but the destination is identified by a node id instead of its position.
pub fn find_route_to_node(
    g: &Graph,
    from_id: i64,
    to_id: i64,
    options: &SearchOptions,
) -> Result<Route, SearchError> {
    let start = g.slot(from_id).ok_or(SearchError::InvalidReference(from_id))?;
    let to = g
        .get_node(to_id)
        .ok_or(SearchError::InvalidReference(to_id))?
        .coordinates();
    log::debug!("searching from {} to {} over {} nodes", from_id, to_id, g.len());

    let result = Search::new(g, to, options).run(start, |n| n.id == to_id);
    log_result(&result);
    result
}

fn log_result(result: &Result<Route, SearchError>) {
    match result {
        Ok(route) => log::debug!(
            "route found: {} nodes, {:.3} km, {} expansions",
            route.nodes.len(),
            route.distance,
            route.trace.len() + 1
        ),
        Err(e) => log::debug!("route not found: {e}"),
    }
}
