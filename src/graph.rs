// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::hash_map::{Entry, HashMap};

use crate::{earth_distance, Edge, Node};

/// Represents a road network as a set of [Nodes](Node)
/// and undirected [Edges](Edge) between them, together with
/// an optional start (entry) node.
///
/// Nodes are kept in insertion order; node lookups which need to break ties
/// (like [Graph::find_nearest_node]) rely on that order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<i64, usize>,
    edges: Vec<Edge>,
    incident: Vec<Vec<usize>>,
    start: Option<i64>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns an iterator over all [Nodes](Node) in the graph, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Retrieves a [Node] with the provided id.
    pub fn get_node(&self, id: i64) -> Option<&Node> {
        self.index.get(&id).map(|&slot| &self.nodes[slot])
    }

    /// Creates a [Node] with the provided id, or updates the position
    /// of an existing one.
    ///
    /// An updated node keeps its position in the iteration order and all of its edges.
    pub fn add_node(&mut self, id: i64, lat: f64, lon: f64) -> &Node {
        let slot = match self.index.entry(id) {
            Entry::Vacant(e) => {
                let slot = self.nodes.len();
                e.insert(slot);
                self.nodes.push(Node { id, lat, lon });
                self.incident.push(Vec::default());
                slot
            }
            Entry::Occupied(e) => {
                let slot = *e.get();
                log::debug!("node {id} added twice, updating its position");
                self.nodes[slot].lat = lat;
                self.nodes[slot].lon = lon;
                slot
            }
        };
        &self.nodes[slot]
    }

    /// Connects two existing nodes with an undirected [Edge], appending
    /// it to the incident edges of both nodes.
    ///
    /// Returns `false` (and leaves the graph untouched) if either node doesn't exist,
    /// if both ids are equal, or if the nodes are already connected.
    pub fn connect(&mut self, a: i64, b: i64) -> bool {
        if a == b {
            return false;
        }

        let (Some(&slot_a), Some(&slot_b)) = (self.index.get(&a), self.index.get(&b)) else {
            return false;
        };

        if self.incident[slot_a]
            .iter()
            .any(|&e| self.edges[e].connects(a, b))
        {
            return false;
        }

        let edge_idx = self.edges.len();
        self.edges.push(Edge { a, b });
        self.incident[slot_a].push(edge_idx);
        self.incident[slot_b].push(edge_idx);
        true
    }

    /// Gets all [Edges](Edge) incident to a node with a given id.
    pub fn get_edges(&self, id: i64) -> impl Iterator<Item = &Edge> {
        self.index
            .get(&id)
            .map(|&slot| self.incident[slot].as_slice())
            .unwrap_or_default()
            .iter()
            .map(|&e| &self.edges[e])
    }

    /// Checks whether two nodes are directly connected by an [Edge].
    pub fn has_edge(&self, a: i64, b: i64) -> bool {
        self.get_edges(a).any(|e| e.connects(a, b))
    }

    /// Returns the designated start (entry) node, if one was assigned.
    pub fn start_node(&self) -> Option<&Node> {
        self.start.and_then(|id| self.get_node(id))
    }

    /// Designates the node with the provided id as the start node.
    /// Returns `false` if there's no such node.
    pub fn set_start(&mut self, id: i64) -> bool {
        if self.index.contains_key(&id) {
            self.start = Some(id);
            true
        } else {
            false
        }
    }

    /// Finds the closest [Node] to the given position.
    ///
    /// This function requires computing the distance to every [Node] in the graph.
    /// If multiple nodes are equally close, the one added last wins.
    /// Returns `None` only for an empty graph.
    pub fn find_nearest_node(&self, lat: f64, lon: f64) -> Option<&Node> {
        let mut nearest = None;
        let mut min_distance = f64::INFINITY;

        for nd in &self.nodes {
            let distance = earth_distance(lat, lon, nd.lat, nd.lon);
            if distance <= min_distance {
                min_distance = distance;
                nearest = Some(nd);
            }
        }

        nearest
    }

    /// Returns the internal position of a node, used to index per-search state.
    pub(crate) fn slot(&self, id: i64) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Returns the node at a given internal position.
    pub(crate) fn node_at(&self, slot: usize) -> &Node {
        &self.nodes[slot]
    }

    /// Returns internal positions of all neighbors of the node at a given position,
    /// in the order the edges were added.
    pub(crate) fn neighbor_slots(&self, slot: usize) -> impl Iterator<Item = usize> + '_ {
        let id = self.nodes[slot].id;
        self.incident[slot]
            .iter()
            .map(move |&e| self.index[&self.edges[e].other(id)])
    }
}
