// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Shortest road paths over [OpenStreetMap](https://www.openstreetmap.org/) data
//! fetched around a point of interest.
//!
//! Road segments around a center point are fetched from an
//! [Overpass API](https://wiki.openstreetmap.org/wiki/Overpass_API) instance
//! (or loaded from a saved response), turned into an undirected [Graph] whose
//! edge weights are great-circle distances, and searched with a best-first (A*-like)
//! algorithm. Apart from the path itself, the search reports the order in which
//! nodes were expanded, so that the exploration can be animated.
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = roadpath::osm::OverpassClient::new(roadpath::osm::DEFAULT_OVERPASS_URL)?;
//! let options = roadpath::osm::Options::default();
//! let center = roadpath::Coordinates::new(22.5726, 88.4344);
//!
//! let g = roadpath::osm::build_graph(&client, center, &options).await?;
//! let start = g.start_node().ok_or("no roads nearby")?;
//! let end = g.find_nearest_node(22.5750, 88.4370).ok_or("empty graph")?;
//!
//! let route = roadpath::find_route(
//!     &g,
//!     start.id,
//!     end.coordinates(),
//!     &roadpath::SearchOptions::default(),
//! )?;
//! println!("{:.3} km over {} nodes", route.distance, route.nodes.len());
//! # Ok(())
//! # }
//! ```

pub mod animation;
mod distance;
mod graph;
pub mod osm;
mod search;
pub mod session;

pub use distance::earth_distance;
pub use graph::Graph;
pub use search::{
    find_route, find_route_to_node, Route, SearchError, SearchMode, SearchOptions,
    TraceSegment, DEFAULT_STEP_LIMIT,
};

use serde::Serialize;

/// A latitude-longitude pair, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to another position, in kilometers.
    pub fn distance_to(&self, other: Coordinates) -> f64 {
        earth_distance(self.lat, self.lon, other.lat, other.lon)
    }
}

/// Represents an element of the [Graph]: a road intersection or a point on a way.
///
/// Node identifiers are unique within a [Graph].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
}

impl Node {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

/// Represents an undirected, traversable road segment between two distinct [Nodes](Node).
///
/// Edges only reference nodes by id; the [Graph] owns the nodes themselves.
/// The weight of an edge is not stored, it's the [earth_distance] between its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub a: i64,
    pub b: i64,
}

impl Edge {
    /// Given the id of one endpoint, returns the id of the other endpoint.
    pub fn other(&self, id: i64) -> i64 {
        debug_assert!(id == self.a || id == self.b);
        if id == self.a {
            self.b
        } else {
            self.a
        }
    }

    /// Checks whether this edge connects the two given nodes, in any direction.
    pub fn connects(&self, x: i64, y: i64) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }
}
