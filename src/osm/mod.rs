// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Fetching and reading [OpenStreetMap](https://www.openstreetmap.org/) road data,
//! and converting it into a [Graph](crate::Graph).

mod error;
mod filter;
mod graph_builder;
mod model;
mod provider;
mod reader;

pub use error::Error;
pub use filter::{OutputFormat, RoadFilter, DEFAULT_FILTER};
pub use graph_builder::{build_graph, graph_from_elements};
pub use model::Element;
pub use provider::{
    OverpassClient, RoadDataProvider, StaticProvider, DEFAULT_OVERPASS_URL, DEFAULT_TIMEOUT,
};
pub use reader::{elements_from_buffer, elements_from_file, elements_from_io, FileFormat};

/// Default search radius around the center point, in meters.
pub const DEFAULT_RADIUS: f64 = 1000.0;

/// Additional controls for fetching road data around a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Options<'a> {
    /// Which ways are considered roads.
    pub filter: &'a RoadFilter<'a>,

    /// Only roads within this distance (in meters) of the center are fetched.
    pub radius: f64,

    /// Format requested from the road-data provider, if it supports multiple ones.
    pub output: OutputFormat,
}

impl Default for Options<'static> {
    fn default() -> Self {
        Self {
            filter: &DEFAULT_FILTER,
            radius: DEFAULT_RADIUS,
            output: OutputFormat::default(),
        }
    }
}
