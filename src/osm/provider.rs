// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use super::reader::{elements_from_buffer, elements_from_file, FileFormat};
use super::{Element, Error, Options};
use crate::{earth_distance, Coordinates};

/// Default public [Overpass API](https://wiki.openstreetmap.org/wiki/Overpass_API) instance.
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Default limit on the duration of a whole Overpass request, including reading the response.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of road-data records around a given point.
///
/// Implementations must return all ways (and all of their nodes) passing [Options::filter]
/// within [Options::radius] meters of the center. A failure must be reported as an
/// error, never as a partial set of records.
#[allow(async_fn_in_trait)]
pub trait RoadDataProvider {
    async fn fetch(&self, center: Coordinates, options: &Options<'_>) -> Result<Vec<Element>, Error>;
}

/// [RoadDataProvider] querying an [Overpass API](https://wiki.openstreetmap.org/wiki/Overpass_API)
/// instance over HTTP.
#[derive(Debug, Clone)]
pub struct OverpassClient {
    url: String,
    client: reqwest::Client,
}

impl OverpassClient {
    /// Creates a client which gives up on requests taking longer than [DEFAULT_TIMEOUT].
    pub fn new<S: Into<String>>(url: S) -> Result<Self, Error> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Creates a client which gives up on requests taking longer than `timeout`.
    pub fn with_timeout<S: Into<String>>(url: S, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RoadDataProvider for OverpassClient {
    async fn fetch(&self, center: Coordinates, options: &Options<'_>) -> Result<Vec<Element>, Error> {
        let query = options
            .filter
            .overpass_query(center, options.radius, options.output);
        log::debug!("Overpass query:\n{query}");

        let response = self.client.post(&self.url).body(query).send().await?;
        if !response.status().is_success() {
            return Err(Error::Status(response.status()));
        }

        let body = response.bytes().await?;
        log::debug!("received {} bytes from {}", body.len(), self.url);
        elements_from_buffer(options.output.into(), &body)
    }
}

/// [RoadDataProvider] serving a fixed set of records, usually a saved
/// Overpass response or an OSM extract.
///
/// As the records were never filtered by a server, the provider emulates the Overpass
/// query: it returns ways passing [Options::filter] with at least one node within
/// [Options::radius] of the center, followed by all nodes used by those ways.
/// Within ways and within nodes the original order is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticProvider {
    elements: Vec<Element>,
}

impl StaticProvider {
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    pub fn from_file<P: AsRef<Path>>(format: FileFormat, path: P) -> Result<Self, Error> {
        Ok(Self::new(elements_from_file(format, path)?))
    }

    pub fn from_buffer(format: FileFormat, data: &[u8]) -> Result<Self, Error> {
        Ok(Self::new(elements_from_buffer(format, data)?))
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    fn select(&self, center: Coordinates, options: &Options<'_>) -> Vec<Element> {
        let radius_km = options.radius / 1000.0;
        let positions: HashMap<i64, (f64, f64)> = self
            .elements
            .iter()
            .filter_map(|e| match *e {
                Element::Node { id, lat, lon } => Some((id, (lat, lon))),
                _ => None,
            })
            .collect();

        let is_near = |id: &i64| {
            positions.get(id).is_some_and(|&(lat, lon)| {
                earth_distance(lat, lon, center.lat, center.lon) <= radius_km
            })
        };

        let mut used_nodes: HashSet<i64> = HashSet::default();
        let mut selected: Vec<Element> = Vec::default();

        for e in &self.elements {
            if let Element::Way { nodes, tags, .. } = e {
                if options.filter.is_allowed(tags) && nodes.iter().any(&is_near) {
                    used_nodes.extend(nodes.iter().copied());
                    selected.push(e.clone());
                }
            }
        }

        selected.extend(
            self.elements
                .iter()
                .filter(|e| matches!(e, Element::Node { id, .. } if used_nodes.contains(id)))
                .cloned(),
        );
        selected
    }
}

impl RoadDataProvider for StaticProvider {
    async fn fetch(&self, center: Coordinates, options: &Options<'_>) -> Result<Vec<Element>, Error> {
        let selected = self.select(center, options);
        log::debug!(
            "selected {} out of {} records around ({}, {})",
            selected.len(),
            self.elements.len(),
            center.lat,
            center.lon
        );
        Ok(selected)
    }
}
