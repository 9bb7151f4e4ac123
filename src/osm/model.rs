// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use serde::Deserialize;

/// A single record returned by a road-data provider, mirroring
/// an [OSM element](https://wiki.openstreetmap.org/wiki/Elements)
/// in the [Overpass JSON](https://wiki.openstreetmap.org/wiki/OSM_JSON) format.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    /// A point. Only its position is of interest, tags are ignored.
    Node { id: i64, lat: f64, lon: f64 },

    /// A road: an ordered list of point ids, with its tags.
    Way {
        #[serde(default)]
        id: i64,

        #[serde(default)]
        nodes: Vec<i64>,

        #[serde(default)]
        tags: HashMap<String, String>,
    },

    /// Relations, areas and any other records, which are not used for routing.
    #[serde(other)]
    Other,
}

impl Element {
    pub fn node(id: i64, lat: f64, lon: f64) -> Self {
        Self::Node { id, lat, lon }
    }

    pub fn way<I: IntoIterator<Item = i64>>(id: i64, nodes: I) -> Self {
        Self::Way {
            id,
            nodes: nodes.into_iter().collect(),
            tags: HashMap::default(),
        }
    }
}
