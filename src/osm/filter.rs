// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::fmt::Write;

use crate::Coordinates;

/// Describes which OSM ways are considered roads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadFilter<'a> {
    /// Values of the [highway](https://wiki.openstreetmap.org/wiki/Key:highway) tag
    /// which exclude a way from routing.
    pub excluded_highways: &'a [&'a str],

    /// Exclude all ways with a [footway](https://wiki.openstreetmap.org/wiki/Key:footway) tag,
    /// which usually marks sidewalks and crossings mapped as separate ways.
    pub exclude_tagged_footways: bool,
}

/// Roads usable by motor vehicles: everything except footways, steps, pedestrian
/// streets, tracks, paths and street lamps.
pub const DEFAULT_FILTER: RoadFilter<'static> = RoadFilter {
    excluded_highways: &[
        "footway",
        "street_lamp",
        "steps",
        "pedestrian",
        "track",
        "path",
    ],
    exclude_tagged_footways: true,
};

/// Format of the [Overpass API](https://wiki.openstreetmap.org/wiki/Overpass_API) output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Xml,
}

impl<'a> RoadFilter<'a> {
    /// Checks if a way with the given tags should be used for routing.
    ///
    /// Ways without any tags are accepted, as the provider has no way of telling
    /// what they are. Tagged ways need a non-excluded `highway` tag.
    pub fn is_allowed(&self, tags: &HashMap<String, String>) -> bool {
        if tags.is_empty() {
            return true;
        }

        if self.exclude_tagged_footways && tags.contains_key("footway") {
            return false;
        }

        match tags.get("highway") {
            Some(highway) => !self.excluded_highways.contains(&highway.as_str()),
            None => false,
        }
    }

    /// Builds an [Overpass QL](https://wiki.openstreetmap.org/wiki/Overpass_API/Overpass_QL)
    /// query returning all roads within `radius` meters of `center`, followed by all
    /// of their nodes.
    pub fn overpass_query(&self, center: Coordinates, radius: f64, output: OutputFormat) -> String {
        let mut q = String::new();

        let format = match output {
            OutputFormat::Json => "json",
            OutputFormat::Xml => "xml",
        };
        _ = write!(
            q,
            "[out:{}];\nway(around:{},{},{})[\"highway\"]",
            format, radius, center.lat, center.lon
        );

        for highway in self.excluded_highways {
            _ = write!(q, "[highway!=\"{}\"]", highway);
        }
        if self.exclude_tagged_footways {
            // Matches ways without the key, regardless of its value
            q.push_str("[!\"footway\"]");
        }

        q.push_str(";\nout body;\n>;\nout skel qt;");
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! tags {
        {} => { HashMap::default() };
        {$( $k:literal : $v:literal ),+} => {
            HashMap::from_iter([ $( ($k.to_string(), $v.to_string()) ),+ ])
        };
    }

    #[test]
    fn is_allowed() {
        let f = &DEFAULT_FILTER;
        assert!(f.is_allowed(&tags! {}));
        assert!(f.is_allowed(&tags! {"highway": "residential"}));
        assert!(f.is_allowed(&tags! {"highway": "primary", "name": "Park Street"}));
        assert!(!f.is_allowed(&tags! {"highway": "footway"}));
        assert!(!f.is_allowed(&tags! {"highway": "steps"}));
        assert!(!f.is_allowed(&tags! {"highway": "track"}));
        assert!(!f.is_allowed(&tags! {"highway": "service", "footway": "sidewalk"}));
        assert!(!f.is_allowed(&tags! {"building": "yes"}));
    }

    #[test]
    fn is_allowed_without_footway_rule() {
        let f = RoadFilter {
            excluded_highways: &["motorway"],
            exclude_tagged_footways: false,
        };
        assert!(f.is_allowed(&tags! {"highway": "footway"}));
        assert!(f.is_allowed(&tags! {"highway": "service", "footway": "sidewalk"}));
        assert!(!f.is_allowed(&tags! {"highway": "motorway"}));
    }

    #[test]
    fn overpass_query() {
        let q = DEFAULT_FILTER.overpass_query(
            Coordinates::new(22.5726299, 88.4344825),
            1000.0,
            OutputFormat::Json,
        );
        assert_eq!(
            q,
            "[out:json];\n\
             way(around:1000,22.5726299,88.4344825)[\"highway\"]\
             [highway!=\"footway\"][highway!=\"street_lamp\"][highway!=\"steps\"]\
             [highway!=\"pedestrian\"][highway!=\"track\"][highway!=\"path\"]\
             [!\"footway\"];\n\
             out body;\n\
             >;\n\
             out skel qt;"
        );
    }

    #[test]
    fn overpass_query_agrees_with_is_allowed() {
        let q = DEFAULT_FILTER.overpass_query(Coordinates::new(0.0, 0.0), 100.0, OutputFormat::Json);
        assert!(q.contains("[!\"footway\"]"));
        assert!(!q.contains("footway!="));
        assert!(!DEFAULT_FILTER.is_allowed(&tags! {"highway": "service", "footway": "sidewalk"}));
        assert!(!DEFAULT_FILTER.is_allowed(&tags! {"highway": "service", "footway": "crossing"}));
    }

    #[test]
    fn overpass_query_xml() {
        let f = RoadFilter {
            excluded_highways: &[],
            exclude_tagged_footways: false,
        };
        assert_eq!(
            f.overpass_query(Coordinates::new(-1.5, 2.25), 250.5, OutputFormat::Xml),
            "[out:xml];\nway(around:250.5,-1.5,2.25)[\"highway\"];\nout body;\n>;\nout skel qt;"
        );
    }
}
