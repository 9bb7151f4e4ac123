// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::{Element, Error, Options, RoadDataProvider};
use crate::{earth_distance, Coordinates, Graph};

/// Fetches road data around `center` from a [RoadDataProvider] and converts it into a [Graph],
/// with the node closest to `center` designated as the start node.
///
/// Any failure of the provider fails the whole build. If the provider returns no nodes,
/// the returned graph has no start node, meaning there are no roads nearby.
pub async fn build_graph<P: RoadDataProvider>(
    provider: &P,
    center: Coordinates,
    options: &Options<'_>,
) -> Result<Graph, Error> {
    let elements = provider.fetch(center, options).await?;
    log::info!(
        "fetched {} records within {} m of ({}, {})",
        elements.len(),
        options.radius,
        center.lat,
        center.lon
    );
    Ok(graph_from_elements(&elements, center))
}

/// Converts road-data records into a [Graph].
///
/// Every node record becomes a [Node](crate::Node), and every pair of consecutive nodes
/// of a way becomes an [Edge](crate::Edge). Pairs referencing nodes absent from
/// `elements` are skipped. The node closest to `center` becomes the start node;
/// among equally close nodes, the last one wins.
pub fn graph_from_elements(elements: &[Element], center: Coordinates) -> Graph {
    let mut g = Graph::new();
    let mut nearest: Option<i64> = None;
    let mut min_distance = f64::INFINITY;

    for e in elements {
        if let Element::Node { id, lat, lon } = *e {
            let distance = earth_distance(lat, lon, center.lat, center.lon);
            if distance <= min_distance {
                min_distance = distance;
                nearest = Some(id);
            }

            g.add_node(id, lat, lon);
        }
    }

    if let Some(id) = nearest {
        g.set_start(id);
    }

    let mut ways: usize = 0;
    let mut skipped: usize = 0;
    for e in elements {
        if let Element::Way { id, nodes, .. } = e {
            if nodes.len() < 2 {
                log::debug!("skipping way {id} with less than 2 nodes");
                continue;
            }

            ways += 1;
            for pair in nodes.windows(2) {
                if g.get_node(pair[0]).is_none() || g.get_node(pair[1]).is_none() {
                    skipped += 1;
                    continue;
                }
                g.connect(pair[0], pair[1]);
            }
        }
    }

    log::info!(
        "built a graph with {} nodes and {} edges from {} ways",
        g.len(),
        g.edge_count(),
        ways
    );
    if skipped > 0 {
        log::debug!("skipped {skipped} way segments referencing unknown nodes");
    }

    g
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::osm::{FileFormat, StaticProvider};

    struct Fixed(Vec<Element>);

    impl RoadDataProvider for Fixed {
        async fn fetch(&self, _: Coordinates, _: &Options<'_>) -> Result<Vec<Element>, Error> {
            Ok(self.0.clone())
        }
    }

    struct Failing(Cell<usize>);

    impl RoadDataProvider for Failing {
        async fn fetch(&self, _: Coordinates, _: &Options<'_>) -> Result<Vec<Element>, Error> {
            self.0.set(self.0.get() + 1);
            Err(Error::Status(reqwest::StatusCode::GATEWAY_TIMEOUT))
        }
    }

    fn three_nodes() -> Vec<Element> {
        vec![
            Element::way(100, [1, 2, 3]),
            Element::node(1, 0.000, 0.000),
            Element::node(2, 0.001, 0.000),
            Element::node(3, 0.002, 0.000),
        ]
    }

    #[tokio::test]
    async fn build_three_nodes() {
        let g = build_graph(
            &Fixed(three_nodes()),
            Coordinates::new(0.001, 0.000),
            &Options::default(),
        )
        .await
        .unwrap();

        assert_eq!(g.len(), 3);
        assert_eq!(g.start_node().map(|n| n.id), Some(2));

        let mut neighbors: Vec<i64> = g.get_edges(2).map(|e| e.other(2)).collect();
        neighbors.sort();
        assert_eq!(neighbors, vec![1, 3]);
        assert!(!g.has_edge(1, 3));
    }

    #[tokio::test]
    async fn build_failure() {
        let provider = Failing(Cell::new(0));
        let result = build_graph(&provider, Coordinates::new(0.0, 0.0), &Options::default()).await;
        assert!(matches!(result, Err(Error::Status(_))));
        assert_eq!(provider.0.get(), 1);
    }

    #[tokio::test]
    async fn build_from_saved_response() {
        const DATA: &[u8] = include_bytes!("reader/test_fixtures/simple.json");
        let provider = StaticProvider::from_buffer(FileFormat::Unknown, DATA).unwrap();

        let g = build_graph(
            &provider,
            Coordinates::new(22.5727, 88.4345),
            &Options::default(),
        )
        .await
        .unwrap();

        // Node 6 is only used by a footway, and the 3-5 way is a sidewalk
        assert_eq!(g.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert_eq!(g.edge_count(), 4);
        assert!(g.has_edge(1, 2));
        assert!(g.has_edge(2, 3));
        assert!(g.has_edge(2, 4));
        assert!(g.has_edge(4, 5));
        assert!(!g.has_edge(3, 5));
        assert_eq!(g.start_node().map(|n| n.id), Some(1));
    }

    #[tokio::test]
    async fn nothing_within_radius() {
        const DATA: &[u8] = include_bytes!("reader/test_fixtures/simple.osm");
        let provider = StaticProvider::from_buffer(FileFormat::Xml, DATA).unwrap();

        let options = Options {
            radius: 100.0,
            ..Options::default()
        };
        let g = build_graph(&provider, Coordinates::new(22.60, 88.40), &options)
            .await
            .unwrap();

        assert!(g.is_empty());
        assert_eq!(g.start_node(), None);
    }

    #[test]
    fn no_nodes_no_start() {
        let g = graph_from_elements(&[Element::way(1, [1, 2])], Coordinates::new(0.0, 0.0));
        assert!(g.is_empty());
        assert_eq!(g.start_node(), None);
    }

    #[test]
    fn ways_referencing_missing_nodes() {
        let g = graph_from_elements(
            &[
                Element::way(1, [1, 42, 2, 3]),
                Element::way(2, [3]),
                Element::node(1, 0.0, 0.0),
                Element::node(2, 0.0, 0.001),
                Element::node(3, 0.0, 0.002),
            ],
            Coordinates::new(0.0, 0.0),
        );

        assert_eq!(g.len(), 3);
        assert!(!g.has_edge(1, 2));
        assert!(g.has_edge(2, 3));
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn duplicate_records() {
        let g = graph_from_elements(
            &[
                Element::way(1, [1, 2, 1, 2]),
                Element::way(2, [2, 1]),
                Element::node(1, 0.0, 0.0),
                Element::node(2, 0.0, 0.001),
                Element::node(1, 0.0, -0.001),
            ],
            Coordinates::new(0.0, 0.0),
        );

        assert_eq!(g.len(), 2);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.get_node(1).map(|n| n.lon), Some(-0.001));
    }

    #[test]
    fn start_node_ties_prefer_last() {
        let g = graph_from_elements(
            &[
                Element::node(1, 0.0, -0.001),
                Element::node(2, 0.0, 0.001),
            ],
            Coordinates::new(0.0, 0.0),
        );
        assert_eq!(g.start_node().map(|n| n.id), Some(2));
    }
}
