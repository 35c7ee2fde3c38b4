//! Read a GeoJSON street network into a raw [`RoadGraph`].

use std::io::Read;

use geojson::{GeoJson, Geometry, Value};
use log::{debug, warn};

use crate::error::{Error, Result};
use crate::types::{Bounds, Node, Road};
use crate::RoadGraph;

/// Build a graph with one edge per line feature, connecting the first and last point of the
/// line. GeoJSON positions are `[lon, lat]`, so the axes are swapped on the way in. Closed
/// lines are skipped, other geometries are ignored and, when two lines share both endpoints,
/// the later one replaces the earlier. If bounds are given, only lines lying entirely inside
/// them are kept.
pub fn roads_from_json<R: Read>(reader: R, b: Option<Bounds>) -> Result<RoadGraph> {
    let json: GeoJson = serde_json::from_reader(reader)?;
    let geometries: Vec<Geometry> = match json {
        GeoJson::FeatureCollection(fc) => {
            fc.features.into_iter().filter_map(|f| f.geometry).collect()
        }
        GeoJson::Feature(f) => f.geometry.into_iter().collect(),
        GeoJson::Geometry(g) => vec![g],
    };

    let mut graph = RoadGraph::new();
    let mut skipped_loops = 0;
    for geometry in geometries {
        let lines = match geometry.value {
            Value::LineString(positions) => vec![positions],
            Value::MultiLineString(lines) => lines,
            _ => continue,
        };
        for positions in lines {
            let road = positions
                .iter()
                .map(|pos| match pos.as_slice() {
                    [lon, lat, ..] => Ok(Node::new(*lat, *lon)),
                    _ => Err(Error::Malformed(format!(
                        "position with {} ordinates",
                        pos.len()
                    ))),
                })
                .collect::<Result<Road>>()?;
            if road.len() < 2 {
                warn!("skipping line with {} position(s)", road.len());
                continue;
            }
            if let Some(b) = b {
                if !road.iter().all(|n| b.contains(n)) {
                    continue;
                }
            }
            // Closed lines have no distinct endpoints to connect.
            if road[0] == road[road.len() - 1] {
                skipped_loops += 1;
                continue;
            }
            graph.add_road(road);
        }
    }
    debug!(
        "ingested {} nodes, {} edges ({} closed lines skipped)",
        graph.node_count(),
        graph.edge_count(),
        skipped_loops
    );
    Ok(graph)
}
