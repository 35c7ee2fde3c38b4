//! The offline build: raw network in, game graph out.

use std::io::Read;

use log::info;

use crate::component::extract_main_component;
use crate::error::Result;
use crate::ingest::roads_from_json;
use crate::join::join_all;
use crate::split::split_all;
use crate::types::Bounds;
use crate::RoadGraph;

/// Turn a raw graph into a game graph: split roads at the nodes they pass through, keep the
/// main component, join away pass-through nodes, and keep the main component of the result.
pub fn simplify(mut raw: RoadGraph) -> Result<RoadGraph> {
    let passes = split_all(&mut raw);
    info!(
        "split roads in {} passes: {} nodes, {} edges",
        passes,
        raw.node_count(),
        raw.edge_count()
    );
    let main = extract_main_component(&raw)?;
    info!(
        "main component: {} nodes, {} edges",
        main.node_count(),
        main.edge_count()
    );
    let joined = join_all(main)?;
    info!(
        "joined roads: {} nodes, {} edges",
        joined.node_count(),
        joined.edge_count()
    );
    Ok(joined)
}

/// Read GeoJSON and simplify it.
pub fn build_from_geojson<R: Read>(reader: R, b: Option<Bounds>) -> Result<RoadGraph> {
    let raw = roads_from_json(reader, b)?;
    info!(
        "raw network: {} nodes, {} edges",
        raw.node_count(),
        raw.edge_count()
    );
    simplify(raw)
}
