//! Adjacency JSON document for a built graph.
//!
//! The layout follows the node-link "adjacency" form used by common graph libraries:
//!
//! ```json
//! {
//!   "directed": false, "multigraph": false, "graph": {},
//!   "nodes": [{"id": [lat, lon]}, ...],
//!   "adjacency": [[{"id": [lat, lon], "road": [[lat, lon], ...], "dist": 1.5}, ...], ...]
//! }
//! ```
//!
//! `adjacency[i]` lists the edges of `nodes[i]`, so each edge appears once per endpoint.
//! Coordinates are always two-element arrays.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Edge, Node, Road};
use crate::RoadGraph;

#[derive(Debug, Serialize, Deserialize)]
struct NodeEntry {
    id: Node,
}

#[derive(Debug, Serialize, Deserialize)]
struct AdjacencyEntry {
    id: Node,
    road: Road,
    dist: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct AdjacencyDocument {
    #[serde(default)]
    directed: bool,
    #[serde(default)]
    multigraph: bool,
    #[serde(default)]
    graph: serde_json::Map<String, serde_json::Value>,
    nodes: Vec<NodeEntry>,
    adjacency: Vec<Vec<AdjacencyEntry>>,
}

impl AdjacencyDocument {
    fn from_graph(graph: &RoadGraph) -> AdjacencyDocument {
        let nodes = graph.nodes().map(|id| NodeEntry { id }).collect();
        let adjacency = graph
            .nodes()
            .map(|n| {
                graph
                    .incident(&n)
                    .into_iter()
                    .flatten()
                    .map(|(id, e)| AdjacencyEntry {
                        id,
                        road: e.road.clone(),
                        dist: e.dist,
                    })
                    .collect()
            })
            .collect();
        AdjacencyDocument {
            directed: false,
            multigraph: false,
            graph: serde_json::Map::new(),
            nodes,
            adjacency,
        }
    }

    fn into_graph(self) -> Result<RoadGraph> {
        if self.directed || self.multigraph {
            return Err(Error::Malformed(
                "expected an undirected simple graph".to_string(),
            ));
        }
        if self.nodes.len() != self.adjacency.len() {
            return Err(Error::Malformed(format!(
                "{} nodes but {} adjacency lists",
                self.nodes.len(),
                self.adjacency.len()
            )));
        }
        let mut graph = RoadGraph::new();
        for (node, entries) in self.nodes.into_iter().zip(self.adjacency) {
            let a = node.id;
            graph.add_node(a);
            for entry in entries {
                let b = entry.id;
                let ends = (entry.road.first().copied(), entry.road.last().copied());
                let valid = entry.road.len() >= 2
                    && a != b
                    && (ends == (Some(a), Some(b)) || ends == (Some(b), Some(a)));
                if !valid {
                    return Err(Error::Malformed(format!(
                        "road of edge ({}, {})-({}, {}) does not join its endpoints",
                        a.lat, a.lon, b.lat, b.lon
                    )));
                }
                graph.insert_edge(Edge {
                    road: entry.road,
                    dist: entry.dist,
                });
            }
        }
        Ok(graph)
    }
}

/// Write a graph document to any writer.
pub fn to_writer<W: Write>(writer: W, graph: &RoadGraph) -> Result<()> {
    serde_json::to_writer(writer, &AdjacencyDocument::from_graph(graph))?;
    Ok(())
}

/// Read a graph document from any reader.
pub fn from_reader<R: Read>(reader: R) -> Result<RoadGraph> {
    let doc: AdjacencyDocument = serde_json::from_reader(reader)?;
    doc.into_graph()
}

fn check_extension(path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(()),
        _ => Err(Error::UnsupportedExtension(path.to_path_buf())),
    }
}

/// Save a graph to a `.json` file.
pub fn save<P: AsRef<Path>>(path: P, graph: &RoadGraph) -> Result<()> {
    let path = path.as_ref();
    check_extension(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    to_writer(&mut writer, graph)?;
    writer.flush()?;
    debug!(
        "saved {} nodes, {} edges to {}",
        graph.node_count(),
        graph.edge_count(),
        path.display()
    );
    Ok(())
}

/// Load a graph from a `.json` file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<RoadGraph> {
    let path = path.as_ref();
    check_extension(path)?;
    let graph = from_reader(BufReader::new(File::open(path)?))?;
    debug!(
        "loaded {} nodes, {} edges from {}",
        graph.node_count(),
        graph.edge_count(),
        path.display()
    );
    Ok(graph)
}
