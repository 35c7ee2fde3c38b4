use std::collections::BTreeSet;

use log::trace;
use petgraph::graphmap::UnGraphMap;

mod types;
pub use types::*;
mod error;
pub use error::{Error, ErrorKind, Result};
pub mod component;
pub mod ingest;
pub mod join;
pub mod persist;
pub mod pipeline;
pub mod runtime;
pub mod split;
pub mod util;
pub use pipeline::{build_from_geojson, simplify};
pub use runtime::{clean_edge, GameRound, MapRuntime, RoundConfig, RoundStart};
use util::{node_bounds, road_length};

/// `RoadGraph` is an undirected simple graph of street intersections. Nodes are identified by
/// their coordinates, and every edge carries the road polyline between its two endpoints.
/// Nodes and edges iterate in insertion order, so everything derived from a graph built the
/// same way is the same.
#[derive(Debug, Clone, Default)]
pub struct RoadGraph {
    g: UnGraphMap<Node, Edge>,
}

impl RoadGraph {
    pub fn new() -> RoadGraph {
        RoadGraph::default()
    }

    /// The underlying graph map, for running graph algorithms on.
    pub fn graph_map(&self) -> &UnGraphMap<Node, Edge> {
        &self.g
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.g.node_count()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.g.edge_count()
    }

    /// Graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.g.node_count() == 0
    }

    pub fn contains_node(&self, n: &Node) -> bool {
        self.g.contains_node(*n)
    }

    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.g.nodes()
    }

    /// Neighbours of `n`, or `None` if `n` is not in the graph.
    pub fn neighbours(&self, n: &Node) -> Option<impl Iterator<Item = Node> + '_> {
        if self.g.contains_node(*n) {
            Some(self.g.neighbors(*n))
        } else {
            None
        }
    }

    /// Edges incident to `n` as `(other endpoint, edge)`, or `None` if `n` is not in the
    /// graph.
    pub fn incident(&self, n: &Node) -> Option<impl Iterator<Item = (Node, &Edge)> + '_> {
        if self.g.contains_node(*n) {
            Some(self.g.edges(*n).map(|(_, other, e)| (other, e)))
        } else {
            None
        }
    }

    pub fn degree(&self, n: &Node) -> usize {
        self.g.neighbors(*n).count()
    }

    pub fn edge(&self, a: &Node, b: &Node) -> Option<&Edge> {
        self.g.edge_weight(*a, *b)
    }

    /// Every undirected edge once, as `(a, b, edge)` with `a < b`.
    pub fn edges(&self) -> impl Iterator<Item = (Node, Node, &Edge)> {
        self.g.all_edges()
    }

    /// Add a node without edges. Does nothing if it already exists.
    pub fn add_node(&mut self, n: Node) {
        self.g.add_node(n);
    }

    /// Connect the endpoints of `road` with it, computing the edge distance from the road. A
    /// previous edge between the same endpoints is replaced. Roads that close on themselves
    /// would be self-loops and are refused; returns whether the edge was inserted.
    pub fn add_road(&mut self, road: Road) -> bool {
        let dist = road_length(&road);
        self.insert_edge(Edge { road, dist })
    }

    /// Like [`RoadGraph::add_road`] but keeps the given distance.
    pub fn insert_edge(&mut self, edge: Edge) -> bool {
        let (a, b) = match (edge.road.first(), edge.road.last()) {
            (Some(&a), Some(&b)) if a != b => (a, b),
            _ => {
                trace!("refusing degenerate road of {} points", edge.road.len());
                return false;
            }
        };
        self.g.add_edge(a, b, edge);
        true
    }

    /// Remove the edge between `a` and `b`, keeping both nodes.
    pub fn remove_edge(&mut self, a: &Node, b: &Node) -> Option<Edge> {
        self.g.remove_edge(*a, *b)
    }

    /// Remove a node together with all of its edges.
    pub fn remove_node(&mut self, n: &Node) -> bool {
        self.g.remove_node(*n)
    }

    /// Sum of all edge distances.
    pub fn total_length(&self) -> f64 {
        self.edges().map(|(_, _, e)| e.dist).sum()
    }

    /// Return the lat/lon boundaries of the graph's nodes.
    pub fn bbox(&self) -> Bounds {
        node_bounds(self.nodes())
    }

    /// Independent copy of the subgraph induced by `keep`.
    pub fn subgraph<'a, I: IntoIterator<Item = &'a Node>>(&self, keep: I) -> RoadGraph {
        let keep: BTreeSet<Node> = keep.into_iter().copied().collect();
        let mut sub = RoadGraph::new();
        for n in self.nodes().filter(|n| keep.contains(n)) {
            sub.g.add_node(n);
        }
        for (a, b, e) in self.edges() {
            if keep.contains(&a) && keep.contains(&b) {
                sub.g.add_edge(a, b, e.clone());
            }
        }
        sub
    }
}

/// Two graphs are equal when they have the same nodes and the same edges, whatever order they
/// were added in.
impl PartialEq for RoadGraph {
    fn eq(&self, other: &RoadGraph) -> bool {
        self.node_count() == other.node_count()
            && self.edge_count() == other.edge_count()
            && self.nodes().all(|n| other.contains_node(&n))
            && self
                .edges()
                .all(|(a, b, e)| other.edge(&a, &b) == Some(e))
    }
}
