use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Represent some map coordinate, generally in degrees. A node is identified by its exact
/// coordinates: two nodes are the same iff both ordinates are equal.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Node {
    pub lat: f64,
    pub lon: f64,
}

impl Node {
    /// Negative zero is folded into zero so that equality, ordering and hashing agree.
    pub fn new(lat: f64, lon: f64) -> Node {
        Node {
            lat: lat + 0.0,
            lon: lon + 0.0,
        }
    }
}

impl From<[f64; 2]> for Node {
    fn from(pair: [f64; 2]) -> Node {
        Node::new(pair[0], pair[1])
    }
}

impl From<Node> for [f64; 2] {
    fn from(n: Node) -> [f64; 2] {
        [n.lat, n.lon]
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Node) -> Ordering {
        self.lat
            .total_cmp(&other.lat)
            .then_with(|| self.lon.total_cmp(&other.lon))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Node) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lat.to_bits().hash(state);
        self.lon.to_bits().hash(state);
    }
}

/// Ordered polyline physically connecting two nodes.
pub type Road = Vec<Node>;

/// Undirected connection between two nodes. `dist` is the length of `road`.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub road: Road,
    pub dist: f64,
}

/// Represent some map bounds, generally in degrees.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    /// North-south extent.
    pub fn range_lat(&self) -> f64 {
        self.north - self.south
    }
    pub fn range_lon(&self) -> f64 {
        self.east - self.west
    }
    /// Inclusive containment test.
    pub fn contains(&self, n: &Node) -> bool {
        self.south <= n.lat && n.lat <= self.north && self.west <= n.lon && n.lon <= self.east
    }
}
