use std::f64;

use crate::types::{Bounds, Node};

/// Straight-line distance between two nodes in coordinate units.
#[inline]
pub fn euclidean_dist(a: &Node, b: &Node) -> f64 {
    ((a.lat - b.lat).powi(2) + (a.lon - b.lon).powi(2)).sqrt()
}

/// Length of a road: the sum of the distances between its consecutive points.
pub fn road_length(road: &[Node]) -> f64 {
    road.windows(2).map(|w| euclidean_dist(&w[0], &w[1])).sum()
}

/// Find the bounds over an iterator of nodes.
pub fn node_bounds<I: IntoIterator<Item = Node>>(nodes: I) -> Bounds {
    nodes.into_iter().fold(
        Bounds {
            north: f64::MIN,
            south: f64::MAX,
            east: f64::MIN,
            west: f64::MAX,
        },
        |b, n| Bounds {
            north: f64::max(b.north, n.lat),
            south: f64::min(b.south, n.lat),
            east: f64::max(b.east, n.lon),
            west: f64::min(b.west, n.lon),
        },
    )
}
