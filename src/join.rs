//! Remove pass-through nodes by joining their two roads.

use log::debug;

use crate::component::extract_main_component;
use crate::error::Result;
use crate::types::{Node, Road};
use crate::RoadGraph;

/// Merge the two roads of a degree-2 node into one road running through it, with the
/// duplicated shared point dropped. Returns `None` if `node` is not of degree 2.
pub fn joined_road(graph: &RoadGraph, node: &Node) -> Option<Road> {
    let mut roads = graph.incident(node)?.map(|(_, e)| &e.road);
    let (left, right) = (roads.next()?, roads.next()?);
    if roads.next().is_some() {
        return None;
    }
    let (mut left, mut right) = (left.clone(), right.clone());
    // Left must end at the node, right must start there.
    if left.first() == Some(node) {
        left.reverse();
    }
    if right.last() == Some(node) {
        right.reverse();
    }
    left.extend(right.into_iter().skip(1));
    Some(left)
}

/// One pass over every node that has degree 2 at the start of the pass. Nodes are re-checked
/// before merging, since earlier merges in the same pass change degrees. Returns the number
/// of nodes removed.
pub fn joiner(graph: &mut RoadGraph) -> usize {
    let candidates: Vec<Node> = graph
        .nodes()
        .filter(|n| graph.degree(n) == 2)
        .collect();
    let mut merged = 0;
    for node in candidates {
        if let Some(road) = joined_road(graph, &node) {
            graph.remove_node(&node);
            graph.add_road(road);
            merged += 1;
        }
    }
    merged
}

/// Join roads until no degree-2 node is left, then keep the main component again.
pub fn join_all(mut graph: RoadGraph) -> Result<RoadGraph> {
    let mut passes = 0;
    loop {
        let merged = joiner(&mut graph);
        if merged == 0 {
            break;
        }
        passes += 1;
        debug!("join pass {}: removed {} pass-through nodes", passes, merged);
    }
    extract_main_component(&graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::connected_components;

    fn n(lat: f64, lon: f64) -> Node {
        Node::new(lat, lon)
    }

    #[test]
    fn test_join_through_middle_node() {
        let (a, m, b) = (n(0.0, 0.0), n(0.0, 1.0), n(0.0, 3.0));
        let mut g = RoadGraph::new();
        g.add_road(vec![a, m]);
        g.add_road(vec![m, b]);
        let g = join_all(g).unwrap();
        assert!(!g.contains_node(&m));
        assert_eq!(g.node_count(), 2);
        let e = g.edge(&a, &b).unwrap();
        assert_eq!(e.dist, 3.0);
        assert!(e.road == vec![a, m, b] || e.road == vec![b, m, a]);
    }

    #[test]
    fn test_roads_are_oriented_before_joining() {
        let (a, m, b) = (n(0.0, 0.0), n(1.0, 1.0), n(2.0, 0.0));
        let mut g = RoadGraph::new();
        // Both roads start at the middle node.
        g.add_road(vec![m, n(0.5, 1.0), a]);
        g.add_road(vec![m, n(1.5, 1.0), b]);
        let road = joined_road(&g, &m).unwrap();
        assert_eq!(road.len(), 5);
        assert_eq!(road[2], m);
        assert!(road[0] == a || road[0] == b);
        assert_eq!(road.iter().filter(|&&p| p == m).count(), 1);
    }

    #[test]
    fn test_chain_collapses_to_one_edge() {
        let mut g = RoadGraph::new();
        let pts: Vec<Node> = (0..6).map(|i| n(0.0, i as f64)).collect();
        for w in pts.windows(2) {
            g.add_road(w.to_vec());
        }
        // Give both ends a spur so they are junctions of degree 3 rather than dead ends.
        for (end, dy) in [(pts[0], -1.0), (pts[5], 1.0)] {
            g.add_road(vec![end, n(1.0, end.lon + dy)]);
            g.add_road(vec![end, n(-1.0, end.lon + dy)]);
        }
        let g = join_all(g).unwrap();
        let e = g.edge(&pts[0], &pts[5]).unwrap();
        assert_eq!(e.road.len(), 6);
        assert_eq!(e.dist, 5.0);
        assert_eq!(g.node_count(), 6);
    }

    #[test]
    fn test_join_is_idempotent() {
        let mut g = RoadGraph::new();
        for i in 0..4 {
            for j in 0..4 {
                let here = n(i as f64, j as f64);
                if i < 3 {
                    g.add_road(vec![here, n(i as f64 + 1.0, j as f64)]);
                }
                if j < 3 {
                    g.add_road(vec![here, n(i as f64, j as f64 + 1.0)]);
                }
            }
        }
        let once = join_all(g).unwrap();
        assert!(once.nodes().all(|n| once.degree(&n) != 2));
        let mut twice = once.clone();
        assert_eq!(joiner(&mut twice), 0);
        assert_eq!(twice, once);
        assert_eq!(connected_components(&once).len(), 1);
    }

    #[test]
    fn test_triangle_of_degree_two_nodes() {
        let (a, b, c) = (n(0.0, 0.0), n(0.0, 1.0), n(1.0, 0.0));
        let mut g = RoadGraph::new();
        g.add_road(vec![a, b]);
        g.add_road(vec![b, c]);
        g.add_road(vec![c, a]);
        let g = join_all(g).unwrap();
        assert!(g.nodes().all(|n| g.degree(&n) != 2));
        assert_eq!(connected_components(&g).len(), 1);
    }
}
