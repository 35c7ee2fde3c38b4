//! Cut roads at interior points that are themselves graph nodes.

use std::collections::BTreeSet;

use log::debug;

use crate::types::{Node, Road};
use crate::RoadGraph;

/// A road to cut, and the interior nodes to cut it at.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPlan {
    pub ends: (Node, Node),
    pub road: Road,
    pub at: BTreeSet<Node>,
}

/// Find every edge whose road passes through another node of the graph.
pub fn to_split(graph: &RoadGraph) -> Vec<SplitPlan> {
    graph
        .edges()
        .filter(|(_, _, e)| e.road.len() >= 3)
        .filter_map(|(a, b, e)| {
            let at: BTreeSet<Node> = e.road[1..e.road.len() - 1]
                .iter()
                .filter(|p| graph.contains_node(p))
                .copied()
                .collect();
            if at.is_empty() {
                None
            } else {
                Some(SplitPlan {
                    ends: (a, b),
                    road: e.road.clone(),
                    at,
                })
            }
        })
        .collect()
}

/// Break a road into consecutive segments at the given points. Adjacent segments share the
/// point they were cut at. Only interior points are cut at.
pub fn cut_road(road: &[Node], at: &BTreeSet<Node>) -> Vec<Road> {
    let mut segments = Vec::new();
    let mut start = 0;
    for (i, p) in road.iter().enumerate().take(road.len().saturating_sub(1)).skip(1) {
        if at.contains(p) {
            segments.push(road[start..=i].to_vec());
            start = i;
        }
    }
    segments.push(road[start..].to_vec());
    segments
}

/// Apply one round of split plans: the edges being cut are removed, then their segments are
/// added. Returns the number of segments added.
pub fn splitter(graph: &mut RoadGraph, plans: &[SplitPlan]) -> usize {
    for plan in plans {
        graph.remove_edge(&plan.ends.0, &plan.ends.1);
    }
    let mut added = 0;
    for plan in plans {
        for segment in cut_road(&plan.road, &plan.at) {
            // A road that revisits a cut point yields a self-loop, which add_road refuses.
            if graph.add_road(segment) {
                added += 1;
            }
        }
    }
    added
}

/// Split roads until no road runs through a node. Returns the number of passes that changed
/// the graph.
pub fn split_all(graph: &mut RoadGraph) -> usize {
    let mut passes = 0;
    loop {
        let plans = to_split(graph);
        if plans.is_empty() {
            break;
        }
        let added = splitter(graph, &plans);
        passes += 1;
        debug!(
            "split pass {}: {} roads cut into {} segments",
            passes,
            plans.len(),
            added
        );
    }
    passes
}
