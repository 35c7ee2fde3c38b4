//! Connected components.

use std::collections::{BTreeSet, VecDeque};

use log::debug;
use petgraph::visit::{Bfs, VisitMap, Visitable};

use crate::error::{Error, Result};
use crate::types::Node;
use crate::RoadGraph;

/// All connected components, each as a set of nodes, in the order their first node was
/// added to the graph.
pub fn connected_components(graph: &RoadGraph) -> Vec<BTreeSet<Node>> {
    let g = graph.graph_map();
    let mut discovered = g.visit_map();
    let mut components = Vec::new();
    for root in g.nodes() {
        if discovered.is_visited(&root) {
            continue;
        }
        // One visit map shared by every search, so each node is walked once overall.
        let mut bfs = Bfs {
            stack: VecDeque::from(vec![root]),
            discovered,
        };
        bfs.discovered.visit(root);
        let mut component = BTreeSet::new();
        while let Some(n) = bfs.next(g) {
            component.insert(n);
        }
        discovered = bfs.discovered;
        components.push(component);
    }
    components
}

/// Independent copy of the largest connected component. When several components share the
/// largest size, the first one found wins.
pub fn extract_main_component(graph: &RoadGraph) -> Result<RoadGraph> {
    let components = connected_components(graph);
    let total = components.len();
    let main = components
        .into_iter()
        .fold(None, |best: Option<BTreeSet<Node>>, c| match best {
            Some(b) if b.len() >= c.len() => Some(b),
            _ => Some(c),
        })
        .ok_or(Error::EmptyGraph)?;
    debug!(
        "kept component of {} nodes out of {} ({} components)",
        main.len(),
        graph.node_count(),
        total
    );
    Ok(graph.subgraph(main.iter()))
}
