//! Serve game rounds and local neighbourhoods from a built graph.
//!
//! A [`MapRuntime`] owns the graph for the lifetime of the process. Starting a round needs
//! `&mut self`, so a caller sharing one runtime between concurrent requests has to serialise
//! access to it (a `Mutex` is enough); neighbourhood queries only read.

use std::collections::{BTreeSet, VecDeque};
use std::path::Path;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::persist;
use crate::types::{Node, Road};
use crate::util::euclidean_dist;
use crate::RoadGraph;

/// Most neighbours returned by one query.
pub const MAX_NEIGHBOURS: usize = 50;
/// Entries deeper than this many hops wait until the shallow queue is drained.
pub const DEPTH_THRESHOLD: usize = 4;

/// Parameters for picking a start and end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundConfig {
    /// Preferred scaled distance between start and end. Also bounds the number of sampling
    /// attempts, since the threshold drops by one after every failed attempt.
    pub min_distance: i64,
    /// Multiplier turning coordinate distance into threshold units.
    pub accuracy: f64,
}

impl Default for RoundConfig {
    fn default() -> RoundConfig {
        RoundConfig {
            min_distance: 100,
            accuracy: 1000.0,
        }
    }
}

/// The current start/end pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GameRound {
    /// Serial of the runtime that started the round.
    pub serial: u32,
    /// Rounds started by that runtime so far, this one included.
    pub number: u64,
    pub start: Node,
    pub end: Node,
}

/// Everything a client needs to begin playing a round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundStart {
    pub start: Node,
    pub end: Node,
    pub neighbours: Vec<(Node, Road)>,
}

/// Orient a road so it begins at whichever end lies nearer to `start`. Ties, and roads of a
/// single point, keep their order.
pub fn clean_edge(road: &[Node], start: &Node) -> Road {
    let mut cleaned = road.to_vec();
    if let (Some(first), Some(last)) = (road.first(), road.last()) {
        if road.len() > 1 && euclidean_dist(start, last) < euclidean_dist(start, first) {
            cleaned.reverse();
        }
    }
    cleaned
}

struct Step {
    from: Node,
    path: Road,
    to: Node,
    depth: usize,
}

pub struct MapRuntime {
    graph: RoadGraph,
    nodes: Vec<Node>,
    serial: u32,
    rounds: u64,
    round: Option<GameRound>,
    rng: StdRng,
}

impl MapRuntime {
    pub fn new(graph: RoadGraph) -> MapRuntime {
        MapRuntime::with_rng(graph, StdRng::from_entropy())
    }

    /// Runtime with a reproducible sequence of rounds.
    pub fn with_seed(graph: RoadGraph, seed: u64) -> MapRuntime {
        MapRuntime::with_rng(graph, StdRng::seed_from_u64(seed))
    }

    fn with_rng(graph: RoadGraph, mut rng: StdRng) -> MapRuntime {
        let nodes = graph.nodes().collect();
        let serial = rng.gen_range(0..=200);
        info!(
            "map {} ready: {} nodes, {} edges",
            serial,
            graph.node_count(),
            graph.edge_count()
        );
        MapRuntime {
            graph,
            nodes,
            serial,
            rounds: 0,
            round: None,
            rng,
        }
    }

    /// Load a saved graph and build a runtime around it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<MapRuntime> {
        Ok(MapRuntime::new(persist::load(path)?))
    }

    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// The active round, if one was started.
    pub fn round(&self) -> Option<&GameRound> {
        self.round.as_ref()
    }

    /// Pick two distinct nodes at least `min_distance` apart once scaled by `accuracy`. The
    /// threshold is lowered by one after each failed sample, for `min_distance + 1` samples in
    /// total. Pairs whose scaled distance is zero are never accepted.
    pub fn generate_start_end(&mut self, min_distance: i64, accuracy: f64) -> Result<(Node, Node)> {
        self.sample_start_end(min_distance, accuracy)
            .map(|(start, end, _)| (start, end))
    }

    fn sample_start_end(&mut self, min_distance: i64, accuracy: f64) -> Result<(Node, Node, u64)> {
        if self.nodes.len() < 2 {
            return Err(Error::Validation(format!(
                "need at least 2 nodes, graph has {}",
                self.nodes.len()
            )));
        }
        if min_distance < 0 {
            return Err(Error::Validation(format!(
                "minimum distance {} is negative",
                min_distance
            )));
        }
        if !(accuracy.is_finite() && accuracy > 0.0) {
            return Err(Error::Validation(format!(
                "accuracy {} is not a positive number",
                accuracy
            )));
        }

        for i in 0..=min_distance {
            let picked = rand::seq::index::sample(&mut self.rng, self.nodes.len(), 2);
            let (start, end) = (self.nodes[picked.index(0)], self.nodes[picked.index(1)]);
            let scaled = euclidean_dist(&start, &end) * accuracy;
            if scaled > 0.0 && scaled >= (min_distance - i) as f64 {
                return Ok((start, end, i as u64 + 1));
            }
        }
        Err(Error::Exhausted {
            attempts: min_distance as u64 + 1,
        })
    }

    /// Start a new round, replacing the previous one, and return it with the neighbourhood of
    /// its start.
    pub fn begin_round(&mut self, min_distance: i64, accuracy: f64) -> Result<RoundStart> {
        let (start, end, attempts) = self.sample_start_end(min_distance, accuracy)?;
        self.rounds += 1;
        let round = GameRound {
            serial: self.serial,
            number: self.rounds,
            start,
            end,
        };
        debug!(
            "map {} round {}: ({}, {}) -> ({}, {}) after {} attempts",
            round.serial, round.number, start.lat, start.lon, end.lat, end.lon, attempts
        );
        self.round = Some(round);
        Ok(RoundStart {
            start,
            end,
            neighbours: self.neighbours(&start)?,
        })
    }

    /// Explore outward from `root` and return up to [`MAX_NEIGHBOURS`] reachable nodes, each
    /// with the walk from `root` to it. Exploration is breadth first, except that entries more
    /// than [`DEPTH_THRESHOLD`] hops out are set aside until the shallow queue is empty.
    pub fn neighbours(&self, root: &Node) -> Result<Vec<(Node, Road)>> {
        let first = self
            .graph
            .neighbours(root)
            .ok_or(Error::UnknownNode(*root))?;

        let mut found: Vec<(Node, Road)> = Vec::new();
        let mut explored: BTreeSet<Node> = BTreeSet::new();
        explored.insert(*root);
        let mut shallow: VecDeque<Step> = first
            .map(|to| Step {
                from: *root,
                path: Vec::new(),
                to,
                depth: 0,
            })
            .collect();
        let mut deep: VecDeque<Step> = VecDeque::new();

        while found.len() < MAX_NEIGHBOURS {
            let step = match shallow.pop_front() {
                Some(step) if step.depth > DEPTH_THRESHOLD => {
                    // Set aside as is: the entry keeps its own origin and path.
                    deep.push_back(step);
                    continue;
                }
                Some(step) => step,
                None => match deep.pop_front() {
                    Some(step) => step,
                    None => break,
                },
            };
            if !explored.insert(step.to) {
                continue;
            }
            let edge = match self.graph.edge(&step.from, &step.to) {
                Some(edge) => edge,
                None => continue,
            };
            let mut path = step.path;
            path.extend(clean_edge(&edge.road, &step.from));

            for next in self.graph.neighbours(&step.to).into_iter().flatten() {
                if !explored.contains(&next) {
                    shallow.push_back(Step {
                        from: step.to,
                        path: path.clone(),
                        to: next,
                        depth: step.depth + 1,
                    });
                }
            }
            found.push((step.to, path));
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn n(lat: f64, lon: f64) -> Node {
        Node::new(lat, lon)
    }

    fn grid(size: usize) -> RoadGraph {
        let mut g = RoadGraph::new();
        for i in 0..size {
            for j in 0..size {
                let here = n(i as f64, j as f64);
                if i + 1 < size {
                    g.add_road(vec![here, n(i as f64 + 0.5, j as f64), n(i as f64 + 1.0, j as f64)]);
                }
                if j + 1 < size {
                    g.add_road(vec![here, n(i as f64, j as f64 + 1.0)]);
                }
            }
        }
        g
    }

    fn chain(len: usize) -> RoadGraph {
        let mut g = RoadGraph::new();
        for i in 0..len {
            g.add_road(vec![n(0.0, i as f64), n(0.0, i as f64 + 1.0)]);
        }
        g
    }

    #[test]
    fn test_clean_edge_orientation() {
        let road = vec![n(0.0, 0.0), n(0.0, 1.0), n(0.0, 2.0)];
        assert_eq!(clean_edge(&road, &n(0.0, 0.1)), road);
        let rev: Road = road.iter().rev().copied().collect();
        assert_eq!(clean_edge(&road, &n(0.0, 1.9)), rev);
        // Equidistant: keep the order.
        assert_eq!(clean_edge(&road, &n(5.0, 1.0)), road);
        assert_eq!(clean_edge(&road[..1], &n(9.0, 9.0)), road[..1].to_vec());
        assert!(clean_edge(&[], &n(0.0, 0.0)).is_empty());
    }

    #[test]
    fn test_collinear_round_first_attempt() {
        let g = chain(2);
        for seed in 0..20 {
            let mut rt = MapRuntime::with_seed(g.clone(), seed);
            let (start, end, attempts) = rt.sample_start_end(0, 1.0).unwrap();
            assert_eq!(attempts, 1);
            assert_ne!(start, end);
        }
    }

    #[test]
    fn test_threshold_relaxes_by_one() {
        // Only one pair exists, at scaled distance 1: thresholds 5, 4, 3, 2 fail and 1 passes.
        let mut rt = MapRuntime::with_seed(chain(1), 7);
        let (_, _, attempts) = rt.sample_start_end(5, 1.0).unwrap();
        assert_eq!(attempts, 5);
    }

    #[test]
    fn test_coincident_pair_exhausts() {
        // Distinct nodes whose computed distance underflows to zero.
        let mut g = RoadGraph::new();
        g.add_road(vec![n(0.0, 1e-200), n(0.0, 2e-200)]);
        assert_eq!(euclidean_dist(&n(0.0, 1e-200), &n(0.0, 2e-200)), 0.0);
        let mut rt = MapRuntime::with_seed(g, 3);
        match rt.generate_start_end(3, 1000.0) {
            Err(Error::Exhausted { attempts }) => assert_eq!(attempts, 4),
            other => panic!("expected exhaustion, got {:?}", other),
        }
        assert_eq!(
            rt.begin_round(0, 1000.0).unwrap_err().kind(),
            crate::ErrorKind::Exhaustion
        );
        assert!(rt.round().is_none());
    }

    #[test]
    fn test_round_validation() {
        let mut rt = MapRuntime::with_seed(chain(1), 1);
        for (min_distance, accuracy) in [(-1, 1.0), (1, 0.0), (1, -2.0), (1, f64::NAN)] {
            let err = rt.generate_start_end(min_distance, accuracy).unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
        let mut single = RoadGraph::new();
        single.add_node(n(1.0, 1.0));
        let err = MapRuntime::with_seed(single, 1)
            .generate_start_end(0, 1.0)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_begin_round_replaces_round() {
        let mut rt = MapRuntime::with_seed(grid(4), 11);
        let first = rt.begin_round(0, 1.0).unwrap();
        assert_eq!(rt.round().unwrap().number, 1);
        assert_eq!(rt.round().unwrap().start, first.start);
        assert_eq!(first.neighbours, rt.neighbours(&first.start).unwrap());
        assert!(rt.graph().contains_node(&first.end));

        let cfg = RoundConfig::default();
        rt.begin_round(cfg.min_distance, cfg.accuracy).unwrap();
        let round = rt.round().unwrap();
        assert_eq!(round.number, 2);
        assert_eq!(round.serial, rt.serial());
        assert!(euclidean_dist(&round.start, &round.end) > 0.0);
    }

    #[test]
    fn test_neighbours_bounded_and_unique() {
        let g = grid(12);
        let rt = MapRuntime::with_seed(g, 5);
        for root in [n(0.0, 0.0), n(6.0, 6.0), n(11.0, 3.0)] {
            let found = rt.neighbours(&root).unwrap();
            assert_eq!(found.len(), MAX_NEIGHBOURS);
            let unique: HashSet<Node> = found.iter().map(|(p, _)| *p).collect();
            assert_eq!(unique.len(), found.len());
            assert!(!unique.contains(&root));
        }
    }

    #[test]
    fn test_paths_are_walks_from_root() {
        let g = grid(5);
        let rt = MapRuntime::with_seed(g.clone(), 5);
        let root = n(2.0, 2.0);
        let found = rt.neighbours(&root).unwrap();
        assert_eq!(found.len(), 24);
        for (node, path) in &found {
            assert_eq!(path.first(), Some(&root));
            assert_eq!(path.last(), Some(node));
            // Consecutive points are at most one grid step apart, and only repeat where one
            // road ends and the next begins.
            for w in path.windows(2) {
                let d = euclidean_dist(&w[0], &w[1]);
                assert!(d <= 1.0);
                if d == 0.0 {
                    assert!(rt.graph().contains_node(&w[0]));
                }
            }
        }
        // Direct neighbours come first, with just their own road.
        let (_, path) = &found[0];
        assert!(path.len() <= 3);
    }

    #[test]
    fn test_deep_nodes_keep_full_paths() {
        let g = chain(9);
        let rt = MapRuntime::with_seed(g, 2);
        let root = n(0.0, 0.0);
        let found = rt.neighbours(&root).unwrap();
        assert_eq!(found.len(), 9);
        for (i, (node, path)) in found.iter().enumerate() {
            // Each hop appends its whole road, so every junction on the way appears twice.
            let expected: Road = (0..=i)
                .flat_map(|k| vec![n(0.0, k as f64), n(0.0, k as f64 + 1.0)])
                .collect();
            assert_eq!(*node, n(0.0, (i + 1) as f64));
            assert_eq!(*path, expected);
        }
        assert_eq!(
            found[1].1,
            vec![n(0.0, 0.0), n(0.0, 1.0), n(0.0, 1.0), n(0.0, 2.0)]
        );
    }

    #[test]
    fn test_unknown_root() {
        let rt = MapRuntime::with_seed(chain(2), 2);
        let err = rt.neighbours(&n(3.0, 3.0)).unwrap_err();
        assert!(matches!(err, Error::UnknownNode(_)));
        assert!(err.kind().is_client_error());
    }

    #[test]
    fn test_isolated_root_has_no_neighbours() {
        let mut g = chain(1);
        g.add_node(n(7.0, 7.0));
        let rt = MapRuntime::with_seed(g, 2);
        assert!(rt.neighbours(&n(7.0, 7.0)).unwrap().is_empty());
    }
}
