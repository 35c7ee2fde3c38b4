use criterion::{black_box, criterion_group, criterion_main, Criterion};

use roadgraph::{simplify, MapRuntime, Node, RoadGraph};

const M: usize = 60;

/// Street grid with every block side drawn as a three-point road, plus long avenues laid over
/// each fifth row that the splitter has to cut at every crossing.
fn mock_network(sz: usize) -> RoadGraph {
    let mut g = RoadGraph::new();
    for i in 0..sz {
        for j in 0..sz {
            let (x, y) = (i as f64, j as f64);
            if i + 1 < sz {
                g.add_road(vec![
                    Node::new(x, y),
                    Node::new(x + 0.5, y),
                    Node::new(x + 1.0, y),
                ]);
            }
            if j + 1 < sz && i % 5 != 0 {
                g.add_road(vec![Node::new(x, y), Node::new(x, y + 1.0)]);
            }
        }
        if i % 5 == 0 {
            g.add_road((0..sz).map(|j| Node::new(i as f64, j as f64)).collect());
        }
    }
    g
}

fn bench_simplify(c: &mut Criterion) {
    let raw = mock_network(M);
    c.bench_function("simplify 60x60", |b| {
        b.iter(|| simplify(black_box(raw.clone())).unwrap())
    });
}

fn bench_neighbours(c: &mut Criterion) {
    let graph = simplify(mock_network(M)).unwrap();
    let rt = MapRuntime::with_seed(graph, 42);
    let root = Node::new(30.0, 30.0);
    c.bench_function("neighbours 60x60", |b| {
        b.iter(|| rt.neighbours(black_box(&root)).unwrap())
    });
}

criterion_group!(benches, bench_simplify, bench_neighbours);
criterion_main!(benches);
