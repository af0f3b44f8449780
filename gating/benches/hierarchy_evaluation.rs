//! Hierarchy evaluation benchmarks
//!
//! Measures a five-gate strategy (rectangle -> polygon, with an ellipsoid,
//! a quadrant gate and a boolean gate below the polygon) over typical event
//! counts, and the multi-sample path in parallel and sequential mode.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use flow_gating::*;
use std::hint::black_box;

/// Generate a synthetic event table with uniform channel values
fn generate_events(n_events: usize, seed: u64) -> EventTable {
    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    let mut rng = StdRng::seed_from_u64(seed);
    let columns: Vec<(&str, Vec<f64>)> = ["FSC-A", "SSC-A", "CD3", "CD4"]
        .into_iter()
        .map(|name| {
            let values: Vec<f64> = (0..n_events).map(|_| rng.random_range(0.0..1000.0)).collect();
            (name, values)
        })
        .collect();

    EventTable::from_columns(columns).unwrap()
}

fn build_hierarchy(config: GatingConfig) -> GatingHierarchy {
    let lymph = RectangleGate::new(vec![
        Dimension::new("FSC-A")
            .with_range(Some(200.0), Some(950.0))
            .unwrap(),
    ])
    .unwrap();
    let singlets = PolygonGate::new(
        vec![Dimension::new("FSC-A"), Dimension::new("SSC-A")],
        vec![(150.0, 100.0), (950.0, 150.0), (900.0, 900.0), (300.0, 800.0)],
    )
    .unwrap();
    let t_cells = EllipsoidGate::new(
        vec![Dimension::new("CD3"), Dimension::new("CD4")],
        vec![500.0, 500.0],
        vec![vec![40000.0, 10000.0], vec![10000.0, 30000.0]],
        1.5,
    )
    .unwrap();
    let quad = QuadrantGate::new(
        vec![
            Divider::new("CD3", "CD3", vec![500.0]).unwrap(),
            Divider::new("CD4", "CD4", vec![500.0]).unwrap(),
        ],
        vec![
            Quadrant::new("CD3+CD4+", vec!["CD3", "CD4"], vec![
                (Some(500.0), None),
                (Some(500.0), None),
            ])
            .unwrap(),
            Quadrant::new("CD3+CD4-", vec!["CD3", "CD4"], vec![
                (Some(500.0), None),
                (None, Some(500.0)),
            ])
            .unwrap(),
        ],
    )
    .unwrap();
    let either = BooleanGate::new(BooleanOp::Or, vec![
        GateRef::new("TCells", ["Lymph", "Singlets"]),
        GateRef::quadrant("Quad", "CD3+CD4+", ["Lymph", "Singlets"]),
    ])
    .unwrap();

    let singlets_path = GatePath::from(["Lymph", "Singlets"]);
    let mut builder = GatingHierarchyBuilder::with_config(config);
    builder
        .add_gate(Gate::new("Lymph", lymph), GatePath::root())
        .unwrap();
    builder
        .add_gate(Gate::new("Singlets", singlets).with_parent("Lymph"), ["Lymph"])
        .unwrap();
    builder
        .add_gate(
            Gate::new("TCells", t_cells).with_parent("Singlets"),
            singlets_path.clone(),
        )
        .unwrap();
    builder
        .add_gate(
            Gate::new("Quad", quad).with_parent("Singlets"),
            singlets_path.clone(),
        )
        .unwrap();
    builder
        .add_gate(Gate::new("Either", either).with_parent("Singlets"), singlets_path)
        .unwrap();
    builder.build().unwrap()
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let hierarchy = build_hierarchy(GatingConfig::default());

    // Typical acquisition sizes
    for &n_events in &[10_000, 100_000, 1_000_000] {
        let events = generate_events(n_events, 42);

        group.throughput(Throughput::Elements(n_events as u64));
        group.bench_with_input(BenchmarkId::new("five_gates", n_events), &events, |b, ev| {
            b.iter(|| black_box(hierarchy.evaluate(ev)).unwrap());
        });
    }

    group.finish();
}

fn bench_gate_samples(c: &mut Criterion) {
    let mut group = c.benchmark_group("gate_samples");
    let samples: Vec<(String, EventTable)> = (0..8)
        .map(|idx| (format!("sample-{}", idx), generate_events(50_000, idx)))
        .collect();

    for parallel in [true, false] {
        let config = GatingConfig::new()
            .parallel_samples(parallel)
            .build()
            .unwrap();
        let hierarchy = build_hierarchy(config);
        let label = if parallel { "parallel" } else { "sequential" };

        group.throughput(Throughput::Elements(8 * 50_000));
        group.bench_function(label, |b| {
            b.iter(|| black_box(hierarchy.gate_samples(&samples)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_evaluate, bench_gate_samples);
criterion_main!(benches);
