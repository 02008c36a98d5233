use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rcsp::BiDirectional;
use sysinfo::{get_current_pid, ProcessRefreshKind, System};

/// Random layered instance: `layers` ranks of `width` vertices, arcs
/// between consecutive ranks plus occasional rank skips, two resources.
fn random_instance(rng: &mut StdRng, layers: usize, width: usize) -> BiDirectional {
    let n = layers * width + 2;
    let source = 0;
    let sink = n - 1;
    let vertex = |layer: usize, slot: usize| 1 + layer * width + slot;

    let max_res = vec![(layers + 2) as f64, (layers * 6) as f64];
    let mut alg = BiDirectional::new(n, 0, source, sink, max_res, vec![0.0, 0.0]).unwrap();
    let ids: Vec<usize> = (0..n).collect();
    alg.add_nodes(&ids);

    for slot in 0..width {
        let weight = rng.gen_range(-2.0..8.0);
        let res = rng.gen_range(0.5..4.0);
        alg.add_edge(source, vertex(0, slot), weight, &[1.0, res])
            .unwrap();
    }
    for layer in 0..layers - 1 {
        for from in 0..width {
            for to in 0..width {
                if rng.gen_bool(0.6) {
                    let weight = rng.gen_range(-2.0..8.0);
                    let res = rng.gen_range(0.5..4.0);
                    alg.add_edge(vertex(layer, from), vertex(layer + 1, to), weight, &[1.0, res])
                        .unwrap();
                }
            }
        }
    }
    for slot in 0..width {
        let weight = rng.gen_range(-2.0..8.0);
        let res = rng.gen_range(0.5..4.0);
        alg.add_edge(vertex(layers - 1, slot), sink, weight, &[1.0, res])
            .unwrap();
    }
    alg
}

fn rss_kib() -> u64 {
    let mut sys = System::new();
    sys.refresh_processes_specifics(ProcessRefreshKind::new());
    if let Some(p) = sys.process(get_current_pid().unwrap()) {
        p.memory()
    } else {
        0
    }
}

fn bench_bidirectional(c: &mut Criterion) {
    let mut group = c.benchmark_group("bidirectional_search");
    for &(layers, width) in &[(8usize, 4usize), (16, 6), (24, 8)] {
        group.bench_function(format!("layers_{layers}_width_{width}"), |b| {
            let mut rng = StdRng::seed_from_u64(42);
            b.iter_batched(
                || random_instance(&mut rng, layers, width),
                |mut alg| {
                    alg.run().unwrap();
                    alg.total_cost()
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
    eprintln!("rss after benches: {} KiB", rss_kib());
}

criterion_group!(benches, bench_bidirectional);
criterion_main!(benches);
