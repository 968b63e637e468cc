use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use geoshard::{
    BsPartitioner, BspConfig, GridConfig, NPoint, SpatialGridPartitioner, SpatialPartitioner,
};

/// Clustered synthetic points: half uniform over 1000x1000, half packed into
/// a 20x20 corner, the shape that separates the two strategies.
fn clustered_points(n: usize) -> Vec<NPoint> {
    let mut state: u64 = 0xbeef;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 33) as f64 / (u32::MAX >> 1) as f64
    };
    (0..n)
        .map(|i| {
            if i % 2 == 0 {
                NPoint::new(next() * 1000.0, next() * 1000.0)
            } else {
                NPoint::new(next() * 20.0, next() * 20.0)
            }
        })
        .collect()
}

fn benchmark_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for &n in &[1_000usize, 10_000, 100_000] {
        let points = clustered_points(n);
        group.bench_with_input(BenchmarkId::new("grid", n), &points, |b, points| {
            b.iter(|| {
                SpatialGridPartitioner::from_keys(black_box(points), &GridConfig::new(16)).unwrap()
            })
        });
        group.bench_with_input(BenchmarkId::new("bsp", n), &points, |b, points| {
            b.iter(|| {
                BsPartitioner::from_keys(
                    black_box(points),
                    &BspConfig::new(10.0, n / 64 + 1),
                )
                .unwrap()
            })
        });
    }

    group.finish();
}

fn benchmark_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("routing");

    let points = clustered_points(100_000);
    let grid = SpatialGridPartitioner::from_keys(&points, &GridConfig::new(16)).unwrap();
    let bsp = BsPartitioner::from_keys(&points, &BspConfig::new(10.0, 2000)).unwrap();

    group.bench_function("grid_partition", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % points.len();
            grid.partition(black_box(&points[i])).unwrap()
        })
    });
    group.bench_function("bsp_partition", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % points.len();
            bsp.partition(black_box(&points[i])).unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_build, benchmark_routing);
criterion_main!(benches);
