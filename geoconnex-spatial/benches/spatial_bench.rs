//! Catchment index benchmarks.
//!
//! Measures:
//! - Build time (store construction + R-tree bulk load)
//! - Point query latency (envelope prefilter + exact refine)
//! - Box query latency

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use geoconnex_spatial::{Catchment, CatchmentIndex, GeometryStore};

// ============================================================================
// Test Data Generation
// ============================================================================

/// Generate a hexagonal catchment at a given center.
fn generate_hexagon(id: i64, center_lng: f64, center_lat: f64, size_deg: f64) -> Catchment {
    let r = size_deg / 2.0;
    let mut coords = Vec::with_capacity(7);
    for i in 0..6 {
        let angle = (i as f64) * std::f64::consts::PI / 3.0;
        let x = center_lng + r * angle.cos();
        let y = center_lat + r * angle.sin();
        coords.push(format!("{} {}", x, y));
    }
    coords.push(coords[0].clone());
    Catchment::from_wkt(id, &format!("POLYGON(({}))", coords.join(", "))).unwrap()
}

/// Lay out `count` catchments on a square grid covering the continental US.
fn generate_catchments(count: usize) -> Vec<Catchment> {
    let side = (count as f64).sqrt().ceil() as usize;
    let step_lng = 58.0 / side as f64;
    let step_lat = 25.0 / side as f64;
    (0..count)
        .map(|i| {
            let (row, col) = (i / side, i % side);
            generate_hexagon(
                i as i64,
                -125.0 + col as f64 * step_lng,
                24.0 + row as f64 * step_lat,
                step_lng.min(step_lat),
            )
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for count in [1_000usize, 10_000, 100_000] {
        let catchments = generate_catchments(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &catchments, |b, cs| {
            b.iter(|| {
                let store = GeometryStore::new(cs.clone()).unwrap();
                black_box(CatchmentIndex::build(store))
            })
        });
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let store = GeometryStore::new(generate_catchments(100_000)).unwrap();
    let index = CatchmentIndex::build(store);

    c.bench_function("query_point", |b| {
        b.iter(|| black_box(index.query_point(black_box(-98.31), black_box(38.72))))
    });
    c.bench_function("query_box_1deg", |b| {
        b.iter(|| black_box(index.query_box(-99.0, 38.0, -98.0, 39.0)))
    });
}

criterion_group!(benches, bench_build, bench_queries);
criterion_main!(benches);
