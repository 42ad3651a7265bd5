//! Benchmark for radial hierarchy layout and rendering.

use chartlink::prelude::*;
use chartlink::radial::partition;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

// `years` branches with twelve monthly leaves each.
fn rainfall(years: usize) -> Hierarchy {
    let children = (0..years)
        .map(|y| {
            let months = (0..12)
                .map(|m| HierarchyNode::leaf(format!("m{m}"), ((y * 12 + m) % 17) as f32 + 1.0))
                .collect();
            HierarchyNode::internal(format!("{}", 1900 + y), months)
        })
        .collect();
    Hierarchy::new(HierarchyNode::internal("rain", children))
}

fn sunburst_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("sunburst");

    for years in [10, 100, 1_000] {
        let hierarchy = rainfall(years);

        group.bench_with_input(BenchmarkId::new("partition", years), &years, |b, _| {
            b.iter(|| partition(black_box(&hierarchy.root), 250.0));
        });

        group.bench_with_input(BenchmarkId::new("render", years), &years, |b, _| {
            b.iter(|| {
                let mut engine = RadialEngine::new(Canvas::default());
                engine
                    .render(black_box(hierarchy.clone()), RadialOptions::default())
                    .unwrap()
            });
        });

        group.bench_with_input(BenchmarkId::new("zoom_relayout", years), &years, |b, _| {
            let mut engine = RadialEngine::new(Canvas::default());
            engine.render(hierarchy.clone(), RadialOptions::default()).unwrap();
            let mut k = 1.0;
            b.iter(|| {
                k = if k >= 8.0 { 1.5 } else { k + 0.5 };
                engine.on_zoom(black_box(ZoomTransform::new(0.0, 0.0, k))).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, sunburst_benchmark);
criterion_main!(benches);
