//! Benchmarks for the page-flow pipeline.
//!
//! Run with: cargo bench
//!
//! These benchmarks replay synthetic measurements, so no browser is needed.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use flowpage::layout::{build_frames, compose, extract, Pagination};
use flowpage::model::{PageSize, Rect, Resource};
use flowpage::surface::{ComputedStyle, RawTextNode, RenderSnapshot, SnapshotEngine};
use flowpage::{ConvertOptions, HighFidelityConverter};

/// Creates a synthetic measurement spanning roughly `page_count` A4 pages.
fn create_test_nodes(page_count: usize) -> Vec<RawTextNode> {
    let per_page = 40;
    (0..page_count * per_page)
        .map(|i| RawTextNode {
            text: format!("Line {} of benchmark content for layout reconstruction.", i),
            parent_tag: Some(if i % 10 == 0 { "H2" } else { "P" }.to_string()),
            rect: Rect::new(48.0, 24.0 + i as f64 * 27.0, 620.0, 19.0),
            style: Some(ComputedStyle {
                display: "block".into(),
                visibility: "visible".into(),
                opacity: "1".into(),
                color: "rgb(51, 51, 51)".into(),
                font_size: if i % 10 == 0 { "22px" } else { "16px" }.into(),
                font_family: "Georgia".into(),
                font_weight: if i % 10 == 0 { "700" } else { "400" }.into(),
                font_style: "normal".into(),
                text_align: "left".into(),
            }),
        })
        .collect()
}

/// Benchmark visibility filtering and style typing.
fn bench_extract(c: &mut Criterion) {
    let nodes = create_test_nodes(10);

    c.bench_function("extract_400_nodes", |b| {
        b.iter(|| extract(black_box(nodes.clone())));
    });
}

/// Benchmark pagination and composition at various sizes.
fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");

    for page_count in [1, 10, 50].iter() {
        let items = extract(create_test_nodes(*page_count));

        group.bench_function(format!("paginate_{}_pages", page_count), |b| {
            b.iter(|| Pagination::paginate(PageSize::A4_PORTRAIT, 0.0, black_box(&items)));
        });

        let pagination = Pagination::paginate(PageSize::A4_PORTRAIT, 0.0, &items);
        for parallel in [false, true] {
            let name = format!(
                "compose_{}_pages_{}",
                page_count,
                if parallel { "parallel" } else { "sequential" }
            );
            group.bench_function(name, |b| {
                b.iter(|| {
                    let backgrounds = (0..pagination.page_count())
                        .map(|_| Resource::png(Vec::new()))
                        .collect();
                    let frames = build_frames(&pagination, items.clone(), backgrounds).unwrap();
                    compose(black_box(frames), "Arial", parallel)
                });
            });
        }
    }

    group.finish();
}

/// Benchmark the full pipeline through DOCX assembly.
fn bench_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");
    group.sample_size(20);

    let options = ConvertOptions::new()
        .with_settle_delay(Duration::ZERO)
        .with_device_scale_factor(0.1);

    for page_count in [1, 5].iter() {
        let snapshot = RenderSnapshot::new(0.0, create_test_nodes(*page_count));
        let converter = HighFidelityConverter::new(SnapshotEngine::new(snapshot));

        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter(|| {
                converter
                    .convert_html(black_box("<p>benchmark</p>"), &options)
                    .unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_extract, bench_layout, bench_convert);
criterion_main!(benches);
