//! Culling and refresh benchmarks against the headless host.
//!
//! Measures the three per-frame paths: a scroll-driven visibility pass, a
//! steady-state refresh with unchanged content, and a full rebuild.
//!
//! Run with: cargo bench --bench culling_benchmark

#![allow(missing_docs)] // criterion macros generate undocumented items

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use vrows::engine::{EngineConfig, RowSink, VirtualScroll};
use vrows::model::{RowContent, RowKey, Vec2};
use vrows::sim::{SimContainer, SimFactory};

type Engine = VirtualScroll<SimFactory, SimContainer>;

const SIZES: [usize; 3] = [100, 1_000, 10_000];

/// Row declarations for `count` storage rows.
fn rows(count: usize) -> Vec<(RowKey, RowContent)> {
    (0..count)
        .map(|i| {
            let key = RowKey::new(format!("item:{i}")).expect("non-empty key");
            let content = RowContent::Storage {
                label: format!("Item {i}"),
                amount: i as f64,
                amount_text: format!("{i}.0 kg"),
                icon: None,
            };
            (key, content)
        })
        .collect()
}

fn push_all(engine: &mut Engine, rows: &[(RowKey, RowContent)]) {
    engine
        .refresh(|batch| {
            for (key, content) in rows {
                batch.push(key, content);
            }
        })
        .expect("container alive");
}

/// Engine with every row pushed, laid out and measured. Not measured itself.
fn settled(rows: &[(RowKey, RowContent)]) -> (Engine, SimContainer) {
    let container = SimContainer::new(Vec2::new(400.0, 600.0));
    let mut engine = VirtualScroll::new(SimFactory::new(&container), &EngineConfig::default());
    engine
        .initialize(container.clone())
        .expect("fresh engine initializes");
    push_all(&mut engine, rows);
    container.layout();
    engine.tick();
    (engine, container)
}

/// One viewport-height scroll followed by a visibility pass.
fn benchmark_scroll_cull(c: &mut Criterion) {
    let mut group = c.benchmark_group("scroll_cull");

    for size in SIZES {
        let rows = rows(size);
        let (mut engine, container) = settled(&rows);
        let height = container.content_height();
        let mut y = 0.0f32;

        group.bench_with_input(BenchmarkId::new("rows", size), &size, |b, _| {
            b.iter(|| {
                y = (y + 600.0) % height.max(1.0);
                container.scroll_to(Vec2::new(0.0, y));
                black_box(engine.on_scroll().expect("container alive"))
            });
        });
    }

    group.finish();
}

/// A frame where nothing changed: every push is a content comparison.
fn benchmark_steady_refresh(c: &mut Criterion) {
    let mut group = c.benchmark_group("steady_refresh");

    for size in SIZES {
        let rows = rows(size);
        let (mut engine, _container) = settled(&rows);

        group.bench_with_input(BenchmarkId::new("rows", size), &size, |b, _| {
            b.iter(|| {
                push_all(&mut engine, &rows);
                black_box(engine.tick())
            });
        });
    }

    group.finish();
}

/// Thaw, re-measure every row, and re-cull.
fn benchmark_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild");

    for size in SIZES {
        let rows = rows(size);

        group.bench_with_input(BenchmarkId::new("rows", size), &size, |b, _| {
            b.iter_batched(
                || {
                    let (mut engine, container) = settled(&rows);
                    engine.mark_layout_dirty().expect("container alive");
                    container.layout();
                    (engine, container)
                },
                |(mut engine, container)| {
                    black_box(engine.tick());
                    (engine, container)
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_scroll_cull,
    benchmark_steady_refresh,
    benchmark_rebuild
);
criterion_main!(benches);
