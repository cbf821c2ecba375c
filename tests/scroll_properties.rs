//! Property-based tests for culling against the headless host.
//!
//! Rows get random heights and the container is scrolled to random offsets.
//! After every scroll the only observable that matters is which widgets are
//! enabled, and that must match the padded-viewport rule exactly.

use proptest::prelude::*;
use vrows::engine::{EngineConfig, RowSink, TickOutcome, VirtualScroll};
use vrows::host::ScrollContainer;
use vrows::model::{RowContent, RowKey, Vec2, Viewport};
use vrows::sim::{SimContainer, SimFactory};

const VIEWPORT: Vec2 = Vec2::new(240.0, 120.0);

type Engine = VirtualScroll<SimFactory, SimContainer>;

fn row_key(i: usize) -> RowKey {
    RowKey::new(format!("row{i}")).expect("non-empty key")
}

fn storage(i: usize) -> RowContent {
    RowContent::Storage {
        label: format!("item {i}"),
        amount: i as f64,
        amount_text: format!("{i} kg"),
        icon: None,
    }
}

/// Engine with one row per entry of `heights`, refreshed, laid out and rebuilt once.
fn build(heights: &[u32], margin_factor: f32) -> (Engine, SimContainer) {
    let container = SimContainer::new(VIEWPORT);
    let factory = heights
        .iter()
        .enumerate()
        .fold(SimFactory::new(&container), |f, (i, h)| {
            f.with_height(row_key(i).as_str(), *h)
        });
    let config = EngineConfig {
        margin_factor,
        ..EngineConfig::default()
    };
    let mut engine = VirtualScroll::new(factory, &config);
    engine
        .initialize(container.clone())
        .expect("fresh engine initializes");

    let rows: Vec<(RowKey, RowContent)> = (0..heights.len()).map(|i| (row_key(i), storage(i))).collect();
    engine
        .refresh(|batch| {
            for (k, c) in &rows {
                batch.push(k, c);
            }
        })
        .expect("container alive");
    assert!(container.layout());
    assert!(matches!(engine.tick(), TickOutcome::Rebuilt(_)));
    (engine, container)
}

/// Keys whose enabled state disagrees with the padded-viewport rule.
fn mismatches(engine: &Engine, container: &SimContainer) -> Vec<String> {
    let viewport = Viewport::from_scroll(container.scroll_offset(), container.viewport_size());
    let padded = viewport.padded(engine.bounds().margin());
    engine
        .bounds()
        .iter()
        .filter(|entry| {
            let expected = engine.culler().is_pinned(entry.key.as_str()) || entry.bounds.intersects(&padded);
            engine.is_visible(entry.key.as_str()) != expected
        })
        .map(|entry| entry.key.to_string())
        .collect()
}

// ===== Arbitrary Strategies =====

fn arb_heights() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(1u32..80, 1..120)
}

fn arb_scrolls() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(0.0f32..6000.0, 1..20)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Rows stack in push order: each row starts where the previous ended.
    #[test]
    fn measured_bounds_follow_the_stack(heights in arb_heights()) {
        let (engine, container) = build(&heights, 0.0);

        let mut expected_y = 0.0f32;
        for (i, h) in heights.iter().enumerate() {
            let bounds = engine.bounds().get(row_key(i).as_str());
            prop_assert!(bounds.is_some(), "row {} was measured", i);
            let bounds = bounds.unwrap_or_default();
            prop_assert_eq!(bounds.min.y, expected_y);
            prop_assert_eq!(bounds.size().y, *h as f32);
            expected_y += *h as f32;
        }
        prop_assert_eq!(container.content_height(), expected_y);
    }

    /// After any scroll, enabled rows are exactly those meeting the padded viewport.
    #[test]
    fn visibility_tracks_every_scroll(
        heights in arb_heights(),
        scrolls in arb_scrolls(),
        margin_factor in 0.0f32..2.0,
    ) {
        let (mut engine, container) = build(&heights, margin_factor);
        prop_assert!(mismatches(&engine, &container).is_empty());

        for y in scrolls {
            container.scroll_to(Vec2::new(0.0, y));
            engine.on_scroll().expect("container alive");
            let wrong = mismatches(&engine, &container);
            prop_assert!(wrong.is_empty(), "mismatched rows at y={}: {:?}", y, wrong);
        }
    }

    /// Re-culling with an unchanged offset never calls into a widget.
    #[test]
    fn repeated_scroll_is_free(heights in arb_heights(), y in 0.0f32..4000.0) {
        let (mut engine, container) = build(&heights, 1.5);
        container.scroll_to(Vec2::new(0.0, y));
        engine.on_scroll().expect("container alive");

        let again = engine.on_scroll().expect("container alive");

        prop_assert_eq!(again.toggles, 0);
    }

    /// Pinned rows stay enabled wherever the viewport goes.
    #[test]
    fn pinned_row_survives_scrolling(
        heights in prop::collection::vec(10u32..40, 20..60),
        pick in any::<prop::sample::Index>(),
        scrolls in arb_scrolls(),
    ) {
        let (mut engine, container) = build(&heights, 0.0);
        let pinned = row_key(pick.index(heights.len()));
        engine.pin(pinned.clone());

        for y in scrolls {
            container.scroll_to(Vec2::new(0.0, y));
            engine.on_scroll().expect("container alive");
            prop_assert!(engine.is_visible(pinned.as_str()));
        }
    }
}
