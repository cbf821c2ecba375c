//! BoundsIndex - per-row rectangles in scroll-content space
//!
//! Pure geometry: a rebuild reads transforms and never touches visibility.
//! Storage is reused across rebuilds, so a steady-state rebuild with an
//! unchanged row set does not allocate.

use crate::model::{Rect, RowKey, RowTransform, Vec2};
use std::collections::HashMap;

/// Default multiplier applied to the largest row extent to get the margin.
pub const DEFAULT_MARGIN_FACTOR: f32 = 1.5;

/// One indexed row.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedBounds {
    /// Row key.
    pub key: RowKey,
    /// Bounds relative to the content origin.
    pub bounds: Rect,
}

/// Bounds of every managed row, in row order.
#[derive(Debug, Clone)]
pub struct BoundsIndex {
    entries: Vec<IndexedBounds>,
    positions: HashMap<RowKey, usize>,
    margin_factor: f32,
    max_extent: Vec2,
    extent: Option<Rect>,
}

impl BoundsIndex {
    /// Create an empty index using `margin_factor` for the culling margin.
    pub fn new(margin_factor: f32) -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
            margin_factor,
            max_extent: Vec2::ZERO,
            extent: None,
        }
    }

    /// Recompute every row's bounds relative to `content_origin`.
    ///
    /// Rows are recorded in iteration order. Zero-area rows are indexed like
    /// any other; they behave as points when culled. A key that appears twice
    /// keeps its last bounds.
    pub fn rebuild<I>(&mut self, content_origin: Vec2, rows: I)
    where
        I: IntoIterator<Item = (RowKey, RowTransform)>,
    {
        self.entries.clear();
        self.positions.clear();
        self.max_extent = Vec2::ZERO;
        self.extent = None;

        for (key, transform) in rows {
            let bounds = transform.bounds_in(content_origin);
            self.max_extent = self.max_extent.max(bounds.size());
            self.extent = Some(match self.extent {
                Some(extent) => extent.union(&bounds),
                None => bounds,
            });

            if let Some(&pos) = self.positions.get(&key) {
                self.entries[pos].bounds = bounds;
                continue;
            }
            self.positions.insert(key.clone(), self.entries.len());
            self.entries.push(IndexedBounds { key, bounds });
        }
    }

    /// Per-axis margin: `margin_factor` times the largest row width/height
    /// seen by the last rebuild.
    pub fn margin(&self) -> Vec2 {
        self.max_extent * self.margin_factor
    }

    /// Multiplier used for the margin.
    pub fn margin_factor(&self) -> f32 {
        self.margin_factor
    }

    /// Largest row width and height seen by the last rebuild.
    pub fn max_extent(&self) -> Vec2 {
        self.max_extent
    }

    /// Union of all indexed bounds, or `None` when empty.
    pub fn content_extent(&self) -> Option<Rect> {
        self.extent
    }

    /// Bounds of `key`, if indexed.
    pub fn get(&self, key: &str) -> Option<Rect> {
        self.positions.get(key).map(|&pos| self.entries[pos].bounds)
    }

    /// Indexed rows in row order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexedBounds> {
        self.entries.iter()
    }

    /// Number of indexed rows.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry, keeping capacity.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
        self.max_extent = Vec2::ZERO;
        self.extent = None;
    }
}

impl Default for BoundsIndex {
    fn default() -> Self {
        Self::new(DEFAULT_MARGIN_FACTOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> RowKey {
        RowKey::new(s).expect("valid test key")
    }

    fn at(x: f32, y: f32, w: f32, h: f32) -> RowTransform {
        RowTransform::new(Vec2::new(x, y), Vec2::new(w, h))
    }

    #[test]
    fn rebuild_indexes_rows_relative_to_origin() {
        let mut index = BoundsIndex::default();
        index.rebuild(
            Vec2::new(0.0, 100.0),
            vec![(key("a"), at(0.0, 100.0, 50.0, 10.0)), (key("b"), at(0.0, 110.0, 50.0, 20.0))],
        );

        assert_eq!(index.len(), 2);
        assert_eq!(
            index.get("a"),
            Some(Rect::from_corners(Vec2::new(0.0, 0.0), Vec2::new(50.0, 10.0)))
        );
        assert_eq!(
            index.get("b"),
            Some(Rect::from_corners(Vec2::new(0.0, 10.0), Vec2::new(50.0, 30.0)))
        );
        let keys: Vec<_> = index.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn margin_is_factor_times_largest_extent_per_axis() {
        let mut index = BoundsIndex::new(1.5);
        index.rebuild(
            Vec2::ZERO,
            vec![(key("a"), at(0.0, 0.0, 40.0, 10.0)), (key("b"), at(0.0, 10.0, 20.0, 30.0))],
        );
        assert_eq!(index.max_extent(), Vec2::new(40.0, 30.0));
        assert_eq!(index.margin(), Vec2::new(60.0, 45.0));
    }

    #[test]
    fn degenerate_rows_are_still_indexed() {
        let mut index = BoundsIndex::default();
        index.rebuild(Vec2::ZERO, vec![(key("dot"), at(5.0, 5.0, 0.0, 0.0))]);
        let bounds = index.get("dot").expect("point row indexed");
        assert!(bounds.is_degenerate());
        assert_eq!(bounds.min, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn non_finite_transform_is_indexed_as_point() {
        let mut index = BoundsIndex::default();
        index.rebuild(Vec2::ZERO, vec![(key("nan"), at(f32::NAN, 2.0, f32::NAN, 0.0))]);
        assert!(index.get("nan").is_some());
    }

    #[test]
    fn rebuild_replaces_previous_contents() {
        let mut index = BoundsIndex::default();
        index.rebuild(Vec2::ZERO, vec![(key("a"), at(0.0, 0.0, 1.0, 1.0))]);
        index.rebuild(Vec2::ZERO, vec![(key("b"), at(0.0, 0.0, 1.0, 1.0))]);
        assert!(index.get("a").is_none());
        assert!(index.get("b").is_some());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn duplicate_key_keeps_last_bounds() {
        let mut index = BoundsIndex::default();
        index.rebuild(
            Vec2::ZERO,
            vec![(key("a"), at(0.0, 0.0, 1.0, 1.0)), (key("a"), at(0.0, 5.0, 1.0, 1.0))],
        );
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("a").map(|b| b.min.y), Some(5.0));
    }

    #[test]
    fn content_extent_is_union_of_rows() {
        let mut index = BoundsIndex::default();
        assert!(index.content_extent().is_none());
        index.rebuild(
            Vec2::ZERO,
            vec![(key("a"), at(0.0, 0.0, 10.0, 10.0)), (key("b"), at(0.0, 10.0, 30.0, 10.0))],
        );
        assert_eq!(
            index.content_extent(),
            Some(Rect::from_corners(Vec2::ZERO, Vec2::new(30.0, 20.0)))
        );
    }

    #[test]
    fn clear_empties_index_and_margin() {
        let mut index = BoundsIndex::default();
        index.rebuild(Vec2::ZERO, vec![(key("a"), at(0.0, 0.0, 10.0, 10.0))]);
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.margin(), Vec2::ZERO);
    }
}
