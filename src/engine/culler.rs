//! VisibilityCuller - flips row widgets on and off as the viewport moves
//!
//! A pass compares each indexed row's desired visibility with its current
//! flag and only calls into the widget when they differ. Repeating a pass
//! with the same viewport and bounds therefore issues zero toggles.

use super::bounds::BoundsIndex;
use super::pool::RowPool;
use crate::host::{RowWidget, WidgetFactory};
use crate::model::{Row, RowKey, Viewport};
use std::collections::HashSet;
use tracing::trace;

/// Result of one visibility pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CullReport {
    /// Rows enabled after the pass.
    pub visible: usize,
    /// Rows disabled after the pass.
    pub hidden: usize,
    /// Widgets whose enabled state actually changed.
    pub toggles: usize,
}

/// Decides which pooled rows are enabled.
#[derive(Debug, Default)]
pub struct VisibilityCuller {
    pinned: HashSet<RowKey>,
    last_viewport: Option<Viewport>,
}

impl VisibilityCuller {
    /// Create a culler with no pinned rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable rows intersecting the padded viewport or pinned; disable the rest.
    ///
    /// The viewport is padded by [`BoundsIndex::margin`]. Only active rows are
    /// touched; released rows stay disabled. Keys that vanished from the pool
    /// since the last rebuild are skipped.
    pub fn update_visibility<F: WidgetFactory>(
        &mut self,
        viewport: &Viewport,
        bounds: &BoundsIndex,
        pool: &mut RowPool<F>,
    ) -> CullReport {
        self.last_viewport = Some(*viewport);
        let padded = viewport.padded(bounds.margin());
        let mut report = CullReport::default();

        for entry in bounds.iter() {
            let Some(row) = pool.get_active_mut(entry.key.as_str()) else {
                continue;
            };
            let pinned = self.pinned.contains(&entry.key);
            let wanted = pinned || entry.bounds.intersects(&padded);
            row.pinned = pinned;
            apply_visibility(row, wanted, &mut report);
        }

        // Pinned rows acquired after the last rebuild have no bounds yet.
        for key in &self.pinned {
            if bounds.get(key.as_str()).is_some() {
                continue;
            }
            if let Some(row) = pool.get_active_mut(key.as_str()) {
                row.pinned = true;
                apply_visibility(row, true, &mut report);
            }
        }

        trace!(
            visible = report.visible,
            hidden = report.hidden,
            toggles = report.toggles,
            "visibility pass"
        );
        report
    }

    /// Force `key` visible and run one incremental pass.
    pub fn pin<F: WidgetFactory>(
        &mut self,
        key: RowKey,
        bounds: &BoundsIndex,
        pool: &mut RowPool<F>,
    ) -> CullReport {
        self.pinned.insert(key);
        self.rerun(bounds, pool)
    }

    /// Release the force-show on `key` and run one incremental pass.
    pub fn unpin<F: WidgetFactory>(
        &mut self,
        key: &RowKey,
        bounds: &BoundsIndex,
        pool: &mut RowPool<F>,
    ) -> CullReport {
        if self.pinned.remove(key) {
            if let Some(row) = pool.get_mut(key.as_str()) {
                row.pinned = false;
            }
        }
        self.rerun(bounds, pool)
    }

    fn rerun<F: WidgetFactory>(&mut self, bounds: &BoundsIndex, pool: &mut RowPool<F>) -> CullReport {
        match self.last_viewport {
            Some(viewport) => self.update_visibility(&viewport, bounds, pool),
            // No viewport yet: only pins can be honored.
            None => {
                let mut report = CullReport::default();
                for key in &self.pinned {
                    if let Some(row) = pool.get_active_mut(key.as_str()) {
                        row.pinned = true;
                        apply_visibility(row, true, &mut report);
                    }
                }
                report
            }
        }
    }

    /// Whether `key` is pinned.
    pub fn is_pinned(&self, key: &str) -> bool {
        self.pinned.contains(key)
    }

    /// Pinned keys.
    pub fn pinned(&self) -> impl Iterator<Item = &RowKey> {
        self.pinned.iter()
    }

    /// Viewport used by the most recent pass.
    pub fn last_viewport(&self) -> Option<Viewport> {
        self.last_viewport
    }

    /// Forget pins and the last viewport.
    pub fn clear(&mut self) {
        self.pinned.clear();
        self.last_viewport = None;
    }
}

fn apply_visibility<W: RowWidget>(row: &mut Row<W>, wanted: bool, report: &mut CullReport) {
    if row.visible != wanted {
        row.widget.set_enabled(wanted);
        row.visible = wanted;
        report.toggles += 1;
    }
    if wanted {
        report.visible += 1;
    } else {
        report.hidden += 1;
    }
}

#[cfg(test)]
#[path = "culler_tests.rs"]
mod tests;
