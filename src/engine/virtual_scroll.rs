//! VirtualScroll - the host-facing virtualization component
//!
//! Ties the pool, bounds index, culler and scheduler to one scroll container.
//! The host drives it through three hooks:
//!
//! - [`VirtualScroll::tick`] at the start of each frame, running the rebuild
//!   requested during the previous one;
//! - [`VirtualScroll::refresh`] once per frame after the tick, pushing the
//!   rows that should exist in display order;
//! - [`VirtualScroll::on_scroll`] whenever the scroll offset or container size
//!   changes.
//!
//! The host lays out between the end of one frame and the tick of the next,
//! so bounds are always measured from a layout that saw the last mutation.
//! Rows that still report no transform are measured again on a later tick.

use super::bounds::BoundsIndex;
use super::culler::{CullReport, VisibilityCuller};
use super::pool::{AcquireKind, RowPool};
use super::scheduler::{LayoutState, RebuildScheduler, RebuildSummary, TickOutcome};
use super::stats::EngineStats;
use super::EngineConfig;
use crate::host::{RowWidget, ScrollContainer, WidgetFactory};
use crate::model::{EngineError, Row, RowContent, RowKey, Viewport, WidgetError};
use std::collections::HashSet;
use std::mem::discriminant;
use tracing::{debug, info, warn};

/// Consecutive rebuilds that may ask again because rows were not laid out.
const MAX_MEASURE_RETRIES: u32 = 3;

/// Receives the rows a panel wants this frame, in display order.
pub trait RowSink {
    /// Declare row `key` with `content`.
    ///
    /// Content equal to what the row already shows is not re-applied, so
    /// callers should keep their content cached and pass it by reference.
    fn push(&mut self, key: &RowKey, content: &RowContent);
}

/// Outcome of one [`VirtualScroll::refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshReport {
    /// Rows pushed.
    pub rows: usize,
    /// Rows constructed.
    pub created: usize,
    /// Pooled rows brought back.
    pub reactivated: usize,
    /// Rows released this frame.
    pub deactivated: usize,
    /// Rows destroyed by the high-water trim.
    pub destroyed: usize,
    /// Rows whose content was re-applied.
    pub updated: usize,
    /// Whether the refresh asked for a rebuild.
    pub rebuild_requested: bool,
}

#[derive(Debug, Default)]
struct Counters {
    toggles: u64,
    visibility_passes: u64,
    degraded_rows: u64,
    unchanged_content: u64,
}

/// One frame's worth of row declarations.
pub struct RowBatch<'a, F: WidgetFactory, C: ScrollContainer> {
    pool: &'a mut RowPool<F>,
    scheduler: &'a mut RebuildScheduler,
    container: &'a mut C,
    needed: &'a mut HashSet<RowKey>,
    order: &'a mut Vec<RowKey>,
    counters: &'a mut Counters,
    report: RefreshReport,
    structural: bool,
}

impl<F: WidgetFactory, C: ScrollContainer> RowBatch<'_, F, C> {
    fn apply_content(row: &mut Row<F::Widget>, content: &RowContent, counters: &mut Counters) {
        row.content.clone_from(content);
        match row.widget.apply(&row.content) {
            Ok(()) => {}
            Err(WidgetError::MissingPart(part)) => {
                counters.degraded_rows += 1;
                warn!(key = %row.key(), %part, "row template incomplete; rendering without it");
            }
            Err(WidgetError::Destroyed) => {
                debug!(key = %row.key(), "row widget destroyed during apply");
            }
        }
    }
}

impl<F: WidgetFactory, C: ScrollContainer> RowSink for RowBatch<'_, F, C> {
    fn push(&mut self, key: &RowKey, content: &RowContent) {
        if !self.pool.is_active(key.as_str()) {
            // About to add a row: the live layout must be back first.
            self.scheduler.thaw(&mut *self.container);
        }

        let position = self.order.len();
        self.needed.insert(key.clone());
        self.order.push(key.clone());
        self.report.rows += 1;

        let (kind, row) = self.pool.acquire_tracked(key);
        match kind {
            AcquireKind::Created => self.report.created += 1,
            AcquireKind::Reactivated => self.report.reactivated += 1,
            AcquireKind::Reused | AcquireKind::Repeated => {}
        }
        if kind.is_structural() {
            self.structural = true;
        }

        if kind == AcquireKind::Reactivated {
            self.counters.toggles += 1;
        }

        let reorder = row.order != Some(position);
        // Switching row family changes the template size.
        let refamily = kind != AcquireKind::Created
            && row.content != *content
            && discriminant(&row.content) != discriminant(content);
        if reorder || refamily {
            self.structural = true;
            self.scheduler.thaw(&mut *self.container);
        }

        if reorder {
            row.widget.set_order(position);
            row.order = Some(position);
        }

        if row.content == *content {
            self.counters.unchanged_content += 1;
            return;
        }
        Self::apply_content(row, content, self.counters);
        self.report.updated += 1;
    }
}

/// Viewport-virtualized list of pooled rows inside one scroll container.
pub struct VirtualScroll<F: WidgetFactory, C: ScrollContainer> {
    container: Option<C>,
    disposed: bool,
    pool: RowPool<F>,
    bounds: BoundsIndex,
    culler: VisibilityCuller,
    scheduler: RebuildScheduler,
    order: Vec<RowKey>,
    needed: HashSet<RowKey>,
    counters: Counters,
    measure_retries: u32,
}

impl<F: WidgetFactory, C: ScrollContainer> VirtualScroll<F, C> {
    /// Create an engine that builds rows with `factory`.
    pub fn new(factory: F, config: &EngineConfig) -> Self {
        Self {
            container: None,
            disposed: false,
            pool: RowPool::new(factory, config.pool_high_water),
            bounds: BoundsIndex::new(config.margin_factor),
            culler: VisibilityCuller::new(),
            scheduler: RebuildScheduler::new(config.freeze_layout),
            order: Vec::new(),
            needed: HashSet::new(),
            counters: Counters::default(),
            measure_retries: 0,
        }
    }

    /// Bind the engine to its container and schedule the first rebuild.
    pub fn initialize(&mut self, container: C) -> Result<(), EngineError> {
        if self.disposed {
            return Err(EngineError::Disposed);
        }
        if self.container.is_some() {
            return Err(EngineError::AlreadyInitialized);
        }
        self.container = Some(container);
        self.scheduler.reset_layout();
        self.scheduler.request_rebuild();
        info!("virtual scroll initialized");
        Ok(())
    }

    fn live_container(&mut self) -> Result<&mut C, EngineError> {
        if self.disposed {
            return Err(EngineError::Disposed);
        }
        match self.container.as_mut() {
            None => Err(EngineError::NotInitialized),
            Some(c) if !c.is_alive() => Err(EngineError::ContainerGone),
            Some(c) => Ok(c),
        }
    }

    /// Declare this frame's rows.
    ///
    /// `fill` pushes every row that should exist, in display order. Rows not
    /// pushed are released (disabled, kept pooled). A rebuild is requested
    /// when the set or order of rows changed.
    pub fn refresh<Fill>(&mut self, fill: Fill) -> Result<RefreshReport, EngineError>
    where
        Fill: FnOnce(&mut RowBatch<'_, F, C>),
    {
        let was_frozen = self.is_layout_frozen();
        if self.disposed {
            return Err(EngineError::Disposed);
        }
        let container = match self.container.as_mut() {
            None => return Err(EngineError::NotInitialized),
            Some(c) if !c.is_alive() => return Err(EngineError::ContainerGone),
            Some(c) => c,
        };

        self.pool.begin_generation();
        self.needed.clear();
        self.order.clear();

        let mut batch = RowBatch {
            pool: &mut self.pool,
            scheduler: &mut self.scheduler,
            container,
            needed: &mut self.needed,
            order: &mut self.order,
            counters: &mut self.counters,
            report: RefreshReport::default(),
            structural: false,
        };
        fill(&mut batch);
        let RowBatch {
            mut report,
            structural,
            ..
        } = batch;

        if self.pool.active_len() > self.needed.len() {
            if let Some(container) = self.container.as_mut() {
                self.scheduler.thaw(container);
            }
        }
        let released = self.pool.release_unused(&self.needed);
        self.counters.toggles += released.toggles as u64;
        report.deactivated = released.deactivated;
        report.destroyed = released.destroyed;

        if structural || released.deactivated > 0 {
            self.scheduler.request_rebuild();
            report.rebuild_requested = true;
        }
        if was_frozen && !self.is_layout_frozen() {
            self.sync_frozen_flags();
        }
        Ok(report)
    }

    /// Manually request a rebuild, thawing the layout first.
    ///
    /// The rebuild runs on the next tick, after the host laid out again.
    pub fn rebuild(&mut self) -> Result<(), EngineError> {
        self.live_container()?;
        if let Some(container) = self.container.as_mut() {
            self.scheduler.thaw(container);
        }
        self.scheduler.request_rebuild();
        self.sync_frozen_flags();
        Ok(())
    }

    /// Rows may have changed size without changing identity; re-measure.
    pub fn mark_layout_dirty(&mut self) -> Result<(), EngineError> {
        self.rebuild()
    }

    /// Run one scheduling step: the deferred rebuild, if due.
    ///
    /// A container that has gone away makes any pending rebuild drop silently.
    pub fn tick(&mut self) -> TickOutcome {
        if self.disposed {
            return TickOutcome::Idle;
        }
        let pool = &mut self.pool;
        let bounds = &mut self.bounds;
        let culler = &mut self.culler;
        let order = &self.order;
        let retries = &mut self.measure_retries;

        let outcome = self.scheduler.tick(self.container.as_mut(), |container, scheduler| {
            let origin = container.content_origin();
            let mut unmeasured = 0usize;
            bounds.rebuild(
                origin,
                order.iter().filter_map(|key| {
                    let widget = pool.get(key.as_str())?.widget();
                    let transform = widget.transform();
                    if transform.is_none() && widget.is_alive() {
                        unmeasured += 1;
                    }
                    Some((key.clone(), transform?))
                }),
            );
            if unmeasured == 0 {
                *retries = 0;
            } else if *retries < MAX_MEASURE_RETRIES {
                *retries += 1;
                debug!(unmeasured, attempt = *retries, "rows not laid out yet; measuring again");
                scheduler.request_rebuild();
            } else {
                warn!(unmeasured, "rows never reported a transform; left unmeasured");
            }
            for entry in bounds.iter() {
                if let Some(row) = pool.get_mut(entry.key.as_str()) {
                    row.bounds = entry.bounds;
                }
            }
            let viewport = Viewport::from_scroll(container.scroll_offset(), container.viewport_size());
            let cull = culler.update_visibility(&viewport, bounds, pool);
            RebuildSummary {
                rows: bounds.len(),
                content_size: bounds.content_extent().map(|r| r.max).unwrap_or_default(),
                cull,
            }
        });

        match outcome {
            TickOutcome::Rebuilt(summary) => {
                self.counters.toggles += summary.cull.toggles as u64;
                self.counters.visibility_passes += 1;
                debug!(rows = summary.rows, toggles = summary.cull.toggles, "rebuilt bounds");
                self.sync_frozen_flags();
            }
            TickOutcome::Deferred => self.sync_frozen_flags(),
            TickOutcome::Dropped => {
                self.scheduler.reset_layout();
            }
            TickOutcome::Idle => {}
        }
        outcome
    }

    /// Re-cull against the container's current scroll offset and size.
    ///
    /// Never touches layout or bounds.
    pub fn on_scroll(&mut self) -> Result<CullReport, EngineError> {
        let container = self.live_container()?;
        let viewport = Viewport::from_scroll(container.scroll_offset(), container.viewport_size());
        Ok(self.update_visibility(&viewport))
    }

    /// Cull against an explicit viewport.
    pub fn update_visibility(&mut self, viewport: &Viewport) -> CullReport {
        let report = self
            .culler
            .update_visibility(viewport, &self.bounds, &mut self.pool);
        self.counters.toggles += report.toggles as u64;
        self.counters.visibility_passes += 1;
        report
    }

    /// Force `key` visible regardless of the viewport.
    pub fn pin(&mut self, key: RowKey) -> CullReport {
        let report = self.culler.pin(key, &self.bounds, &mut self.pool);
        self.counters.toggles += report.toggles as u64;
        self.counters.visibility_passes += 1;
        report
    }

    /// Undo [`VirtualScroll::pin`].
    pub fn unpin(&mut self, key: &RowKey) -> CullReport {
        let report = self.culler.unpin(key, &self.bounds, &mut self.pool);
        self.counters.toggles += report.toggles as u64;
        self.counters.visibility_passes += 1;
        report
    }

    /// Tear down: drop pending work, destroy every row, release the container.
    ///
    /// Idempotent. The engine cannot be initialized again afterwards.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.scheduler.cancel();
        let destroyed = self.pool.dispose();
        self.bounds.clear();
        self.culler.clear();
        self.order.clear();
        self.needed.clear();
        self.container = None;
        self.disposed = true;
        info!(destroyed, "virtual scroll disposed");
    }

    fn sync_frozen_flags(&mut self) {
        let frozen = self.is_layout_frozen();
        for row in self.pool.active_rows_mut() {
            row.layout_frozen = frozen;
        }
    }

    /// Whether the container layout is currently replaced by a placeholder.
    pub fn is_layout_frozen(&self) -> bool {
        matches!(self.scheduler.layout_state(), LayoutState::Frozen { .. })
    }

    /// Row for `key`, if pooled.
    pub fn row(&self, key: &str) -> Option<&Row<F::Widget>> {
        self.pool.get(key)
    }

    /// Whether `key` is pooled, active and enabled.
    pub fn is_visible(&self, key: &str) -> bool {
        self.pool.is_active(key) && self.pool.get(key).is_some_and(|r| r.is_visible())
    }

    /// Keys of this frame's rows, in display order.
    pub fn order(&self) -> &[RowKey] {
        &self.order
    }

    /// Running totals.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            toggles: self.counters.toggles,
            visibility_passes: self.counters.visibility_passes,
            rebuilds: self.scheduler.rebuilds(),
            coalesced_requests: self.scheduler.coalesced(),
            dropped_rebuilds: self.scheduler.dropped(),
            rows_created: self.pool.created(),
            rows_reused: self.pool.reused(),
            rows_destroyed: self.pool.destroyed(),
            degraded_rows: self.counters.degraded_rows,
            unchanged_content: self.counters.unchanged_content,
        }
    }

    /// The row pool.
    pub fn pool(&self) -> &RowPool<F> {
        &self.pool
    }

    /// The bounds index.
    pub fn bounds(&self) -> &BoundsIndex {
        &self.bounds
    }

    /// The culler.
    pub fn culler(&self) -> &VisibilityCuller {
        &self.culler
    }

    /// The scheduler.
    pub fn scheduler(&self) -> &RebuildScheduler {
        &self.scheduler
    }

    /// Ask for a rebuild without thawing (the next tick thaws if needed).
    pub fn request_rebuild(&mut self) -> bool {
        self.scheduler.request_rebuild()
    }

    /// The container, if initialized.
    pub fn container(&self) -> Option<&C> {
        self.container.as_ref()
    }

    /// The container, mutably, if initialized.
    pub fn container_mut(&mut self) -> Option<&mut C> {
        self.container.as_mut()
    }

    /// Whether [`VirtualScroll::dispose`] ran.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
#[path = "virtual_scroll_tests.rs"]
mod tests;
