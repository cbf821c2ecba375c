//! SubjectPanel - an inspector panel rendering the selected host entity
//!
//! Combines a [`SelectionDiffCache`] with a [`VirtualScroll`]. The host calls
//! three hooks directly:
//!
//! - `on_select` when the selection changes (synchronous, before any row
//!   content is read);
//! - `on_tick` once per frame, before the host lays out;
//! - `on_scroll` when the scroll offset or container size changes.
//!
//! What rows a subject produces is decided by a [`RowBinder`].

use super::culler::CullReport;
use super::scheduler::TickOutcome;
use super::selection::{DerivedContext, SelectionChange, SelectionDiffCache};
use super::virtual_scroll::{RefreshReport, RowSink, VirtualScroll};
use super::EngineConfig;
use crate::host::{ScrollContainer, WidgetFactory};
use crate::model::{EngineError, FrameTick, RowKey};
use std::rc::Rc;
use tracing::debug;

/// Turns a subject into rows.
pub trait RowBinder<S> {
    /// Immutable facts captured once per selection.
    type Snapshot;

    /// Capture the cheap facts of a newly selected subject.
    fn capture(&self, subject: &S) -> Self::Snapshot;

    /// Push this frame's rows for `subject` in display order.
    ///
    /// Expensive derived values should be kept in
    /// [`crate::engine::DerivedFact`] cells keyed on `ctx`.
    fn bind(
        &mut self,
        subject: &S,
        snapshot: &Self::Snapshot,
        ctx: &DerivedContext,
        rows: &mut dyn RowSink,
    );

    /// The subject went away; drop anything derived from it.
    fn release(&mut self) {}
}

/// What one [`SubjectPanel::on_tick`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelFrame {
    /// Whether a live subject was rendered.
    pub bound: bool,
    /// Row declarations.
    pub refresh: RefreshReport,
    /// Scheduling step that ran before the rows were declared.
    pub tick: TickOutcome,
}

/// A virtualized panel bound to at most one subject at a time.
pub struct SubjectPanel<S, B, F, C>
where
    B: RowBinder<S>,
    F: WidgetFactory,
    C: ScrollContainer,
{
    selection: SelectionDiffCache<S, B::Snapshot>,
    binder: B,
    scroll: VirtualScroll<F, C>,
}

impl<S, B, F, C> SubjectPanel<S, B, F, C>
where
    B: RowBinder<S>,
    F: WidgetFactory,
    C: ScrollContainer,
{
    /// Create an unbound panel.
    pub fn new(binder: B, factory: F, config: &EngineConfig) -> Self {
        Self {
            selection: SelectionDiffCache::new(),
            binder,
            scroll: VirtualScroll::new(factory, config),
        }
    }

    /// Bind the panel to its scroll container.
    pub fn initialize(&mut self, container: C) -> Result<(), EngineError> {
        self.scroll.initialize(container)
    }

    /// Selection hook. Re-selecting the same subject does nothing.
    pub fn on_select(&mut self, subject: Option<&Rc<S>>) -> SelectionChange {
        let binder = &self.binder;
        let change = self
            .selection
            .on_subject_changed(subject, |s| binder.capture(s));
        if change == SelectionChange::Cleared {
            self.binder.release();
        }
        if change.needs_rebuild() {
            debug!(?change, "selection changed");
            self.scroll.request_rebuild();
        }
        change
    }

    /// Frame hook: run the rebuild the previous frame asked for, then
    /// declare rows for the current subject.
    ///
    /// The rebuild measures the layout the host produced after the last
    /// frame, so anything declared here is measured next frame. A subject the
    /// host destroyed is handled as a deselect; the panel then releases every
    /// row.
    pub fn on_tick(&mut self, now: FrameTick) -> Result<PanelFrame, EngineError> {
        let tick = self.scroll.tick();

        let ctx = self.selection.refresh_derived(now);
        let was_bound = self.selection.is_bound();
        let binder = &mut self.binder;

        let (bound, refresh) = match self.selection.current() {
            Some((subject, snapshot)) => (
                true,
                self.scroll
                    .refresh(|rows| binder.bind(&subject, snapshot, &ctx, rows)),
            ),
            None => (false, self.scroll.refresh(|_| {})),
        };
        if was_bound && !bound {
            self.binder.release();
        }
        let refresh = refresh?;

        Ok(PanelFrame {
            bound,
            refresh,
            tick,
        })
    }

    /// Scroll hook: re-cull without touching layout.
    pub fn on_scroll(&mut self) -> Result<CullReport, EngineError> {
        self.scroll.on_scroll()
    }

    /// Force a row visible.
    pub fn pin(&mut self, key: RowKey) -> CullReport {
        self.scroll.pin(key)
    }

    /// Undo [`SubjectPanel::pin`].
    pub fn unpin(&mut self, key: &RowKey) -> CullReport {
        self.scroll.unpin(key)
    }

    /// Mark every derived value stale, e.g. after a global settings change.
    pub fn mark_stale(&mut self) {
        self.selection.mark_stale();
    }

    /// Manually request a rebuild.
    pub fn rebuild(&mut self) -> Result<(), EngineError> {
        self.scroll.rebuild()
    }

    /// Release the subject and tear down every row.
    pub fn dispose(&mut self) {
        if self.selection.is_bound() {
            self.binder.release();
        }
        self.selection.clear();
        self.scroll.dispose();
    }

    /// The selection cache.
    pub fn selection(&self) -> &SelectionDiffCache<S, B::Snapshot> {
        &self.selection
    }

    /// The binder.
    pub fn binder(&self) -> &B {
        &self.binder
    }

    /// The binder, mutably.
    pub fn binder_mut(&mut self) -> &mut B {
        &mut self.binder
    }

    /// The underlying virtual scroll.
    pub fn scroll(&self) -> &VirtualScroll<F, C> {
        &self.scroll
    }

    /// The underlying virtual scroll, mutably.
    pub fn scroll_mut(&mut self) -> &mut VirtualScroll<F, C> {
        &mut self.scroll
    }
}
