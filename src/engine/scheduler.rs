//! RebuildScheduler - coalesced, one-tick-deferred bounds rebuilds
//!
//! Structural changes can be reported from many call sites within a frame.
//! Each report only sets a pending flag; the first one also queues a deferred
//! task due on the next tick. The tick drains the queue and runs at most one
//! rebuild.
//!
//! The host ticks at the start of a frame, before it mutates any rows, so a
//! request made while mutating frame N runs at the start of frame N+1, after
//! the host laid out frame N.
//!
//! The rebuild itself may ask for another one (some rows had not been laid
//! out yet). Such a request arrives while the rebuild is in flight and is
//! queued for the following tick; the layout stays live until it ran.
//!
//! # Freeze / thaw
//!
//! After a rebuild the container's live layout is swapped for a fixed-size
//! placeholder so scrolling does not pay for layout. Anything about to mutate
//! rows thaws first. A rebuild that finds the layout still frozen thaws it
//! and waits one more tick so it measures a live layout.

use super::culler::CullReport;
use crate::host::ScrollContainer;
use crate::model::Vec2;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Work queued for a later tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTask {
    /// Re-measure bounds and re-cull.
    Rebuild,
}

/// State of the container's layout component.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LayoutState {
    /// The host's layout component is running.
    #[default]
    Live,
    /// Replaced by a placeholder of the given size.
    Frozen {
        /// Placeholder size.
        size: Vec2,
    },
}

/// What a rebuild produced.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RebuildSummary {
    /// Rows measured.
    pub rows: usize,
    /// Size of the union of all row bounds.
    pub content_size: Vec2,
    /// The visibility pass that followed.
    pub cull: CullReport,
}

/// Result of one [`RebuildScheduler::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Nothing was due.
    Idle,
    /// A rebuild ran.
    Rebuilt(RebuildSummary),
    /// A rebuild was due but the layout had to be thawed first; it runs next tick.
    Deferred,
    /// A rebuild was due but the container is gone; it was discarded.
    Dropped,
}

/// Coalesces rebuild requests and owns the freeze/thaw protocol.
#[derive(Debug)]
pub struct RebuildScheduler {
    pending: bool,
    in_flight: bool,
    requested_during_flight: bool,
    queue: VecDeque<(u64, DeferredTask)>,
    tick: u64,
    layout: LayoutState,
    freeze_enabled: bool,
    coalesced: u64,
    rebuilds: u64,
    dropped: u64,
}

impl RebuildScheduler {
    /// Create an idle scheduler. `freeze_enabled` turns the placeholder
    /// optimization on.
    pub fn new(freeze_enabled: bool) -> Self {
        Self {
            pending: false,
            in_flight: false,
            requested_during_flight: false,
            queue: VecDeque::new(),
            tick: 0,
            layout: LayoutState::Live,
            freeze_enabled,
            coalesced: 0,
            rebuilds: 0,
            dropped: 0,
        }
    }

    /// Ask for a rebuild on the next tick.
    ///
    /// Returns `true` if this call scheduled the rebuild, `false` if it was
    /// folded into one already pending or arrived while a rebuild was running
    /// (it then runs on the tick after).
    pub fn request_rebuild(&mut self) -> bool {
        if self.in_flight {
            self.requested_during_flight = true;
            return false;
        }
        if self.pending {
            self.coalesced += 1;
            return false;
        }
        self.pending = true;
        self.schedule(DeferredTask::Rebuild);
        true
    }

    fn schedule(&mut self, task: DeferredTask) {
        let due = self.tick + 1;
        if !self.queue.iter().any(|&(_, t)| t == task) {
            self.queue.push_back((due, task));
        }
    }

    /// Advance one scheduling unit and run whatever is due.
    ///
    /// `container` is `None` once the host tore the panel down; any pending
    /// rebuild is then dropped. `rebuild` does the measuring and culling; it
    /// gets the scheduler back so it can request a follow-up rebuild.
    pub fn tick<C, R>(&mut self, container: Option<&mut C>, rebuild: R) -> TickOutcome
    where
        C: ScrollContainer,
        R: FnOnce(&mut C, &mut Self) -> RebuildSummary,
    {
        self.tick += 1;
        let now = self.tick;
        let mut due = false;
        while let Some(&(at, task)) = self.queue.front() {
            if at > now {
                break;
            }
            self.queue.pop_front();
            match task {
                DeferredTask::Rebuild => due = true,
            }
        }
        if !due || !self.pending {
            return TickOutcome::Idle;
        }

        let container = match container {
            Some(c) if c.is_alive() => c,
            _ => {
                debug!("container gone; dropping pending rebuild");
                self.cancel();
                self.dropped += 1;
                return TickOutcome::Dropped;
            }
        };

        if let LayoutState::Frozen { .. } = self.layout {
            self.thaw(container);
            self.schedule(DeferredTask::Rebuild);
            return TickOutcome::Deferred;
        }

        self.in_flight = true;
        let summary = rebuild(&mut *container, self);
        self.in_flight = false;
        self.pending = false;
        self.rebuilds += 1;

        if std::mem::take(&mut self.requested_during_flight) {
            debug!("rebuild requested another; keeping the layout live");
            self.pending = true;
            self.schedule(DeferredTask::Rebuild);
        } else if self.freeze_enabled && summary.rows > 0 {
            container.freeze_layout(summary.content_size);
            self.layout = LayoutState::Frozen {
                size: summary.content_size,
            };
        }

        trace!(rows = summary.rows, toggles = summary.cull.toggles, "rebuild complete");
        TickOutcome::Rebuilt(summary)
    }

    /// Restore the live layout if frozen. Returns `true` if it was frozen.
    pub fn thaw<C: ScrollContainer>(&mut self, container: &mut C) -> bool {
        match self.layout {
            LayoutState::Frozen { .. } => {
                container.thaw_layout();
                self.layout = LayoutState::Live;
                true
            }
            LayoutState::Live => false,
        }
    }

    /// Forget any pending work without running it.
    pub fn cancel(&mut self) {
        self.pending = false;
        self.requested_during_flight = false;
        self.queue.clear();
    }

    /// Forget the layout state after the container went away.
    pub fn reset_layout(&mut self) {
        self.layout = LayoutState::Live;
    }

    /// Whether a rebuild is waiting.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Whether a rebuild is running right now.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Current layout state.
    pub fn layout_state(&self) -> LayoutState {
        self.layout
    }

    /// Whether the placeholder optimization is enabled.
    pub fn freeze_enabled(&self) -> bool {
        self.freeze_enabled
    }

    /// Requests folded into an already pending rebuild.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }

    /// Rebuilds executed.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Rebuilds discarded because the container was gone.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Ticks elapsed.
    pub fn ticks(&self) -> u64 {
        self.tick
    }
}

impl Default for RebuildScheduler {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
