//! SelectionDiffCache - last-subject snapshot and staleness tracking
//!
//! Wrapper panels re-render every frame but their subject rarely changes.
//! The cache remembers which subject was rendered last (by identity, through
//! a `Weak` handle so a destroyed host entity is never kept alive) together
//! with an immutable snapshot of cheap facts captured at selection time.
//!
//! Expensive derived values live in [`DerivedFact`] cells owned by the
//! panel. Each cell recomputes only when the cache's epoch moved (new subject
//! or explicit invalidation), when the cell was individually invalidated, or
//! when its primitive input changed.
//!
//! # States
//!
//! ```text
//! Empty --select(s)--> Bound(s) --select(s')--> Bound(s')
//!   ^                     |
//!   +---deselect/dead-----+
//! ```

use crate::model::{FrameTick, Generation};
use std::rc::{Rc, Weak};
use tracing::debug;

/// What [`SelectionDiffCache::on_subject_changed`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    /// Same subject (or still nothing); nothing happened.
    Unchanged,
    /// A subject was bound where there was none, or replaced another.
    Bound,
    /// The previous subject was released.
    Cleared,
}

impl SelectionChange {
    /// Whether dependent rows must be rebuilt.
    pub fn needs_rebuild(&self) -> bool {
        !matches!(self, SelectionChange::Unchanged)
    }
}

/// Context handed to derived-value computations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedContext {
    /// Bumped whenever every derived value must be considered stale.
    pub epoch: Generation,
    /// Host frame being rendered.
    pub now: FrameTick,
}

enum SelectionState<S, R> {
    Empty,
    Bound { subject: Weak<S>, record: R },
}

/// Remembers the last selected subject and a snapshot of it.
pub struct SelectionDiffCache<S, R> {
    state: SelectionState<S, R>,
    epoch: Generation,
    captures: u64,
}

impl<S, R> SelectionDiffCache<S, R> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            state: SelectionState::Empty,
            epoch: Generation::default(),
            captures: 0,
        }
    }

    /// Point the cache at `new`.
    ///
    /// Re-selecting the identical subject is a no-op and does not call
    /// `capture`. A different subject is captured into a fresh record, the old
    /// record is dropped, and the epoch advances so every derived value is
    /// stale. `None` deselects.
    pub fn on_subject_changed<F>(&mut self, new: Option<&Rc<S>>, capture: F) -> SelectionChange
    where
        F: FnOnce(&S) -> R,
    {
        let same = match (&self.state, new) {
            (SelectionState::Bound { subject: current, .. }, Some(new)) => {
                std::ptr::eq(current.as_ptr(), Rc::as_ptr(new))
            }
            (SelectionState::Empty, None) => true,
            _ => false,
        };
        if same {
            return SelectionChange::Unchanged;
        }

        let Some(subject) = new else {
            self.clear();
            return SelectionChange::Cleared;
        };
        let record = capture(subject);
        self.captures += 1;
        self.epoch = self.epoch.next();
        self.state = SelectionState::Bound {
            subject: Rc::downgrade(subject),
            record,
        };
        debug!(epoch = self.epoch.get(), "subject bound");
        SelectionChange::Bound
    }

    /// The bound subject and its record, if the subject is still alive.
    ///
    /// A subject the host destroyed is treated as a deselect: the cache is
    /// cleared and `None` returned.
    pub fn current(&mut self) -> Option<(Rc<S>, &R)> {
        let alive = match &self.state {
            SelectionState::Empty => return None,
            SelectionState::Bound { subject, .. } => subject.upgrade(),
        };
        let Some(subject) = alive else {
            debug!("bound subject was destroyed; deselecting");
            self.clear();
            return None;
        };
        match &self.state {
            SelectionState::Bound { record, .. } => Some((subject, record)),
            SelectionState::Empty => None,
        }
    }

    /// Snapshot record of the bound subject, without checking liveness.
    pub fn record(&self) -> Option<&R> {
        match &self.state {
            SelectionState::Bound { record, .. } => Some(record),
            SelectionState::Empty => None,
        }
    }

    /// Whether a subject is bound (alive or not).
    pub fn is_bound(&self) -> bool {
        matches!(self.state, SelectionState::Bound { .. })
    }

    /// Mark every derived value stale without changing the subject.
    pub fn mark_stale(&mut self) {
        self.epoch = self.epoch.next();
    }

    /// Context for frame `now`. [`DerivedFact`] cells read through it
    /// recompute only when stale.
    pub fn refresh_derived(&self, now: FrameTick) -> DerivedContext {
        DerivedContext {
            epoch: self.epoch,
            now,
        }
    }

    /// Current epoch.
    pub fn epoch(&self) -> Generation {
        self.epoch
    }

    /// Snapshots captured so far.
    pub fn captures(&self) -> u64 {
        self.captures
    }

    /// Release the subject and its record.
    pub fn clear(&mut self) {
        if self.is_bound() {
            self.epoch = self.epoch.next();
        }
        self.state = SelectionState::Empty;
    }
}

impl<S, R> Default for SelectionDiffCache<S, R> {
    fn default() -> Self {
        Self::new()
    }
}

/// A cached value derived from a primitive input.
///
/// Recomputes when the input differs from the last one (value equality), when
/// the context epoch moved, or after [`DerivedFact::invalidate`].
#[derive(Debug, Clone)]
pub struct DerivedFact<I, V> {
    input: Option<I>,
    value: Option<V>,
    epoch: Option<Generation>,
    dirty: bool,
    computed_at: Option<FrameTick>,
    recomputes: u64,
}

impl<I: PartialEq, V> DerivedFact<I, V> {
    /// Create an empty fact.
    pub fn new() -> Self {
        Self {
            input: None,
            value: None,
            epoch: None,
            dirty: true,
            computed_at: None,
            recomputes: 0,
        }
    }

    /// Return the value for `input`, recomputing it only if stale.
    pub fn get<F>(&mut self, ctx: &DerivedContext, input: I, compute: F) -> &V
    where
        F: FnOnce(&I) -> V,
    {
        let fresh = !self.dirty
            && self.epoch == Some(ctx.epoch)
            && self.input.as_ref() == Some(&input);
        if !fresh {
            self.value = None;
            self.epoch = Some(ctx.epoch);
            self.dirty = false;
            self.computed_at = Some(ctx.now);
            self.recomputes += 1;
        }
        let value = self.value.get_or_insert_with(|| compute(&input));
        self.input = Some(input);
        value
    }

    /// Force the next `get` to recompute.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Whether the next `get` will recompute regardless of input.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Last computed value.
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// Frame of the last computation.
    pub fn computed_at(&self) -> Option<FrameTick> {
        self.computed_at
    }

    /// Computations performed so far.
    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }

    /// Drop the cached input and value.
    pub fn clear(&mut self) {
        self.input = None;
        self.value = None;
        self.epoch = None;
        self.dirty = true;
    }
}

impl<I: PartialEq, V> Default for DerivedFact<I, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "selection_tests.rs"]
mod tests;
