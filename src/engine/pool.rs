//! RowPool - keyed reuse of row widgets
//!
//! The pool is the only owner of rows. Everything else names a row by its
//! [`RowKey`] and looks it up again each tick, so shrinking or growing the
//! pool never leaves a dangling reference behind.
//!
//! # Lifecycle
//!
//! - First `acquire` of a key constructs a widget through the factory.
//! - Later `acquire`s reset and return the same row (no allocation).
//! - `release_unused` disables rows whose keys were not requested this
//!   generation but keeps them for next time.
//! - Above the high-water mark, the least-recently-used inactive rows are
//!   destroyed.
//! - `dispose` destroys everything.

use crate::host::{RowWidget, WidgetFactory};
use crate::model::{Generation, Row, RowId, RowKey};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Default number of rows kept before inactive ones are destroyed.
pub const DEFAULT_HIGH_WATER: usize = 256;

/// How an acquisition was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireKind {
    /// A new widget was constructed.
    Created,
    /// An active row from the previous generation was reused.
    Reused,
    /// A released (inactive) row was brought back.
    Reactivated,
    /// The key was already acquired in this generation.
    Repeated,
}

impl AcquireKind {
    /// True when the set of active rows changed.
    pub fn is_structural(&self) -> bool {
        matches!(self, AcquireKind::Created | AcquireKind::Reactivated)
    }
}

/// Outcome of [`RowPool::release_unused`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReleaseReport {
    /// Rows moved from active to inactive.
    pub deactivated: usize,
    /// Widgets disabled while deactivating.
    pub toggles: usize,
    /// Inactive rows destroyed to get back under the high-water mark.
    pub destroyed: usize,
}

#[derive(Debug)]
struct PoolEntry<W> {
    row: Row<W>,
    active: bool,
}

/// Keyed collection of reusable rows.
pub struct RowPool<F: WidgetFactory> {
    factory: F,
    entries: HashMap<RowKey, PoolEntry<F::Widget>>,
    generation: Generation,
    high_water: usize,
    active: usize,
    next_id: u64,
    created: u64,
    reused: u64,
    destroyed: u64,
    trim_scratch: Vec<(Generation, RowKey)>,
}

impl<F: WidgetFactory> RowPool<F> {
    /// Create an empty pool.
    pub fn new(factory: F, high_water: usize) -> Self {
        Self {
            factory,
            entries: HashMap::new(),
            generation: Generation::default(),
            high_water,
            active: 0,
            next_id: 0,
            created: 0,
            reused: 0,
            destroyed: 0,
            trim_scratch: Vec::new(),
        }
    }

    /// Start a new refresh generation. Acquisitions are stamped with it.
    pub fn begin_generation(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.generation
    }

    /// Current generation.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Return the row for `key`, constructing it on first demand.
    pub fn acquire(&mut self, key: &RowKey) -> &mut Row<F::Widget> {
        self.acquire_tracked(key).1
    }

    /// Like [`RowPool::acquire`], also reporting how the request was served.
    pub fn acquire_tracked(&mut self, key: &RowKey) -> (AcquireKind, &mut Row<F::Widget>) {
        let generation = self.generation;

        // A widget the host destroyed is forgotten, not destroyed again.
        if let Some(entry) = self.entries.get(key.as_str()) {
            if !entry.row.widget.is_alive() {
                debug!(key = %key, "pooled widget died; constructing a replacement");
                if let Some(dead) = self.entries.remove(key.as_str()) {
                    if dead.active {
                        self.active -= 1;
                    }
                }
            }
        }

        match self.entries.entry(key.clone()) {
            Entry::Occupied(occupied) => {
                let entry = occupied.into_mut();
                let kind = if entry.row.last_used == generation && entry.active {
                    AcquireKind::Repeated
                } else {
                    entry.row.widget.reset();
                    entry.row.reuse_count += 1;
                    entry.row.last_used = generation;
                    self.reused += 1;
                    if entry.active {
                        AcquireKind::Reused
                    } else {
                        // Restored rows start enabled, like new ones.
                        entry.active = true;
                        self.active += 1;
                        if !entry.row.visible {
                            entry.row.widget.set_enabled(true);
                            entry.row.visible = true;
                        }
                        AcquireKind::Reactivated
                    }
                };
                (kind, &mut entry.row)
            }
            Entry::Vacant(vacant) => {
                let widget = self.factory.instantiate(vacant.key());
                let id = RowId::new(self.next_id);
                self.next_id += 1;
                self.created += 1;
                self.active += 1;
                trace!(key = %vacant.key(), id = id.get(), "constructed row");
                let row = Row::new(id, vacant.key().clone(), widget, generation);
                let entry = vacant.insert(PoolEntry { row, active: true });
                (AcquireKind::Created, &mut entry.row)
            }
        }
    }

    /// Deactivate every active row whose key is not in `still_needed`.
    ///
    /// Deactivated rows stay pooled. If the pool then holds more than the
    /// high-water mark, the least-recently-used inactive rows are destroyed.
    pub fn release_unused(&mut self, still_needed: &HashSet<RowKey>) -> ReleaseReport {
        let mut report = ReleaseReport::default();

        for (key, entry) in self.entries.iter_mut() {
            if !entry.active || still_needed.contains(key) {
                continue;
            }
            entry.active = false;
            entry.row.order = None;
            self.active -= 1;
            report.deactivated += 1;
            if entry.row.visible {
                entry.row.widget.set_enabled(false);
                entry.row.visible = false;
                report.toggles += 1;
            }
        }

        report.destroyed = self.trim_to_high_water();
        if report.deactivated > 0 || report.destroyed > 0 {
            debug!(
                deactivated = report.deactivated,
                destroyed = report.destroyed,
                pooled = self.entries.len(),
                "released unused rows"
            );
        }
        report
    }

    fn trim_to_high_water(&mut self) -> usize {
        if self.entries.len() <= self.high_water {
            return 0;
        }
        let excess = self.entries.len() - self.high_water;

        self.trim_scratch.clear();
        self.trim_scratch.extend(
            self.entries
                .iter()
                .filter(|(_, e)| !e.active)
                .map(|(k, e)| (e.row.last_used, k.clone())),
        );
        self.trim_scratch.sort_unstable();

        let mut destroyed = 0;
        for (_, key) in self.trim_scratch.drain(..).take(excess) {
            if let Some(mut entry) = self.entries.remove(&key) {
                if entry.row.widget.is_alive() {
                    entry.row.widget.destroy();
                }
                destroyed += 1;
            }
        }
        self.destroyed += destroyed as u64;
        destroyed
    }

    /// Destroy every row and clear the pool.
    pub fn dispose(&mut self) -> usize {
        let count = self.entries.len();
        self.active = 0;
        for (_, mut entry) in self.entries.drain() {
            if entry.row.widget.is_alive() {
                entry.row.widget.destroy();
            }
        }
        self.destroyed += count as u64;
        count
    }

    /// Row for `key`, active or not.
    pub fn get(&self, key: &str) -> Option<&Row<F::Widget>> {
        self.entries.get(key).map(|e| &e.row)
    }

    /// Mutable row for `key`, active or not.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Row<F::Widget>> {
        self.entries.get_mut(key).map(|e| &mut e.row)
    }

    /// Active row for `key`.
    pub fn get_active_mut(&mut self, key: &str) -> Option<&mut Row<F::Widget>> {
        self.entries
            .get_mut(key)
            .filter(|e| e.active)
            .map(|e| &mut e.row)
    }

    /// Whether `key` is pooled and active.
    pub fn is_active(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|e| e.active)
    }

    /// Whether `key` is pooled at all.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Active rows, in no particular order.
    pub fn active_rows(&self) -> impl Iterator<Item = &Row<F::Widget>> {
        self.entries.values().filter(|e| e.active).map(|e| &e.row)
    }

    /// Active rows, mutably, in no particular order.
    pub fn active_rows_mut(&mut self) -> impl Iterator<Item = &mut Row<F::Widget>> {
        self.entries
            .values_mut()
            .filter(|e| e.active)
            .map(|e| &mut e.row)
    }

    /// Number of pooled rows, active or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of active rows.
    pub fn active_len(&self) -> usize {
        self.active
    }

    /// True when the pool holds no rows.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// High-water mark.
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Rows constructed so far.
    pub fn created(&self) -> u64 {
        self.created
    }

    /// Acquisitions served from existing rows.
    pub fn reused(&self) -> u64 {
        self.reused
    }

    /// Rows destroyed so far.
    pub fn destroyed(&self) -> u64 {
        self.destroyed
    }

    /// The widget factory.
    pub fn factory(&self) -> &F {
        &self.factory
    }
}

impl<F: WidgetFactory> Drop for RowPool<F> {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            self.dispose();
        }
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
