//! Background aggregation: periodic summation across many entities.
//!
//! The only part of the engine that leaves the main thread. A round splits
//! the input into chunks, each worker sums its chunk locally and merges the
//! partial result into a [`ResultSlots`] under one coarse lock, then reports
//! on a channel. The owner blocks on that channel with a deadline and only
//! reads the slots once every worker reported.
//!
//! Writes are tagged with the round number. A worker that finishes after its
//! round timed out finds the round sealed (or superseded) and its partial
//! result is discarded.

use crate::model::AggregateError;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default worker count.
pub const DEFAULT_WORKERS: usize = 4;

/// Default deadline for one round.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(50);

#[derive(Debug)]
struct SlotState<K> {
    round: u64,
    sealed: bool,
    values: HashMap<K, f64>,
    writes: usize,
    rejected: usize,
}

/// Shared per-key sums for one collection, guarded by a single lock.
#[derive(Debug)]
pub struct ResultSlots<K> {
    inner: Arc<Mutex<SlotState<K>>>,
}

impl<K> Clone for ResultSlots<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Eq + Hash> ResultSlots<K> {
    /// Create empty slots.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SlotState {
                round: 0,
                sealed: true,
                values: HashMap::new(),
                writes: 0,
                rejected: 0,
            })),
        }
    }

    // Merges are plain additions, so a poisoned lock still guards usable sums.
    fn lock(&self) -> MutexGuard<'_, SlotState<K>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a new round, discarding the previous round's values.
    pub fn begin_round(&self) -> u64 {
        let mut state = self.lock();
        state.round += 1;
        state.sealed = false;
        state.values.clear();
        state.writes = 0;
        state.round
    }

    /// Add `partial` into the slots if `round` is still open.
    ///
    /// Returns `false` when the write was discarded.
    pub fn merge(&self, round: u64, partial: HashMap<K, f64>) -> bool {
        let mut state = self.lock();
        if state.round != round || state.sealed {
            state.rejected += 1;
            return false;
        }
        for (key, value) in partial {
            *state.values.entry(key).or_insert(0.0) += value;
        }
        state.writes += 1;
        true
    }

    /// Close `round` to further writes.
    pub fn seal(&self, round: u64) {
        let mut state = self.lock();
        if state.round == round {
            state.sealed = true;
        }
    }

    /// Close `round` and take its values. `None` if a newer round started.
    pub fn take(&self, round: u64) -> Option<HashMap<K, f64>> {
        let mut state = self.lock();
        if state.round != round {
            return None;
        }
        state.sealed = true;
        Some(std::mem::take(&mut state.values))
    }

    /// Current round number.
    pub fn round(&self) -> u64 {
        self.lock().round
    }

    /// Whether the current round accepts writes.
    pub fn is_open(&self) -> bool {
        !self.lock().sealed
    }

    /// Partial results merged into the current round.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    /// Writes discarded so far because their round was closed.
    pub fn rejected(&self) -> usize {
        self.lock().rejected
    }
}

impl<K: Eq + Hash + Clone> ResultSlots<K> {
    /// Copy of the current values.
    pub fn snapshot(&self) -> HashMap<K, f64> {
        self.lock().values.clone()
    }
}

impl<K: Eq + Hash> Default for ResultSlots<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-size pool of short-lived summation workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationPool {
    workers: usize,
    timeout: Duration,
}

impl AggregationPool {
    /// Create a pool. `workers` is clamped to at least one.
    pub fn new(workers: usize, timeout: Duration) -> Self {
        Self {
            workers: workers.max(1),
            timeout,
        }
    }

    /// Worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Deadline for a round.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sum `value(item)` per `key(item)` across `items` in fresh slots.
    pub fn sum_by<T, K, FK, FV>(
        &self,
        items: Arc<[T]>,
        key: FK,
        value: FV,
    ) -> Result<HashMap<K, f64>, AggregateError>
    where
        T: Send + Sync + 'static,
        K: Eq + Hash + Send + 'static,
        FK: Fn(&T) -> K + Send + Sync + 'static,
        FV: Fn(&T) -> f64 + Send + Sync + 'static,
    {
        let slots = ResultSlots::new();
        self.sum_into(&slots, items, key, value)
    }

    /// Run one round into `slots` and return its values.
    ///
    /// Blocks until every worker reported or the deadline passed. On timeout
    /// the round is sealed and `slots` keeps whatever was merged in time.
    pub fn sum_into<T, K, FK, FV>(
        &self,
        slots: &ResultSlots<K>,
        items: Arc<[T]>,
        key: FK,
        value: FV,
    ) -> Result<HashMap<K, f64>, AggregateError>
    where
        T: Send + Sync + 'static,
        K: Eq + Hash + Send + 'static,
        FK: Fn(&T) -> K + Send + Sync + 'static,
        FV: Fn(&T) -> f64 + Send + Sync + 'static,
    {
        let round = slots.begin_round();
        if items.is_empty() {
            return Ok(slots.take(round).unwrap_or_default());
        }

        let chunk = items.len().div_ceil(self.workers);
        let key = Arc::new(key);
        let value = Arc::new(value);
        let (tx, rx) = mpsc::channel::<usize>();
        let mut expected = 0;

        for (index, start) in (0..items.len()).step_by(chunk).enumerate() {
            let end = (start + chunk).min(items.len());
            let items = Arc::clone(&items);
            let key = Arc::clone(&key);
            let value = Arc::clone(&value);
            let worker_slots = slots.clone();
            let tx = tx.clone();

            let spawned = thread::Builder::new()
                .name(format!("vrows-aggregate-{index}"))
                .spawn(move || {
                    let mut partial: HashMap<K, f64> = HashMap::new();
                    for item in &items[start..end] {
                        *partial.entry(key(item)).or_insert(0.0) += value(item);
                    }
                    worker_slots.merge(round, partial);
                    // The owner may have stopped listening after a timeout.
                    let _ = tx.send(index);
                });
            if let Err(err) = spawned {
                warn!(error = %err, "failed to spawn aggregation worker");
                slots.seal(round);
                return Err(AggregateError::Spawn);
            }
            expected += 1;
        }
        drop(tx);

        let deadline = Instant::now() + self.timeout;
        let mut completed = 0;
        while completed < expected {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(_) => completed += 1,
                Err(RecvTimeoutError::Timeout) => {
                    slots.seal(round);
                    warn!(completed, expected, "aggregation round timed out");
                    return Err(AggregateError::Timeout {
                        completed,
                        expected,
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    slots.seal(round);
                    warn!(completed, expected, "aggregation worker lost");
                    return Err(AggregateError::WorkerLost);
                }
            }
        }

        debug!(round, workers = expected, items = items.len(), "aggregation round complete");
        Ok(slots.take(round).unwrap_or_default())
    }
}

impl Default for AggregationPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS, DEFAULT_TIMEOUT)
    }
}
