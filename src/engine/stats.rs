//! Engine counters.

/// Running totals of the work the engine performed.
///
/// Counters only grow; take two snapshots and subtract to measure a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineStats {
    /// Widget enable/disable calls actually issued.
    pub toggles: u64,
    /// Visibility passes run.
    pub visibility_passes: u64,
    /// Bounds rebuilds executed.
    pub rebuilds: u64,
    /// Rebuild requests folded into an already-pending rebuild.
    pub coalesced_requests: u64,
    /// Pending rebuilds discarded because the container was gone.
    pub dropped_rebuilds: u64,
    /// Rows constructed by the factory.
    pub rows_created: u64,
    /// Acquisitions served by an existing row.
    pub rows_reused: u64,
    /// Rows destroyed (high-water trim or teardown).
    pub rows_destroyed: u64,
    /// Content applications that degraded because of a missing widget part.
    pub degraded_rows: u64,
    /// Content applications skipped because the content was unchanged.
    pub unchanged_content: u64,
}

impl EngineStats {
    /// Counter-wise difference `self - earlier`.
    pub fn since(&self, earlier: &EngineStats) -> EngineStats {
        EngineStats {
            toggles: self.toggles - earlier.toggles,
            visibility_passes: self.visibility_passes - earlier.visibility_passes,
            rebuilds: self.rebuilds - earlier.rebuilds,
            coalesced_requests: self.coalesced_requests - earlier.coalesced_requests,
            dropped_rebuilds: self.dropped_rebuilds - earlier.dropped_rebuilds,
            rows_created: self.rows_created - earlier.rows_created,
            rows_reused: self.rows_reused - earlier.rows_reused,
            rows_destroyed: self.rows_destroyed - earlier.rows_destroyed,
            degraded_rows: self.degraded_rows - earlier.degraded_rows,
            unchanged_content: self.unchanged_content - earlier.unchanged_content,
        }
    }
}
