//! The row engine: bounds, pooling, culling, scheduling, and selection diffing.
//!
//! [`VirtualScroll`] is the facade that wires the four single-purpose parts
//! together for one scroll container. [`SubjectPanel`] adds the selection
//! cache on top for panels that render a selected host entity.

pub mod aggregate;
pub mod bounds;
pub mod culler;
pub mod pool;
pub mod scheduler;
pub mod selection;
pub mod stats;
pub mod subject_panel;
pub mod virtual_scroll;

pub use aggregate::{AggregationPool, ResultSlots};
pub use bounds::{BoundsIndex, IndexedBounds, DEFAULT_MARGIN_FACTOR};
pub use culler::{CullReport, VisibilityCuller};
pub use pool::{AcquireKind, ReleaseReport, RowPool, DEFAULT_HIGH_WATER};
pub use scheduler::{DeferredTask, LayoutState, RebuildScheduler, RebuildSummary, TickOutcome};
pub use selection::{DerivedContext, DerivedFact, SelectionChange, SelectionDiffCache};
pub use stats::EngineStats;
pub use subject_panel::{PanelFrame, RowBinder, SubjectPanel};
pub use virtual_scroll::{RefreshReport, RowBatch, RowSink, VirtualScroll};

/// Tuning knobs for one [`VirtualScroll`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Multiplier on the largest row extent used as the culling margin.
    pub margin_factor: f32,
    /// Pooled rows kept before inactive ones are destroyed.
    pub pool_high_water: usize,
    /// Swap the container layout for a placeholder between rebuilds.
    pub freeze_layout: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            margin_factor: DEFAULT_MARGIN_FACTOR,
            pool_high_water: DEFAULT_HIGH_WATER,
            freeze_layout: true,
        }
    }
}
