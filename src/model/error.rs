//! Error types for the row engine.
//!
//! The taxonomy follows how failures are recovered:
//!
//! - [`WidgetError`] - a single row's widget misbehaved. Always isolated to
//!   that row: the row is degraded or recreated, the pass continues.
//! - [`EngineError`] - the host drove the facade incorrectly (ticking before
//!   `initialize`, using a disposed panel). Returned to the host.
//! - [`AggregateError`] - the background summation missed its barrier. The
//!   owner keeps last round's results and logs the miss.
//!
//! Key collisions are deliberately absent: see [`crate::model::RowKey`].

use thiserror::Error;

/// Visual part of a row template the engine may try to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetPart {
    /// Main text label.
    Label,
    /// Icon image.
    Icon,
    /// Hover tooltip.
    Tooltip,
    /// Checkbox toggle.
    Toggle,
}

impl std::fmt::Display for WidgetPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WidgetPart::Label => "label",
            WidgetPart::Icon => "icon",
            WidgetPart::Tooltip => "tooltip",
            WidgetPart::Toggle => "toggle",
        };
        f.write_str(name)
    }
}

/// Failure applying content to one row widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WidgetError {
    /// The template lacks a component the content wanted to drive.
    ///
    /// **Recovery**: the rest of the content was applied; the row renders
    /// without the missing feature.
    #[error("row template has no {0} component")]
    MissingPart(WidgetPart),

    /// The host destroyed the widget behind the engine's back.
    ///
    /// **Recovery**: the pool drops the entry and constructs a fresh row the
    /// next time the key is acquired.
    #[error("row widget was destroyed by the host")]
    Destroyed,
}

/// Host-facing misuse of the engine facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    /// An operation needing a container ran before `initialize`.
    #[error("virtual scroll has not been initialized with a container")]
    NotInitialized,

    /// `initialize` was called twice without an intervening `dispose`.
    #[error("virtual scroll is already bound to a container")]
    AlreadyInitialized,

    /// The container handle no longer refers to a live host object.
    #[error("scroll container is gone")]
    ContainerGone,

    /// The panel was disposed and cannot be used again.
    #[error("virtual scroll has been disposed")]
    Disposed,
}

/// Failure of a background aggregation round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AggregateError {
    /// Not every worker reported before the deadline.
    #[error("aggregation timed out: {completed}/{expected} workers finished")]
    Timeout {
        /// Workers that reported in time.
        completed: usize,
        /// Workers spawned for the round.
        expected: usize,
    },

    /// A worker panicked or dropped its channel without reporting.
    #[error("aggregation worker exited without reporting")]
    WorkerLost,

    /// The OS refused to spawn a worker thread.
    #[error("failed to spawn aggregation worker")]
    Spawn,
}
