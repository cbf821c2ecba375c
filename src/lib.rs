//! Virtualized row lists (vrows)
//!
//! A viewport-culled, incrementally refreshed row list engine for retained
//! UI hosts. Rows are declared by key every frame; the engine reuses pooled
//! widgets, applies only changed content, rebuilds layout at most once per
//! frame and enables only the widgets that meet the padded viewport.
//!
//! The host is reached through the traits in [`host`]; [`sim`] provides a
//! headless implementation used by the CLI, tests and benchmarks.

pub mod config;
pub mod engine;
pub mod host;
pub mod logging;
pub mod model;
pub mod sim;

#[cfg(test)]
mod test_harness;
