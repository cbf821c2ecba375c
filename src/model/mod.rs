//! Domain model: geometry, identifiers, rows, and errors.

pub mod error;
pub mod geometry;
pub mod identifiers;
pub mod row;

pub use error::{AggregateError, EngineError, WidgetError, WidgetPart};
pub use geometry::{Rect, RowTransform, Vec2, Viewport};
pub use identifiers::{FrameTick, Generation, InvalidRowKey, RowId, RowKey};
pub use row::{IconRef, Row, RowContent, Tint};
