//! Host collaborator contracts.
//!
//! The engine never owns host objects. Widgets, containers and entities are
//! reached only through these traits, and every call site is prepared for the
//! host object to have died between ticks.

use crate::model::{RowContent, RowKey, RowTransform, Vec2, WidgetError};
use std::any::{Any, TypeId};

/// A row widget instantiated from the panel's row template.
pub trait RowWidget {
    /// Enable or disable the widget. Assumed expensive; the engine only calls
    /// it when the state actually changes.
    fn set_enabled(&mut self, enabled: bool);

    /// Clear per-use state (callbacks, handlers) before the row is handed out
    /// again. Must not destroy layout.
    fn reset(&mut self);

    /// Move the widget to the given sibling position under the container.
    fn set_order(&mut self, order: usize);

    /// Push display content into the template.
    ///
    /// Implementations apply every part they can and report the first missing
    /// part, so a degraded row still shows what it has.
    fn apply(&mut self, content: &RowContent) -> Result<(), WidgetError>;

    /// Current placement in the container's space, or `None` if the host
    /// destroyed the widget.
    fn transform(&self) -> Option<RowTransform>;

    /// Whether the host object still exists.
    fn is_alive(&self) -> bool;

    /// Destroy the host object. Called once, by the pool.
    fn destroy(&mut self);
}

/// Constructs row widgets under the panel's standard template.
pub trait WidgetFactory {
    /// Widget type produced.
    type Widget: RowWidget;

    /// Instantiate and attach a new widget for `key`.
    fn instantiate(&mut self, key: &RowKey) -> Self::Widget;
}

/// The scroll container hosting the rows.
pub trait ScrollContainer {
    /// Whether the host container still exists and is enabled.
    fn is_alive(&self) -> bool;

    /// Content origin in the space row transforms are reported in.
    fn content_origin(&self) -> Vec2;

    /// Current scroll offset into the content.
    fn scroll_offset(&self) -> Vec2;

    /// Size of the visible area.
    fn viewport_size(&self) -> Vec2;

    /// Swap the live layout component for a fixed-size placeholder.
    fn freeze_layout(&mut self, size: Vec2);

    /// Restore the live layout component.
    fn thaw_layout(&mut self);
}

/// Entity/component lookup on a host subject.
pub trait EntityQuery {
    /// Component of the given type, if the entity has one.
    fn component(&self, type_id: TypeId) -> Option<&dyn Any>;
}

/// Typed convenience over [`EntityQuery`].
pub trait EntityQueryExt: EntityQuery {
    /// Component of type `C`, if the entity has one.
    fn try_get<C: Any>(&self) -> Option<&C> {
        self.component(TypeId::of::<C>())
            .and_then(|c| c.downcast_ref::<C>())
    }

    /// Whether the entity carries a component of type `C`.
    fn has<C: Any>(&self) -> bool {
        self.try_get::<C>().is_some()
    }
}

impl<T: EntityQuery + ?Sized> EntityQueryExt for T {}

/// Number presentation requested from the host formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberFormat {
    /// Fixed decimals.
    Plain {
        /// Digits after the point.
        decimals: u8,
    },
    /// Ratio rendered as a percentage.
    Percent,
    /// Mass in kilograms with unit suffix.
    Mass,
}

/// Host string services: localization and number formatting.
///
/// Treated as pure functions.
pub trait Formatter {
    /// Format `value` according to `format`.
    fn format_number(&self, value: f64, format: NumberFormat) -> String;

    /// Localized string for `key`.
    fn localize(&self, key: &str) -> String;
}
