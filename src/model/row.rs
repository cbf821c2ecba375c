//! Rows and their display payloads.

use super::geometry::Rect;
use super::identifiers::{Generation, RowId, RowKey};

/// Opaque reference to a host icon asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IconRef(pub String);

/// RGBA tint applied to an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tint(pub [u8; 4]);

/// What a row displays.
///
/// One variant per row family hosted by inspector panels. Content is compared
/// by value: a refresh that produces equal content does not touch the widget.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RowContent {
    /// Not yet populated.
    #[default]
    Empty,

    /// Status line: label, optional formatted value and tinted icon.
    Status {
        /// Localized label.
        label: String,
        /// Pre-formatted value text.
        value: Option<String>,
        /// Icon and its tint.
        icon: Option<(IconRef, Tint)>,
    },

    /// Storage entry: an item and its formatted amount.
    Storage {
        /// Item name.
        label: String,
        /// Raw amount, kept for diffing without reformatting.
        amount: f64,
        /// Formatted amount text.
        amount_text: String,
        /// Item icon.
        icon: Option<IconRef>,
    },

    /// Descriptor text with optional tooltip.
    Descriptor {
        /// Body text.
        text: String,
        /// Hover text.
        tooltip: Option<String>,
    },

    /// Checkbox line.
    Checkbox {
        /// Label beside the box.
        label: String,
        /// Current state.
        checked: bool,
    },
}

/// One visual line in the panel.
///
/// Exclusively owned by its [`crate::engine::RowPool`]; every other component
/// refers to it by [`RowKey`].
#[derive(Debug)]
pub struct Row<W> {
    id: RowId,
    key: RowKey,
    pub(crate) widget: W,
    pub(crate) bounds: Rect,
    pub(crate) visible: bool,
    pub(crate) pinned: bool,
    pub(crate) content: RowContent,
    pub(crate) layout_frozen: bool,
    pub(crate) order: Option<usize>,
    pub(crate) reuse_count: u64,
    pub(crate) last_used: Generation,
}

impl<W> Row<W> {
    pub(crate) fn new(id: RowId, key: RowKey, widget: W, generation: Generation) -> Self {
        Self {
            id,
            key,
            widget,
            bounds: Rect::default(),
            visible: true,
            pinned: false,
            content: RowContent::Empty,
            layout_frozen: false,
            order: None,
            reuse_count: 0,
            last_used: generation,
        }
    }

    /// Instance identity; stable for the row's lifetime.
    pub fn id(&self) -> RowId {
        self.id
    }

    /// Pool key.
    pub fn key(&self) -> &RowKey {
        &self.key
    }

    /// Bounds measured by the last rebuild.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Whether the widget is currently enabled.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether the row is force-shown.
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Last content applied.
    pub fn content(&self) -> &RowContent {
        &self.content
    }

    /// Whether the container layout was frozen when this row was last measured.
    pub fn is_layout_frozen(&self) -> bool {
        self.layout_frozen
    }

    /// Times this instance was handed out again after construction.
    pub fn reuse_count(&self) -> u64 {
        self.reuse_count
    }

    /// Generation in which the row was last acquired.
    pub fn last_used(&self) -> Generation {
        self.last_used
    }

    /// The host widget.
    pub fn widget(&self) -> &W {
        &self.widget
    }

    /// The host widget, mutably. Prefer the refresh batch for content.
    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }
}
