//! Storage-inspector subject and its row binder.
//!
//! An [`Inventory`] is a host entity with optional components: a storage bin,
//! a sweep toggle, and a description. [`InventoryBinder`] renders one as a
//! status line, an optional descriptor and checkbox, then one row per stored
//! item.

use crate::engine::{DerivedContext, DerivedFact, RowBinder, RowSink};
use crate::host::{EntityQuery, EntityQueryExt, Formatter, NumberFormat};
use crate::model::{IconRef, RowContent, RowKey};
use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// One stack of an item in storage.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredItem {
    /// Item name; also the row identity.
    pub name: String,
    /// Mass in kilograms.
    pub mass_kg: f64,
    /// Icon asset, if any.
    pub icon: Option<String>,
}

impl StoredItem {
    /// Item without an icon.
    pub fn new(name: impl Into<String>, mass_kg: f64) -> Self {
        Self {
            name: name.into(),
            mass_kg,
            icon: None,
        }
    }
}

/// Storage bin component.
#[derive(Debug, Default)]
pub struct StorageBin {
    /// Capacity in kilograms.
    pub capacity_kg: f64,
    /// Stored items, in display order.
    pub items: RefCell<Vec<StoredItem>>,
}

/// "Sweep only" toggle component.
#[derive(Debug, Default)]
pub struct SweepToggle {
    /// Current state.
    pub enabled: Cell<bool>,
}

/// Flavor text component.
#[derive(Debug, Clone)]
pub struct Description(pub String);

/// A selectable host entity.
#[derive(Debug, Default)]
pub struct Inventory {
    name: String,
    storage: Option<StorageBin>,
    sweep: Option<SweepToggle>,
    description: Option<Description>,
}

impl Inventory {
    /// Entity with no components.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a storage bin holding `items`.
    pub fn with_storage(mut self, capacity_kg: f64, items: Vec<StoredItem>) -> Self {
        self.storage = Some(StorageBin {
            capacity_kg,
            items: RefCell::new(items),
        });
        self
    }

    /// Add a sweep toggle.
    pub fn with_sweep(mut self, enabled: bool) -> Self {
        self.sweep = Some(SweepToggle {
            enabled: Cell::new(enabled),
        });
        self
    }

    /// Add a description.
    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(Description(text.into()));
        self
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl EntityQuery for Inventory {
    fn component(&self, type_id: TypeId) -> Option<&dyn Any> {
        if type_id == TypeId::of::<StorageBin>() {
            self.storage.as_ref().map(|c| c as &dyn Any)
        } else if type_id == TypeId::of::<SweepToggle>() {
            self.sweep.as_ref().map(|c| c as &dyn Any)
        } else if type_id == TypeId::of::<Description>() {
            self.description.as_ref().map(|c| c as &dyn Any)
        } else {
            None
        }
    }
}

/// Cheap facts captured when an inventory is selected.
#[derive(Debug, Clone, PartialEq)]
pub struct InventorySnapshot {
    /// Localized title.
    pub title: String,
    /// Storage capacity, if the entity stores anything.
    pub capacity_kg: Option<f64>,
    /// Whether a sweep toggle exists.
    pub has_sweep: bool,
    /// Description text.
    pub description: Option<String>,
}

/// Formatter with a fixed string table and simple number rules.
#[derive(Debug, Clone, Default)]
pub struct PlainFormatter {
    strings: HashMap<String, String>,
}

impl PlainFormatter {
    /// Formatter with an empty string table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a localized string.
    pub fn with_string(mut self, key: &str, text: &str) -> Self {
        self.strings.insert(key.to_string(), text.to_string());
        self
    }
}

impl Formatter for PlainFormatter {
    fn format_number(&self, value: f64, format: NumberFormat) -> String {
        match format {
            NumberFormat::Plain { decimals } => format!("{value:.prec$}", prec = decimals as usize),
            NumberFormat::Percent => format!("{:.0}%", value * 100.0),
            NumberFormat::Mass if value.abs() >= 1000.0 => format!("{:.1} t", value / 1000.0),
            NumberFormat::Mass => format!("{value:.1} kg"),
        }
    }

    fn localize(&self, key: &str) -> String {
        self.strings
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

struct ItemRow {
    key: RowKey,
    content: RowContent,
}

/// Renders [`Inventory`] subjects.
///
/// Row contents are cached and patched in place, so a frame in which nothing
/// changed pushes the same values again without formatting or allocating.
pub struct InventoryBinder<Fmt: Formatter> {
    formatter: Fmt,
    keys: FixedKeys,
    fill: DerivedFact<(u64, u64), String>,
    status: RowContent,
    descriptor: RowContent,
    sweep: RowContent,
    items: HashMap<String, ItemRow>,
    item_formats: u64,
}

struct FixedKeys {
    status: RowKey,
    descriptor: RowKey,
    sweep: RowKey,
}

impl FixedKeys {
    fn new() -> Self {
        Self {
            status: RowKey::literal("status"),
            descriptor: RowKey::literal("descriptor"),
            sweep: RowKey::literal("sweep"),
        }
    }
}

impl<Fmt: Formatter> InventoryBinder<Fmt> {
    /// Binder formatting through `formatter`.
    pub fn new(formatter: Fmt) -> Self {
        Self {
            formatter,
            keys: FixedKeys::new(),
            fill: DerivedFact::new(),
            status: RowContent::Empty,
            descriptor: RowContent::Empty,
            sweep: RowContent::Empty,
            items: HashMap::new(),
            item_formats: 0,
        }
    }

    /// Times the fill-level string was formatted.
    pub fn fill_formats(&self) -> u64 {
        self.fill.recomputes()
    }

    /// Times an item amount was formatted.
    pub fn item_formats(&self) -> u64 {
        self.item_formats
    }

    /// Item rows currently cached.
    pub fn cached_items(&self) -> usize {
        self.items.len()
    }

    fn bind_status(&mut self, subject: &Inventory, snapshot: &InventorySnapshot, ctx: &DerivedContext) {
        let before = self.fill.recomputes();
        let total: f64 = subject
            .try_get::<StorageBin>()
            .map(|bin| bin.items.borrow().iter().map(|i| i.mass_kg).sum::<f64>())
            .unwrap_or(0.0);
        let capacity = snapshot.capacity_kg.unwrap_or(0.0);
        let formatter = &self.formatter;
        self.fill.get(ctx, (total.to_bits(), capacity.to_bits()), |_| {
            if capacity > 0.0 {
                formatter.format_number(total / capacity, NumberFormat::Percent)
            } else {
                formatter.format_number(total, NumberFormat::Mass)
            }
        });

        if self.fill.recomputes() != before || !matches!(self.status, RowContent::Status { .. }) {
            self.status = RowContent::Status {
                label: snapshot.title.clone(),
                value: self.fill.value().cloned(),
                icon: None,
            };
        }
    }

    fn bind_items(&mut self, bin: &StorageBin, rows: &mut dyn RowSink) {
        for item in bin.items.borrow().iter() {
            if !self.items.contains_key(item.name.as_str()) {
                let Ok(key) = RowKey::new(format!("item:{}", item.name)) else {
                    continue;
                };
                self.items.insert(
                    item.name.clone(),
                    ItemRow {
                        key,
                        content: RowContent::Empty,
                    },
                );
            }
            let Some(row) = self.items.get_mut(item.name.as_str()) else {
                continue;
            };

            let stale = match &row.content {
                RowContent::Storage { amount, .. } => *amount != item.mass_kg,
                _ => true,
            };
            if stale {
                self.item_formats += 1;
                row.content = RowContent::Storage {
                    label: self.formatter.localize(&item.name),
                    amount: item.mass_kg,
                    amount_text: self.formatter.format_number(item.mass_kg, NumberFormat::Mass),
                    icon: item.icon.clone().map(IconRef),
                };
            }
            rows.push(&row.key, &row.content);
        }
    }
}

impl<Fmt: Formatter> RowBinder<Inventory> for InventoryBinder<Fmt> {
    type Snapshot = InventorySnapshot;

    fn capture(&self, subject: &Inventory) -> InventorySnapshot {
        InventorySnapshot {
            title: self.formatter.localize(subject.name()),
            capacity_kg: subject.try_get::<StorageBin>().map(|bin| bin.capacity_kg),
            has_sweep: subject.has::<SweepToggle>(),
            description: subject.try_get::<Description>().map(|d| d.0.clone()),
        }
    }

    fn bind(
        &mut self,
        subject: &Inventory,
        snapshot: &InventorySnapshot,
        ctx: &DerivedContext,
        rows: &mut dyn RowSink,
    ) {
        self.bind_status(subject, snapshot, ctx);
        rows.push(&self.keys.status, &self.status);

        if let Some(text) = &snapshot.description {
            let stale = !matches!(&self.descriptor, RowContent::Descriptor { text: t, .. } if t == text);
            if stale {
                self.descriptor = RowContent::Descriptor {
                    text: text.clone(),
                    tooltip: None,
                };
            }
            rows.push(&self.keys.descriptor, &self.descriptor);
        }

        if let Some(toggle) = subject.try_get::<SweepToggle>() {
            let checked = toggle.enabled.get();
            match &mut self.sweep {
                RowContent::Checkbox { checked: current, .. } => *current = checked,
                other => {
                    *other = RowContent::Checkbox {
                        label: self.formatter.localize("SWEEP_ONLY"),
                        checked,
                    }
                }
            }
            rows.push(&self.keys.sweep, &self.sweep);
        }

        if let Some(bin) = subject.try_get::<StorageBin>() {
            self.bind_items(bin, rows);
        }
    }

    fn release(&mut self) {
        self.fill.clear();
        self.status = RowContent::Empty;
        self.descriptor = RowContent::Empty;
        self.sweep = RowContent::Empty;
        self.items.clear();
    }
}
