//! Headless host: container, widgets, layout, and a storage-inspector subject.
//!
//! Drives the engine without a real UI toolkit. Used by the demo binary,
//! integration tests, and benchmarks.

pub mod container;
pub mod inventory;
pub mod stack_layout;
pub mod widget;

pub use container::SimContainer;
pub use inventory::{
    Description, Inventory, InventoryBinder, InventorySnapshot, PlainFormatter, StorageBin,
    StoredItem, SweepToggle,
};
pub use stack_layout::StackLayout;
pub use widget::{default_height, SimFactory, SimWidget, WidgetHandle};
