//! Headless row widgets and their factory.

use super::container::{SimContainer, Surface};
use crate::host::{RowWidget, WidgetFactory};
use crate::model::{RowContent, RowKey, RowTransform, WidgetError, WidgetPart};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Height of a row showing `content`, before per-key overrides.
pub fn default_height(content: &RowContent) -> u32 {
    match content {
        RowContent::Empty => 20,
        RowContent::Status { .. } => 24,
        RowContent::Storage { .. } => 20,
        RowContent::Descriptor { .. } => 32,
        RowContent::Checkbox { .. } => 22,
    }
}

#[derive(Debug)]
pub(crate) struct WidgetState {
    id: u64,
    pub(crate) alive: bool,
    enabled: bool,
    pub(crate) slot: Option<usize>,
    pub(crate) stamp: u64,
    pub(crate) height: u32,
    pub(crate) placed: Option<RowTransform>,
    fixed_height: Option<u32>,
    label: Option<String>,
    enable_calls: u64,
    applies: u64,
    resets: u64,
    order_calls: u64,
}

/// Test-side view of one widget: counters, state, and a kill switch.
#[derive(Debug, Clone)]
pub struct WidgetHandle {
    state: Rc<RefCell<WidgetState>>,
}

impl WidgetHandle {
    /// Serial number assigned by the factory.
    pub fn id(&self) -> u64 {
        self.state.borrow().id
    }

    /// Whether the widget is enabled.
    pub fn is_enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    /// Whether the widget still exists.
    pub fn is_alive(&self) -> bool {
        self.state.borrow().alive
    }

    /// `set_enabled` calls received.
    pub fn enable_calls(&self) -> u64 {
        self.state.borrow().enable_calls
    }

    /// `apply` calls received.
    pub fn applies(&self) -> u64 {
        self.state.borrow().applies
    }

    /// `reset` calls received.
    pub fn resets(&self) -> u64 {
        self.state.borrow().resets
    }

    /// `set_order` calls received.
    pub fn order_calls(&self) -> u64 {
        self.state.borrow().order_calls
    }

    /// Current sibling slot.
    pub fn slot(&self) -> Option<usize> {
        self.state.borrow().slot
    }

    /// Placement from the last layout pass.
    pub fn placed(&self) -> Option<RowTransform> {
        self.state.borrow().placed
    }

    /// Label text last applied.
    pub fn label(&self) -> Option<String> {
        self.state.borrow().label.clone()
    }

    /// Simulate the host destroying the widget behind the engine's back.
    pub fn kill(&self) {
        self.state.borrow_mut().alive = false;
    }
}

/// A row widget stacked in a [`SimContainer`].
#[derive(Debug)]
pub struct SimWidget {
    state: Rc<RefCell<WidgetState>>,
    surface: Rc<RefCell<Surface>>,
    missing: Rc<HashSet<WidgetPart>>,
}

impl SimWidget {
    fn require(&self, part: WidgetPart, first_missing: &mut Option<WidgetPart>) {
        if first_missing.is_none() && self.missing.contains(&part) {
            *first_missing = Some(part);
        }
    }
}

impl RowWidget for SimWidget {
    fn set_enabled(&mut self, enabled: bool) {
        let mut state = self.state.borrow_mut();
        state.enabled = enabled;
        state.enable_calls += 1;
    }

    fn reset(&mut self) {
        self.state.borrow_mut().resets += 1;
    }

    fn set_order(&mut self, order: usize) {
        let stamp = {
            let mut surface = self.surface.borrow_mut();
            surface.note_edit();
            surface.stamp()
        };
        let mut state = self.state.borrow_mut();
        state.slot = Some(order);
        state.stamp = stamp;
        state.order_calls += 1;
    }

    fn apply(&mut self, content: &RowContent) -> Result<(), WidgetError> {
        if !self.state.borrow().alive {
            return Err(WidgetError::Destroyed);
        }
        let mut missing = None;
        let label = match content {
            RowContent::Empty => None,
            RowContent::Status { label, value, icon } => {
                if icon.is_some() {
                    self.require(WidgetPart::Icon, &mut missing);
                }
                Some(match value {
                    Some(value) => format!("{label}: {value}"),
                    None => label.clone(),
                })
            }
            RowContent::Storage {
                label,
                amount_text,
                icon,
                ..
            } => {
                if icon.is_some() {
                    self.require(WidgetPart::Icon, &mut missing);
                }
                Some(format!("{label} {amount_text}"))
            }
            RowContent::Descriptor { text, tooltip } => {
                if tooltip.is_some() {
                    self.require(WidgetPart::Tooltip, &mut missing);
                }
                Some(text.clone())
            }
            RowContent::Checkbox { label, checked } => {
                self.require(WidgetPart::Toggle, &mut missing);
                Some(format!("[{}] {label}", if *checked { 'x' } else { ' ' }))
            }
        };

        let resized = {
            let mut state = self.state.borrow_mut();
            state.applies += 1;
            if self.missing.contains(&WidgetPart::Label) {
                missing = missing.or(Some(WidgetPart::Label));
            } else {
                state.label = label;
            }
            let height = state.fixed_height.unwrap_or_else(|| default_height(content));
            std::mem::replace(&mut state.height, height) != height
        };
        if resized {
            self.surface.borrow_mut().note_edit();
        }

        match missing {
            Some(part) => Err(WidgetError::MissingPart(part)),
            None => Ok(()),
        }
    }

    fn transform(&self) -> Option<RowTransform> {
        let state = self.state.borrow();
        if !state.alive || !self.surface.borrow().alive {
            return None;
        }
        state.placed
    }

    fn is_alive(&self) -> bool {
        self.state.borrow().alive
    }

    fn destroy(&mut self) {
        let mut state = self.state.borrow_mut();
        state.alive = false;
        state.enabled = false;
    }
}

/// Builds [`SimWidget`]s into one container and keeps a handle per key.
#[derive(Debug)]
pub struct SimFactory {
    surface: Rc<RefCell<Surface>>,
    missing: Rc<HashSet<WidgetPart>>,
    heights: HashMap<String, u32>,
    handles: HashMap<RowKey, WidgetHandle>,
    next_id: u64,
}

impl SimFactory {
    /// Factory for rows inside `container`, using a complete template.
    pub fn new(container: &SimContainer) -> Self {
        Self {
            surface: container.surface(),
            missing: Rc::new(HashSet::new()),
            heights: HashMap::new(),
            handles: HashMap::new(),
            next_id: 0,
        }
    }

    /// Use a template lacking `parts`.
    pub fn with_missing_parts(mut self, parts: impl IntoIterator<Item = WidgetPart>) -> Self {
        self.missing = Rc::new(parts.into_iter().collect());
        self
    }

    /// Give rows keyed `key` a fixed height.
    pub fn with_height(mut self, key: &str, height: u32) -> Self {
        self.heights.insert(key.to_string(), height);
        self
    }

    /// Handle on the most recent widget built for `key`.
    pub fn handle(&self, key: &str) -> Option<&WidgetHandle> {
        self.handles.get(key)
    }

    /// Widgets built so far.
    pub fn built(&self) -> u64 {
        self.next_id
    }
}

impl WidgetFactory for SimFactory {
    type Widget = SimWidget;

    fn instantiate(&mut self, key: &RowKey) -> SimWidget {
        let fixed_height = self.heights.get(key.as_str()).copied();
        let state = Rc::new(RefCell::new(WidgetState {
            id: self.next_id,
            alive: true,
            enabled: true,
            slot: None,
            stamp: 0,
            height: fixed_height.unwrap_or_else(|| default_height(&RowContent::Empty)),
            placed: None,
            fixed_height,
            label: None,
            enable_calls: 0,
            applies: 0,
            resets: 0,
            order_calls: 0,
        }));
        self.next_id += 1;
        self.surface
            .borrow_mut()
            .widgets
            .push(Rc::downgrade(&state));
        self.handles.insert(
            key.clone(),
            WidgetHandle {
                state: Rc::clone(&state),
            },
        );
        SimWidget {
            state,
            surface: Rc::clone(&self.surface),
            missing: Rc::clone(&self.missing),
        }
    }
}
