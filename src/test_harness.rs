//! Recording fakes for engine unit tests.
//!
//! Unlike the `sim` host these do no layout: tests place rows explicitly with
//! [`FakeFactory::place`] and inspect every call the engine made.

use crate::host::{RowWidget, ScrollContainer, WidgetFactory};
use crate::model::{RowContent, RowKey, RowTransform, Vec2, WidgetError, WidgetPart};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub fn key(raw: &str) -> RowKey {
    RowKey::new(raw).expect("test keys are non-empty")
}

pub fn at(x: f32, y: f32, w: f32, h: f32) -> RowTransform {
    RowTransform::new(Vec2::new(x, y), Vec2::new(w, h))
}

/// Every call the engine made on widgets from one factory.
#[derive(Debug, Default)]
pub struct CallLog {
    pub instantiated: Vec<String>,
    pub enables: Vec<(String, bool)>,
    pub resets: Vec<String>,
    pub applies: Vec<String>,
    pub orders: Vec<(String, usize)>,
    pub destroyed: Vec<String>,
    /// Keys ordered or re-applied while the watched container was frozen.
    pub while_frozen: Vec<String>,
}

impl CallLog {
    pub fn enables_for(&self, k: &str) -> usize {
        self.enables.iter().filter(|(key, _)| key == k).count()
    }
}

#[derive(Debug, Default)]
struct Shared {
    log: CallLog,
    placements: HashMap<String, RowTransform>,
    dead: Vec<String>,
    missing: Option<WidgetPart>,
    watched: Option<FakeContainer>,
}

impl Shared {
    fn note_if_frozen(&mut self, key: &str) {
        if self.watched.as_ref().is_some_and(|c| c.frozen().is_some()) {
            self.log.while_frozen.push(key.to_string());
        }
    }
}

#[derive(Debug)]
pub struct FakeWidget {
    key: String,
    serial: u64,
    alive: bool,
    shared: Rc<RefCell<Shared>>,
}

impl FakeWidget {
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

impl RowWidget for FakeWidget {
    fn set_enabled(&mut self, enabled: bool) {
        self.shared
            .borrow_mut()
            .log
            .enables
            .push((self.key.clone(), enabled));
    }

    fn reset(&mut self) {
        self.shared.borrow_mut().log.resets.push(self.key.clone());
    }

    fn set_order(&mut self, order: usize) {
        let mut shared = self.shared.borrow_mut();
        shared.note_if_frozen(&self.key);
        shared.log.orders.push((self.key.clone(), order));
    }

    fn apply(&mut self, _content: &RowContent) -> Result<(), WidgetError> {
        let mut shared = self.shared.borrow_mut();
        shared.note_if_frozen(&self.key);
        shared.log.applies.push(self.key.clone());
        match shared.missing {
            Some(part) => Err(WidgetError::MissingPart(part)),
            None => Ok(()),
        }
    }

    fn transform(&self) -> Option<RowTransform> {
        if !self.is_alive() {
            return None;
        }
        self.shared.borrow().placements.get(&self.key).copied()
    }

    fn is_alive(&self) -> bool {
        self.alive && !self.shared.borrow().dead.contains(&self.key)
    }

    fn destroy(&mut self) {
        self.alive = false;
        self.shared.borrow_mut().log.destroyed.push(self.key.clone());
    }
}

#[derive(Debug, Default)]
pub struct FakeFactory {
    shared: Rc<RefCell<Shared>>,
    next_serial: u64,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A second handle onto the same log and placements.
    pub fn handle(&self) -> FakeHandle {
        FakeHandle {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl WidgetFactory for FakeFactory {
    type Widget = FakeWidget;

    fn instantiate(&mut self, key: &RowKey) -> FakeWidget {
        let serial = self.next_serial;
        self.next_serial += 1;
        let mut shared = self.shared.borrow_mut();
        shared.log.instantiated.push(key.to_string());
        shared.dead.retain(|k| k != key.as_str());
        drop(shared);
        FakeWidget {
            key: key.to_string(),
            serial,
            alive: true,
            shared: Rc::clone(&self.shared),
        }
    }
}

/// Test-side access to a [`FakeFactory`] after it moved into a pool.
#[derive(Debug, Clone)]
pub struct FakeHandle {
    shared: Rc<RefCell<Shared>>,
}

impl FakeHandle {
    pub fn place(&self, k: &str, transform: RowTransform) {
        self.shared
            .borrow_mut()
            .placements
            .insert(k.to_string(), transform);
    }

    /// Simulate the host destroying the current widget for `k`.
    pub fn kill(&self, k: &str) {
        self.shared.borrow_mut().dead.push(k.to_string());
    }

    /// Record order and content calls made while `container` is frozen.
    pub fn watch(&self, container: &FakeContainer) {
        self.shared.borrow_mut().watched = Some(container.clone());
    }

    pub fn set_missing(&self, part: Option<WidgetPart>) {
        self.shared.borrow_mut().missing = part;
    }

    pub fn log<R>(&self, f: impl FnOnce(&CallLog) -> R) -> R {
        f(&self.shared.borrow().log)
    }

    pub fn clear_log(&self) {
        self.shared.borrow_mut().log = CallLog::default();
    }
}

#[derive(Debug)]
struct ContainerState {
    alive: bool,
    origin: Vec2,
    scroll: Vec2,
    viewport: Vec2,
    frozen: Option<Vec2>,
    freezes: u32,
    thaws: u32,
}

/// Scroll container whose clones share state.
#[derive(Debug, Clone)]
pub struct FakeContainer {
    state: Rc<RefCell<ContainerState>>,
}

impl FakeContainer {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            state: Rc::new(RefCell::new(ContainerState {
                alive: true,
                origin: Vec2::ZERO,
                scroll: Vec2::ZERO,
                viewport,
                frozen: None,
                freezes: 0,
                thaws: 0,
            })),
        }
    }

    pub fn scroll_to(&self, offset: Vec2) {
        self.state.borrow_mut().scroll = offset;
    }

    pub fn destroy(&self) {
        self.state.borrow_mut().alive = false;
    }

    pub fn frozen(&self) -> Option<Vec2> {
        self.state.borrow().frozen
    }

    pub fn freezes(&self) -> u32 {
        self.state.borrow().freezes
    }

    pub fn thaws(&self) -> u32 {
        self.state.borrow().thaws
    }
}

impl ScrollContainer for FakeContainer {
    fn is_alive(&self) -> bool {
        self.state.borrow().alive
    }

    fn content_origin(&self) -> Vec2 {
        self.state.borrow().origin
    }

    fn scroll_offset(&self) -> Vec2 {
        self.state.borrow().scroll
    }

    fn viewport_size(&self) -> Vec2 {
        self.state.borrow().viewport
    }

    fn freeze_layout(&mut self, size: Vec2) {
        let mut state = self.state.borrow_mut();
        state.frozen = Some(size);
        state.freezes += 1;
    }

    fn thaw_layout(&mut self) {
        let mut state = self.state.borrow_mut();
        state.frozen = None;
        state.thaws += 1;
    }
}
