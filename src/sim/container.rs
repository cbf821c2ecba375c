//! Headless scroll container.
//!
//! Rows are stacked vertically by their sibling order. Like a real toolkit,
//! nothing moves until the host runs a layout pass with
//! [`SimContainer::layout`]; until then widgets report the placement of the
//! previous pass. A disabled row keeps its slot, so culling never moves the
//! rows around it.

use super::stack_layout::StackLayout;
use super::widget::WidgetState;
use crate::host::ScrollContainer;
use crate::model::{RowTransform, Vec2};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Debug)]
pub(crate) struct Surface {
    pub(crate) alive: bool,
    pub(crate) origin: Vec2,
    pub(crate) scroll: Vec2,
    pub(crate) viewport: Vec2,
    pub(crate) width: f32,
    pub(crate) layout: StackLayout,
    pub(crate) frozen: Option<Vec2>,
    pub(crate) freezes: u64,
    pub(crate) thaws: u64,
    pub(crate) widgets: Vec<Weak<RefCell<WidgetState>>>,
    pub(crate) next_stamp: u64,
    pub(crate) passes: u64,
    pub(crate) edits_while_frozen: u64,
}

impl Surface {
    /// Stamp for a `set_order` call; a later stamp wins a contested slot.
    pub(crate) fn stamp(&mut self) -> u64 {
        self.next_stamp += 1;
        self.next_stamp
    }

    /// A widget moved or resized itself.
    pub(crate) fn note_edit(&mut self) {
        if self.frozen.is_some() {
            self.edits_while_frozen += 1;
        }
    }

    fn layout(&mut self) -> bool {
        if self.frozen.is_some() {
            return false;
        }
        self.widgets.retain(|w| w.strong_count() > 0);
        let states: Vec<Rc<RefCell<WidgetState>>> =
            self.widgets.iter().filter_map(Weak::upgrade).collect();

        let mut claims: Vec<(u64, usize, usize)> = states
            .iter()
            .enumerate()
            .filter_map(|(i, state)| {
                let state = state.borrow();
                match (state.alive, state.slot) {
                    (true, Some(slot)) => Some((state.stamp, slot, i)),
                    _ => None,
                }
            })
            .collect();
        claims.sort_unstable();

        let mut owner: Vec<Option<usize>> = Vec::new();
        self.layout.clear();
        for &(_, slot, i) in &claims {
            if owner.len() <= slot {
                owner.resize(slot + 1, None);
            }
            owner[slot] = Some(i);
            self.layout.set(slot, states[i].borrow().height);
        }

        for (i, state) in states.iter().enumerate() {
            let mut state = state.borrow_mut();
            state.placed = match state.slot {
                Some(slot) if state.alive && owner.get(slot) == Some(&Some(i)) => {
                    Some(RowTransform::new(
                        self.origin + Vec2::new(0.0, self.layout.offset_of(slot) as f32),
                        Vec2::new(self.width, state.height as f32),
                    ))
                }
                _ => None,
            };
        }
        self.passes += 1;
        true
    }
}

/// Shared handle to a simulated scroll container.
///
/// Clones refer to the same container, so a test can keep one to scroll or
/// destroy it while the engine owns another.
#[derive(Debug, Clone)]
pub struct SimContainer {
    surface: Rc<RefCell<Surface>>,
}

impl SimContainer {
    /// A live container with the given viewport size; rows span its width.
    pub fn new(viewport: Vec2) -> Self {
        Self {
            surface: Rc::new(RefCell::new(Surface {
                alive: true,
                origin: Vec2::ZERO,
                scroll: Vec2::ZERO,
                viewport,
                width: viewport.x,
                layout: StackLayout::default(),
                frozen: None,
                freezes: 0,
                thaws: 0,
                widgets: Vec::new(),
                next_stamp: 0,
                passes: 0,
                edits_while_frozen: 0,
            })),
        }
    }

    pub(crate) fn surface(&self) -> Rc<RefCell<Surface>> {
        Rc::clone(&self.surface)
    }

    /// Scroll to `offset`.
    pub fn scroll_to(&self, offset: Vec2) {
        self.surface.borrow_mut().scroll = offset;
    }

    /// Scroll down by `dy`, clamped at the top.
    pub fn scroll_by(&self, dy: f32) {
        let mut surface = self.surface.borrow_mut();
        surface.scroll.y = (surface.scroll.y + dy).max(0.0);
    }

    /// Resize the visible area.
    pub fn resize(&self, viewport: Vec2) {
        self.surface.borrow_mut().viewport = viewport;
    }

    /// Move the content origin, e.g. when a header above the rows grows.
    pub fn set_origin(&self, origin: Vec2) {
        self.surface.borrow_mut().origin = origin;
    }

    /// Simulate the host destroying the container.
    pub fn destroy(&self) {
        self.surface.borrow_mut().alive = false;
    }

    /// Place every row from its current order and height.
    ///
    /// Returns false without moving anything while the layout is frozen.
    pub fn layout(&self) -> bool {
        self.surface.borrow_mut().layout()
    }

    /// Layout passes that ran.
    pub fn layout_passes(&self) -> u64 {
        self.surface.borrow().passes
    }

    /// Total stacked height as of the last layout pass.
    pub fn content_height(&self) -> f32 {
        self.surface.borrow().layout.total() as f32
    }

    /// Slot under vertical content offset `y`, as of the last layout pass.
    pub fn slot_at(&self, y: f32) -> Option<usize> {
        self.surface.borrow().layout.slot_at(y.max(0.0) as u64)
    }

    /// Placeholder size while frozen.
    pub fn frozen_size(&self) -> Option<Vec2> {
        self.surface.borrow().frozen
    }

    /// Times the layout was frozen.
    pub fn freezes(&self) -> u64 {
        self.surface.borrow().freezes
    }

    /// Reorders and resizes made while the layout was frozen.
    pub fn edits_while_frozen(&self) -> u64 {
        self.surface.borrow().edits_while_frozen
    }

    /// Times the layout was thawed.
    pub fn thaws(&self) -> u64 {
        self.surface.borrow().thaws
    }
}

impl ScrollContainer for SimContainer {
    fn is_alive(&self) -> bool {
        self.surface.borrow().alive
    }

    fn content_origin(&self) -> Vec2 {
        self.surface.borrow().origin
    }

    fn scroll_offset(&self) -> Vec2 {
        self.surface.borrow().scroll
    }

    fn viewport_size(&self) -> Vec2 {
        self.surface.borrow().viewport
    }

    fn freeze_layout(&mut self, size: Vec2) {
        let mut surface = self.surface.borrow_mut();
        surface.frozen = Some(size);
        surface.freezes += 1;
    }

    fn thaw_layout(&mut self) {
        let mut surface = self.surface.borrow_mut();
        surface.frozen = None;
        surface.thaws += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let a = SimContainer::new(Vec2::new(100.0, 50.0));
        let mut b = a.clone();
        a.scroll_by(30.0);
        assert_eq!(b.scroll_offset(), Vec2::new(0.0, 30.0));
        b.freeze_layout(Vec2::new(100.0, 400.0));
        assert_eq!(a.frozen_size(), Some(Vec2::new(100.0, 400.0)));
        a.destroy();
        assert!(!b.is_alive());
    }

    #[test]
    fn layout_is_skipped_while_frozen() {
        let mut c = SimContainer::new(Vec2::new(10.0, 10.0));
        assert!(c.layout());
        c.freeze_layout(Vec2::new(10.0, 40.0));
        assert!(!c.layout());
        assert_eq!(c.layout_passes(), 1);
        c.thaw_layout();
        assert!(c.layout());
        assert_eq!(c.layout_passes(), 2);
    }

    #[test]
    fn scroll_by_clamps_at_top() {
        let c = SimContainer::new(Vec2::new(10.0, 10.0));
        c.scroll_by(-25.0);
        assert_eq!(c.scroll_offset().y, 0.0);
    }
}
