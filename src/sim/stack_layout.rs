//! StackLayout - vertical stack of slots with O(log n) offsets via Fenwick tree
//!
//! Slot `i` starts at the sum of the heights of slots `0..i`.
//!
//! # Complexity
//!
//! - `set`: O(log n), or O(n) when the backing tree has to grow
//! - `offset_of`: O(log n)
//! - `slot_at`: O(log² n)
//! - `total`: O(log n)

/// Heights of consecutive slots in a vertical stack.
#[derive(Debug, Clone)]
pub struct StackLayout {
    /// Fenwick tree over `heights`, sized to capacity.
    tree: Vec<i64>,
    /// Raw heights; the source of truth when the tree is rebuilt.
    heights: Vec<u32>,
}

impl StackLayout {
    /// Create an empty layout with room for `capacity` slots.
    ///
    /// ```
    /// # use vrows::sim::StackLayout;
    /// let layout = StackLayout::new(16);
    /// assert_eq!(layout.len(), 0);
    /// assert_eq!(layout.total(), 0);
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self {
            tree: vec![0; capacity.max(1)],
            heights: Vec::with_capacity(capacity),
        }
    }

    /// Set the height of `slot`, appending empty slots up to it if needed.
    ///
    /// ```
    /// # use vrows::sim::StackLayout;
    /// let mut layout = StackLayout::new(4);
    /// layout.set(0, 10);
    /// layout.set(2, 5);
    /// assert_eq!(layout.len(), 3);
    /// assert_eq!(layout.offset_of(2), 10);
    /// assert_eq!(layout.total(), 15);
    /// ```
    pub fn set(&mut self, slot: usize, height: u32) {
        if slot >= self.heights.len() {
            self.heights.resize(slot + 1, 0);
        }
        if self.heights.len() > self.tree.len() {
            // Fenwick parents depend on the tree length; grow by rebuilding.
            self.grow(self.heights.len().next_power_of_two());
        }

        let delta = i64::from(height) - i64::from(self.heights[slot]);
        self.heights[slot] = height;
        if delta != 0 {
            fenwick::array::update(&mut self.tree, slot, delta);
        }
    }

    fn grow(&mut self, capacity: usize) {
        self.tree.clear();
        self.tree.resize(capacity, 0);
        for (slot, &height) in self.heights.iter().enumerate() {
            if height != 0 {
                fenwick::array::update(&mut self.tree, slot, i64::from(height));
            }
        }
    }

    /// Height of `slot`, zero if out of range.
    pub fn height(&self, slot: usize) -> u32 {
        self.heights.get(slot).copied().unwrap_or(0)
    }

    /// Top edge of `slot`: the sum of every slot above it.
    pub fn offset_of(&self, slot: usize) -> u64 {
        if slot == 0 || self.heights.is_empty() {
            return 0;
        }
        let last = slot.min(self.heights.len()) - 1;
        fenwick::array::prefix_sum(&self.tree, last).max(0) as u64
    }

    /// Slot containing vertical offset `y`, or `None` past the end.
    ///
    /// ```
    /// # use vrows::sim::StackLayout;
    /// let mut layout = StackLayout::new(4);
    /// layout.set(0, 10);
    /// layout.set(1, 20);
    /// assert_eq!(layout.slot_at(0), Some(0));
    /// assert_eq!(layout.slot_at(10), Some(1));
    /// assert_eq!(layout.slot_at(30), None);
    /// ```
    pub fn slot_at(&self, y: u64) -> Option<usize> {
        let (mut left, mut right) = (0, self.heights.len());
        while left < right {
            let mid = left + (right - left) / 2;
            if self.offset_of(mid + 1) > y {
                right = mid;
            } else {
                left = mid + 1;
            }
        }
        (left < self.heights.len()).then_some(left)
    }

    /// Sum of every slot height.
    pub fn total(&self) -> u64 {
        self.offset_of(self.heights.len())
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    /// True when there are no slots.
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Drop every slot, keeping capacity.
    pub fn clear(&mut self) {
        self.heights.clear();
        self.tree.iter_mut().for_each(|node| *node = 0);
    }
}

impl Default for StackLayout {
    fn default() -> Self {
        Self::new(64)
    }
}
