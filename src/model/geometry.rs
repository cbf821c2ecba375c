//! Content-space geometry: points, rectangles, transforms, viewports.
//!
//! All coordinates are in the scroll content's local space with `y` growing
//! downward, matching how the scroll offset grows as the user scrolls down.

use std::ops::{Add, Mul, Sub};

/// A 2D point or extent in content space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component (grows downward).
    pub y: f32,
}

impl Vec2 {
    /// The origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Component-wise maximum.
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }

    /// Component-wise minimum.
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// Replace non-finite components with zero.
    pub fn finite_or_zero(self) -> Self {
        let fix = |v: f32| if v.is_finite() { v } else { 0.0 };
        Self::new(fix(self.x), fix(self.y))
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned rectangle with inclusive edges.
///
/// # Invariants
/// - `min.x <= max.x` and `min.y <= max.y` for rectangles built through
///   [`Rect::from_corners`] or [`Rect::from_origin_size`].
/// - A zero-area rectangle is a valid point or segment.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Top-left corner.
    pub min: Vec2,
    /// Bottom-right corner.
    pub max: Vec2,
}

impl Rect {
    /// Build a rectangle from two arbitrary corners, normalizing their order.
    ///
    /// Non-finite coordinates collapse to zero so the result can always be
    /// compared against a viewport.
    ///
    /// ```
    /// # use vrows::model::{Rect, Vec2};
    /// let r = Rect::from_corners(Vec2::new(10.0, 5.0), Vec2::new(0.0, 15.0));
    /// assert_eq!(r.min, Vec2::new(0.0, 5.0));
    /// assert_eq!(r.max, Vec2::new(10.0, 15.0));
    /// ```
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        let a = a.finite_or_zero();
        let b = b.finite_or_zero();
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Build a rectangle from its top-left corner and size.
    pub fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self::from_corners(origin, origin + size)
    }

    /// Width and height.
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// True when the rectangle has no area (a point or a segment).
    pub fn is_degenerate(&self) -> bool {
        let size = self.size();
        size.x <= 0.0 || size.y <= 0.0
    }

    /// Grow the rectangle by `margin` on every side.
    pub fn inflate(&self, margin: Vec2) -> Self {
        Self {
            min: self.min - margin,
            max: self.max + margin,
        }
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Inclusive intersection test.
    ///
    /// Touching edges count as intersecting, so a row whose bottom edge sits
    /// exactly on the viewport's top edge is still considered on screen.
    ///
    /// ```
    /// # use vrows::model::{Rect, Vec2};
    /// let viewport = Rect::from_corners(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0));
    /// let touching = Rect::from_corners(Vec2::new(0.0, 100.0), Vec2::new(10.0, 110.0));
    /// assert!(viewport.intersects(&touching));
    /// ```
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

/// A row's placement as reported by the host, in the container's space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RowTransform {
    /// Top-left corner of the row.
    pub position: Vec2,
    /// Width and height of the row.
    pub size: Vec2,
}

impl RowTransform {
    /// Create a transform.
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self { position, size }
    }

    /// Bounds of the row relative to `content_origin`.
    pub fn bounds_in(&self, content_origin: Vec2) -> Rect {
        Rect::from_origin_size(self.position - content_origin, self.size)
    }
}

/// The visible region of the scroll content.
///
/// Ephemeral: recomputed every time the scroll offset or container size
/// changes, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    rect: Rect,
}

impl Viewport {
    /// Viewport from an explicit content-space rectangle.
    pub fn new(rect: Rect) -> Self {
        Self { rect }
    }

    /// Viewport from the container's scroll offset and visible size.
    pub fn from_scroll(scroll_offset: Vec2, size: Vec2) -> Self {
        Self::new(Rect::from_origin_size(scroll_offset, size))
    }

    /// Content-space rectangle.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Rectangle padded by `margin` on each side.
    pub fn padded(&self, margin: Vec2) -> Rect {
        self.rect.inflate(margin)
    }
}
