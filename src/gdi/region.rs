//! Rectangles, regions and the clipping engine.

use serde::{Deserialize, Serialize};

use crate::common::error::{Error, Result};

/// Pixel position in device coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in device pixels.
///
/// `width` and `height` are never negative once constructed through
/// [`Rect::new`] or [`Rect::from_ltrb`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Create a rectangle, rejecting negative extents and edges past `i32::MAX`.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Result<Self> {
        if width < 0 || height < 0 {
            return Err(Error::Geometry(format!(
                "negative extent {}x{} at ({}, {})",
                width, height, x, y
            )));
        }
        if x.checked_add(width).is_none() || y.checked_add(height).is_none() {
            return Err(Error::Geometry(format!(
                "{}x{} at ({}, {}) overflows device space",
                width, height, x, y
            )));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Create a rectangle from exclusive right/bottom edges.
    pub fn from_ltrb(left: i32, top: i32, right: i32, bottom: i32) -> Result<Self> {
        let extent = |from: i32, to: i32| {
            to.checked_sub(from)
                .ok_or_else(|| Error::Geometry(format!("edges {}..{} overflow device space", from, to)))
        };
        Self::new(left, top, extent(left, right)?, extent(top, bottom)?)
    }

    /// Create a drawing target, which must have a positive area.
    pub fn target(x: i32, y: i32, width: i32, height: i32) -> Result<Self> {
        let rect = Self::new(x, y, width, height)?;
        if rect.is_empty() {
            return Err(Error::Geometry(format!(
                "zero extent {}x{} at ({}, {})",
                width, height, x, y
            )));
        }
        Ok(rect)
    }

    /// Exclusive right edge, saturated for rectangles built field by field.
    #[inline]
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Left, top, right and bottom edges without overflow.
    #[inline]
    fn edges(&self) -> (i64, i64, i64, i64) {
        let (x, y) = (self.x as i64, self.y as i64);
        (x, y, x + self.width as i64, y + self.height as i64)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    #[inline]
    pub fn area(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.width as u64 * self.height as u64
        }
    }

    #[inline]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        let (left, top, right, bottom) = self.edges();
        let (x, y) = (x as i64, y as i64);
        x >= left && x < right && y >= top && y < bottom
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        let (left, top, right, bottom) = self.edges();
        let (o_left, o_top, o_right, o_bottom) = other.edges();
        o_left >= left && o_top >= top && o_right <= right && o_bottom <= bottom
    }

    /// Overlap of two rectangles, `None` when it has no area.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let (a_left, a_top, a_right, a_bottom) = self.edges();
        let (b_left, b_top, b_right, b_bottom) = other.edges();
        let (left, top) = (a_left.max(b_left), a_top.max(b_top));
        let (right, bottom) = (a_right.min(b_right), a_bottom.min(b_bottom));
        if right <= left || bottom <= top {
            return None;
        }
        Some(Rect {
            x: left as i32,
            y: top as i32,
            width: i32::try_from(right - left).ok()?,
            height: i32::try_from(bottom - top).ok()?,
        })
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let (a_left, a_top, a_right, a_bottom) = self.edges();
        let (b_left, b_top, b_right, b_bottom) = other.edges();
        let (left, top) = (a_left.min(b_left), a_top.min(b_top));
        let clamp = |extent: i64| extent.min(i32::MAX as i64) as i32;
        Rect {
            x: left as i32,
            y: top as i32,
            width: clamp(a_right.max(b_right) - left),
            height: clamp(a_bottom.max(b_bottom) - top),
        }
    }

    /// Translated copy, `None` when an edge would leave device space.
    pub fn offset(&self, dx: i32, dy: i32) -> Option<Rect> {
        let x = self.x.checked_add(dx)?;
        let y = self.y.checked_add(dy)?;
        Rect::new(x, y, self.width, self.height).ok()
    }
}

/// Clip region.
///
/// `Null` is unrestricted: it stands for the whole surface, never for an
/// empty region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Region {
    #[default]
    Null,
    Rect(Rect),
}

impl Region {
    pub fn is_null(&self) -> bool {
        matches!(self, Region::Null)
    }

    /// Restrict `target` to this region.
    pub fn clip(&self, target: &Rect) -> Option<Rect> {
        match self {
            Region::Null if target.is_empty() => None,
            Region::Null => Some(*target),
            Region::Rect(bounds) => bounds.intersect(target),
        }
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        match self {
            Region::Null => true,
            Region::Rect(bounds) => bounds.contains_point(x, y),
        }
    }

    /// Rectangle form, with a null region resolved against `surface`.
    pub fn to_rect(&self, surface: &Rect) -> Rect {
        match self {
            Region::Null => *surface,
            Region::Rect(r) => *r,
        }
    }
}

impl From<Rect> for Region {
    fn from(rect: Rect) -> Self {
        Region::Rect(rect)
    }
}
