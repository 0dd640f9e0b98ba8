//! Integer geometry for widget rectangles and pointer positions.
//!
//! All widget rectangles are stored in *logical* units. Two transforms map
//! them to pixels:
//!
//! ```text
//!   logical ──scale(dpi)──────────────> physical (device surface)
//!   logical ──offset(-origin)──scale(ss)──> working surface (supersampled)
//! ```
//!
//! The painter always translates before it scales. Scaling first would
//! multiply the origin offset by the supersample factor as well.

use serde::{Deserialize, Serialize};

/// A point in logical or physical device coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: i32,
    /// Vertical position.
    pub y: i32,
}

impl Point {
    /// The origin.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Creates a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Multiplies both coordinates by `factor`, truncating toward zero.
    #[must_use]
    pub fn scale(self, factor: f32) -> Self {
        Self::new(
            (self.x as f32 * factor) as i32,
            (self.y as f32 * factor) as i32,
        )
    }
}

/// An axis-aligned rectangle.
///
/// Width and height are expected to be non-negative. This is not enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: i32,
    /// Height.
    pub height: i32,
}

impl Rect {
    /// A zero-sized rect at the origin.
    pub const ZERO: Self = Self {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    /// Creates a new rectangle.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Creates a rectangle at the origin with the given size.
    #[must_use]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Returns the right edge.
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Returns the bottom edge.
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Returns the top-left corner.
    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Returns the center point (rounded toward the top-left).
    #[must_use]
    pub const fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Returns true if the rectangle covers no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Returns true if the point lies inside the rectangle.
    ///
    /// The right edge is inclusive and the bottom edge is exclusive:
    /// `x <= px <= x + width` and `y <= py < y + height`. Native pointer
    /// coordinates land on the right border column of a widget and still
    /// count as inside it.
    #[must_use]
    pub const fn contains(&self, pt: Point) -> bool {
        self.x <= pt.x && pt.x <= self.right() && self.y <= pt.y && pt.y < self.bottom()
    }

    /// Multiplies all four fields independently by `factor`.
    ///
    /// Each field is truncated toward zero, so `r.scale(k).scale(1.0 / k)`
    /// reproduces `r` only when every intermediate product is integral.
    #[must_use]
    pub fn scale(&self, factor: f32) -> Self {
        Self::new(
            (self.x as f32 * factor) as i32,
            (self.y as f32 * factor) as i32,
            (self.width as f32 * factor) as i32,
            (self.height as f32 * factor) as i32,
        )
    }

    /// Moves the rectangle by `(dx, dy)`.
    #[must_use]
    pub const fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Translates into the local space of a rectangle whose top-left is `origin`.
    #[must_use]
    pub const fn relative_to(&self, origin: Point) -> Self {
        self.offset(-origin.x, -origin.y)
    }

    /// Returns true if two rectangles overlap by at least one pixel.
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Returns the overlap of two rectangles, or None if they don't intersect.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }

        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        Some(Self::new(x, y, right - x, bottom - y))
    }

    /// Shrinks the rectangle by `amount` on all sides.
    #[must_use]
    pub const fn inset(&self, amount: i32) -> Self {
        Self::new(
            self.x + amount,
            self.y + amount,
            self.width - amount * 2,
            self.height - amount * 2,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_edges() {
        let rect = Rect::new(10, 20, 100, 50);

        assert!(rect.contains(Point::new(10, 20)));
        assert!(rect.contains(Point::new(110, 30)), "right edge is inclusive");
        assert!(!rect.contains(Point::new(50, 70)), "bottom edge is exclusive");
        assert!(rect.contains(Point::new(50, 69)));
        assert!(!rect.contains(Point::new(9, 30)));
        assert!(!rect.contains(Point::new(111, 30)));
        assert!(!rect.contains(Point::new(50, 19)));
    }

    #[test]
    fn test_contains_matches_formula() {
        let rect = Rect::new(-3, 4, 7, 5);
        for px in -6..8 {
            for py in 0..12 {
                let expected = rect.x <= px
                    && px <= rect.x + rect.width
                    && rect.y <= py
                    && py < rect.y + rect.height;
                assert_eq!(rect.contains(Point::new(px, py)), expected, "({px}, {py})");
            }
        }
    }

    #[test]
    fn test_scale_round_trip() {
        let rect = Rect::new(3, 7, 40, 21);
        assert_eq!(rect.scale(2.0).scale(0.5), rect);
        assert_eq!(rect.scale(1.5), Rect::new(4, 10, 60, 31));
    }

    #[test]
    fn test_scale_truncates_toward_zero() {
        let rect = Rect::new(-3, 3, 5, 5);
        assert_eq!(rect.scale(0.5), Rect::new(-1, 1, 2, 2));
    }

    #[test]
    fn test_translate_then_scale() {
        let rect = Rect::new(30, 40, 10, 10);
        let local = rect.relative_to(Point::new(20, 20)).scale(2.0);
        assert_eq!(local, Rect::new(20, 40, 20, 20));
    }

    #[test]
    fn test_intersection() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert_eq!(a.intersection(&b), Some(Rect::new(5, 5, 5, 5)));
        assert_eq!(a.intersection(&Rect::new(20, 20, 1, 1)), None);
    }
}
