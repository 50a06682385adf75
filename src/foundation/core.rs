pub use kurbo::Point;

/// Axis-aligned integer pixel region.
///
/// `width`/`height` are unsigned, so a region can never have negative extent. A zero-area
/// rectangle is legal and denotes an empty region.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Rectangle {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Build a [`Rectangle`]. Never fails for in-range integers.
pub fn make_rectangle(x: i32, y: i32, width: u32, height: u32) -> Rectangle {
    Rectangle::new(x, y, width, height)
}

impl Rectangle {
    /// Region used by generators that produce data everywhere (e.g. procedural noise).
    ///
    /// Large enough to cover any realistic request, small enough that edge arithmetic in `i64`
    /// never overflows.
    pub const INFINITE_PLANE: Rectangle = Rectangle {
        x: -(1 << 29),
        y: -(1 << 29),
        width: 1 << 30,
        height: 1 << 30,
    };

    /// Create a rectangle from origin and size.
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Empty rectangle anchored at the origin.
    pub const fn empty() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Return `true` when the region covers no pixels.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels covered.
    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Exclusive right edge.
    pub fn right(self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// Return `true` if `(x, y)` lies inside the region.
    pub fn contains_point(self, x: i64, y: i64) -> bool {
        x >= i64::from(self.x) && x < self.right() && y >= i64::from(self.y) && y < self.bottom()
    }

    /// Return `true` if `other` lies entirely inside `self`. Empty regions are contained
    /// everywhere.
    pub fn contains(self, other: Rectangle) -> bool {
        if other.is_empty() {
            return true;
        }
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Overlap of two regions. Returns an empty rectangle when they do not overlap.
    pub fn intersect(self, other: Rectangle) -> Rectangle {
        let x0 = i64::from(self.x).max(i64::from(other.x));
        let y0 = i64::from(self.y).max(i64::from(other.y));
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return Rectangle::empty();
        }
        Self::from_edges(x0, y0, x1, y1)
    }

    /// Smallest region covering both inputs. Empty inputs are ignored.
    pub fn union(self, other: Rectangle) -> Rectangle {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x0 = i64::from(self.x).min(i64::from(other.x));
        let y0 = i64::from(self.y).min(i64::from(other.y));
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Self::from_edges(x0, y0, x1, y1)
    }

    /// Grow the region by `dx` pixels horizontally and `dy` vertically on every side.
    pub fn expand(self, dx: u32, dy: u32) -> Rectangle {
        if self.is_empty() {
            return self;
        }
        let x0 = i64::from(self.x) - i64::from(dx);
        let y0 = i64::from(self.y) - i64::from(dy);
        let x1 = self.right() + i64::from(dx);
        let y1 = self.bottom() + i64::from(dy);
        Self::from_edges(x0, y0, x1, y1)
    }

    /// Shrink the region by `dx`/`dy` on every side; collapses to empty when too small.
    pub fn shrink(self, dx: u32, dy: u32) -> Rectangle {
        let x0 = i64::from(self.x) + i64::from(dx);
        let y0 = i64::from(self.y) + i64::from(dy);
        let x1 = self.right() - i64::from(dx);
        let y1 = self.bottom() - i64::from(dy);
        if x1 <= x0 || y1 <= y0 {
            return Rectangle::empty();
        }
        Self::from_edges(x0, y0, x1, y1)
    }

    /// Move the region by `(dx, dy)`.
    pub fn translate(self, dx: i64, dy: i64) -> Rectangle {
        Self::from_edges(
            i64::from(self.x) + dx,
            i64::from(self.y) + dy,
            self.right() + dx,
            self.bottom() + dy,
        )
    }

    /// Smallest integer region covering a floating-point rectangle.
    pub fn covering(r: kurbo::Rect) -> Rectangle {
        if !(r.x0.is_finite() && r.y0.is_finite() && r.x1.is_finite() && r.y1.is_finite()) {
            return Rectangle::empty();
        }
        let x0 = r.x0.min(r.x1).floor() as i64;
        let y0 = r.y0.min(r.y1).floor() as i64;
        let x1 = r.x0.max(r.x1).ceil() as i64;
        let y1 = r.y0.max(r.y1).ceil() as i64;
        Self::from_edges(x0, y0, x1, y1)
    }

    /// Floating-point view of the region.
    pub fn to_kurbo(self) -> kurbo::Rect {
        kurbo::Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            self.right() as f64,
            self.bottom() as f64,
        )
    }

    /// Offset of `(x, y)` into a row-major pixel array covering `self`.
    ///
    /// Callers must ensure the point is inside.
    pub(crate) fn index_of(self, x: i64, y: i64) -> usize {
        let dx = (x - i64::from(self.x)) as usize;
        let dy = (y - i64::from(self.y)) as usize;
        dy * self.width as usize + dx
    }

    /// Region spanning `[x0, x1) x [y0, y1)`, clamped to the representable range.
    pub(crate) fn from_edges(x0: i64, y0: i64, x1: i64, y1: i64) -> Rectangle {
        let clamp = |v: i64| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX));
        let x0 = clamp(x0);
        let y0 = clamp(y0);
        let x1 = clamp(x1).max(x0);
        let y1 = clamp(y1).max(y0);
        Rectangle {
            x: x0 as i32,
            y: y0 as i32,
            width: (x1 - x0).min(i64::from(u32::MAX)) as u32,
            height: (y1 - y0).min(i64::from(u32::MAX)) as u32,
        }
    }
}

impl std::fmt::Display for Rectangle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
