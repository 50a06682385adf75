use std::str::FromStr;

use kurbo::{BezPath, PathEl, Shape};

use crate::foundation::core::Point;
use crate::foundation::error::{PixError, PixResult};

/// One element of a [`Path`] outline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathSegment {
    /// Start a new sub-path at the point.
    MoveTo(Point),
    /// Straight line to the point.
    LineTo(Point),
    /// Cubic Bézier through two control points to the end point.
    CurveTo(Point, Point, Point),
}

/// Ordered, append-only sequence of vector path segments.
///
/// Segment order is rendering-significant: it defines the traced outline. A path without a
/// leading `MoveTo` is accepted here and left to the consuming operation to reject.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// Empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the compact SVG-style grammar (`M`, `L`, `C`, `H`, `V`, `Q`, `S`, `Z`, absolute or
    /// relative).
    ///
    /// Quadratic segments are elevated to cubics and `Z` becomes a line back to the sub-path
    /// start, so the result only ever contains `MoveTo`/`LineTo`/`CurveTo`.
    pub fn parse(text: &str) -> PixResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::new());
        }
        let bez = BezPath::from_svg(text).map_err(|e| PixError::PathParse(format!("{e}")))?;
        Ok(Self::from_bez_path(&bez))
    }

    /// Convert a kurbo path into the closed segment set.
    pub fn from_bez_path(bez: &BezPath) -> Self {
        let mut out = Self::new();
        let mut start = Point::ZERO;
        let mut current = Point::ZERO;
        for el in bez.elements() {
            match *el {
                PathEl::MoveTo(p) => {
                    out.move_to(p);
                    start = p;
                    current = p;
                }
                PathEl::LineTo(p) => {
                    out.line_to(p);
                    current = p;
                }
                PathEl::QuadTo(q, p) => {
                    let c1 = current + (q - current) * (2.0 / 3.0);
                    let c2 = p + (q - p) * (2.0 / 3.0);
                    out.curve_to(c1, c2, p);
                    current = p;
                }
                PathEl::CurveTo(c1, c2, p) => {
                    out.curve_to(c1, c2, p);
                    current = p;
                }
                PathEl::ClosePath => {
                    out.line_to(start);
                    current = start;
                }
            }
        }
        out
    }

    /// Append a `MoveTo`.
    pub fn move_to(&mut self, p: impl Into<Point>) {
        self.segments.push(PathSegment::MoveTo(p.into()));
    }

    /// Append a `LineTo`.
    pub fn line_to(&mut self, p: impl Into<Point>) {
        self.segments.push(PathSegment::LineTo(p.into()));
    }

    /// Append a cubic `CurveTo`.
    pub fn curve_to(&mut self, c1: impl Into<Point>, c2: impl Into<Point>, end: impl Into<Point>) {
        self.segments
            .push(PathSegment::CurveTo(c1.into(), c2.into(), end.into()));
    }

    /// Segments in insertion order.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Return `true` when no segment has been appended.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Return `true` if a `MoveTo` precedes every `LineTo`/`CurveTo`.
    pub fn is_renderable(&self) -> bool {
        matches!(self.segments.first(), Some(PathSegment::MoveTo(_)))
    }

    /// kurbo representation used by rasterizers.
    pub fn to_bez_path(&self) -> BezPath {
        let mut bez = BezPath::new();
        if !self.is_renderable() && !self.is_empty() {
            bez.move_to(Point::ZERO);
        }
        for seg in &self.segments {
            match *seg {
                PathSegment::MoveTo(p) => bez.move_to(p),
                PathSegment::LineTo(p) => bez.line_to(p),
                PathSegment::CurveTo(c1, c2, p) => bez.curve_to(c1, c2, p),
            }
        }
        bez
    }

    /// Tight bounds of the outline, or `None` when the path is not renderable.
    pub fn bounds(&self) -> Option<kurbo::Rect> {
        if !self.is_renderable() {
            return None;
        }
        Some(self.to_bez_path().bounding_box())
    }
}

impl FromStr for Path {
    type Err = PixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/paint/path.rs"]
mod tests;
