//! Hand geometry value types.
//!
//! The external geometry source hands us one closed contour per frame plus the
//! convexity defects computed against that contour's hull. These types are
//! plain values: nothing here mutates a contour after construction.
//!
//! Defect indices point into the contour they were computed for. They are
//! never trusted: `ConvexityDefect::resolve` bounds-checks every index.

use serde::Deserialize;

/// Image-space coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "[i32; 2]")]
pub struct Point2D {
    pub x: i32,
    pub y: i32,
}

impl Point2D {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point2D) -> f64 {
        let dx = f64::from(other.x) - f64::from(self.x);
        let dy = f64::from(other.y) - f64::from(self.y);
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<[i32; 2]> for Point2D {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

/// Closed polygon boundary of the segmented hand region.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Contour {
    points: Vec<Point2D>,
}

impl Contour {
    pub fn new(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    /// Bounds-checked point lookup.
    pub fn point(&self, index: usize) -> Option<Point2D> {
        self.points.get(index).copied()
    }

    /// Enclosed area (shoelace formula), independent of winding direction.
    pub fn area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        // Cross terms reach 2^63 on i32 input, so the sum is kept in i128.
        let mut twice_area = 0i128;
        for (i, p) in self.points.iter().enumerate() {
            let q = self.points[(i + 1) % self.points.len()];
            twice_area += i128::from(p.x) * i128::from(q.y) - i128::from(q.x) * i128::from(p.y);
        }
        twice_area.unsigned_abs() as f64 / 2.0
    }
}

impl From<Vec<Point2D>> for Contour {
    fn from(points: Vec<Point2D>) -> Self {
        Self::new(points)
    }
}

/// Region where the contour recedes from its convex hull.
///
/// `depth` uses the geometry source's fixed-point scale (256 units per pixel
/// for OpenCV-style sources).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "(usize, usize, usize, u32)")]
pub struct ConvexityDefect {
    pub start: usize,
    pub end: usize,
    pub far: usize,
    pub depth: u32,
}

impl ConvexityDefect {
    pub const fn new(start: usize, end: usize, far: usize, depth: u32) -> Self {
        Self {
            start,
            end,
            far,
            depth,
        }
    }

    /// Look up the (start, end, far) points in `contour`.
    ///
    /// Returns `None` when any index falls outside the contour.
    pub fn resolve(&self, contour: &Contour) -> Option<DefectPoints> {
        Some(DefectPoints {
            start: contour.point(self.start)?,
            end: contour.point(self.end)?,
            far: contour.point(self.far)?,
        })
    }
}

impl From<(usize, usize, usize, u32)> for ConvexityDefect {
    fn from((start, end, far, depth): (usize, usize, usize, u32)) -> Self {
        Self::new(start, end, far, depth)
    }
}

/// A defect resolved against its contour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefectPoints {
    pub start: Point2D,
    pub end: Point2D,
    pub far: Point2D,
}
