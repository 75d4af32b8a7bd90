//! Finger counting from convexity defects.
//!
//! An open hand with N extended fingers shows N-1 sharp valleys between
//! adjacent fingers. Each defect is tested as a valley by the interior angle at
//! its far point (law of cosines) and by its depth; the finger count is the
//! valley count plus one.
//!
//! Known limitation: a closed fist and a single raised finger both usually
//! produce zero valleys and therefore both count as 1.

use crate::geometry::{Contour, ConvexityDefect};

/// Default maximum valley angle, in degrees.
pub const DEFAULT_ANGLE_THRESHOLD_DEG: f64 = 90.0;

/// Default minimum defect depth, in geometry-source units.
pub const DEFAULT_DEPTH_THRESHOLD: u32 = 10_000;

/// Counts extended fingers on a single hand contour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FingerCounter {
    /// A valley's interior angle must be at most this many degrees.
    pub angle_threshold_deg: f64,
    /// A valley's depth must be strictly greater than this.
    pub depth_threshold: u32,
}

impl Default for FingerCounter {
    fn default() -> Self {
        Self {
            angle_threshold_deg: DEFAULT_ANGLE_THRESHOLD_DEG,
            depth_threshold: DEFAULT_DEPTH_THRESHOLD,
        }
    }
}

impl FingerCounter {
    pub fn new(angle_threshold_deg: f64, depth_threshold: u32) -> Self {
        Self {
            angle_threshold_deg,
            depth_threshold,
        }
    }

    /// Count fingers for one frame.
    ///
    /// Missing or empty defects yield 0, not 1.
    pub fn count(&self, contour: &Contour, defects: Option<&[ConvexityDefect]>) -> u32 {
        let defects = match defects {
            Some(defects) if !defects.is_empty() => defects,
            _ => return 0,
        };

        let valleys = defects
            .iter()
            .filter(|defect| self.is_valley(contour, defect))
            .count() as u32;
        valleys + 1
    }

    fn is_valley(&self, contour: &Contour, defect: &ConvexityDefect) -> bool {
        let Some(points) = defect.resolve(contour) else {
            log::trace!("skipping defect with out-of-range index: {:?}", defect);
            return false;
        };
        let Some(angle) = far_angle_deg(
            points.start.distance(&points.end),
            points.start.distance(&points.far),
            points.far.distance(&points.end),
        ) else {
            return false;
        };
        angle <= self.angle_threshold_deg && defect.depth > self.depth_threshold
    }
}

/// Interior angle opposite side `a`, in degrees. `None` for a degenerate triangle.
fn far_angle_deg(a: f64, b: f64, c: f64) -> Option<f64> {
    let bc = b * c;
    if bc == 0.0 {
        return None;
    }
    let cos = ((b * b + c * c - a * a) / (2.0 * bc)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point2D;

    const DEEP: u32 = 20_000;
    const SHALLOW: u32 = 5_000;

    /// Lays out `shapes` side by side; each entry is (far_y, depth). A far point
    /// at y=60 under a 60px-wide gap gives a ~53 degree valley, y=5 an obtuse one.
    fn hand(shapes: &[(i32, u32)]) -> (Contour, Vec<ConvexityDefect>) {
        let mut points = Vec::new();
        let mut defects = Vec::new();
        for (i, (far_y, depth)) in shapes.iter().enumerate() {
            let x = 100 * i as i32;
            let base = points.len();
            points.push(Point2D::new(x, 0));
            points.push(Point2D::new(x + 30, *far_y));
            points.push(Point2D::new(x + 60, 0));
            defects.push(ConvexityDefect::new(base, base + 2, base + 1, *depth));
        }
        (Contour::new(points), defects)
    }

    #[test]
    fn absent_or_empty_defects_count_zero() {
        let counter = FingerCounter::default();
        let (contour, _) = hand(&[(60, DEEP)]);
        assert_eq!(counter.count(&contour, None), 0);
        assert_eq!(counter.count(&contour, Some(&[][..])), 0);
    }

    #[test]
    fn valid_valleys_plus_one() {
        let counter = FingerCounter::default();
        for k in 0..=5usize {
            let mut shapes = vec![(60, DEEP); k];
            // One rejected defect keeps the list non-empty when k == 0.
            shapes.push((60, SHALLOW));
            let (contour, defects) = hand(&shapes);
            assert_eq!(counter.count(&contour, Some(defects.as_slice())), k as u32 + 1, "k={k}");
        }
    }

    #[test]
    fn obtuse_or_shallow_defects_are_not_valleys() {
        let counter = FingerCounter::default();
        let (contour, defects) = hand(&[(5, DEEP), (60, SHALLOW), (60, DEFAULT_DEPTH_THRESHOLD)]);
        assert_eq!(counter.count(&contour, Some(defects.as_slice())), 1);
    }

    #[test]
    fn degenerate_defect_is_skipped() {
        let counter = FingerCounter::default();
        let (contour, mut defects) = hand(&[(60, DEEP), (60, DEEP)]);
        // far coincides with start
        defects.push(ConvexityDefect::new(0, 2, 0, DEEP));
        assert_eq!(counter.count(&contour, Some(defects.as_slice())), 3);
    }

    #[test]
    fn out_of_range_defect_is_skipped() {
        let counter = FingerCounter::default();
        let (contour, mut defects) = hand(&[(60, DEEP)]);
        defects.push(ConvexityDefect::new(0, 2, 99, DEEP));
        assert_eq!(counter.count(&contour, Some(defects.as_slice())), 2);
    }

    #[test]
    fn thresholds_are_tunable() {
        let strict = FingerCounter::new(45.0, DEEP);
        let (contour, defects) = hand(&[(60, DEEP + 1)]);
        assert_eq!(strict.count(&contour, Some(defects.as_slice())), 1);
        let loose = FingerCounter::new(60.0, DEEP);
        assert_eq!(loose.count(&contour, Some(defects.as_slice())), 2);
    }
}
