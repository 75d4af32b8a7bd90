//! Per-frame hand geometry as handed over by a geometry source.
//!
//! A `HandFrame` owns the contour and defects extracted from one camera frame.
//! It is consumed by the pipeline and dropped; nothing carries over between
//! frames except what the state machine itself remembers.

use std::time::Instant;

use crate::geometry::{Contour, ConvexityDefect};

#[derive(Debug)]
pub struct HandFrame {
    /// Largest external contour in the region of interest, if any.
    pub contour: Option<Contour>,
    /// Convexity defects of `contour`. `None` when the source could not compute them.
    pub defects: Option<Vec<ConvexityDefect>>,
    /// Monotonic capture time.
    pub captured_at: Instant,
}

impl HandFrame {
    pub fn new(
        contour: Option<Contour>,
        defects: Option<Vec<ConvexityDefect>>,
        captured_at: Instant,
    ) -> Self {
        Self {
            contour,
            defects,
            captured_at,
        }
    }

    /// A frame in which nothing was segmented.
    pub fn empty(captured_at: Instant) -> Self {
        Self::new(None, None, captured_at)
    }

    pub fn defects(&self) -> Option<&[ConvexityDefect]> {
        self.defects.as_deref()
    }
}
