//! Tuning knobs of a reusable [`Earcut`](crate::Earcut) instance.

/// Options for [`Earcut`](crate::Earcut).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Bridge holes that collapse to one or two distinct points into the outer ring, so they
    /// act as Steiner points or segments of the triangulation. When `false` such holes are
    /// ignored like any other degenerate ring.
    pub steiner_holes: bool,

    /// How many times one call may cut a stalled ring at a self-intersection.
    pub max_intersection_splits: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            steiner_holes: false,
            max_intersection_splits: 256,
        }
    }
}

impl Options {
    /// Keep degenerate holes as Steiner points.
    #[must_use]
    pub fn with_steiner_holes(mut self, enabled: bool) -> Self {
        self.steiner_holes = enabled;
        self
    }

    /// Bound the number of self-intersection splits per call.
    #[must_use]
    pub fn with_max_intersection_splits(mut self, splits: u32) -> Self {
        self.max_intersection_splits = splits;
        self
    }
}
