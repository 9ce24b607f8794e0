//! Error types for the flat-buffer entry points.

use thiserror::Error;

/// Malformed ring-end offsets passed alongside a flat vertex buffer.
///
/// Geometric problems (degenerate rings, unbridgeable holes, self-intersections) are never
/// reported as errors; the triangulation just covers less of the polygon.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingError {
    /// The last ring end does not match the vertex count.
    #[error("the last ring end ({last}) must equal the number of vertices ({vertices})")]
    RingEndMismatch {
        /// Last value of the ring ends.
        last: usize,
        /// Number of vertices supplied.
        vertices: usize,
    },

    /// Vertices were supplied without any ring ends.
    #[error("ring ends are empty but {vertices} vertices were supplied")]
    MissingRingEnds {
        /// Number of vertices supplied.
        vertices: usize,
    },

    /// A ring ends at or before the point where it starts.
    #[error("ring ends must be strictly increasing: ring {ring} starts at {start} but ends at {end}")]
    NotIncreasing {
        /// Position of the ring in the ring ends.
        ring: usize,
        /// First vertex of the ring.
        start: usize,
        /// Offending end.
        end: usize,
    },

    /// A ring ends past the last vertex.
    #[error("ring {ring} ends at {end}, past the {vertices} supplied vertices")]
    EndOutOfRange {
        /// Position of the ring in the ring ends.
        ring: usize,
        /// Offending end.
        end: usize,
        /// Number of vertices supplied.
        vertices: usize,
    },
}

/// Result type for the flat-buffer entry points.
pub type Result<T, E = RingError> = core::result::Result<T, E>;
