//! Polygon input model.

use alloc::vec::Vec;

use crate::error::{Result, RingError};
use crate::Index;

/// An outer ring plus zero or more hole rings.
///
/// Rings are implicitly closed; the first point is not repeated at the end. Winding order
/// is free for every ring.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon<C> {
    pub outer: Vec<[C; 2]>,
    pub holes: Vec<Vec<[C; 2]>>,
}

impl<C: Copy> Polygon<C> {
    /// A polygon without holes.
    pub fn new(outer: impl Into<Vec<[C; 2]>>) -> Self {
        Self {
            outer: outer.into(),
            holes: Vec::new(),
        }
    }

    /// Adds a hole ring; holes keep the order they are added in.
    #[must_use]
    pub fn with_hole(mut self, hole: impl Into<Vec<[C; 2]>>) -> Self {
        self.holes.push(hole.into());
        self
    }

    /// Total number of points over all rings.
    pub fn num_points(&self) -> usize {
        self.outer.len() + self.holes.iter().map(Vec::len).sum::<usize>()
    }

    /// All points in triangle index order: the outer ring, then every hole.
    pub fn points(&self) -> impl Iterator<Item = [C; 2]> + '_ {
        self.outer
            .iter()
            .chain(self.holes.iter().flatten())
            .copied()
    }

    /// Start offset of every hole within [`points`](Self::points).
    pub fn hole_indices<N: Index>(&self) -> Vec<N> {
        let mut start = self.outer.len();
        self.holes
            .iter()
            .map(|hole| {
                let i = N::from_usize(start);
                start += hole.len();
                i
            })
            .collect()
    }

    /// Splits a flat vertex buffer into rings at the given cumulative ring ends.
    ///
    /// The first ring is the outer ring. See [`triangulate_flat`](crate::triangulate_flat)
    /// for the accepted layout.
    pub fn from_ring_ends<N: Index>(vertices: &[[C; 2]], ring_ends: &[N]) -> Result<Self> {
        check_ring_ends(vertices.len(), ring_ends)?;
        let mut rings = ring_ends.iter().scan(0, |start, end| {
            let end = end.into_usize();
            let ring = vertices[*start..end].to_vec();
            *start = end;
            Some(ring)
        });
        Ok(Self {
            outer: rings.next().unwrap_or_default(),
            holes: rings.collect(),
        })
    }
}

/// Validate cumulative ring ends against a vertex count.
pub(crate) fn check_ring_ends<N: Index>(vertices: usize, ring_ends: &[N]) -> Result<()> {
    match ring_ends.last() {
        Some(last) if last.into_usize() != vertices => {
            return Err(RingError::RingEndMismatch {
                last: last.into_usize(),
                vertices,
            });
        }
        None if vertices > 0 => return Err(RingError::MissingRingEnds { vertices }),
        _ => {}
    }

    let mut start = 0;
    for (ring, end) in ring_ends.iter().enumerate() {
        let end = end.into_usize();
        if end <= start {
            return Err(RingError::NotIncreasing { ring, start, end });
        }
        if end > vertices {
            return Err(RingError::EndOutOfRange {
                ring,
                end,
                vertices,
            });
        }
        start = end;
    }
    Ok(())
}
