//! Ear-clipping triangulation of simple polygons with holes.
//!
//! A polygon is an outer ring plus zero or more hole rings. The result is a flat list of
//! vertex indices, three per triangle, referring to positions in the concatenated point
//! sequence (outer ring first, then every hole in order).
//!
//! ```
//! use earclip::Polygon;
//!
//! let square = Polygon::new([[0., 0.], [1., 0.], [1., 1.], [0., 1.]]);
//! let triangles: Vec<u32> = earclip::triangulate(&square);
//! assert_eq!(triangles, [2, 3, 0, 0, 1, 2]);
//! ```
//!
//! Larger inputs are sped up with a z-order curve index over the ring vertices. Inputs that
//! are not simple (self-touching or self-intersecting rings) still yield a best-effort
//! triangulation that never panics.

#![no_std]

extern crate alloc;

#[macro_use]
mod node;
mod error;
mod holes;
mod options;
mod polygon;
mod slicer;
mod zorder;

pub use error::{Result, RingError};
pub use options::Options;
pub use polygon::Polygon;

use alloc::vec::Vec;
use log::{debug, trace};
use num_traits::float::Float;
use num_traits::AsPrimitive;

use node::{equals, insert_node, remove_node, signed_area, Node, NodeIndex};
use slicer::{Pass, Slicer};
use zorder::{Curve, HASH_THRESHOLD};

/// Index of a vertex
pub trait Index: Copy {
    fn into_usize(self) -> usize;
    fn from_usize(v: usize) -> Self;
}

macro_rules! impl_index {
    ($($ty:ty),*) => {
        $(
            impl Index for $ty {
                fn into_usize(self) -> usize {
                    self as usize
                }
                fn from_usize(v: usize) -> Self {
                    v as Self
                }
            }
        )*
    };
}

impl_index!(u16, u32, u64, usize);

/// Instance of the ear-clipping triangulator.
pub struct Earcut<T: Float> {
    pub(crate) data: Vec<[T; 2]>,
    pub(crate) nodes: Vec<Node<T>>,
    pub(crate) queue: Vec<NodeIndex>,
    pub(crate) options: Options,
}

impl<T: Float> Default for Earcut<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> Earcut<T> {
    /// Creates a new instance with default [`Options`].
    ///
    /// You can reuse a single instance for multiple triangulations to reduce memory allocations.
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    /// Creates a new instance with the given options.
    pub fn with_options(options: Options) -> Self {
        Self {
            data: Vec::new(),
            nodes: Vec::new(),
            queue: Vec::new(),
            options,
        }
    }

    /// Options this instance was created with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    fn reset(&mut self, capacity: usize) {
        self.nodes.clear();
        self.nodes.reserve(capacity);
        self.nodes.push(Node::new(0, T::infinity(), T::infinity())); // dummy node
    }

    /// Triangulates a polygon given as a flat point sequence.
    ///
    /// `hole_indices` holds the start offset of every hole ring; the outer ring runs from 0
    /// to the first of them. Any previous content of `triangles_out` is replaced.
    pub fn earcut<N: Index>(
        &mut self,
        data: impl IntoIterator<Item = [T; 2]>,
        hole_indices: &[N],
        triangles_out: &mut Vec<N>,
    ) {
        self.data.clear();
        self.data.extend(data);
        triangles_out.clear();
        if self.data.len() < 3 {
            return;
        }
        self.earcut_impl(hole_indices, triangles_out);
    }

    /// Triangulates a [`Polygon`], converting its coordinates to `T`.
    pub fn triangulate<C, N>(&mut self, polygon: &Polygon<C>, triangles_out: &mut Vec<N>)
    where
        C: AsPrimitive<T>,
        T: 'static,
        N: Index,
    {
        let hole_indices = polygon.hole_indices::<N>();
        self.earcut(
            polygon.points().map(|[x, y]| [x.as_(), y.as_()]),
            &hole_indices,
            triangles_out,
        );
    }

    fn earcut_impl<N: Index>(&mut self, hole_indices: &[N], triangles_out: &mut Vec<N>) {
        triangles_out.reserve(self.data.len() * 3);
        self.reset(self.data.len() * 3 / 2);

        let has_holes = !hole_indices.is_empty();
        let outer_len = if has_holes {
            hole_indices[0].into_usize().min(self.data.len())
        } else {
            self.data.len()
        };
        if outer_len < 3 {
            return;
        }

        // create nodes
        let Some(mut outer_node_i) = self.linked_list(0, outer_len, true) else {
            return;
        };
        let outer_node = node!(self.nodes, outer_node_i);
        if outer_node.next_i == outer_node.prev_i {
            debug!("outer ring has fewer than 3 distinct points");
            return;
        }
        if has_holes {
            outer_node_i = self.eliminate_holes(hole_indices, outer_node_i);
        }

        // if the shape is not too simple, we'll use z-order curve hash later
        let curve = if self.data.len() > HASH_THRESHOLD {
            Curve::from_ring(&self.nodes, outer_node_i)
        } else {
            None
        };
        trace!(
            "slicing {} points, z-order index {}",
            self.data.len(),
            if curve.is_some() { "on" } else { "off" }
        );

        let mut slicer = Slicer {
            curve,
            splits_left: self.options.max_intersection_splits,
        };
        slicer.earcut_linked(&mut self.nodes, outer_node_i, triangles_out, Pass::Indexed);

        // triangles are cut counter-clockwise; give them the winding of the outer ring
        if signed_area(&self.data, 0, outer_len) < T::zero() {
            for tri in triangles_out.chunks_exact_mut(3) {
                tri.swap(0, 2);
            }
        }
    }

    /// create a circular doubly linked list from polygon points in the specified winding order
    /// (`clockwise` as seen in a y-down frame); repeated consecutive points become one node
    pub(crate) fn linked_list(
        &mut self,
        start: usize,
        end: usize,
        clockwise: bool,
    ) -> Option<NodeIndex> {
        let mut last_i: Option<NodeIndex> = None;
        let iter = self.data[start..end].iter().enumerate();

        if clockwise == (signed_area(&self.data, start, end) > T::zero()) {
            for (i, &[x, y]) in iter {
                last_i = Some(insert_distinct(&mut self.nodes, start + i, x, y, last_i));
            }
        } else {
            for (i, &[x, y]) in iter.rev() {
                last_i = Some(insert_distinct(&mut self.nodes, start + i, x, y, last_i));
            }
        };

        if let Some(li) = last_i {
            let last = node!(self.nodes, li);
            if li != last.next_i && equals(last, node!(self.nodes, last.next_i)) {
                let (_, next_i) = remove_node(&mut self.nodes, li);
                last_i = Some(next_i);
            }
        }

        last_i
    }
}

/// append a point to the ring unless it repeats the last one
fn insert_distinct<T: Float>(
    nodes: &mut Vec<Node<T>>,
    i: usize,
    x: T,
    y: T,
    last: Option<NodeIndex>,
) -> NodeIndex {
    if let Some(last_i) = last {
        let last = node!(nodes, last_i);
        if last.x == x && last.y == y {
            return last_i;
        }
    }
    insert_node(nodes, i as u32, x, y, last)
}

/// Triangulates a polygon with default [`Options`], computing in `f64`.
///
/// Integer and `f32` coordinates are converted to `f64` first.
pub fn triangulate<C, N>(polygon: &Polygon<C>) -> Vec<N>
where
    C: AsPrimitive<f64>,
    N: Index,
{
    let mut triangles = Vec::new();
    Earcut::<f64>::new().triangulate(polygon, &mut triangles);
    triangles
}

/// Triangulates a polygon given as a flat vertex buffer plus cumulative ring ends.
///
/// `ring_ends[k]` is one past the last vertex of ring `k`; ring 0 is the outer ring. The last
/// ring end must equal `vertices.len()`. An empty vertex buffer yields no triangles.
///
/// ```
/// let vertices = [[0, 0], [10, 0], [10, 10], [0, 10], [2, 2], [8, 2], [8, 8], [2, 8]];
/// let triangles: Vec<u32> = earclip::triangulate_flat(&vertices, &[4u32, 8]).unwrap();
/// assert_eq!(triangles.len(), 8 * 3);
///
/// assert!(earclip::triangulate_flat::<i32, u32>(&vertices, &[4, 7]).is_err());
/// ```
pub fn triangulate_flat<C, N>(vertices: &[[C; 2]], ring_ends: &[N]) -> Result<Vec<N>>
where
    C: AsPrimitive<f64>,
    N: Index,
{
    polygon::check_ring_ends(vertices.len(), ring_ends)?;
    let hole_indices = ring_ends
        .split_last()
        .map_or(&[][..], |(_, starts)| starts);

    let mut triangles = Vec::new();
    Earcut::<f64>::new().earcut(
        vertices.iter().map(|&[x, y]| [x.as_(), y.as_()]),
        hole_indices,
        &mut triangles,
    );
    Ok(triangles)
}

/// Returns a percentage difference between the polygon area and its triangulation area;
/// used to verify correctness of triangulation
pub fn deviation<T: Float, N: Index>(
    data: impl IntoIterator<Item = [T; 2]>,
    hole_indices: &[N],
    triangles: &[N],
) -> T {
    let data = data.into_iter().collect::<Vec<[T; 2]>>();
    let has_holes = !hole_indices.is_empty();
    let outer_len = match has_holes {
        true => hole_indices[0].into_usize().min(data.len()),
        false => data.len(),
    };
    let polygon_area = if outer_len < 3 {
        T::zero()
    } else {
        let mut polygon_area = signed_area(&data, 0, outer_len).abs();
        if has_holes {
            for i in 0..hole_indices.len() {
                let start = hole_indices[i].into_usize();
                let end = if i < hole_indices.len() - 1 {
                    hole_indices[i + 1].into_usize()
                } else {
                    data.len()
                };
                if end <= data.len() && end.saturating_sub(start) >= 3 {
                    polygon_area = polygon_area - signed_area(&data, start, end).abs();
                }
            }
        }
        polygon_area
    };

    let mut triangles_area = T::zero();
    for [a, b, c] in triangles
        .chunks_exact(3)
        .map(|idxs| [idxs[0], idxs[1], idxs[2]])
    {
        let a = a.into_usize();
        let b = b.into_usize();
        let c = c.into_usize();
        triangles_area = triangles_area
            + ((data[a][0] - data[c][0]) * (data[b][1] - data[a][1])
                - (data[a][0] - data[b][0]) * (data[c][1] - data[a][1]))
                .abs();
    }
    if polygon_area == T::zero() && triangles_area == T::zero() {
        T::zero()
    } else {
        ((polygon_area - triangles_area) / polygon_area).abs()
    }
}
