//! Ear slicing over a single merged ring, with the recovery steps used when it stalls.

use alloc::vec::Vec;
use core::ptr;
use log::debug;
use num_traits::float::Float;

use crate::node::{
    area, crossing, equals, filter_points, intersects_polygon, is_convex, locally_inside,
    middle_inside, next_handle, point_in_triangle, remove_node, ring_area, ring_len,
    split_polygon, Node, NodeIndex,
};
use crate::zorder::{ear_is_empty_hashed, index_curve, Curve, HASH_THRESHOLD};
use crate::Index;

/// Stage of the slicing state machine a ring is in.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Pass {
    /// regular slicing, using the z-order index when there is one
    Indexed,
    /// duplicate and collinear points filtered out, containment tested exhaustively;
    /// stalling here splits the ring
    Exhaustive,
}

/// Per-call state shared by every ring produced while slicing.
pub(crate) struct Slicer<T: Float> {
    pub(crate) curve: Option<Curve<T>>,
    /// self-intersection splits still allowed
    pub(crate) splits_left: u32,
}

impl<T: Float> Slicer<T> {
    /// main ear slicing loop which triangulates a polygon (given as a linked list)
    pub(crate) fn earcut_linked<N: Index>(
        &mut self,
        nodes: &mut Vec<Node<T>>,
        ear_i: NodeIndex,
        triangles: &mut Vec<N>,
        pass: Pass,
    ) {
        let mut ear_i = ear_i;

        // crossing edges are cut before any ear is clipped; long rings are only scanned for
        // edges one step apart
        if pass == Pass::Indexed && self.splits_left > 0 {
            let found = if ring_len(nodes, ear_i) > HASH_THRESHOLD {
                find_local_crossing(nodes, ear_i)
            } else {
                find_self_intersection(nodes, ear_i)
            };
            if let Some((p_i, q_i, x, y)) = found {
                let parts = split_at(nodes, p_i, q_i, x, y);
                self.slice_parts(nodes, parts, triangles);
                return;
            }
        }

        // interlink polygon nodes in z-order
        let curve = match (pass, self.curve) {
            (Pass::Indexed, Some(curve)) => {
                index_curve(nodes, ear_i, &curve);
                Some(curve)
            }
            _ => None,
        };

        let mut stop_i = ear_i;

        // iterate through ears, slicing them one by one
        loop {
            let ear = node!(nodes, ear_i);
            if ear.prev_i == ear.next_i {
                break;
            }
            let pi = ear.prev_i;
            let ni = ear.next_i;

            let is_ear = if ear.reflex {
                false
            } else if !is_convex(node!(nodes, pi), ear, node!(nodes, ni)) {
                node_mut!(nodes, ear_i).reflex = true;
                false
            } else if let Some(curve) = &curve {
                ear_is_empty_hashed(nodes, ear_i, curve)
            } else {
                ear_is_empty(nodes, ear_i)
            };

            if is_ear {
                let ear = node!(nodes, ear_i);
                let next = node!(nodes, ni);
                let next_next_i = next.next_i;

                // cut off the triangle
                triangles.extend([
                    N::from_usize(node!(nodes, pi).i as usize),
                    N::from_usize(ear.i as usize),
                    N::from_usize(next.i as usize),
                ]);

                remove_node(nodes, ear_i);

                // skipping the next vertex leads to less sliver triangles
                (ear_i, stop_i) = (next_next_i, next_next_i);

                continue;
            }

            ear_i = ni;

            // if we looped through the whole remaining polygon and can't find any more ears
            if ear_i == stop_i {
                match pass {
                    Pass::Indexed => {
                        // try filtering points and slicing again without the index
                        ear_i = filter_points(nodes, ear_i, None);
                        self.earcut_linked(nodes, ear_i, triangles, Pass::Exhaustive);
                    }
                    Pass::Exhaustive => {
                        ear_i = filter_points(nodes, ear_i, None);
                        self.split_stalled(nodes, ear_i, triangles);
                    }
                }
                return;
            }
        }
    }

    /// last resort for a ring without ears: cut it at a self-intersection, or along a
    /// diagonal, and slice both parts independently
    fn split_stalled<N: Index>(
        &mut self,
        nodes: &mut Vec<Node<T>>,
        start_i: NodeIndex,
        triangles: &mut Vec<N>,
    ) {
        let start = node!(nodes, start_i);
        if start.prev_i == start.next_i {
            return;
        }

        if self.splits_left > 0 {
            if let Some(parts) = split_at_intersection(nodes, start_i) {
                self.slice_parts(nodes, parts, triangles);
                return;
            }
        }

        if let Some((a_i, c_i)) = split_along_diagonal(nodes, start_i) {
            debug!(
                "split ring along a diagonal from vertex {} to {}",
                node!(nodes, a_i).i,
                node!(nodes, c_i).i
            );
            self.earcut_linked(nodes, a_i, triangles, Pass::Indexed);
            self.earcut_linked(nodes, c_i, triangles, Pass::Indexed);
            return;
        }

        debug!(
            "no ear, crossing or diagonal left; dropping {} vertices",
            ring_len(nodes, start_i)
        );
    }

    /// slice both loops left by a cut at a self-intersection
    fn slice_parts<N: Index>(
        &mut self,
        nodes: &mut Vec<Node<T>>,
        (a_i, b_i): (NodeIndex, NodeIndex),
        triangles: &mut Vec<N>,
    ) {
        self.splits_left = self.splits_left.saturating_sub(1);
        debug!(
            "split ring at a self-intersection near vertex {}",
            node!(nodes, a_i).i
        );
        for part_i in [a_i, b_i] {
            let part_i = orient_ring(nodes, part_i);
            let part_i = filter_points(nodes, part_i, None);
            self.earcut_linked(nodes, part_i, triangles, Pass::Indexed);
        }
    }
}

/// check that no reflex or collinear vertex of the ring lies inside the ear at `ear_i`
fn ear_is_empty<T: Float>(nodes: &[Node<T>], ear_i: NodeIndex) -> bool {
    let b = node!(nodes, ear_i);
    let a = node!(nodes, b.prev_i);
    let c = node!(nodes, b.next_i);

    // triangle bbox
    let x0 = a.x.min(b.x.min(c.x));
    let y0 = a.y.min(b.y.min(c.y));
    let x1 = a.x.max(b.x.max(c.x));
    let y1 = a.y.max(b.y.max(c.y));

    let mut p = node!(nodes, c.next_i);
    let mut p_prev = node!(nodes, p.prev_i);
    while !ptr::eq(p, a) {
        let p_next = node!(nodes, p.next_i);
        if (p.x >= x0 && p.x <= x1 && p.y >= y0 && p.y <= y1)
            && point_in_triangle(a.x, a.y, b.x, b.y, c.x, c.y, p.x, p.y)
            && area(p_prev, p, p_next) >= T::zero()
        {
            return false;
        }
        (p_prev, p) = (p, p_next);
    }
    true
}

/// find two non-adjacent edges of the ring that cross each other
fn find_self_intersection<T: Float>(
    nodes: &[Node<T>],
    start_i: NodeIndex,
) -> Option<(NodeIndex, NodeIndex, T, T)> {
    let mut p_i = start_i;
    loop {
        let p = node!(nodes, p_i);
        let p_next = node!(nodes, p.next_i);
        let mut q_i = p_next.next_i;
        while q_i != p.prev_i {
            let q = node!(nodes, q_i);
            if let Some((x, y)) = crossing(p, p_next, q, node!(nodes, q.next_i)) {
                return Some((p_i, q_i, x, y));
            }
            q_i = q.next_i;
        }
        p_i = p.next_i;
        if p_i == start_i {
            return None;
        }
    }
}

/// find edges `p -> p.next` and `q -> q.next`, with `q` two steps after `p`, that cross
fn find_local_crossing<T: Float>(
    nodes: &[Node<T>],
    start_i: NodeIndex,
) -> Option<(NodeIndex, NodeIndex, T, T)> {
    if ring_len(nodes, start_i) < 4 {
        return None;
    }
    let mut p_i = start_i;
    loop {
        let p = node!(nodes, p_i);
        let p_next = node!(nodes, p.next_i);
        let q_i = p_next.next_i;
        let q = node!(nodes, q_i);
        if let Some((x, y)) = crossing(p, p_next, q, node!(nodes, q.next_i)) {
            return Some((p_i, q_i, x, y));
        }
        p_i = p.next_i;
        if p_i == start_i {
            return None;
        }
    }
}

/// cut the ring at the first crossing found from `start_i`
fn split_at_intersection<T: Float>(
    nodes: &mut Vec<Node<T>>,
    start_i: NodeIndex,
) -> Option<(NodeIndex, NodeIndex)> {
    let (p_i, q_i, x, y) = find_self_intersection(nodes, start_i)?;
    Some(split_at(nodes, p_i, q_i, x, y))
}

/// Cut the ring where edges `p -> p.next` and `q -> q.next` cross at `(x, y)`, inserting a
/// Steiner node on each side of the cut. Returns one node of each resulting loop.
fn split_at<T: Float>(
    nodes: &mut Vec<Node<T>>,
    p_i: NodeIndex,
    q_i: NodeIndex,
    x: T,
    y: T,
) -> (NodeIndex, NodeIndex) {
    let pn_i = node!(nodes, p_i).next_i;
    let qn_i = node!(nodes, q_i).next_i;

    // a Steiner node reports the index of the closest endpoint in its own loop
    let nearest = |a_i: NodeIndex, b_i: NodeIndex| {
        let (a, b) = (node!(nodes, a_i), node!(nodes, b_i));
        let da = (a.x - x) * (a.x - x) + (a.y - y) * (a.y - y);
        let db = (b.x - x) * (b.x - x) + (b.y - y) * (b.y - y);
        if db < da {
            b.i
        } else {
            a.i
        }
    };
    let (i1, i2) = (nearest(p_i, qn_i), nearest(q_i, pn_i));

    let s1_i = next_handle(nodes);
    let s2_i = unsafe { NodeIndex::new_unchecked(s1_i.get() + 1) };

    // p -> s1 -> q.next ... p
    let mut s1 = Node::new(i1, x, y);
    (s1.prev_i, s1.next_i) = (p_i, qn_i);
    // q -> s2 -> p.next ... q
    let mut s2 = Node::new(i2, x, y);
    (s2.prev_i, s2.next_i) = (q_i, pn_i);

    let p = node_mut!(nodes, p_i);
    p.next_i = s1_i;
    p.reflex = false;
    let qn = node_mut!(nodes, qn_i);
    qn.prev_i = s1_i;
    qn.reflex = false;
    let q = node_mut!(nodes, q_i);
    q.next_i = s2_i;
    q.reflex = false;
    let pn = node_mut!(nodes, pn_i);
    pn.prev_i = s2_i;
    pn.reflex = false;

    nodes.extend([s1, s2]);
    (s1_i, s2_i)
}

/// reverse the ring if its winding is opposite to the one slicing expects
fn orient_ring<T: Float>(nodes: &mut [Node<T>], start_i: NodeIndex) -> NodeIndex {
    if ring_area(nodes, start_i) >= T::zero() {
        return start_i;
    }
    let mut p_i = start_i;
    loop {
        let p = node_mut!(nodes, p_i);
        (p.prev_i, p.next_i) = (p.next_i, p.prev_i);
        p.reflex = false;
        // former next
        p_i = p.prev_i;
        if p_i == start_i {
            return start_i;
        }
    }
}

/// Look for a valid diagonal that divides the ring into two and split along it.
/// Returns one node of each half, with collinear points around the cut filtered.
fn split_along_diagonal<T: Float>(
    nodes: &mut Vec<Node<T>>,
    start_i: NodeIndex,
) -> Option<(NodeIndex, NodeIndex)> {
    let mut ai = start_i;
    loop {
        let a = node!(nodes, ai);
        let a_next = node!(nodes, a.next_i);
        let a_prev = node!(nodes, a.prev_i);
        let mut bi = a_next.next_i;

        while bi != a.prev_i {
            let b = node!(nodes, bi);
            if a.i != b.i && is_valid_diagonal(nodes, a, b, a_next, a_prev) {
                // split the polygon in two by the diagonal
                let ci = split_polygon(nodes, ai, bi);

                // filter colinear points around the cuts
                let end_i = Some(node!(nodes, ai).next_i);
                let ai = filter_points(nodes, ai, end_i);
                let end_i = Some(node!(nodes, ci).next_i);
                let ci = filter_points(nodes, ci, end_i);
                return Some((ai, ci));
            }
            bi = b.next_i;
        }

        ai = a.next_i;
        if ai == start_i {
            return None;
        }
    }
}

/// check if a diagonal between two polygon nodes is valid (lies in polygon interior)
fn is_valid_diagonal<T: Float>(
    nodes: &[Node<T>],
    a: &Node<T>,
    b: &Node<T>,
    a_next: &Node<T>,
    a_prev: &Node<T>,
) -> bool {
    let b_next = node!(nodes, b.next_i);
    let b_prev = node!(nodes, b.prev_i);
    // dones't intersect other edges
    (a_next.i != b.i && a_prev.i != b.i && !intersects_polygon(nodes, a, b))
            // locally visible
            && ((locally_inside(nodes, a, b) && locally_inside(nodes, b, a) && middle_inside(nodes, a, b))
                // does not create opposite-facing sectors
                && (area(a_prev, a, b_prev) != T::zero() || area(a, b_prev, b) != T::zero())
                // special zero-length case
                || equals(a, b)
                    && area(a_prev, a, a_next) > T::zero()
                    && area(b_prev, b, b_next) > T::zero())
}
