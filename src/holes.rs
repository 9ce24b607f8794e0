//! Merging hole rings into the outer ring through bridge edges.

use alloc::vec::Vec;
use core::cmp::Ordering;
use log::debug;
use num_traits::float::Float;

use crate::node::{
    area, filter_points, locally_inside, point_in_triangle, split_polygon, Node, NodeIndex,
};
use crate::{Earcut, Index};

impl<T: Float> Earcut<T> {
    /// link every hole into the outer loop, producing a single-ring polygon without holes
    pub(crate) fn eliminate_holes<N: Index>(
        &mut self,
        hole_indices: &[N],
        mut outer_node_i: NodeIndex,
    ) -> NodeIndex {
        self.queue.clear();
        for (i, hi) in hole_indices.iter().enumerate() {
            let start = (*hi).into_usize();
            let end = if i < hole_indices.len() - 1 {
                hole_indices[i + 1].into_usize()
            } else {
                self.data.len()
            };
            if start >= end || end > self.data.len() {
                continue;
            }
            let Some(list_i) = self.linked_list(start, end, false) else {
                continue;
            };
            let list = node_mut!(self.nodes, list_i);
            if list.next_i == list.prev_i {
                // fewer than three distinct points
                if !self.options.steiner_holes {
                    debug!("skipping degenerate hole starting at vertex {start}");
                    continue;
                }
                if list_i == list.next_i {
                    list.pinned = true;
                }
            }
            self.queue.push(get_leftmost(&self.nodes, list_i));
        }

        // stable, so holes with the same leftmost point keep their supplied order
        self.queue.sort_by(|a, b| {
            let (a, b) = (node!(self.nodes, *a), node!(self.nodes, *b));
            a.x.partial_cmp(&b.x)
                .unwrap_or(Ordering::Equal)
                .then(a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal))
        });

        // process holes from left to right
        for &q in &self.queue {
            outer_node_i = eliminate_hole(&mut self.nodes, q, outer_node_i);
        }

        outer_node_i
    }
}

/// find a bridge between vertices that connects hole with an outer ring and and link it
fn eliminate_hole<T: Float>(
    nodes: &mut Vec<Node<T>>,
    hole_i: NodeIndex,
    outer_node_i: NodeIndex,
) -> NodeIndex {
    let Some(bridge_i) = find_hole_bridge(nodes, node!(nodes, hole_i), outer_node_i) else {
        debug!(
            "no bridge found for hole at vertex {}; hole skipped",
            node!(nodes, hole_i).i
        );
        return outer_node_i;
    };
    let bridge_reverse_i = split_polygon(nodes, bridge_i, hole_i);

    // filter collinear points around the cuts
    let end_i = Some(node!(nodes, bridge_reverse_i).next_i);
    filter_points(nodes, bridge_reverse_i, end_i);
    let end_i = Some(node!(nodes, bridge_i).next_i);
    filter_points(nodes, bridge_i, end_i)
}

/// David Eberly's algorithm for finding a bridge between hole and outer polygon
fn find_hole_bridge<T: Float>(
    nodes: &[Node<T>],
    hole: &Node<T>,
    outer_node_i: NodeIndex,
) -> Option<NodeIndex> {
    let mut p_i = outer_node_i;
    let mut qx = T::neg_infinity();
    let mut m_i: Option<NodeIndex> = None;

    // find a segment intersected by a ray from the hole's leftmost point to the left;
    // segment's endpoint with lesser x will be potential connection point
    let mut p = node!(nodes, p_i);
    loop {
        let p_next = node!(nodes, p.next_i);
        if hole.y <= p.y && hole.y >= p_next.y && p_next.y != p.y {
            let x = p.x + (hole.y - p.y) * (p_next.x - p.x) / (p_next.y - p.y);
            if x <= hole.x && x > qx {
                qx = x;
                m_i = Some(if p.x < p_next.x { p_i } else { p.next_i });
                if x == hole.x {
                    // hole touches outer segment; pick leftmost endpoint
                    return m_i;
                }
            }
        }
        p_i = p.next_i;
        if p_i == outer_node_i {
            break;
        }
        p = p_next;
    }

    let mut m_i = m_i?;

    // look for points inside the triangle of hole point, segment intersection and endpoint;
    // if there are no points found, we have a valid connection;
    // otherwise choose the point of the minimum angle with the ray as connection point

    let stop_i = m_i;
    let (mx, my) = {
        let m = node!(nodes, m_i);
        (m.x, m.y)
    };
    let mut tan_min = T::infinity();

    p_i = m_i;
    let mut p = node!(nodes, p_i);
    let mut m = p;

    loop {
        if (hole.x >= p.x && p.x >= mx && hole.x != p.x)
            && point_in_triangle(
                if hole.y < my { hole.x } else { qx },
                hole.y,
                mx,
                my,
                if hole.y < my { qx } else { hole.x },
                hole.y,
                p.x,
                p.y,
            )
        {
            let tan = (hole.y - p.y).abs() / (hole.x - p.x);
            if locally_inside(nodes, p, hole)
                && (tan < tan_min
                    || (tan == tan_min
                        && (p.x > m.x || (p.x == m.x && sector_contains_sector(nodes, m, p)))))
            {
                (m_i, m) = (p_i, p);
                tan_min = tan;
            }
        }

        p_i = p.next_i;
        if p_i == stop_i {
            return Some(m_i);
        }
        p = node!(nodes, p_i);
    }
}

/// whether sector in vertex m contains sector in vertex p in the same coordinates
fn sector_contains_sector<T: Float>(nodes: &[Node<T>], m: &Node<T>, p: &Node<T>) -> bool {
    area(node!(nodes, m.prev_i), m, node!(nodes, p.prev_i)) < T::zero()
        && area(node!(nodes, p.next_i), m, node!(nodes, m.next_i)) < T::zero()
}

/// find the leftmost node of a polygon ring
fn get_leftmost<T: Float>(nodes: &[Node<T>], start_i: NodeIndex) -> NodeIndex {
    let mut p_i = start_i;
    let mut p = node!(nodes, p_i);
    let mut leftmost_i = start_i;
    let mut leftmost = p;

    loop {
        if p.x < leftmost.x || (p.x == leftmost.x && p.y < leftmost.y) {
            (leftmost_i, leftmost) = (p_i, p);
        }
        p_i = p.next_i;
        if p_i == start_i {
            return leftmost_i;
        }
        p = node!(nodes, p_i);
    }
}
