//! Arena of ring nodes and the geometric predicates that operate on them.

use alloc::vec::Vec;
use core::ptr;
use num_traits::float::Float;

macro_rules! node {
    ($self:ident.$nodes:ident, $index:expr) => {
        unsafe {
            debug_assert!($index.get() < $self.$nodes.len() as u32);
            $self.$nodes.get_unchecked($index.get() as usize)
        }
    };
    ($nodes:ident, $index:expr) => {
        unsafe {
            debug_assert!($index.get() < $nodes.len() as u32);
            $nodes.get_unchecked($index.get() as usize)
        }
    };
}

macro_rules! node_mut {
    ($self:ident.$nodes:ident, $index:expr) => {
        unsafe {
            debug_assert!($index.get() < $self.$nodes.len() as u32);
            $self.$nodes.get_unchecked_mut($index.get() as usize)
        }
    };
    ($nodes:ident, $index:expr) => {
        unsafe {
            debug_assert!($index.get() < $nodes.len() as u32);
            $nodes.get_unchecked_mut($index.get() as usize)
        }
    };
}

/// Handle of a node in the arena. Slot 0 holds a dummy node, so handles are never zero.
pub(crate) type NodeIndex = core::num::NonZeroU32;

pub(crate) struct Node<T: Float> {
    /// vertex index in the input point sequence
    pub(crate) i: u32,
    /// z-order curve value
    pub(crate) z: i32,
    /// vertex coordinates x
    pub(crate) x: T,
    /// vertex coordinates y
    pub(crate) y: T,
    /// previous vertex node in a polygon ring
    pub(crate) prev_i: NodeIndex,
    /// next vertex node in a polygon ring
    pub(crate) next_i: NodeIndex,
    /// previous node in z-order
    pub(crate) prev_z_i: Option<NodeIndex>,
    /// next node in z-order
    pub(crate) next_z_i: Option<NodeIndex>,
    /// never removed by point filtering (point and segment holes)
    pub(crate) pinned: bool,
    /// ear tip hint: the vertex was found reflex and its neighbors haven't changed since
    pub(crate) reflex: bool,
}

impl<T: Float> Node<T> {
    pub(crate) fn new(i: u32, x: T, y: T) -> Self {
        Self {
            i,
            x,
            y,
            prev_i: unsafe { NodeIndex::new_unchecked(1) },
            next_i: unsafe { NodeIndex::new_unchecked(1) },
            z: 0,
            prev_z_i: None,
            next_z_i: None,
            pinned: false,
            reflex: false,
        }
    }
}

/// handle the next node pushed onto the arena will get
#[inline]
pub(crate) fn next_handle<T: Float>(nodes: &[Node<T>]) -> NodeIndex {
    debug_assert!(!nodes.is_empty());
    unsafe { NodeIndex::new_unchecked(nodes.len() as u32) }
}

/// create a node and optionally link it with previous one (in a circular doubly linked list)
pub(crate) fn insert_node<T: Float>(
    nodes: &mut Vec<Node<T>>,
    i: u32,
    x: T,
    y: T,
    last: Option<NodeIndex>,
) -> NodeIndex {
    let mut p = Node::new(i, x, y);
    let p_i = next_handle(nodes);
    match last {
        Some(last_i) => {
            let last = node_mut!(nodes, last_i);
            let last_next_i = last.next_i;
            (p.next_i, last.next_i) = (last_next_i, p_i);
            p.prev_i = last_i;
            node_mut!(nodes, last_next_i).prev_i = p_i;
        }
        None => {
            (p.prev_i, p.next_i) = (p_i, p_i);
        }
    }
    nodes.push(p);
    p_i
}

/// unlink a node from its ring and from the z-order list; returns its former neighbors
pub(crate) fn remove_node<T: Float>(
    nodes: &mut [Node<T>],
    p_i: NodeIndex,
) -> (NodeIndex, NodeIndex) {
    let p = node!(nodes, p_i);
    let p_next_i = p.next_i;
    let p_prev_i = p.prev_i;
    let p_next_z_i = p.next_z_i;
    let p_prev_z_i = p.prev_z_i;

    let next = node_mut!(nodes, p_next_i);
    next.prev_i = p_prev_i;
    next.reflex = false;
    let prev = node_mut!(nodes, p_prev_i);
    prev.next_i = p_next_i;
    prev.reflex = false;

    if let Some(prev_z_i) = p_prev_z_i {
        node_mut!(nodes, prev_z_i).next_z_i = p_next_z_i;
    }
    if let Some(next_z_i) = p_next_z_i {
        node_mut!(nodes, next_z_i).prev_z_i = p_prev_z_i;
    }
    (p_prev_i, p_next_i)
}

/// link two polygon vertices with a bridge; if the vertices belong to the same ring, it splits polygon into two;
/// if one belongs to the outer ring and another to a hole, it merges it into a single ring
pub(crate) fn split_polygon<T: Float>(
    nodes: &mut Vec<Node<T>>,
    a_i: NodeIndex,
    b_i: NodeIndex,
) -> NodeIndex {
    let a2_i = next_handle(nodes);
    let b2_i = unsafe { NodeIndex::new_unchecked(a2_i.get() + 1) };

    let a = node_mut!(nodes, a_i);
    let mut a2 = Node::new(a.i, a.x, a.y);
    let an_i = a.next_i;
    a.next_i = b_i;
    a.reflex = false;
    a2.prev_i = b2_i;
    a2.next_i = an_i;
    let an = node_mut!(nodes, an_i);
    an.prev_i = a2_i;
    an.reflex = false;

    let b = node_mut!(nodes, b_i);
    let mut b2 = Node::new(b.i, b.x, b.y);
    let bp_i = b.prev_i;
    b.prev_i = a_i;
    b.reflex = false;
    b2.next_i = a2_i;
    b2.prev_i = bp_i;
    let bp = node_mut!(nodes, bp_i);
    bp.next_i = b2_i;
    bp.reflex = false;

    nodes.extend([a2, b2]);

    b2_i
}

/// eliminate colinear or duplicate points
pub(crate) fn filter_points<T: Float>(
    nodes: &mut [Node<T>],
    start_i: NodeIndex,
    end_i: Option<NodeIndex>,
) -> NodeIndex {
    let mut end_i = end_i.unwrap_or(start_i);

    let mut p_i = start_i;
    let mut p = node!(nodes, p_i);
    loop {
        let p_next = node!(nodes, p.next_i);
        if !p.pinned && (equals(p, p_next) || area(node!(nodes, p.prev_i), p, p_next) == T::zero())
        {
            let (prev_i, next_i) = remove_node(nodes, p_i);
            (p_i, end_i) = (prev_i, prev_i);
            if p_i == next_i {
                return end_i;
            }
            p = node!(nodes, p_i);
        } else {
            p_i = p.next_i;
            if p_i == end_i {
                return end_i;
            }
            p = p_next;
        };
    }
}

/// number of nodes in the ring containing `start_i`
pub(crate) fn ring_len<T: Float>(nodes: &[Node<T>], start_i: NodeIndex) -> usize {
    let mut len = 1;
    let mut p_i = node!(nodes, start_i).next_i;
    while p_i != start_i {
        len += 1;
        p_i = node!(nodes, p_i).next_i;
    }
    len
}

/// shoelace sum of a point range; positive for counter-clockwise rings in a y-up frame
pub(crate) fn signed_area<T: Float>(data: &[[T; 2]], start: usize, end: usize) -> T {
    let [mut bx, mut by] = data[end - 1];
    let mut sum = T::zero();
    for &[ax, ay] in &data[start..end] {
        sum = sum + (bx - ax) * (ay + by);
        (bx, by) = (ax, ay);
    }
    sum
}

/// shoelace sum of a linked ring, same sign convention as [`signed_area`]
pub(crate) fn ring_area<T: Float>(nodes: &[Node<T>], start_i: NodeIndex) -> T {
    let mut sum = T::zero();
    let mut p_i = start_i;
    loop {
        let p = node!(nodes, p_i);
        let prev = node!(nodes, p.prev_i);
        sum = sum + (prev.x - p.x) * (p.y + prev.y);
        p_i = p.next_i;
        if p_i == start_i {
            return sum;
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn point_in_triangle<T: Float>(
    ax: T,
    ay: T,
    bx: T,
    by: T,
    cx: T,
    cy: T,
    px: T,
    py: T,
) -> bool {
    (cx - px) * (ay - py) >= (ax - px) * (cy - py)
        && (ax - px) * (by - py) >= (bx - px) * (ay - py)
        && (bx - px) * (cy - py) >= (cx - px) * (by - py)
}

/// signed area of a triangle
pub(crate) fn area<T: Float>(p: &Node<T>, q: &Node<T>, r: &Node<T>) -> T {
    (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y)
}

/// whether `b` can be the tip of an ear: strictly convex, or collinear and strictly
/// between its neighbors (spikes and zero-length edges are not)
pub(crate) fn is_convex<T: Float>(a: &Node<T>, b: &Node<T>, c: &Node<T>) -> bool {
    let abc = area(a, b, c);
    abc < T::zero()
        || (abc == T::zero() && (a.x - b.x) * (c.x - b.x) + (a.y - b.y) * (c.y - b.y) < T::zero())
}

/// check if two points are equal
pub(crate) fn equals<T: Float>(p1: &Node<T>, p2: &Node<T>) -> bool {
    p1.x == p2.x && p1.y == p2.y
}

/// for collinear points p, q, r, check if point q lies on segment pr
fn on_segment<T: Float>(p: &Node<T>, q: &Node<T>, r: &Node<T>) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}

pub(crate) fn sign<T: Float>(v: T) -> i32 {
    (v > T::zero()) as i32 - (v < T::zero()) as i32
}

/// check if two segments intersect
pub(crate) fn intersects<T: Float>(p1: &Node<T>, q1: &Node<T>, p2: &Node<T>, q2: &Node<T>) -> bool {
    let o1 = sign(area(p1, q1, p2));
    let o2 = sign(area(p1, q1, q2));
    let o3 = sign(area(p2, q2, p1));
    let o4 = sign(area(p2, q2, q1));
    (o1 != o2 && o3 != o4) // general case
        || (o3 == 0 && on_segment(p2, p1, q2)) // p2, q2 and p1 are collinear and p1 lies on p2q2
        || (o4 == 0 && on_segment(p2, q1, q2)) // p2, q2 and q1 are collinear and q1 lies on p2q2
        || (o2 == 0 && on_segment(p1, q2, q1)) // p1, q1 and q2 are collinear and q2 lies on p1q1
        || (o1 == 0 && on_segment(p1, p2, q1)) // p1, q1 and p2 are collinear and p2 lies on p1q1
}

/// point where two segments cross each other at a single interior point, if they do
pub(crate) fn crossing<T: Float>(
    p1: &Node<T>,
    q1: &Node<T>,
    p2: &Node<T>,
    q2: &Node<T>,
) -> Option<(T, T)> {
    let o1 = sign(area(p1, q1, p2));
    let o2 = sign(area(p1, q1, q2));
    let o3 = sign(area(p2, q2, p1));
    let o4 = sign(area(p2, q2, q1));
    if o1 == 0 || o2 == 0 || o3 == 0 || o4 == 0 || o1 == o2 || o3 == o4 {
        return None;
    }
    let (rx, ry) = (q1.x - p1.x, q1.y - p1.y);
    let (sx, sy) = (q2.x - p2.x, q2.y - p2.y);
    let denom = rx * sy - ry * sx;
    if denom == T::zero() {
        return None;
    }
    let t = ((p2.x - p1.x) * sy - (p2.y - p1.y) * sx) / denom;
    Some((p1.x + t * rx, p1.y + t * ry))
}

/// check if a polygon diagonal intersects any polygon segments
pub(crate) fn intersects_polygon<T: Float>(nodes: &[Node<T>], a: &Node<T>, b: &Node<T>) -> bool {
    let mut p = a;
    loop {
        let p_next = node!(nodes, p.next_i);
        if (p.i != a.i && p.i != b.i && p_next.i != a.i && p_next.i != b.i)
            && intersects(p, p_next, a, b)
        {
            return true;
        }
        p = p_next;
        if ptr::eq(p, a) {
            return false;
        }
    }
}

/// check if a polygon diagonal is locally inside the polygon
pub(crate) fn locally_inside<T: Float>(nodes: &[Node<T>], a: &Node<T>, b: &Node<T>) -> bool {
    let a_prev = node!(nodes, a.prev_i);
    let a_next = node!(nodes, a.next_i);
    if area(a_prev, a, a_next) < T::zero() {
        area(a, b, a_next) >= T::zero() && area(a, a_prev, b) >= T::zero()
    } else {
        area(a, b, a_prev) < T::zero() || area(a, a_next, b) < T::zero()
    }
}

/// check if the middle point of a polygon diagonal is inside the polygon
pub(crate) fn middle_inside<T: Float>(nodes: &[Node<T>], a: &Node<T>, b: &Node<T>) -> bool {
    let mut p = a;
    let mut inside = false;
    let two = T::one() + T::one();
    let (px, py) = ((a.x + b.x) / two, (a.y + b.y) / two);
    loop {
        let p_next = node!(nodes, p.next_i);
        inside ^= (p.y > py) != (p_next.y > py)
            && p_next.y != p.y
            && (px < (p_next.x - p.x) * (py - p.y) / (p_next.y - p.y) + p.x);
        p = p_next;
        if ptr::eq(p, a) {
            return inside;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(points: &[[f64; 2]]) -> (Vec<Node<f64>>, NodeIndex) {
        let mut nodes = alloc::vec![Node::new(0, f64::INFINITY, f64::INFINITY)];
        let mut last = None;
        for (i, &[x, y]) in points.iter().enumerate() {
            last = Some(insert_node(&mut nodes, i as u32, x, y, last));
        }
        (nodes, last.unwrap())
    }

    #[test]
    fn test_links_are_circular() {
        let (nodes, last_i) = ring(&[[0., 0.], [1., 0.], [1., 1.], [0., 1.]]);
        assert_eq!(ring_len(&nodes, last_i), 4);
        let mut p_i = last_i;
        for _ in 0..4 {
            let p = node!(nodes, p_i);
            assert_eq!(node!(nodes, p.next_i).prev_i, p_i);
            assert_eq!(node!(nodes, p.prev_i).next_i, p_i);
            p_i = p.next_i;
        }
    }

    #[test]
    fn test_ring_area_matches_slice_area() {
        let points = [[0., 0.], [4., 0.], [4., 3.], [0., 3.]];
        let (nodes, last_i) = ring(&points);
        assert_eq!(ring_area(&nodes, last_i), signed_area(&points, 0, 4));
        assert!(ring_area(&nodes, last_i) > 0.);
    }

    #[test]
    fn test_filter_points_drops_collinear_and_duplicates() {
        let (mut nodes, last_i) = ring(&[[0., 0.], [1., 0.], [2., 0.], [2., 0.], [2., 2.]]);
        let start_i = filter_points(&mut nodes, last_i, None);
        assert_eq!(ring_len(&nodes, start_i), 3);
    }

    #[test]
    fn test_filter_points_keeps_pinned() {
        let (mut nodes, last_i) = ring(&[[0., 0.], [1., 0.], [2., 0.], [2., 2.]]);
        let mid_i = NodeIndex::new(2).unwrap();
        node_mut!(nodes, mid_i).pinned = true;
        let start_i = filter_points(&mut nodes, last_i, None);
        assert_eq!(ring_len(&nodes, start_i), 4);
    }

    #[test]
    fn test_convexity_of_collinear_vertices() {
        let a = Node::new(0, 0., 0.);
        let b = Node::new(1, 1., 0.);
        let c = Node::new(2, 2., 0.);
        // straight-through point is clippable, a spike is not
        assert!(is_convex(&a, &b, &c));
        assert!(!is_convex(&a, &c, &b));
        assert!(!is_convex(&a, &a, &c));
    }

    #[test]
    fn test_crossing() {
        let p1 = Node::new(0, 0., 0.);
        let q1 = Node::new(1, 2., 2.);
        let p2 = Node::new(2, 2., 0.);
        let q2 = Node::new(3, 0., 2.);
        assert_eq!(crossing(&p1, &q1, &p2, &q2), Some((1., 1.)));

        // touching at an endpoint is not a crossing
        let q2 = Node::new(3, 1., 1.);
        assert_eq!(crossing(&p1, &q1, &p2, &q2), None);
        assert!(intersects(&p1, &q1, &p2, &q2));
    }

    #[test]
    fn test_on_segment_bounds() {
        let p = Node::new(0, 0., 0.);
        let r = Node::new(1, 4., 4.);
        assert!(on_segment(&p, &Node::new(2, 2., 2.), &r));
        assert!(!on_segment(&p, &Node::new(2, 5., 5.), &r));
    }
}
