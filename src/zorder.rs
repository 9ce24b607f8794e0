//! Z-order (Morton) curve index over the nodes of a ring.

use core::ptr;
use num_traits::float::Float;

use crate::node::{area, point_in_triangle, Node, NodeIndex};

/// Inputs with more points than this get a z-order index.
pub(crate) const HASH_THRESHOLD: usize = 80;

/// Transform from ring coordinates into the 15-bit integer grid used for z-order keys.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Curve<T: Float> {
    min_x: T,
    min_y: T,
    inv_size: T,
}

impl<T: Float> Curve<T> {
    /// bbox of the ring containing `start_i`; `None` when the bbox has zero size
    pub(crate) fn from_ring(nodes: &[Node<T>], start_i: NodeIndex) -> Option<Self> {
        let start = node!(nodes, start_i);
        let (mut min_x, mut min_y) = (start.x, start.y);
        let (mut max_x, mut max_y) = (start.x, start.y);
        let mut p_i = start.next_i;
        while p_i != start_i {
            let p = node!(nodes, p_i);
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
            p_i = p.next_i;
        }

        // minX, minY and invSize are later used to transform coords into integers for z-order calculation
        let size = (max_x - min_x).max(max_y - min_y);
        if size == T::zero() || !size.is_finite() {
            return None;
        }
        let inv_size = T::from(32767.0)? / size;
        Some(Self {
            min_x,
            min_y,
            inv_size,
        })
    }

    /// z-order of a point given coords and inverse of the longer side of data bbox
    pub(crate) fn z_order(&self, x: T, y: T) -> i32 {
        // coords are transformed into non-negative 15-bit integer range
        let x = self.grid(x - self.min_x);
        let y = self.grid(y - self.min_y);
        let mut xy = (x as i64) << 32 | y as i64;
        xy = (xy | (xy << 8)) & 0x00FF00FF00FF00FF;
        xy = (xy | (xy << 4)) & 0x0F0F0F0F0F0F0F0F;
        xy = (xy | (xy << 2)) & 0x3333333333333333;
        xy = (xy | (xy << 1)) & 0x5555555555555555;
        (xy >> 32 | xy << 1) as i32
    }

    fn grid(&self, offset: T) -> u32 {
        (offset * self.inv_size).to_u32().unwrap_or(0).min(32767)
    }
}

/// interlink polygon nodes in z-order
pub(crate) fn index_curve<T: Float>(nodes: &mut [Node<T>], start_i: NodeIndex, curve: &Curve<T>) {
    let mut p_i = start_i;
    let mut p = node_mut!(nodes, p_i);

    loop {
        if p.z == 0 {
            p.z = curve.z_order(p.x, p.y);
        }
        p.prev_z_i = Some(p.prev_i);
        p.next_z_i = Some(p.next_i);
        p_i = p.next_i;
        p = node_mut!(nodes, p_i);
        if p_i == start_i {
            break;
        }
    }

    if let Some(p_prev_z_i) = p.prev_z_i.take() {
        node_mut!(nodes, p_prev_z_i).next_z_i = None;
    }
    sort_linked(nodes, p_i);
}

/// Simon Tatham's linked list merge sort algorithm
/// http://www.chiark.greenend.org.uk/~sgtatham/algorithms/listsort.html
fn sort_linked<T: Float>(nodes: &mut [Node<T>], list_i: NodeIndex) {
    let mut in_size: usize = 1;
    let mut list_i = Some(list_i);

    loop {
        let mut p_i = list_i;
        list_i = None;
        let mut tail_i: Option<NodeIndex> = None;
        let mut num_merges = 0;

        while let Some(p_i_s) = p_i {
            num_merges += 1;
            let mut q_i = node!(nodes, p_i_s).next_z_i;
            let mut p_size: usize = 1;
            for _ in 1..in_size {
                if let Some(i) = q_i {
                    p_size += 1;
                    q_i = node!(nodes, i).next_z_i;
                } else {
                    break;
                }
            }
            let mut q_size = in_size;

            loop {
                // take from p unless it is exhausted or q holds the smaller key
                let take_q = match (p_i, q_i) {
                    (Some(p_i_s), Some(q_i_s)) if p_size > 0 && q_size > 0 => {
                        node!(nodes, p_i_s).z > node!(nodes, q_i_s).z
                    }
                    (Some(_), _) if p_size > 0 => false,
                    (_, Some(_)) if q_size > 0 => true,
                    _ => break,
                };

                let e_i = if take_q {
                    let Some(q_i_s) = q_i else { break };
                    q_size -= 1;
                    let e = node_mut!(nodes, q_i_s);
                    e.prev_z_i = tail_i;
                    q_i = e.next_z_i;
                    q_i_s
                } else {
                    let Some(p_i_s) = p_i else { break };
                    p_size -= 1;
                    let e = node_mut!(nodes, p_i_s);
                    e.prev_z_i = tail_i;
                    p_i = e.next_z_i;
                    p_i_s
                };

                if let Some(tail_i) = tail_i {
                    node_mut!(nodes, tail_i).next_z_i = Some(e_i);
                } else {
                    list_i = Some(e_i);
                }
                tail_i = Some(e_i);
            }

            p_i = q_i;
        }

        if let Some(tail_i) = tail_i {
            node_mut!(nodes, tail_i).next_z_i = None;
        }
        if num_merges <= 1 {
            break;
        }
        in_size *= 2;
    }
}

/// check that no other vertex lies inside the ear at `ear_i`, visiting only nodes whose
/// z-order keys fall within the key range of the triangle bbox
pub(crate) fn ear_is_empty_hashed<T: Float>(
    nodes: &[Node<T>],
    ear_i: NodeIndex,
    curve: &Curve<T>,
) -> bool {
    let b = node!(nodes, ear_i);
    let a = node!(nodes, b.prev_i);
    let c = node!(nodes, b.next_i);

    // triangle bbox
    let x0 = a.x.min(b.x.min(c.x));
    let y0 = a.y.min(b.y.min(c.y));
    let x1 = a.x.max(b.x.max(c.x));
    let y1 = a.y.max(b.y.max(c.y));

    // z-order range for the current triangle bbox;
    let min_z = curve.z_order(x0, y0);
    let max_z = curve.z_order(x1, y1);

    let blocks = |p: &Node<T>| {
        (p.x >= x0 && p.x <= x1 && p.y >= y0 && p.y <= y1)
            && (!ptr::eq(p, a) && !ptr::eq(p, c))
            && point_in_triangle(a.x, a.y, b.x, b.y, c.x, c.y, p.x, p.y)
            && area(node!(nodes, p.prev_i), p, node!(nodes, p.next_i)) >= T::zero()
    };

    let mut o_p = b.prev_z_i.map(|i| node!(nodes, i));
    let mut o_n = b.next_z_i.map(|i| node!(nodes, i));

    // look for points inside the triangle in both directions
    loop {
        let Some(p) = o_p else { break };
        if p.z < min_z {
            break;
        };
        let Some(n) = o_n else { break };
        if n.z > max_z {
            break;
        };

        if blocks(p) {
            return false;
        }
        o_p = p.prev_z_i.map(|i| node!(nodes, i));

        if blocks(n) {
            return false;
        }
        o_n = n.next_z_i.map(|i| node!(nodes, i));
    }

    // look for remaining points in decreasing z-order
    while let Some(p) = o_p {
        if p.z < min_z {
            break;
        };
        if blocks(p) {
            return false;
        }
        o_p = p.prev_z_i.map(|i| node!(nodes, i));
    }

    // look for remaining points in increasing z-order
    while let Some(n) = o_n {
        if n.z > max_z {
            break;
        };
        if blocks(n) {
            return false;
        }
        o_n = n.next_z_i.map(|i| node!(nodes, i));
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::insert_node;
    use alloc::vec::Vec;

    fn ring(points: &[[f64; 2]]) -> (Vec<Node<f64>>, NodeIndex) {
        let mut nodes = alloc::vec![Node::new(0, f64::INFINITY, f64::INFINITY)];
        let mut last = None;
        for (i, &[x, y]) in points.iter().enumerate() {
            last = Some(insert_node(&mut nodes, i as u32, x, y, last));
        }
        (nodes, last.unwrap())
    }

    #[test]
    fn test_z_order_interleaves_bits() {
        let (nodes, start_i) = ring(&[[0., 0.], [32767., 0.], [32767., 32767.]]);
        let curve = Curve::from_ring(&nodes, start_i).unwrap();
        assert_eq!(curve.z_order(0., 0.), 0);
        assert_eq!(curve.z_order(1., 0.), 1);
        assert_eq!(curve.z_order(0., 1.), 2);
        assert_eq!(curve.z_order(1., 1.), 3);
        assert_eq!(curve.z_order(2., 0.), 4);
        assert!(curve.z_order(32767., 32767.) > curve.z_order(32767., 0.));
    }

    #[test]
    fn test_z_order_clamps_outside_bbox() {
        let (nodes, start_i) = ring(&[[0., 0.], [10., 0.], [10., 10.]]);
        let curve = Curve::from_ring(&nodes, start_i).unwrap();
        assert_eq!(curve.z_order(-1., -1.), 0);
        assert_eq!(curve.z_order(20., 20.), curve.z_order(10., 10.));
    }

    #[test]
    fn test_zero_size_bbox_has_no_curve() {
        let (nodes, start_i) = ring(&[[5., 5.], [5., 5.], [5., 5.]]);
        assert!(Curve::from_ring(&nodes, start_i).is_none());
    }

    #[test]
    fn test_index_curve_sorts_every_node() {
        let points: Vec<[f64; 2]> = (0..100)
            .map(|i| {
                let t = i as f64 * 0.37;
                [(t * 7.0).sin() * 50.0, (t * 3.0).cos() * 50.0]
            })
            .collect();
        let (mut nodes, start_i) = ring(&points);
        let curve = Curve::from_ring(&nodes, start_i).unwrap();
        index_curve(&mut nodes, start_i, &curve);

        // walk back to the head of the z list, then forward over it
        let mut head_i = start_i;
        while let Some(prev_i) = node!(nodes, head_i).prev_z_i {
            head_i = prev_i;
        }
        let mut count = 1;
        let mut p_i = head_i;
        while let Some(next_i) = node!(nodes, p_i).next_z_i {
            assert!(node!(nodes, p_i).z <= node!(nodes, next_i).z);
            assert_eq!(node!(nodes, next_i).prev_z_i, Some(p_i));
            p_i = next_i;
            count += 1;
        }
        assert_eq!(count, points.len());
    }
}
