//! Static 3-D k-d tree over 8-bit RGB points.
//!
//! The tree is stored implicitly in a single vector: every subtree occupies a
//! contiguous range, with its splitting node at the range midpoint. Splitting
//! axes cycle R, G, B with depth.

#[derive(Debug, Clone, Copy)]
struct Node {
    point: [u8; 3],
    ordinal: u32,
}

#[derive(Debug, Clone)]
pub struct KdTree {
    nodes: Vec<Node>,
}

/// Best candidate so far, compared as `(squared distance, ordinal)` so that
/// equidistant samples resolve to the lowest ordinal.
#[derive(Debug, Clone, Copy)]
struct Best {
    distance: u32,
    ordinal: u32,
}

impl Best {
    fn improves_on(self, other: Best) -> bool {
        (self.distance, self.ordinal) < (other.distance, other.ordinal)
    }
}

#[inline]
pub(crate) fn squared_distance(a: [u8; 3], b: [u8; 3]) -> u32 {
    let dr = a[0] as i32 - b[0] as i32;
    let dg = a[1] as i32 - b[1] as i32;
    let db = a[2] as i32 - b[2] as i32;
    (dr * dr + dg * dg + db * db) as u32
}

impl KdTree {
    pub fn build(points: &[[u8; 3]]) -> Self {
        let mut nodes: Vec<Node> = points
            .iter()
            .enumerate()
            .map(|(ordinal, &point)| Node {
                point,
                ordinal: ordinal as u32,
            })
            .collect();

        Self::partition(&mut nodes, 0);

        Self { nodes }
    }

    fn partition(nodes: &mut [Node], depth: usize) {
        if nodes.len() <= 1 {
            return;
        }

        let axis = depth % 3;
        let mid = nodes.len() / 2;
        nodes.select_nth_unstable_by_key(mid, |node| (node.point[axis], node.ordinal));

        let (left, right) = nodes.split_at_mut(mid);
        Self::partition(left, depth + 1);
        Self::partition(&mut right[1..], depth + 1);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the ordinal of the point nearest to `query`, or `None` for an
    /// empty tree.
    pub fn nearest(&self, query: [u8; 3]) -> Option<usize> {
        if self.nodes.is_empty() {
            return None;
        }

        let mut best = Best {
            distance: u32::MAX,
            ordinal: u32::MAX,
        };
        self.search(0, self.nodes.len(), 0, query, &mut best);

        Some(best.ordinal as usize)
    }

    fn search(&self, lo: usize, hi: usize, depth: usize, query: [u8; 3], best: &mut Best) {
        if lo >= hi {
            return;
        }

        let mid = lo + (hi - lo) / 2;
        let node = self.nodes[mid];

        let candidate = Best {
            distance: squared_distance(query, node.point),
            ordinal: node.ordinal,
        };
        if candidate.improves_on(*best) {
            *best = candidate;
        }

        let axis = depth % 3;
        let diff = query[axis] as i32 - node.point[axis] as i32;
        let (near, far) = if diff < 0 {
            ((lo, mid), (mid + 1, hi))
        } else {
            ((mid + 1, hi), (lo, mid))
        };

        self.search(near.0, near.1, depth + 1, query, best);

        // Equal distance still has to be visited: a lower ordinal may sit there.
        if ((diff * diff) as u32) <= best.distance {
            self.search(far.0, far.1, depth + 1, query, best);
        }
    }
}
