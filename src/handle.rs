use std::cmp::Ordering;
use std::ops::Add;

/// Newtype that represents a node in the graph. Node IDs are chosen
/// by the user (or assigned by the graph), and zero never names a
/// node.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    #[inline]
    fn from(num: u64) -> Self {
        NodeId(num)
    }
}

impl From<usize> for NodeId {
    #[inline]
    fn from(num: usize) -> Self {
        NodeId(num as u64)
    }
}

impl From<NodeId> for u64 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl Add<u64> for NodeId {
    type Output = Self;

    #[inline]
    fn add(self, other: u64) -> Self {
        NodeId(self.0 + other)
    }
}

/// A Handle is a node with an orientation, packed as a single u64.
///
/// The node is identified by its internal rank in the graph that
/// created the handle, not by its `NodeId`, so handles can only be
/// obtained from a graph.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Hash, Eq, Ord)]
#[repr(transparent)]
pub struct Handle(u64);

impl Handle {
    #[inline]
    pub(crate) fn pack(rank: usize, is_reverse: bool) -> Handle {
        let rank = rank as u64;
        assert!(
            rank < (0x1 << 63),
            "Tried to create a handle with a rank that filled 64 bits"
        );
        Handle((rank << 1) | is_reverse as u64)
    }

    #[inline]
    pub(crate) fn rank(self) -> usize {
        (self.0 >> 1) as usize
    }

    #[inline]
    pub fn as_integer(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn is_reverse(&self) -> bool {
        self.0 & 1 != 0
    }

    #[inline]
    pub fn flip(self) -> Self {
        Handle(self.0 ^ 1)
    }

    #[inline]
    pub fn forward(self) -> Self {
        if self.is_reverse() {
            self.flip()
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Hash, Eq, Ord)]
pub struct Edge(pub Handle, pub Handle);

impl Edge {
    /// Construct an edge, taking the orientation of the handles into
    /// account. `(left, right)` and `(right.flip(), left.flip())`
    /// describe the same edge, and both produce the same `Edge`.
    #[inline]
    pub fn edge_handle(left: Handle, right: Handle) -> Edge {
        let flipped_right = right.flip();
        let flipped_left = left.flip();

        match left.cmp(&flipped_right) {
            Ordering::Greater => Edge(flipped_right, flipped_left),
            Ordering::Equal => {
                if right > flipped_left {
                    Edge(flipped_right, flipped_left)
                } else {
                    Edge(left, right)
                }
            }
            Ordering::Less => Edge(left, right),
        }
    }
}

/// Which side of a handle to look at
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    #[inline]
    pub fn flip(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Handle::pack is an isomorphism; Handle <=> (u63, bool)
    #[test]
    fn handle_is_isomorphism() {
        let u: usize = 597283742;
        let h = Handle::pack(u, true);
        assert_eq!(h.rank(), u);
        assert!(h.is_reverse());
    }

    #[test]
    fn handle_flip() {
        let u: usize = 597283742;
        let h1 = Handle::pack(u, true);
        let h2 = h1.flip();

        assert_eq!(h1.rank(), h2.rank());
        assert!(h1.is_reverse());
        assert!(!h2.is_reverse());
        assert_eq!(h1.forward(), h2);
        assert_eq!(h2.forward(), h2);
    }

    #[test]
    fn edge_handle_is_canonical() {
        let a = Handle::pack(3, false);
        let b = Handle::pack(7, true);

        let e1 = Edge::edge_handle(a, b);
        let e2 = Edge::edge_handle(b.flip(), a.flip());
        assert_eq!(e1, e2);

        // a reversing self-loop is its own flip
        let e3 = Edge::edge_handle(a, a.flip());
        assert_eq!(e3, Edge(a, a.flip()));
    }
}
