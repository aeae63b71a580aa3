use crate::handle::Handle;

use super::nodes::NodeIndex;

/// Iterator over the forward handles of the visible nodes of a
/// `DynGraph`, in storage order.
pub struct NodeHandles<'a> {
    nodes: &'a NodeIndex,
    rank: usize,
}

impl<'a> NodeHandles<'a> {
    pub(super) fn new(nodes: &'a NodeIndex) -> Self {
        Self { nodes, rank: 0 }
    }
}

impl<'a> Iterator for NodeHandles<'a> {
    type Item = Handle;

    fn next(&mut self) -> Option<Handle> {
        while self.rank < self.nodes.rank_count() {
            let rank = self.rank;
            self.rank += 1;
            if self.nodes.is_visible(rank) {
                return Some(Handle::pack(rank, false));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.nodes.rank_count().saturating_sub(self.rank)))
    }
}
