use crate::{
    error::Result,
    handle::{Handle, NodeId},
    handlegraph::{HandleGraph, Visit},
};

/// Trait encapsulating the mutable aspects of a handlegraph.
///
/// Every method checks its inputs before touching the graph; a method
/// that returns an error leaves the graph unchanged.
pub trait MutableHandleGraph: HandleGraph {
    /// Create a node with the next unused ID.
    fn create_handle(&mut self, sequence: &[u8]) -> Result<Handle>;

    /// Create a node with the given ID, failing if it already exists.
    fn create_handle_with_id(
        &mut self,
        sequence: &[u8],
        id: NodeId,
    ) -> Result<Handle>;

    /// Create a node that can carry path occurrences but is not seen
    /// by `has_node` or handle iteration.
    fn create_hidden_handle(&mut self, sequence: &[u8]) -> Result<Handle>;

    /// Remove a node along with its edges. A node that still has path
    /// occurrences is hidden instead, and disappears when its last
    /// occurrence does.
    fn destroy_handle(&mut self, handle: Handle) -> Result<()>;

    /// Create an edge from the end of `left` to the start of `right`.
    /// Creating an existing edge does nothing.
    fn create_edge(&mut self, left: Handle, right: Handle) -> Result<()>;

    /// Remove an edge, if it exists.
    fn destroy_edge(&mut self, left: Handle, right: Handle) -> Result<()>;

    /// Remove all nodes, edges, and paths.
    fn clear(&mut self);

    /// Swap the storage positions of two nodes. Only the order of
    /// handle iteration changes; handles keep referring to the same
    /// storage positions.
    fn swap_handles(&mut self, a: Handle, b: Handle) -> Result<()>;

    /// Make the orientation of `handle` the forward orientation of its
    /// node, and return the forward handle. Edges and path occurrences
    /// are updated so the graph spells the same sequences.
    fn apply_orientation(&mut self, handle: Handle) -> Result<Handle>;

    /// Split a node at the given offsets, measured in the orientation
    /// of `handle`. Returns the handles of the pieces, in the order
    /// they spell the sequence of `handle`.
    fn divide_handle(
        &mut self,
        handle: Handle,
        offsets: &[usize],
    ) -> Result<Vec<Handle>>;

    /// Split a node in two at `offset`.
    fn split_handle(
        &mut self,
        handle: Handle,
        offset: usize,
    ) -> Result<(Handle, Handle)> {
        let handles = self.divide_handle(handle, &[offset])?;
        Ok((handles[0], handles[1]))
    }

    /// Visit every visible node serially, in storage order, with
    /// mutable access to the graph. The callback may modify or destroy
    /// the node it was given, but no other node.
    fn for_each_handle_mut<F>(&mut self, f: F) -> bool
    where
        F: FnMut(&mut Self, Handle) -> Visit;
}
