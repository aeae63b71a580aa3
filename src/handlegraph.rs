use crate::{
    error::{GraphError, Result},
    handle::{Direction, Edge, Handle, NodeId},
};

/// The return value of every iteration callback; `Stop` ends the
/// iteration early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    Stop,
}

impl Visit {
    #[inline]
    pub fn is_stop(self) -> bool {
        self == Visit::Stop
    }
}

/// Adapt a callback that never stops an iteration.
#[inline]
pub fn visit_all<T, F>(mut f: F) -> impl FnMut(T) -> Visit
where
    F: FnMut(T),
{
    move |x| {
        f(x);
        Visit::Continue
    }
}

/// Like [`visit_all`], for the callbacks of potentially parallel
/// iteration.
#[inline]
pub fn visit_all_sync<T, F>(f: F) -> impl Fn(T) -> Visit + Sync + Send
where
    F: Fn(T) + Sync + Send,
{
    move |x| {
        f(x);
        Visit::Continue
    }
}

/// Trait encapsulating the immutable aspects of a handlegraph
///
/// Handles that were not produced by the graph being queried are a
/// caller bug, and the query methods may panic on them.
pub trait HandleGraph {
    /// Whether `id` names a visible node. Hidden nodes are not
    /// included.
    fn has_node(&self, node_id: NodeId) -> bool;

    fn get_handle(&self, node_id: NodeId, is_reverse: bool) -> Result<Handle>;

    fn get_id(&self, handle: Handle) -> NodeId;

    #[inline]
    fn get_is_reverse(&self, handle: Handle) -> bool {
        handle.is_reverse()
    }

    #[inline]
    fn flip(&self, handle: Handle) -> Handle {
        handle.flip()
    }

    #[inline]
    fn forward(&self, handle: Handle) -> Handle {
        handle.forward()
    }

    /// The length of the sequence of a given node
    fn get_length(&self, handle: Handle) -> usize;

    /// Returns the sequence of a node in the handle's local forward
    /// orientation, i.e. the reverse complement of the stored
    /// sequence for reverse handles.
    fn get_sequence(&self, handle: Handle) -> Vec<u8>;

    fn get_subsequence(
        &self,
        handle: Handle,
        index: usize,
        size: usize,
    ) -> Vec<u8> {
        let seq = self.get_sequence(handle);
        let end = (index + size).min(seq.len());
        seq[index.min(end)..end].into()
    }

    fn get_base(&self, handle: Handle, index: usize) -> u8 {
        self.get_sequence(handle)[index]
    }

    /// Visit the handles on the given side of `handle`, returning
    /// `false` if the callback stopped the iteration.
    fn follow_edges<F>(&self, handle: Handle, dir: Direction, f: F) -> bool
    where
        F: FnMut(Handle) -> Visit;

    /// Visit the forward handle of every visible node. With `parallel`
    /// set, the callback may run on several threads at once and in no
    /// particular order, and `Stop` is advisory.
    fn for_each_handle<F>(&self, parallel: bool, f: F) -> bool
    where
        F: Fn(Handle) -> Visit + Sync + Send;

    /// Visit every edge exactly once, in its canonical form.
    fn for_each_edge<F>(&self, f: F) -> bool
    where
        F: FnMut(Edge) -> Visit;

    /// Return the number of visible nodes in the graph
    fn node_size(&self) -> usize;

    /// Return the total number of edges in the graph
    fn edge_count(&self) -> usize;

    /// Sum up the lengths of all the visible nodes' sequences
    fn total_length(&self) -> usize;

    fn min_node_id(&self) -> NodeId;

    fn max_node_id(&self) -> NodeId;

    fn get_degree(&self, handle: Handle, dir: Direction) -> usize {
        let mut count = 0;
        self.follow_edges(handle, dir, |_| {
            count += 1;
            Visit::Continue
        });
        count
    }

    fn has_edge(&self, left: Handle, right: Handle) -> bool;

    #[inline]
    fn edge_handle(&self, left: Handle, right: Handle) -> Edge {
        Edge::edge_handle(left, right)
    }

    /// Given an edge and one of the handles it leaves from, return the
    /// handle the edge leads to.
    fn traverse_edge_handle(&self, edge: &Edge, left: Handle) -> Result<Handle> {
        let Edge(l, r) = *edge;
        if left == l {
            Ok(r)
        } else if left == r.flip() {
            Ok(l.flip())
        } else {
            Err(GraphError::NotOnEdge(left))
        }
    }
}
