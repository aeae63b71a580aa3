use serde::{Deserialize, Serialize};

#[allow(unused_imports)]
use log::{debug, info, trace};

use crate::{
    error::{GraphError, Result},
    handle::{Direction, Handle, NodeId},
    pathhandlegraph::PathId,
};

use super::{
    edges::{encode_delta, EdgeEntry, EdgeIndex},
    iter::NodeHandles,
    nodes::{NodeIndex, MAX_NODE_ID},
    occurrences::{OccurrenceIndex, StepLink, StepRef},
    paths::PathTable,
    sequence::SequenceStore,
};

/// The smallest number of ranks a single rayon job iterates over when
/// visiting handles in parallel.
pub(crate) const PARALLEL_MIN_LEN: usize = 1024;

/// A mutable sequence graph stored in succinct dynamic indices.
///
/// Nodes, edges, and paths live in four indices that all store one
/// record per node, in the same order:
///
/// * `nodes` maps IDs to ranks and tracks tombstones and hidden nodes
/// * `sequences` holds the node sequences
/// * `edges` holds the delta-encoded adjacency lists of both sides
/// * `occurrences` holds the path steps on each node
///
/// `paths` holds the per-path metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DynGraph {
    pub(crate) nodes: NodeIndex,
    pub(crate) sequences: SequenceStore,
    pub(crate) edges: EdgeIndex,
    pub(crate) occurrences: OccurrenceIndex,
    pub(crate) paths: PathTable,
}

crate::impl_space_usage!(
    DynGraph,
    [nodes, sequences, edges, occurrences, paths]
);

impl DynGraph {
    pub fn new() -> Self {
        Default::default()
    }

    /// Iterate over the forward handles of the visible nodes, in
    /// storage order.
    pub fn handles(&self) -> NodeHandles<'_> {
        NodeHandles::new(&self.nodes)
    }

    /// The number of hidden nodes.
    pub fn hidden_count(&self) -> usize {
        self.nodes.hidden_count()
    }

    /// The IDs of all paths, in increasing order.
    pub fn path_ids(&self) -> impl Iterator<Item = PathId> + '_ {
        self.paths.ids()
    }

    /// The number of bytes the graph uses on the heap.
    pub fn heap_bytes(&self) -> usize {
        succinct::SpaceUsage::heap_bytes(self)
    }

    #[inline]
    pub(crate) fn slot(&self, handle: Handle) -> usize {
        self.nodes.slot(handle.rank())
    }

    #[inline]
    pub(crate) fn node_id(&self, handle: Handle) -> u64 {
        self.nodes.get_id(handle.rank())
    }

    /// The handle of a node by ID, hidden or not.
    #[inline]
    pub(crate) fn handle_of(&self, id: u64, is_reverse: bool) -> Option<Handle> {
        let rank = self.nodes.get_rank(id)?;
        Some(Handle::pack(rank, is_reverse))
    }

    /// Fail unless `handle` refers to a node with storage.
    pub(crate) fn check_handle(&self, handle: Handle) -> Result<()> {
        if self.nodes.has_rank(handle.rank()) {
            Ok(())
        } else {
            Err(GraphError::InvalidHandle(handle))
        }
    }

    /// Fail unless `handle` refers to a visible node.
    pub(crate) fn check_visible(&self, handle: Handle) -> Result<()> {
        self.check_handle(handle)?;
        if self.nodes.is_hidden(handle.rank()) {
            Err(GraphError::NodeNotFound(NodeId(self.node_id(handle))))
        } else {
            Ok(())
        }
    }

    pub(crate) fn insert_node(
        &mut self,
        sequence: &[u8],
        id: u64,
        hidden: bool,
    ) -> Result<Handle> {
        if sequence.is_empty() {
            return Err(GraphError::EmptySequence);
        }
        if id == 0 || id > MAX_NODE_ID {
            return Err(GraphError::InvalidNodeId);
        }
        if self.nodes.has_id(id) {
            return Err(GraphError::NodeExists(NodeId(id)));
        }

        let rank = self.nodes.insert(id, hidden);
        self.sequences.append(sequence);
        self.edges.append_slot();
        self.occurrences.append_slot();

        Ok(Handle::pack(rank, false))
    }

    pub(crate) fn next_node_id(&self) -> Result<u64> {
        self.nodes.next_id().ok_or(GraphError::NodeIdsExhausted)
    }

    /// Remove every trace of a node from the indices and tombstone its
    /// rank. The node must have no edges or path steps left.
    pub(crate) fn remove_storage(&mut self, rank: usize) {
        let slot = self.nodes.slot(rank);
        self.sequences.remove(slot);
        self.edges.remove_slot(slot);
        self.occurrences.remove_slot(slot);
        self.nodes.tombstone(rank);
    }

    /// Remove a hidden node once its last path step is gone.
    pub(crate) fn reap_hidden(&mut self, rank: usize) {
        if !self.nodes.has_rank(rank) || !self.nodes.is_hidden(rank) {
            return;
        }
        let slot = self.nodes.slot(rank);
        if self.occurrences.slot_step_count(slot) == 0 {
            debug!("removing hidden node {}", self.nodes.get_id(rank));
            self.remove_storage(rank);
        }
    }

    /// The adjacency entries on the right side of `handle`.
    pub(crate) fn right_entries(&self, handle: Handle) -> Vec<EdgeEntry> {
        self.edges
            .right_list(handle.is_reverse())
            .entries(self.slot(handle), self.node_id(handle))
    }

    /// The handles on one side of `handle`.
    pub(crate) fn neighbors(&self, handle: Handle, dir: Direction) -> Vec<Handle> {
        match dir {
            Direction::Right => self
                .right_entries(handle)
                .into_iter()
                .filter_map(|e| self.handle_of(e.id, e.inverted))
                .collect(),
            Direction::Left => self
                .right_entries(handle.flip())
                .into_iter()
                .filter_map(|e| self.handle_of(e.id, !e.inverted))
                .collect(),
        }
    }

    /// The two adjacency entries that store the edge `left -> right`,
    /// as (list orientation, slot, owner ID, entry). The second entry
    /// is on the right side of `right.flip()`.
    fn edge_records(
        &self,
        left: Handle,
        right: Handle,
    ) -> [(bool, usize, u64, EdgeEntry); 2] {
        let left_id = self.node_id(left);
        let right_id = self.node_id(right);
        [
            (
                left.is_reverse(),
                self.slot(left),
                left_id,
                EdgeEntry {
                    id: right_id,
                    inverted: right.is_reverse(),
                },
            ),
            (
                !right.is_reverse(),
                self.slot(right),
                right_id,
                EdgeEntry {
                    id: left_id,
                    inverted: !left.is_reverse(),
                },
            ),
        ]
    }

    pub(crate) fn check_edge_encodable(&self, a: u64, b: u64) -> Result<()> {
        if encode_delta(a, b).is_some() {
            Ok(())
        } else {
            Err(GraphError::EdgeDeltaOverflow(NodeId(a), NodeId(b)))
        }
    }

    pub(crate) fn contains_edge(&self, left: Handle, right: Handle) -> bool {
        let [(rev, slot, id, entry), _] = self.edge_records(left, right);
        self.edges.right_list(rev).contains(slot, id, entry)
    }

    /// Whether both entries of `left -> right` are stored.
    pub(crate) fn edge_is_symmetric(&self, left: Handle, right: Handle) -> bool {
        self.edge_records(left, right)
            .iter()
            .all(|&(rev, slot, id, entry)| {
                self.edges.right_list(rev).contains(slot, id, entry)
            })
    }

    /// Store the edge `left -> right`, returning `false` if it already
    /// existed. The delta between the endpoints must be encodable.
    pub(crate) fn add_edge(&mut self, left: Handle, right: Handle) -> bool {
        if self.contains_edge(left, right) {
            return false;
        }
        let [first, second] = self.edge_records(left, right);

        let (rev, slot, id, entry) = first;
        self.edges.right_list_mut(rev).insert(slot, id, entry);
        if second != first {
            let (rev, slot, id, entry) = second;
            self.edges.right_list_mut(rev).insert(slot, id, entry);
        }

        self.edges.edge_count += 1;
        trace!("created edge {:?} -> {:?}", left, right);
        true
    }

    /// Remove the edge `left -> right`, returning `false` if it did
    /// not exist.
    pub(crate) fn remove_edge(&mut self, left: Handle, right: Handle) -> bool {
        let [first, second] = self.edge_records(left, right);

        let (rev, slot, id, entry) = first;
        if !self.edges.right_list_mut(rev).remove(slot, id, entry) {
            return false;
        }
        if second != first {
            let (rev, slot, id, entry) = second;
            self.edges.right_list_mut(rev).remove(slot, id, entry);
        }

        self.edges.edge_count -= 1;
        trace!("destroyed edge {:?} -> {:?}", left, right);
        true
    }

    /// Remove every edge on either side of a node.
    pub(crate) fn remove_incident_edges(&mut self, handle: Handle) {
        let fwd = handle.forward();
        for right in self.neighbors(fwd, Direction::Right) {
            self.remove_edge(fwd, right);
        }
        for left in self.neighbors(fwd, Direction::Left) {
            self.remove_edge(left, fwd);
        }
    }

    /// Check that the indices all store the same number of node
    /// records, and that each index is internally consistent.
    pub(crate) fn check_structure(&self) -> std::result::Result<(), String> {
        self.nodes.check()?;
        let slots = self.nodes.slot_count();

        let delimiters = [
            ("sequence", self.sequences.delimiter_count()),
            ("forward edge", self.edges.fwd.delimiter_count()),
            ("reverse edge", self.edges.rev.delimiter_count()),
            ("occurrence", self.occurrences.delimiter_count()),
        ];
        for (name, count) in delimiters.iter() {
            if *count != slots + 1 {
                return Err(format!(
                    "{} index has {} delimiters for {} nodes",
                    name, count, slots
                ));
            }
        }

        self.edges.fwd.check()?;
        self.edges.rev.check()?;
        self.occurrences.check()?;
        self.paths.check()?;

        let counts = self.occurrences.path_step_counts();
        let mut steps = 0;
        for path in self.paths.ids() {
            let length = self.paths.get(path).map(|m| m.length).unwrap_or(0);
            let stored = counts.get(&path).copied().unwrap_or(0);
            if length != stored {
                return Err(format!(
                    "path {} has length {} but {} stored steps",
                    path, length, stored
                ));
            }
            steps += stored;
        }
        if steps != self.occurrences.step_count() {
            return Err(format!(
                "{} stored steps belong to no path",
                self.occurrences.step_count() - steps
            ));
        }
        Ok(())
    }

    /// The position of a step, if its node and the step exist.
    fn find_step(&self, path: PathId, step: StepRef) -> Option<usize> {
        let rank = self.nodes.get_rank(step.id)?;
        self.occurrences.locate(self.nodes.slot(rank), path, step.rank)
    }

    /// Check that every adjacency entry and step link points to
    /// something stored, that edges are stored on both ends, and that
    /// each path's links lead from its first step to its last.
    ///
    /// Assumes `check_structure` passed; never panics otherwise.
    pub(crate) fn check_references(&self) -> std::result::Result<(), String> {
        let mut halves = 0;
        for slot in 0..self.nodes.slot_count() {
            let rank = self
                .nodes
                .rank_of_slot(slot)
                .ok_or_else(|| format!("slot {} has no rank", slot))?;
            let id = self.nodes.get_id(rank);

            for &is_reverse in [false, true].iter() {
                let handle = Handle::pack(rank, is_reverse);
                let list = self.edges.right_list(is_reverse);
                for entry in list.entries(slot, id) {
                    let other =
                        self.handle_of(entry.id, entry.inverted).ok_or_else(|| {
                            format!("edge from {} to missing node {}", id, entry.id)
                        })?;
                    if !self.edge_is_symmetric(handle, other) {
                        return Err(format!(
                            "edge {:?} -> {:?} is stored on one end only",
                            handle, other
                        ));
                    }
                    halves += if other == handle.flip() { 2 } else { 1 };
                }
            }

            let (start, end) = self.occurrences.run(slot);
            for pos in start..end {
                let path = self.occurrences.path_at(pos);
                if self.paths.get(path).is_none() {
                    return Err(format!("step at {} is on missing path {}", pos, path));
                }
                let links = [self.occurrences.prev_at(pos), self.occurrences.next_at(pos)];
                for link in links.iter() {
                    if let StepLink::Step(step) = *link {
                        if self.find_step(path, step).is_none() {
                            return Err(format!(
                                "step at {} links to missing step {:?}",
                                pos, step
                            ));
                        }
                    }
                }
            }
        }

        if halves != 2 * self.edges.edge_count {
            return Err(format!(
                "{} edges stored but the count is {}",
                halves / 2,
                self.edges.edge_count
            ));
        }

        for path in self.paths.ids() {
            let meta = match self.paths.get(path) {
                Some(meta) => meta,
                None => continue,
            };
            let mut prev = StepLink::Begin;
            let mut link = StepLink::from(meta.first);
            let mut steps = 0;
            while let StepLink::Step(step) = link {
                if steps == meta.length {
                    return Err(format!(
                        "path {} runs past its length {}",
                        path, meta.length
                    ));
                }
                let pos = self.find_step(path, step).ok_or_else(|| {
                    format!("path {} reaches missing step {:?}", path, step)
                })?;
                if self.occurrences.prev_at(pos) != prev {
                    return Err(format!(
                        "step {:?} of path {} does not link back",
                        step, path
                    ));
                }
                prev = link;
                link = self.occurrences.next_at(pos);
                steps += 1;
            }
            if link != StepLink::End || steps != meta.length || prev.step() != meta.last {
                return Err(format!("path {} does not end at its last step", path));
            }
        }
        Ok(())
    }
}
