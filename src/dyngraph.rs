use std::sync::atomic::{AtomicBool, Ordering};

use bstr::ByteSlice;
use rayon::prelude::*;

#[allow(unused_imports)]
use log::{debug, info, trace};

use crate::{
    error::{GraphError, Result},
    handle::{Direction, Edge, Handle, NodeId},
    handlegraph::{HandleGraph, Visit},
    mutablehandlegraph::MutableHandleGraph,
    pathhandlegraph::{
        MutablePathHandleGraph, OccurrenceHandle, PathHandleGraph, PathId,
        PathStep,
    },
    util::dna,
};

pub mod edges;
pub mod graph;
pub mod iter;
pub mod nodes;
pub mod occurrences;
pub mod paths;
pub mod sequence;
pub mod serialize;

#[cfg(test)]
mod quickcheck;

pub use self::{
    graph::DynGraph,
    iter::NodeHandles,
    serialize::{FORMAT_VERSION, MAGIC},
};

use self::{
    graph::PARALLEL_MIN_LEN,
    occurrences::{StepLink, StepRef},
};

impl HandleGraph for DynGraph {
    #[inline]
    fn has_node(&self, node_id: NodeId) -> bool {
        match self.nodes.get_rank(node_id.0) {
            Some(rank) => !self.nodes.is_hidden(rank),
            None => false,
        }
    }

    fn get_handle(&self, node_id: NodeId, is_reverse: bool) -> Result<Handle> {
        match self.nodes.get_rank(node_id.0) {
            Some(rank) if !self.nodes.is_hidden(rank) => {
                Ok(Handle::pack(rank, is_reverse))
            }
            _ => Err(GraphError::NodeNotFound(node_id)),
        }
    }

    #[inline]
    fn get_id(&self, handle: Handle) -> NodeId {
        NodeId(self.node_id(handle))
    }

    #[inline]
    fn get_length(&self, handle: Handle) -> usize {
        self.sequences.length(self.slot(handle))
    }

    fn get_sequence(&self, handle: Handle) -> Vec<u8> {
        self.sequences
            .get_oriented(self.slot(handle), handle.is_reverse())
    }

    fn get_base(&self, handle: Handle, index: usize) -> u8 {
        let slot = self.slot(handle);
        if handle.is_reverse() {
            let len = self.sequences.length(slot);
            dna::comp_base(self.sequences.get_base(slot, len - 1 - index))
        } else {
            self.sequences.get_base(slot, index)
        }
    }

    fn follow_edges<F>(&self, handle: Handle, dir: Direction, mut f: F) -> bool
    where
        F: FnMut(Handle) -> Visit,
    {
        for next in self.neighbors(handle, dir) {
            if f(next).is_stop() {
                return false;
            }
        }
        true
    }

    fn for_each_handle<F>(&self, parallel: bool, f: F) -> bool
    where
        F: Fn(Handle) -> Visit + Sync + Send,
    {
        if !parallel {
            for handle in self.handles() {
                if f(handle).is_stop() {
                    return false;
                }
            }
            return true;
        }

        let stopped = AtomicBool::new(false);
        (0..self.nodes.rank_count())
            .into_par_iter()
            .with_min_len(PARALLEL_MIN_LEN)
            .for_each(|rank| {
                if stopped.load(Ordering::Relaxed)
                    || !self.nodes.is_visible(rank)
                {
                    return;
                }
                if f(Handle::pack(rank, false)).is_stop() {
                    stopped.store(true, Ordering::Relaxed);
                }
            });
        !stopped.load(Ordering::Relaxed)
    }

    /// Each edge is reported from the endpoint with the smaller ID.
    /// Self-loops are reported from the right side of the forward
    /// handle, except `X- -> X+`, which is only on the left side.
    fn for_each_edge<F>(&self, mut f: F) -> bool
    where
        F: FnMut(Edge) -> Visit,
    {
        for handle in self.handles() {
            let id = self.node_id(handle);

            for next in self.neighbors(handle, Direction::Right) {
                if id <= self.node_id(next)
                    && f(Edge::edge_handle(handle, next)).is_stop()
                {
                    return false;
                }
            }

            for prev in self.neighbors(handle, Direction::Left) {
                if (id < self.node_id(prev) || prev == handle.flip())
                    && f(Edge::edge_handle(prev, handle)).is_stop()
                {
                    return false;
                }
            }
        }
        true
    }

    #[inline]
    fn node_size(&self) -> usize {
        self.nodes.node_count()
    }

    #[inline]
    fn edge_count(&self) -> usize {
        self.edges.edge_count
    }

    fn total_length(&self) -> usize {
        let hidden: usize = self
            .nodes
            .hidden_ranks()
            .map(|rank| self.sequences.length(self.nodes.slot(rank)))
            .sum();
        self.sequences.total_length() - hidden
    }

    #[inline]
    fn min_node_id(&self) -> NodeId {
        NodeId(self.nodes.min_id())
    }

    #[inline]
    fn max_node_id(&self) -> NodeId {
        NodeId(self.nodes.max_id())
    }

    fn get_degree(&self, handle: Handle, dir: Direction) -> usize {
        let handle = match dir {
            Direction::Right => handle,
            Direction::Left => handle.flip(),
        };
        self.edges
            .right_list(handle.is_reverse())
            .degree(self.slot(handle))
    }

    fn has_edge(&self, left: Handle, right: Handle) -> bool {
        self.nodes.has_rank(left.rank())
            && self.nodes.has_rank(right.rank())
            && self.contains_edge(left, right)
    }
}

impl MutableHandleGraph for DynGraph {
    fn create_handle(&mut self, sequence: &[u8]) -> Result<Handle> {
        let id = self.next_node_id()?;
        self.insert_node(sequence, id, false)
    }

    fn create_handle_with_id(
        &mut self,
        sequence: &[u8],
        id: NodeId,
    ) -> Result<Handle> {
        self.insert_node(sequence, id.0, false)
    }

    fn create_hidden_handle(&mut self, sequence: &[u8]) -> Result<Handle> {
        let id = self.next_node_id()?;
        self.insert_node(sequence, id, true)
    }

    fn destroy_handle(&mut self, handle: Handle) -> Result<()> {
        self.check_visible(handle)?;
        let rank = handle.rank();

        self.remove_incident_edges(handle);

        if self.occurrences.slot_step_count(self.slot(handle)) > 0 {
            debug!("hiding node {} with path steps", self.node_id(handle));
            self.nodes.hide(rank);
        } else {
            trace!("destroying node {}", self.node_id(handle));
            self.remove_storage(rank);
        }
        Ok(())
    }

    fn create_edge(&mut self, left: Handle, right: Handle) -> Result<()> {
        self.check_visible(left)?;
        self.check_visible(right)?;
        self.check_edge_encodable(self.node_id(left), self.node_id(right))?;
        self.add_edge(left, right);
        Ok(())
    }

    fn destroy_edge(&mut self, left: Handle, right: Handle) -> Result<()> {
        self.check_visible(left)?;
        self.check_visible(right)?;
        self.remove_edge(left, right);
        Ok(())
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.sequences.clear();
        self.edges.clear();
        self.occurrences.clear();
        self.paths.clear();
        debug!("cleared graph");
    }

    fn swap_handles(&mut self, a: Handle, b: Handle) -> Result<()> {
        self.check_handle(a)?;
        self.check_handle(b)?;
        if a.rank() == b.rank() {
            return Ok(());
        }

        let (slot_a, slot_b) = (self.slot(a), self.slot(b));
        self.nodes.swap(a.rank(), b.rank());

        let seq_a = self.sequences.get(slot_a);
        let seq_b = self.sequences.get(slot_b);
        self.sequences.replace(slot_a, &seq_b);
        self.sequences.replace(slot_b, &seq_a);

        self.edges.swap_slots(slot_a, slot_b);
        self.occurrences.swap_slots(slot_a, slot_b);

        trace!("swapped ranks {} and {}", a.rank(), b.rank());
        Ok(())
    }

    fn apply_orientation(&mut self, handle: Handle) -> Result<Handle> {
        self.check_visible(handle)?;
        if !handle.is_reverse() {
            return Ok(handle);
        }

        let slot = self.slot(handle);
        let id = self.node_id(handle);

        let flipped = self.sequences.get_oriented(slot, true);
        self.sequences.replace(slot, &flipped);

        self.edges.swap_sides(slot);

        // every entry pointing at this node now sees the other side
        let mut neighbor_ids = self
            .edges
            .fwd
            .entries(slot, id)
            .into_iter()
            .chain(self.edges.rev.entries(slot, id))
            .map(|entry| entry.id)
            .collect::<Vec<_>>();
        neighbor_ids.sort_unstable();
        neighbor_ids.dedup();

        for other in neighbor_ids {
            if let Some(rank) = self.nodes.get_rank(other) {
                let other_slot = self.nodes.slot(rank);
                self.edges.fwd.flip_inversions_to(other_slot, other, id);
                self.edges.rev.flip_inversions_to(other_slot, other, id);
            }
        }

        self.occurrences.flip_orientations(slot);

        debug!("reoriented node {}", id);
        Ok(handle.flip())
    }

    fn divide_handle(
        &mut self,
        handle: Handle,
        offsets: &[usize],
    ) -> Result<Vec<Handle>> {
        self.check_visible(handle)?;
        let length = self.get_length(handle);

        let in_bounds = offsets.iter().all(|&o| o > 0 && o < length);
        let increasing = offsets.windows(2).all(|w| w[0] < w[1]);
        if !in_bounds || !increasing {
            return Err(GraphError::InvalidOffsets {
                offsets: offsets.to_vec(),
                length,
            });
        }
        if offsets.is_empty() {
            return Ok(vec![handle]);
        }

        let fwd = handle.forward();
        let slot = self.slot(fwd);
        let id = self.node_id(fwd);

        let fwd_offsets = if handle.is_reverse() {
            offsets.iter().rev().map(|&o| length - o).collect::<Vec<_>>()
        } else {
            offsets.to_vec()
        };

        let sequence = self.sequences.get(slot);
        let mut pieces = Vec::with_capacity(fwd_offsets.len() + 1);
        let mut start = 0;
        for &end in fwd_offsets.iter().chain(std::iter::once(&length)) {
            pieces.push(sequence[start..end].to_vec());
            start = end;
        }

        let first_new = self.next_node_id()?;
        let last_new = first_new
            .checked_add(pieces.len() as u64 - 2)
            .filter(|&id| id <= nodes::MAX_NODE_ID)
            .ok_or(GraphError::NodeIdsExhausted)?;

        let right_neighbors = self.neighbors(fwd, Direction::Right);
        let left_neighbors = self.neighbors(fwd, Direction::Left);

        self.check_edge_encodable(id, first_new)?;
        for &other in right_neighbors.iter().chain(left_neighbors.iter()) {
            let other_id = if other.rank() == fwd.rank() {
                last_new
            } else {
                self.node_id(other)
            };
            self.check_edge_encodable(id, other_id)?;
            self.check_edge_encodable(last_new, other_id)?;
        }

        for &right in right_neighbors.iter() {
            self.remove_edge(fwd, right);
        }
        for &left in left_neighbors.iter() {
            self.remove_edge(left, fwd);
        }

        self.sequences.replace(slot, &pieces[0]);
        let mut fwd_pieces = Vec::with_capacity(pieces.len());
        fwd_pieces.push(fwd);
        for piece in pieces[1..].iter() {
            let new_id = self.next_node_id()?;
            fwd_pieces.push(self.insert_node(piece, new_id, false)?);
        }

        for pair in fwd_pieces.windows(2) {
            self.add_edge(pair[0], pair[1]);
        }

        let first = fwd;
        let last = fwd_pieces[fwd_pieces.len() - 1];

        // the divided node's sides are now on different pieces
        let as_source = |h: Handle| {
            if h.rank() != fwd.rank() {
                h
            } else if h.is_reverse() {
                first.flip()
            } else {
                last
            }
        };
        let as_target = |h: Handle| {
            if h.rank() != fwd.rank() {
                h
            } else if h.is_reverse() {
                last.flip()
            } else {
                first
            }
        };

        for &right in right_neighbors.iter() {
            self.add_edge(last, as_target(right));
        }
        for &left in left_neighbors.iter() {
            self.add_edge(as_source(left), first);
        }

        let steps = {
            let (start, end) = self.occurrences.run(slot);
            (start..end)
                .map(|pos| {
                    let (path, step) = self.step_at(pos);
                    (path, step, self.occurrences.is_reverse_at(pos))
                })
                .collect::<Vec<_>>()
        };

        for (path, step, is_reverse) in steps {
            if is_reverse {
                let mut right = step;
                for &piece in fwd_pieces[1..].iter() {
                    let prev = self.prev_link(path, right);
                    right = self.insert_step_between(
                        path,
                        prev,
                        StepLink::Step(right),
                        piece.flip(),
                    );
                }
            } else {
                let mut left = step;
                for &piece in fwd_pieces[1..].iter() {
                    let next = self.next_link(path, left);
                    left = self.insert_step_between(
                        path,
                        StepLink::Step(left),
                        next,
                        piece,
                    );
                }
            }
        }

        debug!("divided node {} into {} pieces", id, fwd_pieces.len());

        if handle.is_reverse() {
            Ok(fwd_pieces.into_iter().rev().map(Handle::flip).collect())
        } else {
            Ok(fwd_pieces)
        }
    }

    fn for_each_handle_mut<F>(&mut self, mut f: F) -> bool
    where
        F: FnMut(&mut Self, Handle) -> Visit,
    {
        let mut rank = 0;
        while rank < self.nodes.rank_count() {
            if self.nodes.is_visible(rank)
                && f(self, Handle::pack(rank, false)).is_stop()
            {
                return false;
            }
            rank += 1;
        }
        true
    }
}

impl DynGraph {
    /// The step of `path` that `occurrence` refers to.
    fn step_in_path(
        &self,
        path: PathId,
        occurrence: OccurrenceHandle,
    ) -> Result<StepRef> {
        let pos = self
            .occurrence_position(occurrence)
            .ok_or(GraphError::InvalidOccurrence(occurrence))?;
        let (step_path, step) = self.step_at(pos);
        if step_path != path {
            return Err(GraphError::NotAdjacent(path));
        }
        Ok(step)
    }
}

impl PathHandleGraph for DynGraph {
    #[inline]
    fn has_path(&self, name: &[u8]) -> bool {
        self.paths.by_name(name).is_some()
    }

    fn get_path_handle(&self, name: &[u8]) -> Result<PathId> {
        self.paths
            .by_name(name)
            .ok_or_else(|| GraphError::PathNameNotFound(name.into()))
    }

    fn get_path_name(&self, path: PathId) -> Result<&[u8]> {
        Ok(self.path_meta(path)?.name.as_slice())
    }

    fn get_occurrence_count(&self, path: PathId) -> Result<usize> {
        Ok(self.path_meta(path)?.length)
    }

    #[inline]
    fn get_path_count(&self) -> usize {
        self.paths.path_count()
    }

    fn for_each_path_handle<F>(&self, mut f: F) -> bool
    where
        F: FnMut(PathId) -> Visit,
    {
        for path in self.paths.ids() {
            if f(path).is_stop() {
                return false;
            }
        }
        true
    }

    fn occurrences_of_handle(
        &self,
        handle: Handle,
        match_orientation: bool,
    ) -> Vec<OccurrenceHandle> {
        let (start, end) = self.occurrences.run(self.slot(handle));
        (start..end)
            .filter(|&pos| {
                !match_orientation
                    || self.occurrences.is_reverse_at(pos) == handle.is_reverse()
            })
            .map(|pos| OccurrenceHandle::new(handle.rank(), pos - start))
            .collect()
    }

    fn for_each_occurrence_on_handle<F>(&self, handle: Handle, mut f: F) -> bool
    where
        F: FnMut(OccurrenceHandle) -> Visit,
    {
        for occ in self.occurrences_of_handle(handle, false) {
            if f(occ).is_stop() {
                return false;
            }
        }
        true
    }

    #[inline]
    fn get_handle_occurrence_count(&self, handle: Handle) -> usize {
        self.occurrences.slot_step_count(self.slot(handle))
    }

    fn get_occurrence(&self, occurrence: OccurrenceHandle) -> Handle {
        let pos = self.expect_occurrence(occurrence);
        Handle::pack(occurrence.rank(), self.occurrences.is_reverse_at(pos))
    }

    fn get_path_handle_of_occurrence(
        &self,
        occurrence: OccurrenceHandle,
    ) -> PathId {
        self.occurrences.path_at(self.expect_occurrence(occurrence))
    }

    fn get_first_occurrence(&self, path: PathId) -> Result<OccurrenceHandle> {
        let first = self.path_meta(path)?.first;
        let step = first.ok_or(GraphError::EmptyPath(path))?;
        Ok(self.occurrence_of(path, step))
    }

    fn get_last_occurrence(&self, path: PathId) -> Result<OccurrenceHandle> {
        let last = self.path_meta(path)?.last;
        let step = last.ok_or(GraphError::EmptyPath(path))?;
        Ok(self.occurrence_of(path, step))
    }

    fn get_next_occurrence(
        &self,
        occurrence: OccurrenceHandle,
    ) -> Option<OccurrenceHandle> {
        let pos = self.expect_occurrence(occurrence);
        let path = self.occurrences.path_at(pos);
        let next = self.occurrences.next_at(pos).step()?;
        Some(self.occurrence_of(path, next))
    }

    fn get_previous_occurrence(
        &self,
        occurrence: OccurrenceHandle,
    ) -> Option<OccurrenceHandle> {
        let pos = self.expect_occurrence(occurrence);
        let path = self.occurrences.path_at(pos);
        let prev = self.occurrences.prev_at(pos).step()?;
        Some(self.occurrence_of(path, prev))
    }
}

impl MutablePathHandleGraph for DynGraph {
    fn create_path_handle(&mut self, name: &[u8]) -> Result<PathId> {
        let path = self.paths.create(name)?;
        debug!("created path {} ({})", path, name.as_bstr());
        Ok(path)
    }

    fn destroy_path(&mut self, path: PathId) -> Result<()> {
        self.remove_path_steps(path)
    }

    fn append_occurrence(
        &mut self,
        path: PathId,
        handle: Handle,
    ) -> Result<OccurrenceHandle> {
        let last = self.path_meta(path)?.last;
        self.check_handle(handle)?;
        let prev = last.map_or(StepLink::Begin, StepLink::Step);
        let step = self.insert_step_between(path, prev, StepLink::End, handle);
        Ok(self.occurrence_of(path, step))
    }

    fn prepend_occurrence(
        &mut self,
        path: PathId,
        handle: Handle,
    ) -> Result<OccurrenceHandle> {
        let first = self.path_meta(path)?.first;
        self.check_handle(handle)?;
        let next = StepLink::from(first);
        let step =
            self.insert_step_between(path, StepLink::Begin, next, handle);
        Ok(self.occurrence_of(path, step))
    }

    fn insert_occurrence(
        &mut self,
        path: PathId,
        before: PathStep,
        after: PathStep,
        handle: Handle,
    ) -> Result<OccurrenceHandle> {
        self.path_meta(path)?;
        self.check_handle(handle)?;

        let prev = match before {
            PathStep::Before => StepLink::Begin,
            PathStep::Step(occ) => StepLink::Step(self.step_in_path(path, occ)?),
            PathStep::After => return Err(GraphError::NotAdjacent(path)),
        };
        let next = match after {
            PathStep::After => StepLink::End,
            PathStep::Step(occ) => StepLink::Step(self.step_in_path(path, occ)?),
            PathStep::Before => return Err(GraphError::NotAdjacent(path)),
        };
        if self.link_after(path, prev) != next {
            return Err(GraphError::NotAdjacent(path));
        }

        let step = self.insert_step_between(path, prev, next, handle);
        Ok(self.occurrence_of(path, step))
    }

    fn set_occurrence(
        &mut self,
        occurrence: OccurrenceHandle,
        handle: Handle,
    ) -> Result<OccurrenceHandle> {
        let mut replaced = self.replace_occurrence(occurrence, &[handle])?;
        replaced
            .pop()
            .ok_or_else(|| GraphError::Invariant("replacement vanished".into()))
    }

    fn replace_occurrence(
        &mut self,
        occurrence: OccurrenceHandle,
        handles: &[Handle],
    ) -> Result<Vec<OccurrenceHandle>> {
        let pos = self
            .occurrence_position(occurrence)
            .ok_or(GraphError::InvalidOccurrence(occurrence))?;
        for &handle in handles {
            self.check_handle(handle)?;
        }

        let (path, step) = self.step_at(pos);
        let new_steps = self.replace_step(path, step, handles);
        Ok(new_steps
            .into_iter()
            .map(|step| self.occurrence_of(path, step))
            .collect())
    }
}
