use bstr::BString;
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use succinct::SpaceUsage;

#[allow(unused_imports)]
use log::{debug, trace};

use crate::{
    error::{GraphError, Result},
    handle::Handle,
    pathhandlegraph::{OccurrenceHandle, PathId},
};

use super::{
    graph::DynGraph,
    occurrences::{StepLink, StepRef},
};

/// Name, length, and ends of a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMetadata {
    pub(crate) name: Vec<u8>,
    pub(crate) length: usize,
    pub(crate) first: Option<StepRef>,
    pub(crate) last: Option<StepRef>,
}

impl PathMetadata {
    fn new(name: &[u8]) -> Self {
        Self {
            name: name.to_vec(),
            length: 0,
            first: None,
            last: None,
        }
    }
}

/// Path metadata indexed by path ID, plus the name lookup.
///
/// `paths[i]` holds the path with ID `base + i`. Destroyed paths leave
/// a `None` behind, and clearing the table moves `base` past every ID
/// handed out so far, so the next path ID is always `base` plus the
/// length of `paths`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathTable {
    paths: Vec<Option<PathMetadata>>,
    names: FnvHashMap<Vec<u8>, PathId>,
    path_count: usize,
    base: u64,
}

impl SpaceUsage for PathTable {
    #[inline]
    fn is_stack_only() -> bool {
        false
    }

    fn heap_bytes(&self) -> usize {
        let meta_size = std::mem::size_of::<Option<PathMetadata>>();
        let name_bytes: usize =
            self.names.keys().map(|name| 2 * name.capacity()).sum();
        let entry = std::mem::size_of::<(Vec<u8>, PathId)>();
        self.paths.capacity() * meta_size
            + self.names.capacity() * entry
            + name_bytes
    }
}

impl PathTable {
    #[inline]
    pub fn path_count(&self) -> usize {
        self.path_count
    }

    #[inline]
    pub fn next_id(&self) -> u64 {
        self.base + self.paths.len() as u64
    }

    #[inline]
    fn index(&self, path: PathId) -> Option<usize> {
        let offset = path.as_integer().checked_sub(self.base)?;
        Some(offset as usize)
    }

    pub fn create(&mut self, name: &[u8]) -> Result<PathId> {
        if self.names.contains_key(name) {
            return Err(GraphError::PathExists(BString::from(name)));
        }
        let id = PathId::new(self.next_id());
        self.paths.push(Some(PathMetadata::new(name)));
        self.names.insert(name.to_vec(), id);
        self.path_count += 1;
        Ok(id)
    }

    #[inline]
    pub fn get(&self, path: PathId) -> Option<&PathMetadata> {
        self.paths.get(self.index(path)?)?.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, path: PathId) -> Option<&mut PathMetadata> {
        let index = self.index(path)?;
        self.paths.get_mut(index)?.as_mut()
    }

    #[inline]
    pub fn by_name(&self, name: &[u8]) -> Option<PathId> {
        self.names.get(name).copied()
    }

    pub fn remove(&mut self, path: PathId) -> Option<PathMetadata> {
        let index = self.index(path)?;
        let meta = self.paths.get_mut(index)?.take()?;
        self.names.remove(&meta.name);
        self.path_count -= 1;
        Some(meta)
    }

    /// The IDs of the live paths, in increasing order.
    pub fn ids(&self) -> impl Iterator<Item = PathId> + '_ {
        let base = self.base;
        self.paths
            .iter()
            .enumerate()
            .filter(|(_, meta)| meta.is_some())
            .map(move |(ix, _)| PathId::new(base + ix as u64))
    }

    /// Remove every path. IDs handed out before are not reused.
    pub fn clear(&mut self) {
        let base = self.next_id();
        *self = Self {
            base,
            ..Self::default()
        };
    }

    pub fn check(&self) -> std::result::Result<(), String> {
        let live = self.paths.iter().filter(|m| m.is_some()).count();
        if live != self.path_count || self.names.len() != self.path_count {
            return Err(format!(
                "{} paths, {} names, but the count is {}",
                live,
                self.names.len(),
                self.path_count
            ));
        }
        for (name, &id) in self.names.iter() {
            match self.get(id) {
                Some(meta) if &meta.name == name => (),
                _ => {
                    return Err(format!(
                        "path name {} does not match path {}",
                        BString::from(name.as_slice()),
                        id
                    ))
                }
            }
        }
        Ok(())
    }
}

/// Step bookkeeping shared by the path operations.
///
/// Steps refer to each other by `StepRef`, i.e. node ID and per-path
/// rank on that node, so these helpers translate between `StepRef`s,
/// positions in the occurrence index, and `OccurrenceHandle`s.
impl DynGraph {
    pub(crate) fn path_meta(&self, path: PathId) -> Result<&PathMetadata> {
        self.paths.get(path).ok_or(GraphError::PathNotFound(path))
    }

    fn path_meta_mut(&mut self, path: PathId) -> &mut PathMetadata {
        match self.paths.get_mut(path) {
            Some(meta) => meta,
            None => panic!("path {} does not exist", path),
        }
    }

    fn rank_of_id(&self, id: u64) -> usize {
        match self.nodes.get_rank(id) {
            Some(rank) => rank,
            None => panic!("path step on missing node {}", id),
        }
    }

    /// The position of a step in the occurrence index.
    pub(crate) fn step_position(&self, path: PathId, step: StepRef) -> usize {
        let slot = self.nodes.slot(self.rank_of_id(step.id));
        match self.occurrences.locate(slot, path, step.rank) {
            Some(pos) => pos,
            None => panic!("path {} has no step {:?}", path, step),
        }
    }

    /// The position of an occurrence in the occurrence index, if the
    /// occurrence exists.
    pub(crate) fn occurrence_position(
        &self,
        occurrence: OccurrenceHandle,
    ) -> Option<usize> {
        if !self.nodes.has_rank(occurrence.rank()) {
            return None;
        }
        let slot = self.nodes.slot(occurrence.rank());
        let (start, end) = self.occurrences.run(slot);
        let pos = start + occurrence.index();
        if pos < end {
            Some(pos)
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn expect_occurrence(&self, occurrence: OccurrenceHandle) -> usize {
        match self.occurrence_position(occurrence) {
            Some(pos) => pos,
            None => panic!("occurrence {:?} does not exist", occurrence),
        }
    }

    /// The path and `StepRef` of the occurrence at `pos`.
    pub(crate) fn step_at(&self, pos: usize) -> (PathId, StepRef) {
        let slot = self.occurrences.slot_of(pos);
        let rank = match self.nodes.rank_of_slot(slot) {
            Some(rank) => rank,
            None => panic!("step at {} is on an empty slot", pos),
        };
        let step = StepRef {
            id: self.nodes.get_id(rank),
            rank: self.occurrences.path_rank(slot, pos),
        };
        (self.occurrences.path_at(pos), step)
    }

    pub(crate) fn occurrence_of(
        &self,
        path: PathId,
        step: StepRef,
    ) -> OccurrenceHandle {
        let rank = self.rank_of_id(step.id);
        let slot = self.nodes.slot(rank);
        let pos = self.step_position(path, step);
        let (start, _) = self.occurrences.run(slot);
        OccurrenceHandle::new(rank, pos - start)
    }

    #[inline]
    pub(crate) fn next_link(&self, path: PathId, step: StepRef) -> StepLink {
        self.occurrences.next_at(self.step_position(path, step))
    }

    #[inline]
    pub(crate) fn prev_link(&self, path: PathId, step: StepRef) -> StepLink {
        self.occurrences.prev_at(self.step_position(path, step))
    }

    /// What follows `link` in `path`; the first step for `Begin`.
    pub(crate) fn link_after(&self, path: PathId, link: StepLink) -> StepLink {
        match link {
            StepLink::Begin => StepLink::from(self.path_meta_ref(path).first),
            StepLink::Step(s) => self.next_link(path, s),
            StepLink::End => StepLink::End,
        }
    }

    fn path_meta_ref(&self, path: PathId) -> &PathMetadata {
        match self.paths.get(path) {
            Some(meta) => meta,
            None => panic!("path {} does not exist", path),
        }
    }

    /// Make `next` follow `prev` in `path`. Either may be a path end,
    /// in which case the path's first or last step is updated.
    pub(crate) fn link_steps(
        &mut self,
        path: PathId,
        prev: StepLink,
        next: StepLink,
    ) {
        match prev {
            StepLink::Step(p) => {
                let pos = self.step_position(path, p);
                self.occurrences.set_next_at(pos, next);
            }
            _ => self.path_meta_mut(path).first = next.step(),
        }
        match next {
            StepLink::Step(n) => {
                let pos = self.step_position(path, n);
                self.occurrences.set_prev_at(pos, prev);
            }
            _ => self.path_meta_mut(path).last = prev.step(),
        }
    }

    /// Add an unlinked step of `path` on the node of `handle`.
    fn create_step(&mut self, path: PathId, handle: Handle) -> StepRef {
        let slot = self.nodes.slot(handle.rank());
        let (_, rank) =
            self.occurrences
                .append_step(slot, path, handle.is_reverse());
        StepRef {
            id: self.nodes.get_id(handle.rank()),
            rank,
        }
    }

    /// Add a step traversing `handle` between two adjacent positions
    /// of `path`.
    pub(crate) fn insert_step_between(
        &mut self,
        path: PathId,
        prev: StepLink,
        next: StepLink,
        handle: Handle,
    ) -> StepRef {
        let step = self.create_step(path, handle);
        self.link_steps(path, prev, StepLink::Step(step));
        self.link_steps(path, StepLink::Step(step), next);
        self.path_meta_mut(path).length += 1;
        trace!("added step {:?} to path {}", step, path);
        step
    }

    /// Replace a step with a chain of new steps, returning the new
    /// steps. The old step is removed, and if it was the last step on
    /// a hidden node, so is the node.
    pub(crate) fn replace_step(
        &mut self,
        path: PathId,
        step: StepRef,
        handles: &[Handle],
    ) -> Vec<StepRef> {
        let prev = self.prev_link(path, step);
        let next = self.next_link(path, step);

        let mut left = prev;
        let mut new_steps = Vec::with_capacity(handles.len());
        for &handle in handles {
            let new_step = self.create_step(path, handle);
            self.link_steps(path, left, StepLink::Step(new_step));
            left = StepLink::Step(new_step);
            new_steps.push(new_step);
        }
        self.link_steps(path, left, next);

        let meta = self.path_meta_mut(path);
        meta.length = meta.length + handles.len() - 1;

        self.delete_step(path, step);

        // new steps on the same node were stored after the old one
        for new_step in new_steps.iter_mut() {
            if new_step.id == step.id && new_step.rank > step.rank {
                new_step.rank -= 1;
            }
        }
        new_steps
    }

    /// Physically remove a step that nothing links to anymore, then
    /// fix the references to the later steps of the same path on the
    /// same node, whose ranks drop by one.
    fn delete_step(&mut self, path: PathId, step: StepRef) {
        let rank = self.rank_of_id(step.id);
        let slot = self.nodes.slot(rank);
        let pos = self.step_position(path, step);
        self.occurrences.remove_step(pos);

        let removed = step.rank;
        let adjust = |s: StepRef| {
            if s.id == step.id && s.rank > removed {
                StepRef {
                    id: s.id,
                    rank: s.rank - 1,
                }
            } else {
                s
            }
        };

        let mut next_updates = Vec::new();
        let mut prev_updates = Vec::new();
        for (pos, r) in self.occurrences.steps_of_path(slot, path) {
            if r < removed {
                continue;
            }
            let moved = StepRef { id: step.id, rank: r };
            if let StepLink::Step(p) = self.occurrences.prev_at(pos) {
                next_updates.push((adjust(p), moved));
            }
            if let StepLink::Step(n) = self.occurrences.next_at(pos) {
                prev_updates.push((adjust(n), moved));
            }
        }

        for (target, moved) in next_updates {
            let pos = self.step_position(path, target);
            self.occurrences.set_next_at(pos, StepLink::Step(moved));
        }
        for (target, moved) in prev_updates {
            let pos = self.step_position(path, target);
            self.occurrences.set_prev_at(pos, StepLink::Step(moved));
        }

        let meta = self.path_meta_mut(path);
        meta.first = meta.first.map(adjust);
        meta.last = meta.last.map(adjust);

        self.reap_hidden(rank);
    }

    /// Remove every step of `path` along with its metadata.
    pub(crate) fn remove_path_steps(&mut self, path: PathId) -> Result<()> {
        let mut link = StepLink::from(self.path_meta(path)?.first);
        let mut positions = Vec::new();
        while let StepLink::Step(step) = link {
            let pos = self.step_position(path, step);
            positions.push(pos);
            link = self.occurrences.next_at(pos);
        }
        positions.sort_unstable();

        let mut ranks = positions
            .iter()
            .filter_map(|&pos| {
                self.nodes.rank_of_slot(self.occurrences.slot_of(pos))
            })
            .collect::<Vec<_>>();
        ranks.dedup();

        for &pos in positions.iter().rev() {
            self.occurrences.remove_step(pos);
        }
        self.paths.remove(path);

        for rank in ranks {
            self.reap_hidden(rank);
        }

        debug!("removed path {} with {} steps", path, positions.len());
        Ok(())
    }
}
