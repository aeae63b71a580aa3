use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    handle::Handle,
    handlegraph::{HandleGraph, Visit},
};

/// Identifies a path in a graph. Path IDs are handed out in
/// increasing order and never reused, even after the path is
/// destroyed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[repr(transparent)]
pub struct PathId(u64);

impl PathId {
    #[inline]
    pub(crate) fn new(id: u64) -> Self {
        PathId(id)
    }

    #[inline]
    pub fn as_integer(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PathId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One step of a path, identified by the node it is on and its
/// position among that node's occurrences.
///
/// Removing an occurrence from a node shifts the positions of the
/// occurrences stored after it on the same node, so occurrence handles
/// on a node should not be held across removals on that node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OccurrenceHandle {
    rank: usize,
    index: usize,
}

impl OccurrenceHandle {
    #[inline]
    pub(crate) fn new(rank: usize, index: usize) -> Self {
        OccurrenceHandle { rank, index }
    }

    #[inline]
    pub(crate) fn rank(&self) -> usize {
        self.rank
    }

    #[inline]
    pub(crate) fn index(&self) -> usize {
        self.index
    }
}

/// A position in a path, including the two ends beyond its first
/// and last occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathStep {
    Before,
    Step(OccurrenceHandle),
    After,
}

/// Immutable access to the paths embedded in a graph.
///
/// Occurrence handles that were not produced by the graph being
/// queried are a caller bug, and the query methods may panic on them.
pub trait PathHandleGraph: HandleGraph {
    fn has_path(&self, name: &[u8]) -> bool;

    fn get_path_handle(&self, name: &[u8]) -> Result<PathId>;

    fn get_path_name(&self, path: PathId) -> Result<&[u8]>;

    /// The number of occurrences in `path`.
    fn get_occurrence_count(&self, path: PathId) -> Result<usize>;

    fn is_empty_path(&self, path: PathId) -> Result<bool> {
        Ok(self.get_occurrence_count(path)? == 0)
    }

    fn get_path_count(&self) -> usize;

    fn for_each_path_handle<F>(&self, f: F) -> bool
    where
        F: FnMut(PathId) -> Visit;

    /// The occurrences of all paths on the node of `handle`. With
    /// `match_orientation`, only the occurrences that traverse the
    /// node in the orientation of `handle` are returned.
    fn occurrences_of_handle(
        &self,
        handle: Handle,
        match_orientation: bool,
    ) -> Vec<OccurrenceHandle>;

    fn for_each_occurrence_on_handle<F>(&self, handle: Handle, f: F) -> bool
    where
        F: FnMut(OccurrenceHandle) -> Visit;

    fn get_handle_occurrence_count(&self, handle: Handle) -> usize;

    /// The handle an occurrence traverses.
    fn get_occurrence(&self, occurrence: OccurrenceHandle) -> Handle;

    fn get_path_handle_of_occurrence(
        &self,
        occurrence: OccurrenceHandle,
    ) -> PathId;

    fn get_first_occurrence(&self, path: PathId) -> Result<OccurrenceHandle>;

    fn get_last_occurrence(&self, path: PathId) -> Result<OccurrenceHandle>;

    #[inline]
    fn path_front_end(&self, _path: PathId) -> PathStep {
        PathStep::Before
    }

    #[inline]
    fn path_back_end(&self, _path: PathId) -> PathStep {
        PathStep::After
    }

    fn get_next_occurrence(
        &self,
        occurrence: OccurrenceHandle,
    ) -> Option<OccurrenceHandle>;

    fn get_previous_occurrence(
        &self,
        occurrence: OccurrenceHandle,
    ) -> Option<OccurrenceHandle>;

    #[inline]
    fn has_next_occurrence(&self, occurrence: OccurrenceHandle) -> bool {
        self.get_next_occurrence(occurrence).is_some()
    }

    #[inline]
    fn has_previous_occurrence(&self, occurrence: OccurrenceHandle) -> bool {
        self.get_previous_occurrence(occurrence).is_some()
    }

    /// The zero-based position of an occurrence in its path.
    fn get_ordinal_rank_of_occurrence(
        &self,
        occurrence: OccurrenceHandle,
    ) -> usize {
        let mut rank = 0;
        let mut current = occurrence;
        while let Some(prev) = self.get_previous_occurrence(current) {
            rank += 1;
            current = prev;
        }
        rank
    }

    /// Visit the occurrences of `path` from first to last.
    fn for_each_occurrence_in_path<F>(&self, path: PathId, mut f: F) -> Result<bool>
    where
        F: FnMut(OccurrenceHandle) -> Visit,
    {
        if self.is_empty_path(path)? {
            return Ok(true);
        }
        let mut current = Some(self.get_first_occurrence(path)?);
        while let Some(occ) = current {
            if f(occ).is_stop() {
                return Ok(false);
            }
            current = self.get_next_occurrence(occ);
        }
        Ok(true)
    }
}

/// Creating, editing, and removing the paths embedded in a graph.
pub trait MutablePathHandleGraph: PathHandleGraph {
    fn create_path_handle(&mut self, name: &[u8]) -> Result<PathId>;

    /// Remove a path and all its occurrences. The ID is retired.
    fn destroy_path(&mut self, path: PathId) -> Result<()>;

    fn append_occurrence(
        &mut self,
        path: PathId,
        handle: Handle,
    ) -> Result<OccurrenceHandle>;

    fn prepend_occurrence(
        &mut self,
        path: PathId,
        handle: Handle,
    ) -> Result<OccurrenceHandle>;

    /// Insert an occurrence of `handle` between two adjacent positions
    /// of `path`.
    fn insert_occurrence(
        &mut self,
        path: PathId,
        before: PathStep,
        after: PathStep,
        handle: Handle,
    ) -> Result<OccurrenceHandle>;

    /// Make an occurrence traverse `handle` instead.
    fn set_occurrence(
        &mut self,
        occurrence: OccurrenceHandle,
        handle: Handle,
    ) -> Result<OccurrenceHandle>;

    /// Replace one occurrence with occurrences of `handles`, in order.
    /// An empty slice removes the occurrence from its path.
    fn replace_occurrence(
        &mut self,
        occurrence: OccurrenceHandle,
        handles: &[Handle],
    ) -> Result<Vec<OccurrenceHandle>>;
}
