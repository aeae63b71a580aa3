use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

use crate::packed::*;
use crate::pathhandlegraph::PathId;

const BEGIN_MARKER: u64 = 1;
const END_MARKER: u64 = 2;
const NODE_OFFSET: u64 = 2;

/// A path step identified by the ID of its node and its rank among
/// the steps of the same path on that node.
///
/// Unlike an `OccurrenceHandle`, a `StepRef` does not change when
/// steps of other paths are added to or removed from the node, or when
/// the node is moved by `swap_handles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepRef {
    pub id: u64,
    pub rank: usize,
}

/// What comes before or after a step in its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepLink {
    Begin,
    End,
    Step(StepRef),
}

impl StepLink {
    #[inline]
    pub fn step(self) -> Option<StepRef> {
        match self {
            StepLink::Step(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    fn encode(self) -> (u64, u64) {
        match self {
            StepLink::Begin => (BEGIN_MARKER, 0),
            StepLink::End => (END_MARKER, 0),
            StepLink::Step(s) => (s.id + NODE_OFFSET, s.rank as u64),
        }
    }

    #[inline]
    fn decode(node: u64, rank: u64) -> StepLink {
        match node {
            BEGIN_MARKER => StepLink::Begin,
            END_MARKER => StepLink::End,
            n => StepLink::Step(StepRef {
                id: n - NODE_OFFSET,
                rank: rank as usize,
            }),
        }
    }
}

impl From<Option<StepRef>> for StepLink {
    fn from(step: Option<StepRef>) -> Self {
        step.map(StepLink::Step).unwrap_or(StepLink::End)
    }
}

/// Everything stored for one step, used to move a node's steps to a
/// different slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRecord {
    symbol: u64,
    is_reverse: bool,
    next: (u64, u64),
    prev: (u64, u64),
}

/// The path steps on every node, in storage slot order.
///
/// Each node's steps are a run between two delimiters, like the
/// adjacency lists. A step records its path, the orientation it
/// traverses the node in, and the links to the steps before and
/// after it. New steps go at the end of their node's run, so adding
/// steps never changes the rank of an existing step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceIndex {
    paths: SymbolSeq,
    delims: BitIndex,
    orientation: BitIndex,
    next_node: PagedIntVec,
    next_rank: PagedIntVec,
    prev_node: PagedIntVec,
    prev_rank: PagedIntVec,
}

crate::impl_space_usage!(
    OccurrenceIndex,
    [paths, delims, orientation, next_node, next_rank, prev_node, prev_rank]
);

impl Default for OccurrenceIndex {
    fn default() -> Self {
        let mut index = Self {
            paths: Default::default(),
            delims: Default::default(),
            orientation: Default::default(),
            next_node: Default::default(),
            next_rank: Default::default(),
            prev_node: Default::default(),
            prev_rank: Default::default(),
        };
        index.push_delimiter();
        index
    }
}

#[inline]
fn path_symbol(path: PathId) -> u64 {
    path.as_integer() + 1
}

impl OccurrenceIndex {
    fn push_delimiter(&mut self) {
        self.paths.push(0);
        self.delims.push(true);
        self.orientation.push(false);
        self.next_node.append(0);
        self.next_rank.append(0);
        self.prev_node.append(0);
        self.prev_rank.append(0);
    }

    fn insert_record(&mut self, pos: usize, record: StepRecord) {
        self.paths.insert(pos, record.symbol);
        self.delims.insert(pos, false);
        self.orientation.insert(pos, record.is_reverse);
        self.next_node.insert(pos, record.next.0);
        self.next_rank.insert(pos, record.next.1);
        self.prev_node.insert(pos, record.prev.0);
        self.prev_rank.insert(pos, record.prev.1);
    }

    fn remove_record(&mut self, pos: usize) -> StepRecord {
        self.delims.remove(pos);
        StepRecord {
            symbol: self.paths.remove(pos),
            is_reverse: self.orientation.remove(pos),
            next: (self.next_node.remove(pos), self.next_rank.remove(pos)),
            prev: (self.prev_node.remove(pos), self.prev_rank.remove(pos)),
        }
    }

    #[inline]
    pub fn delimiter_count(&self) -> usize {
        self.delims.count_ones()
    }

    /// The total number of steps of all paths.
    #[inline]
    pub fn step_count(&self) -> usize {
        self.delims.count_zeros()
    }

    /// The half-open range of positions holding the steps at `slot`.
    #[inline]
    pub fn run(&self, slot: usize) -> (usize, usize) {
        match (self.delims.select1(slot), self.delims.select1(slot + 1)) {
            (Some(start), Some(end)) => (start + 1, end),
            _ => panic!("no step list at slot {}", slot),
        }
    }

    #[inline]
    pub fn slot_step_count(&self, slot: usize) -> usize {
        let (start, end) = self.run(slot);
        end - start
    }

    /// The slot that the step at `pos` belongs to.
    #[inline]
    pub fn slot_of(&self, pos: usize) -> usize {
        self.delims.rank1(pos) - 1
    }

    #[inline]
    pub fn path_at(&self, pos: usize) -> PathId {
        PathId::new(self.paths.get(pos) - 1)
    }

    #[inline]
    pub fn is_reverse_at(&self, pos: usize) -> bool {
        self.orientation.get(pos)
    }

    #[inline]
    pub fn next_at(&self, pos: usize) -> StepLink {
        StepLink::decode(self.next_node.get(pos), self.next_rank.get(pos))
    }

    #[inline]
    pub fn prev_at(&self, pos: usize) -> StepLink {
        StepLink::decode(self.prev_node.get(pos), self.prev_rank.get(pos))
    }

    #[inline]
    pub fn set_next_at(&mut self, pos: usize, link: StepLink) {
        let (node, rank) = link.encode();
        self.next_node.set(pos, node);
        self.next_rank.set(pos, rank);
    }

    #[inline]
    pub fn set_prev_at(&mut self, pos: usize, link: StepLink) {
        let (node, rank) = link.encode();
        self.prev_node.set(pos, node);
        self.prev_rank.set(pos, rank);
    }

    /// The rank of the step at `pos` among the steps of its path on
    /// the same slot.
    pub fn path_rank(&self, slot: usize, pos: usize) -> usize {
        let (start, _) = self.run(slot);
        self.paths.rank_from(start, pos, self.paths.get(pos))
    }

    /// The position of the `rank`th step of `path` on `slot`.
    pub fn locate(&self, slot: usize, path: PathId, rank: usize) -> Option<usize> {
        let (start, end) = self.run(slot);
        self.paths.select_in(start, end, rank, path_symbol(path))
    }

    /// Positions and per-path ranks of the steps of `path` on `slot`,
    /// in storage order.
    pub fn steps_of_path(&self, slot: usize, path: PathId) -> Vec<(usize, usize)> {
        let (start, end) = self.run(slot);
        let symbol = path_symbol(path);
        self.paths
            .iter_slice(start, end - start)
            .enumerate()
            .filter(|&(_, s)| s == symbol)
            .enumerate()
            .map(|(rank, (offset, _))| (start + offset, rank))
            .collect()
    }

    /// Add an unlinked step to the end of the run at `slot`, returning
    /// its position and per-path rank.
    pub fn append_step(
        &mut self,
        slot: usize,
        path: PathId,
        is_reverse: bool,
    ) -> (usize, usize) {
        let (start, end) = self.run(slot);
        let symbol = path_symbol(path);
        let rank = self.paths.rank_from(start, end, symbol);
        self.insert_record(
            end,
            StepRecord {
                symbol,
                is_reverse,
                next: (0, 0),
                prev: (0, 0),
            },
        );
        (end, rank)
    }

    /// Remove the step at `pos`. Links pointing to it are not touched.
    pub fn remove_step(&mut self, pos: usize) {
        assert!(!self.delims.get(pos), "removing a step list delimiter");
        self.remove_record(pos);
    }

    /// The number of stored steps of each path.
    pub fn path_step_counts(&self) -> FnvHashMap<PathId, usize> {
        let mut counts = FnvHashMap::default();
        for symbol in self.paths.iter().filter(|&s| s != 0) {
            *counts.entry(PathId::new(symbol - 1)).or_insert(0) += 1;
        }
        counts
    }

    /// Toggle the orientation of every step at `slot`.
    pub fn flip_orientations(&mut self, slot: usize) {
        let (start, end) = self.run(slot);
        for pos in start..end {
            let rev = self.orientation.get(pos);
            self.orientation.set(pos, !rev);
        }
    }

    #[inline]
    pub fn append_slot(&mut self) {
        self.push_delimiter();
    }

    /// Remove the step list at `slot`, which must be empty.
    pub fn remove_slot(&mut self, slot: usize) {
        let (start, end) = self.run(slot);
        assert!(start == end, "removing a nonempty step list");
        self.remove_record(end);
    }

    /// Exchange the step lists of two slots.
    pub fn swap_slots(&mut self, a: usize, b: usize) {
        let run_a = self.take_run(a);
        let run_b = self.take_run(b);
        self.put_run(a, &run_b);
        self.put_run(b, &run_a);
    }

    fn take_run(&mut self, slot: usize) -> Vec<StepRecord> {
        let (start, end) = self.run(slot);
        (start..end).map(|_| self.remove_record(start)).collect()
    }

    fn put_run(&mut self, slot: usize, run: &[StepRecord]) {
        let (start, end) = self.run(slot);
        assert!(start == end, "overwriting a nonempty step list");
        for (offset, &record) in run.iter().enumerate() {
            self.insert_record(start + offset, record);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn check(&self) -> Result<(), String> {
        let len = self.paths.len();
        let lens = [
            self.delims.len(),
            self.orientation.len(),
            self.next_node.len(),
            self.next_rank.len(),
            self.prev_node.len(),
            self.prev_rank.len(),
        ];
        if lens.iter().any(|&l| l != len) {
            return Err("step arrays differ in length".to_string());
        }
        for pos in 0..len {
            let is_delim = self.paths.get(pos) == 0;
            if is_delim != self.delims.get(pos) {
                return Err(format!("step delimiter mismatch at {}", pos));
            }
            if !is_delim
                && (self.next_node.get(pos) == 0 || self.prev_node.get(pos) == 0)
            {
                return Err(format!("step at {} is not linked", pos));
            }
        }
        Ok(())
    }
}
