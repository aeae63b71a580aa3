use fnv::{FnvHashMap, FnvHashSet};
use serde::{Deserialize, Serialize};
use succinct::SpaceUsage;

#[allow(unused_imports)]
use log::{debug, trace};

use crate::packed::*;

/// The largest ID a node can have. Path step links store IDs offset
/// past two reserved markers.
pub const MAX_NODE_ID: u64 = u64::MAX - 2;

/// Maps node IDs to the dense internal ranks that handles refer to,
/// and back.
///
/// Ranks are assigned in creation order and never reused. A destroyed
/// node leaves a tombstone at its rank: its ID is set to zero and its
/// bit in `dead` is set. Every other per-node structure in the graph
/// stores one entry per rank that is not a tombstone, so the storage
/// slot of a rank is the rank minus the number of tombstones before
/// it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeIndex {
    ids: PackedIntVec,
    id_map: FnvHashMap<u64, usize>,
    hidden: FnvHashSet<usize>,
    dead: BitIndex,
    min_id: u64,
    max_id: u64,
    node_count: usize,
}

impl Default for NodeIndex {
    fn default() -> Self {
        Self {
            ids: Default::default(),
            id_map: Default::default(),
            hidden: Default::default(),
            dead: Default::default(),
            min_id: 0,
            max_id: 0,
            node_count: 0,
        }
    }
}

impl SpaceUsage for NodeIndex {
    #[inline]
    fn is_stack_only() -> bool {
        false
    }

    fn heap_bytes(&self) -> usize {
        let map_entry = std::mem::size_of::<(u64, usize)>();
        let set_entry = std::mem::size_of::<usize>();
        self.ids.heap_bytes()
            + self.dead.heap_bytes()
            + self.id_map.capacity() * map_entry
            + self.hidden.capacity() * set_entry
    }
}

impl NodeIndex {
    /// The number of ranks handed out, tombstones included.
    #[inline]
    pub fn rank_count(&self) -> usize {
        self.ids.len()
    }

    /// The number of ranks with storage, i.e. visible and hidden
    /// nodes.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.ids.len() - self.dead.count_ones()
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    #[inline]
    pub fn hidden_count(&self) -> usize {
        self.hidden.len()
    }

    #[inline]
    pub fn min_id(&self) -> u64 {
        self.min_id
    }

    #[inline]
    pub fn max_id(&self) -> u64 {
        self.max_id
    }

    /// The ID an automatically numbered node would get.
    #[inline]
    pub fn next_id(&self) -> Option<u64> {
        self.max_id.checked_add(1).filter(|&id| id <= MAX_NODE_ID)
    }

    #[inline]
    pub fn is_tombstone(&self, rank: usize) -> bool {
        self.dead.get(rank)
    }

    #[inline]
    pub fn is_hidden(&self, rank: usize) -> bool {
        self.hidden.contains(&rank)
    }

    /// Whether `rank` has storage, hidden or not.
    #[inline]
    pub fn has_rank(&self, rank: usize) -> bool {
        rank < self.rank_count() && !self.is_tombstone(rank)
    }

    /// Whether `rank` is a visible node.
    #[inline]
    pub fn is_visible(&self, rank: usize) -> bool {
        self.has_rank(rank) && !self.is_hidden(rank)
    }

    #[inline]
    pub fn slot(&self, rank: usize) -> usize {
        rank - self.dead.rank1(rank)
    }

    /// The rank stored at `slot`; the inverse of `slot`.
    #[inline]
    pub fn rank_of_slot(&self, slot: usize) -> Option<usize> {
        self.dead.select0(slot)
    }

    #[inline]
    pub fn get_id(&self, rank: usize) -> u64 {
        self.ids.get(rank)
    }

    /// The rank of a node, hidden or visible.
    #[inline]
    pub fn get_rank(&self, id: u64) -> Option<usize> {
        self.id_map.get(&id).copied()
    }

    #[inline]
    pub fn has_id(&self, id: u64) -> bool {
        self.id_map.contains_key(&id)
    }

    pub fn hidden_ranks(&self) -> impl Iterator<Item = usize> + '_ {
        self.hidden.iter().copied()
    }

    /// Add a node with the given ID at the next rank, returning the
    /// rank. The caller is responsible for the ID being unused and
    /// nonzero.
    pub fn insert(&mut self, id: u64, hidden: bool) -> usize {
        let rank = self.ids.len();
        self.ids.append(id);
        self.dead.push(false);
        self.id_map.insert(id, rank);

        if hidden {
            self.hidden.insert(rank);
        } else {
            self.node_count += 1;
        }

        if self.id_map.len() == 1 {
            self.min_id = id;
            self.max_id = id;
        } else {
            self.min_id = self.min_id.min(id);
            self.max_id = self.max_id.max(id);
        }

        trace!("inserted node {} at rank {}", id, rank);
        rank
    }

    /// Turn a visible node into a hidden one.
    pub fn hide(&mut self, rank: usize) {
        if self.hidden.insert(rank) {
            self.node_count -= 1;
        }
    }

    /// Tombstone a rank. The caller must already have removed the
    /// rank's storage from the other indices.
    pub fn tombstone(&mut self, rank: usize) {
        let id = self.ids.get(rank);
        self.id_map.remove(&id);
        self.ids.set(rank, 0);
        self.dead.set(rank, true);

        if !self.hidden.remove(&rank) {
            self.node_count -= 1;
        }

        if id == self.min_id || id == self.max_id {
            self.recompute_bounds();
        }

        trace!("tombstoned node {} at rank {}", id, rank);
    }

    fn recompute_bounds(&mut self) {
        self.min_id = self.id_map.keys().copied().min().unwrap_or(0);
        self.max_id = self.id_map.keys().copied().max().unwrap_or(0);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Exchange the IDs (and visibility) stored at two ranks.
    pub fn swap(&mut self, a: usize, b: usize) {
        let id_a = self.ids.get(a);
        let id_b = self.ids.get(b);

        self.ids.set(a, id_b);
        self.ids.set(b, id_a);
        self.id_map.insert(id_a, b);
        self.id_map.insert(id_b, a);

        let hidden_a = self.hidden.remove(&a);
        let hidden_b = self.hidden.remove(&b);
        if hidden_a {
            self.hidden.insert(b);
        }
        if hidden_b {
            self.hidden.insert(a);
        }
    }

    /// Check the ID bookkeeping against the rank vector, returning a
    /// description of the first problem found.
    pub fn check(&self) -> Result<(), String> {
        if self.dead.len() != self.ids.len() {
            return Err(format!(
                "{} ranks but {} tombstone bits",
                self.ids.len(),
                self.dead.len()
            ));
        }

        let mut visible = 0;
        for rank in 0..self.ids.len() {
            let id = self.ids.get(rank);
            if self.dead.get(rank) {
                if id != 0 {
                    return Err(format!("tombstone at rank {} has ID {}", rank, id));
                }
                continue;
            }
            if id == 0 || id > MAX_NODE_ID {
                return Err(format!("rank {} has invalid ID {}", rank, id));
            }
            match self.id_map.get(&id) {
                Some(&r) if r == rank => (),
                _ => {
                    return Err(format!(
                        "node {} at rank {} is not in the ID map",
                        id, rank
                    ))
                }
            }
            if !self.hidden.contains(&rank) {
                visible += 1;
            }
        }

        if self.id_map.len() != self.slot_count() {
            return Err(format!(
                "ID map has {} entries for {} nodes",
                self.id_map.len(),
                self.slot_count()
            ));
        }
        if visible != self.node_count {
            return Err(format!(
                "{} visible nodes but the count is {}",
                visible, self.node_count
            ));
        }
        if self.hidden.iter().any(|&rank| !self.has_rank(rank)) {
            return Err("a hidden rank has no node".to_string());
        }
        if !self.id_map.is_empty() {
            let min = self.id_map.keys().copied().min().unwrap_or(0);
            let max = self.id_map.keys().copied().max().unwrap_or(0);
            if min != self.min_id || max != self.max_id {
                return Err(format!(
                    "ID bounds are {}..{} but should be {}..{}",
                    self.min_id, self.max_id, min, max
                ));
            }
        }
        Ok(())
    }
}
