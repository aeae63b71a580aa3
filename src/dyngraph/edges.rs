use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use crate::packed::*;

/// Encode the distance from node `from` to node `to` as a nonzero
/// integer: zero maps to 1, positive deltas to odd numbers, and
/// negative deltas to even numbers. Zero is left for the list
/// delimiters.
///
/// Returns `None` if the encoded delta does not fit in 64 bits.
#[inline]
pub fn encode_delta(from: u64, to: u64) -> Option<u64> {
    let delta = i128::from(to) - i128::from(from);
    let encoded = match delta {
        0 => 1,
        d if d > 0 => 2 * d + 1,
        d => 2 * (-d) + 2,
    };
    u64::try_from(encoded).ok()
}

/// Inverse of `encode_delta`.
#[inline]
pub fn decode_delta(from: u64, encoded: u64) -> u64 {
    debug_assert!(encoded != 0);
    let encoded = i128::from(encoded);
    let delta = if encoded % 2 == 1 {
        (encoded - 1) / 2
    } else {
        -((encoded - 2) / 2)
    };
    (i128::from(from) + delta) as u64
}

/// One adjacency entry: the node on the other end, and whether the
/// edge enters it in reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEntry {
    pub id: u64,
    pub inverted: bool,
}

/// The adjacency lists of one side of every node, concatenated in
/// storage slot order.
///
/// Each list is a run of delta-encoded neighbor IDs between two zero
/// delimiters; `delims` marks the delimiters so a slot's run can be
/// found with `select`. `inverted` holds one flag per entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeList {
    entries: PagedIntVec,
    delims: BitIndex,
    inverted: BitIndex,
}

crate::impl_space_usage!(EdgeList, [entries, delims, inverted]);

impl Default for EdgeList {
    fn default() -> Self {
        let mut list = Self {
            entries: Default::default(),
            delims: Default::default(),
            inverted: Default::default(),
        };
        list.push_delimiter();
        list
    }
}

impl EdgeList {
    fn push_delimiter(&mut self) {
        self.entries.append(0);
        self.delims.push(true);
        self.inverted.push(false);
    }

    #[inline]
    pub fn delimiter_count(&self) -> usize {
        self.delims.count_ones()
    }

    #[inline]
    pub fn entry_count(&self) -> usize {
        self.delims.count_zeros()
    }

    /// The half-open range of `entries` holding the list at `slot`.
    #[inline]
    fn run(&self, slot: usize) -> (usize, usize) {
        match (self.delims.select1(slot), self.delims.select1(slot + 1)) {
            (Some(start), Some(end)) => (start + 1, end),
            _ => panic!("no adjacency list at slot {}", slot),
        }
    }

    #[inline]
    pub fn degree(&self, slot: usize) -> usize {
        let (start, end) = self.run(slot);
        end - start
    }

    #[inline]
    fn entry_at(&self, ix: usize, this_id: u64) -> EdgeEntry {
        EdgeEntry {
            id: decode_delta(this_id, self.entries.get(ix)),
            inverted: self.inverted.get(ix),
        }
    }

    pub fn entries(&self, slot: usize, this_id: u64) -> Vec<EdgeEntry> {
        let (start, end) = self.run(slot);
        (start..end).map(|ix| self.entry_at(ix, this_id)).collect()
    }

    fn position(&self, slot: usize, this_id: u64, entry: EdgeEntry) -> Option<usize> {
        let (start, end) = self.run(slot);
        (start..end).find(|&ix| self.entry_at(ix, this_id) == entry)
    }

    #[inline]
    pub fn contains(&self, slot: usize, this_id: u64, entry: EdgeEntry) -> bool {
        self.position(slot, this_id, entry).is_some()
    }

    /// Add an entry to the end of the list at `slot`. The caller must
    /// have checked that the delta can be encoded.
    pub fn insert(&mut self, slot: usize, this_id: u64, entry: EdgeEntry) {
        let (_, end) = self.run(slot);
        let encoded = encode_delta(this_id, entry.id)
            .unwrap_or_else(|| panic!("unencodable edge delta"));
        self.entries.insert(end, encoded);
        self.delims.insert(end, false);
        self.inverted.insert(end, entry.inverted);
    }

    /// Remove an entry from the list at `slot`, returning `true` if it
    /// was there.
    pub fn remove(&mut self, slot: usize, this_id: u64, entry: EdgeEntry) -> bool {
        if let Some(ix) = self.position(slot, this_id, entry) {
            self.entries.remove(ix);
            self.delims.remove(ix);
            self.inverted.remove(ix);
            true
        } else {
            false
        }
    }

    /// Toggle the inversion flag of every entry at `slot` that points
    /// to `target`.
    pub fn flip_inversions_to(&mut self, slot: usize, this_id: u64, target: u64) {
        let (start, end) = self.run(slot);
        for ix in start..end {
            if decode_delta(this_id, self.entries.get(ix)) == target {
                let inv = self.inverted.get(ix);
                self.inverted.set(ix, !inv);
            }
        }
    }

    /// Add an empty list after all existing ones.
    #[inline]
    pub fn append_slot(&mut self) {
        self.push_delimiter();
    }

    /// Remove the list at `slot`, which must be empty.
    pub fn remove_slot(&mut self, slot: usize) {
        let (start, end) = self.run(slot);
        assert!(start == end, "removing a nonempty adjacency list");
        self.entries.remove(end);
        self.delims.remove(end);
        self.inverted.remove(end);
    }

    /// Remove and return the raw contents of the list at `slot`,
    /// leaving it empty.
    pub fn take_run(&mut self, slot: usize) -> Vec<(u64, bool)> {
        let (start, end) = self.run(slot);
        let encoded = self.entries.remove_range(start, end - start);
        encoded
            .into_iter()
            .map(|value| {
                self.delims.remove(start);
                (value, self.inverted.remove(start))
            })
            .collect()
    }

    /// Fill the empty list at `slot` with contents from `take_run`.
    pub fn put_run(&mut self, slot: usize, run: &[(u64, bool)]) {
        let (start, end) = self.run(slot);
        assert!(start == end, "overwriting a nonempty adjacency list");
        let encoded = run.iter().map(|(v, _)| *v).collect::<Vec<_>>();
        self.entries.insert_slice(start, &encoded);
        for (offset, &(_, inv)) in run.iter().enumerate() {
            self.delims.insert(start + offset, false);
            self.inverted.insert(start + offset, inv);
        }
    }

    pub fn check(&self) -> Result<(), String> {
        let len = self.entries.len();
        if self.delims.len() != len || self.inverted.len() != len {
            return Err("adjacency arrays differ in length".to_string());
        }
        for ix in 0..len {
            let is_delim = self.entries.get(ix) == 0;
            if is_delim != self.delims.get(ix) {
                return Err(format!("adjacency delimiter mismatch at {}", ix));
            }
        }
        Ok(())
    }
}

/// Both sides of every node's adjacency.
///
/// `fwd` holds the neighbors reached from the right side of each
/// node's forward handle, `rev` those reached from the right side of
/// its reverse handle. Each edge is stored once in each of its two
/// endpoints' lists, except a reversing self-loop, whose two entries
/// would be identical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeIndex {
    pub(crate) fwd: EdgeList,
    pub(crate) rev: EdgeList,
    pub(crate) edge_count: usize,
}

crate::impl_space_usage!(EdgeIndex, [fwd, rev]);

impl EdgeIndex {
    /// The list holding the right side of a handle with the given
    /// orientation.
    #[inline]
    pub fn right_list(&self, is_reverse: bool) -> &EdgeList {
        if is_reverse {
            &self.rev
        } else {
            &self.fwd
        }
    }

    #[inline]
    pub fn right_list_mut(&mut self, is_reverse: bool) -> &mut EdgeList {
        if is_reverse {
            &mut self.rev
        } else {
            &mut self.fwd
        }
    }

    pub fn append_slot(&mut self) {
        self.fwd.append_slot();
        self.rev.append_slot();
    }

    pub fn remove_slot(&mut self, slot: usize) {
        self.fwd.remove_slot(slot);
        self.rev.remove_slot(slot);
    }

    /// Exchange the contents of two slots in both lists.
    pub fn swap_slots(&mut self, a: usize, b: usize) {
        for list in [&mut self.fwd, &mut self.rev].iter_mut() {
            let run_a = list.take_run(a);
            let run_b = list.take_run(b);
            list.put_run(a, &run_b);
            list.put_run(b, &run_a);
        }
    }

    /// Exchange the forward and reverse lists of a slot.
    pub fn swap_sides(&mut self, slot: usize) {
        let fwd = self.fwd.take_run(slot);
        let rev = self.rev.take_run(slot);
        self.fwd.put_run(slot, &rev);
        self.rev.put_run(slot, &fwd);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
