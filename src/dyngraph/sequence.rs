use serde::{Deserialize, Serialize};

use crate::packed::*;
use crate::util::dna;

/// Every node's sequence, stored back to back in storage slot order.
///
/// `starts` has one bit per base plus a trailing sentinel, and marks
/// the first base of each node's span. Sequences are never empty, so
/// there is exactly one set bit per slot, plus the sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceStore {
    bases: PagedIntVec,
    starts: BitIndex,
}

crate::impl_space_usage!(SequenceStore, [bases, starts]);

impl Default for SequenceStore {
    fn default() -> Self {
        let mut starts = BitIndex::new();
        starts.push(true);
        Self {
            bases: Default::default(),
            starts,
        }
    }
}

impl SequenceStore {
    /// The number of delimiters, which is one more than the number of
    /// stored sequences.
    #[inline]
    pub fn delimiter_count(&self) -> usize {
        self.starts.count_ones()
    }

    #[inline]
    pub fn slot_count(&self) -> usize {
        self.starts.count_ones() - 1
    }

    #[inline]
    pub fn total_length(&self) -> usize {
        self.bases.len()
    }

    #[inline]
    fn span(&self, slot: usize) -> (usize, usize) {
        match (self.starts.select1(slot), self.starts.select1(slot + 1)) {
            (Some(start), Some(end)) => (start, end),
            _ => panic!("no sequence at slot {}", slot),
        }
    }

    #[inline]
    pub fn length(&self, slot: usize) -> usize {
        let (start, end) = self.span(slot);
        end - start
    }

    /// The forward sequence at `slot`.
    pub fn get(&self, slot: usize) -> Vec<u8> {
        let (start, end) = self.span(slot);
        self.bases
            .iter_slice(start, end - start)
            .map(u8::unpack)
            .collect()
    }

    /// The sequence at `slot`, reverse complemented if `is_reverse`.
    pub fn get_oriented(&self, slot: usize, is_reverse: bool) -> Vec<u8> {
        let (start, end) = self.span(slot);
        let iter = self.bases.iter_slice(start, end - start).map(u8::unpack);
        if is_reverse {
            dna::rev_comp_iter(iter).collect()
        } else {
            iter.collect()
        }
    }

    pub fn get_base(&self, slot: usize, index: usize) -> u8 {
        let (start, end) = self.span(slot);
        assert!(start + index < end);
        self.bases.get_unpack(start + index)
    }

    /// Store a sequence in a new slot after all existing ones.
    pub fn append(&mut self, sequence: &[u8]) {
        assert!(!sequence.is_empty());
        for &base in sequence {
            self.bases.append(base.pack());
        }
        // the old sentinel now marks the start of the new span
        for _ in 1..sequence.len() {
            self.starts.push(false);
        }
        self.starts.push(true);
    }

    /// Remove the sequence at `slot`, shifting later slots down.
    pub fn remove(&mut self, slot: usize) {
        let (start, end) = self.span(slot);
        self.bases.remove_range(start, end - start);
        for _ in start..end {
            self.starts.remove(start);
        }
    }

    /// Replace the sequence at `slot`.
    pub fn replace(&mut self, slot: usize, sequence: &[u8]) {
        assert!(!sequence.is_empty());
        let (start, end) = self.span(slot);

        self.bases.remove_range(start, end - start);
        let packed = sequence.iter().map(|&b| b.pack()).collect::<Vec<_>>();
        self.bases.insert_slice(start, &packed);

        for _ in start..end {
            self.starts.remove(start);
        }
        self.starts.insert(start, true);
        for ix in 1..sequence.len() {
            self.starts.insert(start + ix, false);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bstr::B;

    #[test]
    fn sequence_store_spans() {
        let mut seqs = SequenceStore::default();
        assert_eq!(seqs.delimiter_count(), 1);

        seqs.append(b"GTCA");
        seqs.append(b"A");
        seqs.append(b"AAGTG");
        assert_eq!(seqs.delimiter_count(), 4);
        assert_eq!(seqs.total_length(), 10);

        assert_eq!(seqs.get(0), B("GTCA"));
        assert_eq!(seqs.get(1), B("A"));
        assert_eq!(seqs.get(2), B("AAGTG"));
        assert_eq!(seqs.get_oriented(0, true), B("TGAC"));
        assert_eq!(seqs.get_base(2, 3), b'T');
        assert_eq!(seqs.length(2), 5);
    }

    #[test]
    fn sequence_store_remove_replace() {
        let mut seqs = SequenceStore::default();
        seqs.append(b"GTCA");
        seqs.append(b"AAGTGCTAGT");
        seqs.append(b"ATA");

        seqs.replace(1, b"AAG");
        assert_eq!(seqs.get(1), B("AAG"));
        assert_eq!(seqs.get(2), B("ATA"));

        seqs.replace(0, b"CCCCCC");
        assert_eq!(seqs.get(0), B("CCCCCC"));
        assert_eq!(seqs.get(1), B("AAG"));

        seqs.remove(1);
        assert_eq!(seqs.slot_count(), 2);
        assert_eq!(seqs.get(0), B("CCCCCC"));
        assert_eq!(seqs.get(1), B("ATA"));

        seqs.remove(0);
        seqs.remove(0);
        assert_eq!(seqs, SequenceStore::default());
    }
}
