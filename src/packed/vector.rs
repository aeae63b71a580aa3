use serde::{Deserialize, Serialize};
use succinct::{IntVec, IntVecMut, IntVector};

use super::traits::*;

/// A growable vector of integers, bit-packed to the width of its
/// widest element.
///
/// The underlying `IntVector` is used as capacity; only the first
/// `num_entries` elements are part of the collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<u64>", into = "Vec<u64>")]
pub struct PackedIntVec {
    vector: IntVector<u64>,
    num_entries: usize,
    width: usize,
}

crate::impl_space_usage!(PackedIntVec, [vector]);

impl PartialEq for PackedIntVec {
    #[inline]
    fn eq(&self, other: &PackedIntVec) -> bool {
        self.num_entries == other.num_entries && self.iter().eq(other.iter())
    }
}

impl Eq for PackedIntVec {}

impl Default for PackedIntVec {
    fn default() -> PackedIntVec {
        let width = 1;
        let vector = IntVector::new(width);
        let num_entries = 0;
        PackedIntVec {
            vector,
            num_entries,
            width,
        }
    }
}

impl PackedIntVec {
    const FACTOR: f64 = 1.25;

    pub fn new() -> Self {
        Default::default()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    fn resize(&mut self, size: usize) {
        if size > self.vector.len() as usize {
            let fac_size = self.vector.len() as f64 * Self::FACTOR;
            let fac_size = fac_size as usize + 1;
            let new_cap = size.max(fac_size);
            self.vector.resize(new_cap as u64, 0);
        }

        // elements past the end are kept at zero so that widening
        // and comparisons never see stale values
        for ix in size..self.num_entries {
            self.vector.set(ix as u64, 0);
        }

        self.num_entries = size;
    }

    fn widen(&mut self, new_width: usize) {
        let mut new_vec: IntVector<u64> =
            IntVector::with_capacity(new_width, self.vector.len());

        for ix in 0..self.vector.len() {
            new_vec.push(self.vector.get(ix));
        }

        self.width = new_width;
        std::mem::swap(&mut self.vector, &mut new_vec);
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self, 0, self.num_entries)
    }

    /// Iterate over the `length` elements starting at `offset`.
    pub fn iter_slice(&self, offset: usize, length: usize) -> Iter<'_> {
        assert!(offset + length <= self.num_entries);
        Iter::new(self, offset, offset + length)
    }
}

impl PackedCollection for PackedIntVec {
    #[inline]
    fn len(&self) -> usize {
        self.num_entries
    }

    #[inline]
    fn clear(&mut self) {
        self.width = 1;
        self.vector = IntVector::new(self.width);
        self.num_entries = 0;
    }

    #[inline]
    fn set(&mut self, index: usize, value: u64) {
        assert!(index < self.num_entries);

        let new_width = 64 - value.leading_zeros() as usize;

        if new_width > self.width {
            self.widen(new_width);
        }

        self.vector.set(index as u64, value);
    }

    #[inline]
    fn get(&self, index: usize) -> u64 {
        assert!(index < self.num_entries);
        self.vector.get(index as u64)
    }

    #[inline]
    fn append(&mut self, value: u64) {
        self.resize(self.num_entries + 1);
        self.set(self.num_entries - 1, value);
    }

    #[inline]
    fn pop(&mut self) {
        if let Some(new_size) = self.num_entries.checked_sub(1) {
            self.resize(new_size);
        }
    }
}

impl DynamicCollection for PackedIntVec {
    fn insert(&mut self, index: usize, value: u64) {
        assert!(index <= self.num_entries);
        self.resize(self.num_entries + 1);

        let mut ix = self.num_entries - 1;
        while ix > index {
            let prev = self.vector.get((ix - 1) as u64);
            self.vector.set(ix as u64, prev);
            ix -= 1;
        }

        self.set(index, value);
    }

    fn remove(&mut self, index: usize) -> u64 {
        assert!(index < self.num_entries);
        let value = self.vector.get(index as u64);

        for ix in index..self.num_entries - 1 {
            let next = self.vector.get((ix + 1) as u64);
            self.vector.set(ix as u64, next);
        }

        self.pop();
        value
    }

    fn insert_slice(&mut self, index: usize, values: &[u64]) {
        assert!(index <= self.num_entries);
        if values.is_empty() {
            return;
        }

        if let Some(max) = values.iter().copied().max() {
            let new_width = 64 - max.leading_zeros() as usize;
            if new_width > self.width {
                self.widen(new_width);
            }
        }

        let count = values.len();
        let old_len = self.num_entries;
        self.resize(old_len + count);

        for ix in (index..old_len).rev() {
            let value = self.vector.get(ix as u64);
            self.vector.set((ix + count) as u64, value);
        }

        for (offset, &value) in values.iter().enumerate() {
            self.vector.set((index + offset) as u64, value);
        }
    }

    fn remove_range(&mut self, index: usize, count: usize) -> Vec<u64> {
        assert!(index + count <= self.num_entries);
        let removed = self.iter_slice(index, count).collect::<Vec<_>>();

        for ix in index..self.num_entries - count {
            let value = self.vector.get((ix + count) as u64);
            self.vector.set(ix as u64, value);
        }

        self.resize(self.num_entries - count);
        removed
    }
}

pub struct Iter<'a> {
    vec: &'a PackedIntVec,
    left_ix: usize,
    right_ix: usize,
}

impl<'a> Iter<'a> {
    fn new(vec: &'a PackedIntVec, left_ix: usize, right_ix: usize) -> Self {
        Self {
            vec,
            left_ix,
            right_ix,
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<u64> {
        if self.left_ix < self.right_ix {
            let item = self.vec.vector.get(self.left_ix as u64);
            self.left_ix += 1;
            Some(item)
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.right_ix.saturating_sub(self.left_ix);
        (len, Some(len))
    }
}

impl<'a> DoubleEndedIterator for Iter<'a> {
    #[inline]
    fn next_back(&mut self) -> Option<u64> {
        if self.left_ix < self.right_ix {
            self.right_ix -= 1;
            Some(self.vec.vector.get(self.right_ix as u64))
        } else {
            None
        }
    }
}

impl<'a> ExactSizeIterator for Iter<'a> {}

impl std::iter::FromIterator<u64> for PackedIntVec {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        let mut intvec = PackedIntVec::new();
        iter.into_iter().for_each(|v| intvec.append(v));
        intvec
    }
}

impl From<Vec<u64>> for PackedIntVec {
    fn from(vector: Vec<u64>) -> Self {
        vector.into_iter().collect()
    }
}

impl From<PackedIntVec> for Vec<u64> {
    fn from(intvec: PackedIntVec) -> Self {
        intvec.iter().collect()
    }
}
