use std::convert::TryFrom;

use serde::{Deserialize, Serialize};
use succinct::{BitVec, BitVecMut, BitVecPush, BitVector};

use super::last_page_at_most;

const BLOCK_BITS: usize = 64;

/// Pages are split in two once they grow past this many bits.
const PAGE_BITS: usize = 4096;

#[inline]
fn block_count(len: usize) -> usize {
    (len + BLOCK_BITS - 1) / BLOCK_BITS
}

/// A run of bits stored in 64-bit blocks of a `BitVector`.
///
/// Capacity past `len` is always zeroed, which lets shifts and rank
/// work a whole block at a time.
#[derive(Debug, Clone)]
struct BitPage {
    bits: BitVector<u64>,
    len: usize,
    ones: usize,
}

crate::impl_space_usage!(BitPage, [bits]);

impl BitPage {
    fn new() -> Self {
        BitPage {
            bits: BitVector::new(),
            len: 0,
            ones: 0,
        }
    }

    fn from_blocks(blocks: &[u64], len: usize) -> Self {
        let mut page = BitPage::new();
        page.reserve(len);
        for (b, &block) in blocks.iter().enumerate() {
            page.set_block(b, block);
            page.ones += block.count_ones() as usize;
        }
        page.len = len;
        page
    }

    #[inline]
    fn block(&self, index: usize) -> u64 {
        self.bits.get_block(index)
    }

    #[inline]
    fn set_block(&mut self, index: usize, value: u64) {
        self.bits.set_block(index, value);
    }

    fn reserve(&mut self, len: usize) {
        while (self.bits.bit_len() as usize) < len {
            for _ in 0..BLOCK_BITS {
                self.bits.push_bit(false);
            }
        }
    }

    #[inline]
    fn get(&self, index: usize) -> bool {
        let block = self.block(index / BLOCK_BITS);
        (block >> (index % BLOCK_BITS)) & 1 == 1
    }

    /// Set a bit, returning its old value.
    fn set(&mut self, index: usize, value: bool) -> bool {
        let old = self.get(index);
        if old != value {
            let b = index / BLOCK_BITS;
            let mask = 1u64 << (index % BLOCK_BITS);
            let block = self.block(b);
            if value {
                self.set_block(b, block | mask);
                self.ones += 1;
            } else {
                self.set_block(b, block & !mask);
                self.ones -= 1;
            }
        }
        old
    }

    fn insert(&mut self, index: usize, value: bool) {
        self.reserve(self.len + 1);

        let first = index / BLOCK_BITS;
        let last = self.len / BLOCK_BITS;

        let mut carry = 0u64;
        for b in first..=last {
            let block = self.block(b);
            let out = block >> (BLOCK_BITS - 1);
            let shifted = if b == first {
                let offset = index % BLOCK_BITS;
                let low_mask = (1u64 << offset) - 1;
                (block & low_mask)
                    | ((block & !low_mask) << 1)
                    | ((value as u64) << offset)
            } else {
                (block << 1) | carry
            };
            self.set_block(b, shifted);
            carry = out;
        }

        self.len += 1;
        if value {
            self.ones += 1;
        }
    }

    fn remove(&mut self, index: usize) -> bool {
        let value = self.get(index);

        let first = index / BLOCK_BITS;
        let last = (self.len - 1) / BLOCK_BITS;

        for b in first..=last {
            let block = self.block(b);
            let next_low = if b < last { self.block(b + 1) & 1 } else { 0 };
            let shifted = if b == first {
                let offset = index % BLOCK_BITS;
                let low_mask = (1u64 << offset) - 1;
                (block & low_mask)
                    | ((block >> 1) & !low_mask)
                    | (next_low << (BLOCK_BITS - 1))
            } else {
                (block >> 1) | (next_low << (BLOCK_BITS - 1))
            };
            self.set_block(b, shifted);
        }

        self.len -= 1;
        if value {
            self.ones -= 1;
        }
        value
    }

    /// Move the bits from `at` on into a new page.
    fn split_off(&mut self, at: usize) -> BitPage {
        let mut tail = BitPage::new();
        for ix in at..self.len {
            tail.insert(tail.len, self.get(ix));
        }
        while self.len > at {
            self.remove(self.len - 1);
        }
        tail
    }

    fn rank1(&self, index: usize) -> usize {
        let full = index / BLOCK_BITS;
        let mut count: usize = (0..full)
            .map(|b| self.block(b).count_ones() as usize)
            .sum();

        let rem = index % BLOCK_BITS;
        if rem > 0 {
            let mask = (1u64 << rem) - 1;
            count += (self.block(full) & mask).count_ones() as usize;
        }
        count
    }

    fn select1(&self, k: usize) -> Option<usize> {
        let mut k = k;
        for b in 0..block_count(self.len) {
            let block = self.block(b);
            let count = block.count_ones() as usize;
            if k < count {
                return Some(b * BLOCK_BITS + select_in_block(block, k));
            }
            k -= count;
        }
        None
    }

    fn select0(&self, k: usize) -> Option<usize> {
        let blocks = block_count(self.len);
        let mut k = k;
        for b in 0..blocks {
            let mut block = !self.block(b);
            let rem = self.len % BLOCK_BITS;
            if b == blocks - 1 && rem != 0 {
                block &= (1u64 << rem) - 1;
            }
            let count = block.count_ones() as usize;
            if k < count {
                return Some(b * BLOCK_BITS + select_in_block(block, k));
            }
            k -= count;
        }
        None
    }

    fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |ix| self.get(ix))
    }
}

/// A dynamic bit vector supporting rank and select, as well as
/// insertion and removal at arbitrary positions.
///
/// The bits are split into pages, and `bits_before` and `ones_before`
/// hold the number of bits and set bits in front of each page. Rank
/// and select find their page with a binary search over these, then
/// count within the page. An insertion or removal shifts the bits of
/// one page and updates the counts of the pages after it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "BitIndexRepr", into = "BitIndexRepr")]
pub struct BitIndex {
    pages: Vec<BitPage>,
    bits_before: Vec<usize>,
    ones_before: Vec<usize>,
    len: usize,
    ones: usize,
}

crate::impl_space_usage!(BitIndex, [pages, bits_before, ones_before]);

impl Default for BitIndex {
    fn default() -> Self {
        Self {
            pages: vec![BitPage::new()],
            bits_before: vec![0],
            ones_before: vec![0],
            len: 0,
            ones: 0,
        }
    }
}

impl PartialEq for BitIndex {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len
            && self.ones == other.ones
            && self.iter().eq(other.iter())
    }
}

impl Eq for BitIndex {}

impl BitIndex {
    pub fn new() -> Self {
        Default::default()
    }

    fn from_pages(pages: Vec<BitPage>) -> Self {
        if pages.is_empty() {
            return Self::default();
        }
        let mut bits_before = Vec::with_capacity(pages.len());
        let mut ones_before = Vec::with_capacity(pages.len());
        let (mut len, mut ones) = (0, 0);
        for page in pages.iter() {
            bits_before.push(len);
            ones_before.push(ones);
            len += page.len;
            ones += page.ones;
        }
        BitIndex {
            pages,
            bits_before,
            ones_before,
            len,
            ones,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn count_ones(&self) -> usize {
        self.ones
    }

    #[inline]
    pub fn count_zeros(&self) -> usize {
        self.len - self.ones
    }

    /// The page holding bit `index` and the offset of the bit in it.
    /// An index one past the end is placed at the end of the last
    /// page.
    #[inline]
    fn locate(&self, index: usize) -> (usize, usize) {
        let page =
            last_page_at_most(self.pages.len(), index, |p| self.bits_before[p]);
        (page, index - self.bits_before[page])
    }

    fn shift_counts(&mut self, after: usize, bit: bool, grow: bool) {
        for p in after + 1..self.pages.len() {
            if grow {
                self.bits_before[p] += 1;
                self.ones_before[p] += bit as usize;
            } else {
                self.bits_before[p] -= 1;
                self.ones_before[p] -= bit as usize;
            }
        }
    }

    fn split(&mut self, page: usize) {
        let half = self.pages[page].len / 2;
        let tail = self.pages[page].split_off(half);
        let bits = self.bits_before[page] + half;
        let ones = self.ones_before[page] + self.pages[page].ones;

        self.pages.insert(page + 1, tail);
        self.bits_before.insert(page + 1, bits);
        self.ones_before.insert(page + 1, ones);
    }

    #[inline]
    pub fn get(&self, index: usize) -> bool {
        assert!(index < self.len);
        let (page, offset) = self.locate(index);
        self.pages[page].get(offset)
    }

    pub fn set(&mut self, index: usize, value: bool) {
        assert!(index < self.len);
        let (page, offset) = self.locate(index);
        let old = self.pages[page].set(offset, value);
        if old == value {
            return;
        }

        for p in page + 1..self.pages.len() {
            if value {
                self.ones_before[p] += 1;
            } else {
                self.ones_before[p] -= 1;
            }
        }
        if value {
            self.ones += 1;
        } else {
            self.ones -= 1;
        }
    }

    #[inline]
    pub fn push(&mut self, value: bool) {
        self.insert(self.len, value);
    }

    /// Insert `value` at `index`, shifting every later bit up by one.
    pub fn insert(&mut self, index: usize, value: bool) {
        assert!(index <= self.len);
        let (page, offset) = self.locate(index);
        self.pages[page].insert(offset, value);
        self.shift_counts(page, value, true);

        self.len += 1;
        if value {
            self.ones += 1;
        }

        if self.pages[page].len > PAGE_BITS {
            self.split(page);
        }
    }

    /// Remove the bit at `index`, shifting every later bit down by one.
    pub fn remove(&mut self, index: usize) -> bool {
        assert!(index < self.len);
        let (page, offset) = self.locate(index);
        let value = self.pages[page].remove(offset);
        self.shift_counts(page, value, false);

        self.len -= 1;
        if value {
            self.ones -= 1;
        }

        if self.pages[page].len == 0 && self.pages.len() > 1 {
            self.pages.remove(page);
            self.bits_before.remove(page);
            self.ones_before.remove(page);
        }
        value
    }

    /// The number of set bits in `[0, index)`.
    pub fn rank1(&self, index: usize) -> usize {
        assert!(index <= self.len);
        if index == self.len {
            return self.ones;
        }
        let (page, offset) = self.locate(index);
        self.ones_before[page] + self.pages[page].rank1(offset)
    }

    /// The number of unset bits in `[0, index)`.
    #[inline]
    pub fn rank0(&self, index: usize) -> usize {
        index - self.rank1(index)
    }

    /// The position of the `k`th set bit, counting from zero.
    pub fn select1(&self, k: usize) -> Option<usize> {
        if k >= self.ones {
            return None;
        }
        let page = last_page_at_most(self.pages.len(), k, |p| self.ones_before[p]);
        let offset = self.pages[page].select1(k - self.ones_before[page])?;
        Some(self.bits_before[page] + offset)
    }

    /// The position of the `k`th unset bit, counting from zero.
    pub fn select0(&self, k: usize) -> Option<usize> {
        if k >= self.count_zeros() {
            return None;
        }
        let zeros_before = |p: usize| self.bits_before[p] - self.ones_before[p];
        let page = last_page_at_most(self.pages.len(), k, zeros_before);
        let offset = self.pages[page].select0(k - zeros_before(page))?;
        Some(self.bits_before[page] + offset)
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.pages.iter().flat_map(|page| page.iter())
    }
}

#[inline]
fn select_in_block(block: u64, k: usize) -> usize {
    let mut block = block;
    for _ in 0..k {
        block &= block - 1;
    }
    block.trailing_zeros() as usize
}

impl std::iter::FromIterator<bool> for BitIndex {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut index = BitIndex::new();
        iter.into_iter().for_each(|b| index.push(b));
        index
    }
}

/// The serialized form: the bits packed into contiguous blocks,
/// independent of how they are paged.
#[derive(Serialize, Deserialize)]
struct BitIndexRepr {
    len: usize,
    blocks: Vec<u64>,
}

impl From<BitIndex> for BitIndexRepr {
    fn from(index: BitIndex) -> Self {
        let mut blocks = vec![0u64; block_count(index.len)];
        for (ix, bit) in index.iter().enumerate() {
            if bit {
                blocks[ix / BLOCK_BITS] |= 1u64 << (ix % BLOCK_BITS);
            }
        }
        BitIndexRepr {
            len: index.len,
            blocks,
        }
    }
}

impl TryFrom<BitIndexRepr> for BitIndex {
    type Error = String;

    fn try_from(repr: BitIndexRepr) -> Result<Self, Self::Error> {
        if repr.blocks.len() != block_count(repr.len) {
            return Err(format!(
                "bit index of length {} cannot have {} blocks",
                repr.len,
                repr.blocks.len()
            ));
        }

        let rem = repr.len % BLOCK_BITS;
        if let Some(last) = repr.blocks.last() {
            if rem != 0 && last >> rem != 0 {
                return Err("bit index has bits set past its end".to_string());
            }
        }

        let page_blocks = PAGE_BITS / 2 / BLOCK_BITS;
        let pages = repr
            .blocks
            .chunks(page_blocks)
            .enumerate()
            .map(|(ix, blocks)| {
                let start = ix * page_blocks * BLOCK_BITS;
                let len = (blocks.len() * BLOCK_BITS).min(repr.len - start);
                BitPage::from_blocks(blocks, len)
            })
            .collect();
        Ok(BitIndex::from_pages(pages))
    }
}
