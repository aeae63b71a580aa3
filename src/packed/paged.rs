use serde::{Deserialize, Serialize};

use super::{last_page_at_most, traits::*, vector::PackedIntVec};

/// Pages are split once they grow past this many elements.
const PAGE_SIZE: usize = 1024;

/// A dynamic integer vector stored as a list of `PackedIntVec` pages.
///
/// Each page is packed to the width of its own widest element, and
/// `starts` holds the index of the first element of each page. An
/// insertion or removal shifts the elements of a single page, then
/// moves the starts of the pages after it.
///
/// Every page but a lone first page is nonempty, so an index is found
/// with a binary search over `starts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<u64>", into = "Vec<u64>")]
pub struct PagedIntVec {
    pages: Vec<PackedIntVec>,
    starts: Vec<usize>,
    num_entries: usize,
}

crate::impl_space_usage!(PagedIntVec, [pages, starts]);

impl Default for PagedIntVec {
    fn default() -> Self {
        PagedIntVec {
            pages: vec![PackedIntVec::new()],
            starts: vec![0],
            num_entries: 0,
        }
    }
}

impl PartialEq for PagedIntVec {
    #[inline]
    fn eq(&self, other: &PagedIntVec) -> bool {
        self.num_entries == other.num_entries && self.iter().eq(other.iter())
    }
}

impl Eq for PagedIntVec {}

impl PagedIntVec {
    pub fn new() -> Self {
        Default::default()
    }

    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The page holding `index`, and the offset of `index` in it. An
    /// index one past the end is placed at the end of the last page.
    #[inline]
    fn locate(&self, index: usize) -> (usize, usize) {
        let page = last_page_at_most(self.pages.len(), index, |p| self.starts[p]);
        (page, index - self.starts[page])
    }

    #[inline]
    fn shift_starts(&mut self, after: usize, grow: bool, count: usize) {
        for start in self.starts[after + 1..].iter_mut() {
            if grow {
                *start += count;
            } else {
                *start -= count;
            }
        }
    }

    /// Break an oversized page into evenly filled pages of at most half
    /// the page size.
    fn split(&mut self, page: usize) {
        let values: Vec<u64> = std::mem::take(&mut self.pages[page]).into();
        let start = self.starts[page];

        let parts = (values.len() + PAGE_SIZE / 2 - 1) / (PAGE_SIZE / 2);
        let size = (values.len() + parts - 1) / parts;
        let chunks = values.chunks(size);
        let new_starts = (0..chunks.len())
            .map(|ix| start + ix * size)
            .collect::<Vec<_>>();
        let new_pages = chunks
            .map(|chunk| chunk.iter().copied().collect::<PackedIntVec>())
            .collect::<Vec<_>>();

        self.pages.splice(page..=page, new_pages);
        self.starts.splice(page..=page, new_starts);
    }

    /// Drop `page` if it is empty and not the only page.
    fn drop_if_empty(&mut self, page: usize) {
        if self.pages[page].is_empty() && self.pages.len() > 1 {
            self.pages.remove(page);
            self.starts.remove(page);
        }
    }

    pub fn iter(&self) -> Iter<'_> {
        self.iter_slice(0, self.num_entries)
    }

    /// Iterate over the `length` elements starting at `offset`.
    pub fn iter_slice(&self, offset: usize, length: usize) -> Iter<'_> {
        assert!(offset + length <= self.num_entries);
        Iter {
            vec: self,
            front: self.locate(offset),
            back: self.locate(offset + length),
            remaining: length,
        }
    }
}

impl PackedCollection for PagedIntVec {
    #[inline]
    fn len(&self) -> usize {
        self.num_entries
    }

    #[inline]
    fn clear(&mut self) {
        *self = Self::default();
    }

    #[inline]
    fn set(&mut self, index: usize, value: u64) {
        assert!(index < self.num_entries);
        let (page, offset) = self.locate(index);
        self.pages[page].set(offset, value);
    }

    #[inline]
    fn get(&self, index: usize) -> u64 {
        assert!(index < self.num_entries);
        let (page, offset) = self.locate(index);
        self.pages[page].get(offset)
    }

    #[inline]
    fn append(&mut self, value: u64) {
        self.insert(self.num_entries, value);
    }

    #[inline]
    fn pop(&mut self) {
        if let Some(last) = self.num_entries.checked_sub(1) {
            self.remove(last);
        }
    }
}

impl DynamicCollection for PagedIntVec {
    fn insert(&mut self, index: usize, value: u64) {
        assert!(index <= self.num_entries);
        let (page, offset) = self.locate(index);
        self.pages[page].insert(offset, value);
        self.shift_starts(page, true, 1);
        self.num_entries += 1;

        if self.pages[page].len() > PAGE_SIZE {
            self.split(page);
        }
    }

    fn remove(&mut self, index: usize) -> u64 {
        assert!(index < self.num_entries);
        let (page, offset) = self.locate(index);
        let value = self.pages[page].remove(offset);
        self.shift_starts(page, false, 1);
        self.num_entries -= 1;
        self.drop_if_empty(page);
        value
    }

    fn insert_slice(&mut self, index: usize, values: &[u64]) {
        assert!(index <= self.num_entries);
        if values.is_empty() {
            return;
        }
        let (page, offset) = self.locate(index);
        self.pages[page].insert_slice(offset, values);
        self.shift_starts(page, true, values.len());
        self.num_entries += values.len();

        if self.pages[page].len() > PAGE_SIZE {
            self.split(page);
        }
    }

    fn remove_range(&mut self, index: usize, count: usize) -> Vec<u64> {
        assert!(index + count <= self.num_entries);
        let mut removed = Vec::with_capacity(count);
        while removed.len() < count {
            let (page, offset) = self.locate(index);
            let take = (count - removed.len()).min(self.pages[page].len() - offset);
            removed.extend(self.pages[page].remove_range(offset, take));
            self.shift_starts(page, false, take);
            self.num_entries -= take;
            self.drop_if_empty(page);
        }
        removed
    }
}

/// Iterator over a range of a `PagedIntVec`, from either end.
///
/// `front` and `back` are (page, offset) positions; `back` is
/// exclusive.
pub struct Iter<'a> {
    vec: &'a PagedIntVec,
    front: (usize, usize),
    back: (usize, usize),
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        let (mut page, mut offset) = self.front;
        while offset >= self.vec.pages[page].len() {
            page += 1;
            offset = 0;
        }
        let item = self.vec.pages[page].get(offset);
        self.front = (page, offset + 1);
        self.remaining -= 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a> DoubleEndedIterator for Iter<'a> {
    #[inline]
    fn next_back(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        let (mut page, mut offset) = self.back;
        while offset == 0 {
            page -= 1;
            offset = self.vec.pages[page].len();
        }
        offset -= 1;
        let item = self.vec.pages[page].get(offset);
        self.back = (page, offset);
        self.remaining -= 1;
        Some(item)
    }
}

impl<'a> ExactSizeIterator for Iter<'a> {}

impl std::iter::FromIterator<u64> for PagedIntVec {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        let mut paged = PagedIntVec::new();
        iter.into_iter().for_each(|v| paged.append(v));
        paged
    }
}

impl From<Vec<u64>> for PagedIntVec {
    fn from(vector: Vec<u64>) -> Self {
        vector.into_iter().collect()
    }
}

impl From<PagedIntVec> for Vec<u64> {
    fn from(paged: PagedIntVec) -> Self {
        paged.iter().collect()
    }
}
