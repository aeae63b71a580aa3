use serde::{Deserialize, Serialize};

use super::{
    paged::{Iter, PagedIntVec},
    traits::*,
};

/// A sequence of small integer symbols with per-symbol rank and
/// select, backed by a `PagedIntVec`.
///
/// Rank and select scan the range they are given, so callers keep
/// that range short, e.g. to the steps stored on one node. The
/// alphabet grows with the largest symbol inserted.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSeq {
    symbols: PagedIntVec,
}

crate::impl_space_usage!(SymbolSeq, [symbols]);

impl SymbolSeq {
    pub fn new() -> Self {
        Default::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> u64 {
        self.symbols.get(index)
    }

    #[inline]
    pub fn push(&mut self, symbol: u64) {
        self.symbols.append(symbol)
    }

    #[inline]
    pub fn insert(&mut self, index: usize, symbol: u64) {
        self.symbols.insert(index, symbol)
    }

    #[inline]
    pub fn remove(&mut self, index: usize) -> u64 {
        self.symbols.remove(index)
    }

    /// The number of occurrences of `symbol` in `[start, index)`.
    pub fn rank_from(&self, start: usize, index: usize, symbol: u64) -> usize {
        self.symbols
            .iter_slice(start, index - start)
            .filter(|&s| s == symbol)
            .count()
    }

    /// The position of the `k`th occurrence of `symbol` in
    /// `[start, end)`, counting from zero.
    pub fn select_in(
        &self,
        start: usize,
        end: usize,
        k: usize,
        symbol: u64,
    ) -> Option<usize> {
        self.symbols
            .iter_slice(start, end - start)
            .enumerate()
            .filter(|&(_, s)| s == symbol)
            .nth(k)
            .map(|(ix, _)| start + ix)
    }

    pub fn iter(&self) -> Iter<'_> {
        self.symbols.iter()
    }

    pub fn iter_slice(&self, offset: usize, length: usize) -> Iter<'_> {
        self.symbols.iter_slice(offset, length)
    }
}

impl std::iter::FromIterator<u64> for SymbolSeq {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        SymbolSeq {
            symbols: iter.into_iter().collect(),
        }
    }
}
