//! Succinct primitives the graph indices are built from.
//!
//! * [`PackedIntVec`] is a bit-packed integer vector, used on its own
//!   for append-only data and as the page type of [`PagedIntVec`].
//! * [`PagedIntVec`] is a packed integer vector that can grow and
//!   shrink anywhere, split into pages so that an edit only shifts
//!   the elements of one page.
//! * [`BitIndex`] is a dynamic bit vector with rank and select.
//! * [`SymbolSeq`] is a sequence over a small integer alphabet with
//!   per-symbol rank and select over a range.

pub mod bitvec;
pub mod paged;
pub mod symbols;
pub mod traits;
pub mod vector;

pub use self::{
    bitvec::BitIndex, paged::PagedIntVec, symbols::SymbolSeq, traits::*,
    vector::PackedIntVec,
};

/// Binary search over the prefix counts of a list of pages: the last
/// page `p` with `before(p) <= target`. `before` must be nondecreasing
/// and zero for the first page.
#[inline]
pub(crate) fn last_page_at_most<F>(pages: usize, target: usize, before: F) -> usize
where
    F: Fn(usize) -> usize,
{
    let mut lo = 0;
    let mut hi = pages;
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if before(mid) <= target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}

#[macro_export]
macro_rules! impl_space_usage {
    ($for:ty, [$first:ident $(, $field:ident)*]) => {
        impl succinct::SpaceUsage for $for {
            #[inline]
            fn is_stack_only() -> bool {
                false
            }

            fn heap_bytes(&self) -> usize {
                succinct::SpaceUsage::heap_bytes(&self.$first)
                    $(
                        + succinct::SpaceUsage::heap_bytes(&self.$field)
                        )*
            }
        }
    };
}
