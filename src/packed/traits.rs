/// A collection built from one or more packed vectors
pub trait PackedCollection {
    fn len(&self) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn set(&mut self, index: usize, value: u64);

    fn get(&self, index: usize) -> u64;

    fn append(&mut self, value: u64);

    fn pop(&mut self);

    fn clear(&mut self);

    /// Get the element at `index` and unpack it.
    #[inline]
    fn get_unpack<T: PackedElement>(&self, index: usize) -> T {
        T::unpack(self.get(index))
    }

    /// Set the element at `index` to the packed representation of `value`.
    #[inline]
    fn set_pack<T: PackedElement>(&mut self, index: usize, value: T) {
        self.set(index, value.pack())
    }
}

/// A packed collection that can grow and shrink at any position,
/// not just at the end.
///
/// Elements after the affected index are shifted, so both operations
/// are linear in the length of the collection.
pub trait DynamicCollection: PackedCollection {
    fn insert(&mut self, index: usize, value: u64);

    fn remove(&mut self, index: usize) -> u64;

    /// Insert all of `values` starting at `index`, in order.
    fn insert_slice(&mut self, index: usize, values: &[u64]) {
        for (offset, &value) in values.iter().enumerate() {
            self.insert(index + offset, value);
        }
    }

    /// Remove `count` elements starting at `index`, returning them in
    /// their original order.
    fn remove_range(&mut self, index: usize, count: usize) -> Vec<u64> {
        (0..count).map(|_| self.remove(index)).collect()
    }
}

/// An element that can be packed into a PackedCollection element as a
/// u64, and unpacked to its original form.
pub trait PackedElement: Sized + Copy {
    fn unpack(v: u64) -> Self;

    fn pack(self) -> u64;
}

impl PackedElement for bool {
    #[inline]
    fn unpack(v: u64) -> bool {
        v == 1
    }

    #[inline]
    fn pack(self) -> u64 {
        self.into()
    }
}

impl PackedElement for u8 {
    #[inline]
    fn unpack(v: u64) -> u8 {
        use std::convert::TryFrom;
        if let Ok(u) = u8::try_from(v) {
            u
        } else {
            std::u8::MAX
        }
    }

    #[inline]
    fn pack(self) -> u64 {
        u64::from(self)
    }
}

// Can't use a generic implementation for T: From<u64> + Into<u64>
// because "upstream crates may add a new impl of trait
// `std::convert::From<u64>` for type `bool` in future versions"
macro_rules! impl_packed_element_as {
    ($for:ty) => {
        impl PackedElement for $for {
            #[inline]
            fn unpack(v: u64) -> $for {
                v as $for
            }

            #[inline]
            fn pack(self) -> u64 {
                self as u64
            }
        }
    };
}

impl_packed_element_as!(usize);
impl_packed_element_as!(u64);
