use crate::{Borrow, BorrowMut, PtrMut, QValue};
use std::cell::RefCell;

/// The underlying Vec type used by [QList]
pub type ValueVec = smallvec::SmallVec<[QValue; 4]>;

/// The Quill runtime's List type
///
/// The element storage is shared between instances; freezing a list rebinds
/// the same storage under the frozen value variant, removing the write
/// capability without copying.
#[derive(Clone, Default)]
pub struct QList(PtrMut<ValueVec>);

impl QList {
    /// Creates an empty list with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self(PtrMut::new(RefCell::new(ValueVec::with_capacity(capacity))))
    }

    /// Creates a list containing the provided data
    pub fn with_data(data: ValueVec) -> Self {
        Self(PtrMut::new(RefCell::new(data)))
    }

    /// Creates a list containing the provided slice of [QValue]s
    pub fn from_slice(data: &[QValue]) -> Self {
        Self::with_data(data.iter().cloned().collect())
    }

    /// Returns the number of entries of the list
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// Returns true if there are no entries in the list
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a reference to the list's entries
    pub fn data(&self) -> Borrow<'_, ValueVec> {
        self.0.borrow()
    }

    /// Returns a mutable reference to the list's entries
    pub fn data_mut(&self) -> BorrowMut<'_, ValueVec> {
        self.0.borrow_mut()
    }

    /// Returns true if both lists share the same element storage
    pub fn ptr_eq(&self, other: &Self) -> bool {
        PtrMut::ptr_eq(&self.0, &other.0)
    }
}
