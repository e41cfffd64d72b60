use crate::{Borrow, BorrowMut, NativeFn, PtrMut, QNativeFunction, QString, QValue};
use indexmap::IndexMap;
use rustc_hash::FxHasher;
use std::{
    cell::RefCell,
    hash::BuildHasherDefault,
    ops::{Deref, DerefMut},
};

/// The hasher used throughout the Quill runtime
pub type QuillHasher = FxHasher;

type ValueMapType = IndexMap<QString, QValue, BuildHasherDefault<QuillHasher>>;

/// The (String -> Value) data map used by the Quill runtime
///
/// Backed by an insertion-ordered map, so iteration order is stable for as
/// long as the map is alive.
///
/// See also: [QMap]
#[derive(Clone, Default)]
pub struct ValueMap(ValueMapType);

impl ValueMap {
    /// Creates a new ValueMap with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self(ValueMapType::with_capacity_and_hasher(
            capacity,
            Default::default(),
        ))
    }
}

impl Deref for ValueMap {
    type Target = ValueMapType;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for ValueMap {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl FromIterator<(QString, QValue)> for ValueMap {
    fn from_iter<T: IntoIterator<Item = (QString, QValue)>>(iter: T) -> ValueMap {
        Self(ValueMapType::from_iter(iter))
    }
}

/// The hash map value type used in Quill
///
/// The entry storage is shared between instances; freezing a map rebinds the
/// same storage under the frozen value variant.
#[derive(Clone, Default)]
pub struct QMap {
    data: PtrMut<ValueMap>,
}

impl QMap {
    /// Creates an empty QMap
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty QMap with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_data(ValueMap::with_capacity(capacity))
    }

    /// Creates a QMap initialized with the provided data
    pub fn with_data(data: ValueMap) -> Self {
        Self {
            data: PtrMut::new(RefCell::new(data)),
        }
    }

    /// Provides a reference to the map's data
    pub fn data(&self) -> Borrow<'_, ValueMap> {
        self.data.borrow()
    }

    /// Provides a mutable reference to the map's data
    pub fn data_mut(&self) -> BorrowMut<'_, ValueMap> {
        self.data.borrow_mut()
    }

    /// Inserts an entry into the map
    pub fn insert(&self, key: impl Into<QString>, value: impl Into<QValue>) {
        self.data_mut().insert(key.into(), value.into());
    }

    /// Returns a clone of the value corresponding to the key
    pub fn get(&self, key: &str) -> Option<QValue> {
        self.data().get(key).cloned()
    }

    /// Adds a native function to the map
    pub fn add_fn(&self, name: &'static str, function: NativeFn) {
        self.insert(name, QValue::NativeFunction(QNativeFunction::new(name, function)));
    }

    /// Returns the number of entries in the map
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// Returns true if the map contains no entries
    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    /// Returns a snapshot of the map's keys, in iteration order
    pub fn keys(&self) -> Vec<QString> {
        self.data().keys().cloned().collect()
    }

    /// Returns true if both maps share the same entry storage
    pub fn ptr_eq(&self, other: &Self) -> bool {
        PtrMut::ptr_eq(&self.data, &other.data)
    }
}
