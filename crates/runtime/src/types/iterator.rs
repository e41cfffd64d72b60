use crate::{PtrMut, QBytes, QList, QMap, QString, QValue};
use std::{cell::RefCell, fmt};

/// The iterator value type used in Quill
///
/// An iterator starts out positioned before its first element. [QIterator::next]
/// advances it and reports whether a current element exists; [QIterator::key]
/// and [QIterator::value] read the current element and are only meaningful
/// after a call to `next` has returned true.
#[derive(Clone)]
pub struct QIterator(PtrMut<IteratorState>);

// Each iterable container gets its own iterator flavour.
//
// `position` counts advances, so the current element lives at position - 1.
// List and map iterators read through the live container when the current
// value is requested; strings and map keys are snapshotted when the iterator
// is created so that iteration order stays stable.
enum IteratorState {
    List {
        list: QList,
        position: usize,
    },
    Str {
        chars: Vec<char>,
        position: usize,
    },
    Bytes {
        bytes: QBytes,
        position: usize,
    },
    Map {
        map: QMap,
        keys: Vec<QString>,
        position: usize,
    },
}

impl QIterator {
    /// Creates an iterator over a list's elements, by ascending index
    pub fn with_list(list: QList) -> Self {
        Self::new(IteratorState::List { list, position: 0 })
    }

    /// Creates an iterator over a string's code points
    ///
    /// Keys are code-point indices, values are the code points.
    pub fn with_string(string: &QString) -> Self {
        Self::new(IteratorState::Str {
            chars: string.as_str().chars().collect(),
            position: 0,
        })
    }

    /// Creates an iterator over a byte sequence
    pub fn with_bytes(bytes: QBytes) -> Self {
        Self::new(IteratorState::Bytes { bytes, position: 0 })
    }

    /// Creates an iterator over a map's entries
    ///
    /// The key order is the map's entry order at the time the iterator is
    /// created, and stays stable for the iterator's lifetime.
    pub fn with_map(map: QMap) -> Self {
        let keys = map.keys();
        Self::new(IteratorState::Map {
            map,
            keys,
            position: 0,
        })
    }

    /// Advances the iterator, returning true if a current element exists
    pub fn next(&self) -> bool {
        let mut state = self.0.borrow_mut();
        let remaining = state.position() < state.len();
        if remaining {
            state.advance();
        }
        remaining
    }

    /// Returns the current element's key
    pub fn key(&self) -> QValue {
        let state = self.0.borrow();
        let Some(current) = state.position().checked_sub(1) else {
            return QValue::Null;
        };

        match &*state {
            IteratorState::List { .. }
            | IteratorState::Str { .. }
            | IteratorState::Bytes { .. } => QValue::Int(current as i64),
            IteratorState::Map { keys, .. } => keys
                .get(current)
                .map_or(QValue::Null, |key| QValue::Str(key.clone())),
        }
    }

    /// Returns the current element's value
    pub fn value(&self) -> QValue {
        let state = self.0.borrow();
        let Some(current) = state.position().checked_sub(1) else {
            return QValue::Null;
        };

        match &*state {
            IteratorState::List { list, .. } => {
                list.data().get(current).cloned().unwrap_or(QValue::Null)
            }
            IteratorState::Str { chars, .. } => {
                chars.get(current).map_or(QValue::Null, |c| QValue::Char(*c))
            }
            IteratorState::Bytes { bytes, .. } => bytes
                .as_slice()
                .get(current)
                .map_or(QValue::Null, |byte| QValue::Int(*byte as i64)),
            IteratorState::Map { map, keys, .. } => keys
                .get(current)
                .and_then(|key| map.get(key.as_str()))
                .unwrap_or(QValue::Null),
        }
    }

    /// Returns true if both values are the same iterator
    pub fn ptr_eq(&self, other: &Self) -> bool {
        PtrMut::ptr_eq(&self.0, &other.0)
    }

    fn new(state: IteratorState) -> Self {
        Self(PtrMut::new(RefCell::new(state)))
    }
}

impl IteratorState {
    fn len(&self) -> usize {
        match self {
            IteratorState::List { list, .. } => list.len(),
            IteratorState::Str { chars, .. } => chars.len(),
            IteratorState::Bytes { bytes, .. } => bytes.len(),
            IteratorState::Map { keys, .. } => keys.len(),
        }
    }

    fn position(&self) -> usize {
        match self {
            IteratorState::List { position, .. }
            | IteratorState::Str { position, .. }
            | IteratorState::Bytes { position, .. }
            | IteratorState::Map { position, .. } => *position,
        }
    }

    fn advance(&mut self) {
        match self {
            IteratorState::List { position, .. }
            | IteratorState::Str { position, .. }
            | IteratorState::Bytes { position, .. }
            | IteratorState::Map { position, .. } => *position += 1,
        }
    }
}

impl fmt::Debug for QIterator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<iterator>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_iteration_visits_elements_by_ascending_index() {
        let list = QList::from_slice(&[QValue::Int(10), QValue::Int(20)]);
        let iterator = QIterator::with_list(list);

        assert!(iterator.next());
        assert_eq!(iterator.key(), QValue::Int(0));
        assert_eq!(iterator.value(), QValue::Int(10));
        assert!(iterator.next());
        assert_eq!(iterator.key(), QValue::Int(1));
        assert_eq!(iterator.value(), QValue::Int(20));
        assert!(!iterator.next());
        assert!(!iterator.next());
    }

    #[test]
    fn string_iteration_uses_code_point_indices() {
        let s = QString::from("héß");
        let iterator = QIterator::with_string(&s);

        assert!(iterator.next());
        assert_eq!(iterator.value(), QValue::Char('h'));
        assert!(iterator.next());
        assert_eq!(iterator.key(), QValue::Int(1));
        assert_eq!(iterator.value(), QValue::Char('é'));
        assert!(iterator.next());
        assert_eq!(iterator.value(), QValue::Char('ß'));
        assert!(!iterator.next());
    }

    #[test]
    fn map_iteration_order_is_stable_while_iterating() {
        let map = QMap::new();
        map.insert("a", QValue::Int(1));
        map.insert("b", QValue::Int(2));

        let iterator = QIterator::with_map(map.clone());
        assert!(iterator.next());
        assert_eq!(iterator.key(), QValue::Str("a".into()));
        assert_eq!(iterator.value(), QValue::Int(1));

        // Values are read through the live map
        map.insert("b", QValue::Int(20));
        assert!(iterator.next());
        assert_eq!(iterator.value(), QValue::Int(20));
    }
}
