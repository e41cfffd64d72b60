//! The core value type used in the Quill runtime

use crate::{prelude::*, Ptr, PtrMut, Result};
use quill_bytecode::CompiledFunction;
use std::{cell::RefCell, fmt};

/// A shared, mutable slot holding a value
///
/// The operand stack, the globals array, and closure captures all hold
/// values through these handles. Two handles may alias the same slot, which
/// is what lets a closure observe writes to a captured local.
pub type ValueRef = PtrMut<QValue>;

/// Creates a fresh slot holding the given value
pub fn value_ref(value: QValue) -> ValueRef {
    PtrMut::new(RefCell::new(value))
}

/// The core value type for Quill
#[derive(Clone, Default)]
pub enum QValue {
    /// The default type representing the absence of a value
    #[default]
    Null,

    /// A boolean, can be either true or false
    Bool(bool),

    /// A 64 bit signed integer
    Int(i64),

    /// A 64 bit float
    Float(f64),

    /// A single Unicode code point
    Char(char),

    /// The string type used in Quill
    Str(QString),

    /// An immutable byte sequence
    Bytes(QBytes),

    /// The mutable list type used in Quill
    List(QList),

    /// A list whose write capability has been removed
    ///
    /// Freezing shares storage with the source list, so a frozen list made
    /// from a list that's still reachable elsewhere observes its mutations.
    FrozenList(QList),

    /// The mutable hash map type used in Quill
    Map(QMap),

    /// A map whose write capability has been removed
    FrozenMap(QMap),

    /// An error value wrapping the value it was created from
    Error(Ptr<QValue>),

    /// A compiled function with no captured slots
    Function(Ptr<CompiledFunction>),

    /// A compiled function bundled with captured slots
    Closure(Ptr<QClosure>),

    /// A function that's implemented outside of the Quill runtime
    NativeFunction(QNativeFunction),

    /// The iterator type used in Quill
    Iterator(QIterator),
}

impl QValue {
    /// Returns the value's type as a string
    pub fn type_as_string(&self) -> &'static str {
        use QValue::*;
        match self {
            Null => "Null",
            Bool(_) => "Bool",
            Int(_) => "Int",
            Float(_) => "Float",
            Char(_) => "Char",
            Str(_) => "String",
            Bytes(_) => "Bytes",
            List(_) => "List",
            FrozenList(_) => "FrozenList",
            Map(_) => "Map",
            FrozenMap(_) => "FrozenMap",
            Error(_) => "Error",
            Function(_) | Closure(_) | NativeFunction(_) => "Function",
            Iterator(_) => "Iterator",
        }
    }

    /// Returns the value's Boolean projection, inverted
    ///
    /// Null, false, zero, and empty strings, byte sequences, lists, and maps
    /// are falsy; every other value is truthy.
    pub fn is_falsy(&self) -> bool {
        use QValue::*;
        match self {
            Null => true,
            Bool(b) => !b,
            Int(n) => *n == 0,
            Float(n) => *n == 0.0,
            Str(s) => s.as_str().is_empty(),
            Bytes(b) => b.is_empty(),
            List(l) | FrozenList(l) => l.is_empty(),
            Map(m) | FrozenMap(m) => m.is_empty(),
            _ => false,
        }
    }

    /// Reads an element out of an indexable value
    ///
    /// Missing map keys produce Null; sequence indices are bounds-checked.
    /// Error values expose their wrapped value under the single key "value".
    pub fn index_get(&self, index: &QValue) -> Result<QValue> {
        use QValue::*;
        match self {
            List(list) | FrozenList(list) => match index {
                Int(i) => {
                    let data = list.data();
                    if *i < 0 || *i as usize >= data.len() {
                        runtime_error!(ErrorKind::IndexOutOfBounds { index: *i })
                    } else {
                        Ok(data[*i as usize].clone())
                    }
                }
                other => runtime_error!(ErrorKind::InvalidIndexType {
                    type_name: other.type_as_string()
                }),
            },
            Map(map) | FrozenMap(map) => match index {
                Str(key) => Ok(map.get(key.as_str()).unwrap_or(Null)),
                other => runtime_error!(ErrorKind::InvalidIndexType {
                    type_name: other.type_as_string()
                }),
            },
            Str(s) => match index {
                Int(i) => match usize::try_from(*i).ok().and_then(|i| s.char_at(i)) {
                    Some(c) => Ok(Char(c)),
                    None => runtime_error!(ErrorKind::IndexOutOfBounds { index: *i }),
                },
                other => runtime_error!(ErrorKind::InvalidIndexType {
                    type_name: other.type_as_string()
                }),
            },
            Bytes(bytes) => match index {
                Int(i) => match usize::try_from(*i)
                    .ok()
                    .and_then(|i| bytes.as_slice().get(i).copied())
                {
                    Some(byte) => Ok(Int(byte as i64)),
                    None => runtime_error!(ErrorKind::IndexOutOfBounds { index: *i }),
                },
                other => runtime_error!(ErrorKind::InvalidIndexType {
                    type_name: other.type_as_string()
                }),
            },
            Error(inner) => match index {
                Str(key) if key.as_str() == "value" => Ok((**inner).clone()),
                _ => runtime_error!(ErrorKind::InvalidErrorIndex),
            },
            other => runtime_error!(ErrorKind::NotIndexable {
                type_name: other.type_as_string()
            }),
        }
    }

    /// Writes an element into an index-assignable value
    pub fn index_set(&self, index: &QValue, value: &QValue) -> Result<()> {
        use QValue::*;
        match self {
            List(list) => match index {
                Int(i) => {
                    let mut data = list.data_mut();
                    if *i < 0 || *i as usize >= data.len() {
                        runtime_error!(ErrorKind::IndexOutOfBounds { index: *i })
                    } else {
                        data[*i as usize] = value.clone();
                        Ok(())
                    }
                }
                other => runtime_error!(ErrorKind::InvalidIndexType {
                    type_name: other.type_as_string()
                }),
            },
            Map(map) => match index {
                Str(key) => {
                    map.insert(key.clone(), value.clone());
                    Ok(())
                }
                other => runtime_error!(ErrorKind::InvalidIndexType {
                    type_name: other.type_as_string()
                }),
            },
            FrozenList(_) | FrozenMap(_) => runtime_error!(ErrorKind::ImmutableAssignment {
                type_name: self.type_as_string()
            }),
            other => runtime_error!(ErrorKind::NotIndexAssignable {
                type_name: other.type_as_string()
            }),
        }
    }
}

impl PartialEq for QValue {
    fn eq(&self, other: &Self) -> bool {
        use QValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            // The numeric pair compares by mathematical value
            (Int(a), Float(b)) => *a as f64 == *b,
            (Float(a), Int(b)) => *a == *b as f64,
            (Char(a), Char(b)) => a == b,
            (Str(a), Str(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (List(a), List(b)) | (FrozenList(a), FrozenList(b)) => {
                *a.data() == *b.data()
            }
            (Map(a), Map(b)) | (FrozenMap(a), FrozenMap(b)) => {
                a.len() == b.len()
                    && a.data()
                        .iter()
                        .all(|(key, value)| b.get(key.as_str()).as_ref() == Some(value))
            }
            (Error(a), Error(b)) => Ptr::ptr_eq(a, b),
            (Function(a), Function(b)) => Ptr::ptr_eq(a, b),
            (Closure(a), Closure(b)) => Ptr::ptr_eq(a, b),
            (NativeFunction(a), NativeFunction(b)) => std::ptr::fn_addr_eq(a.function, b.function),
            (Iterator(a), Iterator(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for QValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use QValue::*;
        match self {
            Null => write!(f, "null"),
            Bool(b) => write!(f, "{b}"),
            Int(n) => write!(f, "{n}"),
            Float(n) => write!(f, "{n}"),
            Char(c) => write!(f, "{c}"),
            Str(s) => write!(f, "{s}"),
            Bytes(b) => write!(f, "{b}"),
            List(l) | FrozenList(l) => {
                write!(f, "[")?;
                for (i, value) in l.data().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    fmt_element(value, f)?;
                }
                write!(f, "]")
            }
            Map(m) | FrozenMap(m) => {
                write!(f, "{{")?;
                for (i, (key, value)) in m.data().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: ")?;
                    fmt_element(value, f)?;
                }
                write!(f, "}}")
            }
            Error(inner) => write!(f, "error: {inner}"),
            Function(_) | Closure(_) => write!(f, "<function>"),
            NativeFunction(native) => write!(f, "<native function: {}>", native.name),
            Iterator(_) => write!(f, "<iterator>"),
        }
    }
}

// Strings and chars are quoted when rendered inside containers
fn fmt_element(value: &QValue, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        QValue::Str(s) => write!(f, "{:?}", s.as_str()),
        QValue::Char(c) => write!(f, "{c:?}"),
        other => write!(f, "{other}"),
    }
}

impl fmt::Debug for QValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_as_string(), self)
    }
}

impl From<bool> for QValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for QValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for QValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<char> for QValue {
    fn from(value: char) -> Self {
        Self::Char(value)
    }
}

impl From<&str> for QValue {
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for QValue {
    fn from(value: String) -> Self {
        Self::Str(value.into())
    }
}

impl From<QString> for QValue {
    fn from(value: QString) -> Self {
        Self::Str(value)
    }
}

impl From<QBytes> for QValue {
    fn from(value: QBytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<QList> for QValue {
    fn from(value: QList) -> Self {
        Self::List(value)
    }
}

impl From<QMap> for QValue {
    fn from(value: QMap) -> Self {
        Self::Map(value)
    }
}

impl From<QIterator> for QValue {
    fn from(value: QIterator) -> Self {
        Self::Iterator(value)
    }
}

impl From<QNativeFunction> for QValue {
    fn from(value: QNativeFunction) -> Self {
        Self::NativeFunction(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_mem_size() {
        // All QValue variants should have a size of <= 24 bytes, and with the
        // variant flag the total size of QValue will be <= 32 bytes.
        assert!(std::mem::size_of::<QValue>() <= 32);
    }

    #[test]
    fn numeric_equality_crosses_variants() {
        assert_eq!(QValue::Int(2), QValue::Float(2.0));
        assert_eq!(QValue::Float(-1.0), QValue::Int(-1));
        assert_ne!(QValue::Int(2), QValue::Float(2.5));
        assert_ne!(QValue::Int(0), QValue::Null);
    }

    #[test]
    fn container_equality_is_deep_but_variant_strict() {
        let a = QList::from_slice(&[QValue::Int(1), QValue::Str("x".into())]);
        let b = QList::from_slice(&[QValue::Int(1), QValue::Str("x".into())]);
        assert_eq!(QValue::List(a.clone()), QValue::List(b.clone()));
        assert_ne!(QValue::List(a), QValue::FrozenList(b));
    }

    #[test]
    fn missing_map_keys_index_to_null() {
        let map = QMap::new();
        map.insert("a", QValue::Int(1));
        let value = QValue::Map(map);
        assert_eq!(value.index_get(&QValue::Str("b".into())).unwrap(), QValue::Null);
    }

    #[test]
    fn frozen_containers_reject_assignment() {
        let list = QList::from_slice(&[QValue::Int(1)]);
        let frozen = QValue::FrozenList(list);
        let result = frozen.index_set(&QValue::Int(0), &QValue::Int(2));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("cannot assign to immutable value"));
    }
}
