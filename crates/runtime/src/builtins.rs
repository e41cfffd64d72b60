//! The builtin functions available to every Quill program
//!
//! Builtins are addressed by index from `GetBuiltin` instructions, so the
//! order of [BUILTINS] is part of the contract between the compiler and the
//! runtime. New builtins are appended; existing entries never move.

use crate::{prelude::*, Result};

/// The indexed table of builtin functions
pub const BUILTINS: &[QNativeFunction] = &[
    QNativeFunction::new("len", builtin_len),
    QNativeFunction::new("append", builtin_append),
    QNativeFunction::new("copy", builtin_copy),
    QNativeFunction::new("string", builtin_string),
    QNativeFunction::new("int", builtin_int),
    QNativeFunction::new("float", builtin_float),
    QNativeFunction::new("bool", builtin_bool),
    QNativeFunction::new("char", builtin_char),
    QNativeFunction::new("bytes", builtin_bytes),
    QNativeFunction::new("type_name", builtin_type_name),
    QNativeFunction::new("is_error", builtin_is_error),
];

/// Returns the table index of the named builtin
pub fn builtin_index(name: &str) -> Option<u8> {
    BUILTINS
        .iter()
        .position(|builtin| builtin.name == name)
        .map(|index| index as u8)
}

fn builtin_len(args: &[QValue]) -> Result<QValue> {
    use QValue::*;
    match args {
        [Str(s)] => Ok(Int(s.char_count() as i64)),
        [Bytes(b)] => Ok(Int(b.len() as i64)),
        [List(l) | FrozenList(l)] => Ok(Int(l.len() as i64)),
        [Map(m) | FrozenMap(m)] => Ok(Int(m.len() as i64)),
        [other] => unexpected_argument_type("value", "a sized value", other),
        args => wrong_number_of_arguments(1, args.len()),
    }
}

// Returns a fresh list; the input list is left untouched.
fn builtin_append(args: &[QValue]) -> Result<QValue> {
    use QValue::*;
    match args {
        [List(l) | FrozenList(l), rest @ ..] => {
            let mut data = ValueVec::with_capacity(l.len() + rest.len());
            data.extend(l.data().iter().cloned());
            data.extend(rest.iter().cloned());
            Ok(List(QList::with_data(data)))
        }
        [other, ..] => unexpected_argument_type("list", "a List", other),
        [] => wrong_number_of_arguments(1, 0),
    }
}

// Shallow copy; frozen containers thaw into their mutable counterparts.
fn builtin_copy(args: &[QValue]) -> Result<QValue> {
    use QValue::*;
    match args {
        [List(l) | FrozenList(l)] => Ok(List(QList::from_slice(&l.data()))),
        [Map(m) | FrozenMap(m)] => {
            let data = m
                .data()
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            Ok(Map(QMap::with_data(data)))
        }
        [other] => Ok(other.clone()),
        args => wrong_number_of_arguments(1, args.len()),
    }
}

fn builtin_string(args: &[QValue]) -> Result<QValue> {
    match args {
        [value] => Ok(QValue::Str(value.to_string().into())),
        args => wrong_number_of_arguments(1, args.len()),
    }
}

// Conversion builtins produce Null when the input can't be converted.
fn builtin_int(args: &[QValue]) -> Result<QValue> {
    use QValue::*;
    match args {
        [Int(n)] => Ok(Int(*n)),
        [Float(n)] => Ok(Int(*n as i64)),
        [Bool(b)] => Ok(Int(*b as i64)),
        [Char(c)] => Ok(Int(*c as i64)),
        [Str(s)] => Ok(s.as_str().parse().map_or(Null, Int)),
        [_] => Ok(Null),
        args => wrong_number_of_arguments(1, args.len()),
    }
}

fn builtin_float(args: &[QValue]) -> Result<QValue> {
    use QValue::*;
    match args {
        [Float(n)] => Ok(Float(*n)),
        [Int(n)] => Ok(Float(*n as f64)),
        [Str(s)] => Ok(s.as_str().parse().map_or(Null, Float)),
        [_] => Ok(Null),
        args => wrong_number_of_arguments(1, args.len()),
    }
}

fn builtin_bool(args: &[QValue]) -> Result<QValue> {
    match args {
        [value] => Ok(QValue::Bool(!value.is_falsy())),
        args => wrong_number_of_arguments(1, args.len()),
    }
}

fn builtin_char(args: &[QValue]) -> Result<QValue> {
    use QValue::*;
    match args {
        [Char(c)] => Ok(Char(*c)),
        [Int(n)] => Ok(u32::try_from(*n)
            .ok()
            .and_then(char::from_u32)
            .map_or(Null, Char)),
        [Str(s)] => {
            let mut chars = s.as_str().chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Char(c)),
                _ => Ok(Null),
            }
        }
        [_] => Ok(Null),
        args => wrong_number_of_arguments(1, args.len()),
    }
}

fn builtin_bytes(args: &[QValue]) -> Result<QValue> {
    use QValue::*;
    match args {
        [Bytes(b)] => Ok(Bytes(b.clone())),
        [Str(s)] => Ok(Bytes(s.as_str().as_bytes().into())),
        [_] => Ok(Null),
        args => wrong_number_of_arguments(1, args.len()),
    }
}

fn builtin_type_name(args: &[QValue]) -> Result<QValue> {
    match args {
        [value] => Ok(QValue::Str(value.type_as_string().into())),
        args => wrong_number_of_arguments(1, args.len()),
    }
}

fn builtin_is_error(args: &[QValue]) -> Result<QValue> {
    match args {
        [value] => Ok(QValue::Bool(matches!(value, QValue::Error(_)))),
        args => wrong_number_of_arguments(1, args.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_counts_code_points_for_strings() {
        let result = builtin_len(&[QValue::Str("héllo".into())]).unwrap();
        assert_eq!(result, QValue::Int(5));
    }

    #[test]
    fn append_leaves_the_input_untouched() {
        let list = QList::from_slice(&[QValue::Int(1)]);
        let result = builtin_append(&[QValue::List(list.clone()), QValue::Int(2)]).unwrap();
        assert_eq!(list.len(), 1);
        match result {
            QValue::List(appended) => assert_eq!(appended.len(), 2),
            other => panic!("expected a list, found {other:?}"),
        }
    }

    #[test]
    fn conversions_produce_null_when_unconvertible() {
        assert_eq!(builtin_int(&[QValue::Str("12".into())]).unwrap(), QValue::Int(12));
        assert_eq!(builtin_int(&[QValue::Str("nope".into())]).unwrap(), QValue::Null);
        assert_eq!(builtin_char(&[QValue::Str("ab".into())]).unwrap(), QValue::Null);
    }

    #[test]
    fn builtin_indices_are_stable() {
        assert_eq!(builtin_index("len"), Some(0));
        assert_eq!(builtin_index("is_error"), Some(10));
        assert_eq!(builtin_index("missing"), None);
    }
}
