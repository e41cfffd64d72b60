//! The `string` core library module

use crate::{prelude::*, QMap};

/// Initializes the `string` core library module
pub fn make_module() -> QMap {
    use QValue::{Bool, List, Str};

    let result = QMap::new();

    result.add_fn("contains", |args| match args {
        [Str(s), Str(pattern)] => Ok(Bool(s.as_str().contains(pattern.as_str()))),
        [Str(_), other] | [other, _] => unexpected_argument_type("s", "a String", other),
        args => wrong_number_of_arguments(2, args.len()),
    });

    result.add_fn("starts_with", |args| match args {
        [Str(s), Str(pattern)] => Ok(Bool(s.as_str().starts_with(pattern.as_str()))),
        [Str(_), other] | [other, _] => unexpected_argument_type("s", "a String", other),
        args => wrong_number_of_arguments(2, args.len()),
    });

    result.add_fn("ends_with", |args| match args {
        [Str(s), Str(pattern)] => Ok(Bool(s.as_str().ends_with(pattern.as_str()))),
        [Str(_), other] | [other, _] => unexpected_argument_type("s", "a String", other),
        args => wrong_number_of_arguments(2, args.len()),
    });

    result.add_fn("trim", |args| match args {
        [Str(s)] => Ok(Str(s.as_str().trim().into())),
        [other] => unexpected_argument_type("s", "a String", other),
        args => wrong_number_of_arguments(1, args.len()),
    });

    result.add_fn("to_upper", |args| match args {
        [Str(s)] => Ok(Str(s.as_str().to_uppercase().into())),
        [other] => unexpected_argument_type("s", "a String", other),
        args => wrong_number_of_arguments(1, args.len()),
    });

    result.add_fn("to_lower", |args| match args {
        [Str(s)] => Ok(Str(s.as_str().to_lowercase().into())),
        [other] => unexpected_argument_type("s", "a String", other),
        args => wrong_number_of_arguments(1, args.len()),
    });

    result.add_fn("split", |args| match args {
        [Str(s), Str(separator)] => {
            let parts = s
                .as_str()
                .split(separator.as_str())
                .map(|part| Str(part.into()))
                .collect::<ValueVec>();
            Ok(List(QList::with_data(parts)))
        }
        [Str(_), other] | [other, _] => unexpected_argument_type("s", "a String", other),
        args => wrong_number_of_arguments(2, args.len()),
    });

    result.add_fn("replace", |args| match args {
        [Str(s), Str(from), Str(to)] => {
            Ok(Str(s.as_str().replace(from.as_str(), to.as_str()).into()))
        }
        [Str(_), Str(_), other] | [Str(_), other, _] | [other, _, _] => {
            unexpected_argument_type("s", "a String", other)
        }
        args => wrong_number_of_arguments(3, args.len()),
    });

    result.add_fn("repeat", |args| match args {
        [Str(s), QValue::Int(n)] => {
            let count = usize::try_from(*n).unwrap_or(0);
            Ok(Str(s.as_str().repeat(count).into()))
        }
        [Str(_), other] | [other, _] => unexpected_argument_type("s", "a String", other),
        args => wrong_number_of_arguments(2, args.len()),
    });

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QValue;

    fn get_fn(name: &str) -> QNativeFunction {
        let module = make_module();
        match module.get(name).unwrap() {
            QValue::NativeFunction(f) => f,
            other => panic!("expected a native function, found {other:?}"),
        }
    }

    #[test]
    fn split_produces_a_list_of_strings() {
        let split = get_fn("split");
        let result = (split.function)(&[QValue::Str("a,b,c".into()), QValue::Str(",".into())]);
        match result.unwrap() {
            QValue::List(parts) => {
                assert_eq!(parts.len(), 3);
                assert_eq!(parts.data()[2], QValue::Str("c".into()));
            }
            other => panic!("expected a list, found {other:?}"),
        }
    }

    #[test]
    fn wrong_argument_types_are_reported_by_name() {
        let trim = get_fn("trim");
        let error = (trim.function)(&[QValue::Int(1)]).unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid type for argument 's': expected a String, found Int"
        );
    }
}
