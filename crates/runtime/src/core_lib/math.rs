//! The `math` core library module

use crate::{prelude::*, QMap};

/// Initializes the `math` core library module
pub fn make_module() -> QMap {
    use QValue::{Float, Int};

    let result = QMap::new();

    result.insert("pi", Float(std::f64::consts::PI));
    result.insert("e", Float(std::f64::consts::E));
    result.insert("tau", Float(std::f64::consts::TAU));

    result.add_fn("abs", |args| match args {
        [Int(n)] => Ok(Int(n.wrapping_abs())),
        [Float(n)] => Ok(Float(n.abs())),
        [other] => unexpected_argument_type("n", "a number", other),
        args => wrong_number_of_arguments(1, args.len()),
    });

    result.add_fn("floor", |args| match args {
        [Int(n)] => Ok(Int(*n)),
        [Float(n)] => Ok(Float(n.floor())),
        [other] => unexpected_argument_type("n", "a number", other),
        args => wrong_number_of_arguments(1, args.len()),
    });

    result.add_fn("ceil", |args| match args {
        [Int(n)] => Ok(Int(*n)),
        [Float(n)] => Ok(Float(n.ceil())),
        [other] => unexpected_argument_type("n", "a number", other),
        args => wrong_number_of_arguments(1, args.len()),
    });

    result.add_fn("round", |args| match args {
        [Int(n)] => Ok(Int(*n)),
        [Float(n)] => Ok(Float(n.round())),
        [other] => unexpected_argument_type("n", "a number", other),
        args => wrong_number_of_arguments(1, args.len()),
    });

    result.add_fn("sqrt", |args| match args {
        [Int(n)] => Ok(Float((*n as f64).sqrt())),
        [Float(n)] => Ok(Float(n.sqrt())),
        [other] => unexpected_argument_type("n", "a number", other),
        args => wrong_number_of_arguments(1, args.len()),
    });

    result.add_fn("pow", |args| match args {
        [a, b] => match (as_f64(a), as_f64(b)) {
            (Some(a), Some(b)) => Ok(Float(a.powf(b))),
            (None, _) => unexpected_argument_type("base", "a number", a),
            (_, None) => unexpected_argument_type("exponent", "a number", b),
        },
        args => wrong_number_of_arguments(2, args.len()),
    });

    result.add_fn("min", |args| match args {
        [Int(a), Int(b)] => Ok(Int(*a.min(b))),
        [a, b] => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => Ok(Float(x.min(y))),
            (None, _) => unexpected_argument_type("a", "a number", a),
            (_, None) => unexpected_argument_type("b", "a number", b),
        },
        args => wrong_number_of_arguments(2, args.len()),
    });

    result.add_fn("max", |args| match args {
        [Int(a), Int(b)] => Ok(Int(*a.max(b))),
        [a, b] => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => Ok(Float(x.max(y))),
            (None, _) => unexpected_argument_type("a", "a number", a),
            (_, None) => unexpected_argument_type("b", "a number", b),
        },
        args => wrong_number_of_arguments(2, args.len()),
    });

    result
}

fn as_f64(value: &QValue) -> Option<f64> {
    match value {
        QValue::Int(n) => Some(*n as f64),
        QValue::Float(n) => Some(*n),
        _ => None,
    }
}
