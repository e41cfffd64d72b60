//! The operator contracts implemented by Quill values
//!
//! Dispatch is a two-level match: the outer level selects a table for the
//! left-hand variant, the inner level matches on the operator and right-hand
//! variant, with Int/Float promotion handled at the leaves.

use crate::{prelude::*, Result};
use std::fmt;

/// The binary operations recognized by the dispatch tables
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    BitAnd,
    BitOr,
    BitXor,
    BitAndNot,
    ShiftLeft,
    ShiftRight,
    Greater,
    GreaterOrEqual,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Remainder => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAndNot => "&^",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterOrEqual => ">=",
        };
        f.write_str(symbol)
    }
}

/// The unary operations that can fail on an unsupported operand
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum UnaryOp {
    Negate,
    BitNot,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            UnaryOp::Negate => "-",
            UnaryOp::BitNot => "~",
        };
        f.write_str(symbol)
    }
}

/// Applies a binary operation to a pair of values
pub fn binary_op(op: BinaryOp, lhs: &QValue, rhs: &QValue) -> Result<QValue> {
    use QValue::*;
    match lhs {
        Int(a) => int_op(op, *a, lhs, rhs),
        Float(a) => float_op(op, *a, lhs, rhs),
        Str(a) => string_op(op, a, lhs, rhs),
        Bytes(a) => bytes_op(op, a, lhs, rhs),
        Char(a) => char_op(op, *a, lhs, rhs),
        List(a) | FrozenList(a) => list_op(op, a, lhs, rhs),
        _ => invalid_op(lhs, op, rhs),
    }
}

/// Applies a unary operation to a value
pub fn unary_op(op: UnaryOp, value: &QValue) -> Result<QValue> {
    use QValue::*;
    match (op, value) {
        (UnaryOp::Negate, Int(n)) => Ok(Int(n.wrapping_neg())),
        (UnaryOp::Negate, Float(n)) => Ok(Float(-n)),
        (UnaryOp::BitNot, Int(n)) => Ok(Int(!n)),
        _ => runtime_error!(ErrorKind::InvalidUnaryOp {
            op,
            operand_type: value.type_as_string()
        }),
    }
}

fn invalid_op<T>(lhs: &QValue, op: BinaryOp, rhs: &QValue) -> Result<T> {
    runtime_error!(ErrorKind::InvalidBinaryOp {
        lhs_type: lhs.type_as_string(),
        op,
        rhs_type: rhs.type_as_string(),
    })
}

// Integer arithmetic wraps on overflow; mixed Int/Float operations promote
// to Float.
fn int_op(op: BinaryOp, a: i64, lhs: &QValue, rhs: &QValue) -> Result<QValue> {
    use BinaryOp::*;
    use QValue::{Bool, Float, Int};
    match (op, rhs) {
        (Add, Int(b)) => Ok(Int(a.wrapping_add(*b))),
        (Add, Float(b)) => Ok(Float(a as f64 + b)),
        (Subtract, Int(b)) => Ok(Int(a.wrapping_sub(*b))),
        (Subtract, Float(b)) => Ok(Float(a as f64 - b)),
        (Multiply, Int(b)) => Ok(Int(a.wrapping_mul(*b))),
        (Multiply, Float(b)) => Ok(Float(a as f64 * b)),
        (Divide, Int(0)) => runtime_error!(ErrorKind::DivideByZero),
        (Divide, Int(b)) => Ok(Int(a.wrapping_div(*b))),
        (Divide, Float(b)) => Ok(Float(a as f64 / b)),
        (Remainder, Int(0)) => runtime_error!(ErrorKind::DivideByZero),
        (Remainder, Int(b)) => Ok(Int(a.wrapping_rem(*b))),
        (Remainder, Float(b)) => Ok(Float(a as f64 % b)),
        (BitAnd, Int(b)) => Ok(Int(a & b)),
        (BitOr, Int(b)) => Ok(Int(a | b)),
        (BitXor, Int(b)) => Ok(Int(a ^ b)),
        (BitAndNot, Int(b)) => Ok(Int(a & !b)),
        (ShiftLeft, Int(b)) if *b < 0 => {
            runtime_error!(ErrorKind::NegativeShiftCount { count: *b })
        }
        (ShiftLeft, Int(b)) if *b >= 64 => Ok(Int(0)),
        (ShiftLeft, Int(b)) => Ok(Int(a.wrapping_shl(*b as u32))),
        (ShiftRight, Int(b)) if *b < 0 => {
            runtime_error!(ErrorKind::NegativeShiftCount { count: *b })
        }
        // Shifting everything out leaves the sign bit's fill
        (ShiftRight, Int(b)) if *b >= 64 => Ok(Int(if a < 0 { -1 } else { 0 })),
        (ShiftRight, Int(b)) => Ok(Int(a >> b)),
        (Greater, Int(b)) => Ok(Bool(a > *b)),
        (Greater, Float(b)) => Ok(Bool(a as f64 > *b)),
        (GreaterOrEqual, Int(b)) => Ok(Bool(a >= *b)),
        (GreaterOrEqual, Float(b)) => Ok(Bool(a as f64 >= *b)),
        _ => invalid_op(lhs, op, rhs),
    }
}

fn float_op(op: BinaryOp, a: f64, lhs: &QValue, rhs: &QValue) -> Result<QValue> {
    use BinaryOp::*;
    use QValue::{Bool, Float, Int};
    match (op, rhs) {
        (Add, Float(b)) => Ok(Float(a + b)),
        (Add, Int(b)) => Ok(Float(a + *b as f64)),
        (Subtract, Float(b)) => Ok(Float(a - b)),
        (Subtract, Int(b)) => Ok(Float(a - *b as f64)),
        (Multiply, Float(b)) => Ok(Float(a * b)),
        (Multiply, Int(b)) => Ok(Float(a * *b as f64)),
        (Divide, Float(b)) => Ok(Float(a / b)),
        (Divide, Int(b)) => Ok(Float(a / *b as f64)),
        (Remainder, Float(b)) => Ok(Float(a % b)),
        (Remainder, Int(b)) => Ok(Float(a % *b as f64)),
        (Greater, Float(b)) => Ok(Bool(a > *b)),
        (Greater, Int(b)) => Ok(Bool(a > *b as f64)),
        (GreaterOrEqual, Float(b)) => Ok(Bool(a >= *b)),
        (GreaterOrEqual, Int(b)) => Ok(Bool(a >= *b as f64)),
        _ => invalid_op(lhs, op, rhs),
    }
}

// String + any value concatenates, coercing the right-hand side to its
// display form. Comparisons are lexicographic by code point.
fn string_op(op: BinaryOp, a: &QString, lhs: &QValue, rhs: &QValue) -> Result<QValue> {
    use BinaryOp::*;
    use QValue::{Bool, Str};
    match (op, rhs) {
        (Add, Str(b)) => {
            let mut result = String::with_capacity(a.len() + b.len());
            result.push_str(a.as_str());
            result.push_str(b.as_str());
            Ok(Str(result.into()))
        }
        (Add, other) => Ok(Str(format!("{a}{other}").into())),
        (Greater, Str(b)) => Ok(Bool(a.as_str() > b.as_str())),
        (GreaterOrEqual, Str(b)) => Ok(Bool(a.as_str() >= b.as_str())),
        _ => invalid_op(lhs, op, rhs),
    }
}

fn bytes_op(op: BinaryOp, a: &QBytes, lhs: &QValue, rhs: &QValue) -> Result<QValue> {
    use QValue::Bytes;
    match (op, rhs) {
        (BinaryOp::Add, Bytes(b)) => Ok(Bytes(a.concat(b))),
        _ => invalid_op(lhs, op, rhs),
    }
}

// Chars shift by code point when combined with Ints, and compare with other
// Chars. Adding a Char to a String goes through the string table; the
// reverse concatenation is handled here.
fn char_op(op: BinaryOp, a: char, lhs: &QValue, rhs: &QValue) -> Result<QValue> {
    use BinaryOp::*;
    use QValue::{Bool, Char, Int, Str};
    match (op, rhs) {
        (Add, Int(b)) => match shifted_char(a, *b) {
            Some(c) => Ok(Char(c)),
            None => invalid_op(lhs, op, rhs),
        },
        (Subtract, Int(b)) => match shifted_char(a, b.wrapping_neg()) {
            Some(c) => Ok(Char(c)),
            None => invalid_op(lhs, op, rhs),
        },
        (Add, Str(b)) => Ok(Str(format!("{a}{b}").into())),
        (Greater, Char(b)) => Ok(Bool(a > *b)),
        (GreaterOrEqual, Char(b)) => Ok(Bool(a >= *b)),
        _ => invalid_op(lhs, op, rhs),
    }
}

fn shifted_char(a: char, offset: i64) -> Option<char> {
    let shifted = (a as i64).checked_add(offset)?;
    char::from_u32(u32::try_from(shifted).ok()?)
}

fn list_op(op: BinaryOp, a: &QList, lhs: &QValue, rhs: &QValue) -> Result<QValue> {
    use QValue::{FrozenList, List};
    match (op, rhs) {
        (BinaryOp::Add, List(b) | FrozenList(b)) => {
            let mut data = ValueVec::with_capacity(a.len() + b.len());
            data.extend(a.data().iter().cloned());
            data.extend(b.data().iter().cloned());
            Ok(List(QList::with_data(data)))
        }
        _ => invalid_op(lhs, op, rhs),
    }
}
