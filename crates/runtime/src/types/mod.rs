//! The core types used in the Quill runtime

mod bytes;
mod function;
mod iterator;
mod list;
mod map;
mod native_function;
mod ops;
mod string;
pub mod value;

pub use self::{
    bytes::QBytes,
    function::QClosure,
    iterator::QIterator,
    list::{QList, ValueVec},
    map::{QMap, QuillHasher, ValueMap},
    native_function::{NativeFn, QNativeFunction},
    ops::{binary_op, unary_op, BinaryOp, UnaryOp},
    string::QString,
    value::{value_ref, QValue, ValueRef},
};
