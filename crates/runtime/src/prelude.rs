//! A convenient re-export of the types and helpers used when working with the
//! Quill runtime

pub use crate::{
    error::{unexpected_argument_type, unexpected_type, wrong_number_of_arguments},
    runtime_error,
    types::{
        binary_op, unary_op, value_ref, BinaryOp, NativeFn, QBytes, QClosure, QIterator, QList,
        QMap, QNativeFunction, QString, QValue, QuillHasher, UnaryOp, ValueMap, ValueRef, ValueVec,
    },
    vm::{AbortHandle, ModuleMap, Vm, VmSettings, GLOBALS_SIZE, MAX_FRAMES, STACK_SIZE},
    Borrow, BorrowMut, Error, ErrorKind, Ptr, PtrMut, Result,
};
