//! Contains the runtime and core library for the Quill language
//!
//! The runtime executes bytecode artifacts produced ahead of time (see
//! `quill_bytecode`): the [Vm] drives a fetch/decode/execute loop over a
//! [Chunk](quill_bytecode::Chunk)'s instructions, operating on [QValue]s held
//! in shared slots so that closures can capture and mutate variables from
//! their enclosing scopes.

#![warn(missing_docs)]

mod error;
mod types;
mod vm;

pub mod builtins;
pub mod core_lib;
pub mod prelude;

pub use crate::{
    error::{
        unexpected_argument_type, unexpected_type, wrong_number_of_arguments, Error, ErrorKind,
        Result,
    },
    types::{
        binary_op, unary_op, value_ref, BinaryOp, NativeFn, QBytes, QClosure, QIterator, QList,
        QMap, QNativeFunction, QString, QValue, QuillHasher, UnaryOp, ValueMap, ValueRef, ValueVec,
    },
    vm::{AbortHandle, ModuleMap, Vm, VmSettings, GLOBALS_SIZE, MAX_FRAMES, STACK_SIZE},
};
pub use quill_bytecode::Ptr;

/// The shared mutable cell type used by container values and value slots
pub type PtrMut<T> = std::rc::Rc<std::cell::RefCell<T>>;

/// An immutable borrow of a [PtrMut] cell
pub type Borrow<'a, T> = std::cell::Ref<'a, T>;

/// A mutable borrow of a [PtrMut] cell
pub type BorrowMut<'a, T> = std::cell::RefMut<'a, T>;
