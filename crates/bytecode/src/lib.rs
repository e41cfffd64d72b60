//! Contains the bytecode artifact model for the Quill runtime
//!
//! A Quill program arrives at the runtime as a [Chunk]: an entry-point
//! [CompiledFunction], a [ConstantPool], and the source path used when
//! reporting runtime errors. Instructions are byte-encoded ([Op]) and decoded
//! into [Instruction]s by the [InstructionReader]. The [FunctionBuilder]
//! assembles function bodies directly, standing in for the external compiler.

#![warn(missing_docs)]

mod builder;
mod chunk;
mod constant_pool;
mod function;
mod instruction;
mod instruction_reader;
mod op;

/// The shared pointer type used for immutable bytecode data
pub type Ptr<T> = std::rc::Rc<T>;

pub use crate::{
    builder::{BuildError, FunctionBuilder, Label},
    chunk::{Chunk, DebugInfo, SourcePos},
    constant_pool::{Constant, ConstantPool},
    function::CompiledFunction,
    instruction::Instruction,
    instruction_reader::InstructionReader,
    op::Op,
};
