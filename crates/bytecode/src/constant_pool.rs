use crate::{CompiledFunction, Ptr};
use std::fmt;

/// A constant stored in a [ConstantPool]
#[derive(Clone, Debug)]
pub enum Constant {
    /// A 64 bit signed integer
    Int(i64),
    /// A 64 bit float
    Float(f64),
    /// A single code point
    Char(char),
    /// An immutable string
    Str(Ptr<str>),
    /// An immutable byte sequence
    Bytes(Ptr<[u8]>),
    /// A compiled function body
    Function(Ptr<CompiledFunction>),
}

/// The constant data associated with a chunk's bytecode
///
/// Constants are appended while a program is being assembled and referenced
/// by `u16` index from `LoadConstant` and `MakeClosure` instructions.
#[derive(Clone, Debug, Default)]
pub struct ConstantPool {
    constants: Vec<Constant>,
}

impl ConstantPool {
    /// Adds a constant to the pool, returning its index
    ///
    /// Returns `None` if the pool is full (indices are 16 bits wide).
    pub fn add(&mut self, constant: Constant) -> Option<u16> {
        let index = u16::try_from(self.constants.len()).ok()?;
        self.constants.push(constant);
        Some(index)
    }

    /// Returns the constant at the given index
    pub fn get(&self, index: u16) -> Option<&Constant> {
        self.constants.get(index as usize)
    }

    /// Returns the number of constants in the pool
    pub fn len(&self) -> usize {
        self.constants.len()
    }

    /// Returns true if the pool contains no constants
    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    /// Iterates over the pool's constants
    pub fn iter(&self) -> impl Iterator<Item = &Constant> {
        self.constants.iter()
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(n) => write!(f, "{n}"),
            Constant::Float(n) => write!(f, "{n}"),
            Constant::Char(c) => write!(f, "{c:?}"),
            Constant::Str(s) => write!(f, "{s:?}"),
            Constant::Bytes(b) => write!(f, "bytes[{}]", b.len()),
            Constant::Function(function) => write!(f, "{function:?}"),
        }
    }
}
