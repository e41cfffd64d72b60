use crate::{Ptr, ValueRef};
use quill_bytecode::CompiledFunction;
use std::fmt;

/// A compiled function paired with the slots it captured at creation time
///
/// The captured slots alias slots from the enclosing frames, so writes
/// through a capture remain visible to every other alias for as long as the
/// closure is alive, including after the capturing frame has returned.
pub struct QClosure {
    /// The function shared with the chunk's constant pool
    pub function: Ptr<CompiledFunction>,
    /// The captured slots, in capture order
    pub captures: Box<[ValueRef]>,
}

impl fmt::Debug for QClosure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "closure over {:?}", self.function)
    }
}
