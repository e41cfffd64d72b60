use crate::{DebugInfo, InstructionReader, Ptr};
use std::fmt::{self, Write};

/// A compiled function body
///
/// Compiled functions live in a chunk's constant pool and are instantiated as
/// callable values by the runtime, either directly or wrapped in a closure
/// along with its captured slots.
#[derive(Clone, Default, PartialEq)]
pub struct CompiledFunction {
    /// The bytes representing the function's instructions
    pub bytes: Box<[u8]>,
    /// The number of parameters the function expects
    ///
    /// Arguments occupy the first `num_params` local slots of the function's
    /// frame.
    pub num_params: u8,
    /// The total number of local slots the frame needs, parameters included
    pub num_locals: u8,
    /// Source position information for the function's instructions
    pub debug_info: DebugInfo,
}

impl CompiledFunction {
    /// Returns a [String] displaying the annotated instructions of the function
    pub fn instructions_as_string(function: Ptr<CompiledFunction>) -> String {
        let mut result = String::new();
        let mut reader = InstructionReader::new(function);
        let mut ip = reader.ip;

        while let Some(instruction) = reader.next() {
            writeln!(result, "{ip}\t{instruction:?}").ok();
            ip = reader.ip;
        }

        result
    }
}

impl fmt::Debug for CompiledFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "CompiledFunction ({self:p})")
    }
}
