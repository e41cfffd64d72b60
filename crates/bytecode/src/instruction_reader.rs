use crate::{CompiledFunction, Instruction, Op, Ptr};

/// Decodes a function's bytecode into a series of [Instruction]s
///
/// The reader doubles as the runtime's instruction pointer: `ip` always
/// holds the position of the next byte to decode, and jumps are performed by
/// assigning to it directly.
#[derive(Clone, Default)]
pub struct InstructionReader {
    /// The function that the reader is reading from
    pub function: Ptr<CompiledFunction>,
    /// The reader's instruction pointer
    pub ip: usize,
}

impl InstructionReader {
    /// Initializes a reader positioned at the start of the given function
    pub fn new(function: Ptr<CompiledFunction>) -> Self {
        Self { function, ip: 0 }
    }

    /// Initializes a reader positioned at the given ip
    pub fn with_ip(function: Ptr<CompiledFunction>, ip: usize) -> Self {
        Self { function, ip }
    }

    /// Returns the opcode byte at the given position, if it's in bounds
    ///
    /// Used by the runtime to peek past the current instruction when
    /// detecting calls in tail position.
    pub fn peek_op(&self, ip: usize) -> Option<Op> {
        self.function.bytes.get(ip).map(|byte| Op::from(*byte))
    }

    // Consumes a single operand byte, or nothing if the stream has run out
    fn operand_u8(&mut self) -> Option<u8> {
        let byte = *self.function.bytes.get(self.ip)?;
        self.ip += 1;
        Some(byte)
    }

    // Consumes a two-byte operand, high byte first
    fn operand_u16(&mut self) -> Option<u16> {
        let high = self.operand_u8()?;
        let low = self.operand_u8()?;
        Some(u16::from_be_bytes([high, low]))
    }

    // Decodes the operands for an opcode that has already been consumed.
    // Returns None when the stream ends mid-instruction.
    fn decode(&mut self, op: Op, op_ip: usize) -> Option<Instruction> {
        use Instruction::*;

        let instruction = match op {
            Op::LoadConstant => LoadConstant {
                index: self.operand_u16()?,
            },
            Op::LoadNull => LoadNull,
            Op::LoadTrue => LoadTrue,
            Op::LoadFalse => LoadFalse,
            Op::Pop => Pop,
            Op::Add => Add,
            Op::Subtract => Subtract,
            Op::Multiply => Multiply,
            Op::Divide => Divide,
            Op::Remainder => Remainder,
            Op::BitAnd => BitAnd,
            Op::BitOr => BitOr,
            Op::BitXor => BitXor,
            Op::BitAndNot => BitAndNot,
            Op::ShiftLeft => ShiftLeft,
            Op::ShiftRight => ShiftRight,
            Op::Equal => Equal,
            Op::NotEqual => NotEqual,
            Op::Greater => Greater,
            Op::GreaterOrEqual => GreaterOrEqual,
            Op::Not => Not,
            Op::BitNot => BitNot,
            Op::Negate => Negate,
            Op::Jump => Jump {
                target: self.operand_u16()?,
            },
            Op::JumpIfFalsy => JumpIfFalsy {
                target: self.operand_u16()?,
            },
            Op::AndJump => AndJump {
                target: self.operand_u16()?,
            },
            Op::OrJump => OrJump {
                target: self.operand_u16()?,
            },
            Op::SetGlobal => SetGlobal {
                index: self.operand_u16()?,
            },
            Op::GetGlobal => GetGlobal {
                index: self.operand_u16()?,
            },
            Op::SetGlobalIndexed => SetGlobalIndexed {
                index: self.operand_u16()?,
                selector_count: self.operand_u8()?,
            },
            Op::DefineLocal => DefineLocal {
                index: self.operand_u8()?,
            },
            Op::GetLocal => GetLocal {
                index: self.operand_u8()?,
            },
            Op::SetLocal => SetLocal {
                index: self.operand_u8()?,
            },
            Op::SetLocalIndexed => SetLocalIndexed {
                index: self.operand_u8()?,
                selector_count: self.operand_u8()?,
            },
            Op::GetCapture => GetCapture {
                index: self.operand_u8()?,
            },
            Op::SetCapture => SetCapture {
                index: self.operand_u8()?,
            },
            Op::SetCaptureIndexed => SetCaptureIndexed {
                index: self.operand_u8()?,
                selector_count: self.operand_u8()?,
            },
            Op::GetBuiltin => GetBuiltin {
                index: self.operand_u8()?,
            },
            Op::ImportModule => ImportModule,
            Op::MakeList => MakeList {
                element_count: self.operand_u16()?,
            },
            Op::MakeMap => MakeMap {
                value_count: self.operand_u16()?,
            },
            Op::MakeClosure => MakeClosure {
                constant: self.operand_u16()?,
                capture_count: self.operand_u8()?,
            },
            Op::MakeError => MakeError,
            Op::Freeze => Freeze,
            Op::Index => Index,
            Op::Slice => Slice,
            Op::Call => Call {
                arg_count: self.operand_u8()?,
            },
            Op::Return => Return,
            Op::ReturnNull => ReturnNull,
            Op::MakeIterator => MakeIterator,
            Op::IteratorNext => IteratorNext,
            Op::IteratorKey => IteratorKey,
            Op::IteratorValue => IteratorValue,
            _ => Error {
                message: format!("unrecognized opcode {op:?} at byte {op_ip}"),
            },
        };

        Some(instruction)
    }
}

impl Iterator for InstructionReader {
    type Item = Instruction;

    fn next(&mut self) -> Option<Self::Item> {
        let op_ip = self.ip;
        let op = Op::from(*self.function.bytes.get(op_ip)?);
        self.ip += 1;

        let decoded = self.decode(op, op_ip);
        Some(decoded.unwrap_or_else(|| Instruction::Error {
            message: format!("bytecode ends mid-instruction ({op:?} at byte {op_ip})"),
        }))
    }
}
