use crate::{CompiledFunction, DebugInfo, Op, SourcePos};
use thiserror::Error;

/// The errors that can occur while assembling a function
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum BuildError {
    #[error("jump target {target} is out of range for a 16 bit operand")]
    JumpTargetOutOfRange { target: usize },
    #[error("a jump label was never placed")]
    UnplacedLabel,
}

/// An opaque jump target handed out by [FunctionBuilder::new_label]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Label(u32);

/// An assembler for [CompiledFunction]s
///
/// The compiler that normally produces bytecode lives outside this
/// repository; the builder gives embedders (and this repository's tests) a
/// direct way to produce function bodies. Operands are emitted with the
/// encoding expected by the [InstructionReader](crate::InstructionReader),
/// and jump targets can be expressed as labels that are patched with
/// absolute positions when the function is finished.
pub struct FunctionBuilder {
    bytes: Vec<u8>,
    num_params: u8,
    num_locals: u8,
    debug_info: DebugInfo,
    // Placed byte positions, indexed by label id
    labels: Vec<Option<usize>>,
    // Byte offsets of u16 operands that get patched with label positions
    patches: Vec<(usize, Label)>,
    current_pos: Option<SourcePos>,
}

impl FunctionBuilder {
    /// Initializes a builder for a function with the given frame layout
    pub fn new(num_params: u8, num_locals: u8) -> Self {
        Self {
            bytes: Vec::new(),
            num_params,
            num_locals,
            debug_info: DebugInfo::default(),
            labels: Vec::new(),
            patches: Vec::new(),
            current_pos: None,
        }
    }

    /// Sets the source position recorded for subsequently emitted operations
    pub fn set_source_pos(&mut self, line: u32, column: u32) {
        self.current_pos = Some(SourcePos::new(line, column));
    }

    /// Emits an operation with no operands
    pub fn op(&mut self, op: Op) {
        self.record_pos();
        self.bytes.push(op as u8);
    }

    /// Emits an operation with a single `u8` operand
    pub fn op_u8(&mut self, op: Op, a: u8) {
        self.op(op);
        self.bytes.push(a);
    }

    /// Emits an operation with two `u8` operands
    pub fn op_u8_u8(&mut self, op: Op, a: u8, b: u8) {
        self.op(op);
        self.bytes.push(a);
        self.bytes.push(b);
    }

    /// Emits an operation with a single `u16` operand
    pub fn op_u16(&mut self, op: Op, a: u16) {
        self.op(op);
        self.bytes.extend_from_slice(&a.to_be_bytes());
    }

    /// Emits an operation with a `u16` operand followed by a `u8` operand
    pub fn op_u16_u8(&mut self, op: Op, a: u16, b: u8) {
        self.op_u16(op, a);
        self.bytes.push(b);
    }

    /// Returns a fresh label that can be placed and jumped to
    pub fn new_label(&mut self) -> Label {
        let label = Label(self.labels.len() as u32);
        self.labels.push(None);
        label
    }

    /// Places a label at the current end of the instruction stream
    pub fn place_label(&mut self, label: Label) {
        self.labels[label.0 as usize] = Some(self.bytes.len());
    }

    /// Emits a jump operation targeting a label
    ///
    /// The target operand is patched with the label's absolute position in
    /// [FunctionBuilder::finish].
    pub fn op_jump(&mut self, op: Op, label: Label) {
        self.op(op);
        self.patches.push((self.bytes.len(), label));
        self.bytes.extend_from_slice(&u16::MAX.to_be_bytes());
    }

    /// Patches jump targets and returns the finished function
    pub fn finish(mut self) -> Result<CompiledFunction, BuildError> {
        for (offset, label) in self.patches.iter() {
            let target = self.labels[label.0 as usize].ok_or(BuildError::UnplacedLabel)?;
            let target =
                u16::try_from(target).map_err(|_| BuildError::JumpTargetOutOfRange { target })?;
            self.bytes[*offset..*offset + 2].copy_from_slice(&target.to_be_bytes());
        }

        Ok(CompiledFunction {
            bytes: self.bytes.into(),
            num_params: self.num_params,
            num_locals: self.num_locals,
            debug_info: self.debug_info,
        })
    }

    fn record_pos(&mut self) {
        if let Some(pos) = self.current_pos {
            self.debug_info.push(self.bytes.len() as u32, pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_and_backward_jumps_are_patched() {
        let mut builder = FunctionBuilder::new(0, 0);
        let start = builder.new_label();
        let end = builder.new_label();

        builder.place_label(start);
        builder.op(Op::LoadTrue);
        builder.op_jump(Op::JumpIfFalsy, end);
        builder.op_jump(Op::Jump, start);
        builder.place_label(end);

        let function = builder.finish().unwrap();
        // LoadTrue; JumpIfFalsy 7; Jump 0
        assert_eq!(
            function.bytes.as_ref(),
            &[
                Op::LoadTrue as u8,
                Op::JumpIfFalsy as u8,
                0,
                7,
                Op::Jump as u8,
                0,
                0,
            ]
        );
    }

    #[test]
    fn unplaced_labels_are_rejected() {
        let mut builder = FunctionBuilder::new(0, 0);
        let label = builder.new_label();
        builder.op_jump(Op::Jump, label);

        assert_eq!(builder.finish(), Err(BuildError::UnplacedLabel));
    }

    #[test]
    fn source_positions_are_recorded_per_op() {
        let mut builder = FunctionBuilder::new(0, 0);
        builder.set_source_pos(1, 1);
        builder.op_u16(Op::LoadConstant, 0);
        builder.set_source_pos(2, 3);
        builder.op(Op::Pop);

        let function = builder.finish().unwrap();
        assert_eq!(
            function.debug_info.get_source_pos(0),
            Some(SourcePos::new(1, 1))
        );
        assert_eq!(
            function.debug_info.get_source_pos(3),
            Some(SourcePos::new(2, 3))
        );
    }
}
