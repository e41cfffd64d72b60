use crate::{
    builtins::BUILTINS,
    core_lib::CoreLib,
    error::{Error, ErrorKind},
    prelude::*,
    Result,
};
use quill_bytecode::{Chunk, CompiledFunction, Constant, Instruction, InstructionReader, Op, Ptr};
use std::{
    collections::HashMap,
    fmt,
    hash::BuildHasherDefault,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

/// The maximum number of values on the operand stack
pub const STACK_SIZE: usize = 2048;

/// The number of global slots available to a program
pub const GLOBALS_SIZE: usize = 1024;

/// The maximum call depth
pub const MAX_FRAMES: usize = 1024;

/// The registry of importable modules used by a [Vm]
pub type ModuleMap = HashMap<QString, QValue, BuildHasherDefault<QuillHasher>>;

/// The configurable settings that should be used by the Quill runtime
#[derive(Default)]
pub struct VmSettings {
    /// An optional pre-populated globals array
    ///
    /// When absent the VM starts with [GLOBALS_SIZE] Null slots. A provided
    /// array is resized to [GLOBALS_SIZE], extending with Null slots.
    pub globals: Option<Vec<ValueRef>>,

    /// An optional module registry used by the import operation
    ///
    /// When absent, the core library's default registry is used.
    pub modules: Option<ModuleMap>,
}

/// A handle that can request the termination of a running [Vm]
///
/// The handle holds the single piece of VM state that's safe to touch from
/// another thread. A run in progress returns cleanly within a bounded number
/// of instructions after [AbortHandle::abort] is called.
#[derive(Clone, Debug, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    /// Requests that the VM returns from its current run
    pub fn abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The Quill virtual machine
///
/// A VM executes a single [Chunk]. Execution state is reset at the start of
/// each [Vm::run], so a VM can be run repeatedly; the globals array persists
/// across runs and can be inspected between them.
pub struct Vm {
    // The chunk being executed
    chunk: Ptr<Chunk>,
    // The chunk's constants, instantiated as runtime values
    constants: Vec<QValue>,
    // The operand stack; the stack pointer is the vector's length
    stack: Vec<ValueRef>,
    // The global slots, inspectable by the embedder between runs
    globals: Vec<ValueRef>,
    // The call stack; the last entry is the active frame
    call_stack: Vec<Frame>,
    // The VM's instruction reader, reading the active frame's function
    reader: InstructionReader,
    // The ip that produced the most recently read instruction, used for
    // error positions
    instruction_ip: usize,
    // The registry served by the import operation
    modules: ModuleMap,
    abort: AbortHandle,
}

// A frame in the VM's call stack
struct Frame {
    // The function being executed in this frame
    function: Ptr<CompiledFunction>,
    // The closure the frame was entered through, when there is one
    closure: Option<Ptr<QClosure>>,
    // The index in the operand stack where the frame's locals begin
    base_pointer: usize,
    // When returning to this frame, the ip to resume from
    resume_ip: usize,
}

impl Frame {
    fn new(function: Ptr<CompiledFunction>, closure: Option<Ptr<QClosure>>, base_pointer: usize) -> Self {
        Self {
            function,
            closure,
            base_pointer,
            resume_ip: 0,
        }
    }
}

impl Vm {
    /// Initializes a VM for the given chunk with default settings
    pub fn new(chunk: Ptr<Chunk>) -> Self {
        Self::with_settings(chunk, VmSettings::default())
    }

    /// Initializes a VM for the given chunk with the provided settings
    pub fn with_settings(chunk: Ptr<Chunk>, settings: VmSettings) -> Self {
        let constants = chunk.constants.iter().map(constant_to_value).collect();

        let mut globals = settings.globals.unwrap_or_default();
        globals.resize_with(GLOBALS_SIZE, || value_ref(QValue::Null));

        let modules = settings
            .modules
            .unwrap_or_else(|| CoreLib::default().modules());

        Self {
            reader: InstructionReader::new(chunk.main.clone()),
            chunk,
            constants,
            stack: Vec::with_capacity(64),
            globals,
            call_stack: Vec::new(),
            instruction_ip: 0,
            modules,
            abort: AbortHandle::default(),
        }
    }

    /// Runs the chunk's main function to completion
    ///
    /// The run ends when the main function's last instruction has executed,
    /// when a runtime error occurs, or when an abort is requested.
    pub fn run(&mut self) -> Result<()> {
        self.stack.clear();
        self.call_stack.clear();
        self.call_stack
            .push(Frame::new(self.chunk.main.clone(), None, 0));
        self.reader = InstructionReader::new(self.chunk.main.clone());
        self.instruction_ip = 0;
        self.abort.clear();

        while !self.abort.is_set() {
            self.instruction_ip = self.reader.ip;
            let Some(instruction) = self.reader.next() else {
                break;
            };
            if let Err(error) = self.execute_instruction(instruction) {
                return Err(self.add_source_position(error));
            }
        }

        if !self.abort.is_set() {
            // A clean run consumes everything it pushes
            assert!(
                self.stack.is_empty(),
                "non-empty stack after execution: {}",
                self.stack.len()
            );
        }

        Ok(())
    }

    /// Requests that the current run terminates
    ///
    /// See [Vm::abort_handle] for aborting a run from another thread.
    pub fn abort(&self) {
        self.abort.abort();
    }

    /// Returns a handle that can abort this VM's runs from another thread
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// The VM's global slots
    pub fn globals(&self) -> &[ValueRef] {
        &self.globals
    }

    /// Returns a copy of the value held in a global slot
    pub fn get_global(&self, index: usize) -> Option<QValue> {
        self.globals.get(index).map(|slot| slot.borrow().clone())
    }

    /// The current call frame index and instruction pointer, for diagnostics
    pub fn frame_info(&self) -> (usize, usize) {
        (self.call_stack.len().saturating_sub(1), self.instruction_ip)
    }

    fn execute_instruction(&mut self, instruction: Instruction) -> Result<()> {
        use Instruction::*;

        match instruction {
            Error { message } => runtime_error!(message)?,
            LoadConstant { index } => {
                let value = self.constants[index as usize].clone();
                self.push_value(value)?;
            }
            LoadNull => self.push_value(QValue::Null)?,
            LoadTrue => self.push_value(QValue::Bool(true))?,
            LoadFalse => self.push_value(QValue::Bool(false))?,
            Pop => {
                self.pop_slot();
            }
            Add => self.run_binary_op(BinaryOp::Add)?,
            Subtract => self.run_binary_op(BinaryOp::Subtract)?,
            Multiply => self.run_binary_op(BinaryOp::Multiply)?,
            Divide => self.run_binary_op(BinaryOp::Divide)?,
            Remainder => self.run_binary_op(BinaryOp::Remainder)?,
            BitAnd => self.run_binary_op(BinaryOp::BitAnd)?,
            BitOr => self.run_binary_op(BinaryOp::BitOr)?,
            BitXor => self.run_binary_op(BinaryOp::BitXor)?,
            BitAndNot => self.run_binary_op(BinaryOp::BitAndNot)?,
            ShiftLeft => self.run_binary_op(BinaryOp::ShiftLeft)?,
            ShiftRight => self.run_binary_op(BinaryOp::ShiftRight)?,
            Equal => self.run_equality(false)?,
            NotEqual => self.run_equality(true)?,
            Greater => self.run_binary_op(BinaryOp::Greater)?,
            GreaterOrEqual => self.run_binary_op(BinaryOp::GreaterOrEqual)?,
            Not => {
                let value = self.pop_value();
                self.push_value(QValue::Bool(value.is_falsy()))?;
            }
            BitNot => self.run_unary_op(UnaryOp::BitNot)?,
            Negate => self.run_unary_op(UnaryOp::Negate)?,
            Jump { target } => self.reader.ip = target as usize,
            JumpIfFalsy { target } => {
                let condition = self.pop_value();
                if condition.is_falsy() {
                    self.reader.ip = target as usize;
                }
            }
            AndJump { target } => self.run_short_circuit_jump(target, true),
            OrJump { target } => self.run_short_circuit_jump(target, false),
            SetGlobal { index } => {
                let slot = self.pop_slot();
                self.globals[index as usize] = slot;
            }
            GetGlobal { index } => {
                let slot = self.globals[index as usize].clone();
                self.push_slot(slot)?;
            }
            SetGlobalIndexed {
                index,
                selector_count,
            } => {
                let root = self.globals[index as usize].borrow().clone();
                self.run_indexed_assign(root, selector_count)?;
            }
            DefineLocal { index } => {
                let value = self.pop_value();
                let slot_index = self.frame().base_pointer + index as usize;
                self.stack[slot_index] = value_ref(value);
            }
            GetLocal { index } => {
                let slot = self.stack[self.frame().base_pointer + index as usize].clone();
                self.push_slot(slot)?;
            }
            SetLocal { index } => {
                let value = self.pop_value();
                let slot_index = self.frame().base_pointer + index as usize;
                *self.stack[slot_index].borrow_mut() = value;
            }
            SetLocalIndexed {
                index,
                selector_count,
            } => {
                let slot_index = self.frame().base_pointer + index as usize;
                let root = self.stack[slot_index].borrow().clone();
                self.run_indexed_assign(root, selector_count)?;
            }
            GetCapture { index } => {
                let slot = self.capture(index);
                self.push_slot(slot)?;
            }
            SetCapture { index } => {
                let value = self.pop_value();
                *self.capture(index).borrow_mut() = value;
            }
            SetCaptureIndexed {
                index,
                selector_count,
            } => {
                let root = self.capture(index).borrow().clone();
                self.run_indexed_assign(root, selector_count)?;
            }
            GetBuiltin { index } => {
                self.push_value(QValue::NativeFunction(BUILTINS[index as usize]))?;
            }
            ImportModule => self.run_import_module()?,
            MakeList { element_count } => {
                let elements = self.pop_values(element_count as usize);
                self.push_value(QValue::List(QList::with_data(elements.into_iter().collect())))?;
            }
            MakeMap { value_count } => self.run_make_map(value_count)?,
            MakeClosure {
                constant,
                capture_count,
            } => self.run_make_closure(constant, capture_count)?,
            MakeError => {
                let value = self.pop_value();
                self.push_value(QValue::Error(Ptr::new(value)))?;
            }
            Freeze => {
                let frozen = match self.pop_value() {
                    QValue::List(list) => QValue::FrozenList(list),
                    QValue::Map(map) => QValue::FrozenMap(map),
                    other => other,
                };
                self.push_value(frozen)?;
            }
            Index => {
                let index = self.pop_value();
                let container = self.pop_value();
                let result = container.index_get(&index)?;
                self.push_value(result)?;
            }
            Slice => self.run_slice()?,
            Call { arg_count } => self.run_call(arg_count)?,
            Return => {
                let return_value = self.pop_slot();
                self.run_return(return_value);
            }
            ReturnNull => self.run_return(value_ref(QValue::Null)),
            MakeIterator => self.run_make_iterator()?,
            IteratorNext => {
                let iterator = self.pop_iterator()?;
                self.push_value(QValue::Bool(iterator.next()))?;
            }
            IteratorKey => {
                let iterator = self.pop_iterator()?;
                self.push_value(iterator.key())?;
            }
            IteratorValue => {
                let iterator = self.pop_iterator()?;
                self.push_value(iterator.value())?;
            }
        }

        Ok(())
    }

    fn run_binary_op(&mut self, op: BinaryOp) -> Result<()> {
        let rhs = self.pop_value();
        let lhs = self.pop_value();
        let result = binary_op(op, &lhs, &rhs)?;
        self.push_value(result)
    }

    fn run_unary_op(&mut self, op: UnaryOp) -> Result<()> {
        let value = self.pop_value();
        let result = unary_op(op, &value)?;
        self.push_value(result)
    }

    fn run_equality(&mut self, negate: bool) -> Result<()> {
        let rhs = self.pop_value();
        let lhs = self.pop_value();
        self.push_value(QValue::Bool((lhs == rhs) != negate))
    }

    // The short-circuit forms keep the condition on the stack when jumping,
    // so that it becomes the expression's value, and pop it otherwise.
    fn run_short_circuit_jump(&mut self, target: u16, jump_if_falsy: bool) {
        let condition_is_falsy = self
            .stack
            .last()
            .expect("operand stack underflow")
            .borrow()
            .is_falsy();
        if condition_is_falsy == jump_if_falsy {
            self.reader.ip = target as usize;
        } else {
            self.stack.pop();
        }
    }

    fn run_indexed_assign(&mut self, root: QValue, selector_count: u8) -> Result<()> {
        let selectors = self.pop_values(selector_count as usize);
        let value = self.pop_value();
        index_assign(&root, &value, &selectors)
    }

    fn run_import_module(&mut self) -> Result<()> {
        let name = match self.pop_value() {
            QValue::Str(name) => name,
            other => return unexpected_type("a String module name", &other),
        };

        match self.modules.get(name.as_str()) {
            Some(module) => self.push_value(module.clone()),
            None => runtime_error!(ErrorKind::ModuleNotFound {
                name: name.to_string()
            }),
        }
    }

    fn run_make_map(&mut self, value_count: u16) -> Result<()> {
        let entries = self.pop_values(value_count as usize);
        let mut data = ValueMap::with_capacity(entries.len() / 2);
        for pair in entries.chunks_exact(2) {
            let key = match &pair[0] {
                QValue::Str(key) => key.clone(),
                other => return unexpected_type("a String key", other),
            };
            data.insert(key, pair[1].clone());
        }
        self.push_value(QValue::Map(QMap::with_data(data)))
    }

    fn run_make_closure(&mut self, constant: u16, capture_count: u8) -> Result<()> {
        let function = match &self.constants[constant as usize] {
            QValue::Function(function) => function.clone(),
            other => {
                return runtime_error!(ErrorKind::NotAFunction {
                    type_name: other.type_as_string()
                })
            }
        };

        let captures_start = self.stack.len() - capture_count as usize;
        let captures: Box<[ValueRef]> = self.stack[captures_start..].to_vec().into();
        self.stack.truncate(captures_start);

        self.push_value(QValue::Closure(Ptr::new(QClosure { function, captures })))
    }

    fn run_slice(&mut self) -> Result<()> {
        use QValue::*;

        let high = self.pop_value();
        let low = self.pop_value();
        let container = self.pop_value();

        let low_bound = match &low {
            Null => 0,
            Int(n) => *n,
            other => {
                return runtime_error!(ErrorKind::InvalidSliceIndexType {
                    type_name: other.type_as_string()
                })
            }
        };

        let len = match &container {
            List(l) | FrozenList(l) => l.len(),
            Str(s) => s.char_count(),
            Bytes(b) => b.len(),
            other => return unexpected_type("a sliceable value", other),
        } as i64;

        let high_bound = match &high {
            Null => len,
            Int(n) => *n,
            other => {
                return runtime_error!(ErrorKind::InvalidSliceIndexType {
                    type_name: other.type_as_string()
                })
            }
        };

        // The bounds are compared before clamping, so a backwards slice is
        // an error even when both bounds are out of range
        if low_bound > high_bound {
            return runtime_error!(ErrorKind::InvalidSliceIndex {
                low: low_bound,
                high: high_bound
            });
        }

        let start = low_bound.clamp(0, len) as usize;
        let end = high_bound.clamp(0, len) as usize;

        let result = match container {
            // Slicing a list copies the element handles into a fresh mutable
            // list, so slices of frozen lists are themselves mutable
            List(l) | FrozenList(l) => List(QList::from_slice(&l.data()[start..end])),
            Str(s) => Str(s.char_slice(start..end)),
            Bytes(b) => Bytes(b.with_bounds(start..end).unwrap_or_else(QBytes::empty)),
            _ => unreachable!(),
        };

        self.push_value(result)
    }

    fn run_call(&mut self, arg_count: u8) -> Result<()> {
        let arg_count = arg_count as usize;
        let callee_index = self.stack.len() - 1 - arg_count;
        let callee = self.stack[callee_index].borrow().clone();

        match callee {
            QValue::Closure(closure) => {
                self.call_function(closure.function.clone(), Some(closure), arg_count)
            }
            QValue::Function(function) => self.call_function(function, None, arg_count),
            QValue::NativeFunction(native) => self.call_native(native, arg_count),
            other => runtime_error!(ErrorKind::NotCallable {
                type_name: other.type_as_string()
            }),
        }
    }

    fn call_function(
        &mut self,
        function: Ptr<CompiledFunction>,
        closure: Option<Ptr<QClosure>>,
        arg_count: usize,
    ) -> Result<()> {
        if function.num_params as usize != arg_count {
            return runtime_error!(ErrorKind::WrongNumberOfArguments {
                want: function.num_params as usize,
                got: arg_count
            });
        }

        // A self-recursive call in tail position reuses the current frame:
        // the arguments overwrite the parameter slots and the ip resets to
        // the start of the function
        if Ptr::ptr_eq(&function, &self.frame().function) && self.call_is_in_tail_position() {
            let base_pointer = self.frame().base_pointer;
            let args_start = self.stack.len() - arg_count;
            for p in 0..arg_count {
                self.stack[base_pointer + p] = self.stack[args_start + p].clone();
            }
            self.stack.truncate(args_start - 1);
            self.reader.ip = 0;
            return Ok(());
        }

        if self.call_stack.len() >= MAX_FRAMES {
            return runtime_error!(ErrorKind::StackOverflow);
        }

        let base_pointer = self.stack.len() - arg_count;
        if base_pointer + function.num_locals as usize > STACK_SIZE {
            return runtime_error!(ErrorKind::StackOverflow);
        }

        self.frame_mut().resume_ip = self.reader.ip;
        self.call_stack
            .push(Frame::new(function.clone(), closure, base_pointer));

        // The argument handles become the frame's first locals; the slots
        // above them start out as fresh Null slots
        self.stack
            .resize_with(base_pointer + function.num_locals as usize, || {
                value_ref(QValue::Null)
            });

        self.reader = InstructionReader::new(function);
        Ok(())
    }

    // True when the instruction following the current call is a return, i.e.
    // the call's result would immediately become the function's result
    fn call_is_in_tail_position(&self) -> bool {
        match self.reader.peek_op(self.reader.ip) {
            Some(Op::Return) => true,
            Some(Op::Pop) => matches!(self.reader.peek_op(self.reader.ip + 1), Some(Op::ReturnNull)),
            _ => false,
        }
    }

    fn call_native(&mut self, native: QNativeFunction, arg_count: usize) -> Result<()> {
        let args_start = self.stack.len() - arg_count;
        let args: Vec<QValue> = self.stack[args_start..]
            .iter()
            .map(|slot| slot.borrow().clone())
            .collect();
        self.stack.truncate(args_start - 1);

        let result = (native.function)(&args)?;
        self.push_value(result)
    }

    fn run_return(&mut self, return_value: ValueRef) {
        let frame = self.call_stack.pop().expect("empty call stack");
        let caller = self
            .call_stack
            .last()
            .expect("return executed outside of a function call");

        self.stack.truncate(frame.base_pointer);
        // The returned value replaces the callee in the caller's expression
        self.stack[frame.base_pointer - 1] = return_value;
        self.reader = InstructionReader::with_ip(caller.function.clone(), caller.resume_ip);
    }

    fn run_make_iterator(&mut self) -> Result<()> {
        let iterator = match self.pop_value() {
            QValue::List(list) | QValue::FrozenList(list) => QIterator::with_list(list),
            QValue::Str(string) => QIterator::with_string(&string),
            QValue::Bytes(bytes) => QIterator::with_bytes(bytes),
            QValue::Map(map) | QValue::FrozenMap(map) => QIterator::with_map(map),
            other => {
                return runtime_error!(ErrorKind::NotIterable {
                    type_name: other.type_as_string()
                })
            }
        };
        self.push_value(QValue::Iterator(iterator))
    }

    fn pop_iterator(&mut self) -> Result<QIterator> {
        match self.pop_value() {
            QValue::Iterator(iterator) => Ok(iterator),
            other => unexpected_type("an Iterator", &other),
        }
    }

    fn push_value(&mut self, value: QValue) -> Result<()> {
        self.push_slot(value_ref(value))
    }

    fn push_slot(&mut self, slot: ValueRef) -> Result<()> {
        if self.stack.len() >= STACK_SIZE {
            return runtime_error!(ErrorKind::StackOverflow);
        }
        self.stack.push(slot);
        Ok(())
    }

    fn pop_slot(&mut self) -> ValueRef {
        self.stack.pop().expect("operand stack underflow")
    }

    fn pop_value(&mut self) -> QValue {
        self.pop_slot().borrow().clone()
    }

    // Pops the top `count` values, preserving their stack order
    fn pop_values(&mut self, count: usize) -> Vec<QValue> {
        let start = self.stack.len() - count;
        let values = self.stack[start..]
            .iter()
            .map(|slot| slot.borrow().clone())
            .collect();
        self.stack.truncate(start);
        values
    }

    fn frame(&self) -> &Frame {
        self.call_stack.last().expect("empty call stack")
    }

    fn frame_mut(&mut self) -> &mut Frame {
        self.call_stack.last_mut().expect("empty call stack")
    }

    fn capture(&self, index: u8) -> ValueRef {
        let closure = self
            .frame()
            .closure
            .as_ref()
            .expect("capture access outside of a closure");
        closure.captures[index as usize].clone()
    }

    fn add_source_position(&self, error: Error) -> Error {
        match self
            .reader
            .function
            .debug_info
            .get_source_pos(self.instruction_ip as u32)
        {
            Some(pos) => error.with_position(self.chunk.source_path.clone(), pos),
            None => error,
        }
    }
}

impl fmt::Debug for Vm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Vm")
    }
}

// Walks a selector chain and writes the right-hand side through the leaf.
//
// Selectors are ordered leaf-first: the last selector is applied to the root
// and each intermediate read moves one level deeper, until the first selector
// picks the slot that receives the value.
fn index_assign(root: &QValue, value: &QValue, selectors: &[QValue]) -> Result<()> {
    let (leaf, rest) = selectors
        .split_first()
        .expect("selector chains are never empty");

    let mut target = root.clone();
    for selector in rest.iter().rev() {
        target = target.index_get(selector)?;
    }

    target.index_set(leaf, value)
}

fn constant_to_value(constant: &Constant) -> QValue {
    match constant {
        Constant::Int(n) => QValue::Int(*n),
        Constant::Float(n) => QValue::Float(*n),
        Constant::Char(c) => QValue::Char(*c),
        Constant::Str(s) => QValue::Str(s.clone().into()),
        Constant::Bytes(b) => QValue::Bytes(b.clone().into()),
        Constant::Function(f) => QValue::Function(f.clone()),
    }
}
