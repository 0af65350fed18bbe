//! Method Bodies and Body Emission
//!
//! A member's executable part is a [`MethodBody`]: a native closure for types
//! assembled by hand, a [`CompiledBody`] for types emitted at runtime, or
//! nothing at all for abstract members.
//!
//! Compiled bodies are short stack-machine programs produced with a
//! [`BodyBuilder`]:
//!
//! | Instruction        | Stack effect                         |
//! |--------------------|--------------------------------------|
//! | `Nop`              | none                                 |
//! | `Pop`              | pops 1                               |
//! | `LoadArg(i)`       | pushes argument `i` (0 is `this`)    |
//! | `LoadConst(v)`     | pushes `v`                           |
//! | `LoadDefault(t)`   | pushes the zero value of `t`         |
//! | `LoadField(loc)`   | pops receiver (instance), pushes 1   |
//! | `StoreField(loc)`  | pops value and receiver (instance)   |
//! | `CallConstructor`  | pops `argc` arguments and receiver   |
//! | `Return`           | pops the result and leaves the body  |
//! | `ReturnVoid`       | leaves the body                      |

use std::fmt;
use std::sync::Arc;

use crate::members::{ConstructorDef, FieldLocation};
use crate::types::TypeHandle;
use crate::value::{ObjectRef, Value};
use crate::{RuntimeError, RuntimeResult};

/// Signature of a native body
pub type NativeFn = Arc<dyn Fn(&CallContext<'_>) -> RuntimeResult<Value> + Send + Sync>;

/// Arguments visible to a native body
pub struct CallContext<'a> {
    this: Option<&'a ObjectRef>,
    args: &'a [Value],
    member: &'a str,
}

impl<'a> CallContext<'a> {
    pub(crate) fn new(this: Option<&'a ObjectRef>, args: &'a [Value], member: &'a str) -> Self {
        Self { this, args, member }
    }

    /// Receiver of an instance call
    pub fn this(&self) -> RuntimeResult<&'a ObjectRef> {
        self.this.ok_or_else(|| RuntimeError::NullReceiver {
            member: self.member.to_string(),
        })
    }

    /// Argument by position, `this` excluded
    pub fn arg(&self, index: usize) -> RuntimeResult<&'a Value> {
        self.args.get(index).ok_or(RuntimeError::ArgumentCount {
            member: self.member.to_string(),
            expected: index + 1,
            actual: self.args.len(),
        })
    }

    /// All arguments, `this` excluded
    pub fn args(&self) -> &'a [Value] {
        self.args
    }

    /// Read a field of the receiver (or a static field)
    pub fn load(&self, location: &FieldLocation) -> RuntimeResult<Value> {
        match location {
            FieldLocation::Instance(slot) => self.this()?.load_slot(*slot),
            FieldLocation::Static(cell) => Ok(cell.load()),
        }
    }

    /// Write a field of the receiver (or a static field)
    pub fn store(&self, location: &FieldLocation, value: Value) -> RuntimeResult<()> {
        match location {
            FieldLocation::Instance(slot) => self.this()?.store_slot(*slot, value),
            FieldLocation::Static(cell) => {
                cell.store(value);
                Ok(())
            }
        }
    }
}

/// Executable part of a method, accessor or constructor
#[derive(Clone)]
pub enum MethodBody {
    /// No body; the member must be overridden
    Abstract,
    /// Rust closure
    Native(NativeFn),
    /// Emitted instruction stream
    Compiled(Arc<CompiledBody>),
}

impl MethodBody {
    /// Wrap a closure as a body
    pub fn native<F>(f: F) -> Self
    where
        F: Fn(&CallContext<'_>) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        MethodBody::Native(Arc::new(f))
    }

    /// Whether there is nothing to execute
    pub fn is_abstract(&self) -> bool {
        matches!(self, MethodBody::Abstract)
    }

    /// Constructor bodies that do not chain explicitly run the base
    /// type's parameterless constructor first
    pub fn needs_implicit_base_call(&self) -> bool {
        match self {
            MethodBody::Compiled(body) => !body.calls_constructor(),
            _ => true,
        }
    }
}

impl fmt::Debug for MethodBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodBody::Abstract => write!(f, "Abstract"),
            MethodBody::Native(_) => write!(f, "Native"),
            MethodBody::Compiled(body) => write!(f, "Compiled({})", body.name),
        }
    }
}

/// Single stack-machine instruction
#[derive(Debug, Clone)]
pub enum Instruction {
    /// Do nothing
    Nop,
    /// Discard the top of the stack
    Pop,
    /// Push an argument; index 0 is the receiver of instance members
    LoadArg(usize),
    /// Push a constant
    LoadConst(Value),
    /// Push the zero value of a type
    LoadDefault(TypeHandle),
    /// Push a field value
    LoadField(FieldLocation),
    /// Store into a field
    StoreField(FieldLocation),
    /// Run a constructor against the receiver below the arguments
    CallConstructor {
        /// Constructor to run
        constructor: Arc<ConstructorDef>,
        /// Number of arguments on the stack
        argc: usize,
    },
    /// Return the top of the stack
    Return,
    /// Return without a value
    ReturnVoid,
}

/// A validated instruction stream
#[derive(Debug, Clone)]
pub struct CompiledBody {
    /// Name of the member the body belongs to
    pub name: String,
    /// Argument count, receiver included
    pub arg_count: usize,
    /// Maximum stack depth reached
    pub max_stack: usize,
    /// Instructions
    pub instructions: Vec<Instruction>,
}

impl CompiledBody {
    /// Whether the stream chains to another constructor itself
    pub fn calls_constructor(&self) -> bool {
        self.instructions
            .iter()
            .any(|i| matches!(i, Instruction::CallConstructor { .. }))
    }
}

/// Builder for [`CompiledBody`] streams
#[derive(Debug)]
pub struct BodyBuilder {
    name: String,
    arg_count: usize,
    instructions: Vec<Instruction>,
    stack_depth: usize,
    max_stack_depth: usize,
    terminated: bool,
    finalized: bool,
    errors: Vec<String>,
}

impl BodyBuilder {
    /// Create a builder; `arg_count` includes the receiver of instance members
    pub fn new(name: impl Into<String>, arg_count: usize) -> Self {
        Self {
            name: name.into(),
            arg_count,
            instructions: Vec::with_capacity(8),
            stack_depth: 0,
            max_stack_depth: 0,
            terminated: false,
            finalized: false,
            errors: Vec::new(),
        }
    }

    fn push(&mut self) {
        self.stack_depth += 1;
        self.max_stack_depth = self.max_stack_depth.max(self.stack_depth);
    }

    fn pop(&mut self, count: usize) {
        if self.stack_depth < count {
            self.errors.push(format!(
                "stack underflow at instruction {}: need {}, have {}",
                self.instructions.len(),
                count,
                self.stack_depth
            ));
            self.stack_depth = 0;
        } else {
            self.stack_depth -= count;
        }
    }

    fn emit(&mut self, instruction: Instruction) -> RuntimeResult<()> {
        if self.finalized {
            return Err(RuntimeError::Finalized("BodyBuilder".to_string()));
        }
        if self.terminated {
            self.errors.push(format!(
                "instruction {} follows a return",
                self.instructions.len()
            ));
        }
        self.instructions.push(instruction);
        Ok(())
    }

    /// Emit `Nop`
    pub fn emit_nop(&mut self) -> RuntimeResult<()> {
        self.emit(Instruction::Nop)
    }

    /// Emit `Pop`
    pub fn emit_pop(&mut self) -> RuntimeResult<()> {
        self.pop(1);
        self.emit(Instruction::Pop)
    }

    /// Emit `LoadArg`
    pub fn emit_load_arg(&mut self, index: usize) -> RuntimeResult<()> {
        if index >= self.arg_count {
            self.errors.push(format!(
                "argument {} out of range ({} arguments)",
                index, self.arg_count
            ));
        }
        self.push();
        self.emit(Instruction::LoadArg(index))
    }

    /// Emit `LoadConst`
    pub fn emit_load_const(&mut self, value: Value) -> RuntimeResult<()> {
        self.push();
        self.emit(Instruction::LoadConst(value))
    }

    /// Emit `LoadDefault`
    pub fn emit_load_default(&mut self, ty: TypeHandle) -> RuntimeResult<()> {
        self.push();
        self.emit(Instruction::LoadDefault(ty))
    }

    /// Emit `LoadField`
    pub fn emit_load_field(&mut self, location: FieldLocation) -> RuntimeResult<()> {
        if !location.is_static() {
            self.pop(1);
        }
        self.push();
        self.emit(Instruction::LoadField(location))
    }

    /// Emit `StoreField`
    pub fn emit_store_field(&mut self, location: FieldLocation) -> RuntimeResult<()> {
        self.pop(if location.is_static() { 1 } else { 2 });
        self.emit(Instruction::StoreField(location))
    }

    /// Emit `CallConstructor`, consuming the declared parameter count
    pub fn emit_call_constructor(&mut self, constructor: Arc<ConstructorDef>) -> RuntimeResult<()> {
        let argc = constructor.parameters.len();
        self.pop(argc + 1);
        self.emit(Instruction::CallConstructor { constructor, argc })
    }

    /// Emit `Return`
    pub fn emit_return(&mut self) -> RuntimeResult<()> {
        self.pop(1);
        self.emit(Instruction::Return)?;
        self.terminated = true;
        Ok(())
    }

    /// Emit `ReturnVoid`
    pub fn emit_return_void(&mut self) -> RuntimeResult<()> {
        self.emit(Instruction::ReturnVoid)?;
        self.terminated = true;
        Ok(())
    }

    /// Validation errors collected so far
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.errors.clone();
        if !self.terminated {
            errors.push("body does not end with a return".to_string());
        }
        errors
    }

    /// Validate and produce the compiled body
    pub fn build(&mut self) -> RuntimeResult<CompiledBody> {
        if self.finalized {
            return Err(RuntimeError::Finalized("BodyBuilder".to_string()));
        }

        let errors = self.validate();
        if !errors.is_empty() {
            return Err(RuntimeError::InvalidBody(format!(
                "{}: {}",
                self.name,
                errors.join("; ")
            )));
        }

        self.finalized = true;
        Ok(CompiledBody {
            name: self.name.clone(),
            arg_count: self.arg_count,
            max_stack: self.max_stack_depth,
            instructions: std::mem::take(&mut self.instructions),
        })
    }

    /// Build straight into a [`MethodBody`]
    pub fn build_body(&mut self) -> RuntimeResult<MethodBody> {
        Ok(MethodBody::Compiled(Arc::new(self.build()?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types;

    #[test]
    fn test_build_default_return() {
        let mut builder = BodyBuilder::new("Greet", 1);
        builder.emit_load_default(types::string()).unwrap();
        builder.emit_return().unwrap();

        let body = builder.build().unwrap();
        assert_eq!(body.name, "Greet");
        assert_eq!(body.max_stack, 1);
        assert_eq!(body.instructions.len(), 2);
    }

    #[test]
    fn test_missing_return_rejected() {
        let mut builder = BodyBuilder::new("Broken", 1);
        builder.emit_load_arg(0).unwrap();
        let err = builder.build().unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidBody(msg) if msg.contains("return")));
    }

    #[test]
    fn test_stack_underflow_rejected() {
        let mut builder = BodyBuilder::new("Underflow", 1);
        builder.emit_pop().unwrap();
        builder.emit_return_void().unwrap();
        let err = builder.build().unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidBody(msg) if msg.contains("underflow")));
    }

    #[test]
    fn test_argument_out_of_range_rejected() {
        let mut builder = BodyBuilder::new("Args", 1);
        builder.emit_load_arg(3).unwrap();
        builder.emit_return().unwrap();
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_finalized_builder_rejects_emission() {
        let mut builder = BodyBuilder::new("Done", 0);
        builder.emit_return_void().unwrap();
        builder.build().unwrap();
        assert!(matches!(
            builder.emit_nop(),
            Err(RuntimeError::Finalized(_))
        ));
    }
}
