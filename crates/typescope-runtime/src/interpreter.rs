//! Invocation and Construction
//!
//! Entry points for running members of runtime types:
//!
//! - [`invoke`] calls a method or accessor. Overridable methods dispatch on
//!   the receiver's runtime type.
//! - [`construct`] and [`invoke_constructor`] allocate and initialize
//!   instances. Constructors that do not chain explicitly run the base type's
//!   parameterless constructor first.
//! - [`read_field`] and [`write_field`] access field storage directly.
//!
//! Compiled bodies run on a small operand stack; see [`crate::body`].

use std::sync::Arc;

use crate::body::{CallContext, CompiledBody, Instruction, MethodBody};
use crate::members::{ConstructorDef, FieldDef, FieldLocation, MethodDef, ParameterDef};
use crate::types::{TypeHandle, TypeId};
use crate::value::{ObjectRef, Value};
use crate::{RuntimeError, RuntimeResult};

/// Check argument count and types, widening where the parameter allows
fn check_arguments(member: &str, parameters: &[ParameterDef], args: &[Value]) -> RuntimeResult<Vec<Value>> {
    if parameters.len() != args.len() {
        return Err(RuntimeError::ArgumentCount {
            member: member.to_string(),
            expected: parameters.len(),
            actual: args.len(),
        });
    }
    parameters
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            arg.check_assignable(&param.ty)?;
            Ok(arg.clone().coerce_to(&param.ty))
        })
        .collect()
}

fn check_receiver<'a>(
    member: &str,
    declaring_type: TypeId,
    receiver: Option<&'a ObjectRef>,
) -> RuntimeResult<&'a ObjectRef> {
    let this = receiver.ok_or_else(|| RuntimeError::NullReceiver {
        member: member.to_string(),
    })?;
    if !this.ty().derives_from_id(declaring_type) {
        return Err(RuntimeError::TypeMismatch {
            expected: format!("a receiver declaring '{}'", member),
            actual: this.ty().full_name(),
        });
    }
    Ok(this)
}

/// Most-derived implementation of `method` visible from `runtime_type`
pub fn resolve_override(runtime_type: &TypeHandle, method: &MethodDef) -> Option<Arc<MethodDef>> {
    let via_interface = runtime_type
        .all_interfaces()
        .iter()
        .any(|i| i.id() == method.declaring_type);

    let mut current = Some(runtime_type.clone());
    while let Some(ty) = current {
        let found = ty.declared_methods().find(|m| {
            !m.is_abstract
                && !m.is_static
                && (m.is_virtual || via_interface)
                && m.has_same_signature(method)
        });
        if let Some(found) = found {
            return Some(found.clone());
        }
        if ty.id() == method.declaring_type {
            break;
        }
        current = ty.parent().cloned();
    }
    None
}

/// Invoke a method or accessor
pub fn invoke(method: &MethodDef, receiver: Option<&ObjectRef>, args: &[Value]) -> RuntimeResult<Value> {
    let this = if method.is_static {
        None
    } else {
        Some(check_receiver(&method.name, method.declaring_type, receiver)?)
    };
    let args = check_arguments(&method.name, &method.parameters, args)?;

    let resolved = match this {
        Some(this) if method.is_overridable() => resolve_override(this.ty(), method),
        _ => None,
    };
    let target: &MethodDef = resolved.as_deref().unwrap_or(method);

    let result = match &target.body {
        MethodBody::Abstract => {
            return Err(RuntimeError::AbstractInvocation {
                member: method.name.clone(),
            })
        }
        MethodBody::Native(f) => f(&CallContext::new(this, &args, &target.name))?,
        MethodBody::Compiled(body) => execute(body, this, &args)?,
    };

    if target.return_type.is_void() {
        Ok(Value::Null)
    } else {
        Ok(result.coerce_to(&target.return_type))
    }
}

// ============================================================================
// Construction
// ============================================================================

fn check_instantiable(ty: &TypeHandle) -> RuntimeResult<()> {
    if !ty.is_class() || ty.is_abstract() || ty.is_static() {
        return Err(RuntimeError::NotInstantiable {
            type_name: ty.full_name(),
        });
    }
    Ok(())
}

/// Whether `ty` can be constructed (or chained to) without arguments
pub(crate) fn has_parameterless_constructor(ty: &TypeHandle) -> bool {
    let mut ctors = ty.declared_constructors().filter(|c| !c.is_static).peekable();
    ctors.peek().is_none() || ctors.any(|c| c.parameters.is_empty())
}

fn find_in_chain(ty: &TypeHandle, id: TypeId) -> Option<TypeHandle> {
    let mut current = Some(ty.clone());
    while let Some(candidate) = current {
        if candidate.id() == id {
            return Some(candidate);
        }
        current = candidate.parent().cloned();
    }
    None
}

fn run_default_constructor(ty: &TypeHandle, this: &ObjectRef) -> RuntimeResult<()> {
    let mut ctors = ty.declared_constructors().filter(|c| !c.is_static).peekable();
    if ctors.peek().is_none() {
        return match ty.parent() {
            Some(parent) => run_default_constructor(parent, this),
            None => Ok(()),
        };
    }
    match ctors.find(|c| c.parameters.is_empty()) {
        Some(ctor) => run_constructor(ctor, this, &[]),
        None => Err(RuntimeError::MissingConstructor {
            type_name: ty.full_name(),
            arity: 0,
        }),
    }
}

fn run_constructor(ctor: &ConstructorDef, this: &ObjectRef, args: &[Value]) -> RuntimeResult<()> {
    if ctor.body.needs_implicit_base_call() {
        let declaring = find_in_chain(this.ty(), ctor.declaring_type).ok_or_else(|| {
            RuntimeError::TypeMismatch {
                expected: format!("instance of {}", ctor.declaring_type),
                actual: this.ty().full_name(),
            }
        })?;
        if let Some(parent) = declaring.parent() {
            run_default_constructor(parent, this)?;
        }
    }

    match &ctor.body {
        MethodBody::Abstract => Err(RuntimeError::AbstractInvocation {
            member: ".ctor".to_string(),
        }),
        MethodBody::Native(f) => f(&CallContext::new(Some(this), args, ".ctor")).map(|_| ()),
        MethodBody::Compiled(body) => execute(body, Some(this), args).map(|_| ()),
    }
}

/// Run a specific constructor of `ty` on a fresh instance
pub fn invoke_constructor(
    ty: &TypeHandle,
    ctor: &ConstructorDef,
    args: &[Value],
) -> RuntimeResult<ObjectRef> {
    check_instantiable(ty)?;
    if ctor.is_static || ctor.declaring_type != ty.id() {
        return Err(RuntimeError::InvalidDefinition(format!(
            "constructor does not belong to '{}'",
            ty.full_name()
        )));
    }
    let args = check_arguments(".ctor", &ctor.parameters, args)?;

    let instance = ObjectRef::allocate(ty);
    run_constructor(ctor, &instance, &args)?;
    Ok(instance)
}

/// Create an instance of `ty` with the constructor matching `args`
pub fn construct(ty: &TypeHandle, args: &[Value]) -> RuntimeResult<ObjectRef> {
    check_instantiable(ty)?;

    let mut candidates = ty.declared_constructors().filter(|c| !c.is_static).peekable();
    if candidates.peek().is_none() {
        if !args.is_empty() {
            return Err(RuntimeError::MissingConstructor {
                type_name: ty.full_name(),
                arity: args.len(),
            });
        }
        let instance = ObjectRef::allocate(ty);
        if let Some(parent) = ty.parent() {
            run_default_constructor(parent, &instance)?;
        }
        return Ok(instance);
    }

    let ctor = candidates
        .find(|c| {
            c.parameters.len() == args.len()
                && c.parameters.iter().zip(args).all(|(p, a)| a.is_assignable_to(&p.ty))
        })
        .ok_or_else(|| RuntimeError::MissingConstructor {
            type_name: ty.full_name(),
            arity: args.len(),
        })?;
    invoke_constructor(ty, ctor, args)
}

pub(crate) fn run_type_initializer(ctor: &ConstructorDef) -> RuntimeResult<()> {
    match &ctor.body {
        MethodBody::Abstract => Err(RuntimeError::AbstractInvocation {
            member: ".cctor".to_string(),
        }),
        MethodBody::Native(f) => f(&CallContext::new(None, &[], ".cctor")).map(|_| ()),
        MethodBody::Compiled(body) => execute(body, None, &[]).map(|_| ()),
    }
}

// ============================================================================
// Fields
// ============================================================================

/// Read a field; `receiver` is ignored for static fields
pub fn read_field(field: &FieldDef, receiver: Option<&ObjectRef>) -> RuntimeResult<Value> {
    match &field.location {
        FieldLocation::Static(cell) => Ok(cell.load()),
        FieldLocation::Instance(slot) => {
            check_receiver(&field.name, field.declaring_type, receiver)?.load_slot(*slot)
        }
    }
}

/// Write a field; `receiver` is ignored for static fields
pub fn write_field(field: &FieldDef, receiver: Option<&ObjectRef>, value: Value) -> RuntimeResult<()> {
    value.check_assignable(&field.field_type)?;
    let value = value.coerce_to(&field.field_type);
    match &field.location {
        FieldLocation::Static(cell) => {
            cell.store(value);
            Ok(())
        }
        FieldLocation::Instance(slot) => {
            check_receiver(&field.name, field.declaring_type, receiver)?.store_slot(*slot, value)
        }
    }
}

// ============================================================================
// Compiled Bodies
// ============================================================================

fn pop(stack: &mut Vec<Value>, body: &CompiledBody) -> RuntimeResult<Value> {
    stack
        .pop()
        .ok_or_else(|| RuntimeError::InvalidBody(format!("{}: stack underflow", body.name)))
}

fn pop_object(stack: &mut Vec<Value>, body: &CompiledBody) -> RuntimeResult<ObjectRef> {
    match pop(stack, body)? {
        Value::Object(object) => Ok(object),
        Value::Null => Err(RuntimeError::NullReceiver {
            member: body.name.clone(),
        }),
        other => Err(RuntimeError::TypeMismatch {
            expected: "object".to_string(),
            actual: other.describe(),
        }),
    }
}

fn execute(body: &CompiledBody, receiver: Option<&ObjectRef>, args: &[Value]) -> RuntimeResult<Value> {
    let mut frame: Vec<Value> = Vec::with_capacity(args.len() + 1);
    if let Some(this) = receiver {
        frame.push(Value::Object(this.clone()));
    }
    frame.extend(args.iter().cloned());

    let mut stack: Vec<Value> = Vec::with_capacity(body.max_stack);
    for instruction in &body.instructions {
        match instruction {
            Instruction::Nop => {}
            Instruction::Pop => {
                pop(&mut stack, body)?;
            }
            Instruction::LoadArg(index) => {
                let value = frame.get(*index).cloned().ok_or_else(|| {
                    RuntimeError::InvalidBody(format!(
                        "{}: argument {} out of range",
                        body.name, index
                    ))
                })?;
                stack.push(value);
            }
            Instruction::LoadConst(value) => stack.push(value.clone()),
            Instruction::LoadDefault(ty) => stack.push(ty.default_value()),
            Instruction::LoadField(FieldLocation::Static(cell)) => stack.push(cell.load()),
            Instruction::LoadField(FieldLocation::Instance(slot)) => {
                let target = pop_object(&mut stack, body)?;
                stack.push(target.load_slot(*slot)?);
            }
            Instruction::StoreField(location) => {
                let value = pop(&mut stack, body)?;
                match location {
                    FieldLocation::Static(cell) => cell.store(value),
                    FieldLocation::Instance(slot) => {
                        pop_object(&mut stack, body)?.store_slot(*slot, value)?
                    }
                }
            }
            Instruction::CallConstructor { constructor, argc } => {
                if stack.len() < argc + 1 {
                    return Err(RuntimeError::InvalidBody(format!(
                        "{}: stack underflow",
                        body.name
                    )));
                }
                let ctor_args = stack.split_off(stack.len() - argc);
                let this = pop_object(&mut stack, body)?;
                let ctor_args = check_arguments(".ctor", &constructor.parameters, &ctor_args)?;
                run_constructor(constructor, &this, &ctor_args)?;
            }
            Instruction::Return => return pop(&mut stack, body),
            Instruction::ReturnVoid => return Ok(Value::Null),
        }
    }

    Err(RuntimeError::InvalidBody(format!(
        "{}: execution ran past the last instruction",
        body.name
    )))
}
