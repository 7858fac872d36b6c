use crate::{
    annotation::AnnotationBuilder,
    class::{Instr, Intrinsic, MethodDef},
    contract,
    error::{ErrorOrigin, InternalError},
    value::Value,
    vm::{MAX_CALL_DEPTH, MemberHandle, ObjectRef, Vm},
};
use critter_schema::{prelude::*, types::parse_method_signature};
use std::sync::Arc;

///
/// Frame
///

struct Frame<'a> {
    method: &'a MethodDef,
    locals: Vec<Value>,
    stack: Vec<Value>,
    annotations: Vec<AnnotationBuilder>,
}

impl Frame<'_> {
    fn pop(&mut self) -> Result<Value, InternalError> {
        self.stack.pop().ok_or_else(|| {
            InternalError::vm_invariant(format!("operand stack underflow in {}", self.method.name))
        })
    }

    fn pop_n(&mut self, n: usize) -> Result<Vec<Value>, InternalError> {
        let at = self.stack.len().checked_sub(n).ok_or_else(|| {
            InternalError::vm_invariant(format!("operand stack underflow in {}", self.method.name))
        })?;

        Ok(self.stack.split_off(at))
    }

    fn pop_object(&mut self) -> Result<ObjectRef, InternalError> {
        match self.pop()? {
            Value::Object(obj) => Ok(obj),
            other => Err(InternalError::vm_type_mismatch(format!(
                "{}: expected an object, found {}",
                self.method.name,
                other.kind_name()
            ))),
        }
    }

    fn pop_text(&mut self) -> Result<String, InternalError> {
        match self.pop()? {
            Value::Text(s) => Ok(s),
            other => Err(InternalError::vm_type_mismatch(format!(
                "{}: expected a string, found {}",
                self.method.name,
                other.kind_name()
            ))),
        }
    }

    fn pop_config(&mut self) -> Result<Arc<MappingConfig>, InternalError> {
        match self.pop()? {
            Value::Config(config) => Ok(config),
            other => Err(InternalError::vm_type_mismatch(format!(
                "{}: expected the mapping config, found {}",
                self.method.name,
                other.kind_name()
            ))),
        }
    }

    fn peek(&self) -> Result<&Value, InternalError> {
        self.stack.last().ok_or_else(|| {
            InternalError::vm_invariant(format!("operand stack underflow in {}", self.method.name))
        })
    }
}

impl Vm {
    /// Run one method body with `this` in local 0 and `args` after it.
    #[allow(clippy::too_many_lines)]
    pub(super) fn execute(
        &self,
        this: &ObjectRef,
        method: &MethodDef,
        args: Vec<Value>,
        depth: usize,
    ) -> Result<Value, InternalError> {
        if depth >= MAX_CALL_DEPTH {
            return Err(InternalError::vm_invariant(format!(
                "call depth {MAX_CALL_DEPTH} exceeded in {}.{}",
                this.class_name(),
                method.name
            )));
        }

        let sig = parse_method_signature(&method.descriptor)
            .map_err(|e| InternalError::vm_invariant(format!("{}: {e}", method.descriptor)))?;
        if sig.params.len() != args.len() {
            return Err(InternalError::vm_type_mismatch(format!(
                "{}{} takes {} arguments, got {}",
                method.name,
                method.descriptor,
                sig.params.len(),
                args.len()
            )));
        }
        for (param, arg) in sig.params.iter().zip(&args) {
            if !self.conforms_to_type(arg, param) {
                return Err(InternalError::vm_type_mismatch(format!(
                    "{}{}: argument {} does not fit {param}",
                    method.name,
                    method.descriptor,
                    arg.kind_name()
                )));
            }
        }

        let mut locals = Vec::with_capacity(usize::from(method.max_locals));
        locals.push(Value::Object(this.clone()));
        locals.extend(args);
        locals.resize(usize::from(method.max_locals).max(locals.len()), Value::Null);

        let mut frame = Frame {
            method,
            locals,
            stack: Vec::new(),
            annotations: Vec::new(),
        };

        for instr in &method.code {
            match instr {
                Instr::Nop => {}
                Instr::Load(i) => {
                    let value = frame.locals.get(usize::from(*i)).cloned().ok_or_else(|| {
                        InternalError::vm_invariant(format!("local {i} out of range in {}", method.name))
                    })?;
                    frame.stack.push(value);
                }
                Instr::Dup => {
                    let top = frame.peek()?.clone();
                    frame.stack.push(top);
                }
                Instr::Pop => {
                    frame.pop()?;
                }
                Instr::PushNull => frame.stack.push(Value::Null),
                Instr::PushBool(v) => frame.stack.push(Value::Bool(*v)),
                Instr::Ldc(c) => frame.stack.push(Value::from_literal(c)),

                Instr::GetField { class, name } => {
                    let obj = frame.pop_object()?;
                    check_instance(&obj, class)?;
                    frame.stack.push(self.get_field(&obj, name)?);
                }
                Instr::PutField { class, name } => {
                    let value = frame.pop()?;
                    let obj = frame.pop_object()?;
                    check_instance(&obj, class)?;
                    self.set_field(&obj, name, value)?;
                }
                Instr::Invoke {
                    class,
                    name,
                    descriptor,
                } => {
                    let callee = parse_method_signature(descriptor)
                        .map_err(|e| InternalError::vm_invariant(format!("{descriptor}: {e}")))?;
                    let call_args = frame.pop_n(callee.arity())?;
                    let receiver = frame.pop_object()?;
                    check_instance(&receiver, class)?;

                    let result = self.call(&receiver, name, descriptor, call_args, depth + 1)?;
                    if callee.ret.is_some() {
                        frame.stack.push(result);
                    }
                }
                Instr::New { class, descriptor } => {
                    let ctor = parse_method_signature(descriptor)
                        .map_err(|e| InternalError::vm_invariant(format!("{descriptor}: {e}")))?;
                    let ctor_args = frame.pop_n(ctor.arity())?;
                    let obj = self.construct(class, descriptor, ctor_args, depth + 1)?;
                    frame.stack.push(Value::Object(obj));
                }
                Instr::CheckCast(target) => {
                    let top = frame.peek()?;
                    if !self.conforms(top, target) {
                        return Err(InternalError::vm_type_mismatch(format!(
                            "cannot cast {} to {target}",
                            top.kind_name()
                        )));
                    }
                }
                Instr::Box(p) => {
                    let value = frame.pop()?.boxed(*p)?;
                    frame.stack.push(value);
                }
                Instr::Unbox(p) => {
                    let value = frame.pop()?.unboxed(*p)?;
                    frame.stack.push(value);
                }

                Instr::NewType {
                    kind,
                    raw,
                    bound,
                    dims,
                    argc,
                } => {
                    let args = frame
                        .pop_n(usize::from(*argc))?
                        .into_iter()
                        .map(Value::into_type)
                        .collect::<Result<Vec<_>, _>>()?;
                    let ty = TypeDescriptor::class(raw.clone())
                        .with_kind(*kind)
                        .with_args(args)
                        .with_dims(*dims)
                        .with_bound(*bound);
                    frame.stack.push(Value::Type(ty));
                }
                Instr::NewList(n) => {
                    let items = frame.pop_n(usize::from(*n))?;
                    frame.stack.push(Value::List(items));
                }
                Instr::NewEnum { type_name, variant } => frame.stack.push(Value::Enum {
                    type_name: type_name.clone(),
                    variant: variant.clone(),
                }),

                Instr::AnnotationBegin(type_name) => {
                    let builder = self.registry.annotations().builder(type_name)?;
                    frame.annotations.push(builder);
                }
                Instr::AnnotationSet(element) => {
                    let value = frame.pop()?;
                    let builder = frame.annotations.last_mut().ok_or_else(|| {
                        InternalError::vm_invariant(format!("{}: no open annotation", method.name))
                    })?;
                    builder.set(element, value)?;
                }
                Instr::AnnotationEnd => {
                    let builder = frame.annotations.pop().ok_or_else(|| {
                        InternalError::vm_invariant(format!("{}: no open annotation", method.name))
                    })?;
                    let obj = frame.pop_object()?;
                    let mut list = match self.get_field(&obj, contract::ANNOTATIONS_FIELD)? {
                        Value::List(items) => items,
                        Value::Null => Vec::new(),
                        other => {
                            return Err(InternalError::vm_type_mismatch(format!(
                                "annotations field holds {}",
                                other.kind_name()
                            )));
                        }
                    };
                    list.push(Value::Annotation(builder.build()));
                    self.set_field(&obj, contract::ANNOTATIONS_FIELD, Value::List(list))?;
                }

                Instr::ResolveField { class, name } => {
                    let handle = self
                        .resolve_field(class, name)
                        .map_err(|e| InternalError::missing_lookup(class, name, e))?;
                    frame.stack.push(Value::Handle(Arc::new(handle)));
                }
                Instr::ResolveMethod {
                    class,
                    name,
                    descriptor,
                    required,
                } => {
                    let member = format!("{name}{descriptor}");
                    let handle = self
                        .resolve_method(class, name, descriptor)
                        .map_err(|e| InternalError::missing_lookup(class, &member, e))?;

                    match handle {
                        Some(h) => frame.stack.push(Value::Handle(Arc::new(h))),
                        None if !*required => frame.stack.push(Value::Null),
                        None => {
                            let cause = InternalError::missing_target(
                                ErrorOrigin::Vm,
                                format!("no method {member} on {class}"),
                            );
                            return Err(InternalError::missing_lookup(class, member, cause));
                        }
                    }
                }
                Instr::HandleGet => {
                    let obj = frame.pop_object()?;
                    let handle = pop_handle(&mut frame)?;
                    let handle = handle.ok_or_else(|| {
                        InternalError::vm_invariant(format!("{}: null handle", method.name))
                    })?;
                    frame.stack.push(self.handle_get_at(&handle, &obj, depth)?);
                }
                Instr::HandleSet { entity, property } => {
                    let value = frame.pop()?;
                    let obj = frame.pop_object()?;
                    match pop_handle(&mut frame)? {
                        Some(handle) => self.handle_set_at(&handle, &obj, value, depth)?,
                        None => return Err(InternalError::read_only(entity, property)),
                    }
                }

                Instr::Intrinsic(intrinsic) => {
                    let value = match intrinsic {
                        Intrinsic::CollectionName => {
                            let simple = frame.pop_text()?;
                            frame.pop_config()?.collection_name(&simple)
                        }
                        Intrinsic::Discriminator => {
                            let qualified = frame.pop_text()?;
                            frame.pop_config()?.discriminator(&qualified)
                        }
                        Intrinsic::DiscriminatorKey => {
                            frame.pop_config()?.discriminator_key().to_string()
                        }
                    };
                    frame.stack.push(Value::Text(value));
                }

                Instr::Throw(message) => {
                    return Err(InternalError::vm_unsupported(format!(
                        "{}.{}: {message}",
                        this.class_name(),
                        method.name
                    )));
                }
                Instr::Return => {
                    let value = frame.pop()?;
                    if let Some(ret) = &sig.ret
                        && !self.conforms_to_type(&value, ret)
                    {
                        return Err(InternalError::vm_type_mismatch(format!(
                            "{}{} cannot return {}",
                            method.name,
                            method.descriptor,
                            value.kind_name()
                        )));
                    }
                    return Ok(value);
                }
                Instr::ReturnVoid => return Ok(Value::Null),
            }
        }

        Err(InternalError::vm_invariant(format!(
            "{}.{} ran past its last instruction",
            this.class_name(),
            method.name
        )))
    }
}

fn check_instance(obj: &ObjectRef, class: &str) -> Result<(), InternalError> {
    if obj.class().is_subclass_of(class) {
        Ok(())
    } else {
        Err(InternalError::vm_type_mismatch(format!(
            "expected an instance of {class}, found {}",
            obj.class_name()
        )))
    }
}

fn pop_handle(frame: &mut Frame<'_>) -> Result<Option<Arc<MemberHandle>>, InternalError> {
    match frame.pop()? {
        Value::Handle(h) => Ok(Some(h)),
        Value::Null => Ok(None),
        other => Err(InternalError::vm_type_mismatch(format!(
            "expected a member handle, found {}",
            other.kind_name()
        ))),
    }
}
