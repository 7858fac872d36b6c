//! Low-level class writer: opcodes and pool indices go straight into the
//! output buffers, with no intermediate instruction list.

use crate::{
    class::{
        ClassKind, FORMAT_VERSION, MAGIC,
        constant::ConstantPool,
        opcode::{Instr, Intrinsic, bound_tag, kind_tag, op},
    },
    error::FormatError,
};
use critter_schema::prelude::*;

struct RawField {
    name: u16,
    descriptor: u16,
    flags: u16,
    initial: u16,
}

struct RawMethod {
    name: u16,
    descriptor: u16,
    flags: u16,
    max_locals: u16,
    code: Vec<u8>,
}

///
/// ClassWriter
///

pub struct ClassWriter {
    pool: ConstantPool,
    name: u16,
    kind: ClassKind,
    flags: u16,
    super_name: u16,
    signature: u16,
    interfaces: Vec<u16>,
    fields: Vec<RawField>,
    methods: Vec<RawMethod>,
}

impl ClassWriter {
    #[must_use]
    pub fn new(name: &str, kind: ClassKind, flags: u16) -> Self {
        let mut pool = ConstantPool::new();
        let name = pool.utf8(name);

        Self {
            pool,
            name,
            kind,
            flags,
            super_name: 0,
            signature: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn set_super(&mut self, name: &str) -> &mut Self {
        self.super_name = self.pool.utf8(name);
        self
    }

    pub fn set_signature(&mut self, signature: &str) -> &mut Self {
        self.signature = self.pool.utf8(signature);
        self
    }

    pub fn add_interface(&mut self, name: &str) -> &mut Self {
        let index = self.pool.utf8(name);
        self.interfaces.push(index);
        self
    }

    pub fn add_field(
        &mut self,
        name: &str,
        descriptor: &str,
        flags: u16,
        initial: Option<&Constant>,
    ) -> &mut Self {
        let field = RawField {
            name: self.pool.utf8(name),
            descriptor: self.pool.utf8(descriptor),
            flags,
            initial: initial.map_or(0, |c| self.pool.constant(c)),
        };
        self.fields.push(field);
        self
    }

    /// Open a method; instructions are appended through the returned writer.
    pub fn method(
        &mut self,
        name: &str,
        descriptor: &str,
        flags: u16,
        max_locals: u16,
    ) -> MethodWriter<'_> {
        let method = RawMethod {
            name: self.pool.utf8(name),
            descriptor: self.pool.utf8(descriptor),
            flags,
            max_locals,
            code: Vec::new(),
        };
        self.methods.push(method);
        let index = self.methods.len() - 1;

        MethodWriter {
            pool: &mut self.pool,
            code: &mut self.methods[index].code,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, FormatError> {
        let mut out = Vec::with_capacity(256);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
        self.pool.write(&mut out)?;

        out.extend_from_slice(&self.name.to_be_bytes());
        out.push(self.kind.tag());
        out.extend_from_slice(&self.flags.to_be_bytes());
        out.extend_from_slice(&self.super_name.to_be_bytes());
        out.extend_from_slice(&self.signature.to_be_bytes());

        write_count(&mut out, self.interfaces.len(), "interface table")?;
        for index in &self.interfaces {
            out.extend_from_slice(&index.to_be_bytes());
        }

        write_count(&mut out, self.fields.len(), "field table")?;
        for f in &self.fields {
            for v in [f.name, f.descriptor, f.flags, f.initial] {
                out.extend_from_slice(&v.to_be_bytes());
            }
        }

        write_count(&mut out, self.methods.len(), "method table")?;
        for m in &self.methods {
            for v in [m.name, m.descriptor, m.flags, m.max_locals] {
                out.extend_from_slice(&v.to_be_bytes());
            }
            let len = u32::try_from(m.code.len())
                .map_err(|_| FormatError::TooLarge { what: "method code" })?;
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(&m.code);
        }

        Ok(out)
    }
}

fn write_count(out: &mut Vec<u8>, len: usize, what: &'static str) -> Result<(), FormatError> {
    let count = u16::try_from(len).map_err(|_| FormatError::TooLarge { what })?;
    out.extend_from_slice(&count.to_be_bytes());

    Ok(())
}

///
/// MethodWriter
///

pub struct MethodWriter<'a> {
    pool: &'a mut ConstantPool,
    code: &'a mut Vec<u8>,
}

impl MethodWriter<'_> {
    fn op(&mut self, opcode: u8) -> &mut Self {
        self.code.push(opcode);
        self
    }

    fn byte(&mut self, v: u8) -> &mut Self {
        self.code.push(v);
        self
    }

    fn index(&mut self, v: u16) -> &mut Self {
        self.code.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn name(&mut self, s: &str) -> &mut Self {
        let index = self.pool.utf8(s);
        self.index(index)
    }

    pub fn nop(&mut self) -> &mut Self {
        self.op(op::NOP)
    }

    pub fn load(&mut self, local: u8) -> &mut Self {
        self.op(op::LOAD).byte(local)
    }

    pub fn dup(&mut self) -> &mut Self {
        self.op(op::DUP)
    }

    pub fn pop(&mut self) -> &mut Self {
        self.op(op::POP)
    }

    pub fn push_null(&mut self) -> &mut Self {
        self.op(op::PUSH_NULL)
    }

    pub fn push_bool(&mut self, v: bool) -> &mut Self {
        self.op(op::PUSH_BOOL).byte(u8::from(v))
    }

    pub fn ldc(&mut self, constant: &Constant) -> &mut Self {
        let index = self.pool.constant(constant);
        self.op(op::LDC).index(index)
    }

    pub fn get_field(&mut self, class: &str, name: &str) -> &mut Self {
        self.op(op::GET_FIELD).name(class).name(name)
    }

    pub fn put_field(&mut self, class: &str, name: &str) -> &mut Self {
        self.op(op::PUT_FIELD).name(class).name(name)
    }

    pub fn invoke(&mut self, class: &str, name: &str, descriptor: &str) -> &mut Self {
        self.op(op::INVOKE).name(class).name(name).name(descriptor)
    }

    pub fn new_object(&mut self, class: &str, descriptor: &str) -> &mut Self {
        self.op(op::NEW).name(class).name(descriptor)
    }

    pub fn check_cast(&mut self, target: &str) -> &mut Self {
        self.op(op::CHECK_CAST).name(target)
    }

    pub fn box_value(&mut self, primitive: Primitive) -> &mut Self {
        self.op(op::BOX).byte(primitive.code())
    }

    pub fn unbox_value(&mut self, primitive: Primitive) -> &mut Self {
        self.op(op::UNBOX).byte(primitive.code())
    }

    pub fn new_type(&mut self, kind: TypeKind, raw: &str, bound: Bound, dims: u8, argc: u8) -> &mut Self {
        self.op(op::NEW_TYPE)
            .byte(kind_tag(kind))
            .name(raw)
            .byte(bound_tag(bound))
            .byte(dims)
            .byte(argc)
    }

    pub fn new_list(&mut self, len: u16) -> &mut Self {
        self.op(op::NEW_LIST).index(len)
    }

    pub fn new_enum(&mut self, type_name: &str, variant: &str) -> &mut Self {
        self.op(op::NEW_ENUM).name(type_name).name(variant)
    }

    pub fn annotation_begin(&mut self, type_name: &str) -> &mut Self {
        self.op(op::ANNOTATION_BEGIN).name(type_name)
    }

    pub fn annotation_set(&mut self, element: &str) -> &mut Self {
        self.op(op::ANNOTATION_SET).name(element)
    }

    pub fn annotation_end(&mut self) -> &mut Self {
        self.op(op::ANNOTATION_END)
    }

    pub fn resolve_field(&mut self, class: &str, name: &str) -> &mut Self {
        self.op(op::RESOLVE_FIELD).name(class).name(name)
    }

    pub fn resolve_method(
        &mut self,
        class: &str,
        name: &str,
        descriptor: &str,
        required: bool,
    ) -> &mut Self {
        self.op(op::RESOLVE_METHOD)
            .name(class)
            .name(name)
            .name(descriptor)
            .byte(u8::from(required))
    }

    pub fn handle_get(&mut self) -> &mut Self {
        self.op(op::HANDLE_GET)
    }

    pub fn handle_set(&mut self, entity: &str, property: &str) -> &mut Self {
        self.op(op::HANDLE_SET).name(entity).name(property)
    }

    pub fn intrinsic(&mut self, intrinsic: Intrinsic) -> &mut Self {
        self.op(op::INTRINSIC).byte(intrinsic.id())
    }

    pub fn throw(&mut self, message: &str) -> &mut Self {
        self.op(op::THROW).name(message)
    }

    pub fn ret(&mut self) -> &mut Self {
        self.op(op::RETURN)
    }

    pub fn ret_void(&mut self) -> &mut Self {
        self.op(op::RETURN_VOID)
    }

    /// Encode one decoded instruction.
    pub fn instr(&mut self, instr: &Instr) -> &mut Self {
        match instr {
            Instr::Nop => self.nop(),
            Instr::Load(i) => self.load(*i),
            Instr::Dup => self.dup(),
            Instr::Pop => self.pop(),
            Instr::PushNull => self.push_null(),
            Instr::PushBool(v) => self.push_bool(*v),
            Instr::Ldc(c) => self.ldc(c),
            Instr::GetField { class, name } => self.get_field(class, name),
            Instr::PutField { class, name } => self.put_field(class, name),
            Instr::Invoke {
                class,
                name,
                descriptor,
            } => self.invoke(class, name, descriptor),
            Instr::New { class, descriptor } => self.new_object(class, descriptor),
            Instr::CheckCast(target) => self.check_cast(target),
            Instr::Box(p) => self.box_value(*p),
            Instr::Unbox(p) => self.unbox_value(*p),
            Instr::NewType {
                kind,
                raw,
                bound,
                dims,
                argc,
            } => self.new_type(*kind, raw, *bound, *dims, *argc),
            Instr::NewList(n) => self.new_list(*n),
            Instr::NewEnum { type_name, variant } => self.new_enum(type_name, variant),
            Instr::AnnotationBegin(t) => self.annotation_begin(t),
            Instr::AnnotationSet(e) => self.annotation_set(e),
            Instr::AnnotationEnd => self.annotation_end(),
            Instr::ResolveField { class, name } => self.resolve_field(class, name),
            Instr::ResolveMethod {
                class,
                name,
                descriptor,
                required,
            } => self.resolve_method(class, name, descriptor, *required),
            Instr::HandleGet => self.handle_get(),
            Instr::HandleSet { entity, property } => self.handle_set(entity, property),
            Instr::Intrinsic(i) => self.intrinsic(*i),
            Instr::Throw(msg) => self.throw(msg),
            Instr::Return => self.ret(),
            Instr::ReturnVoid => self.ret_void(),
        }
    }
}
