//! Fluent class construction. Produces a [`ClassBody`] that is encoded
//! afterwards, so callers never touch pool indices or opcode bytes.

use crate::{
    class::{
        body::{ClassBody, ClassKind, FieldDef, MethodDef},
        opcode::{Instr, Intrinsic},
    },
    contract::Member,
    error::InternalError,
};
use critter_schema::{prelude::*, types::parse_method_signature};

///
/// ClassBuilder
///

#[derive(Clone, Debug)]
pub struct ClassBuilder {
    body: ClassBody,
}

impl ClassBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            body: ClassBody {
                name: name.into(),
                kind,
                flags: flags::PUBLIC,
                super_name: None,
                signature: None,
                interfaces: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
            },
        }
    }

    #[must_use]
    pub const fn flags(mut self, flags: u16) -> Self {
        self.body.flags = flags;
        self
    }

    #[must_use]
    pub fn extends(mut self, super_name: impl Into<String>) -> Self {
        self.body.super_name = Some(super_name.into());
        self
    }

    #[must_use]
    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.body.signature = Some(signature.into());
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.body.interfaces.push(interface.into());
        self
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, descriptor: impl Into<String>, flags: u16) -> Self {
        self.body.fields.push(FieldDef {
            name: name.into(),
            descriptor: descriptor.into(),
            flags,
            initial: None,
        });
        self
    }

    #[must_use]
    pub fn field_with_initial(
        mut self,
        name: impl Into<String>,
        descriptor: impl Into<String>,
        flags: u16,
        initial: Option<Constant>,
    ) -> Self {
        self.body.fields.push(FieldDef {
            name: name.into(),
            descriptor: descriptor.into(),
            flags,
            initial,
        });
        self
    }

    /// Add a method whose body is written by `emit`.
    #[must_use]
    pub fn method(
        self,
        name: impl Into<String>,
        descriptor: impl Into<String>,
        flags: u16,
        emit: impl FnOnce(&mut CodeBuilder),
    ) -> Self {
        let result: Result<Self, std::convert::Infallible> =
            self.try_method(name, descriptor, flags, |code| {
                emit(code);
                Ok(())
            });

        match result {
            Ok(builder) => builder,
            Err(never) => match never {},
        }
    }

    /// Add a method whose body emission may fail.
    pub fn try_method<E>(
        mut self,
        name: impl Into<String>,
        descriptor: impl Into<String>,
        flags: u16,
        emit: impl FnOnce(&mut CodeBuilder) -> Result<(), E>,
    ) -> Result<Self, E> {
        let descriptor = descriptor.into();
        let mut code = CodeBuilder::new();
        emit(&mut code)?;

        let arity = parse_method_signature(&descriptor).map_or(0, |sig| sig.arity());
        let max_locals = code.max_locals(arity);
        self.body.methods.push(MethodDef {
            name: name.into(),
            descriptor,
            flags,
            max_locals,
            code: code.code,
        });

        Ok(self)
    }

    /// Add a method implementing a contract member.
    #[must_use]
    pub fn member(self, member: Member, emit: impl FnOnce(&mut CodeBuilder)) -> Self {
        self.method(member.name, member.descriptor, flags::PUBLIC, emit)
    }

    pub fn try_member<E>(
        self,
        member: Member,
        emit: impl FnOnce(&mut CodeBuilder) -> Result<(), E>,
    ) -> Result<Self, E> {
        self.try_method(member.name, member.descriptor, flags::PUBLIC, emit)
    }

    #[must_use]
    pub fn build(self) -> ClassBody {
        self.body
    }
}

///
/// CodeBuilder
///
/// Collects one method's instructions. Locals are sized automatically from
/// the descriptor and the highest local loaded.
///

#[derive(Clone, Debug, Default)]
pub struct CodeBuilder {
    code: Vec<Instr>,
    max_load: Option<u8>,
}

impl CodeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn max_locals(&self, arity: usize) -> u16 {
        let from_args = u16::try_from(arity + 1).unwrap_or(u16::MAX);
        let from_loads = self.max_load.map_or(0, |i| u16::from(i) + 1);

        from_args.max(from_loads)
    }

    #[must_use]
    pub fn instructions(&self) -> &[Instr] {
        &self.code
    }

    pub fn push(&mut self, instr: Instr) -> &mut Self {
        if let Instr::Load(i) = instr {
            self.max_load = Some(self.max_load.map_or(i, |m| m.max(i)));
        }
        self.code.push(instr);
        self
    }

    pub fn load(&mut self, local: u8) -> &mut Self {
        self.push(Instr::Load(local))
    }

    pub fn load_this(&mut self) -> &mut Self {
        self.load(0)
    }

    pub fn dup(&mut self) -> &mut Self {
        self.push(Instr::Dup)
    }

    pub fn pop(&mut self) -> &mut Self {
        self.push(Instr::Pop)
    }

    pub fn push_null(&mut self) -> &mut Self {
        self.push(Instr::PushNull)
    }

    pub fn push_bool(&mut self, v: bool) -> &mut Self {
        self.push(Instr::PushBool(v))
    }

    pub fn ldc(&mut self, constant: Constant) -> &mut Self {
        self.push(Instr::Ldc(constant))
    }

    pub fn ldc_text(&mut self, s: impl Into<String>) -> &mut Self {
        self.ldc(Constant::Text(s.into()))
    }

    pub fn get_field(&mut self, class: impl Into<String>, name: impl Into<String>) -> &mut Self {
        self.push(Instr::GetField {
            class: class.into(),
            name: name.into(),
        })
    }

    pub fn put_field(&mut self, class: impl Into<String>, name: impl Into<String>) -> &mut Self {
        self.push(Instr::PutField {
            class: class.into(),
            name: name.into(),
        })
    }

    pub fn invoke(
        &mut self,
        class: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> &mut Self {
        self.push(Instr::Invoke {
            class: class.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        })
    }

    pub fn new_object(&mut self, class: impl Into<String>, descriptor: impl Into<String>) -> &mut Self {
        self.push(Instr::New {
            class: class.into(),
            descriptor: descriptor.into(),
        })
    }

    pub fn check_cast(&mut self, target: impl Into<String>) -> &mut Self {
        self.push(Instr::CheckCast(target.into()))
    }

    pub fn box_value(&mut self, primitive: Primitive) -> &mut Self {
        self.push(Instr::Box(primitive))
    }

    pub fn unbox_value(&mut self, primitive: Primitive) -> &mut Self {
        self.push(Instr::Unbox(primitive))
    }

    /// Re-materialize a type tree: arguments first, then their parent. A
    /// node with more arguments than an instruction can count is refused.
    pub fn type_data(&mut self, ty: &TypeDescriptor) -> Result<&mut Self, InternalError> {
        for arg in ty.args() {
            self.type_data(arg)?;
        }

        let argc = u8::try_from(ty.args().len()).map_err(|_| {
            InternalError::format_unsupported(format!(
                "{} has {} type arguments, at most {} can be encoded",
                ty.raw(),
                ty.args().len(),
                u8::MAX
            ))
        })?;

        Ok(self.push(Instr::NewType {
            kind: ty.kind(),
            raw: ty.raw().to_string(),
            bound: ty.bound(),
            dims: ty.dims(),
            argc,
        }))
    }

    pub fn new_list(&mut self, len: u16) -> &mut Self {
        self.push(Instr::NewList(len))
    }

    /// Push every text, then collect them into a list.
    pub fn text_list<'a>(
        &mut self,
        items: impl IntoIterator<Item = &'a String>,
    ) -> Result<&mut Self, InternalError> {
        let mut len: u16 = 0;
        for item in items {
            len = len.checked_add(1).ok_or_else(|| {
                InternalError::format_unsupported(format!(
                    "a text list holds at most {} items",
                    u16::MAX
                ))
            })?;
            self.ldc_text(item.clone());
        }

        Ok(self.new_list(len))
    }

    pub fn new_enum(&mut self, type_name: impl Into<String>, variant: impl Into<String>) -> &mut Self {
        self.push(Instr::NewEnum {
            type_name: type_name.into(),
            variant: variant.into(),
        })
    }

    pub fn annotation_begin(&mut self, type_name: impl Into<String>) -> &mut Self {
        self.push(Instr::AnnotationBegin(type_name.into()))
    }

    pub fn annotation_set(&mut self, element: impl Into<String>) -> &mut Self {
        self.push(Instr::AnnotationSet(element.into()))
    }

    pub fn annotation_end(&mut self) -> &mut Self {
        self.push(Instr::AnnotationEnd)
    }

    pub fn resolve_field(&mut self, class: impl Into<String>, name: impl Into<String>) -> &mut Self {
        self.push(Instr::ResolveField {
            class: class.into(),
            name: name.into(),
        })
    }

    pub fn resolve_method(
        &mut self,
        class: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
        required: bool,
    ) -> &mut Self {
        self.push(Instr::ResolveMethod {
            class: class.into(),
            name: name.into(),
            descriptor: descriptor.into(),
            required,
        })
    }

    pub fn handle_get(&mut self) -> &mut Self {
        self.push(Instr::HandleGet)
    }

    pub fn handle_set(&mut self, entity: impl Into<String>, property: impl Into<String>) -> &mut Self {
        self.push(Instr::HandleSet {
            entity: entity.into(),
            property: property.into(),
        })
    }

    pub fn intrinsic(&mut self, intrinsic: Intrinsic) -> &mut Self {
        self.push(Instr::Intrinsic(intrinsic))
    }

    pub fn throw(&mut self, message: impl Into<String>) -> &mut Self {
        self.push(Instr::Throw(message.into()))
    }

    pub fn ret(&mut self) -> &mut Self {
        self.push(Instr::Return)
    }

    pub fn ret_void(&mut self) -> &mut Self {
        self.push(Instr::ReturnVoid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{class::ClassBody, error::ErrorClass};

    #[test]
    fn locals_cover_arguments_and_loads() {
        let body = ClassBuilder::new("com.example.Thing", ClassKind::Accessor)
            .method("set", "(Ljava/lang/Object;Ljava/lang/Object;)V", flags::PUBLIC, |c| {
                c.ret_void();
            })
            .method("get", "()I", flags::PUBLIC, |c| {
                c.load(4).pop().ldc(Constant::Int(1)).ret();
            })
            .build();

        assert_eq!(body.methods[0].max_locals, 3);
        assert_eq!(body.methods[1].max_locals, 5);
    }

    #[test]
    fn type_data_is_post_order() {
        let ty = TypeDescriptor::class("java.util.Map").with_args(vec![
            TypeDescriptor::class("java.lang.String"),
            TypeDescriptor::primitive(Primitive::Int).with_dims(1),
        ]);
        let mut code = CodeBuilder::new();
        code.type_data(&ty).unwrap();

        let raws: Vec<_> = code
            .instructions()
            .iter()
            .map(|i| match i {
                Instr::NewType { raw, argc, .. } => (raw.as_str(), *argc),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(raws, vec![("java.lang.String", 0), ("int", 0), ("java.util.Map", 2)]);
    }

    #[test]
    fn counts_that_do_not_fit_an_instruction_are_refused() {
        let string = TypeDescriptor::class("java.lang.String");

        let widest = TypeDescriptor::class("com.example.Wide").with_args(vec![string.clone(); 255]);
        assert!(CodeBuilder::new().type_data(&widest).is_ok());

        let too_wide = TypeDescriptor::class("com.example.Wide").with_args(vec![string; 256]);
        let err = CodeBuilder::new().type_data(&too_wide).unwrap_err();
        assert_eq!(err.class, ErrorClass::Unsupported);

        // a nested overflow is refused too, not just the outermost node
        let nested = TypeDescriptor::class("java.util.List").with_args(vec![too_wide]);
        assert!(CodeBuilder::new().type_data(&nested).is_err());

        let texts = vec![String::new(); usize::from(u16::MAX)];
        let mut code = CodeBuilder::new();
        code.text_list(&texts).unwrap();
        assert_eq!(code.instructions().last(), Some(&Instr::NewList(u16::MAX)));

        let texts = vec![String::new(); usize::from(u16::MAX) + 1];
        let err = CodeBuilder::new().text_list(&texts).unwrap_err();
        assert_eq!(err.class, ErrorClass::Unsupported);
    }

    #[test]
    fn built_bodies_encode_and_decode() {
        let body = ClassBuilder::new("com.example.Thing", ClassKind::PropertyModel)
            .implements("critter.mapping.PropertyModel")
            .field("annotations", "Ljava/util/List;", flags::PRIVATE)
            .method("getLoadNames", "()Ljava/util/List;", flags::PUBLIC, |c| {
                c.text_list(&["a".to_string(), "b".to_string()]).unwrap().ret();
            })
            .build();

        let decoded = ClassBody::decode(&body.encode().unwrap()).unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn failing_emission_propagates() {
        let result = ClassBuilder::new("com.example.Thing", ClassKind::Accessor).try_method(
            "get",
            "()V",
            flags::PUBLIC,
            |_| Err("unsupported"),
        );

        assert_eq!(result.unwrap_err(), "unsupported");
    }
}
