use crate::{
    class::{
        FORMAT_VERSION, MAGIC,
        constant::ConstantPool,
        opcode::{Instr, Intrinsic, bound_from_tag, kind_from_tag, op},
        reader::ByteReader,
        writer::ClassWriter,
    },
    error::FormatError,
};
use critter_schema::{
    prelude::*,
    types::{parse_method_signature, parse_signature},
};
use std::fmt;

///
/// ClassKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum ClassKind {
    Accessor,
    Entity,
    EntityModel,
    PropertyModel,
}

impl ClassKind {
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Entity => 0,
            Self::Accessor => 1,
            Self::PropertyModel => 2,
            Self::EntityModel => 3,
        }
    }

    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Entity),
            1 => Some(Self::Accessor),
            2 => Some(Self::PropertyModel),
            3 => Some(Self::EntityModel),
            _ => None,
        }
    }
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Accessor => "accessor",
            Self::Entity => "entity",
            Self::EntityModel => "entity-model",
            Self::PropertyModel => "property-model",
        };
        write!(f, "{label}")
    }
}

///
/// FieldDef
///

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub descriptor: String,
    pub flags: u16,
    pub initial: Option<Constant>,
}

///
/// MethodDef
///

#[derive(Clone, Debug, PartialEq)]
pub struct MethodDef {
    pub name: String,
    pub descriptor: String,
    pub flags: u16,
    pub max_locals: u16,
    pub code: Vec<Instr>,
}

///
/// ClassBody
///
/// Decoded form of one generated class. `encode` and `decode` are inverse;
/// `decode` additionally rejects anything the interpreter could not run.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ClassBody {
    pub name: String,
    pub kind: ClassKind,
    pub flags: u16,
    pub super_name: Option<String>,
    pub signature: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<MethodDef>,
}

impl ClassBody {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodDef> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }

    pub fn encode(&self) -> Result<Vec<u8>, FormatError> {
        let mut w = ClassWriter::new(&self.name, self.kind, self.flags);
        if let Some(super_name) = &self.super_name {
            w.set_super(super_name);
        }
        if let Some(signature) = &self.signature {
            w.set_signature(signature);
        }
        for iface in &self.interfaces {
            w.add_interface(iface);
        }
        for f in &self.fields {
            w.add_field(&f.name, &f.descriptor, f.flags, f.initial.as_ref());
        }
        for m in &self.methods {
            let mut mw = w.method(&m.name, &m.descriptor, m.flags, m.max_locals);
            for instr in &m.code {
                mw.instr(instr);
            }
        }

        w.to_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut r = ByteReader::new(bytes);

        if r.take(MAGIC.len()).map_err(|_| FormatError::BadMagic)? != MAGIC {
            return Err(FormatError::BadMagic);
        }
        let version = r.u16()?;
        if version != FORMAT_VERSION {
            return Err(FormatError::UnsupportedVersion(version));
        }

        let pool = ConstantPool::read(&mut r)?;

        let name = pool.utf8_at(r.u16()?)?.to_string();
        let kind_tag = r.u8()?;
        let kind = ClassKind::from_tag(kind_tag).ok_or(FormatError::BadClassKind(kind_tag))?;
        let flags = r.u16()?;
        let super_name = pool.opt_utf8_at(r.u16()?)?.map(str::to_string);
        let signature = pool.opt_utf8_at(r.u16()?)?.map(str::to_string);

        let mut interfaces = Vec::new();
        for _ in 0..r.u16()? {
            interfaces.push(pool.utf8_at(r.u16()?)?.to_string());
        }

        let mut fields = Vec::new();
        for _ in 0..r.u16()? {
            let name = pool.utf8_at(r.u16()?)?.to_string();
            let descriptor = pool.utf8_at(r.u16()?)?.to_string();
            let flags = r.u16()?;
            let initial_index = r.u16()?;
            let initial = if initial_index == 0 {
                None
            } else {
                Some(pool.constant_at(initial_index)?)
            };

            check_type(&descriptor)?;
            fields.push(FieldDef {
                name,
                descriptor,
                flags,
                initial,
            });
        }

        let mut methods = Vec::new();
        for _ in 0..r.u16()? {
            let name = pool.utf8_at(r.u16()?)?.to_string();
            let descriptor = pool.utf8_at(r.u16()?)?.to_string();
            let flags = r.u16()?;
            let max_locals = r.u16()?;
            let len = usize::try_from(r.u32()?)
                .map_err(|_| FormatError::TooLarge { what: "method code" })?;
            let base = r.offset();
            let code = decode_code(&mut ByteReader::with_base(r.take(len)?, base), &pool)?;

            let method = MethodDef {
                name,
                descriptor,
                flags,
                max_locals,
                code,
            };
            validate_method(&method)?;
            methods.push(method);
        }

        if !r.is_empty() {
            return Err(FormatError::TrailingBytes {
                count: r.remaining(),
            });
        }

        Ok(Self {
            name,
            kind,
            flags,
            super_name,
            signature,
            interfaces,
            fields,
            methods,
        })
    }
}

fn bad_descriptor(descriptor: &str, reason: impl ToString) -> FormatError {
    FormatError::BadDescriptor {
        descriptor: descriptor.to_string(),
        reason: reason.to_string(),
    }
}

fn check_type(descriptor: &str) -> Result<(), FormatError> {
    parse_signature(descriptor)
        .map(|_| ())
        .map_err(|e| bad_descriptor(descriptor, e))
}

fn check_method_type(descriptor: &str) -> Result<(), FormatError> {
    parse_method_signature(descriptor)
        .map(|_| ())
        .map_err(|e| bad_descriptor(descriptor, e))
}

fn decode_code(r: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<Vec<Instr>, FormatError> {
    let mut code = Vec::new();

    while !r.is_empty() {
        let offset = r.offset();
        let opcode = r.u8()?;
        let text = |r: &mut ByteReader<'_>| -> Result<String, FormatError> {
            Ok(pool.utf8_at(r.u16()?)?.to_string())
        };

        let instr = match opcode {
            op::NOP => Instr::Nop,
            op::LOAD => Instr::Load(r.u8()?),
            op::DUP => Instr::Dup,
            op::POP => Instr::Pop,
            op::PUSH_NULL => Instr::PushNull,
            op::PUSH_BOOL => Instr::PushBool(r.u8()? != 0),
            op::LDC => Instr::Ldc(pool.constant_at(r.u16()?)?),
            op::GET_FIELD => Instr::GetField {
                class: text(r)?,
                name: text(r)?,
            },
            op::PUT_FIELD => Instr::PutField {
                class: text(r)?,
                name: text(r)?,
            },
            op::INVOKE => {
                let class = text(r)?;
                let name = text(r)?;
                let descriptor = text(r)?;
                check_method_type(&descriptor)?;
                Instr::Invoke {
                    class,
                    name,
                    descriptor,
                }
            }
            op::NEW => {
                let class = text(r)?;
                let descriptor = text(r)?;
                check_method_type(&descriptor)?;
                Instr::New { class, descriptor }
            }
            op::CHECK_CAST => {
                let target = text(r)?;
                if target.starts_with('[') {
                    check_type(&target)?;
                }
                Instr::CheckCast(target)
            }
            op::BOX | op::UNBOX => {
                let code_offset = r.offset();
                let code = r.u8()?;
                let p = Primitive::from_code(code)
                    .filter(|p| *p != Primitive::Void)
                    .ok_or(FormatError::BadPrimitive {
                        code,
                        offset: code_offset,
                    })?;
                if opcode == op::BOX {
                    Instr::Box(p)
                } else {
                    Instr::Unbox(p)
                }
            }
            op::NEW_TYPE => {
                let tag_offset = r.offset();
                let tag = r.u8()?;
                let kind = kind_from_tag(tag).ok_or(FormatError::BadPrimitive {
                    code: tag,
                    offset: tag_offset,
                })?;
                let raw = text(r)?;
                let bound_offset = r.offset();
                let bound_tag = r.u8()?;
                let bound = bound_from_tag(bound_tag).ok_or(FormatError::BadBound {
                    tag: bound_tag,
                    offset: bound_offset,
                })?;
                Instr::NewType {
                    kind,
                    raw,
                    bound,
                    dims: r.u8()?,
                    argc: r.u8()?,
                }
            }
            op::NEW_LIST => Instr::NewList(r.u16()?),
            op::NEW_ENUM => Instr::NewEnum {
                type_name: text(r)?,
                variant: text(r)?,
            },
            op::ANNOTATION_BEGIN => Instr::AnnotationBegin(text(r)?),
            op::ANNOTATION_SET => Instr::AnnotationSet(text(r)?),
            op::ANNOTATION_END => Instr::AnnotationEnd,
            op::RESOLVE_FIELD => Instr::ResolveField {
                class: text(r)?,
                name: text(r)?,
            },
            op::RESOLVE_METHOD => {
                let class = text(r)?;
                let name = text(r)?;
                let descriptor = text(r)?;
                check_method_type(&descriptor)?;
                Instr::ResolveMethod {
                    class,
                    name,
                    descriptor,
                    required: r.u8()? != 0,
                }
            }
            op::HANDLE_GET => Instr::HandleGet,
            op::HANDLE_SET => Instr::HandleSet {
                entity: text(r)?,
                property: text(r)?,
            },
            op::INTRINSIC => {
                let id_offset = r.offset();
                let id = r.u8()?;
                Instr::Intrinsic(Intrinsic::from_id(id).ok_or(FormatError::BadIntrinsic {
                    id,
                    offset: id_offset,
                })?)
            }
            op::THROW => Instr::Throw(text(r)?),
            op::RETURN => Instr::Return,
            op::RETURN_VOID => Instr::ReturnVoid,
            _ => return Err(FormatError::BadOpcode { opcode, offset }),
        };

        code.push(instr);
    }

    Ok(code)
}

// Checks that need the whole method: locals fit, the body terminates and
// every return agrees with the descriptor.
fn validate_method(method: &MethodDef) -> Result<(), FormatError> {
    let sig = parse_method_signature(&method.descriptor)
        .map_err(|e| bad_descriptor(&method.descriptor, e))?;

    let needed = u16::try_from(sig.arity() + 1).unwrap_or(u16::MAX);
    if needed > method.max_locals {
        return Err(FormatError::LocalOutOfBounds {
            method: method.name.clone(),
            index: needed - 1,
            max: method.max_locals,
        });
    }

    if !method.code.last().is_some_and(Instr::is_terminal) {
        return Err(FormatError::MissingTerminator {
            method: method.name.clone(),
        });
    }

    for instr in &method.code {
        match instr {
            Instr::Load(i) if u16::from(*i) >= method.max_locals => {
                return Err(FormatError::LocalOutOfBounds {
                    method: method.name.clone(),
                    index: u16::from(*i),
                    max: method.max_locals,
                });
            }
            Instr::Return if sig.ret.is_none() => {
                return Err(FormatError::ReturnMismatch {
                    method: method.name.clone(),
                });
            }
            Instr::ReturnVoid if sig.ret.is_some() => {
                return Err(FormatError::ReturnMismatch {
                    method: method.name.clone(),
                });
            }
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClassBody {
        ClassBody {
            name: "com.example.Person".to_string(),
            kind: ClassKind::Entity,
            flags: flags::PUBLIC,
            super_name: Some("java.lang.Object".to_string()),
            signature: None,
            interfaces: Vec::new(),
            fields: vec![FieldDef {
                name: "age".to_string(),
                descriptor: "I".to_string(),
                flags: flags::PRIVATE,
                initial: Some(Constant::Int(21)),
            }],
            methods: vec![MethodDef {
                name: "getAge".to_string(),
                descriptor: "()I".to_string(),
                flags: flags::PUBLIC,
                max_locals: 1,
                code: vec![
                    Instr::Load(0),
                    Instr::GetField {
                        class: "com.example.Person".to_string(),
                        name: "age".to_string(),
                    },
                    Instr::Return,
                ],
            }],
        }
    }

    #[test]
    fn decode_inverts_encode() {
        let body = sample();
        let bytes = body.encode().unwrap();

        assert_eq!(&bytes[..4], b"CRIT");
        assert_eq!(ClassBody::decode(&bytes).unwrap(), body);
    }

    #[test]
    fn bad_magic_and_truncation_are_reported() {
        let mut bytes = sample().encode().unwrap();

        assert_eq!(ClassBody::decode(b"NOPE"), Err(FormatError::BadMagic));
        assert_eq!(ClassBody::decode(b"CR"), Err(FormatError::BadMagic));

        let truncated = &bytes[..bytes.len() - 1];
        assert!(matches!(
            ClassBody::decode(truncated),
            Err(FormatError::UnexpectedEof { .. })
        ));

        bytes.push(0);
        assert_eq!(
            ClassBody::decode(&bytes),
            Err(FormatError::TrailingBytes { count: 1 })
        );
    }

    #[test]
    fn unknown_opcode_is_rejected() {
        let mut body = sample();
        body.methods[0].code = vec![Instr::Return];
        let mut bytes = body.encode().unwrap();

        // the last byte is the method's only opcode
        let last = bytes.len() - 1;
        bytes[last] = 0xee;

        assert_eq!(
            ClassBody::decode(&bytes),
            Err(FormatError::BadOpcode {
                opcode: 0xee,
                offset: last
            })
        );
    }

    #[test]
    fn methods_must_terminate_and_fit_locals() {
        let mut body = sample();
        body.methods[0].code.pop();
        assert_eq!(
            ClassBody::decode(&body.encode().unwrap()),
            Err(FormatError::MissingTerminator {
                method: "getAge".to_string()
            })
        );

        let mut body = sample();
        body.methods[0].code.insert(0, Instr::Load(3));
        assert!(matches!(
            ClassBody::decode(&body.encode().unwrap()),
            Err(FormatError::LocalOutOfBounds { index: 3, .. })
        ));

        let mut body = sample();
        body.methods[0].code = vec![Instr::ReturnVoid];
        assert!(matches!(
            ClassBody::decode(&body.encode().unwrap()),
            Err(FormatError::ReturnMismatch { .. })
        ));
    }

    #[test]
    fn bad_field_descriptor_is_rejected() {
        let mut body = sample();
        body.fields[0].descriptor = "Ljava/lang/String".to_string();

        assert!(matches!(
            ClassBody::decode(&body.encode().unwrap()),
            Err(FormatError::BadDescriptor { .. })
        ));
    }
}
