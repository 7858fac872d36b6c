use crate::class::{
    body::ClassBody,
    opcode::Instr,
};
use std::{collections::BTreeMap, fmt::Write};

// Applies the rename map to a dotted class name or to every `L...;`
// reference inside a descriptor.
struct Renamer<'a> {
    renames: &'a BTreeMap<String, String>,
}

impl Renamer<'_> {
    fn class(&self, name: &str) -> String {
        self.renames
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    fn descriptor(&self, descriptor: &str) -> String {
        let mut out = descriptor.to_string();
        for (from, to) in self.renames {
            let from = format!("L{};", from.replace('.', "/"));
            let to = format!("L{};", to.replace('.', "/"));
            out = out.replace(&from, &to);
        }

        out
    }
}

/// Human-readable listing of a class body. Class names found in `renames`
/// are printed under their replacement, which keeps listings of generated
/// classes stable across naming schemes.
#[must_use]
pub fn disassemble(body: &ClassBody, renames: &BTreeMap<String, String>) -> String {
    let rn = Renamer { renames };
    let mut out = String::new();

    let _ = writeln!(
        out,
        "class {} [{}] flags=0x{:04x}",
        rn.class(&body.name),
        body.kind,
        body.flags
    );
    if let Some(super_name) = &body.super_name {
        let _ = writeln!(out, "  extends {}", rn.class(super_name));
    }
    for iface in &body.interfaces {
        let _ = writeln!(out, "  implements {}", rn.class(iface));
    }
    if let Some(signature) = &body.signature {
        let _ = writeln!(out, "  signature {}", rn.descriptor(signature));
    }

    for f in &body.fields {
        let _ = write!(
            out,
            "  field {} {} flags=0x{:04x}",
            f.name,
            rn.descriptor(&f.descriptor),
            f.flags
        );
        if let Some(initial) = &f.initial {
            let _ = write!(out, " = {initial}");
        }
        out.push('\n');
    }

    for m in &body.methods {
        let _ = writeln!(
            out,
            "  method {}{} flags=0x{:04x} locals={}",
            m.name,
            rn.descriptor(&m.descriptor),
            m.flags,
            m.max_locals
        );
        for (i, instr) in m.code.iter().enumerate() {
            let _ = writeln!(out, "    {i:04}: {}", render(instr, &rn));
        }
    }

    out
}

fn render(instr: &Instr, rn: &Renamer<'_>) -> String {
    let mnemonic = instr.mnemonic();

    match instr {
        Instr::Load(i) => format!("{mnemonic} {i}"),
        Instr::PushBool(v) => format!("{mnemonic} {v}"),
        Instr::Ldc(c) => format!("{mnemonic} {c}"),
        Instr::GetField { class, name }
        | Instr::PutField { class, name }
        | Instr::ResolveField { class, name } => {
            format!("{mnemonic} {}.{name}", rn.class(class))
        }
        Instr::Invoke {
            class,
            name,
            descriptor,
        } => format!("{mnemonic} {}.{name}{}", rn.class(class), rn.descriptor(descriptor)),
        Instr::ResolveMethod {
            class,
            name,
            descriptor,
            required,
        } => {
            let optional = if *required { "" } else { " optional" };
            format!(
                "{mnemonic} {}.{name}{}{optional}",
                rn.class(class),
                rn.descriptor(descriptor)
            )
        }
        Instr::New { class, descriptor } => {
            format!("{mnemonic} {}{}", rn.class(class), rn.descriptor(descriptor))
        }
        Instr::CheckCast(target) if target.starts_with('[') => {
            format!("{mnemonic} {}", rn.descriptor(target))
        }
        Instr::CheckCast(target) => format!("{mnemonic} {}", rn.class(target)),
        Instr::Box(p) | Instr::Unbox(p) => format!("{mnemonic} {}", p.name()),
        Instr::NewType {
            kind,
            raw,
            bound,
            dims,
            argc,
        } => format!(
            "{mnemonic} {kind:?} {} bound={bound:?} dims={dims} args={argc}",
            rn.class(raw)
        ),
        Instr::NewList(n) => format!("{mnemonic} {n}"),
        Instr::NewEnum { type_name, variant } => {
            format!("{mnemonic} {}.{variant}", rn.class(type_name))
        }
        Instr::AnnotationBegin(t) => format!("{mnemonic} {}", rn.class(t)),
        Instr::AnnotationSet(element) => format!("{mnemonic} {element}"),
        Instr::HandleSet { entity, property } => {
            format!("{mnemonic} {}#{property}", rn.class(entity))
        }
        Instr::Intrinsic(i) => format!("{mnemonic} {}", i.name()),
        Instr::Throw(msg) => format!("{mnemonic} {msg:?}"),
        Instr::Nop
        | Instr::Dup
        | Instr::Pop
        | Instr::PushNull
        | Instr::AnnotationEnd
        | Instr::HandleGet
        | Instr::Return
        | Instr::ReturnVoid => mnemonic.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{ClassBuilder, ClassKind};
    use critter_schema::prelude::*;

    #[test]
    fn listing_applies_renames() {
        let body = ClassBuilder::new("com.example.__critter.Person.nameAccessor", ClassKind::Accessor)
            .implements("critter.mapping.PropertyAccessor")
            .field_with_initial("age", "I", flags::PRIVATE, Some(Constant::Int(21)))
            .method("get", "(Ljava/lang/Object;)Ljava/lang/Object;", flags::PUBLIC, |c| {
                c.load(1)
                    .check_cast("com.example.Person")
                    .invoke("com.example.Person", "__read_name", "()Ljava/lang/String;")
                    .ret();
            })
            .build();

        let mut renames = BTreeMap::new();
        renames.insert("com.example.Person".to_string(), "Entity".to_string());
        let listing = disassemble(&body, &renames);

        assert!(listing.starts_with("class com.example.__critter.Person.nameAccessor [accessor]"));
        assert!(listing.contains("  field age I flags=0x0002 = int 21"));
        assert!(listing.contains("0001: CHECK_CAST Entity"));
        assert!(listing.contains("0002: INVOKE Entity.__read_name()Ljava/lang/String;"));
        assert!(!listing.contains("com.example.Person"));
    }
}
