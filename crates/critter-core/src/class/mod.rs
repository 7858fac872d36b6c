//! Binary class bodies: the format generators emit and the loader reads.

mod body;
mod builder;
mod constant;
mod disasm;
mod opcode;
pub(crate) mod reader;
mod writer;

pub use body::{ClassBody, ClassKind, FieldDef, MethodDef};
pub use builder::{ClassBuilder, CodeBuilder};
pub use constant::{ConstantPool, PoolEntry};
pub use disasm::disassemble;
pub use opcode::{Instr, Intrinsic, op};
pub use writer::{ClassWriter, MethodWriter};

/// Leading bytes of every class body.
pub const MAGIC: &[u8; 4] = b"CRIT";

/// Current body layout version; anything else is rejected on decode.
pub const FORMAT_VERSION: u16 = 1;
