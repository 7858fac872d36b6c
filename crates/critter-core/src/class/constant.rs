use crate::{class::reader::ByteReader, error::FormatError};
use critter_schema::prelude::*;
use std::collections::HashMap;

mod tag {
    pub const UTF8: u8 = 1;
    pub const INT: u8 = 3;
    pub const FLOAT: u8 = 4;
    pub const LONG: u8 = 5;
    pub const DOUBLE: u8 = 6;
}

///
/// PoolEntry
///

#[derive(Clone, Debug, PartialEq)]
pub enum PoolEntry {
    Utf8(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

///
/// ConstantPool
///
/// Deduplicated, 1-based pool of names and literals. Index 0 means "none".
///

#[derive(Clone, Debug, Default)]
pub struct ConstantPool {
    entries: Vec<PoolEntry>,
    utf8: HashMap<String, u16>,
    overflow: bool,
}

impl ConstantPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True once more entries were added than an index can address.
    #[must_use]
    pub const fn overflowed(&self) -> bool {
        self.overflow
    }

    fn push(&mut self, entry: PoolEntry) -> u16 {
        if let Ok(index) = u16::try_from(self.entries.len() + 1) {
            self.entries.push(entry);
            index
        } else {
            self.overflow = true;
            0
        }
    }

    pub fn utf8(&mut self, s: &str) -> u16 {
        if let Some(index) = self.utf8.get(s) {
            return *index;
        }

        let index = self.push(PoolEntry::Utf8(s.to_string()));
        if index != 0 {
            self.utf8.insert(s.to_string(), index);
        }

        index
    }

    pub fn constant(&mut self, constant: &Constant) -> u16 {
        let entry = match constant {
            Constant::Text(s) => return self.utf8(s),
            Constant::Int(v) => PoolEntry::Int(*v),
            Constant::Long(v) => PoolEntry::Long(*v),
            Constant::Float(v) => PoolEntry::Float(*v),
            Constant::Double(v) => PoolEntry::Double(*v),
        };

        let existing = self.entries.iter().position(|e| same_bits(e, &entry));
        match existing.and_then(|i| u16::try_from(i + 1).ok()) {
            Some(index) => index,
            None => self.push(entry),
        }
    }

    pub fn get(&self, index: u16) -> Result<&PoolEntry, FormatError> {
        usize::from(index)
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .ok_or(FormatError::BadConstantIndex { index })
    }

    pub fn utf8_at(&self, index: u16) -> Result<&str, FormatError> {
        match self.get(index)? {
            PoolEntry::Utf8(s) => Ok(s),
            _ => Err(FormatError::ConstantKind {
                index,
                expected: "utf8",
            }),
        }
    }

    /// Optional utf8 entry; index 0 reads as `None`.
    pub fn opt_utf8_at(&self, index: u16) -> Result<Option<&str>, FormatError> {
        if index == 0 {
            Ok(None)
        } else {
            self.utf8_at(index).map(Some)
        }
    }

    pub fn constant_at(&self, index: u16) -> Result<Constant, FormatError> {
        Ok(match self.get(index)? {
            PoolEntry::Utf8(s) => Constant::Text(s.clone()),
            PoolEntry::Int(v) => Constant::Int(*v),
            PoolEntry::Long(v) => Constant::Long(*v),
            PoolEntry::Float(v) => Constant::Float(*v),
            PoolEntry::Double(v) => Constant::Double(*v),
        })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) -> Result<(), FormatError> {
        let count = u16::try_from(self.entries.len())
            .ok()
            .filter(|_| !self.overflow)
            .ok_or(FormatError::TooLarge {
                what: "constant pool",
            })?;
        out.extend_from_slice(&count.to_be_bytes());

        for entry in &self.entries {
            match entry {
                PoolEntry::Utf8(s) => {
                    let len = u16::try_from(s.len()).map_err(|_| FormatError::TooLarge {
                        what: "utf8 constant",
                    })?;
                    out.push(tag::UTF8);
                    out.extend_from_slice(&len.to_be_bytes());
                    out.extend_from_slice(s.as_bytes());
                }
                PoolEntry::Int(v) => {
                    out.push(tag::INT);
                    out.extend_from_slice(&v.to_be_bytes());
                }
                PoolEntry::Long(v) => {
                    out.push(tag::LONG);
                    out.extend_from_slice(&v.to_be_bytes());
                }
                PoolEntry::Float(v) => {
                    out.push(tag::FLOAT);
                    out.extend_from_slice(&v.to_bits().to_be_bytes());
                }
                PoolEntry::Double(v) => {
                    out.push(tag::DOUBLE);
                    out.extend_from_slice(&v.to_bits().to_be_bytes());
                }
            }
        }

        Ok(())
    }

    pub(crate) fn read(r: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        let count = r.u16()?;
        let mut pool = Self::new();

        for index in 1..=count {
            let offset = r.offset();
            let entry = match r.u8()? {
                tag::UTF8 => {
                    let len = usize::from(r.u16()?);
                    let bytes = r.take(len)?;
                    let s = std::str::from_utf8(bytes)
                        .map_err(|_| FormatError::BadUtf8 { index })?;
                    pool.utf8.entry(s.to_string()).or_insert(index);
                    PoolEntry::Utf8(s.to_string())
                }
                tag::INT => PoolEntry::Int(r.i32()?),
                tag::LONG => PoolEntry::Long(r.i64()?),
                tag::FLOAT => PoolEntry::Float(f32::from_bits(r.u32()?)),
                tag::DOUBLE => PoolEntry::Double(f64::from_bits(r.u64()?)),
                tag => return Err(FormatError::BadConstantTag { tag, offset }),
            };
            pool.entries.push(entry);
        }

        Ok(pool)
    }
}

fn same_bits(a: &PoolEntry, b: &PoolEntry) -> bool {
    match (a, b) {
        (PoolEntry::Int(x), PoolEntry::Int(y)) => x == y,
        (PoolEntry::Long(x), PoolEntry::Long(y)) => x == y,
        (PoolEntry::Float(x), PoolEntry::Float(y)) => x.to_bits() == y.to_bits(),
        (PoolEntry::Double(x), PoolEntry::Double(y)) => x.to_bits() == y.to_bits(),
        _ => false,
    }
}
