//! Recursive-descent resolver for type signatures.
//!
//! A segment without a type-argument list is consumed up to its terminating
//! `;`. A segment with one first locates its depth-balanced closing `>`, then
//! resolves the bracketed list recursively and attaches it to the raw type.

use super::{Bound, Primitive, TypeDescriptor};
use thiserror::Error as ThisError;

/// Deepest generic nesting the resolver accepts.
pub const MAX_SIGNATURE_DEPTH: usize = 64;

///
/// SignatureError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SignatureError {
    #[error("signature is empty")]
    Empty,

    #[error("unexpected end of signature at {pos}")]
    UnexpectedEnd { pos: usize },

    #[error("unexpected character '{ch}' at {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unbalanced '<' at {pos}")]
    Unbalanced { pos: usize },

    #[error("empty type name at {pos}")]
    EmptyName { pos: usize },

    #[error("empty type argument list at {pos}")]
    EmptyArguments { pos: usize },

    #[error("generic nesting exceeds {max} levels")]
    TooDeep { max: usize },

    #[error("more than 255 array dimensions at {pos}")]
    TooManyDimensions { pos: usize },

    #[error("unsupported signature shape at {pos}: {shape}")]
    Unsupported { shape: &'static str, pos: usize },

    #[error("expected {expected} type(s), found {found}")]
    Count { expected: usize, found: usize },
}

///
/// MethodSignature
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MethodSignature {
    pub params: Vec<TypeDescriptor>,

    /// `None` for `void`.
    pub ret: Option<TypeDescriptor>,
}

impl MethodSignature {
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn to_signature(&self) -> String {
        let mut out = String::from("(");
        for param in &self.params {
            out.push_str(&param.to_signature());
        }
        out.push(')');
        match &self.ret {
            Some(ret) => out.push_str(&ret.to_signature()),
            None => out.push('V'),
        }

        out
    }
}

/// Resolve every type in a concatenated signature list.
pub fn parse_type_list(sig: &str) -> Result<Vec<TypeDescriptor>, SignatureError> {
    if sig.is_empty() {
        return Err(SignatureError::Empty);
    }

    Resolver::new(sig).list(0, sig.len(), 0)
}

/// Resolve a signature that must describe exactly one type.
pub fn parse_signature(sig: &str) -> Result<TypeDescriptor, SignatureError> {
    let mut list = parse_type_list(sig)?;
    if list.len() != 1 {
        return Err(SignatureError::Count {
            expected: 1,
            found: list.len(),
        });
    }

    Ok(list.remove(0))
}

/// Resolve a method descriptor or signature into parameters and return type.
pub fn parse_method_signature(sig: &str) -> Result<MethodSignature, SignatureError> {
    let bytes = sig.as_bytes();
    let resolver = Resolver::new(sig);

    match bytes.first() {
        None => return Err(SignatureError::Empty),
        Some(b'<') => {
            return Err(SignatureError::Unsupported {
                shape: "generic method type parameters",
                pos: 0,
            });
        }
        Some(b'(') => {}
        Some(_) => return Err(resolver.unexpected(0)),
    }

    let close = bytes
        .iter()
        .position(|b| *b == b')')
        .ok_or(SignatureError::UnexpectedEnd { pos: bytes.len() })?;
    let params = resolver.list(1, close, 0)?;

    let ret_pos = close + 1;
    let (ret, next) = if resolver.peek(ret_pos, bytes.len())? == b'V' {
        (None, ret_pos + 1)
    } else {
        let (ty, next) = resolver.one(ret_pos, bytes.len(), 0)?;
        (Some(ty), next)
    };

    // a throws clause may follow; it carries nothing the mapping needs
    if next < bytes.len() && bytes[next] != b'^' {
        return Err(resolver.unexpected(next));
    }

    Ok(MethodSignature { params, ret })
}

///
/// Resolver
///

struct Resolver<'a> {
    src: &'a str,
    bytes: &'a [u8],
}

impl<'a> Resolver<'a> {
    const fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
        }
    }

    fn unexpected(&self, pos: usize) -> SignatureError {
        SignatureError::UnexpectedChar {
            ch: char::from(self.bytes[pos]),
            pos,
        }
    }

    fn peek(&self, pos: usize, end: usize) -> Result<u8, SignatureError> {
        if pos < end {
            Ok(self.bytes[pos])
        } else {
            Err(SignatureError::UnexpectedEnd { pos })
        }
    }

    // resolve every type in [start, end)
    fn list(
        &self,
        start: usize,
        end: usize,
        depth: usize,
    ) -> Result<Vec<TypeDescriptor>, SignatureError> {
        let mut out = Vec::new();
        let mut pos = start;
        while pos < end {
            let (ty, next) = self.one(pos, end, depth)?;
            out.push(ty);
            pos = next;
        }

        Ok(out)
    }

    // resolve one type starting at pos, returning it and the next position
    fn one(
        &self,
        mut pos: usize,
        end: usize,
        depth: usize,
    ) -> Result<(TypeDescriptor, usize), SignatureError> {
        if depth > MAX_SIGNATURE_DEPTH {
            return Err(SignatureError::TooDeep {
                max: MAX_SIGNATURE_DEPTH,
            });
        }

        let bound = match self.peek(pos, end)? {
            b'*' => return Ok((TypeDescriptor::wildcard(), pos + 1)),
            b'+' => {
                pos += 1;
                Bound::Extends
            }
            b'-' => {
                pos += 1;
                Bound::Super
            }
            _ => Bound::Exact,
        };

        let mut dims: u8 = 0;
        while self.peek(pos, end)? == b'[' {
            dims = dims
                .checked_add(1)
                .ok_or(SignatureError::TooManyDimensions { pos })?;
            pos += 1;
        }

        let code = self.peek(pos, end)?;
        let (ty, next) = match code {
            b'L' => self.class(pos, end, depth)?,
            b'T' => self.variable(pos, end)?,
            b'V' => {
                return Err(SignatureError::Unsupported {
                    shape: "void in type position",
                    pos,
                });
            }
            _ => match Primitive::from_code(code) {
                Some(p) => (TypeDescriptor::primitive(p), pos + 1),
                None => return Err(self.unexpected(pos)),
            },
        };

        Ok((ty.with_dims(dims).with_bound(bound), next))
    }

    fn class(
        &self,
        pos: usize,
        end: usize,
        depth: usize,
    ) -> Result<(TypeDescriptor, usize), SignatureError> {
        let start = pos + 1;
        let mut i = start;
        let terminator = loop {
            match self.peek(i, end)? {
                b @ (b';' | b'<') => break b,
                b'.' => {
                    return Err(SignatureError::Unsupported {
                        shape: "inner class type",
                        pos: i,
                    });
                }
                b'>' | b'[' | b'(' | b')' | b'*' | b'+' | b'-' => return Err(self.unexpected(i)),
                _ => i += 1,
            }
        };

        if i == start {
            return Err(SignatureError::EmptyName { pos: start });
        }
        let raw = self.src[start..i].replace('/', ".");

        if terminator == b';' {
            return Ok((TypeDescriptor::class(raw), i + 1));
        }

        let close = self.matching(i, end)?;
        if close == i + 1 {
            return Err(SignatureError::EmptyArguments { pos: i });
        }
        let args = self.list(i + 1, close, depth + 1)?;

        match self.peek(close + 1, end)? {
            b';' => Ok((TypeDescriptor::class(raw).with_args(args), close + 2)),
            b'.' => Err(SignatureError::Unsupported {
                shape: "inner class type",
                pos: close + 1,
            }),
            _ => Err(self.unexpected(close + 1)),
        }
    }

    fn variable(&self, pos: usize, end: usize) -> Result<(TypeDescriptor, usize), SignatureError> {
        let start = pos + 1;
        let mut i = start;
        loop {
            match self.peek(i, end)? {
                b';' => break,
                b'<' | b'>' | b'/' | b'[' => return Err(self.unexpected(i)),
                _ => i += 1,
            }
        }

        if i == start {
            return Err(SignatureError::EmptyName { pos: start });
        }

        Ok((TypeDescriptor::variable(&self.src[start..i]), i + 1))
    }

    // index of the '>' closing the '<' at open, counting nested brackets
    fn matching(&self, open: usize, end: usize) -> Result<usize, SignatureError> {
        let mut depth = 0usize;
        for (i, b) in self.bytes[open..end].iter().enumerate() {
            match b {
                b'<' => depth += 1,
                b'>' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(open + i);
                    }
                }
                _ => {}
            }
        }

        Err(SignatureError::Unbalanced { pos: open })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeKind;
    use proptest::prelude::*;

    #[test]
    fn resolves_primitives_arrays_and_classes() {
        assert_eq!(
            parse_signature("I").unwrap(),
            TypeDescriptor::primitive(Primitive::Int)
        );
        assert_eq!(
            parse_signature("[[J").unwrap(),
            TypeDescriptor::primitive(Primitive::Long).with_dims(2)
        );
        assert_eq!(
            parse_signature("Ljava/lang/String;").unwrap(),
            TypeDescriptor::class("java.lang.String")
        );
    }

    #[test]
    fn resolves_three_levels_of_nesting() {
        let sig = "Ljava/util/Map<Ljava/lang/String;Ljava/util/List<Ljava/util/Set<[Ljava/lang/Integer;>;>;>;";
        let ty = parse_signature(sig).unwrap();

        assert_eq!(ty.raw(), "java.util.Map");
        assert_eq!(ty.args().len(), 2);
        let list = &ty.args()[1];
        assert_eq!(list.raw(), "java.util.List");
        let set = &list.args()[0];
        assert_eq!(set.raw(), "java.util.Set");
        assert_eq!(set.args()[0].raw(), "java.lang.Integer");
        assert!(set.args()[0].is_array());
        assert_eq!(ty.node_count(), 5);
        assert_eq!(ty.to_signature(), sig);
    }

    #[test]
    fn resolves_wildcards_and_variables() {
        let ty = parse_signature("Ljava/util/Map<*-Ljava/lang/Integer;>;").unwrap();
        assert_eq!(ty.args()[0].kind(), TypeKind::Wildcard);
        assert_eq!(ty.args()[1].bound(), Bound::Super);

        let ty = parse_signature("Ljava/util/List<+TT;>;").unwrap();
        assert_eq!(ty.args()[0].kind(), TypeKind::Variable);
        assert_eq!(ty.args()[0].bound(), Bound::Extends);
        assert_eq!(ty.to_signature(), "Ljava/util/List<+TT;>;");
    }

    #[test]
    fn resolves_type_lists() {
        let list = parse_type_list("ILjava/lang/String;[Z").unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(
            parse_signature("II"),
            Err(SignatureError::Count {
                expected: 1,
                found: 2
            })
        );
    }

    #[test]
    fn resolves_method_signatures() {
        let m = parse_method_signature("(ILjava/lang/String;)V").unwrap();
        assert_eq!(m.arity(), 2);
        assert_eq!(m.ret, None);

        let m = parse_method_signature("()Ljava/util/List<Ljava/lang/String;>;").unwrap();
        assert_eq!(m.arity(), 0);
        assert_eq!(m.ret.unwrap().args()[0].raw(), "java.lang.String");

        let m = parse_method_signature("(J)V^Ljava/io/IOException;").unwrap();
        assert_eq!(m.to_signature(), "(J)V");

        assert!(matches!(
            parse_method_signature("<T:Ljava/lang/Object;>()TT;"),
            Err(SignatureError::Unsupported { .. })
        ));
    }

    #[test]
    fn rejects_malformed_signatures() {
        assert_eq!(
            parse_signature("Ljava/util/List<Ljava/lang/String;;"),
            Err(SignatureError::Unbalanced { pos: 15 })
        );
        assert_eq!(
            parse_signature("Ljava/lang/String"),
            Err(SignatureError::UnexpectedEnd { pos: 17 })
        );
        assert_eq!(
            parse_signature("Q"),
            Err(SignatureError::UnexpectedChar { ch: 'Q', pos: 0 })
        );
        assert_eq!(
            parse_signature("L;"),
            Err(SignatureError::EmptyName { pos: 1 })
        );
        assert_eq!(
            parse_signature("Ljava/util/List<>;"),
            Err(SignatureError::EmptyArguments { pos: 15 })
        );
        assert_eq!(
            parse_signature("Ljava/util/List<I>>;"),
            Err(SignatureError::UnexpectedChar { ch: '>', pos: 18 })
        );
        assert!(matches!(
            parse_signature("Lcom/x/Outer<TT;>.Inner;"),
            Err(SignatureError::Unsupported { .. })
        ));
        assert_eq!(parse_signature(""), Err(SignatureError::Empty));
    }

    #[test]
    fn rejects_runaway_nesting() {
        let depth = MAX_SIGNATURE_DEPTH + 8;
        let sig = format!(
            "{}I{}",
            "Ljava/util/List<".repeat(depth),
            ">;".repeat(depth)
        );

        assert_eq!(
            parse_signature(&sig),
            Err(SignatureError::TooDeep {
                max: MAX_SIGNATURE_DEPTH
            })
        );
    }

    fn arb_leaf() -> impl Strategy<Value = TypeDescriptor> {
        prop_oneof![
            prop::sample::select(vec![
                Primitive::Boolean,
                Primitive::Byte,
                Primitive::Char,
                Primitive::Double,
                Primitive::Float,
                Primitive::Int,
                Primitive::Long,
                Primitive::Short,
            ])
            .prop_map(TypeDescriptor::primitive),
            prop::sample::select(vec!["java.lang.String", "java.lang.Long", "com.example.Person"])
                .prop_map(|raw| TypeDescriptor::class(raw)),
            prop::sample::select(vec!["T", "K", "V"]).prop_map(|name| TypeDescriptor::variable(name)),
        ]
    }

    fn arb_arg(inner: BoxedStrategy<TypeDescriptor>) -> impl Strategy<Value = TypeDescriptor> {
        prop_oneof![
            Just(TypeDescriptor::wildcard()),
            (
                inner,
                prop::sample::select(vec![Bound::Exact, Bound::Extends, Bound::Super])
            )
                .prop_map(|(ty, bound)| ty.with_bound(bound)),
        ]
    }

    fn arb_type() -> impl Strategy<Value = TypeDescriptor> {
        arb_leaf()
            .prop_recursive(4, 32, 3, |inner| {
                (
                    prop::sample::select(vec!["java.util.List", "java.util.Map", "java.util.Set"]),
                    prop::collection::vec(arb_arg(inner), 1..=3),
                )
                    .prop_map(|(raw, args)| TypeDescriptor::class(raw).with_args(args))
            })
            .prop_flat_map(|ty| (Just(ty), 0u8..3))
            .prop_map(|(ty, dims)| ty.with_dims(dims))
    }

    proptest! {
        #[test]
        fn rendered_signature_reparses_to_same_tree(ty in arb_type()) {
            let sig = ty.to_signature();
            let parsed = parse_signature(&sig).unwrap();

            prop_assert_eq!(&parsed, &ty);
            prop_assert_eq!(parsed.to_signature(), sig);
        }
    }
}
