//! Type descriptor derivation: syntactic [`TypeNode`] → wire
//! [`TypeDescriptor`].
//!
//! Anything without a byte-exact encoding rule is rejected here with a
//! descriptive error, at bind time, never silently accepted and never
//! deferred to call time.

use corecall_types::ast::{BaseType, Signedness, TypeNode};
use corecall_types::descriptor::{Primitive, TypeDescriptor};
use corecall_types::ErrorCode;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::registry::Registry;

/// A derivation failure: the error code plus a message naming the shape
/// that was rejected. The extractor attaches location context.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DeriveError {
    pub code: ErrorCode,
    pub message: String,
}

impl DeriveError {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Derives wire descriptors against a set of known typedefs.
pub struct Deriver<'a> {
    registry: &'a Registry,
    typedefs: &'a BTreeMap<String, TypeDescriptor>,
}

impl<'a> Deriver<'a> {
    pub fn new(registry: &'a Registry, typedefs: &'a BTreeMap<String, TypeDescriptor>) -> Self {
        Self { registry, typedefs }
    }

    /// Derive the descriptor for a parameter or typedef underlying type.
    pub fn derive(&self, ty: &TypeNode) -> Result<TypeDescriptor, DeriveError> {
        match ty.pointer_depth {
            0 => self.derive_value(ty),
            1 => self.derive_pointer(ty),
            depth => Err(DeriveError::new(
                ErrorCode::MULTI_LEVEL_POINTER,
                format!(
                    "{}-level pointer to {}, only single-level pointers are supported",
                    depth,
                    describe_base(&ty.base)
                ),
            )),
        }
    }

    /// Derive a return-type descriptor. Pointer returns are rejected: the
    /// host has nowhere to decode a bare embedded address into.
    pub fn derive_return(&self, ty: &TypeNode) -> Result<TypeDescriptor, DeriveError> {
        if ty.pointer_depth > 0 {
            return Err(DeriveError::new(
                ErrorCode::POINTER_RETURN,
                format!("returns a pointer to {}", describe_base(&ty.base)),
            ));
        }
        self.derive_value(ty)
    }

    // ── By-value types ────────────────────────────────────────────────────────

    fn derive_value(&self, ty: &TypeNode) -> Result<TypeDescriptor, DeriveError> {
        match &ty.base {
            BaseType::Void => Ok(TypeDescriptor::Void),
            BaseType::Named(name) => self.derive_named(name),
            BaseType::Struct(_) | BaseType::Union(_) => Err(DeriveError::new(
                ErrorCode::AGGREGATE_BY_VALUE,
                format!(
                    "{} passed by value has no wire encoding, pass a pointer to a scalar buffer instead",
                    describe_base(&ty.base)
                ),
            )),
            _ => scalar_primitive(&ty.base, ty.signedness)
                .map(TypeDescriptor::Primitive)
                .ok_or_else(|| {
                    DeriveError::new(
                        ErrorCode::UNSUPPORTED_TYPE,
                        format!("no wire encoding for {}", describe_base(&ty.base)),
                    )
                }),
        }
    }

    fn derive_named(&self, name: &str) -> Result<TypeDescriptor, DeriveError> {
        let underlying = self.typedefs.get(name).ok_or_else(|| {
            DeriveError::new(
                ErrorCode::UNKNOWN_TYPE_NAME,
                format!("unknown type name '{name}'"),
            )
        })?;
        Ok(TypeDescriptor::NamedAlias {
            name: name.to_string(),
            underlying: Box::new(underlying.clone()),
            semantic: self.registry.override_for(name),
        })
    }

    // ── Pointers ──────────────────────────────────────────────────────────────

    fn derive_pointer(&self, ty: &TypeNode) -> Result<TypeDescriptor, DeriveError> {
        // `void *` carries a raw physical address, nothing else.
        if ty.base == BaseType::Void {
            return Ok(TypeDescriptor::VoidPointer);
        }

        // The pointee must reduce to a fixed-width scalar so the buffer can
        // be length-prefixed element by element.
        let element = match &ty.base {
            BaseType::Named(name) => {
                let desc = self.derive_named(name)?;
                match desc.resolve() {
                    TypeDescriptor::Primitive(p) => TypeDescriptor::Primitive(*p),
                    _ => {
                        return Err(DeriveError::new(
                            ErrorCode::UNSUPPORTED_TYPE,
                            format!("pointer to '{name}', which is not a scalar typedef"),
                        ))
                    }
                }
            }
            base => scalar_primitive(base, ty.signedness)
                .map(TypeDescriptor::Primitive)
                .ok_or_else(|| {
                    DeriveError::new(
                        ErrorCode::UNSUPPORTED_TYPE,
                        format!("pointer to {}, which has no scalar encoding", describe_base(base)),
                    )
                })?,
        };

        if ty.is_const {
            Ok(TypeDescriptor::ConstPointer(Box::new(element)))
        } else {
            Ok(TypeDescriptor::Pointer(Box::new(element)))
        }
    }
}

/// Fixed-width encoding for a plain scalar keyword, if it has one.
///
/// Widths match the 32-bit embedded target the toolchain builds for:
/// `long` is 4 bytes there and on the wire, `long long` is 8.
fn scalar_primitive(base: &BaseType, signedness: Signedness) -> Option<Primitive> {
    let unsigned = signedness == Signedness::Unsigned;
    let prim = match base {
        BaseType::Bool => Primitive::U8,
        BaseType::Char => {
            if unsigned {
                Primitive::U8
            } else {
                Primitive::I8
            }
        }
        BaseType::Short => {
            if unsigned {
                Primitive::U16
            } else {
                Primitive::I16
            }
        }
        BaseType::Int | BaseType::Long => {
            if unsigned {
                Primitive::U32
            } else {
                Primitive::I32
            }
        }
        BaseType::LongLong => {
            if unsigned {
                Primitive::U64
            } else {
                Primitive::I64
            }
        }
        BaseType::Float => Primitive::F32,
        BaseType::Double => Primitive::F64,
        _ => return None,
    };
    Some(prim)
}

fn describe_base(base: &BaseType) -> String {
    match base {
        BaseType::Void => "'void'".to_string(),
        BaseType::Bool => "'_Bool'".to_string(),
        BaseType::Char => "'char'".to_string(),
        BaseType::Short => "'short'".to_string(),
        BaseType::Int => "'int'".to_string(),
        BaseType::Long => "'long'".to_string(),
        BaseType::LongLong => "'long long'".to_string(),
        BaseType::Float => "'float'".to_string(),
        BaseType::Double => "'double'".to_string(),
        BaseType::Named(name) => format!("'{name}'"),
        BaseType::Struct(tag) => format!("struct '{}'", tag.as_deref().unwrap_or("<anonymous>")),
        BaseType::Union(tag) => format!("union '{}'", tag.as_deref().unwrap_or("<anonymous>")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corecall_types::descriptor::SemanticOverride;
    use corecall_types::Span;

    fn node(base: BaseType, signedness: Signedness, is_const: bool, depth: u8) -> TypeNode {
        TypeNode {
            base,
            signedness,
            is_const,
            pointer_depth: depth,
            span: Span::point(1, 1),
        }
    }

    fn deriver_fixture() -> (Registry, BTreeMap<String, TypeDescriptor>) {
        let mut typedefs = BTreeMap::new();
        typedefs.insert(
            "handle_t".to_string(),
            TypeDescriptor::Primitive(Primitive::U32),
        );
        typedefs.insert(
            "cc_int".to_string(),
            TypeDescriptor::Primitive(Primitive::I32),
        );
        (Registry::new(), typedefs)
    }

    #[test]
    fn test_scalar_widths() {
        let (reg, tds) = deriver_fixture();
        let d = Deriver::new(&reg, &tds);

        let cases = [
            (BaseType::Char, Signedness::Default, Primitive::I8),
            (BaseType::Char, Signedness::Unsigned, Primitive::U8),
            (BaseType::Short, Signedness::Default, Primitive::I16),
            (BaseType::Int, Signedness::Unsigned, Primitive::U32),
            (BaseType::Long, Signedness::Default, Primitive::I32),
            (BaseType::LongLong, Signedness::Unsigned, Primitive::U64),
            (BaseType::Float, Signedness::Default, Primitive::F32),
            (BaseType::Double, Signedness::Default, Primitive::F64),
        ];
        for (base, sign, expect) in cases {
            let desc = d.derive(&node(base, sign, false, 0)).unwrap();
            assert_eq!(desc, TypeDescriptor::Primitive(expect));
        }
    }

    #[test]
    fn test_pointer_kinds() {
        let (reg, tds) = deriver_fixture();
        let d = Deriver::new(&reg, &tds);

        let p = d
            .derive(&node(BaseType::Int, Signedness::Default, false, 1))
            .unwrap();
        assert_eq!(
            p,
            TypeDescriptor::Pointer(Box::new(TypeDescriptor::Primitive(Primitive::I32)))
        );

        let cp = d
            .derive(&node(BaseType::Char, Signedness::Default, true, 1))
            .unwrap();
        assert_eq!(
            cp,
            TypeDescriptor::ConstPointer(Box::new(TypeDescriptor::Primitive(Primitive::I8)))
        );

        let vp = d
            .derive(&node(BaseType::Void, Signedness::Default, false, 1))
            .unwrap();
        assert_eq!(vp, TypeDescriptor::VoidPointer);
    }

    #[test]
    fn test_multi_level_pointer_rejected() {
        let (reg, tds) = deriver_fixture();
        let d = Deriver::new(&reg, &tds);
        let err = d
            .derive(&node(BaseType::Int, Signedness::Default, false, 2))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MULTI_LEVEL_POINTER);
    }

    #[test]
    fn test_aggregate_by_value_rejected() {
        let (reg, tds) = deriver_fixture();
        let d = Deriver::new(&reg, &tds);
        let err = d
            .derive(&node(
                BaseType::Struct(Some("point".to_string())),
                Signedness::Default,
                false,
                0,
            ))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AGGREGATE_BY_VALUE);
    }

    #[test]
    fn test_pointer_return_rejected() {
        let (reg, tds) = deriver_fixture();
        let d = Deriver::new(&reg, &tds);
        let err = d
            .derive_return(&node(BaseType::Char, Signedness::Default, false, 1))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::POINTER_RETURN);
    }

    #[test]
    fn test_typedef_alias_with_override() {
        let (reg, tds) = deriver_fixture();
        let d = Deriver::new(&reg, &tds);
        let desc = d
            .derive(&node(
                BaseType::Named("cc_int".to_string()),
                Signedness::Default,
                false,
                0,
            ))
            .unwrap();
        assert_eq!(desc.alias_name(), Some("cc_int"));
        assert_eq!(desc.semantic(), Some(SemanticOverride::ErrnoInt));
    }

    #[test]
    fn test_unknown_typedef_rejected() {
        let (reg, tds) = deriver_fixture();
        let d = Deriver::new(&reg, &tds);
        let err = d
            .derive(&node(
                BaseType::Named("mystery_t".to_string()),
                Signedness::Default,
                false,
                0,
            ))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UNKNOWN_TYPE_NAME);
    }

    #[test]
    fn test_pointer_to_scalar_typedef() {
        let (reg, tds) = deriver_fixture();
        let d = Deriver::new(&reg, &tds);
        let desc = d
            .derive(&node(
                BaseType::Named("handle_t".to_string()),
                Signedness::Default,
                false,
                1,
            ))
            .unwrap();
        assert_eq!(
            desc,
            TypeDescriptor::Pointer(Box::new(TypeDescriptor::Primitive(Primitive::U32)))
        );
    }
}
