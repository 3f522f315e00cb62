//! Wire type descriptors.
//!
//! A [`TypeDescriptor`] is the semantic, byte-exact encoding rule derived
//! for one declared C type. It is distinct from [`crate::ast::TypeNode`],
//! the syntactic form produced by the parser. Both sides of the link agree
//! on these rules by construction: the embedded dispatcher is generated
//! from the same table the host marshals against.

use std::fmt;

/// How a primitive's bytes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Integer,
    Ieee754,
}

/// A fixed-width scalar encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Primitive {
    /// Width in bytes: 1, 2, 4 or 8.
    pub width: u8,
    pub signed: bool,
    pub encoding: Encoding,
}

impl Primitive {
    pub const I8: Self = Self::int(1, true);
    pub const U8: Self = Self::int(1, false);
    pub const I16: Self = Self::int(2, true);
    pub const U16: Self = Self::int(2, false);
    pub const I32: Self = Self::int(4, true);
    pub const U32: Self = Self::int(4, false);
    pub const I64: Self = Self::int(8, true);
    pub const U64: Self = Self::int(8, false);
    pub const F32: Self = Self {
        width: 4,
        signed: true,
        encoding: Encoding::Ieee754,
    };
    pub const F64: Self = Self {
        width: 8,
        signed: true,
        encoding: Encoding::Ieee754,
    };

    const fn int(width: u8, signed: bool) -> Self {
        Self {
            width,
            signed,
            encoding: Encoding::Integer,
        }
    }
}

/// Reserved typedef names carrying a host-side decode convention instead of
/// their generic scalar encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticOverride {
    /// Signed int; negative return values decode to a typed failure carrying
    /// the platform error string for `-value`.
    ErrnoInt,
    /// Like `ErrnoInt`, but a non-negative value decodes to a boolean.
    ErrnoBool,
    /// 32-bit float; a NaN return decodes to a generic application failure.
    NanFloat,
}

/// A derived wire encoding rule for one declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    /// No value on the wire.
    Void,
    /// Fixed-width scalar, little-endian on the wire.
    Primitive(Primitive),
    /// Mutable single-level pointer: length-prefixed element buffer that is
    /// read back after the call to reflect embedded-side mutation.
    Pointer(Box<TypeDescriptor>),
    /// Const single-level pointer: length-prefixed element buffer, one
    /// directional (host to embedded only).
    ConstPointer(Box<TypeDescriptor>),
    /// `void *` — carries a 4-byte physical address only (e.g. a
    /// DMA-capable buffer). Never valid as a return type.
    VoidPointer,
    /// A typedef. May substitute an override decode convention; otherwise
    /// encodes exactly as its underlying type.
    NamedAlias {
        name: String,
        underlying: Box<TypeDescriptor>,
        semantic: Option<SemanticOverride>,
    },
}

impl TypeDescriptor {
    /// Peel typedef layers down to the concrete encoding.
    pub fn resolve(&self) -> &TypeDescriptor {
        match self {
            TypeDescriptor::NamedAlias { underlying, .. } => underlying.resolve(),
            other => other,
        }
    }

    /// The alias name, if this descriptor is (directly) a typedef.
    pub fn alias_name(&self) -> Option<&str> {
        match self {
            TypeDescriptor::NamedAlias { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The innermost semantic override, if any alias layer carries one.
    pub fn semantic(&self) -> Option<SemanticOverride> {
        match self {
            TypeDescriptor::NamedAlias {
                semantic,
                underlying,
                ..
            } => semantic.or_else(|| underlying.semantic()),
            _ => None,
        }
    }

    /// Whether this parameter's buffer must be re-read after the call.
    pub fn needs_readback(&self) -> bool {
        match self.resolve() {
            TypeDescriptor::Pointer(_) => true,
            _ => false,
        }
    }

    /// Fixed wire size in bytes, or `None` for length-prefixed shapes.
    pub fn fixed_size(&self) -> Option<usize> {
        match self.resolve() {
            TypeDescriptor::Void => Some(0),
            TypeDescriptor::Primitive(p) => Some(p.width as usize),
            TypeDescriptor::VoidPointer => Some(4),
            TypeDescriptor::Pointer(_) | TypeDescriptor::ConstPointer(_) => None,
            TypeDescriptor::NamedAlias { .. } => unreachable!("resolve() peels aliases"),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self.resolve(), TypeDescriptor::Void)
    }

    /// Canonical single-line form, stable across binds of the same source.
    /// Feeds the dispatcher table digest.
    pub fn canonical(&self) -> String {
        match self {
            TypeDescriptor::Void => "void".to_string(),
            TypeDescriptor::Primitive(p) => {
                let tag = match (p.encoding, p.signed) {
                    (Encoding::Ieee754, _) => "f",
                    (Encoding::Integer, true) => "i",
                    (Encoding::Integer, false) => "u",
                };
                format!("{}{}", tag, p.width as usize * 8)
            }
            TypeDescriptor::Pointer(e) => format!("ptr({})", e.canonical()),
            TypeDescriptor::ConstPointer(e) => format!("cptr({})", e.canonical()),
            TypeDescriptor::VoidPointer => "addr32".to_string(),
            TypeDescriptor::NamedAlias {
                name, underlying, ..
            } => format!("{}={}", name, underlying.canonical()),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}
