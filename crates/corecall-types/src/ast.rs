//! AST node types for the declaration subset of C the bridge accepts.
//!
//! Every node carries a [`Span`] plus the logical file name it was declared
//! in (preprocessed source carries `# line "file"` markers, so one source
//! body can span many headers). Declaration kinds are a closed enum — the
//! grammar subset is fixed, so a single `match` replaces an open visitor.

use crate::Span;

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A parsed declaration source body.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationUnit {
    pub decls: Vec<Decl>,
    pub span: Span,
}

/// One top-level declaration the bridge cares about.
///
/// Anything else in the source (function bodies, global variables,
/// bare struct definitions) is skipped by the parser, not represented.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Function(FunctionDecl),
    Typedef(TypedefDecl),
    Enum(EnumDecl),
}

impl Decl {
    /// Logical file this declaration originated from.
    pub fn file(&self) -> &str {
        match self {
            Decl::Function(f) => &f.file,
            Decl::Typedef(t) => &t.file,
            Decl::Enum(e) => &e.file,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Decl::Function(f) => f.span,
            Decl::Typedef(t) => t.span,
            Decl::Enum(e) => e.span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ══════════════════════════════════════════════════════════════════════════════

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions
// ══════════════════════════════════════════════════════════════════════════════

/// A function prototype or definition header.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Ident,
    pub ret: TypeNode,
    pub params: Vec<ParamDecl>,
    /// `static` storage class — internal linkage, never exported.
    pub is_static: bool,
    /// Trailing `...` in the parameter list.
    pub variadic: bool,
    /// Logical file (from line markers) this prototype was declared in.
    pub file: String,
    pub span: Span,
}

/// A single parameter. C allows unnamed parameters in prototypes; a
/// positional name is synthesised later if one is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: Option<Ident>,
    pub ty: TypeNode,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Types (syntactic)
// ══════════════════════════════════════════════════════════════════════════════

/// A syntactic type: base specifier + qualifiers + pointer depth.
///
/// This is the parser's view. The semantic wire descriptor is derived from
/// it separately (`corecall-extract`), mirroring the AST/semantic split.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeNode {
    pub base: BaseType,
    pub signedness: Signedness,
    /// `const` anywhere in the declaration-specifier list.
    pub is_const: bool,
    /// Number of `*` levels. Array parameters (`int a[]`) count as one.
    pub pointer_depth: u8,
    pub span: Span,
}

impl TypeNode {
    /// A plain, unqualified scalar — convenience for tests and synthesis.
    pub fn scalar(base: BaseType, span: Span) -> Self {
        Self {
            base,
            signedness: Signedness::Default,
            is_const: false,
            pointer_depth: 0,
            span,
        }
    }
}

/// The base type specifier.
#[derive(Debug, Clone, PartialEq)]
pub enum BaseType {
    Void,
    /// `_Bool` — one byte, unsigned on the wire.
    Bool,
    Char,
    Short,
    Int,
    Long,
    LongLong,
    Float,
    Double,
    /// A typedef name (resolved against the typedef table at derivation).
    Named(String),
    /// `struct Foo` / `struct { ... }` — parsed so it can be rejected with
    /// a precise diagnostic, never accepted by value.
    Struct(Option<String>),
    /// `union Foo` — same treatment as `Struct`.
    Union(Option<String>),
}

/// Explicit `signed` / `unsigned` modifier, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Signedness {
    #[default]
    Default,
    Signed,
    Unsigned,
}

// ══════════════════════════════════════════════════════════════════════════════
// Typedefs
// ══════════════════════════════════════════════════════════════════════════════

/// `typedef <type> Name;`
#[derive(Debug, Clone, PartialEq)]
pub struct TypedefDecl {
    pub name: Ident,
    pub ty: TypeNode,
    pub file: String,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Enums
// ══════════════════════════════════════════════════════════════════════════════

/// `enum Name { A, B = 5, C };` — possibly anonymous, possibly inside a
/// typedef (`typedef enum { ... } Name;`).
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: Option<Ident>,
    pub enumerators: Vec<EnumeratorDecl>,
    pub file: String,
    pub span: Span,
}

/// One enumerator: a label and an optional explicit value expression
/// (already folded to an integer by the parser).
#[derive(Debug, Clone, PartialEq)]
pub struct EnumeratorDecl {
    pub name: Ident,
    pub value: Option<i64>,
    pub span: Span,
}
