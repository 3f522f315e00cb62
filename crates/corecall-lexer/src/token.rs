//! Token types for the corecall lexer.
//!
//! Defines [`TokenKind`] for the C declaration subset the bridge parses and
//! [`Token`], which pairs a kind with a source [`Span`] and the logical
//! file name the token belongs to.

use corecall_types::Span;
use std::fmt;

/// Every reserved word the declaration parser recognises.
///
/// Anything else scans as [`TokenKind::Identifier`] — including typedef
/// names, which only become types during derivation.
pub const ALL_KEYWORDS: &[&str] = &[
    // Type specifiers (10)
    "void", "char", "short", "int", "long", "float", "double", "signed", "unsigned", "_Bool",
    // Qualifiers & storage (6)
    "const", "volatile", "static", "extern", "inline", "register",
    // Tagged types & declarations (4)
    "enum", "struct", "union", "typedef",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the corecall lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// Source location within the preprocessed body.
    pub span: Span,
    /// Logical file (from the most recent line marker).
    pub file: String,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span, file: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            file: file.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

/// Every token kind in the declaration subset.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────

    /// Integer literal (decimal, hex, or character constant): `42`, `0x2A`, `'A'`
    IntLit(i64),

    // ── Identifiers ──────────────────────────────────────────

    /// Identifier: `add`, `pmod_oled`, `buf`
    Identifier(String),

    // ── Type Specifiers ──────────────────────────────────────

    /// `void`
    Void,
    /// `char`
    Char,
    /// `short`
    Short,
    /// `int`
    Int,
    /// `long`
    Long,
    /// `float`
    Float,
    /// `double`
    Double,
    /// `signed`
    Signed,
    /// `unsigned`
    Unsigned,
    /// `_Bool`
    Bool,

    // ── Qualifiers & Storage Classes ─────────────────────────

    /// `const`
    Const,
    /// `volatile` — accepted and ignored for wire purposes
    Volatile,
    /// `static` — marks internal linkage, function is not exported
    Static,
    /// `extern`
    Extern,
    /// `inline`
    Inline,
    /// `register`
    Register,

    // ── Tagged Types & Declarations ──────────────────────────

    /// `enum`
    Enum,
    /// `struct`
    Struct,
    /// `union`
    Union,
    /// `typedef`
    Typedef,

    // ── Punctuation ──────────────────────────────────────────

    /// `*`
    Star,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,
    /// `;`
    Semi,
    /// `=`
    Eq,
    /// `-` (unary minus in enum initialisers)
    Minus,
    /// `...` (variadic marker — rejected at derivation, not here)
    Ellipsis,

    /// End of input.
    Eof,
}

impl TokenKind {
    /// Map a keyword lexeme to its token kind.
    pub fn from_keyword(text: &str) -> Option<Self> {
        let kind = match text {
            "void" => Self::Void,
            "char" => Self::Char,
            "short" => Self::Short,
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "signed" => Self::Signed,
            "unsigned" => Self::Unsigned,
            "_Bool" => Self::Bool,
            "const" => Self::Const,
            "volatile" => Self::Volatile,
            "static" => Self::Static,
            "extern" => Self::Extern,
            "inline" => Self::Inline,
            "register" => Self::Register,
            "enum" => Self::Enum,
            "struct" => Self::Struct,
            "union" => Self::Union,
            "typedef" => Self::Typedef,
            _ => return None,
        };
        Some(kind)
    }

    /// Returns `true` if this kind can begin a declaration-specifier list.
    pub fn starts_type(&self) -> bool {
        matches!(
            self,
            Self::Void
                | Self::Char
                | Self::Short
                | Self::Int
                | Self::Long
                | Self::Float
                | Self::Double
                | Self::Signed
                | Self::Unsigned
                | Self::Bool
                | Self::Const
                | Self::Volatile
                | Self::Enum
                | Self::Struct
                | Self::Union
                | Self::Identifier(_)
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntLit(v) => write!(f, "{v}"),
            Self::Identifier(name) => write!(f, "{name}"),
            Self::Void => write!(f, "void"),
            Self::Char => write!(f, "char"),
            Self::Short => write!(f, "short"),
            Self::Int => write!(f, "int"),
            Self::Long => write!(f, "long"),
            Self::Float => write!(f, "float"),
            Self::Double => write!(f, "double"),
            Self::Signed => write!(f, "signed"),
            Self::Unsigned => write!(f, "unsigned"),
            Self::Bool => write!(f, "_Bool"),
            Self::Const => write!(f, "const"),
            Self::Volatile => write!(f, "volatile"),
            Self::Static => write!(f, "static"),
            Self::Extern => write!(f, "extern"),
            Self::Inline => write!(f, "inline"),
            Self::Register => write!(f, "register"),
            Self::Enum => write!(f, "enum"),
            Self::Struct => write!(f, "struct"),
            Self::Union => write!(f, "union"),
            Self::Typedef => write!(f, "typedef"),
            Self::Star => write!(f, "*"),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
            Self::LBrace => write!(f, "{{"),
            Self::RBrace => write!(f, "}}"),
            Self::LBracket => write!(f, "["),
            Self::RBracket => write!(f, "]"),
            Self::Comma => write!(f, ","),
            Self::Semi => write!(f, ";"),
            Self::Eq => write!(f, "="),
            Self::Minus => write!(f, "-"),
            Self::Ellipsis => write!(f, "..."),
            Self::Eof => write!(f, "<eof>"),
        }
    }
}
