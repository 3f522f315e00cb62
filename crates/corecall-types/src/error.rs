use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of diagnostics stored before further ones are only counted.
pub const MAX_ERRORS: usize = 20;

/// Diagnostic severity.
///
/// A function that fails descriptor derivation is reported as a `Warning`
/// in lenient binds (it is omitted from the dispatcher table, the rest of
/// the bind proceeds) and as an `Error` in strict binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Diagnostic category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Lexing/parsing the declaration source.
    Syntax,
    /// Deriving a wire descriptor for a declared type.
    Derive,
    /// Walking declarations into signatures/enums/groups.
    Extract,
    /// Emitting the embedded dispatcher program.
    Generate,
}

/// Numeric error code (E100-E499).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // -- Syntax errors (E100-E199) --
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    pub const UNEXPECTED_CHARACTER: Self = Self(101);
    pub const UNTERMINATED_COMMENT: Self = Self(102);
    pub const INVALID_LITERAL: Self = Self(103);
    pub const UNBALANCED_DELIMITER: Self = Self(104);
    pub const MALFORMED_LINE_MARKER: Self = Self(105);

    // -- Derivation errors (E200-E299) --
    pub const UNSUPPORTED_TYPE: Self = Self(200);
    pub const MULTI_LEVEL_POINTER: Self = Self(201);
    pub const AGGREGATE_BY_VALUE: Self = Self(202);
    pub const POINTER_RETURN: Self = Self(203);
    pub const VARIADIC_FUNCTION: Self = Self(204);
    pub const UNKNOWN_TYPE_NAME: Self = Self(205);
    pub const VOID_PARAMETER: Self = Self(206);

    // -- Extraction errors (E300-E399) --
    pub const DUPLICATE_FUNCTION: Self = Self(300);
    pub const DUPLICATE_ENUM_LABEL: Self = Self(301);
    pub const EMPTY_DISPATCH_TABLE: Self = Self(302);

    // -- Generation errors (E400-E499) --
    pub const TABLE_TOO_LARGE: Self = Self(400);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Syntax,
            200..=299 => ErrorCategory::Derive,
            300..=399 => ErrorCategory::Extract,
            400..=499 => ErrorCategory::Generate,
            _ => ErrorCategory::Syntax, // fallback
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A structured bind-time diagnostic.
///
/// Everything raised while turning declaration source into a dispatcher
/// table is one of these — host tooling renders them structurally, it must
/// not parse free-form strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindError {
    /// Logical source file name (tracked through preprocessor line markers).
    pub file: String,
    /// Error code (e.g. E201).
    pub code: ErrorCode,
    /// Diagnostic severity.
    pub severity: Severity,
    /// Diagnostic category (derived from code).
    pub category: ErrorCategory,
    /// Human-readable message.
    pub message: String,
    /// Source location.
    #[serde(flatten)]
    pub span: Span,
    /// The exact source line for context.
    pub source_line: String,
    /// Optional fix suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl BindError {
    /// Create a new diagnostic with `Error` severity.
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            severity: Severity::Error,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
            suggestion: None,
        }
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Downgrade to a warning (lenient-bind derivation skips).
    pub fn into_warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}] {}",
            self.file, self.span, self.code, self.category, self.message
        )
    }
}

impl std::error::Error for BindError {}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Derive => write!(f, "derive"),
            Self::Extract => write!(f, "extract"),
            Self::Generate => write!(f, "generate"),
        }
    }
}

/// Collected diagnostics for one bind of one source body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostics {
    pub errors: Vec<BindError>,
    pub warnings: Vec<BindError>,
    pub total_errors: usize,
    pub total_warnings: usize,
}

impl Diagnostics {
    /// Create an empty collection.
    pub fn empty() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            total_errors: 0,
            total_warnings: 0,
        }
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Add an error, respecting the MAX_ERRORS limit.
    pub fn push_error(&mut self, error: BindError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Add a warning.
    pub fn push_warning(&mut self, warning: BindError) {
        self.warnings.push(warning.into_warning());
        self.total_warnings += 1;
    }

    /// Merge another collection into this one.
    pub fn extend(&mut self, other: Diagnostics) {
        let uncounted = other.total_errors.saturating_sub(other.errors.len());
        for e in other.errors {
            self.push_error(e);
        }
        self.total_errors += uncounted;
        for w in other.warnings {
            self.warnings.push(w);
            self.total_warnings += 1;
        }
    }
}
