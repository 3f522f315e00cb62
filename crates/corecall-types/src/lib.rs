//! Shared types for the corecall bridge.
//!
//! This crate defines the declaration AST, source spans, wire type
//! descriptors, extracted signature/table model, and the structured
//! diagnostics used across all bridge stages.

mod error;
mod span;
pub mod ast;
pub mod descriptor;
pub mod sig;

pub use error::{BindError, Diagnostics, ErrorCategory, ErrorCode, Severity, MAX_ERRORS};
pub use span::{SourceFile, Span};

/// Result type used for single-error bridge operations.
pub type Result<T> = std::result::Result<T, BindError>;
