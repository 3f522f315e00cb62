//! Codegen error types.

use thiserror::Error;

/// Largest number of selectors one dispatcher switch will carry.
pub const MAX_SELECTORS: usize = 65_536;

/// Errors that can occur during dispatcher generation.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// The dispatch table holds no functions; there is nothing to serve.
    #[error("dispatch table is empty, nothing to generate")]
    EmptyTable,

    /// The dispatch table exceeds the selector switch limit.
    #[error("dispatch table has {0} entries, the limit is {MAX_SELECTORS}")]
    TableTooLarge(usize),

    /// The target memory layout is unusable.
    #[error("invalid target layout: {0}")]
    Layout(String),

    /// An internal consistency check failed.
    #[error("internal codegen error: {0}")]
    Internal(String),
}

impl From<std::fmt::Error> for CodegenError {
    fn from(_: std::fmt::Error) -> Self {
        CodegenError::Internal("formatting the output buffer failed".to_string())
    }
}

/// Codegen result type alias.
pub type CodegenResult<T> = Result<T, CodegenError>;
