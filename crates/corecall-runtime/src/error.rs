//! Host-side call errors.

use thiserror::Error;

/// Errors surfaced to a caller of a bound function.
#[derive(Debug, Error)]
pub enum CallError {
    /// The shared memory backend failed.
    #[error("transport: {0}")]
    Transport(String),

    /// The response stream broke the framing rules. The binding is
    /// poisoned afterwards: cursor positions can no longer be trusted.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// No response arrived within the configured window.
    #[error("timed out after {0} ms waiting for the response")]
    Timeout(u64),

    /// The remote function reported a platform error code.
    #[error("'{name}' failed: {message} (code {code})")]
    Application {
        name: String,
        code: i64,
        message: String,
    },

    /// The remote function signalled failure through its return
    /// convention without an error code.
    #[error("'{0}' signalled failure")]
    Failure(String),

    /// No function with this name exists in the dispatch table.
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    /// Wrong number of arguments for the signature.
    #[error("'{name}' takes {expected} argument(s), {given} given")]
    Arity {
        name: String,
        expected: usize,
        given: usize,
    },

    /// An argument value does not fit the declared parameter type.
    #[error("argument '{name}': expected {expected}, got {got}")]
    TypeMismatch {
        name: String,
        expected: String,
        got: String,
    },

    /// An argument value is the right kind but cannot be encoded.
    #[error("cannot encode argument: {0}")]
    Encode(String),

    /// The binding was released and accepts no further calls.
    #[error("binding released")]
    Released,

    /// An earlier transport or protocol failure left the link in an
    /// unknown state; the binding refuses further calls.
    #[error("binding poisoned by an earlier transport failure")]
    Poisoned,
}

/// Runtime result type alias.
pub type CallResult<T> = Result<T, CallError>;
