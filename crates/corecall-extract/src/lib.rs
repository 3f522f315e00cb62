//! corecall extractor: turns one declaration source body into the indexed
//! signature model the host and the code generator share.
//!
//! ```text
//! Source → Lexer → Parser → Derivation → DispatcherTable + enums + groups
//! ```
//!
//! Extraction is lenient by default: a function whose types cannot be
//! marshalled is omitted with a diagnostic, it does not sink the bind.
//! [`extract_strict`] turns every diagnostic into a failure.

mod derive;
mod extract;
mod registry;

pub use derive::{DeriveError, Deriver};
pub use extract::{extract, extract_strict, Extraction};
pub use registry::Registry;
