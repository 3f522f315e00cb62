//! corecall code generator: turns a dispatcher table back into C source
//! for the embedded side of the link.
//!
//! # Output contract
//!
//! One self-contained translation unit:
//!
//! - transport helpers (`cc_read_*` / `cc_write_*`) implementing both byte
//!   rings over the shared memory window, plus the `cc_print` service
//! - the application source, verbatim
//! - `corecall_dispatch()`, a selector switch with one case per table
//!   entry, and `corecall_serve()`, the blocking serve loop
//!
//! Each case reads its arguments in declaration order, calls the
//! function, then answers: a `0` terminal frame followed by mutable
//! buffer readbacks and the return value, or a bare `2` ack when the
//! host does not wait. Selector order and wire encodings are exactly
//! those of the table, so a dispatcher and a host built from the same
//! table digest interoperate by construction.

pub mod compiler;
pub mod error;
pub mod layout;
mod prologue;

pub use compiler::compile;
pub use error::{CodegenError, CodegenResult, MAX_SELECTORS};
pub use layout::TargetLayout;
