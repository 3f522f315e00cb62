//! corecall host runtime: calls into a generated dispatcher over shared
//! memory.
//!
//! # Architecture
//!
//! ```text
//! Binding ── name lookup, groups, properties, failure policy
//!    │
//! marshal ── values ⇄ wire frames, errno and NaN conventions
//!    │
//! Channel ── command ring out, response ring back
//!    │
//! Mailbox ── one circular byte ring, cursor discipline
//!    │
//! SharedMem ── the actual window: mapped RAM, probe link, test buffer
//! ```
//!
//! The wire protocol is schema-less: both sides must be built from the
//! same dispatcher table. [`DispatcherTable::digest`] exists so tooling
//! can check that before the first frame moves.
//!
//! [`DispatcherTable::digest`]: corecall_types::sig::DispatcherTable::digest

pub mod binding;
pub mod channel;
pub mod errno;
pub mod error;
pub mod io;
pub mod mailbox;
mod marshal;
pub mod value;

pub use binding::Binding;
pub use channel::{Channel, ChannelConfig};
pub use error::{CallError, CallResult};
pub use io::SharedMem;
pub use mailbox::{Mailbox, Role, Wait};
pub use value::Value;
