//! Core call-state engine for the PBX telephone exchange simulation.
//!
//! This crate owns the concurrent, hard part of the system: the per-TU
//! state machine, the caller/callee pairing protocol, the pair-lock
//! discipline that keeps two mutating TUs consistent without deadlock,
//! the extension registry, and orderly shutdown/drain. Everything that
//! touches a socket directly (accept loop, line reader, signal handling)
//! lives in the `pbx-server` binary and talks to this crate only through
//! the operations exposed here and the [`TuSink`] trait.

mod error;
mod registry;
mod sink;
mod tu;

pub use error::PbxError;
pub use pbx_proto::TuState;
pub use registry::Pbx;
pub use sink::TuSink;
pub use tu::Tu;

/// Compile-time extension table size. Slot indices are `[0, MAX_EXTENSIONS)`.
pub const MAX_EXTENSIONS: usize = 65536;
