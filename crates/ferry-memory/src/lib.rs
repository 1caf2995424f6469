//! Ferry Memory - isolated linear-memory views for the syscall bridge.
//!
//! This crate provides the memory layer of the Ferry host bridge:
//!
//! - [`MemoryView`]: bounds-checked typed reads/writes and single-byte string
//!   marshaling over one module's linear memory, with stale-buffer rebinding
//!   after the memory grows
//! - [`copy`]: the cross-module byte copy, the only path by which data moves
//!   between the two modules' address spaces
//!
//! The host is the only component that can see both modules' memories at
//! once, and every offset and length it handles comes from the guest itself.
//! Accesses here therefore fail explicitly with an [`AccessError`] rather
//! than wrapping around or trusting the caller.

pub mod copy;
pub mod error;
pub mod view;

// Re-export main types at crate root
pub use copy::copy;
pub use error::{AccessError, AccessResult};
pub use view::MemoryView;
