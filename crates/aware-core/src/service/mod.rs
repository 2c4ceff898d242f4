//! # Aware Service
//!
//! The interface facade. Implements the `AwareApi` and
//! `FirmwareEventHandler` ports on top of the domain state machines.
//!
//! Every request is validated against the interface state, the capability
//! snapshot and the owning table before a transaction id is allocated, so a
//! rejected request leaves no trace. Accepted requests resolve exactly once,
//! through the same completion path whether the firmware answered, the
//! deadline passed, or a teardown aborted them.
//!
//! The service is single-writer: one owner drives every `&mut self` call.
//! See `adapters::runtime` for the tokio owner task.

// Semantic submodules
mod api;
mod core;
mod events;
mod maintenance;

// Re-export public API
pub use core::AwareService;
