//! Domain Layer - Pure engine logic with no I/O
//!
//! This module contains the state that the facade drives:
//! - Identifiers and request types
//! - Transaction ledger (id allocation, deadlines, retirement)
//! - Capability cache
//! - Interface configuration state machine and data interface table
//! - Discovery session registry
//! - Data path negotiator

pub mod capabilities;
pub mod data_interface;
pub mod data_path;
pub mod discovery;
pub mod errors;
pub mod events;
pub mod interface;
pub mod ledger;
pub mod requests;
pub mod security;
/// Core identifiers and value types
pub mod types;

pub use capabilities::*;
pub use data_interface::*;
pub use data_path::*;
pub use discovery::*;
pub use errors::*;
pub use events::*;
pub use interface::*;
pub use ledger::*;
pub use requests::*;
pub use security::*;
pub use types::*;
