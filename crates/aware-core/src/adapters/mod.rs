//! # Adapters Layer
//!
//! Concrete implementations of the driven ports.
//!
//! - `time` / `notifier` / `config` - always available
//! - `runtime` / `simulated` - tokio owner task and firmware simulator,
//!   require feature `runtime`
//! - `TomlConfigProvider` requires feature `toml-config`

pub mod config;
pub mod notifier;
pub mod time;

#[cfg(feature = "runtime")]
pub mod runtime;
#[cfg(feature = "runtime")]
pub mod simulated;

pub use config::StaticConfigProvider;
#[cfg(feature = "toml-config")]
pub use config::TomlConfigProvider;
pub use notifier::InMemoryNotificationSink;
#[cfg(feature = "runtime")]
pub use notifier::ChannelNotificationSink;
#[cfg(feature = "runtime")]
pub use runtime::{spawn_engine, EngineCommand, EngineHandle};
#[cfg(feature = "runtime")]
pub use simulated::SimulatedFirmware;
pub use time::SystemTimeSource;
