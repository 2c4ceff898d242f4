//! # Aware Core
//!
//! Session and transaction engine for a Neighbor Awareness Networking
//! (Wi-Fi Aware) control plane.
//!
//! The engine sits between callers and the firmware. It turns every caller
//! request into exactly one firmware command tagged with a transaction id,
//! tracks that transaction until the firmware answers (or a deadline or a
//! teardown resolves it), and keeps the local view of the interface,
//! discovery sessions and data paths consistent with what the firmware
//! reports.
//!
//! ## Architecture
//!
//! - **Domain Layer:** ledger, capability cache, interface state machine,
//!   session registry, data path negotiator
//! - **Ports Layer:** `AwareApi` / `FirmwareEventHandler` in,
//!   `FirmwareTransport` / `NotificationSink` / `TimeSource` out
//! - **Service Layer:** `AwareService`, the facade tying them together
//! - **Adapters Layer:** clock, sinks, config providers and, with the
//!   `runtime` feature, a tokio owner task and a firmware simulator
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use aware_core::{
//!     AwareApi, AwareService, EngineConfig, EnableRequest, FirmwareCommand,
//!     FirmwareTransport, InMemoryNotificationSink, SystemTimeSource, TransactionId,
//!     TransportError,
//! };
//!
//! struct NullTransport;
//!
//! impl FirmwareTransport for NullTransport {
//!     fn send_command(&self, _: TransactionId, _: &FirmwareCommand) -> Result<(), TransportError> {
//!         Ok(())
//!     }
//! }
//!
//! let sink = Arc::new(InMemoryNotificationSink::new());
//! let mut service = AwareService::new(
//!     EngineConfig::default(),
//!     Arc::new(NullTransport),
//!     sink.clone(),
//!     Box::new(SystemTimeSource::new()),
//! );
//!
//! let txn = service.enable_and_configure(EnableRequest::default()).unwrap();
//! assert_eq!(service.pending_transactions()[0].id, txn);
//! ```

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// =============================================================================
// ADAPTERS
// =============================================================================

/// Clock, notification sinks, config providers; owner task with `runtime`.
pub mod adapters;

/// Test utilities (ControllableTimeSource, RecordingTransport).
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// =============================================================================
// CORE RE-EXPORTS (Always Available)
// =============================================================================

// Identifiers and values
pub use domain::{
    CommandKind, MacAddress, NdpId, PeerInstanceId, SessionId, Timestamp, TransactionId,
};

// Requests
pub use domain::{
    AwareRequest, ChannelRequestType, CipherSuite, CipherSuites, ConfigRequest,
    DataPathSecurityConfig, DiscoveryConfig, EnableRequest, InitiateRequest, InstantMode,
    MessageRequest, PowerParameters, PublishConfig, PublishType, RespondRequest, SessionRole,
    SubscribeConfig, SubscribeType,
};

// Events and results
pub use domain::{
    AwareError, Capabilities, CapabilityCache, Completion, CompletionDetail, CompletionPayload,
    FailureReason, FirmwareEvent, FirmwareStatus, Notification, TerminationReason,
};

// State views
pub use domain::{
    DataPath, DataPathOrigin, DataPathState, DiscoverySession, InterfacePhase, InterfaceState,
    SessionState, TransactionRecord,
};

// Port traits
pub use ports::{
    AwareApi, ConfigProvider, FirmwareCommand, FirmwareEventHandler, FirmwareTransport,
    NotificationSink, TimeSource, TransportError,
};

// Service
pub use service::AwareService;

// Configuration
pub use config::{ConfigError, EngineConfig};

// Adapters
pub use adapters::{InMemoryNotificationSink, StaticConfigProvider, SystemTimeSource};

#[cfg(feature = "toml-config")]
pub use adapters::TomlConfigProvider;

#[cfg(feature = "runtime")]
pub use adapters::{spawn_engine, ChannelNotificationSink, EngineHandle, SimulatedFirmware};
