//! # Ports Layer - Hexagonal Architecture Boundaries
//!
//! - **Driving Ports (Inbound):** the request API callers use, and the event
//!   handler the transport drives
//! - **Driven Ports (Outbound):** firmware transport, notification sink,
//!   clock and configuration the engine requires

pub mod inbound;
pub mod outbound;

pub use inbound::{AwareApi, FirmwareEventHandler};
pub use outbound::{
    ConfigProvider, FirmwareCommand, FirmwareTransport, NotificationSink, TimeSource,
    TransportError,
};
