//! # Driven Ports (Outbound SPI)
//!
//! Interfaces the host must implement: the firmware transport, somewhere to
//! deliver notifications, a clock and a configuration source.

use std::sync::Arc;
use thiserror::Error;

use crate::config::EngineConfig;
use crate::domain::{
    Capabilities, CommandKind, EnableRequest, InitiateRequest, MacAddress, NdpId, Notification,
    PeerInstanceId, PublishConfig, RespondRequest, SessionId, SubscribeConfig, Timestamp,
    TransactionId,
};

/// Command handed to the firmware, tagged with its transaction id by the transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirmwareCommand {
    /// Query capabilities.
    GetCapabilities,
    /// Enable or reconfigure.
    EnableAndConfigure {
        /// Full configuration.
        request: EnableRequest,
        /// True when the interface was disabled.
        initial_configuration: bool,
    },
    /// Disable.
    Disable,
    /// Start or update a publish session.
    Publish {
        /// Session to update, or unassigned for a new one.
        session_id: SessionId,
        /// Configuration.
        config: PublishConfig,
    },
    /// Start or update a subscribe session.
    Subscribe {
        /// Session to update, or unassigned for a new one.
        session_id: SessionId,
        /// Configuration.
        config: SubscribeConfig,
    },
    /// Transmit a follow-up message.
    TransmitFollowup {
        /// Local session.
        session_id: SessionId,
        /// Peer handle.
        peer: PeerInstanceId,
        /// Peer address recorded by the match.
        peer_address: MacAddress,
        /// Message body.
        payload: Vec<u8>,
    },
    /// Stop a publish session.
    StopPublish(SessionId),
    /// Stop a subscribe session.
    StopSubscribe(SessionId),
    /// Create a data interface.
    CreateDataInterface(String),
    /// Delete a data interface.
    DeleteDataInterface(String),
    /// Initiate a data path.
    InitiateDataPath {
        /// Request as validated.
        request: InitiateRequest,
        /// Capability snapshot the request was validated against.
        capabilities: Option<Arc<Capabilities>>,
    },
    /// Answer a peer request.
    RespondToDataPathRequest {
        /// Response as validated.
        request: RespondRequest,
        /// Capability snapshot the response was validated against.
        capabilities: Option<Arc<Capabilities>>,
    },
    /// End a data path.
    EndDataPath(NdpId),
}

impl FirmwareCommand {
    /// Command kind.
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::GetCapabilities => CommandKind::Capabilities,
            Self::EnableAndConfigure { .. } => CommandKind::Configure,
            Self::Disable => CommandKind::Disable,
            Self::Publish { .. } => CommandKind::Publish,
            Self::Subscribe { .. } => CommandKind::Subscribe,
            Self::TransmitFollowup { .. } => CommandKind::SendMessage,
            Self::StopPublish(_) => CommandKind::StopPublish,
            Self::StopSubscribe(_) => CommandKind::StopSubscribe,
            Self::CreateDataInterface(_) => CommandKind::CreateIface,
            Self::DeleteDataInterface(_) => CommandKind::DeleteIface,
            Self::InitiateDataPath { .. } => CommandKind::InitiateDataPath,
            Self::RespondToDataPathRequest { .. } => CommandKind::RespondDataPath,
            Self::EndDataPath(_) => CommandKind::EndDataPath,
        }
    }
}

/// Transport refusal. Nothing was issued downstream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The firmware side refused the command.
    #[error("command rejected: {0}")]
    Rejected(String),
    /// The transport is down or its queue is full.
    #[error("transport unavailable")]
    Unavailable,
}

/// Link to the firmware.
///
/// `send_command` must not block on the result; completions come back as
/// [`FirmwareEvent`](crate::domain::FirmwareEvent)s carrying the same id.
pub trait FirmwareTransport: Send + Sync {
    /// Hand `command` to the firmware under `transaction_id`.
    fn send_command(
        &self,
        transaction_id: TransactionId,
        command: &FirmwareCommand,
    ) -> Result<(), TransportError>;
}

/// Destination of caller-visible notifications.
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification. Must not call back into the engine.
    fn notify(&self, notification: Notification);
}

/// Abstract interface for time-related operations.
///
/// Enables deterministic testing by injecting controllable time sources.
pub trait TimeSource: Send + Sync {
    /// Current monotonic time in milliseconds.
    fn now(&self) -> Timestamp;
}

/// Abstract interface for configuration loading.
pub trait ConfigProvider: Send + Sync {
    /// Engine tuning parameters.
    fn engine_config(&self) -> EngineConfig;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedTimeSource(u64);

    impl TimeSource for FixedTimeSource {
        fn now(&self) -> Timestamp {
            Timestamp::new(self.0)
        }
    }

    #[test]
    fn test_fixed_time_source_returns_configured_value() {
        let source = FixedTimeSource(1000);
        assert_eq!(source.now().as_millis(), 1000);
    }

    #[test]
    fn test_transport_error_display() {
        assert_eq!(
            TransportError::Rejected("queue full".to_string()).to_string(),
            "command rejected: queue full"
        );
        assert_eq!(TransportError::Unavailable.to_string(), "transport unavailable");
    }

    #[test]
    fn test_command_kind_matches_request_kind() {
        assert_eq!(
            FirmwareCommand::StopPublish(SessionId::new(1)).kind(),
            CommandKind::StopPublish
        );
        assert_eq!(
            FirmwareCommand::EndDataPath(NdpId::new(1)).kind(),
            CommandKind::EndDataPath
        );
    }
}
