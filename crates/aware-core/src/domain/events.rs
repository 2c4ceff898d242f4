//! # Events
//!
//! [`FirmwareEvent`] is what the transport delivers upward; [`Notification`]
//! is what the facade emits to callers.
//!
//! Termination notifications are only emitted for teardowns the caller did
//! not ask for. A caller-initiated stop or end is reported by its completion.

use std::sync::Arc;

use super::capabilities::Capabilities;
use super::errors::{FailureReason, FirmwareStatus};
use super::requests::SessionRole;
use super::types::{CommandKind, MacAddress, NdpId, PeerInstanceId, SessionId, TransactionId};

// =============================================================================
// INBOUND (firmware -> engine)
// =============================================================================

/// Payload of a positive command completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionPayload {
    /// Nothing beyond success.
    Empty,
    /// Capability snapshot (answer to a capabilities query).
    Capabilities(Capabilities),
    /// Session id assigned by a publish/subscribe completion.
    SessionId(SessionId),
    /// NDP id assigned by an initiate completion.
    NdpId(NdpId),
}

/// Event delivered by the firmware transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirmwareEvent {
    /// A previously issued command finished.
    CommandCompleted {
        /// Transaction the command was issued under.
        transaction_id: TransactionId,
        /// Positive payload or negative status.
        outcome: Result<CompletionPayload, FirmwareStatus>,
    },
    /// A discovery session matched a peer.
    SessionMatched {
        /// Local session.
        session_id: SessionId,
        /// Peer handle.
        peer: PeerInstanceId,
        /// Peer discovery interface address.
        peer_address: MacAddress,
        /// Peer's service-specific info.
        service_specific_info: Vec<u8>,
        /// Peer's match filter.
        match_filter: Vec<u8>,
    },
    /// A follow-up message arrived from a peer.
    MessageReceived {
        /// Local session.
        session_id: SessionId,
        /// Peer handle.
        peer: PeerInstanceId,
        /// Peer discovery interface address.
        peer_address: MacAddress,
        /// Message body.
        payload: Vec<u8>,
    },
    /// The firmware ended a discovery session on its own.
    SessionTerminated {
        /// Session that ended.
        session_id: SessionId,
        /// Firmware reason.
        status: FirmwareStatus,
    },
    /// A peer asked for a data path.
    DataPathRequested {
        /// Id of the new path.
        ndp_id: NdpId,
        /// Peer handle, unassociated for out-of-band requests.
        peer_id: PeerInstanceId,
        /// Peer discovery interface address.
        peer_address: MacAddress,
        /// Opaque blob from the peer.
        app_info: Vec<u8>,
    },
    /// Negotiation of a data path finished.
    DataPathConfirmed {
        /// Path.
        ndp_id: NdpId,
        /// Whether the path came up.
        accepted: bool,
        /// Peer data interface address.
        peer_ndi: MacAddress,
        /// Opaque blob from the peer.
        app_info: Vec<u8>,
        /// Firmware reason on failure.
        status: FirmwareStatus,
    },
    /// A data path went down.
    DataPathTerminated {
        /// Path.
        ndp_id: NdpId,
        /// Firmware reason.
        status: FirmwareStatus,
    },
    /// The discovery interface address changed.
    IdentityChanged {
        /// New address.
        address: MacAddress,
    },
    /// The firmware disabled the interface on its own.
    InterfaceDown {
        /// Firmware reason.
        status: FirmwareStatus,
    },
}

impl FirmwareEvent {
    /// Short label for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CommandCompleted { .. } => "command_completed",
            Self::SessionMatched { .. } => "session_matched",
            Self::MessageReceived { .. } => "message_received",
            Self::SessionTerminated { .. } => "session_terminated",
            Self::DataPathRequested { .. } => "data_path_requested",
            Self::DataPathConfirmed { .. } => "data_path_confirmed",
            Self::DataPathTerminated { .. } => "data_path_terminated",
            Self::IdentityChanged { .. } => "identity_changed",
            Self::InterfaceDown { .. } => "interface_down",
        }
    }
}

// =============================================================================
// OUTBOUND (engine -> caller)
// =============================================================================

/// Successful result of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionDetail {
    /// Capability snapshot now cached.
    Capabilities(Arc<Capabilities>),
    /// Interface enabled or reconfigured.
    Enabled {
        /// True for the initial configuration, false for an update.
        initial: bool,
    },
    /// Interface disabled.
    Disabled,
    /// New discovery session running.
    SessionStarted {
        /// Firmware-assigned id.
        session_id: SessionId,
        /// Session role.
        role: SessionRole,
    },
    /// Existing session reconfigured.
    SessionUpdated {
        /// Updated session.
        session_id: SessionId,
    },
    /// Follow-up message queued by firmware.
    MessageSent,
    /// Session stopped and removed.
    SessionStopped {
        /// Stopped session.
        session_id: SessionId,
    },
    /// Data interface created.
    InterfaceCreated {
        /// Interface name.
        name: String,
    },
    /// Data interface deleted.
    InterfaceDeleted {
        /// Interface name.
        name: String,
    },
    /// Local initiation accepted; confirmation follows as an event.
    DataPathInitiated {
        /// Firmware-assigned id.
        ndp_id: NdpId,
    },
    /// Response to a peer request accepted by firmware.
    DataPathResponded {
        /// Path.
        ndp_id: NdpId,
        /// Whether the caller accepted.
        accepted: bool,
    },
    /// Data path ended and removed.
    DataPathEnded {
        /// Path.
        ndp_id: NdpId,
    },
}

/// Resolution of one accepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Transaction returned at submission.
    pub transaction_id: TransactionId,
    /// Request kind.
    pub kind: CommandKind,
    /// Outcome.
    pub result: Result<CompletionDetail, FailureReason>,
}

impl Completion {
    /// True on success.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Metric/log label for the outcome.
    pub fn outcome_label(&self) -> &'static str {
        match &self.result {
            Ok(_) => "success",
            Err(reason) => reason.as_str(),
        }
    }
}

/// Why a session or data path went away without the caller asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Firmware reported the termination.
    Firmware(FirmwareStatus),
    /// Cascaded from a successful disable.
    InterfaceDisabled,
    /// Cascaded from the firmware disabling the interface.
    InterfaceDown,
    /// Peer request not answered within the grace period.
    ResponseTimeout,
    /// Negotiation failed or the peer rejected.
    Rejected(FirmwareStatus),
    /// The request that created the path failed.
    SetupFailed,
}

impl TerminationReason {
    /// Stable label for logs and metrics.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Firmware(_) => "firmware",
            Self::InterfaceDisabled => "interface_disabled",
            Self::InterfaceDown => "interface_down",
            Self::ResponseTimeout => "response_timeout",
            Self::Rejected(_) => "rejected",
            Self::SetupFailed => "setup_failed",
        }
    }
}

/// Caller-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// An accepted request resolved.
    Completed(Completion),
    /// A session matched a peer.
    MatchFound {
        /// Local session.
        session_id: SessionId,
        /// Peer handle.
        peer: PeerInstanceId,
        /// Peer address.
        peer_address: MacAddress,
        /// Peer's service-specific info.
        service_specific_info: Vec<u8>,
    },
    /// A follow-up message arrived.
    MessageReceived {
        /// Local session.
        session_id: SessionId,
        /// Peer handle.
        peer: PeerInstanceId,
        /// Message body.
        payload: Vec<u8>,
    },
    /// A session went away.
    SessionTerminated {
        /// Session.
        session_id: SessionId,
        /// Session role.
        role: SessionRole,
        /// Reason.
        reason: TerminationReason,
    },
    /// A peer asked for a data path; answer with `respond_to_data_path_request`.
    DataPathRequested {
        /// Path awaiting a response.
        ndp_id: NdpId,
        /// Peer handle.
        peer_id: PeerInstanceId,
        /// Peer address.
        peer_address: MacAddress,
        /// Opaque blob from the peer.
        app_info: Vec<u8>,
    },
    /// A data path is up.
    DataPathConfirmed {
        /// Path.
        ndp_id: NdpId,
        /// Peer data interface address.
        peer_ndi: MacAddress,
        /// Opaque blob from the peer.
        app_info: Vec<u8>,
    },
    /// A data path went away.
    DataPathTerminated {
        /// Path.
        ndp_id: NdpId,
        /// Reason.
        reason: TerminationReason,
    },
    /// The discovery interface address changed.
    IdentityChanged {
        /// New address.
        address: MacAddress,
    },
    /// The firmware disabled the interface.
    InterfaceDown {
        /// Firmware reason.
        status: FirmwareStatus,
    },
}

impl Notification {
    /// The completion, if this is one.
    pub fn as_completion(&self) -> Option<&Completion> {
        match self {
            Self::Completed(c) => Some(c),
            _ => None,
        }
    }
}
