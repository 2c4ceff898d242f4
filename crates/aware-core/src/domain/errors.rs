//! # Domain Errors
//!
//! Two families of failure exist and they never mix:
//!
//! - [`AwareError`] is returned synchronously when a request is rejected at
//!   submission. No transaction is consumed and no table is touched.
//! - [`FailureReason`] travels inside a completion notification once an
//!   accepted request fails downstream (firmware error, timeout, abort).

use std::fmt;
use thiserror::Error;

use super::types::{CommandKind, NdpId, PeerInstanceId, SessionId, TransactionId};

/// Opaque firmware status code carried by a negative completion or event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FirmwareStatus(u16);

impl FirmwareStatus {
    /// Status accompanying positive events.
    pub const SUCCESS: FirmwareStatus = FirmwareStatus(0);

    /// Wrap a raw status code.
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Raw status code.
    pub const fn code(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for FirmwareStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "firmware status {}", self.0)
    }
}

/// Request rejected at submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AwareError {
    /// The interface (or the target entity) is in a state that forbids the request.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        /// Operation that was refused.
        operation: CommandKind,
        /// Human-readable description of the blocking state.
        state: String,
    },

    /// Every transaction id is currently pending.
    #[error("transaction id space exhausted ({pending} pending)")]
    ExhaustedIdSpace {
        /// Number of pending transactions at the time of the request.
        pending: usize,
    },

    /// No active discovery session with this id.
    #[error("unknown discovery session {0}")]
    UnknownSession(SessionId),

    /// Peer never reported by a match on the referenced session(s).
    #[error("unknown peer instance {peer}")]
    UnknownPeer {
        /// Peer handle that was not found.
        peer: PeerInstanceId,
    },

    /// No data path with this id.
    #[error("unknown data path {0}")]
    UnknownDataPath(NdpId),

    /// No data interface with this name.
    #[error("unknown data interface {0:?}")]
    UnknownInterface(String),

    /// A data interface with this name already exists or is being created.
    #[error("data interface {0:?} already exists")]
    InterfaceExists(String),

    /// Publish operation on a subscribe session or the reverse.
    #[error("session {session_id} is not a {expected} session")]
    RoleMismatch {
        /// Session that was addressed.
        session_id: SessionId,
        /// Role the operation requires.
        expected: &'static str,
    },

    /// Security configuration is malformed (e.g. both PMK and passphrase set).
    #[error("invalid security configuration: {0}")]
    InvalidSecurityConfig(String),

    /// Security configuration is well formed but the firmware cannot honour it.
    #[error("unsupported security configuration: {0}")]
    UnsupportedSecurityConfig(String),

    /// Malformed argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A firmware capacity limit would be exceeded.
    #[error("{resource} limit reached ({limit})")]
    LimitExceeded {
        /// Resource being counted.
        resource: &'static str,
        /// Limit advertised by the capability snapshot.
        limit: u32,
    },

    /// The transport refused the command; nothing was issued downstream.
    #[error("transport rejected {kind} command: {reason}")]
    TransportRejected {
        /// Kind of the refused command.
        kind: CommandKind,
        /// Transport-provided reason.
        reason: String,
    },

    /// The engine owner task is no longer running.
    #[error("engine stopped")]
    EngineStopped,
}

impl AwareError {
    /// Stable label for logs and metrics.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::InvalidState { .. } => "invalid_state",
            Self::ExhaustedIdSpace { .. } => "exhausted_id_space",
            Self::UnknownSession(_) => "unknown_session",
            Self::UnknownPeer { .. } => "unknown_peer",
            Self::UnknownDataPath(_) => "unknown_data_path",
            Self::UnknownInterface(_) => "unknown_interface",
            Self::InterfaceExists(_) => "interface_exists",
            Self::RoleMismatch { .. } => "role_mismatch",
            Self::InvalidSecurityConfig(_) => "invalid_security_config",
            Self::UnsupportedSecurityConfig(_) => "unsupported_security_config",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::LimitExceeded { .. } => "limit_exceeded",
            Self::TransportRejected { .. } => "transport_rejected",
            Self::EngineStopped => "engine_stopped",
        }
    }
}

/// Why an accepted request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// No completion arrived before the transaction deadline.
    Timeout,
    /// Negative completion from the firmware.
    FirmwareError(FirmwareStatus),
    /// Superseded by a teardown (disable, session termination, shutdown).
    Aborted,
    /// The firmware completed the command with an unusable payload.
    InvalidCompletion(&'static str),
}

impl FailureReason {
    /// Stable label for logs and metrics.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::FirmwareError(_) => "firmware_error",
            Self::Aborted => "aborted",
            Self::InvalidCompletion(_) => "invalid_completion",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timed out"),
            Self::FirmwareError(status) => write!(f, "{status}"),
            Self::Aborted => write!(f, "aborted"),
            Self::InvalidCompletion(detail) => write!(f, "invalid completion: {detail}"),
        }
    }
}

/// Ledger lookup failure. Logged by the facade, never surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Duplicate, delayed, or fabricated completion.
    #[error("stale or unknown transaction {0}")]
    StaleOrUnknownTransaction(TransactionId),
}
