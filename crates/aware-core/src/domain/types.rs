//! Core identifiers and value types.
//!
//! Every identifier is a newtype so a session id can never be passed where an
//! NDP id is expected. Raw widths follow the firmware interface: 16-bit
//! transaction handles, 8-bit discovery session ids, 32-bit NDP and peer
//! instance ids.

use std::fmt;

/// Handle correlating one issued command with its eventual completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u16);

impl TransactionId {
    /// Wrap a raw 16-bit handle.
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Raw handle value.
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Publish/subscribe session identifier, assigned by firmware.
///
/// `0` means "not yet assigned"; callers pass it to request a new session and
/// a non-zero id to update an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u8);

impl SessionId {
    /// Placeholder for a session the firmware has not numbered yet.
    pub const UNASSIGNED: SessionId = SessionId(0);

    /// Wrap a raw session id.
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Raw id value.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// True for any id other than [`SessionId::UNASSIGNED`].
    pub const fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// NAN data path identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NdpId(u32);

impl NdpId {
    /// Placeholder for a locally initiated path still waiting for its id.
    pub const UNASSIGNED: NdpId = NdpId(0);

    /// Wrap a raw NDP id.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw id value.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// True for any id other than [`NdpId::UNASSIGNED`].
    pub const fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for NdpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Peer handle learned from a discovery match (the requestor instance id).
///
/// `0` on a data-path request means the path is not tied to a discovery
/// session (out-of-band).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerInstanceId(u32);

impl PeerInstanceId {
    /// Out-of-band marker.
    pub const UNASSOCIATED: PeerInstanceId = PeerInstanceId(0);

    /// Wrap a raw instance id.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw id value.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// True when this handle refers to a discovered peer.
    pub const fn is_associated(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for PeerInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 48-bit IEEE MAC address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Wrap raw octets.
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// Raw octets.
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddress({self})")
    }
}

/// Monotonic timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a timestamp from milliseconds.
    pub const fn new(millis: u64) -> Self {
        Self(millis)
    }

    /// Milliseconds since the time source's epoch.
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Timestamp `millis` later, saturating at `u64::MAX`.
    pub const fn add_millis(&self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Milliseconds elapsed since `earlier` (zero if `earlier` is later).
    pub const fn millis_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// The kind of a control request; one per firmware command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandKind {
    /// Query firmware capabilities.
    Capabilities,
    /// Enable (or reconfigure) the interface.
    Configure,
    /// Disable the interface.
    Disable,
    /// Start or update a publish session.
    Publish,
    /// Start or update a subscribe session.
    Subscribe,
    /// Send a follow-up message to a matched peer.
    SendMessage,
    /// Terminate a publish session.
    StopPublish,
    /// Terminate a subscribe session.
    StopSubscribe,
    /// Create a NAN data interface.
    CreateIface,
    /// Delete a NAN data interface.
    DeleteIface,
    /// Initiate a data path.
    InitiateDataPath,
    /// Accept or reject a peer's data-path request.
    RespondDataPath,
    /// Tear down a data path.
    EndDataPath,
}

impl CommandKind {
    /// Stable snake_case label, used in logs and metric labels.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Capabilities => "capabilities",
            Self::Configure => "configure",
            Self::Disable => "disable",
            Self::Publish => "publish",
            Self::Subscribe => "subscribe",
            Self::SendMessage => "send_message",
            Self::StopPublish => "stop_publish",
            Self::StopSubscribe => "stop_subscribe",
            Self::CreateIface => "create_iface",
            Self::DeleteIface => "delete_iface",
            Self::InitiateDataPath => "initiate_data_path",
            Self::RespondDataPath => "respond_data_path",
            Self::EndDataPath => "end_data_path",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
