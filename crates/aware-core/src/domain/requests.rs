//! # Request Types
//!
//! One self-describing struct per request kind, gathered in [`AwareRequest`].
//! Every struct validates itself (optionally against a capability snapshot)
//! before the facade allocates a transaction for it.

use super::capabilities::Capabilities;
use super::errors::AwareError;
use super::security::DataPathSecurityConfig;
use super::types::{CommandKind, MacAddress, NdpId, PeerInstanceId, SessionId};

/// Longest usable network interface name (IFNAMSIZ minus the terminator).
pub const MAX_INTERFACE_NAME_LEN: usize = 15;

// =============================================================================
// Interface configuration
// =============================================================================

/// Cluster configuration. Opaque to the engine apart from range checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRequest {
    /// Operate on the 5 GHz band as well as 2.4 GHz.
    pub support_5ghz: bool,
    /// Operate on the 6 GHz band.
    pub support_6ghz: bool,
    /// Master preference advertised to the cluster.
    pub master_preference: u8,
    /// Lowest acceptable cluster id.
    pub cluster_low: u16,
    /// Highest acceptable cluster id.
    pub cluster_high: u16,
    /// Discovery window wake interval on 2.4 GHz, firmware default if unset.
    pub discovery_window_24ghz: Option<u8>,
    /// Discovery window wake interval on 5 GHz, firmware default if unset.
    pub discovery_window_5ghz: Option<u8>,
}

impl Default for ConfigRequest {
    fn default() -> Self {
        Self {
            support_5ghz: true,
            support_6ghz: false,
            master_preference: 0,
            cluster_low: 0,
            cluster_high: 0xFFFF,
            discovery_window_24ghz: None,
            discovery_window_5ghz: None,
        }
    }
}

impl ConfigRequest {
    /// Range checks.
    pub fn validate(&self) -> Result<(), AwareError> {
        if self.cluster_low > self.cluster_high {
            return Err(AwareError::InvalidArgument(format!(
                "cluster range {}..{} is empty",
                self.cluster_low, self.cluster_high
            )));
        }
        Ok(())
    }
}

/// Power tuning values, forwarded to firmware unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PowerParameters {
    /// Discovery window interval on 2.4 GHz.
    pub discovery_window_24ghz: u32,
    /// Discovery window interval on 5 GHz.
    pub discovery_window_5ghz: u32,
    /// Discovery window interval on 6 GHz.
    pub discovery_window_6ghz: u32,
    /// Discovery beacon interval in milliseconds.
    pub discovery_beacon_interval_ms: u32,
    /// Spatial streams used during discovery.
    pub spatial_streams_in_discovery: u32,
    /// Allow early discovery window termination.
    pub early_discovery_window_termination: bool,
}

/// Instant communication mode settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstantMode {
    /// Channel centre frequency in MHz.
    pub channel_mhz: u32,
}

/// Enable or reconfigure the interface.
///
/// Whether this is an initial configuration or an in-place update is decided
/// by the interface state machine, not by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnableRequest {
    /// Cluster configuration.
    pub config: ConfigRequest,
    /// Report discovery interface address changes.
    pub notify_identity_change: bool,
    /// Enable ranging.
    pub ranging_enabled: bool,
    /// Instant communication mode, disabled when `None`.
    pub instant_communication: Option<InstantMode>,
    /// MAC randomization interval in seconds (0 disables randomization).
    pub mac_randomization_interval_sec: u32,
    /// Power tuning, passed through.
    pub power: PowerParameters,
}

impl EnableRequest {
    /// Validate against the capability snapshot when one is available.
    pub fn validate(&self, capabilities: Option<&Capabilities>) -> Result<(), AwareError> {
        self.config.validate()?;
        if let Some(instant) = self.instant_communication {
            if instant.channel_mhz == 0 {
                return Err(AwareError::InvalidArgument(
                    "instant mode channel must be non-zero".to_string(),
                ));
            }
            if let Some(caps) = capabilities {
                if !caps.instant_communication_supported {
                    return Err(AwareError::InvalidArgument(
                        "instant communication mode not supported".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// Discovery
// =============================================================================

/// How a publish session advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishType {
    /// Broadcast advertisements.
    #[default]
    Unsolicited,
    /// Answer active subscribers only.
    Solicited,
    /// Both of the above.
    Both,
}

/// How a subscribe session searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscribeType {
    /// Listen for unsolicited publishes.
    #[default]
    Passive,
    /// Transmit subscribe frames.
    Active,
}

/// Publish session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PublishConfig {
    /// Service name.
    pub service_name: String,
    /// Service-specific info advertised with the service.
    pub service_specific_info: Vec<u8>,
    /// Match filter.
    pub match_filter: Vec<u8>,
    /// Advertisement mode.
    pub publish_type: PublishType,
    /// Session lifetime in seconds (0 = until stopped).
    pub ttl_sec: u32,
    /// Ask firmware to report termination.
    pub termination_notification: bool,
    /// Request ranging with subscribers.
    pub ranging_enabled: bool,
}

impl PublishConfig {
    /// Convenience constructor for an unsolicited publish.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            termination_notification: true,
            ..Self::default()
        }
    }

    /// Validate against the capability snapshot when one is available.
    pub fn validate(&self, capabilities: Option<&Capabilities>) -> Result<(), AwareError> {
        validate_discovery_fields(
            &self.service_name,
            &self.service_specific_info,
            &self.match_filter,
            capabilities,
        )
    }
}

/// Subscribe session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubscribeConfig {
    /// Service name.
    pub service_name: String,
    /// Service-specific info sent with active subscribes.
    pub service_specific_info: Vec<u8>,
    /// Match filter.
    pub match_filter: Vec<u8>,
    /// Search mode.
    pub subscribe_type: SubscribeType,
    /// Session lifetime in seconds (0 = until stopped).
    pub ttl_sec: u32,
    /// Ask firmware to report termination.
    pub termination_notification: bool,
    /// Only match peers at least this far away (millimetres).
    pub min_distance_mm: Option<u32>,
    /// Only match peers at most this far away (millimetres).
    pub max_distance_mm: Option<u32>,
}

impl SubscribeConfig {
    /// Convenience constructor for a passive subscribe.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            termination_notification: true,
            ..Self::default()
        }
    }

    /// Validate against the capability snapshot when one is available.
    pub fn validate(&self, capabilities: Option<&Capabilities>) -> Result<(), AwareError> {
        validate_discovery_fields(
            &self.service_name,
            &self.service_specific_info,
            &self.match_filter,
            capabilities,
        )?;
        if let (Some(min), Some(max)) = (self.min_distance_mm, self.max_distance_mm) {
            if min > max {
                return Err(AwareError::InvalidArgument(format!(
                    "min distance {min}mm exceeds max distance {max}mm"
                )));
            }
        }
        Ok(())
    }
}

fn validate_discovery_fields(
    service_name: &str,
    service_specific_info: &[u8],
    match_filter: &[u8],
    capabilities: Option<&Capabilities>,
) -> Result<(), AwareError> {
    if service_name.is_empty() {
        return Err(AwareError::InvalidArgument(
            "service name must not be empty".to_string(),
        ));
    }
    let Some(caps) = capabilities else {
        return Ok(());
    };
    if service_name.len() > caps.max_service_name_len {
        return Err(AwareError::InvalidArgument(format!(
            "service name exceeds {} bytes",
            caps.max_service_name_len
        )));
    }
    if service_specific_info.len() > caps.max_service_specific_info_len {
        return Err(AwareError::InvalidArgument(format!(
            "service specific info exceeds {} bytes",
            caps.max_service_specific_info_len
        )));
    }
    if match_filter.len() > caps.max_match_filter_len {
        return Err(AwareError::InvalidArgument(format!(
            "match filter exceeds {} bytes",
            caps.max_match_filter_len
        )));
    }
    Ok(())
}

/// Role of a discovery session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionRole {
    /// Publish session.
    Publisher,
    /// Subscribe session.
    Subscriber,
}

impl SessionRole {
    /// Lower-case label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Publisher => "publish",
            Self::Subscriber => "subscribe",
        }
    }
}

/// Configuration of either session role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryConfig {
    /// Publish configuration.
    Publish(PublishConfig),
    /// Subscribe configuration.
    Subscribe(SubscribeConfig),
}

impl DiscoveryConfig {
    /// Role this configuration belongs to.
    pub fn role(&self) -> SessionRole {
        match self {
            Self::Publish(_) => SessionRole::Publisher,
            Self::Subscribe(_) => SessionRole::Subscriber,
        }
    }

    /// Service name of either variant.
    pub fn service_name(&self) -> &str {
        match self {
            Self::Publish(c) => &c.service_name,
            Self::Subscribe(c) => &c.service_name,
        }
    }
}

/// Follow-up message to a matched peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRequest {
    /// Session the peer was matched on.
    pub session_id: SessionId,
    /// Peer handle from the match.
    pub peer: PeerInstanceId,
    /// Message body.
    pub payload: Vec<u8>,
}

// =============================================================================
// Data path
// =============================================================================

/// How strictly the requested channel must be honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelRequestType {
    /// Let the firmware pick.
    #[default]
    Available,
    /// Prefer the given channel.
    Requested,
    /// Use the given channel or fail.
    Forced,
}

/// Locally initiated data path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiateRequest {
    /// Matched peer, or [`PeerInstanceId::UNASSOCIATED`] for out-of-band.
    pub peer_id: PeerInstanceId,
    /// Peer discovery (or, out-of-band, data) interface address.
    pub peer_address: MacAddress,
    /// Channel policy.
    pub channel_request_type: ChannelRequestType,
    /// Channel centre frequency in MHz.
    pub channel_mhz: Option<u32>,
    /// Local data interface to carry the path.
    pub interface_name: String,
    /// Opaque blob sent to the peer.
    pub app_info: Vec<u8>,
    /// Security settings.
    pub security: DataPathSecurityConfig,
}

impl InitiateRequest {
    /// Open, out-of-band path request on `interface_name`.
    pub fn out_of_band(peer_address: MacAddress, interface_name: impl Into<String>) -> Self {
        Self {
            peer_id: PeerInstanceId::UNASSOCIATED,
            peer_address,
            channel_request_type: ChannelRequestType::Available,
            channel_mhz: None,
            interface_name: interface_name.into(),
            app_info: Vec::new(),
            security: DataPathSecurityConfig::open(),
        }
    }

    /// True when the path has no discovery session behind it.
    pub fn is_out_of_band(&self) -> bool {
        !self.peer_id.is_associated()
    }

    /// Argument checks that need no engine state.
    pub fn validate(&self) -> Result<(), AwareError> {
        self.security.validate()?;
        validate_interface_name(&self.interface_name)?;
        if self.channel_request_type == ChannelRequestType::Forced && self.channel_mhz.is_none() {
            return Err(AwareError::InvalidArgument(
                "forced channel request without a channel".to_string(),
            ));
        }
        Ok(())
    }
}

/// Answer to a peer-initiated data path request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RespondRequest {
    /// Path being answered.
    pub ndp_id: NdpId,
    /// Accept or reject.
    pub accept: bool,
    /// Local data interface to carry the path (ignored on reject).
    pub interface_name: String,
    /// Opaque blob sent to the peer.
    pub app_info: Vec<u8>,
    /// Security settings (ignored on reject).
    pub security: DataPathSecurityConfig,
}

impl RespondRequest {
    /// Open accept on `interface_name`.
    pub fn accept(ndp_id: NdpId, interface_name: impl Into<String>) -> Self {
        Self {
            ndp_id,
            accept: true,
            interface_name: interface_name.into(),
            app_info: Vec::new(),
            security: DataPathSecurityConfig::open(),
        }
    }

    /// Reject.
    pub fn reject(ndp_id: NdpId) -> Self {
        Self {
            ndp_id,
            accept: false,
            interface_name: String::new(),
            app_info: Vec::new(),
            security: DataPathSecurityConfig::open(),
        }
    }

    /// Argument checks that need no engine state.
    pub fn validate(&self) -> Result<(), AwareError> {
        if !self.accept {
            return Ok(());
        }
        self.security.validate()?;
        validate_interface_name(&self.interface_name)
    }
}

/// Check a data interface name is usable.
pub fn validate_interface_name(name: &str) -> Result<(), AwareError> {
    if name.is_empty() || name.len() > MAX_INTERFACE_NAME_LEN {
        return Err(AwareError::InvalidArgument(format!(
            "interface name must be 1..={MAX_INTERFACE_NAME_LEN} bytes"
        )));
    }
    if !name.bytes().all(|b| b.is_ascii_graphic() && b != b'/') {
        return Err(AwareError::InvalidArgument(format!(
            "interface name {name:?} contains invalid characters"
        )));
    }
    Ok(())
}

// =============================================================================
// Request envelope
// =============================================================================

/// Every request the engine accepts, one variant per command kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwareRequest {
    /// Query firmware capabilities.
    GetCapabilities,
    /// Enable or reconfigure the interface.
    EnableAndConfigure(EnableRequest),
    /// Disable the interface.
    Disable,
    /// Start (`session_id` unassigned) or update a publish session.
    Publish {
        /// Existing session to update, or [`SessionId::UNASSIGNED`].
        session_id: SessionId,
        /// Publish configuration.
        config: PublishConfig,
    },
    /// Start (`session_id` unassigned) or update a subscribe session.
    Subscribe {
        /// Existing session to update, or [`SessionId::UNASSIGNED`].
        session_id: SessionId,
        /// Subscribe configuration.
        config: SubscribeConfig,
    },
    /// Send a follow-up message.
    SendMessage(MessageRequest),
    /// Terminate a publish session.
    StopPublish(SessionId),
    /// Terminate a subscribe session.
    StopSubscribe(SessionId),
    /// Create a data interface.
    CreateInterface(String),
    /// Delete a data interface.
    DeleteInterface(String),
    /// Initiate a data path.
    InitiateDataPath(InitiateRequest),
    /// Answer a peer's data path request.
    RespondToDataPathRequest(RespondRequest),
    /// Tear down a data path.
    EndDataPath(NdpId),
}

impl AwareRequest {
    /// Command kind issued for this request.
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::GetCapabilities => CommandKind::Capabilities,
            Self::EnableAndConfigure(_) => CommandKind::Configure,
            Self::Disable => CommandKind::Disable,
            Self::Publish { .. } => CommandKind::Publish,
            Self::Subscribe { .. } => CommandKind::Subscribe,
            Self::SendMessage(_) => CommandKind::SendMessage,
            Self::StopPublish(_) => CommandKind::StopPublish,
            Self::StopSubscribe(_) => CommandKind::StopSubscribe,
            Self::CreateInterface(_) => CommandKind::CreateIface,
            Self::DeleteInterface(_) => CommandKind::DeleteIface,
            Self::InitiateDataPath(_) => CommandKind::InitiateDataPath,
            Self::RespondToDataPathRequest(_) => CommandKind::RespondDataPath,
            Self::EndDataPath(_) => CommandKind::EndDataPath,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::capabilities::CipherSuite;

    #[test]
    fn test_empty_cluster_range_rejected() {
        let config = ConfigRequest {
            cluster_low: 10,
            cluster_high: 5,
            ..ConfigRequest::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_instant_mode_requires_capability() {
        let request = EnableRequest {
            instant_communication: Some(InstantMode { channel_mhz: 2437 }),
            ..EnableRequest::default()
        };
        // Unknown capabilities: accepted, firmware decides
        assert!(request.validate(None).is_ok());

        let caps = Capabilities::default();
        assert!(request.validate(Some(&caps)).is_err());

        let caps = Capabilities {
            instant_communication_supported: true,
            ..Capabilities::default()
        };
        assert!(request.validate(Some(&caps)).is_ok());
    }

    #[test]
    fn test_publish_service_name_required() {
        assert!(PublishConfig::default().validate(None).is_err());
        assert!(PublishConfig::new("printer").validate(None).is_ok());
    }

    #[test]
    fn test_publish_limits_checked_against_capabilities() {
        let caps = Capabilities {
            max_service_specific_info_len: 4,
            ..Capabilities::default()
        };
        let mut config = PublishConfig::new("printer");
        config.service_specific_info = vec![0; 5];
        assert!(config.validate(None).is_ok());
        assert!(matches!(
            config.validate(Some(&caps)),
            Err(AwareError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_subscribe_distance_bounds() {
        let mut config = SubscribeConfig::new("printer");
        config.min_distance_mm = Some(5_000);
        config.max_distance_mm = Some(1_000);
        assert!(config.validate(None).is_err());
    }

    #[test]
    fn test_forced_channel_requires_channel() {
        let mut request = InitiateRequest::out_of_band(MacAddress::new([2; 6]), "aware_data0");
        request.channel_request_type = ChannelRequestType::Forced;
        assert!(request.validate().is_err());

        request.channel_mhz = Some(5745);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_initiate_rejects_double_secret() {
        let mut request = InitiateRequest::out_of_band(MacAddress::new([2; 6]), "aware_data0");
        request.security = DataPathSecurityConfig::with_pmk(CipherSuite::SharedKey128, vec![0; 32]);
        request.security.passphrase = Some("password123".to_string());
        assert!(matches!(
            request.validate(),
            Err(AwareError::InvalidSecurityConfig(_))
        ));
    }

    #[test]
    fn test_reject_ignores_interface_and_security() {
        let mut request = RespondRequest::reject(NdpId::new(4));
        request.security.passphrase = Some("x".to_string());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_interface_name_rules() {
        assert!(validate_interface_name("aware_data0").is_ok());
        assert!(validate_interface_name("").is_err());
        assert!(validate_interface_name("a_name_that_is_too_long").is_err());
        assert!(validate_interface_name("bad name").is_err());
    }

    #[test]
    fn test_request_kind_mapping() {
        assert_eq!(AwareRequest::Disable.kind(), CommandKind::Disable);
        assert_eq!(
            AwareRequest::StopSubscribe(SessionId::new(1)).kind(),
            CommandKind::StopSubscribe
        );
        assert_eq!(
            AwareRequest::RespondToDataPathRequest(RespondRequest::reject(NdpId::new(1))).kind(),
            CommandKind::RespondDataPath
        );
    }
}
