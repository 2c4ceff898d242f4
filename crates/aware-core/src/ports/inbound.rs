//! # Driving Ports (Inbound API)
//!
//! Every request returns at once: either the transaction id that its later
//! [`Completion`](crate::domain::Completion) will carry, or a synchronous
//! rejection that consumed nothing.

use crate::domain::{
    AwareError, EnableRequest, FirmwareEvent, InitiateRequest, MessageRequest, NdpId,
    PublishConfig, RespondRequest, SessionId, SubscribeConfig, TransactionId,
};

/// Request API of the engine.
///
/// # Example
///
/// ```rust,ignore
/// use aware_core::ports::AwareApi;
///
/// fn advertise<T: AwareApi>(api: &mut T) -> Result<TransactionId, AwareError> {
///     api.publish(SessionId::UNASSIGNED, PublishConfig::new("printer"))
/// }
/// ```
pub trait AwareApi {
    /// Fetch the firmware capability snapshot.
    fn get_capabilities(&mut self) -> Result<TransactionId, AwareError>;

    /// Enable the interface, or reconfigure it in place when already enabled.
    ///
    /// Fails with `InvalidState` while an enable or disable is in flight.
    fn enable_and_configure(&mut self, request: EnableRequest) -> Result<TransactionId, AwareError>;

    /// Disable the interface, tearing down every session and data path.
    fn disable(&mut self) -> Result<TransactionId, AwareError>;

    /// Start a publish session (`session_id` unassigned) or update one.
    fn publish(
        &mut self,
        session_id: SessionId,
        config: PublishConfig,
    ) -> Result<TransactionId, AwareError>;

    /// Start a subscribe session (`session_id` unassigned) or update one.
    fn subscribe(
        &mut self,
        session_id: SessionId,
        config: SubscribeConfig,
    ) -> Result<TransactionId, AwareError>;

    /// Send a follow-up message to a peer previously matched on the session.
    ///
    /// Fails with `UnknownPeer` if no match recorded that peer.
    fn send_message(&mut self, request: MessageRequest) -> Result<TransactionId, AwareError>;

    /// Stop a publish session. Removal happens on completion.
    fn stop_publish(&mut self, session_id: SessionId) -> Result<TransactionId, AwareError>;

    /// Stop a subscribe session. Removal happens on completion.
    fn stop_subscribe(&mut self, session_id: SessionId) -> Result<TransactionId, AwareError>;

    /// Create a NAN data interface.
    fn create_interface(&mut self, name: &str) -> Result<TransactionId, AwareError>;

    /// Delete a NAN data interface no live data path uses.
    fn delete_interface(&mut self, name: &str) -> Result<TransactionId, AwareError>;

    /// Initiate a data path to a matched or out-of-band peer.
    ///
    /// Security is checked before anything else: both PMK and passphrase set
    /// fails with `InvalidSecurityConfig`.
    fn initiate_data_path(&mut self, request: InitiateRequest) -> Result<TransactionId, AwareError>;

    /// Accept or reject a peer's data path request.
    fn respond_to_data_path_request(
        &mut self,
        request: RespondRequest,
    ) -> Result<TransactionId, AwareError>;

    /// Tear down a data path. Removal happens on completion.
    fn end_data_path(&mut self, ndp_id: NdpId) -> Result<TransactionId, AwareError>;
}

/// Entry point for everything arriving from below.
pub trait FirmwareEventHandler {
    /// Apply one firmware event.
    fn handle_event(&mut self, event: FirmwareEvent);

    /// Run deadline processing: transaction timeouts, then response grace expiry.
    fn tick(&mut self);
}
