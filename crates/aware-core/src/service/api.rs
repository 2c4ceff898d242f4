use crate::domain::{
    validate_interface_name, AwareError, AwareRequest, CommandKind, DiscoveryConfig,
    EnableRequest, InitiateRequest, MessageRequest, NdpId, Origin, PendingContext, PublishConfig,
    RespondRequest, SessionId, SessionRole, SubscribeConfig, TransactionId,
};
use crate::ports::{AwareApi, FirmwareCommand};
use crate::service::AwareService;

impl AwareService {
    /// Route a typed request to the matching API operation.
    pub fn submit(&mut self, request: AwareRequest) -> Result<TransactionId, AwareError> {
        match request {
            AwareRequest::GetCapabilities => self.get_capabilities(),
            AwareRequest::EnableAndConfigure(request) => self.enable_and_configure(request),
            AwareRequest::Disable => self.disable(),
            AwareRequest::Publish { session_id, config } => self.publish(session_id, config),
            AwareRequest::Subscribe { session_id, config } => self.subscribe(session_id, config),
            AwareRequest::SendMessage(request) => self.send_message(request),
            AwareRequest::StopPublish(session_id) => self.stop_publish(session_id),
            AwareRequest::StopSubscribe(session_id) => self.stop_subscribe(session_id),
            AwareRequest::CreateInterface(name) => self.create_interface(&name),
            AwareRequest::DeleteInterface(name) => self.delete_interface(&name),
            AwareRequest::InitiateDataPath(request) => self.initiate_data_path(request),
            AwareRequest::RespondToDataPathRequest(request) => {
                self.respond_to_data_path_request(request)
            }
            AwareRequest::EndDataPath(ndp_id) => self.end_data_path(ndp_id),
        }
    }

    fn try_enable(&mut self, request: EnableRequest) -> Result<TransactionId, AwareError> {
        let initial_configuration = self.interface.check_enable()?;
        let caps = self.capabilities.snapshot();
        request.validate(caps.as_deref())?;

        let txn = self.issue(
            FirmwareCommand::EnableAndConfigure {
                request: request.clone(),
                initial_configuration,
            },
            PendingContext::Interface,
            Origin::Caller,
        )?;
        self.interface.begin_enable(request);
        Ok(txn)
    }

    fn try_disable(&mut self) -> Result<TransactionId, AwareError> {
        self.interface.check_disable()?;
        let txn = self.issue(
            FirmwareCommand::Disable,
            PendingContext::Interface,
            Origin::Caller,
        )?;
        self.interface.begin_disable();
        Ok(txn)
    }

    fn try_discovery(
        &mut self,
        session_id: SessionId,
        config: DiscoveryConfig,
    ) -> Result<TransactionId, AwareError> {
        let role = config.role();
        let kind = match role {
            SessionRole::Publisher => CommandKind::Publish,
            SessionRole::Subscriber => CommandKind::Subscribe,
        };
        self.interface.require_enabled(kind)?;
        let caps = self.capabilities.snapshot();
        match &config {
            DiscoveryConfig::Publish(c) => c.validate(caps.as_deref())?,
            DiscoveryConfig::Subscribe(c) => c.validate(caps.as_deref())?,
        }

        let command = match &config {
            DiscoveryConfig::Publish(c) => FirmwareCommand::Publish {
                session_id,
                config: c.clone(),
            },
            DiscoveryConfig::Subscribe(c) => FirmwareCommand::Subscribe {
                session_id,
                config: c.clone(),
            },
        };

        if session_id.is_assigned() {
            self.sessions.check_update(session_id, role)?;
            let txn = self.issue(command, PendingContext::Session(session_id), Origin::Caller)?;
            self.sessions.begin_update(session_id, txn, config);
            Ok(txn)
        } else {
            self.sessions.check_capacity(role, caps.as_deref())?;
            let txn = self.issue(command, PendingContext::NewSession(role), Origin::Caller)?;
            self.sessions.begin_new(txn, config);
            Ok(txn)
        }
    }

    fn try_send_message(&mut self, request: MessageRequest) -> Result<TransactionId, AwareError> {
        self.interface.require_enabled(CommandKind::SendMessage)?;
        let caps = self.capabilities.snapshot();
        let peer_address = self.sessions.check_message(
            request.session_id,
            request.peer,
            request.payload.len(),
            caps.as_deref(),
        )?;

        let session_id = request.session_id;
        let txn = self.issue(
            FirmwareCommand::TransmitFollowup {
                session_id,
                peer: request.peer,
                peer_address,
                payload: request.payload,
            },
            PendingContext::Session(session_id),
            Origin::Caller,
        )?;
        self.sessions.attach(session_id, txn);
        Ok(txn)
    }

    fn try_stop(
        &mut self,
        session_id: SessionId,
        role: SessionRole,
    ) -> Result<TransactionId, AwareError> {
        let (kind, command) = match role {
            SessionRole::Publisher => (
                CommandKind::StopPublish,
                FirmwareCommand::StopPublish(session_id),
            ),
            SessionRole::Subscriber => (
                CommandKind::StopSubscribe,
                FirmwareCommand::StopSubscribe(session_id),
            ),
        };
        self.interface.require_enabled(kind)?;
        self.sessions.check_stop(session_id, role)?;

        let txn = self.issue(command, PendingContext::Session(session_id), Origin::Caller)?;
        self.sessions.begin_stop(session_id, txn);
        Ok(txn)
    }

    fn try_create_interface(&mut self, name: &str) -> Result<TransactionId, AwareError> {
        validate_interface_name(name)?;
        self.interface.require_quiescent(CommandKind::CreateIface)?;
        let caps = self.capabilities.snapshot();
        self.data_interfaces.check_create(name, caps.as_deref())?;

        let txn = self.issue(
            FirmwareCommand::CreateDataInterface(name.to_string()),
            PendingContext::DataInterface(name.to_string()),
            Origin::Caller,
        )?;
        self.data_interfaces.begin_create(name.to_string(), txn);
        Ok(txn)
    }

    fn try_delete_interface(&mut self, name: &str) -> Result<TransactionId, AwareError> {
        self.interface.require_quiescent(CommandKind::DeleteIface)?;
        self.data_interfaces.check_delete(name)?;
        if self.data_paths.uses_interface(name) {
            return Err(AwareError::InvalidState {
                operation: CommandKind::DeleteIface,
                state: format!("interface {name:?} carries a data path"),
            });
        }

        let txn = self.issue(
            FirmwareCommand::DeleteDataInterface(name.to_string()),
            PendingContext::DataInterface(name.to_string()),
            Origin::Caller,
        )?;
        self.data_interfaces.begin_delete(name, txn);
        Ok(txn)
    }

    fn try_initiate(&mut self, request: InitiateRequest) -> Result<TransactionId, AwareError> {
        // Malformed security is rejected regardless of engine state
        request.validate()?;
        self.interface.require_enabled(CommandKind::InitiateDataPath)?;
        if !request.is_out_of_band() && !self.sessions.knows_peer(request.peer_id) {
            return Err(AwareError::UnknownPeer {
                peer: request.peer_id,
            });
        }
        self.data_interfaces.require_ready(&request.interface_name)?;
        let caps = self.capabilities.snapshot();
        request.security.check_supported(caps.as_deref())?;
        self.data_paths
            .check_initiate(request.app_info.len(), caps.as_deref())?;

        let txn = self.issue(
            FirmwareCommand::InitiateDataPath {
                request: request.clone(),
                capabilities: caps,
            },
            PendingContext::NewDataPath,
            Origin::Caller,
        )?;
        self.data_paths.begin_initiate(txn, request);
        Ok(txn)
    }

    fn try_respond(&mut self, request: RespondRequest) -> Result<TransactionId, AwareError> {
        request.validate()?;
        self.interface.require_enabled(CommandKind::RespondDataPath)?;
        let caps = self.capabilities.snapshot();
        self.data_paths.check_respond(&request, caps.as_deref())?;
        if request.accept {
            self.data_interfaces.require_ready(&request.interface_name)?;
            request.security.check_supported(caps.as_deref())?;
        }

        let ndp_id = request.ndp_id;
        let txn = self.issue(
            FirmwareCommand::RespondToDataPathRequest {
                request: request.clone(),
                capabilities: caps,
            },
            PendingContext::DataPath(ndp_id),
            Origin::Caller,
        )?;
        self.data_paths.begin_respond(txn, request);
        Ok(txn)
    }

    fn try_end_data_path(&mut self, ndp_id: NdpId) -> Result<TransactionId, AwareError> {
        self.interface.require_enabled(CommandKind::EndDataPath)?;
        self.data_paths.check_end(ndp_id)?;

        let txn = self.issue(
            FirmwareCommand::EndDataPath(ndp_id),
            PendingContext::DataPath(ndp_id),
            Origin::Caller,
        )?;
        self.data_paths.begin_end(ndp_id, txn);
        Ok(txn)
    }
}

impl AwareApi for AwareService {
    fn get_capabilities(&mut self) -> Result<TransactionId, AwareError> {
        let result = self.issue(
            FirmwareCommand::GetCapabilities,
            PendingContext::Interface,
            Origin::Caller,
        );
        Self::traced(CommandKind::Capabilities, result)
    }

    fn enable_and_configure(&mut self, request: EnableRequest) -> Result<TransactionId, AwareError> {
        let result = self.try_enable(request);
        Self::traced(CommandKind::Configure, result)
    }

    fn disable(&mut self) -> Result<TransactionId, AwareError> {
        let result = self.try_disable();
        Self::traced(CommandKind::Disable, result)
    }

    fn publish(
        &mut self,
        session_id: SessionId,
        config: PublishConfig,
    ) -> Result<TransactionId, AwareError> {
        let result = self.try_discovery(session_id, DiscoveryConfig::Publish(config));
        Self::traced(CommandKind::Publish, result)
    }

    fn subscribe(
        &mut self,
        session_id: SessionId,
        config: SubscribeConfig,
    ) -> Result<TransactionId, AwareError> {
        let result = self.try_discovery(session_id, DiscoveryConfig::Subscribe(config));
        Self::traced(CommandKind::Subscribe, result)
    }

    fn send_message(&mut self, request: MessageRequest) -> Result<TransactionId, AwareError> {
        let result = self.try_send_message(request);
        Self::traced(CommandKind::SendMessage, result)
    }

    fn stop_publish(&mut self, session_id: SessionId) -> Result<TransactionId, AwareError> {
        let result = self.try_stop(session_id, SessionRole::Publisher);
        Self::traced(CommandKind::StopPublish, result)
    }

    fn stop_subscribe(&mut self, session_id: SessionId) -> Result<TransactionId, AwareError> {
        let result = self.try_stop(session_id, SessionRole::Subscriber);
        Self::traced(CommandKind::StopSubscribe, result)
    }

    fn create_interface(&mut self, name: &str) -> Result<TransactionId, AwareError> {
        let result = self.try_create_interface(name);
        Self::traced(CommandKind::CreateIface, result)
    }

    fn delete_interface(&mut self, name: &str) -> Result<TransactionId, AwareError> {
        let result = self.try_delete_interface(name);
        Self::traced(CommandKind::DeleteIface, result)
    }

    fn initiate_data_path(&mut self, request: InitiateRequest) -> Result<TransactionId, AwareError> {
        let result = self.try_initiate(request);
        Self::traced(CommandKind::InitiateDataPath, result)
    }

    fn respond_to_data_path_request(
        &mut self,
        request: RespondRequest,
    ) -> Result<TransactionId, AwareError> {
        let result = self.try_respond(request);
        Self::traced(CommandKind::RespondDataPath, result)
    }

    fn end_data_path(&mut self, ndp_id: NdpId) -> Result<TransactionId, AwareError> {
        let result = self.try_end_data_path(ndp_id);
        Self::traced(CommandKind::EndDataPath, result)
    }
}
