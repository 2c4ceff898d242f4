use tracing::{debug, error, info, warn};

use crate::domain::{
    CommandKind, Completion, CompletionDetail, CompletionPayload, ConfirmOutcome, DataPath,
    DataPathState, DeferredPathEvent, FailureReason, FirmwareEvent, FirmwareStatus, MacAddress, NdpId,
    Notification, Origin, PathTerminationOutcome, PendingContext, SessionId, TerminationOutcome,
    TerminationReason, TransactionId, TransactionRecord,
};
use crate::ports::FirmwareEventHandler;
use crate::service::AwareService;

impl AwareService {
    /// Resolve a pending transaction and notify its originator.
    ///
    /// Shared by real completions, synthetic timeouts and teardown aborts.
    pub(crate) fn apply_completion(
        &mut self,
        record: TransactionRecord,
        outcome: Result<CompletionPayload, FailureReason>,
    ) {
        let txn = record.id;
        let kind = record.kind;
        let latency_ms = self.now().millis_since(record.issued_at);

        if record.origin == Origin::Internal {
            if let PendingContext::DataPath(ndp_id) = record.context {
                self.data_paths.detach(ndp_id, txn);
            }
            debug!(transaction_id = %txn, kind = %kind, outcome = ?outcome.as_ref().err(), "internal command resolved");
            return;
        }

        let result = self.apply_transition(&record, outcome);

        match &result {
            Ok(_) => debug!(transaction_id = %txn, kind = %kind, latency_ms, "transaction completed"),
            Err(FailureReason::InvalidCompletion(detail)) => {
                error!(transaction_id = %txn, kind = %kind, detail, "firmware sent an unusable completion")
            }
            Err(reason) => {
                info!(transaction_id = %txn, kind = %kind, reason = %reason, latency_ms, "transaction failed")
            }
        }

        let initiated = match &result {
            Ok(CompletionDetail::DataPathInitiated { ndp_id }) => Some(*ndp_id),
            _ => None,
        };

        self.emit(Notification::Completed(Completion {
            transaction_id: txn,
            kind,
            result,
        }));

        if let Some(ndp_id) = initiated {
            self.replay_deferred(ndp_id);
        }
    }

    fn apply_transition(
        &mut self,
        record: &TransactionRecord,
        outcome: Result<CompletionPayload, FailureReason>,
    ) -> Result<CompletionDetail, FailureReason> {
        let txn = record.id;
        match (record.kind, &record.context) {
            (CommandKind::Capabilities, _) => match outcome? {
                CompletionPayload::Capabilities(caps) => {
                    let snapshot = self.capabilities.store(caps);
                    info!(
                        max_publishes = snapshot.max_publishes,
                        max_subscribes = snapshot.max_subscribes,
                        max_ndp_sessions = snapshot.max_ndp_sessions,
                        "capabilities cached"
                    );
                    Ok(CompletionDetail::Capabilities(snapshot))
                }
                _ => Err(FailureReason::InvalidCompletion("expected capabilities")),
            },

            (CommandKind::Configure, _) => {
                match self.interface.complete_enable(outcome.is_ok()) {
                    Some(initial) => {
                        outcome?;
                        info!(initial, "interface enabled");
                        Ok(CompletionDetail::Enabled { initial })
                    }
                    None => Err(FailureReason::Aborted),
                }
            }

            (CommandKind::Disable, _) => {
                let success = outcome.is_ok();
                if self.interface.complete_disable(success) {
                    self.cascade_teardown(TerminationReason::InterfaceDisabled);
                    info!("interface disabled");
                    Ok(CompletionDetail::Disabled)
                } else {
                    outcome?;
                    Err(FailureReason::Aborted)
                }
            }

            (CommandKind::Publish | CommandKind::Subscribe, PendingContext::NewSession(_)) => {
                let assigned = outcome.and_then(|payload| match payload {
                    CompletionPayload::SessionId(id) => Ok(id),
                    _ => Err(FailureReason::InvalidCompletion("expected session id")),
                });
                let (session_id, role) = self.sessions.resolve_new(txn, assigned)?;
                info!(session_id = %session_id, role = role.as_str(), "discovery session started");
                Ok(CompletionDetail::SessionStarted { session_id, role })
            }

            (CommandKind::Publish | CommandKind::Subscribe, PendingContext::Session(session_id)) => {
                let session_id = *session_id;
                self.sessions
                    .resolve_update(session_id, txn, outcome.map(|_| ()))?;
                Ok(CompletionDetail::SessionUpdated { session_id })
            }

            (CommandKind::SendMessage, PendingContext::Session(session_id)) => {
                self.sessions.detach(*session_id, txn);
                outcome?;
                Ok(CompletionDetail::MessageSent)
            }

            (
                CommandKind::StopPublish | CommandKind::StopSubscribe,
                PendingContext::Session(session_id),
            ) => {
                let session_id = *session_id;
                if self.sessions.resolve_stop(session_id, txn) {
                    info!(session_id = %session_id, "discovery session stopped");
                }
                outcome?;
                Ok(CompletionDetail::SessionStopped { session_id })
            }

            (CommandKind::CreateIface, PendingContext::DataInterface(name)) => {
                self.data_interfaces.resolve_create(name, outcome.is_ok());
                outcome?;
                Ok(CompletionDetail::InterfaceCreated { name: name.clone() })
            }

            (CommandKind::DeleteIface, PendingContext::DataInterface(name)) => {
                self.data_interfaces.resolve_delete(name, outcome.is_ok());
                outcome?;
                Ok(CompletionDetail::InterfaceDeleted { name: name.clone() })
            }

            (CommandKind::InitiateDataPath, PendingContext::NewDataPath) => {
                let assigned = outcome.and_then(|payload| match payload {
                    CompletionPayload::NdpId(id) => Ok(id),
                    _ => Err(FailureReason::InvalidCompletion("expected ndp id")),
                });
                let ndp_id = self.data_paths.resolve_initiate(txn, assigned)?;
                Ok(CompletionDetail::DataPathInitiated { ndp_id })
            }

            (CommandKind::RespondDataPath, PendingContext::DataPath(ndp_id)) => {
                let ndp_id = *ndp_id;
                let surfaced = self
                    .data_paths
                    .get(ndp_id)
                    .is_some_and(|path| path.state == DataPathState::Confirmed);
                let result = self
                    .data_paths
                    .resolve_respond(ndp_id, txn, outcome.map(|_| ()));
                let taken_down = !self.data_paths.get(ndp_id).is_some_and(DataPath::is_live);
                if let Err(reason) = &result {
                    if surfaced && taken_down {
                        info!(ndp_id = %ndp_id, reason = %reason, "confirmed data path lost its accept");
                        self.emit(Notification::DataPathTerminated {
                            ndp_id,
                            reason: TerminationReason::SetupFailed,
                        });
                    }
                }
                let accepted = result?;
                Ok(CompletionDetail::DataPathResponded { ndp_id, accepted })
            }

            (CommandKind::EndDataPath, PendingContext::DataPath(ndp_id)) => {
                let ndp_id = *ndp_id;
                if self.data_paths.resolve_end(ndp_id, txn) {
                    info!(ndp_id = %ndp_id, "data path ended");
                }
                outcome?;
                Ok(CompletionDetail::DataPathEnded { ndp_id })
            }

            (kind, context) => {
                error!(transaction_id = %txn, kind = %kind, context = ?context, "transaction context does not match its kind");
                Err(FailureReason::InvalidCompletion("context mismatch"))
            }
        }
    }

    fn replay_deferred(&mut self, ndp_id: NdpId) {
        for event in self.data_paths.take_deferred(ndp_id) {
            debug!(ndp_id = %ndp_id, "replaying data path event");
            match event {
                DeferredPathEvent::Confirmed {
                    accepted,
                    peer_ndi,
                    app_info,
                    status,
                } => self.on_data_path_confirmed(ndp_id, accepted, peer_ndi, app_info, status),
                DeferredPathEvent::Terminated(status) => {
                    self.on_data_path_terminated(ndp_id, status)
                }
            }
        }
    }

    fn on_command_completed(
        &mut self,
        transaction_id: TransactionId,
        outcome: Result<CompletionPayload, FirmwareStatus>,
    ) {
        match self.ledger.resolve(transaction_id) {
            Ok(record) => {
                self.apply_completion(record, outcome.map_err(FailureReason::FirmwareError))
            }
            Err(err) => warn!(transaction_id = %transaction_id, error = %err, "completion ignored"),
        }
    }

    fn on_session_terminated(&mut self, session_id: SessionId, status: FirmwareStatus) {
        match self.sessions.on_terminated(session_id) {
            TerminationOutcome::Notify(role) => {
                info!(session_id = %session_id, status = %status, "discovery session terminated by firmware");
                self.emit(Notification::SessionTerminated {
                    session_id,
                    role,
                    reason: TerminationReason::Firmware(status),
                });
            }
            TerminationOutcome::Silent => {
                debug!(session_id = %session_id, "termination of stopping session")
            }
            TerminationOutcome::Ignored => {
                warn!(session_id = %session_id, "termination for unknown session ignored")
            }
        }
    }

    fn on_data_path_confirmed(
        &mut self,
        ndp_id: NdpId,
        accepted: bool,
        peer_ndi: MacAddress,
        app_info: Vec<u8>,
        status: FirmwareStatus,
    ) {
        match self
            .data_paths
            .on_confirmed(ndp_id, accepted, peer_ndi, app_info.clone(), status)
        {
            ConfirmOutcome::Confirmed => {
                info!(ndp_id = %ndp_id, peer_ndi = %peer_ndi, "data path confirmed");
                self.emit(Notification::DataPathConfirmed {
                    ndp_id,
                    peer_ndi,
                    app_info,
                });
            }
            ConfirmOutcome::Rejected(status) => {
                info!(ndp_id = %ndp_id, status = %status, "data path negotiation failed");
                self.emit(Notification::DataPathTerminated {
                    ndp_id,
                    reason: TerminationReason::Rejected(status),
                });
            }
            ConfirmOutcome::Deferred => {
                debug!(ndp_id = %ndp_id, "confirm ahead of initiate completion held back")
            }
            ConfirmOutcome::Ignored => debug!(ndp_id = %ndp_id, "late or unknown confirm ignored"),
        }
    }

    fn on_data_path_terminated(&mut self, ndp_id: NdpId, status: FirmwareStatus) {
        match self.data_paths.on_terminated(ndp_id, status) {
            PathTerminationOutcome::Notify => {
                info!(ndp_id = %ndp_id, status = %status, "data path terminated by firmware");
                self.emit(Notification::DataPathTerminated {
                    ndp_id,
                    reason: TerminationReason::Firmware(status),
                });
            }
            PathTerminationOutcome::Silent => debug!(ndp_id = %ndp_id, "termination of ending path"),
            PathTerminationOutcome::Deferred => {
                debug!(ndp_id = %ndp_id, "termination ahead of initiate completion held back")
            }
            PathTerminationOutcome::Ignored => {
                debug!(ndp_id = %ndp_id, "termination for unknown path ignored")
            }
        }
    }
}

// Event-driven entry point for everything the transport delivers
impl FirmwareEventHandler for AwareService {
    fn handle_event(&mut self, event: FirmwareEvent) {
        let now = self.now();
        match event {
            FirmwareEvent::CommandCompleted {
                transaction_id,
                outcome,
            } => self.on_command_completed(transaction_id, outcome),

            FirmwareEvent::SessionMatched {
                session_id,
                peer,
                peer_address,
                service_specific_info,
                match_filter,
            } => {
                if self.sessions.on_match(
                    session_id,
                    peer,
                    peer_address,
                    service_specific_info.clone(),
                    match_filter,
                    now,
                ) {
                    debug!(session_id = %session_id, peer = %peer, "peer matched");
                    self.emit(Notification::MatchFound {
                        session_id,
                        peer,
                        peer_address,
                        service_specific_info,
                    });
                } else {
                    debug!(session_id = %session_id, "match on inactive session ignored");
                }
            }

            FirmwareEvent::MessageReceived {
                session_id,
                peer,
                peer_address,
                payload,
            } => {
                if self.sessions.on_message(session_id, peer, peer_address, now) {
                    self.emit(Notification::MessageReceived {
                        session_id,
                        peer,
                        payload,
                    });
                } else {
                    debug!(session_id = %session_id, "message on inactive session ignored");
                }
            }

            FirmwareEvent::SessionTerminated { session_id, status } => {
                self.on_session_terminated(session_id, status)
            }

            FirmwareEvent::DataPathRequested {
                ndp_id,
                peer_id,
                peer_address,
                app_info,
            } => {
                if !self.interface.is_enabled() {
                    warn!(ndp_id = %ndp_id, "data path request while interface not enabled ignored");
                } else if self.data_paths.on_request(
                    ndp_id,
                    peer_id,
                    peer_address,
                    app_info.clone(),
                    now,
                ) {
                    info!(ndp_id = %ndp_id, peer = %peer_id, "data path requested by peer");
                    self.emit(Notification::DataPathRequested {
                        ndp_id,
                        peer_id,
                        peer_address,
                        app_info,
                    });
                } else {
                    warn!(ndp_id = %ndp_id, "duplicate data path request ignored");
                }
            }

            FirmwareEvent::DataPathConfirmed {
                ndp_id,
                accepted,
                peer_ndi,
                app_info,
                status,
            } => self.on_data_path_confirmed(ndp_id, accepted, peer_ndi, app_info, status),

            FirmwareEvent::DataPathTerminated { ndp_id, status } => {
                self.on_data_path_terminated(ndp_id, status)
            }

            FirmwareEvent::IdentityChanged { address } => {
                if self.interface.identity_change_notify() {
                    self.emit(Notification::IdentityChanged { address });
                }
            }

            FirmwareEvent::InterfaceDown { status } => self.on_interface_down(status),
        }
    }

    fn tick(&mut self) {
        self.expire_transactions();
        self.expire_responses();
    }
}
