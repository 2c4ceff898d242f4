//! # Data Path Negotiator
//!
//! ```text
//! local:  initiate --completion(id)--> Requested --confirm--> Confirmed --end--> (removed)
//! peer:   request event --> AwaitingLocalResponse --accept+confirm--> Confirmed
//!                                  |--reject----------------> Terminated
//!                                  +--grace expiry----------> Terminated (auto-reject)
//! ```
//!
//! Paths are removed only once the firmware confirms the teardown (end
//! completion or termination event) and no transaction references them.
//! Until then a `Terminated` path is a tombstone: it blocks reuse of its id
//! and swallows late confirm events.
//!
//! A confirm or termination event can overtake the initiate completion that
//! assigns the id. Such events are held back while an initiation is pending
//! and replayed once the id is known.

use std::collections::{BTreeMap, BTreeSet};

use super::capabilities::Capabilities;
use super::errors::{AwareError, FailureReason, FirmwareStatus};
use super::requests::{ChannelRequestType, InitiateRequest, RespondRequest};
use super::security::DataPathSecurityConfig;
use super::types::{CommandKind, MacAddress, NdpId, PeerInstanceId, Timestamp, TransactionId};

/// Lifecycle of one data path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataPathState {
    /// Locally initiated, waiting for the peer.
    Requested,
    /// Peer initiated, waiting for the local answer.
    AwaitingLocalResponse,
    /// Up.
    Confirmed,
    /// Down, kept only while transactions reference it.
    Terminated,
}

/// Which side asked for the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataPathOrigin {
    /// `initiate_data_path`.
    Local,
    /// Inbound request event.
    Peer,
}

/// One NAN data path.
#[derive(Debug, Clone)]
pub struct DataPath {
    /// Firmware-assigned id, unassigned while a local initiation is pending.
    pub id: NdpId,
    /// Which side asked.
    pub origin: DataPathOrigin,
    /// Peer handle, unassociated for out-of-band paths.
    pub peer_id: PeerInstanceId,
    /// Peer discovery address.
    pub peer_address: MacAddress,
    /// Local data interface carrying the path.
    pub interface_name: Option<String>,
    /// Channel policy.
    pub channel_request_type: ChannelRequestType,
    /// Requested channel in MHz.
    pub channel_mhz: Option<u32>,
    /// Security settings.
    pub security: DataPathSecurityConfig,
    /// Local app info (peer app info once confirmed).
    pub app_info: Vec<u8>,
    /// Lifecycle state.
    pub state: DataPathState,
    /// Peer data interface address, known once confirmed.
    pub peer_ndi: Option<MacAddress>,
    /// Auto-reject deadline of an unanswered peer request.
    pub response_deadline: Option<Timestamp>,
    response: Option<bool>,
    end_pending: bool,
    in_flight: BTreeSet<TransactionId>,
}

impl DataPath {
    /// True unless the path is a tombstone.
    pub fn is_live(&self) -> bool {
        self.state != DataPathState::Terminated
    }

    /// The local answer to a peer request: `Some(true)` for accept.
    pub fn response(&self) -> Option<bool> {
        self.response
    }

    /// True while an end request is pending.
    pub fn is_ending(&self) -> bool {
        self.end_pending
    }
}

/// Result of a confirm event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The path is up.
    Confirmed,
    /// Negotiation failed; the path is down.
    Rejected(FirmwareStatus),
    /// Held until a pending initiation reveals the id.
    Deferred,
    /// Late, duplicate or unknown.
    Ignored,
}

/// Result of a termination event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathTerminationOutcome {
    /// Unexpected termination; notify the caller.
    Notify,
    /// A caller end was pending; its completion reports it.
    Silent,
    /// Held until a pending initiation reveals the id.
    Deferred,
    /// Unknown or already down.
    Ignored,
}

/// Event that overtook its initiate completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredPathEvent {
    /// Confirm event.
    Confirmed {
        /// Whether the path came up.
        accepted: bool,
        /// Peer data interface address.
        peer_ndi: MacAddress,
        /// Peer app info.
        app_info: Vec<u8>,
        /// Firmware status.
        status: FirmwareStatus,
    },
    /// Termination event.
    Terminated(FirmwareStatus),
}

/// All data paths.
#[derive(Debug)]
pub struct DataPathNegotiator {
    paths: BTreeMap<NdpId, DataPath>,
    pending_initiations: BTreeMap<TransactionId, DataPath>,
    deferred: BTreeMap<NdpId, Vec<DeferredPathEvent>>,
    response_grace_ms: u64,
}

impl DataPathNegotiator {
    /// Empty negotiator auto-rejecting peer requests after `response_grace_ms`.
    pub fn new(response_grace_ms: u64) -> Self {
        Self {
            paths: BTreeMap::new(),
            pending_initiations: BTreeMap::new(),
            deferred: BTreeMap::new(),
            response_grace_ms,
        }
    }

    // -------------------------------------------------------------------------
    // Local initiation
    // -------------------------------------------------------------------------

    /// Check a new path fits the firmware limits.
    pub fn check_initiate(
        &self,
        app_info_len: usize,
        capabilities: Option<&Capabilities>,
    ) -> Result<(), AwareError> {
        let Some(caps) = capabilities else {
            return Ok(());
        };
        check_app_info(app_info_len, caps)?;
        let live = self.paths.values().filter(|p| p.is_live()).count() + self.pending_initiations.len();
        if live >= caps.max_ndp_sessions as usize {
            return Err(AwareError::LimitExceeded {
                resource: "data path",
                limit: caps.max_ndp_sessions,
            });
        }
        Ok(())
    }

    /// Record an issued initiation.
    pub fn begin_initiate(&mut self, txn: TransactionId, request: InitiateRequest) {
        self.pending_initiations.insert(
            txn,
            DataPath {
                id: NdpId::UNASSIGNED,
                origin: DataPathOrigin::Local,
                peer_id: request.peer_id,
                peer_address: request.peer_address,
                interface_name: Some(request.interface_name),
                channel_request_type: request.channel_request_type,
                channel_mhz: request.channel_mhz,
                security: request.security,
                app_info: request.app_info,
                state: DataPathState::Requested,
                peer_ndi: None,
                response_deadline: None,
                response: None,
                end_pending: false,
                in_flight: BTreeSet::new(),
            },
        );
    }

    /// Apply an initiate completion.
    pub fn resolve_initiate(
        &mut self,
        txn: TransactionId,
        assigned: Result<NdpId, FailureReason>,
    ) -> Result<NdpId, FailureReason> {
        let Some(mut path) = self.pending_initiations.remove(&txn) else {
            return Err(FailureReason::Aborted);
        };
        let result = match assigned {
            Err(reason) => Err(reason),
            Ok(id) if !id.is_assigned() => Err(FailureReason::InvalidCompletion("ndp id 0")),
            Ok(id) if self.paths.contains_key(&id) => {
                Err(FailureReason::InvalidCompletion("duplicate ndp id"))
            }
            Ok(id) => {
                path.id = id;
                self.paths.insert(id, path);
                Ok(id)
            }
        };
        if self.pending_initiations.is_empty() {
            // Anything still held back can no longer be claimed
            let keep = result.as_ref().ok().copied();
            self.deferred.retain(|id, _| Some(*id) == keep);
        }
        result
    }

    /// Events held back for `ndp_id`, in arrival order.
    pub fn take_deferred(&mut self, ndp_id: NdpId) -> Vec<DeferredPathEvent> {
        self.deferred.remove(&ndp_id).unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Peer initiation
    // -------------------------------------------------------------------------

    /// Record a peer request. Returns `false` for a duplicate id.
    pub fn on_request(
        &mut self,
        ndp_id: NdpId,
        peer_id: PeerInstanceId,
        peer_address: MacAddress,
        app_info: Vec<u8>,
        now: Timestamp,
    ) -> bool {
        if !ndp_id.is_assigned() || self.paths.contains_key(&ndp_id) {
            return false;
        }
        self.paths.insert(
            ndp_id,
            DataPath {
                id: ndp_id,
                origin: DataPathOrigin::Peer,
                peer_id,
                peer_address,
                interface_name: None,
                channel_request_type: ChannelRequestType::Available,
                channel_mhz: None,
                security: DataPathSecurityConfig::open(),
                app_info,
                state: DataPathState::AwaitingLocalResponse,
                peer_ndi: None,
                response_deadline: Some(now.add_millis(self.response_grace_ms)),
                response: None,
                end_pending: false,
                in_flight: BTreeSet::new(),
            },
        );
        true
    }

    /// Check the caller may answer `ndp_id`.
    pub fn check_respond(
        &self,
        request: &RespondRequest,
        capabilities: Option<&Capabilities>,
    ) -> Result<(), AwareError> {
        let path = self.live(request.ndp_id)?;
        if path.state != DataPathState::AwaitingLocalResponse
            || path.response.is_some()
            || path.end_pending
        {
            return Err(AwareError::InvalidState {
                operation: CommandKind::RespondDataPath,
                state: format!("data path {} not awaiting a response", request.ndp_id),
            });
        }
        if let (true, Some(caps)) = (request.accept, capabilities) {
            check_app_info(request.app_info.len(), caps)?;
        }
        Ok(())
    }

    /// Record an issued response. A reject takes the path down at once.
    pub fn begin_respond(&mut self, txn: TransactionId, request: RespondRequest) {
        let Some(path) = self.paths.get_mut(&request.ndp_id) else {
            return;
        };
        path.in_flight.insert(txn);
        path.response = Some(request.accept);
        path.response_deadline = None;
        if request.accept {
            path.interface_name = Some(request.interface_name);
            path.security = request.security;
            path.app_info = request.app_info;
        } else {
            path.state = DataPathState::Terminated;
            path.interface_name = None;
        }
    }

    /// Apply a response completion, returning whether it was an accept.
    /// A failed accept leaves the path down.
    pub fn resolve_respond(
        &mut self,
        ndp_id: NdpId,
        txn: TransactionId,
        outcome: Result<(), FailureReason>,
    ) -> Result<bool, FailureReason> {
        let Some(path) = self.paths.get_mut(&ndp_id) else {
            return Err(FailureReason::Aborted);
        };
        path.in_flight.remove(&txn);
        let accepted = path.response == Some(true);
        let result = match outcome {
            Ok(()) if accepted && !path.is_live() => Err(FailureReason::Aborted),
            Ok(()) => Ok(accepted),
            // A teardown that aborts the answer reports the path itself
            Err(FailureReason::Aborted) => Err(FailureReason::Aborted),
            Err(reason) => {
                path.state = DataPathState::Terminated;
                Err(reason)
            }
        };
        self.purge_if_done(ndp_id);
        result
    }

    /// Take down every unanswered peer request whose grace period ran out.
    ///
    /// Each path is returned exactly once; it stays as a tombstone until the
    /// caller detaches the auto-reject transaction or purges it.
    pub fn expire_responses(&mut self, now: Timestamp) -> Vec<NdpId> {
        let mut expired = Vec::new();
        for path in self.paths.values_mut() {
            let overdue = path.state == DataPathState::AwaitingLocalResponse
                && path.response_deadline.is_some_and(|deadline| deadline <= now);
            if overdue {
                path.state = DataPathState::Terminated;
                path.response_deadline = None;
                expired.push(path.id);
            }
        }
        expired
    }

    // -------------------------------------------------------------------------
    // Confirmation and teardown
    // -------------------------------------------------------------------------

    /// Apply a confirm event.
    pub fn on_confirmed(
        &mut self,
        ndp_id: NdpId,
        accepted: bool,
        peer_ndi: MacAddress,
        app_info: Vec<u8>,
        status: FirmwareStatus,
    ) -> ConfirmOutcome {
        let Some(path) = self.paths.get_mut(&ndp_id) else {
            if self.pending_initiations.is_empty() {
                return ConfirmOutcome::Ignored;
            }
            self.deferred
                .entry(ndp_id)
                .or_default()
                .push(DeferredPathEvent::Confirmed {
                    accepted,
                    peer_ndi,
                    app_info,
                    status,
                });
            return ConfirmOutcome::Deferred;
        };
        let confirmable = match path.state {
            DataPathState::Requested => true,
            DataPathState::AwaitingLocalResponse => path.response == Some(true),
            DataPathState::Confirmed | DataPathState::Terminated => false,
        };
        if !confirmable {
            return ConfirmOutcome::Ignored;
        }
        if accepted {
            path.state = DataPathState::Confirmed;
            path.peer_ndi = Some(peer_ndi);
            path.app_info = app_info;
            ConfirmOutcome::Confirmed
        } else {
            path.state = DataPathState::Terminated;
            self.purge_if_done(ndp_id);
            ConfirmOutcome::Rejected(status)
        }
    }

    /// Check the caller may end `ndp_id`.
    pub fn check_end(&self, ndp_id: NdpId) -> Result<(), AwareError> {
        let path = self.live(ndp_id)?;
        let endable = matches!(
            path.state,
            DataPathState::Confirmed | DataPathState::AwaitingLocalResponse
        );
        if !endable || path.end_pending {
            return Err(AwareError::InvalidState {
                operation: CommandKind::EndDataPath,
                state: format!("data path {ndp_id} {:?}", path.state),
            });
        }
        Ok(())
    }

    /// Record an issued end.
    pub fn begin_end(&mut self, ndp_id: NdpId, txn: TransactionId) {
        if let Some(path) = self.paths.get_mut(&ndp_id) {
            path.in_flight.insert(txn);
            path.end_pending = true;
            path.response_deadline = None;
        }
    }

    /// Apply an end completion. The path goes away whatever the outcome.
    pub fn resolve_end(&mut self, ndp_id: NdpId, txn: TransactionId) -> bool {
        let Some(path) = self.paths.get_mut(&ndp_id) else {
            return false;
        };
        path.in_flight.remove(&txn);
        path.end_pending = false;
        path.state = DataPathState::Terminated;
        self.purge_if_done(ndp_id);
        true
    }

    /// Apply a termination event.
    pub fn on_terminated(&mut self, ndp_id: NdpId, status: FirmwareStatus) -> PathTerminationOutcome {
        let Some(path) = self.paths.get_mut(&ndp_id) else {
            if self.pending_initiations.is_empty() {
                return PathTerminationOutcome::Ignored;
            }
            self.deferred
                .entry(ndp_id)
                .or_default()
                .push(DeferredPathEvent::Terminated(status));
            return PathTerminationOutcome::Deferred;
        };
        if !path.is_live() {
            return PathTerminationOutcome::Ignored;
        }
        let outcome = if path.end_pending {
            PathTerminationOutcome::Silent
        } else {
            PathTerminationOutcome::Notify
        };
        path.state = DataPathState::Terminated;
        path.response_deadline = None;
        self.purge_if_done(ndp_id);
        outcome
    }

    /// Reference `ndp_id` from an in-flight transaction.
    pub fn attach(&mut self, ndp_id: NdpId, txn: TransactionId) {
        if let Some(path) = self.paths.get_mut(&ndp_id) {
            path.in_flight.insert(txn);
        }
    }

    /// Drop a reference taken by [`attach`](Self::attach).
    pub fn detach(&mut self, ndp_id: NdpId, txn: TransactionId) {
        if let Some(path) = self.paths.get_mut(&ndp_id) {
            path.in_flight.remove(&txn);
        }
        self.purge_if_done(ndp_id);
    }

    /// Remove a tombstone nothing references any more.
    pub fn purge(&mut self, ndp_id: NdpId) {
        self.purge_if_done(ndp_id);
    }

    /// Remove everything. Callers must have aborted all path transactions
    /// first. Returns the paths that were still live.
    pub fn terminate_all(&mut self) -> Vec<NdpId> {
        self.pending_initiations.clear();
        self.deferred.clear();
        std::mem::take(&mut self.paths)
            .into_values()
            .filter(DataPath::is_live)
            .map(|p| p.id)
            .collect()
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// True if a live path (or pending initiation) uses data interface `name`.
    pub fn uses_interface(&self, name: &str) -> bool {
        self.paths
            .values()
            .filter(|p| p.is_live())
            .chain(self.pending_initiations.values())
            .any(|p| p.interface_name.as_deref() == Some(name))
    }

    /// Path by id (tombstones included).
    pub fn get(&self, ndp_id: NdpId) -> Option<&DataPath> {
        self.paths.get(&ndp_id)
    }

    /// Numbered paths in id order.
    pub fn iter(&self) -> impl Iterator<Item = &DataPath> {
        self.paths.values()
    }

    /// Number of confirmed paths.
    pub fn active_count(&self) -> usize {
        self.paths
            .values()
            .filter(|p| p.state == DataPathState::Confirmed)
            .count()
    }

    /// Number of initiations awaiting an id.
    pub fn pending_count(&self) -> usize {
        self.pending_initiations.len()
    }

    /// True when nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.pending_initiations.is_empty()
    }

    fn live(&self, ndp_id: NdpId) -> Result<&DataPath, AwareError> {
        self.paths
            .get(&ndp_id)
            .filter(|p| p.is_live())
            .ok_or(AwareError::UnknownDataPath(ndp_id))
    }

    fn purge_if_done(&mut self, ndp_id: NdpId) {
        let done = self
            .paths
            .get(&ndp_id)
            .is_some_and(|p| !p.is_live() && p.in_flight.is_empty());
        if done {
            self.paths.remove(&ndp_id);
        }
    }
}

fn check_app_info(len: usize, caps: &Capabilities) -> Result<(), AwareError> {
    if len > caps.max_app_info_len {
        return Err(AwareError::InvalidArgument(format!(
            "app info exceeds {} bytes",
            caps.max_app_info_len
        )));
    }
    Ok(())
}
