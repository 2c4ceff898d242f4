//! # Discovery Session Registry
//!
//! Owns publish/subscribe sessions from request to removal.
//!
//! A new session lives in a per-transaction pending slot until its completion
//! assigns an id. After that it is keyed by id in `sessions`, where it stays
//! until a stop completion or a firmware termination. If other operations are
//! still in flight at that point the session is kept as a `Terminated`
//! tombstone so its id cannot be handed out again until they resolve.

use std::collections::{BTreeMap, BTreeSet};

use super::capabilities::Capabilities;
use super::errors::{AwareError, FailureReason};
use super::requests::{DiscoveryConfig, SessionRole};
use super::types::{CommandKind, MacAddress, PeerInstanceId, SessionId, Timestamp, TransactionId};

/// Lifecycle of a discovery session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Start request issued, id not assigned yet.
    Pending,
    /// Running.
    Active,
    /// Stop issued.
    Terminating,
    /// Gone, kept only while operations on it are in flight.
    Terminated,
}

/// A peer seen by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerMatch {
    /// Peer handle.
    pub requestor_instance_id: PeerInstanceId,
    /// Latest peer discovery address.
    pub peer_address: MacAddress,
    /// Peer's service-specific info from the latest match.
    pub service_specific_info: Vec<u8>,
    /// Peer's match filter from the latest match.
    pub match_filter: Vec<u8>,
    /// When the peer was last heard from.
    pub last_seen: Timestamp,
}

/// One publish or subscribe session.
#[derive(Debug, Clone)]
pub struct DiscoverySession {
    /// Firmware-assigned id, [`SessionId::UNASSIGNED`] while pending.
    pub id: SessionId,
    /// Publisher or subscriber.
    pub role: SessionRole,
    /// Applied configuration.
    pub config: DiscoveryConfig,
    /// Lifecycle state.
    pub state: SessionState,
    /// Peers matched so far.
    pub matched_peers: BTreeMap<PeerInstanceId, PeerMatch>,
    in_flight: BTreeSet<TransactionId>,
    pending_update: Option<(TransactionId, DiscoveryConfig)>,
}

impl DiscoverySession {
    fn pending(config: DiscoveryConfig) -> Self {
        Self {
            id: SessionId::UNASSIGNED,
            role: config.role(),
            config,
            state: SessionState::Pending,
            matched_peers: BTreeMap::new(),
            in_flight: BTreeSet::new(),
            pending_update: None,
        }
    }

    /// Transactions still referencing this session.
    pub fn in_flight(&self) -> impl Iterator<Item = TransactionId> + '_ {
        self.in_flight.iter().copied()
    }

    /// True while an update of this session is pending.
    pub fn has_pending_update(&self) -> bool {
        self.pending_update.is_some()
    }

    fn record_peer(
        &mut self,
        peer: PeerInstanceId,
        peer_address: MacAddress,
        service_specific_info: Option<Vec<u8>>,
        match_filter: Option<Vec<u8>>,
        now: Timestamp,
    ) {
        let entry = self.matched_peers.entry(peer).or_insert_with(|| PeerMatch {
            requestor_instance_id: peer,
            peer_address,
            service_specific_info: Vec::new(),
            match_filter: Vec::new(),
            last_seen: now,
        });
        entry.peer_address = peer_address;
        entry.last_seen = now;
        if let Some(ssi) = service_specific_info {
            entry.service_specific_info = ssi;
        }
        if let Some(filter) = match_filter {
            entry.match_filter = filter;
        }
    }
}

/// What a firmware termination means for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationOutcome {
    /// Unexpected termination; notify the caller.
    Notify(SessionRole),
    /// A caller stop was already pending; its completion reports it.
    Silent,
    /// Session unknown or already gone.
    Ignored,
}

/// All discovery sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: BTreeMap<SessionId, DiscoverySession>,
    pending: BTreeMap<TransactionId, DiscoverySession>,
}

impl SessionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Start / update
    // -------------------------------------------------------------------------

    /// Check a new session of `role` fits within the firmware limits.
    pub fn check_capacity(
        &self,
        role: SessionRole,
        capabilities: Option<&Capabilities>,
    ) -> Result<(), AwareError> {
        let Some(caps) = capabilities else {
            return Ok(());
        };
        let (limit, resource) = match role {
            SessionRole::Publisher => (caps.max_publishes, "publish session"),
            SessionRole::Subscriber => (caps.max_subscribes, "subscribe session"),
        };
        let live = self
            .sessions
            .values()
            .chain(self.pending.values())
            .filter(|s| s.role == role && s.state != SessionState::Terminated)
            .count();
        if live >= limit as usize {
            return Err(AwareError::LimitExceeded { resource, limit });
        }
        Ok(())
    }

    /// Check `session_id` can take a configuration update for `role`.
    pub fn check_update(&self, session_id: SessionId, role: SessionRole) -> Result<(), AwareError> {
        let session = self.live(session_id)?;
        check_role(session, role)?;
        let operation = match role {
            SessionRole::Publisher => CommandKind::Publish,
            SessionRole::Subscriber => CommandKind::Subscribe,
        };
        if session.state == SessionState::Terminating {
            return Err(AwareError::InvalidState {
                operation,
                state: format!("session {session_id} terminating"),
            });
        }
        if session.pending_update.is_some() {
            return Err(AwareError::InvalidState {
                operation,
                state: format!("session {session_id} update pending"),
            });
        }
        Ok(())
    }

    /// Record an issued start request.
    pub fn begin_new(&mut self, txn: TransactionId, config: DiscoveryConfig) {
        self.pending.insert(txn, DiscoverySession::pending(config));
    }

    /// Apply a start completion.
    ///
    /// On success the session becomes `Active` under the assigned id. A zero
    /// or already-used id fails the start with `InvalidCompletion`.
    pub fn resolve_new(
        &mut self,
        txn: TransactionId,
        assigned: Result<SessionId, FailureReason>,
    ) -> Result<(SessionId, SessionRole), FailureReason> {
        let Some(mut session) = self.pending.remove(&txn) else {
            return Err(FailureReason::Aborted);
        };
        let id = assigned?;
        if !id.is_assigned() {
            return Err(FailureReason::InvalidCompletion("session id 0"));
        }
        if self.sessions.contains_key(&id) {
            return Err(FailureReason::InvalidCompletion("duplicate session id"));
        }
        session.id = id;
        session.state = SessionState::Active;
        let role = session.role;
        self.sessions.insert(id, session);
        Ok((id, role))
    }

    /// Record an issued update.
    pub fn begin_update(&mut self, session_id: SessionId, txn: TransactionId, config: DiscoveryConfig) {
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.in_flight.insert(txn);
            session.pending_update = Some((txn, config));
        }
    }

    /// Apply an update completion. Updates landing on a session that is
    /// being torn down are reported as aborted.
    pub fn resolve_update(
        &mut self,
        session_id: SessionId,
        txn: TransactionId,
        outcome: Result<(), FailureReason>,
    ) -> Result<(), FailureReason> {
        let Some(session) = self.sessions.get_mut(&session_id) else {
            return Err(FailureReason::Aborted);
        };
        session.in_flight.remove(&txn);
        let staged = match session.pending_update.take() {
            Some((pending_txn, config)) if pending_txn == txn => Some(config),
            other => {
                session.pending_update = other;
                None
            }
        };
        let result = if session.state != SessionState::Active {
            Err(FailureReason::Aborted)
        } else {
            outcome.map(|()| {
                if let Some(config) = staged {
                    session.config = config;
                }
            })
        };
        self.purge_if_done(session_id);
        result
    }

    // -------------------------------------------------------------------------
    // Messaging
    // -------------------------------------------------------------------------

    /// Check a message can be sent; returns the peer's address.
    pub fn check_message(
        &self,
        session_id: SessionId,
        peer: PeerInstanceId,
        payload_len: usize,
        capabilities: Option<&Capabilities>,
    ) -> Result<MacAddress, AwareError> {
        let session = self
            .sessions
            .get(&session_id)
            .filter(|s| s.state == SessionState::Active)
            .ok_or(AwareError::UnknownSession(session_id))?;
        let matched = session
            .matched_peers
            .get(&peer)
            .ok_or(AwareError::UnknownPeer { peer })?;
        if let Some(caps) = capabilities {
            if payload_len > caps.max_service_specific_info_len {
                return Err(AwareError::InvalidArgument(format!(
                    "message exceeds {} bytes",
                    caps.max_service_specific_info_len
                )));
            }
        }
        Ok(matched.peer_address)
    }

    /// Reference `session_id` from an in-flight transaction.
    pub fn attach(&mut self, session_id: SessionId, txn: TransactionId) {
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.in_flight.insert(txn);
        }
    }

    /// Drop the reference taken by [`attach`](Self::attach). Returns `false`
    /// if the session is no longer active.
    pub fn detach(&mut self, session_id: SessionId, txn: TransactionId) -> bool {
        let active = match self.sessions.get_mut(&session_id) {
            Some(session) => {
                session.in_flight.remove(&txn);
                session.state == SessionState::Active
            }
            None => false,
        };
        self.purge_if_done(session_id);
        active
    }

    // -------------------------------------------------------------------------
    // Stop
    // -------------------------------------------------------------------------

    /// Check `session_id` can be stopped by a `role` stop request.
    pub fn check_stop(&self, session_id: SessionId, role: SessionRole) -> Result<(), AwareError> {
        let session = self.live(session_id)?;
        check_role(session, role)?;
        if session.state == SessionState::Terminating {
            let operation = match role {
                SessionRole::Publisher => CommandKind::StopPublish,
                SessionRole::Subscriber => CommandKind::StopSubscribe,
            };
            return Err(AwareError::InvalidState {
                operation,
                state: format!("session {session_id} terminating"),
            });
        }
        Ok(())
    }

    /// Record an issued stop.
    pub fn begin_stop(&mut self, session_id: SessionId, txn: TransactionId) {
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.state = SessionState::Terminating;
            session.in_flight.insert(txn);
        }
    }

    /// Apply a stop completion. The session goes away whatever the outcome.
    pub fn resolve_stop(&mut self, session_id: SessionId, txn: TransactionId) -> bool {
        let Some(session) = self.sessions.get_mut(&session_id) else {
            return false;
        };
        session.in_flight.remove(&txn);
        session.state = SessionState::Terminated;
        self.purge_if_done(session_id);
        true
    }

    // -------------------------------------------------------------------------
    // Firmware events
    // -------------------------------------------------------------------------

    /// Record a match. Returns `false` if the session is not active.
    pub fn on_match(
        &mut self,
        session_id: SessionId,
        peer: PeerInstanceId,
        peer_address: MacAddress,
        service_specific_info: Vec<u8>,
        match_filter: Vec<u8>,
        now: Timestamp,
    ) -> bool {
        match self.active_mut(session_id) {
            Some(session) => {
                session.record_peer(
                    peer,
                    peer_address,
                    Some(service_specific_info),
                    Some(match_filter),
                    now,
                );
                true
            }
            None => false,
        }
    }

    /// Record an inbound message, which also proves the peer exists.
    pub fn on_message(
        &mut self,
        session_id: SessionId,
        peer: PeerInstanceId,
        peer_address: MacAddress,
        now: Timestamp,
    ) -> bool {
        match self.active_mut(session_id) {
            Some(session) => {
                session.record_peer(peer, peer_address, None, None, now);
                true
            }
            None => false,
        }
    }

    /// Apply a firmware termination.
    pub fn on_terminated(&mut self, session_id: SessionId) -> TerminationOutcome {
        let Some(session) = self.sessions.get_mut(&session_id) else {
            return TerminationOutcome::Ignored;
        };
        let outcome = match session.state {
            SessionState::Active | SessionState::Pending => TerminationOutcome::Notify(session.role),
            SessionState::Terminating => TerminationOutcome::Silent,
            SessionState::Terminated => return TerminationOutcome::Ignored,
        };
        session.state = SessionState::Terminated;
        session.matched_peers.clear();
        self.purge_if_done(session_id);
        outcome
    }

    /// Remove everything. Callers must have aborted all session transactions
    /// first. Returns the sessions that were still live.
    pub fn terminate_all(&mut self) -> Vec<(SessionId, SessionRole)> {
        self.pending.clear();
        std::mem::take(&mut self.sessions)
            .into_values()
            .filter(|s| s.state != SessionState::Terminated)
            .map(|s| (s.id, s.role))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// True if any active session matched `peer`.
    pub fn knows_peer(&self, peer: PeerInstanceId) -> bool {
        self.sessions
            .values()
            .filter(|s| s.state == SessionState::Active)
            .any(|s| s.matched_peers.contains_key(&peer))
    }

    /// Session by id (tombstones included).
    pub fn get(&self, session_id: SessionId) -> Option<&DiscoverySession> {
        self.sessions.get(&session_id)
    }

    /// Numbered sessions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &DiscoverySession> {
        self.sessions.values()
    }

    /// Number of active sessions.
    pub fn active_count(&self) -> usize {
        self.sessions
            .values()
            .filter(|s| s.state == SessionState::Active)
            .count()
    }

    /// Number of start requests awaiting an id.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// True when no session exists, pending or numbered.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty() && self.pending.is_empty()
    }

    fn live(&self, session_id: SessionId) -> Result<&DiscoverySession, AwareError> {
        self.sessions
            .get(&session_id)
            .filter(|s| s.state != SessionState::Terminated)
            .ok_or(AwareError::UnknownSession(session_id))
    }

    fn active_mut(&mut self, session_id: SessionId) -> Option<&mut DiscoverySession> {
        self.sessions
            .get_mut(&session_id)
            .filter(|s| s.state == SessionState::Active)
    }

    fn purge_if_done(&mut self, session_id: SessionId) {
        let done = self
            .sessions
            .get(&session_id)
            .is_some_and(|s| s.state == SessionState::Terminated && s.in_flight.is_empty());
        if done {
            self.sessions.remove(&session_id);
        }
    }
}

fn check_role(session: &DiscoverySession, role: SessionRole) -> Result<(), AwareError> {
    if session.role != role {
        return Err(AwareError::RoleMismatch {
            session_id: session.id,
            expected: role.as_str(),
        });
    }
    Ok(())
}
