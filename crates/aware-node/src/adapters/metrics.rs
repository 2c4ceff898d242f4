//! Prometheus bridge.
//!
//! The engine knows nothing about metrics. These decorators sit on its two
//! outbound ports: the transport side records what was issued and when, the
//! sink side turns completions and lifecycle notifications into counters,
//! gauges and latency observations.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use aware_core::{
    AwareError, CommandKind, Completion, CompletionDetail, FirmwareCommand, FirmwareTransport,
    NdpId, Notification, NotificationSink, SessionId, TransactionId, TransportError,
};
use aware_telemetry::{
    metric_inc, metric_observe, DATA_PATHS_ACTIVE, DISCOVERY_SESSIONS_ACTIVE, MATCHES_TOTAL,
    SUBMISSIONS_REJECTED, TRANSACTIONS_COMPLETED, TRANSACTIONS_ISSUED, TRANSACTION_LATENCY,
};
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy)]
struct InFlight {
    kind: CommandKind,
    issued_at: Instant,
    session_id: Option<SessionId>,
    ndp_id: Option<NdpId>,
}

#[derive(Debug, Default)]
struct BridgeState {
    // Keyed by id; a reused id overwrites, which bounds the map.
    in_flight: HashMap<TransactionId, InFlight>,
    sessions: HashSet<SessionId>,
    data_paths: HashSet<NdpId>,
}

/// State shared by [`MeteredTransport`] and [`MeteredSink`].
#[derive(Debug, Default)]
pub struct MetricsBridge {
    state: Mutex<BridgeState>,
}

impl MetricsBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions currently counted as active.
    pub fn active_sessions(&self) -> usize {
        self.state.lock().sessions.len()
    }

    /// Data paths currently counted as confirmed.
    pub fn active_data_paths(&self) -> usize {
        self.state.lock().data_paths.len()
    }

    fn record_issue(&self, transaction_id: TransactionId, command: &FirmwareCommand) {
        let (session_id, ndp_id) = match command {
            FirmwareCommand::StopPublish(id) | FirmwareCommand::StopSubscribe(id) => {
                (Some(*id), None)
            }
            FirmwareCommand::EndDataPath(id) => (None, Some(*id)),
            _ => (None, None),
        };
        self.state.lock().in_flight.insert(
            transaction_id,
            InFlight {
                kind: command.kind(),
                issued_at: Instant::now(),
                session_id,
                ndp_id,
            },
        );
    }

    fn record_notification(&self, notification: &Notification) {
        let mut state = self.state.lock();
        match notification {
            Notification::Completed(completion) => state.complete(completion),
            Notification::MatchFound { .. } => metric_inc!(MATCHES_TOTAL),
            Notification::SessionTerminated { session_id, .. } => {
                state.sessions.remove(session_id);
            }
            Notification::DataPathConfirmed { ndp_id, .. } => {
                state.data_paths.insert(*ndp_id);
            }
            Notification::DataPathTerminated { ndp_id, .. } => {
                state.data_paths.remove(ndp_id);
            }
            _ => {}
        }
        DISCOVERY_SESSIONS_ACTIVE.set(gauge_value(state.sessions.len()));
        DATA_PATHS_ACTIVE.set(gauge_value(state.data_paths.len()));
    }
}

impl BridgeState {
    fn complete(&mut self, completion: &Completion) {
        let kind = completion.kind.as_str();
        metric_inc!(TRANSACTIONS_COMPLETED, &[kind, completion.outcome_label()]);

        let record = self.in_flight.remove(&completion.transaction_id);
        if let Some(record) = record.filter(|r| r.kind == completion.kind) {
            metric_observe!(
                TRANSACTION_LATENCY,
                &[kind],
                record.issued_at.elapsed().as_secs_f64()
            );
            // Stop and end remove their target whatever the outcome
            if let Some(session_id) = record.session_id {
                self.sessions.remove(&session_id);
            }
            if let Some(ndp_id) = record.ndp_id {
                self.data_paths.remove(&ndp_id);
            }
        }

        match &completion.result {
            Ok(CompletionDetail::SessionStarted { session_id, .. }) => {
                self.sessions.insert(*session_id);
            }
            Ok(CompletionDetail::Disabled) => {
                self.sessions.clear();
                self.data_paths.clear();
            }
            _ => {}
        }
    }
}

fn gauge_value(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

/// Count a request refused at submission.
pub fn record_rejection(error: &AwareError) {
    metric_inc!(SUBMISSIONS_REJECTED, &[error.label()]);
}

/// Transport decorator counting issued commands.
pub struct MeteredTransport {
    inner: Arc<dyn FirmwareTransport>,
    bridge: Arc<MetricsBridge>,
}

impl MeteredTransport {
    pub fn new(inner: Arc<dyn FirmwareTransport>, bridge: Arc<MetricsBridge>) -> Self {
        Self { inner, bridge }
    }
}

impl FirmwareTransport for MeteredTransport {
    fn send_command(
        &self,
        transaction_id: TransactionId,
        command: &FirmwareCommand,
    ) -> Result<(), TransportError> {
        self.bridge.record_issue(transaction_id, command);
        match self.inner.send_command(transaction_id, command) {
            Ok(()) => {
                metric_inc!(TRANSACTIONS_ISSUED, &[command.kind().as_str()]);
                Ok(())
            }
            Err(e) => {
                self.bridge.state.lock().in_flight.remove(&transaction_id);
                Err(e)
            }
        }
    }
}

/// Sink decorator turning notifications into metrics before forwarding them.
pub struct MeteredSink {
    inner: Arc<dyn NotificationSink>,
    bridge: Arc<MetricsBridge>,
}

impl MeteredSink {
    pub fn new(inner: Arc<dyn NotificationSink>, bridge: Arc<MetricsBridge>) -> Self {
        Self { inner, bridge }
    }
}

impl NotificationSink for MeteredSink {
    fn notify(&self, notification: Notification) {
        self.bridge.record_notification(&notification);
        self.inner.notify(notification);
    }
}
