use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::domain::{
    AwareError, Capabilities, CapabilityCache, CommandKind, DataInterfaceTable, DataPath,
    DataPathNegotiator, DiscoverySession, InterfaceState, NdpId, Notification, Origin,
    PendingContext, SessionId, SessionRegistry, Timestamp, TransactionId, TransactionLedger,
    TransactionRecord,
};
use crate::ports::{FirmwareCommand, FirmwareTransport, NotificationSink, TimeSource};

/// NAN control-plane engine implementing the driving ports.
///
/// Owns the ledger, the interface state machine, the session registry and
/// the data path negotiator. Commands leave through a [`FirmwareTransport`];
/// results leave through a [`NotificationSink`].
///
/// Dropping the service aborts every pending transaction.
///
/// # Example
///
/// ```rust,ignore
/// use aware_core::service::AwareService;
/// use aware_core::ports::AwareApi;
///
/// let mut service = AwareService::new(
///     EngineConfig::default(),
///     transport,
///     notifier,
///     Box::new(SystemTimeSource::new()),
/// );
/// let txn = service.enable_and_configure(EnableRequest::default())?;
/// ```
pub struct AwareService {
    pub(crate) config: EngineConfig,
    pub(crate) ledger: TransactionLedger,
    pub(crate) capabilities: CapabilityCache,
    pub(crate) interface: InterfaceState,
    pub(crate) data_interfaces: DataInterfaceTable,
    pub(crate) sessions: SessionRegistry,
    pub(crate) data_paths: DataPathNegotiator,
    pub(crate) transport: Arc<dyn FirmwareTransport>,
    pub(crate) notifier: Arc<dyn NotificationSink>,
    pub(crate) time_source: Box<dyn TimeSource>,
}

impl AwareService {
    /// Create a service with a disabled interface and empty tables.
    pub fn new(
        config: EngineConfig,
        transport: Arc<dyn FirmwareTransport>,
        notifier: Arc<dyn NotificationSink>,
        time_source: Box<dyn TimeSource>,
    ) -> Self {
        Self {
            ledger: TransactionLedger::new(
                config.max_pending_transactions,
                config.transaction_timeout_ms,
            ),
            capabilities: CapabilityCache::new(),
            interface: InterfaceState::new(),
            data_interfaces: DataInterfaceTable::new(),
            sessions: SessionRegistry::new(),
            data_paths: DataPathNegotiator::new(config.response_grace_ms),
            config,
            transport,
            notifier,
            time_source,
        }
    }

    /// Get the current timestamp from the time source.
    pub(crate) fn now(&self) -> Timestamp {
        self.time_source.now()
    }

    /// Allocate a transaction and hand `command` to the transport.
    ///
    /// A transport refusal rolls the allocation back; nothing is staged.
    pub(crate) fn issue(
        &mut self,
        command: FirmwareCommand,
        context: PendingContext,
        origin: Origin,
    ) -> Result<TransactionId, AwareError> {
        let kind = command.kind();
        let now = self.now();
        let txn = self.ledger.allocate(kind, context, origin, now)?;

        if let Err(err) = self.transport.send_command(txn, &command) {
            self.ledger.rollback(txn);
            warn!(transaction_id = %txn, kind = %kind, error = %err, "transport rejected command");
            return Err(AwareError::TransportRejected {
                kind,
                reason: err.to_string(),
            });
        }

        debug!(transaction_id = %txn, kind = %kind, "command issued");
        Ok(txn)
    }

    /// Log a synchronous rejection and pass the result through.
    pub(crate) fn traced(
        kind: CommandKind,
        result: Result<TransactionId, AwareError>,
    ) -> Result<TransactionId, AwareError> {
        if let Err(err) = &result {
            debug!(kind = %kind, reason = err.label(), error = %err, "request rejected");
        }
        result
    }

    pub(crate) fn emit(&self, notification: Notification) {
        self.notifier.notify(notification);
    }

    // -------------------------------------------------------------------------
    // Observability accessors
    // -------------------------------------------------------------------------

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Pending transactions, oldest first.
    pub fn pending_transactions(&self) -> Vec<TransactionRecord> {
        self.ledger.records()
    }

    /// Interface lifecycle and applied configuration.
    pub fn interface_state(&self) -> &InterfaceState {
        &self.interface
    }

    /// Discovery session by id.
    pub fn session(&self, session_id: SessionId) -> Option<&DiscoverySession> {
        self.sessions.get(session_id)
    }

    /// Numbered discovery sessions in id order.
    pub fn sessions(&self) -> impl Iterator<Item = &DiscoverySession> {
        self.sessions.iter()
    }

    /// Data path by id.
    pub fn data_path(&self, ndp_id: NdpId) -> Option<&DataPath> {
        self.data_paths.get(ndp_id)
    }

    /// Numbered data paths in id order.
    pub fn data_paths(&self) -> impl Iterator<Item = &DataPath> {
        self.data_paths.iter()
    }

    /// Ready data interfaces.
    pub fn interfaces(&self) -> Vec<String> {
        self.data_interfaces.ready_names()
    }

    /// Latest capability snapshot.
    pub fn capabilities(&self) -> Option<Arc<Capabilities>> {
        self.capabilities.snapshot()
    }

    /// Shared handle to the capability cache, readable from other tasks.
    pub fn capability_cache(&self) -> CapabilityCache {
        self.capabilities.clone()
    }
}

impl Drop for AwareService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
