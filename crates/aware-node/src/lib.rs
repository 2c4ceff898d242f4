//! # Aware Node Library
//!
//! Wiring for the aware daemon, exposed for testing. The entry point is the
//! `main.rs` binary.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (TOML file and environment overrides)
//! 2. Initialize telemetry
//! 3. Build the firmware transport and wrap both outbound ports in metrics
//!    decorators
//! 4. Spawn the engine owner task and the notification logger
//! 5. Query capabilities and enable the interface
//!
//! Without attached hardware the firmware transport is [`SimulatedFirmware`].

pub mod adapters;
pub mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use aware_core::{
    spawn_engine, AwareError, AwareService, ChannelNotificationSink, EnableRequest, EngineHandle,
    Notification, SimulatedFirmware, SystemTimeSource, TransactionId,
};
use aware_telemetry::{log_ndp_event, log_session_event, log_txn_event};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub use crate::adapters::{record_rejection, MeteredSink, MeteredTransport, MetricsBridge};
pub use crate::config::{load_config, load_config_with, NodeConfig, NodeConfigError};

/// A running engine with its firmware, metrics bridge and notification logger.
pub struct AwareNode {
    handle: EngineHandle,
    firmware: Arc<SimulatedFirmware>,
    bridge: Arc<MetricsBridge>,
    engine_task: JoinHandle<()>,
    notification_task: JoinHandle<()>,
}

impl AwareNode {
    /// Build the engine and spawn its tasks. Must run inside a tokio runtime.
    pub fn start(config: &NodeConfig) -> Self {
        let (firmware, events) = SimulatedFirmware::channel(config.engine.event_queue_capacity);
        let firmware = Arc::new(firmware);
        let bridge = Arc::new(MetricsBridge::new());

        let (sink, notifications) = ChannelNotificationSink::new();
        let transport = MeteredTransport::new(firmware.clone(), bridge.clone());
        let sink = MeteredSink::new(Arc::new(sink), bridge.clone());

        let service = AwareService::new(
            config.engine.clone(),
            Arc::new(transport),
            Arc::new(sink),
            Box::new(SystemTimeSource::new()),
        );
        let (handle, engine_task) = spawn_engine(service, events);
        let notification_task = tokio::spawn(log_notifications(notifications));

        info!(
            transaction_timeout_ms = config.engine.transaction_timeout_ms,
            response_grace_ms = config.engine.response_grace_ms,
            "aware node started"
        );

        Self {
            handle,
            firmware,
            bridge,
            engine_task,
            notification_task,
        }
    }

    /// Client for submitting requests.
    pub fn handle(&self) -> &EngineHandle {
        &self.handle
    }

    /// The firmware the engine talks to.
    pub fn firmware(&self) -> &Arc<SimulatedFirmware> {
        &self.firmware
    }

    /// Live session and data path counts as seen by the metrics bridge.
    pub fn metrics(&self) -> &Arc<MetricsBridge> {
        &self.bridge
    }

    /// Query capabilities, then enable the interface with `request`.
    pub async fn bootstrap(&self, request: EnableRequest) -> Result<(TransactionId, TransactionId)> {
        let capabilities = counted(self.handle.get_capabilities().await)
            .context("capability query rejected")?;
        let enable = counted(self.handle.enable_and_configure(request).await)
            .context("enable rejected")?;
        info!(%capabilities, %enable, "bootstrap submitted");
        Ok((capabilities, enable))
    }

    /// Stop the engine, aborting pending work, and wait for both tasks.
    pub async fn shutdown(self) -> Result<()> {
        let Self {
            handle,
            engine_task,
            notification_task,
            ..
        } = self;

        handle.shutdown().await;
        engine_task.await.context("engine task failed")?;
        drop(handle);
        notification_task
            .await
            .context("notification logger failed")?;
        info!("aware node stopped");
        Ok(())
    }
}

fn counted(result: Result<TransactionId, AwareError>) -> Result<TransactionId, AwareError> {
    result.inspect_err(record_rejection)
}

async fn log_notifications(mut notifications: mpsc::UnboundedReceiver<Notification>) {
    while let Some(notification) = notifications.recv().await {
        log_notification(&notification);
    }
}

fn log_notification(notification: &Notification) {
    match notification {
        Notification::Completed(completion) => log_txn_event!(
            info,
            "transaction resolved",
            completion.transaction_id,
            kind = %completion.kind,
            outcome = completion.outcome_label()
        ),
        Notification::MatchFound {
            session_id,
            peer,
            peer_address,
            ..
        } => log_session_event!(info, "match found", session_id, %peer, %peer_address),
        Notification::MessageReceived {
            session_id,
            peer,
            payload,
        } => log_session_event!(
            debug,
            "message received",
            session_id,
            %peer,
            len = payload.len()
        ),
        Notification::SessionTerminated {
            session_id, reason, ..
        } => log_session_event!(
            info,
            "session terminated",
            session_id,
            reason = reason.as_str()
        ),
        Notification::DataPathRequested {
            ndp_id,
            peer_address,
            ..
        } => log_ndp_event!(info, "data path requested", ndp_id, %peer_address),
        Notification::DataPathConfirmed {
            ndp_id, peer_ndi, ..
        } => log_ndp_event!(info, "data path confirmed", ndp_id, %peer_ndi),
        Notification::DataPathTerminated { ndp_id, reason } => log_ndp_event!(
            info,
            "data path terminated",
            ndp_id,
            reason = reason.as_str()
        ),
        Notification::IdentityChanged { address } => {
            info!(%address, "discovery identity changed")
        }
        Notification::InterfaceDown { status } => warn!(%status, "interface down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aware_core::{CommandKind, EngineConfig, FirmwareStatus};
    use std::time::Duration;

    fn test_config() -> NodeConfig {
        NodeConfig {
            engine: EngineConfig::for_testing(),
            telemetry: aware_telemetry::TelemetryConfig::default(),
            config_path: None,
        }
    }

    #[tokio::test]
    async fn test_bootstrap_enables_interface() {
        let node = AwareNode::start(&test_config());
        let (caps, enable) = node.bootstrap(EnableRequest::default()).await.unwrap();
        assert_ne!(caps, enable);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(node.handle().capabilities().is_some());
        let kinds: Vec<_> = node.firmware().issued().into_iter().map(|(_, k)| k).collect();
        assert_eq!(kinds, vec![CommandKind::Capabilities, CommandKind::Configure]);

        node.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_bootstrap_reports_rejection() {
        let node = AwareNode::start(&test_config());
        node.handle().shutdown().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let err = node.bootstrap(EnableRequest::default()).await.unwrap_err();
        assert!(err.to_string().contains("capability query rejected"));
        node.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_enable_is_logged_not_fatal() {
        let node = AwareNode::start(&test_config());
        node.firmware()
            .fail_kind(CommandKind::Configure, FirmwareStatus::new(7));

        assert!(node.bootstrap(EnableRequest::default()).await.is_ok());
        tokio::time::sleep(Duration::from_millis(50)).await;
        node.shutdown().await.unwrap();
    }
}
