//! # Test Fixtures
//!
//! [`EngineHarness`] runs a real owner task against [`SimulatedFirmware`] and
//! exposes the notification stream in arrival order.

use std::sync::Arc;
use std::time::Duration;

use aware_core::{
    spawn_engine, AwareService, ChannelNotificationSink, Completion, CompletionDetail,
    EnableRequest, EngineConfig, EngineHandle, FirmwareEvent, MacAddress, Notification,
    PeerInstanceId, PublishConfig, SessionId, SimulatedFirmware, SubscribeConfig,
    SystemTimeSource, TransactionId,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Longest a test waits for a single notification.
pub const NOTIFICATION_WAIT: Duration = Duration::from_secs(2);

/// Data interface created by [`EngineHarness::with_interface`].
pub const DATA_IFACE: &str = "aware_data0";

/// A running engine with the simulator behind it.
pub struct EngineHarness {
    pub handle: EngineHandle,
    pub firmware: Arc<SimulatedFirmware>,
    notifications: mpsc::UnboundedReceiver<Notification>,
    task: JoinHandle<()>,
}

impl EngineHarness {
    /// Engine with the testing config and a default simulator.
    pub fn start() -> Self {
        Self::start_with(EngineConfig::for_testing(), |firmware| firmware)
    }

    /// Engine with `config` and a simulator adjusted by `customize`.
    pub fn start_with(
        config: EngineConfig,
        customize: impl FnOnce(SimulatedFirmware) -> SimulatedFirmware,
    ) -> Self {
        let (firmware, events) = SimulatedFirmware::channel(config.event_queue_capacity);
        let firmware = Arc::new(customize(firmware));
        let (sink, notifications) = ChannelNotificationSink::new();

        let service = AwareService::new(
            config,
            firmware.clone(),
            Arc::new(sink),
            Box::new(SystemTimeSource::new()),
        );
        let (handle, task) = spawn_engine(service, events);

        Self {
            handle,
            firmware,
            notifications,
            task,
        }
    }

    /// Engine with cached capabilities and an enabled interface.
    pub async fn enabled() -> Self {
        let mut harness = Self::start();
        harness.enable().await;
        harness
    }

    /// Enabled engine with [`DATA_IFACE`] created.
    pub async fn with_interface() -> Self {
        let mut harness = Self::enabled().await;
        let txn = harness
            .handle
            .create_interface(DATA_IFACE)
            .await
            .expect("create accepted");
        harness.expect_success(txn).await;
        harness
    }

    /// Query capabilities and enable with defaults, waiting for both.
    pub async fn enable(&mut self) {
        let caps = self.handle.get_capabilities().await.expect("query accepted");
        self.expect_success(caps).await;
        let enable = self
            .handle
            .enable_and_configure(EnableRequest::default())
            .await
            .expect("enable accepted");
        self.expect_success(enable).await;
    }

    /// Next notification, in arrival order.
    pub async fn next(&mut self) -> Notification {
        timeout(NOTIFICATION_WAIT, self.notifications.recv())
            .await
            .expect("notification within deadline")
            .expect("engine still running")
    }

    /// Notifications up to and including the completion of `txn`.
    pub async fn until_completion(&mut self, txn: TransactionId) -> Vec<Notification> {
        let mut seen = Vec::new();
        loop {
            let notification = self.next().await;
            let done = matches!(
                notification.as_completion(),
                Some(c) if c.transaction_id == txn
            );
            seen.push(notification);
            if done {
                return seen;
            }
        }
    }

    /// Completion of `txn`, skipping anything before it.
    pub async fn completion(&mut self, txn: TransactionId) -> Completion {
        let notifications = self.until_completion(txn).await;
        match notifications.last().and_then(Notification::as_completion) {
            Some(completion) => completion.clone(),
            None => panic!("no completion for {txn}"),
        }
    }

    /// Completion of `txn`, which must be a success.
    pub async fn expect_success(&mut self, txn: TransactionId) -> CompletionDetail {
        let completion = self.completion(txn).await;
        match completion.result {
            Ok(detail) => detail,
            Err(reason) => panic!("{txn} failed: {reason:?}"),
        }
    }

    /// Assert nothing arrives for `window`.
    pub async fn expect_quiet(&mut self, window: Duration) {
        if let Ok(Some(notification)) = timeout(window, self.notifications.recv()).await {
            panic!("unexpected notification: {notification:?}");
        }
    }

    /// Start a publish session and return the id the firmware assigned.
    pub async fn start_publish(&mut self, service_name: &str) -> SessionId {
        let txn = self
            .handle
            .publish(SessionId::UNASSIGNED, PublishConfig::new(service_name))
            .await
            .expect("publish accepted");
        match self.expect_success(txn).await {
            CompletionDetail::SessionStarted { session_id, .. } => session_id,
            other => panic!("unexpected publish result: {other:?}"),
        }
    }

    /// Start a subscribe session and return its id.
    pub async fn start_subscribe(&mut self, service_name: &str) -> SessionId {
        let txn = self
            .handle
            .subscribe(SessionId::UNASSIGNED, SubscribeConfig::new(service_name))
            .await
            .expect("subscribe accepted");
        match self.expect_success(txn).await {
            CompletionDetail::SessionStarted { session_id, .. } => session_id,
            other => panic!("unexpected subscribe result: {other:?}"),
        }
    }

    /// Report a match of `peer` on `session_id` and wait for it to surface.
    pub async fn match_peer(&mut self, session_id: SessionId, peer: PeerInstanceId) {
        self.firmware
            .inject(FirmwareEvent::SessionMatched {
                session_id,
                peer,
                peer_address: peer_address(peer),
                service_specific_info: Vec::new(),
                match_filter: Vec::new(),
            })
            .expect("event queued");
        match self.next().await {
            Notification::MatchFound { session_id: s, .. } if s == session_id => {}
            other => panic!("expected a match, got {other:?}"),
        }
    }

    /// Stop the owner task and wait for it.
    pub async fn stop(self) {
        self.handle.shutdown().await;
        timeout(NOTIFICATION_WAIT, self.task)
            .await
            .expect("owner task exits")
            .expect("owner task did not panic");
    }
}

/// Deterministic address for a peer handle.
pub fn peer_address(peer: PeerInstanceId) -> MacAddress {
    let [a, b, c, d] = peer.get().to_be_bytes();
    MacAddress::new([0x02, 0x00, a, b, c, d])
}
