//! # Owner Task
//!
//! Runs an [`AwareService`] on a dedicated tokio task. Requests arrive over a
//! bounded channel and are answered through a oneshot; firmware events arrive
//! over a second channel; a periodic tick drives deadlines.
//!
//! ```text
//! EngineHandle --EngineCommand--> owner task <--FirmwareEvent-- transport
//!                                    |
//!                                    +--Notification--> NotificationSink
//! ```
//!
//! Firmware events are drained before new requests so a completion is never
//! overtaken by a request that depends on it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::{
    AwareError, AwareRequest, Capabilities, CapabilityCache, EnableRequest, FirmwareEvent,
    InitiateRequest, MessageRequest, NdpId, PublishConfig, RespondRequest, SessionId,
    SubscribeConfig, TransactionId,
};
use crate::ports::FirmwareEventHandler;
use crate::service::AwareService;

/// Message to the owner task.
#[derive(Debug)]
pub enum EngineCommand {
    /// Run one request and send back its synchronous result.
    Submit {
        /// The request.
        request: AwareRequest,
        /// Where the transaction id or rejection goes.
        reply: oneshot::Sender<Result<TransactionId, AwareError>>,
    },
    /// Abort everything pending and stop the task.
    Shutdown,
}

/// Cloneable client of a running engine.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<EngineCommand>,
    capabilities: CapabilityCache,
}

impl EngineHandle {
    /// Submit a request and wait for its transaction id.
    ///
    /// Returns `EngineStopped` once the owner task is gone.
    pub async fn submit(&self, request: AwareRequest) -> Result<TransactionId, AwareError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(EngineCommand::Submit { request, reply })
            .await
            .map_err(|_| AwareError::EngineStopped)?;
        response.await.map_err(|_| AwareError::EngineStopped)?
    }

    /// Query firmware capabilities.
    pub async fn get_capabilities(&self) -> Result<TransactionId, AwareError> {
        self.submit(AwareRequest::GetCapabilities).await
    }

    /// Enable or reconfigure the interface.
    pub async fn enable_and_configure(
        &self,
        request: EnableRequest,
    ) -> Result<TransactionId, AwareError> {
        self.submit(AwareRequest::EnableAndConfigure(request)).await
    }

    /// Disable the interface.
    pub async fn disable(&self) -> Result<TransactionId, AwareError> {
        self.submit(AwareRequest::Disable).await
    }

    /// Start (unassigned id) or update a publish session.
    pub async fn publish(
        &self,
        session_id: SessionId,
        config: PublishConfig,
    ) -> Result<TransactionId, AwareError> {
        self.submit(AwareRequest::Publish { session_id, config })
            .await
    }

    /// Start (unassigned id) or update a subscribe session.
    pub async fn subscribe(
        &self,
        session_id: SessionId,
        config: SubscribeConfig,
    ) -> Result<TransactionId, AwareError> {
        self.submit(AwareRequest::Subscribe { session_id, config })
            .await
    }

    /// Send a follow-up message.
    pub async fn send_message(&self, request: MessageRequest) -> Result<TransactionId, AwareError> {
        self.submit(AwareRequest::SendMessage(request)).await
    }

    /// Stop a publish session.
    pub async fn stop_publish(&self, session_id: SessionId) -> Result<TransactionId, AwareError> {
        self.submit(AwareRequest::StopPublish(session_id)).await
    }

    /// Stop a subscribe session.
    pub async fn stop_subscribe(&self, session_id: SessionId) -> Result<TransactionId, AwareError> {
        self.submit(AwareRequest::StopSubscribe(session_id)).await
    }

    /// Create a data interface.
    pub async fn create_interface(
        &self,
        name: impl Into<String>,
    ) -> Result<TransactionId, AwareError> {
        self.submit(AwareRequest::CreateInterface(name.into())).await
    }

    /// Delete a data interface.
    pub async fn delete_interface(
        &self,
        name: impl Into<String>,
    ) -> Result<TransactionId, AwareError> {
        self.submit(AwareRequest::DeleteInterface(name.into())).await
    }

    /// Initiate a data path.
    pub async fn initiate_data_path(
        &self,
        request: InitiateRequest,
    ) -> Result<TransactionId, AwareError> {
        self.submit(AwareRequest::InitiateDataPath(request)).await
    }

    /// Answer a peer data path request.
    pub async fn respond_to_data_path_request(
        &self,
        request: RespondRequest,
    ) -> Result<TransactionId, AwareError> {
        self.submit(AwareRequest::RespondToDataPathRequest(request))
            .await
    }

    /// End a data path.
    pub async fn end_data_path(&self, ndp_id: NdpId) -> Result<TransactionId, AwareError> {
        self.submit(AwareRequest::EndDataPath(ndp_id)).await
    }

    /// Latest capability snapshot, read without a round trip.
    pub fn capabilities(&self) -> Option<Arc<Capabilities>> {
        self.capabilities.snapshot()
    }

    /// Ask the owner task to abort pending work and exit.
    pub async fn shutdown(&self) {
        if self.commands.send(EngineCommand::Shutdown).await.is_err() {
            debug!("engine already stopped");
        }
    }
}

/// Move `service` onto its own task.
///
/// Queue sizes and the tick period come from the service's config. The task
/// ends on [`EngineHandle::shutdown`], when every handle is dropped, or when
/// the firmware event channel closes; in every case pending transactions are
/// aborted before it returns.
pub fn spawn_engine(
    service: AwareService,
    events: mpsc::Receiver<FirmwareEvent>,
) -> (EngineHandle, JoinHandle<()>) {
    let (commands_tx, commands_rx) = mpsc::channel(service.config().command_queue_capacity.max(1));
    let handle = EngineHandle {
        commands: commands_tx,
        capabilities: service.capability_cache(),
    };
    let task = tokio::spawn(run(service, commands_rx, events));
    (handle, task)
}

async fn run(
    mut service: AwareService,
    mut commands: mpsc::Receiver<EngineCommand>,
    mut events: mpsc::Receiver<FirmwareEvent>,
) {
    // A zero period would panic inside tokio's interval
    let tick_interval_ms = service.config().tick_interval_ms.max(1);
    let mut ticker = interval(Duration::from_millis(tick_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(tick_interval_ms, "aware engine started");

    loop {
        tokio::select! {
            biased;

            event = events.recv() => match event {
                Some(event) => {
                    debug!(event = event.name(), "firmware event");
                    service.handle_event(event);
                }
                None => {
                    warn!("firmware event channel closed");
                    break;
                }
            },

            command = commands.recv() => match command {
                Some(EngineCommand::Submit { request, reply }) => {
                    let result = service.submit(request);
                    if reply.send(result).is_err() {
                        debug!("requester went away before the reply");
                    }
                }
                Some(EngineCommand::Shutdown) => {
                    info!("shutdown requested");
                    break;
                }
                None => {
                    debug!("all engine handles dropped");
                    break;
                }
            },

            _ = ticker.tick() => service.tick(),
        }
    }

    service.shutdown();
    info!("aware engine stopped");
}
