//! In-process firmware stand-in.
//!
//! Answers every command by queueing the completion (and, for data paths,
//! the follow-up confirm or termination) onto the engine's event channel.
//! Used by the node binary when no hardware is attached, and by tests.

use std::collections::{HashMap, HashSet, VecDeque};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, trace, warn};

use crate::domain::{
    Capabilities, CommandKind, CompletionPayload, FirmwareEvent, FirmwareStatus, MacAddress,
    NdpId, SessionId, TransactionId,
};
use crate::ports::{FirmwareCommand, FirmwareTransport, TransportError};

/// Most recent commands kept by [`SimulatedFirmware::issued`].
pub const ISSUED_HISTORY_LEN: usize = 1024;

#[derive(Debug)]
struct SimulatorState {
    next_session: u8,
    next_ndp: u32,
    failures: HashMap<CommandKind, FirmwareStatus>,
    silenced: HashSet<CommandKind>,
    issued: VecDeque<(TransactionId, CommandKind)>,
}

impl SimulatorState {
    fn allocate_session(&mut self) -> SessionId {
        let id = SessionId::new(self.next_session);
        self.next_session = self.next_session.checked_add(1).unwrap_or(1);
        id
    }

    fn record(&mut self, transaction_id: TransactionId, kind: CommandKind) {
        if self.issued.len() == ISSUED_HISTORY_LEN {
            self.issued.pop_front();
        }
        self.issued.push_back((transaction_id, kind));
    }

    fn allocate_ndp(&mut self) -> NdpId {
        let id = NdpId::new(self.next_ndp);
        self.next_ndp = self.next_ndp.checked_add(1).unwrap_or(1);
        id
    }
}

/// Simulated firmware behind the [`FirmwareTransport`] port.
#[derive(Debug)]
pub struct SimulatedFirmware {
    events: mpsc::Sender<FirmwareEvent>,
    capabilities: Capabilities,
    local_ndi: MacAddress,
    auto_confirm: bool,
    state: Mutex<SimulatorState>,
}

impl SimulatedFirmware {
    /// Simulator feeding `events`, with default capabilities and auto-confirm on.
    pub fn new(events: mpsc::Sender<FirmwareEvent>) -> Self {
        Self {
            events,
            capabilities: Capabilities::default(),
            local_ndi: MacAddress::new([0x02, 0xa5, 0x00, 0x00, 0x00, 0x01]),
            auto_confirm: true,
            state: Mutex::new(SimulatorState {
                next_session: 1,
                next_ndp: 1,
                failures: HashMap::new(),
                silenced: HashSet::new(),
                issued: VecDeque::with_capacity(ISSUED_HISTORY_LEN),
            }),
        }
    }

    /// Simulator plus the receiver the engine should drain.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<FirmwareEvent>) {
        let (events_tx, events_rx) = mpsc::channel(capacity.max(1));
        (Self::new(events_tx), events_rx)
    }

    /// Report `capabilities` to capability queries.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Whether initiate and accept are followed by a positive confirm.
    #[must_use]
    pub fn with_auto_confirm(mut self, auto_confirm: bool) -> Self {
        self.auto_confirm = auto_confirm;
        self
    }

    /// Complete every later command of `kind` with `status`.
    pub fn fail_kind(&self, kind: CommandKind, status: FirmwareStatus) {
        let mut state = self.state.lock();
        state.silenced.remove(&kind);
        state.failures.insert(kind, status);
    }

    /// Never complete later commands of `kind`.
    pub fn silence_kind(&self, kind: CommandKind) {
        let mut state = self.state.lock();
        state.failures.remove(&kind);
        state.silenced.insert(kind);
    }

    /// Undo [`fail_kind`](Self::fail_kind) and [`silence_kind`](Self::silence_kind).
    pub fn restore(&self, kind: CommandKind) {
        let mut state = self.state.lock();
        state.failures.remove(&kind);
        state.silenced.remove(&kind);
    }

    /// Accepted commands, oldest first, up to [`ISSUED_HISTORY_LEN`] of them.
    pub fn issued(&self) -> Vec<(TransactionId, CommandKind)> {
        self.state.lock().issued.iter().copied().collect()
    }

    /// Queue an unsolicited event, as if the firmware raised it.
    pub fn inject(&self, event: FirmwareEvent) -> Result<(), TransportError> {
        self.push(event)
    }

    fn push(&self, event: FirmwareEvent) -> Result<(), TransportError> {
        self.events.try_send(event).map_err(|err| match err {
            TrySendError::Full(_) | TrySendError::Closed(_) => TransportError::Unavailable,
        })
    }

    fn respond(
        &self,
        state: &mut SimulatorState,
        command: &FirmwareCommand,
    ) -> (CompletionPayload, Option<FirmwareEvent>) {
        match command {
            FirmwareCommand::GetCapabilities => (
                CompletionPayload::Capabilities(self.capabilities.clone()),
                None,
            ),
            FirmwareCommand::Publish { session_id, .. }
            | FirmwareCommand::Subscribe { session_id, .. } => {
                if session_id.is_assigned() {
                    (CompletionPayload::Empty, None)
                } else {
                    (CompletionPayload::SessionId(state.allocate_session()), None)
                }
            }
            FirmwareCommand::InitiateDataPath { request, .. } => {
                let ndp_id = state.allocate_ndp();
                let confirm = self.auto_confirm.then(|| FirmwareEvent::DataPathConfirmed {
                    ndp_id,
                    accepted: true,
                    peer_ndi: request.peer_address,
                    app_info: Vec::new(),
                    status: FirmwareStatus::SUCCESS,
                });
                (CompletionPayload::NdpId(ndp_id), confirm)
            }
            FirmwareCommand::RespondToDataPathRequest { request, .. } => {
                let confirm = (self.auto_confirm && request.accept).then(|| {
                    FirmwareEvent::DataPathConfirmed {
                        ndp_id: request.ndp_id,
                        accepted: true,
                        peer_ndi: self.local_ndi,
                        app_info: Vec::new(),
                        status: FirmwareStatus::SUCCESS,
                    }
                });
                (CompletionPayload::Empty, confirm)
            }
            FirmwareCommand::EndDataPath(ndp_id) => (
                CompletionPayload::Empty,
                Some(FirmwareEvent::DataPathTerminated {
                    ndp_id: *ndp_id,
                    status: FirmwareStatus::SUCCESS,
                }),
            ),
            FirmwareCommand::EnableAndConfigure { .. }
            | FirmwareCommand::Disable
            | FirmwareCommand::TransmitFollowup { .. }
            | FirmwareCommand::StopPublish(_)
            | FirmwareCommand::StopSubscribe(_)
            | FirmwareCommand::CreateDataInterface(_)
            | FirmwareCommand::DeleteDataInterface(_) => (CompletionPayload::Empty, None),
        }
    }
}

impl FirmwareTransport for SimulatedFirmware {
    fn send_command(
        &self,
        transaction_id: TransactionId,
        command: &FirmwareCommand,
    ) -> Result<(), TransportError> {
        let kind = command.kind();
        if self.events.capacity() < 2 {
            return Err(TransportError::Unavailable);
        }

        let mut state = self.state.lock();
        if state.silenced.contains(&kind) {
            state.record(transaction_id, kind);
            debug!(transaction_id = %transaction_id, kind = %kind, "simulated firmware stays silent");
            return Ok(());
        }

        // Slots are reserved before anything is queued, so a command is
        // either delivered with its follow-up or not at all
        let completion_slot = self
            .events
            .try_reserve()
            .map_err(|_| TransportError::Unavailable)?;

        if let Some(status) = state.failures.get(&kind).copied() {
            state.record(transaction_id, kind);
            completion_slot.send(FirmwareEvent::CommandCompleted {
                transaction_id,
                outcome: Err(status),
            });
            return Ok(());
        }

        let (payload, follow_up) = self.respond(&mut state, command);
        let follow_up = match follow_up {
            Some(event) => match self.events.try_reserve() {
                Ok(slot) => Some((slot, event)),
                Err(_) => {
                    warn!(transaction_id = %transaction_id, kind = %kind, "no room for follow-up event");
                    return Err(TransportError::Unavailable);
                }
            },
            None => None,
        };
        state.record(transaction_id, kind);
        drop(state);
        trace!(transaction_id = %transaction_id, kind = %kind, "simulated completion queued");

        completion_slot.send(FirmwareEvent::CommandCompleted {
            transaction_id,
            outcome: Ok(payload),
        });
        if let Some((slot, event)) = follow_up {
            slot.send(event);
        }
        Ok(())
    }
}
