use tracing::{debug, info, warn};

use crate::domain::{
    CommandKind, FailureReason, FirmwareStatus, Notification, Origin, PendingContext,
    RespondRequest, TerminationReason,
};
use crate::ports::FirmwareCommand;
use crate::service::AwareService;

impl AwareService {
    /// Tear down every session and data path.
    ///
    /// Pending session and path transactions resolve as `Aborted` first, then
    /// one termination notification goes out per entity that was still live.
    pub(crate) fn cascade_teardown(&mut self, reason: TerminationReason) {
        let aborted = self
            .ledger
            .drain_where(|record| record.context.is_session_or_path());
        let aborted_count = aborted.len();
        for record in aborted {
            self.apply_completion(record, Err(FailureReason::Aborted));
        }

        let sessions = self.sessions.terminate_all();
        let paths = self.data_paths.terminate_all();
        info!(
            reason = reason.as_str(),
            aborted = aborted_count,
            sessions = sessions.len(),
            data_paths = paths.len(),
            "cascading teardown"
        );

        for (session_id, role) in sessions {
            self.emit(Notification::SessionTerminated {
                session_id,
                role,
                reason,
            });
        }
        for ndp_id in paths {
            self.emit(Notification::DataPathTerminated { ndp_id, reason });
        }
    }

    /// The firmware disabled the interface on its own.
    pub(crate) fn on_interface_down(&mut self, status: FirmwareStatus) {
        if !self.interface.force_down() {
            debug!(status = %status, "interface down while already disabled");
            return;
        }
        warn!(status = %status, "interface down");

        let superseded = self
            .ledger
            .drain_where(|r| matches!(r.kind, CommandKind::Configure | CommandKind::Disable));
        for record in superseded {
            self.apply_completion(record, Err(FailureReason::Aborted));
        }
        self.cascade_teardown(TerminationReason::InterfaceDown);
        self.emit(Notification::InterfaceDown { status });
    }

    /// Resolve every overdue transaction as `Timeout`.
    ///
    /// Call from a timer task. Returns how many transactions expired.
    pub fn expire_transactions(&mut self) -> usize {
        let now = self.now();
        let expired = self.ledger.expire(now);
        let count = expired.len();
        for record in expired {
            warn!(transaction_id = %record.id, kind = %record.kind, "transaction timed out");
            self.apply_completion(record, Err(FailureReason::Timeout));
        }
        count
    }

    /// Auto-reject peer data path requests nobody answered in time.
    ///
    /// Each expired path is reported once and a reject is issued on the
    /// caller's behalf. Returns how many paths expired.
    pub fn expire_responses(&mut self) -> usize {
        let now = self.now();
        let expired = self.data_paths.expire_responses(now);
        let count = expired.len();
        for ndp_id in expired {
            info!(ndp_id = %ndp_id, "data path request unanswered, rejecting");
            self.emit(Notification::DataPathTerminated {
                ndp_id,
                reason: TerminationReason::ResponseTimeout,
            });

            let command = FirmwareCommand::RespondToDataPathRequest {
                request: RespondRequest::reject(ndp_id),
                capabilities: self.capabilities.snapshot(),
            };
            match self.issue(command, PendingContext::DataPath(ndp_id), Origin::Internal) {
                Ok(txn) => self.data_paths.attach(ndp_id, txn),
                Err(err) => {
                    warn!(ndp_id = %ndp_id, error = %err, "auto-reject not issued");
                    self.data_paths.purge(ndp_id);
                }
            }
        }
        count
    }

    /// Abort every pending transaction, one `Aborted` completion each.
    ///
    /// Runs automatically on drop. Safe to call more than once.
    pub fn shutdown(&mut self) {
        let pending = self.ledger.drain_all();
        if pending.is_empty() {
            return;
        }
        info!(pending = pending.len(), "aborting pending transactions");
        for record in pending {
            self.apply_completion(record, Err(FailureReason::Aborted));
        }
    }
}
