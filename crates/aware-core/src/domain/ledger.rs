//! # Transaction Ledger
//!
//! Allocates 16-bit transaction ids, remembers what each pending one is for,
//! and retires it exactly once: on completion, on timeout, or on abort.
//!
//! ## Invariants
//!
//! - An id is unique among pending records. `0` is never handed out.
//! - An id is recycled only after its record left the ledger.
//! - `resolve` on an unknown id is a no-op returning
//!   [`LedgerError::StaleOrUnknownTransaction`].

use std::collections::HashMap;

use super::errors::{AwareError, LedgerError};
use super::requests::SessionRole;
use super::types::{CommandKind, NdpId, SessionId, Timestamp, TransactionId};

/// Largest number of ids that can be pending at once.
pub const MAX_TRANSACTION_IDS: usize = u16::MAX as usize;

/// The entity a pending transaction acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingContext {
    /// The interface itself (capabilities, configure, disable).
    Interface,
    /// A session the firmware has not numbered yet.
    NewSession(SessionRole),
    /// An existing session.
    Session(SessionId),
    /// A data interface.
    DataInterface(String),
    /// A locally initiated path waiting for its id.
    NewDataPath,
    /// An existing data path.
    DataPath(NdpId),
}

impl PendingContext {
    /// True if a cascading teardown has to abort this transaction.
    pub fn is_session_or_path(&self) -> bool {
        matches!(
            self,
            Self::NewSession(_) | Self::Session(_) | Self::NewDataPath | Self::DataPath(_)
        )
    }
}

/// Who issued a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// A caller request; its resolution is notified.
    Caller,
    /// Issued by the engine itself (auto-reject); resolved silently.
    Internal,
}

/// One pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    /// Handle shared with the firmware.
    pub id: TransactionId,
    /// Request kind.
    pub kind: CommandKind,
    /// When the command was handed to the transport.
    pub issued_at: Timestamp,
    /// When a synthetic timeout is produced.
    pub deadline: Timestamp,
    /// True while no completion has been applied.
    pub awaiting_completion: bool,
    /// Acceptance order, used to apply batches deterministically.
    pub sequence: u64,
    /// What the transaction acts on.
    pub context: PendingContext,
    /// Caller or engine.
    pub origin: Origin,
}

/// Pending-transaction table.
#[derive(Debug)]
pub struct TransactionLedger {
    pending: HashMap<TransactionId, TransactionRecord>,
    next_id: u16,
    next_sequence: u64,
    capacity: usize,
    timeout_ms: u64,
}

impl TransactionLedger {
    /// Create a ledger holding at most `capacity` pending records, each
    /// expiring `timeout_ms` after issue.
    pub fn new(capacity: usize, timeout_ms: u64) -> Self {
        Self {
            pending: HashMap::new(),
            next_id: 1,
            next_sequence: 0,
            capacity: capacity.clamp(1, MAX_TRANSACTION_IDS),
            timeout_ms,
        }
    }

    /// Reserve a fresh id.
    pub fn allocate(
        &mut self,
        kind: CommandKind,
        context: PendingContext,
        origin: Origin,
        now: Timestamp,
    ) -> Result<TransactionId, AwareError> {
        if self.pending.len() >= self.capacity {
            return Err(AwareError::ExhaustedIdSpace {
                pending: self.pending.len(),
            });
        }

        // Fewer than 65535 ids are pending, so a free one exists
        let mut candidate = self.next_id;
        while candidate == 0 || self.pending.contains_key(&TransactionId::new(candidate)) {
            candidate = candidate.wrapping_add(1);
        }
        self.next_id = candidate.wrapping_add(1);

        let id = TransactionId::new(candidate);
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.pending.insert(
            id,
            TransactionRecord {
                id,
                kind,
                issued_at: now,
                deadline: now.add_millis(self.timeout_ms),
                awaiting_completion: true,
                sequence,
                context,
                origin,
            },
        );
        Ok(id)
    }

    /// Undo an allocation whose command never left (transport rejected it).
    pub fn rollback(&mut self, id: TransactionId) {
        self.pending.remove(&id);
    }

    /// Retire the record for a completion.
    pub fn resolve(&mut self, id: TransactionId) -> Result<TransactionRecord, LedgerError> {
        self.pending
            .remove(&id)
            .map(retire)
            .ok_or(LedgerError::StaleOrUnknownTransaction(id))
    }

    /// Retire every record whose deadline has passed, oldest first.
    pub fn expire(&mut self, now: Timestamp) -> Vec<TransactionRecord> {
        self.drain_where(|record| record.deadline <= now)
    }

    /// Retire every record matching `predicate`, oldest first.
    pub fn drain_where<F>(&mut self, mut predicate: F) -> Vec<TransactionRecord>
    where
        F: FnMut(&TransactionRecord) -> bool,
    {
        let ids: Vec<TransactionId> = self
            .pending
            .values()
            .filter(|record| predicate(record))
            .map(|record| record.id)
            .collect();
        let mut drained: Vec<TransactionRecord> = ids
            .into_iter()
            .filter_map(|id| self.pending.remove(&id))
            .map(retire)
            .collect();
        drained.sort_by_key(|record| record.sequence);
        drained
    }

    /// Retire everything, oldest first.
    pub fn drain_all(&mut self) -> Vec<TransactionRecord> {
        self.drain_where(|_| true)
    }

    /// Pending record for `id`.
    pub fn get(&self, id: TransactionId) -> Option<&TransactionRecord> {
        self.pending.get(&id)
    }

    /// True while `id` is pending.
    pub fn is_pending(&self, id: TransactionId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Pending records, oldest first.
    pub fn records(&self) -> Vec<TransactionRecord> {
        let mut records: Vec<_> = self.pending.values().cloned().collect();
        records.sort_by_key(|record| record.sequence);
        records
    }

    /// Number of pending records.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

fn retire(mut record: TransactionRecord) -> TransactionRecord {
    record.awaiting_completion = false;
    record
}
