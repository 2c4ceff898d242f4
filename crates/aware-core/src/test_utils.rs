//! Test utilities for the aware engine.
//!
//! Mock implementations of the driven ports for deterministic testing.
//! Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust
//! use aware_core::test_utils::ControllableTimeSource;
//! use aware_core::TimeSource;
//!
//! let clock = ControllableTimeSource::new(1000);
//! let handle = clock.clone();
//! handle.advance(250);
//! assert_eq!(clock.now().as_millis(), 1250);
//! ```

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::domain::{CommandKind, Timestamp, TransactionId};
use crate::ports::{FirmwareCommand, FirmwareTransport, TimeSource, TransportError};

/// A time source that returns a fixed timestamp.
#[derive(Debug, Clone)]
pub struct FixedTimeSource {
    timestamp: u64,
}

impl FixedTimeSource {
    /// Create a new fixed time source at `timestamp` milliseconds.
    pub fn new(timestamp: u64) -> Self {
        Self { timestamp }
    }

    /// Get the configured timestamp value.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.timestamp)
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ControllableTimeSource {
    time: Arc<AtomicU64>,
}

impl ControllableTimeSource {
    /// Start at `initial` milliseconds.
    pub fn new(initial: u64) -> Self {
        Self {
            time: Arc::new(AtomicU64::new(initial)),
        }
    }

    /// Move the clock forward by `millis`.
    pub fn advance(&self, millis: u64) {
        self.time.fetch_add(millis, Ordering::SeqCst);
    }
}

impl TimeSource for ControllableTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.time.load(Ordering::SeqCst))
    }
}

/// Transport that records every command and never talks to firmware.
///
/// Can be switched into a mode that refuses every command.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    issued: Mutex<Vec<(TransactionId, FirmwareCommand)>>,
    refuse: Mutex<Option<TransportError>>,
}

impl RecordingTransport {
    /// Accepting transport with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every following command with `error`, or accept again with `None`.
    pub fn refuse_with(&self, error: Option<TransportError>) {
        *self.refuse.lock() = error;
    }

    /// Everything accepted so far, in issue order.
    pub fn issued(&self) -> Vec<(TransactionId, FirmwareCommand)> {
        self.issued.lock().clone()
    }

    /// Most recently accepted command.
    pub fn last(&self) -> Option<(TransactionId, FirmwareCommand)> {
        self.issued.lock().last().cloned()
    }

    /// Number of accepted commands of `kind`.
    pub fn count_of(&self, kind: CommandKind) -> usize {
        self.issued
            .lock()
            .iter()
            .filter(|(_, command)| command.kind() == kind)
            .count()
    }

    /// Number of accepted commands.
    pub fn len(&self) -> usize {
        self.issued.lock().len()
    }

    /// True when nothing was accepted.
    pub fn is_empty(&self) -> bool {
        self.issued.lock().is_empty()
    }
}

impl FirmwareTransport for RecordingTransport {
    fn send_command(
        &self,
        transaction_id: TransactionId,
        command: &FirmwareCommand,
    ) -> Result<(), TransportError> {
        if let Some(error) = self.refuse.lock().clone() {
            return Err(error);
        }
        self.issued.lock().push((transaction_id, command.clone()));
        Ok(())
    }
}
