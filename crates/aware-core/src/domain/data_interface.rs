//! NAN data interface (NDI) table.
//!
//! Names are reserved while their create is in flight and released when a
//! delete completes.

use std::collections::BTreeMap;

use super::capabilities::Capabilities;
use super::errors::AwareError;
use super::types::{CommandKind, TransactionId};

/// Lifecycle of one data interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataInterfaceState {
    /// Create issued.
    Creating(TransactionId),
    /// Usable by data paths.
    Ready,
    /// Delete issued.
    Deleting(TransactionId),
}

/// Named data interfaces.
#[derive(Debug, Clone, Default)]
pub struct DataInterfaceTable {
    interfaces: BTreeMap<String, DataInterfaceState>,
}

impl DataInterfaceTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `name` can be created.
    pub fn check_create(
        &self,
        name: &str,
        capabilities: Option<&Capabilities>,
    ) -> Result<(), AwareError> {
        if self.interfaces.contains_key(name) {
            return Err(AwareError::InterfaceExists(name.to_string()));
        }
        if let Some(caps) = capabilities {
            if self.interfaces.len() >= caps.max_ndi_interfaces as usize {
                return Err(AwareError::LimitExceeded {
                    resource: "data interface",
                    limit: caps.max_ndi_interfaces,
                });
            }
        }
        Ok(())
    }

    /// Reserve `name` for an issued create.
    pub fn begin_create(&mut self, name: String, txn: TransactionId) {
        self.interfaces
            .insert(name, DataInterfaceState::Creating(txn));
    }

    /// Apply a create completion.
    pub fn resolve_create(&mut self, name: &str, success: bool) {
        if !matches!(
            self.interfaces.get(name),
            Some(DataInterfaceState::Creating(_))
        ) {
            return;
        }
        if success {
            self.interfaces
                .insert(name.to_string(), DataInterfaceState::Ready);
        } else {
            self.interfaces.remove(name);
        }
    }

    /// Check `name` can be deleted (path usage is checked by the caller).
    pub fn check_delete(&self, name: &str) -> Result<(), AwareError> {
        match self.interfaces.get(name) {
            Some(DataInterfaceState::Ready) => Ok(()),
            Some(DataInterfaceState::Deleting(_)) => Err(AwareError::InvalidState {
                operation: CommandKind::DeleteIface,
                state: format!("interface {name:?} being deleted"),
            }),
            Some(DataInterfaceState::Creating(_)) | None => {
                Err(AwareError::UnknownInterface(name.to_string()))
            }
        }
    }

    /// Record an issued delete.
    pub fn begin_delete(&mut self, name: &str, txn: TransactionId) {
        if let Some(state) = self.interfaces.get_mut(name) {
            *state = DataInterfaceState::Deleting(txn);
        }
    }

    /// Apply a delete completion. A failed delete leaves the interface usable.
    pub fn resolve_delete(&mut self, name: &str, success: bool) {
        if !matches!(
            self.interfaces.get(name),
            Some(DataInterfaceState::Deleting(_))
        ) {
            return;
        }
        if success {
            self.interfaces.remove(name);
        } else {
            self.interfaces
                .insert(name.to_string(), DataInterfaceState::Ready);
        }
    }

    /// Require `name` to be ready for a data path.
    pub fn require_ready(&self, name: &str) -> Result<(), AwareError> {
        match self.interfaces.get(name) {
            Some(DataInterfaceState::Ready) => Ok(()),
            _ => Err(AwareError::UnknownInterface(name.to_string())),
        }
    }

    /// State of `name`.
    pub fn state(&self, name: &str) -> Option<DataInterfaceState> {
        self.interfaces.get(name).copied()
    }

    /// Names of ready interfaces.
    pub fn ready_names(&self) -> Vec<String> {
        self.interfaces
            .iter()
            .filter(|(_, state)| **state == DataInterfaceState::Ready)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Number of tracked interfaces, in any state.
    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    /// True when no interface is tracked.
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}
