//! # Configuration State Machine
//!
//! ```text
//! Disabled --enable--> Enabling --ok--> Enabled --disable--> Disabling --ok--> Disabled
//!                         |                |  ^                  |
//!                         +--fail--> Disabled  |                  +--fail--> Enabled
//!                                  reconfigure |
//!                                          Reconfiguring --ok/fail--> Enabled
//! ```
//!
//! The applied configuration only changes on a successful completion. A
//! failed reconfigure keeps the previous one.

use std::fmt;

use super::errors::AwareError;
use super::requests::{ConfigRequest, EnableRequest};
use super::types::CommandKind;

/// Lifecycle phase of the interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterfacePhase {
    /// Not running.
    #[default]
    Disabled,
    /// Initial configuration issued.
    Enabling,
    /// Running.
    Enabled,
    /// Update-in-place issued.
    Reconfiguring,
    /// Disable issued.
    Disabling,
}

impl InterfacePhase {
    /// Lower-case label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Enabling => "enabling",
            Self::Enabled => "enabled",
            Self::Reconfiguring => "reconfiguring",
            Self::Disabling => "disabling",
        }
    }
}

impl fmt::Display for InterfacePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interface lifecycle and applied configuration.
#[derive(Debug, Clone, Default)]
pub struct InterfaceState {
    phase: InterfacePhase,
    applied: Option<EnableRequest>,
    staged: Option<EnableRequest>,
}

impl InterfaceState {
    /// A disabled interface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> InterfacePhase {
        self.phase
    }

    /// True only in [`InterfacePhase::Enabled`].
    pub fn is_enabled(&self) -> bool {
        self.phase == InterfacePhase::Enabled
    }

    /// True in `Enabled` or `Disabled`, the two non-transitional phases.
    pub fn is_quiescent(&self) -> bool {
        matches!(self.phase, InterfacePhase::Enabled | InterfacePhase::Disabled)
    }

    /// Applied cluster configuration.
    pub fn config(&self) -> Option<&ConfigRequest> {
        self.applied.as_ref().map(|r| &r.config)
    }

    /// Full applied enable request.
    pub fn applied(&self) -> Option<&EnableRequest> {
        self.applied.as_ref()
    }

    /// Whether identity changes are reported.
    pub fn identity_change_notify(&self) -> bool {
        self.applied
            .as_ref()
            .is_some_and(|r| r.notify_identity_change)
    }

    /// Whether ranging is enabled.
    pub fn ranging_enabled(&self) -> bool {
        self.applied.as_ref().is_some_and(|r| r.ranging_enabled)
    }

    /// Instant communication channel, if that mode is on.
    pub fn instant_mode_channel(&self) -> Option<u32> {
        self.applied
            .as_ref()
            .and_then(|r| r.instant_communication)
            .map(|m| m.channel_mhz)
    }

    /// MAC randomization interval in seconds.
    pub fn mac_randomization_interval_sec(&self) -> u32 {
        self.applied
            .as_ref()
            .map_or(0, |r| r.mac_randomization_interval_sec)
    }

    /// Gate for operations that need a running interface.
    pub fn require_enabled(&self, operation: CommandKind) -> Result<(), AwareError> {
        if self.is_enabled() {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    /// Gate for operations allowed only outside transitions.
    pub fn require_quiescent(&self, operation: CommandKind) -> Result<(), AwareError> {
        if self.is_quiescent() {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    /// Check an enable may start. Returns `true` for an initial configuration.
    pub fn check_enable(&self) -> Result<bool, AwareError> {
        match self.phase {
            InterfacePhase::Disabled => Ok(true),
            InterfacePhase::Enabled => Ok(false),
            _ => Err(self.invalid(CommandKind::Configure)),
        }
    }

    /// Record an issued enable.
    pub fn begin_enable(&mut self, request: EnableRequest) {
        self.phase = match self.phase {
            InterfacePhase::Disabled => InterfacePhase::Enabling,
            _ => InterfacePhase::Reconfiguring,
        };
        self.staged = Some(request);
    }

    /// Apply an enable completion.
    ///
    /// Returns `Some(initial)` when the completion matched a pending enable,
    /// `None` if the interface has since left the transitional phase.
    pub fn complete_enable(&mut self, success: bool) -> Option<bool> {
        let initial = match self.phase {
            InterfacePhase::Enabling => true,
            InterfacePhase::Reconfiguring => false,
            _ => return None,
        };
        let staged = self.staged.take();
        if success {
            self.applied = staged;
            self.phase = InterfacePhase::Enabled;
        } else if initial {
            self.phase = InterfacePhase::Disabled;
        } else {
            self.phase = InterfacePhase::Enabled;
        }
        Some(initial)
    }

    /// Check a disable may start.
    pub fn check_disable(&self) -> Result<(), AwareError> {
        self.require_enabled(CommandKind::Disable)
    }

    /// Record an issued disable.
    pub fn begin_disable(&mut self) {
        self.phase = InterfacePhase::Disabling;
    }

    /// Apply a disable completion. Returns `true` if the interface went down.
    pub fn complete_disable(&mut self, success: bool) -> bool {
        if self.phase != InterfacePhase::Disabling {
            return false;
        }
        if success {
            self.phase = InterfacePhase::Disabled;
            self.applied = None;
            true
        } else {
            self.phase = InterfacePhase::Enabled;
            false
        }
    }

    /// The firmware dropped the interface. Returns `true` if it was up or in transition.
    pub fn force_down(&mut self) -> bool {
        let was_up = self.phase != InterfacePhase::Disabled;
        self.phase = InterfacePhase::Disabled;
        self.applied = None;
        self.staged = None;
        was_up
    }

    fn invalid(&self, operation: CommandKind) -> AwareError {
        AwareError::InvalidState {
            operation,
            state: format!("interface {}", self.phase),
        }
    }
}
