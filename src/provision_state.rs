//! Provision State Machine
//!
//! Tracks how far a provisioning run has progressed and refuses any
//! transition that would skip a step or run one twice.
//!
//! # Stage Flow
//!
//! ```text
//! Start
//!     ↓
//! PrivilegeChecked
//!     ↓
//! IndexRefreshed
//!     ↓
//! PackagesInstalled
//!     ↓
//! Reported
//!
//! (Any non-terminal stage can transition to Failed)
//! ```

use serde::Serialize;
use strum::{Display, EnumIter};
use thiserror::Error;

/// Provisioning stages in sequential order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[derive(Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ProvisionStage {
    /// Nothing has run yet
    #[strum(serialize = "Not started")]
    Start = 0,

    /// Effective uid confirmed (or the check was explicitly skipped)
    #[strum(serialize = "Privileges checked")]
    PrivilegeChecked = 1,

    /// `apt-get update` succeeded
    #[strum(serialize = "Package index refreshed")]
    IndexRefreshed = 2,

    /// `apt-get install` succeeded
    #[strum(serialize = "Packages installed")]
    PackagesInstalled = 3,

    /// Confirmation written (terminal state)
    #[strum(serialize = "Reported")]
    Reported = 4,

    /// A step failed (terminal state)
    #[strum(serialize = "Failed")]
    Failed = 255,
}

impl ProvisionStage {
    /// Returns the numeric order of this stage (0-4, 255 for Failed)
    #[inline]
    pub const fn order(self) -> u8 {
        self as u8
    }

    /// Returns true if this is a terminal state (Reported or Failed)
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Reported | Self::Failed)
    }

    /// Returns the next stage in the sequence, or None if at a terminal state
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Start => Some(Self::PrivilegeChecked),
            Self::PrivilegeChecked => Some(Self::IndexRefreshed),
            Self::IndexRefreshed => Some(Self::PackagesInstalled),
            Self::PackagesInstalled => Some(Self::Reported),
            Self::Reported | Self::Failed => None,
        }
    }
}

/// Errors that can occur during state transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// Attempted to skip one or more stages
    #[error("Cannot skip from {from} to {to}")]
    SkippedStage {
        from: ProvisionStage,
        to: ProvisionStage,
    },

    /// Attempted to go backwards
    #[error("Cannot go backwards from {from} to {to}")]
    BackwardTransition {
        from: ProvisionStage,
        to: ProvisionStage,
    },

    /// Attempted to transition from a terminal state
    #[error("Cannot transition from terminal state {from}")]
    FromTerminalState { from: ProvisionStage },

    /// Attempted to transition to the same state
    #[error("Already at stage {stage}")]
    AlreadyAtStage { stage: ProvisionStage },
}

/// Owns the current stage of one provisioning run.
///
/// ```
/// use sshd_prep::provision_state::{ProvisionContext, ProvisionStage};
///
/// let mut ctx = ProvisionContext::new();
/// ctx.transition_to(ProvisionStage::PrivilegeChecked).unwrap();
///
/// // Cannot install before the index is refreshed
/// assert!(ctx.transition_to(ProvisionStage::PackagesInstalled).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ProvisionContext {
    current: ProvisionStage,
    failed_at: Option<ProvisionStage>,
    history: Vec<ProvisionStage>,
}

impl Default for ProvisionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ProvisionContext {
    /// Create a new context in the Start state.
    pub fn new() -> Self {
        Self {
            current: ProvisionStage::Start,
            failed_at: None,
            history: Vec::with_capacity(5),
        }
    }

    #[inline]
    pub fn current_stage(&self) -> ProvisionStage {
        self.current
    }

    /// Returns the stage at which failure occurred, if any
    #[inline]
    pub fn failed_at(&self) -> Option<ProvisionStage> {
        self.failed_at
    }

    #[inline]
    pub fn is_reported(&self) -> bool {
        self.current == ProvisionStage::Reported
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        self.current == ProvisionStage::Failed
    }

    /// Stages entered so far, in order.
    pub fn history(&self) -> &[ProvisionStage] {
        &self.history
    }

    /// Transition to `target`, which must be the immediate next stage.
    ///
    /// # Errors
    ///
    /// - `FromTerminalState` if current is Reported or Failed
    /// - `AlreadyAtStage` if target is the current stage
    /// - `BackwardTransition` if target is before current
    /// - `SkippedStage` if target is not the immediate next stage
    pub fn transition_to(
        &mut self,
        target: ProvisionStage,
    ) -> Result<ProvisionStage, TransitionError> {
        if self.current.is_terminal() {
            return Err(TransitionError::FromTerminalState { from: self.current });
        }

        if target == self.current {
            return Err(TransitionError::AlreadyAtStage { stage: target });
        }

        // Failed is only reachable through fail()
        if target == ProvisionStage::Failed {
            return Err(TransitionError::SkippedStage {
                from: self.current,
                to: target,
            });
        }

        if target.order() < self.current.order() {
            return Err(TransitionError::BackwardTransition {
                from: self.current,
                to: target,
            });
        }

        if self.current.next() != Some(target) {
            return Err(TransitionError::SkippedStage {
                from: self.current,
                to: target,
            });
        }

        tracing::debug!("Stage: {} -> {}", self.current, target);
        self.history.push(target);
        self.current = target;

        Ok(target)
    }

    /// Mark the run as failed, remembering the last stage that was reached.
    ///
    /// # Errors
    ///
    /// - `FromTerminalState` if already at Reported or Failed
    pub fn fail(&mut self) -> Result<(), TransitionError> {
        if self.current.is_terminal() {
            return Err(TransitionError::FromTerminalState { from: self.current });
        }

        tracing::debug!("Stage: {} -> {}", self.current, ProvisionStage::Failed);
        self.failed_at = Some(self.current);
        self.history.push(ProvisionStage::Failed);
        self.current = ProvisionStage::Failed;

        Ok(())
    }
}
