use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Result, WaveSyncError};

/// Role a node plays in the animation network. Fixed for the node's lifetime.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Computes wave parameters and distributes them to receivers.
    Controller,
    /// Applies wave parameters received from a controller.
    #[default]
    Receiver,
}

impl NodeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Controller => "controller",
            Self::Receiver => "receiver",
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeRole {
    type Err = WaveSyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "controller" => Ok(Self::Controller),
            "receiver" => Ok(Self::Receiver),
            other => Err(WaveSyncError::config(format!(
                "unknown node mode `{other}`, expected `controller` or `receiver`"
            ))),
        }
    }
}

/// Initialisation state of a node. The transition is one-way.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Initialized,
}

/// Operations whose legality depends on lifecycle state or role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedOperation {
    Start,
    Stop,
    SetWaveParameters,
}

impl GuardedOperation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::SetWaveParameters => "set_wave_parameters",
        }
    }
}

/// Gatekeeper consulted before every role- or lifecycle-sensitive operation.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleGuard {
    role: NodeRole,
    state: LifecycleState,
}

impl LifecycleGuard {
    pub fn new(role: NodeRole) -> Self {
        Self {
            role,
            state: LifecycleState::Uninitialized,
        }
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == LifecycleState::Initialized
    }

    /// Moves the guard to [`LifecycleState::Initialized`].
    ///
    /// Returns `true` only for the first call; repeated ready signals leave
    /// the state untouched and report `false`.
    pub fn mark_initialized(&mut self) -> bool {
        if self.is_initialized() {
            return false;
        }
        self.state = LifecycleState::Initialized;
        true
    }

    /// Fails if `operation` may not run in the current role and state.
    ///
    /// The role is checked first so that a receiver is refused wave parameter
    /// writes whether or not it has been initialized.
    pub fn check(&self, operation: GuardedOperation) -> Result<()> {
        if operation == GuardedOperation::SetWaveParameters && self.role != NodeRole::Controller {
            return Err(WaveSyncError::WrongRole {
                operation: operation.name(),
                role: self.role,
            });
        }

        if !self.is_initialized() {
            return Err(WaveSyncError::NotInitialized {
                operation: operation.name(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_OPERATIONS: [GuardedOperation; 3] = [
        GuardedOperation::Start,
        GuardedOperation::Stop,
        GuardedOperation::SetWaveParameters,
    ];

    #[test]
    fn uninitialized_controller_rejects_everything() {
        let guard = LifecycleGuard::new(NodeRole::Controller);
        for operation in ALL_OPERATIONS {
            let err = guard.check(operation).unwrap_err();
            assert!(matches!(err, WaveSyncError::NotInitialized { .. }));
        }
    }

    #[test]
    fn initialized_controller_allows_everything() {
        let mut guard = LifecycleGuard::new(NodeRole::Controller);
        assert!(guard.mark_initialized());
        for operation in ALL_OPERATIONS {
            guard.check(operation).unwrap();
        }
    }

    #[test]
    fn receiver_cannot_set_wave_parameters_in_any_state() {
        let mut guard = LifecycleGuard::new(NodeRole::Receiver);
        assert!(matches!(
            guard.check(GuardedOperation::SetWaveParameters),
            Err(WaveSyncError::WrongRole { .. })
        ));

        guard.mark_initialized();
        assert!(matches!(
            guard.check(GuardedOperation::SetWaveParameters),
            Err(WaveSyncError::WrongRole { .. })
        ));
        guard.check(GuardedOperation::Start).unwrap();
        guard.check(GuardedOperation::Stop).unwrap();
    }

    #[test]
    fn initialization_happens_once() {
        let mut guard = LifecycleGuard::new(NodeRole::Receiver);
        assert!(guard.mark_initialized());
        assert!(!guard.mark_initialized());
        assert_eq!(guard.state(), LifecycleState::Initialized);
    }

    #[test]
    fn parses_roles() {
        assert_eq!("controller".parse::<NodeRole>().unwrap(), NodeRole::Controller);
        assert_eq!("receiver".parse::<NodeRole>().unwrap(), NodeRole::Receiver);
        assert!("observer".parse::<NodeRole>().is_err());
        assert_eq!(NodeRole::default(), NodeRole::Receiver);
    }
}
