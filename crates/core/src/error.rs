use crate::NodeRole;

/// Result alias that carries the custom [`WaveSyncError`] type.
pub type Result<T> = std::result::Result<T, WaveSyncError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum WaveSyncError {
    /// A registry already has a live coordinator.
    #[error("a wave sync node has already been created")]
    AlreadyCreated,
    /// The operation requires the node to have finished bridge initialisation.
    #[error("`{operation}` called before the node was initialized")]
    NotInitialized { operation: &'static str },
    /// The operation is reserved for a different node role.
    #[error("`{operation}` is not permitted on a {role} node")]
    WrongRole {
        operation: &'static str,
        role: NodeRole,
    },
    /// Input rejected by the wave parameter model.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Shared node state was poisoned by a panicking bridge callback.
    #[error("{0} has been poisoned")]
    Poisoned(&'static str),
    /// Configuration could not be interpreted.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around JSON (de)serialisation errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl WaveSyncError {
    /// Creates a configuration error from the provided message.
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }

    /// Returns `true` when the error originates from input validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Errors raised while normalising wave parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("received {count} waves but at most {max} are supported")]
    TooManyWaves { count: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_convert_transparently() {
        let err: WaveSyncError = ValidationError::TooManyWaves { count: 9, max: 8 }.into();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "received 9 waves but at most 8 are supported");
    }

    #[test]
    fn role_errors_name_the_role() {
        let err = WaveSyncError::WrongRole {
            operation: "set_wave_parameters",
            role: NodeRole::Receiver,
        };
        assert!(err.to_string().contains("receiver"));
    }
}
