//! Error types for tunnel mesh operations.
//!
//! Every failure that aborts a reconciliation run is a [`MeshError`].
//! Malformed individual entities (a route key that is not a host prefix,
//! a tunnel that does not follow the naming convention) are not errors:
//! the reader skips them and logs a warning.

use thiserror::Error;

/// Result type alias for tunnel mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors that can occur during a reconciliation run.
#[derive(Debug, Error)]
pub enum MeshError {
    /// A piece of device state the run depends on is absent.
    #[error("Missing {kind} '{name}' in device state")]
    MissingState {
        /// What is missing (e.g., "LSP template", "prefix-list").
        kind: String,
        /// The name that was looked up.
        name: String,
    },

    /// Invalid local configuration (CLI arguments, environment).
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The option or variable that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// The request never produced a usable response.
    #[error("Command API transport failed: {operation}: {message}")]
    Transport {
        /// The operation that failed (e.g., "send", "decode").
        operation: String,
        /// Error message.
        message: String,
    },

    /// The device rejected one of the commands.
    #[error("Command API error {code}: {message}")]
    Api {
        /// JSON-RPC error code.
        code: i64,
        /// Error message returned by the device.
        message: String,
    },

    /// The device answered with something that does not have the expected shape.
    #[error("Unexpected response to '{command}': {message}")]
    InvalidResponse {
        /// The command whose response could not be used.
        command: String,
        /// Error message.
        message: String,
    },
}

impl MeshError {
    /// Creates a missing device state error.
    pub fn missing_state(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::MissingState {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid response error.
    pub fn invalid_response(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Returns true if the run failed because the device or the operator
    /// configuration is wrong, as opposed to a communication failure.
    ///
    /// Nothing has been written to the device when this is true.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            MeshError::MissingState { .. } | MeshError::InvalidConfig { .. }
        )
    }

    /// Returns true if the error came from talking to the device.
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            MeshError::Transport { .. } | MeshError::Api { .. } | MeshError::InvalidResponse { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MeshError::missing_state("prefix-list", "LOOPBACKS");
        assert_eq!(
            err.to_string(),
            "Missing prefix-list 'LOOPBACKS' in device state"
        );
    }

    #[test]
    fn test_transport_error() {
        let err = MeshError::transport("send", "Connection refused");
        assert_eq!(
            err.to_string(),
            "Command API transport failed: send: Connection refused"
        );
    }

    #[test]
    fn test_api_error() {
        let err = MeshError::Api {
            code: 1002,
            message: "invalid command".to_string(),
        };
        assert!(err.to_string().contains("1002"));
        assert!(err.to_string().contains("invalid command"));
    }

    #[test]
    fn test_classification() {
        assert!(MeshError::missing_state("LSP template", "T1").is_config_error());
        assert!(MeshError::invalid_config("count", "must be >= 1").is_config_error());
        assert!(!MeshError::transport("send", "timeout").is_config_error());

        assert!(MeshError::transport("send", "timeout").is_transport_error());
        assert!(MeshError::invalid_response("show ip route isis", "not an object")
            .is_transport_error());
        assert!(!MeshError::missing_state("route table", "isis").is_transport_error());
    }
}
