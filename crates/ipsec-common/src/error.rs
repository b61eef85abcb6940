//! Error types for IPsec manager operations.
//!
//! Errors fall into three classes that callers treat differently:
//!
//! - configuration errors are raised before any RPC is issued
//! - transport errors abort the current step and every dependent step
//! - remote rejections carry the daemon's status verbatim
//!
//! Nothing in this workspace retries on any of them.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for IPsec manager operations.
pub type IpsecResult<T> = Result<T, IpsecError>;

/// Errors that can occur during IPsec manager operations.
#[derive(Debug, Error)]
pub enum IpsecError {
    /// Configuration validation error.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// Algorithm name with no entry in the lookup table.
    #[error("Unknown {kind} algorithm '{name}'")]
    UnknownAlgorithm {
        /// Table the name was looked up in ("encryption", "integrity", ...).
        kind: &'static str,
        /// The name as supplied by the caller.
        name: String,
    },

    /// Malformed `cert:key:ca` TLS file specification.
    #[error("Invalid TLS file spec: {message}")]
    TlsSpec { message: String },

    /// A TLS file could not be read.
    #[error("Failed to read TLS file '{path}': {source}")]
    TlsFile {
        /// The file path.
        path: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Channel to the control plane could not be opened or was lost.
    #[error("Transport to '{target}' failed: {message}")]
    Transport {
        /// Endpoint address or operation name.
        target: String,
        /// Error message.
        message: String,
    },

    /// Operation did not complete before its deadline.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The budget that was exceeded.
        after: Duration,
    },

    /// Operation aborted by the caller.
    #[error("{operation} cancelled")]
    Cancelled {
        /// The in-flight operation.
        operation: String,
    },

    /// The daemon rejected the request.
    #[error("{operation} rejected by remote ({code:?}): {message}")]
    Remote {
        /// The RPC that was rejected.
        operation: String,
        /// gRPC status code.
        code: tonic::Code,
        /// Verbatim status message from the daemon.
        message: String,
    },

    /// The probe command could not be spawned.
    #[error("Failed to spawn '{command}': {source}")]
    ShellExec {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The probe command exited non-zero without usable output.
    #[error("'{command}' exited with {exit_code}: {output}")]
    ShellCommandFailed {
        command: String,
        exit_code: i32,
        output: String,
    },

    /// No echo reply came back from the probe target.
    #[error("Probe to {target} failed: {received}/{sent} replies")]
    ProbeFailed {
        /// The probed address.
        target: String,
        /// Echo requests sent.
        sent: u32,
        /// Echo replies received.
        received: u32,
    },

    /// Probe tool output could not be interpreted.
    #[error("Failed to parse probe output: {message}")]
    ProbeParse { message: String },
}

impl IpsecError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown algorithm error.
    pub fn unknown_algorithm(kind: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownAlgorithm {
            kind,
            name: name.into(),
        }
    }

    /// Creates a TLS spec error.
    pub fn tls_spec(message: impl Into<String>) -> Self {
        Self::TlsSpec {
            message: message.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Converts a gRPC status returned by `operation`.
    ///
    /// `Unavailable` is what tonic reports when the channel itself fails, so
    /// it is classified as a transport error. Every other code is a remote
    /// rejection and keeps the daemon's message untouched.
    pub fn from_status(operation: impl Into<String>, status: tonic::Status) -> Self {
        let operation = operation.into();
        match status.code() {
            tonic::Code::Unavailable => Self::Transport {
                target: operation,
                message: status.message().to_string(),
            },
            code => Self::Remote {
                operation,
                code,
                message: status.message().to_string(),
            },
        }
    }

    /// Returns true if the error was raised before any network I/O.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            IpsecError::InvalidConfig { .. }
                | IpsecError::UnknownAlgorithm { .. }
                | IpsecError::TlsSpec { .. }
                | IpsecError::TlsFile { .. }
        )
    }

    /// Returns true if the channel failed, timed out, or was cancelled.
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            IpsecError::Transport { .. } | IpsecError::Timeout { .. } | IpsecError::Cancelled { .. }
        )
    }

    /// Returns true if the daemon answered with a failure status.
    pub fn is_remote_rejection(&self) -> bool {
        matches!(self, IpsecError::Remote { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IpsecError::unknown_algorithm("encryption", "aes_foo");
        assert_eq!(err.to_string(), "Unknown encryption algorithm 'aes_foo'");
    }

    #[test]
    fn test_invalid_config() {
        let err = IpsecError::invalid_config("spi", "must be non-zero");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for spi: must be non-zero"
        );
        assert!(err.is_config_error());
    }

    #[test]
    fn test_remote_status_is_verbatim() {
        let status = tonic::Status::already_exists("SA with SPI 0x100 already installed");
        let err = IpsecError::from_status("AddSA", status);
        assert!(err.is_remote_rejection());
        match err {
            IpsecError::Remote {
                operation,
                code,
                message,
            } => {
                assert_eq!(operation, "AddSA");
                assert_eq!(code, tonic::Code::AlreadyExists);
                assert_eq!(message, "SA with SPI 0x100 already installed");
            }
            other => panic!("Expected Remote error, got {:?}", other),
        }
    }

    #[test]
    fn test_unavailable_status_is_transport() {
        let err = IpsecError::from_status("IPsecVersion", tonic::Status::unavailable("refused"));
        assert!(err.is_transport_error());
        assert!(!err.is_remote_rejection());
        match err {
            IpsecError::Transport { target, message } => {
                assert_eq!(target, "IPsecVersion");
                assert_eq!(message, "refused");
            }
            other => panic!("Expected Transport error, got {:?}", other),
        }
    }

    #[test]
    fn test_classification() {
        assert!(IpsecError::tls_spec("missing ca").is_config_error());
        assert!(IpsecError::transport("localhost:50151", "refused").is_transport_error());
        assert!(IpsecError::Cancelled {
            operation: "IPsecInitiate".to_string()
        }
        .is_transport_error());
        assert!(!IpsecError::ProbeParse {
            message: "empty".to_string()
        }
        .is_config_error());
    }
}
