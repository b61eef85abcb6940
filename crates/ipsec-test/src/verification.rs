//! Verification helpers for recorded control-plane calls
//!
//! Provides assertion helpers over the ordered call log of a
//! [`RecordingService`](crate::RecordingService).

use thiserror::Error;

use crate::recording::Call;

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Expected {operation} to be called, got {actual:?}")]
    NotCalled {
        operation: String,
        actual: Vec<&'static str>,
    },

    #[error("Expected {operation} not to be called, got {actual:?}")]
    UnexpectedCall {
        operation: String,
        actual: Vec<&'static str>,
    },

    #[error("Expected call sequence {expected:?}, got {actual:?}")]
    SequenceMismatch {
        expected: Vec<String>,
        actual: Vec<&'static str>,
    },

    #[error("Expected {first} before {second}, got {actual:?}")]
    OrderViolation {
        first: String,
        second: String,
        actual: Vec<&'static str>,
    },

    #[error("Expected {expected} calls, found {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Assertions over an ordered call log.
pub struct CallVerifier {
    calls: Vec<Call>,
}

impl CallVerifier {
    /// Create a new call verifier
    pub fn new(calls: Vec<Call>) -> Self {
        Self { calls }
    }

    fn operations(&self) -> Vec<&'static str> {
        self.calls.iter().map(Call::operation).collect()
    }

    fn position(&self, operation: &str) -> Option<usize> {
        self.calls.iter().position(|c| c.operation() == operation)
    }

    /// Verify that `operation` was called at least once
    pub fn assert_called(&self, operation: &str) -> VerifyResult<()> {
        match self.position(operation) {
            Some(_) => Ok(()),
            None => Err(VerificationError::NotCalled {
                operation: operation.to_string(),
                actual: self.operations(),
            }),
        }
    }

    /// Verify that `operation` was never called
    pub fn assert_not_called(&self, operation: &str) -> VerifyResult<()> {
        match self.position(operation) {
            Some(_) => Err(VerificationError::UnexpectedCall {
                operation: operation.to_string(),
                actual: self.operations(),
            }),
            None => Ok(()),
        }
    }

    /// Verify the exact call sequence
    pub fn assert_sequence(&self, expected: &[&str]) -> VerifyResult<()> {
        let actual = self.operations();
        if actual.len() == expected.len() && actual.iter().zip(expected).all(|(a, e)| a == e) {
            Ok(())
        } else {
            Err(VerificationError::SequenceMismatch {
                expected: expected.iter().map(|s| s.to_string()).collect(),
                actual,
            })
        }
    }

    /// Verify that the first `first` call precedes the first `second` call
    pub fn assert_before(&self, first: &str, second: &str) -> VerifyResult<()> {
        match (self.position(first), self.position(second)) {
            (Some(a), Some(b)) if a < b => Ok(()),
            _ => Err(VerificationError::OrderViolation {
                first: first.to_string(),
                second: second.to_string(),
                actual: self.operations(),
            }),
        }
    }

    /// Verify that `second` is the call immediately after `first`
    pub fn assert_adjacent(&self, first: &str, second: &str) -> VerifyResult<()> {
        let actual = self.operations();
        match self.position(first) {
            Some(a) if actual.get(a + 1).copied() == Some(second) => Ok(()),
            _ => Err(VerificationError::OrderViolation {
                first: first.to_string(),
                second: second.to_string(),
                actual,
            }),
        }
    }

    /// Verify the number of calls recorded
    pub fn assert_call_count(&self, expected: usize) -> VerifyResult<()> {
        let actual = self.calls.len();
        if actual != expected {
            Err(VerificationError::CountMismatch { expected, actual })
        } else {
            Ok(())
        }
    }

    /// Get all recorded calls
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }
}
