use thiserror::Error;

/// Error kinds surfaced by the duty services.
///
/// Messages embed the offending values so a caller can diagnose a failure without
/// reproducing it. Transport codes are assigned by the RPC layer only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DutiesError {
    /// The request violates policy (oversized page, future epoch, malformed token).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced entity is absent (unknown public key, no snapshot for an epoch).
    #[error("Not found: {0}")]
    NotFound(String),

    /// A validator index beyond the snapshot's validator count.
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Computation or storage failure not attributable to the caller.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The request's cancellation token fired while a snapshot fetch was in flight.
    #[error("Request cancelled")]
    Cancelled,
}

impl DutiesError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DutiesError::Cancelled)
    }
}

/// Convenience alias
pub type Result<T> = std::result::Result<T, DutiesError>;
