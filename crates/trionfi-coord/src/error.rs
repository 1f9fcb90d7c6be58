//! Coordination error types

use thiserror::Error;

/// Result type for coordination operations
pub type Result<T> = std::result::Result<T, CoordError>;

/// Coordination errors
#[derive(Debug, Error)]
pub enum CoordError {
    // ==================== Claim Ledger ====================
    #[error("ledger error: {0}")]
    Ledger(String),

    #[error("claim attempt timed out")]
    ClaimTimeout,

    // ==================== Event Bus ====================
    #[error("bus error: {0}")]
    Bus(String),

    // ==================== Game Store ====================
    #[error("store error: {0}")]
    Store(String),

    // ==================== Encoding ====================
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // ==================== Internal ====================
    #[error("channel closed")]
    ChannelClosed,
}

impl CoordError {
    /// True when the error came from talking to the claim ledger — the one
    /// failure class the claim path folds into `Denied` (fail-closed).
    pub fn is_coordination_failure(&self) -> bool {
        matches!(self, CoordError::Ledger(_) | CoordError::ClaimTimeout)
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for CoordError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        CoordError::ChannelClosed
    }
}

impl From<redis::RedisError> for CoordError {
    fn from(e: redis::RedisError) -> Self {
        CoordError::Store(e.to_string())
    }
}
