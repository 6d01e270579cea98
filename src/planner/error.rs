//! Error types for the trip planner.

use thiserror::Error;

use crate::providers::ProviderError;

/// Planner error type.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Another submission for the same session is still in flight.
    #[error("a submission is already being processed for this session")]
    Busy,
    /// A provider lookup task panicked or was cancelled.
    #[error("provider task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    /// Provider construction failed.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Convenience result alias for planner operations.
pub type PlannerResult<T> = Result<T, PlannerError>;
