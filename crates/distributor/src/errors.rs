//! Error types for the distributor

use crate::authority::Action;
use crate::types::{Amount, Identity, Rate};
use thiserror::Error;

/// Errors that can occur while distributing rewards or mutating the registry.
#[derive(Debug, Error)]
pub enum DistributorError {
    #[error("caller {caller} is not authorized to {action}")]
    Unauthorized { action: Action, caller: Identity },

    #[error("recipient identity must be non-zero")]
    InvalidRecipient,

    #[error("recipient mismatch at index {index}: expected {expected}, supplied {supplied}")]
    RecipientMismatch {
        index: usize,
        expected: Identity,
        supplied: Identity,
    },

    #[error("adjustment step {step} exceeds guardian limit {limit} (2.5% of rate {rate})")]
    StepTooLarge { step: Rate, limit: Rate, rate: Rate },

    #[error("index {index} out of range (registry length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),

    #[error("bounty {bounty} exceeds maximum {max}")]
    BountyTooLarge { bounty: Amount, max: Amount },

    #[error("external dependency failed during {operation}: {reason}")]
    ExternalDependencyFailure {
        operation: &'static str,
        reason: String,
    },

    #[error("arithmetic overflow while computing {0}")]
    CalculationOverflow(&'static str),
}

impl DistributorError {
    pub(crate) fn external(operation: &'static str, err: anyhow::Error) -> Self {
        DistributorError::ExternalDependencyFailure {
            operation,
            reason: format!("{err:#}"),
        }
    }
}

/// Result type for distributor operations
pub type Result<T> = std::result::Result<T, DistributorError>;
