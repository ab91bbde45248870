//! Create workflow error types
//!
//! Every variant is fatal for the attempt. The scheduler decides what the
//! end user sees; `error_code` gives it the classification.

use crate::state::StoreError;
use modver_types::{AttemptPhase, ContextError, HandlerErrorCode, RegistryError};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CreateError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("ARN prediction for new module version of module {module_name}")]
    PredictionFailed { module_name: String },

    #[error("Failed to register module {module_name}: {source}")]
    SubmissionFailed {
        module_name: String,
        #[source]
        source: RegistryError,
    },

    #[error("Failed to retrieve module registration status for module {module_name}: {source}")]
    StatusQueryFailed {
        module_name: String,
        #[source]
        source: RegistryError,
    },

    #[error("Resource of type '{type_name}' with identifier '{identifier}' did not stabilize")]
    NotStabilized {
        type_name: String,
        identifier: String,
    },

    #[error("received unexpected module registration status: {status}")]
    UnexpectedStatus { status: String },

    #[error("Module registration did not reach a terminal state within {timeout:?} (elapsed {elapsed:?})")]
    Timeout { elapsed: Duration, timeout: Duration },

    #[error("Module version {0} not found")]
    NotFound(String),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Invalid attempt state: {phase}: {reason}")]
    InvalidState { phase: AttemptPhase, reason: String },

    #[error("Continuation state error: {0}")]
    Context(#[from] ContextError),

    #[error("State store error: {0}")]
    StateStore(#[from] StoreError),
}

impl CreateError {
    /// Classification reported to the caller
    pub fn error_code(&self) -> HandlerErrorCode {
        match self {
            Self::InvalidRequest(_) => HandlerErrorCode::InvalidRequest,
            Self::PredictionFailed { .. }
            | Self::SubmissionFailed { .. }
            | Self::StatusQueryFailed { .. }
            | Self::UnexpectedStatus { .. }
            | Self::Registry(_) => HandlerErrorCode::GeneralServiceException,
            Self::NotStabilized { .. } => HandlerErrorCode::NotStabilized,
            Self::Timeout { .. } => HandlerErrorCode::Timeout,
            Self::NotFound(_) => HandlerErrorCode::NotFound,
            Self::InvalidState { .. } | Self::Context(_) | Self::StateStore(_) => {
                HandlerErrorCode::InternalFailure
            }
        }
    }
}

/// Result type for create workflow operations
pub type Result<T> = std::result::Result<T, CreateError>;
