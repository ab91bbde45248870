//! Progress events and structured diagnostics
//!
//! A handler invocation returns a `ProgressEvent`. Diagnostics ride along
//! with it so the core never has to log; whoever drives the handler
//! decides where they go.

use crate::model::ResourceModel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    InProgress,
    Success,
    Failed,
}

/// Error classification reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandlerErrorCode {
    /// Required input is missing; nothing was sent to the registry
    InvalidRequest,
    /// The registry or the path to it failed
    GeneralServiceException,
    /// The registry reported the registration as failed
    NotStabilized,
    /// The attempt ran out of time before reaching a terminal state
    Timeout,
    NotFound,
    InternalFailure,
}

impl HandlerErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "InvalidRequest",
            Self::GeneralServiceException => "GeneralServiceException",
            Self::NotStabilized => "NotStabilized",
            Self::Timeout => "Timeout",
            Self::NotFound => "NotFound",
            Self::InternalFailure => "InternalFailure",
        }
    }
}

impl std::fmt::Display for HandlerErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened, in structured form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    IdentifierPredicted {
        identifier: String,
    },
    RegistrationSubmitted {
        registration_token: String,
    },
    RegistrationInProgress {
        registration_token: String,
    },
    RegistrationStabilized {
        registration_token: String,
        identifier: String,
    },
    /// The registry assigned a different identifier than the one predicted.
    /// Resolved by trusting the registry; not an error.
    IdentifierMismatch {
        predicted: String,
        actual: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(flatten)]
    pub kind: DiagnosticKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn is_identifier_mismatch(&self) -> bool {
        matches!(self.kind, DiagnosticKind::IdentifierMismatch { .. })
    }
}

/// Result of one handler invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub status: OperationStatus,
    pub resource_model: Option<ResourceModel>,
    /// How long the scheduler should wait before re-invoking
    #[serde(default)]
    pub callback_delay: Duration,
    pub error_code: Option<HandlerErrorCode>,
    pub message: Option<String>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl ProgressEvent {
    pub fn in_progress(model: ResourceModel, callback_delay: Duration) -> Self {
        Self {
            status: OperationStatus::InProgress,
            resource_model: Some(model),
            callback_delay,
            error_code: None,
            message: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn success(model: ResourceModel) -> Self {
        Self {
            status: OperationStatus::Success,
            resource_model: Some(model),
            callback_delay: Duration::ZERO,
            error_code: None,
            message: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn failed(
        model: Option<ResourceModel>,
        error_code: HandlerErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status: OperationStatus::Failed,
            resource_model: model,
            callback_delay: Duration::ZERO,
            error_code: Some(error_code),
            message: Some(message.into()),
            diagnostics: Vec::new(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics.extend(diagnostics);
        self
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == OperationStatus::InProgress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_event_carries_code_and_message() {
        let event = ProgressEvent::failed(
            None,
            HandlerErrorCode::InvalidRequest,
            "ModulePackage is required",
        );
        assert_eq!(event.status, OperationStatus::Failed);
        assert_eq!(event.error_code, Some(HandlerErrorCode::InvalidRequest));
        assert_eq!(event.message.as_deref(), Some("ModulePackage is required"));
        assert!(!event.is_in_progress());
    }

    #[test]
    fn diagnostic_serializes_flat() {
        let diag = Diagnostic::new(
            DiagnosticKind::IdentifierMismatch {
                predicted: "arn:predicted:1".into(),
                actual: "arn:actual:1".into(),
            },
            "mismatch",
        );
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["kind"], "identifier_mismatch");
        assert_eq!(json["actual"], "arn:actual:1");
        assert!(diag.is_identifier_mismatch());
    }
}
