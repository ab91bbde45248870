//! Registry request/response shapes and registration outcomes
//!
//! These are wire-neutral: the registry client decides how they travel.

use crate::ids::RegistrationToken;
use crate::model::Visibility;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of extension registered with the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistryType {
    Resource,
    Module,
}

/// Status the registry reports for a registration.
///
/// Unrecognised values are kept verbatim in `Other` rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RegistrationStatus {
    InProgress,
    Complete,
    Failed,
    Other(String),
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Complete => "COMPLETE",
            Self::Failed => "FAILED",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for RegistrationStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "IN_PROGRESS" => Self::InProgress,
            "COMPLETE" => Self::Complete,
            "FAILED" => Self::Failed,
            _ => Self::Other(raw),
        }
    }
}

impl From<RegistrationStatus> for String {
    fn from(status: RegistrationStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of one registration status query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RegistrationOutcome {
    /// Not terminal yet
    InProgress { description: Option<String> },
    /// Registered; carries the identifier the registry assigned
    Complete {
        identifier: String,
        description: Option<String>,
    },
    /// The registry gave up on the registration
    Failed { description: Option<String> },
    /// A status this workflow does not recognise
    Unknown {
        status: String,
        description: Option<String>,
    },
}

impl RegistrationOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress { .. })
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::InProgress { description }
            | Self::Complete { description, .. }
            | Self::Failed { description }
            | Self::Unknown { description, .. } => description.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterTypeRequest {
    #[serde(rename = "Type")]
    pub registry_type: RegistryType,
    pub type_name: String,
    pub schema_handler_package: String,
    pub client_request_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterTypeResponse {
    pub registration_token: RegistrationToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribeTypeRegistrationRequest {
    pub registration_token: RegistrationToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribeTypeRegistrationResponse {
    pub progress_status: RegistrationStatus,
    pub description: Option<String>,
    /// Set once the registration is complete
    pub type_version_arn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribeTypeRequest {
    pub arn: String,
}

/// Registry view of one registered module version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescription {
    pub arn: String,
    pub type_name: String,
    pub description: Option<String>,
    pub documentation_url: Option<String>,
    pub is_default_version: bool,
    pub schema: Option<String>,
    pub time_created: Option<DateTime<Utc>>,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTypeVersionsRequest {
    #[serde(rename = "Type")]
    pub registry_type: RegistryType,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeVersionSummary {
    pub arn: String,
    /// Zero-padded numeric version, e.g. `00000003`
    pub version_id: String,
    pub is_default_version: bool,
}

/// Errors raised by a registry client
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request throttled: {0}")]
    Throttled(String),

    #[error("Registry error {code}: {message}")]
    Service { code: String, message: String },

    #[error("Transport error: {0}")]
    Transport(String),
}
