//! In-memory registry for tests and local runs
//!
//! Registrations stay `IN_PROGRESS` for a configurable number of status
//! queries and then settle on a configurable final status. Every call is
//! counted so tests can assert exactly what reached the registry.

use crate::client::RegistryClient;
use crate::predictor::module_version_arn;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use modver_types::{
    DescribeTypeRegistrationRequest, DescribeTypeRegistrationResponse, DescribeTypeRequest,
    ListTypeVersionsRequest, RegisterTypeRequest, RegisterTypeResponse, RegistrationStatus,
    RegistrationToken, RegistryError, TypeDescription, TypeVersionSummary, Visibility,
};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Snapshot of how often each registry operation was called
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub register_type: u32,
    pub describe_type_registration: u32,
    pub describe_type: u32,
    pub list_type_versions: u32,
}

impl CallCounts {
    /// Calls across all operations
    pub fn total(&self) -> u32 {
        self.register_type
            + self.describe_type_registration
            + self.describe_type
            + self.list_type_versions
    }
}

#[derive(Debug, Clone)]
struct PendingRegistration {
    type_name: String,
    remaining_in_progress: u32,
    settled_arn: Option<String>,
}

/// Simulated registry
pub struct SimulatedRegistry {
    partition: String,
    region: String,
    account_id: String,
    in_progress_polls: u32,
    final_status: RegistrationStatus,
    assigned_arn: Option<String>,
    register_failure: Option<RegistryError>,
    status_failure: Option<RegistryError>,
    list_failure: Option<RegistryError>,
    versions: DashMap<String, Vec<TypeVersionSummary>>,
    descriptions: DashMap<String, TypeDescription>,
    registrations: DashMap<RegistrationToken, PendingRegistration>,
    next_token: AtomicU64,
    register_calls: AtomicU32,
    status_calls: AtomicU32,
    describe_calls: AtomicU32,
    list_calls: AtomicU32,
}

impl SimulatedRegistry {
    /// A registry that completes every registration on the first status query
    pub fn new(region: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            partition: "aws".into(),
            region: region.into(),
            account_id: account_id.into(),
            in_progress_polls: 0,
            final_status: RegistrationStatus::Complete,
            assigned_arn: None,
            register_failure: None,
            status_failure: None,
            list_failure: None,
            versions: DashMap::new(),
            descriptions: DashMap::new(),
            registrations: DashMap::new(),
            next_token: AtomicU64::new(1),
            register_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
            describe_calls: AtomicU32::new(0),
            list_calls: AtomicU32::new(0),
        }
    }

    /// Report `IN_PROGRESS` this many times before settling
    pub fn with_in_progress_polls(mut self, polls: u32) -> Self {
        self.in_progress_polls = polls;
        self
    }

    /// Status reported once a registration settles
    pub fn with_final_status(mut self, status: RegistrationStatus) -> Self {
        self.final_status = status;
        self
    }

    /// Assign this ARN instead of the next sequential version
    pub fn with_assigned_arn(mut self, arn: impl Into<String>) -> Self {
        self.assigned_arn = Some(arn.into());
        self
    }

    /// Seed an already registered version
    pub fn with_existing_version(self, type_name: &str, version: u32) -> Self {
        let arn = module_version_arn(
            &self.partition,
            &self.region,
            &self.account_id,
            type_name,
            version,
        );
        self.record_version(type_name, &arn, version);
        self
    }

    /// Fail every `register_type` call with `error`
    pub fn failing_registration(mut self, error: RegistryError) -> Self {
        self.register_failure = Some(error);
        self
    }

    /// Fail every `describe_type_registration` call with `error`
    pub fn failing_status_queries(mut self, error: RegistryError) -> Self {
        self.status_failure = Some(error);
        self
    }

    /// Fail every `list_type_versions` call with `error`
    pub fn failing_listing(mut self, error: RegistryError) -> Self {
        self.list_failure = Some(error);
        self
    }

    /// Snapshot of the calls made so far
    pub fn calls(&self) -> CallCounts {
        CallCounts {
            register_type: self.register_calls.load(Ordering::SeqCst),
            describe_type_registration: self.status_calls.load(Ordering::SeqCst),
            describe_type: self.describe_calls.load(Ordering::SeqCst),
            list_type_versions: self.list_calls.load(Ordering::SeqCst),
        }
    }

    fn next_version(&self, type_name: &str) -> u32 {
        self.versions
            .get(type_name)
            .and_then(|v| v.iter().filter_map(|s| s.version_id.parse::<u32>().ok()).max())
            .map_or(1, |max| max + 1)
    }

    fn record_version(&self, type_name: &str, arn: &str, version: u32) {
        let version_id = format!("{:08}", version);
        let mut versions = self.versions.entry(type_name.to_string()).or_default();
        let is_default = versions.is_empty();
        versions.push(TypeVersionSummary {
            arn: arn.to_string(),
            version_id,
            is_default_version: is_default,
        });
        self.descriptions.insert(
            arn.to_string(),
            TypeDescription {
                arn: arn.to_string(),
                type_name: type_name.to_string(),
                description: Some(format!("Module {}", type_name)),
                documentation_url: None,
                is_default_version: is_default,
                schema: Some("{}".into()),
                time_created: Some(Utc::now()),
                visibility: Visibility::Private,
            },
        );
    }

    /// Settle a registration, registering the version on first completion
    fn settle(&self, registration: &mut PendingRegistration) -> String {
        if let Some(arn) = &registration.settled_arn {
            return arn.clone();
        }
        let version = self.next_version(&registration.type_name);
        let arn = self.assigned_arn.clone().unwrap_or_else(|| {
            module_version_arn(
                &self.partition,
                &self.region,
                &self.account_id,
                &registration.type_name,
                version,
            )
        });
        self.record_version(&registration.type_name, &arn, version);
        registration.settled_arn = Some(arn.clone());
        arn
    }
}

#[async_trait]
impl RegistryClient for SimulatedRegistry {
    async fn register_type(
        &self,
        request: RegisterTypeRequest,
    ) -> Result<RegisterTypeResponse, RegistryError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.register_failure {
            return Err(err.clone());
        }

        let token = RegistrationToken::new(format!(
            "tok-{}",
            self.next_token.fetch_add(1, Ordering::SeqCst)
        ));
        self.registrations.insert(
            token.clone(),
            PendingRegistration {
                type_name: request.type_name,
                remaining_in_progress: self.in_progress_polls,
                settled_arn: None,
            },
        );

        Ok(RegisterTypeResponse {
            registration_token: token,
        })
    }

    async fn describe_type_registration(
        &self,
        request: DescribeTypeRegistrationRequest,
    ) -> Result<DescribeTypeRegistrationResponse, RegistryError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.status_failure {
            return Err(err.clone());
        }

        let mut registration = self
            .registrations
            .get_mut(&request.registration_token)
            .ok_or_else(|| RegistryError::NotFound(request.registration_token.to_string()))?;

        if registration.remaining_in_progress > 0 {
            registration.remaining_in_progress -= 1;
            return Ok(DescribeTypeRegistrationResponse {
                progress_status: RegistrationStatus::InProgress,
                description: Some("Deployment is currently in progress".into()),
                type_version_arn: None,
            });
        }

        let response = match &self.final_status {
            RegistrationStatus::Complete => {
                let arn = self.settle(&mut registration);
                DescribeTypeRegistrationResponse {
                    progress_status: RegistrationStatus::Complete,
                    description: Some("Deployment is complete".into()),
                    type_version_arn: Some(arn),
                }
            }
            other => DescribeTypeRegistrationResponse {
                progress_status: other.clone(),
                description: Some(format!("Registration ended with status {}", other)),
                type_version_arn: None,
            },
        };
        Ok(response)
    }

    async fn describe_type(
        &self,
        request: DescribeTypeRequest,
    ) -> Result<TypeDescription, RegistryError> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        self.descriptions
            .get(&request.arn)
            .map(|d| d.clone())
            .ok_or(RegistryError::NotFound(request.arn))
    }

    async fn list_type_versions(
        &self,
        request: ListTypeVersionsRequest,
    ) -> Result<Vec<TypeVersionSummary>, RegistryError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.list_failure {
            return Err(err.clone());
        }
        self.versions
            .get(&request.type_name)
            .map(|v| v.clone())
            .ok_or(RegistryError::NotFound(request.type_name))
    }
}
