//! Stabilization polling
//!
//! One call to `poll` is one status query. Query failures are surfaced
//! immediately; they are never folded into the backoff loop.

use crate::client::RegistryClient;
use crate::error::{CreateError, Result};
use modver_types::{
    DescribeTypeRegistrationRequest, DescribeTypeRegistrationResponse, RegistrationOutcome,
    RegistrationStatus, RegistrationToken, ResourceModel,
};
use std::sync::Arc;
use tracing::warn;

/// Map a registry status response onto an outcome
pub fn classify(response: DescribeTypeRegistrationResponse) -> RegistrationOutcome {
    let description = response.description;
    match response.progress_status {
        RegistrationStatus::InProgress => RegistrationOutcome::InProgress { description },
        RegistrationStatus::Complete => match response.type_version_arn {
            Some(identifier) => RegistrationOutcome::Complete {
                identifier,
                description,
            },
            // Complete without an ARN cannot be reconciled
            None => RegistrationOutcome::Unknown {
                status: "COMPLETE without TypeVersionArn".into(),
                description,
            },
        },
        RegistrationStatus::Failed => RegistrationOutcome::Failed { description },
        RegistrationStatus::Other(status) => RegistrationOutcome::Unknown {
            status,
            description,
        },
    }
}

/// Queries registration status for a token
pub struct StabilizationPoller {
    client: Arc<dyn RegistryClient>,
}

impl StabilizationPoller {
    /// Create a new poller over a registry client
    pub fn new(client: Arc<dyn RegistryClient>) -> Self {
        Self { client }
    }

    /// Issue one status query for `token` and classify the answer
    pub async fn poll(
        &self,
        token: &RegistrationToken,
        model: &ResourceModel,
    ) -> Result<RegistrationOutcome> {
        let response = self
            .client
            .describe_type_registration(DescribeTypeRegistrationRequest {
                registration_token: token.clone(),
            })
            .await
            .map_err(|source| {
                warn!(
                    module_name = model.display_name(),
                    registration_token = %token,
                    error = %source,
                    "Failed to retrieve module registration status"
                );
                CreateError::StatusQueryFailed {
                    module_name: model.display_name().to_string(),
                    source,
                }
            })?;

        Ok(classify(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedRegistry;
    use modver_types::RegistryError;

    fn response(
        status: RegistrationStatus,
        arn: Option<&str>,
    ) -> DescribeTypeRegistrationResponse {
        DescribeTypeRegistrationResponse {
            progress_status: status,
            description: Some("desc".into()),
            type_version_arn: arn.map(String::from),
        }
    }

    #[test]
    fn classification_table() {
        assert_eq!(
            classify(response(RegistrationStatus::InProgress, None)),
            RegistrationOutcome::InProgress {
                description: Some("desc".into())
            }
        );
        assert_eq!(
            classify(response(RegistrationStatus::Complete, Some("arn:actual:1"))),
            RegistrationOutcome::Complete {
                identifier: "arn:actual:1".into(),
                description: Some("desc".into())
            }
        );
        assert_eq!(
            classify(response(RegistrationStatus::Failed, None)),
            RegistrationOutcome::Failed {
                description: Some("desc".into())
            }
        );
        assert!(matches!(
            classify(response(RegistrationStatus::Other("PAUSED".into()), None)),
            RegistrationOutcome::Unknown { status, .. } if status == "PAUSED"
        ));
    }

    #[test]
    fn complete_without_arn_is_unknown() {
        let outcome = classify(response(RegistrationStatus::Complete, None));
        assert!(matches!(outcome, RegistrationOutcome::Unknown { .. }));
    }

    #[tokio::test]
    async fn query_failure_is_not_retried() {
        let registry = Arc::new(
            SimulatedRegistry::new("us-east-1", "123456789012")
                .failing_status_queries(RegistryError::Transport("timeout".into())),
        );
        let poller = StabilizationPoller::new(registry.clone());
        let model = ResourceModel::new("A::B::C::MODULE", "s3://bucket/key");

        let err = poller
            .poll(&RegistrationToken::new("tok-1"), &model)
            .await
            .unwrap_err();
        assert!(matches!(err, CreateError::StatusQueryFailed { .. }));
        assert_eq!(registry.calls().describe_type_registration, 1);
    }
}
