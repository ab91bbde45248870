//! Identifier prediction
//!
//! The ARN of a module version is only assigned once registration
//! completes, but callers may reference it before then. The predictor
//! derives the ARN the registry will most likely assign from the versions
//! that already exist. It only reads; it never creates anything.

use crate::client::RegistryClient;
use async_trait::async_trait;
use modver_types::{
    ListTypeVersionsRequest, RegistryError, RegistryType, ResourceHandlerRequest, ResourceModel,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Computes a speculative identifier for a resource that does not exist yet
#[async_trait]
pub trait IdentifierPredictor: Send + Sync {
    /// Predict the identifier, or `None` if it cannot be computed
    async fn predict(
        &self,
        request: &ResourceHandlerRequest,
        model: &ResourceModel,
    ) -> Option<String>;
}

/// ARN of a module version, e.g.
/// `arn:aws:cloudformation:us-east-1:123456789012:type/module/My-S3-Bucket-MODULE/00000002`
pub fn module_version_arn(
    partition: &str,
    region: &str,
    account_id: &str,
    module_name: &str,
    version: u32,
) -> String {
    format!(
        "arn:{}:cloudformation:{}:{}:type/module/{}/{:08}",
        partition,
        region,
        account_id,
        module_name.replace("::", "-"),
        version
    )
}

/// Predicts the next sequential version ARN from the registry's version list
pub struct ArnPredictor {
    client: Arc<dyn RegistryClient>,
}

impl ArnPredictor {
    /// Create a new predictor over a registry client
    pub fn new(client: Arc<dyn RegistryClient>) -> Self {
        Self { client }
    }

    async fn latest_version(&self, module_name: &str) -> Result<u32, PredictionInput> {
        let request = ListTypeVersionsRequest {
            registry_type: RegistryType::Module,
            type_name: module_name.to_string(),
        };
        let versions = match self.client.list_type_versions(request).await {
            Ok(versions) => versions,
            // No versions registered yet
            Err(RegistryError::NotFound(_)) => return Ok(0),
            Err(e) => return Err(PredictionInput::Listing(e)),
        };

        let mut latest = 0u32;
        for summary in &versions {
            let version = summary
                .version_id
                .parse::<u32>()
                .map_err(|_| PredictionInput::VersionId(summary.version_id.clone()))?;
            latest = latest.max(version);
        }
        Ok(latest)
    }
}

enum PredictionInput {
    Listing(RegistryError),
    VersionId(String),
}

#[async_trait]
impl IdentifierPredictor for ArnPredictor {
    async fn predict(
        &self,
        request: &ResourceHandlerRequest,
        model: &ResourceModel,
    ) -> Option<String> {
        let module_name = model.module_name.as_deref()?;

        let latest = match self.latest_version(module_name).await {
            Ok(latest) => latest,
            Err(PredictionInput::Listing(e)) => {
                warn!(module_name, error = %e, "Could not list module versions for ARN prediction");
                return None;
            }
            Err(PredictionInput::VersionId(raw)) => {
                warn!(module_name, version_id = %raw, "Unparseable module version id");
                return None;
            }
        };
        let next = latest.checked_add(1)?;

        let arn = module_version_arn(
            &request.aws_partition,
            &request.region,
            &request.aws_account_id,
            module_name,
            next,
        );
        debug!(module_name, arn = %arn, "Predicted module version ARN");
        Some(arn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedRegistry;

    const MODULE: &str = "Org::Mod::Resource::MODULE";

    fn request() -> ResourceHandlerRequest {
        ResourceHandlerRequest::new(
            Some(ResourceModel::new(MODULE, "s3://bucket/key")),
            "123456789012",
            "us-east-1",
        )
    }

    #[test]
    fn arn_format() {
        assert_eq!(
            module_version_arn("aws", "eu-west-1", "111122223333", "My::S3::Bucket::MODULE", 12),
            "arn:aws:cloudformation:eu-west-1:111122223333:type/module/My-S3-Bucket-MODULE/00000012"
        );
    }

    #[tokio::test]
    async fn first_version_when_module_is_new() {
        let registry = Arc::new(SimulatedRegistry::new("us-east-1", "123456789012"));
        let predictor = ArnPredictor::new(registry.clone());
        let request = request();
        let model = request.desired_resource_state.clone().unwrap();

        let arn = predictor.predict(&request, &model).await.unwrap();
        assert!(arn.ends_with("/Org-Mod-Resource-MODULE/00000001"));
        assert_eq!(registry.calls().list_type_versions, 1);
        assert_eq!(registry.calls().register_type, 0);
    }

    #[tokio::test]
    async fn next_version_after_existing() {
        let registry = Arc::new(
            SimulatedRegistry::new("us-east-1", "123456789012")
                .with_existing_version(MODULE, 1)
                .with_existing_version(MODULE, 2),
        );
        let predictor = ArnPredictor::new(registry);
        let request = request();
        let model = request.desired_resource_state.clone().unwrap();

        let first = predictor.predict(&request, &model).await.unwrap();
        let second = predictor.predict(&request, &model).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first,
            "arn:aws:cloudformation:us-east-1:123456789012:type/module/Org-Mod-Resource-MODULE/00000003"
        );
    }

    #[tokio::test]
    async fn listing_failure_means_no_prediction() {
        let registry = Arc::new(
            SimulatedRegistry::new("us-east-1", "123456789012")
                .failing_listing(RegistryError::Throttled("slow down".into())),
        );
        let predictor = ArnPredictor::new(registry);
        let request = request();
        let model = request.desired_resource_state.clone().unwrap();

        assert_eq!(predictor.predict(&request, &model).await, None);
    }

    #[tokio::test]
    async fn missing_module_name_means_no_prediction() {
        let registry = Arc::new(SimulatedRegistry::new("us-east-1", "123456789012"));
        let predictor = ArnPredictor::new(registry.clone());
        let request = request();
        let model = ResourceModel {
            module_package: Some("s3://bucket/key".into()),
            ..Default::default()
        };

        assert_eq!(predictor.predict(&request, &model).await, None);
        assert_eq!(registry.calls().total(), 0);
    }
}
