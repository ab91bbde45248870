//! Read delegation
//!
//! Once registration stabilizes the create workflow hands the reconciled
//! model to a read workflow, which produces the final observed state.

use crate::client::RegistryClient;
use crate::error::{CreateError, Result};
use async_trait::async_trait;
use modver_types::{
    CallbackContext, DescribeTypeRequest, ProgressEvent, RegistryError, ResourceHandlerRequest,
    ResourceModel,
};
use std::sync::Arc;

/// Produces the observed state of an existing module version
#[async_trait]
pub trait ReadHandler: Send + Sync {
    async fn read(
        &self,
        request: &ResourceHandlerRequest,
        context: &CallbackContext,
    ) -> Result<ProgressEvent>;
}

/// Reads a module version by describing its ARN
pub struct DescribeTypeReadHandler {
    client: Arc<dyn RegistryClient>,
}

impl DescribeTypeReadHandler {
    /// Create a new read handler over a registry client
    pub fn new(client: Arc<dyn RegistryClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReadHandler for DescribeTypeReadHandler {
    async fn read(
        &self,
        request: &ResourceHandlerRequest,
        _context: &CallbackContext,
    ) -> Result<ProgressEvent> {
        let model = request
            .desired_resource_state
            .as_ref()
            .ok_or_else(|| CreateError::InvalidRequest("ResourceModel is required".into()))?;
        let arn = model
            .arn
            .clone()
            .ok_or_else(|| CreateError::InvalidRequest("Arn is required to read a module version".into()))?;

        let described = self
            .client
            .describe_type(DescribeTypeRequest { arn: arn.clone() })
            .await
            .map_err(|e| match e {
                RegistryError::NotFound(_) => CreateError::NotFound(arn.clone()),
                other => CreateError::Registry(other),
            })?;

        let version_id = described.arn.rsplit('/').next().map(String::from);
        let observed = ResourceModel {
            arn: Some(described.arn),
            module_name: Some(described.type_name),
            module_package: model.module_package.clone(),
            description: described.description,
            documentation_url: described.documentation_url,
            is_default_version: Some(described.is_default_version),
            schema: described.schema,
            time_created: described.time_created,
            version_id,
            visibility: Some(described.visibility),
        };

        Ok(ProgressEvent::success(observed))
    }
}
