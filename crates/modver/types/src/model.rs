//! Resource model and handler request
//!
//! The resource model is the description of the module version being
//! created. It is mutated in place as the identifier becomes known, first
//! speculatively (prediction) and then authoritatively (registration).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registry visibility of a module version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    Private,
    Public,
}

/// A module version
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceModel {
    /// ARN of the module version. Optional on input, always set on output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,

    /// Module name, e.g. `My::S3::SampleBucket::MODULE`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,

    /// Location of the module package, e.g. `s3://bucket/module.zip`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_package: Option<String>,

    // Read-only properties, filled by the read workflow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default_version: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

impl ResourceModel {
    pub const TYPE_NAME: &'static str = "AWS::CloudFormation::ModuleVersion";

    /// Create a model with the two user-supplied properties
    pub fn new(module_name: impl Into<String>, module_package: impl Into<String>) -> Self {
        Self {
            module_name: Some(module_name.into()),
            module_package: Some(module_package.into()),
            ..Default::default()
        }
    }

    pub fn with_arn(mut self, arn: impl Into<String>) -> Self {
        self.arn = Some(arn.into());
        self
    }

    /// Module name for log and error messages
    pub fn display_name(&self) -> &str {
        self.module_name.as_deref().unwrap_or("<unnamed>")
    }
}

/// Request handed to a handler by the scheduler that invokes it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceHandlerRequest {
    /// Desired state of the resource; absent if the caller sent none
    pub desired_resource_state: Option<ResourceModel>,

    /// Idempotency token of the caller, also used as the attempt key
    pub client_request_token: String,

    /// Logical name of the resource in the caller's template
    #[serde(default)]
    pub logical_resource_identifier: Option<String>,

    pub aws_account_id: String,
    pub region: String,

    #[serde(default = "default_partition")]
    pub aws_partition: String,
}

fn default_partition() -> String {
    "aws".to_string()
}

impl ResourceHandlerRequest {
    pub fn new(
        desired_resource_state: Option<ResourceModel>,
        aws_account_id: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            desired_resource_state,
            client_request_token: uuid::Uuid::new_v4().to_string(),
            logical_resource_identifier: None,
            aws_account_id: aws_account_id.into(),
            region: region.into(),
            aws_partition: default_partition(),
        }
    }

    pub fn with_client_request_token(mut self, token: impl Into<String>) -> Self {
        self.client_request_token = token.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_uses_pascal_case_property_names() {
        let model = ResourceModel::new("Org::Mod::Resource::MODULE", "s3://bucket/key")
            .with_arn("arn:predicted:1");
        let json = serde_json::to_value(&model).unwrap();

        assert_eq!(json["ModuleName"], "Org::Mod::Resource::MODULE");
        assert_eq!(json["ModulePackage"], "s3://bucket/key");
        assert_eq!(json["Arn"], "arn:predicted:1");
        assert!(json.get("Description").is_none());
    }

    #[test]
    fn request_defaults_partition() {
        let request: ResourceHandlerRequest = serde_json::from_value(serde_json::json!({
            "desiredResourceState": { "ModuleName": "A::B::C::MODULE" },
            "clientRequestToken": "req-1",
            "awsAccountId": "123456789012",
            "region": "us-east-1"
        }))
        .unwrap();

        assert_eq!(request.aws_partition, "aws");
        let model = request.desired_resource_state.unwrap();
        assert_eq!(model.module_package, None);
        assert_eq!(model.display_name(), "A::B::C::MODULE");
    }
}
