//! Registry client seam
//!
//! The only way this crate talks to the external registry. The transport
//! behind it is the implementor's business.

use async_trait::async_trait;
use modver_types::{
    DescribeTypeRegistrationRequest, DescribeTypeRegistrationResponse, DescribeTypeRequest,
    ListTypeVersionsRequest, RegisterTypeRequest, RegisterTypeResponse, RegistryError,
    TypeDescription, TypeVersionSummary,
};

/// Operations the create workflow needs from the registry
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Start registering a new version. Returns a registration token.
    async fn register_type(
        &self,
        request: RegisterTypeRequest,
    ) -> Result<RegisterTypeResponse, RegistryError>;

    /// Query the status of a registration
    async fn describe_type_registration(
        &self,
        request: DescribeTypeRegistrationRequest,
    ) -> Result<DescribeTypeRegistrationResponse, RegistryError>;

    /// Describe a registered version by ARN
    async fn describe_type(
        &self,
        request: DescribeTypeRequest,
    ) -> Result<TypeDescription, RegistryError>;

    /// List the registered versions of a module
    async fn list_type_versions(
        &self,
        request: ListTypeVersionsRequest,
    ) -> Result<Vec<TypeVersionSummary>, RegistryError>;
}
