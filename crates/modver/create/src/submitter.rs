//! Registration submission
//!
//! Issues the registration request once per attempt. Failures are not
//! retried here: whether the registry partially accepted a failed request
//! is unknown, and re-submitting could register a duplicate version. The
//! caller's request token is forwarded so the registry can deduplicate.

use crate::client::RegistryClient;
use crate::error::{CreateError, Result};
use modver_types::{
    CallbackContext, RegisterTypeRequest, RegistrationToken, RegistryType,
    ResourceHandlerRequest, ResourceModel,
};
use std::sync::Arc;
use tracing::warn;

/// Build the registry request for a validated model
pub fn translate_to_create_request(
    request: &ResourceHandlerRequest,
    model: &ResourceModel,
) -> Result<RegisterTypeRequest> {
    let type_name = model
        .module_name
        .clone()
        .ok_or_else(|| CreateError::InvalidRequest("ModuleName is required in ResourceModel".into()))?;
    let schema_handler_package = model.module_package.clone().ok_or_else(|| {
        CreateError::InvalidRequest("ModulePackage is required in ResourceModel".into())
    })?;

    Ok(RegisterTypeRequest {
        registry_type: RegistryType::Module,
        type_name,
        schema_handler_package,
        client_request_token: Some(request.client_request_token.clone()),
    })
}

/// Submits registration requests and records the returned token
pub struct RegistrationSubmitter {
    client: Arc<dyn RegistryClient>,
}

impl RegistrationSubmitter {
    /// Create a new submitter over a registry client
    pub fn new(client: Arc<dyn RegistryClient>) -> Self {
        Self { client }
    }

    /// Submit the registration and record its token in `context`.
    ///
    /// The token is recorded before this returns, so a later invocation
    /// resumes polling instead of submitting again.
    pub async fn submit(
        &self,
        request: &ResourceHandlerRequest,
        model: &ResourceModel,
        context: &mut CallbackContext,
    ) -> Result<RegistrationToken> {
        if let Some(existing) = context.registration_token() {
            return Err(CreateError::InvalidState {
                phase: context.phase,
                reason: format!("registration {} already submitted", existing),
            });
        }

        let register_request = translate_to_create_request(request, model)?;
        let response = self
            .client
            .register_type(register_request)
            .await
            .map_err(|source| {
                warn!(module_name = model.display_name(), error = %source, "Failed to register module");
                CreateError::SubmissionFailed {
                    module_name: model.display_name().to_string(),
                    source,
                }
            })?;

        context.record_registration_token(response.registration_token.clone())?;
        Ok(response.registration_token)
    }
}
