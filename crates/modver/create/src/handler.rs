//! Create handler - the orchestrator of one creation attempt
//!
//! Each invocation does one unit of work and returns: the first invocation
//! validates, predicts the ARN if needed and submits the registration;
//! every later invocation issues one status query. The scheduler waits
//! `callback_delay` between invocations and passes the same
//! `CallbackContext` back each time.
//!
//! ```text
//! Validating -> Predicting? -> Submitting -> Polling* -> Reconciling -> Delegating -> Done
//!      \____________\_______________\____________\_____________\______________> Failed
//! ```

use crate::backoff::ConstantBackoff;
use crate::client::RegistryClient;
use crate::error::{CreateError, Result};
use crate::poller::StabilizationPoller;
use crate::predictor::{ArnPredictor, IdentifierPredictor};
use crate::read::{DescribeTypeReadHandler, ReadHandler};
use crate::submitter::RegistrationSubmitter;
use chrono::Utc;
use modver_types::{
    AttemptPhase, CallbackContext, Diagnostic, DiagnosticKind, ProgressEvent,
    RegistrationOutcome, ResourceHandlerRequest, ResourceModel,
};
use std::sync::Arc;

/// Check the two preconditions this workflow owns
pub fn validate_model(model: Option<&ResourceModel>) -> Result<&ResourceModel> {
    let model =
        model.ok_or_else(|| CreateError::InvalidRequest("ResourceModel is required".into()))?;
    if model.module_package.is_none() {
        return Err(CreateError::InvalidRequest(
            "ModulePackage is required in ResourceModel".into(),
        ));
    }
    Ok(model)
}

/// Replace the model's identifier with the authoritative one.
///
/// Returns a mismatch diagnostic when a different identifier was replaced.
pub fn reconcile(model: &mut ResourceModel, authoritative: &str) -> Option<Diagnostic> {
    if model.arn.as_deref() == Some(authoritative) {
        return None;
    }
    let predicted = model.arn.replace(authoritative.to_string())?;
    Some(Diagnostic::new(
        DiagnosticKind::IdentifierMismatch {
            predicted: predicted.clone(),
            actual: authoritative.to_string(),
        },
        format!(
            "Predicted ARN of module version does not match actual ARN of module version, predicted={} actual={}",
            predicted, authoritative
        ),
    ))
}

/// Drives one creation attempt through its phases
pub struct CreateHandler {
    predictor: Arc<dyn IdentifierPredictor>,
    submitter: RegistrationSubmitter,
    poller: StabilizationPoller,
    read_handler: Arc<dyn ReadHandler>,
    policy: ConstantBackoff,
}

impl CreateHandler {
    /// Handler with the registry-backed predictor and read workflow
    pub fn new(client: Arc<dyn RegistryClient>, policy: ConstantBackoff) -> Self {
        Self::with_components(
            client.clone(),
            Arc::new(ArnPredictor::new(client.clone())),
            Arc::new(DescribeTypeReadHandler::new(client)),
            policy,
        )
    }

    pub fn with_components(
        client: Arc<dyn RegistryClient>,
        predictor: Arc<dyn IdentifierPredictor>,
        read_handler: Arc<dyn ReadHandler>,
        policy: ConstantBackoff,
    ) -> Self {
        Self {
            predictor,
            submitter: RegistrationSubmitter::new(client.clone()),
            poller: StabilizationPoller::new(client),
            read_handler,
            policy,
        }
    }

    pub fn policy(&self) -> &ConstantBackoff {
        &self.policy
    }

    /// Run one unit of work for the attempt described by `context`.
    ///
    /// The request's model is updated in place as the ARN becomes known.
    /// Any error leaves the attempt in `AttemptPhase::Failed`.
    pub async fn handle_request(
        &self,
        request: &mut ResourceHandlerRequest,
        context: &mut CallbackContext,
    ) -> Result<ProgressEvent> {
        if context.phase.is_terminal() {
            return Err(CreateError::InvalidState {
                phase: context.phase,
                reason: "attempt already finished".into(),
            });
        }

        let result = if context.is_submitted() {
            self.poll_step(request, context).await
        } else {
            self.submit_step(request, context).await
        };

        if result.is_err() {
            context.advance(AttemptPhase::Failed);
        }
        result
    }

    async fn submit_step(
        &self,
        request: &mut ResourceHandlerRequest,
        context: &mut CallbackContext,
    ) -> Result<ProgressEvent> {
        context.advance(AttemptPhase::Validating);
        context.mark_started(Utc::now());
        let model = validate_model(request.desired_resource_state.as_ref())?;
        let mut diagnostics = Vec::new();

        if model.arn.is_none() {
            context.advance(AttemptPhase::Predicting);
            let arn = self.predictor.predict(request, model).await.ok_or_else(|| {
                CreateError::PredictionFailed {
                    module_name: model.display_name().to_string(),
                }
            })?;
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::IdentifierPredicted {
                    identifier: arn.clone(),
                },
                format!("Predicted ARN {} for new version of module {}", arn, model.display_name()),
            ));
            if let Some(model) = request.desired_resource_state.as_mut() {
                model.arn = Some(arn);
            }
        }

        context.advance(AttemptPhase::Submitting);
        let model = validate_model(request.desired_resource_state.as_ref())?;
        if let Some(arn) = &model.arn {
            context.remember_identifier(arn.clone());
        }
        let token = self.submitter.submit(request, model, context).await?;
        context.advance(AttemptPhase::Polling);

        diagnostics.push(Diagnostic::new(
            DiagnosticKind::RegistrationSubmitted {
                registration_token: token.to_string(),
            },
            format!(
                "Registering new version of module {} with registration token {}",
                model.display_name(),
                token
            ),
        ));

        Ok(ProgressEvent::in_progress(model.clone(), self.policy.delay())
            .with_diagnostics(diagnostics))
    }

    async fn poll_step(
        &self,
        request: &mut ResourceHandlerRequest,
        context: &mut CallbackContext,
    ) -> Result<ProgressEvent> {
        validate_model(request.desired_resource_state.as_ref())?;
        if let (Some(model), Some(known)) = (
            request.desired_resource_state.as_mut(),
            context.known_identifier(),
        ) {
            if model.arn.is_none() {
                model.arn = Some(known.to_string());
            }
        }
        let model = validate_model(request.desired_resource_state.as_ref())?.clone();
        let token = context
            .registration_token()
            .cloned()
            .ok_or_else(|| CreateError::InvalidState {
                phase: context.phase,
                reason: "no registration token to poll".into(),
            })?;

        let elapsed = context.wall_clock_elapsed(Utc::now());
        if self.policy.is_expired(elapsed) {
            return Err(CreateError::Timeout {
                elapsed,
                timeout: self.policy.timeout(),
            });
        }

        context.advance(AttemptPhase::Polling);
        context.poll_count += 1;
        let outcome = self.poller.poll(&token, &model).await?;

        match outcome {
            RegistrationOutcome::InProgress { description } => {
                let diagnostic = Diagnostic::new(
                    DiagnosticKind::RegistrationInProgress {
                        registration_token: token.to_string(),
                    },
                    format!(
                        "Module version registration for {} with registration token {} in progress: {}",
                        model.display_name(),
                        token,
                        description.unwrap_or_default()
                    ),
                );
                Ok(ProgressEvent::in_progress(model, self.policy.delay())
                    .with_diagnostics(vec![diagnostic]))
            }
            RegistrationOutcome::Complete {
                identifier,
                description,
            } => {
                context.advance(AttemptPhase::Reconciling);
                let mut diagnostics = vec![Diagnostic::new(
                    DiagnosticKind::RegistrationStabilized {
                        registration_token: token.to_string(),
                        identifier: identifier.clone(),
                    },
                    format!(
                        "Module version registration for {} with registration token {} stabilized: {}",
                        model.display_name(),
                        token,
                        description.unwrap_or_default()
                    ),
                )];
                if let Some(model) = request.desired_resource_state.as_mut() {
                    diagnostics.extend(reconcile(model, &identifier));
                }

                context.advance(AttemptPhase::Delegating);
                let event = self.read_handler.read(request, context).await?;
                context.advance(AttemptPhase::Done);
                Ok(event.with_diagnostics(diagnostics))
            }
            RegistrationOutcome::Failed { .. } => match model.arn {
                Some(identifier) => Err(CreateError::NotStabilized {
                    type_name: ResourceModel::TYPE_NAME.to_string(),
                    identifier,
                }),
                None => Err(CreateError::InvalidState {
                    phase: context.phase,
                    reason: "registration failed with no known identifier".into(),
                }),
            },
            RegistrationOutcome::Unknown { status, .. } => {
                Err(CreateError::UnexpectedStatus { status })
            }
        }
    }
}
