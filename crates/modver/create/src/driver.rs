//! Create driver
//!
//! Plays the external scheduler for one creation attempt: invokes the
//! handler, waits the callback delay, persists the continuation state after
//! every step, and stops on the first terminal event or error.

use crate::backoff::{retry_until_terminal, Attempt, Resumable, RetryError};
use crate::error::{CreateError, Result};
use crate::handler::CreateHandler;
use crate::state::ContinuationStore;
use async_trait::async_trait;
use chrono::Utc;
use modver_types::{
    AttemptId, AttemptPhase, CallbackContext, Diagnostic, DiagnosticKind, ProgressEvent,
    ResourceHandlerRequest, ResourceModel,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Outcome of a completed creation attempt
#[derive(Debug, Clone, Serialize)]
pub struct CreateReport {
    pub attempt_id: AttemptId,
    /// Observed state returned by the read workflow
    pub model: ResourceModel,
    pub diagnostics: Vec<Diagnostic>,
    pub poll_count: u32,
    pub elapsed: Duration,
}

impl CreateReport {
    pub fn identifier_mismatch(&self) -> Option<&Diagnostic> {
        self.diagnostics.iter().find(|d| d.is_identifier_mismatch())
    }
}

/// Runs creation attempts to completion
pub struct CreateDriver {
    handler: Arc<CreateHandler>,
    store: Arc<dyn ContinuationStore>,
}

impl CreateDriver {
    /// Create a new driver over a handler and a continuation store
    pub fn new(handler: Arc<CreateHandler>, store: Arc<dyn ContinuationStore>) -> Self {
        Self { handler, store }
    }

    /// Run an attempt until it succeeds, fails, or times out.
    ///
    /// If the store already holds state for `attempt_id` the attempt picks
    /// up where it stopped. Time since the attempt first started counts
    /// against the budget, including time no driver was running.
    #[instrument(skip(self, request), fields(attempt_id = %attempt_id))]
    pub async fn run(
        &self,
        attempt_id: AttemptId,
        request: ResourceHandlerRequest,
    ) -> Result<CreateReport> {
        let context = self.store.load(&attempt_id).await?.unwrap_or_default();
        if let Some(token) = context.registration_token() {
            info!(
                registration_token = %token,
                phase = %context.phase,
                "Resuming module version registration"
            );
        }

        let already_elapsed = context.wall_clock_elapsed(Utc::now());
        let policy = *self.handler.policy();
        let mut attempt = CreateAttempt {
            handler: &self.handler,
            store: self.store.as_ref(),
            attempt_id: &attempt_id,
            request,
            context,
            diagnostics: Vec::new(),
        };

        match retry_until_terminal(&policy, &mut attempt, already_elapsed).await {
            Ok(event) => {
                let model = event
                    .resource_model
                    .or_else(|| attempt.request.desired_resource_state.clone())
                    .unwrap_or_default();
                info!(
                    arn = model.arn.as_deref().unwrap_or_default(),
                    polls = attempt.context.poll_count,
                    "Module version registered"
                );
                Ok(CreateReport {
                    attempt_id: attempt_id.clone(),
                    model,
                    diagnostics: attempt.diagnostics,
                    poll_count: attempt.context.poll_count,
                    elapsed: attempt.context.elapsed,
                })
            }
            Err(RetryError::Step(err)) => {
                error!(code = %err.error_code(), error = %err, "Module version creation failed");
                Err(err)
            }
            Err(RetryError::TimedOut { elapsed, timeout }) => {
                attempt.context.elapsed = elapsed;
                attempt.context.advance(AttemptPhase::Failed);
                self.store.save(&attempt_id, &attempt.context).await?;
                error!(?elapsed, ?timeout, "Module version registration timed out");
                Err(CreateError::Timeout { elapsed, timeout })
            }
        }
    }
}

/// One attempt in flight, advanced one handler invocation per step
struct CreateAttempt<'a> {
    handler: &'a CreateHandler,
    store: &'a dyn ContinuationStore,
    attempt_id: &'a AttemptId,
    request: ResourceHandlerRequest,
    context: CallbackContext,
    diagnostics: Vec<Diagnostic>,
}

#[async_trait]
impl<'a> Resumable for CreateAttempt<'a> {
    type Output = ProgressEvent;
    type Error = CreateError;

    async fn step(&mut self, elapsed: Duration) -> Result<Attempt<ProgressEvent>> {
        self.context.elapsed = elapsed;
        let result = self
            .handler
            .handle_request(&mut self.request, &mut self.context)
            .await;
        self.store.save(self.attempt_id, &self.context).await?;

        let event = result?;
        for diagnostic in &event.diagnostics {
            log_diagnostic(diagnostic);
        }
        self.diagnostics.extend(event.diagnostics.iter().cloned());

        if event.is_in_progress() {
            Ok(Attempt::Pending)
        } else {
            Ok(Attempt::Done(event))
        }
    }
}

fn log_diagnostic(diagnostic: &Diagnostic) {
    match &diagnostic.kind {
        DiagnosticKind::IdentifierMismatch { predicted, actual } => {
            warn!(predicted = %predicted, actual = %actual, "{}", diagnostic.message)
        }
        DiagnosticKind::RegistrationInProgress { .. } => debug!("{}", diagnostic.message),
        _ => info!("{}", diagnostic.message),
    }
}
