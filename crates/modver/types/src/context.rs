//! Continuation state for one creation attempt
//!
//! The scheduler persists this between invocations and passes it back on
//! every re-entry. Once a registration token is recorded it never changes
//! for the rest of the attempt.

use crate::ids::RegistrationToken;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Where a creation attempt currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptPhase {
    #[default]
    Validating,
    Predicting,
    Submitting,
    Polling,
    Reconciling,
    Delegating,
    Done,
    Failed,
}

impl AttemptPhase {
    /// `Done` and `Failed` absorb: nothing moves an attempt out of them
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Predicting => "predicting",
            Self::Submitting => "submitting",
            Self::Polling => "polling",
            Self::Reconciling => "reconciling",
            Self::Delegating => "delegating",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for AttemptPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("registration token already recorded for this attempt: {existing}")]
    TokenAlreadyRecorded { existing: RegistrationToken },
}

/// Persisted across invocations of one creation attempt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackContext {
    registration_token: Option<RegistrationToken>,
    pub phase: AttemptPhase,
    /// Wall-clock time the attempt has consumed, maintained by the scheduler
    #[serde(default)]
    pub elapsed: Duration,
    /// Status queries issued so far
    #[serde(default)]
    pub poll_count: u32,
    /// ARN the registration was submitted with, predicted or supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    known_identifier: Option<String>,
    /// When the attempt first ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,
}

impl CallbackContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registration_token(&self) -> Option<&RegistrationToken> {
        self.registration_token.as_ref()
    }

    /// Record the token returned by submission. Refuses to replace a token
    /// that is already in flight.
    pub fn record_registration_token(
        &mut self,
        token: RegistrationToken,
    ) -> Result<(), ContextError> {
        if let Some(existing) = &self.registration_token {
            return Err(ContextError::TokenAlreadyRecorded {
                existing: existing.clone(),
            });
        }
        self.registration_token = Some(token);
        Ok(())
    }

    pub fn is_submitted(&self) -> bool {
        self.registration_token.is_some()
    }

    pub fn advance(&mut self, phase: AttemptPhase) {
        self.phase = phase;
    }

    pub fn add_elapsed(&mut self, waited: Duration) {
        self.elapsed = self.elapsed.saturating_add(waited);
    }

    pub fn known_identifier(&self) -> Option<&str> {
        self.known_identifier.as_deref()
    }

    /// Remember the ARN the registration goes out with, so a resumed
    /// attempt can report and reconcile it without the caller's model.
    pub fn remember_identifier(&mut self, identifier: impl Into<String>) {
        self.known_identifier = Some(identifier.into());
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Stamp the start of the attempt. Later calls keep the first stamp.
    pub fn mark_started(&mut self, now: DateTime<Utc>) {
        self.started_at.get_or_insert(now);
    }

    /// Time consumed by the attempt as of `now`, including any time the
    /// attempt spent suspended between invocations.
    pub fn wall_clock_elapsed(&self, now: DateTime<Utc>) -> Duration {
        let since_start = self
            .started_at
            .and_then(|started| (now - started).to_std().ok())
            .unwrap_or_default();
        self.elapsed.max(since_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_write_once() {
        let mut ctx = CallbackContext::new();
        assert!(!ctx.is_submitted());

        ctx.record_registration_token(RegistrationToken::new("tok-1"))
            .unwrap();
        let err = ctx
            .record_registration_token(RegistrationToken::new("tok-2"))
            .unwrap_err();

        assert_eq!(
            err,
            ContextError::TokenAlreadyRecorded {
                existing: RegistrationToken::new("tok-1")
            }
        );
        assert_eq!(ctx.registration_token().unwrap().as_str(), "tok-1");
    }

    #[test]
    fn context_survives_serialization() {
        let mut ctx = CallbackContext::new();
        ctx.record_registration_token(RegistrationToken::new("tok-1"))
            .unwrap();
        ctx.advance(AttemptPhase::Polling);
        ctx.add_elapsed(Duration::from_secs(45));
        ctx.poll_count = 3;

        let json = serde_json::to_string(&ctx).unwrap();
        let restored: CallbackContext = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, ctx);
    }

    #[test]
    fn wall_clock_elapsed_counts_suspended_time() {
        let started = Utc::now();
        let mut ctx = CallbackContext::new();
        assert_eq!(ctx.wall_clock_elapsed(started), Duration::ZERO);

        ctx.mark_started(started);
        ctx.mark_started(started + chrono::Duration::minutes(5));
        assert_eq!(ctx.started_at(), Some(started));

        ctx.add_elapsed(Duration::from_secs(30));
        let later = started + chrono::Duration::minutes(40);
        assert_eq!(ctx.wall_clock_elapsed(later), Duration::from_secs(40 * 60));

        // Measured time wins when the clock reads earlier than the stamp
        let skewed = started - chrono::Duration::minutes(1);
        assert_eq!(ctx.wall_clock_elapsed(skewed), Duration::from_secs(30));
    }

    #[test]
    fn identifier_survives_serialization() {
        let mut ctx = CallbackContext::new();
        ctx.remember_identifier("arn:predicted:1");
        ctx.mark_started(Utc::now());

        let json = serde_json::to_string(&ctx).unwrap();
        let restored: CallbackContext = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.known_identifier(), Some("arn:predicted:1"));
        assert_eq!(restored, ctx);
    }

    #[test]
    fn terminal_phases() {
        assert!(AttemptPhase::Done.is_terminal());
        assert!(AttemptPhase::Failed.is_terminal());
        assert!(!AttemptPhase::Polling.is_terminal());
        assert_eq!(AttemptPhase::Reconciling.to_string(), "reconciling");
    }
}
