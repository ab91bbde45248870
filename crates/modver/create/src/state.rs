//! Continuation state persistence
//!
//! The scheduler keeps each attempt's `CallbackContext` between
//! invocations. A restarted driver loads it back and resumes polling
//! instead of submitting a second registration.

use async_trait::async_trait;
use dashmap::DashMap;
use modver_types::{AttemptId, CallbackContext};

/// Store for continuation state, keyed by attempt
#[async_trait]
pub trait ContinuationStore: Send + Sync {
    /// Load the state of an attempt, if any was saved
    async fn load(&self, id: &AttemptId) -> Result<Option<CallbackContext>, StoreError>;

    /// Save (or replace) the state of an attempt
    async fn save(&self, id: &AttemptId, context: &CallbackContext) -> Result<(), StoreError>;

    /// Forget an attempt
    async fn remove(&self, id: &AttemptId) -> Result<(), StoreError>;
}

/// State store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),
}

/// In-memory implementation for local runs and tests
pub struct InMemoryContinuationStore {
    contexts: DashMap<AttemptId, CallbackContext>,
}

impl InMemoryContinuationStore {
    /// Create a new in-memory continuation store
    pub fn new() -> Self {
        Self {
            contexts: DashMap::new(),
        }
    }

    /// Number of attempts with saved state
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Check if no attempt has saved state
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

impl Default for InMemoryContinuationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContinuationStore for InMemoryContinuationStore {
    async fn load(&self, id: &AttemptId) -> Result<Option<CallbackContext>, StoreError> {
        Ok(self.contexts.get(id).map(|c| c.clone()))
    }

    async fn save(&self, id: &AttemptId, context: &CallbackContext) -> Result<(), StoreError> {
        self.contexts.insert(id.clone(), context.clone());
        Ok(())
    }

    async fn remove(&self, id: &AttemptId) -> Result<(), StoreError> {
        self.contexts
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}
