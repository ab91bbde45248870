//! Modver Create - provisioning of new module versions
//!
//! Creating a module version is a submit-then-poll workflow against an
//! external registry:
//!
//! 1. Validate the desired model
//! 2. Predict the ARN the registry will assign, unless one was supplied
//! 3. Submit the registration and remember its token
//! 4. Poll the token until the registration settles
//! 5. Reconcile the predicted ARN with the authoritative one
//! 6. Hand off to the read workflow for the final observed state
//!
//! [`CreateHandler`] performs one of these units of work per invocation and
//! keeps its progress in a [`CallbackContext`](modver_types::CallbackContext).
//! [`CreateDriver`] plays the scheduler around it.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod backoff;
pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod handler;
pub mod poller;
pub mod predictor;
pub mod read;
pub mod simulated;
pub mod state;
pub mod submitter;
pub mod telemetry;

pub use backoff::{retry_until_terminal, Attempt, ConstantBackoff, Resumable, RetryError};
pub use client::RegistryClient;
pub use config::{BackoffConfig, HandlerConfig, LoggingConfig};
pub use driver::{CreateDriver, CreateReport};
pub use error::{CreateError, Result};
pub use handler::{reconcile, validate_model, CreateHandler};
pub use poller::{classify, StabilizationPoller};
pub use predictor::{module_version_arn, ArnPredictor, IdentifierPredictor};
pub use read::{DescribeTypeReadHandler, ReadHandler};
pub use simulated::{CallCounts, SimulatedRegistry};
pub use state::{ContinuationStore, InMemoryContinuationStore, StoreError};
pub use submitter::{translate_to_create_request, RegistrationSubmitter};
