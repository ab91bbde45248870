//! Modver Types - Core types for module version provisioning
//!
//! A module version is a versioned artifact registered with an external
//! registry. Creating one is asynchronous: the registry hands back a
//! registration token and the caller polls it until the registration
//! settles.
//!
//! ## Key Concepts
//!
//! - **ResourceModel**: The module version being created (name, package, ARN)
//! - **CallbackContext**: State carried across handler invocations for one attempt
//! - **RegistrationOutcome**: Classification of a single registration status query
//! - **ProgressEvent**: What a handler invocation reports back to its scheduler
//! - **Diagnostic**: Structured events returned alongside progress, never logged here

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod context;
pub mod ids;
pub mod model;
pub mod progress;
pub mod registration;

// Re-export main types
pub use context::{AttemptPhase, CallbackContext, ContextError};
pub use ids::{AttemptId, RegistrationToken};
pub use model::{ResourceHandlerRequest, ResourceModel, Visibility};
pub use progress::{Diagnostic, DiagnosticKind, HandlerErrorCode, OperationStatus, ProgressEvent};
pub use registration::{
    DescribeTypeRegistrationRequest, DescribeTypeRegistrationResponse, DescribeTypeRequest,
    ListTypeVersionsRequest, RegisterTypeRequest, RegisterTypeResponse, RegistrationOutcome,
    RegistrationStatus, RegistryError, RegistryType, TypeDescription, TypeVersionSummary,
};
