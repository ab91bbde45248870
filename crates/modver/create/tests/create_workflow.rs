//! End-to-end creation attempts against the simulated registry

use async_trait::async_trait;
use modver_create::{
    ConstantBackoff, CreateDriver, CreateError, CreateHandler, DescribeTypeReadHandler,
    IdentifierPredictor, InMemoryContinuationStore, SimulatedRegistry,
};
use modver_types::{
    AttemptId, AttemptPhase, CallbackContext, DiagnosticKind, HandlerErrorCode,
    RegistrationStatus, ResourceHandlerRequest, ResourceModel,
};
use std::sync::Arc;
use std::time::Duration;

const ACCOUNT: &str = "123456789012";
const REGION: &str = "us-east-1";

struct StaticPredictor(&'static str);

#[async_trait]
impl IdentifierPredictor for StaticPredictor {
    async fn predict(
        &self,
        _request: &ResourceHandlerRequest,
        _model: &ResourceModel,
    ) -> Option<String> {
        Some(self.0.to_string())
    }
}

fn handler_with_prediction(registry: Arc<SimulatedRegistry>, predicted: &'static str) -> CreateHandler {
    CreateHandler::with_components(
        registry.clone(),
        Arc::new(StaticPredictor(predicted)),
        Arc::new(DescribeTypeReadHandler::new(registry)),
        ConstantBackoff::default(),
    )
}

fn request(model: ResourceModel) -> ResourceHandlerRequest {
    ResourceHandlerRequest::new(Some(model), ACCOUNT, REGION)
}

#[tokio::test(start_paused = true)]
async fn predicted_identifier_is_replaced_by_actual_one() {
    let registry = Arc::new(
        SimulatedRegistry::new(REGION, ACCOUNT)
            .with_in_progress_polls(1)
            .with_assigned_arn("arn:actual:1"),
    );
    let driver = CreateDriver::new(
        Arc::new(handler_with_prediction(registry.clone(), "arn:predicted:1")),
        Arc::new(InMemoryContinuationStore::new()),
    );

    let report = driver
        .run(
            AttemptId::new("req-1"),
            request(ResourceModel::new("Org::Mod::Resource", "s3://bucket/key")),
        )
        .await
        .unwrap();

    assert_eq!(report.model.arn.as_deref(), Some("arn:actual:1"));
    assert_eq!(report.poll_count, 2);

    let mismatches: Vec<_> = report
        .diagnostics
        .iter()
        .filter(|d| d.is_identifier_mismatch())
        .collect();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(
        mismatches[0].kind,
        DiagnosticKind::IdentifierMismatch {
            predicted: "arn:predicted:1".into(),
            actual: "arn:actual:1".into(),
        }
    );
    assert!(report.diagnostics.iter().any(|d| matches!(
        &d.kind,
        DiagnosticKind::RegistrationSubmitted { registration_token } if registration_token == "tok-1"
    )));

    let calls = registry.calls();
    assert_eq!(calls.register_type, 1);
    assert_eq!(calls.describe_type_registration, 2);
    assert_eq!(calls.describe_type, 1);
}

#[tokio::test(start_paused = true)]
async fn failed_registration_references_predicted_identifier() {
    let registry = Arc::new(
        SimulatedRegistry::new(REGION, ACCOUNT).with_final_status(RegistrationStatus::Failed),
    );
    let driver = CreateDriver::new(
        Arc::new(handler_with_prediction(registry.clone(), "arn:predicted:1")),
        Arc::new(InMemoryContinuationStore::new()),
    );

    let err = driver
        .run(
            AttemptId::new("req-1"),
            request(ResourceModel::new("Org::Mod::Resource", "s3://bucket/key")),
        )
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), HandlerErrorCode::NotStabilized);
    match err {
        CreateError::NotStabilized {
            type_name,
            identifier,
        } => {
            assert_eq!(type_name, "AWS::CloudFormation::ModuleVersion");
            assert_eq!(identifier, "arn:predicted:1");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(registry.calls().describe_type_registration, 1);
    assert_eq!(registry.calls().describe_type, 0);
}

#[tokio::test]
async fn missing_package_is_rejected_without_calls() {
    let registry = Arc::new(SimulatedRegistry::new(REGION, ACCOUNT));
    let handler = CreateHandler::new(registry.clone(), ConstantBackoff::default());
    let mut req = request(ResourceModel {
        module_name: Some("Org::Mod::Resource".into()),
        module_package: None,
        ..Default::default()
    });
    let mut context = CallbackContext::new();

    let err = handler
        .handle_request(&mut req, &mut context)
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), HandlerErrorCode::InvalidRequest);
    assert_eq!(
        err.to_string(),
        "Invalid request: ModulePackage is required in ResourceModel"
    );
    assert_eq!(registry.calls().total(), 0);
    assert_eq!(context.phase, AttemptPhase::Failed);
}

#[tokio::test(start_paused = true)]
async fn next_version_is_predicted_from_registered_versions() {
    let registry = Arc::new(
        SimulatedRegistry::new(REGION, ACCOUNT).with_existing_version("Org::Mod::Resource::MODULE", 7),
    );
    let driver = CreateDriver::new(
        Arc::new(CreateHandler::new(registry.clone(), ConstantBackoff::default())),
        Arc::new(InMemoryContinuationStore::new()),
    );

    let report = driver
        .run(
            AttemptId::generate(),
            request(ResourceModel::new("Org::Mod::Resource::MODULE", "s3://bucket/key")),
        )
        .await
        .unwrap();

    assert_eq!(
        report.model.arn.as_deref(),
        Some("arn:aws:cloudformation:us-east-1:123456789012:type/module/Org-Mod-Resource-MODULE/00000008")
    );
    assert_eq!(report.model.version_id.as_deref(), Some("00000008"));
    assert_eq!(report.model.is_default_version, Some(false));
    assert!(report.identifier_mismatch().is_none());
    assert_eq!(registry.calls().list_type_versions, 1);
}

#[tokio::test(start_paused = true)]
async fn short_budget_times_out_distinctly_from_failure() {
    let registry = Arc::new(SimulatedRegistry::new(REGION, ACCOUNT).with_in_progress_polls(50));
    let handler = CreateHandler::new(
        registry.clone(),
        ConstantBackoff::new(Duration::from_secs(5), Duration::from_secs(20)),
    );
    let driver = CreateDriver::new(Arc::new(handler), Arc::new(InMemoryContinuationStore::new()));

    let err = driver
        .run(
            AttemptId::new("req-1"),
            request(ResourceModel::new("Org::Mod::Resource::MODULE", "s3://bucket/key")),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CreateError::Timeout { .. }));
    assert_eq!(err.error_code(), HandlerErrorCode::Timeout);
    assert_eq!(registry.calls().register_type, 1);
    assert_eq!(registry.calls().describe_type_registration, 3);
}
