//! Integration tests for lifecycle-driven fleet reconciliation and teardown.

mod common;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use common::{
    context, existing_template, instance, lifecycle_event, TestControl, FUNCTION_ARN, RESPONSE_URL,
    TEMPLATE,
};
use fleetlink_control::provisioner::ProvisionerCall;
use fleetlink_control::{MemoryTopic, MockProvisioner, OperationStatus, TemplateName};
use fleetlink_proto::{FanOutMessage, ResponseStatus};
use serde_json::{json, Value};

#[tokio::test]
async fn create_provisions_template_and_fans_out() {
    let control = TestControl::with(
        MockProvisioner::new(),
        MemoryTopic::new(),
        "111111111111,222222222222",
    );

    let response = control.invoke(lifecycle_event("Create")).await;

    assert_eq!(response["Status"], "SUCCESS");
    assert_eq!(response["Data"]["result"], TEMPLATE);
    assert!(control
        .provisioner
        .has_template(&TemplateName::new(TEMPLATE))
        .unwrap());

    let published = control.topic.published().unwrap();
    assert_eq!(published.len(), 1);
    let message = FanOutMessage::from_json(&published[0].1).unwrap();
    let target = message.target(TEMPLATE).unwrap();
    assert_eq!(target.target_accounts.len(), 2);
    assert_eq!(
        target.target_regions.iter().next().map(|r| r.as_str()),
        Some("us-east-1")
    );

    let responses = control.responder.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].0, RESPONSE_URL);
    assert_eq!(responses[0].1.status, ResponseStatus::Success);
}

#[tokio::test]
async fn create_verifies_template_after_creation() {
    let control = TestControl::new();
    control.invoke(lifecycle_event("Create")).await;

    let calls = control.provisioner.calls().unwrap();
    assert_eq!(
        calls,
        vec![
            ProvisionerCall::DescribeTemplate(TemplateName::new(TEMPLATE)),
            ProvisionerCall::CreateTemplate(TemplateName::new(TEMPLATE)),
            ProvisionerCall::DescribeTemplate(TemplateName::new(TEMPLATE)),
        ]
    );
}

#[tokio::test]
async fn repeated_create_and_update_publish_once() {
    let control = TestControl::new();

    control.invoke(lifecycle_event("Create")).await;
    control.invoke(lifecycle_event("Update")).await;
    let response = control.invoke(lifecycle_event("Create")).await;

    assert_eq!(response["Status"], "SUCCESS");
    assert_eq!(control.topic.published().unwrap().len(), 1);
}

#[tokio::test]
async fn empty_seed_list_publishes_nothing() {
    let control = TestControl::with(MockProvisioner::new(), MemoryTopic::new(), "");

    let response = control.invoke(lifecycle_event("Create")).await;

    assert_eq!(response["Status"], "SUCCESS");
    assert!(control.topic.published().unwrap().is_empty());
}

#[tokio::test]
async fn publish_failure_still_succeeds() {
    let control = TestControl::with(
        MockProvisioner::new(),
        MemoryTopic::new().failing(),
        "111111111111",
    );

    let response = control.invoke(lifecycle_event("Create")).await;

    assert_eq!(response["Status"], "SUCCESS");
    assert_eq!(response["Data"]["result"], TEMPLATE);
}

#[tokio::test]
async fn verification_failure_answers_failed() {
    let control = TestControl::with(
        MockProvisioner::new().losing_created_templates(),
        MemoryTopic::new(),
        "111111111111",
    );

    let response = control.invoke(lifecycle_event("Create")).await;

    assert_eq!(response["Status"], "FAILED");
    assert!(response["Reason"].as_str().unwrap().contains("not found"));
    assert!(control.topic.published().unwrap().is_empty());
}

#[tokio::test]
async fn physical_id_is_reused() {
    let control = TestControl::new();
    let mut event = lifecycle_event("Update");
    event["PhysicalResourceId"] = json!("Onboarding-existing");

    let response = control.invoke(event).await;

    assert_eq!(response["PhysicalResourceId"], "Onboarding-existing");
}

#[tokio::test]
async fn delete_removes_instances_then_template() {
    let control = TestControl::with(
        MockProvisioner::new()
            .with_template(existing_template())
            .with_instance(instance("111111111111", "us-east-1"))
            .with_instance(instance("222222222222", "us-east-1"))
            .with_instance(instance("222222222222", "eu-west-1"))
            .with_operation_statuses([OperationStatus::Running, OperationStatus::Succeeded]),
        MemoryTopic::new(),
        "",
    );

    let response = control.invoke(lifecycle_event("Delete")).await;

    assert_eq!(response["Status"], "SUCCESS");
    assert!(control.provisioner.instances().unwrap().is_empty());
    assert!(!control
        .provisioner
        .has_template(&TemplateName::new(TEMPLATE))
        .unwrap());

    let calls = control.provisioner.calls().unwrap();
    let deletes: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            ProvisionerCall::DeleteInstances {
                accounts,
                regions,
                retain_stacks,
                ..
            } => Some((accounts.len(), regions.len(), *retain_stacks)),
            _ => None,
        })
        .collect();
    assert_eq!(deletes, vec![(2, 2, false)]);
}

#[tokio::test]
async fn delete_without_instances_skips_instance_deletion() {
    let control = TestControl::with(
        MockProvisioner::new().with_template(existing_template()),
        MemoryTopic::new(),
        "",
    );

    let response = control.invoke(lifecycle_event("Delete")).await;

    assert_eq!(response["Status"], "SUCCESS");
    let calls = control.provisioner.calls().unwrap();
    assert!(!calls
        .iter()
        .any(|c| matches!(c, ProvisionerCall::DeleteInstances { .. })));
    assert!(calls
        .iter()
        .any(|c| matches!(c, ProvisionerCall::DeleteTemplate(_))));
}

#[tokio::test]
async fn delete_of_missing_template_succeeds() {
    let control = TestControl::new();

    let response = control.invoke(lifecycle_event("Delete")).await;

    assert_eq!(response["Status"], "SUCCESS");
    assert_eq!(control.provisioner.calls().unwrap().len(), 1);
}

#[tokio::test]
async fn delete_answers_success_when_teardown_fails() {
    let control = TestControl::with(
        MockProvisioner::new()
            .with_template(existing_template())
            .failing_list(),
        MemoryTopic::new(),
        "",
    );

    let response = control.invoke(lifecycle_event("Delete")).await;

    assert_eq!(response["Status"], "SUCCESS");
    assert!(control
        .provisioner
        .has_template(&TemplateName::new(TEMPLATE))
        .unwrap());
}

#[tokio::test]
async fn template_delete_failure_is_not_fatal() {
    let control = TestControl::with(
        MockProvisioner::new()
            .with_template(existing_template())
            .failing_template_delete(),
        MemoryTopic::new(),
        "",
    );

    let response = control.invoke(lifecycle_event("Delete")).await;
    assert_eq!(response["Status"], "SUCCESS");
}

#[tokio::test]
async fn unknown_request_type_answers_failed() {
    let control = TestControl::new();

    let response = control.invoke(lifecycle_event("Rollback")).await;

    assert_eq!(response["Status"], "FAILED");
    assert!(control.provisioner.calls().unwrap().is_empty());
}

#[tokio::test]
async fn non_lifecycle_event_is_ignored() {
    let control = TestControl::new();

    let response = control.invoke(json!({"detail-type": "Scheduled Event"})).await;

    assert_eq!(response, Value::Null);
    assert!(control.responder.responses().is_empty());
}

#[tokio::test]
async fn missing_response_url_still_runs_workflow() {
    let control = TestControl::new();
    let mut event = lifecycle_event("Create");
    event.as_object_mut().unwrap().remove("ResponseURL");

    let response = control.invoke(event).await;

    assert_eq!(response["Status"], "SUCCESS");
    assert!(control.responder.responses().is_empty());
}

fn deadline_in(remaining: Duration) -> u64 {
    let deadline = SystemTime::now() + remaining;
    deadline
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis()
        .try_into()
        .unwrap()
}

#[tokio::test]
async fn undecodable_request_is_answered_failed() {
    let control = TestControl::new();
    let mut event = lifecycle_event("Create");
    event["ResourceProperties"] = json!("not-an-object");

    let response = control
        .service
        .invoke(event, &context(Duration::from_secs(60)))
        .await
        .unwrap();

    assert_eq!(response["Status"], "FAILED");
    assert_eq!(response["RequestId"], "req-1");
    assert_eq!(response["LogicalResourceId"], "Onboarding");

    let responses = control.responder.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].0, RESPONSE_URL);
    assert_eq!(responses[0].1.status, ResponseStatus::Failed);
    assert!(control.provisioner.calls().unwrap().is_empty());
}

#[tokio::test]
async fn undecodable_request_without_response_url_is_an_error() {
    let control = TestControl::new();
    let mut event = lifecycle_event("Create");
    event["ResourceProperties"] = json!(["not", "an", "object"]);
    event.as_object_mut().unwrap().remove("ResponseURL");

    let result = control
        .service
        .invoke(event, &context(Duration::from_secs(60)))
        .await;

    assert!(result.is_err());
    assert!(control.responder.responses().is_empty());
}

#[tokio::test]
async fn bad_function_arn_is_answered_failed() {
    let control = TestControl::new();

    let response = control
        .service
        .invoke_with_arn(
            lifecycle_event("Create"),
            "not-a-function-arn",
            deadline_in(Duration::from_secs(60)),
        )
        .await
        .unwrap();

    assert_eq!(response["Status"], "FAILED");
    let responses = control.responder.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].1.status, ResponseStatus::Failed);
    assert!(control.provisioner.calls().unwrap().is_empty());
}

#[tokio::test]
async fn function_arn_drives_region_and_account() {
    let control = TestControl::new();

    let response = control
        .service
        .invoke_with_arn(
            lifecycle_event("Create"),
            FUNCTION_ARN,
            deadline_in(Duration::from_secs(60)),
        )
        .await
        .unwrap();

    assert_eq!(response["Status"], "SUCCESS");
    let published = control.topic.published().unwrap();
    let message = FanOutMessage::from_json(&published[0].1).unwrap();
    assert_eq!(
        message
            .target(TEMPLATE)
            .unwrap()
            .target_regions
            .iter()
            .next()
            .map(|r| r.as_str()),
        Some("us-east-1")
    );
}

#[tokio::test]
async fn bad_function_arn_on_other_events_is_an_error() {
    let control = TestControl::new();

    let result = control
        .service
        .invoke_with_arn(json!({ "source": "aws.events" }), "bad", 0)
        .await;

    assert!(result.is_err());
    assert!(control.responder.responses().is_empty());
}
