//! Integration tests for queue-driven account registration.

mod common;

use common::{
    fan_out, sns_batch, spoke_request, vendor, TestRegistrar, INPUT_TYPE, RESPONSE_URL,
    VENDOR_ACCOUNT,
};
use fleetlink_proto::ResponseStatus;
use fleetlink_registrar::{LinkBehaviour, MemoryDeadLetterQueue, MemoryVendor, VendorCall};
use serde_json::json;

fn configure_calls(calls: &[VendorCall]) -> Vec<&VendorCall> {
    calls
        .iter()
        .filter(|c| matches!(c, VendorCall::Configure { .. }))
        .collect()
}

fn link_calls(calls: &[VendorCall]) -> Vec<&VendorCall> {
    calls
        .iter()
        .filter(|c| matches!(c, VendorCall::Link { .. }))
        .collect()
}

#[tokio::test]
async fn fan_out_links_and_configures_every_integration() {
    let registrar = TestRegistrar::new().await;

    let report = registrar
        .invoke(sns_batch(&[fan_out(&["111111111111"])]))
        .await;

    assert_eq!(report["messages"], 1);
    assert_eq!(report["registered"], 1);
    assert_eq!(report["dead_lettered"], 0);

    let calls = registrar.vendor.calls().unwrap();
    assert_eq!(link_calls(&calls).len(), 1);
    match link_calls(&calls)[0] {
        VendorCall::Link {
            vendor_account,
            account,
        } => {
            assert_eq!(*vendor_account, VENDOR_ACCOUNT);
            assert_eq!(account.name, "111111111111");
            assert_eq!(
                account.arn,
                "arn:aws:iam::111111111111:role/NewRelicIntegrationRole_2345678"
            );
        }
        other => panic!("expected link, got {other:?}"),
    }

    let configures = configure_calls(&calls);
    assert_eq!(configures.len(), 1);
    assert_eq!(
        configures[0],
        &VendorCall::Configure {
            vendor_account: VENDOR_ACCOUNT,
            slugs: vec!["cloudtrail".to_owned(), "ec2".to_owned()],
            linked_account_id: Some(1000),
        }
    );

    assert!(registrar.dead_letters().is_empty());
}

#[tokio::test]
async fn every_account_in_a_fan_out_is_registered() {
    let registrar = TestRegistrar::new().await;

    let report = registrar
        .invoke(sns_batch(&[fan_out(&["222222222222", "111111111111"])]))
        .await;

    assert_eq!(report["registered"], 2);
    let calls = registrar.vendor.calls().unwrap();
    let linked: Vec<&str> = link_calls(&calls)
        .into_iter()
        .filter_map(|c| match c {
            VendorCall::Link { account, .. } => Some(account.name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(linked, ["111111111111", "222222222222"]);
}

#[tokio::test]
async fn missing_credential_dead_letters_without_vendor_calls() {
    let registrar = TestRegistrar::with(vendor(), MemoryDeadLetterQueue::new(), false).await;
    let body = fan_out(&["111111111111"]);

    let report = registrar.invoke(sns_batch(&[body.clone()])).await;

    assert_eq!(report["dead_lettered"], 1);
    assert!(registrar.vendor.calls().unwrap().is_empty());
    assert_eq!(registrar.dead_letters(), [body]);
}

#[tokio::test]
async fn already_linked_account_is_not_an_error() {
    let registrar = TestRegistrar::with(
        vendor().with_link_behaviour(LinkBehaviour::AlreadyLinked),
        MemoryDeadLetterQueue::new(),
        true,
    )
    .await;

    let report = registrar
        .invoke(sns_batch(&[fan_out(&["111111111111"])]))
        .await;

    assert_eq!(report["already_linked"], 1);
    assert_eq!(report["dead_lettered"], 0);
    assert!(configure_calls(&registrar.vendor.calls().unwrap()).is_empty());
    assert!(registrar.dead_letters().is_empty());
}

#[tokio::test]
async fn missing_schema_type_stops_before_linking() {
    let registrar = TestRegistrar::with(
        MemoryVendor::new().with_input_type("CloudGcpIntegrationsInput", ["gcp_storage"]),
        MemoryDeadLetterQueue::new(),
        true,
    )
    .await;
    let body = fan_out(&["111111111111"]);

    let report = registrar.invoke(sns_batch(&[body.clone()])).await;

    assert_eq!(report["dead_lettered"], 1);
    assert_eq!(
        registrar.vendor.calls().unwrap(),
        vec![VendorCall::Introspect]
    );
    assert_eq!(registrar.dead_letters(), [body]);
}

#[tokio::test]
async fn link_without_id_is_dead_lettered() {
    let registrar = TestRegistrar::with(
        vendor().with_link_behaviour(LinkBehaviour::Empty),
        MemoryDeadLetterQueue::new(),
        true,
    )
    .await;

    let report = registrar
        .invoke(sns_batch(&[fan_out(&["111111111111"])]))
        .await;

    assert_eq!(report["dead_lettered"], 1);
    assert!(configure_calls(&registrar.vendor.calls().unwrap()).is_empty());
    assert_eq!(registrar.dead_letters().len(), 1);
}

#[tokio::test]
async fn link_failure_dead_letters_whole_message_once() {
    let registrar = TestRegistrar::with(
        vendor().with_link_behaviour(LinkBehaviour::Fail),
        MemoryDeadLetterQueue::new(),
        true,
    )
    .await;
    let body = fan_out(&["111111111111", "222222222222"]);

    registrar.invoke(sns_batch(&[body.clone()])).await;

    assert_eq!(link_calls(&registrar.vendor.calls().unwrap()).len(), 1);
    assert_eq!(registrar.dead_letters(), [body]);
}

#[tokio::test]
async fn integration_errors_do_not_fail_registration() {
    let registrar = TestRegistrar::with(
        vendor().with_configure_errors(["Integration ec2 is not available"]),
        MemoryDeadLetterQueue::new(),
        true,
    )
    .await;

    let report = registrar
        .invoke(sns_batch(&[fan_out(&["111111111111"])]))
        .await;

    assert_eq!(report["registered"], 1);
    assert!(registrar.dead_letters().is_empty());
}

#[tokio::test]
async fn dead_letter_failure_is_only_logged() {
    let registrar =
        TestRegistrar::with(vendor(), MemoryDeadLetterQueue::new().failing(), false).await;

    let report = registrar
        .invoke(sns_batch(&[fan_out(&["111111111111"])]))
        .await;

    assert_eq!(report["dead_lettered"], 1);
    assert!(registrar.dead_letters().is_empty());
}

#[tokio::test]
async fn spoke_create_registers_source_account_and_responds() {
    let registrar = TestRegistrar::new().await;
    let body = spoke_request("Create", "333333333333").to_string();

    let report = registrar.invoke(sns_batch(&[body])).await;

    assert_eq!(report["registered"], 1);
    let calls = registrar.vendor.calls().unwrap();
    assert!(matches!(
        link_calls(&calls)[0],
        VendorCall::Link { account, .. } if account.name == "333333333333"
    ));

    let responses = registrar.responder.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].0, RESPONSE_URL);
    assert_eq!(responses[0].1.status, ResponseStatus::Success);
}

#[tokio::test]
async fn spoke_delete_is_skipped_but_answered() {
    let registrar = TestRegistrar::new().await;
    let body = spoke_request("Delete", "333333333333").to_string();

    let report = registrar.invoke(sns_batch(&[body])).await;

    assert_eq!(report["skipped"], 1);
    assert!(registrar.vendor.calls().unwrap().is_empty());
    assert_eq!(registrar.responder.responses().len(), 1);
}

#[tokio::test]
async fn spoke_create_without_source_account_is_dead_lettered() {
    let registrar = TestRegistrar::new().await;
    let mut request = spoke_request("Create", "333333333333");
    request["ResourceProperties"] = json!({});
    let body = request.to_string();

    let report = registrar.invoke(sns_batch(&[body.clone()])).await;

    assert_eq!(report["dead_lettered"], 1);
    assert_eq!(registrar.dead_letters(), [body]);
    assert_eq!(
        registrar.responder.responses()[0].1.status,
        ResponseStatus::Success
    );
}

#[tokio::test]
async fn malformed_message_is_dead_lettered_verbatim() {
    let registrar = TestRegistrar::new().await;

    let report = registrar
        .invoke(sns_batch(&["not json".to_owned()]))
        .await;

    assert_eq!(report["dead_lettered"], 1);
    assert_eq!(registrar.dead_letters(), ["not json"]);
}

#[tokio::test]
async fn mixed_batch_is_counted_per_message() {
    let registrar = TestRegistrar::new().await;

    let report = registrar
        .invoke(sns_batch(&[
            fan_out(&["111111111111"]),
            spoke_request("Update", "222222222222").to_string(),
            "{}".to_owned(),
        ]))
        .await;

    assert_eq!(report["messages"], 3);
    assert_eq!(report["registered"], 1);
    assert_eq!(report["skipped"], 1);
    assert_eq!(report["dead_lettered"], 1);
}

#[tokio::test]
async fn queue_records_carry_message_in_body() {
    let registrar = TestRegistrar::new().await;

    let report = registrar
        .invoke(json!({
            "Records": [{
                "messageId": "sqs-1",
                "eventSource": "aws:sqs",
                "body": fan_out(&["111111111111"])
            }]
        }))
        .await;

    assert_eq!(report["registered"], 1);
}

#[tokio::test]
async fn direct_lifecycle_request_is_handled() {
    let registrar = TestRegistrar::new().await;

    let report = registrar
        .invoke(spoke_request("Create", "444444444444"))
        .await;

    assert_eq!(report["registered"], 1);
    assert_eq!(registrar.responder.responses().len(), 1);
}

#[tokio::test]
async fn unrelated_event_is_ignored() {
    let registrar = TestRegistrar::new().await;

    let report = registrar.invoke(json!({ "detail-type": "Scheduled Event" })).await;

    assert!(report.is_null());
    assert!(registrar.vendor.calls().unwrap().is_empty());
}

#[tokio::test]
async fn schema_is_read_from_configured_input_type() {
    let registrar = TestRegistrar::with(
        MemoryVendor::new().with_input_type(INPUT_TYPE, ["s3"]),
        MemoryDeadLetterQueue::new(),
        true,
    )
    .await;

    registrar
        .invoke(sns_batch(&[fan_out(&["111111111111"])]))
        .await;

    let calls = registrar.vendor.calls().unwrap();
    assert!(matches!(
        configure_calls(&calls)[0],
        VendorCall::Configure { slugs, .. } if slugs == &["s3".to_owned()]
    ));
}
