//! Common test utilities for registration integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use fleetlink_proto::{AccountId, FanOutMessage, MemoryResponder, Region};
use fleetlink_registrar::{
    MemoryDeadLetterQueue, MemoryVendor, Registrar, RegistrarService, VendorConfig,
};
use fleetlink_secrets::{MemorySecrets, SecretValue};
use serde_json::{json, Value};

pub const TEMPLATE: &str = "NR-Stack";
pub const SECRET_ID: &str = "arn:aws:secretsmanager:us-east-1:123456789012:secret:newrelic";
pub const VENDOR_ACCOUNT: u64 = 2_345_678;
pub const INPUT_TYPE: &str = "CloudAwsIntegrationsInput";
pub const RESPONSE_URL: &str = "https://responses.example.com/presigned";

/// Registrar service wired to in-memory collaborators.
pub struct TestRegistrar {
    pub vendor: Arc<MemoryVendor>,
    pub dead_letter: Arc<MemoryDeadLetterQueue>,
    pub responder: Arc<MemoryResponder>,
    pub service: RegistrarService,
}

impl TestRegistrar {
    /// Stored credential, `cloudtrail` and `ec2` integrations, working queue.
    pub async fn new() -> Self {
        Self::with(vendor(), MemoryDeadLetterQueue::new(), true).await
    }

    /// Custom collaborators; `with_secret` controls whether the credential exists.
    pub async fn with(
        vendor: MemoryVendor,
        dead_letter: MemoryDeadLetterQueue,
        with_secret: bool,
    ) -> Self {
        let secrets = Arc::new(MemorySecrets::new());
        if with_secret {
            secrets
                .insert(SECRET_ID, SecretValue::new(r#"{"AccessKey":"NRAK-TESTKEY"}"#))
                .await;
        }

        let vendor = Arc::new(vendor);
        let dead_letter = Arc::new(dead_letter);
        let responder = Arc::new(MemoryResponder::new());

        let registrar = Registrar::new(
            secrets,
            vendor.clone(),
            dead_letter.clone(),
            responder.clone(),
            vendor_config(),
        );

        Self {
            vendor,
            dead_letter,
            responder,
            service: RegistrarService::new(registrar),
        }
    }

    /// Invoke and return the batch report.
    pub async fn invoke(&self, event: Value) -> Value {
        self.service.invoke(event).await.unwrap()
    }

    /// Messages that reached the dead-letter queue.
    pub fn dead_letters(&self) -> Vec<String> {
        self.dead_letter.messages().unwrap()
    }
}

pub fn vendor_config() -> VendorConfig {
    VendorConfig {
        account_id: VENDOR_ACCOUNT,
        secret_id: SECRET_ID.to_owned(),
        ..VendorConfig::default()
    }
}

/// Vendor exposing the `cloudtrail` and `ec2` integrations.
pub fn vendor() -> MemoryVendor {
    MemoryVendor::new().with_input_type(INPUT_TYPE, ["cloudtrail", "ec2"])
}

/// Fan-out message body for the given accounts.
pub fn fan_out(accounts: &[&str]) -> String {
    let accounts = accounts
        .iter()
        .map(|a| AccountId::parse(*a).unwrap())
        .collect::<Vec<_>>();
    FanOutMessage::single(TEMPLATE, accounts, Region::new("us-east-1"))
        .to_json()
        .unwrap()
}

/// A spoke lifecycle request naming `account` as its source.
pub fn spoke_request(request_type: &str, account: &str) -> Value {
    json!({
        "RequestType": request_type,
        "ResponseURL": RESPONSE_URL,
        "StackId": "arn:aws:cloudformation:us-east-1:111111111111:stack/spoke/guid",
        "RequestId": "req-7",
        "LogicalResourceId": "Registration",
        "ResourceType": "Custom::Registration",
        "ResourceProperties": { "SourceAccount": account }
    })
}

/// Batch of topic notification records.
pub fn sns_batch(messages: &[String]) -> Value {
    let records: Vec<Value> = messages
        .iter()
        .enumerate()
        .map(|(i, message)| {
            json!({
                "EventSource": "aws:sns",
                "Sns": { "Message": message, "MessageId": format!("msg-{i}") }
            })
        })
        .collect();
    json!({ "Records": records })
}
