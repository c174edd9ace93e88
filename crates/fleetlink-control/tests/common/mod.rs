//! Common test utilities for fleet lifecycle integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use fleetlink_control::config::{TeardownConfig, TEMPLATE_PARAMETER_KEYS};
use fleetlink_control::{
    ControlConfig, ControlService, DeploymentInstance, DeploymentTemplate, FleetManager,
    InvocationContext, LifecycleHandler, MemoryTopic, MockProvisioner, TemplateName,
};
use fleetlink_proto::{AccountId, MemoryResponder, Region};
use serde_json::{json, Value};

pub const TEMPLATE: &str = "NR-Stack";
pub const TOPIC: &str = "arn:aws:sns:us-east-1:123456789012:nr-stack";
pub const FUNCTION_ARN: &str = "arn:aws:lambda:us-east-1:123456789012:function:fleetlink-control";
pub const RESPONSE_URL: &str = "https://responses.example.com/presigned";

/// Control service wired to in-memory collaborators.
pub struct TestControl {
    pub provisioner: Arc<MockProvisioner>,
    pub topic: Arc<MemoryTopic>,
    pub responder: Arc<MemoryResponder>,
    pub service: ControlService,
}

impl TestControl {
    /// Empty provisioner, working topic, one seed account.
    pub fn new() -> Self {
        Self::with(MockProvisioner::new(), MemoryTopic::new(), "111111111111")
    }

    /// Custom collaborators and seed list.
    pub fn with(provisioner: MockProvisioner, topic: MemoryTopic, seeds: &str) -> Self {
        let provisioner = Arc::new(provisioner);
        let topic = Arc::new(topic);
        let responder = Arc::new(MemoryResponder::new());

        let config = config(seeds);
        let manager = FleetManager::new(
            provisioner.clone(),
            topic.clone(),
            TOPIC,
            config.teardown.clone(),
        );
        let handler = LifecycleHandler::new(config, manager, responder.clone());

        Self {
            provisioner,
            topic,
            responder,
            service: ControlService::new(handler),
        }
    }

    /// Invoke with a minute of remaining time.
    pub async fn invoke(&self, event: Value) -> Value {
        self.service
            .invoke(event, &context(Duration::from_secs(60)))
            .await
            .unwrap()
    }
}

impl Default for TestControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Complete configuration with fast polling.
pub fn config(seeds: &str) -> ControlConfig {
    let mut config = ControlConfig {
        vendor_account_id: 7654321,
        teardown: TeardownConfig {
            poll_interval_secs: 0,
            ..TeardownConfig::default()
        },
        ..ControlConfig::default()
    };
    config.template.name = TEMPLATE.to_owned();
    config.template.url = "https://templates.example.com/newrelic.yaml".to_owned();
    config.fan_out.topic_arn = TOPIC.to_owned();
    config.fan_out.seed_accounts = seeds.to_owned();
    for key in TEMPLATE_PARAMETER_KEYS {
        config.parameters.insert(key.to_owned(), format!("{key}-value"));
    }
    config
}

pub fn context(remaining: Duration) -> InvocationContext {
    InvocationContext::from_function_arn(FUNCTION_ARN, SystemTime::now() + remaining).unwrap()
}

/// A lifecycle request event as delivered to the function.
pub fn lifecycle_event(request_type: &str) -> Value {
    json!({
        "RequestType": request_type,
        "ResponseURL": RESPONSE_URL,
        "StackId": "arn:aws:cloudformation:us-east-1:123456789012:stack/nr/guid",
        "RequestId": "req-1",
        "LogicalResourceId": "Onboarding",
        "ResourceType": "Custom::Onboarding",
        "ResourceProperties": {}
    })
}

pub fn existing_template() -> DeploymentTemplate {
    DeploymentTemplate {
        name: TemplateName::new(TEMPLATE),
        url: "https://templates.example.com/newrelic.yaml".to_owned(),
        description: String::new(),
        parameters: vec![],
        capabilities: vec!["CAPABILITY_NAMED_IAM".to_owned()],
        administration_role_arn: "arn:aws:iam::123456789012:role/admin".to_owned(),
        execution_role_name: "AWSControlTowerExecution".to_owned(),
    }
}

pub fn instance(account: &str, region: &str) -> DeploymentInstance {
    DeploymentInstance {
        template: TemplateName::new(TEMPLATE),
        account: AccountId::parse(account).unwrap(),
        region: Region::new(region),
        status: Some("CURRENT".to_owned()),
    }
}
