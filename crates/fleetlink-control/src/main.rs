//! Fleet deployment manager binary.
//!
//! Runs as a Lambda function answering custom-resource lifecycle requests.

use lambda_runtime::{service_fn, LambdaEvent};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fleetlink_control::{ControlConfig, ControlService};

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("fleetlink_control=info".parse()?)
                .add_directive("aws_config=warn".parse()?)
                .add_directive("aws_smithy_runtime=warn".parse()?),
        )
        .without_time()
        .init();

    info!("fleetlink control starting");

    let config = ControlConfig::load()?;
    info!(
        template = %config.template.name,
        topic = %config.fan_out.topic_arn,
        "configuration loaded"
    );

    let service = ControlService::from_config(config).await?;
    let service = &service;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        let response = service
            .invoke_with_arn(
                event.payload,
                &event.context.invoked_function_arn,
                event.context.deadline,
            )
            .await?;
        Ok::<Value, lambda_runtime::Error>(response)
    }))
    .await
}
