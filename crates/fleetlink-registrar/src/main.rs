//! Account registrar binary.
//!
//! Runs as a Lambda function subscribed to the registration topic.

use lambda_runtime::{service_fn, LambdaEvent};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fleetlink_registrar::{RegistrarConfig, RegistrarService};

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("fleetlink_registrar=info".parse()?)
                .add_directive("fleetlink_secrets=info".parse()?)
                .add_directive("aws_config=warn".parse()?)
                .add_directive("aws_smithy_runtime=warn".parse()?),
        )
        .without_time()
        .init();

    info!("fleetlink registrar starting");

    let config = RegistrarConfig::load()?;
    info!(
        endpoint = %config.vendor.endpoint,
        vendor_account = config.vendor.account_id,
        "configuration loaded"
    );

    let service = RegistrarService::from_config(config).await?;
    let service = &service;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        let report = service.invoke(event.payload).await?;
        Ok::<Value, lambda_runtime::Error>(report)
    }))
    .await
}
