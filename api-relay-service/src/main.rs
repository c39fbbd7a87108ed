use api_relay_service::config::get_configuration;
use api_relay_service::startup::SERVICE_NAME;
use api_relay_service::Application;
use service_core::observability::{init_metrics, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(SERVICE_NAME, &configuration.telemetry);
    init_metrics();

    let application = Application::build(configuration).await?;
    application.run_until_stopped().await?;

    Ok(())
}
