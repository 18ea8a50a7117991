use rate_notifier::configuration::get_configuration;
use rate_notifier::startup::Application;
use rate_notifier::telemetry::get_subscriber;
use rate_notifier::telemetry::init_subscriber;

/// Initialise telemetry, load config, and start the server
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // RUST_LOG, if set, overrides "info"
    let subscriber = get_subscriber("rate-notifier", "info", std::io::stdout);
    init_subscriber(subscriber)?;

    let cfg = get_configuration()?;
    let app = Application::build(cfg).await?;
    tracing::info!(port = app.get_port(), "Listening");
    app.run_until_stopped().await?;

    Ok(())
}
