use anyhow::Result;
use brand_perception::config::Settings;
use brand_perception::Application;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
#[instrument]
async fn main() -> Result<()> {
    let settings = Settings::new()?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.logging.level))?;
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if settings.logging.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(
        environment = %settings.application.environment,
        "Starting brand perception application"
    );

    let app = Application::build(settings).await?;
    app.run().await?;

    Ok(())
}
