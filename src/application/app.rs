use crate::api::AnalysisService;
use crate::config::Settings;
use crate::Result;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

/// Main application struct that coordinates all components
pub struct Application {
    settings: Settings,
    listener: TcpListener,
    router: axum::Router,
}

impl Application {
    /// Bind with explicit settings; port 0 picks a free port.
    #[instrument(skip(settings), fields(environment = %settings.application.environment))]
    pub async fn build(settings: Settings) -> Result<Self> {
        let service = AnalysisService::from_settings(&settings.provider)?;
        let router = service.into_router(&settings.server);

        let listener = TcpListener::bind(settings.bind_address()).await?;
        info!(address = %listener.local_addr()?, "Listener bound");

        Ok(Self {
            settings,
            listener,
            router,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until Ctrl-C.
    #[instrument(skip(self))]
    pub async fn run(self) -> Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        info!(
            environment = %self.settings.application.environment,
            "Starting brand perception server on {}",
            self.listener.local_addr()?
        );

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(error) => warn!(error = %error, "Failed to listen for shutdown signal"),
    }
}
