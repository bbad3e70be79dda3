//! API Monitor - multi-target HTTP health monitoring service
//!
//! Polls HTTP endpoints on a fixed interval, keeps a bounded history of
//! response times and failures per endpoint, and serves statistics over an
//! HTTP API.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod history;
pub mod io;
pub mod monitor;
pub mod registry;
pub mod stats;

pub use config::{load_config, Config};
pub use error::{ApiMonitorError, Result};
pub use registry::{MonitorRegistry, StartOutcome};
pub use stats::{Snapshot, StopSummary};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::io::{HttpClient, ReqwestHttpClient};

/// Assembles an [`ApiMonitor`] from configuration and optional overrides
pub struct ApiMonitorBuilder {
    config: Config,
    http: Option<Arc<dyn HttpClient>>,
    cancel: Option<CancellationToken>,
}

impl ApiMonitorBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            cancel: None,
        }
    }

    /// Use a custom HTTP client instead of reqwest
    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Use an externally owned cancellation token instead of Ctrl-C
    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Validate the polling settings and targets, then build the service
    pub async fn build(self) -> Result<ApiMonitor> {
        self.config.polling.validate()?;
        for target in &self.config.targets {
            registry::validate_target(target)?;
        }

        let http = self
            .http
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()) as Arc<dyn HttpClient>);
        let registry = Arc::new(MonitorRegistry::new(http, self.config.polling.clone()));
        let (cancel, listen_for_signal) = match self.cancel {
            Some(cancel) => (cancel, false),
            None => (CancellationToken::new(), true),
        };

        Ok(ApiMonitor {
            config: self.config,
            registry,
            cancel,
            listen_for_signal,
        })
    }
}

/// The assembled service
pub struct ApiMonitor {
    config: Config,
    registry: Arc<MonitorRegistry>,
    cancel: CancellationToken,
    listen_for_signal: bool,
}

impl ApiMonitor {
    pub fn registry(&self) -> Arc<MonitorRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Start the configured targets and run until cancelled, then stop
    /// every monitor and return the final summaries.
    pub async fn start(self) -> Result<Vec<StopSummary>> {
        for target in &self.config.targets {
            self.registry.start(target).await?;
        }

        if self.listen_for_signal {
            let cancel_for_signal = self.cancel.clone();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => tracing::info!("Shutdown signal received"),
                    Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
                }
                cancel_for_signal.cancel();
            });
        }

        if self.config.dashboard.enabled {
            let dashboard_port = self.config.dashboard.port;
            let addr = SocketAddr::from(([0, 0, 0, 0], dashboard_port));
            let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
                ApiMonitorError::Dashboard(format!(
                    "Failed to bind dashboard to port {}: {}",
                    dashboard_port, e
                ))
            })?;
            tracing::info!("Dashboard listening on http://{}", addr);

            let router = dashboard::build_router(Arc::clone(&self.registry));
            let cancel_for_dashboard = self.cancel.clone();
            tokio::spawn(async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        cancel_for_dashboard.cancelled().await;
                    })
                    .await
                    .ok();

                tracing::debug!("Dashboard stopped");
            });
        }

        tracing::info!("API monitor started");

        self.cancel.cancelled().await;

        let summaries = self.registry.shutdown().await;
        tracing::info!("API monitor stopped");
        Ok(summaries)
    }
}
