//! Registry of monitored targets

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use reqwest::Url;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::config::PollingConfig;
use crate::io::HttpClient;
use crate::monitor::{Monitor, MonitorInfo, MonitorStatus};
use crate::stats::{Snapshot, StopSummary};
use crate::ApiMonitorError;

/// What `start` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyActive,
}

struct Entry {
    monitor: Arc<Monitor>,
    task: Option<JoinHandle<()>>,
}

/// Owns one [`Monitor`] per target and its polling task.
///
/// At most one monitor exists per target. Stopped monitors stay registered
/// so their stats remain queryable until they are removed or restarted.
pub struct MonitorRegistry {
    http: Arc<dyn HttpClient>,
    settings: PollingConfig,
    monitors: RwLock<HashMap<String, Entry>>,
}

impl fmt::Debug for MonitorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorRegistry")
            .field("settings", &self.settings)
            .finish()
    }
}

impl MonitorRegistry {
    pub fn new(http: Arc<dyn HttpClient>, settings: PollingConfig) -> Self {
        Self {
            http,
            settings,
            monitors: RwLock::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &PollingConfig {
        &self.settings
    }

    /// Begin monitoring `target`. Starting an active target is a no-op;
    /// a stopped target gets a fresh monitor.
    pub async fn start(&self, target: &str) -> crate::Result<StartOutcome> {
        validate_target(target)?;

        let mut monitors = self.monitors.write().await;
        if let Some(entry) = monitors.get_mut(target) {
            if entry.monitor.status().await == MonitorStatus::Active {
                tracing::info!("Already monitoring {}", target);
                return Ok(StartOutcome::AlreadyActive);
            }
            // The stopped monitor may still have a request in flight
            if let Some(task) = entry.task.take() {
                task.abort();
            }
        }

        tracing::info!("Starting monitoring for {}", target);
        let monitor = Arc::new(Monitor::new(target, self.settings.clone()));
        monitor.activate().await;
        let task = tokio::spawn(Arc::clone(&monitor).run(Arc::clone(&self.http)));
        monitors.insert(
            target.to_string(),
            Entry {
                monitor,
                task: Some(task),
            },
        );
        Ok(StartOutcome::Started)
    }

    /// Stop monitoring `target` and report its final figures
    pub async fn stop(&self, target: &str) -> crate::Result<StopSummary> {
        let monitor = self.get(target).await?;
        tracing::info!("Stopping monitoring for {}", target);
        let summary = monitor.stop().await;
        log_summary(&summary);
        Ok(summary)
    }

    /// Look up the monitor for `target`
    pub async fn get(&self, target: &str) -> crate::Result<Arc<Monitor>> {
        self.monitors
            .read()
            .await
            .get(target)
            .map(|entry| Arc::clone(&entry.monitor))
            .ok_or_else(|| ApiMonitorError::NotMonitoring(target.to_string()))
    }

    /// Current statistics for `target`
    pub async fn stats(&self, target: &str) -> crate::Result<Snapshot> {
        Ok(self.get(target).await?.snapshot().await)
    }

    /// Every registered monitor, sorted by target
    pub async fn list(&self) -> Vec<MonitorInfo> {
        let monitors: Vec<Arc<Monitor>> = self
            .monitors
            .read()
            .await
            .values()
            .map(|entry| Arc::clone(&entry.monitor))
            .collect();

        let mut infos = Vec::with_capacity(monitors.len());
        for monitor in monitors {
            infos.push(monitor.info().await);
        }
        infos.sort_by(|a, b| a.target.cmp(&b.target));
        infos
    }

    /// Stop `target` if needed and forget it
    pub async fn remove(&self, target: &str) -> crate::Result<StopSummary> {
        let entry = self
            .monitors
            .write()
            .await
            .remove(target)
            .ok_or_else(|| ApiMonitorError::NotMonitoring(target.to_string()))?;

        let summary = entry.monitor.stop().await;
        tracing::info!("Removed {} from monitoring", target);
        Ok(summary)
    }

    /// Stop every active monitor and wait for the polling tasks to exit
    pub async fn shutdown(&self) -> Vec<StopSummary> {
        let mut summaries = Vec::new();
        let mut tasks = Vec::new();

        {
            let mut monitors = self.monitors.write().await;
            for entry in monitors.values_mut() {
                if entry.monitor.status().await == MonitorStatus::Active {
                    let summary = entry.monitor.stop().await;
                    log_summary(&summary);
                    summaries.push(summary);
                }
                if let Some(task) = entry.task.take() {
                    tasks.push(task);
                }
            }
        }

        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!("Polling task failed: {}", e);
            }
        }

        summaries.sort_by(|a, b| a.target.cmp(&b.target));
        summaries
    }
}

impl Drop for MonitorRegistry {
    fn drop(&mut self) {
        for entry in self.monitors.get_mut().values_mut() {
            if let Some(task) = entry.task.take() {
                task.abort();
            }
        }
    }
}

/// A target must be an absolute http(s) URL with a host
pub fn validate_target(target: &str) -> crate::Result<Url> {
    let url = Url::parse(target)
        .map_err(|e| ApiMonitorError::Config(format!("Invalid URL {:?}: {}", target, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiMonitorError::Config(format!(
            "Invalid URL {:?}: unsupported scheme {:?}",
            target,
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ApiMonitorError::Config(format!(
            "Invalid URL {:?}: missing host",
            target
        )));
    }
    Ok(url)
}

fn log_summary(summary: &StopSummary) {
    tracing::info!("Monitoring stopped for {}:", summary.target);
    tracing::info!("Total uptime: {:?}", summary.uptime);
    tracing::info!(
        "Average response time: {:.3}s",
        summary.average_response_time
    );
    tracing::info!("Total errors: {}", summary.error_count);
}
