//! Per-target monitor: owns the rolling histories and drives the polling loop

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, RwLockReadGuard};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::PollingConfig;
use crate::history::HistoryBuffer;
use crate::io::HttpClient;
use crate::stats::{self, Snapshot, StopSummary};
use crate::ApiMonitorError;

/// Maximum number of characters of a response body kept with an application error
pub const BODY_EXCERPT_CHARS: usize = 500;

const TIMEOUT_MESSAGE: &str = "Request timed out";

/// Lifecycle of a monitor. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorStatus {
    Created,
    Active,
    Stopped,
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorStatus::Created => write!(f, "Created"),
            MonitorStatus::Active => write!(f, "Active"),
            MonitorStatus::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Round-trip time of a request that produced a response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySample {
    pub timestamp: DateTime<Utc>,
    pub duration: Duration,
}

/// What went wrong during a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The target answered with a status of 400 or above
    Application { status: u16, body_excerpt: String },
    Timeout,
    Network { message: String },
}

/// A failed tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "ErrorRecord")]
pub struct ErrorEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: ErrorKind,
}

impl ErrorEvent {
    pub fn application(timestamp: DateTime<Utc>, status: u16, body: &str) -> Self {
        Self {
            timestamp,
            kind: ErrorKind::Application {
                status,
                body_excerpt: body.chars().take(BODY_EXCERPT_CHARS).collect(),
            },
        }
    }

    pub fn timeout(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            kind: ErrorKind::Timeout,
        }
    }

    pub fn network(timestamp: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            kind: ErrorKind::Network {
                message: message.into(),
            },
        }
    }

    /// HTTP status of an application error
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Application { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Flat wire form of an [`ErrorEvent`]
#[derive(Debug, Serialize)]
struct ErrorRecord {
    timestamp: DateTime<Utc>,
    kind: &'static str,
    status: Option<u16>,
    message: Option<String>,
}

impl From<ErrorEvent> for ErrorRecord {
    fn from(event: ErrorEvent) -> Self {
        let (kind, status, message) = match event.kind {
            ErrorKind::Application {
                status,
                body_excerpt,
            } => ("application", Some(status), Some(body_excerpt)),
            ErrorKind::Timeout => ("timeout", None, Some(TIMEOUT_MESSAGE.to_string())),
            ErrorKind::Network { message } => ("network", None, Some(message)),
        };
        Self {
            timestamp: event.timestamp,
            kind,
            status,
            message,
        }
    }
}

/// Everything recorded about one target
#[derive(Debug, Clone)]
pub struct MonitorState {
    pub target: String,
    pub status: MonitorStatus,
    pub latency: HistoryBuffer<LatencySample>,
    pub errors: HistoryBuffer<ErrorEvent>,
    pub started_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub last_check: Option<DateTime<Utc>>,
    pub checks: u64,
}

impl MonitorState {
    pub fn new(target: &str, settings: &PollingConfig) -> Self {
        Self {
            target: target.to_string(),
            status: MonitorStatus::Created,
            latency: HistoryBuffer::new(settings.latency_history),
            errors: HistoryBuffer::new(settings.error_history),
            started_at: Utc::now(),
            stopped_at: None,
            last_check: None,
            checks: 0,
        }
    }

    /// Time spent monitoring, up to the stop time once stopped
    pub fn uptime(&self, now: DateTime<Utc>) -> Duration {
        let end = self.stopped_at.unwrap_or(now);
        (end - self.started_at).to_std().unwrap_or_default()
    }
}

/// Listing entry for a registered monitor
#[derive(Debug, Clone, Serialize)]
pub struct MonitorInfo {
    pub target: String,
    pub status: MonitorStatus,
    pub started_at: DateTime<Utc>,
    pub last_check: Option<DateTime<Utc>>,
    pub checks: u64,
}

/// Result of a single poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Response { status: u16, elapsed: Duration },
    Timeout,
    Network(String),
}

/// Watches a single target.
///
/// The polling task is the only writer of the sample histories; stats
/// queries take a read lock and copy what they need.
pub struct Monitor {
    target: String,
    settings: PollingConfig,
    state: RwLock<MonitorState>,
    cancel: CancellationToken,
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("target", &self.target)
            .field("interval", &self.settings.interval)
            .field("timeout", &self.settings.timeout)
            .finish()
    }
}

impl Monitor {
    pub fn new(target: impl Into<String>, settings: PollingConfig) -> Self {
        let target = target.into();
        tracing::debug!("Created monitor for {}", target);
        Self {
            state: RwLock::new(MonitorState::new(&target, &settings)),
            target,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn settings(&self) -> &PollingConfig {
        &self.settings
    }

    pub async fn status(&self) -> MonitorStatus {
        self.state.read().await.status
    }

    /// Read access to the recorded state
    pub async fn state(&self) -> RwLockReadGuard<'_, MonitorState> {
        self.state.read().await
    }

    pub async fn snapshot(&self) -> Snapshot {
        stats::compute(&*self.state.read().await)
    }

    pub async fn info(&self) -> MonitorInfo {
        let state = self.state.read().await;
        MonitorInfo {
            target: state.target.clone(),
            status: state.status,
            started_at: state.started_at,
            last_check: state.last_check,
            checks: state.checks,
        }
    }

    /// Move from `Created` to `Active`. Returns false in any other state.
    pub async fn activate(&self) -> bool {
        let mut state = self.state.write().await;
        if state.status != MonitorStatus::Created {
            return false;
        }
        state.status = MonitorStatus::Active;
        true
    }

    /// Stop scheduling further ticks and summarize what was collected.
    ///
    /// An in-flight request is left to finish. Calling this on a stopped
    /// monitor returns the summary as of the first stop.
    pub async fn stop(&self) -> StopSummary {
        let now = Utc::now();
        let mut state = self.state.write().await;
        if state.status != MonitorStatus::Stopped {
            state.status = MonitorStatus::Stopped;
            state.stopped_at = Some(now);
            self.cancel.cancel();
        }
        stats::summarize(&state, now)
    }

    /// Poll the target until stopped
    pub async fn run(self: Arc<Self>, http: Arc<dyn HttpClient>) {
        tracing::info!(
            "Monitoring {} every {:?} (timeout {:?})",
            self.target,
            self.settings.interval,
            self.settings.timeout
        );

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let outcome = self.tick(http.as_ref()).await;
            tracing::debug!("Tick for {}: {:?}", self.target, outcome);

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.settings.interval) => {}
            }
        }

        tracing::debug!("Polling loop for {} stopped", self.target);
    }

    /// Issue one request and record its outcome
    pub async fn tick(&self, http: &dyn HttpClient) -> TickOutcome {
        let timeout = self.settings.timeout;
        let started = Instant::now();
        let result = match tokio::time::timeout(timeout, http.get(&self.target, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(ApiMonitorError::Timeout(timeout)),
        };
        let elapsed = started.elapsed();

        let outcome = match result {
            Ok(response) => {
                let status = response.status;
                let body_excerpt = if status >= 400 {
                    let remaining = timeout.saturating_sub(elapsed);
                    Some(response.excerpt(BODY_EXCERPT_CHARS, remaining).await)
                } else {
                    None
                };
                Ok((status, body_excerpt))
            }
            Err(e) => Err(e),
        };

        let now = Utc::now();
        let mut state = self.state.write().await;
        let outcome = match outcome {
            Ok((status, body_excerpt)) => {
                state.latency.push(LatencySample {
                    timestamp: now,
                    duration: elapsed,
                });
                if let Some(body) = body_excerpt {
                    tracing::warn!("API error from {}: status {}", self.target, status);
                    state.errors.push(ErrorEvent::application(now, status, &body));
                }
                TickOutcome::Response { status, elapsed }
            }
            Err(ApiMonitorError::Timeout(_)) => {
                tracing::error!("Timeout error for {}", self.target);
                state.errors.push(ErrorEvent::timeout(now));
                TickOutcome::Timeout
            }
            Err(e) => {
                let message = match e {
                    ApiMonitorError::Http(message) => message,
                    other => other.to_string(),
                };
                tracing::error!("Error monitoring {}: {}", self.target, message);
                state.errors.push(ErrorEvent::network(now, message.clone()));
                TickOutcome::Network(message)
            }
        };
        state.last_check = Some(now);
        state.checks += 1;
        outcome
    }
}
