//! Aggregate statistics derived from a monitor's histories

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::history::HistoryBuffer;
use crate::monitor::{ErrorEvent, LatencySample, MonitorState};

/// Number of errors included in a snapshot
pub const RECENT_ERRORS: usize = 5;

/// Point-in-time view of a monitor.
///
/// `error_count` counts the retained error history, not every error ever
/// seen, so it stops growing once the error history is full.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub last_check: Option<DateTime<Utc>>,
    /// Mean response time in seconds
    pub average_response_time: f64,
    pub error_count: usize,
    pub recent_errors: Vec<ErrorEvent>,
}

/// Final figures reported when monitoring stops
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopSummary {
    pub target: String,
    #[serde(with = "humantime_serde")]
    pub uptime: Duration,
    /// Mean response time in seconds
    pub average_response_time: f64,
    pub error_count: usize,
}

/// Build a snapshot from the current histories. Never mutates the state.
pub fn compute(state: &MonitorState) -> Snapshot {
    Snapshot {
        last_check: state.last_check,
        average_response_time: average_response_time(&state.latency),
        error_count: state.errors.len(),
        recent_errors: state.errors.latest(RECENT_ERRORS),
    }
}

pub fn summarize(state: &MonitorState, now: DateTime<Utc>) -> StopSummary {
    StopSummary {
        target: state.target.clone(),
        uptime: state.uptime(now),
        average_response_time: average_response_time(&state.latency),
        error_count: state.errors.len(),
    }
}

/// Arithmetic mean of the retained samples in seconds, 0.0 when empty
pub fn average_response_time(samples: &HistoryBuffer<LatencySample>) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let total: f64 = samples.iter().map(|s| s.duration.as_secs_f64()).sum();
    total / samples.len() as f64
}
