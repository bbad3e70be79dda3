//! BDD step definitions for the registry feature

use cucumber::{given, then, when};

use api_monitor::config::PollingConfig;
use api_monitor::monitor::MonitorStatus;
use api_monitor::{ApiMonitorError, StartOutcome};

use crate::world::ApiMonitorWorld;

#[given("a monitor registry")]
fn monitor_registry(world: &mut ApiMonitorWorld) {
    world.create_registry(PollingConfig::default());
}

#[given(expr = "a monitor registry keeping {int} latency samples")]
fn monitor_registry_with_latency_history(world: &mut ApiMonitorWorld, latency_history: usize) {
    world.create_registry(PollingConfig {
        latency_history,
        ..PollingConfig::default()
    });
}

#[when(expr = "I start monitoring {string}")]
async fn start_monitoring(world: &mut ApiMonitorWorld, target: String) {
    world.last_start = Some(world.registry().start(&target).await);
}

#[when(expr = "I stop monitoring {string}")]
async fn stop_monitoring(world: &mut ApiMonitorWorld, target: String) {
    match world.registry().stop(&target).await {
        Ok(summary) => world.last_summary = Some(summary),
        Err(e) => world.last_error = Some(e),
    }
}

#[when(expr = "I request stats for {string}")]
async fn request_stats(world: &mut ApiMonitorWorld, target: String) {
    match world.registry().stats(&target).await {
        Ok(snapshot) => world.last_snapshot = Some(snapshot),
        Err(e) => world.last_error = Some(e),
    }
}

#[when(expr = "I remove {string}")]
async fn remove_target(world: &mut ApiMonitorWorld, target: String) {
    match world.registry().remove(&target).await {
        Ok(summary) => world.last_summary = Some(summary),
        Err(e) => world.last_error = Some(e),
    }
}

#[then("the last start should report started")]
fn last_start_started(world: &mut ApiMonitorWorld) {
    let result = world.last_start.as_ref().expect("nothing started");
    assert!(matches!(result, Ok(StartOutcome::Started)), "{result:?}");
}

#[then("the last start should report already active")]
fn last_start_already_active(world: &mut ApiMonitorWorld) {
    let result = world.last_start.as_ref().expect("nothing started");
    assert!(matches!(result, Ok(StartOutcome::AlreadyActive)), "{result:?}");
}

#[then("the last start should fail with a configuration error")]
fn last_start_config_error(world: &mut ApiMonitorWorld) {
    let result = world.last_start.as_ref().expect("nothing started");
    assert!(matches!(result, Err(ApiMonitorError::Config(_))), "{result:?}");
}

#[then("the last operation should fail with not monitoring")]
fn last_operation_not_monitoring(world: &mut ApiMonitorWorld) {
    let error = world.last_error.take().expect("no error recorded");
    assert!(
        matches!(error, ApiMonitorError::NotMonitoring(_)),
        "{error:?}"
    );
}

#[then(expr = "exactly {int} monitor(s) should be registered")]
async fn monitors_registered(world: &mut ApiMonitorWorld, expected: usize) {
    assert_eq!(world.registry().list().await.len(), expected);
}

#[then(expr = "the monitor for {string} should be {string}")]
async fn monitor_status(world: &mut ApiMonitorWorld, target: String, expected: String) {
    let monitor = world.registry().get(&target).await.expect("not monitoring");
    let expected = match expected.as_str() {
        "created" => MonitorStatus::Created,
        "active" => MonitorStatus::Active,
        "stopped" => MonitorStatus::Stopped,
        other => panic!("Unknown status: {}", other),
    };
    assert_eq!(monitor.status().await, expected);
}
