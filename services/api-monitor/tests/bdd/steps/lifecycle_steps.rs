//! BDD step definitions for the service lifecycle feature

use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};
use tokio_util::sync::CancellationToken;

use api_monitor::config::{Config, DashboardConfig, PollingConfig};
use api_monitor::io::HttpClient;
use api_monitor::{ApiMonitorBuilder, ApiMonitorError};

use crate::world::ApiMonitorWorld;

fn build_api_monitor_builder(world: &mut ApiMonitorWorld) -> ApiMonitorBuilder {
    let config = Config {
        targets: world.lifecycle_targets.clone(),
        polling: world.lifecycle_polling.clone().unwrap_or_default(),
        dashboard: DashboardConfig {
            enabled: false,
            ..DashboardConfig::default()
        },
        ..Config::default()
    };

    let http = world.client();
    ApiMonitorBuilder::new(config).with_http_client(http as Arc<dyn HttpClient>)
}

#[given(expr = "a service config with target {string}")]
fn service_config_with_target(world: &mut ApiMonitorWorld, target: String) {
    world.lifecycle_targets.push(target);
}

#[given(expr = "a service polling interval of {int} seconds")]
fn service_polling_interval(world: &mut ApiMonitorWorld, seconds: u64) {
    world.lifecycle_polling = Some(PollingConfig {
        interval: Duration::from_secs(seconds),
        ..PollingConfig::default()
    });
}

#[when("the service is built")]
async fn service_is_built(world: &mut ApiMonitorWorld) {
    let builder = build_api_monitor_builder(world);
    if let Err(e) = builder.build().await {
        world.lifecycle_build_error = Some(e);
    }
}

#[when(expr = "the service runs for {int} seconds")]
async fn service_runs(world: &mut ApiMonitorWorld, seconds: u64) {
    let cancel = CancellationToken::new();
    let service = build_api_monitor_builder(world)
        .with_cancellation_token(cancel.clone())
        .build()
        .await
        .expect("build failed");

    let handle = tokio::spawn(service.start());
    tokio::time::sleep(Duration::from_secs(seconds)).await;
    cancel.cancel();

    let summaries = handle
        .await
        .expect("service task panicked")
        .expect("service failed");
    world.lifecycle_summaries = Some(summaries);
}

#[then("the build should fail with a configuration error")]
fn build_fails_with_config_error(world: &mut ApiMonitorWorld) {
    let error = world.lifecycle_build_error.as_ref().expect("build succeeded");
    assert!(matches!(error, ApiMonitorError::Config(_)), "{error:?}");
}

#[then(expr = "the service should report {int} stop summaries")]
fn service_summaries(world: &mut ApiMonitorWorld, expected: usize) {
    let summaries = world
        .lifecycle_summaries
        .as_ref()
        .expect("service did not run");
    assert_eq!(summaries.len(), expected);
    for summary in summaries {
        assert_eq!(summary.error_count, 0);
    }
}
