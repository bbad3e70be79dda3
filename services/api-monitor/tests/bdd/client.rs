//! Scripted HTTP client used as the monitored endpoints

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use api_monitor::io::{HttpClient, HttpResponse};
use api_monitor::ApiMonitorError;
use tokio::sync::Mutex;

/// How an endpoint answers one request
#[derive(Debug, Clone)]
pub enum Reply {
    Status { status: u16, delay: Duration },
    /// Never answers within any reasonable timeout
    Hang,
    Fail(String),
}

impl Default for Reply {
    fn default() -> Self {
        Reply::Status {
            status: 200,
            delay: Duration::from_millis(100),
        }
    }
}

/// Answers each URL from its queue of scripted replies, then with a
/// healthy 200 once the queue runs dry
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<HashMap<String, u32>>,
}

impl ScriptedHttpClient {
    pub async fn script(&self, url: &str, reply: Reply) {
        self.scripts
            .lock()
            .await
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
    }

    pub async fn calls(&self, url: &str) -> u32 {
        self.calls.lock().await.get(url).copied().unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn get(&self, url: &str, _timeout: Duration) -> api_monitor::Result<HttpResponse> {
        *self.calls.lock().await.entry(url.to_string()).or_insert(0) += 1;
        let reply = self
            .scripts
            .lock()
            .await
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or_default();

        match reply {
            Reply::Status { status, delay } => {
                tokio::time::sleep(delay).await;
                Ok(HttpResponse::new(status, format!("status {}", status)))
            }
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(HttpResponse::new(200, String::new()))
            }
            Reply::Fail(message) => Err(ApiMonitorError::Http(message)),
        }
    }
}
