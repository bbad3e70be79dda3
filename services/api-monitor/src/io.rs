//! HTTP client abstraction for testability

use std::time::Duration;

use async_trait::async_trait;

/// Status line of a response, with its body still unread.
///
/// The request future resolves once headers arrive. The body is only pulled
/// on demand through [`HttpResponse::excerpt`].
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    body: ResponseBody,
}

#[derive(Debug)]
enum ResponseBody {
    Text(String),
    Stream(reqwest::Response),
}

impl HttpResponse {
    /// A response whose body is already in memory
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: ResponseBody::Text(body.into()),
        }
    }

    fn streaming(response: reqwest::Response) -> Self {
        Self {
            status: response.status().as_u16(),
            body: ResponseBody::Stream(response),
        }
    }

    /// Read at most `max_chars` characters of the body within `timeout`.
    ///
    /// A body that fails or stalls part way yields whatever arrived before.
    pub async fn excerpt(self, max_chars: usize, timeout: Duration) -> String {
        match self.body {
            ResponseBody::Text(text) => text.chars().take(max_chars).collect(),
            ResponseBody::Stream(mut response) => {
                let mut bytes = Vec::new();
                let read = tokio::time::timeout(
                    timeout,
                    read_prefix(&mut response, &mut bytes, max_chars),
                )
                .await;
                match read {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::debug!("Body read stopped early: {}", e),
                    Err(_) => tracing::debug!("Body read timed out after {:?}", timeout),
                }
                String::from_utf8_lossy(&bytes)
                    .chars()
                    .take(max_chars)
                    .collect()
            }
        }
    }
}

async fn read_prefix(
    response: &mut reqwest::Response,
    bytes: &mut Vec<u8>,
    max_chars: usize,
) -> reqwest::Result<()> {
    while String::from_utf8_lossy(bytes).chars().count() < max_chars {
        match response.chunk().await? {
            Some(chunk) => bytes.extend_from_slice(&chunk),
            None => break,
        }
    }
    Ok(())
}

/// Abstraction over HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a GET request to the given URL and resolve once the status line
    /// and headers arrive, giving up after `timeout`.
    ///
    /// Returns `ApiMonitorError::Timeout` when the deadline passes and
    /// `ApiMonitorError::Http` for any other transport failure. Any status
    /// code, including 4xx and 5xx, is a successful response.
    async fn get(&self, url: &str, timeout: Duration) -> crate::Result<HttpResponse>;
}

/// Production HTTP client using reqwest
#[derive(Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, timeout: Duration) -> crate::Result<HttpResponse> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error(url, timeout, e))?;

        tracing::debug!("GET {} -> {}", url, response.status());
        Ok(HttpResponse::streaming(response))
    }
}

fn map_reqwest_error(
    url: &str,
    timeout: Duration,
    e: reqwest::Error,
) -> crate::ApiMonitorError {
    if e.is_timeout() {
        crate::ApiMonitorError::Timeout(timeout)
    } else {
        crate::ApiMonitorError::Http(format!("GET {} failed: {}", url, e))
    }
}
