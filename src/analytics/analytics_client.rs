use std::time::Duration;

use crate::analytics::analytics_query::AnalyticsQuery;
use crate::http::http_client::HttpClient;
use crate::http::http_client_config::HttpClientConfig;
use crate::http::http_request::HttpRequest;
use crate::tracking::response::TrackResponse;
use crate::utils::error::Error;

/// Client for the Matomo reporting (analytics) HTTP API.
pub struct AnalyticsClient {
    client: HttpClient,
    timeout: Duration,
}

impl AnalyticsClient {
    pub fn new() -> Self {
        AnalyticsClient {
            client: HttpClient::new(HttpClientConfig::new()),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_config(config: HttpClientConfig) -> Self {
        AnalyticsClient {
            client: HttpClient::new(config),
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Issues the reporting query and returns the raw response.
    ///
    /// Fails with [`Error::Configuration`] when the query has no API URL.
    /// Transport and timeout failures are reported through the returned
    /// response, never as errors.
    pub async fn send(&self, query: &AnalyticsQuery) -> Result<TrackResponse, Error> {
        let url = query.query_url()?;
        let response = match tokio::time::timeout(self.timeout, self.client.send(&url, HttpRequest::get())).await {
            Ok(Ok(response)) => TrackResponse::from_http(response),
            Ok(Err(error)) => {
                tracing::warn!("analytics request failed: {:?}", error);
                TrackResponse::failed()
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "analytics request timed out");
                TrackResponse::timed_out()
            }
        };
        Ok(response)
    }
}

impl Default for AnalyticsClient {
    fn default() -> Self {
        AnalyticsClient::new()
    }
}
