use std::time::Duration;

/// Configuration for a [`Tracker`](crate::tracking::tracker::Tracker).
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub api_url: Option<String>,
    pub token_auth: Option<String>,
    pub timeout: Duration,
    pub verify_tls: bool,
}

impl TrackerConfig {
    pub fn new() -> Self {
        TrackerConfig {
            api_url: None,
            token_auth: None,
            timeout: Duration::from_secs(10),
            verify_tls: true,
        }
    }

    /// Sets the tracking endpoint URL, e.g. `https://analytics.example.org/piwik.php`.
    ///
    /// Required before any request can be sent.
    pub fn api_url<T: Into<String>>(mut self, api_url: T) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    /// Sets the auth token for requests. The token can be viewed in the
    /// user management section of the Matomo install.
    pub fn token_auth<T: Into<String>>(mut self, token_auth: T) -> Self {
        self.token_auth = Some(token_auth.into());
        self
    }

    /// Sets the request timeout.
    ///
    /// A request that exceeds it is reported as a timed out
    /// [`TrackResponse`](crate::tracking::response::TrackResponse), not as an error.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Toggles TLS certificate verification for the tracking requests.
    ///
    /// When disabled, verification warnings are logged rather than propagated.
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig::new()
    }
}
