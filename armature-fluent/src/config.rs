//! Transport configuration.

use std::time::Duration;

/// Idle-connection pool settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    /// How long an idle connection is kept open.
    pub idle_timeout: Duration,
    /// Idle connections kept per host.
    pub max_idle_per_host: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(90),
            max_idle_per_host: 32,
        }
    }
}

/// Settings for the reqwest-backed transport, read once at construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `scheme://host[:port]` every request target is joined onto.
    pub base_url: String,
    /// Whole-exchange deadline enforced by reqwest.
    pub timeout: Duration,
    /// Deadline for establishing a connection.
    pub connect_timeout: Duration,
    /// Idle-connection pooling.
    pub pool: PoolSettings,
    /// Headers sent with every request, in order.
    pub default_headers: Vec<(String, String)>,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
    /// Names this client in [`crate::StatusError`] messages.
    pub label: Option<String>,
    /// Turn non-2xx responses into [`crate::HttpClientError::Status`].
    pub error_for_status: bool,
    /// Accept gzip and brotli encoded responses.
    pub decompress: bool,
    /// Redirect hops to follow; `0` disables following.
    pub redirect_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool: PoolSettings::default(),
            default_headers: Vec::new(),
            user_agent: format!("armature-fluent/{}", env!("CARGO_PKG_VERSION")),
            label: None,
            error_for_status: true,
            decompress: true,
            redirect_limit: 10,
        }
    }
}

impl ClientConfig {
    /// Start from the defaults.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Chainable construction of a [`ClientConfig`].
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the base URL request targets are joined onto.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the whole-exchange timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Replace the pool settings.
    pub fn pool(mut self, pool: PoolSettings) -> Self {
        self.config.pool = pool;
        self
    }

    /// Append a header sent with every request.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.push((name.into(), value.into()));
        self
    }

    /// Override the `User-Agent` header.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Label status errors raised through this client.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.config.label = Some(label.into());
        self
    }

    /// Whether non-2xx responses fail the request.
    pub fn error_for_status(mut self, enable: bool) -> Self {
        self.config.error_for_status = enable;
        self
    }

    /// Whether to accept compressed responses.
    pub fn decompress(mut self, enable: bool) -> Self {
        self.config.decompress = enable;
        self
    }

    /// Follow at most `limit` redirects; `0` returns 3xx responses as-is.
    pub fn redirect_limit(mut self, limit: usize) -> Self {
        self.config.redirect_limit = limit;
        self
    }

    /// Finish the configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
