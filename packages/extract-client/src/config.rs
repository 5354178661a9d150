//! Client configuration.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::{ExtractError, Result};
use crate::types::search::PaginationStyle;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Status polling behaviour for extract jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between status polls. Default: 1s.
    #[serde(with = "millis")]
    pub interval: Duration,

    /// Upper bound for the delay after repeated transport errors.
    ///
    /// The delay doubles on every failed poll and drops back to `interval`
    /// after a successful one. Default: 30s.
    #[serde(with = "millis")]
    pub max_backoff: Duration,

    /// Give up after this many status requests. Default: poll forever.
    #[serde(default)]
    pub max_polls: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            max_backoff: Duration::from_secs(30),
            max_polls: None,
        }
    }
}

impl PollConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = Some(max_polls);
        self
    }

    /// Delay to use after `failures` consecutive transport errors.
    pub fn backoff(&self, failures: u32) -> Duration {
        if failures == 0 {
            return self.interval;
        }
        let factor = 2u32.saturating_pow(failures.min(16));
        self.interval.saturating_mul(factor).min(self.max_backoff.max(self.interval))
    }
}

/// Configuration for [`HttpExtractApi`](crate::HttpExtractApi) and the job client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Search server root, without trailing slash.
    pub base_url: String,

    /// Per-request timeout applied by the HTTP transport. Default: 120s.
    #[serde(with = "millis")]
    pub request_timeout: Duration,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub pagination: PaginationStyle,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(120),
            poll: PollConfig::default(),
            pagination: PaginationStyle::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::default().with_base_url(base_url)
    }

    /// Load from `EXTRACT_*` environment variables, defaulting anything unset.
    ///
    /// Does not read `.env`; binaries load it first.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = env::var("EXTRACT_BASE_URL") {
            config = config.with_base_url(url);
        }
        if let Some(secs) = parse_var::<u64>("EXTRACT_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = parse_var::<u64>("EXTRACT_POLL_INTERVAL_MS")? {
            config.poll.interval = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64>("EXTRACT_MAX_BACKOFF_SECS")? {
            config.poll.max_backoff = Duration::from_secs(secs);
        }
        config.poll.max_polls = parse_var::<u32>("EXTRACT_MAX_POLLS")?;
        if let Ok(style) = env::var("EXTRACT_PAGINATION") {
            config.pagination = match style.as_str() {
                "first_clause" => PaginationStyle::FirstClause,
                "envelope" => PaginationStyle::Envelope,
                other => {
                    return Err(ExtractError::Config(format!(
                        "EXTRACT_PAGINATION must be first_clause or envelope, got {other}"
                    )))
                }
            };
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_pagination(mut self, pagination: PaginationStyle) -> Self {
        self.pagination = pagination;
        self
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ExtractError::Config(format!("{name} must be a valid number"))),
        Err(_) => Ok(None),
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
