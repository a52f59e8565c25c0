use std::{env, time::Duration};

/// Storage engine configuration.
///
/// Passed explicitly at construction; nothing in the engine reads the
/// environment on its own.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Name of the single table holding every entity.
    pub table_name: String,
    /// AWS region override. `None` uses the SDK default chain.
    pub region: Option<String>,
    /// Endpoint override, for DynamoDB Local in tests and development.
    pub endpoint_url: Option<String>,
    /// Maximum retries after the initial attempt (default: 3).
    pub max_retries: u32,
    /// Base backoff delay; attempt `n` sleeps `base * 2^n` (default: 100ms).
    pub base_retry_delay: Duration,
}

impl StorageConfig {
    /// Creates a configuration with default retry settings.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            region: None,
            endpoint_url: None,
            max_retries: 3,
            base_retry_delay: Duration::from_millis(100),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `BOTTEGA_TABLE_NAME` - Table name (default: "bottega")
    /// - `BOTTEGA_REGION` - AWS region override (default: SDK default chain)
    /// - `BOTTEGA_ENDPOINT_URL` - Endpoint override (default: unset)
    /// - `BOTTEGA_MAX_RETRIES` - Maximum retries (default: 3)
    /// - `BOTTEGA_BASE_RETRY_DELAY_MS` - Base backoff in ms (default: 100)
    pub fn from_env() -> Self {
        let mut config =
            Self::new(env::var("BOTTEGA_TABLE_NAME").unwrap_or_else(|_| "bottega".to_string()));
        config.region = env::var("BOTTEGA_REGION").ok();
        config.endpoint_url = env::var("BOTTEGA_ENDPOINT_URL").ok();
        if let Some(max) = env::var("BOTTEGA_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.max_retries = max;
        }
        if let Some(ms) = env::var("BOTTEGA_BASE_RETRY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.base_retry_delay = Duration::from_millis(ms);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::new("bottega-test");
        assert_eq!(config.table_name, "bottega-test");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_retry_delay, Duration::from_millis(100));
        assert!(config.endpoint_url.is_none());
    }
}
