//! Client configuration
//!
//! Defaults reproduce the service's expected session setup: 30 second
//! timeout, a pool of 50 connections that blocks when exhausted, and three
//! retries for connection failures.

use std::time::Duration;

use crate::API_URL;

/// Settings for a [`Client`](crate::client::Client)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every endpoint is joined onto
    pub origin: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Maximum idle pooled connections per host, and concurrent sends when
    /// `pool_block` is set (a response whose body is still unread does not
    /// count)
    pub pool_max_size: usize,
    /// Block callers when all send slots are taken instead of opening extra connections
    pub pool_block: bool,
    /// Extra attempts after a connection-level failure
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: API_URL.to_string(),
            timeout: Duration::from_secs(30),
            pool_max_size: 50,
            pool_block: true,
            max_retries: 3,
        }
    }
}

impl ClientConfig {
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        let origin: String = origin.into();
        self.origin = origin.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_pool(mut self, pool_max_size: usize, block: bool) -> Self {
        self.pool_max_size = pool_max_size;
        self.pool_block = block;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.origin, "https://api.productai.cn");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.pool_max_size, 50);
        assert!(config.pool_block);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_with_pool_sets_size_and_block() {
        let config = ClientConfig::default().with_pool(4, false);
        assert_eq!(config.pool_max_size, 4);
        assert!(!config.pool_block);
    }

    #[test]
    fn test_with_origin_drops_trailing_slash() {
        let config = ClientConfig::default().with_origin("http://127.0.0.1:8080/");
        assert_eq!(config.origin, "http://127.0.0.1:8080");
    }
}
