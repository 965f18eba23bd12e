//! Resolver configuration (spec §3 "Resolver options"), mirroring the
//! teacher's `DnsConfig` / `DnsConfig::from_env()` split between a plain
//! struct with sane defaults and an environment-driven constructor for
//! deployment use.

use std::sync::Arc;

use crate::cache::{CacheBackend, MemoryCache};
use crate::constants;
use crate::error::{ConfigError, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DnsOrder {
    Verbatim,
    Ipv4First,
    Ipv6First,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

pub struct ResolverOptions {
    pub servers: Vec<String>,
    pub protocol: String,
    pub path: String,
    pub method: HttpMethod,
    pub timeout_ms: u64,
    pub tries: u32,
    pub concurrency: usize,
    pub smart_rotate: bool,
    pub return_http_errors: bool,
    pub default_ttl_seconds: u32,
    pub max_ttl_seconds: u32,
    pub dns_order: DnsOrder,
    pub ecs_subnet: Option<String>,
    pub extra_headers: Vec<(String, String)>,
    pub cache: Arc<dyn CacheBackend>,
}

impl ResolverOptions {
    pub fn validate(&self) -> Result<()> {
        if self.servers.is_empty() {
            return Err(ConfigError::MissingArgs("servers".to_string()).into());
        }
        if self.protocol != "https" && self.protocol != "http" {
            return Err(ConfigError::InvalidArgValue(format!(
                "unsupported protocol: {}",
                self.protocol
            ))
            .into());
        }
        if self.tries == 0 {
            return Err(ConfigError::InvalidArgValue("tries must be >= 1".to_string()).into());
        }
        if self.concurrency == 0 {
            return Err(
                ConfigError::InvalidArgValue("concurrency must be >= 1".to_string()).into(),
            );
        }
        Ok(())
    }

    /// Builds options from environment variables, falling back to the
    /// documented defaults for anything unset. Invalid values (a
    /// non-numeric `DOH_TIMEOUT_MS`, say) are reported as `DnsError`
    /// rather than silently ignored.
    pub fn from_env() -> Result<Self> {
        let mut opts = Self::default();

        if let Ok(servers) = std::env::var("DOH_SERVERS") {
            opts.servers = servers.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(protocol) = std::env::var("DOH_PROTOCOL") {
            opts.protocol = protocol;
        }
        if let Ok(timeout) = std::env::var("DOH_TIMEOUT_MS") {
            opts.timeout_ms = timeout
                .parse()
                .map_err(|_| ConfigError::InvalidArgValue("DOH_TIMEOUT_MS".to_string()))?;
        }
        if let Ok(tries) = std::env::var("DOH_TRIES") {
            opts.tries = tries
                .parse()
                .map_err(|_| ConfigError::InvalidArgValue("DOH_TRIES".to_string()))?;
        }
        if let Ok(concurrency) = std::env::var("DOH_CONCURRENCY") {
            opts.concurrency = concurrency
                .parse()
                .map_err(|_| ConfigError::InvalidArgValue("DOH_CONCURRENCY".to_string()))?;
        }
        if let Ok(smart_rotate) = std::env::var("DOH_SMART_ROTATE") {
            opts.smart_rotate = smart_rotate == "true" || smart_rotate == "1";
        }

        opts.validate()?;
        Ok(opts)
    }
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            servers: constants::DEFAULT_SERVERS.iter().map(|s| s.to_string()).collect(),
            protocol: constants::DEFAULT_PROTOCOL.to_string(),
            path: constants::DEFAULT_PATH.to_string(),
            method: HttpMethod::Post,
            timeout_ms: constants::DEFAULT_TIMEOUT_MS,
            tries: constants::DEFAULT_TRIES,
            concurrency: constants::DEFAULT_CONCURRENCY,
            smart_rotate: true,
            return_http_errors: false,
            default_ttl_seconds: constants::DEFAULT_TTL_SECONDS,
            max_ttl_seconds: constants::MAX_TTL_SECONDS,
            dns_order: DnsOrder::Ipv4First,
            ecs_subnet: None,
            extra_headers: Vec::new(),
            cache: Arc::new(MemoryCache::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(ResolverOptions::default().validate().is_ok());
    }

    #[test]
    fn empty_servers_fail_validation() {
        let mut opts = ResolverOptions::default();
        opts.servers.clear();
        assert!(opts.validate().is_err());
    }

    #[test]
    fn zero_tries_fail_validation() {
        let mut opts = ResolverOptions::default();
        opts.tries = 0;
        assert!(opts.validate().is_err());
    }
}
