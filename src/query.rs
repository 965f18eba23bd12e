//! The Query Engine (spec §4.2 "Resolution pipeline"): builds one query
//! packet, walks the server list with retry/backoff, and turns the
//! first usable response (or the accumulated failures) into a result.

use std::time::Duration;

use rand::Rng;

use crate::cache::cache_key;
use crate::cancel::CancellationHandle;
use crate::config::ResolverOptions;
use crate::dns::{decode_message, encode_query, DNSResourceType, DnsMessage, ResponseCode};
use crate::error::{DnsError, ErrorCode};
use crate::servers::ServerSet;
use crate::transport;

pub struct QueryEngine {
    client: reqwest::Client,
    servers: std::sync::Arc<ServerSet>,
}

impl QueryEngine {
    pub fn new(servers: std::sync::Arc<ServerSet>) -> Self {
        Self {
            client: reqwest::Client::new(),
            servers,
        }
    }

    /// Resolves `name`/`rrtype`, trying every server in turn with up to
    /// `options.tries` attempts each (spec §4.2 steps 1-5). An
    /// authoritative NXDOMAIN from any server short-circuits the whole
    /// query immediately; any other failure keeps iterating. `ecs_subnet`
    /// is the per-call override (spec §4.3); it takes precedence over
    /// `options.ecs_subnet` when given.
    pub async fn query(
        &self,
        name: &str,
        rrtype: DNSResourceType,
        options: &ResolverOptions,
        ecs_subnet: Option<&str>,
        cancel: &CancellationHandle,
    ) -> Result<DnsMessage, DnsError> {
        let ascii_name = idna::domain_to_ascii(name)
            .map_err(|_| DnsError::new(ErrorCode::BadName, format!("invalid hostname: {name}")))?;

        let ecs_subnet = ecs_subnet.or(options.ecs_subnet.as_deref());
        let id: u16 = rand::rng().random();
        let packet = encode_query(id, &ascii_name, rrtype, ecs_subnet, false)
            .map_err(DnsError::from)?;

        let mut errors = Vec::new();
        let mut failed_servers = Vec::new();

        for server in self.servers.get() {
            if cancel.is_cancelled() {
                return Err(DnsError::new(ErrorCode::Cancelled, "query cancelled"));
            }

            match self.query_one_server(&server, &packet, options, cancel).await {
                Ok(message) => {
                    if message.rcode() == ResponseCode::NameError && message.header.aa {
                        for failed in &failed_servers {
                            self.servers.demote(failed);
                        }
                        return Err(DnsError::new(ErrorCode::NotFound, format!("{name} not found"))
                            .with_syscall(format!("query{}", rrtype.title_case()))
                            .with_hostname(name.to_string()));
                    }
                    return Ok(message);
                }
                Err(err) => {
                    failed_servers.push(server.clone());
                    errors.push(err);
                }
            }
        }

        for failed in &failed_servers {
            self.servers.demote(failed);
        }

        Err(DnsError::combine(errors)
            .with_syscall(format!("query{}", rrtype.title_case()))
            .with_hostname(name.to_string()))
    }

    async fn query_one_server(
        &self,
        server: &str,
        packet: &[u8],
        options: &ResolverOptions,
        cancel: &CancellationHandle,
    ) -> Result<DnsMessage, DnsError> {
        let mut last_err = DnsError::new(ErrorCode::Timeout, "no attempts made");

        for attempt in 0..options.tries {
            if cancel.is_cancelled() {
                return Err(DnsError::new(ErrorCode::Cancelled, "query cancelled"));
            }

            let timeout = Duration::from_millis(options.timeout_ms.saturating_mul(1u64 << attempt));

            let response = tokio::select! {
                result = transport::send(
                    &self.client,
                    &options.protocol,
                    server,
                    &options.path,
                    packet,
                    options.method,
                    &options.extra_headers,
                    timeout,
                    options.return_http_errors,
                ) => result,
                _ = cancel.cancelled() => {
                    return Err(DnsError::new(ErrorCode::Cancelled, "query cancelled"));
                }
            };

            match response {
                Ok(resp) if resp.status / 100 == 2 => {
                    return decode_message(&resp.body).map_err(DnsError::from);
                }
                Ok(resp) if transport::is_retryable(resp.status) => {
                    last_err = DnsError::new(
                        ErrorCode::Servfail,
                        format!("server {server} returned HTTP {}", resp.status),
                    );
                    continue;
                }
                Ok(resp) => {
                    return Err(DnsError::new(
                        ErrorCode::BadResp,
                        format!("server {server} returned HTTP {}", resp.status),
                    ));
                }
                Err(err) => {
                    last_err = err;
                    if last_err.code != ErrorCode::Timeout && last_err.code != ErrorCode::ConnRefused
                    {
                        return Err(last_err);
                    }
                }
            }
        }

        Err(last_err)
    }
}

/// The cache key for a `(name, rrtype[, ecsSubnet])` triple, delegating to
/// the cache module's shared key format so a per-call `ecsSubnet` partitions
/// the cache the same way it partitions the wire query (spec §4.3).
pub fn key_for(name: &str, rrtype: DNSResourceType, ecs_subnet: Option<&str>) -> String {
    cache_key(name, &rrtype.to_string(), ecs_subnet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_for_matches_cache_module_format() {
        assert_eq!(
            key_for("Example.com.", DNSResourceType::A, None),
            cache_key("example.com", "A", None)
        );
    }

    #[test]
    fn key_for_partitions_by_ecs_subnet() {
        assert_ne!(
            key_for("example.com", DNSResourceType::A, Some("1.2.3.0/24")),
            key_for("example.com", DNSResourceType::A, None)
        );
    }
}
