//! Default values for `ResolverOptions` (spec §3 "Resolver options"),
//! mirroring the public package's documented defaults.

/// Default DoH upstreams, tried in order before `smartRotate` reorders them.
pub const DEFAULT_SERVERS: &[&str] = &["cloudflare-dns.com", "dns.google"];

pub const DEFAULT_PROTOCOL: &str = "https";
pub const DEFAULT_PATH: &str = "/dns-query";

pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_TRIES: u32 = 4;
pub const DEFAULT_CONCURRENCY: usize = 10;

pub const DEFAULT_TTL_SECONDS: u32 = 300;
pub const MAX_TTL_SECONDS: u32 = 86_400;

/// EDNS0 OPT pseudo-record version (only 0 is defined).
pub const EDNS_VERSION: u8 = 0;
/// Advertised UDP payload size in the OPT record; meaningless over HTTPS
/// transport but still part of a well-formed wire message.
pub const EDNS_UDP_SIZE: u16 = 4_096;

/// GET request bodies above this many encoded bytes fall back to POST, the
/// same threshold the upstream resolvers enforce on query string length.
pub const MAX_GET_QUERY_LENGTH: usize = 512;
