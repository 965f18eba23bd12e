//! Resolver metrics (spec §10 ambient additions), grounded in the
//! teacher's `src/metrics.rs` `DnsMetrics` struct: a small set of
//! `prometheus` collectors registered once and updated from the hot path.
//! Not wired to an HTTP exposition endpoint — this crate resolves names,
//! it doesn't serve a `/metrics` surface.

use prometheus::{CounterVec, HistogramVec, Opts, Registry};

use crate::dns::DNSResourceType;

pub struct ResolverMetrics {
    pub registry: Registry,
    cache_hits: CounterVec,
    cache_misses: CounterVec,
    query_duration: HistogramVec,
    server_failures: CounterVec,
}

impl ResolverMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let cache_hits = CounterVec::new(
            Opts::new("doh_cache_hits_total", "Cache hits by rrtype"),
            &["rrtype"],
        )
        .expect("static metric definition");
        let cache_misses = CounterVec::new(
            Opts::new("doh_cache_misses_total", "Cache misses by rrtype"),
            &["rrtype"],
        )
        .expect("static metric definition");
        let query_duration = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "doh_query_duration_seconds",
                "Wall-clock time spent resolving a query, including retries",
            ),
            &["rrtype"],
        )
        .expect("static metric definition");
        let server_failures = CounterVec::new(
            Opts::new("doh_server_failures_total", "Failed attempts by server"),
            &["server"],
        )
        .expect("static metric definition");

        for collector in [
            Box::new(cache_hits.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(cache_misses.clone()),
            Box::new(query_duration.clone()),
            Box::new(server_failures.clone()),
        ] {
            let _ = registry.register(collector);
        }

        Self {
            registry,
            cache_hits,
            cache_misses,
            query_duration,
            server_failures,
        }
    }

    pub fn record_cache_hit(&self, rrtype: DNSResourceType) {
        self.cache_hits.with_label_values(&[&rrtype.to_string()]).inc();
    }

    pub fn record_cache_miss(&self, rrtype: DNSResourceType) {
        self.cache_misses.with_label_values(&[&rrtype.to_string()]).inc();
    }

    pub fn observe_query_duration(&self, rrtype: DNSResourceType, seconds: f64) {
        self.query_duration
            .with_label_values(&[&rrtype.to_string()])
            .observe(seconds);
    }

    pub fn record_server_failure(&self, server: &str) {
        self.server_failures.with_label_values(&[server]).inc();
    }
}

impl Default for ResolverMetrics {
    fn default() -> Self {
        Self::new()
    }
}
