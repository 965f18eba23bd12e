//! Integration tests that exercise the Resolver Facade, cache, hosts file,
//! and ANY fan-out together without touching the network: every case here
//! either hits a pre-seeded cache or a hosts-file entry, both of which
//! short-circuit before the Query Engine ever dials a server. Live-network
//! behavior (the actual DoH round trip, real server demotion) isn't
//! something a hermetic test suite can assert on, so it isn't covered here.

use std::net::IpAddr;
use std::sync::Arc;

use tangerine_doh::any::resolve_any;
use tangerine_doh::cache::{CacheBackend, CachedEntry, MemoryCache};
use tangerine_doh::config::ResolverOptions;
use tangerine_doh::dns::DNSResourceType;
use tangerine_doh::hosts::HostsFile;
use tangerine_doh::lookup::{lookup, LookupOptions, LookupOutcome};
use tangerine_doh::query;
use tangerine_doh::resolver::{
    AddressRecord, AddressResult, MxRecord, NaptrRecord, ResolveOptions, Resolver, SoaRecord, SrvRecord,
};
use tangerine_doh::reverse::{lookup_service, reverse};

fn resolver_with_cache(cache: Arc<MemoryCache>) -> Resolver {
    let options = ResolverOptions {
        cache,
        ..ResolverOptions::default()
    };
    Resolver::new(options).expect("default options are valid")
}

async fn seed<T: serde::Serialize>(cache: &MemoryCache, name: &str, rrtype: DNSResourceType, values: Vec<T>) {
    let key = query::key_for(name, rrtype, None);
    let payload = serde_json::to_value(values).unwrap();
    cache.set(&key, CachedEntry::new(payload, 300), 300).await;
}

#[tokio::test]
async fn cache_hit_returns_without_querying_a_server() {
    let cache = Arc::new(MemoryCache::new());
    seed(
        &cache,
        "example.com",
        DNSResourceType::A,
        vec![AddressRecord { address: "93.184.216.34".to_string(), ttl: 300 }],
    )
    .await;
    let resolver = resolver_with_cache(cache);

    let records = resolver
        .resolve_a("example.com", ResolveOptions::default())
        .await
        .expect("cache hit should satisfy the query without a network round trip");

    assert_eq!(records, vec![AddressResult::Plain("93.184.216.34".to_string())]);
}

#[tokio::test]
async fn ttl_option_returns_address_and_ttl_objects() {
    let cache = Arc::new(MemoryCache::new());
    seed(
        &cache,
        "example.com",
        DNSResourceType::A,
        vec![AddressRecord { address: "93.184.216.34".to_string(), ttl: 300 }],
    )
    .await;
    let resolver = resolver_with_cache(cache);

    let records = resolver
        .resolve_a("example.com", ResolveOptions { ttl: true, ..Default::default() })
        .await
        .expect("cache hit should satisfy the query without a network round trip");

    let [AddressResult::WithTtl(record)] = records.as_slice() else {
        panic!("expected a single {{address, ttl}} record");
    };
    assert_eq!(record.address, "93.184.216.34");
    assert!(record.ttl > 0 && record.ttl <= 300);
}

#[tokio::test]
async fn cached_ttl_decays_with_elapsed_time() {
    let cache = Arc::new(MemoryCache::new());
    seed(
        &cache,
        "example.com",
        DNSResourceType::A,
        vec![AddressRecord { address: "93.184.216.34".to_string(), ttl: 2 }],
    )
    .await;
    let resolver = resolver_with_cache(cache);

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let records = resolver
        .resolve_a("example.com", ResolveOptions { ttl: true, ..Default::default() })
        .await
        .expect("cache hit should satisfy the query without a network round trip");

    let [AddressResult::WithTtl(record)] = records.as_slice() else {
        panic!("expected a single {{address, ttl}} record");
    };
    assert!(record.ttl < 2, "ttl should have decayed below its seeded value");
}

#[tokio::test]
async fn ecs_subnet_partitions_the_cache_by_subnet() {
    let cache = Arc::new(MemoryCache::new());
    seed(&cache, "example.com", DNSResourceType::A, vec![AddressRecord { address: "93.184.216.34".to_string(), ttl: 300 }]).await;
    let scoped_key = query::key_for("example.com", DNSResourceType::A, Some("1.2.3.0/24"));
    let scoped_payload = serde_json::to_value(vec![AddressRecord {
        address: "198.51.100.7".to_string(),
        ttl: 300,
    }])
    .unwrap();
    cache.set(&scoped_key, CachedEntry::new(scoped_payload, 300), 300).await;
    let resolver = resolver_with_cache(cache);

    let unscoped = resolver
        .resolve_a("example.com", ResolveOptions::default())
        .await
        .expect("the unscoped entry should be hit when no ecsSubnet is given");
    assert_eq!(unscoped, vec![AddressResult::Plain("93.184.216.34".to_string())]);

    let scoped = resolver
        .resolve_a(
            "example.com",
            ResolveOptions { ecs_subnet: Some("1.2.3.0/24".to_string()), ..Default::default() },
        )
        .await
        .expect("the matching ecsSubnet should hit its own partitioned entry");
    assert_eq!(scoped, vec![AddressResult::Plain("198.51.100.7".to_string())]);
}

#[tokio::test]
async fn purging_a_cache_entry_removes_it() {
    let cache = Arc::new(MemoryCache::new());
    seed(
        &cache,
        "example.com",
        DNSResourceType::MX,
        vec![MxRecord { priority: 10, exchange: "mail.example.com".to_string() }],
    )
    .await;

    let key = query::key_for("example.com", DNSResourceType::MX, None);
    assert!(cache.get(&key).await.is_some());
    cache.purge(&key).await;
    assert!(cache.get(&key).await.is_none());
}

#[tokio::test]
async fn lookup_resolves_a_hosts_file_entry_without_a_network_query() {
    let hosts = HostsFile::parse("10.0.0.5 myhost.local myhost\n::1 localhost\n");
    let options = ResolverOptions::default();
    let resolver = Resolver::with_hosts(options, hosts).expect("default options are valid");

    let outcome = lookup(&resolver, "myhost.local", LookupOptions::default())
        .await
        .expect("hosts-file entry should short-circuit before any query");

    match outcome {
        LookupOutcome::Single(result) => {
            assert_eq!(result.address, "10.0.0.5");
            assert_eq!(result.family, 4);
        }
        LookupOutcome::Many(_) => panic!("expected a single result"),
    }
}

#[tokio::test]
async fn lookup_of_localhost_returns_both_families_by_default() {
    let resolver = Resolver::with_hosts(ResolverOptions::default(), HostsFile::empty())
        .expect("default options are valid");

    let outcome = lookup(&resolver, "localhost", LookupOptions { all: true, ..Default::default() })
        .await
        .unwrap();

    let LookupOutcome::Many(results) = outcome else { panic!("expected `all` to return a vec") };
    let addresses: Vec<&str> = results.iter().map(|r| r.address.as_str()).collect();
    assert!(addresses.contains(&"127.0.0.1"));
    assert!(addresses.contains(&"::1"));
}

#[tokio::test]
async fn reverse_resolves_a_hosts_file_entry_without_a_ptr_query() {
    let hosts = HostsFile::parse("192.0.2.10 printer.local\n");
    let resolver = Resolver::with_hosts(ResolverOptions::default(), hosts).expect("default options are valid");

    let addr: IpAddr = "192.0.2.10".parse().unwrap();
    let names = reverse(&resolver, addr).await.unwrap();

    assert_eq!(names, vec!["printer.local".to_string()]);
}

#[tokio::test]
async fn lookup_service_combines_hosts_reverse_and_the_service_table() {
    let hosts = HostsFile::parse("192.0.2.10 printer.local\n");
    let resolver = Resolver::with_hosts(ResolverOptions::default(), hosts).expect("default options are valid");

    let (hostname, service) = lookup_service(&resolver, "192.0.2.10", 443).await.unwrap();

    assert_eq!(hostname, "printer.local");
    assert_eq!(service, "https");
}

#[tokio::test]
async fn lookup_service_rejects_port_zero() {
    let resolver = Resolver::with_hosts(ResolverOptions::default(), HostsFile::empty())
        .expect("default options are valid");

    let result = lookup_service(&resolver, "192.0.2.10", 0).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn resolve_any_preserves_fanout_order_when_every_type_is_cached() {
    let cache = Arc::new(MemoryCache::new());
    let name = "example.com";

    seed(&cache, name, DNSResourceType::A, vec![AddressRecord { address: "93.184.216.34".to_string(), ttl: 300 }]).await;
    seed(&cache, name, DNSResourceType::AAAA, vec![AddressRecord { address: "2606:2800:220:1::1".to_string(), ttl: 300 }]).await;
    seed(&cache, name, DNSResourceType::CNAME, vec!["canonical.example.com".to_string()]).await;
    seed(&cache, name, DNSResourceType::MX, vec![MxRecord { priority: 10, exchange: "mail.example.com".to_string() }]).await;
    seed(
        &cache,
        name,
        DNSResourceType::NAPTR,
        vec![NaptrRecord {
            order: 100,
            preference: 10,
            flags: "S".to_string(),
            service: "SIP+D2U".to_string(),
            regexp: String::new(),
            replacement: "_sip._udp.example.com".to_string(),
        }],
    )
    .await;
    seed(&cache, name, DNSResourceType::NS, vec!["ns1.example.com".to_string()]).await;
    seed(&cache, name, DNSResourceType::PTR, vec!["ptr.example.com".to_string()]).await;
    seed(
        &cache,
        name,
        DNSResourceType::SOA,
        vec![SoaRecord {
            nsname: "ns1.example.com".to_string(),
            hostmaster: "hostmaster.example.com".to_string(),
            serial: 1,
            refresh: 7200,
            retry: 3600,
            expire: 1209600,
            minttl: 300,
        }],
    )
    .await;
    seed(
        &cache,
        name,
        DNSResourceType::SRV,
        vec![SrvRecord { priority: 10, weight: 5, port: 5060, name: "sip.example.com".to_string() }],
    )
    .await;
    seed(&cache, name, DNSResourceType::TXT, vec![vec!["v=spf1 -all".to_string()]]).await;

    let resolver = resolver_with_cache(cache);
    let records = resolve_any(&resolver, name, resolver.options().concurrency).await.unwrap();

    let order: Vec<DNSResourceType> = records.iter().map(|r| r.rrtype).collect();
    assert_eq!(order, DNSResourceType::ANY_FANOUT.to_vec());
}

/// Needs real internet access; run explicitly with `cargo test -- --ignored`.
#[tokio::test]
#[ignore]
async fn live_resolve_a_against_the_default_servers() {
    let resolver = Resolver::new(ResolverOptions::default()).unwrap();
    let records = resolver.resolve_a("example.com", ResolveOptions::default()).await.unwrap();
    assert!(!records.is_empty());
}
