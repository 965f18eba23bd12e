//! `lookup()` (spec §4.5): the single-name-to-address algorithm that
//! mirrors a platform's `getaddrinfo()`, including its hosts-file
//! shortcut, literal-address short-circuit, parallel A/AAAA dispatch,
//! and hint handling.

use std::net::IpAddr;

use serde::Serialize;

use crate::config::DnsOrder;
use crate::error::{DnsError, ErrorCode, Result};
use crate::resolver::{ResolveOptions, Resolver};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LookupResult {
    pub address: String,
    pub family: u8,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LookupHints {
    /// Only return a family actually routable from this host (spec
    /// §4.5's ADDRCONFIG handling, resolved as: mutate the requested
    /// family before dispatching, rather than after — see DESIGN.md).
    pub addrconfig: bool,
    /// If AAAA comes back empty, synthesize `::ffff:a.b.c.d` from A.
    pub v4mapped: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LookupOptions {
    /// 0 = either family, 4 = IPv4 only, 6 = IPv6 only.
    pub family: u8,
    pub hints: LookupHints,
    /// Return every address found rather than just the first.
    pub all: bool,
    pub dns_order: Option<DnsOrder>,
}

pub enum LookupOutcome {
    Single(LookupResult),
    Many(Vec<LookupResult>),
}

pub async fn lookup(resolver: &Resolver, name: &str, opts: LookupOptions) -> Result<LookupOutcome> {
    if let Ok(addr) = name.parse::<IpAddr>() {
        let family = if addr.is_ipv4() { 4 } else { 6 };
        if opts.family != 0 && opts.family != family {
            return Err(DnsError::new(
                ErrorCode::BadFamily,
                format!("{name} is not in the requested family"),
            ));
        }
        return Ok(finish(
            vec![LookupResult {
                address: addr.to_string(),
                family,
            }],
            opts,
            resolver,
        ));
    }

    let normalized = name.trim_end_matches('.').to_ascii_lowercase();
    if normalized == "localhost" {
        let mut results = Vec::new();
        if opts.family != 6 {
            results.push(LookupResult {
                address: "127.0.0.1".to_string(),
                family: 4,
            });
        }
        if opts.family != 4 {
            results.push(LookupResult {
                address: "::1".to_string(),
                family: 6,
            });
        }
        return Ok(finish(results, opts, resolver));
    }

    let family_filter = if opts.family == 0 { None } else { Some(opts.family) };
    let hosts_hits = resolver.hosts().addresses_for(&normalized, family_filter);
    if !hosts_hits.is_empty() {
        let results = hosts_hits
            .into_iter()
            .map(|addr| LookupResult {
                family: if addr.is_ipv4() { 4 } else { 6 },
                address: addr.to_string(),
            })
            .collect();
        return Ok(finish(results, opts, resolver));
    }

    // ADDRCONFIG narrows `family` before the A/AAAA queries are even
    // dispatched, trading a small local routability check for avoiding a
    // guaranteed-empty round trip to the upstream (the Open Question
    // decision recorded in DESIGN.md).
    let mut family = opts.family;
    if opts.hints.addrconfig && family == 0 {
        let v4_ok = family_routable(4);
        let v6_ok = family_routable(6);
        family = match (v4_ok, v6_ok) {
            (true, false) => 4,
            (false, true) => 6,
            _ => 0,
        };
    }

    let base_opts = ResolveOptions {
        no_throw_on_nodata: true,
        ..Default::default()
    };

    let mut results = Vec::new();
    match family {
        4 => {
            let a = resolver.resolve_a(name, base_opts).await?;
            results.extend(a.into_iter().map(|r| LookupResult { address: r.address().to_string(), family: 4 }));
        }
        6 => {
            let aaaa = resolver.resolve_aaaa(name, base_opts.clone()).await?;
            if aaaa.is_empty() && opts.hints.v4mapped {
                let a = resolver.resolve_a(name, base_opts).await?;
                results.extend(a.into_iter().map(|r| LookupResult {
                    address: to_v4_mapped(r.address()),
                    family: 6,
                }));
            } else {
                results.extend(aaaa.into_iter().map(|r| LookupResult { address: r.address().to_string(), family: 6 }));
            }
        }
        _ => {
            let (a, aaaa) = tokio::join!(
                resolver.resolve_a(name, base_opts.clone()),
                resolver.resolve_aaaa(name, base_opts),
            );
            results.extend(a?.into_iter().map(|r| LookupResult { address: r.address().to_string(), family: 4 }));
            results.extend(aaaa?.into_iter().map(|r| LookupResult { address: r.address().to_string(), family: 6 }));
        }
    }

    if results.is_empty() {
        return Err(DnsError::new(ErrorCode::NotFound, format!("{name} could not be resolved"))
            .with_syscall("getaddrinfo")
            .with_hostname(name.to_string()));
    }

    Ok(finish(results, opts, resolver))
}

fn finish(mut results: Vec<LookupResult>, opts: LookupOptions, resolver: &Resolver) -> LookupOutcome {
    let order = opts.dns_order.unwrap_or(resolver.options().dns_order);
    sort_by_dns_order(&mut results, order);
    if opts.all {
        LookupOutcome::Many(results)
    } else {
        LookupOutcome::Single(results.into_iter().next().expect("checked non-empty by caller"))
    }
}

/// Stable sort so addresses within a family keep the order the resolver
/// returned them in (the Open Question decision for `dnsOrder`).
fn sort_by_dns_order(results: &mut [LookupResult], order: DnsOrder) {
    match order {
        DnsOrder::Ipv4First => results.sort_by_key(|r| u8::from(r.family != 4)),
        DnsOrder::Ipv6First => results.sort_by_key(|r| u8::from(r.family != 6)),
        DnsOrder::Verbatim => {}
    }
}

fn to_v4_mapped(v4_address: &str) -> String {
    format!("::ffff:{v4_address}")
}

/// Whether `family` (4 or 6) has a usable local route, the same trick
/// glibc's ADDRCONFIG uses: connect a UDP socket without sending
/// anything and see whether the kernel can pick a route.
fn family_routable(family: u8) -> bool {
    use std::net::UdpSocket;
    match family {
        4 => UdpSocket::bind("0.0.0.0:0")
            .and_then(|socket| socket.connect("8.8.8.8:53"))
            .is_ok(),
        6 => UdpSocket::bind("[::]:0")
            .and_then(|socket| socket.connect("[2001:4860:4860::8888]:53"))
            .is_ok(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4first_keeps_relative_order_within_family() {
        let mut results = vec![
            LookupResult { address: "::2".into(), family: 6 },
            LookupResult { address: "1.2.3.4".into(), family: 4 },
            LookupResult { address: "::1".into(), family: 6 },
            LookupResult { address: "5.6.7.8".into(), family: 4 },
        ];
        sort_by_dns_order(&mut results, DnsOrder::Ipv4First);
        let addresses: Vec<&str> = results.iter().map(|r| r.address.as_str()).collect();
        assert_eq!(addresses, vec!["1.2.3.4", "5.6.7.8", "::2", "::1"]);
    }

    #[test]
    fn verbatim_order_is_untouched() {
        let mut results = vec![
            LookupResult { address: "::1".into(), family: 6 },
            LookupResult { address: "1.2.3.4".into(), family: 4 },
        ];
        let original = results.clone();
        sort_by_dns_order(&mut results, DnsOrder::Verbatim);
        assert_eq!(results, original);
    }

    #[test]
    fn v4_mapped_prefixes_correctly() {
        assert_eq!(to_v4_mapped("203.0.113.9"), "::ffff:203.0.113.9");
    }
}
