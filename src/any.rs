//! `resolveAny` (spec §4.4): fans a name out across the fixed rrtype
//! vector with bounded concurrency, preserving the vector's order in the
//! output regardless of which query finishes first.

use futures::stream::{self, StreamExt};
use serde_json::Value;

use crate::dns::DNSResourceType;
use crate::error::{DnsError, ErrorCode};
use crate::resolver::{ResolveOptions, Resolver};

pub struct AnyRecord {
    pub rrtype: DNSResourceType,
    pub values: Vec<Value>,
}

/// Resolves every type in [`DNSResourceType::ANY_FANOUT`] for `name` with
/// at most `concurrency` queries in flight. Types with no data are
/// dropped from the result silently; any other failure is accumulated
/// and, if nothing at all came back, returned as a combined error.
pub async fn resolve_any(
    resolver: &Resolver,
    name: &str,
    concurrency: usize,
) -> Result<Vec<AnyRecord>, DnsError> {
    let types = DNSResourceType::ANY_FANOUT;

    let indexed = types.iter().enumerate().map(|(index, &rrtype)| {
        let name = name.to_string();
        async move {
            let outcome = query_one(resolver, &name, rrtype).await;
            (index, rrtype, outcome)
        }
    });

    let mut results: Vec<(usize, DNSResourceType, Result<Option<Vec<Value>>, DnsError>)> =
        stream::iter(indexed).buffer_unordered(concurrency.max(1)).collect().await;
    results.sort_by_key(|(index, _, _)| *index);

    let mut values = Vec::new();
    let mut errors = Vec::new();
    for (_, rrtype, outcome) in results {
        match outcome {
            Ok(Some(vs)) => values.push(AnyRecord { rrtype, values: vs }),
            Ok(None) => {}
            Err(e) if e.code == ErrorCode::NoData => {}
            Err(e) => errors.push(e),
        }
    }

    if values.is_empty() && !errors.is_empty() {
        return Err(DnsError::combine(errors)
            .with_syscall("queryAny")
            .with_hostname(name.to_string()));
    }
    Ok(values)
}

async fn query_one(
    resolver: &Resolver,
    name: &str,
    rrtype: DNSResourceType,
) -> Result<Option<Vec<Value>>, DnsError> {
    let opts = ResolveOptions {
        no_throw_on_nodata: true,
        ..Default::default()
    };

    let values: Vec<Value> = match rrtype {
        DNSResourceType::A => to_values(resolver.resolve_a(name, opts).await?),
        DNSResourceType::AAAA => to_values(resolver.resolve_aaaa(name, opts).await?),
        DNSResourceType::CNAME => to_values(resolver.resolve_cname(name, opts).await?),
        DNSResourceType::MX => to_values(resolver.resolve_mx(name, opts).await?),
        DNSResourceType::NAPTR => to_values(resolver.resolve_naptr(name, opts).await?),
        DNSResourceType::NS => to_values(resolver.resolve_ns(name, opts).await?),
        DNSResourceType::PTR => to_values(resolver.resolve_ptr(name, opts).await?),
        DNSResourceType::SRV => to_values(resolver.resolve_srv(name, opts).await?),
        DNSResourceType::TXT => to_values(resolver.resolve_txt(name, opts).await?),
        DNSResourceType::SOA => match resolver.resolve_soa(name, opts).await {
            Ok(soa) => to_values(vec![soa]),
            Err(e) if e.code == ErrorCode::NoData => Vec::new(),
            Err(e) => return Err(e),
        },
        other => {
            return Err(DnsError::new(
                ErrorCode::Notimp,
                format!("{other} is not part of the ANY fan-out set"),
            ))
        }
    };

    if values.is_empty() {
        Ok(None)
    } else {
        Ok(Some(values))
    }
}

fn to_values<T: serde::Serialize>(items: Vec<T>) -> Vec<Value> {
    items
        .into_iter()
        .filter_map(|item| serde_json::to_value(item).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fanout_covers_every_spec_named_rrtype() {
        let names: Vec<String> = DNSResourceType::ANY_FANOUT.iter().map(|t| t.to_string()).collect();
        for expected in ["A", "AAAA", "CNAME", "MX", "NAPTR", "NS", "PTR", "SOA", "SRV", "TXT"] {
            assert!(names.contains(&expected.to_string()), "missing {expected} in fan-out set");
        }
    }
}
