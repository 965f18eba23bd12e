//! `reverse()` and `lookupService()` (spec §4.6): turning an address back
//! into a name, and a `(name, port)` pair into a name plus service name.

use std::net::IpAddr;

use crate::error::{ConfigError, DnsError, ErrorCode, Result};
use crate::resolver::{ResolveOptions, Resolver};
use crate::services;

/// Resolves `addr` to the hostnames that claim it: a hosts-file match
/// first, a PTR query otherwise. `::1` is treated exactly like
/// `127.0.0.1` — both are loopback and get the same hosts-first,
/// PTR-fallback treatment regardless of family.
pub async fn reverse(resolver: &Resolver, addr: IpAddr) -> Result<Vec<String>> {
    let arpa_name = to_arpa_name(addr);

    let names = resolver.hosts().name_for(addr);
    if let Some(name) = names {
        return Ok(vec![name]);
    }

    let ptr = resolver
        .resolve_ptr(&arpa_name, ResolveOptions::default())
        .await?;
    Ok(ptr)
}

fn to_arpa_name(addr: IpAddr) -> String {
    match addr {
        IpAddr::V4(v4) => {
            let octets = v4.octets();
            format!(
                "{}.{}.{}.{}.in-addr.arpa",
                octets[3], octets[2], octets[1], octets[0]
            )
        }
        IpAddr::V6(v6) => {
            let mut nibbles = String::with_capacity(63);
            for byte in v6.octets().iter().rev() {
                nibbles.push_str(&format!("{:x}.{:x}.", byte & 0x0F, byte >> 4));
            }
            format!("{nibbles}ip6.arpa")
        }
    }
}

/// Resolves `(address, port)` to `(hostname, service_name)` (spec §4.6):
/// a reverse lookup for the name, then the static service table for the
/// port, trying TCP's name before UDP's.
pub async fn lookup_service(
    resolver: &Resolver,
    address: &str,
    port: u16,
) -> Result<(String, String)> {
    let addr: IpAddr = address
        .parse()
        .map_err(|_| ConfigError::InvalidArgValue(format!("not an IP address: {address}")))?;

    if port == 0 {
        return Err(ConfigError::SocketBadPort(port.to_string()).into());
    }

    let hostnames = reverse(resolver, addr).await?;
    let hostname = hostnames
        .into_iter()
        .next()
        .ok_or_else(|| DnsError::new(ErrorCode::NotFound, format!("no PTR record for {address}")))?;

    let service = services::name_for_port(port, "tcp");
    Ok((hostname, service))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_arpa_name_reverses_octets() {
        let addr: IpAddr = "93.184.216.34".parse().unwrap();
        assert_eq!(to_arpa_name(addr), "34.216.184.93.in-addr.arpa");
    }

    #[test]
    fn ipv6_arpa_name_is_nibble_reversed() {
        let addr: IpAddr = "::1".parse().unwrap();
        let name = to_arpa_name(addr);
        assert!(name.ends_with("ip6.arpa"));
        assert!(name.starts_with("1.0.0.0."));
    }
}
