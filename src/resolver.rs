//! The Resolver Facade (spec §4.3 "Decoding/normalization layer"): the
//! per-rrtype public API, answer-shape normalization, and rcode -> error
//! mapping. Name validation, cache lookups and per-call options
//! (`ttl`, `ecsSubnet`, `purgeCache`, `noThrowOnNODATA`) are handled once
//! here and shared by every rrtype method via a small macro, the same way
//! the teacher's resource-extraction helpers avoid near-duplicate
//! per-type functions.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::cache::CachedEntry;
use crate::cancel::CancellationHandle;
use crate::config::ResolverOptions;
use crate::dns::{DNSResourceType, DnsMessage, DnsRecord, ResponseCode};
use crate::error::{DnsError, ErrorCode, Result};
use crate::hosts::HostsFile;
use crate::metrics::ResolverMetrics;
use crate::query::{self, QueryEngine};
use crate::servers::ServerSet;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddressRecord {
    pub address: String,
    pub ttl: u32,
}

/// A/AAAA's answer shape (spec §4.3): a bare address by default, or
/// `{address, ttl}` when the per-call `ttl` option is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AddressResult {
    Plain(String),
    WithTtl(AddressRecord),
}

impl AddressResult {
    pub fn address(&self) -> &str {
        match self {
            AddressResult::Plain(address) => address,
            AddressResult::WithTtl(record) => &record.address,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MxRecord {
    pub priority: u16,
    pub exchange: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SrvRecord {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SoaRecord {
    pub nsname: String,
    pub hostmaster: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minttl: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NaptrRecord {
    pub order: u16,
    pub preference: u16,
    pub flags: String,
    pub service: String,
    pub regexp: String,
    pub replacement: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaaRecord {
    pub critical: u8,
    pub tag: String,
    pub value: String,
}

/// `certificate` is base64, matching the cache's Buffer-envelope
/// convention used for every other binary field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CertRecord {
    pub cert_type: u16,
    pub key_tag: u16,
    pub algorithm: u8,
    pub certificate: String,
}

/// `data` is lowercase hex, the conventional TLSA presentation format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TlsaRecord {
    pub usage: u8,
    pub selector: u8,
    pub match_type: u8,
    pub data: String,
}

/// Per-call options layered on top of the resolver-wide `ResolverOptions`
/// (spec §4.3's "per-call options").
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub ecs_subnet: Option<String>,
    pub purge_cache: bool,
    pub no_throw_on_nodata: bool,
    /// A/AAAA return bare addresses by default; set this to get
    /// `{address, ttl}` objects instead (spec §4.3's A/AAAA row).
    pub ttl: bool,
}

/// Expands to a `pub async fn $name(&self, name: &str, opts: ResolveOptions)
/// -> Result<Vec<$out>>` that delegates to `resolve_typed`, avoiding a
/// near-identical function per rrtype. These rrtypes carry no `ttl` field
/// of their own, so the cache-hit decay hook is a no-op.
macro_rules! rrtype_method {
    ($name:ident, $rrtype:expr, $out:ty, $parse:expr) => {
        pub async fn $name(&self, name: &str, opts: ResolveOptions) -> Result<Vec<$out>> {
            self.resolve_typed(name, $rrtype, opts, $parse, |_, _| {}).await
        }
    };
}

pub struct Resolver {
    options: ResolverOptions,
    servers: Arc<ServerSet>,
    engine: QueryEngine,
    pub metrics: Arc<ResolverMetrics>,
    hosts: HostsFile,
}

impl Resolver {
    pub fn new(options: ResolverOptions) -> Result<Self> {
        Self::with_hosts(options, HostsFile::load_default())
    }

    /// Like [`Resolver::new`], but with an explicit hosts table instead of
    /// the platform default — useful for tests and for deployments that
    /// keep their hosts file somewhere other than `/etc/hosts`.
    pub fn with_hosts(options: ResolverOptions, hosts: HostsFile) -> Result<Self> {
        options.validate()?;
        let servers = Arc::new(ServerSet::new(options.servers.clone(), options.smart_rotate)?);
        let engine = QueryEngine::new(servers.clone());
        Ok(Self {
            options,
            servers,
            engine,
            metrics: Arc::new(ResolverMetrics::new()),
            hosts,
        })
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    pub fn hosts(&self) -> &HostsFile {
        &self.hosts
    }

    pub fn set_servers(&self, servers: Vec<String>) -> Result<()> {
        self.servers.set(servers)
    }

    pub fn get_servers(&self) -> Vec<String> {
        self.servers.get()
    }

    /// Hostname validation shared by every rrtype method (spec §4.3):
    /// the root name is valid on its own, but a leading dot or an empty
    /// label elsewhere is not.
    fn validate_name(name: &str, rrtype: DNSResourceType) -> Result<()> {
        if name == "." {
            return Ok(());
        }
        if name.is_empty() || name.starts_with('.') || name.contains("..") {
            return Err(DnsError::new(ErrorCode::BadName, format!("invalid hostname: {name}"))
                .with_syscall(format!("query{}", rrtype.title_case()))
                .with_hostname(name.to_string()));
        }
        Ok(())
    }

    /// `decay_ttl` is applied to every cache-hit value with the entry's
    /// remaining TTL (spec §3/§4.3, the §8 "answers decay on read"
    /// invariant); it's a no-op for rrtypes whose answer shape carries no
    /// `ttl` field of its own.
    async fn resolve_typed<T, F, D>(
        &self,
        name: &str,
        rrtype: DNSResourceType,
        opts: ResolveOptions,
        parse: F,
        decay_ttl: D,
    ) -> Result<Vec<T>>
    where
        T: Serialize + DeserializeOwned + Clone,
        F: Fn(&DnsRecord, &DnsMessage) -> Result<T>,
        D: Fn(&mut T, u32),
    {
        Self::validate_name(name, rrtype)?;
        let key = query::key_for(name, rrtype, opts.ecs_subnet.as_deref());

        if opts.purge_cache {
            self.options.cache.purge(&key).await;
        } else if let Some(entry) = self.options.cache.get(&key).await {
            // A TTL that has already decayed to zero is treated as a miss
            // rather than handed back stale (spec §8).
            if let Some(remaining) = entry.remaining_ttl_seconds().filter(|&ttl| ttl > 0) {
                if let Ok(mut values) = serde_json::from_value::<Vec<T>>(entry.payload) {
                    for value in &mut values {
                        decay_ttl(value, remaining);
                    }
                    self.metrics.record_cache_hit(rrtype);
                    return Ok(values);
                }
            }
        }
        self.metrics.record_cache_miss(rrtype);

        let cancel = CancellationHandle::new();
        let message = self
            .engine
            .query(name, rrtype, &self.options, opts.ecs_subnet.as_deref(), &cancel)
            .await?;

        let rcode = message.rcode();
        if !rcode.is_success() {
            return Err(map_rcode_error(rcode, name, rrtype));
        }

        let matching: Vec<&DnsRecord> = message
            .answers
            .iter()
            .filter(|r| r.rtype == rrtype)
            .collect();

        if matching.is_empty() {
            if opts.no_throw_on_nodata {
                return Ok(Vec::new());
            }
            return Err(DnsError::new(
                ErrorCode::NoData,
                format!("{name} has no {rrtype} record"),
            )
            .with_syscall(format!("query{}", rrtype.title_case()))
            .with_hostname(name.to_string()));
        }

        let mut values = Vec::with_capacity(matching.len());
        let mut min_ttl = u32::MAX;
        for record in &matching {
            values.push(parse(record, &message)?);
            min_ttl = min_ttl.min(record.ttl);
        }

        let ttl = min_ttl.min(self.options.max_ttl_seconds).max(1);
        if let Ok(payload) = serde_json::to_value(&values) {
            self.options
                .cache
                .set(&key, CachedEntry::new(payload, ttl), ttl)
                .await;
        }

        Ok(values)
    }

    pub async fn resolve_a(&self, name: &str, opts: ResolveOptions) -> Result<Vec<AddressResult>> {
        self.resolve_address(name, DNSResourceType::A, opts, parse_a).await
    }

    pub async fn resolve_aaaa(&self, name: &str, opts: ResolveOptions) -> Result<Vec<AddressResult>> {
        self.resolve_address(name, DNSResourceType::AAAA, opts, parse_aaaa).await
    }

    /// Shared by `resolve_a`/`resolve_aaaa`: projects the cached/decayed
    /// `AddressRecord`s down to bare addresses unless the per-call `ttl`
    /// option asks for the `{address, ttl}` shape (spec §4.3).
    async fn resolve_address<F>(
        &self,
        name: &str,
        rrtype: DNSResourceType,
        opts: ResolveOptions,
        parse: F,
    ) -> Result<Vec<AddressResult>>
    where
        F: Fn(&DnsRecord, &DnsMessage) -> Result<AddressRecord>,
    {
        let want_ttl = opts.ttl;
        let records = self
            .resolve_typed(name, rrtype, opts, parse, |record: &mut AddressRecord, ttl| {
                record.ttl = ttl;
            })
            .await?;
        Ok(records
            .into_iter()
            .map(|r| {
                if want_ttl {
                    AddressResult::WithTtl(r)
                } else {
                    AddressResult::Plain(r.address)
                }
            })
            .collect())
    }

    rrtype_method!(resolve_cname, DNSResourceType::CNAME, String, parse_name_record);
    rrtype_method!(resolve_ns, DNSResourceType::NS, String, parse_name_record);
    rrtype_method!(resolve_ptr, DNSResourceType::PTR, String, parse_name_record);
    rrtype_method!(resolve_mx, DNSResourceType::MX, MxRecord, parse_mx);
    rrtype_method!(resolve_srv, DNSResourceType::SRV, SrvRecord, parse_srv);
    rrtype_method!(resolve_naptr, DNSResourceType::NAPTR, NaptrRecord, parse_naptr);
    rrtype_method!(resolve_caa, DNSResourceType::CAA, CaaRecord, parse_caa);
    rrtype_method!(resolve_cert, DNSResourceType::CERT, CertRecord, parse_cert);
    rrtype_method!(resolve_tlsa, DNSResourceType::TLSA, TlsaRecord, parse_tlsa);
    rrtype_method!(resolve_txt, DNSResourceType::TXT, Vec<String>, parse_txt);

    pub async fn resolve_soa(&self, name: &str, opts: ResolveOptions) -> Result<SoaRecord> {
        let records = self
            .resolve_typed(name, DNSResourceType::SOA, opts, parse_soa, |_, _| {})
            .await?;
        records
            .into_iter()
            .next()
            .ok_or_else(|| DnsError::new(ErrorCode::NoData, format!("{name} has no SOA record")))
    }
}

fn bad_resp(rrtype: DNSResourceType, message: &str) -> DnsError {
    DnsError::new(ErrorCode::BadResp, message.to_string())
        .with_syscall(format!("query{}", rrtype.title_case()))
}

fn map_rcode_error(rcode: ResponseCode, name: &str, rrtype: DNSResourceType) -> DnsError {
    let code = match rcode {
        ResponseCode::FormatError => ErrorCode::Formerr,
        ResponseCode::ServerFailure => ErrorCode::Servfail,
        ResponseCode::NameError => ErrorCode::NotFound,
        ResponseCode::NotImplemented => ErrorCode::Notimp,
        ResponseCode::Refused => ErrorCode::Refused,
        _ => ErrorCode::BadResp,
    };
    DnsError::new(code, format!("{name}: {rcode:?}"))
        .with_syscall(format!("query{}", rrtype.title_case()))
        .with_hostname(name.to_string())
}

fn parse_a(record: &DnsRecord, _msg: &DnsMessage) -> Result<AddressRecord> {
    if record.rdata.len() != 4 {
        return Err(bad_resp(record.rtype, "malformed A record"));
    }
    let ip = std::net::Ipv4Addr::new(record.rdata[0], record.rdata[1], record.rdata[2], record.rdata[3]);
    Ok(AddressRecord {
        address: ip.to_string(),
        ttl: record.ttl,
    })
}

fn parse_aaaa(record: &DnsRecord, _msg: &DnsMessage) -> Result<AddressRecord> {
    if record.rdata.len() != 16 {
        return Err(bad_resp(record.rtype, "malformed AAAA record"));
    }
    let mut octets = [0u8; 16];
    octets.copy_from_slice(&record.rdata);
    Ok(AddressRecord {
        address: std::net::Ipv6Addr::from(octets).to_string(),
        ttl: record.ttl,
    })
}

fn parse_name_record(record: &DnsRecord, msg: &DnsMessage) -> Result<String> {
    let (name, _) = msg.name_at(record, 0).map_err(DnsError::from)?;
    Ok(name)
}

fn parse_mx(record: &DnsRecord, msg: &DnsMessage) -> Result<MxRecord> {
    if record.rdata.len() < 2 {
        return Err(bad_resp(record.rtype, "malformed MX record"));
    }
    let priority = u16::from_be_bytes([record.rdata[0], record.rdata[1]]);
    let (exchange, _) = msg.name_at(record, 2).map_err(DnsError::from)?;
    Ok(MxRecord { priority, exchange })
}

fn parse_srv(record: &DnsRecord, msg: &DnsMessage) -> Result<SrvRecord> {
    if record.rdata.len() < 6 {
        return Err(bad_resp(record.rtype, "malformed SRV record"));
    }
    let priority = u16::from_be_bytes([record.rdata[0], record.rdata[1]]);
    let weight = u16::from_be_bytes([record.rdata[2], record.rdata[3]]);
    let port = u16::from_be_bytes([record.rdata[4], record.rdata[5]]);
    let (name, _) = msg.name_at(record, 6).map_err(DnsError::from)?;
    Ok(SrvRecord {
        priority,
        weight,
        port,
        name,
    })
}

fn parse_soa(record: &DnsRecord, msg: &DnsMessage) -> Result<SoaRecord> {
    let (nsname, next1) = msg.name_at(record, 0).map_err(DnsError::from)?;
    let offset1 = next1 - record.rdata_offset;
    let (hostmaster, next2) = msg.name_at(record, offset1).map_err(DnsError::from)?;
    let offset2 = next2 - record.rdata_offset;

    if record.rdata.len() < offset2 + 20 {
        return Err(bad_resp(record.rtype, "malformed SOA record"));
    }
    let read_u32 = |i: usize| {
        u32::from_be_bytes([
            record.rdata[offset2 + i],
            record.rdata[offset2 + i + 1],
            record.rdata[offset2 + i + 2],
            record.rdata[offset2 + i + 3],
        ])
    };
    Ok(SoaRecord {
        nsname,
        hostmaster,
        serial: read_u32(0),
        refresh: read_u32(4),
        retry: read_u32(8),
        expire: read_u32(12),
        minttl: read_u32(16),
    })
}

fn read_char_string(buf: &[u8], pos: &mut usize, rrtype: DNSResourceType) -> Result<String> {
    let len = *buf.get(*pos).ok_or_else(|| bad_resp(rrtype, "truncated character-string"))? as usize;
    let start = *pos + 1;
    let end = start + len;
    let bytes = buf
        .get(start..end)
        .ok_or_else(|| bad_resp(rrtype, "truncated character-string"))?;
    *pos = end;
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

fn parse_naptr(record: &DnsRecord, msg: &DnsMessage) -> Result<NaptrRecord> {
    let rdata = &record.rdata;
    if rdata.len() < 4 {
        return Err(bad_resp(record.rtype, "malformed NAPTR record"));
    }
    let order = u16::from_be_bytes([rdata[0], rdata[1]]);
    let preference = u16::from_be_bytes([rdata[2], rdata[3]]);
    let mut pos = 4usize;
    let flags = read_char_string(rdata, &mut pos, record.rtype)?;
    let service = read_char_string(rdata, &mut pos, record.rtype)?;
    let regexp = read_char_string(rdata, &mut pos, record.rtype)?;
    let (replacement, _) = msg.name_at(record, pos).map_err(DnsError::from)?;
    Ok(NaptrRecord {
        order,
        preference,
        flags,
        service,
        regexp,
        replacement,
    })
}

fn parse_caa(record: &DnsRecord, _msg: &DnsMessage) -> Result<CaaRecord> {
    let rdata = &record.rdata;
    if rdata.len() < 2 {
        return Err(bad_resp(record.rtype, "malformed CAA record"));
    }
    let critical = rdata[0];
    let tag_len = rdata[1] as usize;
    let tag_start = 2;
    let tag_end = tag_start + tag_len;
    let tag = String::from_utf8_lossy(
        rdata
            .get(tag_start..tag_end)
            .ok_or_else(|| bad_resp(record.rtype, "truncated CAA tag"))?,
    )
    .into_owned();
    let value = String::from_utf8_lossy(
        rdata
            .get(tag_end..)
            .ok_or_else(|| bad_resp(record.rtype, "truncated CAA value"))?,
    )
    .into_owned();
    Ok(CaaRecord {
        critical,
        tag,
        value,
    })
}

fn parse_txt(record: &DnsRecord, _msg: &DnsMessage) -> Result<Vec<String>> {
    let mut segments = Vec::new();
    let mut pos = 0usize;
    while pos < record.rdata.len() {
        segments.push(read_char_string(&record.rdata, &mut pos, record.rtype)?);
    }
    Ok(segments)
}

/// `certificate` per RFC 4398: 2-byte type, 2-byte key tag, 1-byte
/// algorithm, then the raw certificate/CRL bytes (base64'd here).
fn parse_cert(record: &DnsRecord, _msg: &DnsMessage) -> Result<CertRecord> {
    use base64::Engine;
    let rdata = &record.rdata;
    if rdata.len() < 5 {
        return Err(bad_resp(record.rtype, "malformed CERT record"));
    }
    let cert_type = u16::from_be_bytes([rdata[0], rdata[1]]);
    let key_tag = u16::from_be_bytes([rdata[2], rdata[3]]);
    let algorithm = rdata[4];
    let certificate = base64::engine::general_purpose::STANDARD.encode(&rdata[5..]);
    Ok(CertRecord {
        cert_type,
        key_tag,
        algorithm,
        certificate,
    })
}

/// `data` per RFC 6698: 1-byte usage, 1-byte selector, 1-byte matching
/// type, then the raw association data (hex-encoded here).
fn parse_tlsa(record: &DnsRecord, _msg: &DnsMessage) -> Result<TlsaRecord> {
    let rdata = &record.rdata;
    if rdata.len() < 3 {
        return Err(bad_resp(record.rtype, "malformed TLSA record"));
    }
    let usage = rdata[0];
    let selector = rdata[1];
    let match_type = rdata[2];
    let data = rdata[3..].iter().map(|b| format!("{b:02x}")).collect::<String>();
    Ok(TlsaRecord {
        usage,
        selector,
        match_type,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::{DNSResourceClass, DnsHeader};

    fn record_with_rdata(rtype: DNSResourceType, rdata: Vec<u8>) -> (DnsRecord, DnsMessage) {
        let record = DnsRecord {
            name: "example.com".to_string(),
            rtype,
            rclass: DNSResourceClass::IN,
            ttl: 300,
            rdata: rdata.clone(),
            rdata_offset: 0,
        };
        let message = DnsMessage {
            header: DnsHeader::default(),
            questions: Vec::new(),
            answers: Vec::new(),
            authorities: Vec::new(),
            additional: Vec::new(),
            raw: rdata,
        };
        (record, message)
    }

    #[test]
    fn parses_a_record() {
        let (record, msg) = record_with_rdata(DNSResourceType::A, vec![93, 184, 216, 34]);
        let parsed = parse_a(&record, &msg).unwrap();
        assert_eq!(parsed.address, "93.184.216.34");
        assert_eq!(parsed.ttl, 300);
    }

    #[test]
    fn rejects_malformed_a_record() {
        let (record, msg) = record_with_rdata(DNSResourceType::A, vec![1, 2, 3]);
        assert!(parse_a(&record, &msg).is_err());
    }

    #[test]
    fn parses_mx_record_priority_and_exchange() {
        let mut rdata = vec![0u8, 10]; // priority 10
        crate::dns::encode_name("mail.example.com", &mut rdata).unwrap();
        let (record, msg) = record_with_rdata(DNSResourceType::MX, rdata);
        let parsed = parse_mx(&record, &msg).unwrap();
        assert_eq!(parsed.priority, 10);
        assert_eq!(parsed.exchange, "mail.example.com");
    }

    #[test]
    fn parses_txt_segments() {
        let mut rdata = Vec::new();
        rdata.push(5u8);
        rdata.extend_from_slice(b"hello");
        rdata.push(5u8);
        rdata.extend_from_slice(b"world");
        let (record, msg) = record_with_rdata(DNSResourceType::TXT, rdata);
        let parsed = parse_txt(&record, &msg).unwrap();
        assert_eq!(parsed, vec!["hello".to_string(), "world".to_string()]);
    }

    #[test]
    fn parses_tlsa_as_lowercase_hex() {
        let rdata = vec![3, 1, 1, 0xab, 0xcd];
        let (record, msg) = record_with_rdata(DNSResourceType::TLSA, rdata);
        let parsed = parse_tlsa(&record, &msg).unwrap();
        assert_eq!(parsed.usage, 3);
        assert_eq!(parsed.data, "abcd");
    }

    #[test]
    fn validate_name_accepts_root() {
        assert!(Resolver::validate_name(".", DNSResourceType::A).is_ok());
    }

    #[test]
    fn validate_name_rejects_leading_dot() {
        assert!(Resolver::validate_name(".example.com", DNSResourceType::A).is_err());
    }

    #[test]
    fn validate_name_rejects_double_dot() {
        assert!(Resolver::validate_name("example..com", DNSResourceType::A).is_err());
    }
}
