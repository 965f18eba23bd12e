//! The rrtype/rclass/rcode registries (spec §3 "Query" and §4.3 "rcode ->
//! error mapping"). Generalized from the teacher's `dns::enums` module: the
//! full IANA type list is kept so any type name reaches the wire, but only
//! the spec's named rrtypes get first-class normalization in the Resolver
//! Facade (`crate::resolver`).

use std::fmt;
use std::str::FromStr;

/// A DNS resource record type. Variants beyond the ones spec.md names
/// still round-trip through the wire codec; they are not normalized by
/// the Resolver Facade beyond the raw-answer shape.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DNSResourceType {
    #[default]
    Unknown,
    A,
    NS,
    CNAME,
    SOA,
    PTR,
    HINFO,
    MX,
    TXT,
    AAAA,
    SRV,
    NAPTR,
    CAA,
    CERT,
    TLSA,
    DS,
    DNSKEY,
    NSEC,
    RRSIG,
    OPT,
    SSHFP,
    HTTPS,
    SVCB,
    DNAME,
    URI,
    SPF,
    /// The composite fan-out pseudo-type (spec §4.4, §3).
    ANY,
    Other(u16),
}

impl DNSResourceType {
    /// The fixed type vector `resolveAny` fans out over (spec §4.4).
    pub const ANY_FANOUT: &'static [DNSResourceType] = &[
        DNSResourceType::A,
        DNSResourceType::AAAA,
        DNSResourceType::CNAME,
        DNSResourceType::MX,
        DNSResourceType::NAPTR,
        DNSResourceType::NS,
        DNSResourceType::PTR,
        DNSResourceType::SOA,
        DNSResourceType::SRV,
        DNSResourceType::TXT,
    ];

    pub fn to_u16(self) -> u16 {
        match self {
            DNSResourceType::Unknown => 0,
            DNSResourceType::A => 1,
            DNSResourceType::NS => 2,
            DNSResourceType::CNAME => 5,
            DNSResourceType::SOA => 6,
            DNSResourceType::PTR => 12,
            DNSResourceType::HINFO => 13,
            DNSResourceType::MX => 15,
            DNSResourceType::TXT => 16,
            DNSResourceType::AAAA => 28,
            DNSResourceType::SRV => 33,
            DNSResourceType::NAPTR => 35,
            DNSResourceType::DNAME => 39,
            DNSResourceType::OPT => 41,
            DNSResourceType::DS => 43,
            DNSResourceType::SSHFP => 44,
            DNSResourceType::RRSIG => 46,
            DNSResourceType::NSEC => 47,
            DNSResourceType::DNSKEY => 48,
            DNSResourceType::TLSA => 52,
            DNSResourceType::CERT => 37,
            DNSResourceType::SVCB => 64,
            DNSResourceType::HTTPS => 65,
            DNSResourceType::SPF => 99,
            DNSResourceType::URI => 256,
            DNSResourceType::CAA => 257,
            DNSResourceType::ANY => 255,
            DNSResourceType::Other(v) => v,
        }
    }

    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => DNSResourceType::Unknown,
            1 => DNSResourceType::A,
            2 => DNSResourceType::NS,
            5 => DNSResourceType::CNAME,
            6 => DNSResourceType::SOA,
            12 => DNSResourceType::PTR,
            13 => DNSResourceType::HINFO,
            15 => DNSResourceType::MX,
            16 => DNSResourceType::TXT,
            28 => DNSResourceType::AAAA,
            33 => DNSResourceType::SRV,
            35 => DNSResourceType::NAPTR,
            37 => DNSResourceType::CERT,
            39 => DNSResourceType::DNAME,
            41 => DNSResourceType::OPT,
            43 => DNSResourceType::DS,
            44 => DNSResourceType::SSHFP,
            46 => DNSResourceType::RRSIG,
            47 => DNSResourceType::NSEC,
            48 => DNSResourceType::DNSKEY,
            52 => DNSResourceType::TLSA,
            64 => DNSResourceType::SVCB,
            65 => DNSResourceType::HTTPS,
            99 => DNSResourceType::SPF,
            255 => DNSResourceType::ANY,
            256 => DNSResourceType::URI,
            257 => DNSResourceType::CAA,
            other => DNSResourceType::Other(other),
        }
    }

    /// Title-cased rrtype name for the `syscall` field (e.g. `queryA`,
    /// `queryMx`), matching spec §4.3's `"query" + TitleCase(rrtype)`.
    pub fn title_case(self) -> String {
        let s = self.to_string();
        let mut out = String::with_capacity(s.len());
        let mut chars = s.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
        }
        out.extend(chars.map(|c| c.to_ascii_lowercase()));
        out
    }
}

impl fmt::Display for DNSResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DNSResourceType::Unknown => write!(f, "UNKNOWN"),
            DNSResourceType::Other(v) => write!(f, "TYPE{v}"),
            other => {
                let name = match other {
                    DNSResourceType::A => "A",
                    DNSResourceType::NS => "NS",
                    DNSResourceType::CNAME => "CNAME",
                    DNSResourceType::SOA => "SOA",
                    DNSResourceType::PTR => "PTR",
                    DNSResourceType::HINFO => "HINFO",
                    DNSResourceType::MX => "MX",
                    DNSResourceType::TXT => "TXT",
                    DNSResourceType::AAAA => "AAAA",
                    DNSResourceType::SRV => "SRV",
                    DNSResourceType::NAPTR => "NAPTR",
                    DNSResourceType::CAA => "CAA",
                    DNSResourceType::CERT => "CERT",
                    DNSResourceType::TLSA => "TLSA",
                    DNSResourceType::DS => "DS",
                    DNSResourceType::DNSKEY => "DNSKEY",
                    DNSResourceType::NSEC => "NSEC",
                    DNSResourceType::RRSIG => "RRSIG",
                    DNSResourceType::OPT => "OPT",
                    DNSResourceType::SSHFP => "SSHFP",
                    DNSResourceType::HTTPS => "HTTPS",
                    DNSResourceType::SVCB => "SVCB",
                    DNSResourceType::DNAME => "DNAME",
                    DNSResourceType::URI => "URI",
                    DNSResourceType::SPF => "SPF",
                    DNSResourceType::ANY => "ANY",
                    _ => unreachable!(),
                };
                write!(f, "{name}")
            }
        }
    }
}

impl FromStr for DNSResourceType {
    type Err = ();

    /// Parses an rrtype name, case-insensitively. Accepts any IANA type
    /// name recognized by `from_u16`'s inverse plus `TYPE<n>` for unknown
    /// numeric types, matching spec §3's "all IANA DNS parameter names
    /// are accepted" invariant.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Ok(match upper.as_str() {
            "A" => DNSResourceType::A,
            "NS" => DNSResourceType::NS,
            "CNAME" => DNSResourceType::CNAME,
            "SOA" => DNSResourceType::SOA,
            "PTR" => DNSResourceType::PTR,
            "HINFO" => DNSResourceType::HINFO,
            "MX" => DNSResourceType::MX,
            "TXT" => DNSResourceType::TXT,
            "AAAA" => DNSResourceType::AAAA,
            "SRV" => DNSResourceType::SRV,
            "NAPTR" => DNSResourceType::NAPTR,
            "CAA" => DNSResourceType::CAA,
            "CERT" => DNSResourceType::CERT,
            "TLSA" => DNSResourceType::TLSA,
            "DS" => DNSResourceType::DS,
            "DNSKEY" => DNSResourceType::DNSKEY,
            "NSEC" => DNSResourceType::NSEC,
            "RRSIG" => DNSResourceType::RRSIG,
            "OPT" => DNSResourceType::OPT,
            "SSHFP" => DNSResourceType::SSHFP,
            "HTTPS" => DNSResourceType::HTTPS,
            "SVCB" => DNSResourceType::SVCB,
            "DNAME" => DNSResourceType::DNAME,
            "URI" => DNSResourceType::URI,
            "SPF" => DNSResourceType::SPF,
            "ANY" => DNSResourceType::ANY,
            other if other.starts_with("TYPE") => {
                let n: u16 = other[4..].parse().map_err(|_| ())?;
                DNSResourceType::Other(n)
            }
            _ => return Err(()),
        })
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DNSResourceClass {
    #[default]
    IN,
    CS,
    CH,
    HS,
    ANY,
}

impl DNSResourceClass {
    pub fn to_u16(self) -> u16 {
        match self {
            DNSResourceClass::IN => 1,
            DNSResourceClass::CS => 2,
            DNSResourceClass::CH => 3,
            DNSResourceClass::HS => 4,
            DNSResourceClass::ANY => 255,
        }
    }

    pub fn from_u16(value: u16) -> Self {
        match value {
            2 => DNSResourceClass::CS,
            3 => DNSResourceClass::CH,
            4 => DNSResourceClass::HS,
            255 => DNSResourceClass::ANY,
            _ => DNSResourceClass::IN,
        }
    }
}

/// DNS response codes (spec §4.3's rcode -> error mapping source values).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResponseCode {
    NoError,
    FormatError,
    ServerFailure,
    NameError,
    NotImplemented,
    Refused,
    YXDomain,
    YXRRSet,
    NXRRSet,
    NotAuth,
    NotZone,
    BadOptVersion,
    Other(u8),
}

impl ResponseCode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => ResponseCode::NoError,
            1 => ResponseCode::FormatError,
            2 => ResponseCode::ServerFailure,
            3 => ResponseCode::NameError,
            4 => ResponseCode::NotImplemented,
            5 => ResponseCode::Refused,
            6 => ResponseCode::YXDomain,
            7 => ResponseCode::YXRRSet,
            8 => ResponseCode::NXRRSet,
            9 => ResponseCode::NotAuth,
            10 => ResponseCode::NotZone,
            16 => ResponseCode::BadOptVersion,
            other => ResponseCode::Other(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            ResponseCode::NoError => 0,
            ResponseCode::FormatError => 1,
            ResponseCode::ServerFailure => 2,
            ResponseCode::NameError => 3,
            ResponseCode::NotImplemented => 4,
            ResponseCode::Refused => 5,
            ResponseCode::YXDomain => 6,
            ResponseCode::YXRRSet => 7,
            ResponseCode::NXRRSet => 8,
            ResponseCode::NotAuth => 9,
            ResponseCode::NotZone => 10,
            ResponseCode::BadOptVersion => 16,
            ResponseCode::Other(v) => v,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ResponseCode::NoError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rrtype_round_trips_through_u16() {
        for t in [
            DNSResourceType::A,
            DNSResourceType::AAAA,
            DNSResourceType::MX,
            DNSResourceType::TXT,
            DNSResourceType::CAA,
            DNSResourceType::TLSA,
            DNSResourceType::CERT,
        ] {
            assert_eq!(DNSResourceType::from_u16(t.to_u16()), t);
        }
    }

    #[test]
    fn rrtype_from_str_is_case_insensitive() {
        assert_eq!("txt".parse::<DNSResourceType>().unwrap(), DNSResourceType::TXT);
        assert_eq!("Mx".parse::<DNSResourceType>().unwrap(), DNSResourceType::MX);
    }

    #[test]
    fn title_case_matches_syscall_convention() {
        assert_eq!(DNSResourceType::A.title_case(), "A");
        assert_eq!(DNSResourceType::MX.title_case(), "Mx");
        assert_eq!(DNSResourceType::TXT.title_case(), "Txt");
    }
}
