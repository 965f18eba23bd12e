//! RFC 1035 message framing: the query encoder and response decoder spec
//! §2 calls the "Packet Codec" external collaborator. Generalized from the
//! teacher's `dns::header`/`dns::question`/`dns::resource` family (same
//! field names, same `bitstream_io` writer for fixed bitfields), merged
//! into one coherent module since the teacher's own `dns::packet` was
//! split across two incompatible historical layouts we didn't carry over.

use bitstream_io::{BigEndian, BitWrite, BitWriter};

use super::enums::{DNSResourceClass, DNSResourceType, ResponseCode};
use super::name::{decode_name, encode_name, ParseError};

const HEADER_LEN: usize = 12;

#[derive(Debug, Clone, Default)]
pub struct DnsHeader {
    pub id: u16,
    pub qr: bool,
    pub opcode: u8,
    pub aa: bool,
    pub tc: bool,
    pub rd: bool,
    pub ra: bool,
    pub z: bool,
    /// Authentic Data — passed through verbatim, never computed locally
    /// (spec §1 non-goals: "the DO/AD/CD bits are passed through verbatim").
    pub ad: bool,
    /// Checking Disabled — passed through verbatim.
    pub cd: bool,
    pub rcode: u8,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl DnsHeader {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), ParseError> {
        let mut writer = BitWriter::endian(Vec::new(), BigEndian);
        writer.write_var::<u16>(16, self.id).ok();
        writer.write_bit(self.qr).ok();
        writer.write_var::<u8>(4, self.opcode).ok();
        writer.write_bit(self.aa).ok();
        writer.write_bit(self.tc).ok();
        writer.write_bit(self.rd).ok();
        writer.write_bit(self.ra).ok();
        writer.write_bit(self.z).ok();
        writer.write_bit(self.ad).ok();
        writer.write_bit(self.cd).ok();
        writer.write_var::<u8>(4, self.rcode).ok();
        writer.write_var::<u16>(16, self.qdcount).ok();
        writer.write_var::<u16>(16, self.ancount).ok();
        writer.write_var::<u16>(16, self.nscount).ok();
        writer.write_var::<u16>(16, self.arcount).ok();
        out.extend_from_slice(writer.into_writer().as_slice());
        Ok(())
    }

    fn decode(buf: &[u8]) -> Result<Self, ParseError> {
        if buf.len() < HEADER_LEN {
            return Err(ParseError::UnexpectedEof);
        }
        let flags = u16::from_be_bytes([buf[2], buf[3]]);
        Ok(DnsHeader {
            id: u16::from_be_bytes([buf[0], buf[1]]),
            qr: flags & 0x8000 != 0,
            opcode: ((flags >> 11) & 0x0F) as u8,
            aa: flags & 0x0400 != 0,
            tc: flags & 0x0200 != 0,
            rd: flags & 0x0100 != 0,
            ra: flags & 0x0080 != 0,
            z: flags & 0x0040 != 0,
            ad: flags & 0x0020 != 0,
            cd: flags & 0x0010 != 0,
            rcode: (flags & 0x000F) as u8,
            qdcount: u16::from_be_bytes([buf[4], buf[5]]),
            ancount: u16::from_be_bytes([buf[6], buf[7]]),
            nscount: u16::from_be_bytes([buf[8], buf[9]]),
            arcount: u16::from_be_bytes([buf[10], buf[11]]),
        })
    }
}

#[derive(Debug, Clone)]
pub struct DnsQuestion {
    pub name: String,
    pub qtype: DNSResourceType,
    pub qclass: DNSResourceClass,
}

/// One answer/authority/additional record, kept as raw `rdata` bytes —
/// the per-rrtype public shape is derived from these bytes in
/// `crate::resolver`, not here (spec §4.3's normalization layer owns that).
/// `rdata_offset` is the rdata's absolute position in `DnsMessage::raw`,
/// since names embedded in rdata (an MX exchange, an SRV target, ...) can
/// carry compression pointers relative to the whole message, not just the
/// record's own rdata slice.
#[derive(Debug, Clone)]
pub struct DnsRecord {
    pub name: String,
    pub rtype: DNSResourceType,
    pub rclass: DNSResourceClass,
    pub ttl: u32,
    pub rdata: Vec<u8>,
    pub rdata_offset: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DnsMessage {
    pub header: DnsHeader,
    pub questions: Vec<DnsQuestion>,
    pub answers: Vec<DnsRecord>,
    pub authorities: Vec<DnsRecord>,
    pub additional: Vec<DnsRecord>,
    /// The full decoded message, kept around so rdata-embedded names can
    /// be resolved against absolute offsets.
    pub raw: Vec<u8>,
}

impl DnsMessage {
    pub fn rcode(&self) -> ResponseCode {
        ResponseCode::from_u8(self.header.rcode)
    }

    /// Decodes a domain name embedded in rdata at `offset_in_rdata` bytes
    /// into some record's rdata (spec §4.3's CNAME/NS/PTR/MX/SRV/SOA/NAPTR
    /// normalization).
    pub fn name_at(&self, record: &DnsRecord, offset_in_rdata: usize) -> Result<(String, usize), ParseError> {
        decode_name(&self.raw, record.rdata_offset + offset_in_rdata)
    }
}

/// Builds a one-question query packet for `(name, rrtype)`, optionally
/// carrying an EDNS Client Subnet option (spec §3 "Query",
/// §6 "Wire protocol").
pub fn encode_query(
    id: u16,
    name: &str,
    rrtype: DNSResourceType,
    ecs_subnet: Option<&str>,
    dnssec_ok: bool,
) -> Result<Vec<u8>, ParseError> {
    let header = DnsHeader {
        id,
        rd: true,
        qdcount: 1,
        arcount: 1,
        ..Default::default()
    };

    let mut out = Vec::with_capacity(64);
    header.encode(&mut out)?;

    encode_name(name, &mut out)?;
    out.extend_from_slice(&rrtype.to_u16().to_be_bytes());
    out.extend_from_slice(&DNSResourceClass::IN.to_u16().to_be_bytes());

    encode_opt_record(&mut out, ecs_subnet, dnssec_ok)?;

    Ok(out)
}

/// A minimal EDNS0 OPT pseudo-record carrying `udp_payload_size`, the DO
/// bit, and (optionally) an RFC 7871 Client Subnet option.
fn encode_opt_record(
    out: &mut Vec<u8>,
    ecs_subnet: Option<&str>,
    dnssec_ok: bool,
) -> Result<(), ParseError> {
    out.push(0); // root name
    out.extend_from_slice(&DNSResourceType::OPT.to_u16().to_be_bytes());
    out.extend_from_slice(&4096u16.to_be_bytes()); // udp payload size, in the class field
    out.push(0); // extended rcode
    out.push(0); // edns version
    let flags: u16 = if dnssec_ok { 0x8000 } else { 0 };
    out.extend_from_slice(&flags.to_be_bytes());

    let mut rdata = Vec::new();
    if let Some(subnet) = ecs_subnet {
        if let Some(option) = encode_client_subnet_option(subnet) {
            rdata.extend_from_slice(&8u16.to_be_bytes()); // option code: CLIENT_SUBNET
            rdata.extend_from_slice(&(option.len() as u16).to_be_bytes());
            rdata.extend_from_slice(&option);
        }
    }
    out.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
    out.extend_from_slice(&rdata);
    Ok(())
}

/// Encodes `addr/prefix` (e.g. `203.0.113.0/24`) as an RFC 7871 option
/// payload. Returns `None` for input that doesn't parse as a CIDR prefix.
fn encode_client_subnet_option(subnet: &str) -> Option<Vec<u8>> {
    let (addr_str, prefix_str) = subnet.split_once('/')?;
    let prefix: u8 = prefix_str.parse().ok()?;

    let mut payload = Vec::new();
    if let Ok(v4) = addr_str.parse::<std::net::Ipv4Addr>() {
        payload.extend_from_slice(&1u16.to_be_bytes()); // family: IPv4
        payload.push(prefix);
        payload.push(0); // scope prefix-length, 0 in queries
        let octets = v4.octets();
        let significant_bytes = prefix.div_ceil(8) as usize;
        payload.extend_from_slice(&octets[..significant_bytes.min(4)]);
    } else if let Ok(v6) = addr_str.parse::<std::net::Ipv6Addr>() {
        payload.extend_from_slice(&2u16.to_be_bytes()); // family: IPv6
        payload.push(prefix);
        payload.push(0);
        let octets = v6.octets();
        let significant_bytes = prefix.div_ceil(8) as usize;
        payload.extend_from_slice(&octets[..significant_bytes.min(16)]);
    } else {
        return None;
    }
    Some(payload)
}

/// Decodes a full response message (spec §4.2 step 4, "Decode the
/// buffer").
pub fn decode_message(buf: &[u8]) -> Result<DnsMessage, ParseError> {
    let header = DnsHeader::decode(buf)?;
    let mut pos = HEADER_LEN;

    let mut questions = Vec::with_capacity(header.qdcount as usize);
    for _ in 0..header.qdcount {
        let (name, next) = decode_name(buf, pos)?;
        pos = next;
        let qtype = DNSResourceType::from_u16(read_u16(buf, pos)?);
        let qclass = DNSResourceClass::from_u16(read_u16(buf, pos + 2)?);
        pos += 4;
        questions.push(DnsQuestion {
            name,
            qtype,
            qclass,
        });
    }

    let answers = decode_records(buf, &mut pos, header.ancount)?;
    let authorities = decode_records(buf, &mut pos, header.nscount)?;
    let additional = decode_records(buf, &mut pos, header.arcount)?;

    Ok(DnsMessage {
        header,
        questions,
        answers,
        authorities,
        additional,
        raw: buf.to_vec(),
    })
}

fn decode_records(buf: &[u8], pos: &mut usize, count: u16) -> Result<Vec<DnsRecord>, ParseError> {
    let mut records = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (name, next) = decode_name(buf, *pos)?;
        *pos = next;
        let rtype = DNSResourceType::from_u16(read_u16(buf, *pos)?);
        let rclass = DNSResourceClass::from_u16(read_u16(buf, *pos + 2)?);
        let ttl = read_u32(buf, *pos + 4)?;
        let rdlength = read_u16(buf, *pos + 8)? as usize;
        let rdata_start = *pos + 10;
        let rdata_end = rdata_start + rdlength;
        let rdata = buf
            .get(rdata_start..rdata_end)
            .ok_or(ParseError::UnexpectedEof)?
            .to_vec();
        *pos = rdata_end;
        records.push(DnsRecord {
            name,
            rtype,
            rclass,
            ttl,
            rdata,
            rdata_offset: rdata_start,
        });
    }
    Ok(records)
}

fn read_u16(buf: &[u8], pos: usize) -> Result<u16, ParseError> {
    let bytes = buf.get(pos..pos + 2).ok_or(ParseError::UnexpectedEof)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn read_u32(buf: &[u8], pos: usize) -> Result<u32, ParseError> {
    let bytes = buf.get(pos..pos + 4).ok_or(ParseError::UnexpectedEof)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_query_sets_rd_and_one_question() {
        let packet = encode_query(0x1234, "example.com", DNSResourceType::A, None, false).unwrap();
        let decoded = decode_message(&packet).unwrap();
        assert_eq!(decoded.header.id, 0x1234);
        assert!(decoded.header.rd);
        assert_eq!(decoded.questions.len(), 1);
        assert_eq!(decoded.questions[0].name, "example.com");
        assert_eq!(decoded.questions[0].qtype, DNSResourceType::A);
    }

    #[test]
    fn encode_query_with_ecs_sets_arcount() {
        let packet = encode_query(
            1,
            "example.com",
            DNSResourceType::A,
            Some("203.0.113.0/24"),
            false,
        )
        .unwrap();
        let decoded = decode_message(&packet).unwrap();
        assert_eq!(decoded.header.arcount, 1);
        assert_eq!(decoded.additional.len(), 1);
        assert_eq!(decoded.additional[0].rtype, DNSResourceType::OPT);
    }

    #[test]
    fn decode_message_rejects_truncated_buffer() {
        assert!(decode_message(&[0u8; 3]).is_err());
    }
}
