//! Domain name label encode/decode, including RFC 1035 §4.1.4 message
//! compression on read. Decompression needs random access into the whole
//! packet buffer, so unlike the header/question bitfields this walks a
//! plain byte cursor rather than `bitstream_io`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnexpectedEof,
    LabelTooLong(usize),
    InvalidLabel,
    CompressionLoop,
    NameTooLong,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedEof => write!(f, "unexpected end of DNS message"),
            ParseError::LabelTooLong(n) => write!(f, "label too long: {n} bytes"),
            ParseError::InvalidLabel => write!(f, "invalid label"),
            ParseError::CompressionLoop => write!(f, "compression pointer loop"),
            ParseError::NameTooLong => write!(f, "domain name too long"),
        }
    }
}

impl std::error::Error for ParseError {}

const MAX_POINTER_JUMPS: usize = 128;
const MAX_NAME_LENGTH: usize = 255;

/// Encode a dotted name (already IDNA/ASCII) into wire-format labels,
/// terminated by the root label. No compression on write: queries are
/// small, single-question messages where compression buys nothing.
pub fn encode_name(name: &str, out: &mut Vec<u8>) -> Result<(), ParseError> {
    let trimmed = name.trim_end_matches('.');
    if trimmed.is_empty() {
        out.push(0);
        return Ok(());
    }
    let mut total = 0usize;
    for label in trimmed.split('.') {
        if label.len() > 63 {
            return Err(ParseError::LabelTooLong(label.len()));
        }
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
        total += label.len() + 1;
        if total > MAX_NAME_LENGTH {
            return Err(ParseError::NameTooLong);
        }
    }
    out.push(0);
    Ok(())
}

/// Decode a name starting at `pos` in `buf`, following compression
/// pointers as needed. Returns the dotted name and the offset just past
/// the name *in the original stream* (pointer targets don't affect this).
pub fn decode_name(buf: &[u8], pos: usize) -> Result<(String, usize), ParseError> {
    let mut labels: Vec<String> = Vec::new();
    let mut cursor = pos;
    let mut end_of_name: Option<usize> = None;
    let mut jumps = 0usize;

    loop {
        let len_byte = *buf.get(cursor).ok_or(ParseError::UnexpectedEof)?;

        if len_byte == 0 {
            cursor += 1;
            if end_of_name.is_none() {
                end_of_name = Some(cursor);
            }
            break;
        }

        if (len_byte & 0xC0) == 0xC0 {
            let lo = *buf.get(cursor + 1).ok_or(ParseError::UnexpectedEof)?;
            let pointer = (((len_byte & 0x3F) as usize) << 8) | lo as usize;
            if end_of_name.is_none() {
                end_of_name = Some(cursor + 2);
            }
            jumps += 1;
            if jumps > MAX_POINTER_JUMPS || pointer >= cursor {
                return Err(ParseError::CompressionLoop);
            }
            cursor = pointer;
            continue;
        }

        if len_byte > 63 {
            return Err(ParseError::InvalidLabel);
        }

        let start = cursor + 1;
        let stop = start + len_byte as usize;
        let label_bytes = buf.get(start..stop).ok_or(ParseError::UnexpectedEof)?;
        labels.push(
            String::from_utf8(label_bytes.to_vec()).map_err(|_| ParseError::InvalidLabel)?,
        );
        cursor = stop;
    }

    Ok((labels.join("."), end_of_name.unwrap_or(cursor)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_round_trips() {
        let mut buf = Vec::new();
        encode_name("example.com", &mut buf).unwrap();
        let (name, next) = decode_name(&buf, 0).unwrap();
        assert_eq!(name, "example.com");
        assert_eq!(next, buf.len());
    }

    #[test]
    fn root_name_encodes_to_single_zero_byte() {
        let mut buf = Vec::new();
        encode_name(".", &mut buf).unwrap();
        assert_eq!(buf, vec![0]);
    }

    #[test]
    fn decode_follows_compression_pointer() {
        let mut buf = Vec::new();
        encode_name("example.com", &mut buf).unwrap(); // at offset 0
        let pointer_target = 0u16;
        let ptr_pos = buf.len();
        buf.push(0xC0 | ((pointer_target >> 8) as u8));
        buf.push((pointer_target & 0xFF) as u8);
        let (name, next) = decode_name(&buf, ptr_pos).unwrap();
        assert_eq!(name, "example.com");
        assert_eq!(next, ptr_pos + 2);
    }

    #[test]
    fn rejects_oversized_label() {
        let long_label = "a".repeat(64);
        let mut buf = Vec::new();
        assert!(encode_name(&long_label, &mut buf).is_err());
    }
}
