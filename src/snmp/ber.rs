//! Minimal BER subset for SNMPv1/v2c frames.
//!
//! Only definite lengths are supported. Encoding always uses the shortest
//! form; the decoder tolerates redundant long-form lengths but rejects
//! indefinite ones.

use crate::error::CollectorError;
use crate::oid::Oid;

pub(crate) const TAG_INTEGER: u8 = 0x02;
pub(crate) const TAG_OCTET_STRING: u8 = 0x04;
pub(crate) const TAG_NULL: u8 = 0x05;
pub(crate) const TAG_OID: u8 = 0x06;
pub(crate) const TAG_SEQUENCE: u8 = 0x30;
pub(crate) const TAG_IP_ADDRESS: u8 = 0x40;
pub(crate) const TAG_COUNTER32: u8 = 0x41;
pub(crate) const TAG_GAUGE32: u8 = 0x42;
pub(crate) const TAG_TIMETICKS: u8 = 0x43;
pub(crate) const TAG_OPAQUE: u8 = 0x44;
pub(crate) const TAG_COUNTER64: u8 = 0x46;
pub(crate) const TAG_NO_SUCH_OBJECT: u8 = 0x80;
pub(crate) const TAG_NO_SUCH_INSTANCE: u8 = 0x81;
pub(crate) const TAG_END_OF_MIB_VIEW: u8 = 0x82;

fn codec(msg: impl Into<String>) -> CollectorError {
    CollectorError::Codec(msg.into())
}

pub(crate) fn write_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    out.push(0x80 | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

pub(crate) fn write_tlv(out: &mut Vec<u8>, tag: u8, content: &[u8]) {
    out.push(tag);
    write_length(out, content.len());
    out.extend_from_slice(content);
}

/// Minimal two's-complement INTEGER.
pub(crate) fn write_integer(out: &mut Vec<u8>, value: i64) {
    let raw = value.to_be_bytes();
    let mut start = 0;
    while start < raw.len() - 1
        && ((raw[start] == 0x00 && raw[start + 1] & 0x80 == 0)
            || (raw[start] == 0xff && raw[start + 1] & 0x80 != 0))
    {
        start += 1;
    }
    write_tlv(out, TAG_INTEGER, &raw[start..]);
}

/// Unsigned application integer; a zero octet is prepended when the high
/// bit would flip the sign.
pub(crate) fn write_unsigned(out: &mut Vec<u8>, tag: u8, value: u64) {
    let raw = value.to_be_bytes();
    let skip = raw.iter().take_while(|&&b| b == 0).count().min(raw.len() - 1);
    let mut content = Vec::with_capacity(9);
    if raw[skip] & 0x80 != 0 {
        content.push(0);
    }
    content.extend_from_slice(&raw[skip..]);
    write_tlv(out, tag, &content);
}

pub(crate) fn write_octet_string(out: &mut Vec<u8>, bytes: &[u8]) {
    write_tlv(out, TAG_OCTET_STRING, bytes);
}

pub(crate) fn write_null(out: &mut Vec<u8>) {
    write_tlv(out, TAG_NULL, &[]);
}

fn write_subid(out: &mut Vec<u8>, value: u64) {
    let mut chunks = [0u8; 10];
    let mut n = 0;
    let mut v = value;
    loop {
        chunks[n] = (v & 0x7f) as u8;
        v >>= 7;
        n += 1;
        if v == 0 {
            break;
        }
    }
    while n > 1 {
        n -= 1;
        out.push(chunks[n] | 0x80);
    }
    out.push(chunks[0]);
}

/// OBJECT IDENTIFIER; the first two arcs pack into one subidentifier.
pub(crate) fn write_oid(out: &mut Vec<u8>, oid: &Oid) -> Result<(), CollectorError> {
    let arcs = oid.arcs();
    if arcs.len() < 2 {
        return Err(codec(format!("oid too short to encode: {oid}")));
    }
    let mut content = Vec::with_capacity(arcs.len() + 1);
    write_subid(
        &mut content,
        u64::from(arcs[0]) * 40 + u64::from(arcs[1]),
    );
    for &arc in &arcs[2..] {
        write_subid(&mut content, u64::from(arc));
    }
    write_tlv(out, TAG_OID, &content);
    Ok(())
}

pub(crate) fn decode_integer(content: &[u8]) -> Result<i64, CollectorError> {
    if content.is_empty() {
        return Err(codec("empty integer"));
    }
    if content.len() > 8 {
        return Err(codec("oversized integer"));
    }
    let mut value: i64 = if content[0] & 0x80 != 0 { -1 } else { 0 };
    for &b in content {
        value = (value << 8) | i64::from(b);
    }
    Ok(value)
}

pub(crate) fn decode_unsigned(content: &[u8]) -> Result<u64, CollectorError> {
    if content.is_empty() {
        return Err(codec("empty integer"));
    }
    let stripped = if content[0] == 0 { &content[1..] } else { content };
    if stripped.len() > 8 {
        return Err(codec("oversized unsigned integer"));
    }
    let mut value: u64 = 0;
    for &b in stripped {
        value = (value << 8) | u64::from(b);
    }
    Ok(value)
}

pub(crate) fn decode_oid(content: &[u8]) -> Result<Oid, CollectorError> {
    if content.is_empty() {
        return Err(codec("empty oid"));
    }
    let mut arcs: Vec<u32> = Vec::with_capacity(content.len() + 1);
    let mut value: u64 = 0;
    let mut first = true;
    let mut continued = false;
    for &b in content {
        value = (value << 7) | u64::from(b & 0x7f);
        if value > u64::from(u32::MAX) {
            return Err(codec("oversized oid arc"));
        }
        continued = b & 0x80 != 0;
        if !continued {
            if first {
                first = false;
                let (x, y) = match value {
                    v if v < 40 => (0, v),
                    v if v < 80 => (1, v - 40),
                    v => (2, v - 80),
                };
                arcs.push(x as u32);
                arcs.push(y as u32);
            } else {
                arcs.push(value as u32);
            }
            value = 0;
        }
    }
    if continued {
        return Err(codec("truncated oid arc"));
    }
    Ok(Oid::from(arcs))
}

/// Forward cursor over a BER buffer.
pub(crate) struct Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Decoder { buf }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CollectorError> {
        if self.buf.len() < n {
            return Err(codec("truncated message"));
        }
        let (head, rest) = self.buf.split_at(n);
        self.buf = rest;
        Ok(head)
    }

    /// One TLV: tag plus bounded content slice.
    pub(crate) fn read_tlv(&mut self) -> Result<(u8, &'a [u8]), CollectorError> {
        let tag = self.take(1)?[0];
        let first = self.take(1)?[0];
        let len = if first < 0x80 {
            usize::from(first)
        } else {
            let count = usize::from(first & 0x7f);
            if count == 0 || count > 4 {
                return Err(codec("unsupported length form"));
            }
            let mut len = 0usize;
            for &b in self.take(count)? {
                len = (len << 8) | usize::from(b);
            }
            len
        };
        let content = self.take(len)?;
        Ok((tag, content))
    }

    pub(crate) fn expect(&mut self, tag: u8) -> Result<&'a [u8], CollectorError> {
        let (t, content) = self.read_tlv()?;
        if t != tag {
            return Err(codec(format!("expected tag {tag:#04x}, got {t:#04x}")));
        }
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integer_round_trip(v: i64) -> i64 {
        let mut out = Vec::new();
        write_integer(&mut out, v);
        let mut dec = Decoder::new(&out);
        decode_integer(dec.expect(TAG_INTEGER).unwrap()).unwrap()
    }

    #[test]
    fn integers_round_trip_minimally() {
        for v in [0, 1, -1, 127, 128, -128, -129, 255, 65535, i64::MAX, i64::MIN] {
            assert_eq!(integer_round_trip(v), v);
        }
        let mut out = Vec::new();
        write_integer(&mut out, 127);
        assert_eq!(out, [0x02, 0x01, 0x7f]);
        out.clear();
        write_integer(&mut out, 128);
        assert_eq!(out, [0x02, 0x02, 0x00, 0x80]);
    }

    #[test]
    fn unsigned_high_bit_gets_padding() {
        let mut out = Vec::new();
        write_unsigned(&mut out, TAG_COUNTER32, 0xffff_ffff);
        assert_eq!(out, [0x41, 0x05, 0x00, 0xff, 0xff, 0xff, 0xff]);
        let mut dec = Decoder::new(&out);
        let content = dec.expect(TAG_COUNTER32).unwrap();
        assert_eq!(decode_unsigned(content).unwrap(), 0xffff_ffff);
    }

    #[test]
    fn oid_round_trip() {
        let oid: Oid = "1.3.6.1.4.1.2272.1.17.10.1.3".parse().unwrap();
        let mut out = Vec::new();
        write_oid(&mut out, &oid).unwrap();
        let mut dec = Decoder::new(&out);
        assert_eq!(decode_oid(dec.expect(TAG_OID).unwrap()).unwrap(), oid);
        // 2272 needs a two-byte subidentifier
        assert_eq!(&out[..4], [0x06, 0x0c, 0x2b, 0x06]);
    }

    #[test]
    fn long_form_length() {
        let content = vec![0xab; 200];
        let mut out = Vec::new();
        write_tlv(&mut out, TAG_OCTET_STRING, &content);
        assert_eq!(&out[..3], [0x04, 0x81, 200]);
        let mut dec = Decoder::new(&out);
        assert_eq!(dec.expect(TAG_OCTET_STRING).unwrap(), &content[..]);
    }

    #[test]
    fn truncated_frames_are_rejected() {
        let mut out = Vec::new();
        write_octet_string(&mut out, b"hello");
        out.truncate(4);
        let mut dec = Decoder::new(&out);
        assert!(dec.read_tlv().is_err());
        // indefinite length marker
        let mut dec = Decoder::new(&[0x30, 0x80, 0x00]);
        assert!(dec.read_tlv().is_err());
    }

    #[test]
    fn first_subid_unpacks_into_two_arcs() {
        let oid = decode_oid(&[0x2b, 0x06, 0x01]).unwrap();
        assert_eq!(oid.arcs(), &[1, 3, 6, 1]);
    }
}
