//! SNMPv1/v2c message framing.

use crate::error::CollectorError;
use crate::oid::Oid;
use crate::snmp::ber;
use crate::snmp::value::Value;

/// v1 error-status for a name outside the agent's MIB view.
pub const NO_SUCH_NAME: i32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Version {
    V1 = 0,
    V2c = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PduType {
    Get = 0xA0,
    GetNext = 0xA1,
    Response = 0xA2,
    GetBulk = 0xA5,
}

/// For GetBulk the error fields carry non-repeaters and max-repetitions.
#[derive(Clone, Debug)]
pub struct Pdu {
    pub request_id: i32,
    pub error_status: i32,
    pub error_index: i32,
    pub varbinds: Vec<(Oid, Value)>,
}

#[derive(Clone, Debug)]
pub struct SnmpMessage {
    pub version: Version,
    pub community: String,
    pub pdu_type: PduType,
    pub pdu: Pdu,
}

impl SnmpMessage {
    /// A Get or GetNext request with Null value placeholders.
    pub fn request(
        version: Version,
        community: &str,
        pdu_type: PduType,
        request_id: i32,
        oids: &[Oid],
    ) -> Self {
        SnmpMessage {
            version,
            community: community.to_string(),
            pdu_type,
            pdu: Pdu {
                request_id,
                error_status: 0,
                error_index: 0,
                varbinds: oids.iter().map(|oid| (oid.clone(), Value::Null)).collect(),
            },
        }
    }

    /// A GetBulk request, v2c only.
    pub fn bulk_request(
        community: &str,
        request_id: i32,
        max_repetitions: i32,
        oids: &[Oid],
    ) -> Self {
        SnmpMessage {
            version: Version::V2c,
            community: community.to_string(),
            pdu_type: PduType::GetBulk,
            pdu: Pdu {
                request_id,
                error_status: 0,
                error_index: max_repetitions,
                varbinds: oids.iter().map(|oid| (oid.clone(), Value::Null)).collect(),
            },
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, CollectorError> {
        let mut body = Vec::with_capacity(64);
        ber::write_integer(&mut body, i64::from(self.pdu.request_id));
        ber::write_integer(&mut body, i64::from(self.pdu.error_status));
        ber::write_integer(&mut body, i64::from(self.pdu.error_index));
        let mut list = Vec::with_capacity(64);
        for (oid, value) in &self.pdu.varbinds {
            let mut vb = Vec::with_capacity(32);
            ber::write_oid(&mut vb, oid)?;
            write_value(&mut vb, value)?;
            ber::write_tlv(&mut list, ber::TAG_SEQUENCE, &vb);
        }
        ber::write_tlv(&mut body, ber::TAG_SEQUENCE, &list);

        let mut msg = Vec::with_capacity(body.len() + 32);
        ber::write_integer(&mut msg, self.version as i64);
        ber::write_octet_string(&mut msg, self.community.as_bytes());
        ber::write_tlv(&mut msg, self.pdu_type as u8, &body);

        let mut out = Vec::with_capacity(msg.len() + 4);
        ber::write_tlv(&mut out, ber::TAG_SEQUENCE, &msg);
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self, CollectorError> {
        let mut outer = ber::Decoder::new(buf);
        let mut msg = ber::Decoder::new(outer.expect(ber::TAG_SEQUENCE)?);
        let version = match ber::decode_integer(msg.expect(ber::TAG_INTEGER)?)? {
            0 => Version::V1,
            1 => Version::V2c,
            v => return Err(CollectorError::Codec(format!("unsupported version {v}"))),
        };
        let community =
            String::from_utf8_lossy(msg.expect(ber::TAG_OCTET_STRING)?).into_owned();
        let (tag, body) = msg.read_tlv()?;
        let pdu_type = match tag {
            0xA0 => PduType::Get,
            0xA1 => PduType::GetNext,
            0xA2 => PduType::Response,
            0xA5 => PduType::GetBulk,
            t => {
                return Err(CollectorError::Codec(format!(
                    "unsupported pdu type {t:#04x}"
                )))
            }
        };
        let mut body = ber::Decoder::new(body);
        let request_id = int_field(&mut body)?;
        let error_status = int_field(&mut body)?;
        let error_index = int_field(&mut body)?;
        let mut list = ber::Decoder::new(body.expect(ber::TAG_SEQUENCE)?);
        let mut varbinds = Vec::new();
        while !list.is_empty() {
            let mut vb = ber::Decoder::new(list.expect(ber::TAG_SEQUENCE)?);
            let oid = ber::decode_oid(vb.expect(ber::TAG_OID)?)?;
            let (vtag, vcontent) = vb.read_tlv()?;
            varbinds.push((oid, read_value(vtag, vcontent)?));
        }
        Ok(SnmpMessage {
            version,
            community,
            pdu_type,
            pdu: Pdu {
                request_id,
                error_status,
                error_index,
                varbinds,
            },
        })
    }
}

fn int_field(dec: &mut ber::Decoder<'_>) -> Result<i32, CollectorError> {
    let v = ber::decode_integer(dec.expect(ber::TAG_INTEGER)?)?;
    i32::try_from(v).map_err(|_| CollectorError::Codec(format!("field out of range: {v}")))
}

fn write_value(out: &mut Vec<u8>, value: &Value) -> Result<(), CollectorError> {
    match value {
        Value::Integer(v) => ber::write_integer(out, *v),
        Value::OctetString(bytes) => ber::write_octet_string(out, bytes),
        Value::Oid(oid) => ber::write_oid(out, oid)?,
        Value::IpAddress(octets) => ber::write_tlv(out, ber::TAG_IP_ADDRESS, octets),
        Value::Counter32(v) => ber::write_unsigned(out, ber::TAG_COUNTER32, u64::from(*v)),
        Value::Gauge32(v) => ber::write_unsigned(out, ber::TAG_GAUGE32, u64::from(*v)),
        Value::TimeTicks(v) => ber::write_unsigned(out, ber::TAG_TIMETICKS, u64::from(*v)),
        Value::Counter64(v) => ber::write_unsigned(out, ber::TAG_COUNTER64, *v),
        Value::Opaque(bytes) => ber::write_tlv(out, ber::TAG_OPAQUE, bytes),
        Value::Null => ber::write_null(out),
        Value::NoSuchObject => ber::write_tlv(out, ber::TAG_NO_SUCH_OBJECT, &[]),
        Value::NoSuchInstance => ber::write_tlv(out, ber::TAG_NO_SUCH_INSTANCE, &[]),
        Value::EndOfMibView => ber::write_tlv(out, ber::TAG_END_OF_MIB_VIEW, &[]),
    }
    Ok(())
}

fn read_value(tag: u8, content: &[u8]) -> Result<Value, CollectorError> {
    let value = match tag {
        ber::TAG_INTEGER => Value::Integer(ber::decode_integer(content)?),
        ber::TAG_OCTET_STRING => Value::OctetString(content.to_vec()),
        ber::TAG_NULL => Value::Null,
        ber::TAG_OID => Value::Oid(ber::decode_oid(content)?),
        ber::TAG_IP_ADDRESS => {
            let octets: [u8; 4] = content
                .try_into()
                .map_err(|_| CollectorError::Codec("bad ip address length".into()))?;
            Value::IpAddress(octets)
        }
        ber::TAG_COUNTER32 => Value::Counter32(unsigned32(content)?),
        ber::TAG_GAUGE32 => Value::Gauge32(unsigned32(content)?),
        ber::TAG_TIMETICKS => Value::TimeTicks(unsigned32(content)?),
        ber::TAG_OPAQUE => Value::Opaque(content.to_vec()),
        ber::TAG_COUNTER64 => Value::Counter64(ber::decode_unsigned(content)?),
        ber::TAG_NO_SUCH_OBJECT => Value::NoSuchObject,
        ber::TAG_NO_SUCH_INSTANCE => Value::NoSuchInstance,
        ber::TAG_END_OF_MIB_VIEW => Value::EndOfMibView,
        t => {
            return Err(CollectorError::Codec(format!(
                "unsupported value tag {t:#04x}"
            )))
        }
    };
    Ok(value)
}

fn unsigned32(content: &[u8]) -> Result<u32, CollectorError> {
    let v = ber::decode_unsigned(content)?;
    u32::try_from(v).map_err(|_| CollectorError::Codec(format!("counter out of range: {v}")))
}

/// Agent error-status names, v1 and v2c.
pub fn error_message(status: i32) -> &'static str {
    match status {
        0 => "noError",
        1 => "tooBig",
        2 => "noSuchName",
        3 => "badValue",
        4 => "readOnly",
        5 => "genErr",
        6 => "noAccess",
        7 => "wrongType",
        8 => "wrongLength",
        9 => "wrongEncoding",
        10 => "wrongValue",
        11 => "noCreation",
        12 => "inconsistentValue",
        13 => "resourceUnavailable",
        14 => "commitFailed",
        15 => "undoFailed",
        16 => "authorizationError",
        17 => "notWritable",
        18 => "inconsistentName",
        _ => "unknown error",
    }
}
