//! SONMP topology table (Nortel/Bay segment ids).

use crate::collector::NormPort;
use crate::error::CollectorError;
use crate::model::{Equipment, Sonmp};
use crate::oid::Oid;
use crate::snmp::Session;
use std::net::Ipv4Addr;

pub const S5_EN_MS_TOP_NMM_SEG_ID: &[u32] = &[1, 3, 6, 1, 4, 1, 45, 1, 6, 13, 2, 1, 1, 4];

pub struct SonmpCollector;

impl SonmpCollector {
    pub async fn collect(
        &self,
        session: &Session,
        equipment: &mut Equipment,
        normport: NormPort<'_>,
    ) -> Result<(), CollectorError> {
        log::debug!("collecting sonmp for {}", equipment.ip);
        for (oid, _) in session.walk(&Oid::from_arcs(S5_EN_MS_TOP_NMM_SEG_ID)).await? {
            let arcs = oid.arcs();
            if arcs.len() < 7 {
                continue;
            }
            let Some(ip) = remote_ip(&arcs[arcs.len() - 5..arcs.len() - 1]) else {
                continue;
            };
            let mut segid = i64::from(arcs[arcs.len() - 1]);
            if segid > 0x10000 {
                // token-ring style segments, not handled
                continue;
            }
            if segid > 0x100 {
                // slot/port packed in two bytes
                segid = segid / 256 * 64 + segid % 256 - 64;
            }
            let slot = i64::from(arcs[arcs.len() - 7]);
            let raw = i64::from(arcs[arcs.len() - 6]) + (slot - 1) * 64;
            let Some(index) = normport(raw) else {
                continue;
            };
            if index <= 0 {
                continue;
            }
            if let Some(port) = equipment.port_mut(index) {
                port.sonmp = Some(Sonmp { ip, port: segid });
            }
        }
        Ok(())
    }
}

fn remote_ip(arcs: &[u32]) -> Option<Ipv4Addr> {
    match arcs {
        [a, b, c, d] => Some(Ipv4Addr::new(
            u8::try_from(*a).ok()?,
            u8::try_from(*b).ok()?,
            u8::try_from(*c).ok()?,
            u8::try_from(*d).ok()?,
        )),
        _ => None,
    }
}
