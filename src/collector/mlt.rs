//! Nortel multi-link trunks (RC-MLT-MIB) and rcPort speed tables.

use std::collections::BTreeMap;

use crate::collector::vlan::decode_port_bitmask;
use crate::collector::{walk_indexed, NormPort, SpeedFacts};
use crate::error::CollectorError;
use crate::model::{Duplex, Equipment};
use crate::snmp::Session;

pub const RC_MLT_PORT_MEMBERS: &[u32] = &[1, 3, 6, 1, 4, 1, 2272, 1, 17, 10, 1, 3];
pub const RC_MLT_IF_INDEX: &[u32] = &[1, 3, 6, 1, 4, 1, 2272, 1, 17, 10, 1, 11];
pub const RC_PORT_OPER_DUPLEX: &[u32] = &[1, 3, 6, 1, 4, 1, 2272, 1, 4, 10, 1, 1, 13];
pub const RC_PORT_OPER_SPEED: &[u32] = &[1, 3, 6, 1, 4, 1, 2272, 1, 4, 10, 1, 1, 15];
pub const RC_PORT_AUTO_NEGOTIATE: &[u32] = &[1, 3, 6, 1, 4, 1, 2272, 1, 4, 10, 1, 1, 18];

/// Reads the MLT tables. After [`collect`](Self::collect), `mlt` maps an
/// MLT id to its member ports and `mlt_index` maps the aggregate ifIndex
/// back to the MLT id.
#[derive(Default)]
pub struct MltCollector {
    pub mlt: BTreeMap<i64, Vec<i64>>,
    pub mlt_index: BTreeMap<i64, i64>,
}

impl MltCollector {
    pub async fn collect(&mut self, session: &Session) -> Result<(), CollectorError> {
        for (mlt, value) in walk_indexed(session, RC_MLT_PORT_MEMBERS).await? {
            if let Some(bytes) = value.as_bytes() {
                self.mlt.insert(mlt, decode_port_bitmask(bytes));
            }
        }
        for (mlt, value) in walk_indexed(session, RC_MLT_IF_INDEX).await? {
            if let Some(index) = value.as_i64() {
                self.mlt_index.insert(index, mlt);
            }
        }
        Ok(())
    }
}

/// Speed, duplex and autonegotiation from the rcPort table.
pub struct NortelSpeedCollector;

impl NortelSpeedCollector {
    pub async fn collect(
        &self,
        session: &Session,
        equipment: &mut Equipment,
        normport: NormPort<'_>,
    ) -> Result<(), CollectorError> {
        log::debug!("collecting rcPort speed for {}", equipment.ip);
        let mut facts = SpeedFacts::default();
        for (index, value) in walk_indexed(session, RC_PORT_OPER_DUPLEX).await? {
            match value.as_i64() {
                Some(1) => {
                    facts.duplex.insert(index, Duplex::Half);
                }
                Some(2) => {
                    facts.duplex.insert(index, Duplex::Full);
                }
                _ => {}
            }
        }
        for (index, value) in walk_indexed(session, RC_PORT_OPER_SPEED).await? {
            if let Some(speed) = value.as_i64() {
                if speed != 0 {
                    facts.speed.insert(index, speed);
                }
            }
        }
        for (index, value) in walk_indexed(session, RC_PORT_AUTO_NEGOTIATE).await? {
            facts.autoneg.insert(index, value.as_i64() == Some(1));
        }
        facts.apply(equipment, normport);
        Ok(())
    }
}
