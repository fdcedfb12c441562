//! Nortel ERS-8600 (Passport) pipeline.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::collector::arp::ArpCollector;
use crate::collector::fdb::{CommunityFdbCollector, FdbCollector};
use crate::collector::mlt::{MltCollector, NortelSpeedCollector};
use crate::collector::ports::{PortCollector, IF_NAME};
use crate::collector::sonmp::SonmpCollector;
use crate::collector::vlan::VlanTableCollector;
use crate::collector::{keep_known, DevicePlugin};
use crate::error::CollectorError;
use crate::model::Equipment;
use crate::oid::Oid;
use crate::snmp::Session;

pub const RC_PORT_NAME: &[u32] = &[1, 3, 6, 1, 4, 1, 2272, 1, 4, 10, 1, 1, 35];
pub const RC_VLAN_NAME: &[u32] = &[1, 3, 6, 1, 4, 1, 2272, 1, 3, 2, 1, 2];
pub const RC_VLAN_PORT_MEMBERS: &[u32] = &[1, 3, 6, 1, 4, 1, 2272, 1, 3, 2, 1, 11];

const ERS_8610: &[u32] = &[1, 3, 6, 1, 4, 1, 2272, 30];

/// SONMP reports slot/port pairs; on the 8600 the matching ifIndex sits
/// 63 above.
const SONMP_IFINDEX_SHIFT: i64 = 63;

pub struct PassportPlugin;

#[async_trait]
impl DevicePlugin for PassportPlugin {
    fn name(&self) -> &'static str {
        "passport"
    }

    fn handles(&self, sysobjectid: &Oid) -> bool {
        sysobjectid.arcs() == ERS_8610
    }

    async fn collect(
        &self,
        session: &mut Session,
        equipment: &mut Equipment,
    ) -> Result<(), CollectorError> {
        PortCollector::with_sources(IF_NAME, RC_PORT_NAME)
            .collect(session, equipment, &BTreeMap::new())
            .await?;
        NortelSpeedCollector
            .collect(session, equipment, &|p| Some(p))
            .await?;
        let mut mlt = MltCollector::default();
        mlt.collect(session).await?;

        // dot1dTpFdbPort rows can point at the MLT ifIndex while
        // dot1dBasePortIfIndex knows nothing about it, so the aggregate
        // indexes pass through unmapped and are resolved here.
        let mut fdb = FdbCollector::new();
        for &ifindex in mlt.mlt_index.keys() {
            fdb.inject_portif(ifindex, ifindex);
        }
        let norm = |port: i64| -> Option<i64> {
            if port < 1 {
                return None;
            }
            if port < 2048 {
                return Some(port);
            }
            if port > 4095 {
                let mltid = mlt.mlt_index.get(&port)?;
                return mlt.mlt.get(mltid).and_then(|m| m.first()).copied();
            }
            // 2048..=4095 are vlan interfaces
            None
        };
        CommunityFdbCollector::new(RC_VLAN_NAME, &[])
            .collect(session, equipment, &mut fdb, &norm)
            .await?;

        ArpCollector.collect(session, equipment).await?;
        SonmpCollector
            .collect(session, equipment, &|p| Some(p + SONMP_IFINDEX_SHIFT))
            .await?;
        let keep = keep_known(equipment);
        VlanTableCollector::new(RC_VLAN_NAME, RC_VLAN_PORT_MEMBERS)
            .collect(session, equipment, &keep)
            .await
    }
}
