//! Extreme Summit pipeline.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::collector::arp::ArpCollector;
use crate::collector::edp::EdpCollector;
use crate::collector::fdb::FdbCollector;
use crate::collector::ports::PortCollector;
use crate::collector::vlan::IfMibVlanCollector;
use crate::collector::DevicePlugin;
use crate::error::CollectorError;
use crate::model::Equipment;
use crate::oid::Oid;
use crate::snmp::Session;

const SUMMIT_MODELS: &[&[u32]] = &[
    &[1, 3, 6, 1, 4, 1, 1916, 2, 28], // Summit 48si
    &[1, 3, 6, 1, 4, 1, 1916, 2, 54], // Summit 48e
    &[1, 3, 6, 1, 4, 1, 1916, 2, 76], // Summit 48t
    &[1, 3, 6, 1, 4, 1, 1916, 2, 62], // Black Diamond 8810
    &[1, 3, 6, 1, 4, 1, 1916, 2, 40], // Summit 24e
];

pub struct ExtremePlugin;

#[async_trait]
impl DevicePlugin for ExtremePlugin {
    fn name(&self) -> &'static str {
        "extreme"
    }

    fn handles(&self, sysobjectid: &Oid) -> bool {
        SUMMIT_MODELS.iter().any(|model| sysobjectid.arcs() == *model)
    }

    /// LLDP is skipped on these devices; EDP carries the neighbor and
    /// remote vlan information instead.
    async fn collect(
        &self,
        session: &mut Session,
        equipment: &mut Equipment,
    ) -> Result<(), CollectorError> {
        PortCollector::new()
            .collect(session, equipment, &BTreeMap::new())
            .await?;
        FdbCollector::new()
            .collect(session, equipment, &|p| Some(p))
            .await?;
        ArpCollector.collect(session, equipment).await?;
        EdpCollector
            .collect(session, equipment, &|p| Some(p))
            .await?;
        IfMibVlanCollector
            .collect(session, equipment, &|p| Some(p))
            .await
    }
}
