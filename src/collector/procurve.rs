//! HP Procurve pipeline.

use async_trait::async_trait;

use crate::collector::arp::ArpCollector;
use crate::collector::fdb::FdbCollector;
use crate::collector::lldp::{LldpCollector, LldpSpeedCollector};
use crate::collector::ports::{PortCollector, IF_ALIAS, IF_DESCR};
use crate::collector::trunk::StackTrunkCollector;
use crate::collector::vlan::VlanTableCollector;
use crate::collector::{keep_known, DevicePlugin};
use crate::error::CollectorError;
use crate::model::Equipment;
use crate::oid::Oid;
use crate::snmp::Session;

/// hpicfOid.mib subtree, minus the blade switches living under 33.4.
const PROCURVE: &[u32] = &[1, 3, 6, 1, 4, 1, 11, 2, 3, 7, 11];
const BLADE: &[u32] = &[1, 3, 6, 1, 4, 1, 11, 2, 3, 7, 11, 33, 4];

pub struct ProcurvePlugin;

#[async_trait]
impl DevicePlugin for ProcurvePlugin {
    fn name(&self) -> &'static str {
        "procurve"
    }

    fn handles(&self, sysobjectid: &Oid) -> bool {
        sysobjectid.starts_with(&Oid::from_arcs(PROCURVE))
            && !sysobjectid.starts_with(&Oid::from_arcs(BLADE))
    }

    async fn collect(
        &self,
        session: &mut Session,
        equipment: &mut Equipment,
    ) -> Result<(), CollectorError> {
        let trunks = StackTrunkCollector.collect(session).await?;
        PortCollector::with_sources(IF_DESCR, IF_ALIAS)
            .collect(session, equipment, &trunks)
            .await?;
        let keep = keep_known(equipment);
        FdbCollector::new()
            .collect(session, equipment, &keep)
            .await?;
        ArpCollector.collect(session, equipment).await?;
        LldpCollector
            .collect(session, equipment, &|p| Some(p))
            .await?;
        LldpSpeedCollector
            .collect(session, equipment, &|p| Some(p))
            .await?;
        VlanTableCollector::rfc2674()
            .collect(session, equipment, &keep)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::transport::fake::FakeAgent;
    use crate::snmp::Version;
    use std::net::Ipv4Addr;
    use std::sync::Arc;

    fn equipment() -> Equipment {
        Equipment::new(
            Ipv4Addr::new(192, 0, 2, 100),
            "procurve-2810",
            Oid::from_arcs(&[1, 3, 6, 1, 4, 1, 11, 2, 3, 7, 11, 87]),
            "fixture",
        )
    }

    #[test]
    fn blade_switches_are_rejected() {
        let plugin = ProcurvePlugin;
        let blade: Oid = "1.3.6.1.4.1.11.2.3.7.11.33.4.1".parse().unwrap();
        assert!(!plugin.handles(&blade));
        let switch: Oid = "1.3.6.1.4.1.11.2.3.7.11.87".parse().unwrap();
        assert!(plugin.handles(&switch));
    }

    #[tokio::test]
    async fn trunks_and_lldp_flow_through_the_pipeline() {
        let mut agent = FakeAgent::new("public");
        agent.insert_int("1.3.6.1.2.1.2.2.1.3.1", 6);
        agent.insert_int("1.3.6.1.2.1.2.2.1.3.2", 6);
        agent.insert_int("1.3.6.1.2.1.2.2.1.3.290", 54);
        agent.insert_int("1.3.6.1.2.1.31.1.2.1.3.290.1", 1);
        agent.insert_int("1.3.6.1.2.1.31.1.2.1.3.290.2", 1);
        agent.insert_str("1.3.6.1.2.1.2.2.1.2.1", "1");
        agent.insert_str("1.3.6.1.2.1.2.2.1.2.2", "2");
        agent.insert_str("1.3.6.1.2.1.2.2.1.2.290", "Trk1");
        agent.insert_str("1.3.6.1.2.1.31.1.1.1.18.1", "uplink a");
        agent.insert_int("1.3.6.1.2.1.2.2.1.8.1", 1);
        agent.insert_int("1.3.6.1.2.1.2.2.1.8.2", 1);
        agent.insert_int("1.3.6.1.2.1.2.2.1.8.290", 1);
        agent.insert_str("1.0.8802.1.1.2.1.3.7.1.3.1", "1");
        agent.insert_str("1.0.8802.1.1.2.1.4.1.1.9.0.1.1", "neighbor");
        agent.insert_str("1.0.8802.1.1.2.1.4.1.1.10.0.1.1", "neighbor switch");
        agent.insert_str("1.0.8802.1.1.2.1.4.1.1.8.0.1.1", "B4");

        let mut session = Session::new(Arc::new(agent), Version::V2c, "public");
        let mut eq = equipment();
        ProcurvePlugin.collect(&mut session, &mut eq).await.unwrap();

        // the aggregate is admitted and its members point back at it
        assert!(eq.ports.contains_key(&290));
        assert_eq!(eq.ports[&1].trunk.as_ref().unwrap().parent, 290);
        assert_eq!(eq.ports[&1].alias.as_deref(), Some("uplink a"));
        assert_eq!(eq.ports[&1].lldp.as_ref().unwrap().sysname, "neighbor");
    }

    #[tokio::test]
    async fn missing_lldp_fails_the_pipeline() {
        let mut agent = FakeAgent::new("public");
        agent.insert_int("1.3.6.1.2.1.2.2.1.3.1", 6);
        agent.insert_str("1.3.6.1.2.1.2.2.1.2.1", "1");
        agent.insert_int("1.3.6.1.2.1.2.2.1.8.1", 1);
        let mut session = Session::new(Arc::new(agent), Version::V2c, "public");
        let mut eq = equipment();
        match ProcurvePlugin.collect(&mut session, &mut eq).await {
            Err(CollectorError::NoLldp) => {}
            other => panic!("expected NoLldp, got {other:?}"),
        }
    }
}
