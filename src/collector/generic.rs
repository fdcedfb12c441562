//! Fallback pipeline for equipment no vendor pipeline claims.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::collector::arp::ArpCollector;
use crate::collector::fdb::FdbCollector;
use crate::collector::lldp::{LldpCollector, LldpSpeedCollector};
use crate::collector::ports::PortCollector;
use crate::collector::vlan::{IfMibVlanCollector, VlanTableCollector};
use crate::collector::{keep_known, DevicePlugin};
use crate::error::CollectorError;
use crate::model::Equipment;
use crate::oid::Oid;
use crate::snmp::{Session, Version};

pub struct GenericPlugin;

#[async_trait]
impl DevicePlugin for GenericPlugin {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn handles(&self, _sysobjectid: &Oid) -> bool {
        true
    }

    /// Conservative pipeline over SNMPv1: IF-MIB ports, bridge FDB, ARP,
    /// LLDP when the device exposes it, then RFC2674 and IF-MIB vlans.
    /// Ports without a given piece of information are left incomplete.
    async fn collect(
        &self,
        session: &mut Session,
        equipment: &mut Equipment,
    ) -> Result<(), CollectorError> {
        session.set_version(Version::V1);
        PortCollector::new()
            .collect(session, equipment, &BTreeMap::new())
            .await?;
        let keep = keep_known(equipment);
        FdbCollector::new()
            .collect(session, equipment, &keep)
            .await?;
        ArpCollector.collect(session, equipment).await?;
        match LldpCollector.collect(session, equipment, &keep).await {
            Ok(()) => {
                LldpSpeedCollector
                    .collect(session, equipment, &keep)
                    .await?;
            }
            Err(CollectorError::NoLldp) => {
                log::debug!("no lldp support on {}", equipment.ip);
            }
            Err(e) => return Err(e),
        }
        VlanTableCollector::rfc2674()
            .collect(session, equipment, &keep)
            .await?;
        IfMibVlanCollector.collect(session, equipment, &keep).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VlanScope;
    use crate::snmp::transport::fake::FakeAgent;
    use std::net::Ipv4Addr;
    use std::sync::Arc;

    fn agent() -> FakeAgent {
        let mut agent = FakeAgent::new("public");
        agent.insert_int("1.3.6.1.2.1.2.2.1.3.1", 6);
        agent.insert_int("1.3.6.1.2.1.2.2.1.3.2", 6);
        agent.insert_str("1.3.6.1.2.1.2.2.1.2.1", "port 1");
        agent.insert_str("1.3.6.1.2.1.2.2.1.2.2", "port 2");
        agent.insert_int("1.3.6.1.2.1.2.2.1.8.1", 1);
        agent.insert_int("1.3.6.1.2.1.2.2.1.8.2", 2);
        // fdb: bridge port 2 backs ifIndex 2
        agent.insert_int("1.3.6.1.2.1.17.1.4.1.2.2", 2);
        agent.insert_int("1.3.6.1.2.1.17.4.3.1.2.0.17.34.51.68.85", 2);
        agent.insert_bytes("1.3.6.1.2.1.4.22.1.2.10.10.0.0.3", &[2, 3, 4, 5, 6, 7]);
        // rfc2674 vlan 5 holding port 1
        agent.insert_str("1.3.6.1.2.1.17.7.1.4.3.1.1.5", "servers");
        agent.insert_bytes("1.3.6.1.2.1.17.7.1.4.2.1.4.0.5", &[0x40]);
        agent
    }

    fn equipment() -> Equipment {
        Equipment::new(
            Ipv4Addr::new(192, 0, 2, 90),
            "unknown-box",
            Oid::from_arcs(&[1, 3, 6, 1, 4, 1, 4242, 1]),
            "fixture",
        )
    }

    #[tokio::test]
    async fn pipeline_survives_a_device_without_lldp() {
        let mut session = Session::new(Arc::new(agent()), Version::V2c, "public");
        let mut eq = equipment();
        GenericPlugin.collect(&mut session, &mut eq).await.unwrap();

        assert_eq!(session.version(), Version::V1);
        assert_eq!(eq.ports.len(), 2);
        assert_eq!(eq.ports[&1].name, "port 1");
        assert!(eq.ports[&2].fdb.contains("00:11:22:33:44:55"));
        assert_eq!(eq.arp[&Ipv4Addr::new(10, 0, 0, 3)], "02:03:04:05:06:07");
        assert!(eq.ports[&1].lldp.is_none());
        let vlan = eq.ports[&1].vlans.iter().next().unwrap();
        assert_eq!((vlan.vid, vlan.scope), (5, VlanScope::Local));
    }

    #[tokio::test]
    async fn lldp_facts_flow_through_when_present() {
        let mut agent = agent();
        agent.insert_str("1.0.8802.1.1.2.1.3.7.1.3.1", "1");
        agent.insert_str("1.0.8802.1.1.2.1.4.1.1.9.0.1.1", "peer");
        agent.insert_str("1.0.8802.1.1.2.1.4.1.1.10.0.1.1", "peer description");
        agent.insert_str("1.0.8802.1.1.2.1.4.1.1.8.0.1.1", "eth0");
        let mut session = Session::new(Arc::new(agent), Version::V2c, "public");
        let mut eq = equipment();
        GenericPlugin.collect(&mut session, &mut eq).await.unwrap();
        assert_eq!(eq.ports[&1].lldp.as_ref().unwrap().sysname, "peer");
    }
}
