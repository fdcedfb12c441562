//! Bridge forwarding-table collectors.

use std::collections::BTreeMap;

use crate::collector::{walk_indexed, NormPort};
use crate::error::CollectorError;
use crate::model::Equipment;
use crate::oid::Oid;
use crate::snmp::Session;

pub const DOT1D_BASE_PORT_IFINDEX: &[u32] = &[1, 3, 6, 1, 2, 1, 17, 1, 4, 1, 2];
pub const DOT1D_TP_FDB_PORT: &[u32] = &[1, 3, 6, 1, 2, 1, 17, 4, 3, 1, 2];
pub const DOT1Q_TP_FDB_PORT: &[u32] = &[1, 3, 6, 1, 2, 1, 17, 7, 1, 2, 2, 1, 2];

/// Learned MACs from BRIDGE-MIB (or Q-BRIDGE-MIB with [`FdbCollector::qbridge`]).
pub struct FdbCollector {
    source: Oid,
    /// bridge port -> ifIndex, kept across community swaps
    portif: BTreeMap<i64, i64>,
}

impl Default for FdbCollector {
    fn default() -> Self {
        FdbCollector::new()
    }
}

impl FdbCollector {
    pub fn new() -> Self {
        FdbCollector {
            source: Oid::from_arcs(DOT1D_TP_FDB_PORT),
            portif: BTreeMap::new(),
        }
    }

    pub fn qbridge() -> Self {
        FdbCollector {
            source: Oid::from_arcs(DOT1Q_TP_FDB_PORT),
            portif: BTreeMap::new(),
        }
    }

    /// Pre-seed a bridge-port mapping the device will not report itself.
    pub fn inject_portif(&mut self, bridge_port: i64, ifindex: i64) {
        self.portif.insert(bridge_port, ifindex);
    }

    pub async fn collect(
        &mut self,
        session: &Session,
        equipment: &mut Equipment,
        normport: NormPort<'_>,
    ) -> Result<(), CollectorError> {
        log::debug!("collecting fdb for {}", equipment.ip);
        self.walk_portif(session).await?;
        self.walk_macs(session, equipment, normport).await
    }

    async fn walk_portif(&mut self, session: &Session) -> Result<(), CollectorError> {
        for (bridge_port, value) in walk_indexed(session, DOT1D_BASE_PORT_IFINDEX).await? {
            if let Some(ifindex) = value.as_i64() {
                self.portif.insert(bridge_port, ifindex);
            }
        }
        Ok(())
    }

    async fn walk_macs(
        &self,
        session: &Session,
        equipment: &mut Equipment,
        normport: NormPort<'_>,
    ) -> Result<(), CollectorError> {
        let rows = session.walk(&self.source).await?;
        for (oid, value) in rows {
            let Some(mac) = mac_from_oid(&oid) else {
                continue;
            };
            let Some(bridge_port) = value.as_i64() else {
                continue;
            };
            // bridge ports without an ifIndex mapping are ignored
            let Some(&ifindex) = self.portif.get(&bridge_port) else {
                continue;
            };
            let Some(index) = normport(ifindex) else {
                continue;
            };
            if let Some(port) = equipment.port_mut(index) {
                port.fdb.insert(mac);
            }
        }
        Ok(())
    }
}

/// The learned MAC is the last 6 index arcs of the row OID.
fn mac_from_oid(oid: &Oid) -> Option<String> {
    let arcs = oid.arcs();
    if arcs.len() < 6 {
        return None;
    }
    let tail = &arcs[arcs.len() - 6..];
    if tail.iter().any(|&a| a > 255) {
        return None;
    }
    Some(
        tail.iter()
            .map(|a| format!("{a:02x}"))
            .collect::<Vec<_>>()
            .join(":"),
    )
}

/// Community-indexed FDB: the bridge table is scoped per VLAN and read by
/// re-querying with community `orig@vid`, one VLAN at a time.
pub struct CommunityFdbCollector {
    vlan_names: Oid,
    deny: &'static [&'static str],
}

impl CommunityFdbCollector {
    pub fn new(vlan_names: &[u32], deny: &'static [&'static str]) -> Self {
        CommunityFdbCollector {
            vlan_names: Oid::from_arcs(vlan_names),
            deny,
        }
    }

    /// Per-VLAN failures are logged and skipped; the original community is
    /// restored before returning.
    pub async fn collect(
        &self,
        session: &mut Session,
        equipment: &mut Equipment,
        fdb: &mut FdbCollector,
        normport: NormPort<'_>,
    ) -> Result<(), CollectorError> {
        let mut vids = Vec::new();
        for (vid, value) in session
            .walk(&self.vlan_names)
            .await?
            .into_iter()
            .filter_map(|(oid, value)| Some((i64::from(*oid.arcs().last()?), value)))
        {
            let name = value.as_str().unwrap_or_default();
            if self.deny.contains(&name.as_str()) {
                continue;
            }
            vids.push(vid);
        }

        let original = session.community().to_string();
        for vid in vids {
            session.set_community(&format!("{original}@{vid}"));
            if let Err(e) = fdb.collect(session, equipment, normport).await {
                log::debug!("fdb walk for vlan {vid} on {} failed: {e}", equipment.ip);
            }
        }
        session.set_community(&original);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::transport::fake::FakeAgent;
    use crate::snmp::{Value, Version};
    use std::net::Ipv4Addr;
    use std::sync::Arc;

    fn equipment_with_ports(indexes: &[i64]) -> Equipment {
        let mut eq = Equipment::new(
            Ipv4Addr::new(192, 0, 2, 20),
            "sw1",
            Oid::from_arcs(&[1, 3, 6, 1, 4, 1, 4242, 1]),
            "fixture",
        );
        for &i in indexes {
            eq.ports.insert(i, crate::model::Port::named(&i.to_string()));
        }
        eq
    }

    #[tokio::test]
    async fn learns_macs_through_bridge_port_mapping() {
        let mut agent = FakeAgent::new("public");
        agent.insert_int("1.3.6.1.2.1.17.1.4.1.2.1", 10);
        agent.insert_int("1.3.6.1.2.1.17.1.4.1.2.2", 11);
        // 00:1b:2c:00:00:05 behind bridge port 1, another behind unmapped port 9
        agent.insert_int("1.3.6.1.2.1.17.4.3.1.2.0.27.44.0.0.5", 1);
        agent.insert_int("1.3.6.1.2.1.17.4.3.1.2.0.27.44.0.0.6", 9);
        let session = Session::new(Arc::new(agent), Version::V2c, "public");
        let mut eq = equipment_with_ports(&[10, 11]);
        FdbCollector::new()
            .collect(&session, &mut eq, &|p| Some(p))
            .await
            .unwrap();
        assert!(eq.ports[&10].fdb.contains("00:1b:2c:00:00:05"));
        assert!(eq.ports[&11].fdb.is_empty());
    }

    #[tokio::test]
    async fn qbridge_source_reads_dot1q_table() {
        let mut agent = FakeAgent::new("public");
        agent.insert_int("1.3.6.1.2.1.17.1.4.1.2.3", 30);
        // dot1q rows carry the fdb id before the mac
        agent.insert_int("1.3.6.1.2.1.17.7.1.2.2.1.2.1.0.27.44.0.0.7", 3);
        let session = Session::new(Arc::new(agent), Version::V2c, "public");
        let mut eq = equipment_with_ports(&[30]);
        FdbCollector::qbridge()
            .collect(&session, &mut eq, &|p| Some(p))
            .await
            .unwrap();
        assert!(eq.ports[&30].fdb.contains("00:1b:2c:00:00:07"));
    }

    #[tokio::test]
    async fn community_collector_walks_each_vlan_and_restores() {
        let mut agent = FakeAgent::new("public");
        agent.insert_str("1.3.6.1.4.1.9.9.46.1.3.1.1.4.1.1", "users");
        agent.insert_str("1.3.6.1.4.1.9.9.46.1.3.1.1.4.1.12", "fddi-default");
        agent.insert_str("1.3.6.1.4.1.9.9.46.1.3.1.1.4.1.20", "voice");
        agent.insert_scoped("public@1", "1.3.6.1.2.1.17.1.4.1.2.1", Value::Integer(10));
        agent.insert_scoped(
            "public@1",
            "1.3.6.1.2.1.17.4.3.1.2.0.27.44.0.0.1",
            Value::Integer(1),
        );
        // vlan 20 answers nothing; its failure must not abort the run
        let agent = Arc::new(agent);
        let mut session = Session::new(agent.clone(), Version::V2c, "public");
        let mut eq = equipment_with_ports(&[10]);
        let mut fdb = FdbCollector::new();
        CommunityFdbCollector::new(
            &[1, 3, 6, 1, 4, 1, 9, 9, 46, 1, 3, 1, 1, 4],
            &["fddi-default"],
        )
        .collect(&mut session, &mut eq, &mut fdb, &|p| Some(p))
        .await
        .unwrap();
        assert!(eq.ports[&10].fdb.contains("00:1b:2c:00:00:01"));
        assert_eq!(session.community(), "public");
        let seen = agent.seen_communities();
        assert!(seen.contains(&"public@1".to_string()));
        assert!(seen.contains(&"public@20".to_string()));
        assert!(!seen.iter().any(|c| c == "public@12"));
    }
}
