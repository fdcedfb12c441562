//! LLDP neighbor discovery, plus the dot1/dot3 extension tables for
//! remote VLAN names and port speed.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use crate::collector::{walk_indexed, NormPort, SpeedFacts};
use crate::error::CollectorError;
use crate::model::{Duplex, Equipment, Lldp, Vlan, VlanScope};
use crate::oid::Oid;
use crate::snmp::Session;

pub const LLDP_LOC_PORT_ID: &[u32] = &[1, 0, 8802, 1, 1, 2, 1, 3, 7, 1, 3];
pub const LLDP_REM_PORT_DESC: &[u32] = &[1, 0, 8802, 1, 1, 2, 1, 4, 1, 1, 8];
pub const LLDP_REM_SYS_NAME: &[u32] = &[1, 0, 8802, 1, 1, 2, 1, 4, 1, 1, 9];
pub const LLDP_REM_SYS_DESC: &[u32] = &[1, 0, 8802, 1, 1, 2, 1, 4, 1, 1, 10];
pub const LLDP_REM_MAN_ADDR_IF_ID: &[u32] = &[1, 0, 8802, 1, 1, 2, 1, 4, 2, 1, 4];
pub const LLDP_XDOT1_REM_VLAN_NAME: &[u32] =
    &[1, 0, 8802, 1, 1, 2, 1, 5, 32962, 1, 3, 3, 1, 2];
pub const LLDP_XDOT3_AUTONEG: &[u32] = &[1, 0, 8802, 1, 1, 2, 1, 5, 4623, 1, 2, 1, 1, 2];
pub const LLDP_XDOT3_MAU_TYPE: &[u32] = &[1, 0, 8802, 1, 1, 2, 1, 5, 4623, 1, 2, 1, 1, 4];

pub struct LldpCollector;

impl LldpCollector {
    /// Fails with [`CollectorError::NoLldp`] when the agent exposes no
    /// local LLDP ports at all.
    pub async fn collect(
        &self,
        session: &Session,
        equipment: &mut Equipment,
        normport: NormPort<'_>,
    ) -> Result<(), CollectorError> {
        log::debug!("collecting lldp for {}", equipment.ip);
        let loc = session.walk(&Oid::from_arcs(LLDP_LOC_PORT_ID)).await?;
        if loc.is_empty() {
            return Err(CollectorError::NoLldp);
        }

        let sysnames = self.remote_strings(session, LLDP_REM_SYS_NAME, normport).await?;
        let sysdescs = self.remote_strings(session, LLDP_REM_SYS_DESC, normport).await?;
        let portdescs = self.remote_strings(session, LLDP_REM_PORT_DESC, normport).await?;
        let mgmt = self.management_addresses(session, normport).await?;

        for (index, sysname) in sysnames {
            // one neighbor record needs all three strings
            let (Some(sysdesc), Some(portdesc)) =
                (sysdescs.get(&index), portdescs.get(&index))
            else {
                continue;
            };
            if let Some(port) = equipment.port_mut(index) {
                port.lldp = Some(Lldp {
                    sysname,
                    sysdesc: sysdesc.clone(),
                    portdesc: portdesc.clone(),
                    ip: mgmt.get(&index).copied().unwrap_or(Ipv4Addr::UNSPECIFIED),
                });
            }
        }

        self.remote_vlans(session, equipment, normport).await
    }

    /// lldpRem* strings keyed by the local port number (second-to-last
    /// index arc). Blank values are dropped.
    async fn remote_strings(
        &self,
        session: &Session,
        base: &[u32],
        normport: NormPort<'_>,
    ) -> Result<BTreeMap<i64, String>, CollectorError> {
        let mut strings = BTreeMap::new();
        for (oid, value) in session.walk(&Oid::from_arcs(base)).await? {
            let arcs = oid.arcs();
            if arcs.len() < 2 {
                continue;
            }
            let Some(index) = normport(i64::from(arcs[arcs.len() - 2])) else {
                continue;
            };
            let Some(text) = value.as_str() else {
                continue;
            };
            let text = text.trim().to_string();
            if !text.is_empty() {
                strings.insert(index, text);
            }
        }
        Ok(strings)
    }

    /// Management addresses hide in the lldpRemManAddrIfId index: subtype
    /// arc must be ipV4(1); some agents encode the address binary, others
    /// as a readable string.
    async fn management_addresses(
        &self,
        session: &Session,
        normport: NormPort<'_>,
    ) -> Result<BTreeMap<i64, Ipv4Addr>, CollectorError> {
        let base = Oid::from_arcs(LLDP_REM_MAN_ADDR_IF_ID);
        let mut mgmt = BTreeMap::new();
        for (oid, _) in session.walk(&base).await? {
            let Some(suffix) = oid.suffix(&base) else {
                continue;
            };
            if suffix.len() < 6 || suffix[3] != 1 {
                continue;
            }
            let addr_len = suffix[4] as usize;
            if suffix.len() < 5 + addr_len {
                continue;
            }
            let tail = &suffix[suffix.len() - addr_len..];
            let ip = if addr_len == 4 {
                let octets: Vec<u8> =
                    tail.iter().filter_map(|&a| u8::try_from(a).ok()).collect();
                match octets.as_slice() {
                    [a, b, c, d] => Some(Ipv4Addr::new(*a, *b, *c, *d)),
                    _ => None,
                }
            } else {
                // address spelled out character by character
                tail.iter()
                    .map(|&a| u8::try_from(a).ok().map(char::from))
                    .collect::<Option<String>>()
                    .and_then(|s| s.parse::<Ipv4Addr>().ok())
            };
            let Some(ip) = ip else {
                continue;
            };
            if let Some(index) = normport(i64::from(suffix[1])) {
                mgmt.insert(index, ip);
            }
        }
        Ok(mgmt)
    }

    /// VLANs advertised by the neighbor, tagged Remote.
    async fn remote_vlans(
        &self,
        session: &Session,
        equipment: &mut Equipment,
        normport: NormPort<'_>,
    ) -> Result<(), CollectorError> {
        for (oid, value) in session.walk(&Oid::from_arcs(LLDP_XDOT1_REM_VLAN_NAME)).await? {
            let arcs = oid.arcs();
            if arcs.len() < 3 {
                continue;
            }
            let vid = i64::from(arcs[arcs.len() - 1]);
            let Some(index) = normport(i64::from(arcs[arcs.len() - 3])) else {
                continue;
            };
            let Some(name) = value.as_str() else {
                continue;
            };
            if let Some(port) = equipment.port_mut(index) {
                port.vlans.insert(Vlan {
                    vid,
                    name,
                    scope: VlanScope::Remote,
                });
            }
        }
        Ok(())
    }
}

/// Speed, duplex and autonegotiation from the LLDP dot3 local tables.
pub struct LldpSpeedCollector;

impl LldpSpeedCollector {
    pub async fn collect(
        &self,
        session: &Session,
        equipment: &mut Equipment,
        normport: NormPort<'_>,
    ) -> Result<(), CollectorError> {
        log::debug!("collecting lldp speed for {}", equipment.ip);
        let mut facts = SpeedFacts::default();
        for (index, value) in walk_indexed(session, LLDP_XDOT3_AUTONEG).await? {
            if let Some(v) = value.as_i64() {
                facts.autoneg.insert(index, v == 1);
            }
        }
        for (index, value) in walk_indexed(session, LLDP_XDOT3_MAU_TYPE).await? {
            let Some(mau) = value.as_i64() else {
                continue;
            };
            if let Some((speed, duplex)) = mau_to_speed(mau) {
                facts.speed.insert(index, speed);
                facts.duplex.insert(index, duplex);
            }
        }
        facts.apply(equipment, normport);
        Ok(())
    }
}

/// IANA dot3 MAU types to (Mbit/s, duplex).
fn mau_to_speed(mau: i64) -> Option<(i64, Duplex)> {
    match mau {
        10 | 12 => Some((10, Duplex::Half)),
        11 | 13 => Some((10, Duplex::Full)),
        14 | 15 | 17 | 19 => Some((100, Duplex::Half)),
        16 | 18 | 20 => Some((100, Duplex::Full)),
        21..=30 => {
            let duplex = if mau % 2 == 1 {
                Duplex::Half
            } else {
                Duplex::Full
            };
            Some((1_000, duplex))
        }
        31..=40 => Some((10_000, Duplex::Full)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Port;
    use crate::snmp::transport::fake::FakeAgent;
    use crate::snmp::Version;
    use std::sync::Arc;

    fn equipment_with_ports(indexes: &[i64]) -> Equipment {
        let mut eq = Equipment::new(
            Ipv4Addr::new(192, 0, 2, 50),
            "sw1",
            Oid::from_arcs(&[1, 3, 6, 1, 4, 1, 4242, 1]),
            "fixture",
        );
        for &i in indexes {
            eq.ports.insert(i, Port::named(&i.to_string()));
        }
        eq
    }

    fn lldp_agent() -> FakeAgent {
        let mut agent = FakeAgent::new("public");
        agent.insert_str("1.0.8802.1.1.2.1.3.7.1.3.1", "1");
        agent.insert_str("1.0.8802.1.1.2.1.3.7.1.3.2", "2");
        // neighbor behind local port 2
        agent.insert_str("1.0.8802.1.1.2.1.4.1.1.9.0.2.1", "sw-core-1");
        agent.insert_str("1.0.8802.1.1.2.1.4.1.1.10.0.2.1", "core router");
        agent.insert_str("1.0.8802.1.1.2.1.4.1.1.8.0.2.1", "Gi1/0/24");
        // binary-encoded management address
        agent.insert_int("1.0.8802.1.1.2.1.4.2.1.4.0.2.1.1.4.10.0.0.5", 1);
        agent
    }

    #[tokio::test]
    async fn empty_local_table_is_no_lldp() {
        let agent = FakeAgent::new("public");
        let session = Session::new(Arc::new(agent), Version::V2c, "public");
        let mut eq = equipment_with_ports(&[1]);
        match LldpCollector.collect(&session, &mut eq, &|p| Some(p)).await {
            Err(CollectorError::NoLldp) => {}
            other => panic!("expected NoLldp, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn neighbor_facts_need_all_three_strings() {
        let mut agent = lldp_agent();
        // port 1 only advertises a sysname
        agent.insert_str("1.0.8802.1.1.2.1.4.1.1.9.0.1.1", "lonely");
        let session = Session::new(Arc::new(agent), Version::V2c, "public");
        let mut eq = equipment_with_ports(&[1, 2]);
        LldpCollector
            .collect(&session, &mut eq, &|p| Some(p))
            .await
            .unwrap();
        assert!(eq.ports[&1].lldp.is_none());
        let fact = eq.ports[&2].lldp.as_ref().unwrap();
        assert_eq!(fact.sysname, "sw-core-1");
        assert_eq!(fact.sysdesc, "core router");
        assert_eq!(fact.portdesc, "Gi1/0/24");
        assert_eq!(fact.ip, Ipv4Addr::new(10, 0, 0, 5));
    }

    #[tokio::test]
    async fn readable_management_address_is_parsed() {
        let mut agent = lldp_agent();
        // neighbor on port 1 spells 10.0.0.9 as ascii arcs
        agent.insert_str("1.0.8802.1.1.2.1.4.1.1.9.0.1.1", "sw-edge-9");
        agent.insert_str("1.0.8802.1.1.2.1.4.1.1.10.0.1.1", "edge switch");
        agent.insert_str("1.0.8802.1.1.2.1.4.1.1.8.0.1.1", "24");
        agent.insert_int(
            "1.0.8802.1.1.2.1.4.2.1.4.0.1.1.1.8.49.48.46.48.46.48.46.57",
            1,
        );
        let session = Session::new(Arc::new(agent), Version::V2c, "public");
        let mut eq = equipment_with_ports(&[1, 2]);
        LldpCollector
            .collect(&session, &mut eq, &|p| Some(p))
            .await
            .unwrap();
        assert_eq!(
            eq.ports[&1].lldp.as_ref().unwrap().ip,
            Ipv4Addr::new(10, 0, 0, 9)
        );
    }

    #[tokio::test]
    async fn remote_vlans_are_remote_scoped() {
        let mut agent = lldp_agent();
        agent.insert_str("1.0.8802.1.1.2.1.5.32962.1.3.3.1.2.0.2.1.42", "users");
        let session = Session::new(Arc::new(agent), Version::V2c, "public");
        let mut eq = equipment_with_ports(&[2]);
        LldpCollector
            .collect(&session, &mut eq, &|p| Some(p))
            .await
            .unwrap();
        let vlan = eq.ports[&2].vlans.iter().next().unwrap();
        assert_eq!(vlan.vid, 42);
        assert_eq!(vlan.name, "users");
        assert_eq!(vlan.scope, VlanScope::Remote);
    }

    #[tokio::test]
    async fn mau_types_set_speed_and_duplex() {
        let mut agent = FakeAgent::new("public");
        agent.insert_int("1.0.8802.1.1.2.1.5.4623.1.2.1.1.2.1", 1);
        agent.insert_int("1.0.8802.1.1.2.1.5.4623.1.2.1.1.4.1", 16);
        agent.insert_int("1.0.8802.1.1.2.1.5.4623.1.2.1.1.2.2", 2);
        agent.insert_int("1.0.8802.1.1.2.1.5.4623.1.2.1.1.4.2", 30);
        // unknown mau type leaves the port untouched
        agent.insert_int("1.0.8802.1.1.2.1.5.4623.1.2.1.1.4.3", 2);
        let session = Session::new(Arc::new(agent), Version::V2c, "public");
        let mut eq = equipment_with_ports(&[1, 2, 3]);
        eq.port_mut(3).unwrap().speed = Some(10);
        LldpSpeedCollector
            .collect(&session, &mut eq, &|p| Some(p))
            .await
            .unwrap();
        assert_eq!(eq.ports[&1].speed, Some(100));
        assert_eq!(eq.ports[&1].duplex, Some(Duplex::Full));
        assert_eq!(eq.ports[&1].autoneg, Some(true));
        assert_eq!(eq.ports[&2].speed, Some(1_000));
        assert_eq!(eq.ports[&2].duplex, Some(Duplex::Full));
        assert_eq!(eq.ports[&2].autoneg, Some(false));
        assert_eq!(eq.ports[&3].speed, Some(10));
    }
}
