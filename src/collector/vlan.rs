//! VLAN membership collectors: name+bitmask table pairs (RFC 2674 and
//! vendor equivalents) and the IF-MIB pseudo-interface style.

use std::collections::BTreeMap;

use regex::Regex;

use crate::collector::ports::{IF_DESCR, IF_TYPE};
use crate::collector::trunk::IF_STACK_STATUS;
use crate::collector::{walk_indexed, NormPort};
use crate::error::CollectorError;
use crate::model::{Equipment, Vlan, VlanScope};
use crate::oid::Oid;
use crate::snmp::Session;

pub const DOT1Q_VLAN_STATIC_NAME: &[u32] = &[1, 3, 6, 1, 2, 1, 17, 7, 1, 4, 3, 1, 1];
pub const DOT1Q_VLAN_CURRENT_EGRESS_PORTS: &[u32] = &[1, 3, 6, 1, 2, 1, 17, 7, 1, 4, 2, 1, 4];

/// ifType value marking a VLAN pseudo-interface.
const L2_VLAN: i64 = 135;

/// Port-set octet strings put the most significant bit of octet 0 first:
/// bit j of octet i (j being the 1<<j exponent) is port `7 - j + 8*i`.
pub(crate) fn decode_port_bitmask(bytes: &[u8]) -> Vec<i64> {
    let mut ports = Vec::new();
    for (i, &byte) in bytes.iter().enumerate() {
        if byte == 0 {
            continue;
        }
        for j in (0u32..8).rev() {
            if byte & (1u8 << j) != 0 {
                ports.push(i64::from(7 - j) + 8 * i as i64);
            }
        }
    }
    ports
}

/// Two parallel tables keyed by VLAN id: names and membership bitmasks.
pub struct VlanTableCollector {
    names: Oid,
    members: Oid,
}

impl VlanTableCollector {
    pub fn rfc2674() -> Self {
        VlanTableCollector {
            names: Oid::from_arcs(DOT1Q_VLAN_STATIC_NAME),
            members: Oid::from_arcs(DOT1Q_VLAN_CURRENT_EGRESS_PORTS),
        }
    }

    /// Vendor table pair with the same layout (Nortel rcVlan*).
    pub fn new(names: &[u32], members: &[u32]) -> Self {
        VlanTableCollector {
            names: Oid::from_arcs(names),
            members: Oid::from_arcs(members),
        }
    }

    pub async fn collect(
        &self,
        session: &Session,
        equipment: &mut Equipment,
        normport: NormPort<'_>,
    ) -> Result<(), CollectorError> {
        log::debug!("collecting vlans for {}", equipment.ip);
        let mut names: BTreeMap<i64, String> = BTreeMap::new();
        for (oid, value) in session.walk(&self.names).await? {
            let Some(&vid) = oid.arcs().last() else {
                continue;
            };
            if let Some(name) = value.as_str() {
                names.insert(i64::from(vid), name);
            }
        }
        for (oid, value) in session.walk(&self.members).await? {
            let Some(&vid) = oid.arcs().last() else {
                continue;
            };
            let vid = i64::from(vid);
            // a mask without a matching name is not a usable vlan
            let Some(name) = names.get(&vid) else {
                continue;
            };
            let Some(mask) = value.as_bytes() else {
                continue;
            };
            for raw in decode_port_bitmask(mask) {
                let Some(index) = normport(raw) else {
                    continue;
                };
                if let Some(port) = equipment.port_mut(index) {
                    port.vlans.insert(Vlan {
                        vid,
                        name: name.clone(),
                        scope: VlanScope::Local,
                    });
                }
            }
        }
        Ok(())
    }
}

/// VLANs modelled as l2vlan interfaces: the tag is embedded in the
/// description and membership comes from ifStackStatus.
pub struct IfMibVlanCollector;

impl IfMibVlanCollector {
    pub async fn collect(
        &self,
        session: &Session,
        equipment: &mut Equipment,
        normport: NormPort<'_>,
    ) -> Result<(), CollectorError> {
        log::debug!("collecting ifmib vlans for {}", equipment.ip);
        let mut pseudo: BTreeMap<i64, (i64, String)> = BTreeMap::new();
        let vlan_interfaces: Vec<i64> = walk_indexed(session, IF_TYPE)
            .await?
            .into_iter()
            .filter(|(_, value)| value.as_i64() == Some(L2_VLAN))
            .map(|(index, _)| index)
            .collect();
        if let Ok(tag) = Regex::new(r"[0-9]+") {
            for (index, value) in walk_indexed(session, IF_DESCR).await? {
                if !vlan_interfaces.contains(&index) {
                    continue;
                }
                let Some(descr) = value.as_str() else {
                    continue;
                };
                let descr = descr.trim().to_string();
                let Some(vid) = tag
                    .find(&descr)
                    .and_then(|m| m.as_str().parse::<i64>().ok())
                else {
                    continue;
                };
                pseudo.insert(index, (vid, descr));
            }
        }
        for (oid, _) in session.walk(&Oid::from_arcs(IF_STACK_STATUS)).await? {
            let arcs = oid.arcs();
            if arcs.len() < 2 {
                continue;
            }
            let higher = i64::from(arcs[arcs.len() - 2]);
            let member = i64::from(arcs[arcs.len() - 1]);
            let Some((vid, name)) = pseudo.get(&higher) else {
                continue;
            };
            if member == 0 {
                continue;
            }
            let Some(index) = normport(member) else {
                continue;
            };
            if let Some(port) = equipment.port_mut(index) {
                port.vlans.insert(Vlan {
                    vid: *vid,
                    name: name.clone(),
                    scope: VlanScope::Local,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Port;
    use crate::snmp::transport::fake::FakeAgent;
    use crate::snmp::{Value, Version};
    use std::net::Ipv4Addr;
    use std::sync::Arc;

    #[test]
    fn bitmask_convention() {
        assert_eq!(decode_port_bitmask(&[0x80]), vec![0]);
        assert_eq!(decode_port_bitmask(&[0x00, 0x01]), vec![15]);
        assert_eq!(decode_port_bitmask(&[0x81]), vec![0, 7]);
        assert_eq!(decode_port_bitmask(&[0x00, 0xc0]), vec![8, 9]);
        assert!(decode_port_bitmask(&[]).is_empty());
    }

    fn equipment_with_ports(indexes: &[i64]) -> Equipment {
        let mut eq = Equipment::new(
            Ipv4Addr::new(192, 0, 2, 40),
            "sw1",
            Oid::from_arcs(&[1, 3, 6, 1, 4, 1, 4242, 1]),
            "fixture",
        );
        for &i in indexes {
            eq.ports.insert(i, Port::named(&i.to_string()));
        }
        eq
    }

    #[tokio::test]
    async fn pairs_names_with_masks() {
        let mut agent = FakeAgent::new("public");
        agent.insert_str("1.3.6.1.2.1.17.7.1.4.3.1.1.12", "users");
        // egress table carries a time-mark arc before the vid
        agent.insert(
            "1.3.6.1.2.1.17.7.1.4.2.1.4.0.12",
            Value::OctetString(vec![0xc0]),
        );
        agent.insert(
            "1.3.6.1.2.1.17.7.1.4.2.1.4.0.13",
            Value::OctetString(vec![0x80]),
        );
        let session = Session::new(Arc::new(agent), Version::V2c, "public");
        let mut eq = equipment_with_ports(&[0, 1]);
        VlanTableCollector::rfc2674()
            .collect(&session, &mut eq, &|p| Some(p))
            .await
            .unwrap();
        let expected = Vlan {
            vid: 12,
            name: "users".to_string(),
            scope: VlanScope::Local,
        };
        assert!(eq.ports[&0].vlans.contains(&expected));
        assert!(eq.ports[&1].vlans.contains(&expected));
        // vid 13 has no name row and is dropped
        assert_eq!(eq.ports[&0].vlans.len(), 1);
    }

    #[tokio::test]
    async fn pseudo_interfaces_tag_their_members() {
        let mut agent = FakeAgent::new("public");
        agent.insert_int("1.3.6.1.2.1.2.2.1.3.1", 6);
        agent.insert_int("1.3.6.1.2.1.2.2.1.3.2", 6);
        agent.insert_int("1.3.6.1.2.1.2.2.1.3.100", 135);
        agent.insert_str("1.3.6.1.2.1.2.2.1.2.100", "VLAN0042");
        agent.insert_int("1.3.6.1.2.1.31.1.2.1.3.100.1", 1);
        agent.insert_int("1.3.6.1.2.1.31.1.2.1.3.100.2", 1);
        agent.insert_int("1.3.6.1.2.1.31.1.2.1.3.100.0", 1);
        let session = Session::new(Arc::new(agent), Version::V2c, "public");
        let mut eq = equipment_with_ports(&[1, 2]);
        IfMibVlanCollector
            .collect(&session, &mut eq, &|p| Some(p))
            .await
            .unwrap();
        for index in [1, 2] {
            let vlan = eq.ports[&index].vlans.iter().next().unwrap();
            assert_eq!(vlan.vid, 42);
            assert_eq!(vlan.name, "VLAN0042");
            assert_eq!(vlan.scope, VlanScope::Local);
        }
    }
}
