//! Cisco pipelines: Catalyst style switches and the CSS load balancers.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use crate::collector::arp::ArpCollector;
use crate::collector::cdp::CdpCollector;
use crate::collector::fdb::{CommunityFdbCollector, FdbCollector};
use crate::collector::ports::{PortCollector, IF_ALIAS, IF_NAME};
use crate::collector::vlan::decode_port_bitmask;
use crate::collector::{walk_indexed, DevicePlugin};
use crate::error::CollectorError;
use crate::model::{Equipment, Vlan, VlanScope};
use crate::oid::Oid;
use crate::snmp::Session;

const CISCO: &[u32] = &[1, 3, 6, 1, 4, 1, 9];
const CSS: &[u32] = &[1, 3, 6, 1, 4, 1, 9, 9, 368];

pub const PAGP_ETHC_OPERATION_MODE: &[u32] = &[1, 3, 6, 1, 4, 1, 9, 9, 98, 1, 1, 1, 1, 1];
pub const PAGP_GROUP_IFINDEX: &[u32] = &[1, 3, 6, 1, 4, 1, 9, 9, 98, 1, 1, 1, 1, 8];
pub const VTP_VLAN_NAME: &[u32] = &[1, 3, 6, 1, 4, 1, 9, 9, 46, 1, 3, 1, 1, 4];
pub const VLAN_TRUNK_PORT_DYNAMIC_STATUS: &[u32] =
    &[1, 3, 6, 1, 4, 1, 9, 9, 46, 1, 6, 1, 1, 14];
pub const VLAN_TRUNK_PORT_NATIVE_VLAN: &[u32] = &[1, 3, 6, 1, 4, 1, 9, 9, 46, 1, 6, 1, 1, 5];
pub const VM_VLAN: &[u32] = &[1, 3, 6, 1, 4, 1, 9, 9, 68, 1, 2, 2, 1, 2];

/// Trunk membership masks, one table per block of 1024 vlan ids.
const VLAN_TRUNK_PORT_VLANS_ENABLED: [&[u32]; 4] = [
    &[1, 3, 6, 1, 4, 1, 9, 9, 46, 1, 6, 1, 1, 4],
    &[1, 3, 6, 1, 4, 1, 9, 9, 46, 1, 6, 1, 1, 17],
    &[1, 3, 6, 1, 4, 1, 9, 9, 46, 1, 6, 1, 1, 18],
    &[1, 3, 6, 1, 4, 1, 9, 9, 46, 1, 6, 1, 1, 19],
];

/// Reserved VTP vlans that never carry traffic.
const VLAN_DENY: &[&str] = &[
    "fddi-default",
    "token-ring-default",
    "fddinet-default",
    "trnet-default",
];

pub struct CiscoPlugin;
pub struct CiscoCssPlugin;

#[async_trait]
impl DevicePlugin for CiscoPlugin {
    fn name(&self) -> &'static str {
        "cisco"
    }

    fn handles(&self, sysobjectid: &Oid) -> bool {
        sysobjectid.starts_with(&Oid::from_arcs(CISCO))
            && !sysobjectid.starts_with(&Oid::from_arcs(CSS))
    }

    async fn collect(
        &self,
        session: &mut Session,
        equipment: &mut Equipment,
    ) -> Result<(), CollectorError> {
        // ifDescr is useless on a Catalyst; take the configured
        // description as the name and fall back to ifName.
        run_pipeline(
            session,
            equipment,
            PortCollector::with_sources(IF_ALIAS, IF_NAME),
        )
        .await
    }
}

#[async_trait]
impl DevicePlugin for CiscoCssPlugin {
    fn name(&self) -> &'static str {
        "cisco-css"
    }

    fn handles(&self, sysobjectid: &Oid) -> bool {
        sysobjectid.starts_with(&Oid::from_arcs(CSS))
    }

    async fn collect(
        &self,
        session: &mut Session,
        equipment: &mut Equipment,
    ) -> Result<(), CollectorError> {
        run_pipeline(session, equipment, PortCollector::new()).await
    }
}

async fn run_pipeline(
    session: &mut Session,
    equipment: &mut Equipment,
    ports: PortCollector,
) -> Result<(), CollectorError> {
    let trunks = PagpTrunkCollector.collect(session).await?;
    ports.collect(session, equipment, &trunks).await?;
    ArpCollector.collect(session, equipment).await?;
    let mut fdb = FdbCollector::new();
    CommunityFdbCollector::new(VTP_VLAN_NAME, VLAN_DENY)
        .collect(session, equipment, &mut fdb, &|p| Some(p))
        .await?;
    CdpCollector.collect(session, equipment).await?;
    CiscoVlanCollector.collect(session, equipment).await
}

/// Ether-channel membership from CISCO-PAGP-MIB.
pub struct PagpTrunkCollector;

impl PagpTrunkCollector {
    pub async fn collect(
        &self,
        session: &Session,
    ) -> Result<BTreeMap<i64, Vec<i64>>, CollectorError> {
        let mut bundled = BTreeSet::new();
        for (port, value) in walk_indexed(session, PAGP_ETHC_OPERATION_MODE).await? {
            // off(1) means no channel on this port
            if value.as_i64() != Some(1) {
                bundled.insert(port);
            }
        }
        let mut trunks: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for (port, value) in walk_indexed(session, PAGP_GROUP_IFINDEX).await? {
            if !bundled.contains(&port) {
                continue;
            }
            if let Some(group) = value.as_i64() {
                trunks.entry(group).or_default().push(port);
            }
        }
        // group 0 and channels still only containing themselves are noise
        trunks.retain(|group, members| {
            *group != 0 && !(members.len() == 1 && members[0] == *group)
        });
        Ok(trunks)
    }
}

/// Per-port vlans from CISCO-VTP-MIB and CISCO-VLAN-MEMBERSHIP-MIB.
///
/// Trunking ports get the vlans enabled on the trunk; access ports get
/// their membership vlan, or the trunk native vlan as a last resort.
pub struct CiscoVlanCollector;

impl CiscoVlanCollector {
    pub async fn collect(
        &self,
        session: &Session,
        equipment: &mut Equipment,
    ) -> Result<(), CollectorError> {
        log::debug!("collecting vtp vlans for {}", equipment.ip);
        let mut names: BTreeMap<i64, String> = BTreeMap::new();
        for (vid, value) in walk_indexed(session, VTP_VLAN_NAME).await? {
            if let Some(name) = value.as_str() {
                names.insert(vid, name);
            }
        }

        let mut trunking = BTreeSet::new();
        for (port, value) in walk_indexed(session, VLAN_TRUNK_PORT_DYNAMIC_STATUS).await? {
            // trunking(1)
            if value.as_i64() == Some(1) {
                trunking.insert(port);
            }
        }

        let mut vlans: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for (range, base) in VLAN_TRUNK_PORT_VLANS_ENABLED.into_iter().enumerate() {
            for (port, value) in walk_indexed(session, base).await? {
                if !trunking.contains(&port) {
                    continue;
                }
                // a trunking port gets its entry even when the mask is
                // empty, to keep the native vlan fallback away
                let members = vlans.entry(port).or_default();
                if let Some(bytes) = value.as_bytes() {
                    let offset = 1024 * range as i64;
                    members.extend(
                        decode_port_bitmask(bytes).into_iter().map(|vid| vid + offset),
                    );
                }
            }
        }

        // access ports: membership vlan first, then the native vlan
        for base in [VM_VLAN, VLAN_TRUNK_PORT_NATIVE_VLAN] {
            for (port, value) in walk_indexed(session, base).await? {
                if vlans.contains_key(&port) {
                    continue;
                }
                if let Some(vid) = value.as_i64() {
                    vlans.insert(port, vec![vid]);
                }
            }
        }

        for (index, vids) in vlans {
            let Some(port) = equipment.port_mut(index) else {
                continue;
            };
            for vid in vids {
                if let Some(name) = names.get(&vid) {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Port;
    use crate::snmp::transport::fake::FakeAgent;
    use crate::snmp::Version;
    use std::net::Ipv4Addr;
    use std::sync::Arc;

    fn equipment() -> Equipment {
        Equipment::new(
            Ipv4Addr::new(192, 0, 2, 130),
            "c3750",
            Oid::from_arcs(&[1, 3, 6, 1, 4, 1, 9, 1, 516]),
            "fixture",
        )
    }

    #[test]
    fn css_and_classic_predicates_are_disjoint() {
        let catalyst: Oid = "1.3.6.1.4.1.9.1.516".parse().unwrap();
        let css: Oid = "1.3.6.1.4.1.9.9.368.4.2".parse().unwrap();
        assert!(CiscoPlugin.handles(&catalyst));
        assert!(!CiscoPlugin.handles(&css));
        assert!(CiscoCssPlugin.handles(&css));
        assert!(!CiscoCssPlugin.handles(&catalyst));
    }

    #[tokio::test]
    async fn pagp_groups_become_trunks() {
        let mut agent = FakeAgent::new("public");
        agent.insert_int("1.3.6.1.4.1.9.9.98.1.1.1.1.1.1", 2);
        agent.insert_int("1.3.6.1.4.1.9.9.98.1.1.1.1.1.2", 2);
        agent.insert_int("1.3.6.1.4.1.9.9.98.1.1.1.1.1.3", 1);
        agent.insert_int("1.3.6.1.4.1.9.9.98.1.1.1.1.1.9", 2);
        agent.insert_int("1.3.6.1.4.1.9.9.98.1.1.1.1.8.1", 5);
        agent.insert_int("1.3.6.1.4.1.9.9.98.1.1.1.1.8.2", 5);
        agent.insert_int("1.3.6.1.4.1.9.9.98.1.1.1.1.8.3", 6);
        // a channel that only contains itself is not formed yet
        agent.insert_int("1.3.6.1.4.1.9.9.98.1.1.1.1.8.9", 9);

        let session = Session::new(Arc::new(agent), Version::V2c, "public");
        let trunks = PagpTrunkCollector.collect(&session).await.unwrap();
        assert_eq!(trunks.len(), 1);
        assert_eq!(trunks[&5], vec![1, 2]);
    }

    #[tokio::test]
    async fn trunking_ports_get_ranged_vlans_and_access_ports_their_vlan() {
        let mut agent = FakeAgent::new("public");
        agent.insert_str("1.3.6.1.4.1.9.9.46.1.3.1.1.4.1", "default");
        agent.insert_str("1.3.6.1.4.1.9.9.46.1.3.1.1.4.7", "users");
        agent.insert_str("1.3.6.1.4.1.9.9.46.1.3.1.1.4.1031", "storage");
        // port 1 trunks, port 2 is an access port in vlan 7
        agent.insert_int("1.3.6.1.4.1.9.9.46.1.6.1.1.14.1", 1);
        agent.insert_bytes("1.3.6.1.4.1.9.9.46.1.6.1.1.4.1", &[0x01]);
        agent.insert_bytes("1.3.6.1.4.1.9.9.46.1.6.1.1.17.1", &[0x01]);
        agent.insert_int("1.3.6.1.4.1.9.9.46.1.6.1.1.5.1", 1);
        agent.insert_int("1.3.6.1.4.1.9.9.68.1.2.2.1.2.2", 7);

        let session = Session::new(Arc::new(agent), Version::V2c, "public");
        let mut eq = equipment();
        eq.ports.insert(1, Port::named("Gi1/0/1"));
        eq.ports.insert(2, Port::named("Gi1/0/2"));
        CiscoVlanCollector.collect(&session, &mut eq).await.unwrap();

        let trunk_vids: Vec<i64> = eq.ports[&1].vlans.iter().map(|v| v.vid).collect();
        assert_eq!(trunk_vids, vec![7, 1031]);
        let access: Vec<i64> = eq.ports[&2].vlans.iter().map(|v| v.vid).collect();
        assert_eq!(access, vec![7]);
    }

    #[tokio::test]
    async fn empty_trunk_mask_blocks_the_native_vlan() {
        let mut agent = FakeAgent::new("public");
        agent.insert_str("1.3.6.1.4.1.9.9.46.1.3.1.1.4.9", "native");
        agent.insert_int("1.3.6.1.4.1.9.9.46.1.6.1.1.14.3", 1);
        agent.insert_bytes("1.3.6.1.4.1.9.9.46.1.6.1.1.4.3", &[]);
        agent.insert_int("1.3.6.1.4.1.9.9.46.1.6.1.1.5.3", 9);
        // port 4 never trunked, native vlan applies
        agent.insert_int("1.3.6.1.4.1.9.9.46.1.6.1.1.5.4", 9);

        let session = Session::new(Arc::new(agent), Version::V2c, "public");
        let mut eq = equipment();
        eq.ports.insert(3, Port::named("Gi1/0/3"));
        eq.ports.insert(4, Port::named("Gi1/0/4"));
        CiscoVlanCollector.collect(&session, &mut eq).await.unwrap();

        assert!(eq.ports[&3].vlans.is_empty());
        let vids: Vec<i64> = eq.ports[&4].vlans.iter().map(|v| v.vid).collect();
        assert_eq!(vids, vec![9]);
    }

    #[tokio::test]
    async fn classic_pipeline_names_ports_from_the_description() {
        let mut agent = FakeAgent::new("public");
        agent.insert_int("1.3.6.1.2.1.2.2.1.3.1", 6);
        agent.insert_int("1.3.6.1.2.1.2.2.1.3.2", 6);
        agent.insert_str("1.3.6.1.2.1.31.1.1.1.1.1", "Gi1/0/1");
        agent.insert_str("1.3.6.1.2.1.31.1.1.1.1.2", "Gi1/0/2");
        agent.insert_str("1.3.6.1.2.1.31.1.1.1.18.1", "uplink to core");
        agent.insert_int("1.3.6.1.2.1.2.2.1.8.1", 1);
        agent.insert_int("1.3.6.1.2.1.2.2.1.8.2", 1);

        let mut session = Session::new(Arc::new(agent), Version::V2c, "public");
        let mut eq = equipment();
        CiscoPlugin.collect(&mut session, &mut eq).await.unwrap();

        // described ports show the description, the rest show ifName
        assert_eq!(eq.ports[&1].name, "uplink to core");
        assert_eq!(eq.ports[&2].name, "Gi1/0/2");
    }
}
