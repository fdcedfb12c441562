//! IP-MIB ARP table collector.

use std::net::Ipv4Addr;

use crate::error::CollectorError;
use crate::model::{format_mac, Equipment};
use crate::oid::Oid;
use crate::snmp::Session;

pub const IP_NET_TO_MEDIA_PHYS_ADDRESS: &[u32] = &[1, 3, 6, 1, 2, 1, 4, 22, 1, 2];

pub struct ArpCollector;

impl ArpCollector {
    pub async fn collect(
        &self,
        session: &Session,
        equipment: &mut Equipment,
    ) -> Result<(), CollectorError> {
        log::debug!("collecting arp for {}", equipment.ip);
        let base = Oid::from_arcs(IP_NET_TO_MEDIA_PHYS_ADDRESS);
        for (oid, value) in session.walk(&base).await? {
            let Some(ip) = ip_from_oid(&oid) else {
                continue;
            };
            let Some(mac) = value.as_bytes().and_then(format_mac) else {
                continue;
            };
            equipment.arp.insert(ip, mac);
        }
        Ok(())
    }
}

/// The IP address is the last 4 index arcs of the row OID.
fn ip_from_oid(oid: &Oid) -> Option<Ipv4Addr> {
    let arcs = oid.arcs();
    if arcs.len() < 4 {
        return None;
    }
    let tail = &arcs[arcs.len() - 4..];
    let octets: Vec<u8> = tail.iter().filter_map(|&a| u8::try_from(a).ok()).collect();
    if octets.len() != 4 {
        return None;
    }
    Some(Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::transport::fake::FakeAgent;
    use crate::snmp::Version;
    use std::sync::Arc;

    #[tokio::test]
    async fn fills_the_arp_table() {
        let mut agent = FakeAgent::new("public");
        agent.insert_bytes(
            "1.3.6.1.2.1.4.22.1.2.1.10.1.2.3",
            &[0x00, 0x1b, 0x2c, 0x00, 0x00, 0x09],
        );
        agent.insert_bytes("1.3.6.1.2.1.4.22.1.2.1.10.1.2.4", &[0x00, 0x1b]);
        let session = Session::new(Arc::new(agent), Version::V2c, "public");
        let mut eq = Equipment::new(
            Ipv4Addr::new(192, 0, 2, 30),
            "rt1",
            Oid::from_arcs(&[1, 3, 6, 1, 4, 1, 4242, 1]),
            "fixture",
        );
        ArpCollector.collect(&session, &mut eq).await.unwrap();
        assert_eq!(
            eq.arp.get(&Ipv4Addr::new(10, 1, 2, 3)).map(String::as_str),
            Some("00:1b:2c:00:00:09")
        );
        // truncated hardware addresses are dropped
        assert!(!eq.arp.contains_key(&Ipv4Addr::new(10, 1, 2, 4)));
    }
}
