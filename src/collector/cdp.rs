//! CDP neighbor cache, Cisco only.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use crate::error::CollectorError;
use crate::model::{Cdp, Equipment};
use crate::oid::Oid;
use crate::snmp::{Session, Value};

pub const CDP_CACHE_ADDRESS_TYPE: &[u32] = &[1, 3, 6, 1, 4, 1, 9, 9, 23, 1, 2, 1, 1, 3];
pub const CDP_CACHE_ADDRESS: &[u32] = &[1, 3, 6, 1, 4, 1, 9, 9, 23, 1, 2, 1, 1, 4];
pub const CDP_CACHE_DEVICE_ID: &[u32] = &[1, 3, 6, 1, 4, 1, 9, 9, 23, 1, 2, 1, 1, 6];
pub const CDP_CACHE_DEVICE_PORT: &[u32] = &[1, 3, 6, 1, 4, 1, 9, 9, 23, 1, 2, 1, 1, 7];
pub const CDP_CACHE_PLATFORM: &[u32] = &[1, 3, 6, 1, 4, 1, 9, 9, 23, 1, 2, 1, 1, 8];

pub struct CdpCollector;

impl CdpCollector {
    pub async fn collect(
        &self,
        session: &Session,
        equipment: &mut Equipment,
    ) -> Result<(), CollectorError> {
        log::debug!("collecting cdp for {}", equipment.ip);
        let sysnames = self.strings(session, CDP_CACHE_DEVICE_ID).await?;
        let remote_ports = self.strings(session, CDP_CACHE_DEVICE_PORT).await?;
        let platforms = self.strings(session, CDP_CACHE_PLATFORM).await?;
        let address_types = self.integers(session, CDP_CACHE_ADDRESS_TYPE).await?;
        let addresses = self.bytes(session, CDP_CACHE_ADDRESS).await?;

        for (index, sysname) in sysnames {
            let (Some(remote_port), Some(platform), Some(kind), Some(address)) = (
                remote_ports.get(&index),
                platforms.get(&index),
                address_types.get(&index),
                addresses.get(&index),
            ) else {
                continue;
            };
            // only ipV4(1) addresses are usable
            let ip = match (kind, address.as_slice()) {
                (1, [a, b, c, d]) => Ipv4Addr::new(*a, *b, *c, *d),
                _ => Ipv4Addr::UNSPECIFIED,
            };
            if let Some(port) = equipment.port_mut(index) {
                port.cdp = Some(Cdp {
                    sysname,
                    port: remote_port.clone(),
                    ip,
                    platform: platform.clone(),
                });
            }
        }
        Ok(())
    }

    async fn strings(
        &self,
        session: &Session,
        base: &[u32],
    ) -> Result<BTreeMap<i64, String>, CollectorError> {
        let mut out = BTreeMap::new();
        for (index, value) in self.cache_rows(session, base).await? {
            if let Some(text) = value.as_str() {
                if !text.is_empty() {
                    out.insert(index, text);
                }
            }
        }
        Ok(out)
    }

    async fn integers(
        &self,
        session: &Session,
        base: &[u32],
    ) -> Result<BTreeMap<i64, i64>, CollectorError> {
        let mut out = BTreeMap::new();
        for (index, value) in self.cache_rows(session, base).await? {
            if let Some(v) = value.as_i64() {
                if v != 0 {
                    out.insert(index, v);
                }
            }
        }
        Ok(out)
    }

    async fn bytes(
        &self,
        session: &Session,
        base: &[u32],
    ) -> Result<BTreeMap<i64, Vec<u8>>, CollectorError> {
        let mut out = BTreeMap::new();
        for (index, value) in self.cache_rows(session, base).await? {
            if let Some(b) = value.as_bytes() {
                if !b.is_empty() {
                    out.insert(index, b.to_vec());
                }
            }
        }
        Ok(out)
    }

    /// cdpCache tables are indexed by (ifIndex, deviceIndex); the local
    /// port is the first index arc.
    async fn cache_rows(
        &self,
        session: &Session,
        base: &[u32],
    ) -> Result<Vec<(i64, Value)>, CollectorError> {
        let base = Oid::from_arcs(base);
        let mut rows = Vec::new();
        for (oid, value) in session.walk(&base).await? {
            if let Some(suffix) = oid.suffix(&base) {
                if let Some(&port) = suffix.first() {
                    rows.push((i64::from(port), value));
                }
            }
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Port;
    use crate::snmp::transport::fake::FakeAgent;
    use crate::snmp::Version;
    use std::sync::Arc;

    #[tokio::test]
    async fn neighbors_are_attached_per_port() {
        let mut agent = FakeAgent::new("public");
        agent.insert_str("1.3.6.1.4.1.9.9.23.1.2.1.1.6.3.1", "c2960-lab");
        agent.insert_str("1.3.6.1.4.1.9.9.23.1.2.1.1.7.3.1", "FastEthernet0/12");
        agent.insert_str("1.3.6.1.4.1.9.9.23.1.2.1.1.8.3.1", "cisco WS-C2960-24TT-L");
        agent.insert_int("1.3.6.1.4.1.9.9.23.1.2.1.1.3.3.1", 1);
        agent.insert_bytes("1.3.6.1.4.1.9.9.23.1.2.1.1.4.3.1", &[10, 1, 2, 3]);
        // port 4 misses the platform string, no fact
        agent.insert_str("1.3.6.1.4.1.9.9.23.1.2.1.1.6.4.1", "partial");
        agent.insert_str("1.3.6.1.4.1.9.9.23.1.2.1.1.7.4.1", "Gi0/1");
        agent.insert_int("1.3.6.1.4.1.9.9.23.1.2.1.1.3.4.1", 1);
        agent.insert_bytes("1.3.6.1.4.1.9.9.23.1.2.1.1.4.4.1", &[10, 1, 2, 4]);

        let session = Session::new(Arc::new(agent), Version::V2c, "public");
        let mut eq = Equipment::new(
            Ipv4Addr::new(192, 0, 2, 60),
            "c3750",
            Oid::from_arcs(&[1, 3, 6, 1, 4, 1, 9, 1, 516]),
            "fixture",
        );
        eq.ports.insert(3, Port::named("Gi1/0/3"));
        eq.ports.insert(4, Port::named("Gi1/0/4"));
        CdpCollector.collect(&session, &mut eq).await.unwrap();

        let fact = eq.ports[&3].cdp.as_ref().unwrap();
        assert_eq!(fact.sysname, "c2960-lab");
        assert_eq!(fact.port, "FastEthernet0/12");
        assert_eq!(fact.ip, Ipv4Addr::new(10, 1, 2, 3));
        assert_eq!(fact.platform, "cisco WS-C2960-24TT-L");
        assert!(eq.ports[&4].cdp.is_none());
    }

    #[tokio::test]
    async fn non_ip_neighbors_get_the_unspecified_address() {
        let mut agent = FakeAgent::new("public");
        agent.insert_str("1.3.6.1.4.1.9.9.23.1.2.1.1.6.7.1", "ipx-thing");
        agent.insert_str("1.3.6.1.4.1.9.9.23.1.2.1.1.7.7.1", "Se0/0");
        agent.insert_str("1.3.6.1.4.1.9.9.23.1.2.1.1.8.7.1", "cisco 2611");
        agent.insert_int("1.3.6.1.4.1.9.9.23.1.2.1.1.3.7.1", 2);
        agent.insert_bytes("1.3.6.1.4.1.9.9.23.1.2.1.1.4.7.1", &[1, 2, 3, 4, 5, 6]);

        let session = Session::new(Arc::new(agent), Version::V2c, "public");
        let mut eq = Equipment::new(
            Ipv4Addr::new(192, 0, 2, 61),
            "c7200",
            Oid::from_arcs(&[1, 3, 6, 1, 4, 1, 9, 1, 108]),
            "fixture",
        );
        eq.ports.insert(7, Port::named("Se0/1"));
        CdpCollector.collect(&session, &mut eq).await.unwrap();
        assert_eq!(
            eq.ports[&7].cdp.as_ref().unwrap().ip,
            Ipv4Addr::UNSPECIFIED
        );
    }
}
