//! EDP neighbor discovery (Extreme Discovery Protocol).

use std::collections::BTreeMap;

use crate::collector::NormPort;
use crate::error::CollectorError;
use crate::model::{Edp, Equipment, Vlan, VlanScope};
use crate::oid::Oid;
use crate::snmp::{Session, Value};

pub const EDP_NEIGHBOR_NAME: &[u32] = &[1, 3, 6, 1, 4, 1, 1916, 1, 13, 2, 1, 3];
pub const EDP_NEIGHBOR_SLOT: &[u32] = &[1, 3, 6, 1, 4, 1, 1916, 1, 13, 2, 1, 5];
pub const EDP_NEIGHBOR_PORT: &[u32] = &[1, 3, 6, 1, 4, 1, 1916, 1, 13, 2, 1, 6];
pub const EDP_NEIGHBOR_VLAN_ID: &[u32] = &[1, 3, 6, 1, 4, 1, 1916, 1, 13, 3, 1, 2];

pub struct EdpCollector;

impl EdpCollector {
    pub async fn collect(
        &self,
        session: &Session,
        equipment: &mut Equipment,
        normport: NormPort<'_>,
    ) -> Result<(), CollectorError> {
        log::debug!("collecting edp for {}", equipment.ip);
        let sysnames = self.neighbor_strings(session, EDP_NEIGHBOR_NAME, normport).await?;
        let slots = self.neighbor_integers(session, EDP_NEIGHBOR_SLOT, normport).await?;
        let remote_ports = self.neighbor_integers(session, EDP_NEIGHBOR_PORT, normport).await?;

        for (index, sysname) in sysnames {
            let (Some(slot), Some(remote_port)) =
                (slots.get(&index), remote_ports.get(&index))
            else {
                continue;
            };
            if let Some(port) = equipment.port_mut(index) {
                port.edp = Some(Edp {
                    sysname,
                    slot: *slot,
                    port: *remote_port,
                });
            }
        }

        self.remote_vlans(session, equipment, normport).await
    }

    async fn neighbor_strings(
        &self,
        session: &Session,
        base: &[u32],
        normport: NormPort<'_>,
    ) -> Result<BTreeMap<i64, String>, CollectorError> {
        let mut out = BTreeMap::new();
        for (index, value) in self.neighbor_rows(session, base, normport).await? {
            if let Some(text) = value.as_str() {
                if !text.is_empty() {
                    out.insert(index, text);
                }
            }
        }
        Ok(out)
    }

    async fn neighbor_integers(
        &self,
        session: &Session,
        base: &[u32],
        normport: NormPort<'_>,
    ) -> Result<BTreeMap<i64, i64>, CollectorError> {
        let mut out = BTreeMap::new();
        for (index, value) in self.neighbor_rows(session, base, normport).await? {
            if let Some(v) = value.as_i64() {
                if v != 0 {
                    out.insert(index, v);
                }
            }
        }
        Ok(out)
    }

    /// The local port is the first index arc of every edpNeighbor table.
    async fn neighbor_rows(
        &self,
        session: &Session,
        base: &[u32],
        normport: NormPort<'_>,
    ) -> Result<Vec<(i64, Value)>, CollectorError> {
        let base = Oid::from_arcs(base);
        let mut rows = Vec::new();
        for (oid, value) in session.walk(&base).await? {
            let Some(suffix) = oid.suffix(&base) else {
                continue;
            };
            let Some(&port) = suffix.first() else {
                continue;
            };
            if let Some(index) = normport(i64::from(port)) {
                rows.push((index, value));
            }
        }
        Ok(rows)
    }

    /// The VLAN name is spelled out arc by arc at the tail of the
    /// edpNeighborVlanId index; the id itself is the walked value.
    async fn remote_vlans(
        &self,
        session: &Session,
        equipment: &mut Equipment,
        normport: NormPort<'_>,
    ) -> Result<(), CollectorError> {
        let base = Oid::from_arcs(EDP_NEIGHBOR_VLAN_ID);
        for (oid, value) in session.walk(&base).await? {
            let Some(suffix) = oid.suffix(&base) else {
                continue;
            };
            let Some(&port) = suffix.first() else {
                continue;
            };
            let Some(index) = normport(i64::from(port)) else {
                continue;
            };
            let Some(vid) = value.as_i64() else {
                continue;
            };
            let name: String = suffix
                .iter()
                .skip(10)
                .filter_map(|&a| u8::try_from(a).ok().map(char::from))
                .collect();
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
