//! IF-MIB interface inventory. Runs first in every pipeline; all other
//! collectors attach facts to the ports admitted here.

use std::collections::BTreeMap;

use crate::collector::walk_indexed;
use crate::error::CollectorError;
use crate::model::{format_mac, Equipment, Port, PortState, Trunk};
use crate::oid::Oid;
use crate::snmp::Session;

pub const IF_DESCR: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 2];
pub const IF_TYPE: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 3];
pub const IF_SPEED: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 5];
pub const IF_PHYS_ADDRESS: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 6];
pub const IF_OPER_STATUS: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 8];
pub const IF_NAME: &[u32] = &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 1];
pub const IF_HIGH_SPEED: &[u32] = &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 15];
pub const IF_ALIAS: &[u32] = &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 18];

/// ethernetCsmacd plus the obsolete fast/gigabit values.
const ETHERNET_TYPES: [i64; 4] = [6, 62, 69, 117];

/// ifSpeed saturates at 2^32-1; treat that as 10 Gbit/s.
const IF_SPEED_OVERFLOW: i64 = u32::MAX as i64;

pub struct PortCollector {
    name_source: Oid,
    alias_source: Oid,
}

impl Default for PortCollector {
    fn default() -> Self {
        PortCollector::new()
    }
}

impl PortCollector {
    pub fn new() -> Self {
        PortCollector {
            name_source: Oid::from_arcs(IF_DESCR),
            alias_source: Oid::from_arcs(IF_NAME),
        }
    }

    /// Vendor pipelines swap the columns that feed name and alias.
    pub fn with_sources(name_source: &[u32], alias_source: &[u32]) -> Self {
        PortCollector {
            name_source: Oid::from_arcs(name_source),
            alias_source: Oid::from_arcs(alias_source),
        }
    }

    /// Populate `equipment.ports`. `trunks` (aggregate -> members) admits
    /// aggregate interfaces that are not ethernet themselves and is turned
    /// into Trunk facts on the member ports.
    pub async fn collect(
        &self,
        session: &Session,
        equipment: &mut Equipment,
        trunks: &BTreeMap<i64, Vec<i64>>,
    ) -> Result<(), CollectorError> {
        log::debug!("collecting ports for {}", equipment.ip);

        let mut admitted = Vec::new();
        for (index, value) in walk_indexed(session, IF_TYPE).await? {
            let ethernet = value
                .as_i64()
                .map(|t| ETHERNET_TYPES.contains(&t))
                .unwrap_or(false);
            if ethernet || trunks.contains_key(&index) {
                admitted.push(index);
            }
        }

        let mut names: BTreeMap<i64, String> = BTreeMap::new();
        for (index, value) in session.walk(&self.name_source).await?.into_iter().filter_map(last_arc) {
            if !admitted.contains(&index) {
                continue;
            }
            if let Some(name) = value.as_str() {
                let name = name.trim().to_string();
                if !name.is_empty() {
                    names.insert(index, name);
                }
            }
        }
        let mut aliases: BTreeMap<i64, String> = BTreeMap::new();
        for (index, value) in session.walk(&self.alias_source).await?.into_iter().filter_map(last_arc) {
            if !admitted.contains(&index) {
                continue;
            }
            if let Some(alias) = value.as_str() {
                let alias = alias.trim().to_string();
                if !alias.is_empty() {
                    aliases.insert(index, alias);
                }
            }
        }

        for &index in &admitted {
            // a port with no name takes its alias; with neither it is dropped
            let name = match names.get(&index).or_else(|| aliases.get(&index)) {
                Some(name) => name.clone(),
                None => continue,
            };
            let mut port = Port::named(&name);
            port.alias = aliases.get(&index).cloned();
            equipment.ports.insert(index, port);
        }

        for (index, value) in walk_indexed(session, IF_OPER_STATUS).await? {
            if let Some(port) = equipment.port_mut(index) {
                port.state = if value.as_i64() == Some(1) {
                    PortState::Up
                } else {
                    PortState::Down
                };
            }
        }

        for (index, value) in walk_indexed(session, IF_PHYS_ADDRESS).await? {
            if let Some(port) = equipment.port_mut(index) {
                if let Some(mac) = value.as_bytes().and_then(format_mac) {
                    port.mac = Some(mac);
                }
            }
        }

        for (index, value) in walk_indexed(session, IF_SPEED).await? {
            if let Some(port) = equipment.port_mut(index) {
                if let Some(raw) = value.as_i64() {
                    let mbits = if raw == IF_SPEED_OVERFLOW {
                        10_000
                    } else {
                        raw / 1_000_000
                    };
                    if mbits > 0 {
                        port.speed = Some(mbits);
                    }
                }
            }
        }
        for (index, value) in walk_indexed(session, IF_HIGH_SPEED).await? {
            if let Some(port) = equipment.port_mut(index) {
                if let Some(mbits) = value.as_i64() {
                    if mbits > 0 {
                        port.speed = Some(mbits);
                    }
                }
            }
        }

        for (&aggregate, members) in trunks {
            for &member in members {
                if let Some(port) = equipment.port_mut(member) {
                    port.trunk = Some(Trunk { parent: aggregate });
                }
            }
        }
        Ok(())
    }
}

fn last_arc((oid, value): (Oid, crate::snmp::Value)) -> Option<(i64, crate::snmp::Value)> {
    let index = *oid.arcs().last()?;
    Some((i64::from(index), value))
}
