//! Per-MIB sub-collectors and the vendor pipelines built from them.

pub mod arp;
pub mod cdp;
pub mod cisco;
pub mod edp;
pub mod extreme;
pub mod fdb;
pub mod generic;
pub mod lldp;
pub mod mlt;
pub mod passport;
pub mod ports;
pub mod procurve;
pub mod sonmp;
pub mod trunk;
pub mod vlan;

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use crate::error::CollectorError;
use crate::model::{Duplex, Equipment};
use crate::oid::Oid;
use crate::snmp::Session;

/// Maps a vendor-reported port number onto an interface index, or
/// discards it by returning None.
pub type NormPort<'a> = &'a (dyn Fn(i64) -> Option<i64> + Send + Sync);

/// Normalizer admitting only interfaces the port collector kept.
pub fn keep_known(equipment: &Equipment) -> impl Fn(i64) -> Option<i64> + Send + Sync {
    let known: BTreeSet<i64> = equipment.ports.keys().copied().collect();
    move |port| known.contains(&port).then_some(port)
}

/// A vendor-specific polling pipeline, selected on sysObjectID.
#[async_trait]
pub trait DevicePlugin: Send + Sync {
    fn name(&self) -> &'static str;

    fn handles(&self, sysobjectid: &Oid) -> bool;

    /// Fill `equipment` from the device behind `session`. The session is
    /// mutable so pipelines can downgrade the version or swap the
    /// community string mid-run.
    async fn collect(
        &self,
        session: &mut Session,
        equipment: &mut Equipment,
    ) -> Result<(), CollectorError>;
}

/// All known pipelines, probed in registration order.
pub struct Registry {
    plugins: Vec<Box<dyn DevicePlugin>>,
    generic: generic::GenericPlugin,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            plugins: vec![
                Box::new(cisco::CiscoPlugin),
                Box::new(cisco::CiscoCssPlugin),
                Box::new(procurve::ProcurvePlugin),
                Box::new(passport::PassportPlugin),
                Box::new(extreme::ExtremePlugin),
            ],
            generic: generic::GenericPlugin,
        }
    }

    /// Every pipeline accepting this sysObjectID, or the generic
    /// fallback when no vendor pipeline matches.
    pub fn matching(&self, sysobjectid: &Oid) -> Vec<&dyn DevicePlugin> {
        let hits: Vec<&dyn DevicePlugin> = self
            .plugins
            .iter()
            .map(|p| p.as_ref())
            .filter(|p| p.handles(sysobjectid))
            .collect();
        if hits.is_empty() {
            vec![&self.generic]
        } else {
            hits
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

/// Walk a table whose rows are keyed by a single trailing index arc.
pub(crate) async fn walk_indexed(
    session: &Session,
    base: &[u32],
) -> Result<Vec<(i64, crate::snmp::Value)>, CollectorError> {
    let base = Oid::from_arcs(base);
    let rows = session.walk(&base).await?;
    Ok(rows
        .into_iter()
        .filter_map(|(oid, value)| {
            let index = *oid.arcs().last()?;
            Some((i64::from(index), value))
        })
        .collect())
}

/// Speed/duplex/autoneg read from a vendor MIB, keyed by the vendor's
/// port number, applied on top of what IF-MIB reported.
#[derive(Debug, Default)]
pub struct SpeedFacts {
    pub speed: BTreeMap<i64, i64>,
    pub duplex: BTreeMap<i64, Duplex>,
    pub autoneg: BTreeMap<i64, bool>,
}

impl SpeedFacts {
    /// Ports without a collected speed keep their IF-MIB values. When the
    /// normalizer declines a port the raw number is tried as-is.
    pub fn apply(&self, equipment: &mut Equipment, normport: NormPort<'_>) {
        for (&index, &speed) in &self.speed {
            let target = normport(index).unwrap_or(index);
            if let Some(port) = equipment.port_mut(target) {
                port.speed = Some(speed);
                port.duplex = self.duplex.get(&index).copied();
                port.autoneg = self.autoneg.get(&index).copied();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Port;
    use std::net::Ipv4Addr;

    fn equipment() -> Equipment {
        let mut eq = Equipment::new(
            Ipv4Addr::new(192, 0, 2, 1),
            "sw1",
            Oid::from_arcs(&[1, 3, 6, 1, 4, 1, 4242, 1]),
            "fixture",
        );
        eq.ports.insert(1, Port::named("1"));
        eq.ports.insert(2, Port::named("2"));
        eq
    }

    #[test]
    fn registry_falls_back_to_generic() {
        let registry = Registry::new();
        let unknown: Oid = "1.3.6.1.4.1.4242.1".parse().unwrap();
        let hits = registry.matching(&unknown);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name(), "generic");
    }

    #[test]
    fn registry_picks_vendor_pipelines() {
        let registry = Registry::new();
        let catalyst: Oid = "1.3.6.1.4.1.9.1.696".parse().unwrap();
        assert_eq!(registry.matching(&catalyst)[0].name(), "cisco");
        let css: Oid = "1.3.6.1.4.1.9.9.368.4.2".parse().unwrap();
        assert_eq!(registry.matching(&css)[0].name(), "cisco-css");
        let procurve: Oid = "1.3.6.1.4.1.11.2.3.7.11.87".parse().unwrap();
        assert_eq!(registry.matching(&procurve)[0].name(), "procurve");
        let passport: Oid = "1.3.6.1.4.1.2272.30".parse().unwrap();
        assert_eq!(registry.matching(&passport)[0].name(), "passport");
        let summit: Oid = "1.3.6.1.4.1.1916.2.28".parse().unwrap();
        assert_eq!(registry.matching(&summit)[0].name(), "extreme");
    }

    #[test]
    fn speed_facts_leave_uncollected_ports_alone() {
        let mut eq = equipment();
        eq.port_mut(2).unwrap().speed = Some(100);
        eq.port_mut(2).unwrap().duplex = Some(Duplex::Half);
        let mut facts = SpeedFacts::default();
        facts.speed.insert(1, 1000);
        facts.duplex.insert(1, Duplex::Full);
        facts.apply(&mut eq, &|p| Some(p));
        assert_eq!(eq.ports[&1].speed, Some(1000));
        assert_eq!(eq.ports[&1].duplex, Some(Duplex::Full));
        // port 2 had nothing collected and keeps its IF-MIB numbers
        assert_eq!(eq.ports[&2].speed, Some(100));
        assert_eq!(eq.ports[&2].duplex, Some(Duplex::Half));
    }

    #[test]
    fn speed_facts_clear_missing_flags() {
        let mut eq = equipment();
        eq.port_mut(1).unwrap().duplex = Some(Duplex::Half);
        eq.port_mut(1).unwrap().autoneg = Some(true);
        let mut facts = SpeedFacts::default();
        facts.speed.insert(1, 10);
        facts.apply(&mut eq, &|p| Some(p));
        assert_eq!(eq.ports[&1].speed, Some(10));
        assert_eq!(eq.ports[&1].duplex, None);
        assert_eq!(eq.ports[&1].autoneg, None);
    }
}
