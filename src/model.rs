//! In-memory picture of one polled device, as assembled by the collectors
//! and handed to the persistence layer.

use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

use crate::oid::Oid;

/// Everything learned about one device during a poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Equipment {
    pub ip: Ipv4Addr,
    pub name: String,
    pub oid: Oid,
    pub description: String,
    pub location: Option<String>,
    pub ports: BTreeMap<i64, Port>,
    /// IP-to-MAC mappings from the device's ARP table.
    pub arp: BTreeMap<Ipv4Addr, String>,
}

impl Equipment {
    pub fn new(ip: Ipv4Addr, name: &str, oid: Oid, description: &str) -> Self {
        Equipment {
            ip,
            name: name.to_string(),
            oid,
            description: description.to_string(),
            location: None,
            ports: BTreeMap::new(),
            arp: BTreeMap::new(),
        }
    }

    /// Facts only attach to interfaces the port collector admitted.
    pub fn port_mut(&mut self, index: i64) -> Option<&mut Port> {
        self.ports.get_mut(&index)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Port {
    pub name: String,
    pub alias: Option<String>,
    pub state: PortState,
    pub mac: Option<String>,
    /// Mbit/s.
    pub speed: Option<i64>,
    pub duplex: Option<Duplex>,
    pub autoneg: Option<bool>,
    pub fdb: BTreeSet<String>,
    pub vlans: BTreeSet<Vlan>,
    pub trunk: Option<Trunk>,
    pub sonmp: Option<Sonmp>,
    pub edp: Option<Edp>,
    pub cdp: Option<Cdp>,
    pub lldp: Option<Lldp>,
}

impl Port {
    pub fn named(name: &str) -> Self {
        Port {
            name: name.to_string(),
            ..Port::default()
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PortState {
    Up,
    #[default]
    Down,
}

impl PortState {
    pub fn as_str(self) -> &'static str {
        match self {
            PortState::Up => "up",
            PortState::Down => "down",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Duplex {
    Half,
    Full,
}

impl Duplex {
    pub fn as_str(self) -> &'static str {
        match self {
            Duplex::Half => "half",
            Duplex::Full => "full",
        }
    }
}

/// VLAN membership. Configured locally or reported by a neighbor protocol.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Vlan {
    pub vid: i64,
    pub name: String,
    pub scope: VlanScope,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum VlanScope {
    Local,
    Remote,
}

impl VlanScope {
    pub fn as_str(self) -> &'static str {
        match self {
            VlanScope::Local => "local",
            VlanScope::Remote => "remote",
        }
    }
}

/// Aggregate membership: this port is a member of aggregate `parent`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Trunk {
    pub parent: i64,
}

/// Nortel topology neighbor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sonmp {
    pub ip: Ipv4Addr,
    pub port: i64,
}

/// Extreme Discovery Protocol neighbor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edp {
    pub sysname: String,
    pub slot: i64,
    pub port: i64,
}

/// Cisco Discovery Protocol neighbor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cdp {
    pub sysname: String,
    pub port: String,
    pub ip: Ipv4Addr,
    pub platform: String,
}

/// LLDP neighbor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lldp {
    pub sysname: String,
    pub sysdesc: String,
    pub portdesc: String,
    pub ip: Ipv4Addr,
}

/// Render a 6-byte hardware address as lowercase colon-separated hex.
pub fn format_mac(bytes: &[u8]) -> Option<String> {
    if bytes.len() != 6 {
        return None;
    }
    Some(
        bytes
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(":"),
    )
}
