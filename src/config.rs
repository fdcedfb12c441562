//! Runtime configuration, merged from `netweave.toml`, environment
//! variables and command-line flags.

use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr};

use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Parser, Serialize, Deserialize)]
#[command(name = "netweave", about = "SNMP layer 2/3 network topology mapper")]
pub struct Config {
    /// Address(es) to explore: ip, cidr or hostname, each optionally @community
    #[arg(short, long, value_delimiter = ',', value_name = "TARGET1,TARGET2,...")]
    pub targets: Vec<String>,

    /// Community string(s) to try, in order
    #[arg(short, long, value_delimiter = ',', default_values_t = vec!["public".to_string()])]
    pub communities: Vec<String>,

    /// Addresses polled at the same time
    #[arg(long, default_value_t = 10)]
    pub parallel: usize,

    /// Minutes between exploration runs, 0 for a single run
    #[arg(short, long, default_value_t = 60)]
    pub interval: u64,

    /// Days before unreachable equipment is closed
    #[arg(long, default_value_t = 3)]
    pub equipment_expire: i64,

    /// Hours before an unseen fdb entry is closed
    #[arg(long, default_value_t = 24)]
    pub fdb_expire: i64,

    /// Hours before an unseen arp entry is closed
    #[arg(long, default_value_t = 24)]
    pub arp_expire: i64,

    /// Use GETBULK on v2c agents
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub bulk: bool,

    /// Seconds to wait for an agent response
    #[arg(long, default_value_t = 2)]
    pub timeout: u64,

    /// Requests sent before giving up on an agent
    #[arg(long, default_value_t = 3)]
    pub tries: u32,

    /// Path and name of database
    #[arg(short, long)]
    pub database: Option<String>,

    /// Log level: error, warn, info, debug or trace
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Explore a single address now and exit
    #[arg(short, long, value_name = "IP[@COMMUNITY]")]
    pub explore: Option<String>,
}

impl Config {
    /// Expand the target list into explorable addresses with their pinned
    /// community, in configuration order, duplicates dropped. Prefixes
    /// wider than /16 are capped to bound a run.
    pub fn expand_targets(&self) -> Vec<(Ipv4Addr, Option<String>)> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for entry in &self.targets {
            let (host, community) = split_community(entry);
            if let Ok(addr) = host.parse::<Ipv4Addr>() {
                if seen.insert(addr) {
                    out.push((addr, community.clone()));
                }
            } else if let Some((base, prefix)) = host.split_once('/') {
                let (Ok(base), Ok(prefix)) = (base.parse::<Ipv4Addr>(), prefix.parse::<u32>())
                else {
                    log::warn!("ignoring unparseable target {}", entry);
                    continue;
                };
                if prefix > 32 {
                    log::warn!("ignoring unparseable target {}", entry);
                    continue;
                }
                let prefix = if prefix < 16 {
                    log::warn!("capping {} at /16", entry);
                    16
                } else {
                    prefix
                };
                let size = 1u32 << (32 - prefix);
                let start = u32::from(base) & !(size - 1);
                // network and broadcast addresses are not worth a probe
                let (first, last) = if size > 2 { (1, size - 2) } else { (0, size - 1) };
                for offset in first..=last {
                    let addr = Ipv4Addr::from(start + offset);
                    if seen.insert(addr) {
                        out.push((addr, community.clone()));
                    }
                }
            } else {
                match dns_lookup::lookup_host(host) {
                    Ok(addrs) => {
                        for addr in addrs {
                            if let IpAddr::V4(addr) = addr {
                                if seen.insert(addr) {
                                    out.push((addr, community.clone()));
                                }
                            }
                        }
                    }
                    Err(e) => log::warn!("cannot resolve {}: {}", host, e),
                }
            }
        }
        out
    }
}

/// Split an optional trailing `@community` off a target entry.
pub fn split_community(entry: &str) -> (&str, Option<String>) {
    match entry.split_once('@') {
        Some((host, community)) => (host, Some(community.to_string())),
        None => (entry, None),
    }
}
