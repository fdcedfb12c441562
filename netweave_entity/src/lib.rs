pub mod prelude;

pub mod arp;
pub mod cdp;
pub mod edp;
pub mod equipment;
pub mod fdb;
pub mod lldp;
pub mod port;
pub mod sonmp;
pub mod trunk;
pub mod vlan;
