pub use super::arp::Entity as Arp;
pub use super::cdp::Entity as Cdp;
pub use super::edp::Entity as Edp;
pub use super::equipment::Entity as Equipment;
pub use super::fdb::Entity as Fdb;
pub use super::lldp::Entity as Lldp;
pub use super::port::Entity as Port;
pub use super::sonmp::Entity as Sonmp;
pub use super::trunk::Entity as Trunk;
pub use super::vlan::Entity as Vlan;
