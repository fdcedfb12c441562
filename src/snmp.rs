//! Minimal SNMP v1/v2c client: BER codec, message framing, UDP transport
//! and the get/walk session layer the collectors are built on.

pub mod ber;
pub mod pdu;
pub mod session;
pub mod transport;
pub mod value;

pub use pdu::{PduType, Version};
pub use session::Session;
pub use transport::{Transport, UdpTransport};
pub use value::Value;

use crate::oid::Oid;

pub const SYS_DESCR: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 1, 0];
pub const SYS_OBJECT_ID: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 2, 0];
pub const SYS_NAME: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 5, 0];
pub const SYS_LOCATION: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 6, 0];

pub fn sys_descr() -> Oid {
    Oid::from_arcs(SYS_DESCR)
}

pub fn sys_object_id() -> Oid {
    Oid::from_arcs(SYS_OBJECT_ID)
}

pub fn sys_name() -> Oid {
    Oid::from_arcs(SYS_NAME)
}

pub fn sys_location() -> Oid {
    Oid::from_arcs(SYS_LOCATION)
}
