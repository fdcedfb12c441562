//! Error types shared by the snmp, collector and scheduler layers.

use thiserror::Error;

use crate::oid::Oid;

/// Errors that can occur while probing a device or writing its snapshot.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// No response after all retries.
    #[error("timeout talking to {peer}")]
    Timeout { peer: String },

    /// Agent answered with a non-zero error status.
    #[error("snmp error: {0}")]
    Snmp(String),

    /// Malformed BER on the wire.
    #[error("codec error: {0}")]
    Codec(String),

    /// Socket-level failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Every candidate community was refused.
    #[error("no community accepted")]
    NoCommunity,

    /// Device did not answer the identification probe.
    #[error("unable to identify equipment {0}")]
    UnknownEquipment(Oid),

    /// Device exposes no local LLDP table.
    #[error("no lldp support")]
    NoLldp,

    /// An exploration run is already in flight.
    #[error("exploration already running")]
    AlreadyRunning,

    /// Datastore failure; the device transaction is rolled back.
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),
}
