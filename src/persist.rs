//! Diff-based persistence of poll snapshots.
//!
//! Every table is versioned: a live row has `deleted` NULL, a closed row
//! carries the instant it stopped being true. Re-seeing an unchanged fact
//! touches `updated`; a changed fact closes the old row and inserts a fresh
//! one. Closed rows stay in the live tables until `archive` moves them to
//! the `_past` tables, where the `_full` views pick them up.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::*;

use netweave_entity::{arp, cdp, edp, equipment, fdb, lldp, port, sonmp, trunk, vlan};

use crate::error::CollectorError;
use crate::model::Equipment;

/// Versioned tables, equipment first so cascades can skip it.
const TABLES: [&str; 10] = [
    "equipment",
    "port",
    "fdb",
    "arp",
    "vlan",
    "trunk",
    "sonmp",
    "edp",
    "cdp",
    "lldp",
];

/// Writes one device snapshot per transaction and runs the end-of-run sweeps.
#[derive(Clone)]
pub struct Writer {
    db: DatabaseConnection,
    fdb_expire: Duration,
    arp_expire: Duration,
}

impl Writer {
    pub fn new(db: DatabaseConnection) -> Self {
        Writer {
            db,
            fdb_expire: Duration::hours(24),
            arp_expire: Duration::hours(24),
        }
    }

    pub fn with_expiry(mut self, fdb_hours: i64, arp_hours: i64) -> Self {
        self.fdb_expire = Duration::hours(fdb_hours);
        self.arp_expire = Duration::hours(arp_hours);
        self
    }

    /// Store one snapshot. Either the whole device lands or nothing does.
    pub async fn write(&self, device: &Equipment) -> Result<(), CollectorError> {
        log::debug!("storing snapshot for {}", device.ip);
        let now = Utc::now();
        let ip = device.ip.to_string();
        let txn = self.db.begin().await?;
        self.write_equipment(&txn, device, &ip, now).await?;
        self.write_ports(&txn, device, &ip, now).await?;
        self.write_fdb(&txn, device, &ip, now).await?;
        self.write_arp(&txn, device, &ip, now).await?;
        self.write_vlans(&txn, device, &ip, now).await?;
        self.write_trunks(&txn, device, &ip, now).await?;
        self.write_sonmp(&txn, device, &ip, now).await?;
        self.write_edp(&txn, device, &ip, now).await?;
        self.write_cdp(&txn, device, &ip, now).await?;
        self.write_lldp(&txn, device, &ip, now).await?;
        txn.commit().await?;
        Ok(())
    }

    /// End-of-run sweep closing devices not refreshed within `days`.
    pub async fn expire_equipment(&self, days: i64) -> Result<(), CollectorError> {
        let now = Utc::now();
        let stale = equipment::Entity::find()
            .filter(equipment::Column::Deleted.is_null())
            .filter(equipment::Column::Updated.lt(now - Duration::days(days)))
            .all(&self.db)
            .await?;
        for row in stale {
            let ip = row.ip.clone();
            log::info!("expiring equipment {}, last seen {}", ip, row.updated);
            let txn = self.db.begin().await?;
            let mut gone: equipment::ActiveModel = row.into();
            gone.deleted = Set(Some(now));
            gone.update(&txn).await?;
            self.close_equipment_facts(&txn, &ip, now).await?;
            txn.commit().await?;
        }
        Ok(())
    }

    /// Move closed rows of every table into its `_past` twin.
    pub async fn archive(&self) -> Result<(), CollectorError> {
        let txn = self.db.begin().await?;
        for table in TABLES {
            txn.execute_unprepared(&format!(
                "INSERT INTO {table}_past SELECT * FROM {table} WHERE deleted IS NOT NULL"
            ))
            .await?;
            txn.execute_unprepared(&format!("DELETE FROM {table} WHERE deleted IS NOT NULL"))
                .await?;
        }
        txn.commit().await?;
        Ok(())
    }

    async fn write_equipment(
        &self,
        txn: &DatabaseTransaction,
        device: &Equipment,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CollectorError> {
        let oid = device.oid.to_string();
        let live = equipment::Entity::find()
            .filter(equipment::Column::Ip.eq(ip))
            .filter(equipment::Column::Deleted.is_null())
            .one(txn)
            .await?;
        if let Some(row) = live {
            let unchanged = row.name == device.name
                && row.oid == oid
                && row.description == device.description
                && row.location == device.location;
            let mut active: equipment::ActiveModel = row.into();
            if unchanged {
                active.updated = Set(now);
                active.update(txn).await?;
                return Ok(());
            }
            active.deleted = Set(Some(now));
            active.update(txn).await?;
        }
        equipment::ActiveModel {
            ip: Set(ip.to_string()),
            name: Set(device.name.clone()),
            oid: Set(oid),
            description: Set(device.description.clone()),
            location: Set(device.location.clone()),
            created: Set(now),
            updated: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await?;
        Ok(())
    }

    async fn write_ports(
        &self,
        txn: &DatabaseTransaction,
        device: &Equipment,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CollectorError> {
        let mut open: BTreeMap<i64, port::Model> = port::Entity::find()
            .filter(port::Column::Equipment.eq(ip))
            .filter(port::Column::Deleted.is_null())
            .all(txn)
            .await?
            .into_iter()
            .map(|row| (row.index, row))
            .collect();

        for (&index, port) in &device.ports {
            let duplex = port.duplex.map(|d| d.as_str().to_string());
            if let Some(row) = open.remove(&index) {
                let unchanged = row.name == port.name
                    && row.alias == port.alias
                    && row.state == port.state.as_str()
                    && row.mac == port.mac
                    && row.speed == port.speed
                    && row.duplex == duplex
                    && row.autoneg == port.autoneg;
                let mut active: port::ActiveModel = row.into();
                if unchanged {
                    active.updated = Set(now);
                    active.update(txn).await?;
                    continue;
                }
                active.deleted = Set(Some(now));
                active.update(txn).await?;
            }
            port::ActiveModel {
                equipment: Set(ip.to_string()),
                index: Set(index),
                name: Set(port.name.clone()),
                alias: Set(port.alias.clone()),
                state: Set(port.state.as_str().to_string()),
                mac: Set(port.mac.clone()),
                speed: Set(port.speed),
                duplex: Set(duplex),
                autoneg: Set(port.autoneg),
                created: Set(now),
                updated: Set(now),
                ..Default::default()
            }
            .insert(txn)
            .await?;
        }

        // An interface gone from the snapshot takes its facts along.
        for (index, row) in open {
            let mut active: port::ActiveModel = row.into();
            active.deleted = Set(Some(now));
            active.update(txn).await?;
            self.close_port_facts(txn, ip, index, now).await?;
        }
        Ok(())
    }

    async fn write_fdb(
        &self,
        txn: &DatabaseTransaction,
        device: &Equipment,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CollectorError> {
        let mut open: BTreeMap<(i64, String), fdb::Model> = fdb::Entity::find()
            .filter(fdb::Column::Equipment.eq(ip))
            .filter(fdb::Column::Deleted.is_null())
            .all(txn)
            .await?
            .into_iter()
            .map(|row| ((row.port, row.mac.clone()), row))
            .collect();

        for (&index, port) in &device.ports {
            for mac in &port.fdb {
                if let Some(row) = open.remove(&(index, mac.clone())) {
                    let mut active: fdb::ActiveModel = row.into();
                    active.updated = Set(now);
                    active.update(txn).await?;
                } else {
                    fdb::ActiveModel {
                        equipment: Set(ip.to_string()),
                        port: Set(index),
                        mac: Set(mac.clone()),
                        created: Set(now),
                        updated: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;
                }
            }
        }

        // A quiet station is not gone. Entries close once they age out.
        fdb::Entity::update_many()
            .col_expr(fdb::Column::Deleted, Expr::value(Some(now)))
            .filter(fdb::Column::Equipment.eq(ip))
            .filter(fdb::Column::Deleted.is_null())
            .filter(fdb::Column::Updated.lt(now - self.fdb_expire))
            .exec(txn)
            .await?;
        Ok(())
    }

    async fn write_arp(
        &self,
        txn: &DatabaseTransaction,
        device: &Equipment,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CollectorError> {
        let mut open: BTreeMap<(String, String), arp::Model> = arp::Entity::find()
            .filter(arp::Column::Equipment.eq(ip))
            .filter(arp::Column::Deleted.is_null())
            .all(txn)
            .await?
            .into_iter()
            .map(|row| ((row.ip.clone(), row.mac.clone()), row))
            .collect();

        for (addr, mac) in &device.arp {
            let key = (addr.to_string(), mac.clone());
            if let Some(row) = open.remove(&key) {
                let mut active: arp::ActiveModel = row.into();
                active.updated = Set(now);
                active.update(txn).await?;
            } else {
                arp::ActiveModel {
                    equipment: Set(ip.to_string()),
                    ip: Set(key.0),
                    mac: Set(key.1),
                    created: Set(now),
                    updated: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await?;
            }
        }

        arp::Entity::update_many()
            .col_expr(arp::Column::Deleted, Expr::value(Some(now)))
            .filter(arp::Column::Equipment.eq(ip))
            .filter(arp::Column::Deleted.is_null())
            .filter(arp::Column::Updated.lt(now - self.arp_expire))
            .exec(txn)
            .await?;
        Ok(())
    }

    async fn write_vlans(
        &self,
        txn: &DatabaseTransaction,
        device: &Equipment,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CollectorError> {
        let mut open: BTreeMap<(i64, i64, String, String), vlan::Model> = vlan::Entity::find()
            .filter(vlan::Column::Equipment.eq(ip))
            .filter(vlan::Column::Deleted.is_null())
            .all(txn)
            .await?
            .into_iter()
            .map(|row| ((row.port, row.vid, row.name.clone(), row.scope.clone()), row))
            .collect();

        for (&index, port) in &device.ports {
            for v in &port.vlans {
                let key = (index, v.vid, v.name.clone(), v.scope.as_str().to_string());
                if let Some(row) = open.remove(&key) {
                    let mut active: vlan::ActiveModel = row.into();
                    active.updated = Set(now);
                    active.update(txn).await?;
                } else {
                    vlan::ActiveModel {
                        equipment: Set(ip.to_string()),
                        port: Set(index),
                        vid: Set(v.vid),
                        name: Set(key.2),
                        scope: Set(key.3),
                        created: Set(now),
                        updated: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;
                }
            }
        }

        for row in open.into_values() {
            let mut active: vlan::ActiveModel = row.into();
            active.deleted = Set(Some(now));
            active.update(txn).await?;
        }
        Ok(())
    }

    async fn write_trunks(
        &self,
        txn: &DatabaseTransaction,
        device: &Equipment,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CollectorError> {
        let mut open: BTreeMap<(i64, i64), trunk::Model> = trunk::Entity::find()
            .filter(trunk::Column::Equipment.eq(ip))
            .filter(trunk::Column::Deleted.is_null())
            .all(txn)
            .await?
            .into_iter()
            .map(|row| ((row.port, row.member), row))
            .collect();

        for (&index, port) in &device.ports {
            let Some(trunk) = port.trunk else { continue };
            if let Some(row) = open.remove(&(trunk.parent, index)) {
                let mut active: trunk::ActiveModel = row.into();
                active.updated = Set(now);
                active.update(txn).await?;
            } else {
                trunk::ActiveModel {
                    equipment: Set(ip.to_string()),
                    port: Set(trunk.parent),
                    member: Set(index),
                    created: Set(now),
                    updated: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await?;
            }
        }

        for row in open.into_values() {
            let mut active: trunk::ActiveModel = row.into();
            active.deleted = Set(Some(now));
            active.update(txn).await?;
        }
        Ok(())
    }

    async fn write_sonmp(
        &self,
        txn: &DatabaseTransaction,
        device: &Equipment,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CollectorError> {
        let mut open: BTreeMap<i64, sonmp::Model> = sonmp::Entity::find()
            .filter(sonmp::Column::Equipment.eq(ip))
            .filter(sonmp::Column::Deleted.is_null())
            .all(txn)
            .await?
            .into_iter()
            .map(|row| (row.port, row))
            .collect();

        for (&index, port) in &device.ports {
            let Some(fact) = &port.sonmp else { continue };
            let remote_ip = fact.ip.to_string();
            if let Some(row) = open.remove(&index) {
                let unchanged = row.remote_ip == remote_ip && row.remote_port == fact.port;
                let mut active: sonmp::ActiveModel = row.into();
                if unchanged {
                    active.updated = Set(now);
                    active.update(txn).await?;
                    continue;
                }
                active.deleted = Set(Some(now));
                active.update(txn).await?;
            }
            sonmp::ActiveModel {
                equipment: Set(ip.to_string()),
                port: Set(index),
                remote_ip: Set(remote_ip),
                remote_port: Set(fact.port),
                created: Set(now),
                updated: Set(now),
                ..Default::default()
            }
            .insert(txn)
            .await?;
        }

        for row in open.into_values() {
            let mut active: sonmp::ActiveModel = row.into();
            active.deleted = Set(Some(now));
            active.update(txn).await?;
        }
        Ok(())
    }

    async fn write_edp(
        &self,
        txn: &DatabaseTransaction,
        device: &Equipment,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CollectorError> {
        let mut open: BTreeMap<i64, edp::Model> = edp::Entity::find()
            .filter(edp::Column::Equipment.eq(ip))
            .filter(edp::Column::Deleted.is_null())
            .all(txn)
            .await?
            .into_iter()
            .map(|row| (row.port, row))
            .collect();

        for (&index, port) in &device.ports {
            let Some(fact) = &port.edp else { continue };
            if let Some(row) = open.remove(&index) {
                let unchanged = row.sysname == fact.sysname
                    && row.remote_slot == fact.slot
                    && row.remote_port == fact.port;
                let mut active: edp::ActiveModel = row.into();
                if unchanged {
                    active.updated = Set(now);
                    active.update(txn).await?;
                    continue;
                }
                active.deleted = Set(Some(now));
                active.update(txn).await?;
            }
            edp::ActiveModel {
                equipment: Set(ip.to_string()),
                port: Set(index),
                sysname: Set(fact.sysname.clone()),
                remote_slot: Set(fact.slot),
                remote_port: Set(fact.port),
                created: Set(now),
                updated: Set(now),
                ..Default::default()
            }
            .insert(txn)
            .await?;
        }

        for row in open.into_values() {
            let mut active: edp::ActiveModel = row.into();
            active.deleted = Set(Some(now));
            active.update(txn).await?;
        }
        Ok(())
    }

    async fn write_cdp(
        &self,
        txn: &DatabaseTransaction,
        device: &Equipment,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CollectorError> {
        let mut open: BTreeMap<i64, cdp::Model> = cdp::Entity::find()
            .filter(cdp::Column::Equipment.eq(ip))
            .filter(cdp::Column::Deleted.is_null())
            .all(txn)
            .await?
            .into_iter()
            .map(|row| (row.port, row))
            .collect();

        for (&index, port) in &device.ports {
            let Some(fact) = &port.cdp else { continue };
            let mgmt_ip = fact.ip.to_string();
            if let Some(row) = open.remove(&index) {
                let unchanged = row.sysname == fact.sysname
                    && row.remote_port == fact.port
                    && row.mgmt_ip == mgmt_ip
                    && row.platform == fact.platform;
                let mut active: cdp::ActiveModel = row.into();
                if unchanged {
                    active.updated = Set(now);
                    active.update(txn).await?;
                    continue;
                }
                active.deleted = Set(Some(now));
                active.update(txn).await?;
            }
            cdp::ActiveModel {
                equipment: Set(ip.to_string()),
                port: Set(index),
                sysname: Set(fact.sysname.clone()),
                remote_port: Set(fact.port.clone()),
                mgmt_ip: Set(mgmt_ip),
                platform: Set(fact.platform.clone()),
                created: Set(now),
                updated: Set(now),
                ..Default::default()
            }
            .insert(txn)
            .await?;
        }

        for row in open.into_values() {
            let mut active: cdp::ActiveModel = row.into();
            active.deleted = Set(Some(now));
            active.update(txn).await?;
        }
        Ok(())
    }

    async fn write_lldp(
        &self,
        txn: &DatabaseTransaction,
        device: &Equipment,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CollectorError> {
        let mut open: BTreeMap<i64, lldp::Model> = lldp::Entity::find()
            .filter(lldp::Column::Equipment.eq(ip))
            .filter(lldp::Column::Deleted.is_null())
            .all(txn)
            .await?
            .into_iter()
            .map(|row| (row.port, row))
            .collect();

        for (&index, port) in &device.ports {
            let Some(fact) = &port.lldp else { continue };
            let mgmt_ip = fact.ip.to_string();
            if let Some(row) = open.remove(&index) {
                let unchanged = row.sysname == fact.sysname
                    && row.sysdesc == fact.sysdesc
                    && row.portdesc == fact.portdesc
                    && row.mgmt_ip == mgmt_ip;
                let mut active: lldp::ActiveModel = row.into();
                if unchanged {
                    active.updated = Set(now);
                    active.update(txn).await?;
                    continue;
                }
                active.deleted = Set(Some(now));
                active.update(txn).await?;
            }
            lldp::ActiveModel {
                equipment: Set(ip.to_string()),
                port: Set(index),
                sysname: Set(fact.sysname.clone()),
                sysdesc: Set(fact.sysdesc.clone()),
                portdesc: Set(fact.portdesc.clone()),
                mgmt_ip: Set(mgmt_ip),
                created: Set(now),
                updated: Set(now),
                ..Default::default()
            }
            .insert(txn)
            .await?;
        }

        for row in open.into_values() {
            let mut active: lldp::ActiveModel = row.into();
            active.deleted = Set(Some(now));
            active.update(txn).await?;
        }
        Ok(())
    }

    /// Close fdb, vlan, trunk and neighbor rows hanging off one interface.
    async fn close_port_facts(
        &self,
        txn: &DatabaseTransaction,
        ip: &str,
        index: i64,
        now: DateTime<Utc>,
    ) -> Result<(), CollectorError> {
        for table in ["fdb", "vlan", "sonmp", "edp", "cdp", "lldp"] {
            let sql = format!(
                "UPDATE {table} SET deleted = ? WHERE equipment = ? AND port = ? AND deleted IS NULL"
            );
            txn.execute(Statement::from_sql_and_values(
                DbBackend::Sqlite,
                &sql,
                [now.into(), ip.into(), index.into()],
            ))
            .await?;
        }
        // The trunk table references the interface from either end.
        txn.execute(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "UPDATE trunk SET deleted = ? WHERE equipment = ? AND (port = ? OR member = ?) AND deleted IS NULL",
            [now.into(), ip.into(), index.into(), index.into()],
        ))
        .await?;
        Ok(())
    }

    /// Close every live row belonging to one device, the equipment row excepted.
    async fn close_equipment_facts(
        &self,
        txn: &DatabaseTransaction,
        ip: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CollectorError> {
        for table in &TABLES[1..] {
            let sql =
                format!("UPDATE {table} SET deleted = ? WHERE equipment = ? AND deleted IS NULL");
            txn.execute(Statement::from_sql_and_values(
                DbBackend::Sqlite,
                &sql,
                [now.into(), ip.into()],
            ))
            .await?;
        }
        Ok(())
    }
}
