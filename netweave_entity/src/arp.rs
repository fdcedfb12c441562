use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An IP-to-MAC mapping read from a device's ARP table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "arp")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub equipment: String,
    pub ip: String,
    pub mac: String,
    pub created: DateTimeUtc,
    pub updated: DateTimeUtc,
    pub deleted: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
