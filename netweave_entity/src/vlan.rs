use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// VLAN membership of a port. `scope` is `local` for membership configured
/// on the device itself, `remote` when learned from a neighbor protocol.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "vlan")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub equipment: String,
    pub port: i64,
    pub vid: i64,
    pub name: String,
    pub scope: String,
    pub created: DateTimeUtc,
    pub updated: DateTimeUtc,
    pub deleted: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
