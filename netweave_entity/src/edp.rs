use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Extreme Discovery Protocol neighbor seen on a local port.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "edp")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub equipment: String,
    pub port: i64,
    pub sysname: String,
    pub remote_slot: i64,
    pub remote_port: i64,
    pub created: DateTimeUtc,
    pub updated: DateTimeUtc,
    pub deleted: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
