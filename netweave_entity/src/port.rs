use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One interface of an equipment, keyed by (equipment, index) among live rows.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "port")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub equipment: String,
    pub index: i64,
    pub name: String,
    pub alias: Option<String>,
    pub state: String,
    pub mac: Option<String>,
    pub speed: Option<i64>,
    pub duplex: Option<String>,
    pub autoneg: Option<bool>,
    pub created: DateTimeUtc,
    pub updated: DateTimeUtc,
    pub deleted: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
