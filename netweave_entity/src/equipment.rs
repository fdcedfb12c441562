use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One polled device. A row stays live until `deleted` is set; historical
/// rows move to `equipment_past`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "equipment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub ip: String,
    pub name: String,
    pub oid: String,
    pub description: String,
    pub location: Option<String>,
    pub created: DateTimeUtc,
    pub updated: DateTimeUtc,
    pub deleted: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
