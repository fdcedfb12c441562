use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A learned MAC on a port. Expired by age rather than by absence.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "fdb")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub equipment: String,
    pub port: i64,
    pub mac: String,
    pub created: DateTimeUtc,
    pub updated: DateTimeUtc,
    pub deleted: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
