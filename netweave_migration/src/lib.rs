pub use sea_orm_migration::prelude::*;

mod m20260302_091423_equipment;
mod m20260302_091447_port;
mod m20260302_091509_facts;
mod m20260302_091533_neighbors;
mod m20260302_091602_history;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260302_091423_equipment::Migration),
            Box::new(m20260302_091447_port::Migration),
            Box::new(m20260302_091509_facts::Migration),
            Box::new(m20260302_091533_neighbors::Migration),
            Box::new(m20260302_091602_history::Migration),
        ]
    }
}
