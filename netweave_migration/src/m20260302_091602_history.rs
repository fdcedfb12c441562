use sea_orm_migration::prelude::*;

const TABLES: [&str; 10] = [
    "equipment", "port", "fdb", "arp", "vlan", "trunk", "sonmp", "edp", "cdp", "lldp",
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();
        for table in TABLES {
            // Archive tables keep the live layout but no constraints.
            conn.execute_unprepared(&format!(
                "CREATE TABLE IF NOT EXISTS {table}_past AS SELECT * FROM {table} WHERE 0"
            ))
            .await?;
            conn.execute_unprepared(&format!(
                "CREATE VIEW IF NOT EXISTS {table}_full AS \
                 SELECT * FROM {table} UNION ALL SELECT * FROM {table}_past"
            ))
            .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();
        for table in TABLES {
            conn.execute_unprepared(&format!("DROP VIEW IF EXISTS {table}_full"))
                .await?;
            conn.execute_unprepared(&format!("DROP TABLE IF EXISTS {table}_past"))
                .await?;
        }
        Ok(())
    }
}
