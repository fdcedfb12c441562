use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Equipment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Equipment::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Equipment::Ip).string().not_null())
                    .col(ColumnDef::new(Equipment::Name).string().not_null())
                    .col(ColumnDef::new(Equipment::Oid).string().not_null())
                    .col(ColumnDef::new(Equipment::Description).string().not_null())
                    .col(ColumnDef::new(Equipment::Location).string())
                    .col(ColumnDef::new(Equipment::Created).timestamp().not_null())
                    .col(ColumnDef::new(Equipment::Updated).timestamp().not_null())
                    .col(ColumnDef::new(Equipment::Deleted).timestamp())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-equipment-ip")
                    .table(Equipment::Table)
                    .col(Equipment::Ip)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Equipment::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum Equipment {
    Table,
    Id,
    Ip,
    Name,
    Oid,
    Description,
    Location,
    Created,
    Updated,
    Deleted,
}
