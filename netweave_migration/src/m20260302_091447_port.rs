use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Port::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Port::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Port::Equipment).string().not_null())
                    .col(ColumnDef::new(Port::Index).big_integer().not_null())
                    .col(ColumnDef::new(Port::Name).string().not_null())
                    .col(ColumnDef::new(Port::Alias).string())
                    .col(ColumnDef::new(Port::State).string().not_null())
                    .col(ColumnDef::new(Port::Mac).string())
                    .col(ColumnDef::new(Port::Speed).big_integer())
                    .col(ColumnDef::new(Port::Duplex).string())
                    .col(ColumnDef::new(Port::Autoneg).boolean())
                    .col(ColumnDef::new(Port::Created).timestamp().not_null())
                    .col(ColumnDef::new(Port::Updated).timestamp().not_null())
                    .col(ColumnDef::new(Port::Deleted).timestamp())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-port-equipment")
                    .table(Port::Table)
                    .col(Port::Equipment)
                    .col(Port::Index)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Port::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Port {
    Table,
    Id,
    Equipment,
    Index,
    Name,
    Alias,
    State,
    Mac,
    Speed,
    Duplex,
    Autoneg,
    Created,
    Updated,
    Deleted,
}
