use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Fdb::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Fdb::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Fdb::Equipment).string().not_null())
                    .col(ColumnDef::new(Fdb::Port).big_integer().not_null())
                    .col(ColumnDef::new(Fdb::Mac).string().not_null())
                    .col(ColumnDef::new(Fdb::Created).timestamp().not_null())
                    .col(ColumnDef::new(Fdb::Updated).timestamp().not_null())
                    .col(ColumnDef::new(Fdb::Deleted).timestamp())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-fdb-equipment")
                    .table(Fdb::Table)
                    .col(Fdb::Equipment)
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                Table::create()
                    .table(Arp::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Arp::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Arp::Equipment).string().not_null())
                    .col(ColumnDef::new(Arp::Ip).string().not_null())
                    .col(ColumnDef::new(Arp::Mac).string().not_null())
                    .col(ColumnDef::new(Arp::Created).timestamp().not_null())
                    .col(ColumnDef::new(Arp::Updated).timestamp().not_null())
                    .col(ColumnDef::new(Arp::Deleted).timestamp())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-arp-equipment")
                    .table(Arp::Table)
                    .col(Arp::Equipment)
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                Table::create()
                    .table(Vlan::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vlan::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Vlan::Equipment).string().not_null())
                    .col(ColumnDef::new(Vlan::Port).big_integer().not_null())
                    .col(ColumnDef::new(Vlan::Vid).big_integer().not_null())
                    .col(ColumnDef::new(Vlan::Name).string().not_null())
                    .col(ColumnDef::new(Vlan::Scope).string().not_null())
                    .col(ColumnDef::new(Vlan::Created).timestamp().not_null())
                    .col(ColumnDef::new(Vlan::Updated).timestamp().not_null())
                    .col(ColumnDef::new(Vlan::Deleted).timestamp())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-vlan-equipment")
                    .table(Vlan::Table)
                    .col(Vlan::Equipment)
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                Table::create()
                    .table(Trunk::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Trunk::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Trunk::Equipment).string().not_null())
                    .col(ColumnDef::new(Trunk::Port).big_integer().not_null())
                    .col(ColumnDef::new(Trunk::Member).big_integer().not_null())
                    .col(ColumnDef::new(Trunk::Created).timestamp().not_null())
                    .col(ColumnDef::new(Trunk::Updated).timestamp().not_null())
                    .col(ColumnDef::new(Trunk::Deleted).timestamp())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-trunk-equipment")
                    .table(Trunk::Table)
                    .col(Trunk::Equipment)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Trunk::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Vlan::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Arp::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Fdb::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Fdb {
    Table,
    Id,
    Equipment,
    Port,
    Mac,
    Created,
    Updated,
    Deleted,
}

#[derive(Iden)]
enum Arp {
    Table,
    Id,
    Equipment,
    Ip,
    Mac,
    Created,
    Updated,
    Deleted,
}

#[derive(Iden)]
enum Vlan {
    Table,
    Id,
    Equipment,
    Port,
    Vid,
    Name,
    Scope,
    Created,
    Updated,
    Deleted,
}

#[derive(Iden)]
enum Trunk {
    Table,
    Id,
    Equipment,
    Port,
    Member,
    Created,
    Updated,
    Deleted,
}
