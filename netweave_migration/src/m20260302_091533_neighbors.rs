use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sonmp::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sonmp::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sonmp::Equipment).string().not_null())
                    .col(ColumnDef::new(Sonmp::Port).big_integer().not_null())
                    .col(ColumnDef::new(Sonmp::RemoteIp).string().not_null())
                    .col(ColumnDef::new(Sonmp::RemotePort).big_integer().not_null())
                    .col(ColumnDef::new(Sonmp::Created).timestamp().not_null())
                    .col(ColumnDef::new(Sonmp::Updated).timestamp().not_null())
                    .col(ColumnDef::new(Sonmp::Deleted).timestamp())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-sonmp-equipment")
                    .table(Sonmp::Table)
                    .col(Sonmp::Equipment)
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                Table::create()
                    .table(Edp::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Edp::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Edp::Equipment).string().not_null())
                    .col(ColumnDef::new(Edp::Port).big_integer().not_null())
                    .col(ColumnDef::new(Edp::Sysname).string().not_null())
                    .col(ColumnDef::new(Edp::RemoteSlot).big_integer().not_null())
                    .col(ColumnDef::new(Edp::RemotePort).big_integer().not_null())
                    .col(ColumnDef::new(Edp::Created).timestamp().not_null())
                    .col(ColumnDef::new(Edp::Updated).timestamp().not_null())
                    .col(ColumnDef::new(Edp::Deleted).timestamp())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-edp-equipment")
                    .table(Edp::Table)
                    .col(Edp::Equipment)
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                Table::create()
                    .table(Cdp::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Cdp::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Cdp::Equipment).string().not_null())
                    .col(ColumnDef::new(Cdp::Port).big_integer().not_null())
                    .col(ColumnDef::new(Cdp::Sysname).string().not_null())
                    .col(ColumnDef::new(Cdp::RemotePort).string().not_null())
                    .col(ColumnDef::new(Cdp::MgmtIp).string().not_null())
                    .col(ColumnDef::new(Cdp::Platform).string().not_null())
                    .col(ColumnDef::new(Cdp::Created).timestamp().not_null())
                    .col(ColumnDef::new(Cdp::Updated).timestamp().not_null())
                    .col(ColumnDef::new(Cdp::Deleted).timestamp())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-cdp-equipment")
                    .table(Cdp::Table)
                    .col(Cdp::Equipment)
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                Table::create()
                    .table(Lldp::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Lldp::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Lldp::Equipment).string().not_null())
                    .col(ColumnDef::new(Lldp::Port).big_integer().not_null())
                    .col(ColumnDef::new(Lldp::Sysname).string().not_null())
                    .col(ColumnDef::new(Lldp::Sysdesc).string().not_null())
                    .col(ColumnDef::new(Lldp::Portdesc).string().not_null())
                    .col(ColumnDef::new(Lldp::MgmtIp).string().not_null())
                    .col(ColumnDef::new(Lldp::Created).timestamp().not_null())
                    .col(ColumnDef::new(Lldp::Updated).timestamp().not_null())
                    .col(ColumnDef::new(Lldp::Deleted).timestamp())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-lldp-equipment")
                    .table(Lldp::Table)
                    .col(Lldp::Equipment)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Lldp::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cdp::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Edp::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sonmp::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Sonmp {
    Table,
    Id,
    Equipment,
    Port,
    RemoteIp,
    RemotePort,
    Created,
    Updated,
    Deleted,
}

#[derive(Iden)]
enum Edp {
    Table,
    Id,
    Equipment,
    Port,
    Sysname,
    RemoteSlot,
    RemotePort,
    Created,
    Updated,
    Deleted,
}

#[derive(Iden)]
enum Cdp {
    Table,
    Id,
    Equipment,
    Port,
    Sysname,
    RemotePort,
    MgmtIp,
    Platform,
    Created,
    Updated,
    Deleted,
}

#[derive(Iden)]
enum Lldp {
    Table,
    Id,
    Equipment,
    Port,
    Sysname,
    Sysdesc,
    Portdesc,
    MgmtIp,
    Created,
    Updated,
    Deleted,
}
