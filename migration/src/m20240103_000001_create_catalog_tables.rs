use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(StaticPage::Table)
                .if_not_exists()
                .col(ColumnDef::new(StaticPage::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(StaticPage::PageId).string().not_null().unique_key())
                .col(ColumnDef::new(StaticPage::PropertyIds).json_binary().not_null())
                .col(ColumnDef::new(StaticPage::PageType).string().not_null())
                .col(ColumnDef::new(StaticPage::Title).string().not_null())
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(Property::Table)
                .if_not_exists()
                .col(ColumnDef::new(Property::Id).big_integer().not_null().primary_key())
                .col(ColumnDef::new(Property::Title).string().not_null())
                .col(ColumnDef::new(Property::IsActive).boolean().not_null().default(true))
                .col(
                    ColumnDef::new(Property::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp())
                )
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_properties_active_created")
                .table(Property::Table)
                .col(Property::IsActive)
                .col(Property::CreatedAt)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Property::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(StaticPage::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum StaticPage {
    #[sea_orm(iden = "static_pages")]
    Table,
    Id,
    PageId,
    PropertyIds,
    PageType,
    Title,
}

#[derive(DeriveIden)]
enum Property {
    #[sea_orm(iden = "properties")]
    Table,
    Id,
    Title,
    IsActive,
    CreatedAt,
}
