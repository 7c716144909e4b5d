use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(LeadGroup::Table)
                .if_not_exists()
                .col(ColumnDef::new(LeadGroup::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(LeadGroup::Name).string().not_null())
                .col(
                    ColumnDef::new(LeadGroup::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp())
                )
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(Lead::Table)
                .if_not_exists()
                .col(ColumnDef::new(Lead::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Lead::Name).string().not_null())
                .col(ColumnDef::new(Lead::Email).string())
                .col(ColumnDef::new(Lead::Phone).string())
                .col(ColumnDef::new(Lead::FilterConfig).text())
                .col(ColumnDef::new(Lead::GroupId).uuid())
                .col(
                    ColumnDef::new(Lead::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp())
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_leads_group")
                        .from(Lead::Table, Lead::GroupId)
                        .to(LeadGroup::Table, LeadGroup::Id)
                        .on_delete(ForeignKeyAction::SetNull)
                )
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_leads_group_id")
                .table(Lead::Table)
                .col(Lead::GroupId)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Lead::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(LeadGroup::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
pub enum LeadGroup {
    #[sea_orm(iden = "lead_groups")]
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Lead {
    #[sea_orm(iden = "leads")]
    Table,
    Id,
    Name,
    Email,
    Phone,
    FilterConfig,
    GroupId,
    CreatedAt,
}
