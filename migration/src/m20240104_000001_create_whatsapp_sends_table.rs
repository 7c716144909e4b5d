use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(WhatsappSend::Table)
                .if_not_exists()
                .col(ColumnDef::new(WhatsappSend::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(WhatsappSend::Phone).string().not_null())
                .col(ColumnDef::new(WhatsappSend::Url).text().not_null())
                .col(ColumnDef::new(WhatsappSend::ScheduleId).uuid())
                .col(ColumnDef::new(WhatsappSend::WebhookResponse).text())
                .col(
                    ColumnDef::new(WhatsappSend::SentAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp())
                )
                .to_owned()
        ).await?;

        // Dedup lookups go by (phone, url)
        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_whatsapp_sends_phone_url")
                .table(WhatsappSend::Table)
                .col(WhatsappSend::Phone)
                .col(WhatsappSend::Url)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(WhatsappSend::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum WhatsappSend {
    #[sea_orm(iden = "whatsapp_sends")]
    Table,
    Id,
    Phone,
    Url,
    ScheduleId,
    WebhookResponse,
    SentAt,
}
