use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_leads_tables::{ Lead, LeadGroup };

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Schedule::Table)
                .if_not_exists()
                .col(ColumnDef::new(Schedule::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Schedule::Name).string().not_null())
                .col(ColumnDef::new(Schedule::Method).string().not_null())
                .col(ColumnDef::new(Schedule::Status).string().not_null().default("active"))
                .col(ColumnDef::new(Schedule::GroupId).uuid())
                .col(ColumnDef::new(Schedule::RecurrenceType).string().not_null())
                .col(ColumnDef::new(Schedule::RecurrenceInterval).integer().not_null().default(1))
                .col(ColumnDef::new(Schedule::SendTime).string().not_null())
                .col(ColumnDef::new(Schedule::Weekdays).json_binary())
                .col(ColumnDef::new(Schedule::DayOfMonth).integer())
                .col(ColumnDef::new(Schedule::Timezone).string().not_null().default("-03:00"))
                .col(ColumnDef::new(Schedule::LastSent).timestamp_with_time_zone())
                .col(ColumnDef::new(Schedule::NextSend).timestamp_with_time_zone())
                .col(ColumnDef::new(Schedule::EmailSubject).string())
                .col(ColumnDef::new(Schedule::EmailMessage).text())
                .col(ColumnDef::new(Schedule::WhatsappMessage).text())
                .col(ColumnDef::new(Schedule::ImageUrl).string())
                .col(ColumnDef::new(Schedule::TotalSent).big_integer().not_null().default(0))
                .col(ColumnDef::new(Schedule::RunCount).big_integer().not_null().default(0))
                .col(ColumnDef::new(Schedule::LockedBy).uuid())
                .col(ColumnDef::new(Schedule::LockedUntil).timestamp_with_time_zone())
                .col(
                    ColumnDef::new(Schedule::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp())
                )
                .col(
                    ColumnDef::new(Schedule::UpdatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp())
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_schedules_group")
                        .from(Schedule::Table, Schedule::GroupId)
                        .to(LeadGroup::Table, LeadGroup::Id)
                        .on_delete(ForeignKeyAction::SetNull)
                )
                .to_owned()
        ).await?;

        // Due selection scans active rows by next_send
        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_schedules_status_next_send")
                .table(Schedule::Table)
                .col(Schedule::Status)
                .col(Schedule::NextSend)
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(ScheduleLead::Table)
                .if_not_exists()
                .col(ColumnDef::new(ScheduleLead::ScheduleId).uuid().not_null())
                .col(ColumnDef::new(ScheduleLead::LeadId).uuid().not_null())
                .primary_key(
                    Index::create().col(ScheduleLead::ScheduleId).col(ScheduleLead::LeadId)
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_schedule_leads_schedule")
                        .from(ScheduleLead::Table, ScheduleLead::ScheduleId)
                        .to(Schedule::Table, Schedule::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_schedule_leads_lead")
                        .from(ScheduleLead::Table, ScheduleLead::LeadId)
                        .to(Lead::Table, Lead::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                )
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ScheduleLead::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Schedule::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
pub enum Schedule {
    #[sea_orm(iden = "schedules")]
    Table,
    Id,
    Name,
    Method,
    Status,
    GroupId,
    RecurrenceType,
    RecurrenceInterval,
    SendTime,
    Weekdays,
    DayOfMonth,
    Timezone,
    LastSent,
    NextSend,
    EmailSubject,
    EmailMessage,
    WhatsappMessage,
    ImageUrl,
    TotalSent,
    RunCount,
    LockedBy,
    LockedUntil,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ScheduleLead {
    #[sea_orm(iden = "schedule_leads")]
    Table,
    ScheduleId,
    LeadId,
}
