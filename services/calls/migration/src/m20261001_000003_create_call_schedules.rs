use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CallSchedules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CallSchedules::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CallSchedules::PatientId).uuid().not_null())
                    .col(ColumnDef::new(CallSchedules::DoctorId).uuid().not_null())
                    .col(
                        ColumnDef::new(CallSchedules::ScheduledAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CallSchedules::TimeLabel).string().not_null())
                    .col(ColumnDef::new(CallSchedules::Message).text().not_null())
                    .col(
                        ColumnDef::new(CallSchedules::SourceLanguage)
                            .string_len(8)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CallSchedules::LocalizedVariants)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CallSchedules::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(CallSchedules::ClaimedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(CallSchedules::ClaimToken).uuid())
                    .col(ColumnDef::new(CallSchedules::ProviderCallId).string())
                    .col(ColumnDef::new(CallSchedules::CompletedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(CallSchedules::ErrorMessage).text())
                    .col(
                        ColumnDef::new(CallSchedules::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CallSchedules::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(CallSchedules::Table, CallSchedules::PatientId)
                            .to(Patients::Table, Patients::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Dispatcher poll: pending rows by due time.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(CallSchedules::Table)
                    .col(CallSchedules::Status)
                    .col(CallSchedules::ScheduledAt)
                    .name("idx_call_schedules_status_scheduled_at")
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(CallSchedules::Table)
                    .col(CallSchedules::PatientId)
                    .col(CallSchedules::ScheduledAt)
                    .name("idx_call_schedules_patient_id_scheduled_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CallSchedules::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CallSchedules {
    Table,
    Id,
    PatientId,
    DoctorId,
    ScheduledAt,
    TimeLabel,
    Message,
    SourceLanguage,
    LocalizedVariants,
    Status,
    ClaimedAt,
    ClaimToken,
    ProviderCallId,
    CompletedAt,
    ErrorMessage,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Patients {
    Table,
    Id,
}
