use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CallLogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CallLogs::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(CallLogs::ProviderCallId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(CallLogs::ScheduleId).uuid())
                    .col(ColumnDef::new(CallLogs::PatientId).uuid())
                    .col(ColumnDef::new(CallLogs::DoctorId).uuid())
                    .col(ColumnDef::new(CallLogs::Purpose).string_len(16).not_null())
                    .col(ColumnDef::new(CallLogs::PatientName).string().not_null())
                    .col(ColumnDef::new(CallLogs::Phone).string().not_null())
                    .col(ColumnDef::new(CallLogs::ScheduledAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(CallLogs::StartedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(CallLogs::EndedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(CallLogs::DurationSeconds).integer())
                    .col(ColumnDef::new(CallLogs::EndedReason).string())
                    .col(ColumnDef::new(CallLogs::Transcript).text())
                    .col(ColumnDef::new(CallLogs::Summary).text())
                    .col(ColumnDef::new(CallLogs::RecordingUrl).string())
                    .col(
                        ColumnDef::new(CallLogs::Status)
                            .string_len(16)
                            .not_null()
                            .default("initiated"),
                    )
                    .col(
                        ColumnDef::new(CallLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CallLogs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(CallLogs::Table, CallLogs::ScheduleId)
                            .to(CallSchedules::Table, CallSchedules::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(CallLogs::Table, CallLogs::PatientId)
                            .to(Patients::Table, Patients::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(CallLogs::Table)
                    .col(CallLogs::PatientId)
                    .col((CallLogs::CreatedAt, IndexOrder::Desc))
                    .name("idx_call_logs_patient_id_created_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CallLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CallLogs {
    Table,
    Id,
    ProviderCallId,
    ScheduleId,
    PatientId,
    DoctorId,
    Purpose,
    PatientName,
    Phone,
    ScheduledAt,
    StartedAt,
    EndedAt,
    DurationSeconds,
    EndedReason,
    Transcript,
    Summary,
    RecordingUrl,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CallSchedules {
    Table,
    Id,
}

#[derive(Iden)]
enum Patients {
    Table,
    Id,
}
