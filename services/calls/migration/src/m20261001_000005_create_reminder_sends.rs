use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReminderSends::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReminderSends::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReminderSends::PrescriptionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReminderSends::PatientId).uuid().not_null())
                    .col(ColumnDef::new(ReminderSends::Slot).string_len(16).not_null())
                    .col(ColumnDef::new(ReminderSends::ReminderDate).date().not_null())
                    .col(ColumnDef::new(ReminderSends::Status).string_len(16).not_null())
                    .col(ColumnDef::new(ReminderSends::ProviderCallId).string())
                    .col(ColumnDef::new(ReminderSends::ErrorMessage).text())
                    .col(
                        ColumnDef::new(ReminderSends::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ReminderSends::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ReminderSends::Table, ReminderSends::PrescriptionId)
                            .to(Prescriptions::Table, Prescriptions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The unique key is the once-per-slot-per-day guard.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(ReminderSends::Table)
                    .col(ReminderSends::PrescriptionId)
                    .col(ReminderSends::Slot)
                    .col(ReminderSends::ReminderDate)
                    .unique()
                    .name("uq_reminder_sends_prescription_slot_date")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReminderSends::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ReminderSends {
    Table,
    Id,
    PrescriptionId,
    PatientId,
    Slot,
    ReminderDate,
    Status,
    ProviderCallId,
    ErrorMessage,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Prescriptions {
    Table,
    Id,
}
