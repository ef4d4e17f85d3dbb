use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Prescriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Prescriptions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Prescriptions::PatientId).uuid().not_null())
                    .col(ColumnDef::new(Prescriptions::DoctorId).uuid().not_null())
                    .col(
                        ColumnDef::new(Prescriptions::MedicationName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Prescriptions::Dosage).string().not_null())
                    .col(
                        ColumnDef::new(Prescriptions::Morning)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Prescriptions::Afternoon)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Prescriptions::Evening)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Prescriptions::StartDate).date().not_null())
                    .col(ColumnDef::new(Prescriptions::EndDate).date())
                    .col(
                        ColumnDef::new(Prescriptions::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Prescriptions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Prescriptions::Table, Prescriptions::PatientId)
                            .to(Patients::Table, Patients::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Reminder sweep scans active prescriptions by date window.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(Prescriptions::Table)
                    .col(Prescriptions::IsActive)
                    .col(Prescriptions::StartDate)
                    .name("idx_prescriptions_is_active_start_date")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Prescriptions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Prescriptions {
    Table,
    Id,
    PatientId,
    DoctorId,
    MedicationName,
    Dosage,
    Morning,
    Afternoon,
    Evening,
    StartDate,
    EndDate,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum Patients {
    Table,
    Id,
}
