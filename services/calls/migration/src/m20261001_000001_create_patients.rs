use sea_orm_migration::prelude::*;

/// The patient CRUD surface owns this table; created here only if absent so the
/// calls service can run against a fresh database.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Patients::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Patients::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Patients::DoctorId).uuid().not_null())
                    .col(ColumnDef::new(Patients::Name).string().not_null())
                    .col(ColumnDef::new(Patients::Phone).string())
                    .col(ColumnDef::new(Patients::PreferredLanguage).string_len(8))
                    .col(
                        ColumnDef::new(Patients::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Patients::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(Patients::Table)
                    .col(Patients::DoctorId)
                    .name("idx_patients_doctor_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Patients::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Patients {
    Table,
    Id,
    DoctorId,
    Name,
    Phone,
    PreferredLanguage,
    CreatedAt,
    UpdatedAt,
}
