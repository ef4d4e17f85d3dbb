use sea_orm_migration::prelude::*;

mod m20261001_000001_create_patients;
mod m20261001_000002_create_prescriptions;
mod m20261001_000003_create_call_schedules;
mod m20261001_000004_create_call_logs;
mod m20261001_000005_create_reminder_sends;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_patients::Migration),
            Box::new(m20261001_000002_create_prescriptions::Migration),
            Box::new(m20261001_000003_create_call_schedules::Migration),
            Box::new(m20261001_000004_create_call_logs::Migration),
            Box::new(m20261001_000005_create_reminder_sends::Migration),
        ]
    }
}
