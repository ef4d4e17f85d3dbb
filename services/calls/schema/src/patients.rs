use sea_orm::entity::prelude::*;

/// Patient record. Written by the patient CRUD surface; read-only here.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "patients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub preferred_language: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::call_schedules::Entity")]
    CallSchedules,
    #[sea_orm(has_many = "super::prescriptions::Entity")]
    Prescriptions,
}

impl Related<super::call_schedules::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CallSchedules.def()
    }
}

impl Related<super::prescriptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Prescriptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
