use sea_orm::entity::prelude::*;

/// One medication reminder attempt. `(prescription_id, slot, reminder_date)` is unique,
/// which makes the insert itself the once-per-slot-per-day claim.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "reminder_sends")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub prescription_id: Uuid,
    pub patient_id: Uuid,
    pub slot: String,
    pub reminder_date: Date,
    pub status: String,
    pub provider_call_id: Option<String>,
    pub error_message: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::prescriptions::Entity",
        from = "Column::PrescriptionId",
        to = "super::prescriptions::Column::Id",
        on_delete = "Cascade"
    )]
    Prescription,
}

impl Related<super::prescriptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Prescription.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
