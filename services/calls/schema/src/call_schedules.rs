use sea_orm::entity::prelude::*;

/// A requested future call to a patient.
///
/// `status` moves out of `pending` exactly once. `claimed_at`/`claim_token` mark a
/// dispatcher's in-flight claim; only the holder of `claim_token` may finish it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "call_schedules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub scheduled_at: chrono::DateTime<chrono::Utc>,
    pub time_label: String,
    pub message: String,
    pub source_language: String,
    pub localized_variants: Json,
    pub status: String,
    pub claimed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub claim_token: Option<Uuid>,
    pub provider_call_id: Option<String>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub error_message: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::patients::Entity",
        from = "Column::PatientId",
        to = "super::patients::Column::Id",
        on_delete = "Cascade"
    )]
    Patient,
}

impl Related<super::patients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Patient.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
