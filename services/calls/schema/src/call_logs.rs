use sea_orm::entity::prelude::*;

/// One call actually placed through the voice provider.
///
/// Name and phone are snapshots taken at dial time.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "call_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub provider_call_id: String,
    pub schedule_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub purpose: String,
    pub patient_name: String,
    pub phone: String,
    pub scheduled_at: Option<chrono::DateTime<chrono::Utc>>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub ended_at: Option<chrono::DateTime<chrono::Utc>>,
    pub duration_seconds: Option<i32>,
    pub ended_reason: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub recording_url: Option<String>,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::call_schedules::Entity",
        from = "Column::ScheduleId",
        to = "super::call_schedules::Column::Id",
        on_delete = "Cascade"
    )]
    CallSchedule,
}

impl Related<super::call_schedules::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CallSchedule.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
