//! 批次实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "batches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub subject: String,
    pub trainer_id: Option<i64>,
    pub start_date: i64,
    pub end_date: i64,
    pub version: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::TrainerId",
        to = "super::users::Column::Id"
    )]
    Trainer,
    #[sea_orm(has_many = "super::batch_students::Entity")]
    BatchStudents,
}

impl Related<super::batch_students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BatchStudents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型，student_ids 由调用方按 position 顺序提供
impl Model {
    pub fn into_batch(self, student_ids: Vec<i64>) -> crate::models::batches::entities::Batch {
        use crate::models::batches::entities::Batch;
        use crate::models::common::date::timestamp_to_date;
        use chrono::{DateTime, Utc};

        Batch {
            id: self.id,
            name: self.name,
            subject: self.subject,
            trainer_id: self.trainer_id,
            student_ids,
            start_date: timestamp_to_date(self.start_date),
            end_date: timestamp_to_date(self.end_date),
            version: self.version,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }

    pub fn into_summary(self) -> crate::models::batches::entities::BatchSummary {
        crate::models::batches::entities::BatchSummary {
            id: self.id,
            name: self.name,
            subject: self.subject,
        }
    }
}
