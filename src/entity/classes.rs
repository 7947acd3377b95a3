//! 课程实体
//!
//! batch_id / trainer_id 不建外键，批次删除后课程保留。

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "classes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub class_name: String,
    pub batch_id: i64,
    pub trainer_id: i64,
    pub date: i64,
    pub start_time: String,
    pub end_time: String,
    pub teams_link: String,
    pub recording_link: String,
    pub status: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_class(self) -> crate::models::classes::entities::Class {
        use crate::models::classes::entities::{Class, ClassStatus};
        use crate::models::common::date::timestamp_to_date;
        use chrono::{DateTime, Utc};

        Class {
            id: self.id,
            class_name: self.class_name,
            batch_id: self.batch_id,
            trainer_id: self.trainer_id,
            date: timestamp_to_date(self.date),
            start_time: self.start_time,
            end_time: self.end_time,
            teams_link: self.teams_link,
            recording_link: self.recording_link,
            status: self.status.parse::<ClassStatus>().unwrap_or_default(),
            description: self.description,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
