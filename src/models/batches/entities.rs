use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::users::responses::UserSummary;

// 批次实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
pub struct Batch {
    pub id: i64,
    pub name: String,
    pub subject: String,
    pub trainer_id: Option<i64>,
    /// 有序的学员 ID 列表
    pub student_ids: Vec<i64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// 乐观并发版本号，每次成员变更递增
    pub version: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// 批次详情（讲师与学员已展开）
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
pub struct BatchDetail {
    pub id: i64,
    pub name: String,
    pub subject: String,
    pub trainer: Option<UserSummary>,
    pub students: Vec<UserSummary>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub version: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl BatchDetail {
    pub fn student_ids(&self) -> Vec<i64> {
        self.students.iter().map(|s| s.id).collect()
    }
}

// 课程中展示的批次摘要
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
pub struct BatchSummary {
    pub id: i64,
    pub name: String,
    pub subject: String,
}

impl From<&Batch> for BatchSummary {
    fn from(batch: &Batch) -> Self {
        Self {
            id: batch.id,
            name: batch.name.clone(),
            subject: batch.subject.clone(),
        }
    }
}
