use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::batches::entities::BatchSummary;
use crate::models::users::responses::UserSummary;

// 课程状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub enum ClassStatus {
    #[default]
    Scheduled,
    Ongoing,
    Completed,
}

impl ClassStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassStatus::Scheduled => "scheduled",
            ClassStatus::Ongoing => "ongoing",
            ClassStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ClassStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ClassStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(ClassStatus::Scheduled),
            "ongoing" => Ok(ClassStatus::Ongoing),
            "completed" => Ok(ClassStatus::Completed),
            _ => Err(format!("Invalid class status: {s}")),
        }
    }
}

// 课程实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct Class {
    pub id: i64,
    pub class_name: String,
    pub batch_id: i64,
    pub trainer_id: i64,
    pub date: NaiveDate,
    /// HH:MM
    pub start_time: String,
    /// HH:MM
    pub end_time: String,
    pub teams_link: String,
    /// 空字符串表示尚无录像
    pub recording_link: String,
    pub status: ClassStatus,
    pub description: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Class {
    pub fn has_recording(&self) -> bool {
        !self.recording_link.is_empty()
    }
}

// 课程详情（批次与讲师已展开，批次被删除时为 null）
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct ClassDetail {
    pub id: i64,
    pub class_name: String,
    pub batch: Option<BatchSummary>,
    pub trainer: Option<UserSummary>,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub teams_link: String,
    pub recording_link: String,
    pub status: ClassStatus,
    pub description: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl ClassDetail {
    pub fn new(class: Class, batch: Option<BatchSummary>, trainer: Option<UserSummary>) -> Self {
        Self {
            id: class.id,
            class_name: class.class_name,
            batch,
            trainer,
            date: class.date,
            start_time: class.start_time,
            end_time: class.end_time,
            teams_link: class.teams_link,
            recording_link: class.recording_link,
            status: class.status,
            description: class.description,
            created_at: class.created_at,
            updated_at: class.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_default() {
        assert_eq!(ClassStatus::default(), ClassStatus::Scheduled);
        assert_eq!("ongoing".parse::<ClassStatus>(), Ok(ClassStatus::Ongoing));
        assert!("cancelled".parse::<ClassStatus>().is_err());
        let json = serde_json::to_string(&ClassStatus::Completed).expect("serialize");
        assert_eq!(json, "\"completed\"");
    }
}
