use chrono::NaiveDate;
use serde::Deserialize;
use ts_rs::TS;

use super::entities::ClassStatus;
use crate::models::common::date::{deserialize_date, deserialize_optional_date};

// 课程查询参数（来自HTTP请求）
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct ClassQueryParams {
    /// 批次 ID
    pub batch: Option<i64>,
    /// 讲师 ID
    pub trainer: Option<i64>,
    /// YYYY-MM-DD
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    #[ts(type = "string | null")]
    pub date: Option<NaiveDate>,
}

// 创建课程请求
//
// 讲师创建时 trainer_id 忽略，强制为当前讲师；管理员创建时必填。
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct CreateClassRequest {
    #[serde(alias = "className")]
    pub class_name: String,
    #[serde(alias = "batch", alias = "batchId")]
    pub batch_id: i64,
    #[serde(default, alias = "trainer", alias = "trainerId")]
    pub trainer_id: Option<i64>,
    #[serde(deserialize_with = "deserialize_date")]
    #[ts(type = "string")]
    pub date: NaiveDate,
    #[serde(alias = "startTime")]
    pub start_time: String,
    #[serde(alias = "endTime")]
    pub end_time: String,
    #[serde(alias = "teamsLink")]
    pub teams_link: String,
    #[serde(default)]
    pub description: Option<String>,
}

// 更新课程请求，字段缺失表示不修改
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct UpdateClassRequest {
    #[serde(alias = "className")]
    pub class_name: Option<String>,
    #[serde(alias = "batch", alias = "batchId")]
    pub batch_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    #[ts(type = "string | null")]
    pub date: Option<NaiveDate>,
    #[serde(alias = "startTime")]
    pub start_time: Option<String>,
    #[serde(alias = "endTime")]
    pub end_time: Option<String>,
    #[serde(alias = "teamsLink")]
    pub teams_link: Option<String>,
    #[serde(alias = "recordingLink")]
    pub recording_link: Option<String>,
    pub status: Option<ClassStatus>,
    pub description: Option<String>,
}

// 课程列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct ClassListQuery {
    pub batch_ids: Option<Vec<i64>>,
    pub trainer_id: Option<i64>,
    pub date: Option<NaiveDate>,
    /// 只返回有录像的课程
    pub with_recording: bool,
    /// 按日期倒序（录像列表）
    pub newest_first: bool,
}

// 存储层新建课程参数，已经过校验
#[derive(Debug, Clone)]
pub struct NewClass {
    pub class_name: String,
    pub batch_id: i64,
    pub trainer_id: i64,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub teams_link: String,
    pub description: String,
}

// 存储层课程字段变更，已经过校验
#[derive(Debug, Clone, Default)]
pub struct ClassChanges {
    pub class_name: Option<String>,
    pub batch_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub teams_link: Option<String>,
    pub recording_link: Option<String>,
    pub status: Option<ClassStatus>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_parse_date() {
        let params: ClassQueryParams =
            serde_json::from_str(r#"{"batch": 2, "date": "2025-05-01"}"#).expect("valid query");
        assert_eq!(params.batch, Some(2));
        assert_eq!(params.date, NaiveDate::from_ymd_opt(2025, 5, 1));
        assert_eq!(params.trainer, None);
    }

    #[test]
    fn test_create_request_camel_case_aliases() {
        let req: CreateClassRequest = serde_json::from_str(
            r#"{"className":"Intro","batch":3,"date":"2025-05-01","startTime":"09:00","endTime":"10:30","teamsLink":"https://teams.example.com/x"}"#,
        )
        .expect("valid body");
        assert_eq!(req.batch_id, 3);
        assert_eq!(req.trainer_id, None);
        assert_eq!(req.start_time, "09:00");
    }
}
