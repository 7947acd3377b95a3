use chrono::NaiveDate;
use serde::Deserialize;
use ts_rs::TS;

use crate::models::common::date::{deserialize_date, deserialize_double_option, deserialize_optional_date};

// 创建批次请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
pub struct CreateBatchRequest {
    pub name: String,
    pub subject: String,
    #[serde(default, alias = "trainer", alias = "trainerId")]
    pub trainer_id: Option<i64>,
    #[serde(alias = "startDate", deserialize_with = "deserialize_date")]
    #[ts(type = "string")]
    pub start_date: NaiveDate,
    #[serde(alias = "endDate", deserialize_with = "deserialize_date")]
    #[ts(type = "string")]
    pub end_date: NaiveDate,
}

// 更新批次请求，字段缺失表示不修改
//
// trainer_id 显式传 null 时解除讲师绑定；
// students 存在时按同步语义整体替换成员列表。
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
pub struct UpdateBatchRequest {
    pub name: Option<String>,
    pub subject: Option<String>,
    #[serde(
        default,
        alias = "trainer",
        alias = "trainerId",
        deserialize_with = "deserialize_double_option"
    )]
    #[ts(optional, type = "number | null")]
    pub trainer_id: Option<Option<i64>>,
    #[serde(
        default,
        alias = "startDate",
        deserialize_with = "deserialize_optional_date"
    )]
    #[ts(type = "string | null")]
    pub start_date: Option<NaiveDate>,
    #[serde(
        default,
        alias = "endDate",
        deserialize_with = "deserialize_optional_date"
    )]
    #[ts(type = "string | null")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, alias = "studentIds")]
    #[ts(type = "number[] | null")]
    pub students: Option<serde_json::Value>,
    /// 客户端持有的批次版本号，不一致时返回冲突
    #[serde(default)]
    pub version: Option<i64>,
}

// 批量学员操作请求（add / sync / remove）
//
// 原样保留 JSON 值，由 `parse_student_ids` 校验格式。
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
pub struct StudentIdsRequest {
    #[serde(default, rename = "studentIds", alias = "student_ids")]
    #[ts(type = "number[]")]
    pub student_ids: serde_json::Value,
    #[serde(default)]
    pub version: Option<i64>,
}

// 存储层批次字段变更，已经过校验
#[derive(Debug, Clone, Default)]
pub struct BatchChanges {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub trainer_id: Option<Option<i64>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl BatchChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.subject.is_none()
            && self.trainer_id.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_distinguishes_null_trainer() {
        let cleared: UpdateBatchRequest =
            serde_json::from_str(r#"{"trainer": null}"#).expect("valid body");
        assert_eq!(cleared.trainer_id, Some(None));

        let untouched: UpdateBatchRequest = serde_json::from_str("{}").expect("valid body");
        assert_eq!(untouched.trainer_id, None);
        assert!(untouched.students.is_none());
    }

    #[test]
    fn test_create_request_accepts_camel_case() {
        let req: CreateBatchRequest = serde_json::from_str(
            r#"{"name":"B1","subject":"Rust","trainer":7,"startDate":"2025-01-06","endDate":"2025-03-28T00:00:00Z"}"#,
        )
        .expect("valid body");
        assert_eq!(req.trainer_id, Some(7));
        assert_eq!(req.end_date, NaiveDate::from_ymd_opt(2025, 3, 28).expect("date"));
    }

    #[test]
    fn test_student_ids_missing_is_null() {
        let req: StudentIdsRequest = serde_json::from_str("{}").expect("valid body");
        assert!(req.student_ids.is_null());
    }
}
