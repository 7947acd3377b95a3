use super::entities::UserRole;
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

// 用户查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UserListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub role: Option<UserRole>,
    pub search: Option<String>,
}

// 用户创建请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: UserRole,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub profile_image: Option<String>,
    /// 仅学员可指定，创建后加入该批次
    #[serde(alias = "batch")]
    pub batch_id: Option<i64>,
}

fn default_role() -> UserRole {
    UserRole::Learner
}

// 用户更新请求
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub profile_image: Option<String>,
    #[serde(alias = "batch")]
    pub batch_id: Option<i64>,
}

// 分配批次请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct AssignBatchRequest {
    #[serde(alias = "batchId", alias = "batch")]
    pub batch_id: i64,
}

// 用户列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct UserListQuery {
    pub page: u64,
    pub size: u64,
    pub role: Option<UserRole>,
    pub search: Option<String>,
}

// 存储层更新字段，已经过校验
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub profile_image: Option<String>,
    /// 迁入的批次，与字段更新在同一事务内追加
    pub batch_id: Option<i64>,
}
