//! 数据模型定义
//!
//! 请求、响应与业务实体，对外的 JSON 结构同时导出 TypeScript 类型（ts-rs）。

pub mod auth;
pub mod batches;
pub mod classes;
pub mod common;
pub mod recordings;
pub mod users;

pub use common::{ApiResponse, ErrorCode, PaginatedResponse, PaginationInfo, PaginationQuery};

// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}
