use super::entities::BatchDetail;
use serde::Serialize;
use ts_rs::TS;

// 批次响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
pub struct BatchResponse {
    pub batch: BatchDetail,
}

// 批次列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/batch.ts")]
pub struct BatchListResponse {
    pub items: Vec<BatchDetail>,
}
