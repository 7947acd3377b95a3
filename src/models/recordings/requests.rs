use serde::Deserialize;
use ts_rs::TS;

// 上传录像链接请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/recording.ts")]
pub struct UpdateRecordingRequest {
    #[serde(alias = "recordingLink")]
    pub recording_link: String,
}
