//! 录像：课程上的录像链接

pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::recordings::requests::UpdateRecordingRequest;
use crate::storage::Storage;

pub struct RecordingService {
    storage: Option<Arc<dyn Storage>>,
}

impl RecordingService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    pub async fn list_recordings(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_recordings(self, request).await
    }

    // 设置录像链接，课程标记为已完成
    pub async fn upload_recording(
        &self,
        class_id: i64,
        body: UpdateRecordingRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::set_recording(self, class_id, Some(body.recording_link), request).await
    }

    // 清除录像链接
    pub async fn delete_recording(
        &self,
        class_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::set_recording(self, class_id, None, request).await
    }
}
