use crate::errors::AcademyError;

// 业务错误码，随响应体中的 code 字段返回
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    Conflict = 1009,
    RateLimitExceeded = 1029,
    InternalServerError = 1500,

    // 认证
    AuthFailed = 2000,

    // 用户
    UserNotFound = 3000,
    UserAlreadyExists = 3001,
    UserEmailInvalid = 3002,
    UserPasswordInvalid = 3003,
    UserNameInvalid = 3004,
    UserCreationFailed = 3005,
    UserUpdateFailed = 3006,
    UserDeleteFailed = 3007,
    CanNotDeleteCurrentUser = 3008,

    // 批次
    BatchNotFound = 4000,
    BatchInvalid = 4001,
    BatchStudentsInvalid = 4002,
    BatchVersionConflict = 4003,
    BatchPermissionDenied = 4004,

    // 课程与录播
    ClassNotFound = 5000,
    ClassInvalid = 5001,
    ClassPermissionDenied = 5002,
    RecordingInvalid = 5003,
}

impl ErrorCode {
    /// 将存储层 / 服务层错误映射为通用业务码
    pub fn from_error(err: &AcademyError) -> Self {
        match err {
            AcademyError::Validation(_) | AcademyError::DateParse(_) => ErrorCode::BadRequest,
            AcademyError::NotFound(_) => ErrorCode::NotFound,
            AcademyError::Conflict(_) => ErrorCode::Conflict,
            AcademyError::Authentication(_) => ErrorCode::Unauthorized,
            AcademyError::Authorization(_) => ErrorCode::Forbidden,
            _ => ErrorCode::InternalServerError,
        }
    }
}
