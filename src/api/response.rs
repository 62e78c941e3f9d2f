//! 统一 API 响应格式
//!
//! 所有 API 接口应使用统一的响应格式：{ code, message, data }

use axum::Json;
use serde::Serialize;

use crate::error::AppError;

/// 统一成功响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: T,
}

/// 统一错误响应格式（已在 AppError 中实现）
/// 错误响应格式：{ code: "error_code", message: "error_message" }

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            message: "success".to_string(),
            data,
        }
    }
}

/// 辅助函数：将数据包装为统一响应格式
pub fn success_response<T: Serialize>(data: T) -> Result<Json<ApiResponse<T>>, AppError> {
    Ok(Json(ApiResponse::success(data)))
}
