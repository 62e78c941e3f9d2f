//! 错误类型定义
//!
//! 分两层：`WorkflowError` 是注册工作流的领域错误分类（每个组件上报
//! 具体错误种类而非笼统失败），`AppError` 是HTTP层的统一错误响应。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::identity::NetworkId;

/// 错误大类：决定恢复策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// 运行环境缺陷（无钱包提供者），用户不装钱包无法恢复
    Environment,
    /// 用户拒绝授权，可重新发起连接恢复
    Authorization,
    /// 合约解析/部署问题，需显式重新部署恢复
    Resolution,
    /// 交易被拒或回滚，可从Ready重新提交恢复
    Transaction,
    /// 存储服务异常，内容寻址幂等，重传安全
    Storage,
    /// 工作流使用错误（状态不满足前置条件）
    Workflow,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Environment => "environment",
            ErrorKind::Authorization => "authorization",
            ErrorKind::Resolution => "resolution",
            ErrorKind::Transaction => "transaction",
            ErrorKind::Storage => "storage",
            ErrorKind::Workflow => "workflow",
        }
    }

    /// 该类错误是否可由调用方重新进入状态机恢复
    pub fn recoverable(&self) -> bool {
        match self {
            ErrorKind::Environment => false,
            ErrorKind::Authorization => true,
            ErrorKind::Resolution => true,
            ErrorKind::Transaction => true,
            ErrorKind::Storage => true,
            ErrorKind::Workflow => false,
        }
    }
}

/// 注册工作流领域错误
///
/// 核心不做任何静默重试；所有失败都转换为可观察的Failed状态，
/// 重试一律由调用方从合适的状态重新进入
#[derive(Debug, Clone, thiserror::Error)]
pub enum WorkflowError {
    #[error("no wallet provider available in this environment")]
    NoWalletProvider,

    #[error("wallet authorization denied")]
    AuthorizationDenied,

    #[error("contract has no deployment on network {0}")]
    DeploymentNeeded(NetworkId),

    #[error("contract deployment rejected by signer")]
    DeploymentRejected,

    #[error("contract deployment failed: {0}")]
    DeploymentFailed(String),

    #[error("storage service unavailable: {0}")]
    StorageUnavailable(String),

    #[error("transaction rejected by signer")]
    TransactionRejected,

    #[error("transaction failed: {0}")]
    TransactionFailed(String),

    #[error("contract instance not loaded")]
    ContractNotLoaded,

    #[error("invalid workflow transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::NoWalletProvider => ErrorKind::Environment,
            WorkflowError::AuthorizationDenied => ErrorKind::Authorization,
            WorkflowError::DeploymentNeeded(_)
            | WorkflowError::DeploymentRejected
            | WorkflowError::DeploymentFailed(_) => ErrorKind::Resolution,
            WorkflowError::TransactionRejected | WorkflowError::TransactionFailed(_) => {
                ErrorKind::Transaction
            }
            WorkflowError::StorageUnavailable(_) => ErrorKind::Storage,
            WorkflowError::ContractNotLoaded | WorkflowError::InvalidTransition { .. } => {
                ErrorKind::Workflow
            }
        }
    }
}

/// HTTP层错误码
#[derive(Debug, Clone)]
pub enum AppErrorCode {
    // HTTP 基础错误码
    BadRequest,
    Conflict,
    Internal,

    // 业务错误码
    WalletUnavailable,
    AuthorizationDenied,
    DeploymentNeeded,
    DeploymentRejected,
    DeploymentFailed,
    StorageUnavailable,
    TransactionRejected,
    TransactionFailed,
    ContractNotLoaded,
    InvalidWorkflowState,
}

/// HTTP层统一错误响应
#[derive(Debug, Clone)]
pub struct AppError {
    pub code: AppErrorCode,
    pub message: String,
    pub status: StatusCode,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code_str = match self.code {
            AppErrorCode::BadRequest => "bad_request",
            AppErrorCode::Conflict => "conflict",
            AppErrorCode::Internal => "internal",
            AppErrorCode::WalletUnavailable => "wallet_unavailable",
            AppErrorCode::AuthorizationDenied => "authorization_denied",
            AppErrorCode::DeploymentNeeded => "deployment_needed",
            AppErrorCode::DeploymentRejected => "deployment_rejected",
            AppErrorCode::DeploymentFailed => "deployment_failed",
            AppErrorCode::StorageUnavailable => "storage_unavailable",
            AppErrorCode::TransactionRejected => "transaction_rejected",
            AppErrorCode::TransactionFailed => "transaction_failed",
            AppErrorCode::ContractNotLoaded => "contract_not_loaded",
            AppErrorCode::InvalidWorkflowState => "invalid_workflow_state",
        };
        let body = ErrorBody {
            code: code_str,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::BadRequest,
            message: msg.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::Internal,
            message: msg.into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        let (code, status) = match &err {
            WorkflowError::NoWalletProvider => (
                AppErrorCode::WalletUnavailable,
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            WorkflowError::AuthorizationDenied => {
                (AppErrorCode::AuthorizationDenied, StatusCode::FORBIDDEN)
            }
            WorkflowError::DeploymentNeeded(_) => {
                (AppErrorCode::DeploymentNeeded, StatusCode::CONFLICT)
            }
            WorkflowError::DeploymentRejected => {
                (AppErrorCode::DeploymentRejected, StatusCode::FORBIDDEN)
            }
            WorkflowError::DeploymentFailed(_) => {
                (AppErrorCode::DeploymentFailed, StatusCode::BAD_GATEWAY)
            }
            WorkflowError::StorageUnavailable(_) => (
                AppErrorCode::StorageUnavailable,
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            WorkflowError::TransactionRejected => {
                (AppErrorCode::TransactionRejected, StatusCode::FORBIDDEN)
            }
            WorkflowError::TransactionFailed(_) => {
                (AppErrorCode::TransactionFailed, StatusCode::BAD_GATEWAY)
            }
            WorkflowError::ContractNotLoaded => {
                (AppErrorCode::ContractNotLoaded, StatusCode::CONFLICT)
            }
            WorkflowError::InvalidTransition { .. } => {
                (AppErrorCode::InvalidWorkflowState, StatusCode::CONFLICT)
            }
        };
        Self {
            code,
            message: err.to_string(),
            status,
        }
    }
}
