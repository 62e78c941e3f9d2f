//! 身份注册 API
//!
//! HTTP层只做参数校验和状态转发；所有顺序约束由工作流状态机保证。
//! 工作流持在一把tokio锁后面，并发的注册请求在锁上排队而不是并发提交。

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    api::response::{success_response, ApiResponse},
    app_state::AppState,
    domain::identity::{RegistrationReceipt, UserProfile},
    error::AppError,
    metrics,
    service::registration_workflow::WorkflowState,
};

/// 注册请求体
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
}

impl RegisterRequest {
    fn validate(&self) -> Result<UserProfile, AppError> {
        let name = self.name.trim();
        let email = self.email.trim();

        if name.is_empty() {
            return Err(AppError::bad_request("name must not be empty"));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::bad_request("email must be a valid address"));
        }

        Ok(UserProfile {
            name: name.to_string(),
            email: email.to_string(),
        })
    }
}

/// 工作流状态响应
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub phase: &'static str,
    pub state: WorkflowState,
    pub account: Option<String>,
    pub network_id: Option<u64>,
    pub contract_address: Option<String>,
    pub last_receipt: Option<RegistrationReceipt>,
}

/// GET /api/v1/identity/state - 查询工作流当前状态
pub async fn get_state(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<StateResponse>>, AppError> {
    let workflow = state.workflow.lock().await;

    success_response(StateResponse {
        phase: workflow.phase().as_str(),
        state: workflow.state().clone(),
        account: workflow.account().map(|a| a.as_str().to_string()),
        network_id: workflow.network_id().map(|n| n.0),
        contract_address: workflow.contract_address().map(|a| a.to_string()),
        last_receipt: workflow.last_receipt().cloned(),
    })
}

/// POST /api/v1/identity/register - 发起一次注册
///
/// 仅在工作流处于Ready时受理；提交期间持锁，后到的请求排队
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<RegistrationReceipt>>, AppError> {
    let profile = request.validate()?;

    let mut workflow = state.workflow.lock().await;
    match workflow.register(profile).await {
        Ok(receipt) => {
            metrics::count_ok("identity_register");
            success_response(receipt)
        }
        Err(e) => {
            metrics::count_err("identity_register");
            Err(e.into())
        }
    }
}

/// POST /api/v1/identity/rearm - 从终态（Registered/Failed）回到Ready
///
/// 复用已绑定的合约句柄；连接阶段失败的会话无法重新武装
pub async fn rearm(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<StateResponse>>, AppError> {
    let mut workflow = state.workflow.lock().await;
    workflow.rearm()?;

    success_response(StateResponse {
        phase: workflow.phase().as_str(),
        state: workflow.state().clone(),
        account: workflow.account().map(|a| a.as_str().to_string()),
        network_id: workflow.network_id().map(|n| n.0),
        contract_address: workflow.contract_address().map(|a| a.to_string()),
        last_receipt: workflow.last_receipt().cloned(),
    })
}
