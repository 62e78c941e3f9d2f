//! IdentiCore - 链上身份注册工作流后端
//!
//! 固定顺序的注册流水线：连接钱包 -> 解析/部署身份合约 -> 上传资料到
//! 内容寻址存储 -> 把CID提交上链。单一状态机承载全部顺序约束。

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod metrics;
pub mod service;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{AppError, AppErrorCode, ErrorKind, WorkflowError};

// 统一模块导出
pub mod prelude {
    pub use crate::{
        app_state::AppState,
        domain::identity::{Account, Cid, NetworkId, RegistrationReceipt, UserProfile},
        error::{AppError, ErrorKind, WorkflowError},
        service::registration_workflow::{RegistrationWorkflow, WorkflowPhase, WorkflowState},
    };
}
