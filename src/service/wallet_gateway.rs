//! 钱包网关
//!
//! 钱包提供者是注入到运行环境中的不透明能力（账户授权 + 交易签名提交）。
//! 提供者缺失是可检测、可上报的条件，因此网关持有 `Option`——而不是
//! 在构造时直接失败。

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    domain::identity::{Account, FinalityStatus, NetworkId},
    error::WorkflowError,
};

/// 提供者层错误：区分"被拒"与"不可用/回滚"，由各阶段映射到领域错误
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// 签名方拒绝了本次请求
    #[error("request rejected by signer")]
    Rejected,

    /// RPC/网络不可用或请求失败
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// 待签名提交的交易：`to` 为 None 时是合约创建交易
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    pub from: Account,
    pub to: Option<String>,
    pub data: Vec<u8>,
}

/// 交易提交结果（已等待链上确认）
#[derive(Debug, Clone)]
pub struct TransactionOutcome {
    pub tx_hash: String,
    pub block_number: Option<u64>,
    pub status: FinalityStatus,
    /// 合约创建交易确认后的合约地址
    pub contract_address: Option<String>,
}

/// 钱包提供者边界：账户授权、网络查询、交易签名提交
///
/// 生产实现见 `EthersWalletProvider`；测试用替身实现同一trait
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// 请求账户授权（可能触发提供者自己的确认交互，挂起直到响应）
    async fn request_accounts(&self) -> Result<Vec<Account>, ProviderError>;

    /// 查询当前连接的网络id
    async fn network_id(&self) -> Result<NetworkId, ProviderError>;

    /// 签名并提交交易，挂起直到链上确认
    async fn send_transaction(
        &self,
        request: TransactionRequest,
    ) -> Result<TransactionOutcome, ProviderError>;
}

/// 已建立的钱包会话：账户与网络在会话内只写一次
#[derive(Debug, Clone)]
pub struct WalletSession {
    pub account: Account,
    pub network_id: NetworkId,
}

/// 钱包网关
pub struct WalletGateway {
    provider: Option<Arc<dyn WalletProvider>>,
}

impl WalletGateway {
    pub fn new(provider: Option<Arc<dyn WalletProvider>>) -> Self {
        Self { provider }
    }

    /// 返回已注入的提供者（连接成功后工作流用它签名提交交易）
    pub fn provider(&self) -> Option<Arc<dyn WalletProvider>> {
        self.provider.clone()
    }

    /// 连接钱包：请求授权并返回首个账户 + 当前网络id
    ///
    /// 首个授权账户即本会话的唯一签名账户；多账户场景不做处理
    pub async fn connect(&self) -> Result<WalletSession, WorkflowError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or(WorkflowError::NoWalletProvider)?;

        let accounts = provider.request_accounts().await.map_err(|e| {
            tracing::warn!(error = %e, "wallet authorization request failed");
            WorkflowError::AuthorizationDenied
        })?;

        let account = accounts
            .into_iter()
            .next()
            .ok_or(WorkflowError::AuthorizationDenied)?;

        let network_id = provider.network_id().await.map_err(|e| {
            tracing::warn!(error = %e, "network id query failed");
            WorkflowError::AuthorizationDenied
        })?;

        tracing::info!(account = %account, network_id = %network_id, "wallet connected");
        Ok(WalletSession {
            account,
            network_id,
        })
    }
}
