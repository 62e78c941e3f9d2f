//! 合约部署器
//!
//! 通过钱包提供者提交合约创建交易，挂起直到链上确认——这是整个系统
//! 延迟最高的一步（一个或多个区块确认）。
//!
//! 失败不自动重试：重复部署会在链上产生第二个合约实例，破坏"每个网络
//! 至多一个地址"这一不变量的意图。是否重试由调用方再次显式调用决定。

use std::sync::Arc;

use crate::{
    domain::{
        artifact::{ContractArtifact, ContractHandle},
        identity::{Account, FinalityStatus, NetworkId},
    },
    error::WorkflowError,
    metrics,
    service::wallet_gateway::{ProviderError, TransactionRequest, WalletProvider},
};

/// 合约部署器
pub struct ContractDeployer {
    provider: Arc<dyn WalletProvider>,
}

impl ContractDeployer {
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self { provider }
    }

    /// 用 `account` 签名提交创建交易，返回新实例的句柄与地址
    ///
    /// 返回的地址只作为会话内存中的部署记录；不回写编译产物
    pub async fn deploy(
        &self,
        artifact: &ContractArtifact,
        account: &Account,
        network_id: NetworkId,
    ) -> Result<(ContractHandle, String), WorkflowError> {
        let bytecode = artifact.creation_bytecode()?;

        tracing::info!(
            contract = %artifact.contract_name,
            network_id = %network_id,
            account = %account,
            "submitting contract creation transaction"
        );

        let outcome = self
            .provider
            .send_transaction(TransactionRequest {
                from: account.clone(),
                to: None,
                data: bytecode,
            })
            .await
            .map_err(|e| match e {
                ProviderError::Rejected => WorkflowError::DeploymentRejected,
                ProviderError::Unavailable(msg) => WorkflowError::DeploymentFailed(msg),
            })?;

        if outcome.status != FinalityStatus::Confirmed {
            return Err(WorkflowError::DeploymentFailed(format!(
                "creation transaction {} reverted",
                outcome.tx_hash
            )));
        }

        let address = outcome.contract_address.ok_or_else(|| {
            WorkflowError::DeploymentFailed(format!(
                "confirmed creation transaction {} carries no contract address",
                outcome.tx_hash
            ))
        })?;

        metrics::inc_deployment();
        tracing::info!(
            contract = %artifact.contract_name,
            address = %address,
            tx_hash = %outcome.tx_hash,
            network_id = %network_id,
            "contract deployed"
        );

        Ok((
            ContractHandle::bind(address.clone(), artifact.abi.clone(), network_id),
            address,
        ))
    }
}
