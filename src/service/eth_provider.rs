//! 以太坊钱包提供者（生产实现）
//!
//! 用本地签名密钥 + JSON-RPC提供者实现 `WalletProvider` 边界。
//! 未配置签名密钥即等价于"环境中没有钱包"，由网关上报而不是在这里报错。

use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, Bytes, TransactionRequest as EthTransactionRequest, U64},
};

use crate::{
    config::WalletConfig,
    domain::identity::{Account, FinalityStatus, NetworkId},
    service::wallet_gateway::{
        ProviderError, TransactionOutcome, TransactionRequest, WalletProvider,
    },
};

/// ethers签名中间件封装的钱包提供者
pub struct EthersWalletProvider {
    client: SignerMiddleware<Provider<Http>, LocalWallet>,
    chain_id: u64,
}

impl EthersWalletProvider {
    /// 从配置构建；未配置签名密钥时返回 `None`（提供者缺失）
    pub async fn from_config(config: &WalletConfig) -> Result<Option<Self>> {
        let Some(private_key) = config.private_key.as_deref() else {
            return Ok(None);
        };

        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .with_context(|| format!("Invalid RPC url: {}", config.rpc_url))?;

        let chain_id = provider
            .get_chainid()
            .await
            .context("Failed to query chain id from RPC")?
            .as_u64();

        let wallet = private_key
            .trim_start_matches("0x")
            .parse::<LocalWallet>()
            .context("Invalid wallet private key")?
            .with_chain_id(chain_id);

        tracing::info!(chain_id = chain_id, "ethereum wallet provider initialized");
        Ok(Some(Self {
            client: SignerMiddleware::new(provider, wallet),
            chain_id,
        }))
    }
}

#[async_trait]
impl WalletProvider for EthersWalletProvider {
    async fn request_accounts(&self) -> Result<Vec<Account>, ProviderError> {
        // 本地签名密钥只对应一个地址
        let address = self.client.signer().address();
        Ok(vec![Account::new(format!("{:#x}", address))])
    }

    async fn network_id(&self) -> Result<NetworkId, ProviderError> {
        Ok(NetworkId(self.chain_id))
    }

    async fn send_transaction(
        &self,
        request: TransactionRequest,
    ) -> Result<TransactionOutcome, ProviderError> {
        let from: Address = request
            .from
            .as_str()
            .parse()
            .map_err(|e| ProviderError::Unavailable(format!("invalid from address: {}", e)))?;

        let mut tx = EthTransactionRequest::new()
            .from(from)
            .data(Bytes::from(request.data));

        if let Some(to) = &request.to {
            let to: Address = to
                .parse()
                .map_err(|e| ProviderError::Unavailable(format!("invalid to address: {}", e)))?;
            tx = tx.to(to);
        }

        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        // 挂起直到链上确认；确认耗时无上界但通常只有数秒
        let receipt = pending
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?
            .ok_or_else(|| {
                ProviderError::Unavailable("transaction dropped from mempool".into())
            })?;

        let status = if receipt.status == Some(U64::from(1)) {
            FinalityStatus::Confirmed
        } else {
            FinalityStatus::Reverted
        };

        Ok(TransactionOutcome {
            tx_hash: format!("{:#x}", receipt.transaction_hash),
            block_number: receipt.block_number.map(|b| b.as_u64()),
            status,
            contract_address: receipt.contract_address.map(|a| format!("{:#x}", a)),
        })
    }
}
