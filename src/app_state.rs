use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    config::Config,
    domain::artifact::ContractArtifact,
    service::{
        registration_workflow::{RegistrationWorkflow, WorkflowSettings},
        storage_client::IpfsStorageClient,
        wallet_gateway::{WalletGateway, WalletProvider},
        EthersWalletProvider,
    },
};

/// 应用状态
/// 包含所有共享资源
#[derive(Clone)]
pub struct AppState {
    /// 工作流单实例：阶段互斥由这把锁保证，HTTP层不做并发提交
    pub workflow: Arc<Mutex<RegistrationWorkflow>>,
    pub config: Arc<Config>,
}

impl AppState {
    /// 创建新的应用状态
    pub async fn new(config: Arc<Config>) -> anyhow::Result<Self> {
        // 钱包提供者：未配置签名密钥时为 None，工作流启动时上报
        let provider: Option<Arc<dyn WalletProvider>> =
            match EthersWalletProvider::from_config(&config.wallet).await? {
                Some(provider) => Some(Arc::new(provider)),
                None => {
                    tracing::warn!("no wallet signing key configured, provider absent");
                    None
                }
            };
        let gateway = WalletGateway::new(provider);

        let store = Arc::new(IpfsStorageClient::new(&config.storage));

        let artifact = ContractArtifact::from_file(&config.contract.artifact_path)?;
        tracing::info!(
            contract = %artifact.contract_name,
            networks = artifact.networks.len(),
            "contract artifact loaded"
        );

        let settings = WorkflowSettings {
            gateway_base: config.storage.gateway_base.clone(),
            deployment_policy: config.contract.deployment_policy,
        };

        let workflow = RegistrationWorkflow::new(gateway, store, artifact, settings);

        Ok(Self {
            workflow: Arc::new(Mutex::new(workflow)),
            config,
        })
    }
}
