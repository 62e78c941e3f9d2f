//! 注册工作流状态机
//!
//! 单一权威当前状态 + 集中校验的转换函数；UI层订阅状态而不持有逻辑。
//! 每个阶段（连接钱包、解析、部署、上传、提交）都是一个挂起点：工作流
//! 等待外部响应时让出控制权，同一实例内任何两个阶段都不会并发执行。
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> Resolving -> Ready
//!                                            Resolving -> Deploying -> Ready
//! Ready -> Submitting -> Registered | Failed
//! Registered | Failed -> Ready   （重新武装，复用已绑定的合约句柄）
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    config::DeploymentPolicy,
    domain::{
        artifact::{ContractArtifact, ContractHandle},
        identity::{Account, Cid, FinalityStatus, NetworkId, RegistrationReceipt, UserProfile},
    },
    error::{ErrorKind, WorkflowError},
    metrics,
    service::{
        contract_deployer::ContractDeployer,
        contract_resolver::{ContractResolver, Resolution},
        storage_client::{gateway_link, ContentStore},
        wallet_gateway::{
            ProviderError, TransactionRequest, WalletGateway, WalletProvider, WalletSession,
        },
    },
};

/// 工作流阶段（不携带数据的状态判别）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    Disconnected,
    Connecting,
    Connected,
    Resolving,
    Deploying,
    Ready,
    Submitting,
    Registered,
    Failed,
}

impl WorkflowPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowPhase::Disconnected => "disconnected",
            WorkflowPhase::Connecting => "connecting",
            WorkflowPhase::Connected => "connected",
            WorkflowPhase::Resolving => "resolving",
            WorkflowPhase::Deploying => "deploying",
            WorkflowPhase::Ready => "ready",
            WorkflowPhase::Submitting => "submitting",
            WorkflowPhase::Registered => "registered",
            WorkflowPhase::Failed => "failed",
        }
    }

    /// 单次尝试的终态（会话可从这里重新武装回Ready）
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowPhase::Registered | WorkflowPhase::Failed)
    }

    /// 校验状态转换是否合法
    ///
    /// # 状态转换规则
    /// ```text
    /// Disconnected -> Connecting
    /// Connecting   -> Connected | Failed
    /// Connected    -> Resolving
    /// Resolving    -> Ready | Deploying | Failed
    /// Deploying    -> Ready | Failed
    /// Ready        -> Submitting
    /// Submitting   -> Registered | Failed
    /// Registered   -> Ready   （重新武装）
    /// Failed       -> Ready   （重新武装，仅在合约句柄仍然有效时）
    ///
    /// 其他转换均不允许
    /// ```
    pub fn validate_transition(from: WorkflowPhase, to: WorkflowPhase) -> Result<(), WorkflowError> {
        // 相同状态：幂等性，允许
        if from == to {
            return Ok(());
        }

        let valid = match from {
            WorkflowPhase::Disconnected => matches!(to, WorkflowPhase::Connecting),
            WorkflowPhase::Connecting => {
                matches!(to, WorkflowPhase::Connected | WorkflowPhase::Failed)
            }
            WorkflowPhase::Connected => matches!(to, WorkflowPhase::Resolving),
            WorkflowPhase::Resolving => matches!(
                to,
                WorkflowPhase::Ready | WorkflowPhase::Deploying | WorkflowPhase::Failed
            ),
            WorkflowPhase::Deploying => {
                matches!(to, WorkflowPhase::Ready | WorkflowPhase::Failed)
            }
            WorkflowPhase::Ready => matches!(to, WorkflowPhase::Submitting),
            WorkflowPhase::Submitting => {
                matches!(to, WorkflowPhase::Registered | WorkflowPhase::Failed)
            }
            WorkflowPhase::Registered | WorkflowPhase::Failed => {
                matches!(to, WorkflowPhase::Ready)
            }
        };

        if valid {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                from: from.as_str(),
                to: to.as_str(),
            })
        }
    }
}

/// 工作流状态（携带各阶段的数据）
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum WorkflowState {
    Disconnected,
    Connecting,
    Connected {
        account: Account,
        network_id: NetworkId,
    },
    Resolving,
    Deploying,
    Ready {
        contract_address: String,
    },
    Submitting,
    Registered {
        cid: Cid,
        tx_hash: String,
    },
    Failed {
        kind: ErrorKind,
        message: String,
    },
}

impl WorkflowState {
    pub fn phase(&self) -> WorkflowPhase {
        match self {
            WorkflowState::Disconnected => WorkflowPhase::Disconnected,
            WorkflowState::Connecting => WorkflowPhase::Connecting,
            WorkflowState::Connected { .. } => WorkflowPhase::Connected,
            WorkflowState::Resolving => WorkflowPhase::Resolving,
            WorkflowState::Deploying => WorkflowPhase::Deploying,
            WorkflowState::Ready { .. } => WorkflowPhase::Ready,
            WorkflowState::Submitting => WorkflowPhase::Submitting,
            WorkflowState::Registered { .. } => WorkflowPhase::Registered,
            WorkflowState::Failed { .. } => WorkflowPhase::Failed,
        }
    }
}

/// 工作流级配置
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// 公共网关基地址（回执链接推导用）
    pub gateway_base: String,
    /// 无部署记录时的决策策略
    pub deployment_policy: DeploymentPolicy,
}

/// 注册工作流
///
/// 会话级字段（signer/session/contract）各写一次，之后只读；
/// 单次注册数据（资料、CID）每次尝试重新创建，结束即丢弃
pub struct RegistrationWorkflow {
    gateway: WalletGateway,
    store: Arc<dyn ContentStore>,
    artifact: ContractArtifact,
    settings: WorkflowSettings,

    state: WorkflowState,
    signer: Option<Arc<dyn WalletProvider>>,
    session: Option<WalletSession>,
    contract: Option<ContractHandle>,
    last_receipt: Option<RegistrationReceipt>,
}

impl RegistrationWorkflow {
    pub fn new(
        gateway: WalletGateway,
        store: Arc<dyn ContentStore>,
        artifact: ContractArtifact,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            gateway,
            store,
            artifact,
            settings,
            state: WorkflowState::Disconnected,
            signer: None,
            session: None,
            contract: None,
            last_receipt: None,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.state.phase()
    }

    pub fn account(&self) -> Option<&Account> {
        self.session.as_ref().map(|s| &s.account)
    }

    pub fn network_id(&self) -> Option<NetworkId> {
        self.session.as_ref().map(|s| s.network_id)
    }

    pub fn contract_address(&self) -> Option<&str> {
        self.contract.as_ref().map(|c| c.address())
    }

    pub fn last_receipt(&self) -> Option<&RegistrationReceipt> {
        self.last_receipt.as_ref()
    }

    /// 公共网关链接推导（核心输出，UI直接展示）
    pub fn gateway_link(&self, cid: &Cid) -> String {
        gateway_link(&self.settings.gateway_base, cid)
    }

    /// 启动工作流：连接钱包 -> 解析网络 -> 解析/部署合约
    ///
    /// 会话内只调用一次；连接阶段的失败是会话级终态，只能整体重启
    pub async fn start(&mut self) -> Result<(), WorkflowError> {
        self.transition(WorkflowState::Connecting)?;

        let session = match self.gateway.connect().await {
            Ok(session) => session,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };

        // connect() 成功则提供者必然已注入
        let signer = self
            .gateway
            .provider()
            .ok_or(WorkflowError::NoWalletProvider)?;

        self.transition(WorkflowState::Connected {
            account: session.account.clone(),
            network_id: session.network_id,
        })?;
        self.transition(WorkflowState::Resolving)?;

        let handle = match ContractResolver::resolve(session.network_id, &self.artifact) {
            Resolution::Bound(handle) => handle,
            Resolution::DeploymentNeeded => match self.settings.deployment_policy {
                DeploymentPolicy::DeployIfMissing => {
                    self.transition(WorkflowState::Deploying)?;
                    let deployer = ContractDeployer::new(signer.clone());
                    match deployer
                        .deploy(&self.artifact, &session.account, session.network_id)
                        .await
                    {
                        Ok((handle, _address)) => handle,
                        Err(e) => {
                            self.fail(&e);
                            return Err(e);
                        }
                    }
                }
                DeploymentPolicy::RequireExisting => {
                    let e = WorkflowError::DeploymentNeeded(session.network_id);
                    self.fail(&e);
                    return Err(e);
                }
            },
        };

        let contract_address = handle.address().to_string();
        self.signer = Some(signer);
        self.session = Some(session);
        self.contract = Some(handle);
        self.transition(WorkflowState::Ready {
            contract_address: contract_address.clone(),
        })?;

        tracing::info!(contract_address = %contract_address, "registration workflow ready");
        Ok(())
    }

    /// 执行一次注册：序列化 -> 上传 -> 提交上链 -> 等待确认（严格顺序）
    ///
    /// 仅允许从Ready发起；Ready之前的注册动作直接拒绝，不排队、不缓冲。
    /// 上传失败立即短路，绝不触达合约。
    pub async fn register(
        &mut self,
        profile: UserProfile,
    ) -> Result<RegistrationReceipt, WorkflowError> {
        if self.state.phase() != WorkflowPhase::Ready {
            return Err(WorkflowError::ContractNotLoaded);
        }

        let (contract, signer, account) = match (&self.contract, &self.signer, &self.session) {
            (Some(contract), Some(signer), Some(session)) => {
                (contract.clone(), signer.clone(), session.account.clone())
            }
            _ => return Err(WorkflowError::ContractNotLoaded),
        };

        self.transition(WorkflowState::Submitting)?;
        let attempt_id = Uuid::new_v4();
        tracing::info!(attempt_id = %attempt_id, "registration attempt started");

        // (1) 序列化资料
        let payload = match profile.to_bytes() {
            Ok(payload) => payload,
            Err(e) => {
                let err =
                    WorkflowError::StorageUnavailable(format!("profile serialization failed: {}", e));
                self.fail(&err);
                return Err(err);
            }
        };

        // (2) 上传到存储网络
        let cid = match self.store.store(payload).await {
            Ok(cid) => cid,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };

        // (3) 以会话账户签名，把CID提交给合约
        let call_data = match contract.register_call_data(&cid) {
            Ok(data) => data,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };

        let outcome = match signer
            .send_transaction(TransactionRequest {
                from: account,
                to: Some(contract.address().to_string()),
                data: call_data,
            })
            .await
        {
            Ok(outcome) => outcome,
            Err(ProviderError::Rejected) => {
                let e = WorkflowError::TransactionRejected;
                self.fail(&e);
                return Err(e);
            }
            Err(ProviderError::Unavailable(msg)) => {
                let e = WorkflowError::TransactionFailed(msg);
                self.fail(&e);
                return Err(e);
            }
        };

        // (4) 终局性检查（提供者已等待确认）
        if outcome.status != FinalityStatus::Confirmed {
            let e = WorkflowError::TransactionFailed(format!(
                "transaction {} reverted",
                outcome.tx_hash
            ));
            self.fail(&e);
            return Err(e);
        }

        let receipt = RegistrationReceipt {
            attempt_id,
            cid: cid.clone(),
            tx_hash: outcome.tx_hash.clone(),
            block_number: outcome.block_number,
            status: outcome.status,
            gateway_url: self.gateway_link(&cid),
            confirmed_at: Utc::now(),
        };

        self.transition(WorkflowState::Registered {
            cid,
            tx_hash: outcome.tx_hash,
        })?;
        metrics::inc_registration_ok();
        tracing::info!(
            attempt_id = %attempt_id,
            cid = %receipt.cid,
            tx_hash = %receipt.tx_hash,
            "identity registered"
        );

        self.last_receipt = Some(receipt.clone());
        Ok(receipt)
    }

    /// 从单次尝试的终态（Registered/Failed）重新武装回Ready
    ///
    /// 复用已绑定的合约句柄——钱包/合约绑定仍然有效，不重新解析。
    /// 连接阶段失败时句柄尚未绑定，此时无法重新武装，只能整体重启。
    pub fn rearm(&mut self) -> Result<(), WorkflowError> {
        let contract_address = self
            .contract
            .as_ref()
            .map(|c| c.address().to_string())
            .ok_or(WorkflowError::ContractNotLoaded)?;

        self.transition(WorkflowState::Ready { contract_address })
    }

    fn transition(&mut self, to: WorkflowState) -> Result<(), WorkflowError> {
        WorkflowPhase::validate_transition(self.state.phase(), to.phase())?;
        tracing::debug!(
            from = self.state.phase().as_str(),
            to = to.phase().as_str(),
            "workflow transition"
        );
        self.state = to;
        Ok(())
    }

    fn fail(&mut self, err: &WorkflowError) {
        if self.state.phase() == WorkflowPhase::Submitting {
            metrics::inc_registration_failed(err.kind().as_str());
        }
        tracing::error!(
            kind = err.kind().as_str(),
            error = %err,
            "workflow entered failed state"
        );
        if let Err(e) = self.transition(WorkflowState::Failed {
            kind: err.kind(),
            message: err.to_string(),
        }) {
            tracing::error!(error = %e, "inconsistent failure transition");
        }
    }
}
