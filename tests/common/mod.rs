//! 测试辅助模块
//! 提供钱包提供者与内容存储的测试替身

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use identicore::{
    config::DeploymentPolicy,
    domain::{
        artifact::ContractArtifact,
        identity::{Account, Cid, FinalityStatus, NetworkId},
    },
    error::WorkflowError,
    service::{
        registration_workflow::{RegistrationWorkflow, WorkflowSettings},
        storage_client::ContentStore,
        wallet_gateway::{
            ProviderError, TransactionOutcome, TransactionRequest, WalletGateway, WalletProvider,
        },
    },
};

pub const TEST_ACCOUNT: &str = "0xaaaa00000000000000000000000000000000aaaa";
pub const TEST_CONTRACT: &str = "0xc0de00000000000000000000000000000000c0de";
pub const TEST_DEPLOYED: &str = "0xdddd00000000000000000000000000000000dddd";
pub const TEST_GATEWAY: &str = "https://ipfs.io/ipfs";

/// 可脚本化的钱包提供者替身：记录所有提交的交易
pub struct MockWalletProvider {
    pub network: NetworkId,
    pub reject_accounts: bool,
    pub reject_transactions: bool,
    pub revert_transactions: bool,
    pub sent: Mutex<Vec<TransactionRequest>>,
    tx_counter: AtomicU64,
}

impl MockWalletProvider {
    pub fn new(network: NetworkId) -> Self {
        Self {
            network,
            reject_accounts: false,
            reject_transactions: false,
            revert_transactions: false,
            sent: Mutex::new(Vec::new()),
            tx_counter: AtomicU64::new(0),
        }
    }

    pub fn rejecting_accounts(mut self) -> Self {
        self.reject_accounts = true;
        self
    }

    pub fn rejecting_transactions(mut self) -> Self {
        self.reject_transactions = true;
        self
    }

    pub fn reverting_transactions(mut self) -> Self {
        self.revert_transactions = true;
        self
    }

    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletProvider for MockWalletProvider {
    async fn request_accounts(&self) -> Result<Vec<Account>, ProviderError> {
        if self.reject_accounts {
            return Err(ProviderError::Rejected);
        }
        Ok(vec![
            Account::new(TEST_ACCOUNT),
            Account::new("0xbbbb00000000000000000000000000000000bbbb"),
        ])
    }

    async fn network_id(&self) -> Result<NetworkId, ProviderError> {
        Ok(self.network)
    }

    async fn send_transaction(
        &self,
        request: TransactionRequest,
    ) -> Result<TransactionOutcome, ProviderError> {
        if self.reject_transactions {
            return Err(ProviderError::Rejected);
        }

        let is_creation = request.to.is_none();
        self.sent.lock().unwrap().push(request);
        let n = self.tx_counter.fetch_add(1, Ordering::SeqCst);

        let status = if self.revert_transactions {
            FinalityStatus::Reverted
        } else {
            FinalityStatus::Confirmed
        };

        Ok(TransactionOutcome {
            tx_hash: format!("0xtx{:064x}", n),
            block_number: Some(100 + n),
            status,
            contract_address: is_creation.then(|| TEST_DEPLOYED.to_string()),
        })
    }
}

/// 内容寻址存储替身：CID由载荷哈希决定（相同字节 -> 相同CID）
pub struct MockContentStore {
    pub fail: AtomicBool,
    pub stored: Mutex<Vec<Vec<u8>>>,
}

impl MockContentStore {
    pub fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
            stored: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        let store = Self::new();
        store.fail.store(true, Ordering::SeqCst);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn upload_count(&self) -> usize {
        self.stored.lock().unwrap().len()
    }
}

#[async_trait]
impl ContentStore for MockContentStore {
    async fn store(&self, bytes: Vec<u8>) -> Result<Cid, WorkflowError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(WorkflowError::StorageUnavailable(
                "storage node unreachable".into(),
            ));
        }
        let digest = Sha256::digest(&bytes);
        self.stored.lock().unwrap().push(bytes);
        Ok(Cid::new(format!("bafy{}", hex::encode(&digest[..8]))))
    }
}

/// 带单条部署记录（网络1338）的身份合约编译产物
pub fn identity_artifact() -> ContractArtifact {
    serde_json::from_value(serde_json::json!({
        "contractName": "Identity",
        "abi": [
            {
                "type": "function",
                "name": "registerUser",
                "inputs": [{ "name": "ipfsHash", "type": "string" }],
                "outputs": [],
                "stateMutability": "nonpayable"
            }
        ],
        "bytecode": "0x600160005560aa",
        "networks": {
            "1338": { "address": TEST_CONTRACT }
        }
    }))
    .expect("test artifact must parse")
}

/// 组装一个测试工作流
pub fn build_workflow(
    provider: Option<Arc<MockWalletProvider>>,
    store: Arc<MockContentStore>,
    policy: DeploymentPolicy,
) -> RegistrationWorkflow {
    let provider = provider.map(|p| p as Arc<dyn WalletProvider>);
    RegistrationWorkflow::new(
        WalletGateway::new(provider),
        store,
        identity_artifact(),
        WorkflowSettings {
            gateway_base: TEST_GATEWAY.to_string(),
            deployment_policy: policy,
        },
    )
}
