//! 业务服务层

pub mod contract_deployer;
pub mod contract_resolver;
pub mod eth_provider;
pub mod registration_workflow;
pub mod storage_client;
pub mod wallet_gateway;

pub use contract_deployer::ContractDeployer;
pub use contract_resolver::{ContractResolver, Resolution};
pub use eth_provider::EthersWalletProvider;
pub use registration_workflow::{
    RegistrationWorkflow, WorkflowPhase, WorkflowSettings, WorkflowState,
};
pub use storage_client::{gateway_link, ContentStore, IpfsStorageClient};
pub use wallet_gateway::{
    ProviderError, TransactionOutcome, TransactionRequest, WalletGateway, WalletProvider,
    WalletSession,
};
