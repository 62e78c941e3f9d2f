//! 注册工作流端到端场景测试（使用测试替身，不触网）

mod common;

use std::sync::Arc;

use identicore::{
    config::DeploymentPolicy,
    domain::identity::{NetworkId, UserProfile},
    error::{ErrorKind, WorkflowError},
    service::registration_workflow::WorkflowPhase,
};

use common::{
    build_workflow, MockContentStore, MockWalletProvider, TEST_ACCOUNT, TEST_CONTRACT,
    TEST_DEPLOYED, TEST_GATEWAY,
};

fn profile() -> UserProfile {
    UserProfile::new("Ann", "ann@example.com")
}

/// 完整成功路径：连接 -> 解析 -> 上传 -> 提交 -> 回执
#[tokio::test]
async fn test_full_registration_happy_path() {
    let provider = Arc::new(MockWalletProvider::new(NetworkId(1338)));
    let store = Arc::new(MockContentStore::new());
    let mut workflow = build_workflow(Some(provider.clone()), store.clone(), DeploymentPolicy::RequireExisting);

    workflow.start().await.unwrap();
    assert_eq!(workflow.phase(), WorkflowPhase::Ready);
    // 首个授权账户是会话账户
    assert_eq!(workflow.account().unwrap().as_str(), TEST_ACCOUNT);
    assert_eq!(workflow.network_id(), Some(NetworkId(1338)));
    assert_eq!(workflow.contract_address(), Some(TEST_CONTRACT));

    let receipt = workflow.register(profile()).await.unwrap();
    assert_eq!(workflow.phase(), WorkflowPhase::Registered);
    assert!(receipt.gateway_url.starts_with(TEST_GATEWAY));
    assert!(receipt.gateway_url.ends_with(receipt.cid.as_str()));
    assert_eq!(receipt.block_number, Some(100));

    // 恰好一次上传、一笔指向已绑定合约的交易
    assert_eq!(store.upload_count(), 1);
    let sent = provider.sent_transactions();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to.as_deref(), Some(TEST_CONTRACT));
    assert_eq!(sent[0].from.as_str(), TEST_ACCOUNT);
}

/// 无钱包提供者：启动立即失败，环境类错误不可恢复
#[tokio::test]
async fn test_missing_provider_fails_session() {
    let store = Arc::new(MockContentStore::new());
    let mut workflow = build_workflow(None, store, DeploymentPolicy::RequireExisting);

    let err = workflow.start().await.unwrap_err();
    assert!(matches!(err, WorkflowError::NoWalletProvider));
    assert_eq!(err.kind(), ErrorKind::Environment);
    assert!(!err.kind().recoverable());
    assert_eq!(workflow.phase(), WorkflowPhase::Failed);

    // 合约从未绑定，无法重新武装
    assert!(matches!(
        workflow.rearm().unwrap_err(),
        WorkflowError::ContractNotLoaded
    ));
}

/// 授权被拒：会话失败，不产生任何交易
#[tokio::test]
async fn test_authorization_denied() {
    let provider = Arc::new(MockWalletProvider::new(NetworkId(1338)).rejecting_accounts());
    let store = Arc::new(MockContentStore::new());
    let mut workflow = build_workflow(Some(provider.clone()), store, DeploymentPolicy::RequireExisting);

    let err = workflow.start().await.unwrap_err();
    assert!(matches!(err, WorkflowError::AuthorizationDenied));
    assert_eq!(workflow.phase(), WorkflowPhase::Failed);
    assert!(provider.sent_transactions().is_empty());
}

/// 无部署记录 + RequireExisting：显式失败，不自动部署
#[tokio::test]
async fn test_require_existing_rejects_unknown_network() {
    let provider = Arc::new(MockWalletProvider::new(NetworkId(5)));
    let store = Arc::new(MockContentStore::new());
    let mut workflow = build_workflow(Some(provider.clone()), store, DeploymentPolicy::RequireExisting);

    let err = workflow.start().await.unwrap_err();
    assert!(matches!(err, WorkflowError::DeploymentNeeded(NetworkId(5))));
    assert_eq!(err.kind(), ErrorKind::Resolution);
    assert_eq!(workflow.phase(), WorkflowPhase::Failed);
    // 绝无隐式部署交易
    assert!(provider.sent_transactions().is_empty());
}

/// 无部署记录 + DeployIfMissing：部署后继续，句柄绑定到新地址
#[tokio::test]
async fn test_deploy_if_missing_deploys_then_ready() {
    let provider = Arc::new(MockWalletProvider::new(NetworkId(5)));
    let store = Arc::new(MockContentStore::new());
    let mut workflow = build_workflow(Some(provider.clone()), store, DeploymentPolicy::DeployIfMissing);

    workflow.start().await.unwrap();
    assert_eq!(workflow.phase(), WorkflowPhase::Ready);
    assert_eq!(workflow.contract_address(), Some(TEST_DEPLOYED));

    // 恰好一笔创建交易（to为空）
    let sent = provider.sent_transactions();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].to.is_none());
    assert!(!sent[0].data.is_empty());

    // 部署出的实例立即可用
    let receipt = workflow.register(profile()).await.unwrap();
    assert!(receipt.gateway_url.contains(receipt.cid.as_str()));
    let sent = provider.sent_transactions();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].to.as_deref(), Some(TEST_DEPLOYED));
}

/// Ready之前的注册动作直接拒绝，状态不变
#[tokio::test]
async fn test_premature_register_is_rejected() {
    let provider = Arc::new(MockWalletProvider::new(NetworkId(1338)));
    let store = Arc::new(MockContentStore::new());
    let mut workflow = build_workflow(Some(provider.clone()), store.clone(), DeploymentPolicy::RequireExisting);

    let err = workflow.register(profile()).await.unwrap_err();
    assert!(matches!(err, WorkflowError::ContractNotLoaded));
    assert_eq!(workflow.phase(), WorkflowPhase::Disconnected);
    assert_eq!(store.upload_count(), 0);
    assert!(provider.sent_transactions().is_empty());
}

/// 上传失败短路：绝不触达合约；重新武装后重试成功
#[tokio::test]
async fn test_storage_failure_short_circuits_then_recovers() {
    let provider = Arc::new(MockWalletProvider::new(NetworkId(1338)));
    let store = Arc::new(MockContentStore::failing());
    let mut workflow = build_workflow(Some(provider.clone()), store.clone(), DeploymentPolicy::RequireExisting);

    workflow.start().await.unwrap();
    let err = workflow.register(profile()).await.unwrap_err();
    assert!(matches!(err, WorkflowError::StorageUnavailable(_)));
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(workflow.phase(), WorkflowPhase::Failed);
    // 交易提交从未发生
    assert!(provider.sent_transactions().is_empty());

    // 重新武装复用已绑定的句柄，不重新解析
    workflow.rearm().unwrap();
    assert_eq!(workflow.phase(), WorkflowPhase::Ready);
    assert_eq!(workflow.contract_address(), Some(TEST_CONTRACT));

    store.set_failing(false);
    let receipt = workflow.register(profile()).await.unwrap();
    assert_eq!(workflow.phase(), WorkflowPhase::Registered);
    assert_eq!(provider.sent_transactions().len(), 1);
    assert!(receipt.gateway_url.ends_with(receipt.cid.as_str()));
}

/// 交易被签名方拒绝：进入Failed，重新武装后可重试
#[tokio::test]
async fn test_transaction_rejected_then_rearm() {
    let provider = Arc::new(MockWalletProvider::new(NetworkId(1338)).rejecting_transactions());
    let store = Arc::new(MockContentStore::new());
    let mut workflow = build_workflow(Some(provider.clone()), store.clone(), DeploymentPolicy::RequireExisting);

    workflow.start().await.unwrap();
    let err = workflow.register(profile()).await.unwrap_err();
    assert!(matches!(err, WorkflowError::TransactionRejected));
    assert_eq!(err.kind(), ErrorKind::Transaction);
    assert_eq!(workflow.phase(), WorkflowPhase::Failed);
    // 上传已发生（失败点在上传之后）
    assert_eq!(store.upload_count(), 1);

    workflow.rearm().unwrap();
    assert_eq!(workflow.phase(), WorkflowPhase::Ready);
}

/// 交易回滚：终局性检查拦截
#[tokio::test]
async fn test_reverted_transaction_fails_attempt() {
    let provider = Arc::new(MockWalletProvider::new(NetworkId(1338)).reverting_transactions());
    let store = Arc::new(MockContentStore::new());
    let mut workflow = build_workflow(Some(provider), store, DeploymentPolicy::RequireExisting);

    workflow.start().await.unwrap();
    let err = workflow.register(profile()).await.unwrap_err();
    assert!(matches!(err, WorkflowError::TransactionFailed(_)));
    assert_eq!(workflow.phase(), WorkflowPhase::Failed);
}

/// 注册成功后重新武装可发起第二次注册；相同资料得到相同CID
#[tokio::test]
async fn test_second_registration_after_rearm() {
    let provider = Arc::new(MockWalletProvider::new(NetworkId(1338)));
    let store = Arc::new(MockContentStore::new());
    let mut workflow = build_workflow(Some(provider.clone()), store.clone(), DeploymentPolicy::RequireExisting);

    workflow.start().await.unwrap();
    let first = workflow.register(profile()).await.unwrap();

    workflow.rearm().unwrap();
    assert_eq!(workflow.phase(), WorkflowPhase::Ready);

    let second = workflow.register(profile()).await.unwrap();
    assert_eq!(workflow.phase(), WorkflowPhase::Registered);

    // 尝试彼此独立，但内容寻址保证相同资料产生相同CID
    assert_ne!(first.attempt_id, second.attempt_id);
    assert_ne!(first.tx_hash, second.tx_hash);
    assert_eq!(first.cid, second.cid);
    assert_eq!(store.upload_count(), 2);
    assert_eq!(provider.sent_transactions().len(), 2);
}

/// 启动只允许一次：Ready之后再次start是非法转换
#[tokio::test]
async fn test_start_is_single_shot() {
    let provider = Arc::new(MockWalletProvider::new(NetworkId(1338)));
    let store = Arc::new(MockContentStore::new());
    let mut workflow = build_workflow(Some(provider), store, DeploymentPolicy::RequireExisting);

    workflow.start().await.unwrap();
    let err = workflow.start().await.unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    // 失败的start不破坏已就绪的会话
    assert_eq!(workflow.phase(), WorkflowPhase::Ready);
}
