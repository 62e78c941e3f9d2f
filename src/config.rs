//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub wallet: WalletConfig,
    pub contract: ContractConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

/// 钱包提供者配置
///
/// `private_key` 缺失即视为"环境中没有钱包提供者"——这是可检测、
/// 可上报的条件，不是配置错误
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    pub rpc_url: String,
    #[serde(default)]
    pub private_key: Option<String>,
}

/// 部署决策策略
///
/// 原始流程在检测到网络无部署记录时隐式地部署一个新实例，每个缺记录的
/// 会话都会产生一个新的链上合约。这里把决策显式化：
/// - `RequireExisting`：无部署记录则会话失败，部署必须在带外完成（默认）
/// - `DeployIfMissing`：复现原始行为，工作流自动部署
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentPolicy {
    RequireExisting,
    DeployIfMissing,
}

/// 合约配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractConfig {
    pub artifact_path: String,
    pub deployment_policy: DeploymentPolicy,
}

/// 存储网络（IPFS）配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub ipfs_api_url: String,
    pub gateway_base: String,
    pub timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8088".into()),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            rpc_url: std::env::var("ETH_RPC_URL")
                .unwrap_or_else(|_| "https://ethereum-sepolia-rpc.publicnode.com".into()),
            private_key: std::env::var("WALLET_PRIVATE_KEY").ok(),
        }
    }
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            artifact_path: std::env::var("CONTRACT_ARTIFACT_PATH")
                .unwrap_or_else(|_| "./artifacts/Identity.json".into()),
            deployment_policy: match std::env::var("DEPLOYMENT_POLICY").as_deref() {
                Ok("deploy_if_missing") => DeploymentPolicy::DeployIfMissing,
                _ => DeploymentPolicy::RequireExisting,
            },
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            ipfs_api_url: std::env::var("IPFS_API_URL")
                .unwrap_or_else(|_| "https://ipfs.infura.io:5001".into()),
            gateway_base: std::env::var("IPFS_GATEWAY_BASE")
                .unwrap_or_else(|_| "https://ipfs.io/ipfs".into()),
            timeout_secs: std::env::var("IPFS_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig::default(),
            wallet: WalletConfig::default(),
            contract: ContractConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                let file_config = Self::from_file(path)?;
                config = file_config;
            }
        }

        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        if self.wallet.rpc_url.is_empty() {
            anyhow::bail!("ETH_RPC_URL must not be empty");
        }

        if !self.storage.gateway_base.starts_with("http") {
            anyhow::bail!("IPFS_GATEWAY_BASE must be an http(s) URL");
        }

        if self.storage.timeout_secs == 0 {
            anyhow::bail!("IPFS_TIMEOUT_SECS must be greater than 0");
        }

        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        // 验证日志格式
        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        Ok(())
    }
}
