//! 合约编译产物与可调用合约句柄
//!
//! 编译产物（ABI + 字节码 + 各网络部署地址表）由独立的编译步骤产出，
//! 本系统只消费。不变量：每个网络至多对应一个部署地址。

use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result};
use ethers::abi::{Abi, Token};
use serde::{Deserialize, Serialize};

use crate::{
    domain::identity::{Cid, NetworkId},
    error::WorkflowError,
};

/// 身份合约的注册方法名（ABI中的方法签名为 registerUser(string)）
pub const REGISTER_FUNCTION: &str = "registerUser";

/// 单个网络上的部署记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkDeployment {
    pub address: String,
}

/// 合约编译产物（Truffle风格的artifact JSON）
///
/// `networks` 以网络id的十进制字符串为键，这里不做任何修改——
/// 部署是独立的显式步骤，新部署的地址只记录在会话内存中
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    pub abi: Abi,
    #[serde(default)]
    pub bytecode: String,
    #[serde(default)]
    pub networks: HashMap<String, NetworkDeployment>,
}

impl ContractArtifact {
    /// 从artifact JSON文件加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read contract artifact: {:?}", path.as_ref()))?;
        let artifact: ContractArtifact = serde_json::from_str(&content)
            .with_context(|| "Failed to parse contract artifact as JSON")?;
        Ok(artifact)
    }

    /// 查询指定网络的部署记录
    pub fn deployment(&self, network_id: NetworkId) -> Option<&NetworkDeployment> {
        self.networks.get(&network_id.to_string())
    }

    /// 解码创建字节码（用于部署交易）
    pub fn creation_bytecode(&self) -> Result<Vec<u8>, WorkflowError> {
        let stripped = self.bytecode.trim_start_matches("0x");
        if stripped.is_empty() {
            return Err(WorkflowError::DeploymentFailed(format!(
                "artifact {} has no creation bytecode",
                self.contract_name
            )));
        }
        hex::decode(stripped).map_err(|e| {
            WorkflowError::DeploymentFailed(format!("invalid bytecode in artifact: {}", e))
        })
    }
}

/// 可调用的合约句柄：绑定一个地址和一份ABI
///
/// 由工作流在解析或部署成功后独占持有；绝不跨网络共享
#[derive(Debug, Clone)]
pub struct ContractHandle {
    address: String,
    abi: Abi,
    network_id: NetworkId,
}

impl ContractHandle {
    pub fn bind(address: impl Into<String>, abi: Abi, network_id: NetworkId) -> Self {
        Self {
            address: address.into(),
            abi,
            network_id,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn network_id(&self) -> NetworkId {
        self.network_id
    }

    /// 编码 registerUser(cid) 的调用数据
    pub fn register_call_data(&self, cid: &Cid) -> Result<Vec<u8>, WorkflowError> {
        let function = self.abi.function(REGISTER_FUNCTION).map_err(|e| {
            WorkflowError::TransactionFailed(format!(
                "contract ABI has no {} method: {}",
                REGISTER_FUNCTION, e
            ))
        })?;
        function
            .encode_input(&[Token::String(cid.as_str().to_string())])
            .map_err(|e| {
                WorkflowError::TransactionFailed(format!(
                    "failed to encode {} call: {}",
                    REGISTER_FUNCTION, e
                ))
            })
    }
}
