//! 合约解析器
//!
//! 纯查表：给定网络id和编译产物，绑定一个可调用句柄，或者显式地发出
//! `DeploymentNeeded` 信号。解析器自身绝不触发部署，也绝不修改部署表——
//! 部署决策属于工作流的策略层（见 `DeploymentPolicy`）。

use crate::domain::{
    artifact::{ContractArtifact, ContractHandle},
    identity::NetworkId,
};

/// 解析结果
#[derive(Debug, Clone)]
pub enum Resolution {
    /// 找到部署记录，句柄已绑定（常见快路径，无需任何交易）
    Bound(ContractHandle),
    /// 该网络没有部署记录；是否部署由调用方显式决定
    DeploymentNeeded,
}

/// 合约解析器
pub struct ContractResolver;

impl ContractResolver {
    /// 查询 `artifact.networks[network_id]` 并绑定句柄
    pub fn resolve(network_id: NetworkId, artifact: &ContractArtifact) -> Resolution {
        match artifact.deployment(network_id) {
            Some(deployment) => {
                tracing::debug!(
                    network_id = %network_id,
                    address = %deployment.address,
                    contract = %artifact.contract_name,
                    "contract deployment resolved"
                );
                Resolution::Bound(ContractHandle::bind(
                    deployment.address.clone(),
                    artifact.abi.clone(),
                    network_id,
                ))
            }
            None => {
                tracing::warn!(
                    network_id = %network_id,
                    contract = %artifact.contract_name,
                    "no deployment record for network"
                );
                Resolution::DeploymentNeeded
            }
        }
    }
}
