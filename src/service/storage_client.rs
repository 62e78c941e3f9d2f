//! 内容寻址存储客户端（IPFS HTTP API）
//!
//! `store` 的幂等性来自内容寻址本身：相同字节必然得到相同CID（由存储
//! 网络保证，本地不做校验，也不假设每次调用产生唯一CID）。因此失败后
//! 重传总是安全的；核心不做本地重试。

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{config::StorageConfig, domain::identity::Cid, error::WorkflowError, metrics};

/// 存储边界：上传字节载荷，返回内容标识符
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn store(&self, bytes: Vec<u8>) -> Result<Cid, WorkflowError>;
}

/// IPFS `/api/v0/add` 响应
#[derive(Debug, Deserialize)]
struct IpfsAddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

/// IPFS HTTP API 客户端
pub struct IpfsStorageClient {
    http_client: reqwest::Client,
    api_url: String,
}

impl IpfsStorageClient {
    pub fn new(config: &StorageConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client: client,
            api_url: config.ipfs_api_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ContentStore for IpfsStorageClient {
    async fn store(&self, bytes: Vec<u8>) -> Result<Cid, WorkflowError> {
        let url = format!("{}/api/v0/add", self.api_url);
        let size = bytes.len();

        let part = reqwest::multipart::Part::bytes(bytes).file_name("profile.json");
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                metrics::inc_upload_failed();
                WorkflowError::StorageUnavailable(e.to_string())
            })?;

        if !response.status().is_success() {
            metrics::inc_upload_failed();
            return Err(WorkflowError::StorageUnavailable(format!(
                "IPFS API returned status {}",
                response.status()
            )));
        }

        let body: IpfsAddResponse = response.json().await.map_err(|e| {
            metrics::inc_upload_failed();
            WorkflowError::StorageUnavailable(format!("invalid IPFS API response: {}", e))
        })?;

        metrics::inc_upload_ok();
        tracing::info!(cid = %body.hash, bytes = size, "payload uploaded to IPFS");
        Ok(Cid::new(body.hash))
    }
}

/// 公共网关链接推导：`gateway-base + "/" + CID`
pub fn gateway_link(gateway_base: &str, cid: &Cid) -> String {
    format!("{}/{}", gateway_base.trim_end_matches('/'), cid)
}
