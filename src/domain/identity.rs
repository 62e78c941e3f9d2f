//! 身份注册核心领域类型
//!
//! 会话级数据（账户、网络）与单次注册数据（资料、CID、回执）分离：
//! 前者在会话内只写一次，后者每次注册尝试重新创建

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 钱包账户地址（不透明字符串标识符）
///
/// 由WalletGateway在会话开始时设置一次，之后只读。
/// 首个授权账户视为本会话的唯一签名账户。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Account(String);

impl Account {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 链网络标识符
///
/// 决定合约编译产物中哪条部署记录有效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(pub u64);

impl NetworkId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 用户资料（name/email），仅在单次注册尝试期间驻留内存
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
}

impl UserProfile {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// 序列化为上传到存储网络的字节载荷
    ///
    /// 相同资料产生相同字节，配合内容寻址保证重复上传得到相同CID
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// 内容标识符（CID）
///
/// 存储网络按内容寻址返回的地址：相同字节必然产生相同CID。
/// 一经产生不可变。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cid(String);

impl Cid {
    pub fn new(cid: impl Into<String>) -> Self {
        Self(cid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 交易终局性状态（以链客户端上报为准）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinalityStatus {
    /// 交易已打包且执行成功
    Confirmed,
    /// 交易已打包但执行回滚
    Reverted,
}

/// 注册回执：CID提交上链成功后的结果
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationReceipt {
    /// 本次注册尝试的标识
    pub attempt_id: Uuid,
    /// 上传产生的内容标识符
    pub cid: Cid,
    /// 链上交易哈希
    pub tx_hash: String,
    /// 交易所在区块（链客户端上报）
    pub block_number: Option<u64>,
    /// 终局性状态
    pub status: FinalityStatus,
    /// 公共网关访问链接（gateway-base + "/" + CID）
    pub gateway_url: String,
    /// 确认时间
    pub confirmed_at: DateTime<Utc>,
}
