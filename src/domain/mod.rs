//! 领域模型模块

pub mod artifact;
pub mod identity;

pub use artifact::{ContractArtifact, ContractHandle, NetworkDeployment};
pub use identity::{Account, Cid, FinalityStatus, NetworkId, RegistrationReceipt, UserProfile};
