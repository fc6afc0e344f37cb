//! Wallet module - the injected provider and the collection contract
//!
//! Both are external collaborators. The session never reproduces contract
//! accounting; it only calls and listens.
//!
//! # Architecture
//!
//! ```text
//! MintController
//!     │
//!     ├── WalletProvider (injected wallet)
//!     │     ├── request_accounts / accounts / network_id
//!     │     ├── subscribe → WalletEvent { AccountsChanged, ChainChanged }
//!     │     └── contract_at(address) → CollectionContract
//!     │
//!     └── CollectionContract (ABI surface)
//!           ├── read: maxSupply, totalSupply, allowMintingAfter,
//!           │         timeDeployed, walletOfOwner
//!           └── write: mint(quantity) + value → TxHandle
//!                                                 │
//!                                                 ▼
//!                                   TxEvent { Confirmation, Error }
//! ```

pub mod memory;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

use crate::core::Address;
use crate::error::{ContractError, ProviderError};

pub use memory::{MemoryContract, MemoryWallet, MintMode};

/// Events pushed by the provider when the user acts in the wallet UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Prompts the user for account access.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;
    /// Accounts already granted, without prompting.
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError>;
    async fn network_id(&self) -> Result<u64, ProviderError>;
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
    fn contract_at(&self, address: &Address) -> Arc<dyn CollectionContract>;
}

/// Mint transaction payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintRequest {
    pub from: Address,
    pub quantity: u32,
    pub value_wei: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxEvent {
    Confirmation { tx_hash: String, confirmations: u64 },
    Error(String),
}

/// A submitted transaction. Events arrive until the provider drops the sender.
#[derive(Debug)]
pub struct TxHandle {
    pub tx_hash: String,
    pub events: mpsc::Receiver<TxEvent>,
}

#[async_trait]
pub trait CollectionContract: Send + Sync {
    fn address(&self) -> &Address;
    async fn max_supply(&self) -> Result<u64, ContractError>;
    async fn total_supply(&self) -> Result<u64, ContractError>;
    /// Seconds after deployment before minting opens.
    async fn allow_minting_after(&self) -> Result<u64, ContractError>;
    /// Deployment time, epoch seconds.
    async fn time_deployed(&self) -> Result<u64, ContractError>;
    async fn wallet_of_owner(&self, owner: &Address) -> Result<Vec<u64>, ContractError>;
    async fn mint(&self, request: &MintRequest) -> Result<TxHandle, ContractError>;
}
