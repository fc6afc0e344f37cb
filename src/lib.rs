//! Shadesmint: Smart Shades mint session. Wallet in, mint out.
//!
//! # Architecture
//!
//! ```text
//! MintRuntime
//!   │
//!   ├── MintController (session state machine)
//!   │     ├── WalletProvider      (injected wallet: accounts, network, events)
//!   │     ├── CollectionContract  (maxSupply, totalSupply, mint-open time,
//!   │     │                        walletOfOwner, mint)
//!   │     └── MintConfig          (price, quantity, network links, deployments)
//!   │
//!   ├── event loop (AccountsChanged → session, ChainChanged → reload)
//!   │
//!   └── Cycler (3s decorative counter, start-once)
//! ```
//!
//! # Operations
//!
//! | Operation | Method | Network |
//! |-----------|--------|---------|
//! | page load | `controller.initialize()` | accounts, network id, 4 reads |
//! | connect | `controller.connect()` | wallet prompt |
//! | load | `controller.load_collection_state(account, network)` | 3-4 reads |
//! | mint | `controller.attempt_mint(&account)` | 1 tx + refresh reads |
//! | accounts changed | `controller.on_accounts_changed(accounts)` | none |
//! | chain changed | `controller.on_chain_changed(id)` | full reload |
//!
//! # Features
//!
//! - `native` - installs the tracing subscriber (`logging::init_logging`)
//!
//! # Usage
//!
//! ```ignore
//! use shadesmint::{MintConfig, MintController, MintRuntime};
//! use std::sync::Arc;
//!
//! let config = MintConfig::from_env()?;
//! let controller = Arc::new(MintController::with_system_clock(Some(provider), config));
//! let runtime = MintRuntime::start(controller.clone()).await;
//!
//! if let Some(account) = controller.connect().await? {
//!     controller.attempt_mint(&account).await?;
//! }
//! runtime.stop().await;
//! ```

pub mod config;
pub mod core;
pub mod cycle;
pub mod error;
pub mod runtime;
pub mod session;
pub mod wallet;

#[cfg(feature = "native")]
pub mod logging;

pub use config::{Deployments, MintConfig, NetworkLinks, NetworkRegistry};
pub use crate::core::{Address, Clock, FixedClock, SystemClock};
pub use cycle::Cycler;
pub use error::{ContractError, MintError, MintResult, ProviderError};
pub use runtime::{MintRuntime, Shutdown};
pub use session::{
    CollectionState, MintAttempt, MintController, MintStatus, Notice, NoticeKind, OwnershipRecord, Session,
};
pub use wallet::{CollectionContract, MemoryContract, MemoryWallet, MintMode, MintRequest, TxEvent, TxHandle, WalletEvent, WalletProvider};
