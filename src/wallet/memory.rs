//! MemoryWallet - in-process provider for the local-development network
//!
//! Stands in for an injected wallet plus a deployed collection contract.
//! Reads can be made to fail per method and mints can be held open, so every
//! branch of the session lifecycle is reachable without a chain.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, mpsc};

use super::{CollectionContract, MintRequest, TxEvent, TxHandle, WalletEvent, WalletProvider};
use crate::config::LOCAL_NETWORK_ID;
use crate::core::Address;
use crate::error::{ContractError, ProviderError};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> { m.lock().unwrap_or_else(|p| p.into_inner()) }

#[derive(Debug)]
struct WalletState {
    /// Accounts already exposed to the page.
    granted: Vec<Address>,
    /// Accounts the user will approve on the next request.
    approvable: Vec<Address>,
    reject_requests: bool,
    network_id: u64,
    rpc_failure: Option<String>,
}

pub struct MemoryWallet {
    state: Mutex<WalletState>,
    events: broadcast::Sender<WalletEvent>,
    contracts: Mutex<HashMap<Address, Arc<MemoryContract>>>,
}

impl Default for MemoryWallet {
    fn default() -> Self { Self::new(LOCAL_NETWORK_ID) }
}

impl MemoryWallet {
    pub fn new(network_id: u64) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            state: Mutex::new(WalletState {
                granted: Vec::new(),
                approvable: Vec::new(),
                reject_requests: false,
                network_id,
                rpc_failure: None,
            }),
            events,
            contracts: Mutex::new(HashMap::new()),
        }
    }

    /// Accounts visible without a prompt (already connected site).
    pub fn with_granted(self, accounts: Vec<Address>) -> Self {
        lock(&self.state).granted = accounts;
        self
    }

    /// Accounts the user approves when `request_accounts` is called.
    pub fn with_approvable(self, accounts: Vec<Address>) -> Self {
        lock(&self.state).approvable = accounts;
        self
    }

    pub fn rejecting_requests(self) -> Self {
        lock(&self.state).reject_requests = true;
        self
    }

    pub fn fail_rpc(&self, reason: impl Into<String>) {
        lock(&self.state).rpc_failure = Some(reason.into());
    }

    pub fn deploy(&self, contract: MemoryContract) -> Arc<MemoryContract> {
        let contract = Arc::new(contract);
        lock(&self.contracts).insert(contract.address().clone(), contract.clone());
        contract
    }

    /// User switched accounts in the wallet UI.
    pub fn switch_accounts(&self, accounts: Vec<Address>) {
        lock(&self.state).granted = accounts.clone();
        let _ = self.events.send(WalletEvent::AccountsChanged(accounts));
    }

    /// User switched networks in the wallet UI.
    pub fn switch_network(&self, network_id: u64) {
        lock(&self.state).network_id = network_id;
        let _ = self.events.send(WalletEvent::ChainChanged(network_id));
    }

    fn check_rpc(&self) -> Result<(), ProviderError> {
        match &lock(&self.state).rpc_failure {
            Some(reason) => Err(ProviderError::Rpc(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl WalletProvider for MemoryWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.check_rpc()?;
        let mut state = lock(&self.state);
        if state.reject_requests {
            return Err(ProviderError::Rejected("User rejected the request.".into()));
        }
        if state.granted.is_empty() {
            state.granted = state.approvable.clone();
        }
        Ok(state.granted.clone())
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.check_rpc()?;
        Ok(lock(&self.state).granted.clone())
    }

    async fn network_id(&self) -> Result<u64, ProviderError> {
        self.check_rpc()?;
        Ok(lock(&self.state).network_id)
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> { self.events.subscribe() }

    fn contract_at(&self, address: &Address) -> Arc<dyn CollectionContract> {
        match lock(&self.contracts).get(address) {
            Some(c) => c.clone(),
            None => Arc::new(MemoryContract::undeployed(address.clone())),
        }
    }
}

/// How `mint` resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintMode {
    /// Record the mint and confirm immediately.
    AutoConfirm,
    /// Keep the transaction pending until `confirm_pending` / `fail_pending`.
    Hold,
    /// Emit an error event with this message.
    Revert(String),
}

#[derive(Debug)]
struct ContractState {
    deployed: bool,
    max_supply: u64,
    total_supply: u64,
    time_deployed: u64,
    allow_minting_after: u64,
    owners: HashMap<Address, Vec<u64>>,
    failing: HashSet<&'static str>,
    mint_mode: MintMode,
    pending: Vec<(MintRequest, mpsc::Sender<TxEvent>, String)>,
    mint_calls: usize,
    read_calls: usize,
    next_tx: u64,
}

pub struct MemoryContract {
    address: Address,
    state: Mutex<ContractState>,
}

impl MemoryContract {
    pub fn new(address: Address, max_supply: u64, time_deployed: u64, allow_minting_after: u64) -> Self {
        Self {
            address,
            state: Mutex::new(ContractState {
                deployed: true,
                max_supply,
                total_supply: 0,
                time_deployed,
                allow_minting_after,
                owners: HashMap::new(),
                failing: HashSet::new(),
                mint_mode: MintMode::AutoConfirm,
                pending: Vec::new(),
                mint_calls: 0,
                read_calls: 0,
                next_tx: 1,
            }),
        }
    }

    /// Address with no code: every call fails.
    pub fn undeployed(address: Address) -> Self {
        let c = Self::new(address, 0, 0, 0);
        lock(&c.state).deployed = false;
        c
    }

    pub fn with_mint_mode(self, mode: MintMode) -> Self {
        lock(&self.state).mint_mode = mode;
        self
    }

    pub fn set_mint_mode(&self, mode: MintMode) { lock(&self.state).mint_mode = mode; }

    /// Make calls to `method` (ABI name, e.g. `"maxSupply"`) fail.
    pub fn fail_method(&self, method: &'static str) { lock(&self.state).failing.insert(method); }

    pub fn heal_method(&self, method: &'static str) { lock(&self.state).failing.remove(method); }

    pub fn set_total_supply(&self, total: u64) { lock(&self.state).total_supply = total; }

    /// Seed ownership as if `owner` had minted earlier.
    pub fn grant(&self, owner: &Address, token_id: u64) {
        let mut state = lock(&self.state);
        state.owners.entry(owner.clone()).or_default().push(token_id);
        state.total_supply = state.total_supply.max(token_id);
    }

    pub fn mint_calls(&self) -> usize { lock(&self.state).mint_calls }

    pub fn read_calls(&self) -> usize { lock(&self.state).read_calls }

    pub fn pending_count(&self) -> usize { lock(&self.state).pending.len() }

    /// Confirm every held mint.
    pub fn confirm_pending(&self) {
        let mut state = lock(&self.state);
        let pending = std::mem::take(&mut state.pending);
        for (request, tx, hash) in pending {
            Self::apply_mint(&mut state, &request);
            let _ = tx.try_send(TxEvent::Confirmation { tx_hash: hash, confirmations: 1 });
        }
    }

    /// Fail every held mint with `message`.
    pub fn fail_pending(&self, message: &str) {
        let pending = std::mem::take(&mut lock(&self.state).pending);
        for (_, tx, _) in pending {
            let _ = tx.try_send(TxEvent::Error(message.to_string()));
        }
    }

    /// Drop held mints without any event.
    pub fn drop_pending(&self) { lock(&self.state).pending.clear(); }

    fn apply_mint(state: &mut ContractState, request: &MintRequest) {
        let first = state.total_supply + 1;
        let ids = first..first + u64::from(request.quantity);
        state.total_supply += u64::from(request.quantity);
        state.owners.entry(request.from.clone()).or_default().extend(ids);
    }

    fn read<T>(&self, method: &'static str, f: impl FnOnce(&ContractState) -> T) -> Result<T, ContractError> {
        let mut state = lock(&self.state);
        state.read_calls += 1;
        if !state.deployed {
            return Err(ContractError::call(method, "no contract code at address"));
        }
        if state.failing.contains(method) {
            return Err(ContractError::call(method, "execution reverted"));
        }
        Ok(f(&*state))
    }
}

#[async_trait]
impl CollectionContract for MemoryContract {
    fn address(&self) -> &Address { &self.address }

    async fn max_supply(&self) -> Result<u64, ContractError> { self.read("maxSupply", |s| s.max_supply) }

    async fn total_supply(&self) -> Result<u64, ContractError> { self.read("totalSupply", |s| s.total_supply) }

    async fn allow_minting_after(&self) -> Result<u64, ContractError> {
        self.read("allowMintingAfter", |s| s.allow_minting_after)
    }

    async fn time_deployed(&self) -> Result<u64, ContractError> { self.read("timeDeployed", |s| s.time_deployed) }

    async fn wallet_of_owner(&self, owner: &Address) -> Result<Vec<u64>, ContractError> {
        self.read("walletOfOwner", |s| s.owners.get(owner).cloned().unwrap_or_default())
    }

    async fn mint(&self, request: &MintRequest) -> Result<TxHandle, ContractError> {
        let mut state = lock(&self.state);
        state.mint_calls += 1;
        if !state.deployed || state.failing.contains("mint") {
            return Err(ContractError::Submit("transaction could not be sent".into()));
        }
        let tx_hash = format!("0x{:064x}", state.next_tx);
        state.next_tx += 1;
        let (tx, rx) = mpsc::channel(4);
        match state.mint_mode.clone() {
            MintMode::AutoConfirm => {
                Self::apply_mint(&mut state, request);
                let _ = tx.try_send(TxEvent::Confirmation { tx_hash: tx_hash.clone(), confirmations: 1 });
            }
            MintMode::Hold => state.pending.push((request.clone(), tx, tx_hash.clone())),
            MintMode::Revert(message) => {
                let _ = tx.try_send(TxEvent::Error(message));
            }
        }
        Ok(TxHandle { tx_hash, events: rx })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address { Address::parse(&format!("0x{}", hex::encode([n; 20]))).unwrap() }

    #[tokio::test]
    async fn request_accounts_grants_approvable() {
        let wallet = MemoryWallet::default().with_approvable(vec![addr(1)]);
        assert!(wallet.accounts().await.unwrap().is_empty());
        assert_eq!(wallet.request_accounts().await.unwrap(), vec![addr(1)]);
        assert_eq!(wallet.accounts().await.unwrap(), vec![addr(1)]);
    }

    #[tokio::test]
    async fn rejecting_wallet_errors() {
        let wallet = MemoryWallet::default().rejecting_requests();
        assert!(matches!(wallet.request_accounts().await, Err(ProviderError::Rejected(_))));
    }

    #[tokio::test]
    async fn undeployed_address_fails_reads() {
        let wallet = MemoryWallet::default();
        let c = wallet.contract_at(&addr(9));
        assert!(c.max_supply().await.is_err());
    }

    #[tokio::test]
    async fn held_mint_confirms_on_demand() {
        let contract = MemoryContract::new(addr(9), 10, 0, 0).with_mint_mode(MintMode::Hold);
        let req = MintRequest { from: addr(1), quantity: 1, value_wei: 0 };
        let mut handle = contract.mint(&req).await.unwrap();
        assert_eq!(contract.pending_count(), 1);
        contract.confirm_pending();
        assert!(matches!(handle.events.recv().await, Some(TxEvent::Confirmation { .. })));
        assert_eq!(contract.total_supply().await.unwrap(), 1);
        assert_eq!(contract.wallet_of_owner(&addr(1)).await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn events_reach_subscribers() {
        let wallet = MemoryWallet::default();
        let mut rx = wallet.subscribe();
        wallet.switch_network(4);
        assert_eq!(rx.recv().await.unwrap(), WalletEvent::ChainChanged(4));
        assert_eq!(wallet.network_id().await.unwrap(), 4);
    }
}
