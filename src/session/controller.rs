//! MintController - wallet session, collection state and the mint lifecycle
//!
//! All state sits behind one mutex that is never held across an await. Every
//! async flow snapshots what it needs, awaits the collaborator, then re-locks
//! and commits only if the controller generation and the connected account
//! are unchanged. A reload bumps the generation, so results from before a
//! network switch are dropped; results for a previous account are dropped
//! the same way.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::model::{CollectionState, MintAttempt, MintStatus, Notice, NoticeKind, OwnershipRecord, Session};
use crate::config::{MintConfig, NetworkLinks};
use crate::core::messages;
use crate::core::time::mint_opens_at;
use crate::core::{Address, Clock, SystemClock};
use crate::error::{ContractError, MintError, MintResult, ProviderError};
use crate::wallet::{CollectionContract, MintRequest, TxEvent, WalletProvider};

struct ControllerState {
    generation: u64,
    session: Session,
    links: NetworkLinks,
    contract: Option<Arc<dyn CollectionContract>>,
    collection: CollectionState,
    ownership: OwnershipRecord,
    mint: MintAttempt,
    notice: Option<Notice>,
    /// Session the collection state was last loaded (or failed to load) for.
    synced_for: Option<Session>,
}

impl ControllerState {
    fn fresh(generation: u64, links: NetworkLinks) -> Self {
        Self {
            generation,
            session: Session::default(),
            links,
            contract: None,
            collection: CollectionState::default(),
            ownership: OwnershipRecord::default(),
            mint: MintAttempt::default(),
            notice: None,
            synced_for: None,
        }
    }

    /// Replace the primary account. A different account drops the ownership
    /// record and the loaded flag until its own state is read.
    fn set_account(&mut self, account: Option<Address>) -> bool {
        let changed = self.session.connected_account != account;
        if changed {
            self.ownership = OwnershipRecord::default();
            self.collection.is_loaded = false;
            self.synced_for = None;
        }
        self.session.connected_account = account;
        changed
    }

    fn is_current(&self, generation: u64, account: Option<&Address>) -> bool {
        self.generation == generation && self.session.connected_account.as_ref() == account
    }
}

pub struct MintController {
    provider: Option<Arc<dyn WalletProvider>>,
    config: MintConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<ControllerState>,
    session_tx: watch::Sender<Session>,
}

impl MintController {
    /// `provider` is `None` when no wallet is injected into the page.
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, config: MintConfig, clock: Arc<dyn Clock>) -> Self {
        let state = ControllerState::fresh(0, config.default_links.clone());
        let (session_tx, _) = watch::channel(Session::default());
        Self { provider, config, clock, state: Mutex::new(state), session_tx }
    }

    pub fn with_system_clock(provider: Option<Arc<dyn WalletProvider>>, config: MintConfig) -> Self {
        Self::new(provider, config, Arc::new(SystemClock))
    }

    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn require_provider(&self) -> MintResult<Arc<dyn WalletProvider>> {
        match &self.provider {
            Some(p) => Ok(p.clone()),
            None => {
                self.state().notice = Some(Notice::persistent(messages::session::NO_WALLET));
                Err(MintError::ProviderUnavailable)
            }
        }
    }

    fn publish_session(&self, session: Session) {
        self.session_tx.send_if_modified(|current| {
            if *current == session {
                return false;
            }
            *current = session;
            true
        });
    }

    // ---------------------------------------------------------------------
    // Read accessors
    // ---------------------------------------------------------------------

    pub fn provider(&self) -> Option<Arc<dyn WalletProvider>> { self.provider.clone() }
    pub fn config(&self) -> &MintConfig { &self.config }
    pub fn session(&self) -> Session { self.state().session.clone() }
    pub fn collection(&self) -> CollectionState { self.state().collection.clone() }
    pub fn ownership(&self) -> OwnershipRecord { self.state().ownership.clone() }
    pub fn mint_attempt(&self) -> MintAttempt { self.state().mint.clone() }
    pub fn notice(&self) -> Option<Notice> { self.state().notice.clone() }
    pub fn links(&self) -> NetworkLinks { self.state().links.clone() }
    pub fn generation(&self) -> u64 { self.state().generation }

    /// True once collection state was read for exactly this session, whether
    /// or not the read succeeded.
    pub fn is_synced_with(&self, session: &Session) -> bool {
        self.state().synced_for.as_ref() == Some(session)
    }

    /// Receiver that observes every session change (reactive reload hook).
    pub fn watch_session(&self) -> watch::Receiver<Session> { self.session_tx.subscribe() }

    pub fn contract_address(&self) -> Option<Address> {
        self.state().contract.as_ref().map(|c| c.address().clone())
    }

    pub fn remaining_supply(&self) -> u64 { self.state().collection.remaining_supply() }

    pub fn time_until_open(&self) -> Option<chrono::Duration> {
        let now = self.clock.now();
        self.state().collection.time_until_open(now)
    }

    pub fn account_label(&self) -> Option<String> {
        self.state().session.connected_account.as_ref().map(Address::short)
    }

    pub fn account_link(&self) -> Option<String> {
        let state = self.state();
        state.session.connected_account.as_ref().map(|a| state.links.account_url(a))
    }

    /// Marketplace link for the first owned token.
    pub fn claim_link(&self) -> Option<String> {
        let state = self.state();
        let contract = state.contract.as_ref()?;
        let token = state.ownership.first()?;
        Some(state.links.asset_url(contract.address(), token))
    }

    // ---------------------------------------------------------------------
    // Session lifecycle
    // ---------------------------------------------------------------------

    /// Page-load flow: read granted accounts without prompting, resolve the
    /// network and its links, then load collection state. The session is
    /// published once the load has settled.
    pub async fn initialize(&self) -> MintResult<()> {
        let provider = self.require_provider()?;
        let generation = self.generation();

        let accounts = provider.accounts().await?;
        let network_id = provider.network_id().await?;
        let links = self.config.networks.links_for(network_id, self.config.local_network_id, &self.config.default_links);
        let account = accounts.into_iter().next();

        {
            let mut state = self.state();
            if state.generation != generation {
                debug!(generation, "initialize superseded by reload");
                return Ok(());
            }
            state.set_account(account.clone());
            state.session.network_id = Some(network_id);
            state.links = links;
            if account.is_none() {
                state.notice = Some(Notice::persistent(messages::session::CONNECT_PROMPT));
            }
        }
        info!(network_id, account = ?account.as_ref().map(Address::as_str), "session initialized");

        let loaded = self.load_collection_state(account.as_ref(), network_id).await;
        self.publish_session(self.session());
        loaded
    }

    /// Prompt the wallet for account access.
    ///
    /// Returns the connected account, or `None` if the wallet granted nothing.
    /// A rejected prompt leaves the session unconnected. A newly connected
    /// account has its collection state loaded before this returns.
    pub async fn connect(&self) -> MintResult<Option<Address>> {
        let provider = self.require_provider()?;
        let accounts = match provider.request_accounts().await {
            Ok(accounts) => accounts,
            Err(ProviderError::Rejected(reason)) => {
                info!(%reason, "wallet connection rejected");
                self.state().notice = Some(Notice::persistent(messages::session::CONNECTION_REJECTED));
                return Err(MintError::ConnectionRejected);
            }
            Err(e) => return Err(e.into()),
        };

        let account = accounts.into_iter().next();
        let reload_on = {
            let mut state = self.state();
            match &account {
                Some(_) => {
                    let changed = state.set_account(account.clone());
                    state.notice = None;
                    state.session.network_id.filter(|_| changed)
                }
                None => {
                    state.notice = Some(Notice::persistent(messages::session::CONNECT_PROMPT));
                    None
                }
            }
        };
        if let Some(a) = &account {
            info!(account = %a, "wallet connected");
        }

        let loaded = match reload_on {
            Some(network_id) => self.load_collection_state(account.as_ref(), network_id).await,
            None => Ok(()),
        };
        self.publish_session(self.session());
        loaded.map(|()| account)
    }

    /// Bind the contract deployed on `network_id` and read max supply, total
    /// supply and the mint-open time, plus the owner's tokens when `account`
    /// is set. Nothing is committed unless every read succeeds, and nothing
    /// is committed once the session has moved to another account.
    pub async fn load_collection_state(&self, account: Option<&Address>, network_id: u64) -> MintResult<()> {
        let generation = self.generation();
        let provider = self.require_provider()?;

        let Some(address) = self.config.deployments.address_on(network_id) else {
            let reason = format!("no deployment for network {}", network_id);
            self.record_load_failure(generation, account, network_id, &reason);
            return Err(MintError::ContractUnreachable { network_id: Some(network_id), reason });
        };
        let contract = provider.contract_at(address);
        {
            let mut state = self.state();
            if state.generation != generation {
                return Ok(());
            }
            state.contract = Some(contract.clone());
        }

        match read_collection(contract.as_ref(), account).await {
            Ok((collection, ownership)) => {
                let mut state = self.state();
                if !state.is_current(generation, account) {
                    debug!(generation, "discarding collection load for a superseded session");
                    return Ok(());
                }
                debug!(
                    max_supply = collection.max_supply,
                    total_supply = collection.total_supply,
                    owned = ownership.len(),
                    "collection state loaded"
                );
                state.collection = collection;
                state.ownership = ownership;
                state.synced_for = Some(Session { connected_account: account.cloned(), network_id: Some(network_id) });
                if matches!(state.notice, Some(Notice { kind: NoticeKind::Blocking, .. })) {
                    state.notice = None;
                }
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(network_id, %reason, "collection state load failed");
                self.record_load_failure(generation, account, network_id, &reason);
                Err(MintError::ContractUnreachable { network_id: Some(network_id), reason })
            }
        }
    }

    /// Reload collection state for the current session, if a network is known.
    pub async fn refresh(&self) -> MintResult<()> {
        let session = self.session();
        match session.network_id {
            Some(network_id) => self.load_collection_state(session.connected_account.as_ref(), network_id).await,
            None => Ok(()),
        }
    }

    fn record_load_failure(&self, generation: u64, account: Option<&Address>, network_id: u64, reason: &str) {
        let mut state = self.state();
        if !state.is_current(generation, account) {
            return;
        }
        state.collection.load_error = Some(reason.to_string());
        state.synced_for = Some(Session { connected_account: account.cloned(), network_id: Some(network_id) });
        state.notice = Some(Notice::blocking(messages::contract::UNREACHABLE));
    }

    // ---------------------------------------------------------------------
    // Mint
    // ---------------------------------------------------------------------

    /// Submit a mint for `account` after the local gates pass.
    ///
    /// Gates, none of which touch the network: no mint in flight, collection
    /// loaded, mint open, nothing owned yet, `account` is the connected one.
    /// Resolves when the provider confirms or reports an error. Never retried.
    pub async fn attempt_mint(&self, account: &Address) -> MintResult<MintAttempt> {
        let (generation, contract, request) = match self.begin_mint(account) {
            Ok(started) => started,
            Err(e) => {
                info!(account = %account, reason = %e, "mint rejected locally");
                self.state().notice = Some(Notice::alert(e.to_string()));
                return Err(e);
            }
        };
        info!(account = %account, quantity = request.quantity, value_wei = %request.value_wei, "mint submitted");

        let mut handle = match contract.mint(&request).await {
            Ok(handle) => handle,
            Err(e) => return self.fail_mint(generation, e.to_string()),
        };
        {
            let mut state = self.state();
            if state.generation == generation {
                state.mint.tx_hash = Some(handle.tx_hash.clone());
            }
        }

        // First confirmation settles the attempt; later ones are not awaited.
        let outcome = loop {
            match handle.events.recv().await {
                Some(TxEvent::Confirmation { tx_hash, confirmations }) => {
                    debug!(%tx_hash, confirmations, "mint confirmation");
                    break Ok(());
                }
                Some(TxEvent::Error(message)) => break Err(message),
                None => break Err(messages::mint::DROPPED.to_string()),
            }
        };
        match outcome {
            Ok(()) => self.confirm_mint(generation, contract.as_ref(), account).await,
            Err(message) => self.fail_mint(generation, message),
        }
    }

    fn begin_mint(&self, account: &Address) -> MintResult<(u64, Arc<dyn CollectionContract>, MintRequest)> {
        let now: DateTime<Utc> = self.clock.now();
        let mut state = self.state();
        if state.mint.status == MintStatus::InFlight {
            return Err(MintError::MintInFlight);
        }
        if !state.collection.is_loaded {
            return Err(MintError::NotLoaded);
        }
        if !state.collection.is_open_at(now) {
            let opens_at = state.collection.mint_opens_at.unwrap_or(DateTime::<Utc>::MAX_UTC);
            return Err(MintError::NotYetOpen { opens_at });
        }
        if !state.ownership.is_empty() {
            return Err(MintError::AlreadyMinted);
        }
        let contract = match (&state.session.connected_account, &state.contract) {
            (Some(connected), Some(contract)) if connected == account => contract.clone(),
            _ => return Err(MintError::NotConnected),
        };
        state.mint = MintAttempt { status: MintStatus::InFlight, error_message: None, tx_hash: None };
        let request = MintRequest {
            from: account.clone(),
            quantity: self.config.mint_quantity,
            value_wei: self.config.mint_price_wei,
        };
        Ok((state.generation, contract, request))
    }

    async fn confirm_mint(&self, generation: u64, contract: &dyn CollectionContract, account: &Address) -> MintResult<MintAttempt> {
        let refreshed = tokio::try_join!(contract.max_supply(), contract.total_supply(), contract.wallet_of_owner(account));

        let mut state = self.state();
        if state.generation != generation {
            debug!(generation, "mint confirmed after reload, result discarded");
            return Ok(MintAttempt { status: MintStatus::Confirmed, error_message: None, tx_hash: None });
        }
        state.mint.status = MintStatus::Confirmed;
        if state.session.connected_account.as_ref() != Some(account) {
            debug!(account = %account, "account changed while mint was in flight, ownership not recorded");
            return Ok(state.mint.clone());
        }
        match refreshed {
            Ok((max_supply, total_supply, tokens)) => {
                state.collection.max_supply = max_supply;
                state.collection.total_supply = total_supply;
                state.ownership = OwnershipRecord::new(tokens);
            }
            Err(e) => {
                warn!(reason = %e, "post-mint refresh failed");
                state.collection.load_error = Some(e.to_string());
            }
        }
        info!(account = %account, total_supply = state.collection.total_supply, "mint confirmed");
        Ok(state.mint.clone())
    }

    fn fail_mint(&self, generation: u64, message: String) -> MintResult<MintAttempt> {
        warn!(%message, "mint failed");
        let mut state = self.state();
        if state.generation == generation {
            state.mint.status = MintStatus::Failed;
            state.mint.error_message = Some(message.clone());
            state.notice = Some(Notice::alert(message.clone()));
        }
        Err(MintError::MintRejected(message))
    }

    // ---------------------------------------------------------------------
    // Wallet events
    // ---------------------------------------------------------------------

    /// New primary account (or none). Clears the notice and the previous
    /// account's ownership; collection state is reloaded by whoever watches
    /// the session, not here.
    pub fn on_accounts_changed(&self, accounts: Vec<Address>) {
        let account = accounts.into_iter().next();
        let session = {
            let mut state = self.state();
            state.set_account(account.clone());
            state.notice = None;
            state.collection.load_error = None;
            state.session.clone()
        };
        info!(account = ?account.as_ref().map(Address::as_str), "accounts changed");
        self.publish_session(session);
    }

    /// A network switch invalidates everything: full reset, then reinit.
    pub async fn on_chain_changed(&self, network_id: u64) -> MintResult<()> {
        info!(network_id, "chain changed, reloading");
        self.reload().await
    }

    /// Tear down all in-memory state and run the page-load flow again.
    pub async fn reload(&self) -> MintResult<()> {
        self.reset();
        self.initialize().await
    }

    /// Drop every piece of session, collection and mint state. Idempotent.
    pub fn reset(&self) {
        {
            let mut state = self.state();
            let generation = state.generation + 1;
            *state = ControllerState::fresh(generation, self.config.default_links.clone());
        }
        self.publish_session(Session::default());
    }
}

async fn read_collection(
    contract: &dyn CollectionContract,
    account: Option<&Address>,
) -> Result<(CollectionState, OwnershipRecord), ContractError> {
    let (max_supply, total_supply, allow_minting_after, time_deployed) = tokio::try_join!(
        contract.max_supply(),
        contract.total_supply(),
        contract.allow_minting_after(),
        contract.time_deployed(),
    )?;
    let tokens = match account {
        Some(owner) => contract.wallet_of_owner(owner).await?,
        None => Vec::new(),
    };
    let collection = CollectionState {
        max_supply,
        total_supply,
        mint_opens_at: Some(mint_opens_at(time_deployed, allow_minting_after)),
        is_loaded: true,
        load_error: None,
    };
    Ok((collection, OwnershipRecord::new(tokens)))
}
