//! User-facing message constants
//!
//! Centralized registry for every string the session surfaces to the page.

/// Session / provider notices
pub mod session {
    pub const NO_WALLET: &str = "No wallet detected, please install MetaMask";
    pub const CONNECT_PROMPT: &str = "Please connect with MetaMask";
    pub const CONNECTION_REJECTED: &str = "Wallet connection was rejected";
}

/// Contract read notices
pub mod contract {
    pub const UNREACHABLE: &str =
        "Contract not deployed to current network, please change network in MetaMask";
}

/// Mint alerts
pub mod mint {
    pub const NOT_LIVE: &str = "Minting is not live yet!";
    pub const ALREADY_MINTED: &str = "You've already minted!";
    pub const IN_FLIGHT: &str = "A mint is already in progress";
    pub const NOT_LOADED: &str = "Collection state has not loaded yet";
    pub const NOT_CONNECTED: &str = "Connect a wallet before minting";
    pub const DROPPED: &str = "Transaction ended without confirmation";
}
