//! Error taxonomy for the mint session.
//!
//! `MintError` is what callers see; its `Display` is the text shown to the
//! user. `ProviderError` and `ContractError` describe collaborator failures
//! and are folded into `MintError` at the controller boundary.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::messages;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// User declined the request in the wallet UI.
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("provider rpc: {0}")]
    Rpc(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("{method}() failed: {reason}")]
    Call { method: &'static str, reason: String },
    #[error("mint submission failed: {0}")]
    Submit(String),
}

impl ContractError {
    pub fn call(method: &'static str, reason: impl Into<String>) -> Self {
        Self::Call { method, reason: reason.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MintError {
    #[error("{}", messages::session::NO_WALLET)]
    ProviderUnavailable,
    #[error("{}", messages::session::CONNECTION_REJECTED)]
    ConnectionRejected,
    #[error("{}", messages::contract::UNREACHABLE)]
    ContractUnreachable { network_id: Option<u64>, reason: String },
    /// Provider-supplied message, shown verbatim.
    #[error("{0}")]
    MintRejected(String),
    #[error("{}", messages::mint::ALREADY_MINTED)]
    AlreadyMinted,
    #[error("{}", messages::mint::NOT_LIVE)]
    NotYetOpen { opens_at: DateTime<Utc> },
    #[error("{}", messages::mint::IN_FLIGHT)]
    MintInFlight,
    #[error("{}", messages::mint::NOT_LOADED)]
    NotLoaded,
    #[error("{}", messages::mint::NOT_CONNECTED)]
    NotConnected,
    #[error("provider: {0}")]
    Provider(#[from] ProviderError),
}

impl MintError {
    /// Local policy gates that are decided without touching the network.
    pub fn is_local_gate(&self) -> bool {
        matches!(
            self,
            MintError::AlreadyMinted
                | MintError::NotYetOpen { .. }
                | MintError::MintInFlight
                | MintError::NotLoaded
                | MintError::NotConnected
        )
    }
}

pub type MintResult<T> = Result<T, MintError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_user_text() {
        assert_eq!(MintError::AlreadyMinted.to_string(), "You've already minted!");
        assert_eq!(
            MintError::NotYetOpen { opens_at: DateTime::<Utc>::UNIX_EPOCH }.to_string(),
            "Minting is not live yet!"
        );
        assert_eq!(MintError::MintRejected("out of gas".into()).to_string(), "out of gas");
    }

    #[test]
    fn contract_call_names_method() {
        let e = ContractError::call("maxSupply", "execution reverted");
        assert_eq!(e.to_string(), "maxSupply() failed: execution reverted");
    }

    #[test]
    fn gates_are_local() {
        assert!(MintError::AlreadyMinted.is_local_gate());
        assert!(!MintError::MintRejected("x".into()).is_local_gate());
        assert!(!MintError::ProviderUnavailable.is_local_gate());
    }
}
