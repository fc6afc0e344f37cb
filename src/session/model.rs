//! Session model: what the page renders from

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::Address;

/// Wallet identity as last reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub connected_account: Option<Address>,
    pub network_id: Option<u64>,
}

impl Session {
    pub fn is_connected(&self) -> bool { self.connected_account.is_some() }
}

/// Read-only collection state loaded from the contract.
///
/// Values are replaced only by a load in which every read succeeded, so a
/// failed refresh leaves the last good values visible next to `load_error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionState {
    pub max_supply: u64,
    pub total_supply: u64,
    pub mint_opens_at: Option<DateTime<Utc>>,
    pub is_loaded: bool,
    pub load_error: Option<String>,
}

impl CollectionState {
    /// `max_supply - total_supply`, clamped at zero.
    pub fn remaining_supply(&self) -> u64 {
        if self.total_supply > self.max_supply {
            tracing::warn!(
                max_supply = self.max_supply,
                total_supply = self.total_supply,
                "total supply exceeds max supply"
            );
        }
        self.max_supply.saturating_sub(self.total_supply)
    }

    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.mint_opens_at.map(|at| now >= at).unwrap_or(false)
    }

    /// Countdown to opening; zero once open, `None` until loaded.
    pub fn time_until_open(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        let at = self.mint_opens_at?;
        Some((at - now).max(chrono::Duration::zero()))
    }
}

/// Token ids owned by the connected account, in contract order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OwnershipRecord {
    pub tokens: Vec<u64>,
}

impl OwnershipRecord {
    pub fn new(tokens: Vec<u64>) -> Self { Self { tokens } }
    pub fn is_empty(&self) -> bool { self.tokens.is_empty() }
    pub fn first(&self) -> Option<u64> { self.tokens.first().copied() }
    pub fn len(&self) -> usize { self.tokens.len() }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum MintStatus {
    #[default]
    Idle,
    InFlight,
    Confirmed,
    Failed,
}

impl MintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MintStatus::Idle => "idle",
            MintStatus::InFlight => "in-flight",
            MintStatus::Confirmed => "confirmed",
            MintStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, MintStatus::Confirmed | MintStatus::Failed) }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MintAttempt {
    pub status: MintStatus,
    pub error_message: Option<String>,
    pub tx_hash: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoticeKind {
    /// Instructional, stays until the situation changes.
    Persistent,
    /// Replaces the normal content (contract unreachable).
    Blocking,
    /// One-shot alert.
    Alert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn persistent(message: impl Into<String>) -> Self { Self { kind: NoticeKind::Persistent, message: message.into() } }
    pub fn blocking(message: impl Into<String>) -> Self { Self { kind: NoticeKind::Blocking, message: message.into() } }
    pub fn alert(message: impl Into<String>) -> Self { Self { kind: NoticeKind::Alert, message: message.into() } }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::from_epoch_secs;

    #[test]
    fn remaining_supply_clamps() {
        let s = CollectionState { max_supply: 10, total_supply: 12, ..Default::default() };
        assert_eq!(s.remaining_supply(), 0);
        let s = CollectionState { max_supply: 1000, total_supply: 1, ..Default::default() };
        assert_eq!(s.remaining_supply(), 999);
    }

    #[test]
    fn open_gate_and_countdown() {
        let s = CollectionState { mint_opens_at: Some(from_epoch_secs(100)), ..Default::default() };
        assert!(!s.is_open_at(from_epoch_secs(99)));
        assert!(s.is_open_at(from_epoch_secs(100)));
        assert_eq!(s.time_until_open(from_epoch_secs(40)), Some(chrono::Duration::seconds(60)));
        assert_eq!(s.time_until_open(from_epoch_secs(400)), Some(chrono::Duration::zero()));
        assert!(CollectionState::default().time_until_open(from_epoch_secs(0)).is_none());
        assert!(!CollectionState::default().is_open_at(from_epoch_secs(0)));
    }

    #[test]
    fn terminal_statuses() {
        assert!(MintStatus::Confirmed.is_terminal());
        assert!(MintStatus::Failed.is_terminal());
        assert!(!MintStatus::InFlight.is_terminal());
        assert_eq!(MintStatus::default(), MintStatus::Idle);
    }
}
