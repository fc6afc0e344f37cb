//! Time source for mint gating
//!
//! Gating compares against an absolute epoch timestamp read from the contract,
//! so the only local input is "now".

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Mutex;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> { Utc::now() }
}

/// Settable clock for tests and simulations.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self { Self { now: Mutex::new(now) } }

    pub fn at_secs(secs: i64) -> Self { Self::new(from_epoch_secs(secs)) }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> { *self.now.lock().unwrap_or_else(|p| p.into_inner()) }
}

/// Epoch seconds to UTC. Out-of-range values saturate to the far future so an
/// unrepresentable open time never reads as "already open".
pub fn from_epoch_secs(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Mint-open instant: `timeDeployed + allowMintingAfter`, both contract seconds.
pub fn mint_opens_at(time_deployed: u64, allow_minting_after: u64) -> DateTime<Utc> {
    let secs = time_deployed.saturating_add(allow_minting_after);
    from_epoch_secs(i64::try_from(secs).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_at_sums_contract_seconds() {
        let at = mint_opens_at(1_650_000_000, 120);
        assert_eq!(at.timestamp(), 1_650_000_120);
    }

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::at_secs(1_000);
        clock.advance(chrono::Duration::seconds(5));
        assert_eq!(clock.now().timestamp(), 1_005);
        clock.set(from_epoch_secs(10));
        assert_eq!(clock.now().timestamp(), 10);
    }

    #[test]
    fn overflow_saturates_to_far_future() {
        assert_eq!(mint_opens_at(u64::MAX, 1), DateTime::<Utc>::MAX_UTC);
    }
}
