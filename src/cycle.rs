//! Cycler - decorative counter redrawn on a fixed period
//!
//! Drives the showcase image index on the page. It shares nothing with the
//! session or mint state. Starting is idempotent: a second `start` while the
//! timer runs is a no-op, so re-renders cannot stack intervals.

use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::MintConfig;

pub struct Cycler {
    period: Duration,
    min: u32,
    max: u32,
    value: Arc<AtomicU32>,
    ticks: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
}

impl Cycler {
    pub fn new(period: Duration, min: u32, max: u32, initial: u32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            period,
            min,
            max,
            value: Arc::new(AtomicU32::new(initial)),
            ticks: Arc::new(AtomicU64::new(0)),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_config(config: &MintConfig) -> Self {
        Self::new(
            Duration::from_millis(config.cycle_period_ms),
            config.cycle_min,
            config.cycle_max,
            config.cycle_initial,
        )
    }

    /// Spawn the timer. Returns `None` if it is already running.
    pub fn start(&self, mut shutdown: broadcast::Receiver<()>) -> Option<JoinHandle<()>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("cycler already running");
            return None;
        }

        let (period, min, max) = (self.period, self.min, self.max);
        let (value, ticks, running) = (self.value.clone(), self.ticks.clone(), self.running.clone());
        Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = tokio::time::sleep(period) => {
                        let next = rand::thread_rng().gen_range(min..=max);
                        value.store(next, Ordering::Relaxed);
                        ticks.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
            running.store(false, Ordering::SeqCst);
        }))
    }

    pub fn current(&self) -> u32 { self.value.load(Ordering::Relaxed) }
    pub fn ticks(&self) -> u64 { self.ticks.load(Ordering::Relaxed) }
    pub fn is_running(&self) -> bool { self.running.load(Ordering::SeqCst) }
    pub fn period(&self) -> Duration { self.period }
}
