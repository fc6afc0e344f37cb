//! Runtime - background tasks of a mint page and their shutdown

use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

use crate::cycle::Cycler;
use crate::session::{spawn_event_loop, MintController};

/// Shutdown signal broadcaster
#[derive(Clone)]
pub struct Shutdown {
    sender: broadcast::Sender<()>,
    triggered: Arc<RwLock<bool>>,
}

impl Default for Shutdown {
    fn default() -> Self { Self::new() }
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self { sender, triggered: Arc::new(RwLock::new(false)) }
    }

    /// Subscribe to shutdown signal
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    /// Trigger shutdown (once)
    pub async fn trigger(&self) {
        let mut triggered = self.triggered.write().await;
        if !*triggered {
            *triggered = true;
            let _ = self.sender.send(());
        }
    }

    pub async fn is_triggered(&self) -> bool {
        *self.triggered.read().await
    }
}

/// A running mint page: session controller, wallet event loop, cosmetic cycler.
pub struct MintRuntime {
    controller: Arc<MintController>,
    cycler: Arc<Cycler>,
    shutdown: Shutdown,
    event_loop: JoinHandle<()>,
}

impl MintRuntime {
    /// Initialize the session, then start the event loop and the cycler.
    ///
    /// Initialization errors are surfaced as notices on the controller; the
    /// page stays interactive, so they do not abort startup.
    pub async fn start(controller: Arc<MintController>) -> Self {
        if let Err(e) = controller.initialize().await {
            tracing::warn!(reason = %e, "initial session load failed");
        }
        let shutdown = Shutdown::new();
        let event_loop = spawn_event_loop(controller.clone(), shutdown.subscribe());
        let cycler = Arc::new(Cycler::from_config(controller.config()));
        cycler.start(shutdown.subscribe());
        Self { controller, cycler, shutdown, event_loop }
    }

    pub fn controller(&self) -> &Arc<MintController> { &self.controller }
    pub fn cycler(&self) -> &Arc<Cycler> { &self.cycler }
    pub fn shutdown(&self) -> &Shutdown { &self.shutdown }

    /// Stop background tasks and wait for the event loop to exit.
    pub async fn stop(self) {
        self.shutdown.trigger().await;
        if let Err(e) = self.event_loop.await {
            tracing::warn!(reason = %e, "event loop task failed");
        }
    }
}
