//! Event loop: wallet subscriptions plus the reactive reload on session change

use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use super::MintController;
use crate::wallet::WalletEvent;

/// Drive `controller` from provider events until shutdown.
///
/// Account changes update the session; the session watch then reloads
/// collection state unless the controller already read it for that session.
/// A chain change reloads the controller. Both receivers are taken before
/// the task is spawned and live for the whole loop, so events that arrive
/// while a reload is awaited stay queued.
pub fn spawn_event_loop(
    controller: Arc<MintController>,
    mut shutdown: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    let Some(provider) = controller.provider() else {
        warn!("no wallet provider, event loop not started");
        return tokio::spawn(async {});
    };
    let mut wallet_rx = provider.subscribe();
    let mut session_rx = controller.watch_session();
    drop(session_rx.borrow_and_update());

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("event loop stopped");
                    return;
                }
                event = wallet_rx.recv() => match event {
                    Ok(WalletEvent::AccountsChanged(accounts)) => controller.on_accounts_changed(accounts),
                    Ok(WalletEvent::ChainChanged(network_id)) => {
                        if let Err(e) = controller.on_chain_changed(network_id).await {
                            warn!(network_id, reason = %e, "reload after chain change failed");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "wallet events lagged"),
                    Err(RecvError::Closed) => {
                        info!("wallet event stream closed");
                        return;
                    }
                },
                changed = session_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    let session = session_rx.borrow_and_update().clone();
                    if controller.is_synced_with(&session) {
                        debug!("session already loaded");
                    } else if let Some(network_id) = session.network_id {
                        debug!(connected = session.is_connected(), "session changed, reloading");
                        if let Err(e) = controller
                            .load_collection_state(session.connected_account.as_ref(), network_id)
                            .await
                        {
                            warn!(network_id, reason = %e, "reload after session change failed");
                        }
                    }
                }
            }
        }
    })
}
