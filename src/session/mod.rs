//! Session: wallet connection and mint readiness
//!
//! # Lifecycle
//!
//! ```text
//! initialize ──► Session { account?, network } ──► load_collection_state
//!                     ▲          │                          │
//!   AccountsChanged ──┘          │ watch::Receiver<Session> │
//!                                ▼                          ▼
//!                     event loop reloads           CollectionState + OwnershipRecord
//!                                                           │
//!   ChainChanged ──► reset + initialize                     ▼
//!                                      attempt_mint: Idle → InFlight → Confirmed | Failed
//! ```
//!
//! | Operation | Method |
//! |-----------|--------|
//! | connect | `MintController::connect` |
//! | load collection state | `MintController::load_collection_state` |
//! | attempt mint | `MintController::attempt_mint` |
//! | account change | `MintController::on_accounts_changed` |
//! | network change | `MintController::on_chain_changed` |

mod controller;
mod events;
mod model;

pub use controller::MintController;
pub use events::spawn_event_loop;
pub use model::{CollectionState, MintAttempt, MintStatus, Notice, NoticeKind, OwnershipRecord, Session};
