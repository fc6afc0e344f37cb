//! Core value types shared by the session, wallet and config layers.

pub mod address;
pub mod messages;
pub mod time;

pub use address::{Address, AddressError};
pub use time::{Clock, FixedClock, SystemClock};
