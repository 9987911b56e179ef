//! The wallet bot itself: its commands, the sign-transaction deeplinks they
//! hand out, and the HTTP callback surface the wallet confirms through.

pub mod bot;
pub mod callback;
pub mod commands;
pub mod deeplink;

#[cfg(test)]
pub(crate) mod testing;

pub use bot::WalletBot;
pub use callback::{router, CallbackState};
