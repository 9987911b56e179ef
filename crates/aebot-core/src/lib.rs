//! Core engine for the wallet chat bot: command descriptors and parsing, the
//! dispatch state machine, conversation persistence, the verified-account
//! cache, and fiat price rates.
//!
//! This crate is platform-agnostic. Chat transports and chain access live
//! behind ports (traits) implemented in adapter crates.

pub mod command;
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod ports;
pub mod rates;
pub mod select;
pub mod storage;
pub mod verified;

pub use errors::{Error, Result};
