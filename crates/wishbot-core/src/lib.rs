//! Core of the wish bot: flows, callback tokens, confirmations and the update router.
//!
//! This crate is framework-agnostic. Telegram lives behind the messaging port and
//! persistence behind the data store port; adapters implement them.

pub mod callback;
pub mod config;
pub mod confirm;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod notify;
pub mod router;
pub mod state;
pub mod store;
pub mod texts;

#[cfg(test)]
mod mocks;

pub use errors::{Error, Result};
