//! Messenger abstractions: the outbound port, the inbound update model, and a
//! throttling decorator.

pub mod port;
pub mod throttled;
pub mod types;
