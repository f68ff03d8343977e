//! Truth Signals
//!
//! Fetches recent Truth Social posts, classifies their sentiment and maps
//! each one to a BUY/SELL/HOLD signal.

pub mod client;
pub mod config;
pub mod error;
pub mod ingester;
pub mod pipeline;
pub mod sentiment;
pub mod server;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, SignalError};
