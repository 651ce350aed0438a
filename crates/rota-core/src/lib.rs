//! Core types, store contracts and the reviewer assignment engine for Rota.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement the traits in [`store`]; transports drive the
//! operations exposed by [`ReviewEngine`].

pub mod deactivation;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod membership;
pub mod memory;
pub mod pull_request;
pub mod selector;
pub mod stats;
pub mod store;
pub mod team;

#[cfg(test)]
mod test_support;

pub use engine::ReviewEngine;
pub use error::{Error, ErrorKind, Result};
