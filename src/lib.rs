//! Resilient multi-relay quote refresh pipeline.
//!
//! Populates crypto, stock, index, and commodity price widgets from public
//! keyless APIs, reaching a browser-blocked quote provider through a table
//! of CORS relays. The pipeline races relays with per-attempt timeouts,
//! normalizes heterogeneous payloads into finite-only quote snapshots,
//! remembers last-known-good values in an expiring local cache, and writes
//! display patches that never fabricate a value.

pub mod app;
pub mod board;
pub mod cache;
pub mod cli;
pub mod controller;
pub mod error;
pub mod fetch;
pub mod format;
pub mod mapper;
pub mod quote;
pub mod relay;
pub mod render;
pub mod utils;

pub use error::{FetchError, Result};
