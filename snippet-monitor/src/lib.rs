//! snippet-monitor library crate.
//!
//! Audits every zone visible to a set of Cloudflare API tokens for Snippets
//! availability and announces zones that became enabled since the last
//! scheduled run.

pub mod api;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod notification;
pub mod render;
pub mod service;
pub mod state;
pub mod trigger;

#[cfg(test)]
mod test_support;

pub use config::MonitorConfig;
pub use error::{Error, Result};
pub use service::MonitorService;
