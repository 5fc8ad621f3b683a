//! HTTP trigger surface.
//!
//! Serves the on-demand report and lets operators kick off a scheduled run.

pub mod routes;
pub mod server;

pub use server::{ApiServer, ApiServerConfig, AppState};
