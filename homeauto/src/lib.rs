//! FRITZ!Box smart-home polling engine
//!
//! Authenticates against the gateway's AHA HTTP interface, keeps a per-action device
//! list and selection in sync, and polls outlet, energy, temperature and humidity
//! readings on behalf of a host that renders them.

pub mod actions;
pub mod app;
pub mod authn;
pub mod cache;
pub mod errors;
pub mod http;
pub mod logs;
pub mod models;
pub mod poll;
pub mod storage;
pub mod utils;
pub mod workers;
