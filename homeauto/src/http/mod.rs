//! AHA HTTP interface of the gateway

pub mod client;
pub mod login;
pub mod switchcmd;
