//! Action instances driven by the host

pub mod context;
pub mod controller;
pub mod host;
pub mod kind;
