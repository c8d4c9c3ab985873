//! Per-action caches

pub mod devices;
