//! Persisted settings

pub mod file;
pub mod layout;
pub mod settings;
