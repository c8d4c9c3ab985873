//! Gateway authentication state

pub mod session;
