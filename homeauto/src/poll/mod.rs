//! Per-action polling engine

pub mod fsm;
pub mod guard;
pub mod machine;
