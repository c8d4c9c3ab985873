//! Background workers of the reference host

pub mod keypad;
pub mod ticker;
