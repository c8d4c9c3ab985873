//! Reference host: wires the engine to files, a log display and stdin

pub mod display;
pub mod options;
pub mod run;
