//! Gateway document models

pub mod devicelist;
pub mod session_info;
