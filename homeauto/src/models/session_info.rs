//! `login_sid.lua` session document

use serde::Deserialize;

use crate::errors::HomeAutoError;

/// Session id the gateway hands out while nobody is logged in
pub const SENTINEL_SID: &str = "0000000000000000";

/// Session info returned by `login_sid.lua`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionInfo {
    #[serde(rename = "SID", default)]
    pub sid: String,

    #[serde(rename = "Challenge", default)]
    pub challenge: String,

    /// Seconds the gateway refuses further login attempts
    #[serde(rename = "BlockTime", default)]
    pub block_time: u32,
}

impl SessionInfo {
    /// Parse the XML document
    pub fn from_xml(body: &str) -> Result<Self, HomeAutoError> {
        if body.trim().is_empty() {
            return Err(HomeAutoError::QueryError("empty session document".to_string()));
        }
        Ok(quick_xml::de::from_str(body)?)
    }

    /// Whether the document carries a usable session id
    pub fn is_authenticated(&self) -> bool {
        is_valid_sid(&self.sid)
    }
}

/// A usable session id: at least 16 characters and not the sentinel
pub fn is_valid_sid(sid: &str) -> bool {
    let sid = sid.trim();
    sid.len() >= SENTINEL_SID.len() && sid != SENTINEL_SID
}
