//! Challenge-response login against `login_sid.lua`

use md5::{Digest, Md5};
use tracing::{debug, info, warn};

use crate::errors::HomeAutoError;
use crate::http::client::GatewayClient;
use crate::models::session_info::SessionInfo;

const LOGIN_PATH: &str = "/login_sid.lua";

impl GatewayClient {
    /// Log in with user name and password and return the session id.
    ///
    /// The first request either yields a still-valid session or a challenge; the
    /// second answers the challenge. A sentinel SID after answering means the
    /// credentials were refused.
    pub async fn login(&self, user_name: &str, password: &str) -> Result<String, HomeAutoError> {
        if user_name.trim().is_empty() || password.is_empty() {
            return Err(HomeAutoError::ConfigError("user name or password missing".to_string()));
        }

        let body = self.get_text(LOGIN_PATH, &[("username", user_name)]).await?;
        let info = SessionInfo::from_xml(&body)?;
        if info.is_authenticated() {
            debug!("Gateway reused an existing session");
            return Ok(info.sid);
        }

        if info.block_time > 0 {
            warn!("Gateway blocks logins for another {}s", info.block_time);
        }
        if info.challenge.is_empty() {
            return Err(HomeAutoError::AuthError("gateway sent no challenge".to_string()));
        }

        let response = challenge_response(&info.challenge, password);
        let body = self
            .get_text(LOGIN_PATH, &[("username", user_name), ("response", &response)])
            .await?;
        let info = SessionInfo::from_xml(&body)?;
        if !info.is_authenticated() {
            return Err(HomeAutoError::AuthError(format!(
                "gateway rejected credentials for '{}' (blocked for {}s)",
                user_name, info.block_time
            )));
        }

        info!("Logged in to gateway as '{}'", user_name);
        Ok(info.sid)
    }
}

/// Answer to a login challenge: `challenge-md5hex(utf16le(challenge-password))`.
///
/// Code points above 255 are replaced by `.` before hashing, matching the gateway.
pub fn challenge_response(challenge: &str, password: &str) -> String {
    let input = format!("{}-{}", challenge, password);
    let bytes: Vec<u8> = input
        .chars()
        .map(|c| if (c as u32) > 0xff { b'.' as u16 } else { c as u16 })
        .flat_map(u16::to_le_bytes)
        .collect();

    format!("{}-{:x}", challenge, Md5::digest(&bytes))
}
