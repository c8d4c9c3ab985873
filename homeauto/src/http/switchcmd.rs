//! `homeautoswitch.lua` commands

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::errors::HomeAutoError;
use crate::http::client::GatewayClient;
use crate::models::devicelist::{DeviceList, RawDevice};

const HOMEAUTO_PATH: &str = "/webservices/homeautoswitch.lua";

/// Value of the `switchcmd` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchCmd {
    GetDeviceListInfos,
    GetDeviceInfos,
    GetSwitchState,
    SetSwitchOn,
    SetSwitchOff,
    SetSwitchToggle,
    GetSwitchPower,
    GetTemperature,
}

impl SwitchCmd {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwitchCmd::GetDeviceListInfos => "getdevicelistinfos",
            SwitchCmd::GetDeviceInfos => "getdeviceinfos",
            SwitchCmd::GetSwitchState => "getswitchstate",
            SwitchCmd::SetSwitchOn => "setswitchon",
            SwitchCmd::SetSwitchOff => "setswitchoff",
            SwitchCmd::SetSwitchToggle => "setswitchtoggle",
            SwitchCmd::GetSwitchPower => "getswitchpower",
            SwitchCmd::GetTemperature => "gettemperature",
        }
    }
}

impl fmt::Display for SwitchCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GatewayClient {
    async fn command(
        &self,
        sid: &str,
        cmd: SwitchCmd,
        ain: Option<&str>,
    ) -> Result<String, HomeAutoError> {
        if sid.trim().is_empty() {
            return Err(HomeAutoError::QueryError(format!("{}: no session", cmd)));
        }

        let mut query = vec![("sid", sid), ("switchcmd", cmd.as_str())];
        if let Some(ain) = ain {
            if ain.trim().is_empty() {
                return Err(HomeAutoError::QueryError(format!("{}: no device selected", cmd)));
            }
            query.push(("ain", ain));
        }

        let body = self.get_text(HOMEAUTO_PATH, &query).await?;
        debug!("{} -> {} bytes", cmd, body.len());
        Ok(body)
    }

    /// Every device the gateway knows, reachable or not
    pub async fn device_list(&self, sid: &str) -> Result<Vec<RawDevice>, HomeAutoError> {
        let body = self.command(sid, SwitchCmd::GetDeviceListInfos, None).await?;
        Ok(DeviceList::from_xml(&body)?.devices)
    }

    pub async fn device_infos(&self, sid: &str, ain: &str) -> Result<RawDevice, HomeAutoError> {
        let body = self.command(sid, SwitchCmd::GetDeviceInfos, Some(ain)).await?;
        RawDevice::from_xml(&body)
    }

    pub async fn switch_state(&self, sid: &str, ain: &str) -> Result<bool, HomeAutoError> {
        let body = self.command(sid, SwitchCmd::GetSwitchState, Some(ain)).await?;
        parse_switch_state(SwitchCmd::GetSwitchState, &body)
    }

    pub async fn switch_on(&self, sid: &str, ain: &str) -> Result<bool, HomeAutoError> {
        let body = self.command(sid, SwitchCmd::SetSwitchOn, Some(ain)).await?;
        parse_switch_state(SwitchCmd::SetSwitchOn, &body)
    }

    pub async fn switch_off(&self, sid: &str, ain: &str) -> Result<bool, HomeAutoError> {
        let body = self.command(sid, SwitchCmd::SetSwitchOff, Some(ain)).await?;
        parse_switch_state(SwitchCmd::SetSwitchOff, &body)
    }

    pub async fn switch_toggle(&self, sid: &str, ain: &str) -> Result<bool, HomeAutoError> {
        let body = self.command(sid, SwitchCmd::SetSwitchToggle, Some(ain)).await?;
        parse_switch_state(SwitchCmd::SetSwitchToggle, &body)
    }

    pub async fn switch_power(&self, sid: &str, ain: &str) -> Result<u64, HomeAutoError> {
        let body = self.command(sid, SwitchCmd::GetSwitchPower, Some(ain)).await?;
        parse_number(SwitchCmd::GetSwitchPower, &body)
    }

    pub async fn temperature(&self, sid: &str, ain: &str) -> Result<i64, HomeAutoError> {
        let body = self.command(sid, SwitchCmd::GetTemperature, Some(ain)).await?;
        parse_number(SwitchCmd::GetTemperature, &body)
    }
}

/// Parse a single plain-text number. Empty and `inval` replies are errors.
pub fn parse_number<T: FromStr>(cmd: SwitchCmd, body: &str) -> Result<T, HomeAutoError> {
    let value = body.trim();
    if value.is_empty() {
        return Err(HomeAutoError::QueryError(format!("{}: empty reply", cmd)));
    }
    if value.eq_ignore_ascii_case("inval") {
        return Err(HomeAutoError::QueryError(format!("{}: value unknown to gateway", cmd)));
    }
    value
        .parse()
        .map_err(|_| HomeAutoError::QueryError(format!("{}: non-numeric reply '{}'", cmd, value)))
}

fn parse_switch_state(cmd: SwitchCmd, body: &str) -> Result<bool, HomeAutoError> {
    match parse_number::<u8>(cmd, body)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(HomeAutoError::QueryError(format!("{}: unexpected state {}", cmd, other))),
    }
}
