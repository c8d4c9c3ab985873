//! What each kind of action polls and how it shows the reading

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::HomeAutoError;
use crate::http::client::GatewayApi;
use crate::models::devicelist::Capability;
use crate::utils::round_half_even;

/// Kind of action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Switchable outlet
    #[serde(alias = "switch")]
    Outlet,

    /// Current power draw of an outlet
    #[serde(alias = "energy")]
    PowerMeter,

    #[serde(alias = "temperature")]
    Thermometer,

    #[serde(alias = "humidity")]
    Hygrometer,
}

impl ActionKind {
    /// Block a device must expose to be listed for this kind
    pub fn capability(&self) -> Capability {
        match self {
            ActionKind::Outlet => Capability::Switch,
            ActionKind::PowerMeter => Capability::PowerMeter,
            ActionKind::Thermometer => Capability::Temperature,
            ActionKind::Hygrometer => Capability::Humidity,
        }
    }

    /// Minimum time between two value fetches
    pub fn value_cooldown(&self) -> Duration {
        match self {
            ActionKind::Outlet => Duration::from_secs(60),
            ActionKind::PowerMeter | ActionKind::Thermometer | ActionKind::Hygrometer => {
                Duration::from_secs(300)
            }
        }
    }

    /// Only outlets react to key presses
    pub fn handles_key_press(&self) -> bool {
        matches!(self, ActionKind::Outlet)
    }

    /// Fetch the current reading and convert it to its display unit
    pub async fn fetch_reading(
        &self,
        gateway: &dyn GatewayApi,
        sid: &str,
        ain: &str,
    ) -> Result<f64, HomeAutoError> {
        let value = match self {
            ActionKind::Outlet => switch_value(gateway.get_switch_state(sid, ain).await?),
            ActionKind::PowerMeter => milliwatts_to_watts(gateway.get_switch_power(sid, ain).await?),
            ActionKind::Thermometer => {
                deci_celsius_to_celsius(gateway.get_temperature(sid, ain).await?)
            }
            ActionKind::Hygrometer => f64::from(gateway.get_humidity(sid, ain).await?),
        };
        Ok(value)
    }

    /// Text shown on the action
    pub fn format(&self, value: f64) -> String {
        match self {
            ActionKind::Outlet => {
                let text = if value >= 0.5 { "On" } else { "Off" };
                text.to_string()
            }
            ActionKind::PowerMeter => format!("{} W", value),
            ActionKind::Thermometer => format!("{} °C", value),
            ActionKind::Hygrometer => format!("{} %", value),
        }
    }

    /// Two-state indicator, outlets only
    pub fn switch_state(&self, value: f64) -> Option<bool> {
        match self {
            ActionKind::Outlet => Some(value >= 0.5),
            _ => None,
        }
    }
}

/// Outlet state as a reading
pub fn switch_value(on: bool) -> f64 {
    if on {
        1.0
    } else {
        0.0
    }
}

/// mW to whole W, ties to even
pub fn milliwatts_to_watts(milliwatts: u64) -> f64 {
    round_half_even(milliwatts as f64 / 1000.0)
}

/// 0.1 °C to whole °C, ties to even
pub fn deci_celsius_to_celsius(deci: i64) -> f64 {
    round_half_even(deci as f64 / 10.0)
}
