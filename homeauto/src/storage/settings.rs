//! Settings documents

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actions::kind::ActionKind;
use crate::cache::devices::Device;
use crate::logs::LogLevel;

/// Gateway credentials and session token, shared by all actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    #[serde(default = "default_base_url")]
    pub base_url: Option<String>,

    #[serde(default)]
    pub user_name: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub sid: Option<String>,
}

/// Address of a gateway on its factory settings
pub const DEFAULT_BASE_URL: &str = "http://fritz.box/";

fn default_base_url() -> Option<String> {
    Some(DEFAULT_BASE_URL.to_string())
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_name: None,
            password: None,
            sid: None,
        }
    }
}

/// Per-action settings: cached device list, selection and last reading
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSettings {
    #[serde(default)]
    pub devices: Option<Vec<Device>>,

    /// Selected device
    #[serde(default)]
    pub ain: Option<String>,

    /// Last successful value fetch
    #[serde(default)]
    pub last_refresh: Option<DateTime<Utc>>,

    /// Last successful device list fetch
    #[serde(default)]
    pub devices_refreshed: Option<DateTime<Utc>>,

    #[serde(default)]
    pub title: Option<String>,

    /// Last reading, already transformed for display
    #[serde(default)]
    pub data: Option<f64>,
}

/// Configuration of the reference host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfig {
    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default)]
    pub json_logs: bool,

    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,

    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    #[serde(default)]
    pub global: GlobalSettings,

    #[serde(default)]
    pub actions: Vec<ActionDecl>,
}

fn default_tick_interval() -> u64 {
    1
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".homeauto")
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            json_logs: false,
            log_dir: None,
            tick_interval_secs: default_tick_interval(),
            state_dir: default_state_dir(),
            global: GlobalSettings::default(),
            actions: Vec::new(),
        }
    }
}

/// One configured action instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDecl {
    pub id: String,

    pub kind: ActionKind,

    #[serde(default)]
    pub settings: InstanceSettings,
}
