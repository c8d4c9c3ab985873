//! Application configuration options

use std::time::Duration;

use crate::storage::layout::StorageLayout;
use crate::storage::settings::{ActionDecl, GlobalSettings, HostConfig};
use crate::workers::ticker;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// State directory layout
    pub layout: StorageLayout,

    /// Credentials used when no global settings were saved yet
    pub global: GlobalSettings,

    /// Configured action instances
    pub actions: Vec<ActionDecl>,

    /// Ticker worker options
    pub ticker: ticker::Options,

    /// Read key presses from stdin
    pub enable_keypad: bool,

    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl AppOptions {
    pub fn from_config(config: &HostConfig) -> Self {
        Self {
            layout: StorageLayout::new(config.state_dir.clone()),
            global: config.global.clone(),
            actions: config.actions.clone(),
            ticker: ticker::Options {
                interval: Duration::from_secs(config.tick_interval_secs.max(1)),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            layout: StorageLayout::new(".homeauto"),
            global: GlobalSettings::default(),
            actions: Vec::new(),
            ticker: ticker::Options::default(),
            enable_keypad: true,
            max_shutdown_delay: Duration::from_secs(10),
        }
    }
}
