//! Collaborators supplied by the host

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::HomeAutoError;
use crate::storage::settings::{GlobalSettings, InstanceSettings};

/// What an action shows
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub title: Option<String>,
    pub text: String,

    /// Outlet indicator
    pub switch_state: Option<bool>,
}

/// Render sink of the host
#[async_trait]
pub trait ActionDisplay: Send + Sync {
    async fn render(&self, instance_id: &str, frame: &Frame);

    /// Transient failure indicator
    async fn show_alert(&self, instance_id: &str);

    /// Transient success indicator
    async fn show_ok(&self, instance_id: &str);
}

/// Settings persistence of the host
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn persist_instance(
        &self,
        instance_id: &str,
        settings: &InstanceSettings,
    ) -> Result<(), HomeAutoError>;

    /// `notify_others` asks the host to broadcast the change to every action
    async fn persist_global(
        &self,
        settings: &GlobalSettings,
        notify_others: bool,
    ) -> Result<(), HomeAutoError>;
}

/// Time source
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
