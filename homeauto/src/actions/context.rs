//! State and collaborators of one action instance

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard};
use tracing::warn;

use crate::actions::host::{ActionDisplay, Clock, Frame, SettingsStore};
use crate::actions::kind::ActionKind;
use crate::authn::session::SessionState;
use crate::cache::devices::DeviceCache;
use crate::http::client::GatewayApi;
use crate::storage::settings::InstanceSettings;
use crate::utils::is_due;

/// Services shared by every action of the process
#[derive(Clone)]
pub struct ActionServices {
    pub gateway: Arc<dyn GatewayApi>,
    pub session: Arc<SessionState>,
    pub display: Arc<dyn ActionDisplay>,
    pub store: Arc<dyn SettingsStore>,
    pub clock: Arc<dyn Clock>,
}

/// Selected device and its last reading
#[derive(Debug, Clone, Default)]
pub struct DeviceSelection {
    pub selected: Option<String>,

    /// Last successful value fetch; failures leave it alone
    pub last_refresh: Option<DateTime<Utc>>,

    pub last_value: Option<f64>,

    /// Bumped whenever a reading is recorded or the device changes
    revision: u64,
}

impl DeviceSelection {
    pub fn is_value_due(&self, now: DateTime<Utc>, cooldown: Duration) -> bool {
        is_due(now, self.last_refresh, cooldown)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn record(&mut self, value: f64, at: DateTime<Utc>) {
        self.last_value = Some(value);
        self.last_refresh = Some(at);
        self.revision += 1;
    }

    /// Point at another device, forgetting the old reading
    pub fn select(&mut self, ain: Option<String>) {
        self.selected = ain.filter(|a| !a.trim().is_empty());
        self.last_refresh = None;
        self.last_value = None;
        self.revision += 1;
    }
}

/// Mutable state of one action instance
#[derive(Debug, Clone)]
pub struct InstanceState {
    pub cache: DeviceCache,
    pub selection: DeviceSelection,
    pub title: Option<String>,

    /// Something was rendered since construction
    pub rendered: bool,
}

impl InstanceState {
    pub fn from_settings(settings: InstanceSettings) -> Self {
        Self {
            cache: DeviceCache::restore(settings.devices, settings.devices_refreshed),
            selection: DeviceSelection {
                selected: settings.ain.filter(|a| !a.trim().is_empty()),
                last_refresh: settings.last_refresh,
                last_value: settings.data,
                revision: 0,
            },
            title: settings.title,
            rendered: false,
        }
    }

    pub fn to_settings(&self) -> InstanceSettings {
        InstanceSettings {
            devices: self.cache.snapshot(),
            ain: self.selection.selected.clone(),
            last_refresh: self.selection.last_refresh,
            devices_refreshed: self.cache.last_refresh(),
            title: self.title.clone(),
            data: self.selection.last_value,
        }
    }

    /// Name of the selected device, if it is in the cache
    pub fn selected_device_name(&self) -> Option<String> {
        let ain = self.selection.selected.as_deref()?;
        self.cache.find(ain).map(|d| d.name.clone())
    }
}

/// One action instance: its kind, its state and the shared services
pub struct ActionContext {
    pub instance_id: String,
    pub kind: ActionKind,
    pub services: ActionServices,
    state: Mutex<InstanceState>,
    disposed: AtomicBool,
}

impl ActionContext {
    pub fn new(
        instance_id: impl Into<String>,
        kind: ActionKind,
        settings: InstanceSettings,
        services: ActionServices,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            kind,
            services,
            state: Mutex::new(InstanceState::from_settings(settings)),
            disposed: AtomicBool::new(false),
        }
    }

    /// Never hold the guard across a gateway call
    pub async fn lock_state(&self) -> MutexGuard<'_, InstanceState> {
        self.state.lock().await
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.services.clock.now()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }

    pub async fn persist_instance(&self, settings: InstanceSettings) {
        if let Err(e) = self
            .services
            .store
            .persist_instance(&self.instance_id, &settings)
            .await
        {
            warn!(instance = %self.instance_id, "Failed to save settings: {}", e);
        }
    }

    pub async fn persist_global(&self, notify_others: bool) {
        let settings = self.services.session.to_settings();
        if let Err(e) = self
            .services
            .store
            .persist_global(&settings, notify_others)
            .await
        {
            warn!(instance = %self.instance_id, "Failed to save global settings: {}", e);
        }
    }

    /// Forget `sid` after a failed query; the next tick logs in again
    pub async fn drop_session(&self, sid: &str) {
        if self.services.session.invalidate_if_current(sid) {
            self.persist_global(true).await;
        }
    }

    pub async fn render(&self, title: Option<String>, value: f64) {
        let frame = Frame {
            title,
            text: self.kind.format(value),
            switch_state: self.kind.switch_state(value),
        };
        self.services.display.render(&self.instance_id, &frame).await;
    }
}
