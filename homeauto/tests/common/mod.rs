//! Shared fakes for the integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Notify;

use homeauto::actions::context::ActionServices;
use homeauto::actions::host::{ActionDisplay, Clock, Frame, SettingsStore};
use homeauto::authn::session::{Credentials, SessionState};
use homeauto::errors::HomeAutoError;
use homeauto::http::client::{normalize_base_url, GatewayApi};
use homeauto::models::devicelist::{
    HumidityBlock, PowerMeterBlock, RawDevice, SwitchBlock, TemperatureBlock,
};
use homeauto::storage::settings::{GlobalSettings, InstanceSettings};

pub const SID: &str = "a1b2c3d4e5f60718";
pub const OTHER_SID: &str = "ffffeeeeddddcccc";
pub const OUTLET_AIN: &str = "08761 0000434";
pub const THERMO_AIN: &str = "09995 0123456";

type Reply<T> = Mutex<Result<T, String>>;

fn reply<T: Clone>(slot: &Reply<T>) -> Result<T, HomeAutoError> {
    slot.lock()
        .unwrap()
        .clone()
        .map_err(HomeAutoError::QueryError)
}

/// Scripted gateway counting every call
pub struct MockGateway {
    pub login_reply: Reply<String>,
    pub devices_reply: Reply<Vec<RawDevice>>,
    pub switch_reply: Reply<bool>,
    pub toggle_reply: Reply<bool>,
    pub power_reply: Reply<u64>,
    pub temperature_reply: Reply<i64>,
    pub device_infos_reply: Reply<RawDevice>,
    pub base_url: Mutex<String>,

    /// Yield once inside every request so concurrent callers interleave
    pub yield_in_requests: bool,

    /// Hold switch state replies until the next toggle went through
    pub hold_state_until_toggle: AtomicBool,
    toggled: Notify,

    pub login_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub value_calls: AtomicUsize,
    pub toggle_calls: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            login_reply: Mutex::new(Ok(SID.to_string())),
            devices_reply: Mutex::new(Ok(sample_devices())),
            switch_reply: Mutex::new(Ok(true)),
            toggle_reply: Mutex::new(Ok(false)),
            power_reply: Mutex::new(Ok(2500)),
            temperature_reply: Mutex::new(Ok(215)),
            device_infos_reply: Mutex::new(Ok(hygrometer("11630 0000001", "Bath", 1))),
            base_url: Mutex::new("http://fritz.box".to_string()),
            yield_in_requests: false,
            hold_state_until_toggle: AtomicBool::new(false),
            toggled: Notify::new(),
            login_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            value_calls: AtomicUsize::new(0),
            toggle_calls: AtomicUsize::new(0),
        }
    }

    pub fn yielding() -> Self {
        Self {
            yield_in_requests: true,
            ..Self::new()
        }
    }

    pub fn logins(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn values(&self) -> usize {
        self.value_calls.load(Ordering::SeqCst)
    }

    pub fn toggles(&self) -> usize {
        self.toggle_calls.load(Ordering::SeqCst)
    }

    pub fn set_power(&self, result: Result<u64, &str>) {
        *self.power_reply.lock().unwrap() = result.map_err(str::to_string);
    }

    pub fn set_devices(&self, result: Result<Vec<RawDevice>, &str>) {
        *self.devices_reply.lock().unwrap() = result.map_err(str::to_string);
    }

    pub fn set_toggle(&self, result: Result<bool, &str>) {
        *self.toggle_reply.lock().unwrap() = result.map_err(str::to_string);
    }

    pub fn set_login(&self, result: Result<&str, &str>) {
        *self.login_reply.lock().unwrap() = result.map(str::to_string).map_err(str::to_string);
    }

    async fn request(&self, counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
        if self.yield_in_requests {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl GatewayApi for MockGateway {
    async fn authenticate(&self, _user_name: &str, _password: &str) -> Result<String, HomeAutoError> {
        self.request(&self.login_calls).await;
        self.login_reply
            .lock()
            .unwrap()
            .clone()
            .map_err(HomeAutoError::AuthError)
    }

    async fn list_devices(&self, _sid: &str) -> Result<Vec<RawDevice>, HomeAutoError> {
        self.request(&self.list_calls).await;
        reply(&self.devices_reply)
    }

    async fn get_device_infos(&self, _sid: &str, _ain: &str) -> Result<RawDevice, HomeAutoError> {
        self.request(&self.value_calls).await;
        reply(&self.device_infos_reply)
    }

    async fn get_switch_state(&self, _sid: &str, _ain: &str) -> Result<bool, HomeAutoError> {
        self.request(&self.value_calls).await;
        if self.hold_state_until_toggle.load(Ordering::SeqCst) {
            self.toggled.notified().await;
        }
        reply(&self.switch_reply)
    }

    async fn set_switch_on(&self, _sid: &str, _ain: &str) -> Result<bool, HomeAutoError> {
        self.request(&self.toggle_calls).await;
        Ok(true)
    }

    async fn set_switch_off(&self, _sid: &str, _ain: &str) -> Result<bool, HomeAutoError> {
        self.request(&self.toggle_calls).await;
        Ok(false)
    }

    async fn set_switch_toggle(&self, _sid: &str, _ain: &str) -> Result<bool, HomeAutoError> {
        self.request(&self.toggle_calls).await;
        let result = reply(&self.toggle_reply);
        self.toggled.notify_one();
        result
    }

    async fn get_switch_power(&self, _sid: &str, _ain: &str) -> Result<u64, HomeAutoError> {
        self.request(&self.value_calls).await;
        reply(&self.power_reply)
    }

    async fn get_temperature(&self, _sid: &str, _ain: &str) -> Result<i64, HomeAutoError> {
        self.request(&self.value_calls).await;
        reply(&self.temperature_reply)
    }

    fn set_base_url(&self, base_url: &str) -> Result<(), HomeAutoError> {
        *self.base_url.lock().unwrap() = normalize_base_url(base_url)?;
        Ok(())
    }
}

/// Display sink recording what it was asked to show
#[derive(Default)]
pub struct RecordingDisplay {
    pub frames: Mutex<Vec<(String, Frame)>>,
    pub alerts: AtomicUsize,
    pub oks: AtomicUsize,
}

impl RecordingDisplay {
    pub fn texts(&self) -> Vec<String> {
        self.frames
            .lock()
            .unwrap()
            .iter()
            .map(|(_, f)| f.text.clone())
            .collect()
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.frames.lock().unwrap().last().map(|(_, f)| f.clone())
    }

    pub fn alerts(&self) -> usize {
        self.alerts.load(Ordering::SeqCst)
    }

    pub fn oks(&self) -> usize {
        self.oks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActionDisplay for RecordingDisplay {
    async fn render(&self, instance_id: &str, frame: &Frame) {
        self.frames
            .lock()
            .unwrap()
            .push((instance_id.to_string(), frame.clone()));
    }

    async fn show_alert(&self, _instance_id: &str) {
        self.alerts.fetch_add(1, Ordering::SeqCst);
    }

    async fn show_ok(&self, _instance_id: &str) {
        self.oks.fetch_add(1, Ordering::SeqCst);
    }
}

/// Settings store keeping everything in memory
#[derive(Default)]
pub struct MemoryStore {
    pub instances: Mutex<HashMap<String, InstanceSettings>>,
    pub globals: Mutex<Vec<(GlobalSettings, bool)>>,
}

impl MemoryStore {
    pub fn instance(&self, id: &str) -> Option<InstanceSettings> {
        self.instances.lock().unwrap().get(id).cloned()
    }

    pub fn last_global(&self) -> Option<(GlobalSettings, bool)> {
        self.globals.lock().unwrap().last().cloned()
    }

    pub fn global_writes(&self) -> usize {
        self.globals.lock().unwrap().len()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn persist_instance(
        &self,
        instance_id: &str,
        settings: &InstanceSettings,
    ) -> Result<(), HomeAutoError> {
        self.instances
            .lock()
            .unwrap()
            .insert(instance_id.to_string(), settings.clone());
        Ok(())
    }

    async fn persist_global(
        &self,
        settings: &GlobalSettings,
        notify_others: bool,
    ) -> Result<(), HomeAutoError> {
        self.globals
            .lock()
            .unwrap()
            .push((settings.clone(), notify_others));
        Ok(())
    }
}

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(DateTime::from_timestamp(1_767_225_600, 0).unwrap()),
        }
    }

    pub fn advance(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now += Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Every fake wired into one set of services
pub struct Harness {
    pub gateway: Arc<MockGateway>,
    pub session: Arc<SessionState>,
    pub display: Arc<RecordingDisplay>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new(gateway: MockGateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
            session: Arc::new(SessionState::new(credentials())),
            display: Arc::new(RecordingDisplay::default()),
            store: Arc::new(MemoryStore::default()),
            clock: Arc::new(ManualClock::new()),
        }
    }

    /// Harness whose session already holds [`SID`]
    pub fn logged_in(gateway: MockGateway) -> Self {
        let harness = Self::new(gateway);
        assert!(harness.session.adopt(SID));
        harness
    }

    pub fn services(&self) -> ActionServices {
        ActionServices {
            gateway: self.gateway.clone(),
            session: self.session.clone(),
            display: self.display.clone(),
            store: self.store.clone(),
            clock: self.clock.clone(),
        }
    }
}

pub fn credentials() -> Credentials {
    Credentials::new("http://fritz.box/", "admin", "secret")
}

pub fn outlet(ain: &str, name: &str, present: u8) -> RawDevice {
    RawDevice {
        identifier: ain.to_string(),
        name: name.to_string(),
        present,
        productname: Some("FRITZ!DECT 200".to_string()),
        switch: Some(SwitchBlock {
            state: Some("1".to_string()),
            ..Default::default()
        }),
        powermeter: Some(PowerMeterBlock {
            power: Some("2500".to_string()),
            ..Default::default()
        }),
        temperature: Some(TemperatureBlock::default()),
        ..Default::default()
    }
}

pub fn thermostat(ain: &str, name: &str, present: u8) -> RawDevice {
    RawDevice {
        identifier: ain.to_string(),
        name: name.to_string(),
        present,
        productname: Some("FRITZ!DECT 301".to_string()),
        temperature: Some(TemperatureBlock::default()),
        ..Default::default()
    }
}

pub fn hygrometer(ain: &str, name: &str, present: u8) -> RawDevice {
    RawDevice {
        identifier: ain.to_string(),
        name: name.to_string(),
        present,
        productname: Some("FRITZ!DECT 440".to_string()),
        temperature: Some(TemperatureBlock::default()),
        humidity: Some(HumidityBlock {
            rel_humidity: Some("47".to_string()),
        }),
        ..Default::default()
    }
}

pub fn sample_devices() -> Vec<RawDevice> {
    vec![
        outlet(OUTLET_AIN, "Kitchen", 1),
        outlet("08761 0000999", "Garage", 0),
        thermostat(THERMO_AIN, "Living room", 1),
    ]
}

/// Settings with a device already cached and selected
pub fn selected(ain: &str, name: &str) -> InstanceSettings {
    InstanceSettings {
        devices: Some(vec![homeauto::cache::devices::Device {
            ain: ain.to_string(),
            name: name.to_string(),
        }]),
        ain: Some(ain.to_string()),
        title: Some(name.to_string()),
        ..Default::default()
    }
}
