//! One poll sequence per tick: login, then device list, then value

use std::sync::Mutex;

use secrecy::ExposeSecret;
use tracing::{debug, error, info, warn};

use crate::actions::context::ActionContext;
use crate::errors::HomeAutoError;
use crate::poll::fsm::{PollEvent, PollFsm, PollPhase};
use crate::poll::guard::SingleFlight;

/// What a tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The action is gone
    Disposed,

    /// Another sequence of this action is still running
    Busy,

    /// Credentials are incomplete and no session id is known
    Unconfigured,

    LoggedIn,
    LoginFailed,

    /// Device list fetched; number of matching devices
    DevicesLoaded(usize),
    DeviceListFailed,

    /// The cached list is empty but was fetched recently
    DeviceListCoolingDown,

    ValueUpdated(f64),
    ValueFailed,

    /// The persisted reading was shown without a request
    Restored(f64),

    /// Nothing to do
    Idle,
}

/// Drives the poll sequence of one action.
///
/// At most one request per action is in flight; a tick arriving while one is
/// running returns [`TickOutcome::Busy`] without touching the gateway.
#[derive(Debug, Default)]
pub struct PollingStateMachine {
    flight: SingleFlight,
    fsm: Mutex<PollFsm>,
}

impl PollingStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> PollPhase {
        self.fsm.lock().unwrap_or_else(|e| e.into_inner()).phase()
    }

    pub fn failure_streak(&self) -> u32 {
        self.fsm.lock().unwrap_or_else(|e| e.into_inner()).failure_streak()
    }

    pub fn last_error(&self) -> Option<String> {
        let fsm = self.fsm.lock().unwrap_or_else(|e| e.into_inner());
        fsm.error().map(str::to_string)
    }

    pub fn is_busy(&self) -> bool {
        self.flight.is_held()
    }

    /// Advance the sequence by at most one request
    pub async fn tick(&self, ctx: &ActionContext) -> TickOutcome {
        if ctx.is_disposed() {
            return TickOutcome::Disposed;
        }
        let Some(_flight) = self.flight.try_acquire() else {
            debug!(instance = %ctx.instance_id, "Poll already in flight, skipping tick");
            return TickOutcome::Busy;
        };

        let session = &ctx.services.session;
        if session.needs_login() {
            return self.login(ctx).await;
        }
        let Some(sid) = session.sid() else {
            return TickOutcome::Unconfigured;
        };

        let now = ctx.now();
        let (list_empty, list_stale, value_due, selected, revision) = {
            let state = ctx.lock_state().await;
            (
                state.cache.is_empty(),
                state.cache.is_list_stale(now),
                state
                    .selection
                    .is_value_due(now, ctx.kind.value_cooldown()),
                state.selection.selected.clone(),
                state.selection.revision(),
            )
        };

        if list_empty {
            if !list_stale {
                return TickOutcome::DeviceListCoolingDown;
            }
            return self.load_devices(ctx, &sid).await;
        }

        if let Some(ain) = selected {
            if value_due {
                return self.fetch_value(ctx, &sid, &ain, revision).await;
            }
        }

        self.restore(ctx).await
    }

    /// Fetch the device list now, ignoring its cooldown
    pub async fn reload_devices(&self, ctx: &ActionContext) -> TickOutcome {
        if ctx.is_disposed() {
            return TickOutcome::Disposed;
        }
        let Some(_flight) = self.flight.try_acquire() else {
            return TickOutcome::Busy;
        };
        let Some(sid) = ctx.services.session.sid() else {
            return TickOutcome::Unconfigured;
        };
        self.load_devices(ctx, &sid).await
    }

    async fn login(&self, ctx: &ActionContext) -> TickOutcome {
        self.transition(PollEvent::Login);
        let session = &ctx.services.session;
        let credentials = session.credentials();
        session.record_auth_attempt(ctx.now());

        let result = ctx
            .services
            .gateway
            .authenticate(&credentials.user_name, credentials.password.expose_secret())
            .await;

        match result {
            Ok(sid) if session.adopt(&sid) => {
                self.transition(PollEvent::Succeeded);
                info!(instance = %ctx.instance_id, "Logged in to {}", credentials.base_url);
                ctx.services.display.show_ok(&ctx.instance_id).await;
                ctx.persist_global(true).await;
                TickOutcome::LoggedIn
            }
            Ok(_) => {
                self.fail("gateway returned an unusable session id".to_string());
                TickOutcome::LoginFailed
            }
            Err(e) => {
                // Login failures stay silent; the next tick tries again
                warn!(instance = %ctx.instance_id, "Login failed: {}", e);
                self.fail(e.to_string());
                TickOutcome::LoginFailed
            }
        }
    }

    async fn load_devices(&self, ctx: &ActionContext, sid: &str) -> TickOutcome {
        self.transition(PollEvent::ListDevices);
        match ctx.services.gateway.list_devices(sid).await {
            Ok(raw) => {
                self.transition(PollEvent::Succeeded);
                let now = ctx.now();
                let settings = {
                    let mut state = ctx.lock_state().await;
                    let count = state.cache.replace(&raw, ctx.kind.capability(), now).len();
                    debug!(instance = %ctx.instance_id, "{} of {} devices match", count, raw.len());
                    state.to_settings()
                };
                let count = settings.devices.as_ref().map_or(0, Vec::len);
                ctx.persist_instance(settings).await;
                TickOutcome::DevicesLoaded(count)
            }
            Err(e) => {
                self.query_failed(ctx, sid, &e).await;
                TickOutcome::DeviceListFailed
            }
        }
    }

    /// Fetch and record a reading of `ain`. The result is dropped when the
    /// selection moved past `revision` while the request was in flight.
    async fn fetch_value(
        &self,
        ctx: &ActionContext,
        sid: &str,
        ain: &str,
        revision: u64,
    ) -> TickOutcome {
        self.transition(PollEvent::FetchValue);
        let result = ctx
            .kind
            .fetch_reading(ctx.services.gateway.as_ref(), sid, ain)
            .await;

        match result {
            Ok(value) => {
                self.transition(PollEvent::Succeeded);
                let now = ctx.now();
                let (settings, title) = {
                    let mut state = ctx.lock_state().await;
                    if state.selection.revision() != revision {
                        debug!(instance = %ctx.instance_id, "Dropping reading of {} superseded in flight", ain);
                        return TickOutcome::Idle;
                    }
                    state.selection.record(value, now);
                    state.rendered = true;
                    (state.to_settings(), state.title.clone())
                };
                ctx.persist_instance(settings).await;
                ctx.render(title, value).await;
                TickOutcome::ValueUpdated(value)
            }
            Err(e) => {
                self.query_failed(ctx, sid, &e).await;
                TickOutcome::ValueFailed
            }
        }
    }

    /// Show the persisted reading once after construction
    async fn restore(&self, ctx: &ActionContext) -> TickOutcome {
        let (value, title) = {
            let mut state = ctx.lock_state().await;
            if state.rendered || state.selection.selected.is_none() {
                return TickOutcome::Idle;
            }
            let Some(value) = state.selection.last_value else {
                return TickOutcome::Idle;
            };
            state.rendered = true;
            (value, state.title.clone())
        };
        ctx.render(title, value).await;
        TickOutcome::Restored(value)
    }

    async fn query_failed(&self, ctx: &ActionContext, sid: &str, e: &HomeAutoError) {
        warn!(instance = %ctx.instance_id, "Gateway query failed: {}", e);
        self.fail(e.to_string());
        ctx.drop_session(sid).await;
    }

    fn fail(&self, error: String) {
        self.transition(PollEvent::Failed(error));
    }

    fn transition(&self, event: PollEvent) {
        let mut fsm = self.fsm.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = fsm.process(event) {
            error!("{}", e);
        }
    }
}
