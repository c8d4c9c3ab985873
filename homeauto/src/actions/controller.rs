//! Host entry points of one action instance

use tracing::{debug, info, warn};

use crate::actions::context::{ActionContext, ActionServices};
use crate::actions::kind::{switch_value, ActionKind};
use crate::authn::session::Credentials;
use crate::poll::machine::{PollingStateMachine, TickOutcome};
use crate::storage::settings::{GlobalSettings, InstanceSettings};

/// What a key press did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Disposed,

    /// This kind of action has no key behavior
    Ignored,

    /// Not logged in, or no device selected
    NotReady,

    /// The outlet switched; its new state
    Toggled(bool),

    Failed,
}

/// One configured action. Never shared between instances, even when two of
/// them target the same device.
pub struct ActionController {
    ctx: ActionContext,
    machine: PollingStateMachine,
}

impl ActionController {
    /// Construct from persisted settings
    pub fn new(
        instance_id: impl Into<String>,
        kind: ActionKind,
        settings: InstanceSettings,
        services: ActionServices,
    ) -> Self {
        let ctx = ActionContext::new(instance_id, kind, settings, services);
        debug!(instance = %ctx.instance_id, kind = ?kind, "Action created");
        Self {
            ctx,
            machine: PollingStateMachine::new(),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.ctx.instance_id
    }

    pub fn kind(&self) -> ActionKind {
        self.ctx.kind
    }

    pub fn machine(&self) -> &PollingStateMachine {
        &self.machine
    }

    /// Current persisted form of this instance
    pub async fn settings(&self) -> InstanceSettings {
        self.ctx.lock_state().await.to_settings()
    }

    pub async fn on_tick(&self) -> TickOutcome {
        self.machine.tick(&self.ctx).await
    }

    /// Toggle the selected outlet. Not throttled and not single-flight guarded.
    pub async fn on_key_pressed(&self) -> KeyOutcome {
        if self.ctx.is_disposed() {
            return KeyOutcome::Disposed;
        }
        if !self.ctx.kind.handles_key_press() {
            return KeyOutcome::Ignored;
        }
        let Some(sid) = self.ctx.services.session.sid() else {
            return KeyOutcome::NotReady;
        };
        let selected = self.ctx.lock_state().await.selection.selected.clone();
        let Some(ain) = selected else {
            return KeyOutcome::NotReady;
        };

        match self.ctx.services.gateway.set_switch_toggle(&sid, &ain).await {
            Ok(on) => {
                let value = switch_value(on);
                let now = self.ctx.now();
                let (settings, title) = {
                    let mut state = self.ctx.lock_state().await;
                    state.selection.record(value, now);
                    state.rendered = true;
                    (state.to_settings(), state.title.clone())
                };
                info!(instance = %self.ctx.instance_id, "Outlet {} switched {}", ain, self.ctx.kind.format(value));
                self.ctx.persist_instance(settings).await;
                self.ctx.render(title, value).await;
                KeyOutcome::Toggled(on)
            }
            Err(e) => {
                warn!(instance = %self.ctx.instance_id, "Toggle failed: {}", e);
                self.ctx.services.display.show_alert(&self.ctx.instance_id).await;
                self.ctx.drop_session(&sid).await;
                KeyOutcome::Failed
            }
        }
    }

    /// Apply settings edited by the user. Returns whether anything changed.
    pub async fn on_settings_changed(&self, settings: InstanceSettings) -> bool {
        if self.ctx.is_disposed() {
            return false;
        }
        let ain = settings.ain.filter(|a| !a.trim().is_empty());
        let persisted = {
            let mut state = self.ctx.lock_state().await;
            if state.selection.selected != ain {
                state.selection.select(ain);
                state.title = state.selected_device_name().or(settings.title);
                state.rendered = false;
            } else if settings.title.is_some() && state.title != settings.title {
                state.title = settings.title;
                state.selection.last_refresh = None;
            } else {
                return false;
            }
            state.to_settings()
        };
        debug!(instance = %self.ctx.instance_id, ain = ?persisted.ain, "Settings changed");
        self.ctx.persist_instance(persisted).await;
        true
    }

    /// Apply credentials edited by the user or broadcast by another action.
    ///
    /// A new base URL the client refuses leaves credentials and session as
    /// they were, so nothing is sent to the previous gateway on its behalf.
    pub async fn on_global_settings_changed(&self, settings: GlobalSettings) {
        if self.ctx.is_disposed() {
            return;
        }
        let session = &self.ctx.services.session;
        let credentials = Credentials::from_settings(&settings);

        if !session.credentials().same_gateway(&credentials) {
            if let Err(e) = self.ctx.services.gateway.set_base_url(&credentials.base_url) {
                warn!(instance = %self.ctx.instance_id, "Ignoring gateway address: {}", e);
                return;
            }
        }
        let change = session.update_credentials(credentials);

        let incoming = settings.sid.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let mut changed = change.changed;
        if incoming != session.sid().as_deref() {
            changed = true;
            let adopted = incoming.is_some_and(|sid| session.adopt(sid));
            if !adopted {
                session.invalidate();
            }
        } else if change.base_url_changed {
            // a token is only valid for the gateway that issued it
            session.invalidate();
        }

        if changed {
            self.ctx.persist_global(change.changed).await;
        }
    }

    /// Fetch the device list now, ignoring its cooldown
    pub async fn on_reload_devices(&self) -> TickOutcome {
        self.machine.reload_devices(&self.ctx).await
    }

    /// Later ticks and key presses are no-ops
    pub fn dispose(&self) {
        self.ctx.dispose();
        debug!(instance = %self.ctx.instance_id, "Action disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.ctx.is_disposed()
    }
}
