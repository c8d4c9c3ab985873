//! Main application run loop

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::io::BufReader;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::actions::context::ActionServices;
use crate::actions::controller::ActionController;
use crate::actions::host::SystemClock;
use crate::app::display::LogDisplay;
use crate::app::options::AppOptions;
use crate::authn::session::SessionState;
use crate::errors::HomeAutoError;
use crate::http::client::GatewayClient;
use crate::storage::file::FileSettingsStore;
use crate::storage::settings::{GlobalSettings, DEFAULT_BASE_URL};
use crate::workers::{keypad, ticker};

/// Run the reference host until `shutdown_signal` resolves
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), HomeAutoError> {
    info!("Initializing home automation host...");

    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.max_shutdown_delay);

    if let Err(e) = init(&options, &shutdown_tx, &mut shutdown_manager).await {
        error!("Failed to start host: {}", e);
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    shutdown_tx: &broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<(), HomeAutoError> {
    let store = Arc::new(FileSettingsStore::new(options.layout.clone()));
    let services = init_services(options, store.clone()).await?;

    let mut controllers: HashMap<String, Arc<ActionController>> = HashMap::new();
    for decl in &options.actions {
        if controllers.contains_key(&decl.id) {
            warn!("Action '{}' is declared twice, keeping the first", decl.id);
            continue;
        }
        let settings = match store.load_instance(&decl.id).await {
            Ok(Some(saved)) => saved,
            Ok(None) => decl.settings.clone(),
            Err(e) => {
                warn!("Ignoring saved settings of '{}': {}", decl.id, e);
                decl.settings.clone()
            }
        };
        let controller = Arc::new(ActionController::new(
            decl.id.clone(),
            decl.kind,
            settings,
            services.clone(),
        ));
        controllers.insert(decl.id.clone(), controller);
    }
    info!("{} action(s) configured", controllers.len());

    for controller in controllers.values() {
        init_ticker_worker(
            options.ticker.clone(),
            controller.clone(),
            shutdown_manager,
            shutdown_tx.subscribe(),
        );
    }

    if options.enable_keypad {
        init_keypad_worker(controllers.clone(), shutdown_manager, shutdown_tx.subscribe())?;
    }

    shutdown_manager.with_controllers(controllers.into_values().collect());
    Ok(())
}

/// The composition root: one client and one session for the gateway
async fn init_services(
    options: &AppOptions,
    store: Arc<FileSettingsStore>,
) -> Result<ActionServices, HomeAutoError> {
    let saved = match store.load_global().await {
        Ok(saved) => saved,
        Err(e) => {
            warn!("Ignoring saved global settings: {}", e);
            None
        }
    };
    let global = merge_global(&options.global, saved);

    let gateway = Arc::new(init_gateway(&global)?);
    info!("Gateway at {}", gateway.base_url());

    let session = Arc::new(SessionState::from_settings(&global));
    if !session.credentials().is_complete() {
        warn!("Gateway credentials are incomplete, actions stay idle until they are set");
    }

    Ok(ActionServices {
        gateway,
        session,
        display: Arc::new(LogDisplay::new()),
        store,
        clock: Arc::new(SystemClock),
    })
}

/// Client for the configured gateway. An unusable address falls back to the
/// default one; the session refuses to log in until it is fixed.
fn init_gateway(global: &GlobalSettings) -> Result<GatewayClient, HomeAutoError> {
    let base_url = global.base_url.as_deref().unwrap_or_default();
    match GatewayClient::new(base_url) {
        Ok(client) => Ok(client),
        Err(e @ HomeAutoError::ConfigError(_)) => {
            warn!("{}, actions stay idle until the gateway address is fixed", e);
            GatewayClient::new(DEFAULT_BASE_URL)
        }
        Err(e) => Err(e),
    }
}

/// Configured credentials win; the session id is taken from the saved settings
fn merge_global(configured: &GlobalSettings, saved: Option<GlobalSettings>) -> GlobalSettings {
    let Some(saved) = saved else {
        return configured.clone();
    };
    let same_login = configured.base_url == saved.base_url && configured.user_name == saved.user_name;
    GlobalSettings {
        base_url: configured.base_url.clone().or(saved.base_url),
        user_name: configured.user_name.clone().or(saved.user_name),
        password: configured.password.clone().or(saved.password),
        sid: if same_login { saved.sid } else { None },
    }
}

fn init_ticker_worker(
    options: ticker::Options,
    controller: Arc<ActionController>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let handle = tokio::spawn(async move {
        ticker::run(
            &options,
            controller,
            |wait| tokio::time::sleep(wait),
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });
    shutdown_manager.with_ticker_worker_handle(handle);
}

fn init_keypad_worker(
    controllers: HashMap<String, Arc<ActionController>>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), HomeAutoError> {
    info!("Initializing keypad worker...");

    let handle = tokio::spawn(async move {
        keypad::run(
            BufReader::new(tokio::io::stdin()),
            &controllers,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });
    shutdown_manager.with_keypad_worker_handle(handle)
}

// ================================= SHUTDOWN ====================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    max_shutdown_delay: Duration,
    controllers: Vec<Arc<ActionController>>,
    ticker_worker_handles: Vec<JoinHandle<()>>,
    keypad_worker_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    fn new(shutdown_tx: broadcast::Sender<()>, max_shutdown_delay: Duration) -> Self {
        Self {
            shutdown_tx,
            max_shutdown_delay,
            controllers: Vec::new(),
            ticker_worker_handles: Vec::new(),
            keypad_worker_handle: None,
        }
    }

    fn with_controllers(&mut self, controllers: Vec<Arc<ActionController>>) {
        self.controllers = controllers;
    }

    fn with_ticker_worker_handle(&mut self, handle: JoinHandle<()>) {
        self.ticker_worker_handles.push(handle);
    }

    fn with_keypad_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), HomeAutoError> {
        if self.keypad_worker_handle.is_some() {
            return Err(HomeAutoError::ShutdownError("keypad_handle already set".to_string()));
        }
        self.keypad_worker_handle = Some(handle);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), HomeAutoError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(self.max_shutdown_delay, self.shutdown_impl()).await {
            Ok(result) => result,
            Err(_) => {
                error!("Shutdown timed out after {:?}", self.max_shutdown_delay);
                Err(HomeAutoError::ShutdownError("shutdown timed out".to_string()))
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), HomeAutoError> {
        info!("Shutting down home automation host...");

        // 1. Actions: in-flight requests are abandoned, later ticks are no-ops
        for controller in &self.controllers {
            controller.dispose();
        }

        // 2. Tickers
        for result in join_all(self.ticker_worker_handles.drain(..)).await {
            result.map_err(|e| HomeAutoError::ShutdownError(e.to_string()))?;
        }

        // 3. Keypad; a blocked stdin read cannot be interrupted
        if let Some(handle) = self.keypad_worker_handle.take() {
            handle.abort();
        }

        info!("Shutdown complete");
        Ok(())
    }
}
