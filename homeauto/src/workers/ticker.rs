//! Ticker worker: the host timer of one action

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::actions::controller::ActionController;
use crate::poll::machine::TickOutcome;

/// Ticker worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Tick interval
    pub interval: Duration,

    /// Initial delay before the first tick
    pub initial_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            initial_delay: Duration::ZERO,
        }
    }
}

/// Run the ticker worker until shutdown or until the action is disposed.
///
/// Ticks are dispatched without waiting for the previous one; overlapping
/// ticks are turned away by the action's single-flight guard.
pub async fn run<S, F>(
    options: &Options,
    controller: Arc<ActionController>,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Ticker for '{}' starting...", controller.instance_id());

    sleep_fn(options.initial_delay).await;

    loop {
        if controller.is_disposed() {
            info!("Ticker for '{}' stopping, action disposed", controller.instance_id());
            return;
        }

        let action = controller.clone();
        tokio::spawn(async move {
            let outcome = action.on_tick().await;
            if outcome != TickOutcome::Idle {
                debug!("Tick of '{}': {:?}", action.instance_id(), outcome);
            }
        });

        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Ticker for '{}' shutting down...", controller.instance_id());
                return;
            }
            _ = sleep_fn(options.interval) => {}
        }
    }
}
