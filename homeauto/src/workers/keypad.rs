//! Keypad worker: simulated key presses and inspector messages read line by line

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info, warn};

use crate::actions::controller::ActionController;
use crate::errors::HomeAutoError;

/// One input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeypadCommand {
    /// `press <id>`
    Press(String),

    /// `reload <id>`
    Reload(String),

    /// `select <id> <ain>`; the AIN may contain spaces
    Select { id: String, ain: String },
}

impl KeypadCommand {
    pub fn instance_id(&self) -> &str {
        match self {
            KeypadCommand::Press(id) | KeypadCommand::Reload(id) => id,
            KeypadCommand::Select { id, .. } => id,
        }
    }
}

impl FromStr for KeypadCommand {
    type Err = HomeAutoError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let (id, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let tail = tail.trim();

        if id.is_empty() {
            return Err(HomeAutoError::ConfigError(format!("missing action id in '{}'", line)));
        }
        match verb {
            "press" if tail.is_empty() => Ok(KeypadCommand::Press(id.to_string())),
            "reload" if tail.is_empty() => Ok(KeypadCommand::Reload(id.to_string())),
            "select" if !tail.is_empty() => Ok(KeypadCommand::Select {
                id: id.to_string(),
                ain: tail.to_string(),
            }),
            _ => Err(HomeAutoError::ConfigError(format!("unknown command '{}'", line))),
        }
    }
}

/// Read commands until end of input or shutdown
pub async fn run<R>(
    reader: R,
    controllers: &HashMap<String, Arc<ActionController>>,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    R: AsyncBufRead + Unpin,
{
    info!("Keypad worker starting...");
    let mut lines = reader.lines();

    loop {
        let line = tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Keypad worker shutting down...");
                return;
            }
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("Keypad input closed");
                return;
            }
            Err(e) => {
                error!("Failed to read keypad input: {}", e);
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<KeypadCommand>() {
            Ok(command) => dispatch(controllers, command).await,
            Err(e) => warn!("{}", e),
        }
    }
}

async fn dispatch(controllers: &HashMap<String, Arc<ActionController>>, command: KeypadCommand) {
    let Some(controller) = controllers.get(command.instance_id()) else {
        warn!("No action '{}'", command.instance_id());
        return;
    };

    match command {
        KeypadCommand::Press(_) => {
            let outcome = controller.on_key_pressed().await;
            info!("Key press on '{}': {:?}", controller.instance_id(), outcome);
        }
        KeypadCommand::Reload(_) => {
            let outcome = controller.on_reload_devices().await;
            info!("Reload of '{}': {:?}", controller.instance_id(), outcome);
        }
        KeypadCommand::Select { ain, .. } => {
            let mut settings = controller.settings().await;
            settings.ain = Some(ain);
            if !controller.on_settings_changed(settings).await {
                info!("'{}' already shows that device", controller.instance_id());
            }
        }
    }
}
