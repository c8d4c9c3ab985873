//! Display sink writing frames to the log

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::actions::host::{ActionDisplay, Frame};

/// Logs every frame, and each change of an action's text once
#[derive(Debug, Default)]
pub struct LogDisplay {
    last_text: Mutex<HashMap<String, String>>,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last text shown by `instance_id`
    pub fn last_text(&self, instance_id: &str) -> Option<String> {
        let texts = self.last_text.lock().unwrap_or_else(|e| e.into_inner());
        texts.get(instance_id).cloned()
    }
}

#[async_trait]
impl ActionDisplay for LogDisplay {
    async fn render(&self, instance_id: &str, frame: &Frame) {
        let previous = {
            let mut texts = self.last_text.lock().unwrap_or_else(|e| e.into_inner());
            texts.insert(instance_id.to_string(), frame.text.clone())
        };
        if previous.as_deref() == Some(frame.text.as_str()) {
            return;
        }
        info!(
            instance = instance_id,
            title = frame.title.as_deref().unwrap_or_default(),
            on = ?frame.switch_state,
            "{}",
            frame.text
        );
    }

    async fn show_alert(&self, instance_id: &str) {
        warn!(instance = instance_id, "[alert]");
    }

    async fn show_ok(&self, instance_id: &str) {
        info!(instance = instance_id, "[ok]");
    }
}
