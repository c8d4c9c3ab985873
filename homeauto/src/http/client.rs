//! HTTP client implementation

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info};

use crate::errors::HomeAutoError;
use crate::models::devicelist::RawDevice;

/// Gateway operations the polling engine depends on.
///
/// Every call is a single request/response; retries belong to the caller.
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// Log in and return a session id
    async fn authenticate(&self, user_name: &str, password: &str) -> Result<String, HomeAutoError>;

    async fn list_devices(&self, sid: &str) -> Result<Vec<RawDevice>, HomeAutoError>;

    async fn get_device_infos(&self, sid: &str, ain: &str) -> Result<RawDevice, HomeAutoError>;

    async fn get_switch_state(&self, sid: &str, ain: &str) -> Result<bool, HomeAutoError>;

    async fn set_switch_on(&self, sid: &str, ain: &str) -> Result<bool, HomeAutoError>;

    async fn set_switch_off(&self, sid: &str, ain: &str) -> Result<bool, HomeAutoError>;

    /// Flip the outlet and return its new state
    async fn set_switch_toggle(&self, sid: &str, ain: &str) -> Result<bool, HomeAutoError>;

    /// Current power draw in mW
    async fn get_switch_power(&self, sid: &str, ain: &str) -> Result<u64, HomeAutoError>;

    /// Temperature in 0.1 °C
    async fn get_temperature(&self, sid: &str, ain: &str) -> Result<i64, HomeAutoError>;

    /// Relative humidity in percent
    async fn get_humidity(&self, sid: &str, ain: &str) -> Result<u32, HomeAutoError> {
        let device = self.get_device_infos(sid, ain).await?;
        device
            .humidity
            .as_ref()
            .and_then(|h| h.percent())
            .ok_or_else(|| HomeAutoError::QueryError(format!("device {} reports no humidity", ain)))
    }

    /// Point subsequent requests at another gateway
    fn set_base_url(&self, base_url: &str) -> Result<(), HomeAutoError>;
}

/// HTTP client for the gateway. Holds nothing but the base URL.
pub struct GatewayClient {
    client: Client,
    base_url: RwLock<String>,
}

impl GatewayClient {
    /// Create a new gateway client
    pub fn new(base_url: &str) -> Result<Self, HomeAutoError> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, HomeAutoError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: RwLock::new(normalize_base_url(base_url)?),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> String {
        self.base_url.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Replace the base URL
    pub fn update_base_url(&self, base_url: &str) -> Result<(), HomeAutoError> {
        let normalized = normalize_base_url(base_url)?;
        let mut current = self.base_url.write().unwrap_or_else(|e| e.into_inner());
        if *current != normalized {
            info!("Gateway base URL changed to {}", normalized);
            *current = normalized;
        }
        Ok(())
    }

    /// Make a GET request and return the body as text
    pub(crate) async fn get_text(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<String, HomeAutoError> {
        let url = format!("{}{}", self.base_url(), path);
        debug!("GET {}", url);

        let response = self.client.get(&url).query(query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP GET {} failed: {} - {}", path, status, body.trim());
            return Err(HomeAutoError::QueryError(format!("{}: {}", status, body.trim())));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl GatewayApi for GatewayClient {
    async fn authenticate(&self, user_name: &str, password: &str) -> Result<String, HomeAutoError> {
        self.login(user_name, password).await
    }

    async fn list_devices(&self, sid: &str) -> Result<Vec<RawDevice>, HomeAutoError> {
        self.device_list(sid).await
    }

    async fn get_device_infos(&self, sid: &str, ain: &str) -> Result<RawDevice, HomeAutoError> {
        self.device_infos(sid, ain).await
    }

    async fn get_switch_state(&self, sid: &str, ain: &str) -> Result<bool, HomeAutoError> {
        self.switch_state(sid, ain).await
    }

    async fn set_switch_on(&self, sid: &str, ain: &str) -> Result<bool, HomeAutoError> {
        self.switch_on(sid, ain).await
    }

    async fn set_switch_off(&self, sid: &str, ain: &str) -> Result<bool, HomeAutoError> {
        self.switch_off(sid, ain).await
    }

    async fn set_switch_toggle(&self, sid: &str, ain: &str) -> Result<bool, HomeAutoError> {
        self.switch_toggle(sid, ain).await
    }

    async fn get_switch_power(&self, sid: &str, ain: &str) -> Result<u64, HomeAutoError> {
        self.switch_power(sid, ain).await
    }

    async fn get_temperature(&self, sid: &str, ain: &str) -> Result<i64, HomeAutoError> {
        self.temperature(sid, ain).await
    }

    fn set_base_url(&self, base_url: &str) -> Result<(), HomeAutoError> {
        self.update_base_url(base_url)
    }
}

/// Validate a base URL and strip trailing slashes so paths can be appended
pub fn normalize_base_url(base_url: &str) -> Result<String, HomeAutoError> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(HomeAutoError::ConfigError("gateway base URL is empty".to_string()));
    }

    let parsed = url::Url::parse(trimmed)
        .map_err(|e| HomeAutoError::ConfigError(format!("invalid base URL '{}': {}", trimmed, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(HomeAutoError::ConfigError(format!(
            "unsupported scheme '{}' in base URL",
            parsed.scheme()
        )));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}
