//! Error types for the polling engine

use thiserror::Error;

/// Main error type for the polling engine
#[derive(Error, Debug)]
pub enum HomeAutoError {
    /// Bad credentials, or the gateway rejected the challenge response
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Malformed, empty or non-numeric reply to a gateway query
    #[error("Query error: {0}")]
    QueryError(String),

    /// Missing base URL or credentials
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::DeError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),
}

impl HomeAutoError {
    /// Whether the gateway refused the credentials
    pub fn is_auth(&self) -> bool {
        matches!(self, HomeAutoError::AuthError(_))
    }

    /// Whether this failure happened while talking to the gateway
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            HomeAutoError::QueryError(_) | HomeAutoError::HttpError(_) | HomeAutoError::XmlError(_)
        )
    }
}
