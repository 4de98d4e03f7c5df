//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::docs::DocKind;

/// Root configuration for the soft-redirect service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Soft redirect behaviour.
    pub soft_redirects: SoftRedirectConfig,

    /// Document store settings.
    pub store: StoreConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Document types and their dispatch rules.
    pub types: Vec<DocTypeConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Options of the soft redirect feature.
///
/// Passed by value into both the recorder and the resolver; there is no
/// process-wide copy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SoftRedirectConfig {
    /// When false, nothing is recorded and not-found requests pass through.
    pub enable: bool,

    /// HTTP status used for emitted redirects (e.g. 301 for permanent).
    pub status_code: u16,
}

impl Default for SoftRedirectConfig {
    fn default() -> Self {
        Self {
            enable: true,
            status_code: 302,
        }
    }
}

/// Document store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file the in-memory store is loaded from and saved to.
    pub path: Option<String>,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human readable or JSON lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A document type known to the page dispatcher.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocTypeConfig {
    /// Type key stored on documents (e.g. "custom-page").
    pub name: String,

    /// Whether documents of this type are pages or pieces.
    #[serde(default)]
    pub kind: DocKind,

    /// Dispatch patterns accepted beyond the document's own address.
    #[serde(default)]
    pub dispatch: Vec<String>,
}
