//! Control plane configuration for the hot-reload kernel.
//!
//! This module defines HTTP server binding settings.

use serde::Deserialize;

/// Control plane binding settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    /// Whether the control plane is served at all.
    pub enabled: bool,
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}
