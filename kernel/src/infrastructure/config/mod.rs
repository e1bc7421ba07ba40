//! Configuration management for the hot-reload kernel.
//!
//! Settings are built from defaults and `HOTRELOAD__*` environment variables
//! (double underscore separates nesting levels, e.g.
//! `HOTRELOAD__WATCH__POLL_INTERVAL_MS=250`).
//!
//! # Example
//!
//! ```
//! use hotreload_kernel::infrastructure::config::Settings;
//!
//! let settings = Settings::new().expect("Failed to load configuration");
//! assert!(settings.session.report_diagnostics);
//! ```

pub mod server;
pub mod session;
pub mod telemetry;
pub mod watch;

pub use server::ServerSettings;
pub use session::{ChangeDetectionSettings, EngineSettings, SessionSettings};
pub use telemetry::TelemetrySettings;
pub use watch::WatchSettings;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Top-level configuration for the hot-reload kernel.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Control plane settings.
    pub server: ServerSettings,
    /// Telemetry settings.
    pub telemetry: TelemetrySettings,
    /// Session coordinator settings.
    #[serde(default)]
    pub session: SessionSettings,
    /// Reference diff engine settings.
    #[serde(default)]
    pub engine: EngineSettings,
    /// Source tree polling settings.
    #[serde(default)]
    pub watch: WatchSettings,
}

impl Settings {
    /// Creates a new settings instance from environment variables and defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be built or deserialized.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::with_prefix("HOTRELOAD").separator("__"))
    }

    /// Builds settings from defaults overlaid with `environment`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be built or deserialized.
    pub fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        let s = Config::builder()
            // Start with default values
            .set_default("server.enabled", true)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 9190)?
            .set_default("telemetry.service_name", "hotreload-kernel")?
            .set_default("telemetry.log_level", "info")?
            .set_default("telemetry.sampling_ratio", 1.0)?
            .add_source(environment)
            .build()?;

        s.try_deserialize()
    }
}

/// Helper for strong typing addresses
pub struct BindAddress(pub String, pub u16);

impl BindAddress {
    /// Converts the bind address to a `SocketAddr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the IP address string cannot be parsed.
    pub fn to_socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        let ip = self
            .0
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid IP address '{}': {e}", self.0))?;
        Ok(std::net::SocketAddr::new(ip, self.1))
    }
}

impl From<&ServerSettings> for BindAddress {
    fn from(settings: &ServerSettings) -> Self {
        Self(settings.host.clone(), settings.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Environment::with_prefix("HOTRELOAD")
            .separator("__")
            .source(Some(source))
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_environment(env(&[])).unwrap();

        assert!(settings.server.enabled);
        assert_eq!(settings.server.port, 9190);
        assert_eq!(settings.telemetry.service_name, "hotreload-kernel");
        assert!(settings.session.report_diagnostics);
        assert!(settings.session.change_detection.trust_versions);
        assert!(!settings.session.change_detection.include_generated);
        assert_eq!(settings.watch.poll_interval_ms, 500);
        assert_eq!(settings.watch.extensions, vec!["rs".to_string()]);
        assert_eq!(settings.engine.syntax_error_marker, "#error");
    }

    #[test]
    fn test_environment_overrides() {
        let settings = Settings::from_environment(env(&[
            ("HOTRELOAD__SERVER__PORT", "7000"),
            ("HOTRELOAD__WATCH__POLL_INTERVAL_MS", "250"),
            ("HOTRELOAD__SESSION__CHANGE_DETECTION__TRUST_VERSIONS", "false"),
        ]))
        .unwrap();

        assert_eq!(settings.server.port, 7000);
        assert_eq!(settings.watch.poll_interval_ms, 250);
        assert!(!settings.session.change_detection.trust_versions);
    }

    #[test]
    fn test_bind_address() {
        let addr = BindAddress("127.0.0.1".into(), 9190).to_socket_addr().unwrap();
        assert_eq!(addr.port(), 9190);
        assert!(BindAddress("not-an-ip".into(), 1).to_socket_addr().is_err());
    }
}
