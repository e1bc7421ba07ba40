//! Session coordinator and reference engine configuration.

use serde::Deserialize;

/// Settings for the session coordinator.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SessionSettings {
    /// Ask the engine to attach diagnostics to update results (default: true)
    pub report_diagnostics: bool,
    /// Change detection heuristics.
    pub change_detection: ChangeDetectionSettings,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            report_diagnostics: true,
            change_detection: ChangeDetectionSettings::default(),
        }
    }
}

/// Tunables for the `has_changes` heuristic.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ChangeDetectionSettings {
    /// Equal snapshot versions mean no changes (default: true)
    pub trust_versions: bool,
    /// Consider source-generated documents in whole-session checks (default: false)
    pub include_generated: bool,
}

impl Default for ChangeDetectionSettings {
    fn default() -> Self {
        Self {
            trust_versions: true,
            include_generated: false,
        }
    }
}

/// Settings for the checksum reference engine.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EngineSettings {
    /// Text that marks a source unit as syntactically invalid; empty disables it (default: "#error")
    pub syntax_error_marker: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            syntax_error_marker: default_syntax_error_marker(),
        }
    }
}

fn default_syntax_error_marker() -> String {
    "#error".to_string()
}
