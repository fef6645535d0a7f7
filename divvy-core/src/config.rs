//! Configuration management
//!
//! Reads the desktop app's settings.json format:
//! ```json
//! {
//!   "app": { "demoMode": false, "apiUrl": "https://..." }
//! }
//! ```
//! The bearer credential is NOT configuration - it comes from the
//! external auth collaborator at context construction time.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Default production API URL
const DIVVY_PRODUCTION_URL: &str = "https://api.divvy.money";

/// Environment variable overriding the API base URL (staging/sandbox)
pub const DIVVY_API_URL_ENV: &str = "DIVVY_API_URL";

/// Environment variable overriding demo mode (for CI/testing)
pub const DIVVY_DEMO_MODE_ENV: &str = "DIVVY_DEMO_MODE";

/// Raw settings.json structure (matching the desktop app format)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default)]
    demo_mode: bool,
    #[serde(default)]
    api_url: Option<String>,
    // Settings the core doesn't manage are preserved, not dropped
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Divvy configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub demo_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DIVVY_PRODUCTION_URL.to_string(),
            demo_mode: false,
        }
    }
}

impl Config {
    /// Load config from the app's settings directory
    ///
    /// Precedence for each field: environment variable, then
    /// settings.json, then the built-in default. A missing or malformed
    /// settings file falls back to defaults rather than failing startup.
    pub fn load(settings_dir: &Path) -> Result<Self> {
        let settings_path = settings_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        let demo_mode = match std::env::var(DIVVY_DEMO_MODE_ENV).ok().as_deref() {
            Some("true" | "1" | "yes" | "TRUE" | "YES") => true,
            Some("false" | "0" | "no" | "FALSE" | "NO") => false,
            _ => raw.app.demo_mode,
        };

        let api_url = std::env::var(DIVVY_API_URL_ENV)
            .ok()
            .or(raw.app.api_url)
            .unwrap_or_else(|| DIVVY_PRODUCTION_URL.to_string());

        Ok(Self { api_url, demo_mode })
    }
}
