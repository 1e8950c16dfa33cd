//! Server settings.
//!
//! Settings are loaded from environment variables, after reading a `.env`
//! file if one exists.

use std::path::PathBuf;

/// Environment variable naming the repository configuration file.
pub const CONFIG_ENV: &str = "UD_CONFIG";

/// Process-level settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Path of the repository configuration (TOML).
    pub config_path: Option<PathBuf>,

    /// Log filter directive.
    pub log_filter: String,
}

impl ServerSettings {
    /// Loads settings from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self::from_vars(
            std::env::var(CONFIG_ENV).ok(),
            std::env::var("RUST_LOG").ok(),
        )
    }

    fn from_vars(config_path: Option<String>, log_filter: Option<String>) -> Self {
        Self {
            config_path: config_path
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            log_filter: log_filter
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Replaces the configuration path when one is given on the command line.
    #[must_use]
    pub fn with_config_override(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.config_path = path;
        }
        self
    }

    /// Returns the configuration path.
    ///
    /// ## Errors
    ///
    /// Fails when neither `--config` nor `UD_CONFIG` was provided.
    pub fn require_config_path(&self) -> anyhow::Result<&PathBuf> {
        self.config_path.as_ref().ok_or_else(|| {
            anyhow::anyhow!("no configuration file: pass --config or set {CONFIG_ENV}")
        })
    }
}
