use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum AppEnv {
    #[default]
    Dev,
    Prod,
}

impl AppEnv {
    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(self) -> &'static str {
        match self {
            Self::Dev => "debug",
            Self::Prod => "info",
        }
    }
}

/// Process-wide settings, resolved once from flags and environment and then
/// handed to whatever needs them.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Path to the SQLite database [default: ~/.pingme/pingme.db]
    #[arg(long, env = "PINGME_DB", global = true)]
    pub db: Option<String>,

    /// Address the HTTP server listens on
    #[arg(long, env = "PINGME_BIND", default_value = "127.0.0.1:8000", global = true)]
    pub bind: SocketAddr,

    /// Name shown on the board and reported by /health
    #[arg(long, env = "APP_NAME", default_value = "PingMeBot", global = true)]
    pub app_name: String,

    /// Deployment environment; selects the default log level
    #[arg(long = "env", env = "APP_ENV", value_enum, default_value_t = AppEnv::Dev, global = true)]
    pub app_env: AppEnv,

    /// Telegram bot token for reminder delivery (not used yet)
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true, global = true)]
    pub telegram_bot_token: Option<String>,
}

impl Config {
    /// Settings for a database at `db`, everything else at defaults.
    pub fn with_db(db: impl Into<String>) -> Self {
        Self {
            db: Some(db.into()),
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            app_name: "PingMeBot".into(),
            app_env: AppEnv::Dev,
            telegram_bot_token: None,
        }
    }

    /// Resolve the database path, falling back to `$HOME/.pingme/pingme.db`.
    pub fn db_path(&self) -> Result<String> {
        if let Some(p) = &self.db {
            return Ok(p.clone());
        }
        let home = std::env::var("HOME").context("HOME environment variable not set")?;
        let path = PathBuf::from(home).join(".pingme").join("pingme.db");
        Ok(path
            .to_str()
            .context("default DB path is not valid UTF-8")?
            .to_string())
    }

    pub fn telegram_configured(&self) -> bool {
        self.telegram_bot_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }
}

/// Create the database's parent directory if it is missing.
pub fn ensure_db_dir(db_path: &str) -> Result<()> {
    if let Some(parent) = std::path::Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}
