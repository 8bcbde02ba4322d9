//! Environment-driven configuration shared by all three binaries.

use std::{env, fmt, path::PathBuf};

use sqlx::postgres::PgConnectOptions;
use tracing::debug;

use crate::error::PipelineError;

const DB_VARS: [&str; 5] = ["DB_NAME", "DB_USER", "DB_PASSWORD", "DB_HOST", "DB_PORT"];

/// Load `.env` from the working directory if there is one. Variables already
/// set in the process environment win.
pub fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "loaded .env");
    }
}

/// PostgreSQL connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub name: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Every missing variable is reported
    /// in one error rather than producing a malformed connection target.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let values: Vec<Option<String>> = DB_VARS
            .iter()
            .map(|k| lookup(k).filter(|v| !v.is_empty()))
            .collect();

        let missing: Vec<String> = DB_VARS
            .iter()
            .zip(&values)
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| k.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::MissingEnv(missing));
        }

        let mut values = values.into_iter().flatten();
        let mut next = || values.next().unwrap_or_default();
        let (name, user, password, host, port_raw) = (next(), next(), next(), next(), next());

        let port = port_raw
            .trim()
            .parse::<u16>()
            .map_err(|e| PipelineError::InvalidPort {
                value: port_raw.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            name,
            user,
            password,
            host,
            port,
        })
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
    }
}

// Keep the password out of logs.
impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "postgresql://{}:***@{}:{}/{}",
            self.user, self.host, self.port, self.name
        )
    }
}

/// Input and output locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub csv_dir: PathBuf,
    pub export_dir: PathBuf,
    pub chart_dir: PathBuf,
    pub downtown_table: Option<PathBuf>,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            csv_dir: PathBuf::from("CSVs"),
            export_dir: PathBuf::from("exports"),
            chart_dir: PathBuf::from("."),
            downtown_table: None,
        }
    }
}

impl Paths {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let dir = |key: &str, default: PathBuf| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(default)
        };
        Self {
            csv_dir: dir("RENTALSTATS_CSV_DIR", defaults.csv_dir),
            export_dir: dir("RENTALSTATS_EXPORT_DIR", defaults.export_dir),
            chart_dir: dir("RENTALSTATS_CHART_DIR", defaults.chart_dir),
            downtown_table: lookup("DOWNTOWN_TABLE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }
}
