//! Configuración de la aplicación desde variables de entorno (`.env`
//! incluido). La parte de base de datos la resuelve `DbConfig`.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use contract_persistence::{init_dotenv, DbConfig};
use log::LevelFilter;

pub const DEFAULT_LOG_FILE: &str = "app_log.txt";
pub const DEFAULT_BACKUP_DIR: &str = "backups";
pub const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_DEADLINE_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db: DbConfig,
    pub log_file: PathBuf,
    pub log_level: LevelFilter,
    pub backup_dir: PathBuf,
    pub http_bind: String,
    pub deadline_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { db: DbConfig::default(),
               log_file: PathBuf::from(DEFAULT_LOG_FILE),
               log_level: LevelFilter::Info,
               backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
               http_bind: DEFAULT_HTTP_BIND.to_string(),
               deadline_interval_secs: DEFAULT_DEADLINE_INTERVAL_SECS }
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        init_dotenv();
        let defaults = Self::default();
        let log_level = var("CONTRACTS_LOG_LEVEL").and_then(|v| LevelFilter::from_str(&v).ok())
                                                  .unwrap_or(defaults.log_level);
        // mínimo 5 s
        let deadline_interval_secs = var("CONTRACTS_DEADLINE_INTERVAL_SECS").and_then(|v| v.parse::<u64>().ok())
                                                                            .filter(|v| *v >= 5)
                                                                            .unwrap_or(defaults.deadline_interval_secs);
        Self { db: DbConfig::from_env(),
               log_file: var("CONTRACTS_LOG_FILE").map(PathBuf::from).unwrap_or(defaults.log_file),
               log_level,
               backup_dir: var("CONTRACTS_BACKUP_DIR").map(PathBuf::from).unwrap_or(defaults.backup_dir),
               http_bind: var("CONTRACTS_HTTP_BIND").unwrap_or(defaults.http_bind),
               deadline_interval_secs }
    }

    /// Misma configuración apuntando a otro archivo de base de datos.
    pub fn with_database(mut self, path: impl Into<String>) -> Self {
        self.db.url = path.into();
        self
    }
}
