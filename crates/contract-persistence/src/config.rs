//! Carga de configuración de conexión desde variables de entorno.
//! Usa convención `DATABASE_URL` (ruta del archivo SQLite) y parámetros
//! opcionales de pool.

use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;

/// Archivo usado cuando `DATABASE_URL` no está definido.
pub const DEFAULT_DATABASE_URL: &str = "contracts.db";

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub busy_timeout_ms: u32,
    /// Las bases de la aplicación de escritorio se usaron sin `foreign_keys`;
    /// activarlo hace fallar borrados de usuarios con historial.
    pub enforce_foreign_keys: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self { url: DEFAULT_DATABASE_URL.to_string(),
               max_connections: 4,
               busy_timeout_ms: 5_000,
               enforce_foreign_keys: false }
    }
}

impl DbConfig {
    /// Configuración para un archivo concreto, con el resto por defecto.
    pub fn for_path(path: impl Into<String>) -> Self {
        Self { url: path.into(), ..Self::default() }
    }

    pub fn from_env() -> Self {
        // asegura que .env se haya cargado
        Lazy::force(&DOTENV_LOADED);
        let defaults = Self::default();
        let url = env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty()).unwrap_or(defaults.url);
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS").ok()
                                                                   .and_then(|v| v.parse().ok())
                                                                   .unwrap_or(defaults.max_connections);
        let busy_timeout_ms = env::var("DATABASE_BUSY_TIMEOUT_MS").ok()
                                                                   .and_then(|v| v.parse().ok())
                                                                   .unwrap_or(defaults.busy_timeout_ms);
        let enforce_foreign_keys = env::var("DATABASE_FOREIGN_KEYS").map(|v| matches!(v.trim(), "1" | "true" | "on"))
                                                                    .unwrap_or(defaults.enforce_foreign_keys);
        Self { url, max_connections, busy_timeout_ms, enforce_foreign_keys }
    }

    /// Ruta del archivo, sin el prefijo `sqlite://` o `file:` si lo trae.
    pub fn file_path(&self) -> &str {
        self.url.trim_start_matches("sqlite://").trim_start_matches("file:")
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_path_strips_scheme() {
        assert_eq!(DbConfig::for_path("sqlite://data/contracts.db").file_path(), "data/contracts.db");
        assert_eq!(DbConfig::for_path("contracts.db").file_path(), "contracts.db");
        assert!(!DbConfig::default().enforce_foreign_keys);
    }
}
