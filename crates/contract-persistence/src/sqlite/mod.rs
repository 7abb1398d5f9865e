//! Conexiones SQLite (Diesel + r2d2) y utilidades compartidas por los
//! repositorios.
//!
//! - `build_pool` crea el pool, aplica pragmas a cada conexión y corre las
//!   migraciones una sola vez.
//! - `ConnectionProvider` desacopla repositorios y store del pool concreto.
//! - `with_retry` reintenta con backoff corto cuando otro proceso mantiene la
//!   base bloqueada.

mod store;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel::sqlite::SqliteConnection;
use log::{debug, warn};

use crate::config::DbConfig;
use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;

pub use store::SqliteApprovalStore;

/// Alias de tipo para el pool r2d2 de conexiones SQLite.
pub type SqlitePool = r2d2::Pool<ConnectionManager<SqliteConnection>>;
/// Conexión prestada por el pool.
pub type SqliteConn = r2d2::PooledConnection<ConnectionManager<SqliteConnection>>;

/// Proveedor abstracto de conexiones.
///
/// Contrato: devuelve una conexión válida o `PersistenceError::TransientIo`.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<SqliteConn, PersistenceError>;
}

/// Implementación concreta de `ConnectionProvider` respaldada por un `SqlitePool`.
#[derive(Clone)]
pub struct PoolProvider {
    pub pool: SqlitePool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<SqliteConn, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

/// Pragmas aplicados a cada conexión nueva del pool.
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas {
    busy_timeout_ms: u32,
    foreign_keys: bool,
}

impl CustomizeConnection<SqliteConnection, r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        let sql = format!("PRAGMA busy_timeout = {}; PRAGMA foreign_keys = {};",
                          self.busy_timeout_ms,
                          if self.foreign_keys { "ON" } else { "OFF" });
        conn.batch_execute(&sql).map_err(r2d2::Error::QueryError)
    }
}

pub(crate) fn is_retryable(e: &PersistenceError) -> bool {
    e.is_retryable()
}

/// Reintenta `f` hasta tres veces con backoff lineal (15ms, 30ms, 45ms)
/// mientras el error sea de base ocupada.
pub(crate) fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("retryable error (attempt {}): {:?} -> sleeping {}ms",
                      attempts + 1,
                      e,
                      delay_ms);
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

/// Construye el pool y corre las migraciones pendientes.
pub fn build_pool(config: &DbConfig) -> Result<SqlitePool, PersistenceError> {
    let max_size = config.max_connections.max(1);
    debug!("build_pool:start url={} max={max_size}", config.file_path());
    let manager = ConnectionManager::<SqliteConnection>::new(config.file_path());
    let pragmas = SqlitePragmas { busy_timeout_ms: config.busy_timeout_ms,
                                  foreign_keys: config.enforce_foreign_keys };
    let pool = r2d2::Pool::builder().max_size(max_size)
                                    .connection_customizer(Box::new(pragmas))
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    debug!("build_pool:done");
    Ok(pool)
}

/// Helper: carga `.env`, lee `DbConfig` y construye un pool ya migrado.
pub fn build_pool_from_env() -> Result<SqlitePool, PersistenceError> {
    crate::config::init_dotenv();
    build_pool(&DbConfig::from_env())
}

/// Id asignado por el último `INSERT` en esta conexión.
pub(crate) fn last_insert_id(conn: &mut SqliteConnection) -> Result<i32, PersistenceError> {
    use diesel::sql_types::Integer;
    use diesel::RunQueryDsl;
    Ok(diesel::select(diesel::dsl::sql::<Integer>("last_insert_rowid()")).get_result::<i32>(conn)?)
}
