//! Wrapper para correr migraciones embebidas.
//!
//! Las migraciones viven en `migrations/` de este crate y usan
//! `CREATE TABLE IF NOT EXISTS`, de modo que una base creada por la
//! aplicación de escritorio se adopta sin cambios de datos.

use crate::error::PersistenceError;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub fn run_pending_migrations(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    conn.run_pending_migrations(MIGRATIONS)
        .map(|_| ())
        .map_err(|e| PersistenceError::Unknown(format!("migration error: {e}")))
}
