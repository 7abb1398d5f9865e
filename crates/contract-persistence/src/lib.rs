//! contract-persistence
//!
//! Persistencia SQLite (Diesel + r2d2) del sistema de contratos.
//!
//! Módulos:
//! - `sqlite`: pool, pragmas, reintentos y `SqliteApprovalStore` para el motor.
//! - `repos`: repositorios de organizaciones, usuarios, contratos, tareas,
//!   auditoría y estadísticas.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `seed`: datos iniciales para una base vacía.
//! - `backup`: copia de seguridad y reinicio del archivo.
//! - `config`: carga de configuración desde .env.
//! - `schema`: tablas Diesel declaradas a mano.

pub mod backup;
pub mod config;
pub mod error;
pub mod migrations;
pub mod repos;
pub mod rows;
pub mod schema;
pub mod seed;
pub mod sqlite;

pub use backup::{backup_database, backup_file_name, reset_database};
pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use repos::{ApprovalStatusView, AuditRepository, ContractRepository, InstanceStatusView, OrganizationRepository, RoleRepository,
                Statistics, StatisticsRepository, TaskInboxRow, TaskRepository, TaskStatusView, UserRepository};
pub use rows::AuditRow;
pub use seed::{seed_if_empty, SeedReport};
pub use sqlite::{build_pool, build_pool_from_env, ConnectionProvider, PoolProvider, SqliteApprovalStore, SqliteConn, SqlitePool};
