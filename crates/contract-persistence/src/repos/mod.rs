//! Repositorios sobre SQLite.
//!
//! Cada repositorio guarda un `ConnectionProvider` y pide una conexión por
//! operación; las escrituras de varias sentencias corren en una transacción
//! `IMMEDIATE` y todas pasan por `with_retry`.

mod audit;
mod contracts;
mod organizations;
mod statistics;
mod tasks;
mod users;

pub use audit::AuditRepository;
pub use contracts::{ApprovalStatusView, ContractRepository, InstanceStatusView, TaskStatusView};
pub use organizations::OrganizationRepository;
pub use statistics::{Statistics, StatisticsRepository};
pub use tasks::{TaskInboxRow, TaskRepository};
pub use users::{RoleRepository, UserRepository};

use contract_domain::DomainError;

use crate::error::PersistenceError;

/// Convierte una violación de unicidad en un conflicto de dominio legible.
pub(crate) fn unique_as_conflict(err: PersistenceError, message: &str) -> PersistenceError {
    match err {
        PersistenceError::UniqueViolation(_) => PersistenceError::Domain(DomainError::Conflict(message.to_string())),
        other => other,
    }
}

/// Separa el resultado de `GROUP_CONCAT(r.name, ', ')`.
pub(crate) fn split_roles(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| s.split(", ").filter(|r| !r.is_empty()).map(str::to_string).collect())
       .unwrap_or_default()
}
