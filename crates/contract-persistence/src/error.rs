//! Errores de persistencia.
//! Mapea errores de Diesel / conexión / archivos a variantes semánticas.

use contract_core::CoreEngineError;
use contract_domain::DomainError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("unique violation: {0}")]
    UniqueViolation(String),
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),
    #[error("not found")]
    NotFound,
    #[error("database busy (retryable): {0}")]
    Busy(String),
    #[error("transient IO / connection pool error: {0}")]
    TransientIo(String),
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error("unknown database error: {0}")]
    Unknown(String),
}

impl PersistenceError {
    /// Errores que pueden desaparecer reintentando (base bloqueada por otro proceso).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy(_))
    }
}

fn looks_busy(message: &str) -> bool {
    let m = message.to_ascii_lowercase();
    m.contains("database is locked") || m.contains("database table is locked") || m.contains("busy")
}

impl From<DieselError> for PersistenceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound,
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation => Self::UniqueViolation(info.message().to_string()),
                DatabaseErrorKind::ForeignKeyViolation => Self::ForeignKeyViolation(info.message().to_string()),
                _ if looks_busy(info.message()) => Self::Busy(info.message().to_string()),
                other => Self::Unknown(format!("db error kind {:?}: {}", other, info.message())),
            },
            DieselError::DeserializationError(e) => Self::Corrupt(format!("deser: {e}")),
            DieselError::SerializationError(e) => Self::Unknown(format!("ser: {e}")),
            DieselError::AlreadyInTransaction => Self::Unknown("already in transaction".into()),
            DieselError::RollbackErrorOnCommit { rollback_error, commit_error } => {
                Self::Unknown(format!("rollback={rollback_error}; commit={commit_error}"))
            }
            DieselError::BrokenTransactionManager => Self::TransientIo("broken transaction manager".into()),
            DieselError::QueryBuilderError(e) => Self::Unknown(format!("query builder: {e}")),
            DieselError::InvalidCString(e) => Self::Unknown(format!("invalid cstring: {e}")),
            DieselError::RollbackTransaction => Self::Unknown("rollback transaction".into()),
            DieselError::NotInTransaction => Self::Unknown("not in transaction".into()),
            other => Self::Unknown(format!("unhandled diesel error: {other:?}")),
        }
    }
}

impl From<r2d2::Error> for PersistenceError {
    fn from(err: r2d2::Error) -> Self {
        Self::TransientIo(format!("pool error: {err}"))
    }
}

impl From<PersistenceError> for CoreEngineError {
    fn from(err: PersistenceError) -> Self {
        CoreEngineError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_is_the_only_retryable_kind() {
        assert!(PersistenceError::Busy("database is locked".into()).is_retryable());
        assert!(!PersistenceError::NotFound.is_retryable());
        assert!(!PersistenceError::UniqueViolation("x".into()).is_retryable());
    }

    #[test]
    fn converts_into_engine_storage_error() {
        let core: CoreEngineError = PersistenceError::TransientIo("pool exhausted".into()).into();
        assert_eq!(core, CoreEngineError::Storage("transient IO / connection pool error: pool exhausted".into()));
    }
}
