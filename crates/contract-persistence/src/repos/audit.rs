use contract_core::AuditEntry;
use diesel::prelude::*;

use crate::error::PersistenceError;
use crate::rows::AuditRow;
use crate::schema::audit_log;
use crate::sqlite::{with_retry, ConnectionProvider};

/// Registro de auditoría (`audit_log`).
#[derive(Clone)]
pub struct AuditRepository<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> AuditRepository<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn append(&self, entry: &AuditEntry) -> Result<(), PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::insert_into(audit_log::table).values((audit_log::user_id.eq(entry.user_id),
                                                          audit_log::action.eq(entry.action.as_str()),
                                                          audit_log::details.eq(&entry.details),
                                                          audit_log::created_at.eq(entry.created_at)))
                                                 .execute(&mut conn)
                                                 .map_err(PersistenceError::from)
        })?;
        Ok(())
    }

    /// Últimas `limit` entradas, la más reciente primero.
    pub fn recent(&self, limit: i64) -> Result<Vec<AuditRow>, PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            audit_log::table.order(audit_log::id.desc())
                            .limit(limit)
                            .select(AuditRow::as_select())
                            .load(&mut conn)
                            .map_err(PersistenceError::from)
        })
    }
}
