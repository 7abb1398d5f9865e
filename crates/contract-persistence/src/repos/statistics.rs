use contract_core::TaskStatus;
use contract_domain::ContractStatus;
use diesel::prelude::*;
use serde::Serialize;

use crate::error::PersistenceError;
use crate::schema::{approval_tasks, contracts, users};
use crate::sqlite::{with_retry, ConnectionProvider};

/// Contadores del panel de administración.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total_contracts: i64,
    pub on_approval: i64,
    pub pending_tasks: i64,
    pub active_users: i64,
}

#[derive(Clone)]
pub struct StatisticsRepository<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> StatisticsRepository<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn collect(&self) -> Result<Statistics, PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            let total_contracts = contracts::table.count().get_result::<i64>(&mut conn)?;
            let on_approval = contracts::table.filter(contracts::status.eq(ContractStatus::OnApproval.as_str()))
                                              .count()
                                              .get_result::<i64>(&mut conn)?;
            let pending_tasks = approval_tasks::table.filter(approval_tasks::status.eq(TaskStatus::Pending.as_str()))
                                                     .count()
                                                     .get_result::<i64>(&mut conn)?;
            let active_users = users::table.filter(users::is_active.eq(true))
                                           .count()
                                           .get_result::<i64>(&mut conn)?;
            Ok(Statistics { total_contracts, on_approval, pending_tasks, active_users })
        })
    }
}
