//! `ApprovalStore` sobre SQLite.
//!
//! Una instancia trabaja sobre una única conexión prestada del pool, de modo
//! que `atomically` puede abrir una transacción y todas las llamadas
//! intermedias del motor caen dentro de ella.

use chrono::NaiveDateTime;
use contract_core::{ApprovalFlow, ApprovalInstance, ApprovalStore, ApprovalTask, AuditEntry, ContractSnapshot, CoreEngineError,
                    InstanceStatus, NewTask, OverdueTask, TaskStatus};
use contract_domain::{ContractStatus, Priority};
use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::prelude::*;
use diesel::sql_types::{Integer, Nullable, Text, Timestamp};
use log::{debug, warn};

use super::{last_insert_id, with_retry, ConnectionProvider, SqliteConn};
use crate::error::PersistenceError;
use crate::rows::{ContractRow, FlowRow, InstanceRow, TaskRow};
use crate::schema::{approval_flows, approval_instances, approval_tasks, assignment_cursors, audit_log, contracts};

pub struct SqliteApprovalStore {
    conn: SqliteConn,
}

#[derive(QueryableByName, Debug)]
struct OverdueRow {
    #[diesel(sql_type = Integer)]
    task_id: i32,
    #[diesel(sql_type = Integer)]
    assigned_user_id: i32,
    #[diesel(sql_type = Text)]
    full_name: String,
    #[diesel(sql_type = Nullable<Text>)]
    contract_number: Option<String>,
    #[diesel(sql_type = Integer)]
    contract_id: i32,
    #[diesel(sql_type = Nullable<Text>)]
    role_name: Option<String>,
    #[diesel(sql_type = Timestamp)]
    deadline_at: NaiveDateTime,
}

#[derive(QueryableByName, Debug)]
struct UserIdRow {
    #[diesel(sql_type = Integer)]
    id: i32,
}

fn storage(e: PersistenceError) -> CoreEngineError {
    CoreEngineError::from(e)
}

fn db(e: diesel::result::Error) -> CoreEngineError {
    storage(PersistenceError::from(e))
}

impl SqliteApprovalStore {
    pub fn new(conn: SqliteConn) -> Self {
        Self { conn }
    }

    pub fn from_provider<P: ConnectionProvider>(provider: &P) -> Result<Self, PersistenceError> {
        Ok(Self::new(provider.connection()?))
    }

    fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }
}

impl ApprovalStore for SqliteApprovalStore {
    fn atomically<T, F>(&mut self, f: F) -> Result<T, CoreEngineError>
        where F: FnOnce(&mut Self) -> Result<T, CoreEngineError>
    {
        // IMMEDIATE toma el bloqueo de escritura al empezar: dos transacciones
        // que leen y luego escriben no chocan al promover el bloqueo.
        with_retry(|| {
            AnsiTransactionManager::begin_transaction_sql(self.conn(), "BEGIN IMMEDIATE").map_err(PersistenceError::from)
        }).map_err(storage)?;
        match f(self) {
            Ok(value) => {
                AnsiTransactionManager::commit_transaction(self.conn()).map_err(db)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = AnsiTransactionManager::rollback_transaction(self.conn()) {
                    warn!("rollback failed after {e}: {rollback}");
                }
                Err(e)
            }
        }
    }

    fn contract(&mut self, contract_id: i32) -> Result<Option<ContractSnapshot>, CoreEngineError> {
        let row = contracts::table.find(contract_id)
                                  .select(ContractRow::as_select())
                                  .first::<ContractRow>(self.conn())
                                  .optional()
                                  .map_err(db)?;
        Ok(row.as_ref().map(ContractSnapshot::from))
    }

    fn set_contract_status(&mut self, contract_id: i32, status: ContractStatus, now: NaiveDateTime) -> Result<(), CoreEngineError> {
        let n = diesel::update(contracts::table.find(contract_id)).set((contracts::status.eq(status.as_str()),
                                                                         contracts::updated_at.eq(now)))
                                                                   .execute(self.conn())
                                                                   .map_err(db)?;
        if n == 0 {
            return Err(CoreEngineError::ContractNotFound(contract_id));
        }
        Ok(())
    }

    fn set_contract_deadline(&mut self,
                             contract_id: i32,
                             priority: Priority,
                             deadline: NaiveDateTime,
                             now: NaiveDateTime)
                             -> Result<(), CoreEngineError> {
        let n = diesel::update(contracts::table.find(contract_id)).set((contracts::priority.eq(priority.as_str()),
                                                                         contracts::deadline_at.eq(deadline),
                                                                         contracts::updated_at.eq(now)))
                                                                   .execute(self.conn())
                                                                   .map_err(db)?;
        if n == 0 {
            return Err(CoreEngineError::ContractNotFound(contract_id));
        }
        Ok(())
    }

    fn flow_for_department(&mut self, department: &str) -> Result<Option<ApprovalFlow>, CoreEngineError> {
        let row = approval_flows::table.filter(approval_flows::department.eq(department))
                                       .order(approval_flows::id.asc())
                                       .select(FlowRow::as_select())
                                       .first::<FlowRow>(self.conn())
                                       .optional()
                                       .map_err(db)?;
        row.map(|r| ApprovalFlow::try_from(r).map_err(storage)).transpose()
    }

    fn flow(&mut self, flow_id: i32) -> Result<Option<ApprovalFlow>, CoreEngineError> {
        let row = approval_flows::table.find(flow_id)
                                       .select(FlowRow::as_select())
                                       .first::<FlowRow>(self.conn())
                                       .optional()
                                       .map_err(db)?;
        row.map(|r| ApprovalFlow::try_from(r).map_err(storage)).transpose()
    }

    fn open_instance(&mut self, contract_id: i32) -> Result<Option<ApprovalInstance>, CoreEngineError> {
        let row = approval_instances::table.filter(approval_instances::contract_id.eq(contract_id))
                                           .filter(approval_instances::status.ne(InstanceStatus::Finished.as_str())
                                                                             .or(approval_instances::status.is_null()))
                                           .order(approval_instances::id.asc())
                                           .select(InstanceRow::as_select())
                                           .first::<InstanceRow>(self.conn())
                                           .optional()
                                           .map_err(db)?;
        Ok(row.map(ApprovalInstance::from))
    }

    fn instance(&mut self, instance_id: i32) -> Result<Option<ApprovalInstance>, CoreEngineError> {
        let row = approval_instances::table.find(instance_id)
                                           .select(InstanceRow::as_select())
                                           .first::<InstanceRow>(self.conn())
                                           .optional()
                                           .map_err(db)?;
        Ok(row.map(ApprovalInstance::from))
    }

    fn create_instance(&mut self, contract_id: i32, flow_id: i32, now: NaiveDateTime) -> Result<i32, CoreEngineError> {
        diesel::insert_into(approval_instances::table).values((approval_instances::contract_id.eq(contract_id),
                                                               approval_instances::flow_id.eq(flow_id),
                                                               approval_instances::status.eq(InstanceStatus::Running.as_str()),
                                                               approval_instances::started_at.eq(now)))
                                                      .execute(self.conn())
                                                      .map_err(db)?;
        let id = last_insert_id(self.conn()).map_err(storage)?;
        debug!("create_instance:done id={id} contract_id={contract_id} flow_id={flow_id}");
        Ok(id)
    }

    fn finish_instance(&mut self, instance_id: i32, now: NaiveDateTime) -> Result<(), CoreEngineError> {
        let n = diesel::update(approval_instances::table.find(instance_id))
            .set((approval_instances::status.eq(InstanceStatus::Finished.as_str()), approval_instances::finished_at.eq(now)))
            .execute(self.conn())
            .map_err(db)?;
        if n == 0 {
            return Err(CoreEngineError::InstanceNotFound(instance_id));
        }
        Ok(())
    }

    fn discard_instance(&mut self, instance_id: i32) -> Result<(), CoreEngineError> {
        diesel::delete(approval_tasks::table.filter(approval_tasks::instance_id.eq(instance_id))).execute(self.conn())
                                                                                                 .map_err(db)?;
        diesel::delete(approval_instances::table.find(instance_id)).execute(self.conn()).map_err(db)?;
        Ok(())
    }

    fn insert_task(&mut self, task: &NewTask) -> Result<i32, CoreEngineError> {
        diesel::insert_into(approval_tasks::table).values((approval_tasks::instance_id.eq(task.instance_id),
                                                           approval_tasks::step_order.eq(task.step_order as i32),
                                                           approval_tasks::role_name.eq(&task.role_name),
                                                           approval_tasks::assigned_user_id.eq(task.assigned_user_id),
                                                           approval_tasks::status.eq(TaskStatus::Pending.as_str()),
                                                           approval_tasks::assigned_at.eq(task.assigned_at),
                                                           approval_tasks::deadline_at.eq(task.deadline_at),
                                                           approval_tasks::deadline_notified.eq(false)))
                                                  .execute(self.conn())
                                                  .map_err(db)?;
        last_insert_id(self.conn()).map_err(storage)
    }

    fn task(&mut self, task_id: i32) -> Result<Option<ApprovalTask>, CoreEngineError> {
        let row = approval_tasks::table.find(task_id)
                                       .select(TaskRow::as_select())
                                       .first::<TaskRow>(self.conn())
                                       .optional()
                                       .map_err(db)?;
        Ok(row.map(ApprovalTask::from))
    }

    fn complete_task(&mut self, task_id: i32, status: TaskStatus, comment: &str, now: NaiveDateTime) -> Result<(), CoreEngineError> {
        let n = diesel::update(approval_tasks::table.find(task_id)).set((approval_tasks::status.eq(status.as_str()),
                                                                          approval_tasks::completed_at.eq(now),
                                                                          approval_tasks::comment.eq(comment)))
                                                                    .execute(self.conn())
                                                                    .map_err(db)?;
        if n == 0 {
            return Err(CoreEngineError::TaskNotFound(task_id));
        }
        Ok(())
    }

    fn count_pending(&mut self, instance_id: i32, step: u32) -> Result<i64, CoreEngineError> {
        approval_tasks::table.filter(approval_tasks::instance_id.eq(instance_id))
                             .filter(approval_tasks::step_order.eq(step as i32))
                             .filter(approval_tasks::status.eq(TaskStatus::Pending.as_str()))
                             .count()
                             .get_result::<i64>(self.conn())
                             .map_err(db)
    }

    fn cancel_pending(&mut self, instance_id: i32, suffix: &str, now: NaiveDateTime) -> Result<usize, CoreEngineError> {
        diesel::sql_query("UPDATE approval_tasks \
                           SET status = ?, completed_at = ?, comment = COALESCE(comment, '') || ? \
                           WHERE instance_id = ? AND status = ?")
            .bind::<Text, _>(TaskStatus::Cancelled.as_str())
            .bind::<Timestamp, _>(now)
            .bind::<Text, _>(suffix)
            .bind::<Integer, _>(instance_id)
            .bind::<Text, _>(TaskStatus::Pending.as_str())
            .execute(self.conn())
            .map_err(db)
    }

    fn active_users_with_role(&mut self, role: &str) -> Result<Vec<i32>, CoreEngineError> {
        let rows = diesel::sql_query("SELECT u.id AS id FROM users u \
                                      JOIN user_roles ur ON u.id = ur.user_id \
                                      JOIN roles r ON ur.role_id = r.id \
                                      WHERE r.name = ? AND u.is_active = 1 \
                                      ORDER BY u.id")
            .bind::<Text, _>(role)
            .load::<UserIdRow>(self.conn())
            .map_err(db)?;
        Ok(rows.into_iter().map(|r| r.id).collect())
    }

    fn advance_cursor(&mut self, role: &str, modulo: usize) -> Result<usize, CoreEngineError> {
        let current = assignment_cursors::table.find(role)
                                               .select(assignment_cursors::next_index)
                                               .first::<i64>(self.conn())
                                               .optional()
                                               .map_err(db)?
                                               .unwrap_or(0)
                                               .max(0);
        let index = (current % modulo.max(1) as i64) as usize;
        // el cursor sólo crece; el módulo se aplica al leer
        let next = current + 1;
        diesel::insert_into(assignment_cursors::table).values((assignment_cursors::role_name.eq(role),
                                                               assignment_cursors::next_index.eq(next)))
                                                      .on_conflict(assignment_cursors::role_name)
                                                      .do_update()
                                                      .set(assignment_cursors::next_index.eq(next))
                                                      .execute(self.conn())
                                                      .map_err(db)?;
        Ok(index)
    }

    fn overdue_tasks(&mut self, now: NaiveDateTime) -> Result<Vec<OverdueTask>, CoreEngineError> {
        let rows = diesel::sql_query("SELECT t.id AS task_id, t.assigned_user_id AS assigned_user_id, u.full_name AS full_name, \
                                             c.contract_number AS contract_number, c.id AS contract_id, \
                                             t.role_name AS role_name, t.deadline_at AS deadline_at \
                                      FROM approval_tasks t \
                                      JOIN users u ON t.assigned_user_id = u.id \
                                      JOIN approval_instances i ON t.instance_id = i.id \
                                      JOIN contracts c ON i.contract_id = c.id \
                                      WHERE t.status = 'pending' AND t.deadline_at IS NOT NULL AND t.deadline_at < ? \
                                        AND COALESCE(t.deadline_notified, 0) = 0 \
                                      ORDER BY t.id")
            .bind::<Timestamp, _>(now)
            .load::<OverdueRow>(self.conn())
            .map_err(db)?;
        Ok(rows.into_iter()
               .map(|r| OverdueTask { task_id: r.task_id,
                                      assigned_user_id: r.assigned_user_id,
                                      user_name: r.full_name,
                                      contract_number: r.contract_number.unwrap_or_else(|| format!("#{}", r.contract_id)),
                                      role_name: r.role_name.unwrap_or_default(),
                                      deadline_at: r.deadline_at })
               .collect())
    }

    fn mark_notified(&mut self, task_id: i32) -> Result<(), CoreEngineError> {
        diesel::update(approval_tasks::table.find(task_id)).set(approval_tasks::deadline_notified.eq(true))
                                                            .execute(self.conn())
                                                            .map_err(db)?;
        Ok(())
    }

    fn reschedule_pending_tasks(&mut self, contract_id: i32, deadline: NaiveDateTime) -> Result<usize, CoreEngineError> {
        diesel::sql_query("UPDATE approval_tasks SET deadline_at = ?, deadline_notified = 0 \
                           WHERE instance_id IN (SELECT id FROM approval_instances WHERE contract_id = ? AND status = 'running') \
                             AND status = 'pending'")
            .bind::<Timestamp, _>(deadline)
            .bind::<Integer, _>(contract_id)
            .execute(self.conn())
            .map_err(db)
    }

    fn record_audit(&mut self, entry: &AuditEntry) -> Result<(), CoreEngineError> {
        diesel::insert_into(audit_log::table).values((audit_log::user_id.eq(entry.user_id),
                                                      audit_log::action.eq(entry.action.as_str()),
                                                      audit_log::details.eq(&entry.details),
                                                      audit_log::created_at.eq(entry.created_at)))
                                             .execute(self.conn())
                                             .map_err(db)?;
        Ok(())
    }
}
