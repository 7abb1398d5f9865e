use chrono::NaiveDateTime;
use contract_core::TaskStatus;
use contract_domain::{ContractStatus, Session};
use diesel::prelude::*;
use diesel::sql_types::{Integer, Nullable, Text, Timestamp};
use serde::Serialize;

use crate::error::PersistenceError;
use crate::sqlite::{with_retry, ConnectionProvider};

/// Fila de la bandeja de tareas.
#[derive(Debug, Clone, PartialEq, Serialize, QueryableByName)]
pub struct TaskInboxRow {
    #[diesel(sql_type = Integer)]
    pub task_id: i32,
    #[diesel(sql_type = Nullable<Text>)]
    pub contract_number: Option<String>,
    #[diesel(sql_type = Text)]
    pub title: String,
    #[diesel(sql_type = Nullable<Integer>)]
    pub step_order: Option<i32>,
    #[diesel(sql_type = Nullable<Text>)]
    pub role_name: Option<String>,
    #[diesel(sql_type = Nullable<Integer>)]
    pub assigned_user_id: Option<i32>,
    #[diesel(sql_type = Nullable<Text>)]
    pub status: Option<String>,
    #[diesel(sql_type = Nullable<Timestamp>)]
    pub deadline_at: Option<NaiveDateTime>,
    #[diesel(sql_type = Nullable<Text>)]
    pub file_path: Option<String>,
}

impl TaskInboxRow {
    pub fn task_status(&self) -> TaskStatus {
        TaskStatus::from_db(self.status.as_deref())
    }
}

const INBOX: &str = "SELECT t.id AS task_id, c.contract_number AS contract_number, c.title AS title, \
                            t.step_order AS step_order, t.role_name AS role_name, \
                            t.assigned_user_id AS assigned_user_id, t.status AS status, \
                            t.deadline_at AS deadline_at, c.file_path AS file_path \
                     FROM approval_tasks t \
                     JOIN approval_instances i ON t.instance_id = i.id \
                     JOIN contracts c ON i.contract_id = c.id \
                     WHERE t.status = ? AND c.status != ?";

#[derive(Clone)]
pub struct TaskRepository<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> TaskRepository<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Tareas pendientes de contratos aún no aprobados, por plazo.
    /// El administrador ve todas; el resto sólo las asignadas a él.
    pub fn inbox(&self, session: &Session) -> Result<Vec<TaskInboxRow>, PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            let pending = TaskStatus::Pending.as_str();
            let approved = ContractStatus::Approved.as_str();
            if session.is_admin() {
                diesel::sql_query(format!("{INBOX} ORDER BY t.deadline_at, t.id")).bind::<Text, _>(pending)
                                                                               .bind::<Text, _>(approved)
                                                                               .load(&mut conn)
                                                                               .map_err(PersistenceError::from)
            } else {
                diesel::sql_query(format!("{INBOX} AND t.assigned_user_id = ? ORDER BY t.deadline_at, t.id"))
                    .bind::<Text, _>(pending)
                    .bind::<Text, _>(approved)
                    .bind::<Integer, _>(session.user_id)
                    .load(&mut conn)
                    .map_err(PersistenceError::from)
            }
        })
    }
}
