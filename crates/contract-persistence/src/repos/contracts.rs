use chrono::NaiveDateTime;
use contract_domain::{Contract, ContractDraft, ContractListing, ContractStatus, DomainError, Priority, Session};
use diesel::prelude::*;
use diesel::sql_types::{Double, Integer, Nullable, Text, Timestamp};
use log::{debug, info};
use serde::Serialize;

use super::unique_as_conflict;
use crate::error::PersistenceError;
use crate::rows::ContractRow;
use crate::schema::{approval_instances, approval_tasks, contracts};
use crate::sqlite::{last_insert_id, with_retry, ConnectionProvider};

const DUPLICATE_NUMBER: &str = "a contract with this number already exists";

#[derive(QueryableByName, Debug)]
struct ListingRow {
    #[diesel(sql_type = Integer)]
    id: i32,
    #[diesel(sql_type = Nullable<Text>)]
    contract_number: Option<String>,
    #[diesel(sql_type = Text)]
    title: String,
    #[diesel(sql_type = Nullable<Text>)]
    counterparty_name: Option<String>,
    #[diesel(sql_type = Nullable<Double>)]
    amount: Option<f64>,
    #[diesel(sql_type = Nullable<Text>)]
    status: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    department: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    file_path: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    priority: Option<String>,
    #[diesel(sql_type = Nullable<Timestamp>)]
    deadline_at: Option<NaiveDateTime>,
}

impl From<ListingRow> for ContractListing {
    fn from(r: ListingRow) -> Self {
        ContractListing { id: r.id,
                          contract_number: r.contract_number,
                          title: r.title,
                          counterparty_name: r.counterparty_name,
                          amount: r.amount.unwrap_or(0.0),
                          status: ContractStatus::from_db(r.status.as_deref()),
                          department: r.department,
                          file_path: r.file_path,
                          priority: Priority::from_db(r.priority.as_deref()),
                          deadline_at: r.deadline_at }
    }
}

const LISTING: &str = "SELECT c.id AS id, c.contract_number AS contract_number, c.title AS title, \
                              o.name AS counterparty_name, c.amount AS amount, c.status AS status, \
                              c.department AS department, c.file_path AS file_path, \
                              c.priority AS priority, c.deadline_at AS deadline_at \
                       FROM contracts c \
                       LEFT JOIN organizations o ON c.counterparty = o.id";

/// Instancia de aprobación con el nombre de su ruta y sus tareas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceStatusView {
    pub id: i32,
    pub flow_name: String,
    pub status: String,
    pub started_at: Option<NaiveDateTime>,
    pub finished_at: Option<NaiveDateTime>,
    pub tasks: Vec<TaskStatusView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, QueryableByName)]
pub struct TaskStatusView {
    #[diesel(sql_type = Nullable<Integer>)]
    pub step_order: Option<i32>,
    #[diesel(sql_type = Nullable<Text>)]
    pub role_name: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub assignee: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub status: Option<String>,
    #[diesel(sql_type = Nullable<Timestamp>)]
    pub completed_at: Option<NaiveDateTime>,
    #[diesel(sql_type = Nullable<Text>)]
    pub comment: Option<String>,
    #[diesel(sql_type = Nullable<Timestamp>)]
    pub assigned_at: Option<NaiveDateTime>,
    #[diesel(sql_type = Nullable<Timestamp>)]
    pub deadline_at: Option<NaiveDateTime>,
}

/// Historial de aprobación de un contrato, de la instancia más reciente a la
/// más antigua.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalStatusView {
    pub contract_id: i32,
    pub instances: Vec<InstanceStatusView>,
}

impl ApprovalStatusView {
    /// `true` si el contrato nunca se envió a aprobación.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[derive(QueryableByName, Debug)]
struct InstanceViewRow {
    #[diesel(sql_type = Integer)]
    id: i32,
    #[diesel(sql_type = Text)]
    flow_name: String,
    #[diesel(sql_type = Nullable<Text>)]
    status: Option<String>,
    #[diesel(sql_type = Nullable<Timestamp>)]
    started_at: Option<NaiveDateTime>,
    #[diesel(sql_type = Nullable<Timestamp>)]
    finished_at: Option<NaiveDateTime>,
}

/// Contratos y su vista de aprobación.
#[derive(Clone)]
pub struct ContractRepository<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> ContractRepository<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Contratos visibles para la sesión, del más nuevo al más viejo.
    ///
    /// Administradores y directores ven todos; el resto ve los propios, los de
    /// su departamento y los que están en aprobación.
    pub fn list_visible(&self, session: &Session) -> Result<Vec<ContractListing>, PersistenceError> {
        debug!("list_visible:start user_id={}", session.user_id);
        let rows: Vec<ListingRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            if session.sees_all_contracts() {
                diesel::sql_query(format!("{LISTING} ORDER BY c.created_at DESC, c.id DESC")).load(&mut conn)
                                                                                           .map_err(PersistenceError::from)
            } else {
                diesel::sql_query(format!("{LISTING} WHERE c.owner_id = ? OR c.department = ? OR c.status = ? \
                                           ORDER BY c.created_at DESC, c.id DESC"))
                    .bind::<Integer, _>(session.user_id)
                    .bind::<Nullable<Text>, _>(session.department.as_deref())
                    .bind::<Text, _>(ContractStatus::OnApproval.as_str())
                    .load(&mut conn)
                    .map_err(PersistenceError::from)
            }
        })?;
        debug!("list_visible:done count={}", rows.len());
        Ok(rows.into_iter().map(ContractListing::from).collect())
    }

    pub fn get(&self, id: i32) -> Result<Contract, PersistenceError> {
        let row: Option<ContractRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            contracts::table.find(id)
                            .select(ContractRow::as_select())
                            .first(&mut conn)
                            .optional()
                            .map_err(PersistenceError::from)
        })?;
        row.map(Contract::from).ok_or_else(|| DomainError::NotFound(format!("contract {id}")).into())
    }

    /// Alta en borrador; `deadline` ya viene calculado según la prioridad.
    pub fn create(&self,
                  draft: &ContractDraft,
                  owner_id: i32,
                  deadline: NaiveDateTime,
                  now: NaiveDateTime)
                  -> Result<i32, PersistenceError> {
        draft.validate()?;
        let counterparty = draft.counterparty_id.map(|id| id.to_string());
        let id = with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.immediate_transaction(|tx| {
                    diesel::insert_into(contracts::table).values((contracts::contract_number.eq(draft.contract_number.trim()),
                                                                  contracts::title.eq(draft.title.trim()),
                                                                  contracts::counterparty.eq(&counterparty),
                                                                  contracts::amount.eq(draft.amount),
                                                                  contracts::status.eq(ContractStatus::Draft.as_str()),
                                                                  contracts::owner_id.eq(owner_id),
                                                                  contracts::department.eq(draft.department.trim()),
                                                                  contracts::file_path.eq(&draft.file_path),
                                                                  contracts::priority.eq(draft.priority.as_str()),
                                                                  contracts::deadline_at.eq(deadline),
                                                                  contracts::created_at.eq(now),
                                                                  contracts::updated_at.eq(now)))
                                                         .execute(tx)?;
                    last_insert_id(tx)
                })
        }).map_err(|e| unique_as_conflict(e, DUPLICATE_NUMBER))?;
        info!("Contract {} created (id {id})", draft.contract_number.trim());
        Ok(id)
    }

    /// Edita los datos del contrato sin tocar su estado.
    pub fn update(&self, id: i32, draft: &ContractDraft, deadline: NaiveDateTime, now: NaiveDateTime) -> Result<(), PersistenceError> {
        draft.validate()?;
        let counterparty = draft.counterparty_id.map(|id| id.to_string());
        let updated = with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::update(contracts::table.find(id)).set((contracts::contract_number.eq(draft.contract_number.trim()),
                                                           contracts::title.eq(draft.title.trim()),
                                                           contracts::counterparty.eq(&counterparty),
                                                           contracts::amount.eq(draft.amount),
                                                           contracts::department.eq(draft.department.trim()),
                                                           contracts::file_path.eq(&draft.file_path),
                                                           contracts::priority.eq(draft.priority.as_str()),
                                                           contracts::deadline_at.eq(deadline),
                                                           contracts::updated_at.eq(now)))
                                                     .execute(&mut conn)
                                                     .map_err(PersistenceError::from)
        }).map_err(|e| unique_as_conflict(e, DUPLICATE_NUMBER))?;
        if updated == 0 {
            return Err(DomainError::NotFound(format!("contract {id}")).into());
        }
        info!("Contract {} updated (id {id})", draft.contract_number.trim());
        Ok(())
    }

    /// Borra el contrato junto con sus instancias y tareas de aprobación.
    pub fn delete(&self, id: i32) -> Result<(), PersistenceError> {
        let deleted = with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.immediate_transaction(|tx| {
                    let instances = approval_instances::table.filter(approval_instances::contract_id.eq(id))
                                                             .select(approval_instances::id.nullable());
                    diesel::delete(approval_tasks::table.filter(approval_tasks::instance_id.eq_any(instances)))
                        .execute(tx)?;
                    diesel::delete(approval_instances::table.filter(approval_instances::contract_id.eq(id))).execute(tx)?;
                    Ok::<usize, PersistenceError>(diesel::delete(contracts::table.find(id)).execute(tx)?)
                })
        })?;
        if deleted == 0 {
            return Err(DomainError::NotFound(format!("contract {id}")).into());
        }
        info!("Contract {id} deleted");
        Ok(())
    }

    /// Un contrato aprobado vuelve a borrador al abrirse para edición.
    /// Devuelve `true` si el estado cambió.
    pub fn reopen_for_edit(&self, id: i32, now: NaiveDateTime) -> Result<bool, PersistenceError> {
        let changed = with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::update(contracts::table.find(id).filter(contracts::status.eq(ContractStatus::Approved.as_str())))
                .set((contracts::status.eq(ContractStatus::Draft.as_str()), contracts::updated_at.eq(now)))
                .execute(&mut conn)
                .map_err(PersistenceError::from)
        })?;
        if changed > 0 {
            info!("Contract {id} moved back to draft for editing");
        }
        Ok(changed > 0)
    }

    /// Todas las instancias del contrato con sus tareas.
    pub fn approval_status(&self, contract_id: i32) -> Result<ApprovalStatusView, PersistenceError> {
        let instances = with_retry(|| {
            let mut conn = self.provider.connection()?;
            let rows: Vec<InstanceViewRow> =
                diesel::sql_query("SELECT i.id AS id, f.name AS flow_name, i.status AS status, \
                                          i.started_at AS started_at, i.finished_at AS finished_at \
                                   FROM approval_instances i \
                                   JOIN approval_flows f ON i.flow_id = f.id \
                                   WHERE i.contract_id = ? \
                                   ORDER BY i.started_at DESC, i.id DESC").bind::<Integer, _>(contract_id)
                                                                          .load(&mut conn)?;
            let mut instances = Vec::with_capacity(rows.len());
            for row in rows {
                let tasks: Vec<TaskStatusView> =
                    diesel::sql_query("SELECT t.step_order AS step_order, t.role_name AS role_name, \
                                              u.full_name AS assignee, t.status AS status, \
                                              t.completed_at AS completed_at, t.comment AS comment, \
                                              t.assigned_at AS assigned_at, t.deadline_at AS deadline_at \
                                       FROM approval_tasks t \
                                       LEFT JOIN users u ON t.assigned_user_id = u.id \
                                       WHERE t.instance_id = ? \
                                       ORDER BY t.step_order, t.assigned_at, t.id").bind::<Integer, _>(row.id)
                                                                                   .load(&mut conn)?;
                instances.push(InstanceStatusView { id: row.id,
                                                    flow_name: row.flow_name,
                                                    status: row.status.unwrap_or_default(),
                                                    started_at: row.started_at,
                                                    finished_at: row.finished_at,
                                                    tasks });
            }
            Ok::<_, PersistenceError>(instances)
        })?;
        Ok(ApprovalStatusView { contract_id, instances })
    }
}
