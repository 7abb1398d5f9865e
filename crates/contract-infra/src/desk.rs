//! `ContractDesk`: las acciones que un usuario realiza sobre el registro de
//! contratos, con sus comprobaciones de permisos.
//!
//! Cada acción recibe la sesión del usuario y la hora actual; el desk no
//! guarda estado propio más allá del pool.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use contract_core::{ApprovalEngine, ApprovalStore, ContractTag, CoreEngineError, DeadlinePolicy, Decision, OverdueTask, Rescheduled,
                    SubmitOutcome, TaskOutcome, TaskStatus, TaskTag};
use contract_domain::{Contract, ContractDraft, ContractListing, ContractStatus, DomainError, Organization, OrganizationDraft,
                      OrganizationOption, Priority, Role, Session, User, UserDraft, UserWithRoles};
use contract_persistence::{backup_database, build_pool, reset_database, seed_if_empty, ApprovalStatusView, AuditRepository, AuditRow,
                           ContractRepository, DbConfig, OrganizationRepository, PersistenceError, PoolProvider, RoleRepository,
                           SeedReport, SqliteApprovalStore, Statistics, StatisticsRepository, TaskInboxRow, TaskRepository,
                           UserRepository};
use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeskError {
    #[error("invalid login or password")]
    InvalidCredentials,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Engine(#[from] CoreEngineError),
    #[error(transparent)]
    Persistence(PersistenceError),
}

impl From<PersistenceError> for DeskError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::Domain(domain) => DeskError::Domain(domain),
            other => DeskError::Persistence(other),
        }
    }
}

/// Fila del listado de contratos con su etiqueta de color.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractLine {
    #[serde(flatten)]
    pub listing: ContractListing,
    pub tag: ContractTag,
}

/// Fila de la bandeja de tareas con su etiqueta de color.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskLine {
    #[serde(flatten)]
    pub task: TaskInboxRow,
    pub tag: TaskTag,
}

fn require_manager(session: &Session, action: &str) -> Result<(), DomainError> {
    if session.sees_all_contracts() {
        Ok(())
    } else {
        Err(DomainError::Forbidden(format!("{action} is available to directors and administrators only")))
    }
}

pub struct ContractDesk {
    db: DbConfig,
    provider: PoolProvider,
    policy: DeadlinePolicy,
    organizations: OrganizationRepository<PoolProvider>,
    users: UserRepository<PoolProvider>,
    roles: RoleRepository<PoolProvider>,
    contracts: ContractRepository<PoolProvider>,
    tasks: TaskRepository<PoolProvider>,
    audit: AuditRepository<PoolProvider>,
    statistics: StatisticsRepository<PoolProvider>,
}

impl ContractDesk {
    /// Abre (o crea) la base y aplica las migraciones pendientes.
    pub fn open(db: DbConfig) -> Result<Self, DeskError> {
        let pool = build_pool(&db)?;
        Ok(Self::with_provider(db, PoolProvider { pool }))
    }

    pub fn with_provider(db: DbConfig, provider: PoolProvider) -> Self {
        Self { organizations: OrganizationRepository::new(provider.clone()),
               users: UserRepository::new(provider.clone()),
               roles: RoleRepository::new(provider.clone()),
               contracts: ContractRepository::new(provider.clone()),
               tasks: TaskRepository::new(provider.clone()),
               audit: AuditRepository::new(provider.clone()),
               statistics: StatisticsRepository::new(provider.clone()),
               policy: DeadlinePolicy::default(),
               provider,
               db }
    }

    pub fn provider(&self) -> &PoolProvider {
        &self.provider
    }

    pub fn database_path(&self) -> &Path {
        Path::new(self.db.file_path())
    }

    /// Siembra los datos iniciales en las tablas que estén vacías.
    pub fn initialize(&self, now: NaiveDateTime) -> Result<SeedReport, DeskError> {
        Ok(seed_if_empty(&self.provider, now)?)
    }

    fn engine(&self) -> Result<ApprovalEngine<SqliteApprovalStore>, DeskError> {
        let store = SqliteApprovalStore::from_provider(&self.provider)?;
        Ok(ApprovalEngine::with_policy(store, self.policy))
    }

    // --- sesión ---

    pub fn login(&self, username: &str, password: &str) -> Result<Session, DeskError> {
        match self.users.authenticate(username, password)? {
            Some(session) => {
                info!("User {} logged in", session.username);
                Ok(session)
            }
            None => {
                warn!("Failed login attempt for '{}'", username.trim());
                Err(DeskError::InvalidCredentials)
            }
        }
    }

    pub fn logout(&self, session: &Session) {
        info!("User {} logged out", session.username);
    }

    // --- organizaciones ---

    pub fn organizations(&self) -> Result<Vec<Organization>, DeskError> {
        Ok(self.organizations.list()?)
    }

    pub fn organization(&self, id: i32) -> Result<Organization, DeskError> {
        Ok(self.organizations.get(id)?)
    }

    pub fn organization_options(&self) -> Result<Vec<OrganizationOption>, DeskError> {
        Ok(self.organizations.options()?)
    }

    pub fn create_organization(&self, session: &Session, draft: OrganizationDraft, now: NaiveDateTime) -> Result<i32, DeskError> {
        require_manager(session, "organization management")?;
        Ok(self.organizations.create(draft, now)?)
    }

    pub fn update_organization(&self, session: &Session, id: i32, draft: OrganizationDraft) -> Result<(), DeskError> {
        require_manager(session, "organization management")?;
        Ok(self.organizations.update(id, draft)?)
    }

    pub fn delete_organization(&self, session: &Session, id: i32) -> Result<(), DeskError> {
        require_manager(session, "organization management")?;
        Ok(self.organizations.delete(id)?)
    }

    // --- usuarios ---

    pub fn users(&self, session: &Session) -> Result<Vec<UserWithRoles>, DeskError> {
        session.require_admin()?;
        Ok(self.users.list()?)
    }

    pub fn user(&self, session: &Session, id: i32) -> Result<User, DeskError> {
        session.require_admin()?;
        Ok(self.users.get(id)?)
    }

    pub fn roles(&self) -> Result<Vec<Role>, DeskError> {
        Ok(self.roles.list()?)
    }

    pub fn create_user(&self, session: &Session, draft: &UserDraft, now: NaiveDateTime) -> Result<i32, DeskError> {
        session.require_admin()?;
        Ok(self.users.create(draft, now)?)
    }

    pub fn update_user(&self, session: &Session, id: i32, draft: &UserDraft) -> Result<(), DeskError> {
        session.require_admin()?;
        Ok(self.users.update(id, draft)?)
    }

    /// La cuenta con la que se trabaja no puede borrarse a sí misma.
    pub fn delete_user(&self, session: &Session, id: i32) -> Result<(), DeskError> {
        session.require_admin()?;
        if id == session.user_id {
            return Err(DomainError::Conflict("the signed-in user cannot be deleted".into()).into());
        }
        Ok(self.users.delete(id)?)
    }

    // --- contratos ---

    /// Contratos visibles para la sesión, filtrados por `query` y etiquetados.
    pub fn contracts(&self, session: &Session, query: &str, now: NaiveDateTime) -> Result<Vec<ContractLine>, DeskError> {
        let lines = self.contracts
                        .list_visible(session)?
                        .into_iter()
                        .filter(|c| c.matches(query))
                        .map(|listing| ContractLine { tag: ContractTag::classify(listing.status, listing.deadline_at, now),
                                                      listing })
                        .collect::<Vec<_>>();
        debug!("contracts: user={} query='{}' rows={}", session.username, query.trim(), lines.len());
        Ok(lines)
    }

    pub fn contract(&self, id: i32) -> Result<Contract, DeskError> {
        Ok(self.contracts.get(id)?)
    }

    /// Alta en borrador a nombre del usuario de la sesión. El plazo sale de la
    /// prioridad (o del valor manual con `Priority::Custom`).
    pub fn create_contract(&self, session: &Session, draft: &ContractDraft, now: NaiveDateTime) -> Result<i32, DeskError> {
        draft.validate()?;
        let deadline = self.policy.contract_deadline(draft.priority, draft.custom_deadline, now)?;
        Ok(self.contracts.create(draft, session.user_id, deadline, now)?)
    }

    /// Edita un contrato. Uno ya aprobado sólo se edita con `reopen`, que lo
    /// devuelve a borrador y obliga a una nueva aprobación.
    pub fn update_contract(&self,
                           session: &Session,
                           id: i32,
                           draft: &ContractDraft,
                           reopen: bool,
                           now: NaiveDateTime)
                           -> Result<(), DeskError> {
        draft.validate()?;
        let current = self.contracts.get(id)?;
        if current.status == ContractStatus::Approved {
            if !reopen {
                return Err(DomainError::Conflict("contract is approved; editing it resets the status to draft".into()).into());
            }
            if self.contracts.reopen_for_edit(id, now)? {
                info!("Contract {} reset to draft by {} for editing", draft.contract_number.trim(), session.username);
            }
        }
        let deadline = self.policy.contract_deadline(draft.priority, draft.custom_deadline, now)?;
        Ok(self.contracts.update(id, draft, deadline, now)?)
    }

    pub fn delete_contract(&self, session: &Session, id: i32) -> Result<(), DeskError> {
        let contract = self.contracts.get(id)?;
        self.contracts.delete(id)?;
        info!("Contract {} deleted by {}",
              contract.contract_number.as_deref().unwrap_or("-"),
              session.username);
        Ok(())
    }

    /// Nuevo plazo para el contrato y sus tareas pendientes.
    pub fn change_deadline(&self,
                           session: &Session,
                           contract_id: i32,
                           priority: Priority,
                           custom: Option<NaiveDateTime>,
                           now: NaiveDateTime)
                           -> Result<Rescheduled, DeskError> {
        require_manager(session, "changing deadlines")?;
        Ok(self.engine()?.reschedule(contract_id, priority, custom, now)?)
    }

    // --- aprobación ---

    pub fn send_for_approval(&self, session: &Session, contract_id: i32, now: NaiveDateTime) -> Result<SubmitOutcome, DeskError> {
        Ok(self.engine()?.submit(contract_id, Some(session.user_id), now)?)
    }

    /// Resuelve una tarea. Sólo el usuario asignado o un administrador pueden
    /// hacerlo.
    pub fn resolve_task(&self,
                        session: &Session,
                        task_id: i32,
                        decision: Decision,
                        comment: &str,
                        now: NaiveDateTime)
                        -> Result<TaskOutcome, DeskError> {
        let mut engine = self.engine()?;
        // `assigned_user_id` no cambia tras crear la tarea; basta leerlo antes
        // de la transacción de `process_task`.
        let task = engine.store_mut().task(task_id)?.ok_or(CoreEngineError::TaskNotFound(task_id))?;
        if !session.is_admin() && task.assigned_user_id != Some(session.user_id) {
            return Err(DomainError::Forbidden(format!("task {task_id} is assigned to another user")).into());
        }
        Ok(engine.process_task(task_id, decision, comment, Some(session.user_id), now)?)
    }

    pub fn approve_task(&self, session: &Session, task_id: i32, comment: &str, now: NaiveDateTime) -> Result<TaskOutcome, DeskError> {
        self.resolve_task(session, task_id, Decision::Approve, comment, now)
    }

    pub fn reject_task(&self, session: &Session, task_id: i32, comment: &str, now: NaiveDateTime) -> Result<TaskOutcome, DeskError> {
        self.resolve_task(session, task_id, Decision::Reject, comment, now)
    }

    pub fn approval_status(&self, contract_id: i32) -> Result<ApprovalStatusView, DeskError> {
        self.contracts.get(contract_id)?;
        Ok(self.contracts.approval_status(contract_id)?)
    }

    pub fn inbox(&self, session: &Session, now: NaiveDateTime) -> Result<Vec<TaskLine>, DeskError> {
        Ok(self.tasks
               .inbox(session)?
               .into_iter()
               .map(|task| {
                   let status: TaskStatus = task.task_status();
                   TaskLine { tag: TaskTag::classify(status, task.deadline_at, now), task }
               })
               .collect())
    }

    /// Barrido de plazos: devuelve las tareas que vencieron desde el último.
    pub fn check_deadlines(&self, now: NaiveDateTime) -> Result<Vec<OverdueTask>, DeskError> {
        Ok(self.engine()?.check_deadlines(now)?)
    }

    // --- administración ---

    pub fn statistics(&self) -> Result<Statistics, DeskError> {
        Ok(self.statistics.collect()?)
    }

    pub fn recent_audit(&self, session: &Session, limit: i64) -> Result<Vec<AuditRow>, DeskError> {
        session.require_admin()?;
        Ok(self.audit.recent(limit)?)
    }

    pub fn backup(&self, session: &Session, backup_dir: &Path, now: NaiveDateTime) -> Result<PathBuf, DeskError> {
        session.require_admin()?;
        Ok(backup_database(self.database_path(), backup_dir, now)?)
    }

    /// Borra el archivo y lo recrea con los datos iniciales. Consume el desk
    /// para cerrar el pool antes de borrar.
    pub fn reset(self, session: &Session, now: NaiveDateTime) -> Result<(ContractDesk, SeedReport), DeskError> {
        session.require_admin()?;
        let db = self.db.clone();
        drop(self);
        reset_database(Path::new(db.file_path()))?;
        let desk = ContractDesk::open(db)?;
        let report = desk.initialize(now)?;
        info!("Database reset by administrator {}", session.username);
        Ok((desk, report))
    }
}
