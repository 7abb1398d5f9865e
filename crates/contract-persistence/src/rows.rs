//! Filas Diesel y su conversión a tipos de dominio/core.
//!
//! Las columnas de texto con valores enumerados (`status`, `priority`,
//! `organization_type`) se leen de forma tolerante: un valor desconocido cae
//! en el valor por defecto de cada enum en lugar de fallar la consulta.

use chrono::NaiveDateTime;
use contract_core::{ApprovalFlow, ApprovalInstance, ApprovalTask, ContractSnapshot, InstanceStatus, TaskStatus};
use contract_domain::{Contract, ContractStatus, Organization, OrganizationType, Priority, Role, User};
use diesel::prelude::*;

use crate::error::PersistenceError;
use crate::schema::{approval_flows, approval_instances, approval_tasks, audit_log, contracts, organizations, roles, users};

/// `contracts.counterparty` es TEXT; la aplicación guarda ahí el id numérico.
pub(crate) fn counterparty_id(raw: Option<&str>) -> Option<i32> {
    raw.and_then(|v| v.trim().parse().ok())
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = organizations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OrganizationRow {
    pub id: i32,
    pub name: String,
    pub organization_type: Option<String>,
    pub inn: Option<String>,
    pub kpp: Option<String>,
    pub ogrn: Option<String>,
    pub legal_address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<OrganizationRow> for Organization {
    fn from(r: OrganizationRow) -> Self {
        Organization { id: r.id,
                       name: r.name,
                       organization_type: OrganizationType::from_db(r.organization_type.as_deref()),
                       inn: r.inn,
                       kpp: r.kpp,
                       ogrn: r.ogrn,
                       legal_address: r.legal_address,
                       phone: r.phone,
                       email: r.email,
                       created_at: r.created_at }
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserRow {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub department: Option<String>,
    pub position: Option<String>,
    pub is_active: Option<bool>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User { id: r.id,
               username: r.username,
               full_name: r.full_name,
               department: r.department,
               position: r.position,
               is_active: r.is_active.unwrap_or(true),
               created_at: r.created_at }
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = roles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RoleRow {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

impl From<RoleRow> for Role {
    fn from(r: RoleRow) -> Self {
        Role { id: r.id, name: r.name, description: r.description }
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = contracts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ContractRow {
    pub id: i32,
    pub contract_number: Option<String>,
    pub title: String,
    pub counterparty: Option<String>,
    pub amount: Option<f64>,
    pub status: Option<String>,
    pub owner_id: Option<i32>,
    pub department: Option<String>,
    pub file_path: Option<String>,
    pub priority: Option<String>,
    pub deadline_at: Option<NaiveDateTime>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl From<ContractRow> for Contract {
    fn from(r: ContractRow) -> Self {
        Contract { id: r.id,
                   contract_number: r.contract_number,
                   title: r.title,
                   counterparty_id: counterparty_id(r.counterparty.as_deref()),
                   amount: r.amount.unwrap_or(0.0),
                   status: ContractStatus::from_db(r.status.as_deref()),
                   owner_id: r.owner_id,
                   department: r.department,
                   file_path: r.file_path,
                   priority: Priority::from_db(r.priority.as_deref()),
                   deadline_at: r.deadline_at,
                   created_at: r.created_at,
                   updated_at: r.updated_at }
    }
}

impl From<&ContractRow> for ContractSnapshot {
    fn from(r: &ContractRow) -> Self {
        ContractSnapshot { id: r.id,
                           contract_number: r.contract_number.clone(),
                           status: ContractStatus::from_db(r.status.as_deref()),
                           department: r.department.clone(),
                           priority: Priority::from_db(r.priority.as_deref()),
                           deadline_at: r.deadline_at }
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = approval_flows)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FlowRow {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub department: Option<String>,
    pub steps: Option<String>,
}

impl TryFrom<FlowRow> for ApprovalFlow {
    type Error = PersistenceError;

    fn try_from(r: FlowRow) -> Result<Self, Self::Error> {
        let steps = ApprovalFlow::parse_steps(r.steps.as_deref())
            .map_err(|e| PersistenceError::Corrupt(format!("approval_flows.id={}: {e}", r.id)))?;
        Ok(ApprovalFlow { id: r.id,
                          name: r.name,
                          description: r.description,
                          department: r.department,
                          steps })
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = approval_instances)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct InstanceRow {
    pub id: i32,
    pub contract_id: Option<i32>,
    pub flow_id: Option<i32>,
    pub status: Option<String>,
    pub started_at: Option<NaiveDateTime>,
    pub finished_at: Option<NaiveDateTime>,
}

impl From<InstanceRow> for ApprovalInstance {
    fn from(r: InstanceRow) -> Self {
        ApprovalInstance { id: r.id,
                           contract_id: r.contract_id.unwrap_or_default(),
                           flow_id: r.flow_id.unwrap_or_default(),
                           status: InstanceStatus::from_db(r.status.as_deref()),
                           started_at: r.started_at,
                           finished_at: r.finished_at }
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = approval_tasks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TaskRow {
    pub id: i32,
    pub instance_id: Option<i32>,
    pub step_order: Option<i32>,
    pub role_name: Option<String>,
    pub assigned_user_id: Option<i32>,
    pub status: Option<String>,
    pub assigned_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub comment: Option<String>,
    pub deadline_at: Option<NaiveDateTime>,
    pub deadline_notified: Option<bool>,
}

impl From<TaskRow> for ApprovalTask {
    fn from(r: TaskRow) -> Self {
        ApprovalTask { id: r.id,
                       instance_id: r.instance_id.unwrap_or_default(),
                       step_order: r.step_order.unwrap_or_default().max(0) as u32,
                       role_name: r.role_name.unwrap_or_default(),
                       assigned_user_id: r.assigned_user_id,
                       status: TaskStatus::from_db(r.status.as_deref()),
                       assigned_at: r.assigned_at,
                       completed_at: r.completed_at,
                       comment: r.comment,
                       deadline_at: r.deadline_at,
                       deadline_notified: r.deadline_notified.unwrap_or(false) }
    }
}

/// Fila de `audit_log` tal como se lista.
#[derive(Queryable, Selectable, Debug, Clone, PartialEq, serde::Serialize)]
#[diesel(table_name = audit_log)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AuditRow {
    pub id: i32,
    pub user_id: Option<i32>,
    pub action: Option<String>,
    pub details: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}
