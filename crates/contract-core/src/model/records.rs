use chrono::NaiveDateTime;
use contract_domain::{ContractStatus, Priority};
use serde::{Deserialize, Serialize};

use super::{AuditAction, InstanceStatus, TaskStatus};

/// Vista mínima de un contrato que necesita el motor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractSnapshot {
    pub id: i32,
    pub contract_number: Option<String>,
    pub status: ContractStatus,
    pub department: Option<String>,
    pub priority: Priority,
    pub deadline_at: Option<NaiveDateTime>,
}

impl ContractSnapshot {
    /// Número para mensajes; cae al id si el contrato no tiene número.
    pub fn label(&self) -> String {
        self.contract_number.clone().unwrap_or_else(|| format!("#{}", self.id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalInstance {
    pub id: i32,
    pub contract_id: i32,
    pub flow_id: i32,
    pub status: InstanceStatus,
    pub started_at: Option<NaiveDateTime>,
    pub finished_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalTask {
    pub id: i32,
    pub instance_id: i32,
    pub step_order: u32,
    pub role_name: String,
    pub assigned_user_id: Option<i32>,
    pub status: TaskStatus,
    pub assigned_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub comment: Option<String>,
    pub deadline_at: Option<NaiveDateTime>,
    pub deadline_notified: bool,
}

/// Tarea pendiente a insertar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub instance_id: i32,
    pub step_order: u32,
    pub role_name: String,
    pub assigned_user_id: Option<i32>,
    pub assigned_at: NaiveDateTime,
    pub deadline_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub user_id: Option<i32>,
    pub action: AuditAction,
    pub details: String,
    pub created_at: NaiveDateTime,
}

/// Tarea vencida detectada por el barrido de plazos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueTask {
    pub task_id: i32,
    pub assigned_user_id: i32,
    pub user_name: String,
    pub contract_number: String,
    pub role_name: String,
    pub deadline_at: NaiveDateTime,
}

impl OverdueTask {
    /// Texto de la notificación que se escribe en el log.
    pub fn notice(&self) -> String {
        format!("ПРОСРОЧЕНА задача по договору {}\nРоль: {}\nДедлайн: {}",
                self.contract_number,
                self.role_name,
                self.deadline_at.format("%Y-%m-%d %H:%M"))
    }
}
