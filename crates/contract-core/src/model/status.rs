use serde::{Deserialize, Serialize};
use std::fmt;

/// Estado de una instancia de aprobación.
///
/// Transición única: `Running` -> `Finished` (al aprobar el último paso o al
/// rechazar cualquier tarea). Una instancia `Running` puede descartarse
/// completa cuando el contrato se reenvía.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Running,
    Finished,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Running => "running",
            InstanceStatus::Finished => "finished",
        }
    }

    /// Todo lo que no sea `finished` se considera abierto.
    pub fn from_db(value: Option<&str>) -> Self {
        match value {
            Some("finished") => InstanceStatus::Finished,
            _ => InstanceStatus::Running,
        }
    }
}

/// Estado de una tarea de aprobación.
///
/// Las transiciones válidas son:
/// - `Pending` -> `Approved`
/// - `Pending` -> `Rejected`
/// - `Pending` -> `Cancelled` (otra tarea de la misma instancia fue rechazada)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Approved => "approved",
            TaskStatus::Rejected => "rejected",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(TaskStatus::Pending),
            "approved" => Some(TaskStatus::Approved),
            "rejected" => Some(TaskStatus::Rejected),
            "cancelled" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }

    pub fn from_db(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or(TaskStatus::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn task_status(&self) -> TaskStatus {
        match self {
            Decision::Approve => TaskStatus::Approved,
            Decision::Reject => TaskStatus::Rejected,
        }
    }
}

/// Acciones registradas en `audit_log.action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    SendForApproval,
    ApproveTask,
    RejectTask,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::SendForApproval => "send_for_approval",
            AuditAction::ApproveTask => "approve_task",
            AuditAction::RejectTask => "reject_task",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
