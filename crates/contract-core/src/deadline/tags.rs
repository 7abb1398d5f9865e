use chrono::NaiveDateTime;
use contract_domain::ContractStatus;
use serde::{Deserialize, Serialize};

use crate::model::TaskStatus;

const DAY_SECS: i64 = 86_400;

/// Etiqueta de color de una fila de contrato.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractTag {
    None,
    Rejected,
    Overdue,
    Urgent,
    Warning,
    Pending,
    Approved,
}

impl ContractTag {
    /// Borrador sin etiqueta; rechazado gana siempre; en aprobación con plazo
    /// se gradúa por tiempo restante (vencido, <= 24 h, <= 72 h).
    pub fn classify(status: ContractStatus, deadline: Option<NaiveDateTime>, now: NaiveDateTime) -> Self {
        match (status, deadline) {
            (ContractStatus::Draft, _) => ContractTag::None,
            (ContractStatus::Rejected, _) => ContractTag::Rejected,
            (ContractStatus::OnApproval, Some(deadline)) => {
                let left = (deadline - now).num_seconds();
                if now > deadline {
                    ContractTag::Overdue
                } else if left <= DAY_SECS {
                    ContractTag::Urgent
                } else if left <= 3 * DAY_SECS {
                    ContractTag::Warning
                } else {
                    ContractTag::Pending
                }
            }
            (ContractStatus::Approved, _) => ContractTag::Approved,
            (ContractStatus::OnApproval, None) => ContractTag::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractTag::None => "",
            ContractTag::Rejected => "rejected",
            ContractTag::Overdue => "overdue",
            ContractTag::Urgent => "urgent",
            ContractTag::Warning => "warning",
            ContractTag::Pending => "pending",
            ContractTag::Approved => "approved",
        }
    }
}

/// Etiqueta de color de una fila de tarea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskTag {
    None,
    Cancelled,
    Overdue,
    Urgent,
}

impl TaskTag {
    /// Urgente mientras queden como mucho un día completo (días enteros
    /// truncados) para el vencimiento.
    pub fn classify(status: TaskStatus, deadline: Option<NaiveDateTime>, now: NaiveDateTime) -> Self {
        match status {
            TaskStatus::Rejected | TaskStatus::Cancelled => TaskTag::Cancelled,
            TaskStatus::Pending => match deadline {
                Some(d) if now > d => TaskTag::Overdue,
                Some(d) if (d - now).num_days() <= 1 => TaskTag::Urgent,
                _ => TaskTag::None,
            },
            TaskStatus::Approved => TaskTag::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskTag::None => "",
            TaskTag::Cancelled => "cancelled",
            TaskTag::Overdue => "overdue",
            TaskTag::Urgent => "urgent",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contract_domain::parse_timestamp;

    fn at(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn contract_tags_by_remaining_time() {
        let now = at("2025-03-01 12:00:00");
        let on = ContractStatus::OnApproval;
        assert_eq!(ContractTag::classify(on, Some(at("2025-03-01 11:59:59")), now), ContractTag::Overdue);
        assert_eq!(ContractTag::classify(on, Some(at("2025-03-02 12:00:00")), now), ContractTag::Urgent);
        assert_eq!(ContractTag::classify(on, Some(at("2025-03-04 12:00:00")), now), ContractTag::Warning);
        assert_eq!(ContractTag::classify(on, Some(at("2025-03-04 12:00:01")), now), ContractTag::Pending);
        assert_eq!(ContractTag::classify(on, None, now), ContractTag::Pending);
    }

    #[test]
    fn contract_tags_by_status() {
        let now = at("2025-03-01 12:00:00");
        let past = Some(at("2025-01-01 00:00:00"));
        assert_eq!(ContractTag::classify(ContractStatus::Draft, past, now), ContractTag::None);
        assert_eq!(ContractTag::classify(ContractStatus::Rejected, past, now), ContractTag::Rejected);
        assert_eq!(ContractTag::classify(ContractStatus::Approved, past, now), ContractTag::Approved);
        assert_eq!(ContractTag::None.as_str(), "");
    }

    #[test]
    fn task_tags() {
        let now = at("2025-03-01 12:00:00");
        assert_eq!(TaskTag::classify(TaskStatus::Cancelled, None, now), TaskTag::Cancelled);
        assert_eq!(TaskTag::classify(TaskStatus::Rejected, None, now), TaskTag::Cancelled);
        assert_eq!(TaskTag::classify(TaskStatus::Pending, Some(at("2025-03-01 11:00:00")), now), TaskTag::Overdue);
        assert_eq!(TaskTag::classify(TaskStatus::Pending, Some(at("2025-03-03 11:00:00")), now), TaskTag::Urgent);
        assert_eq!(TaskTag::classify(TaskStatus::Pending, Some(at("2025-03-03 12:00:00")), now), TaskTag::None);
        assert_eq!(TaskTag::classify(TaskStatus::Approved, Some(at("2025-01-01 00:00:00")), now), TaskTag::None);
    }
}
