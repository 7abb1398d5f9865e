use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DomainError;

/// Departamento cuyo flujo de aprobación se usa como respaldo.
pub const GENERAL_DEPARTMENT: &str = "Общий";

/// Estado del contrato. Se persiste con la etiqueta rusa original para que las
/// bases creadas por la aplicación de escritorio sigan siendo legibles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractStatus {
    Draft,
    OnApproval,
    Approved,
    Rejected,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Draft => "Черновик",
            ContractStatus::OnApproval => "На согласовании",
            ContractStatus::Approved => "Согласован",
            ContractStatus::Rejected => "Отклонён",
        }
    }

    /// Acepta las variantes históricas ("Отклонен", "rejected") y mayúsculas.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "черновик" => Some(ContractStatus::Draft),
            "на согласовании" => Some(ContractStatus::OnApproval),
            "согласован" => Some(ContractStatus::Approved),
            "отклонён" | "отклонен" | "rejected" => Some(ContractStatus::Rejected),
            _ => None,
        }
    }

    /// Lectura tolerante desde DB: ausente o desconocido cuenta como borrador.
    pub fn from_db(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or(ContractStatus::Draft)
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Standard,
    Urgent,
    Custom,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Standard => "standard",
            Priority::Urgent => "urgent",
            Priority::Custom => "custom",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "standard" => Some(Priority::Standard),
            "urgent" => Some(Priority::Urgent),
            "custom" => Some(Priority::Custom),
            _ => None,
        }
    }

    pub fn from_db(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or_default()
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Priority::Standard => "Стандартный",
            Priority::Urgent => "Срочный",
            Priority::Custom => "Ручной",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: i32,
    pub contract_number: Option<String>,
    pub title: String,
    pub counterparty_id: Option<i32>,
    pub amount: f64,
    pub status: ContractStatus,
    pub owner_id: Option<i32>,
    pub department: Option<String>,
    pub file_path: Option<String>,
    pub priority: Priority,
    pub deadline_at: Option<NaiveDateTime>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// Fila de listado: contrato con el nombre de la contraparte ya resuelto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractListing {
    pub id: i32,
    pub contract_number: Option<String>,
    pub title: String,
    pub counterparty_name: Option<String>,
    pub amount: f64,
    pub status: ContractStatus,
    pub department: Option<String>,
    pub file_path: Option<String>,
    pub priority: Priority,
    pub deadline_at: Option<NaiveDateTime>,
}

impl ContractListing {
    /// Búsqueda sin distinguir mayúsculas sobre número, título, contraparte y
    /// departamento. Una consulta vacía coincide con todo.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        let haystack = format!("{} {} {} {}",
                               self.contract_number.as_deref().unwrap_or(""),
                               self.title,
                               self.counterparty_name.as_deref().unwrap_or(""),
                               self.department.as_deref().unwrap_or("")).to_lowercase();
        haystack.contains(&query)
    }
}

/// Alta/edición de contrato. El plazo se calcula a partir de la prioridad
/// salvo con `Priority::Custom`, que exige `custom_deadline`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractDraft {
    pub contract_number: String,
    pub title: String,
    pub counterparty_id: Option<i32>,
    pub amount: f64,
    pub department: String,
    pub file_path: Option<String>,
    pub priority: Priority,
    pub custom_deadline: Option<NaiveDateTime>,
}

impl ContractDraft {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.contract_number.trim().is_empty() || self.title.trim().is_empty() || self.department.trim().is_empty() {
            return Err(DomainError::validation("contract number, title and department are required"));
        }
        if self.counterparty_id.is_none() {
            return Err(DomainError::validation("a counterparty must be selected"));
        }
        if self.priority == Priority::Custom && self.custom_deadline.is_none() {
            return Err(DomainError::validation("custom priority requires a deadline date and time"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip_and_legacy_spellings() {
        for s in [ContractStatus::Draft, ContractStatus::OnApproval, ContractStatus::Approved, ContractStatus::Rejected] {
            assert_eq!(ContractStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(ContractStatus::parse("Отклонен"), Some(ContractStatus::Rejected));
        assert_eq!(ContractStatus::parse(" REJECTED "), Some(ContractStatus::Rejected));
        assert_eq!(ContractStatus::from_db(None), ContractStatus::Draft);
    }

    #[test]
    fn listing_search_is_case_insensitive() {
        let row = ContractListing { id: 1,
                                    contract_number: Some("Д-2025-001".into()),
                                    title: "Поставка сырья".into(),
                                    counterparty_name: Some("ООО 'Поставщик+'".into()),
                                    amount: 0.0,
                                    status: ContractStatus::Draft,
                                    department: Some("Закупки".into()),
                                    file_path: None,
                                    priority: Priority::Standard,
                                    deadline_at: None };
        assert!(row.matches(""));
        assert!(row.matches("поставщик"));
        assert!(row.matches("д-2025"));
        assert!(row.matches("ЗАКУПКИ"));
        assert!(!row.matches("продажи"));
    }

    #[test]
    fn draft_requires_counterparty_and_custom_deadline() {
        let d = ContractDraft { contract_number: "Д-1".into(),
                                title: "T".into(),
                                counterparty_id: None,
                                amount: 0.0,
                                department: "Общий".into(),
                                file_path: None,
                                priority: Priority::Custom,
                                custom_deadline: None };
        assert!(d.validate().unwrap_err().to_string().contains("counterparty"));
        let d = ContractDraft { counterparty_id: Some(1), ..d };
        assert!(d.validate().unwrap_err().to_string().contains("deadline"));
    }
}
