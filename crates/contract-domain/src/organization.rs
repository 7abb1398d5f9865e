use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::validation::{validate_email, validate_inn, validate_kpp, validate_ogrn, validate_phone};
use crate::DomainError;

/// Tipo de contraparte: persona jurídica o empresario individual (ИП).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationType {
    #[default]
    Legal,
    Individual,
}

impl OrganizationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationType::Legal => "legal",
            OrganizationType::Individual => "individual",
        }
    }

    /// Valores desconocidos o ausentes se leen como persona jurídica.
    pub fn from_db(value: Option<&str>) -> Self {
        match value {
            Some("individual") => OrganizationType::Individual,
            _ => OrganizationType::Legal,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OrganizationType::Legal => "Юрлицо",
            OrganizationType::Individual => "ИП",
        }
    }
}

impl fmt::Display for OrganizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i32,
    pub name: String,
    pub organization_type: OrganizationType,
    pub inn: Option<String>,
    pub kpp: Option<String>,
    pub ogrn: Option<String>,
    pub legal_address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

/// Entrada de alta/edición de una organización.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationDraft {
    pub name: String,
    pub organization_type: OrganizationType,
    pub inn: String,
    pub kpp: Option<String>,
    pub ogrn: Option<String>,
    pub legal_address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl OrganizationDraft {
    /// Recorta espacios y convierte campos opcionales vacíos en `None`.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.inn = self.inn.trim().to_string();
        self.kpp = non_empty(&self.kpp).map(str::to_string);
        self.ogrn = non_empty(&self.ogrn).map(str::to_string);
        self.legal_address = non_empty(&self.legal_address).map(str::to_string);
        self.phone = non_empty(&self.phone).map(str::to_string);
        self.email = non_empty(&self.email).map(str::to_string);
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() || self.inn.trim().is_empty() {
            return Err(DomainError::validation("name and INN are required"));
        }
        let kind = self.organization_type;
        if !validate_inn(self.inn.trim(), kind) {
            return Err(DomainError::validation(match kind {
                OrganizationType::Legal => "invalid INN for a legal entity: expected 10 or 12 digits with valid checksum",
                OrganizationType::Individual => "invalid INN for an individual entrepreneur: expected 12 digits with valid checksum",
            }));
        }
        // El КПП sólo aplica a personas jurídicas
        if kind == OrganizationType::Legal {
            if let Some(kpp) = non_empty(&self.kpp) {
                if !validate_kpp(kpp) {
                    return Err(DomainError::validation("KPP must contain 9 digits"));
                }
            }
        }
        if let Some(ogrn) = non_empty(&self.ogrn) {
            if !validate_ogrn(ogrn, kind) {
                return Err(DomainError::validation(match kind {
                    OrganizationType::Legal => "invalid OGRN: expected 13 digits with valid checksum",
                    OrganizationType::Individual => "invalid OGRNIP: expected 15 digits with valid checksum",
                }));
            }
        }
        if let Some(phone) = non_empty(&self.phone) {
            if !validate_phone(phone) {
                return Err(DomainError::validation("phone must match +7 (xxx) xxx-xxxx"));
            }
        }
        if let Some(email) = non_empty(&self.email) {
            if !validate_email(email) {
                return Err(DomainError::validation("invalid email address"));
            }
        }
        Ok(())
    }
}

/// Par (id, nombre, ИНН) usado en selectores de contraparte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationOption {
    pub id: i32,
    pub name: String,
    pub inn: Option<String>,
}

impl fmt::Display for OrganizationOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ИНН: {})", self.name, self.inn.as_deref().unwrap_or(""))
    }
}
