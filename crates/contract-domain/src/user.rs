use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::DomainError;

pub const ROLE_ADMIN: &str = "Администратор";
pub const ROLE_GENERAL_DIRECTOR: &str = "Генеральный директор";
pub const ROLE_FINANCE_DIRECTOR: &str = "Финансовый директор";
pub const ROLE_LAWYER: &str = "Юрист";
pub const ROLE_PURCHASE_HEAD: &str = "Начальник отдела закупок";
pub const ROLE_SALES_HEAD: &str = "Начальник отдела продаж";
pub const ROLE_COMMERCIAL_DIRECTOR: &str = "Коммерческий директор";
pub const ROLE_SECURITY: &str = "Служба безопасности";
pub const ROLE_LOGISTICS: &str = "Отдел логистики";

/// Departamentos ofrecidos en los formularios de usuario.
pub const DEPARTMENTS: [&str; 10] =
    ["Руководство", "Финансы", "Юридический", "Продажи", "Закупки", "Коммерция", "Безопасность", "Логистика", "ИТ", "Общий"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub department: Option<String>,
    pub position: Option<String>,
    pub is_active: bool,
    pub created_at: Option<NaiveDateTime>,
}

/// Usuario con sus roles agregados (listados de administración).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWithRoles {
    pub user: User,
    pub roles: Vec<String>,
}

/// Alta/edición de usuario. `password = None` en edición conserva el hash actual.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    pub username: String,
    pub full_name: String,
    pub password: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub is_active: bool,
    pub roles: Vec<String>,
}

impl UserDraft {
    pub fn validate(&self, is_new: bool) -> Result<(), DomainError> {
        if self.username.trim().is_empty() || self.full_name.trim().is_empty() {
            return Err(DomainError::validation("login and full name are required"));
        }
        let has_password = self.password.as_deref().is_some_and(|p| !p.trim().is_empty());
        if is_new && !has_password {
            return Err(DomainError::validation("password is required for a new user"));
        }
        Ok(())
    }
}

/// Usuario autenticado y sus roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: i32,
    pub username: String,
    pub full_name: String,
    pub roles: Vec<String>,
    pub department: Option<String>,
}

impl Session {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    /// Directores ven todos los contratos, igual que el administrador.
    pub fn is_director(&self) -> bool {
        self.has_role(ROLE_GENERAL_DIRECTOR) || self.has_role(ROLE_COMMERCIAL_DIRECTOR)
    }

    pub fn sees_all_contracts(&self) -> bool {
        self.is_admin() || self.is_director()
    }

    pub fn require_admin(&self) -> Result<(), DomainError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(DomainError::Forbidden("this action is available to administrators only".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(roles: &[&str]) -> Session {
        Session { user_id: 1,
                  username: "u".into(),
                  full_name: "U".into(),
                  roles: roles.iter().map(|r| r.to_string()).collect(),
                  department: None }
    }

    #[test]
    fn directors_and_admins_see_everything() {
        assert!(session(&[ROLE_ADMIN]).sees_all_contracts());
        assert!(session(&[ROLE_COMMERCIAL_DIRECTOR]).sees_all_contracts());
        assert!(session(&[ROLE_GENERAL_DIRECTOR]).is_director());
        assert!(!session(&[ROLE_LAWYER]).sees_all_contracts());
        assert!(session(&[ROLE_LAWYER]).require_admin().is_err());
    }

    #[test]
    fn new_user_needs_password() {
        let d = UserDraft { username: "lawyer2".into(), full_name: "Юрист Два".into(), ..Default::default() };
        assert!(d.validate(true).is_err());
        assert!(d.validate(false).is_ok());
        let d = UserDraft { password: Some("   ".into()), ..d };
        assert!(d.validate(true).is_err());
    }
}
